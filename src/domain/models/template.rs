//! Metric templates: the fixed business question categories and their canonical queries.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A fixed category of business question bound to one canonical query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateId {
    SalesPerformance,
    MarketingEfficiency,
    CustomerInsights,
    ProductPerformance,
    FinancialOverview,
}

impl TemplateId {
    /// Classification order: the first category whose keywords match wins.
    pub const ORDERED: [TemplateId; 5] = [
        TemplateId::SalesPerformance,
        TemplateId::MarketingEfficiency,
        TemplateId::CustomerInsights,
        TemplateId::ProductPerformance,
        TemplateId::FinancialOverview,
    ];

    /// Category returned when no keyword matches.
    pub const DEFAULT: TemplateId = TemplateId::SalesPerformance;

    pub fn as_str(self) -> &'static str {
        match self {
            Self::SalesPerformance => "sales_performance",
            Self::MarketingEfficiency => "marketing_efficiency",
            Self::CustomerInsights => "customer_insights",
            Self::ProductPerformance => "product_performance",
            Self::FinancialOverview => "financial_overview",
        }
    }

    /// Lowercase keywords whose presence selects this template.
    pub fn keywords(self) -> &'static [&'static str] {
        match self {
            Self::SalesPerformance => &["sales", "revenue", "growth", "commercial"],
            Self::MarketingEfficiency => &["marketing", "roi", "spend", "conversion", "leads"],
            Self::CustomerInsights => &["customer", "satisfaction", "churn", "retention", "segment"],
            Self::ProductPerformance => &["product", "rating", "margin", "performance"],
            Self::FinancialOverview => &["financial", "kpi", "overview", "total"],
        }
    }

    /// The canonical SQLite query answering this template.
    pub fn canonical_query(self) -> &'static str {
        match self {
            Self::SalesPerformance => {
                "SELECT \
                    SUM(revenue_current_quarter) AS total_sales, \
                    ROUND(AVG((CAST(revenue_current_quarter AS REAL) - revenue_previous_quarter) / revenue_previous_quarter * 100), 2) AS avg_growth_rate, \
                    (SELECT product_category FROM commercial_performance ORDER BY revenue_current_quarter DESC LIMIT 1) AS top_category \
                 FROM commercial_performance"
            }
            Self::MarketingEfficiency => {
                "SELECT \
                    AVG(return_on_ad_spend) AS avg_roi, \
                    SUM(monthly_budget) AS total_spend, \
                    AVG(conversion_to_customer_percent) AS avg_conversion, \
                    SUM(leads_generated) AS total_leads, \
                    (SELECT channel FROM marketing_spend_performance ORDER BY return_on_ad_spend DESC LIMIT 1) AS best_channel \
                 FROM marketing_spend_performance"
            }
            Self::CustomerInsights => {
                "SELECT \
                    AVG(satisfaction_score) AS avg_satisfaction, \
                    AVG(churn_rate_percent) AS avg_churn, \
                    AVG(lifetime_value) AS avg_ltv, \
                    (SELECT segment FROM customer_segments ORDER BY revenue_contribution_percent DESC LIMIT 1) AS top_segment \
                 FROM customer_segments"
            }
            Self::ProductPerformance => {
                "SELECT \
                    (SELECT product_line FROM product_performance ORDER BY revenue DESC LIMIT 1) AS top_product, \
                    SUM(revenue) AS total_revenue, \
                    AVG(customer_rating) AS avg_rating, \
                    AVG(profit_margin_percent) AS avg_margin \
                 FROM product_performance"
            }
            Self::FinancialOverview => {
                "SELECT \
                    current_value AS total_revenue, \
                    variance_percent AS growth_rate, \
                    performance_rating AS rating \
                 FROM financial_kpis \
                 WHERE metric = 'Total Revenue'"
            }
        }
    }

    /// Map from the template's result columns to canonical metric names.
    pub fn metric_columns(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Self::SalesPerformance => &[
                ("total_sales", "total_sales"),
                ("avg_growth_rate", "growth_rate"),
                ("top_category", "top_category"),
            ],
            Self::MarketingEfficiency => &[
                ("avg_roi", "marketing_roi"),
                ("total_spend", "marketing_spend"),
                ("avg_conversion", "conversion_rate"),
                ("total_leads", "total_leads"),
                ("best_channel", "best_channel"),
            ],
            Self::CustomerInsights => &[
                ("avg_satisfaction", "satisfaction_score"),
                ("avg_churn", "churn_rate"),
                ("avg_ltv", "lifetime_value"),
                ("top_segment", "top_segment"),
            ],
            Self::ProductPerformance => &[
                ("top_product", "top_product"),
                ("total_revenue", "product_revenue"),
                ("avg_rating", "product_rating"),
                ("avg_margin", "profit_margin"),
            ],
            Self::FinancialOverview => &[
                ("total_revenue", "reported_revenue"),
                ("growth_rate", "revenue_growth"),
                ("rating", "performance_rating"),
            ],
        }
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
