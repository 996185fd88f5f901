//! Deterministic five-forces assessment from the metrics map.
//!
//! Every force reads at most three metrics. Missing metrics read as `0.0`,
//! which biases the assessment towards higher pressure rather than failing.

use crate::domain::models::{
    Attractiveness, CompetitiveForces, ForceAssessment, ForceLevel, MetricsMap, SATISFACTION_SCALE,
};

fn force(level: ForceLevel, rationale: String) -> ForceAssessment {
    ForceAssessment { level, rationale }
}

/// Rivalry is HIGH when at least two of {low growth, low margin, high churn} hold.
pub fn competitive_rivalry(metrics: &MetricsMap) -> ForceAssessment {
    let growth = metrics.number("growth_rate");
    let margin = metrics.number("profit_margin");
    let churn = metrics.number("churn_rate");
    let signals = [growth < 5.0, margin < 15.0, churn > 10.0]
        .into_iter()
        .filter(|hit| *hit)
        .count();

    let level = match signals {
        0 => ForceLevel::Low,
        1 => ForceLevel::Medium,
        _ => ForceLevel::High,
    };
    force(
        level,
        format!("{signals} of 3 pressure signals (growth {growth:.1}%, margin {margin:.1}%, churn {churn:.1}%)"),
    )
}

pub fn supplier_power(metrics: &MetricsMap) -> ForceAssessment {
    let margin = metrics.number("profit_margin");
    let level = if margin > 20.0 {
        ForceLevel::Low
    } else if margin > 10.0 {
        ForceLevel::Medium
    } else {
        ForceLevel::High
    };
    force(level, format!("profit margin {margin:.1}%"))
}

pub fn buyer_power(metrics: &MetricsMap) -> ForceAssessment {
    let churn = metrics.number("churn_rate");
    let satisfaction = metrics.number("satisfaction_score");
    let level = if churn > 15.0 || satisfaction < 6.0 {
        ForceLevel::High
    } else if churn > 8.0 || satisfaction < 8.0 {
        ForceLevel::Medium
    } else {
        ForceLevel::Low
    };
    force(
        level,
        format!("churn {churn:.1}%, satisfaction {satisfaction:.2}/{SATISFACTION_SCALE}"),
    )
}

pub fn threat_of_substitutes(metrics: &MetricsMap) -> ForceAssessment {
    let rating = metrics.number("product_rating");
    let conversion = metrics.number("conversion_rate");
    let level = match (rating < 3.5, conversion < 2.0) {
        (true, true) => ForceLevel::High,
        (true, false) | (false, true) => ForceLevel::Medium,
        (false, false) => ForceLevel::Low,
    };
    force(
        level,
        format!("product rating {rating:.2}, conversion {conversion:.2}%"),
    )
}

pub fn threat_of_new_entrants(metrics: &MetricsMap) -> ForceAssessment {
    let growth = metrics.number("growth_rate");
    let roi = metrics.number("marketing_roi");
    let level = match (growth > 15.0, roi > 3.0) {
        (true, true) => ForceLevel::High,
        (true, false) | (false, true) => ForceLevel::Medium,
        (false, false) => ForceLevel::Low,
    };
    force(level, format!("market growth {growth:.1}%, marketing ROI {roi:.2}x"))
}

/// Attractiveness from the average force score: lower pressure is better.
pub fn attractiveness(average_score: f64) -> Attractiveness {
    if average_score <= 2.5 {
        Attractiveness::High
    } else if average_score <= 3.5 {
        Attractiveness::Medium
    } else {
        Attractiveness::Low
    }
}

pub fn assess(metrics: &MetricsMap) -> CompetitiveForces {
    let competitive_rivalry = competitive_rivalry(metrics);
    let supplier_power = supplier_power(metrics);
    let buyer_power = buyer_power(metrics);
    let threat_of_substitutes = threat_of_substitutes(metrics);
    let threat_of_new_entrants = threat_of_new_entrants(metrics);

    let total: u32 = [
        &competitive_rivalry,
        &supplier_power,
        &buyer_power,
        &threat_of_substitutes,
        &threat_of_new_entrants,
    ]
    .iter()
    .map(|f| u32::from(f.level.score()))
    .sum();
    let average_score = f64::from(total) / 5.0;

    CompetitiveForces {
        competitive_rivalry,
        supplier_power,
        buyer_power,
        threat_of_substitutes,
        threat_of_new_entrants,
        average_score,
        attractiveness: attractiveness(average_score),
    }
}
