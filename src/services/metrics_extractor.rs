//! Flattens a structured result set into the canonical metrics map.

use serde_json::Value;
use std::collections::HashSet;

use crate::domain::models::{MetricsMap, StructuredResultSet};

/// Build the metrics map from every successful outcome.
///
/// When several requests hit the same template, the first success wins.
/// Null cells and unknown columns are skipped, so absent metrics fall back
/// to the map's sentinels.
pub fn extract_metrics(results: &StructuredResultSet) -> MetricsMap {
    let mut metrics = MetricsMap::new();
    let mut seen = HashSet::new();

    for outcome in results.results.iter().filter(|o| o.is_success()) {
        if !seen.insert(outcome.template) {
            continue;
        }
        let Some(row) = outcome.data.as_ref() else {
            continue;
        };
        for (column, metric) in outcome.template.metric_columns() {
            match row.get(*column) {
                Some(Value::Number(n)) => {
                    if let Some(f) = n.as_f64() {
                        metrics.insert_number(*metric, f);
                    }
                }
                Some(Value::String(s)) if !s.trim().is_empty() => {
                    metrics.insert_text(*metric, s.trim());
                }
                Some(Value::Bool(b)) => metrics.insert_number(*metric, f64::from(u8::from(*b))),
                _ => {}
            }
        }
    }
    metrics
}
