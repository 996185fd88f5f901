//! Flat metrics map keyed by canonical metric name.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Sentinel returned for missing text metrics.
pub const MISSING_TEXT: &str = "N/A";

/// Upper bound of `satisfaction_score`, as stored in the customer segment tables.
pub const SATISFACTION_SCALE: f64 = 10.0;

/// A single resolved metric value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Number(f64),
    Text(String),
}

/// Canonical metrics extracted from the structured result set.
///
/// Reads never fail: absent numbers read as `0.0`, absent text as `"N/A"`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsMap {
    values: BTreeMap<String, MetricValue>,
}

impl MetricsMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_number(&mut self, key: impl Into<String>, value: f64) {
        if value.is_finite() {
            self.values.insert(key.into(), MetricValue::Number(value));
        }
    }

    pub fn insert_text(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), MetricValue::Text(value.into()));
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Numeric metric, or `0.0` when missing or not numeric.
    pub fn number(&self, key: &str) -> f64 {
        match self.values.get(key) {
            Some(MetricValue::Number(n)) => *n,
            Some(MetricValue::Text(t)) => t.trim().replace(',', "").parse().unwrap_or(0.0),
            None => 0.0,
        }
    }

    /// Text metric, or `"N/A"` when missing.
    pub fn text(&self, key: &str) -> String {
        match self.values.get(key) {
            Some(MetricValue::Text(t)) if !t.trim().is_empty() => t.clone(),
            Some(MetricValue::Number(n)) => format_number(*n),
            _ => MISSING_TEXT.to_string(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &MetricValue)> {
        self.values.iter()
    }

    /// Stable content hash of the canonicalized (key-sorted) map.
    pub fn cache_key(&self) -> String {
        let canonical = serde_json::to_string(&self.values).unwrap_or_default();
        hex::encode(Sha256::digest(canonical.as_bytes()))
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{n:.0}")
    } else {
        format!("{n:.2}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_metrics_use_sentinels() {
        let metrics = MetricsMap::new();
        assert!((metrics.number("total_sales") - 0.0).abs() < f64::EPSILON);
        assert_eq!(metrics.text("top_category"), "N/A");
    }

    #[test]
    fn test_numeric_text_is_parsed() {
        let mut metrics = MetricsMap::new();
        metrics.insert_text("total_sales", "1,250,000.5");
        assert!((metrics.number("total_sales") - 1_250_000.5).abs() < 1e-9);
    }

    #[test]
    fn test_non_finite_numbers_are_dropped() {
        let mut metrics = MetricsMap::new();
        metrics.insert_number("growth_rate", f64::NAN);
        assert!(!metrics.contains("growth_rate"));
    }

    #[test]
    fn test_cache_key_is_insertion_order_independent() {
        let mut a = MetricsMap::new();
        a.insert_number("total_sales", 100.0);
        a.insert_text("top_category", "Widgets");

        let mut b = MetricsMap::new();
        b.insert_text("top_category", "Widgets");
        b.insert_number("total_sales", 100.0);

        assert_eq!(a.cache_key(), b.cache_key());

        b.insert_number("total_sales", 101.0);
        assert_ne!(a.cache_key(), b.cache_key());
    }
}
