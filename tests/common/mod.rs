//! Common test utilities for integration tests
//!
//! Provides an in-memory business database seeded with the five canonical
//! tables, scripted model replies, and temp report directories.

#![allow(dead_code)]

use std::sync::Arc;

use insight_loop::adapters::llm::{ScriptedLlmClient, ScriptedReply};
use insight_loop::adapters::sqlite::{create_test_pool, SqliteDataStore};
use insight_loop::domain::models::{Config, LlmConfig};
use tempfile::TempDir;

/// Create a temporary directory for test isolation
pub fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

const SEED: &[&str] = &[
    "CREATE TABLE commercial_performance (
        region TEXT, product_category TEXT,
        revenue_current_quarter INTEGER, revenue_previous_quarter INTEGER)",
    "INSERT INTO commercial_performance VALUES
        ('North', 'Electronics', 120000, 100000),
        ('South', 'Apparel', 80000, 80000),
        ('West', 'Home', 50000, 40000)",
    "CREATE TABLE marketing_spend_performance (
        channel TEXT, monthly_budget INTEGER, return_on_ad_spend REAL,
        conversion_to_customer_percent REAL, leads_generated INTEGER)",
    "INSERT INTO marketing_spend_performance VALUES
        ('Search', 20000, 4.5, 3.2, 900),
        ('Social', 15000, 2.5, 1.8, 1200)",
    "CREATE TABLE customer_segments (
        segment TEXT, satisfaction_score REAL, churn_rate_percent REAL,
        lifetime_value REAL, revenue_contribution_percent REAL)",
    "INSERT INTO customer_segments VALUES
        ('Enterprise', 8.6, 4.0, 52000.0, 55.0),
        ('SMB', 7.4, 9.0, 12000.0, 30.0)",
    "CREATE TABLE product_performance (
        product_line TEXT, revenue INTEGER, customer_rating REAL, profit_margin_percent REAL)",
    "INSERT INTO product_performance VALUES
        ('Laptops', 90000, 4.6, 22.0),
        ('Headphones', 30000, 4.1, 35.0)",
    "CREATE TABLE financial_kpis (
        metric TEXT, current_value REAL, variance_percent REAL, performance_rating TEXT)",
    "INSERT INTO financial_kpis VALUES
        ('Total Revenue', 250000.0, 13.6, 'Above Target'),
        ('Operating Margin', 18.0, 1.2, 'On Target')",
];

/// In-memory store holding the five business tables.
pub async fn seeded_store() -> Arc<SqliteDataStore> {
    let pool = create_test_pool().await.expect("Failed to create test pool");
    for statement in SEED {
        sqlx::query(statement)
            .execute(&pool)
            .await
            .expect("Failed to seed business tables");
    }
    Arc::new(SqliteDataStore::new(pool))
}

/// In-memory store with no tables at all.
pub async fn empty_store() -> Arc<SqliteDataStore> {
    let pool = create_test_pool().await.expect("Failed to create test pool");
    Arc::new(SqliteDataStore::new(pool))
}

/// A narrative long enough to be accepted from the model.
pub fn narrative(tag: &str) -> String {
    format!(
        "Draft {tag}: Electronics led growth in the North while Search delivered the best ROI. \
         Prioritize enterprise retention and rebalance social spend."
    )
}

/// A judge reply scoring the report at `score`.
pub fn judgment(score: f64) -> String {
    serde_json::json!({
        "anomalies": [],
        "similarities": ["growth figure matches data"],
        "confidence_score": 0.8,
        "authenticity_score": 0.75,
        "data_integration_score": 0.7,
        "quality_score": score,
        "detailed_analysis": "Grounded in the provided metrics.",
        "overall_assessment": format!("Scored {score}"),
        "improvement_suggestions": ["Quantify the churn impact"],
        "personalization_evidence": ["cites Electronics"],
        "generic_indicators": [],
        "key_inconsistencies": []
    })
    .to_string()
}

/// Judge client replying with the given scores in order.
pub fn scripted_judge(scores: &[f64]) -> Arc<ScriptedLlmClient> {
    Arc::new(ScriptedLlmClient::with_replies(
        "judge",
        scores.iter().map(|s| ScriptedReply::Text(judgment(*s))),
    ))
}

/// Synthesis client that always returns a valid narrative.
pub fn scripted_writer() -> Arc<ScriptedLlmClient> {
    Arc::new(ScriptedLlmClient::new("writer").repeating(ScriptedReply::Text(narrative("n"))))
}

fn scripted_llm() -> LlmConfig {
    LlmConfig {
        provider: "scripted".to_string(),
        model: "scripted".to_string(),
        base_url: None,
        api_key_env: "INSIGHT_TEST_UNUSED_KEY".to_string(),
        timeout_secs: 5,
        max_retries: 0,
        max_tokens: 512,
        temperature: None,
    }
}

/// Configuration writing reports under `dir` with scripted model providers.
pub fn test_config(dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.reports.output_dir = dir.path().join("reports").display().to_string();
    config.database.path = dir.path().join("business.db").display().to_string();
    config.synthesis = scripted_llm();
    config.judge = scripted_llm();
    config.workflow.synthesis_timeout_secs = 5;
    config.workflow.judge_timeout_secs = 5;
    config
}
