use serde::{Deserialize, Serialize};

/// Main configuration structure for the insight pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Iteration loop limits
    #[serde(default)]
    pub iteration: IterationConfig,

    /// Workflow seeding and stage timeouts
    #[serde(default)]
    pub workflow: WorkflowConfig,

    /// Model used to write the narrative
    #[serde(default = "default_synthesis_llm")]
    pub synthesis: LlmConfig,

    /// Model used to judge the narrative
    #[serde(default = "default_judge_llm")]
    pub judge: LlmConfig,

    /// Report output and narrative caching
    #[serde(default)]
    pub reports: ReportConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            logging: LoggingConfig::default(),
            iteration: IterationConfig::default(),
            workflow: WorkflowConfig::default(),
            synthesis: default_synthesis_llm(),
            judge: default_judge_llm(),
            reports: ReportConfig::default(),
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DatabaseConfig {
    /// Path to `SQLite` database file
    #[serde(default = "default_database_path")]
    pub path: String,

    /// Maximum number of database connections in pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Per-query timeout in seconds
    #[serde(default = "default_query_timeout_secs")]
    pub query_timeout_secs: u64,
}

fn default_database_path() -> String {
    ".insight/business.db".to_string()
}

const fn default_max_connections() -> u32 {
    5
}

const fn default_query_timeout_secs() -> u64 {
    30
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            max_connections: default_max_connections(),
            query_timeout_secs: default_query_timeout_secs(),
        }
    }
}

impl DatabaseConfig {
    /// Connection URL understood by sqlx.
    pub fn url(&self) -> String {
        if self.path.starts_with("sqlite:") {
            self.path.clone()
        } else {
            format!("sqlite:{}", self.path)
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rolling log files (stderr only when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<String>,

    /// Rotation policy for file logs: daily, hourly, never
    #[serde(default = "default_rotation")]
    pub rotation: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_rotation() -> String {
    "daily".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
            rotation: default_rotation(),
        }
    }
}

/// Bounds of the synthesize-then-judge loop
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct IterationConfig {
    /// Hard cap on synthesize-then-judge cycles
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Quality score at or above which the loop stops early
    #[serde(default = "default_quality_threshold")]
    pub quality_threshold: f64,

    /// Minimum score gain between the last two cycles to keep going
    #[serde(default = "default_stagnation_delta")]
    pub stagnation_delta: f64,
}

const fn default_max_iterations() -> u32 {
    3
}

const fn default_quality_threshold() -> f64 {
    0.8
}

const fn default_stagnation_delta() -> f64 {
    0.05
}

impl Default for IterationConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            quality_threshold: default_quality_threshold(),
            stagnation_delta: default_stagnation_delta(),
        }
    }
}

/// Workflow seeding and per-stage timeouts
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct WorkflowConfig {
    /// Natural-language data requests sent to the aggregator
    #[serde(default = "default_data_requests")]
    pub data_requests: Vec<String>,

    /// Delimiter used to join requests into one combined instruction
    #[serde(default = "default_request_delimiter")]
    pub request_delimiter: String,

    /// Run data requests concurrently (output order is preserved either way)
    #[serde(default)]
    pub parallel_queries: bool,

    /// Timeout for one synthesis call in seconds
    #[serde(default = "default_synthesis_timeout_secs")]
    pub synthesis_timeout_secs: u64,

    /// Timeout for one judgment call in seconds
    #[serde(default = "default_judge_timeout_secs")]
    pub judge_timeout_secs: u64,
}

fn default_data_requests() -> Vec<String> {
    vec![
        "Get total sales, quarterly growth rate, top-selling region, and best product category."
            .to_string(),
        "Get total social media engagement, total followers, leads generated, and the best-performing platform."
            .to_string(),
        "Get the average customer satisfaction score, total support tickets, and customer retention rate."
            .to_string(),
        "Get total marketing spend, overall conversion rate, cost per lead, and marketing ROI."
            .to_string(),
    ]
}

fn default_request_delimiter() -> String {
    "|||".to_string()
}

const fn default_synthesis_timeout_secs() -> u64 {
    180
}

const fn default_judge_timeout_secs() -> u64 {
    120
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            data_requests: default_data_requests(),
            request_delimiter: default_request_delimiter(),
            parallel_queries: false,
            synthesis_timeout_secs: default_synthesis_timeout_secs(),
            judge_timeout_secs: default_judge_timeout_secs(),
        }
    }
}

/// LLM provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LlmConfig {
    /// Provider: anthropic, mistral, openai, scripted
    pub provider: String,

    /// Model identifier
    pub model: String,

    /// Base URL override (for proxies and tests)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Environment variable holding the API key
    pub api_key_env: String,

    /// HTTP request timeout in seconds
    #[serde(default = "default_llm_timeout_secs")]
    pub timeout_secs: u64,

    /// Retries for transient failures
    #[serde(default = "default_llm_max_retries")]
    pub max_retries: u32,

    /// Maximum tokens to generate
    #[serde(default = "default_llm_max_tokens")]
    pub max_tokens: u32,

    /// Sampling temperature
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

const fn default_llm_timeout_secs() -> u64 {
    60
}

const fn default_llm_max_retries() -> u32 {
    2
}

const fn default_llm_max_tokens() -> u32 {
    2048
}

fn default_synthesis_llm() -> LlmConfig {
    LlmConfig {
        provider: "anthropic".to_string(),
        model: "claude-sonnet-4-5-20250929".to_string(),
        base_url: None,
        api_key_env: "ANTHROPIC_API_KEY".to_string(),
        timeout_secs: default_llm_timeout_secs(),
        max_retries: default_llm_max_retries(),
        max_tokens: default_llm_max_tokens(),
        temperature: Some(0.4),
    }
}

fn default_judge_llm() -> LlmConfig {
    LlmConfig {
        provider: "mistral".to_string(),
        model: "mistral-large-latest".to_string(),
        base_url: None,
        api_key_env: "MISTRAL_API_KEY".to_string(),
        timeout_secs: default_llm_timeout_secs(),
        max_retries: default_llm_max_retries(),
        max_tokens: 3000,
        temperature: Some(0.1),
    }
}

impl LlmConfig {
    /// Read the API key from the configured environment variable.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }
}

/// Report output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ReportConfig {
    /// Directory receiving rendered reports
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Maximum cached first-pass narratives
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: u64,

    /// Cached narrative lifetime in seconds
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
}

fn default_output_dir() -> String {
    "reports".to_string()
}

const fn default_cache_capacity() -> u64 {
    64
}

const fn default_cache_ttl_secs() -> u64 {
    3600
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            cache_capacity: default_cache_capacity(),
            cache_ttl_secs: default_cache_ttl_secs(),
        }
    }
}
