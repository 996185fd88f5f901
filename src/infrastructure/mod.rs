//! Infrastructure layer module
//!
//! Process-wide concerns that sit outside the pipeline itself:
//! - Configuration management (figment)
//! - Logging infrastructure (tracing)

pub mod config;
pub mod logging;
