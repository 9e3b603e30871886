//! # Configuration System
//!
//! Centralized configuration for the PharmaLens reporting system.
//!
//! Configuration is loaded from environment variables (12-factor app
//! principles) with builder-style overrides for tests and embedding.

mod config;

pub use config::{
    AppConfig, AppConfigBuilder, ConfigError, ConsensusPolicy, RetryPolicy, DEFAULT_LLM_MODEL,
};
