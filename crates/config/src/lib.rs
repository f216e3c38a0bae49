//! Configuration management for the voucher discovery engine
//!
//! Supports loading configuration from:
//! - TOML files
//! - Environment variables (VOUCHER_SEARCH_ prefix)
//! - Compiled-in defaults matching the reference deployment

pub mod settings;

pub use settings::{
    AdaptiveDeltas, EmbeddingSettings, GeneratorSettings, IndexFieldWeights, LocationEntry,
    RagSettings, RetrievalSettings, Settings, load_settings,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    #[error("failed to parse configuration: {0}")]
    ParseError(String),

    #[error("invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

impl From<ConfigError> for voucher_search_core::Error {
    fn from(err: ConfigError) -> Self {
        voucher_search_core::Error::Config(err.to_string())
    }
}
