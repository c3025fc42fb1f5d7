//! Simulator error types

use delivery_domain::DomainError;
use thiserror::Error;

/// Simulator errors
#[derive(Debug, Error)]
pub enum SimError {
    #[error("Failed to read scenario {path}: {source}")]
    ScenarioIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid scenario: {0}")]
    ScenarioParse(#[from] serde_json::Error),

    #[error("Invalid entity #{index} in scenario: {source}")]
    ScenarioEntity {
        index: usize,
        #[source]
        source: DomainError,
    },

    #[error("Invalid configuration value for {key}: {value}")]
    Config { key: &'static str, value: String },
}

pub type Result<T> = std::result::Result<T, SimError>;
