use std::sync::Arc;

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum LichenError {
    #[error("I/O Error: {0}")]
    Io(#[from] Arc<std::io::Error>),

    #[error("JSON Parsing Error: {0}")]
    Json(#[from] Arc<serde_json::Error>),

    #[error("TOML Parsing Error: {0}")]
    Toml(#[from] Arc<toml::de::Error>),

    #[error("Configuration Error: {0}")]
    Config(String),

    #[error("Resource Not Found: {0}")]
    NotFound(String),

    /// Metadata for an artifact could not be obtained from the provider.
    #[error("Metadata Error for '{0}': {1}")]
    Metadata(String, String),

    /// The root artifact of a run could not be resolved.
    #[error("Resolution Error: {0}")]
    Resolution(String),

    #[error("Parsing Error in {0}: {1}")]
    ParseError(&'static str, String),

    #[error("Invalid license(s) found: {0}")]
    InvalidLicenses(String),

    #[error("Generic Error: {0}")]
    Generic(String),
}

impl From<std::io::Error> for LichenError {
    fn from(err: std::io::Error) -> Self {
        LichenError::Io(Arc::new(err))
    }
}

impl From<serde_json::Error> for LichenError {
    fn from(err: serde_json::Error) -> Self {
        LichenError::Json(Arc::new(err))
    }
}

impl From<toml::de::Error> for LichenError {
    fn from(err: toml::de::Error) -> Self {
        LichenError::Toml(Arc::new(err))
    }
}

pub type Result<T> = std::result::Result<T, LichenError>;
