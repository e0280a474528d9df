//! Error types for the medscrape crate

use thiserror::Error;

/// Result type for medscrape operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for medscrape operations
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Filesystem error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be parsed
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration values are inconsistent
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Category or article crawling error
    #[error("Crawl error: {0}")]
    Crawl(String),
}
