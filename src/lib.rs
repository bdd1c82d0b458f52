//! Seads: a search engine ad scanner
//!
//! This crate probes search result pages for paid placements, unwraps the
//! ad-network redirect encodings sitting in front of each ad, and flags
//! placements whose landing domain is not on an operator-defined allow-list.

pub mod ads;
pub mod config;
pub mod engine;
pub mod notify;
pub mod output;
pub mod redirect;
pub mod resolver;
pub mod scan;
pub mod url;
pub mod urlscan;

use thiserror::Error;

/// Main error type for Seads operations
#[derive(Debug, Error)]
pub enum SeadsError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("Every engine failed for query '{query}' ({failures} failures)")]
    AllEnginesFailed { query: String, failures: usize },

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid domain pattern: {0}")]
    InvalidPattern(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Failed to parse URL {url}: {source}")]
    Parse {
        url: String,
        source: ::url::ParseError,
    },
}

/// Result type alias for Seads operations
pub type Result<T> = std::result::Result<T, SeadsError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use ads::{AdObservation, ResolvedAd};
pub use config::Config;
pub use resolver::{Resolution, ResolverRegistry};
pub use scan::{ScanOutcome, ScanSettings, Scanner};
pub use url::{extract_domain, is_expected, DomainAllowList};
