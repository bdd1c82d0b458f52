//! Configuration module for Seads
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use seads::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("config.toml")).unwrap();
//! println!("Scanning {} queries", config.queries.len());
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, DiscordConfig, GlobalDomainExclusion, QueryConfig, ScanConfig, SlackConfig,
    TelegramConfig, UrlScanConfig,
};

// Re-export parser functions
pub use parser::{
    compute_config_hash, load_config, load_config_with_hash, parse_config, read_config,
};

pub use validation::{validate, MAX_CONCURRENCY};
