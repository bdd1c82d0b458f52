//! Output module for scan results
//!
//! This module handles:
//! - Exporting resolved ads as JSON
//! - Printing the console report and run summary
//! - Building the notification message text

mod json;
mod message;
mod report;

pub use json::{export_json, read_export};
pub use message::notification_message;
pub use report::{
    format_ad_report, format_redirect_chain, format_run_summary, print_report,
    print_run_summary, ReportOptions,
};

use thiserror::Error;

/// Errors that can occur while writing output
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;
