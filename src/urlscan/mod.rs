//! URL-reputation submission
//!
//! Unexpected ads can be handed to a urlscan.io compatible service; the
//! service's answer is attached to the ad and ends up in the export.

mod submitter;

pub use submitter::{SubmitReport, UrlScanSubmitter};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The scanning service's answer to a submission
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Submission {
    pub message: String,
    pub uuid: String,

    /// Human-readable result page
    pub result: String,

    /// Machine-readable result endpoint
    pub api: String,

    pub visibility: String,
    pub options: SubmissionOptions,

    /// The URL the service will scan
    pub url: String,

    pub country: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubmissionOptions {
    pub useragent: String,
}

/// Errors that can occur while submitting a URL
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Submission of {url} rejected with status {status}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },
}
