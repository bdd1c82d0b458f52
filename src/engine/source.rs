use super::EngineDescriptor;
use crate::ads::AdObservation;
use async_trait::async_trait;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Errors raised while collecting ads from one engine
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{engine} answered with HTTP {status}")]
    Status { engine: String, status: u16 },

    #[error("Invalid selector: {0}")]
    Selector(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Search cancelled")]
    Cancelled,
}

/// One search to run against one engine
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub engine: &'static EngineDescriptor,
    pub query: String,

    /// Overrides the source's default `User-Agent`
    pub user_agent: Option<String>,

    /// Set when redirects will not be followed, for sources that would
    /// otherwise follow them while scraping
    pub no_redirection: bool,
}

/// Something that turns a search into ad observations
///
/// Implementations must return only elements they are confident are paid
/// placements. They own their HTTP clients or browser sessions; the
/// orchestrator shares nothing mutable with them. A panicking
/// implementation only loses its own engine's results.
#[async_trait]
pub trait AdSource: Send + Sync {
    /// Runs one search and returns the ads found on the results page
    ///
    /// # Arguments
    ///
    /// * `request` - Engine, query and per-run options
    /// * `cancel` - Fires when the run is aborted; long waits should stop early
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<AdObservation>)` - Ads found, possibly none
    /// * `Err(SourceError)` - The search itself failed
    async fn search(
        &self,
        request: &SearchRequest,
        cancel: &CancellationToken,
    ) -> Result<Vec<AdObservation>, SourceError>;
}
