//! One engine's pipeline for one query
//!
//! search -> resolve -> dedupe -> walk redirects -> classify

use crate::ads::{dedupe, ResolvedAd};
use crate::engine::{AdSource, EngineDescriptor, SearchRequest, SourceError};
use crate::redirect::RedirectWalker;
use crate::resolver::ResolverRegistry;
use crate::url::DomainAllowList;
use crate::UrlError;
use std::any::Any;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

/// Why an engine contributed nothing
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("search failed: {0}")]
    Source(#[from] SourceError),

    #[error("deduplication failed: {0}")]
    Dedupe(#[from] UrlError),

    #[error("worker panicked: {0}")]
    Panicked(String),

    #[error("worker aborted: {0}")]
    Aborted(String),
}

impl WorkerError {
    pub fn is_cancellation(&self) -> bool {
        matches!(self, WorkerError::Source(SourceError::Cancelled))
    }
}

/// A failed engine, kept for the run summary
#[derive(Debug)]
pub struct WorkerFailure {
    pub engine: String,
    pub query: String,
    pub error: WorkerError,
}

/// What a worker hands to the aggregator
#[derive(Debug)]
pub(crate) struct EngineReport {
    pub engine: &'static str,
    pub result: Result<Vec<ResolvedAd>, WorkerError>,
}

/// Everything one worker needs, owned so it can move into a task
pub(crate) struct EngineJob {
    pub engine: &'static EngineDescriptor,
    pub query: String,
    pub source: Arc<dyn AdSource>,
    pub registry: Arc<ResolverRegistry>,
    pub walker: Option<Arc<RedirectWalker>>,
    pub allow_list: Arc<DomainAllowList>,
    pub user_agent: Option<String>,
    pub no_redirection: bool,
    pub permits: Arc<Semaphore>,
    pub cancel: CancellationToken,
}

impl EngineJob {
    pub async fn run(self) -> Result<Vec<ResolvedAd>, WorkerError> {
        let _permit = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(SourceError::Cancelled.into()),
            permit = Arc::clone(&self.permits).acquire_owned() => {
                permit.map_err(|_| WorkerError::Aborted("worker pool closed".to_string()))?
            }
        };

        tracing::info!("Searching {} for '{}'", self.engine.name, self.query);
        let request = SearchRequest {
            engine: self.engine,
            query: self.query.clone(),
            user_agent: self.user_agent.clone(),
            no_redirection: self.no_redirection,
        };
        let observations = self.source.search(&request, &self.cancel).await?;

        let resolved = observations
            .into_iter()
            .map(|observation| {
                let resolution = self.registry.resolve(&observation.original_ad_url);
                ResolvedAd::from_resolution(observation, resolution)
            })
            .collect();

        let mut ads = dedupe(resolved)?;

        if let Some(walker) = &self.walker {
            for ad in &mut ads {
                if self.cancel.is_cancelled() {
                    break;
                }
                self.walk_chain(walker, ad).await;
            }
        }

        for ad in &mut ads {
            ad.expected = self.allow_list.is_expected(&ad.final_domain);
            if ad.expected {
                tracing::info!(
                    "[{}] '{}' expected domain: {}",
                    self.engine.name,
                    self.query,
                    ad.final_domain
                );
            } else {
                tracing::info!(
                    "[{}] '{}' unexpected domain: {} ({})",
                    self.engine.name,
                    self.query,
                    ad.final_domain,
                    ad.final_redirect_url
                );
            }
        }

        Ok(ads)
    }

    /// Records the redirect chain of one ad
    ///
    /// When the resolver could not decode the ad URL offline, the end of
    /// the walked chain (itself resolved) becomes the final destination.
    async fn walk_chain(&self, walker: &RedirectWalker, ad: &mut ResolvedAd) {
        let walk = walker.walk(ad.original_ad_url(), &self.cancel).await;

        if let Some(e) = &walk.error {
            tracing::warn!(
                "Partial redirect chain for {} ad {}: {}",
                self.engine.name,
                ad.original_ad_url(),
                e
            );
        }

        if ad.final_redirect_url == ad.original_ad_url() && walk.has_redirects() {
            if let Some(last) = walk.final_url() {
                let resolution = self.registry.resolve(last);
                ad.final_redirect_url = resolution.final_url;
                ad.final_domain = resolution.final_domain;
            }
        }

        ad.redirect_chain = walk.chain;
    }
}

/// Extracts a readable message from a task's panic payload
pub(crate) fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
