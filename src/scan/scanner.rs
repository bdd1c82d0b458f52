use super::worker::{panic_message, EngineJob, EngineReport, WorkerError, WorkerFailure};
use super::ScanSettings;
use crate::ads::ResolvedAd;
use crate::config::QueryConfig;
use crate::engine::AdSource;
use crate::output::notification_message;
use crate::redirect::RedirectWalker;
use crate::resolver::ResolverRegistry;
use crate::url::DomainAllowList;
use crate::SeadsError;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use tokio_util::sync::CancellationToken;

/// Results of one query across all dispatched engines
#[derive(Debug, Default)]
pub struct QueryOutcome {
    pub ads: Vec<ResolvedAd>,
    pub failures: Vec<WorkerFailure>,
    pub engines_dispatched: usize,
}

impl QueryOutcome {
    /// True when engines were dispatched and none of them succeeded
    ///
    /// Cancelled workers do not count as failures.
    pub fn all_failed(&self) -> bool {
        self.engines_dispatched > 0
            && self
                .failures
                .iter()
                .filter(|failure| !failure.error.is_cancellation())
                .count()
                == self.engines_dispatched
    }
}

/// Results of a whole run
#[derive(Debug, Default)]
pub struct ScanOutcome {
    /// Every classified ad, query by query
    pub ads: Vec<ResolvedAd>,

    pub failures: Vec<WorkerFailure>,

    pub queries_completed: usize,

    /// The run was cancelled (Ctrl-C or deadline) before finishing
    pub cancelled: bool,

    /// Set when a query had every engine fail; later queries were skipped
    pub aborted: Option<SeadsError>,
}

impl ScanOutcome {
    pub fn unexpected(&self) -> impl Iterator<Item = &ResolvedAd> {
        self.ads.iter().filter(|ad| !ad.expected)
    }

    pub fn unexpected_count(&self) -> usize {
        self.unexpected().count()
    }

    /// Notification text listing the unexpected ads
    ///
    /// Returns `None` when every ad was expected.
    pub fn notification(&self, created_at: DateTime<Utc>) -> Option<String> {
        let unexpected: Vec<&ResolvedAd> = self.unexpected().collect();
        if unexpected.is_empty() {
            return None;
        }
        Some(notification_message(&unexpected, created_at))
    }

    /// Ad count per engine, sorted by engine name
    pub fn per_engine(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for ad in &self.ads {
            *counts.entry(ad.engine().to_string()).or_insert(0) += 1;
        }
        counts
    }
}

/// Search orchestrator
///
/// For each query, runs one worker per engine. Workers share a run-wide
/// permit pool sized by [`ScanSettings::concurrency`], own everything they
/// mutate, and report whole engine batches over a channel to a single
/// aggregator. A worker that errors or panics only loses its own engine's
/// ads. Queries run one after another.
pub struct Scanner {
    source: Arc<dyn AdSource>,
    registry: Arc<ResolverRegistry>,
    walker: Option<Arc<RedirectWalker>>,
    settings: Arc<ScanSettings>,
    permits: Arc<Semaphore>,
}

impl Scanner {
    /// Creates a scanner that does not walk redirect chains
    ///
    /// # Arguments
    ///
    /// * `source` - Produces ad observations per engine and query
    /// * `registry` - Offline ad-redirect decoders
    /// * `settings` - Concurrency, engines and allow-list defaults
    pub fn new(
        source: Arc<dyn AdSource>,
        registry: ResolverRegistry,
        settings: ScanSettings,
    ) -> Self {
        let permits = Arc::new(Semaphore::new(settings.concurrency.max(1)));
        Self {
            source,
            registry: Arc::new(registry),
            walker: None,
            settings: Arc::new(settings),
            permits,
        }
    }

    /// Walks each ad's redirect chain with `walker`
    ///
    /// Ignored in no-redirection mode.
    pub fn with_walker(mut self, walker: RedirectWalker) -> Self {
        if self.settings.no_redirection {
            tracing::debug!("No-redirection mode, redirect chains will not be walked");
        } else {
            self.walker = Some(Arc::new(walker));
        }
        self
    }

    pub fn settings(&self) -> &ScanSettings {
        &self.settings
    }

    /// Runs one query against every configured engine
    pub async fn scan_query(&self, query: &QueryConfig, cancel: &CancellationToken) -> QueryOutcome {
        let allow_list = Arc::new(DomainAllowList::merge(
            &self.settings.global_exclusions,
            &query.expected_domains,
        ));
        let engines = &self.settings.engines;
        tracing::info!(
            "Scanning '{}' on {} engines ({} allowed domains)",
            query.query,
            engines.len(),
            allow_list.len()
        );

        let (tx, mut rx) = mpsc::channel::<EngineReport>(engines.len().max(1));

        for &engine in engines {
            let job = EngineJob {
                engine,
                query: query.query.clone(),
                source: Arc::clone(&self.source),
                registry: Arc::clone(&self.registry),
                walker: self.walker.clone(),
                allow_list: Arc::clone(&allow_list),
                user_agent: self.settings.user_agent.clone(),
                no_redirection: self.settings.no_redirection,
                permits: Arc::clone(&self.permits),
                cancel: cancel.clone(),
            };
            let tx = tx.clone();

            tokio::spawn(async move {
                // The inner task isolates panics from the reporting task.
                let result = match tokio::spawn(job.run()).await {
                    Ok(result) => result,
                    Err(e) if e.is_panic() => Err(WorkerError::Panicked(panic_message(e.into_panic()))),
                    Err(e) => Err(WorkerError::Aborted(e.to_string())),
                };
                let _ = tx
                    .send(EngineReport {
                        engine: engine.name,
                        result,
                    })
                    .await;
            });
        }
        drop(tx);

        let mut outcome = QueryOutcome {
            engines_dispatched: engines.len(),
            ..QueryOutcome::default()
        };

        while let Some(report) = rx.recv().await {
            match report.result {
                Ok(ads) => {
                    tracing::info!(
                        "{} returned {} ads for '{}'",
                        report.engine,
                        ads.len(),
                        query.query
                    );
                    outcome.ads.extend(ads);
                }
                Err(error) => {
                    if error.is_cancellation() {
                        tracing::debug!("{} cancelled for '{}'", report.engine, query.query);
                    } else {
                        tracing::error!("{} failed for '{}': {}", report.engine, query.query, error);
                    }
                    outcome.failures.push(WorkerFailure {
                        engine: report.engine.to_string(),
                        query: query.query.clone(),
                        error,
                    });
                }
            }
        }

        outcome
    }

    /// Runs every query in order
    ///
    /// Stops early when the token is cancelled or when every engine failed
    /// for a query; whatever was collected up to then is returned.
    pub async fn scan(&self, queries: &[QueryConfig], cancel: &CancellationToken) -> ScanOutcome {
        let mut outcome = ScanOutcome::default();

        for query in queries {
            if cancel.is_cancelled() {
                outcome.cancelled = true;
                break;
            }

            let result = self.scan_query(query, cancel).await;
            let all_failed = result.all_failed();
            let failures = result.failures.len();
            outcome.ads.extend(result.ads);
            outcome.failures.extend(result.failures);

            if cancel.is_cancelled() {
                outcome.cancelled = true;
                break;
            }

            if all_failed {
                let error = SeadsError::AllEnginesFailed {
                    query: query.query.clone(),
                    failures,
                };
                tracing::error!("{}", error);
                outcome.aborted = Some(error);
                break;
            }

            outcome.queries_completed += 1;
        }

        tracing::info!(
            "Scan finished: {} ads, {} unexpected, {} worker failures",
            outcome.ads.len(),
            outcome.unexpected_count(),
            outcome.failures.len()
        );
        outcome
    }
}
