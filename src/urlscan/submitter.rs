use super::{SubmitError, Submission};
use crate::ads::ResolvedAd;
use crate::config::UrlScanConfig;
use reqwest::Client;
use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Serialize)]
struct SubmitRequest<'a> {
    url: &'a str,
    visibility: &'a str,
    tags: &'a [String],
}

/// Counts of one [`UrlScanSubmitter::submit_all`] pass
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SubmitReport {
    pub submitted: usize,
    pub failed: usize,
}

/// Client for the URL-reputation scanning service
#[derive(Debug, Clone)]
pub struct UrlScanSubmitter {
    client: Client,
    scan_url: String,
    token: String,
    visibility: String,
    tags: Vec<String>,
    delay: Duration,
}

impl UrlScanSubmitter {
    /// Creates a submitter from the `[urlscan]` configuration section
    pub fn from_config(client: Client, config: &UrlScanConfig) -> Self {
        Self {
            client,
            scan_url: config.scan_url.clone(),
            token: config.token.clone(),
            visibility: config.visibility.clone(),
            tags: config.tag_list(),
            delay: Duration::from_secs(config.delay_secs),
        }
    }

    /// Submits one URL for scanning
    ///
    /// # Returns
    ///
    /// * `Ok(Submission)` - The service accepted the URL
    /// * `Err(SubmitError)` - Transport failure, non-200 status or an unreadable body
    pub async fn submit(&self, url: &str) -> Result<Submission, SubmitError> {
        let body = SubmitRequest {
            url,
            visibility: &self.visibility,
            tags: &self.tags,
        };

        let response = self
            .client
            .post(&self.scan_url)
            .header("API-Key", &self.token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(SubmitError::Status {
                url: url.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let submission: Submission = response.json().await?;
        tracing::info!("Submitted {} for scanning: {}", url, submission.result);
        Ok(submission)
    }

    /// Submits the original URL of every unexpected ad and attaches the
    /// service's answer
    ///
    /// The scraped ad URL is what gets submitted, so the service walks the
    /// ad network's redirects itself. Ads sharing the same original URL
    /// share one submission. Failures are logged and counted, never fatal.
    pub async fn submit_all(
        &self,
        ads: &mut [ResolvedAd],
        cancel: &CancellationToken,
    ) -> SubmitReport {
        let mut report = SubmitReport::default();
        let mut seen: HashMap<String, Option<Submission>> = HashMap::new();

        for ad in ads.iter_mut().filter(|ad| !ad.expected) {
            let target = ad.original_ad_url().to_string();

            if let Some(previous) = seen.get(&target) {
                ad.submission = previous.clone();
                continue;
            }

            if cancel.is_cancelled() {
                tracing::warn!("Submission cancelled after {} URLs", seen.len());
                break;
            }

            if !seen.is_empty() && !self.delay.is_zero() {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(self.delay) => {}
                }
            }

            let result = match self.submit(&target).await {
                Ok(submission) => {
                    report.submitted += 1;
                    Some(submission)
                }
                Err(e) => {
                    tracing::warn!("URL submission failed for {}: {}", target, e);
                    report.failed += 1;
                    None
                }
            };

            ad.submission = result.clone();
            seen.insert(target, result);
        }

        report
    }
}
