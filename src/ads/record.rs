use crate::resolver::Resolution;
use crate::urlscan::Submission;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One paid placement as seen on a results page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdObservation {
    pub engine: String,

    pub query: String,

    /// The ad link exactly as scraped
    #[serde(rename = "OriginalAdURL")]
    pub original_ad_url: String,

    #[serde(rename = "time")]
    pub observed_at: DateTime<Utc>,

    /// Only filled for engines exposing ad-transparency data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub advertiser: Option<String>,

    #[serde(rename = "location", default, skip_serializing_if = "Option::is_none")]
    pub advertiser_location: Option<String>,
}

impl AdObservation {
    /// Creates an observation stamped with the current time
    pub fn new(
        engine: impl Into<String>,
        query: impl Into<String>,
        original_ad_url: impl Into<String>,
    ) -> Self {
        Self {
            engine: engine.into(),
            query: query.into(),
            original_ad_url: original_ad_url.into(),
            observed_at: Utc::now(),
            advertiser: None,
            advertiser_location: None,
        }
    }

    /// Attaches advertiser name and location, dropping blank values
    pub fn with_advertiser(mut self, name: Option<String>, location: Option<String>) -> Self {
        self.advertiser = name.filter(|n| !n.trim().is_empty());
        self.advertiser_location = location.filter(|l| !l.trim().is_empty());
        self
    }
}

/// An observation plus where it leads and whether that is allowed
///
/// Serialized flat, so an export entry carries the observation's fields
/// next to the resolution fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedAd {
    #[serde(flatten)]
    pub observation: AdObservation,

    #[serde(rename = "final-domain-url", default)]
    pub final_domain: String,

    #[serde(rename = "final-redirect-url", default)]
    pub final_redirect_url: String,

    /// Empty when the chain was not walked
    #[serde(rename = "redirect-chain", default)]
    pub redirect_chain: Vec<String>,

    #[serde(default)]
    pub expected: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submission: Option<Submission>,
}

impl ResolvedAd {
    /// Builds a record from an observation and its offline resolution
    pub fn from_resolution(observation: AdObservation, resolution: Resolution) -> Self {
        Self {
            observation,
            final_domain: resolution.final_domain,
            final_redirect_url: resolution.final_url,
            redirect_chain: Vec::new(),
            expected: false,
            submission: None,
        }
    }

    pub fn engine(&self) -> &str {
        &self.observation.engine
    }

    pub fn query(&self) -> &str {
        &self.observation.query
    }

    pub fn original_ad_url(&self) -> &str {
        &self.observation.original_ad_url
    }
}
