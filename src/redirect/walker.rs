use reqwest::{header::LOCATION, Client};
use std::collections::HashSet;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Upper bound on recorded redirects for a single walk
pub const DEFAULT_MAX_HOPS: usize = 20;

/// Errors that end a walk early
///
/// The chain gathered up to that point is kept in [`ChainWalk::chain`].
#[derive(Debug, Error)]
pub enum RedirectError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("gave up after {0} redirects")]
    TooManyRedirects(usize),

    #[error("cancelled while requesting {url}")]
    Cancelled { url: String },
}

/// How the walker decides that a `Location` would loop
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoopGuard {
    /// Stop when the new location starts with the URL just requested.
    ///
    /// Cheap, but a legitimate hop deeper into the same path
    /// (`/a` to `/a/b`) is treated as a loop, and an `A -> B -> A` cycle is
    /// only caught by the hop limit.
    #[default]
    Prefix,

    /// Stop when the new location was already part of the chain
    Visited,
}

impl LoopGuard {
    fn allows(self, location: &str, current: &str, visited: &mut HashSet<String>) -> bool {
        if !location.starts_with("http") {
            return false;
        }
        match self {
            LoopGuard::Prefix => !location.starts_with(current),
            LoopGuard::Visited => visited.insert(location.to_string()),
        }
    }
}

/// Outcome of one walk
#[derive(Debug)]
pub struct ChainWalk {
    /// Requested URL followed by every accepted `Location`
    pub chain: Vec<String>,

    /// First error hit, if the walk did not end on a non-redirect response
    pub error: Option<RedirectError>,
}

impl ChainWalk {
    /// Returns true if at least one redirect was followed
    pub fn has_redirects(&self) -> bool {
        self.chain.len() > 1
    }

    /// Last URL reached
    pub fn final_url(&self) -> Option<&str> {
        self.chain.last().map(String::as_str)
    }

    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }
}

/// Follows redirects one request at a time
#[derive(Debug, Clone)]
pub struct RedirectWalker {
    client: Client,
    guard: LoopGuard,
    max_hops: usize,
}

impl RedirectWalker {
    /// Creates a walker around a client built with
    /// [`build_no_redirect_client`](super::build_no_redirect_client)
    pub fn new(client: Client) -> Self {
        Self {
            client,
            guard: LoopGuard::default(),
            max_hops: DEFAULT_MAX_HOPS,
        }
    }

    pub fn with_guard(mut self, guard: LoopGuard) -> Self {
        self.guard = guard;
        self
    }

    pub fn with_max_hops(mut self, max_hops: usize) -> Self {
        self.max_hops = max_hops;
        self
    }

    /// Walks the redirect chain starting at `initial_url`
    ///
    /// Each hop is a plain GET. A response with a 3xx status and a
    /// `Location` that starts with `http` and passes the loop guard extends
    /// the chain; anything else ends the walk.
    ///
    /// Never fails outright: transport errors, the hop limit and
    /// cancellation are reported in [`ChainWalk::error`] next to the partial
    /// chain.
    pub async fn walk(&self, initial_url: &str, cancel: &CancellationToken) -> ChainWalk {
        let mut chain = vec![initial_url.to_string()];
        let mut visited = HashSet::from([initial_url.to_string()]);
        let mut current = initial_url.to_string();

        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    return ChainWalk {
                        chain,
                        error: Some(RedirectError::Cancelled { url: current }),
                    };
                }
                result = self.next_location(&current) => result,
            };

            let location = match next {
                Ok(Some(location)) => location,
                Ok(None) => break,
                Err(source) => {
                    tracing::debug!("Redirect walk stopped at {}: {}", current, source);
                    return ChainWalk {
                        chain,
                        error: Some(RedirectError::Transport {
                            url: current,
                            source,
                        }),
                    };
                }
            };

            if !self.guard.allows(&location, &current, &mut visited) {
                tracing::trace!("Not following {} from {}", location, current);
                break;
            }

            if chain.len() > self.max_hops {
                return ChainWalk {
                    chain,
                    error: Some(RedirectError::TooManyRedirects(self.max_hops)),
                };
            }

            tracing::debug!("Redirect {} -> {}", current, location);
            chain.push(location.clone());
            current = location;
        }

        ChainWalk { chain, error: None }
    }

    /// Requests `url` once and returns its redirect target, if any
    async fn next_location(&self, url: &str) -> Result<Option<String>, reqwest::Error> {
        let response = self.client.get(url).send().await?;

        if !response.status().is_redirection() {
            return Ok(None);
        }

        Ok(response
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string))
    }
}
