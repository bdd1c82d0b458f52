use reqwest::{redirect::Policy, Client};
use std::time::Duration;

/// Builds an HTTP client that never follows redirects on its own
///
/// # Arguments
///
/// * `user_agent` - Replaces reqwest's default `User-Agent` when set and non-empty
/// * `timeout` - Per-request timeout
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```
/// use seads::redirect::build_no_redirect_client;
/// use std::time::Duration;
///
/// let client = build_no_redirect_client(Some("seads-test/1.0"), Duration::from_secs(5));
/// assert!(client.is_ok());
/// ```
pub fn build_no_redirect_client(
    user_agent: Option<&str>,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    let mut builder = Client::builder()
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::none())
        .gzip(true)
        .brotli(true);

    if let Some(agent) = user_agent.filter(|agent| !agent.trim().is_empty()) {
        builder = builder.user_agent(agent);
    }

    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_client_default_agent() {
        assert!(build_no_redirect_client(None, Duration::from_secs(5)).is_ok());
    }

    #[test]
    fn test_build_client_custom_agent() {
        let client = build_no_redirect_client(Some("Mozilla/5.0 (seads)"), Duration::from_secs(5));
        assert!(client.is_ok());
    }

    #[test]
    fn test_blank_agent_is_ignored() {
        assert!(build_no_redirect_client(Some("   "), Duration::from_secs(5)).is_ok());
    }
}
