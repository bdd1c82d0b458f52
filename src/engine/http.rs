use super::page::{parse_advertiser_info, parse_results_page};
use super::{AdSource, SearchRequest, SourceError};
use crate::ads::AdObservation;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{header::USER_AGENT, Client};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Desktop Chrome; some engines serve no ads to unknown agents
pub const DEFAULT_BROWSER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_7_5) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/136.0.0.0 Safari/537.36";

/// Builds the client used to fetch results pages
///
/// Unlike the redirect walker's client this one follows redirects, the
/// way a browser would when loading a results page.
pub fn build_search_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(DEFAULT_BROWSER_AGENT)
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Ad source that fetches results pages over plain HTTP
///
/// Ads injected by JavaScript are invisible to it; a browser-driven
/// [`AdSource`] can replace it without touching the orchestrator.
#[derive(Debug, Clone)]
pub struct HttpAdSource {
    client: Client,
    html_path: Option<PathBuf>,
    search_urls: HashMap<String, String>,
}

impl HttpAdSource {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            html_path: None,
            search_urls: HashMap::new(),
        }
    }

    /// Saves every fetched results page under `dir`
    pub fn with_html_path(mut self, dir: impl Into<PathBuf>) -> Self {
        self.html_path = Some(dir.into());
        self
    }

    /// Replaces an engine's search URL, e.g. to point at a mirror
    pub fn with_search_url(mut self, engine: impl Into<String>, url: impl Into<String>) -> Self {
        self.search_urls.insert(engine.into(), url.into());
        self
    }

    fn search_url_for<'a>(&'a self, request: &'a SearchRequest) -> &'a str {
        self.search_urls
            .get(request.engine.name)
            .map(String::as_str)
            .unwrap_or(request.engine.search_url)
    }

    async fn fetch(
        &self,
        url: &str,
        request: &SearchRequest,
        cancel: &CancellationToken,
    ) -> Result<String, SourceError> {
        let mut builder = self.client.get(url);
        if let Some(agent) = request.user_agent.as_deref().filter(|a| !a.is_empty()) {
            builder = builder.header(USER_AGENT, agent);
        }

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(SourceError::Cancelled),
            response = builder.send() => response?,
        };

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                engine: request.engine.name.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response.text().await?)
    }

    /// Fetches one transparency page; failures only cost the metadata
    async fn advertiser_info(
        &self,
        url: &str,
        request: &SearchRequest,
        cancel: &CancellationToken,
    ) -> (Option<String>, Option<String>) {
        match self.fetch(url, request, cancel).await {
            Ok(html) => match parse_advertiser_info(&html) {
                Some((name, location)) => (Some(name), Some(location)),
                None => {
                    tracing::debug!("No advertiser details on {}", url);
                    (None, None)
                }
            },
            Err(e) => {
                tracing::debug!("Failed to load advertiser page {}: {}", url, e);
                (None, None)
            }
        }
    }
}

/// Snapshot file name: `<engine>-<query>-<unix_nanos>.html`
fn snapshot_file_name(engine: &str, query: &str, taken_at: DateTime<Utc>) -> String {
    let nanos = taken_at.timestamp_nanos_opt().unwrap_or_default();
    let safe_query: String = query
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();

    format!("{}-{}-{}.html", engine, safe_query, nanos)
}

async fn save_snapshot(dir: &Path, engine: &str, query: &str, html: &str) -> std::io::Result<PathBuf> {
    let path = dir.join(snapshot_file_name(engine, query, Utc::now()));
    tokio::fs::write(&path, html).await?;
    Ok(path)
}

#[async_trait]
impl AdSource for HttpAdSource {
    async fn search(
        &self,
        request: &SearchRequest,
        cancel: &CancellationToken,
    ) -> Result<Vec<AdObservation>, SourceError> {
        let encoded: String = url::form_urlencoded::byte_serialize(request.query.as_bytes()).collect();
        let search_url = format!("{}{}", self.search_url_for(request), encoded);
        tracing::debug!("Searching {} for '{}'", request.engine.name, request.query);

        let html = self.fetch(&search_url, request, cancel).await?;

        if let Some(dir) = &self.html_path {
            match save_snapshot(dir, request.engine.name, &request.query, &html).await {
                Ok(path) => tracing::info!("Results page saved to {}", path.display()),
                Err(e) => tracing::warn!("Failed to save results page for {}: {}", request.engine.name, e),
            }
        }

        let base = Url::parse(&search_url).ok();
        let page = parse_results_page(&html, request.engine, base.as_ref())?;
        tracing::debug!(
            "{} returned {} ad links for '{}'",
            request.engine.name,
            page.ad_links.len(),
            request.query
        );

        let mut observations = Vec::with_capacity(page.ad_links.len());
        for (index, link) in page.ad_links.into_iter().enumerate() {
            let mut observation = AdObservation::new(request.engine.name, &request.query, link);

            if let Some(info_url) = page.info_links.get(index) {
                let (name, location) = self.advertiser_info(info_url, request, cancel).await;
                observation = observation.with_advertiser(name, location);
            }

            observations.push(observation);
        }

        Ok(observations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::find_engine;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn create_test_source(server: &MockServer, engine: &str) -> HttpAdSource {
        let client = build_search_client(Duration::from_secs(5)).expect("client");
        HttpAdSource::new(client).with_search_url(engine, format!("{}/search?q=", server.uri()))
    }

    fn create_test_request(engine: &str, query: &str) -> SearchRequest {
        SearchRequest {
            engine: find_engine(engine).expect("engine"),
            query: query.to_string(),
            user_agent: None,
            no_redirection: false,
        }
    }

    #[tokio::test]
    async fn test_search_extracts_ads() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("q", "ipad pro"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<ol><li class="b_adTop"><a role="link" href="https://www.bing.com/aclick?u=abc">Ad</a></li></ol>"#,
            ))
            .mount(&server)
            .await;

        let ads = create_test_source(&server, "bing")
            .search(&create_test_request("bing", "ipad pro"), &CancellationToken::new())
            .await
            .expect("search");

        assert_eq!(ads.len(), 1);
        assert_eq!(ads[0].engine, "bing");
        assert_eq!(ads[0].query, "ipad pro");
        assert_eq!(ads[0].original_ad_url, "https://www.bing.com/aclick?u=abc");
        assert!(ads[0].advertiser.is_none());
    }

    #[tokio::test]
    async fn test_transparency_engine_reads_advertiser() {
        let server = MockServer::start().await;
        let base = server.uri();
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_string(format!(
                r#"<a class="sVXRqc" data-rw="https://www.googleadservices.com/pagead/aclk?adurl=https://shop.example.com/">Ad</a>
                   <a class="si149" href="{}/adinfo">About this advertiser</a>"#,
                base
            )))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/adinfo"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                "<div><div><div>Advertiser</div><div>Paid for by Shop AG</div></div><div><div>Location</div><div>Switzerland</div></div></div>",
            ))
            .mount(&server)
            .await;

        let ads = create_test_source(&server, "google")
            .search(&create_test_request("google", "ipad"), &CancellationToken::new())
            .await
            .expect("search");

        assert_eq!(ads.len(), 1);
        assert_eq!(ads[0].advertiser.as_deref(), Some("Shop AG"));
        assert_eq!(ads[0].advertiser_location.as_deref(), Some("Switzerland"));
    }

    #[tokio::test]
    async fn test_broken_info_page_keeps_ad() {
        let server = MockServer::start().await;
        let base = server.uri();
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_string(format!(
                r#"<a class="si27" href="https://syndicatedsearch.goog/aclk?adurl=https://a.example.com/">Ad</a>
                   <a class="si149" href="{}/missing">About</a>"#,
                base
            )))
            .mount(&server)
            .await;

        let ads = create_test_source(&server, "syndicated")
            .search(&create_test_request("syndicated", "ipad"), &CancellationToken::new())
            .await
            .expect("search");

        assert_eq!(ads.len(), 1);
        assert!(ads[0].advertiser.is_none());
    }

    #[tokio::test]
    async fn test_error_status_fails_search() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let result = create_test_source(&server, "bing")
            .search(&create_test_request("bing", "ipad"), &CancellationToken::new())
            .await;

        assert!(matches!(result, Err(SourceError::Status { status: 429, .. })));
    }

    #[tokio::test]
    async fn test_custom_user_agent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(header("user-agent", "custom-agent/2.0"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
            .mount(&server)
            .await;

        let mut request = create_test_request("bing", "ipad");
        request.user_agent = Some("custom-agent/2.0".to_string());

        let ads = create_test_source(&server, "bing")
            .search(&request, &CancellationToken::new())
            .await
            .expect("search");
        assert!(ads.is_empty());
    }

    #[tokio::test]
    async fn test_snapshot_is_written() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>results</html>"))
            .mount(&server)
            .await;
        let dir = tempfile::tempdir().expect("tempdir");

        create_test_source(&server, "aol")
            .with_html_path(dir.path())
            .search(&create_test_request("aol", "ipad pro"), &CancellationToken::new())
            .await
            .expect("search");

        let names: Vec<String> = std::fs::read_dir(dir.path())
            .expect("read dir")
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names.len(), 1);
        assert!(names[0].starts_with("aol-ipad_pro-"));
        assert!(names[0].ends_with(".html"));
    }

    #[tokio::test]
    async fn test_cancelled_search() {
        let server = MockServer::start().await;
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = create_test_source(&server, "bing")
            .search(&create_test_request("bing", "ipad"), &cancel)
            .await;

        assert!(matches!(result, Err(SourceError::Cancelled)));
    }

    #[test]
    fn test_snapshot_file_name_uses_unix_nanos() {
        use chrono::TimeZone;

        let taken_at = Utc.timestamp_opt(1_700_000_000, 123).unwrap();

        assert_eq!(
            snapshot_file_name("google", "ipad pro/2", taken_at),
            "google-ipad_pro_2-1700000000000000123.html"
        );
    }
}
