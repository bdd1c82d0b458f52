//! Integration tests for the scanner
//!
//! These tests drive the orchestrator end to end with scripted in-memory
//! ad sources and a wiremock server standing in for ad-network redirects.

use async_trait::async_trait;
use chrono::Utc;
use seads::ads::AdObservation;
use seads::config::QueryConfig;
use seads::engine::{find_engine, AdSource, SearchRequest, SourceError};
use seads::output::{export_json, read_export};
use seads::redirect::{build_no_redirect_client, RedirectWalker};
use seads::scan::{ScanSettings, Scanner, WorkerError};
use seads::{ResolverRegistry, SeadsError};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// What a scripted engine does for a given query
#[derive(Clone)]
enum Behaviour {
    Ads(Vec<String>),
    Fail,
    Panic,
    WaitForCancel,
}

/// Ad source answering from a table keyed by (engine, query)
struct ScriptedSource {
    script: HashMap<(String, String), Behaviour>,
}

impl ScriptedSource {
    fn new() -> Self {
        Self {
            script: HashMap::new(),
        }
    }

    fn on(mut self, engine: &str, query: &str, behaviour: Behaviour) -> Self {
        self.script
            .insert((engine.to_string(), query.to_string()), behaviour);
        self
    }
}

#[async_trait]
impl AdSource for ScriptedSource {
    async fn search(
        &self,
        request: &SearchRequest,
        cancel: &CancellationToken,
    ) -> Result<Vec<AdObservation>, SourceError> {
        let key = (request.engine.name.to_string(), request.query.clone());
        match self.script.get(&key).cloned() {
            Some(Behaviour::Ads(urls)) => Ok(urls
                .into_iter()
                .map(|url| AdObservation::new(request.engine.name, &request.query, url))
                .collect()),
            Some(Behaviour::Fail) => Err(SourceError::Status {
                engine: request.engine.name.to_string(),
                status: 500,
            }),
            Some(Behaviour::Panic) => panic!("{} exploded", request.engine.name),
            Some(Behaviour::WaitForCancel) => {
                cancel.cancelled().await;
                Err(SourceError::Cancelled)
            }
            None => Ok(Vec::new()),
        }
    }
}

fn create_test_settings(engines: &[&str], no_redirection: bool) -> ScanSettings {
    ScanSettings {
        concurrency: 2,
        no_redirection,
        engines: engines
            .iter()
            .map(|name| find_engine(name).expect("known engine"))
            .collect(),
        ..ScanSettings::default()
    }
}

fn create_test_walker() -> RedirectWalker {
    let client =
        build_no_redirect_client(Some("seads-test/1.0"), Duration::from_secs(5)).expect("client");
    RedirectWalker::new(client)
}

async fn mount_redirect(server: &MockServer, from: &str, to: &str, expected_calls: u64) {
    Mock::given(method("GET"))
        .and(path(from))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("Location", format!("{}{}", server.uri(), to).as_str()),
        )
        .expect(expected_calls)
        .mount(server)
        .await;
}

fn query(term: &str, expected: &[&str]) -> QueryConfig {
    QueryConfig::new(term, expected.iter().map(|d| d.to_string()).collect())
}

#[tokio::test]
async fn test_scan_walks_chains_and_isolates_failures() {
    let server = MockServer::start().await;
    mount_redirect(&server, "/click", "/landing", 1).await;
    Mock::given(method("GET"))
        .and(path("/landing"))
        .respond_with(ResponseTemplate::new(200).set_body_string("welcome"))
        .mount(&server)
        .await;

    let click = format!("{}/click", server.uri());
    let source = ScriptedSource::new()
        .on("bing", "ipad", Behaviour::Ads(vec![click.clone()]))
        .on("google", "ipad", Behaviour::Panic)
        .on("yahoo", "ipad", Behaviour::Fail);

    let scanner = Scanner::new(
        Arc::new(source),
        ResolverRegistry::with_defaults(),
        create_test_settings(&["google", "bing", "yahoo"], false),
    )
    .with_walker(create_test_walker());

    let outcome = scanner
        .scan(&[query("ipad", &["apple.com"])], &CancellationToken::new())
        .await;

    assert!(outcome.aborted.is_none());
    assert_eq!(outcome.queries_completed, 1);
    assert_eq!(outcome.ads.len(), 1);

    let ad = &outcome.ads[0];
    let landing = format!("{}/landing", server.uri());
    assert_eq!(ad.redirect_chain, vec![click, landing.clone()]);
    assert_eq!(ad.final_redirect_url, landing);
    assert_eq!(ad.final_domain, "127.0.0.1");
    assert!(!ad.expected);

    assert_eq!(outcome.failures.len(), 2);
    let panicked = outcome
        .failures
        .iter()
        .find(|f| f.engine == "google")
        .expect("google failure");
    match &panicked.error {
        WorkerError::Panicked(message) => assert!(message.contains("google exploded")),
        other => panic!("expected panic, got {:?}", other),
    }
}

#[tokio::test]
async fn test_tracking_urls_resolve_offline() {
    let ad = format!(
        "https://www.googleadservices.com/pagead/aclk?sa=L&adurl={}",
        "https%3A%2F%2Fwww.apple.com%2Fipad%2F"
    );
    let source = ScriptedSource::new().on("google", "ipad", Behaviour::Ads(vec![ad]));

    let scanner = Scanner::new(
        Arc::new(source),
        ResolverRegistry::with_defaults(),
        create_test_settings(&["google"], true),
    );

    let outcome = scanner
        .scan(&[query("ipad", &["apple.com"])], &CancellationToken::new())
        .await;

    assert_eq!(outcome.ads.len(), 1);
    assert_eq!(outcome.ads[0].final_domain, "apple.com");
    assert_eq!(outcome.ads[0].final_redirect_url, "https://www.apple.com/ipad/");
    assert!(outcome.ads[0].expected);
    assert!(outcome.ads[0].redirect_chain.is_empty());
}

#[tokio::test]
async fn test_no_redirection_keeps_distinct_tracker_destinations() {
    let shop = "https://www.googleadservices.com/pagead/aclk?sa=L&adurl=https%3A%2F%2Fshop.example.com%2F";
    let evil = "https://www.googleadservices.com/pagead/aclk?sa=L&adurl=https%3A%2F%2Fevil.test%2Foffer";
    let source = ScriptedSource::new().on(
        "google",
        "ipad",
        Behaviour::Ads(vec![shop.to_string(), evil.to_string()]),
    );

    let scanner = Scanner::new(
        Arc::new(source),
        ResolverRegistry::with_defaults(),
        create_test_settings(&["google"], true),
    );

    let outcome = scanner
        .scan(&[query("ipad", &["example.com"])], &CancellationToken::new())
        .await;

    assert_eq!(outcome.ads.len(), 2);
    assert_eq!(outcome.ads[0].final_domain, "shop.example.com");
    assert!(outcome.ads[0].expected);
    assert_eq!(outcome.ads[1].final_domain, "evil.test");
    assert!(!outcome.ads[1].expected);
    assert_eq!(outcome.unexpected_count(), 1);
}

#[tokio::test]
async fn test_expected_bing_ad_left_out_of_notification() {
    let bing = "https://www.bing.com/aclick?ld=1&u=aHR0cHMlM0ElMkYlMkZzaG9wLmV4YW1wbGUuY29tJTJGcCUzRnglM0Qx";
    let source = ScriptedSource::new().on(
        "bing",
        "ipad",
        Behaviour::Ads(vec![bing.to_string(), "https://evil.test/landing".to_string()]),
    );

    let scanner = Scanner::new(
        Arc::new(source),
        ResolverRegistry::with_defaults(),
        create_test_settings(&["bing"], true),
    );

    let outcome = scanner
        .scan(&[query("ipad", &["example.com"])], &CancellationToken::new())
        .await;

    assert_eq!(outcome.ads.len(), 2);
    let message = outcome.notification(Utc::now()).expect("unexpected ad to report");
    assert!(message.contains("evil[.]test"));
    assert!(!message.contains("shop[.]example[.]com"));
    assert!(!message.contains("bing[.]com"));
}

#[tokio::test]
async fn test_nothing_to_notify_when_every_ad_is_expected() {
    let source = ScriptedSource::new().on(
        "bing",
        "ipad",
        Behaviour::Ads(vec!["https://shop.example.com/".to_string()]),
    );
    let scanner = Scanner::new(
        Arc::new(source),
        ResolverRegistry::with_defaults(),
        create_test_settings(&["bing"], true),
    );

    let outcome = scanner
        .scan(&[query("ipad", &["example.com"])], &CancellationToken::new())
        .await;

    assert_eq!(outcome.ads.len(), 1);
    assert!(outcome.notification(Utc::now()).is_none());
}

#[tokio::test]
async fn test_no_redirection_never_touches_network() {
    let server = MockServer::start().await;
    mount_redirect(&server, "/click", "/landing", 0).await;

    let click = format!("{}/click", server.uri());
    let source = ScriptedSource::new().on("bing", "ipad", Behaviour::Ads(vec![click.clone()]));

    let scanner = Scanner::new(
        Arc::new(source),
        ResolverRegistry::with_defaults(),
        create_test_settings(&["bing"], true),
    )
    .with_walker(create_test_walker());

    let outcome = scanner
        .scan(&[query("ipad", &[])], &CancellationToken::new())
        .await;

    assert_eq!(outcome.ads.len(), 1);
    assert_eq!(outcome.ads[0].final_redirect_url, click);
    assert!(outcome.ads[0].redirect_chain.is_empty());
}

#[tokio::test]
async fn test_abort_keeps_results_of_earlier_queries() {
    let source = ScriptedSource::new()
        .on(
            "bing",
            "ipad",
            Behaviour::Ads(vec!["https://shop.example.com/ipad".to_string()]),
        )
        .on("aol", "ipad", Behaviour::Fail)
        .on("bing", "tablet", Behaviour::Fail)
        .on("aol", "tablet", Behaviour::Panic)
        .on(
            "bing",
            "laptop",
            Behaviour::Ads(vec!["https://never.example.com/".to_string()]),
        );

    let scanner = Scanner::new(
        Arc::new(source),
        ResolverRegistry::with_defaults(),
        create_test_settings(&["bing", "aol"], true),
    );
    let queries = vec![
        query("ipad", &["example.com"]),
        query("tablet", &[]),
        query("laptop", &[]),
    ];

    let outcome = scanner.scan(&queries, &CancellationToken::new()).await;

    assert_eq!(outcome.queries_completed, 1);
    assert_eq!(outcome.ads.len(), 1);
    assert_eq!(outcome.ads[0].query(), "ipad");
    assert!(outcome.ads[0].expected);
    match outcome.aborted {
        Some(SeadsError::AllEnginesFailed { query, failures }) => {
            assert_eq!(query, "tablet");
            assert_eq!(failures, 2);
        }
        other => panic!("expected abort, got {:?}", other),
    }
}

#[tokio::test]
async fn test_cancellation_returns_partial_results() {
    let source = ScriptedSource::new()
        .on(
            "bing",
            "ipad",
            Behaviour::Ads(vec!["https://shop.example.com/".to_string()]),
        )
        .on("duckduckgo", "ipad", Behaviour::WaitForCancel);

    let scanner = Scanner::new(
        Arc::new(source),
        ResolverRegistry::with_defaults(),
        create_test_settings(&["bing", "duckduckgo"], true),
    );

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        trigger.cancel();
    });

    let outcome = tokio::time::timeout(
        Duration::from_secs(5),
        scanner.scan(&[query("ipad", &[]), query("tablet", &[])], &cancel),
    )
    .await
    .expect("scan should stop once cancelled");

    assert!(outcome.cancelled);
    assert!(outcome.aborted.is_none());
    assert_eq!(outcome.ads.len(), 1);
    assert!(outcome.failures.iter().all(|f| f.error.is_cancellation()));
}

#[tokio::test]
async fn test_exported_results_read_back() {
    let source = ScriptedSource::new().on(
        "yahoo",
        "ipad",
        Behaviour::Ads(vec![
            "https://shop.example.com/a".to_string(),
            "https://evil.test/b".to_string(),
        ]),
    );
    let scanner = Scanner::new(
        Arc::new(source),
        ResolverRegistry::with_defaults(),
        create_test_settings(&["yahoo"], true),
    );
    let outcome = scanner
        .scan(&[query("ipad", &["example.com"])], &CancellationToken::new())
        .await;

    let dir = TempDir::new().unwrap();
    let export = dir.path().join("ads.json");
    export_json(&export, &outcome.ads).unwrap();

    let ads = read_export(&export).unwrap();
    assert_eq!(ads, outcome.ads);
    assert_eq!(ads.iter().filter(|ad| !ad.expected).count(), 1);
}
