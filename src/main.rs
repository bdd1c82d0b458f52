//! Seads main entry point
//!
//! This is the command-line interface for the Seads search engine ad scanner.

use chrono::Utc;
use clap::Parser;
use seads::config::{compute_config_hash, read_config, validate, Config, QueryConfig};
use seads::engine::{build_search_client, engine_names, HttpAdSource, DEFAULT_BROWSER_AGENT};
use seads::notify::{notifiers_from_config, send_notifications};
use seads::output::{export_json, print_report, print_run_summary, ReportOptions};
use seads::redirect::{build_no_redirect_client, RedirectWalker};
use seads::scan::{ScanOutcome, ScanSettings, Scanner};
use seads::urlscan::UrlScanSubmitter;
use seads::ResolverRegistry;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Seads: a search engine ad scanner
///
/// Seads searches the configured queries on several search engines,
/// unwraps the ad-network redirects in front of every paid result and
/// reports ads whose landing domain is not expected for the query.
#[derive(Parser, Debug)]
#[command(name = "seads")]
#[command(version = "1.0.0")]
#[command(about = "A search engine ad scanner", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Maximum number of searches running at once
    #[arg(short, long)]
    concurrency: Option<usize>,

    /// User agent for redirect walking and searches
    #[arg(short = 'u', long)]
    user_agent: Option<String>,

    /// Do not walk redirect chains
    #[arg(long)]
    no_redirection: bool,

    /// Only search these engines (repeatable)
    #[arg(short, long = "engine", value_name = "ENGINE")]
    engines: Vec<String>,

    /// Export results as JSON to this file
    #[arg(short, long, value_name = "FILE")]
    out: Option<PathBuf>,

    /// Save raw results pages in this directory
    #[arg(long, value_name = "DIR")]
    html: Option<PathBuf>,

    /// Print links without defanging them
    #[arg(long)]
    clean_links: bool,

    /// Print the redirect chain of every ad
    #[arg(short = 'r', long)]
    print_redirect_chain: bool,

    /// Send unexpected ads to the configured notification sinks
    #[arg(short, long)]
    notify: bool,

    /// Submit unexpected ads for URL scanning
    #[arg(short, long)]
    submit: bool,

    /// Search this query instead of the configured ones
    #[arg(long)]
    query: Option<String>,

    /// Abort the run after this many seconds, keeping partial results
    #[arg(short, long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Validate config and show what would be scanned without searching
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load configuration, apply flags, then validate the result
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let mut config = match read_config(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };
    let config_hash = compute_config_hash(&cli.config)?;
    apply_cli_overrides(&mut config, &cli);

    if let Err(e) = validate(&config) {
        tracing::error!("Invalid configuration: {}", e);
        return Err(e.into());
    }
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    Ok(handle_scan(config).await?)
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("seads=info,warn"),
            1 => EnvFilter::new("seads=debug,info"),
            2 => EnvFilter::new("seads=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Command-line flags win over the configuration file
fn apply_cli_overrides(config: &mut Config, cli: &Cli) {
    let scan = &mut config.scan;

    if let Some(concurrency) = cli.concurrency {
        scan.concurrency = concurrency;
    }
    if let Some(agent) = &cli.user_agent {
        scan.user_agent = agent.clone();
    }
    if !cli.engines.is_empty() {
        scan.engines = cli.engines.clone();
    }
    if let Some(out) = &cli.out {
        scan.output_path = out.display().to_string();
    }
    if let Some(html) = &cli.html {
        scan.html_path = html.display().to_string();
    }
    if let Some(timeout) = cli.timeout {
        scan.run_timeout_secs = timeout;
    }

    scan.no_redirection |= cli.no_redirection;
    scan.print_clean_links |= cli.clean_links;
    scan.print_redirect_chain |= cli.print_redirect_chain;
    scan.notify |= cli.notify;
    scan.submit |= cli.submit;

    if let Some(query) = &cli.query {
        config.queries = vec![QueryConfig::new(query.clone(), Vec::new())];
    }
}

/// Handles the --dry-run mode: shows the effective configuration
fn handle_dry_run(config: &Config) {
    let settings = ScanSettings::from_config(config);

    println!("=== Seads Dry Run ===\n");

    println!("Scan Configuration:");
    println!("  Concurrency: {}", settings.concurrency);
    println!(
        "  User agent: {}",
        settings.user_agent.as_deref().unwrap_or(DEFAULT_BROWSER_AGENT)
    );
    println!("  No redirection: {}", settings.no_redirection);
    println!("  Request timeout: {}s", config.scan.request_timeout_secs);
    if config.scan.run_timeout_secs > 0 {
        println!("  Run timeout: {}s", config.scan.run_timeout_secs);
    }

    println!("\nEngines ({}):", settings.engines.len());
    for engine in &settings.engines {
        println!("  - {} ({})", engine.name, engine.search_url);
    }

    println!("\nOutput:");
    println!("  JSON export: {}", or_disabled(&config.scan.output_path));
    println!("  HTML snapshots: {}", or_disabled(&config.scan.html_path));
    println!("  Notify: {}", config.scan.notify);
    println!("  Submit: {}", config.scan.submit);

    println!(
        "\nGlobal Exclusions ({}):",
        settings.global_exclusions.len()
    );
    for domain in &settings.global_exclusions {
        println!("  - {}", domain);
    }

    println!("\nQueries ({}):", config.queries.len());
    for query in &config.queries {
        println!("  - '{}' ({} expected domains)", query.query, query.expected_domains.len());
        for domain in &query.expected_domains {
            println!("    * {}", domain);
        }
    }

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would run {} searches (known engines: {})",
        config.queries.len() * settings.engines.len(),
        engine_names().join(", ")
    );
}

fn or_disabled(value: &str) -> &str {
    if value.is_empty() {
        "disabled"
    } else {
        value
    }
}

/// Cancels the token on Ctrl-C or when the run deadline passes
fn spawn_cancellation(cancel: &CancellationToken, run_timeout_secs: u64) {
    let token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, stopping in-flight searches");
            token.cancel();
        }
    });

    if run_timeout_secs > 0 {
        let token = cancel.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(Duration::from_secs(run_timeout_secs)) => {
                    tracing::warn!("Run timeout of {}s reached, stopping", run_timeout_secs);
                    token.cancel();
                }
            }
        });
    }
}

/// Handles the main scan operation
async fn handle_scan(config: Config) -> seads::Result<()> {
    let settings = ScanSettings::from_config(&config);
    let request_timeout = Duration::from_secs(config.scan.request_timeout_secs);

    tracing::info!(
        "Queries: {}, engines: {}, concurrency: {}",
        config.queries.len(),
        settings.engines.len(),
        settings.concurrency
    );

    let search_client = build_search_client(request_timeout)?;
    let mut source = HttpAdSource::new(search_client.clone());
    if !config.scan.html_path.is_empty() {
        source = source.with_html_path(&config.scan.html_path);
    }

    let walker_agent = settings.user_agent.as_deref().unwrap_or(DEFAULT_BROWSER_AGENT);
    let walker = RedirectWalker::new(build_no_redirect_client(Some(walker_agent), request_timeout)?);

    let scanner = Scanner::new(Arc::new(source), ResolverRegistry::with_defaults(), settings)
        .with_walker(walker);

    let cancel = CancellationToken::new();
    spawn_cancellation(&cancel, config.scan.run_timeout_secs);

    let mut outcome = scanner.scan(&config.queries, &cancel).await;

    let options = ReportOptions {
        clean_links: config.scan.print_clean_links,
        redirect_chain: config.scan.print_redirect_chain,
    };
    print_report(&outcome.ads, &options);

    if config.scan.submit && !cancel.is_cancelled() {
        if let Some(urlscan) = &config.urlscan {
            let submitter = UrlScanSubmitter::from_config(search_client.clone(), urlscan);
            let report = submitter
                .submit_all(&mut outcome.ads, &cancel)
                .await;
            tracing::info!(
                "URL submissions: {} accepted, {} failed",
                report.submitted,
                report.failed
            );
        }
    }

    if !config.scan.output_path.is_empty() {
        export_json(Path::new(&config.scan.output_path), &outcome.ads)?;
    }

    if config.scan.notify {
        notify_unexpected(&config, &search_client, &outcome).await;
    }

    print_run_summary(&outcome);

    match outcome.aborted {
        Some(error) => {
            tracing::error!("Scan failed: {}", error);
            Err(error)
        }
        None => {
            tracing::info!("Scan completed");
            Ok(())
        }
    }
}

async fn notify_unexpected(config: &Config, client: &reqwest::Client, outcome: &ScanOutcome) {
    let Some(message) = outcome.notification(Utc::now()) else {
        tracing::info!("No unexpected ads, nothing to notify");
        return;
    };

    let notifiers = notifiers_from_config(client, config);
    let report = send_notifications(&notifiers, &message).await;

    if report.any_delivered() {
        println!("✅ Notifications sent via {}", report.delivered.join(", "));
    } else {
        tracing::error!("No notification could be delivered");
    }
}
