use serde::Deserialize;

/// Main configuration structure for Seads
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub scan: ScanConfig,

    #[serde(rename = "global-domain-exclusion", default)]
    pub global_domain_exclusion: GlobalDomainExclusion,

    #[serde(default)]
    pub queries: Vec<QueryConfig>,

    pub slack: Option<SlackConfig>,
    pub telegram: Option<TelegramConfig>,
    pub discord: Option<DiscordConfig>,
    pub urlscan: Option<UrlScanConfig>,
}

impl Config {
    /// Returns true if at least one notification sink is configured
    pub fn has_notifier(&self) -> bool {
        self.slack.is_some() || self.telegram.is_some() || self.discord.is_some()
    }
}

/// Scan behaviour
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ScanConfig {
    /// Maximum number of engine searches running at once, across the run
    pub concurrency: usize,

    /// Sent instead of the default `User-Agent` when not empty
    pub user_agent: String,

    /// Skip walking redirect chains
    pub no_redirection: bool,

    /// Engines to search; empty means all
    pub engines: Vec<String>,

    /// JSON export path; empty disables the export
    pub output_path: String,

    /// Directory for raw results-page snapshots; empty disables them
    pub html_path: String,

    /// Print links without defanging them
    pub print_clean_links: bool,

    pub print_redirect_chain: bool,

    /// Send unexpected ads to the configured sinks
    pub notify: bool,

    /// Submit unexpected ads for URL-reputation scanning
    pub submit: bool,

    pub request_timeout_secs: u64,

    /// Global deadline for the whole run; 0 disables it
    pub run_timeout_secs: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            concurrency: 4,
            user_agent: String::new(),
            no_redirection: false,
            engines: Vec::new(),
            output_path: String::new(),
            html_path: String::new(),
            print_clean_links: false,
            print_redirect_chain: false,
            notify: false,
            submit: false,
            request_timeout_secs: 30,
            run_timeout_secs: 0,
        }
    }
}

/// Domains that are never reported, whatever the query
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GlobalDomainExclusion {
    #[serde(rename = "exclusion-list", default)]
    pub exclusion_list: Vec<String>,
}

/// One search term and the domains its ads may lead to
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct QueryConfig {
    pub query: String,

    #[serde(rename = "expected-domains", default)]
    pub expected_domains: Vec<String>,
}

impl QueryConfig {
    pub fn new(query: impl Into<String>, expected_domains: Vec<String>) -> Self {
        Self {
            query: query.into(),
            expected_domains,
        }
    }
}

/// Slack bot token and target channels
#[derive(Debug, Clone, Deserialize)]
pub struct SlackConfig {
    pub token: String,
    pub channels: Vec<String>,
}

/// Telegram bot token and target chats
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramConfig {
    pub token: String,

    #[serde(rename = "chat-ids")]
    pub chat_ids: Vec<i64>,
}

/// Discord webhook credentials
#[derive(Debug, Clone, Deserialize)]
pub struct DiscordConfig {
    pub token: String,

    #[serde(rename = "webhook-id")]
    pub webhook_id: String,
}

/// URL-reputation submission service
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct UrlScanConfig {
    pub token: String,

    pub scan_url: String,

    /// Comma-separated tag list
    #[serde(default)]
    pub tags: String,

    #[serde(default = "default_visibility")]
    pub visibility: String,

    /// Pause between submissions
    #[serde(default)]
    pub delay_secs: u64,
}

fn default_visibility() -> String {
    "public".to_string()
}

impl UrlScanConfig {
    /// Tags split on commas, trimmed, blanks dropped
    pub fn tag_list(&self) -> Vec<String> {
        self.tags
            .split(',')
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .map(str::to_string)
            .collect()
    }
}
