use crate::config::Config;
use crate::engine::{select_engines, EngineDescriptor};

/// Immutable per-run options for the [`Scanner`](super::Scanner)
#[derive(Debug, Clone)]
pub struct ScanSettings {
    /// Searches allowed to run at once, across the whole run
    pub concurrency: usize,

    pub user_agent: Option<String>,

    /// Skip redirect walking and deduplicate on the scraped URL
    pub no_redirection: bool,

    /// Engines dispatched for every query, in order
    pub engines: Vec<&'static EngineDescriptor>,

    /// Domains merged into every query's allow-list
    pub global_exclusions: Vec<String>,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            concurrency: 4,
            user_agent: None,
            no_redirection: false,
            engines: select_engines(&[]),
            global_exclusions: Vec::new(),
        }
    }
}

impl ScanSettings {
    /// Builds settings from a validated configuration
    pub fn from_config(config: &Config) -> Self {
        let user_agent = Some(config.scan.user_agent.trim())
            .filter(|agent| !agent.is_empty())
            .map(str::to_string);

        Self {
            concurrency: config.scan.concurrency.max(1),
            user_agent,
            no_redirection: config.scan.no_redirection,
            engines: select_engines(&config.scan.engines),
            global_exclusions: config.global_domain_exclusion.exclusion_list.clone(),
        }
    }
}
