use crate::config::types::{Config, QueryConfig, ScanConfig, UrlScanConfig};
use crate::engine::{engine_names, find_engine};
use crate::{ConfigError, ConfigResult};
use url::Url;

/// Upper bound for `scan.concurrency`
pub const MAX_CONCURRENCY: usize = 64;

/// Validates the entire configuration
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_scan_config(&config.scan)?;
    validate_queries(&config.queries)?;

    for domain in &config.global_domain_exclusion.exclusion_list {
        validate_domain(domain)?;
    }

    validate_notifiers(config)?;

    if config.scan.submit {
        match &config.urlscan {
            Some(urlscan) => validate_urlscan(urlscan)?,
            None => {
                return Err(ConfigError::Validation(
                    "submit is enabled but no [urlscan] section is configured".to_string(),
                ))
            }
        }
    }

    Ok(())
}

/// Validates scan behaviour
fn validate_scan_config(config: &ScanConfig) -> ConfigResult<()> {
    if config.concurrency < 1 || config.concurrency > MAX_CONCURRENCY {
        return Err(ConfigError::Validation(format!(
            "concurrency must be between 1 and {}, got {}",
            MAX_CONCURRENCY, config.concurrency
        )));
    }

    if config.request_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "request-timeout-secs must be at least 1".to_string(),
        ));
    }

    for engine in &config.engines {
        if find_engine(engine).is_none() {
            return Err(ConfigError::Validation(format!(
                "Unknown engine '{}', expected one of: {}",
                engine,
                engine_names().join(", ")
            )));
        }
    }

    Ok(())
}

/// Validates the query list and each query's expected domains
fn validate_queries(queries: &[QueryConfig]) -> ConfigResult<()> {
    if queries.is_empty() {
        return Err(ConfigError::Validation(
            "At least one query must be configured".to_string(),
        ));
    }

    for query in queries {
        if query.query.trim().is_empty() {
            return Err(ConfigError::Validation(
                "Query terms cannot be empty".to_string(),
            ));
        }

        for domain in &query.expected_domains {
            validate_domain(domain)?;
        }
    }

    Ok(())
}

/// Validates notification sinks
fn validate_notifiers(config: &Config) -> ConfigResult<()> {
    if config.scan.notify && !config.has_notifier() {
        return Err(ConfigError::Validation(
            "notify is enabled but no [slack], [telegram] or [discord] section is configured"
                .to_string(),
        ));
    }

    if let Some(slack) = &config.slack {
        require_token("slack", &slack.token)?;
        if slack.channels.is_empty() {
            return Err(ConfigError::Validation(
                "slack.channels cannot be empty".to_string(),
            ));
        }
    }

    if let Some(telegram) = &config.telegram {
        require_token("telegram", &telegram.token)?;
        if telegram.chat_ids.is_empty() {
            return Err(ConfigError::Validation(
                "telegram.chat-ids cannot be empty".to_string(),
            ));
        }
    }

    if let Some(discord) = &config.discord {
        require_token("discord", &discord.token)?;
        if discord.webhook_id.trim().is_empty() {
            return Err(ConfigError::Validation(
                "discord.webhook-id cannot be empty".to_string(),
            ));
        }
    }

    Ok(())
}

/// Validates the URL-reputation service settings
fn validate_urlscan(config: &UrlScanConfig) -> ConfigResult<()> {
    require_token("urlscan", &config.token)?;

    let url = Url::parse(&config.scan_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid urlscan.scan-url: {}", e)))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidUrl(format!(
            "urlscan.scan-url must use http or https, got '{}'",
            config.scan_url
        )));
    }

    Ok(())
}

fn require_token(section: &str, token: &str) -> ConfigResult<()> {
    if token.trim().is_empty() {
        return Err(ConfigError::Validation(format!(
            "{}.token cannot be empty",
            section
        )));
    }
    Ok(())
}

/// Validates a bare host used for expected/excluded domains
///
/// Hosts coming out of URL parsing are lowercase and have `www.` stripped,
/// so anything else would never match.
fn validate_domain(domain: &str) -> ConfigResult<()> {
    if domain.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain cannot be empty".to_string(),
        ));
    }

    if domain.contains("://") {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' must not include a scheme",
            domain
        )));
    }

    if domain.starts_with("www.") {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' must not start with 'www.'",
            domain
        )));
    }

    if !domain
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '.' || c == '-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' must be a lowercase host name without paths or spaces",
            domain
        )));
    }

    if domain.starts_with('.')
        || domain.ends_with('.')
        || domain.starts_with('-')
        || domain.ends_with('-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' cannot start or end with '.' or '-'",
            domain
        )));
    }

    if domain.contains("..") {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' cannot contain consecutive dots",
            domain
        )));
    }

    Ok(())
}
