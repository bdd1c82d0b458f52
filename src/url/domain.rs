use crate::{UrlError, UrlResult};
use url::Url;

/// Extracts the canonical host from a URL
///
/// Inputs without a scheme are treated as `https://`. The leading `www.` is
/// stripped from the host; ports, paths and queries are ignored. Hosts are
/// lowercased by the URL parser, everything else is left untouched.
///
/// # Arguments
///
/// * `input` - The URL (or bare `host/path`) to extract the domain from
///
/// # Returns
///
/// * `Ok(String)` - The host without a leading `www.`
/// * `Err(UrlError::InvalidUrl)` - The input does not parse or has no host
///
/// # Examples
///
/// ```
/// use seads::url::extract_domain;
///
/// assert_eq!(extract_domain("http://sub.example.com/x").unwrap(), "sub.example.com");
/// assert_eq!(extract_domain("https://www.sub.example.com/x").unwrap(), "sub.example.com");
/// assert_eq!(extract_domain("example.com/landing").unwrap(), "example.com");
/// assert!(extract_domain("").is_err());
/// ```
pub fn extract_domain(input: &str) -> UrlResult<String> {
    let candidate = if has_scheme(input) {
        input.to_string()
    } else {
        format!("https://{}", input)
    };

    let parsed = Url::parse(&candidate).map_err(|_| UrlError::InvalidUrl(input.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(UrlError::InvalidUrl(input.to_string()));
    }

    match parsed.host_str() {
        Some(host) if !host.is_empty() => {
            Ok(host.strip_prefix("www.").unwrap_or(host).to_string())
        }
        _ => Err(UrlError::InvalidUrl(input.to_string())),
    }
}

/// Returns true when `input` starts with `scheme:`
///
/// `example.com:8080/x` is a host with a port, not a scheme, so a colon
/// followed by a digit does not count.
fn has_scheme(input: &str) -> bool {
    let Some((scheme, rest)) = input.split_once(':') else {
        return false;
    };

    let mut chars = scheme.chars();
    let valid_scheme = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));

    valid_scheme && !rest.starts_with(|c: char| c.is_ascii_digit())
}
