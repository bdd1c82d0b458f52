use super::decoder::Decoder;
use std::collections::HashMap;

/// Known ad-network click domains and how to unwrap them
///
/// Keys are bare hosts (no scheme, no `www.`), matched exactly against the
/// output of [`extract_domain`](crate::url::extract_domain). The registry is
/// assembled once at start-up through the consuming [`with`](Self::with)
/// builder and is read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct ResolverRegistry {
    decoders: HashMap<String, Decoder>,
}

/// Default entries: `(domain, decoder)`
fn default_entries() -> Vec<(&'static str, Decoder)> {
    vec![
        ("google.com", Decoder::query_param("adurl")),
        ("adsensecustomsearchads.com", Decoder::query_param("adurl")),
        ("syndicatedsearch.goog", Decoder::query_param("adurl")),
        ("googleadservices.com", Decoder::query_param("adurl")),
        ("bing.com", Decoder::base64_param("u")),
        ("duckduckgo.com", Decoder::query_param("u3")),
        ("ad.doubleclick.net", Decoder::query_param("ds_dest_url")),
        ("clickserve.dartsearch.net", Decoder::query_param("ds_dest_url")),
        ("d.adx.io", Decoder::query_param("xu")),
        ("monitor.clickcease.com", Decoder::query_param("url")),
        ("d.agkn.com", Decoder::query_param("l0")),
    ]
}

impl ResolverRegistry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry populated with the built-in ad networks
    ///
    /// # Example
    ///
    /// ```
    /// use seads::resolver::ResolverRegistry;
    ///
    /// let registry = ResolverRegistry::with_defaults();
    /// assert!(registry.contains("bing.com"));
    /// assert!(!registry.contains("example.com"));
    /// ```
    pub fn with_defaults() -> Self {
        default_entries()
            .into_iter()
            .fold(Self::new(), |registry, (domain, decoder)| {
                registry.with(domain, decoder)
            })
    }

    /// Adds (or replaces) the decoder for `domain`
    ///
    /// A leading `www.` is dropped so keys stay comparable with extracted
    /// domains.
    pub fn with(mut self, domain: impl AsRef<str>, decoder: Decoder) -> Self {
        let domain = domain.as_ref().trim();
        let key = domain.strip_prefix("www.").unwrap_or(domain).to_string();
        self.decoders.insert(key, decoder);
        self
    }

    /// Returns the decoder registered for `domain`, if any
    pub fn get(&self, domain: &str) -> Option<&Decoder> {
        self.decoders.get(domain)
    }

    pub fn contains(&self, domain: &str) -> bool {
        self.decoders.contains_key(domain)
    }

    pub fn len(&self) -> usize {
        self.decoders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decoders.is_empty()
    }

    /// Registered domains, sorted
    pub fn domains(&self) -> Vec<&str> {
        let mut domains: Vec<&str> = self.decoders.keys().map(String::as_str).collect();
        domains.sort_unstable();
        domains
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_cover_known_networks() {
        let registry = ResolverRegistry::with_defaults();
        for domain in [
            "google.com",
            "bing.com",
            "duckduckgo.com",
            "ad.doubleclick.net",
            "d.adx.io",
            "syndicatedsearch.goog",
        ] {
            assert!(registry.contains(domain), "missing {}", domain);
        }
        assert_eq!(registry.len(), 11);
    }

    #[test]
    fn test_keys_are_bare_domains() {
        let registry = ResolverRegistry::with_defaults();
        for domain in registry.domains() {
            assert!(!domain.contains("://"));
            assert!(!domain.starts_with("www."));
        }
    }

    #[test]
    fn test_with_strips_www() {
        let registry = ResolverRegistry::new().with("www.tracker.test", Decoder::query_param("to"));
        assert!(registry.contains("tracker.test"));
        assert!(!registry.contains("www.tracker.test"));
    }

    #[test]
    fn test_with_replaces_existing_entry() {
        let registry = ResolverRegistry::new()
            .with("tracker.test", Decoder::query_param("a"))
            .with("tracker.test", Decoder::query_param("b"));

        assert_eq!(registry.len(), 1);
        assert!(matches!(
            registry.get("tracker.test"),
            Some(Decoder::QueryParam(key)) if key == "b"
        ));
    }

    #[test]
    fn test_empty_registry() {
        let registry = ResolverRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.get("bing.com").is_none());
    }
}
