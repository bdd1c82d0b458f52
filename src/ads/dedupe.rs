use super::ResolvedAd;
use crate::url::force_https;
use crate::{UrlError, UrlResult};
use std::collections::HashSet;
use url::Url;

/// Keeps the first ad per destination host, in encounter order
///
/// The final URL (decoded offline even when redirects are not followed)
/// is forced to `https://` and parsed; its host (without port) is the
/// identity. Unlike resolution this does not forgive bad input: one
/// unparseable URL fails the whole batch.
///
/// # Arguments
///
/// * `ads` - The batch from one engine and query
///
/// # Returns
///
/// * `Ok(Vec<ResolvedAd>)` - The surviving ads
/// * `Err(UrlError::Parse)` - A final URL could not be parsed
pub fn dedupe(ads: Vec<ResolvedAd>) -> UrlResult<Vec<ResolvedAd>> {
    let mut seen_hosts = HashSet::new();
    let mut unique = Vec::with_capacity(ads.len());

    for ad in ads {
        let normalized = force_https(&ad.final_redirect_url);
        let parsed = Url::parse(&normalized).map_err(|source| UrlError::Parse {
            url: normalized.clone(),
            source,
        })?;

        let host = parsed.host_str().unwrap_or_default().to_string();
        if seen_hosts.insert(host) {
            unique.push(ad);
        } else {
            tracing::trace!("Dropping duplicate ad for {}", normalized);
        }
    }

    Ok(unique)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ads::AdObservation;
    use crate::resolver::Resolution;

    fn create_test_ad(original: &str, final_url: &str) -> ResolvedAd {
        ResolvedAd::from_resolution(
            AdObservation::new("bing", "ipad", original),
            Resolution {
                final_url: final_url.to_string(),
                final_domain: String::new(),
                hops: Vec::new(),
            },
        )
    }

    #[test]
    fn test_same_host_keeps_first() {
        let ads = vec![
            create_test_ad("https://ads.test/1", "http://example.com/a"),
            create_test_ad("https://ads.test/2", "https://example.com/b"),
        ];

        let unique = dedupe(ads).expect("dedupe");

        assert_eq!(unique.len(), 1);
        assert_eq!(unique[0].original_ad_url(), "https://ads.test/1");
    }

    #[test]
    fn test_distinct_hosts_preserved_in_order() {
        let ads = vec![
            create_test_ad("https://ads.test/1", "https://b.example.com/"),
            create_test_ad("https://ads.test/2", "https://a.example.com/"),
            create_test_ad("https://ads.test/3", "https://c.example.com/"),
        ];

        let unique = dedupe(ads).expect("dedupe");

        let finals: Vec<_> = unique.iter().map(|a| a.final_redirect_url.as_str()).collect();
        assert_eq!(
            finals,
            vec!["https://b.example.com/", "https://a.example.com/", "https://c.example.com/"]
        );
    }

    #[test]
    fn test_schemeless_url_is_normalized() {
        let ads = vec![
            create_test_ad("https://ads.test/1", "example.com/a"),
            create_test_ad("https://ads.test/2", "https://example.com/b"),
        ];

        assert_eq!(dedupe(ads).expect("dedupe").len(), 1);
    }

    #[test]
    fn test_www_is_a_different_host() {
        let ads = vec![
            create_test_ad("https://ads.test/1", "https://www.example.com/"),
            create_test_ad("https://ads.test/2", "https://example.com/"),
        ];

        assert_eq!(dedupe(ads).expect("dedupe").len(), 2);
    }

    #[test]
    fn test_shared_tracker_host_is_not_the_identity() {
        let ads = vec![
            create_test_ad("https://www.bing.com/aclick?u=1", "https://a.example.com/"),
            create_test_ad("https://www.bing.com/aclick?u=2", "https://b.example.com/"),
        ];

        assert_eq!(dedupe(ads).expect("dedupe").len(), 2);
    }

    #[test]
    fn test_unparseable_url_fails_batch() {
        let ads = vec![
            create_test_ad("https://ads.test/1", "https://example.com/"),
            create_test_ad("https://ads.test/2", "#fragment"),
        ];

        let result = dedupe(ads);
        assert!(matches!(result, Err(UrlError::Parse { .. })));
    }

    #[test]
    fn test_empty_batch() {
        assert!(dedupe(Vec::new()).expect("dedupe").is_empty());
    }
}
