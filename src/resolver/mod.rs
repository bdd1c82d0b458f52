//! Ad-redirect resolver
//!
//! Search engines rarely link straight to the advertiser. An ad's `href`
//! usually points at a click tracker which carries the real destination in
//! its query string, sometimes base64-wrapped, sometimes nested inside another
//! tracker. This module unwraps those layers offline:
//!
//! 1. Extract the domain of the current URL
//! 2. Look it up in the [`ResolverRegistry`]
//! 3. Decode, and repeat with the decoded URL
//!
//! Resolution stops at the first domain without a decoder, at the first
//! decoder failure, or when a URL comes round a second time.

mod decoder;
mod registry;

pub use decoder::{extract_base64_dest_url, extract_dest_url, DecodeError, DecodeFn, Decoder};
pub use registry::ResolverRegistry;

use crate::url::extract_domain;
use std::collections::HashSet;

/// Outcome of resolving one ad URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// The last URL reached
    pub final_url: String,

    /// Domain of `final_url`; empty when it could not be extracted or a
    /// cycle was detected
    pub final_domain: String,

    /// Every URL produced by a decoder, in order
    pub hops: Vec<String>,
}

impl Resolution {
    fn terminal(final_url: String, final_domain: String, hops: Vec<String>) -> Self {
        Self {
            final_url,
            final_domain,
            hops,
        }
    }
}

impl ResolverRegistry {
    /// Resolves an ad URL to its final destination
    ///
    /// Never fails: malformed input comes back unchanged with an empty
    /// domain, and a decoder failure keeps the last URL reached together with
    /// that ad network's domain.
    ///
    /// # Example
    ///
    /// ```
    /// use seads::resolver::ResolverRegistry;
    ///
    /// let registry = ResolverRegistry::with_defaults();
    /// let resolution = registry.resolve(
    ///     "https://www.googleadservices.com/pagead/aclk?adurl=https%3A%2F%2Fshop.example.com%2F",
    /// );
    /// assert_eq!(resolution.final_url, "https://shop.example.com/");
    /// assert_eq!(resolution.final_domain, "shop.example.com");
    /// ```
    pub fn resolve(&self, ad_url: &str) -> Resolution {
        let mut visited: HashSet<String> = HashSet::new();
        let mut hops = Vec::new();
        let mut current = ad_url.to_string();

        loop {
            if !visited.insert(current.clone()) {
                tracing::debug!("Redirect cycle detected at {}", current);
                return Resolution::terminal(current, String::new(), hops);
            }

            let domain = match extract_domain(&current) {
                Ok(domain) => domain,
                Err(e) => {
                    tracing::debug!("Cannot resolve {}: {}", current, e);
                    return Resolution::terminal(current, String::new(), hops);
                }
            };

            let Some(decoder) = self.get(&domain) else {
                return Resolution::terminal(current, domain, hops);
            };

            match decoder.decode(&current) {
                Ok(next) => {
                    tracing::trace!("{} decoded {} -> {}", domain, current, next);
                    hops.push(next.clone());
                    current = next;
                }
                Err(e) => {
                    tracing::debug!("{} decoder failed on {}: {}", domain, current, e);
                    return Resolution::terminal(current, domain, hops);
                }
            }
        }
    }
}
