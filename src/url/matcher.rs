use std::collections::BTreeSet;

/// Checks if a host belongs to one of the expected domains
///
/// A host matches a domain when it is equal to it or ends with it, so
/// `shop.example.com` is covered by `example.com`. Comparison is
/// case-sensitive; hosts coming out of [`extract_domain`] are already
/// lowercase.
///
/// The suffix test has no label boundary: `myexample.com` also ends with
/// `example.com`.
///
/// [`extract_domain`]: crate::url::extract_domain
///
/// # Examples
///
/// ```
/// use seads::url::is_expected;
///
/// assert!(is_expected("shop.example.com", &["example.com"]));
/// assert!(!is_expected("example.com", &["other.com"]));
/// ```
pub fn is_expected<S: AsRef<str>>(host: &str, expected_domains: &[S]) -> bool {
    expected_domains.iter().any(|domain| {
        let domain = domain.as_ref();
        host == domain || host.ends_with(domain)
    })
}

/// Union of the global exclusion list and one query's expected domains
///
/// Built once per query and only read afterwards, so it can be shared
/// between workers without synchronization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DomainAllowList {
    domains: BTreeSet<String>,
}

impl DomainAllowList {
    /// Merges the global list with a query's expected domains, dropping
    /// duplicates and empty entries
    pub fn merge<A, B>(global: &[A], per_query: &[B]) -> Self
    where
        A: AsRef<str>,
        B: AsRef<str>,
    {
        let domains = global
            .iter()
            .map(AsRef::as_ref)
            .chain(per_query.iter().map(AsRef::as_ref))
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string)
            .collect();

        Self { domains }
    }

    /// Returns true if `host` is an exact or suffix match of any entry
    pub fn is_expected(&self, host: &str) -> bool {
        self.domains
            .iter()
            .any(|domain| host == domain || host.ends_with(domain.as_str()))
    }

    pub fn len(&self) -> usize {
        self.domains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.domains.iter().map(String::as_str)
    }
}
