/// A search engine whose results are scanned for ads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineDescriptor {
    /// Name used in configuration, logs and exports
    pub name: &'static str,

    /// Search URL; the encoded query is appended as-is
    pub search_url: &'static str,

    /// CSS selector matching the ad links
    pub link_selector: &'static str,

    /// Attribute carrying the ad URL on each matched element
    pub link_attribute: &'static str,

    /// Whether the results page links each ad to an advertiser
    /// transparency page (name and location)
    pub transparency: bool,
}

/// Selector for the per-ad "about this advertiser" link
pub const AD_INFO_SELECTOR: &str = "a.si149";

/// Every supported engine, in dispatch order
pub const ENGINES: &[EngineDescriptor] = &[
    EngineDescriptor {
        name: "google",
        search_url: "https://www.google.com/search?q=",
        link_selector: "a.sVXRqc",
        link_attribute: "data-rw",
        transparency: true,
    },
    EngineDescriptor {
        name: "bing",
        search_url: "https://www.bing.com/search?form=QBLH&q=",
        link_selector: r#"li.b_adTop [role="link"]"#,
        link_attribute: "href",
        transparency: false,
    },
    EngineDescriptor {
        name: "duckduckgo",
        search_url: "https://duckduckgo.com/?ia=web&q=",
        link_selector: r#"li[data-layout="ad"] a[data-testid="result-extras-url-link"]"#,
        link_attribute: "href",
        transparency: false,
    },
    EngineDescriptor {
        name: "yahoo",
        search_url: "https://search.yahoo.com/search?q=",
        link_selector: r#"ol.searchCenterTopAds a[data-matarget="ad"]"#,
        link_attribute: "href",
        transparency: false,
    },
    EngineDescriptor {
        name: "syndicated",
        search_url: concat!(
            "https://syndicatedsearch.goog/afs/ads?",
            "adsafe=medium&adtest=off&adpage=1&channel=ch1&client=amg-informationvine&r=m&hl=en&ie=utf-8&adrep=5&oe=utf-8&type=0&format=p5%7Cn5&ad=n5p5&output=uds_ads_only&v=3&bsl=8&pac=0&u_his=5&uio=--&cont=text-ad-block-0%7Ctext-ad-block-1&rurl=https%3A%2F%2Fwww.ask.com%2Fweb%3F%26o%3D0%26an%3Dorganic%26ad%3DOther%2BSEO%26capLimitBypass%3Dfalse%26qo%3DserpSearchTopBox%26q&q="
        ),
        link_selector: "a.si27",
        link_attribute: "href",
        transparency: true,
    },
    EngineDescriptor {
        name: "adsenseads",
        search_url: concat!(
            "https://www.adsensecustomsearchads.com/afs/ads?",
            "adsafe=medium&adtest=off&adpage=1&channel=ch1&client=amg-informationvine&r=m&hl=en&ie=utf-8&adrep=5&oe=utf-8&type=0&format=p5%7Cn5&ad=n5p5&output=uds_ads_only&v=3&bsl=8&pac=0&u_his=5&uio=--&cont=text-ad-block-0%7Ctext-ad-block-1&rurl=https%3A%2F%2Fwww.ask.com%2Fweb%3F%26o%3D0%26an%3Dorganic%26ad%3DOther%2BSEO%26capLimitBypass%3Dfalse%26qo%3DserpSearchTopBox%26q&q="
        ),
        link_selector: "a.si27",
        link_attribute: "href",
        transparency: true,
    },
    EngineDescriptor {
        name: "aol",
        search_url: "https://search.aol.com/aol/search?q=",
        link_selector: r#"a[data-matarget="ad"]"#,
        link_attribute: "href",
        transparency: false,
    },
];

/// Looks up an engine by name
pub fn find_engine(name: &str) -> Option<&'static EngineDescriptor> {
    ENGINES.iter().find(|engine| engine.name == name)
}

/// Names of all supported engines
pub fn engine_names() -> Vec<&'static str> {
    ENGINES.iter().map(|engine| engine.name).collect()
}

/// Engines to dispatch for a run
///
/// An empty filter selects every engine. Unknown names are ignored here;
/// configuration validation rejects them earlier.
///
/// # Example
///
/// ```
/// use seads::engine::select_engines;
///
/// assert_eq!(select_engines(&[]).len(), 7);
///
/// let picked = select_engines(&["bing".to_string(), "google".to_string()]);
/// let names: Vec<_> = picked.iter().map(|e| e.name).collect();
/// assert_eq!(names, vec!["google", "bing"]);
/// ```
pub fn select_engines(filter: &[String]) -> Vec<&'static EngineDescriptor> {
    ENGINES
        .iter()
        .filter(|engine| filter.is_empty() || filter.iter().any(|name| name == engine.name))
        .collect()
}
