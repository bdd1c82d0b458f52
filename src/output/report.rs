//! Console report
//!
//! Everything here is user-facing text written with `println!`, separate
//! from the `tracing` log stream.

use crate::ads::ResolvedAd;
use crate::scan::ScanOutcome;
use crate::url::{defang, extract_domain};

/// How ads are printed on the console
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportOptions {
    /// Print links as-is instead of defanging them
    pub clean_links: bool,

    /// List each ad's redirect chain
    pub redirect_chain: bool,
}

impl ReportOptions {
    fn link(&self, url: &str) -> String {
        if self.clean_links {
            url.to_string()
        } else {
            defang(url)
        }
    }
}

/// Formats one ad as it appears in the console report
///
/// # Arguments
///
/// * `ad` - The classified ad
/// * `options` - Defanging and redirect chain settings
///
/// # Returns
///
/// The formatted block, ending with a blank line
pub fn format_ad_report(ad: &ResolvedAd, options: &ReportOptions) -> String {
    let mut out = String::new();

    if ad.expected {
        out.push_str("  [+] expected domain: ");
    } else {
        out.push_str("  [!] unexpected domain: ");
    }
    out.push_str(&format!(
        "{} => {}\n",
        options.link(&ad.final_domain),
        options.link(&ad.final_redirect_url)
    ));

    let original_domain = extract_domain(ad.original_ad_url()).unwrap_or_default();
    if original_domain != ad.final_domain {
        out.push_str(&format!(
            "  original URL: {}\n",
            options.link(ad.original_ad_url())
        ));
    }

    if let Some(name) = &ad.observation.advertiser {
        out.push_str(&format!("  advertiser name: {}\n", name));
        out.push_str(&format!(
            "  advertiser location: {}\n",
            ad.observation.advertiser_location.as_deref().unwrap_or("")
        ));
    }

    if options.redirect_chain {
        out.push_str(&format_redirect_chain(&ad.redirect_chain, options));
    }

    out.push('\n');
    out
}

/// Numbered redirect chain listing
pub fn format_redirect_chain(chain: &[String], options: &ReportOptions) -> String {
    if chain.len() < 2 {
        return "  no redirects found!\n".to_string();
    }

    let mut out = String::from("  redirect chain:\n");
    for (i, url) in chain.iter().enumerate() {
        out.push_str(&format!("    {}) {}\n", i + 1, options.link(url)));
    }
    out
}

/// Prints every ad of a run, grouped by engine and query as scanned
pub fn print_report(ads: &[ResolvedAd], options: &ReportOptions) {
    let mut current: Option<(&str, &str)> = None;

    for ad in ads {
        let heading = (ad.engine(), ad.query());
        if current != Some(heading) {
            println!("[{}] '{}'", heading.0, heading.1);
            current = Some(heading);
        }
        print!("{}", format_ad_report(ad, options));
    }
}

/// Formats the end-of-run summary
pub fn format_run_summary(outcome: &ScanOutcome) -> String {
    let mut out = String::from("=== Scan Summary ===\n\n");

    out.push_str(&format!("Queries completed: {}\n", outcome.queries_completed));
    out.push_str(&format!("Ads found: {}\n", outcome.ads.len()));
    out.push_str(&format!("Unexpected ads: {}\n", outcome.unexpected_count()));

    let per_engine = outcome.per_engine();
    if !per_engine.is_empty() {
        out.push_str("\nAds per engine:\n");
        for (engine, count) in &per_engine {
            out.push_str(&format!("  {}: {}\n", engine, count));
        }
    }

    if !outcome.failures.is_empty() {
        out.push_str(&format!("\nWorker failures ({}):\n", outcome.failures.len()));
        for failure in &outcome.failures {
            out.push_str(&format!(
                "  {} '{}': {}\n",
                failure.engine, failure.query, failure.error
            ));
        }
    }

    if outcome.cancelled {
        out.push_str("\nRun cancelled, results are partial\n");
    }
    if let Some(error) = &outcome.aborted {
        out.push_str(&format!("\nRun aborted: {}\n", error));
    }

    out
}

pub fn print_run_summary(outcome: &ScanOutcome) {
    println!("{}", format_run_summary(outcome));
}
