//! Results-page parsing
//!
//! Kept synchronous: `scraper::Html` is not `Send`, so documents are parsed
//! and dropped before the caller awaits anything else.

use super::{EngineDescriptor, SourceError, AD_INFO_SELECTOR};
use scraper::{ElementRef, Html, Selector};
use url::Url;

const PAID_FOR_PREFIX: &str = "Paid for by ";

fn parse_selector(selector: &str) -> Result<Selector, SourceError> {
    Selector::parse(selector).map_err(|e| SourceError::Selector(format!("{}: {:?}", selector, e)))
}

fn text_of(element: ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn child_divs(element: ElementRef) -> Vec<ElementRef> {
    element
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|child| child.value().name() == "div")
        .collect()
}

/// Makes `href` absolute against the engine's search URL
fn absolutize(href: &str, base: Option<&Url>) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    if href.starts_with("http://") || href.starts_with("https://") {
        return Some(href.to_string());
    }
    base.and_then(|base| base.join(href).ok())
        .filter(|url| matches!(url.scheme(), "http" | "https"))
        .map(|url| url.to_string())
}

/// Scraped links for one results page
#[derive(Debug, Default)]
pub struct ResultsPage {
    /// Ad URLs in page order
    pub ad_links: Vec<String>,

    /// Advertiser transparency links in page order; empty for engines
    /// without that capability
    pub info_links: Vec<String>,
}

/// Extracts ad links (and transparency links when the engine has them)
///
/// # Arguments
///
/// * `html` - The raw results page
/// * `engine` - Supplies the selector, the link attribute and the base URL
///
/// # Returns
///
/// * `Ok(ResultsPage)` - The links found, possibly none
/// * `Err(SourceError::Selector)` - A selector in the catalogue does not parse
pub fn parse_results_page(
    html: &str,
    engine: &EngineDescriptor,
    base: Option<&Url>,
) -> Result<ResultsPage, SourceError> {
    let document = Html::parse_document(html);
    let link_selector = parse_selector(engine.link_selector)?;

    let ad_links = document
        .select(&link_selector)
        .filter_map(|element| element.value().attr(engine.link_attribute))
        .filter_map(|href| absolutize(href, base))
        .collect();

    let info_links = if engine.transparency {
        let info_selector = parse_selector(AD_INFO_SELECTOR)?;
        document
            .select(&info_selector)
            .filter_map(|element| element.value().attr("href"))
            .filter_map(|href| absolutize(href, base))
            .collect()
    } else {
        Vec::new()
    };

    Ok(ResultsPage {
        ad_links,
        info_links,
    })
}

/// Reads advertiser name and location from a transparency page
///
/// The page lays details out as rows of two `div` cells. The row whose
/// label cell reads `Location` holds the location; the row right before it
/// holds the advertiser name, possibly prefixed with `Paid for by `.
///
/// # Example
///
/// ```
/// use seads::engine::parse_advertiser_info;
///
/// let html = r#"<div>
///   <div><div>Advertiser</div><div>Paid for by Shop AG</div></div>
///   <div><div>Location</div><div>Switzerland</div></div>
/// </div>"#;
///
/// assert_eq!(
///     parse_advertiser_info(html),
///     Some(("Shop AG".to_string(), "Switzerland".to_string()))
/// );
/// ```
pub fn parse_advertiser_info(html: &str) -> Option<(String, String)> {
    let document = Html::parse_document(html);
    let div = Selector::parse("div").ok()?;

    for row in document.select(&div) {
        let cells = child_divs(row);
        if cells.len() < 2 || !cells.iter().any(|cell| text_of(*cell) == "Location") {
            continue;
        }

        let location = text_of(cells[1]);
        let name = row
            .prev_siblings()
            .filter_map(ElementRef::wrap)
            .find(|sibling| sibling.value().name() == "div")
            .and_then(|previous| child_divs(previous).get(1).copied())
            .map(text_of)?;

        let name = name
            .strip_prefix(PAID_FOR_PREFIX)
            .map(str::to_string)
            .unwrap_or(name);
        return Some((name, location));
    }

    None
}
