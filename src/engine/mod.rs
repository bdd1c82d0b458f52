//! Search engines and the ad-source collaborator
//!
//! The catalogue describes each engine as data: where to search, which
//! elements are ads, and whether advertiser details are published. Fetching
//! and scraping sit behind the [`AdSource`] trait so the orchestrator can be
//! driven by the bundled [`HttpAdSource`], a browser, or a test double.

mod catalogue;
mod http;
mod page;
mod source;

pub use catalogue::{
    engine_names, find_engine, select_engines, EngineDescriptor, AD_INFO_SELECTOR, ENGINES,
};
pub use http::{build_search_client, HttpAdSource, DEFAULT_BROWSER_AGENT};
pub use page::{parse_advertiser_info, parse_results_page, ResultsPage};
pub use source::{AdSource, SearchRequest, SourceError};
