//! Ad records and the deduplicator
//!
//! An [`AdObservation`] is what an engine's results page gave us; a
//! [`ResolvedAd`] is the same observation once its destination and
//! classification are known. [`dedupe`] collapses a batch to one ad per host.

mod dedupe;
mod record;

pub use dedupe::dedupe;
pub use record::{AdObservation, ResolvedAd};
