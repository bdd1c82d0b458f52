//! URL handling module for Seads
//!
//! This module provides domain extraction, scheme normalization, defanging
//! and allow-list matching of ad landing domains.

mod domain;
mod matcher;
mod normalize;

// Re-export main functions
pub use domain::extract_domain;
pub use matcher::{is_expected, DomainAllowList};
pub use normalize::{defang, force_https};
