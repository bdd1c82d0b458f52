//! Redirect chain walker
//!
//! Follows HTTP redirects by hand, one request per hop, so every `Location`
//! along the way is recorded. The resolver in [`crate::resolver`] unwraps
//! tracking URLs offline; this module verifies where they really go.

mod client;
mod walker;

pub use client::build_no_redirect_client;
pub use walker::{ChainWalk, LoopGuard, RedirectError, RedirectWalker, DEFAULT_MAX_HOPS};
