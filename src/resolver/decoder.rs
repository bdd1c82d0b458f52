//! Per-network decoders
//!
//! A decoder turns one ad-network click URL into the URL it redirects to,
//! without touching the network. Decoders never panic on malformed input;
//! every failure is reported as a [`DecodeError`].

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use percent_encoding::percent_decode_str;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use url::Url;

/// Unpadded base64url, tolerant of non-canonical trailing bits
const BASE64_URL_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::RequireNone)
        .with_decode_allow_trailing_bits(true),
);

/// Version marker Bing puts in front of its encoded destination
const BING_BLOB_MARKER: &str = "a1";

/// Errors produced while decoding an ad-network URL
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("invalid ad URL: {0}")]
    InvalidUrl(String),

    #[error("query parameter '{0}' is missing or empty")]
    MissingParam(String),

    #[error("failed to decode base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("decoded destination is not valid UTF-8")]
    Utf8,

    #[error("unescaping not possible: {0}")]
    Unescape(String),

    #[error("invalid destination URL: {0}")]
    InvalidDestination(String),
}

/// Function signature for decoders that do not fit the built-in shapes
pub type DecodeFn = dyn Fn(&str) -> Result<String, DecodeError> + Send + Sync;

/// A pure decoding strategy for one ad network
#[derive(Clone)]
pub enum Decoder {
    /// Destination carried verbatim in a query parameter (`adurl`, `xu`, ...)
    QueryParam(String),

    /// Destination carried as unpadded base64url of a percent-encoded URL
    Base64Param(String),

    /// Arbitrary decoding function
    Custom(Arc<DecodeFn>),
}

impl Decoder {
    pub fn query_param(key: impl Into<String>) -> Self {
        Self::QueryParam(key.into())
    }

    pub fn base64_param(key: impl Into<String>) -> Self {
        Self::Base64Param(key.into())
    }

    pub fn custom<F>(decode: F) -> Self
    where
        F: Fn(&str) -> Result<String, DecodeError> + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(decode))
    }

    /// Decodes `ad_url` into the URL the network would redirect to
    pub fn decode(&self, ad_url: &str) -> Result<String, DecodeError> {
        match self {
            Self::QueryParam(key) => extract_dest_url(ad_url, key),
            Self::Base64Param(key) => extract_base64_dest_url(ad_url, key),
            Self::Custom(decode) => decode(ad_url),
        }
    }
}

impl fmt::Debug for Decoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::QueryParam(key) => f.debug_tuple("QueryParam").field(key).finish(),
            Self::Base64Param(key) => f.debug_tuple("Base64Param").field(key).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Extracts a destination URL from the query parameter `key`
///
/// Both the ad URL and the destination must parse and carry a host.
///
/// # Examples
///
/// ```
/// use seads::resolver::extract_dest_url;
///
/// let dest = extract_dest_url(
///     "https://d.adx.io/clicks?xu=https%3A%2F%2Fshop.example.com%2F",
///     "xu",
/// ).unwrap();
/// assert_eq!(dest, "https://shop.example.com/");
/// ```
pub fn extract_dest_url(ad_url: &str, key: &str) -> Result<String, DecodeError> {
    let value = query_value(ad_url, key)?;
    validate_destination(value)
}

/// Extracts a destination URL hidden as base64url in the query parameter `key`
///
/// The parameter is decoded (no padding), the result is query-unescaped, and
/// the inner URL is validated like any other destination.
pub fn extract_base64_dest_url(ad_url: &str, key: &str) -> Result<String, DecodeError> {
    let blob = query_value(ad_url, key)?;
    let blob = blob.strip_prefix(BING_BLOB_MARKER).unwrap_or(&blob);

    let bytes = BASE64_URL_LENIENT.decode(blob)?;
    let decoded = String::from_utf8(bytes).map_err(|_| DecodeError::Utf8)?;
    let unescaped = query_unescape(&decoded)?;

    validate_destination(unescaped)
}

/// Reads the first value of `key` from the query string of `ad_url`
fn query_value(ad_url: &str, key: &str) -> Result<String, DecodeError> {
    let parsed = Url::parse(ad_url).map_err(|_| DecodeError::InvalidUrl(ad_url.to_string()))?;
    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(DecodeError::InvalidUrl(ad_url.to_string()));
    }

    parsed
        .query_pairs()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| DecodeError::MissingParam(key.to_string()))
}

fn validate_destination(dest: String) -> Result<String, DecodeError> {
    match Url::parse(&dest) {
        Ok(url) if url.host_str().is_some_and(|h| !h.is_empty()) => Ok(dest),
        _ => Err(DecodeError::InvalidDestination(dest)),
    }
}

/// Query-component unescaping: `+` is a space and every `%` must start a
/// valid two-digit hex escape
fn query_unescape(value: &str) -> Result<String, DecodeError> {
    let bytes = value.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let valid = bytes.len() > i + 2
                && bytes[i + 1].is_ascii_hexdigit()
                && bytes[i + 2].is_ascii_hexdigit();
            if !valid {
                return Err(DecodeError::Unescape(value.to_string()));
            }
            i += 3;
        } else {
            i += 1;
        }
    }

    let spaced = value.replace('+', " ");
    percent_decode_str(&spaced)
        .decode_utf8()
        .map(|s| s.into_owned())
        .map_err(|_| DecodeError::Utf8)
}
