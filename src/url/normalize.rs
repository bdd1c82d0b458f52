/// Forces an `https://` scheme onto a URL
///
/// `http://` is upgraded, `https://` is left alone, and anything else gets
/// `https://` prepended. Only the leading scheme is touched.
///
/// # Examples
///
/// ```
/// use seads::url::force_https;
///
/// assert_eq!(force_https("http://example.com"), "https://example.com");
/// assert_eq!(force_https("https://example.com"), "https://example.com");
/// assert_eq!(force_https("example.com"), "https://example.com");
/// ```
pub fn force_https(url: &str) -> String {
    if url.starts_with("https://") {
        url.to_string()
    } else if let Some(rest) = url.strip_prefix("http://") {
        format!("https://{}", rest)
    } else {
        format!("https://{}", url)
    }
}

/// Makes a URL or domain non-clickable for reports and notifications
///
/// Every `.` becomes `[.]` and the first `http` becomes `hxxp`.
///
/// # Examples
///
/// ```
/// use seads::url::defang;
///
/// assert_eq!(defang("https://evil.example.com/x"), "hxxps://evil[.]example[.]com/x");
/// assert_eq!(defang("example.com"), "example[.]com");
/// ```
pub fn defang(url: &str) -> String {
    url.replace('.', "[.]").replacen("http", "hxxp", 1)
}
