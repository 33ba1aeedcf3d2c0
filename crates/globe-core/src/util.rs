//! Shared utility functions used across multiple modules.

use std::sync::OnceLock;

use regex::Regex;

/// Normalize optional text by trimming whitespace and removing empties.
///
/// Returns `None` when the input is `None` or the trimmed value is empty.
pub fn normalize_text_option(value: Option<String>) -> Option<String> {
    let value = value?;
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Check if a string starts with `http://` or `https://`.
pub fn is_http_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

/// Truncate text to at most 180 characters for error messages.
pub fn compact_text(value: &str) -> String {
    value.trim().chars().take(180).collect()
}

/// Normalize a base URL: trims whitespace and trailing slashes, requires an http(s) scheme.
pub fn normalize_base_url(raw: &str) -> Result<String, String> {
    let base = raw.trim().trim_end_matches('/').to_string();
    if base.is_empty() {
        return Err("base URL must not be empty".to_string());
    }
    if !is_http_url(&base) {
        return Err(format!("base URL '{base}' must include http:// or https://"));
    }
    Ok(base)
}

/// Validate and upper-case an ISO 3166 alpha-2 or alpha-3 country code.
///
/// # Examples
///
/// ```
/// use globe_core::util::normalize_country_code;
///
/// assert_eq!(normalize_country_code(" gbr ").as_deref(), Some("GBR"));
/// assert_eq!(normalize_country_code("eg").as_deref(), Some("EG"));
/// assert_eq!(normalize_country_code("e1"), None);
/// ```
pub fn normalize_country_code(raw: &str) -> Option<String> {
    static CODE_PATTERN: OnceLock<Regex> = OnceLock::new();
    let pattern = CODE_PATTERN
        .get_or_init(|| Regex::new(r"^[A-Za-z]{2,3}$").expect("country code pattern is valid"));

    let code = raw.trim();
    pattern.is_match(code).then(|| code.to_ascii_uppercase())
}

/// Current Unix timestamp in milliseconds.
pub fn unix_timestamp_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
