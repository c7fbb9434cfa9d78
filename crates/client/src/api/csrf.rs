//! CSRF token lookup from the page's cookie header.

use std::sync::LazyLock;

use regex::Regex;

static CSRF_COOKIE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"csrftoken=([^;]+)").expect("csrftoken pattern is valid"));

/// Header carrying the token on write requests.
pub const CSRF_HEADER: &str = "X-CSRFToken";

/// Extract and percent-decode the `csrftoken` cookie value.
///
/// Returns None when the cookie is absent or empty.
pub fn csrf_token(cookie_header: &str) -> Option<String> {
    let raw = CSRF_COOKIE.captures(cookie_header)?.get(1)?.as_str().trim();
    let decoded = url::form_urlencoded::parse(format!("t={}", raw.replace('+', "%2B")).as_bytes())
        .next()
        .map(|(_, value)| value.into_owned())?;
    (!decoded.is_empty()).then_some(decoded)
}
