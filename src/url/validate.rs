use crate::{UrlError, UrlResult};
use regex::Regex;
use std::sync::OnceLock;
use url::Url;

/// Full-shape check applied once the scheme and authority are known to be present
///
/// Hosts are a dotted domain with an alphabetic TLD, `localhost`, or an IPv4 address.
const URL_PATTERN: &str = concat!(
    r"(?i)^https?://",
    r"((\w+(-\w+)*\.)+[a-z]{2,}|localhost|\d{1,3}(\.\d{1,3}){3})",
    r"(:[0-9]{1,5})?",
    r"(/[\w-]*)*",
    r"(\.[a-z0-9]{1,5})?",
    r"(\?\S*)?",
    r"(#\S*)?$",
);

fn url_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(URL_PATTERN).expect("URL pattern is a valid regex"))
}

/// Checks whether a string is a valid http(s) URL
///
/// Checks run in order, so the error names the first problem found:
/// empty input, missing scheme, unsupported scheme, missing domain and finally
/// the overall URL shape.
///
/// # Examples
///
/// ```
/// use recipe_trawl::url::is_valid_url;
/// use recipe_trawl::UrlError;
///
/// assert!(is_valid_url("https://example.com/recipes/soup").is_ok());
/// assert_eq!(is_valid_url(""), Err(UrlError::Empty));
/// assert_eq!(is_valid_url("www.example.com"), Err(UrlError::MissingScheme));
/// ```
pub fn is_valid_url(url: &str) -> UrlResult<()> {
    if url.is_empty() {
        return Err(UrlError::Empty);
    }

    let (scheme, rest) = url.split_once("://").ok_or(UrlError::MissingScheme)?;
    if scheme.is_empty() {
        return Err(UrlError::MissingScheme);
    }

    let scheme = scheme.to_lowercase();
    if scheme != "http" && scheme != "https" {
        return Err(UrlError::InvalidScheme(scheme));
    }

    let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
    if authority.is_empty() {
        return Err(UrlError::MissingDomain(url.to_string()));
    }

    if !url_pattern().is_match(url) {
        return Err(UrlError::Malformed(url.to_string()));
    }

    Url::parse(url).map_err(|e| UrlError::Parse {
        url: url.to_string(),
        message: e.to_string(),
    })?;

    Ok(())
}
