use crate::{UrlError, UrlResult};
use url::Url;

/// Strips a URL down to its homepage: scheme, host, non-default port and `/`
///
/// # Examples
///
/// ```
/// use recipe_trawl::url::strip_url_to_homepage;
///
/// assert_eq!(
///     strip_url_to_homepage("http://www.example.com/page.html").unwrap(),
///     "http://www.example.com/"
/// );
/// ```
pub fn strip_url_to_homepage(url: &str) -> UrlResult<String> {
    let parsed = Url::parse(url).map_err(|e| UrlError::Parse {
        url: url.to_string(),
        message: e.to_string(),
    })?;

    let host = parsed
        .host_str()
        .filter(|h| !h.is_empty())
        .ok_or_else(|| UrlError::MissingDomain(url.to_string()))?;

    Ok(match parsed.port() {
        Some(port) => format!("{}://{}:{}/", parsed.scheme(), host, port),
        None => format!("{}://{}/", parsed.scheme(), host),
    })
}
