use crate::url::is_valid_url;
use crate::{UrlError, UrlResult};
use url::{Host, Url};

/// Extracts the registrable domain name of a URL without its public suffix
///
/// Subdomains and the public suffix are dropped using the Public Suffix List, so
/// multi-label suffixes such as `co.uk` are handled. Hosts without a registrable
/// domain (IP addresses, `localhost`) are returned as-is.
///
/// # Examples
///
/// ```
/// use recipe_trawl::url::extract_domain;
///
/// assert_eq!(extract_domain("http://www.example.com/page.html").unwrap(), "example");
/// assert_eq!(extract_domain("https://subdomain.example.co.uk").unwrap(), "example");
/// ```
pub fn extract_domain(url: &str) -> UrlResult<String> {
    is_valid_url(url)?;

    let parsed = Url::parse(url).map_err(|e| UrlError::Parse {
        url: url.to_string(),
        message: e.to_string(),
    })?;
    match parsed.host() {
        Some(Host::Domain(host)) => Ok(registrable_label(&host.to_lowercase())),
        Some(ip) => Ok(ip.to_string()),
        None => Err(UrlError::MissingDomain(url.to_string())),
    }
}

/// Returns the label directly left of the public suffix
fn registrable_label(host: &str) -> String {
    let Some(domain) = psl::domain(host.as_bytes()) else {
        return host.to_string();
    };

    let domain = String::from_utf8_lossy(domain.as_bytes()).to_string();
    let suffix = psl::suffix(host.as_bytes())
        .map(|s| String::from_utf8_lossy(s.as_bytes()).to_string())
        .unwrap_or_default();

    domain
        .strip_suffix(&suffix)
        .map(|d| d.trim_end_matches('.'))
        .and_then(|d| d.rsplit('.').next())
        .filter(|d| !d.is_empty())
        .map(str::to_string)
        .unwrap_or(domain)
}
