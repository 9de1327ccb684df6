use crate::config::FilterConfig;

/// Substrings marking sub-sitemaps that cannot contain recipe pages
pub const SITEMAP_FILTER_KEYWORDS: &[&str] = &[
    "ad-sitemap",
    "-ad-",
    "/ad-",
    "ads-sitemap",
    "-ads-",
    "/ads-",
    "advertise",
    "adgroup",
    "/tag-",
    "-tag-",
    "tag-sitemap",
    "asset",
    "categor",
    "event",
    "image",
    "news",
    "video",
];

/// Substrings marking page URLs that point at media or documents
pub const URL_FILTER_KEYWORDS: &[&str] = &[
    // images
    ".png", ".apng", ".jpg", ".jpeg", ".jpe", ".jif", ".jfif", ".svg", ".webp", ".ico", ".cur",
    ".tif", ".tiff", ".bmp", ".xbm",
    // videos
    ".webm", ".mkv", ".flv", ".vob", ".ogv", ".ogg", ".rrc", ".gifv", ".mng", ".mov", ".avi",
    ".qt", ".wmv", ".yuv", ".rm", ".asf", ".amv", ".mp4", ".m4p", ".m4v", ".mpg", ".mp2",
    ".mpeg", ".mpe", ".mpv", ".svi", ".3gp", ".3g2", ".mxf", ".roq", ".nsv", ".f4v", ".f4p",
    ".f4a", ".f4b", ".mod",
    // other
    ".gif", ".pdf",
];

/// Classifies sitemap and page URLs by case-insensitive substring match
///
/// Both checks are pure: a URL is filtered when its lowercased form contains
/// any keyword. Keywords are stored lowercased and empty keywords are dropped.
#[derive(Debug, Clone)]
pub struct UrlClassifier {
    sitemap_keywords: Vec<String>,
    url_keywords: Vec<String>,
}

impl Default for UrlClassifier {
    fn default() -> Self {
        Self::new(
            SITEMAP_FILTER_KEYWORDS.iter().copied(),
            URL_FILTER_KEYWORDS.iter().copied(),
        )
    }
}

impl UrlClassifier {
    /// Creates a classifier from explicit keyword lists
    pub fn new<S, U>(sitemap_keywords: S, url_keywords: U) -> Self
    where
        S: IntoIterator,
        S::Item: AsRef<str>,
        U: IntoIterator,
        U::Item: AsRef<str>,
    {
        Self {
            sitemap_keywords: normalize_keywords(sitemap_keywords),
            url_keywords: normalize_keywords(url_keywords),
        }
    }

    /// Creates a classifier with the built-in tables plus configured extras
    pub fn from_config(filters: &FilterConfig) -> Self {
        let mut classifier = Self::default();
        classifier
            .sitemap_keywords
            .extend(normalize_keywords(&filters.sitemap_keywords));
        classifier
            .url_keywords
            .extend(normalize_keywords(&filters.url_keywords));
        classifier
    }

    /// True if the sub-sitemap URL names a section without recipes
    pub fn is_filtered_sitemap(&self, url: &str) -> bool {
        contains_any(url, &self.sitemap_keywords)
    }

    /// True if the page URL points at a media file or document
    pub fn is_filtered_page(&self, url: &str) -> bool {
        contains_any(url, &self.url_keywords)
    }
}

fn normalize_keywords<I>(keywords: I) -> Vec<String>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    keywords
        .into_iter()
        .map(|k| k.as_ref().to_lowercase())
        .filter(|k| !k.is_empty())
        .collect()
}

fn contains_any(url: &str, keywords: &[String]) -> bool {
    if url.is_empty() {
        return false;
    }
    let lower = url.to_lowercase();
    keywords.iter().any(|k| lower.contains(k.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sitemap_filtering() {
        let classifier = UrlClassifier::default();

        assert!(classifier.is_filtered_sitemap("https://site.com/tag-sitemap.xml"));
        assert!(classifier.is_filtered_sitemap("https://site.com/IMAGE-sitemap.xml"));
        assert!(classifier.is_filtered_sitemap("https://site.com/category-sitemap.xml"));
        assert!(classifier.is_filtered_sitemap("https://site.com/sitemap-ads-1.xml"));

        assert!(!classifier.is_filtered_sitemap("https://site.com/post-sitemap.xml"));
        assert!(!classifier.is_filtered_sitemap("https://site.com/recipe-sitemap.xml"));
        assert!(!classifier.is_filtered_sitemap(""));
    }

    #[test]
    fn test_page_filtering() {
        let classifier = UrlClassifier::default();

        assert!(classifier.is_filtered_page("https://site.com/photo.JPG"));
        assert!(classifier.is_filtered_page("https://site.com/guide.pdf"));
        assert!(classifier.is_filtered_page("https://site.com/clip.mp4?x=1"));

        assert!(!classifier.is_filtered_page("https://site.com/chocolate-cake/"));
        assert!(!classifier.is_filtered_page(""));
    }

    #[test]
    fn test_substring_matching_is_naive() {
        // ".mod" matches anywhere, including inside a path segment
        let classifier = UrlClassifier::default();
        assert!(classifier.is_filtered_page("https://site.com/x.modern-salad"));
    }

    #[test]
    fn test_from_config_adds_keywords() {
        let filters = FilterConfig {
            sitemap_keywords: vec!["Shop".to_string(), String::new()],
            url_keywords: vec![".zip".to_string()],
        };
        let classifier = UrlClassifier::from_config(&filters);

        assert!(classifier.is_filtered_sitemap("https://site.com/shop-sitemap.xml"));
        assert!(classifier.is_filtered_sitemap("https://site.com/tag-sitemap.xml"));
        assert!(classifier.is_filtered_page("https://site.com/archive.zip"));
        assert!(!classifier.is_filtered_sitemap("https://site.com/post-sitemap.xml"));
    }

    #[test]
    fn test_custom_tables() {
        let classifier = UrlClassifier::new(["blog"], Vec::<String>::new());
        assert!(classifier.is_filtered_sitemap("https://site.com/BLOG.xml"));
        assert!(!classifier.is_filtered_sitemap("https://site.com/tag-sitemap.xml"));
        assert!(!classifier.is_filtered_page("https://site.com/photo.jpg"));
    }
}
