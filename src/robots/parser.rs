//! Parsed robots.txt policy
//!
//! Permission checks are delegated to the robotstxt crate; `Sitemap:`
//! declarations are read directly from the raw content.

use robotstxt::DefaultMatcher;

/// A site's robots.txt, kept as raw text and matched on demand
#[derive(Debug, Clone)]
pub struct ParsedRobots {
    /// Empty content allows every URL
    content: String,
    allow_all: bool,
}

impl ParsedRobots {
    /// Wraps the body of a fetched robots.txt
    pub fn from_content(content: &str) -> Self {
        Self {
            content: content.to_string(),
            allow_all: false,
        }
    }

    /// Policy for a site without a usable robots.txt
    pub fn allow_all() -> Self {
        Self {
            content: String::new(),
            allow_all: true,
        }
    }

    pub fn is_allow_all(&self) -> bool {
        self.allow_all
    }

    /// Whether `user_agent` (a product token such as "RecipeTrawl") may fetch
    /// the absolute page URL `url`
    pub fn is_allowed(&self, url: &str, user_agent: &str) -> bool {
        if self.is_permissive() {
            return true;
        }
        DefaultMatcher::default().one_agent_allowed_by_robots(&self.content, user_agent, url)
    }

    fn is_permissive(&self) -> bool {
        self.allow_all || self.content.trim().is_empty()
    }

    /// Gets the crawl delay for a specific user agent, in seconds
    ///
    /// A group naming the agent wins over the `*` group.
    pub fn crawl_delay(&self, user_agent: &str) -> Option<f64> {
        if self.is_permissive() {
            return None;
        }

        let agent = user_agent.to_lowercase();
        let mut group: Vec<String> = Vec::new();
        let mut in_rules = false;
        let mut for_agent = None;
        let mut for_wildcard = None;

        for raw_line in self.content.lines() {
            let line = raw_line.split('#').next().unwrap_or_default().trim();
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let value = value.trim();

            match key.trim().to_lowercase().as_str() {
                "user-agent" => {
                    // A user-agent line after rules starts a new group
                    if in_rules {
                        group.clear();
                        in_rules = false;
                    }
                    group.push(value.to_lowercase());
                }
                "crawl-delay" => {
                    in_rules = true;
                    let Ok(delay) = value.parse::<f64>() else {
                        continue;
                    };
                    if group.iter().any(|ua| ua != "*" && agent.contains(ua.as_str())) {
                        for_agent = Some(delay);
                    } else if group.iter().any(|ua| ua == "*") {
                        for_wildcard = Some(delay);
                    }
                }
                "sitemap" => {}
                _ => in_rules = true,
            }
        }

        for_agent.or(for_wildcard)
    }

    /// Returns the sitemap URLs declared with `Sitemap:` lines, in file order
    pub fn sitemaps(&self) -> Vec<String> {
        self.content
            .lines()
            .filter_map(|line| {
                let line = line.split('#').next().unwrap_or_default().trim();
                let (key, value) = line.split_once(':')?;
                if !key.trim().eq_ignore_ascii_case("sitemap") {
                    return None;
                }
                let value = value.trim();
                (!value.is_empty()).then(|| value.to_string())
            })
            .collect()
    }
}
