/// Outcome definitions for pages resolved during a scrape run
use std::fmt;

/// How a kept page was resolved
///
/// Checks run in the order the variants are declared: a page denied by the
/// crawl policy is never checked against the exclusion list, and so on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PageOutcome {
    /// robots.txt disallows the page; nothing is recorded for it
    PolicyDenied,

    /// Page is on the exclusion list and recorded as without recipe
    Excluded,

    /// Unchanged since the prior snapshot; its record is reused as-is
    Reused,

    /// Fetched and a recipe was extracted
    Scraped,

    /// Fetched but no recipe could be extracted
    NoRecipe,
}

impl PageOutcome {
    pub const ALL: [PageOutcome; 5] = [
        Self::PolicyDenied,
        Self::Excluded,
        Self::Reused,
        Self::Scraped,
        Self::NoRecipe,
    ];

    /// Returns true if resolving the page needed a network fetch
    pub fn is_fetched(&self) -> bool {
        matches!(self, Self::Scraped | Self::NoRecipe)
    }

    /// Returns true if the page ends up as a recipe in the database
    pub fn has_recipe(&self) -> bool {
        matches!(self, Self::Reused | Self::Scraped)
    }

    /// Returns true if the page ends up in the pages-without-recipe list
    pub fn is_without_recipe(&self) -> bool {
        matches!(self, Self::Excluded | Self::NoRecipe)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PolicyDenied => "policy_denied",
            Self::Excluded => "excluded",
            Self::Reused => "reused",
            Self::Scraped => "scraped",
            Self::NoRecipe => "no_recipe",
        }
    }
}

impl fmt::Display for PageOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_categories_are_disjoint() {
        for outcome in PageOutcome::ALL {
            let recorded = [outcome.has_recipe(), outcome.is_without_recipe()];
            assert!(recorded.iter().filter(|r| **r).count() <= 1, "{outcome}");
        }
        assert!(!PageOutcome::PolicyDenied.has_recipe());
        assert!(!PageOutcome::PolicyDenied.is_without_recipe());
    }

    #[test]
    fn test_fetched_outcomes() {
        let fetched: Vec<_> = PageOutcome::ALL.iter().filter(|o| o.is_fetched()).collect();
        assert_eq!(fetched, vec![&PageOutcome::Scraped, &PageOutcome::NoRecipe]);
    }

    #[test]
    fn test_display() {
        assert_eq!(PageOutcome::NoRecipe.to_string(), "no_recipe");
        assert_eq!(PageOutcome::PolicyDenied.to_string(), "policy_denied");
    }
}
