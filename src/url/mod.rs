//! URL handling module for Recipe-Trawl
//!
//! This module provides URL validation, homepage stripping and registrable
//! domain extraction. URLs are never normalized beyond that: page identity is
//! the exact URL string reported by the sitemap.

mod domain;
mod homepage;
mod validate;

// Re-export main functions
pub use domain::extract_domain;
pub use homepage::strip_url_to_homepage;
pub use validate::is_valid_url;
