//! State module for tracking scrape progress
//!
//! # Components
//!
//! - `PageOutcome`: How a kept page was resolved during a run

mod page_outcome;

pub use page_outcome::PageOutcome;
