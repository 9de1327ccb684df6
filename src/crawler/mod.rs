//! Scrape orchestration
//!
//! This module contains the core scraping logic, including:
//! - Page fetching over HTTP
//! - Reconciliation against the exclusion list and a prior snapshot
//! - Overall run coordination

mod coordinator;
mod fetcher;
mod reconcile;

pub use coordinator::{load_input, scrape_site, Coordinator, RunReport};
pub use fetcher::{build_http_client, HttpPageFetcher, PageFetcher};
pub use reconcile::{handle_exclusions_list, handle_input_dict, url_in_input_data};
