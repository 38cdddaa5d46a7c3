//! staffscout - session-authenticated staff directory scraping.
//!
//! Logs in (password plus captcha solver, or an interactive browser),
//! resolves a company, pages its people search and enriches each identity
//! with profile sub-resources. A rate limit halts the scraper and keeps
//! whatever was collected.

pub mod auth;
pub mod client;
pub mod config;
pub mod dates;
pub mod error;
pub mod export;
pub mod facets;
pub mod fetchers;
pub mod json;
pub mod models;
pub mod scraper;
pub mod search;
pub mod session;
pub mod solver;
pub mod utils;

pub use error::{FetchError, Result, ScrapeError};
pub use scraper::{ScrapeOutcome, StaffQuery, StaffScraper};
