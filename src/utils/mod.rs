//! Shared utility functions.
//!
//! - `text`: email extraction and small string helpers

mod text;

pub use text::{extract_emails, truncate};
