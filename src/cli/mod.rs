//! Command-line interface for staffscout.

mod commands;
pub mod helpers;
pub mod progress;

pub use commands::{run, verbosity};
