//! Utility functions for string formatting.

pub mod format;

pub use format::{humanize, mask, truncate_string};
