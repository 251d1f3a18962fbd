//! Utility functions for string formatting and manipulation.

pub mod format;

// Re-export commonly used functions at module level
pub use format::{
    contains_ignore_case, format_date, format_phone, format_timestamp, pluralize, truncate_string,
};
