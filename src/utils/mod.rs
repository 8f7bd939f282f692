//! Utility functions and helpers.

pub mod http;
pub mod text;
pub mod url;

pub use self::text::{normalize_whitespace, slugify, truncate_graphemes};
pub use self::url::{host_of, resolve, toggle_www};
