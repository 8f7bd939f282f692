//! Pipeline entry points for scanner operations.
//!
//! - `run_scan`: Extract, validate and merge a hierarchy from scraped pages
//! - `fetch_pages`: Fetch an explicit URL list with classified retries
//! - `run_validate`: Check configuration and reference data

pub mod scan;
pub mod validate;

pub use scan::{ScanOutcome, ScanStats, ScanStrategy, fetch_pages, run_scan, run_scan_until};
pub use validate::{ValidationSummary, run_validate};
