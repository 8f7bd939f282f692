//! Service layer for the scanner.
//!
//! This module contains the business logic for:
//! - Reference data lookup (`ReferenceConfigRegistry`)
//! - Name validation (`NameValidator`)
//! - Extraction (`LlmExtractor`, `HeuristicExtractor`)
//! - Result reconciliation (`ResultMerger`)
//! - Page fetching and failure classification (`PageFetcher`, `classify`)

pub mod classifier;
pub(crate) mod extractor;
mod fetcher;
mod heuristic;
pub mod hierarchy;
pub mod llm;
mod merger;
pub(crate) mod registry;
pub mod summary;
pub mod validator;

pub use classifier::{ErrorMetrics, ErrorMetricsSnapshot, classify, classify_message};
pub use extractor::LlmExtractor;
pub use fetcher::{FetchOutcome, PageFetcher};
pub use heuristic::HeuristicExtractor;
pub use llm::{CompletionOptions, LlmProvider, OpenAiCompatibleProvider};
pub use merger::ResultMerger;
pub use registry::ReferenceConfigRegistry;
pub use validator::NameValidator;
