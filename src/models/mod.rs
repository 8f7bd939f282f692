// src/models/mod.rs

//! Domain models for the scan pipeline.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod page;
mod reference;
mod results;

// Re-export all public types
pub use config::{Config, ExtractorConfig, FetcherConfig, LengthBounds, LlmConfig, ValidationConfig};
pub use page::{
    EntityKind, ExtractedCandidate, MatchedConfig, PageType, ScrapedPage, ValidationResult,
};
pub use reference::{
    CampusConfig, FacultyConfig, InstitutionType, ReferenceInstitutionConfig,
    load_reference_configs,
};
pub use results::{Campus, Course, Faculty, NameSets, ScanResults, key};
