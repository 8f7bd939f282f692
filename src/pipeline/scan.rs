// src/pipeline/scan.rs

//! Scan pipeline: heuristic pass, LLM pass, merge.

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::Result;
use crate::models::{Config, ScanResults, ScrapedPage};
use crate::services::{
    CompletionOptions, ErrorMetrics, ErrorMetricsSnapshot, FetchOutcome, HeuristicExtractor,
    LlmExtractor, LlmProvider, NameValidator, PageFetcher, ReferenceConfigRegistry, ResultMerger,
};

/// Which strategies produced the final results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScanStrategy {
    /// LLM results, backfilled from the heuristic pass
    Merged,
    /// LLM unavailable or returned nothing
    HeuristicOnly,
}

/// Statistics for a scan run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanStats {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub strategy: ScanStrategy,
    pub page_count: usize,
    pub campus_count: usize,
    pub faculty_count: usize,
    pub course_count: usize,
}

/// Final results of a scan and how they were produced.
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    pub results: ScanResults,
    pub stats: ScanStats,
}

/// Run a scan over already-fetched pages.
pub async fn run_scan(
    config: &Config,
    registry: Arc<ReferenceConfigRegistry>,
    pages: &[ScrapedPage],
    website_url: &str,
    provider: Option<Arc<dyn LlmProvider>>,
) -> ScanOutcome {
    run_scan_until(
        config,
        registry,
        pages,
        website_url,
        provider,
        std::future::pending::<()>(),
    )
    .await
}

/// Run a scan, abandoning the LLM pass if `cancel` resolves first.
///
/// A cancelled or failed LLM pass falls back to the heuristic results.
pub async fn run_scan_until<C>(
    config: &Config,
    registry: Arc<ReferenceConfigRegistry>,
    pages: &[ScrapedPage],
    website_url: &str,
    provider: Option<Arc<dyn LlmProvider>>,
    cancel: C,
) -> ScanOutcome
where
    C: Future<Output = ()>,
{
    let start_time = Utc::now();
    log::info!("Scanning {website_url} ({} pages)", pages.len());

    let validator = NameValidator::new(registry, config.validation.clone());

    let heuristic = HeuristicExtractor::new(validator.clone(), config.extractor.clone())
        .extract(pages, website_url);

    let extractor = LlmExtractor::new(
        validator.clone(),
        provider,
        config.extractor.clone(),
        CompletionOptions::from(&config.llm),
    );

    let (mut results, strategy) = match extractor.extract_until(pages, website_url, cancel).await {
        Some(llm_results) => {
            let merger = ResultMerger::new(validator, config.extractor.clone());
            (merger.merge(&heuristic, llm_results), ScanStrategy::Merged)
        }
        None => {
            log::warn!("LLM extraction unavailable for {website_url}, using heuristic results");
            (heuristic, ScanStrategy::HeuristicOnly)
        }
    };
    results.page_count = pages.len();

    let stats = ScanStats {
        start_time,
        end_time: Utc::now(),
        strategy,
        page_count: results.page_count,
        campus_count: results.campuses.len(),
        faculty_count: results.faculty_count(),
        course_count: results.course_count(),
    };

    log::info!(
        "Scan of {} complete ({:?}): {} campuses, {} faculties, {} courses",
        results.institution_name,
        stats.strategy,
        stats.campus_count,
        stats.faculty_count,
        stats.course_count
    );

    ScanOutcome { results, stats }
}

/// Fetch an explicit URL list, resetting `metrics` first.
pub async fn fetch_pages(
    config: &Config,
    urls: &[String],
    metrics: Arc<ErrorMetrics>,
) -> Result<(FetchOutcome, ErrorMetricsSnapshot)> {
    metrics.reset();
    let fetcher = PageFetcher::new(config.fetcher.clone(), Arc::clone(&metrics))?;
    let outcome = fetcher.fetch_all(urls).await;

    let snapshot = metrics.snapshot();
    log::info!(
        "Fetch errors: {} retryable, {} permanent, {} recovered, {} retries",
        snapshot.retryable,
        snapshot.permanent,
        snapshot.recovered,
        snapshot.total_retries
    );
    Ok((outcome, snapshot))
}
