// src/services/fetcher.rs

//! Page fetcher for an explicit list of URLs.
//!
//! Every failure is classified and counted; retryable failures are retried
//! with exponential backoff until the per-URL budget runs out.

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use scraper::Html;

use crate::error::{Result, ScraperError, ScraperErrorKind};
use crate::models::{FetcherConfig, PageType, ScrapedPage};
use crate::services::classifier::{ErrorMetrics, classify, classify_message};
use crate::services::summary::select_texts;
use crate::utils::http::create_async_client;

/// Pages fetched in one run, in input order, and the URLs that failed.
#[derive(Debug, Default)]
pub struct FetchOutcome {
    pub pages: Vec<ScrapedPage>,
    pub failures: Vec<ScraperError>,
}

/// Bounded-concurrency fetcher reporting into shared [`ErrorMetrics`].
pub struct PageFetcher {
    client: Client,
    settings: FetcherConfig,
    metrics: Arc<ErrorMetrics>,
}

impl PageFetcher {
    pub fn new(settings: FetcherConfig, metrics: Arc<ErrorMetrics>) -> Result<Self> {
        let client = create_async_client(&settings)?;
        Ok(Self {
            client,
            settings,
            metrics,
        })
    }

    pub fn metrics(&self) -> &ErrorMetrics {
        &self.metrics
    }

    /// Fetch every URL, at most `max_concurrent` at a time.
    pub async fn fetch_all(&self, urls: &[String]) -> FetchOutcome {
        let concurrency = self.settings.max_concurrent.max(1);
        let mut results = stream::iter(urls)
            .map(|url| self.fetch_with_retry(url))
            .buffered(concurrency);

        let mut outcome = FetchOutcome::default();
        while let Some(result) = results.next().await {
            match result {
                Ok(page) => outcome.pages.push(page),
                Err(error) => {
                    log::warn!("Giving up on {}: {}", error.url, error);
                    outcome.failures.push(error);
                }
            }
        }

        log::info!(
            "Fetched {} of {} pages ({} failed)",
            outcome.pages.len(),
            urls.len(),
            outcome.failures.len()
        );
        outcome
    }

    /// Fetch one URL, retrying retryable failures within the budget.
    pub async fn fetch_with_retry(&self, url: &str) -> std::result::Result<ScrapedPage, ScraperError> {
        let max_retries = self.settings.max_retries;
        let mut attempt = 0;

        loop {
            match self.fetch_once(url).await {
                Ok(page) => {
                    if attempt > 0 {
                        self.metrics.increment_recovered();
                        log::info!("Recovered {url} after {attempt} retries");
                    }
                    return Ok(page);
                }
                Err(error) => {
                    self.metrics.record(&error);
                    if !error.is_retryable() || attempt >= max_retries {
                        return Err(error);
                    }

                    let delay = self.backoff(attempt);
                    log::debug!(
                        "Retrying {url} in {}ms after {}: {}",
                        delay.as_millis(),
                        error.kind,
                        error.message
                    );
                    self.metrics.increment_retries();
                    attempt += 1;
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }
    }

    fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u64.saturating_pow(attempt);
        Duration::from_millis(self.settings.retry_backoff_ms.saturating_mul(factor))
    }

    async fn fetch_once(&self, url: &str) -> std::result::Result<ScrapedPage, ScraperError> {
        let parsed = ::url::Url::parse(url).map_err(|e| classify(e, url))?;

        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| classify(e.without_url(), url))?;

        // Classify on the status line alone so digits in the URL can't leak in
        let status = response.status();
        if !status.is_success() {
            let message = format!("HTTP status {status}");
            return Err(ScraperError::new(classify_message(&message), message, url));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_lowercase);
        if let Some(content_type) = content_type.filter(|ct| !is_supported(ct)) {
            return Err(ScraperError::new(
                ScraperErrorKind::PermanentUnsupported,
                format!("unsupported content type {content_type}"),
                url,
            ));
        }

        let html = response
            .text()
            .await
            .map_err(|e| classify(e.without_url(), url))?;

        let title = select_texts(&Html::parse_document(&html), "title")
            .into_iter()
            .next()
            .unwrap_or_default();

        Ok(ScrapedPage {
            url: url.to_string(),
            page_type: PageType::infer(url, &title),
            title,
            html,
        })
    }
}

fn is_supported(content_type: &str) -> bool {
    content_type.contains("html") || content_type.starts_with("text/plain")
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    use super::*;
    use crate::services::classifier::ErrorMetricsSnapshot;

    fn response(status: &str, content_type: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {status}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        )
    }

    /// Serve the given raw responses, one per connection, then stop.
    async fn serve(responses: Vec<String>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            for response in responses {
                let (mut socket, _) = listener.accept().await.unwrap();
                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;
                socket.write_all(response.as_bytes()).await.unwrap();
                let _ = socket.shutdown().await;
            }
        });
        format!("http://{addr}/faculties")
    }

    fn fetcher(max_retries: u32) -> PageFetcher {
        let settings = FetcherConfig {
            max_retries,
            retry_backoff_ms: 0,
            ..FetcherConfig::default()
        };
        PageFetcher::new(settings, Arc::new(ErrorMetrics::new())).unwrap()
    }

    const PAGE: &str = "<html><head><title>Faculties | UP</title></head><body><h1>Faculties</h1></body></html>";

    #[tokio::test]
    async fn test_fetch_success() {
        let url = serve(vec![response("200 OK", "text/html; charset=utf-8", PAGE)]).await;
        let f = fetcher(0);

        let page = f.fetch_with_retry(&url).await.unwrap();
        assert_eq!(page.title, "Faculties | UP");
        assert_eq!(page.page_type, PageType::Faculty);
        assert_eq!(f.metrics().snapshot(), ErrorMetricsSnapshot::default());
    }

    #[tokio::test]
    async fn test_retry_then_recover() {
        let url = serve(vec![
            response("503 Service Unavailable", "text/html", ""),
            response("200 OK", "text/html", PAGE),
        ])
        .await;
        let f = fetcher(2);

        assert!(f.fetch_with_retry(&url).await.is_ok());
        assert_eq!(
            f.metrics().snapshot(),
            ErrorMetricsSnapshot {
                retryable: 1,
                permanent: 0,
                recovered: 1,
                total_retries: 1,
            }
        );
    }

    #[tokio::test]
    async fn test_not_found_is_not_retried() {
        let url = serve(vec![response("404 Not Found", "text/html", "")]).await;
        let f = fetcher(3);

        let err = f.fetch_with_retry(&url).await.unwrap_err();
        assert_eq!(err.kind, ScraperErrorKind::PermanentNotFound);
        assert_eq!(f.metrics().snapshot().permanent, 1);
        assert_eq!(f.metrics().snapshot().total_retries, 0);
    }

    #[tokio::test]
    async fn test_retry_budget_is_bounded() {
        let url = serve(vec![
            response("500 Internal Server Error", "text/html", ""),
            response("500 Internal Server Error", "text/html", ""),
        ])
        .await;
        let f = fetcher(1);

        let err = f.fetch_with_retry(&url).await.unwrap_err();
        assert_eq!(err.kind, ScraperErrorKind::RetryableServerError);
        assert_eq!(f.metrics().snapshot().retryable, 2);
        assert_eq!(f.metrics().snapshot().total_retries, 1);
    }

    #[tokio::test]
    async fn test_non_html_is_unsupported() {
        let url = serve(vec![response("200 OK", "application/pdf", "%PDF")]).await;
        let f = fetcher(2);

        let err = f.fetch_with_retry(&url).await.unwrap_err();
        assert_eq!(err.kind, ScraperErrorKind::PermanentUnsupported);
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_invalid_url() {
        let f = fetcher(2);
        let outcome = f.fetch_all(&["not a url".to_string()]).await;

        assert!(outcome.pages.is_empty());
        assert_eq!(outcome.failures[0].kind, ScraperErrorKind::PermanentInvalidUrl);
        assert_eq!(f.metrics().snapshot().total_retries, 0);
    }

    #[test]
    fn test_backoff_doubles() {
        let settings = FetcherConfig {
            retry_backoff_ms: 100,
            ..FetcherConfig::default()
        };
        let f = PageFetcher::new(settings, Arc::new(ErrorMetrics::new())).unwrap();
        assert_eq!(f.backoff(0), Duration::from_millis(100));
        assert_eq!(f.backoff(2), Duration::from_millis(400));
    }
}
