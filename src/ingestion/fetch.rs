//! Page retrieval and spec-text extraction.
//!
//! Vendor specification pages carry their technical parameters inside a
//! `.detailed-parameter-wrap` container; pages without that layout fall back
//! to whole-body text so the pipeline can still ingest them.

use std::time::Duration;

use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;
use url::Url;

use crate::retry::{RetryPolicy, retry};
use crate::types::AssistantError;

/// Model name recorded when no usable path segment can be derived from a URL.
pub const UNKNOWN_MODEL: &str = "unknown";

/// Fetches rendered page content with a bounded retry schedule.
#[derive(Clone, Debug)]
pub struct PageFetcher {
    client: Client,
    retry: RetryPolicy,
}

impl PageFetcher {
    /// Builds a fetcher with the given per-request timeout and attempt
    /// budget. The backoff between attempts grows linearly in 2-second steps.
    pub fn new(timeout: Duration, max_attempts: usize) -> Result<Self, AssistantError> {
        let client = Client::builder()
            .user_agent("dronemind-ingestor/0.1")
            .timeout(timeout)
            .use_rustls_tls()
            .build()
            .map_err(|err| AssistantError::Config(err.to_string()))?;
        Ok(Self {
            client,
            retry: RetryPolicy::linear(max_attempts, Duration::from_secs(2)),
        })
    }

    /// Overrides the default retry schedule.
    #[must_use]
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }

    /// Fetches the raw page body, retrying transient failures until the
    /// attempt budget is exhausted.
    pub async fn fetch_page(&self, url: &str) -> Result<String, AssistantError> {
        let client = &self.client;
        retry(&self.retry, "page fetch", |attempt| {
            let url = url.to_string();
            async move {
                debug!(%url, attempt, "fetching page");
                let response = client.get(&url).send().await?.error_for_status()?;
                response.text().await.map_err(AssistantError::from)
            }
        })
        .await
    }

    /// Fetches a page and reduces it to the spec text worth chunking.
    pub async fn fetch_spec_text(&self, url: &str) -> Result<String, AssistantError> {
        let html = self.fetch_page(url).await?;
        Ok(extract_spec_text(&html))
    }
}

/// Extracts the specification text from a vendor page.
///
/// Pages with the spec layout contribute the text of their first two
/// `.specs-parameter-wrap` blocks joined by a newline; anything else
/// contributes the whole body text.
pub fn extract_spec_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let wrap = Selector::parse(".detailed-parameter-wrap").expect("selector is valid");

    if let Some(container) = document.select(&wrap).next() {
        let section = Selector::parse(".specs-parameter-wrap").expect("selector is valid");
        return container
            .select(&section)
            .take(2)
            .map(collect_text)
            .collect::<Vec<_>>()
            .join("\n");
    }

    let body = Selector::parse("body").expect("selector is valid");
    match document.select(&body).next() {
        Some(body) => collect_text(body),
        None => String::new(),
    }
}

fn collect_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Derives the product model identifier from a spec page URL: the
/// second-to-last path segment, or [`UNKNOWN_MODEL`] when the URL does not
/// parse or carries too few segments. Never fails the pipeline.
pub fn extract_model_name(url: &str) -> String {
    let Ok(parsed) = Url::parse(url) else {
        return UNKNOWN_MODEL.to_string();
    };
    let Some(segments) = parsed.path_segments() else {
        return UNKNOWN_MODEL.to_string();
    };
    let segments: Vec<&str> = segments.filter(|segment| !segment.is_empty()).collect();
    match segments.len().checked_sub(2).map(|idx| segments[idx]) {
        Some(name) => name.to_string(),
        None => UNKNOWN_MODEL.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    #[test]
    fn model_name_is_the_second_to_last_segment() {
        assert_eq!(
            extract_model_name("https://x/a/mavic-4-pro/specs"),
            "mavic-4-pro"
        );
        assert_eq!(
            extract_model_name("https://www.dji.com/cn/air-3s/specs"),
            "air-3s"
        );
    }

    #[test]
    fn malformed_urls_yield_unknown() {
        assert_eq!(extract_model_name("not-a-url"), UNKNOWN_MODEL);
        assert_eq!(extract_model_name("https://x/specs"), UNKNOWN_MODEL);
        assert_eq!(extract_model_name("https://x/"), UNKNOWN_MODEL);
    }

    #[test]
    fn trailing_slash_does_not_shift_the_segment() {
        assert_eq!(
            extract_model_name("https://x/a/mavic-4-pro/specs/"),
            "mavic-4-pro"
        );
    }

    #[test]
    fn spec_layout_contributes_the_first_two_blocks() {
        let html = r#"<html><body>
            <div class="detailed-parameter-wrap">
                <div class="specs-parameter-wrap">Takeoff weight 1063 g</div>
                <div class="specs-parameter-wrap">Max flight time 51 min</div>
                <div class="specs-parameter-wrap">Ignored third block</div>
            </div>
            <footer>legal boilerplate</footer>
        </body></html>"#;
        let text = extract_spec_text(html);
        assert_eq!(text, "Takeoff weight 1063 g\nMax flight time 51 min");
    }

    #[test]
    fn pages_without_the_layout_fall_back_to_body_text() {
        let html = "<html><body><h1>Specs</h1><p>Max speed 25 m/s</p></body></html>";
        let text = extract_spec_text(html);
        assert!(text.contains("Specs"));
        assert!(text.contains("Max speed 25 m/s"));
    }

    #[test]
    fn empty_page_yields_empty_text() {
        assert_eq!(extract_spec_text("<html><body></body></html>"), "");
    }

    #[tokio::test]
    async fn fetch_gives_up_after_exactly_max_attempts() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/cn/mavic-4-pro/specs");
                then.status(503);
            })
            .await;

        let fetcher = PageFetcher::new(Duration::from_secs(5), 3)
            .unwrap()
            .with_retry_policy(RetryPolicy::linear(3, Duration::ZERO));
        let err = fetcher
            .fetch_page(&server.url("/cn/mavic-4-pro/specs"))
            .await
            .unwrap_err();

        assert!(matches!(err, AssistantError::Fetch(_)));
        assert_eq!(mock.hits_async().await, 3);
    }

    #[tokio::test]
    async fn fetch_returns_the_page_body_on_success() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/cn/air-3s/specs");
                then.status(200).body("<html><body>spec text</body></html>");
            })
            .await;

        let fetcher = PageFetcher::new(Duration::from_secs(5), 3).unwrap();
        let text = fetcher
            .fetch_spec_text(&server.url("/cn/air-3s/specs"))
            .await
            .unwrap();
        assert_eq!(text, "spec text");
    }
}
