//! Page fetching and text extraction.

use std::time::Duration;

use chrono::{DateTime, Utc};
use docrag_async_utils::RetryPolicy;
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use tracing::info;

use crate::error::{IngestError, Result};

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Content containers tried in order; the first match supplies the page text.
pub const CONTENT_SELECTORS: [&str; 6] = [
    "main",
    "article",
    "div.container",
    "div[role=main]",
    "div.docItemContainer",
    "body",
];

/// Title used when a page has none.
pub const UNTITLED: &str = "No Title";

/// Text extracted from one page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrawledPage {
    pub url: String,
    pub title: String,

    /// Text of the content container, one space between text nodes.
    pub content: String,

    pub crawled_at: DateTime<Utc>,
}

/// Compiled selectors for [`extract_page`].
#[derive(Debug, Clone)]
pub struct PageSelectors {
    content: Vec<Selector>,
    title: Selector,
}

impl PageSelectors {
    pub fn new() -> Result<Self> {
        let content = CONTENT_SELECTORS
            .into_iter()
            .map(parse_selector)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            content,
            title: parse_selector("title")?,
        })
    }

    fn pick_root<'a>(&self, document: &'a Html) -> Option<ElementRef<'a>> {
        self.content
            .iter()
            .find_map(|selector| document.select(selector).next())
    }
}

fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|err| IngestError::Selector {
        selector: selector.to_string(),
        message: format!("{err:?}"),
    })
}

/// Extract the title and main text of an HTML page.
pub fn extract_page(url: &str, html: &str, selectors: &PageSelectors) -> CrawledPage {
    let document = Html::parse_document(html);

    let content = selectors
        .pick_root(&document)
        .map(|root| join_text(&root))
        .unwrap_or_default();

    let title = document
        .select(&selectors.title)
        .next()
        .map(|t| t.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| UNTITLED.to_string());

    CrawledPage {
        url: url.to_string(),
        title,
        content,
        crawled_at: Utc::now(),
    }
}

fn join_text(element: &ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Fetches documentation pages.
#[derive(Debug, Clone)]
pub struct Crawler {
    client: reqwest::Client,
    timeout: Duration,
    retry: RetryPolicy,
    selectors: PageSelectors,
}

impl Crawler {
    pub fn new() -> Result<Self> {
        Ok(Self {
            client: reqwest::Client::new(),
            timeout: DEFAULT_TIMEOUT,
            retry: RetryPolicy::default(),
            selectors: PageSelectors::new()?,
        })
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the retry policy applied to each page fetch.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Fetch `url` and extract its text. Transient failures are retried.
    pub async fn crawl(&self, url: &str) -> Result<CrawledPage> {
        info!("Starting crawl for URL: {url}");
        let html = self
            .retry
            .run_if(|| self.fetch(url), IngestError::is_transient)
            .await?;

        let page = extract_page(url, &html, &self.selectors);
        info!("Successfully crawled URL: {url}");
        Ok(page)
    }

    async fn fetch(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(IngestError::PageStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response.text().await?)
    }
}
