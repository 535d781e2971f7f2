//! Sitemap reading.
//!
//! A `<sitemapindex>` is followed into each child sitemap; a `<urlset>`
//! contributes the documentation pages it lists. Any failure falls back to
//! the site root so ingestion still has something to crawl.

use std::sync::OnceLock;
use std::time::Duration;

use regex_lite::Regex;
use tracing::{error, info, warn};

use crate::error::{IngestError, Result};

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Nesting limit for sitemap indexes.
const MAX_DEPTH: usize = 4;

/// What a sitemap document lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SitemapDocument {
    /// Locations of further sitemaps.
    Index(Vec<String>),
    /// Page locations.
    UrlSet(Vec<String>),
}

/// Fetches sitemaps and extracts documentation URLs.
#[derive(Debug, Clone)]
pub struct SitemapReader {
    client: reqwest::Client,
    timeout: Duration,
}

impl SitemapReader {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Documentation URLs listed by the sitemap at `sitemap_url`.
    ///
    /// Never fails: on any error the result is the sitemap's base URL.
    pub async fn extract_urls(&self, sitemap_url: &str) -> Vec<String> {
        self.extract_at_depth(sitemap_url, 0).await
    }

    async fn extract_at_depth(&self, sitemap_url: &str, depth: usize) -> Vec<String> {
        info!("Fetching sitemap from: {sitemap_url}");

        let document = match self.fetch(sitemap_url).await {
            Ok(document) => document,
            Err(err) => {
                error!("Error parsing sitemap {sitemap_url}: {err}");
                return vec![sitemap_base_url(sitemap_url)];
            }
        };

        let urls = match document {
            SitemapDocument::UrlSet(locs) => locs.into_iter().filter(|u| is_docs_url(u)).collect(),
            SitemapDocument::Index(children) => {
                if depth >= MAX_DEPTH {
                    warn!("Sitemap index nesting too deep at {sitemap_url}, skipping");
                    return Vec::new();
                }
                let mut urls = Vec::new();
                for child in children {
                    urls.extend(Box::pin(self.extract_at_depth(&child, depth + 1)).await);
                }
                urls
            }
        };

        info!("Extracted {} URLs from sitemap", urls.len());
        urls
    }

    async fn fetch(&self, sitemap_url: &str) -> Result<SitemapDocument> {
        let response = self
            .client
            .get(sitemap_url)
            .timeout(self.timeout)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(IngestError::PageStatus {
                url: sitemap_url.to_string(),
                status: status.as_u16(),
            });
        }
        let body = response.text().await?;
        parse_sitemap(&body)
    }
}

impl Default for SitemapReader {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a sitemap XML document.
pub fn parse_sitemap(xml: &str) -> Result<SitemapDocument> {
    let root = root_element(xml)
        .ok_or_else(|| IngestError::Sitemap("no root element".to_string()))?;

    let locs: Vec<String> = loc_pattern()?
        .captures_iter(xml)
        .filter_map(|caps| caps.get(1))
        .map(|m| unescape_xml(m.as_str().trim()))
        .filter(|loc| !loc.is_empty())
        .collect();

    match local_name(root) {
        "sitemapindex" => Ok(SitemapDocument::Index(locs)),
        "urlset" => Ok(SitemapDocument::UrlSet(locs)),
        other => Err(IngestError::Sitemap(format!(
            "unexpected root element <{other}>"
        ))),
    }
}

/// Whether `url` points into a documentation section.
pub fn is_docs_url(url: &str) -> bool {
    url.contains("/docs/") || url.ends_with("/docs")
}

/// Site root for a sitemap URL: the URL with `/sitemap.xml` removed.
pub fn sitemap_base_url(sitemap_url: &str) -> String {
    sitemap_url.replace("/sitemap.xml", "")
}

fn loc_pattern() -> Result<&'static Regex> {
    static PATTERN: OnceLock<std::result::Result<Regex, regex_lite::Error>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"(?s)<loc>(.*?)</loc>"))
        .as_ref()
        .map_err(|err| IngestError::Sitemap(format!("invalid loc pattern: {err}")))
}

/// Name of the first element after the XML prolog, comments and doctype.
fn root_element(xml: &str) -> Option<&str> {
    let mut rest = xml;
    loop {
        let start = rest.find('<')?;
        rest = &rest[start + 1..];
        if rest.starts_with('?') || rest.starts_with('!') {
            continue;
        }
        let end = rest
            .find(|c: char| c.is_whitespace() || c == '>' || c == '/')
            .unwrap_or(rest.len());
        return Some(&rest[..end]);
    }
}

fn local_name(name: &str) -> &str {
    name.rsplit(':').next().unwrap_or(name)
}

fn unescape_xml(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
