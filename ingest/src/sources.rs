//! Documentation source URLs.

use tracing::info;

use crate::sitemap::SitemapReader;

/// Sites crawled when nothing is configured.
pub const DEFAULT_SOURCE_URLS: [&str; 2] = ["https://docusaurus.io/docs", "https://reactjs.org/docs"];

/// Configured URLs, or [`DEFAULT_SOURCE_URLS`] when none are given.
pub fn resolve_sources(configured: Option<&[String]>) -> Vec<String> {
    match configured {
        Some(urls) if !urls.is_empty() => urls.to_vec(),
        _ => DEFAULT_SOURCE_URLS.iter().map(|u| u.to_string()).collect(),
    }
}

/// Whether `url` names a sitemap rather than a page.
pub fn is_sitemap(url: &str) -> bool {
    url.ends_with("/sitemap.xml")
}

/// Replace sitemap entries with the pages they list.
pub async fn expand_sources(urls: &[String], sitemaps: &SitemapReader) -> Vec<String> {
    let mut pages = Vec::new();
    for url in urls {
        if is_sitemap(url) {
            pages.extend(sitemaps.extract_urls(url).await);
        } else {
            pages.push(url.clone());
        }
    }
    info!("Processing {} URLs", pages.len());
    pages
}
