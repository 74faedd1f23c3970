use crate::adapters::html::{element_text, selector};
use crate::adapters::HttpFetcher;
use crate::config::ScoutConfig;
use crate::core::template;
use crate::domain::model::{ListingExample, ScrapeResponse, ScrapedListing};
use crate::utils::error::{FetchError, Result, ScoutError};
use futures::future::join_all;
use scraper::Html;
use std::sync::Arc;

/// 抓取參考刊登頁面並取出標題與說明
pub struct ListingExtractor {
    fetcher: Arc<HttpFetcher>,
    title_suffixes: Vec<String>,
}

impl ListingExtractor {
    pub fn new(fetcher: Arc<HttpFetcher>, title_suffixes: Vec<String>) -> Self {
        Self {
            fetcher,
            title_suffixes,
        }
    }

    pub fn from_config(config: &ScoutConfig, fetcher: Arc<HttpFetcher>) -> Self {
        Self::new(fetcher, config.scrape.title_suffixes.clone())
    }

    pub async fn extract(&self, url: &str) -> std::result::Result<ListingExample, FetchError> {
        let html = self.fetcher.get_text(url, &[]).await?;
        let example = parse_listing_page(&html, &self.title_suffixes);
        tracing::debug!("Extracted '{}' from {}", example.title, url);
        Ok(example)
    }

    /// 並行抓取所有網址；個別失敗略過，全部失敗才回傳錯誤
    pub async fn scrape(&self, urls: &[String]) -> Result<ScrapeResponse> {
        let urls: Vec<&str> = urls
            .iter()
            .map(|u| u.trim())
            .filter(|u| !u.is_empty())
            .collect();

        if urls.is_empty() {
            return Err(ScoutError::ValidationError {
                message: "at least one reference URL is required".to_string(),
            });
        }

        tracing::info!("🕸️ Scraping {} reference listings", urls.len());
        let outcomes = join_all(urls.iter().map(|url| self.extract(url))).await;

        let mut results = Vec::new();
        for (url, outcome) in urls.iter().zip(outcomes) {
            match outcome {
                Ok(example) => results.push(ScrapedListing {
                    url: url.to_string(),
                    example,
                }),
                Err(e) => tracing::warn!("⚠️ Skipping {}: {}", url, e),
            }
        }

        if results.is_empty() {
            tracing::error!("❌ All {} reference URLs failed", urls.len());
            return Err(ScoutError::AllSourcesFailed {
                attempted: urls.len(),
            });
        }

        let examples: Vec<ListingExample> = results
            .iter()
            .map(|r| r.example.clone())
            .filter(ListingExample::is_usable)
            .collect();
        let template = template::synthesize(&examples);

        tracing::info!("✅ Scraped {}/{} listings", results.len(), urls.len());
        Ok(ScrapeResponse { results, template })
    }
}

/// 標題取第一個 <title>；說明依序取 meta description、og:description
pub fn parse_listing_page(html: &str, title_suffixes: &[String]) -> ListingExample {
    let document = Html::parse_document(html);

    let title = selector("title")
        .and_then(|sel| document.select(&sel).next().map(|el| element_text(&el)))
        .map(|raw| strip_suffixes(raw.trim(), title_suffixes))
        .unwrap_or_default();

    let description = [
        r#"meta[name="description" i]"#,
        r#"meta[property="og:description" i]"#,
    ]
    .iter()
    .find_map(|css| meta_content(&document, css))
    .unwrap_or_default();

    ListingExample { title, description }
}

fn meta_content(document: &Html, css: &str) -> Option<String> {
    let sel = selector(css)?;
    let element = document.select(&sel).next()?;
    element
        .value()
        .attr("content")
        .map(str::trim)
        .filter(|content| !content.is_empty())
        .map(str::to_string)
}

fn strip_suffixes(title: &str, suffixes: &[String]) -> String {
    let mut title = title;
    for suffix in suffixes.iter().filter(|s| !s.is_empty()) {
        if let Some(stripped) = title.strip_suffix(suffix.as_str()) {
            title = stripped;
        }
    }
    title.trim().to_string()
}
