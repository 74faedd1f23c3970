use crate::adapters::html::{digits_to_price, element_text, selector};
use crate::adapters::http::HttpFetcher;
use crate::domain::model::{Currency, Marketplace, PriceSample};
use crate::domain::ports::PriceSource;
use crate::utils::error::FetchError;
use async_trait::async_trait;
use scraper::Html;
use std::sync::Arc;

/// メルカリ search page scraper.
///
/// The search page is a client-rendered SPA, so a plain GET frequently yields
/// no item cells at all. That is reported as an empty sample, not a failure.
pub struct MercariSource {
    fetcher: Arc<HttpFetcher>,
    endpoint: String,
}

impl MercariSource {
    pub fn new(fetcher: Arc<HttpFetcher>, endpoint: impl Into<String>) -> Self {
        Self {
            fetcher,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl PriceSource for MercariSource {
    fn marketplace(&self) -> Marketplace {
        Marketplace::Mercari
    }

    async fn fetch_prices(&self, query: &str) -> Result<PriceSample, FetchError> {
        let body = self
            .fetcher
            .get_text(&self.endpoint, &[("keyword", query)])
            .await?;

        let sample = parse_search_page(&body);
        tracing::info!("📊 mercari: extracted {} prices for '{}'", sample.len(), query);
        Ok(sample)
    }
}

/// 每個商品格內的價格節點
pub fn parse_search_page(html: &str) -> PriceSample {
    let (Some(cell_selector), Some(price_selector)) = (
        selector(r#"[data-testid="item-cell"]"#),
        selector(r#"[data-testid="price"]"#),
    ) else {
        return PriceSample::new();
    };

    let document = Html::parse_document(html);
    let prices = document.select(&cell_selector).filter_map(|cell| {
        let price_text: String = cell
            .select(&price_selector)
            .map(|price| element_text(&price))
            .collect();
        digits_to_price(&price_text)
    });

    PriceSample::from_amounts(Currency::Jpy, prices.map(|p| p as f64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScoutConfig;
    use httpmock::prelude::*;

    const SEARCH_PAGE: &str = r#"
<html><body>
  <ul>
    <li data-testid="item-cell"><span data-testid="price">¥1,200</span></li>
    <li data-testid="item-cell"><div><span data-testid="price">¥ 800</span></div></li>
    <li data-testid="item-cell"><span data-testid="price">SOLD</span></li>
    <li data-testid="item-cell"><span class="name">no price node</span></li>
  </ul>
  <span data-testid="price">¥99,999</span>
</body></html>
"#;

    #[test]
    fn test_parse_search_page_reads_prices_inside_item_cells() {
        let sample = parse_search_page(SEARCH_PAGE);
        let amounts: Vec<f64> = sample.amounts().collect();
        assert_eq!(amounts, vec![1200.0, 800.0]);
        assert!(sample
            .observations()
            .iter()
            .all(|o| o.currency == Currency::Jpy));
    }

    #[test]
    fn test_parse_unrendered_spa_shell_is_empty() {
        let sample = parse_search_page("<html><body><div id=\"__next\"></div></body></html>");
        assert!(sample.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_prices_queries_keyword() {
        let server = MockServer::start();
        let search_mock = server.mock(|when, then| {
            when.method(GET).path("/search").query_param("keyword", "ピカチュウ");
            then.status(200)
                .header("Content-Type", "text/html; charset=utf-8")
                .body(SEARCH_PAGE);
        });

        let fetcher = Arc::new(HttpFetcher::new(&ScoutConfig::default()).unwrap());
        let source = MercariSource::new(fetcher, server.url("/search"));
        let sample = source.fetch_prices("ピカチュウ").await.unwrap();

        search_mock.assert();
        assert_eq!(sample.len(), 2);
    }

    #[tokio::test]
    async fn test_fetch_prices_error_status() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/search");
            then.status(403);
        });

        let fetcher = Arc::new(HttpFetcher::new(&ScoutConfig::default()).unwrap());
        let source = MercariSource::new(fetcher, server.url("/search"));

        assert!(source.fetch_prices("ピカチュウ").await.is_err());
    }
}
