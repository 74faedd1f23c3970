use crate::adapters::html::{digits_to_price, element_text, selector};
use crate::adapters::http::HttpFetcher;
use crate::domain::model::{Currency, Marketplace, PriceSample};
use crate::domain::ports::PriceSource;
use crate::utils::error::FetchError;
use async_trait::async_trait;
use scraper::Html;
use std::sync::Arc;

const PRICE_SELECTOR: &str = r#".product-price, .price, [class*="price"]"#;

pub struct ZenplusSource {
    fetcher: Arc<HttpFetcher>,
    endpoint: String,
    max_price: u64,
}

impl ZenplusSource {
    pub fn new(fetcher: Arc<HttpFetcher>, endpoint: impl Into<String>, max_price: u64) -> Self {
        Self {
            fetcher,
            endpoint: endpoint.into(),
            max_price,
        }
    }
}

#[async_trait]
impl PriceSource for ZenplusSource {
    fn marketplace(&self) -> Marketplace {
        Marketplace::Zenplus
    }

    async fn fetch_prices(&self, query: &str) -> Result<PriceSample, FetchError> {
        let body = self.fetcher.get_text(&self.endpoint, &[("q", query)]).await?;

        let sample = parse_search_page(&body, self.max_price);
        tracing::info!("📊 zenplus: extracted {} prices for '{}'", sample.len(), query);
        Ok(sample)
    }
}

/// class 名稱含 price 的所有元素；`max_price` 以上視為誤抓的編號
pub fn parse_search_page(html: &str, max_price: u64) -> PriceSample {
    let Some(price_selector) = selector(PRICE_SELECTOR) else {
        return PriceSample::new();
    };

    let document = Html::parse_document(html);
    let prices = document
        .select(&price_selector)
        .filter_map(|element| digits_to_price(&element_text(&element)))
        .filter(|price| *price < max_price);

    PriceSample::from_amounts(Currency::Jpy, prices.map(|p| p as f64))
}
