use crate::adapters::http::HttpFetcher;
use crate::config::toml_config::EbayConfig;
use crate::domain::model::{Currency, Marketplace, PriceSample};
use crate::domain::ports::PriceSource;
use crate::utils::error::FetchError;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// eBay Finding API (`findItemsByKeywords`) client.
pub struct EbaySource {
    fetcher: Arc<HttpFetcher>,
    endpoint: String,
    app_id: Option<String>,
    entries_per_page: String,
    sort_order: String,
}

impl EbaySource {
    pub fn new(fetcher: Arc<HttpFetcher>, config: &EbayConfig, app_id: Option<&str>) -> Self {
        Self {
            fetcher,
            endpoint: config.endpoint.clone(),
            app_id: app_id.map(str::to_string),
            entries_per_page: config.entries_per_page.to_string(),
            sort_order: config.sort_order.clone(),
        }
    }
}

#[async_trait]
impl PriceSource for EbaySource {
    fn marketplace(&self) -> Marketplace {
        Marketplace::Ebay
    }

    fn is_configured(&self) -> bool {
        self.app_id.is_some()
    }

    async fn fetch_prices(&self, query: &str) -> Result<PriceSample, FetchError> {
        let app_id = self.app_id.as_deref().unwrap_or_default();
        let params = [
            ("OPERATION-NAME", "findItemsByKeywords"),
            ("SERVICE-VERSION", "1.0.0"),
            ("SECURITY-APPNAME", app_id),
            ("RESPONSE-DATA-FORMAT", "JSON"),
            ("REST-PAYLOAD", ""),
            ("keywords", query),
            ("paginationInput.entriesPerPage", self.entries_per_page.as_str()),
            ("sortOrder", self.sort_order.as_str()),
        ];

        let body = self.fetcher.get_text(&self.endpoint, &params).await?;

        let sample = parse_finding_response(&body);
        tracing::info!("📊 ebay: extracted {} prices for '{}'", sample.len(), query);
        Ok(sample)
    }
}

/// Finding API 以單元素陣列包裝每一層
fn first<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    value.get(key)?.as_array()?.first()
}

fn amount(value: &Value) -> Option<f64> {
    match value {
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
}

fn item_price(item: &Value) -> Option<f64> {
    first(item, "sellingStatus")
        .and_then(|status| first(status, "currentPrice"))
        .and_then(|price| price.get("__value__"))
        .and_then(amount)
}

/// 任一層缺漏或內容不是 JSON 時回傳空樣本
pub fn parse_finding_response(body: &str) -> PriceSample {
    let root: Value = match serde_json::from_str(body) {
        Ok(root) => root,
        Err(e) => {
            tracing::debug!("ebay: response is not valid JSON: {}", e);
            return PriceSample::new();
        }
    };

    let items = first(&root, "findItemsByKeywordsResponse")
        .and_then(|response| first(response, "searchResult"))
        .and_then(|result| result.get("item"))
        .and_then(Value::as_array);

    let prices = items.into_iter().flatten().filter_map(item_price);
    PriceSample::from_amounts(Currency::Usd, prices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScoutConfig;
    use httpmock::prelude::*;

    fn item(price: Value) -> Value {
        serde_json::json!({
            "title": ["Pikachu plush"],
            "sellingStatus": [{ "currentPrice": [{ "@currencyId": "USD", "__value__": price }] }]
        })
    }

    fn response(items: Vec<Value>) -> Value {
        serde_json::json!({
            "findItemsByKeywordsResponse": [{
                "ack": ["Success"],
                "searchResult": [{ "@count": items.len().to_string(), "item": items }]
            }]
        })
    }

    #[test]
    fn test_parse_finding_response_prices() {
        let body = response(vec![
            item(Value::from("12.50")),
            item(Value::from("30.0")),
            item(Value::from(7.25)),
            item(Value::from("0.0")),
            item(Value::from("n/a")),
        ])
        .to_string();

        let amounts: Vec<f64> = parse_finding_response(&body).amounts().collect();
        assert_eq!(amounts, vec![12.5, 30.0, 7.25]);
    }

    #[test]
    fn test_missing_path_is_empty_sample() {
        let cases = [
            serde_json::json!({}),
            serde_json::json!({ "findItemsByKeywordsResponse": [] }),
            serde_json::json!({ "findItemsByKeywordsResponse": [{ "searchResult": [{ "@count": "0" }] }] }),
            serde_json::json!({ "findItemsByKeywordsResponse": [{ "searchResult": [{ "item": [{ "title": ["x"] }] }] }] }),
            serde_json::json!({ "findItemsByKeywordsResponse": "unexpected" }),
        ];

        for case in cases {
            assert!(parse_finding_response(&case.to_string()).is_empty(), "case: {}", case);
        }
    }

    #[test]
    fn test_non_json_body_is_empty_sample() {
        assert!(parse_finding_response("<html>maintenance</html>").is_empty());
    }

    #[tokio::test]
    async fn test_fetch_prices_sends_finding_api_parameters() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET)
                .path("/services/search/FindingService/v1")
                .query_param("OPERATION-NAME", "findItemsByKeywords")
                .query_param("SECURITY-APPNAME", "test-app")
                .query_param("RESPONSE-DATA-FORMAT", "JSON")
                .query_param("keywords", "pikachu")
                .query_param("paginationInput.entriesPerPage", "100");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(response(vec![item(Value::from("10")), item(Value::from("20"))]));
        });

        let mut config = ScoutConfig::default();
        config.sources.ebay.endpoint = server.url("/services/search/FindingService/v1");
        let fetcher = Arc::new(HttpFetcher::new(&config).unwrap());
        let source = EbaySource::new(fetcher, &config.sources.ebay, Some("test-app"));

        assert!(source.is_configured());
        let sample = source.fetch_prices("pikachu").await.unwrap();

        api_mock.assert();
        assert_eq!(sample.len(), 2);
    }

    #[test]
    fn test_without_app_id_is_not_configured() {
        let config = ScoutConfig::default();
        let fetcher = Arc::new(HttpFetcher::new(&config).unwrap());
        let source = EbaySource::new(fetcher, &config.sources.ebay, None);
        assert!(!source.is_configured());
    }
}
