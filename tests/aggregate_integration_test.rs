use httpmock::prelude::*;
use price_scout::{build_aggregator, Marketplace, ScoutConfig};

const MERCARI_PAGE: &str = r#"<html><body><ul>
  <li data-testid="item-cell"><span data-testid="price">¥1,200</span></li>
  <li data-testid="item-cell"><span data-testid="price">¥800</span></li>
  <li data-testid="item-cell"><span data-testid="price">¥1,000</span></li>
</ul></body></html>"#;

fn ebay_body(prices: &[&str]) -> serde_json::Value {
    let items: Vec<_> = prices
        .iter()
        .map(|p| serde_json::json!({ "sellingStatus": [{ "currentPrice": [{ "__value__": p }] }] }))
        .collect();
    serde_json::json!({ "findItemsByKeywordsResponse": [{ "searchResult": [{ "item": items }] }] })
}

fn config_for(server: &MockServer, ebay_app_id: Option<&str>) -> ScoutConfig {
    let mut config = ScoutConfig::default();
    config.sources.mercari.endpoint = server.url("/mercari/search");
    config.sources.zenplus.endpoint = server.url("/zenplus/search");
    config.sources.ebay.endpoint = server.url("/ebay/finding");
    config.sources.ebay.app_id = ebay_app_id.map(str::to_string);
    config.http.timeout_seconds = 5;
    config
}

#[tokio::test]
async fn test_end_to_end_aggregation_with_mixed_outcomes() {
    let server = MockServer::start();
    let mercari_mock = server.mock(|when, then| {
        when.method(GET).path("/mercari/search").query_param("keyword", "ピカチュウ");
        then.status(200).body(MERCARI_PAGE);
    });
    let zenplus_mock = server.mock(|when, then| {
        when.method(GET).path("/zenplus/search").query_param("q", "ピカチュウ");
        then.status(503);
    });
    let ebay_mock = server.mock(|when, then| {
        when.method(GET)
            .path("/ebay/finding")
            .query_param("SECURITY-APPNAME", "test-app")
            .query_param("keywords", "ピカチュウ");
        then.status(200).json_body(ebay_body(&["10.00", "15.00", "20.00"]));
    });

    let aggregator = build_aggregator(&config_for(&server, Some("test-app"))).unwrap();
    let result = aggregator.aggregate("ピカチュウ").await;

    mercari_mock.assert();
    zenplus_mock.assert();
    ebay_mock.assert();

    let mercari = result.summary(Marketplace::Mercari).unwrap();
    assert_eq!((mercari.min, mercari.max, mercari.avg, mercari.count), (800.0, 1200.0, 1000.0, 3));
    assert!(mercari.is_observed());

    let zenplus = result.summary(Marketplace::Zenplus).unwrap();
    assert_eq!((zenplus.min, zenplus.max, zenplus.avg, zenplus.count), (1500.0, 4000.0, 2500.0, 5));
    assert!(!zenplus.is_observed());

    let ebay = result.summary(Marketplace::Ebay).unwrap();
    assert_eq!(ebay.avg, 15.0);

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["productName"], "ピカチュウ");
    assert_eq!(json["ebay"]["currency"], "USD");
    assert!(json["zenplus"]["note"].as_str().unwrap().contains("ZenPlus"));
}

#[tokio::test]
async fn test_missing_ebay_credential_never_calls_ebay() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/mercari/search");
        then.status(200).body("<html><body></body></html>");
    });
    server.mock(|when, then| {
        when.method(GET).path("/zenplus/search");
        then.status(200).body("<html><body></body></html>");
    });
    let ebay_mock = server.mock(|when, then| {
        when.method(GET).path("/ebay/finding");
        then.status(200).json_body(ebay_body(&["99.00"]));
    });

    let aggregator = build_aggregator(&config_for(&server, None)).unwrap();
    let result = aggregator.aggregate("ピカチュウ").await;

    ebay_mock.assert_hits(0);
    assert_eq!(result.summaries.len(), 3);
    assert!(result.summaries.values().all(|s| !s.is_observed()));
    assert_eq!(result.summary(Marketplace::Ebay).unwrap().count, 15);
}

#[tokio::test]
async fn test_same_responses_serialize_identically() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/mercari/search");
        then.status(200).body(MERCARI_PAGE);
    });
    server.mock(|when, then| {
        when.method(GET).path("/zenplus/search");
        then.status(200).body(r#"<p class="price">¥2,000</p><p class="price">¥3,001</p>"#);
    });
    server.mock(|when, then| {
        when.method(GET).path("/ebay/finding");
        then.status(200).json_body(ebay_body(&["12.34", "5.67"]));
    });

    let aggregator = build_aggregator(&config_for(&server, Some("test-app"))).unwrap();
    let first = serde_json::to_string(&aggregator.aggregate("ピカチュウ").await).unwrap();
    let second = serde_json::to_string(&aggregator.aggregate("ピカチュウ").await).unwrap();

    assert_eq!(first, second);
}
