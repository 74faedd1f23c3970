use crate::adapters::{EbaySource, HttpFetcher, MercariSource, ZenplusSource};
use crate::config::ScoutConfig;
use crate::core::fallback::{FallbackPolicy, Resolution};
use crate::domain::model::{AggregateResult, MarketSummary, Marketplace};
use crate::domain::ports::PriceSource;
use crate::utils::error::{FetchError, Result};
use futures::future::join_all;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// 對所有來源並行查價，各來源逾時與失敗互不影響
pub struct PriceAggregator {
    sources: Vec<Arc<dyn PriceSource>>,
    timeout: Duration,
}

impl PriceAggregator {
    pub fn new(sources: Vec<Arc<dyn PriceSource>>, timeout: Duration) -> Self {
        Self { sources, timeout }
    }

    /// 以設定建立三個標準來源，共用同一個 HTTP 連線池
    pub fn from_config(config: &ScoutConfig, fetcher: Arc<HttpFetcher>) -> Self {
        let ebay_app_id = config.ebay_app_id();
        if ebay_app_id.is_none() {
            tracing::warn!("⚠️ EBAY_APP_ID not configured, eBay will always return defaults");
        }

        let sources: Vec<Arc<dyn PriceSource>> = vec![
            Arc::new(MercariSource::new(
                fetcher.clone(),
                config.sources.mercari.endpoint.clone(),
            )),
            Arc::new(ZenplusSource::new(
                fetcher.clone(),
                config.sources.zenplus.endpoint.clone(),
                config.sources.zenplus.max_price,
            )),
            Arc::new(EbaySource::new(fetcher, &config.sources.ebay, ebay_app_id)),
        ];

        Self::new(sources, config.request_timeout())
    }

    /// 永遠回傳每個來源一筆摘要；同一市集重複註冊時以後者為準
    pub async fn aggregate(&self, query: &str) -> AggregateResult {
        tracing::info!("🚀 Aggregating prices for '{}' from {} sources", query, self.sources.len());
        let started = Instant::now();

        let outcomes = join_all(
            self.sources
                .iter()
                .map(|source| self.resolve_source(source.as_ref(), query)),
        )
        .await;

        let summaries: BTreeMap<Marketplace, MarketSummary> = outcomes.into_iter().collect();
        let observed = summaries.values().filter(|s| s.is_observed()).count();
        tracing::info!(
            "✅ Aggregation complete: {}/{} sources with real data ({:?})",
            observed,
            summaries.len(),
            started.elapsed()
        );

        AggregateResult {
            product_name: query.to_string(),
            summaries,
        }
    }

    async fn resolve_source(
        &self,
        source: &dyn PriceSource,
        query: &str,
    ) -> (Marketplace, MarketSummary) {
        let marketplace = source.marketplace();
        let policy = FallbackPolicy::for_marketplace(marketplace);

        if !source.is_configured() {
            return (marketplace, policy.not_configured());
        }

        let result = match tokio::time::timeout(self.timeout, source.fetch_prices(query)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout {
                seconds: self.timeout.as_secs(),
            }),
        };

        let (resolution, summary) = policy.resolve(result);
        if resolution == Resolution::Observed {
            tracing::debug!("{}: {} prices, avg {}", marketplace, summary.count, summary.avg);
        }
        (marketplace, summary)
    }
}

/// 依設定建立聚合器與共用 HTTP 取得器
pub fn build_aggregator(config: &ScoutConfig) -> Result<PriceAggregator> {
    let fetcher = Arc::new(HttpFetcher::new(config)?);
    Ok(PriceAggregator::from_config(config, fetcher))
}
