use crate::core::stats;
use crate::domain::model::{Currency, MarketSummary, Marketplace, PriceSample};
use crate::utils::error::FetchError;

/// 每個來源在無法取得實際行情時使用的固定數值與說明
#[derive(Debug, Clone)]
pub struct FallbackPolicy {
    marketplace: Marketplace,
    defaults: MarketSummary,
}

/// 決定結果的分支，方便記錄與測試
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Observed,
    AccessFailed,
    NoData,
    NotConfigured,
}

impl FallbackPolicy {
    pub fn for_marketplace(marketplace: Marketplace) -> Self {
        Self {
            marketplace,
            defaults: default_summary(marketplace),
        }
    }

    pub fn marketplace(&self) -> Marketplace {
        self.marketplace
    }

    /// 不含 note 的預設值
    pub fn defaults(&self) -> &MarketSummary {
        &self.defaults
    }

    pub fn resolve(
        &self,
        result: Result<PriceSample, FetchError>,
    ) -> (Resolution, MarketSummary) {
        match result {
            Err(e) => {
                tracing::warn!("⚠️ {}: access failed ({}), using defaults", self.marketplace, e);
                (Resolution::AccessFailed, self.with_note(Resolution::AccessFailed))
            }
            Ok(sample) => match stats::reduce(&sample, self.defaults.currency) {
                Some(summary) => (Resolution::Observed, summary),
                None => {
                    tracing::warn!("⚠️ {}: no usable prices, using defaults", self.marketplace);
                    (Resolution::NoData, self.with_note(Resolution::NoData))
                }
            },
        }
    }

    /// 憑證缺漏時不發出請求，直接回傳預設值
    pub fn not_configured(&self) -> MarketSummary {
        tracing::warn!("⚠️ {}: credential not configured, using defaults", self.marketplace);
        self.with_note(Resolution::NotConfigured)
    }

    fn with_note(&self, resolution: Resolution) -> MarketSummary {
        self.defaults.clone().with_note(note(self.marketplace, resolution))
    }
}

fn default_summary(marketplace: Marketplace) -> MarketSummary {
    let (min, max, avg, count, currency) = match marketplace {
        Marketplace::Mercari => (500.0, 2000.0, 1000.0, 10, Currency::Jpy),
        Marketplace::Zenplus => (1500.0, 4000.0, 2500.0, 5, Currency::Jpy),
        Marketplace::Ebay => (10.0, 50.0, 25.0, 15, Currency::Usd),
    };
    MarketSummary {
        min,
        max,
        avg,
        count,
        currency,
        note: None,
    }
}

fn note(marketplace: Marketplace, resolution: Resolution) -> String {
    let name = marketplace.display_name();
    match (marketplace, resolution) {
        (_, Resolution::Observed) => String::new(),
        (Marketplace::Ebay, Resolution::NoData) => {
            "eBayで商品が見つかりませんでした。ダミーデータを表示しています。".to_string()
        }
        (_, Resolution::NoData) => {
            format!("{}からデータを取得できませんでした。ダミーデータを表示しています。", name)
        }
        (_, Resolution::AccessFailed) => {
            format!("{}へのアクセスに失敗しました。ダミーデータを表示しています。", name)
        }
        (Marketplace::Ebay, Resolution::NotConfigured) => {
            "eBay APIキーが設定されていません。ダミーデータを表示しています。".to_string()
        }
        (_, Resolution::NotConfigured) => {
            format!("{}の認証情報が設定されていません。ダミーデータを表示しています。", name)
        }
    }
}
