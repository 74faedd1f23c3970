use crate::domain::model::{Marketplace, PriceSample, ProductIdentification, TemplateRecord};
use crate::utils::error::{FetchError, Result};
use async_trait::async_trait;

/// 單一行情來源。取價策略（HTML、API）對協調器不可見。
#[async_trait]
pub trait PriceSource: Send + Sync {
    fn marketplace(&self) -> Marketplace;

    /// 必要的憑證是否存在；false 時完全不發出請求
    fn is_configured(&self) -> bool {
        true
    }

    /// 找不到價格時回傳空樣本，而不是錯誤
    async fn fetch_prices(&self, query: &str) -> std::result::Result<PriceSample, FetchError>;
}

#[async_trait]
pub trait ImageClassifier: Send + Sync {
    /// 永不失敗；無法辨識時回傳標示清楚的佔位結果
    async fn classify(&self, image: &[u8], mime_type: &str) -> ProductIdentification;
}

pub trait TemplateStore: Send + Sync {
    fn list(&self) -> impl std::future::Future<Output = Result<Vec<TemplateRecord>>> + Send;
    fn get(
        &self,
        id: &str,
    ) -> impl std::future::Future<Output = Result<Option<TemplateRecord>>> + Send;
    fn put(&self, record: TemplateRecord) -> impl std::future::Future<Output = Result<()>> + Send;
    /// 回傳是否真的刪除了紀錄
    fn delete(&self, id: &str) -> impl std::future::Future<Output = Result<bool>> + Send;
}
