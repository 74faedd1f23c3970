use crate::core::aggregator::PriceAggregator;
use crate::domain::model::{Appraisal, ProductIdentification};
use crate::domain::ports::ImageClassifier;
use std::sync::Arc;

/// 拍照查價：辨識商品後以辨識結果查詢三個市集
pub struct Appraiser {
    classifier: Arc<dyn ImageClassifier>,
    aggregator: Arc<PriceAggregator>,
}

impl Appraiser {
    pub fn new(classifier: Arc<dyn ImageClassifier>, aggregator: Arc<PriceAggregator>) -> Self {
        Self {
            classifier,
            aggregator,
        }
    }

    pub async fn identify(&self, image: &[u8], mime_type: &str) -> ProductIdentification {
        tracing::info!("📷 Classifying image ({} bytes, {})", image.len(), mime_type);
        self.classifier.classify(image, mime_type).await
    }

    pub async fn appraise(&self, image: &[u8], mime_type: &str) -> Appraisal {
        let identification = self.identify(image, mime_type).await;
        let query = identification.search_query();
        let market = self.aggregator.aggregate(&query).await;
        Appraisal {
            identification,
            market,
        }
    }
}
