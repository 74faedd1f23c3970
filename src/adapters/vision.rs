use crate::config::ScoutConfig;
use crate::domain::model::ProductIdentification;
use crate::domain::ports::ImageClassifier;
use crate::utils::error::{Result, ScoutError};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use regex::Regex;
use reqwest::Client;
use serde_json::{json, Value};

const PROMPT: &str = "この商品の画像を分析して、以下の情報をJSON形式で返してください：
- productName: 商品名（できるだけ詳細に。キャラクター名、作品名、商品タイプを含む）
- category: カテゴリー（例：グッズ、おもちゃ、家電など）
- brand: ブランド名やメーカー（わかる場合）
- keywords: 検索に使えるキーワードの配列（日本語と英語両方）

JSONのみを返してください。説明文は不要です。";

/// 佔位結果的來源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderReason {
    NotConfigured,
    RecognitionFailed,
}

pub fn placeholder(reason: PlaceholderReason) -> ProductIdentification {
    let product_name = match reason {
        PlaceholderReason::NotConfigured => "サンプル商品（APIキー未設定）",
        PlaceholderReason::RecognitionFailed => "サンプル商品（認識エラー）",
    };
    ProductIdentification {
        product_name: product_name.to_string(),
        category: "グッズ".to_string(),
        brand: "不明".to_string(),
        keywords: vec!["sample".to_string(), "サンプル".to_string()],
    }
}

/// OpenAI chat completions 視覺模型
pub struct OpenAiVisionClassifier {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
    max_tokens: u32,
}

impl OpenAiVisionClassifier {
    pub fn new(client: Client, config: &ScoutConfig) -> Self {
        Self {
            client,
            endpoint: config.vision.endpoint.clone(),
            api_key: config.vision_api_key().map(str::to_string),
            model: config.vision.model.clone(),
            max_tokens: config.vision.max_tokens,
        }
    }

    async fn request_identification(
        &self,
        api_key: &str,
        image: &[u8],
        mime_type: &str,
    ) -> Result<ProductIdentification> {
        let data_url = format!("data:{};base64,{}", mime_type, STANDARD.encode(image));
        let payload = json!({
            "model": self.model,
            "messages": [{
                "role": "user",
                "content": [
                    { "type": "text", "text": PROMPT },
                    { "type": "image_url", "image_url": { "url": data_url } }
                ]
            }],
            "max_tokens": self.max_tokens,
        });

        tracing::debug!("Requesting image classification from: {}", self.endpoint);
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&payload)
            .send()
            .await?
            .error_for_status()?;

        let body: Value = response.json().await?;
        let content = body
            .get("choices")
            .and_then(|choices| choices.get(0))
            .and_then(|choice| choice.get("message"))
            .and_then(|message| message.get("content"))
            .and_then(Value::as_str)
            .ok_or_else(|| ScoutError::ValidationError {
                message: "vision response has no message content".to_string(),
            })?;

        parse_identification(content)
    }
}

/// 回覆可能包在 markdown 程式碼區塊內，取第一個 { 到最後一個 }
pub fn parse_identification(content: &str) -> Result<ProductIdentification> {
    let re = Regex::new(r"(?s)\{.*\}").map_err(|e| ScoutError::ConfigError {
        message: format!("Invalid JSON extraction pattern: {}", e),
    })?;
    let json_text = re
        .find(content)
        .map(|m| m.as_str())
        .ok_or_else(|| ScoutError::ValidationError {
            message: "no JSON object in vision response".to_string(),
        })?;

    Ok(serde_json::from_str(json_text)?)
}

#[async_trait]
impl ImageClassifier for OpenAiVisionClassifier {
    async fn classify(&self, image: &[u8], mime_type: &str) -> ProductIdentification {
        let Some(api_key) = self.api_key.as_deref() else {
            tracing::warn!("⚠️ Vision API key not configured, returning placeholder");
            return placeholder(PlaceholderReason::NotConfigured);
        };

        match self.request_identification(api_key, image, mime_type).await {
            Ok(identification) => {
                tracing::info!("🔍 Identified product: {}", identification.product_name);
                identification
            }
            Err(e) => {
                tracing::warn!("⚠️ Image classification failed: {}", e);
                placeholder(PlaceholderReason::RecognitionFailed)
            }
        }
    }
}
