#[cfg(feature = "lambda")]
use aws_config::BehaviorVersion;
#[cfg(feature = "lambda")]
use aws_sdk_s3::config::Region;
#[cfg(feature = "lambda")]
use aws_sdk_s3::Client as S3Client;
#[cfg(feature = "lambda")]
use base64::{engine::general_purpose::STANDARD, Engine};
#[cfg(feature = "lambda")]
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
#[cfg(feature = "lambda")]
use price_scout::adapters::{HttpFetcher, OpenAiVisionClassifier};
#[cfg(feature = "lambda")]
use price_scout::config::lambda::{LambdaConfig, S3TemplateStore};
#[cfg(feature = "lambda")]
use price_scout::utils::error::{Result, ScoutError};
#[cfg(feature = "lambda")]
use price_scout::utils::logger;
#[cfg(feature = "lambda")]
use price_scout::utils::validation::{require_input, Validate};
#[cfg(feature = "lambda")]
use price_scout::{
    Appraiser, ListingExtractor, PriceAggregator, ScoutConfig, TemplateDraft, TemplateLibrary,
};
#[cfg(feature = "lambda")]
use serde::{Deserialize, Serialize};
#[cfg(feature = "lambda")]
use serde_json::{json, Value};
#[cfg(feature = "lambda")]
use std::sync::Arc;

#[cfg(feature = "lambda")]
#[derive(Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum Request {
    Prices {
        q: String,
    },
    Analyze {
        /// base64 編碼的圖片
        image: String,
        #[serde(rename = "mimeType", default = "default_mime")]
        mime_type: String,
    },
    Scrape {
        #[serde(default)]
        urls: Vec<String>,
    },
    Templates(TemplateRequest),
}

#[cfg(feature = "lambda")]
fn default_mime() -> String {
    "image/jpeg".to_string()
}

#[cfg(feature = "lambda")]
#[derive(Deserialize, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum TemplateOp {
    List,
    Get,
    Create,
    Update,
    Delete,
    Learn,
}

#[cfg(feature = "lambda")]
#[derive(Deserialize)]
pub struct TemplateRequest {
    pub op: TemplateOp,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub urls: Vec<String>,
}

#[cfg(feature = "lambda")]
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub status_code: u16,
    pub body: String,
}

#[cfg(feature = "lambda")]
impl Response {
    fn ok(value: Value) -> Self {
        Self {
            status_code: 200,
            body: value.to_string(),
        }
    }

    fn from_error(e: &ScoutError) -> Self {
        let status_code = match e.error_code() {
            "INVALID_INPUT" => 400,
            "TEMPLATE_NOT_FOUND" => 404,
            _ => 500,
        };
        Self {
            status_code,
            body: json!({ "error": e.user_friendly_message(), "code": e.error_code() }).to_string(),
        }
    }
}

#[cfg(feature = "lambda")]
struct AppState {
    aggregator: Arc<PriceAggregator>,
    appraiser: Appraiser,
    extractor: ListingExtractor,
    library: Option<TemplateLibrary<S3TemplateStore>>,
}

#[cfg(feature = "lambda")]
impl AppState {
    async fn init() -> Result<Self> {
        let lambda_config = LambdaConfig::from_env();
        let config = ScoutConfig::load(
            lambda_config
                .as_ref()
                .ok()
                .and_then(|c| c.config_path.as_deref()),
        )?;
        config.validate()?;

        let fetcher = Arc::new(HttpFetcher::new(&config)?);
        let aggregator = Arc::new(PriceAggregator::from_config(&config, fetcher.clone()));
        let classifier = Arc::new(OpenAiVisionClassifier::new(fetcher.client().clone(), &config));

        // 範本庫需要 S3；未設定時其他 action 仍可使用
        let library = match lambda_config {
            Ok(lambda_config) => {
                lambda_config.validate()?;
                let aws = aws_config::load_defaults(BehaviorVersion::latest()).await;
                let s3_config = aws_sdk_s3::config::Builder::from(&aws)
                    .region(Region::new(lambda_config.s3_region.clone()))
                    .force_path_style(true)
                    .build();
                let store = S3TemplateStore::new(
                    S3Client::from_conf(s3_config),
                    lambda_config.s3_bucket,
                    lambda_config.s3_prefix,
                );
                Some(TemplateLibrary::new(store))
            }
            Err(e) => {
                tracing::warn!("⚠️ Template storage disabled: {}", e);
                None
            }
        };

        Ok(Self {
            appraiser: Appraiser::new(classifier, aggregator.clone()),
            aggregator,
            extractor: ListingExtractor::from_config(&config, fetcher),
            library,
        })
    }

    async fn handle(&self, request: Request) -> Result<Value> {
        match request {
            Request::Prices { q } => {
                let query = require_input("q", &q)?;
                Ok(serde_json::to_value(self.aggregator.aggregate(&query).await)?)
            }
            Request::Analyze { image, mime_type } => {
                let bytes = STANDARD
                    .decode(image.trim())
                    .map_err(|e| ScoutError::ValidationError {
                        message: format!("image is not valid base64: {}", e),
                    })?;
                Ok(serde_json::to_value(self.appraiser.appraise(&bytes, &mime_type).await)?)
            }
            Request::Scrape { urls } => Ok(serde_json::to_value(self.extractor.scrape(&urls).await?)?),
            Request::Templates(request) => self.handle_templates(request).await,
        }
    }

    async fn handle_templates(&self, request: TemplateRequest) -> Result<Value> {
        let library = self.library.as_ref().ok_or_else(|| ScoutError::MissingConfigError {
            field: "S3_BUCKET".to_string(),
        })?;

        let draft = || {
            TemplateDraft::new(
                request.category.clone(),
                request.title.clone(),
                request.description.clone(),
            )
        };

        let value = match request.op {
            TemplateOp::List => serde_json::to_value(library.list().await?)?,
            TemplateOp::Get => serde_json::to_value(library.get(&request.id).await?)?,
            TemplateOp::Create => serde_json::to_value(library.create(draft()).await?)?,
            TemplateOp::Update => serde_json::to_value(library.update(&request.id, draft()).await?)?,
            TemplateOp::Delete => {
                library.delete(&request.id).await?;
                json!({ "deleted": request.id })
            }
            TemplateOp::Learn => serde_json::to_value(
                library
                    .learn(&self.extractor, &request.category, &request.urls)
                    .await?,
            )?,
        };
        Ok(value)
    }
}

#[cfg(feature = "lambda")]
async fn function_handler(state: &AppState, event: LambdaEvent<Request>) -> std::result::Result<Response, Error> {
    tracing::info!("Handling request {}", event.context.request_id);

    let response = match state.handle(event.payload).await {
        Ok(value) => Response::ok(value),
        Err(e) => {
            tracing::error!(
                "❌ Request failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            Response::from_error(&e)
        }
    };
    Ok(response)
}

#[cfg(feature = "lambda")]
#[tokio::main]
async fn main() -> std::result::Result<(), Error> {
    logger::init_lambda_logger();

    let state = AppState::init()
        .await
        .map_err(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>)?;
    let state = &state;

    run(service_fn(move |event: LambdaEvent<Request>| async move {
        function_handler(state, event).await
    }))
    .await
}
