use crate::utils::error::{Result, ScoutError};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoutConfig {
    pub http: HttpConfig,
    pub sources: SourcesConfig,
    pub vision: VisionConfig,
    pub scrape: ScrapeConfig,
    pub templates: TemplatesConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_seconds: u64,
    pub retry_attempts: u32,
    pub retry_delay_ms: u64,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 10,
            retry_attempts: 0,
            retry_delay_ms: 200,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    pub mercari: MercariConfig,
    pub zenplus: ZenplusConfig,
    pub ebay: EbayConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MercariConfig {
    pub endpoint: String,
}

impl Default for MercariConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://jp.mercari.com/search".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ZenplusConfig {
    pub endpoint: String,
    /// 此值以上視為解析錯誤（例如抓到商品編號）
    pub max_price: u64,
}

impl Default for ZenplusConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://zenplus.jp/search".to_string(),
            max_price: 1_000_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EbayConfig {
    pub endpoint: String,
    pub app_id: Option<String>,
    pub entries_per_page: u32,
    pub sort_order: String,
}

impl Default for EbayConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://svcs.ebay.com/services/search/FindingService/v1".to_string(),
            app_id: None,
            entries_per_page: 100,
            sort_order: "PricePlusShippingLowest".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VisionConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub model: String,
    pub max_tokens: u32,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            api_key: None,
            model: "gpt-4o".to_string(),
            max_tokens: 500,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapeConfig {
    /// 從頁面標題尾端移除的市集名稱
    pub title_suffixes: Vec<String>,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            title_suffixes: vec![" - メルカリ".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplatesConfig {
    pub path: String,
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        Self {
            path: "./templates.json".to_string(),
        }
    }
}

/// 空字串或未替換的 ${VAR} 都視為未設定
fn credential(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty() && !(v.starts_with("${") && v.ends_with('}')))
}

impl ScoutConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(ScoutError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| ScoutError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 預設值加上環境變數中的憑證
    pub fn from_env() -> Self {
        Self::default().with_env_credentials()
    }

    /// 有設定檔就讀檔，否則使用預設值；兩者都會補上環境變數憑證
    pub fn load(path: Option<&str>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        Ok(config.with_env_credentials())
    }

    /// 設定檔未提供的憑證改由 EBAY_APP_ID / OPENAI_API_KEY 補上
    pub fn with_env_credentials(mut self) -> Self {
        if credential(&self.sources.ebay.app_id).is_none() {
            self.sources.ebay.app_id = std::env::var("EBAY_APP_ID").ok();
        }
        if credential(&self.vision.api_key).is_none() {
            self.vision.api_key = std::env::var("OPENAI_API_KEY").ok();
        }
        self
    }

    /// 替換環境變數 (例如 ${EBAY_APP_ID})，未定義者保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| ScoutError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn ebay_app_id(&self) -> Option<&str> {
        credential(&self.sources.ebay.app_id)
    }

    pub fn vision_api_key(&self) -> Option<&str> {
        credential(&self.vision.api_key)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.http.timeout_seconds)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.http.retry_delay_ms)
    }
}

impl Validate for ScoutConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_range("http.timeout_seconds", self.http.timeout_seconds, 1, 120)?;
        validation::validate_range("http.retry_attempts", self.http.retry_attempts, 0, 5)?;
        validation::validate_non_empty_string("http.user_agent", &self.http.user_agent)?;

        validation::validate_url("sources.mercari.endpoint", &self.sources.mercari.endpoint)?;
        validation::validate_url("sources.zenplus.endpoint", &self.sources.zenplus.endpoint)?;
        validation::validate_url("sources.ebay.endpoint", &self.sources.ebay.endpoint)?;
        validation::validate_range(
            "sources.ebay.entries_per_page",
            self.sources.ebay.entries_per_page,
            1,
            100,
        )?;
        validation::validate_range(
            "sources.zenplus.max_price",
            self.sources.zenplus.max_price,
            1,
            100_000_000,
        )?;

        validation::validate_url("vision.endpoint", &self.vision.endpoint)?;
        validation::validate_path("templates.path", &self.templates.path)?;

        tracing::debug!("✅ Configuration validation passed");
        Ok(())
    }
}
