use thiserror::Error;

/// 單一上游來源（行情來源或參考 URL）的取得失敗
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Network request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Upstream returned HTTP {status} for {url}")]
    Status { status: u16, url: String },

    #[error("Request timed out after {seconds}s")]
    Timeout { seconds: u64 },
}

#[derive(Error, Debug)]
pub enum ScoutError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("All {attempted} reference URLs failed")]
    AllSourcesFailed { attempted: usize },

    #[error("Template not found: {id}")]
    TemplateNotFound { id: String },

    #[error("Storage error: {message}")]
    StorageError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Network,
    Input,
    Storage,
    Internal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ScoutError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ScoutError::ConfigError { .. }
            | ScoutError::ConfigValidationError { .. }
            | ScoutError::InvalidConfigValueError { .. }
            | ScoutError::MissingConfigError { .. } => ErrorCategory::Configuration,
            ScoutError::ApiError(_) | ScoutError::Fetch(_) | ScoutError::AllSourcesFailed { .. } => {
                ErrorCategory::Network
            }
            ScoutError::ValidationError { .. } | ScoutError::TemplateNotFound { .. } => {
                ErrorCategory::Input
            }
            ScoutError::IoError(_) | ScoutError::StorageError { .. } => ErrorCategory::Storage,
            ScoutError::SerializationError(_) => ErrorCategory::Internal,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Input => ErrorSeverity::High,
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Configuration | ErrorCategory::Storage => ErrorSeverity::High,
            ErrorCategory::Internal => ErrorSeverity::Critical,
        }
    }

    /// 給呼叫端判斷用的錯誤代碼
    pub fn error_code(&self) -> &'static str {
        match self {
            ScoutError::AllSourcesFailed { .. } => "ALL_URLS_FAILED",
            ScoutError::ValidationError { .. } => "INVALID_INPUT",
            ScoutError::TemplateNotFound { .. } => "TEMPLATE_NOT_FOUND",
            ScoutError::Fetch(_) | ScoutError::ApiError(_) => "UPSTREAM_UNAVAILABLE",
            ScoutError::ConfigError { .. }
            | ScoutError::ConfigValidationError { .. }
            | ScoutError::InvalidConfigValueError { .. }
            | ScoutError::MissingConfigError { .. } => "CONFIGURATION_ERROR",
            ScoutError::IoError(_) | ScoutError::StorageError { .. } => "STORAGE_ERROR",
            ScoutError::SerializationError(_) => "INTERNAL_ERROR",
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            ScoutError::AllSourcesFailed { .. } => {
                "Check that the reference URLs are reachable listing pages, or enter the template manually"
            }
            ScoutError::ValidationError { .. } => "Check the command arguments and try again",
            ScoutError::TemplateNotFound { .. } => "Run `templates list` to see the stored template ids",
            ScoutError::Fetch(_) | ScoutError::ApiError(_) => {
                "Check network connectivity or raise http.timeout_seconds"
            }
            ScoutError::ConfigError { .. }
            | ScoutError::ConfigValidationError { .. }
            | ScoutError::InvalidConfigValueError { .. }
            | ScoutError::MissingConfigError { .. } => {
                "Review the configuration file and environment variables"
            }
            ScoutError::IoError(_) | ScoutError::StorageError { .. } => {
                "Check that the template store path is writable"
            }
            ScoutError::SerializationError(_) => "The stored data may be corrupted; inspect it manually",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            ScoutError::AllSourcesFailed { .. } => "すべてのURLの解析に失敗しました".to_string(),
            ScoutError::ValidationError { message } => format!("入力内容を確認してください: {}", message),
            ScoutError::TemplateNotFound { id } => format!("テンプレートが見つかりません: {}", id),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ScoutError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_sources_failed_has_machine_readable_code() {
        let err = ScoutError::AllSourcesFailed { attempted: 2 };
        assert_eq!(err.error_code(), "ALL_URLS_FAILED");
        assert_eq!(err.category(), ErrorCategory::Network);
        assert_eq!(err.to_string(), "All 2 reference URLs failed");
    }

    #[test]
    fn test_severity_ordering() {
        let input = ScoutError::ValidationError {
            message: "urls".to_string(),
        };
        let internal = ScoutError::SerializationError(
            serde_json::from_str::<serde_json::Value>("{").unwrap_err(),
        );
        assert!(input.severity() < internal.severity());
        assert_eq!(input.error_code(), "INVALID_INPUT");
    }
}
