#[cfg(feature = "lambda")]
use crate::domain::model::TemplateRecord;
#[cfg(feature = "lambda")]
use crate::domain::ports::TemplateStore;
#[cfg(feature = "lambda")]
use crate::utils::error::{Result, ScoutError};
#[cfg(feature = "lambda")]
use aws_sdk_s3::Client as S3Client;
#[cfg(feature = "lambda")]
use std::env;

#[cfg(feature = "lambda")]
#[derive(Debug, Clone)]
pub struct LambdaConfig {
    pub s3_bucket: String,
    pub s3_prefix: String,
    pub s3_region: String,
    /// 選用的 TOML 設定檔，未設定時使用預設值加環境變數
    pub config_path: Option<String>,
}

#[cfg(feature = "lambda")]
impl LambdaConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            s3_bucket: env::var("S3_BUCKET").map_err(|_| ScoutError::MissingConfigError {
                field: "S3_BUCKET".to_string(),
            })?,
            s3_prefix: env::var("S3_PREFIX").unwrap_or_else(|_| "templates".to_string()),
            s3_region: env::var("S3_REGION").unwrap_or_else(|_| "ap-northeast-1".to_string()),
            config_path: env::var("PRICE_SCOUT_CONFIG").ok().filter(|p| !p.is_empty()),
        })
    }
}

#[cfg(feature = "lambda")]
impl crate::utils::validation::Validate for LambdaConfig {
    fn validate(&self) -> Result<()> {
        use crate::utils::validation::*;

        validate_s3_bucket_name("s3_bucket", &self.s3_bucket)?;
        validate_non_empty_string("s3_prefix", &self.s3_prefix)?;
        validate_aws_region("s3_region", &self.s3_region)?;

        tracing::info!("✅ Lambda configuration validation passed");
        Ok(())
    }
}

#[cfg(feature = "lambda")]
fn validate_s3_bucket_name(field_name: &str, bucket_name: &str) -> Result<()> {
    let invalid = |reason: &str| ScoutError::InvalidConfigValueError {
        field: field_name.to_string(),
        value: bucket_name.to_string(),
        reason: reason.to_string(),
    };

    if bucket_name.len() < 3 || bucket_name.len() > 63 {
        return Err(invalid("S3 bucket name must be between 3 and 63 characters"));
    }
    if !bucket_name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '.')
    {
        return Err(invalid(
            "S3 bucket name can only contain lowercase letters, numbers, hyphens, and dots",
        ));
    }
    if bucket_name.starts_with('-') || bucket_name.ends_with('-') {
        return Err(invalid("S3 bucket name cannot start or end with a hyphen"));
    }
    Ok(())
}

#[cfg(feature = "lambda")]
fn validate_aws_region(field_name: &str, region: &str) -> Result<()> {
    crate::utils::validation::validate_non_empty_string(field_name, region)?;

    if !region
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(ScoutError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: region.to_string(),
            reason: "AWS region can only contain lowercase letters, numbers, and hyphens"
                .to_string(),
        });
    }
    Ok(())
}

/// 每個範本存成 `<prefix>/<id>.json` 一個物件
#[cfg(feature = "lambda")]
#[derive(Debug, Clone)]
pub struct S3TemplateStore {
    client: S3Client,
    bucket: String,
    prefix: String,
}

#[cfg(feature = "lambda")]
impl S3TemplateStore {
    pub fn new(client: S3Client, bucket: String, prefix: String) -> Self {
        Self {
            client,
            bucket,
            prefix: prefix.trim_end_matches('/').to_string(),
        }
    }

    fn key(&self, id: &str) -> String {
        format!("{}/{}.json", self.prefix, id)
    }

    fn storage_error(action: &str, e: impl std::fmt::Display) -> ScoutError {
        ScoutError::StorageError {
            message: format!("Failed to {} S3 object: {}", action, e),
        }
    }

    async fn read_key(&self, key: &str) -> Result<Option<TemplateRecord>> {
        let resp = match self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(err) => {
                let service_error = err.into_service_error();
                if service_error.is_no_such_key() {
                    return Ok(None);
                }
                return Err(Self::storage_error("read", service_error));
            }
        };

        let data = resp
            .body
            .collect()
            .await
            .map_err(|e| Self::storage_error("collect", e))?;
        Ok(Some(serde_json::from_slice(&data.into_bytes())?))
    }

    async fn list_keys(&self) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        let mut continuation: Option<String> = None;

        loop {
            let resp = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(format!("{}/", self.prefix))
                .set_continuation_token(continuation.take())
                .send()
                .await
                .map_err(|e| Self::storage_error("list", e))?;

            keys.extend(
                resp.contents()
                    .iter()
                    .filter_map(|object| object.key())
                    .filter(|key| key.ends_with(".json"))
                    .map(str::to_string),
            );

            match resp.next_continuation_token() {
                Some(token) if resp.is_truncated().unwrap_or(false) => {
                    continuation = Some(token.to_string());
                }
                _ => break,
            }
        }
        Ok(keys)
    }
}

#[cfg(feature = "lambda")]
impl TemplateStore for S3TemplateStore {
    async fn list(&self) -> Result<Vec<TemplateRecord>> {
        let mut records = Vec::new();
        for key in self.list_keys().await? {
            if let Some(record) = self.read_key(&key).await? {
                records.push(record);
            }
        }
        records.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(records)
    }

    async fn get(&self, id: &str) -> Result<Option<TemplateRecord>> {
        self.read_key(&self.key(id)).await
    }

    async fn put(&self, record: TemplateRecord) -> Result<()> {
        let body = serde_json::to_vec(&record)?;
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(self.key(&record.id))
            .content_type("application/json")
            .body(body.into())
            .send()
            .await
            .map_err(|e| Self::storage_error("write", e.into_service_error()))?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        // S3 刪除不存在的物件也會成功，先確認存在
        if self.get(id).await?.is_none() {
            return Ok(false);
        }
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(self.key(id))
            .send()
            .await
            .map_err(|e| Self::storage_error("delete", e.into_service_error()))?;
        Ok(true)
    }
}
