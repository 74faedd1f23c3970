use crate::core::extract::ListingExtractor;
use crate::domain::model::TemplateRecord;
use crate::domain::ports::TemplateStore;
use crate::utils::error::{Result, ScoutError};
use crate::utils::validation::require_input;
use chrono::Utc;
use tokio::sync::Mutex;

/// 使用者輸入的範本內容（建立與更新共用）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateDraft {
    pub category: String,
    pub title: String,
    pub description: String,
}

impl TemplateDraft {
    pub fn new(
        category: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            category: category.into(),
            title: title.into(),
            description: description.into(),
        }
    }

    /// 三個欄位都必填，前後空白去除
    fn normalized(&self) -> Result<Self> {
        Ok(Self {
            category: require_input("category", &self.category)?,
            title: require_input("title", &self.title)?,
            description: require_input("description", &self.description)?,
        })
    }
}

/// 刊登範本庫，儲存方式由 TemplateStore 注入
pub struct TemplateLibrary<S: TemplateStore> {
    store: S,
    // 挑選 id 到寫入完成之間持有，避免同一毫秒的建立互相覆寫
    id_lock: Mutex<()>,
}

impl<S: TemplateStore> TemplateLibrary<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            id_lock: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn list(&self) -> Result<Vec<TemplateRecord>> {
        self.store.list().await
    }

    pub async fn get(&self, id: &str) -> Result<TemplateRecord> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| ScoutError::TemplateNotFound { id: id.to_string() })
    }

    pub async fn create(&self, draft: TemplateDraft) -> Result<TemplateRecord> {
        let draft = draft.normalized()?;
        let _guard = self.id_lock.lock().await;
        let now = Utc::now();

        // id 為建立時間的毫秒數；同一毫秒內重複時往後遞增
        let mut millis = now.timestamp_millis();
        while self.store.get(&millis.to_string()).await?.is_some() {
            millis += 1;
        }

        let record = TemplateRecord {
            id: millis.to_string(),
            category: draft.category,
            title: draft.title,
            description: draft.description,
            created_at: now,
            updated_at: now,
        };
        self.store.put(record.clone()).await?;
        tracing::info!("📝 Created template {} ({})", record.id, record.category);
        Ok(record)
    }

    pub async fn update(&self, id: &str, draft: TemplateDraft) -> Result<TemplateRecord> {
        let draft = draft.normalized()?;
        let existing = self.get(id).await?;

        let record = TemplateRecord {
            category: draft.category,
            title: draft.title,
            description: draft.description,
            updated_at: Utc::now(),
            ..existing
        };
        self.store.put(record.clone()).await?;
        tracing::info!("📝 Updated template {}", record.id);
        Ok(record)
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        if !self.store.delete(id).await? {
            return Err(ScoutError::TemplateNotFound { id: id.to_string() });
        }
        tracing::info!("🗑️ Deleted template {}", id);
        Ok(())
    }

    /// 從參考刊登學出樣式並存成新範本
    pub async fn learn(
        &self,
        extractor: &ListingExtractor,
        category: &str,
        urls: &[String],
    ) -> Result<TemplateRecord> {
        let category = require_input("category", category)?;
        let response = extractor.scrape(urls).await?;
        self.create(TemplateDraft::new(
            category,
            response.template.title_pattern,
            response.template.description_pattern,
        ))
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    /// 測試用的記憶體儲存，依插入順序列出
    #[derive(Default)]
    struct MemoryStore {
        records: Mutex<BTreeMap<String, TemplateRecord>>,
    }

    impl TemplateStore for MemoryStore {
        async fn list(&self) -> Result<Vec<TemplateRecord>> {
            let mut records: Vec<_> = self.records.lock().await.values().cloned().collect();
            records.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
            Ok(records)
        }

        async fn get(&self, id: &str) -> Result<Option<TemplateRecord>> {
            Ok(self.records.lock().await.get(id).cloned())
        }

        async fn put(&self, record: TemplateRecord) -> Result<()> {
            self.records.lock().await.insert(record.id.clone(), record);
            Ok(())
        }

        async fn delete(&self, id: &str) -> Result<bool> {
            Ok(self.records.lock().await.remove(id).is_some())
        }
    }

    fn library() -> TemplateLibrary<MemoryStore> {
        TemplateLibrary::new(MemoryStore::default())
    }

    #[tokio::test]
    async fn test_create_trims_and_assigns_unique_ids() {
        let library = library();
        let first = library
            .create(TemplateDraft::new(" ぬいぐるみ ", "【美品】{productName}", "{productName}です。"))
            .await
            .unwrap();
        let second = library
            .create(TemplateDraft::new("フィギュア", "【新品】{productName}", "説明"))
            .await
            .unwrap();

        assert_eq!(first.category, "ぬいぐるみ");
        assert_eq!(first.created_at, first.updated_at);
        assert_ne!(first.id, second.id);
        assert!(first.id.parse::<i64>().is_ok());
        assert_eq!(library.list().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_creates_never_share_an_id() {
        let library = library();
        let drafts: Vec<_> = (0..20)
            .map(|i| TemplateDraft::new("ぬいぐるみ", format!("【美品】{}", i), "説明"))
            .collect();

        let created = futures::future::join_all(drafts.into_iter().map(|d| library.create(d))).await;

        let mut ids: Vec<_> = created.into_iter().map(|r| r.unwrap().id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 20);
        assert_eq!(library.list().await.unwrap().len(), 20);
    }

    #[tokio::test]
    async fn test_create_requires_all_fields() {
        let err = library()
            .create(TemplateDraft::new("ぬいぐるみ", "  ", "説明"))
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "INVALID_INPUT");
    }

    #[tokio::test]
    async fn test_update_keeps_id_and_creation_time() {
        let library = library();
        let created = library
            .create(TemplateDraft::new("ぬいぐるみ", "【美品】{productName}", "旧"))
            .await
            .unwrap();

        let updated = library
            .update(&created.id, TemplateDraft::new("ぬいぐるみ", "【美品】{productName}", "新"))
            .await
            .unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at >= created.updated_at);
        assert_eq!(library.get(&created.id).await.unwrap().description, "新");
    }

    #[tokio::test]
    async fn test_missing_template_errors() {
        let library = library();
        let err = library.get("404").await.unwrap_err();
        assert_eq!(err.error_code(), "TEMPLATE_NOT_FOUND");

        let err = library.delete("404").await.unwrap_err();
        assert!(matches!(err, ScoutError::TemplateNotFound { .. }));

        let err = library
            .update("404", TemplateDraft::new("a", "b", "c"))
            .await
            .unwrap_err();
        assert!(matches!(err, ScoutError::TemplateNotFound { .. }));
    }

    #[tokio::test]
    async fn test_delete_removes_record() {
        let library = library();
        let created = library
            .create(TemplateDraft::new("a", "b", "c"))
            .await
            .unwrap();

        library.delete(&created.id).await.unwrap();
        assert!(library.list().await.unwrap().is_empty());
    }
}
