use crate::domain::model::TemplateRecord;
use crate::domain::ports::TemplateStore;
use crate::utils::error::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// 將所有範本存成單一 JSON 陣列檔，依建立順序排列
#[derive(Debug)]
pub struct LocalTemplateStore {
    path: PathBuf,
    // 讀取-修改-寫入期間持有
    lock: Mutex<()>,
}

impl LocalTemplateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<Vec<TemplateRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let data = fs::read(&self.path)?;
        if data.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_slice(&data)?)
    }

    fn write_all(&self, records: &[TemplateRecord]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, serde_json::to_vec_pretty(records)?)?;
        Ok(())
    }
}

impl TemplateStore for LocalTemplateStore {
    async fn list(&self) -> Result<Vec<TemplateRecord>> {
        let _guard = self.lock.lock().await;
        self.read_all()
    }

    async fn get(&self, id: &str) -> Result<Option<TemplateRecord>> {
        let _guard = self.lock.lock().await;
        Ok(self.read_all()?.into_iter().find(|r| r.id == id))
    }

    async fn put(&self, record: TemplateRecord) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut records = self.read_all()?;
        match records.iter_mut().find(|r| r.id == record.id) {
            Some(existing) => *existing = record,
            None => records.push(record),
        }
        self.write_all(&records)
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let _guard = self.lock.lock().await;
        let mut records = self.read_all()?;
        let before = records.len();
        records.retain(|r| r.id != id);
        if records.len() == before {
            return Ok(false);
        }
        self.write_all(&records)?;
        Ok(true)
    }
}
