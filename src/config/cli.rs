use crate::domain::ports::CounterStore;
use crate::utils::error::Result;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

pub const COUNTER_KEY: &str = "systemCount";

/// Counter kept in a small JSON file, `{"systemCount": <n>}`.
#[derive(Debug, Clone)]
pub struct LocalCounterStore {
    path: PathBuf,
}

impl LocalCounterStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CounterStore for LocalCounterStore {
    async fn load(&self) -> Result<u64> {
        let data = match tokio::fs::read(&self.path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let value: Value = serde_json::from_slice(&data)?;
        // 舊版以字串儲存計數
        let count = match &value[COUNTER_KEY] {
            Value::Number(n) => n.as_u64().unwrap_or(0),
            Value::String(s) => s.trim().parse().unwrap_or(0),
            _ => 0,
        };
        Ok(count)
    }

    async fn store(&self, value: u64) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let data = serde_json::to_vec_pretty(&json!({ COUNTER_KEY: value }))?;
        tokio::fs::write(&self.path, data).await?;
        tracing::debug!("Counter {} saved to {}", value, self.path.display());
        Ok(())
    }
}

/// Non-persistent counter, for sessions without a writable disk.
#[derive(Debug, Default)]
pub struct MemoryCounterStore {
    value: AtomicU64,
}

impl MemoryCounterStore {
    pub fn new(initial: u64) -> Self {
        Self {
            value: AtomicU64::new(initial),
        }
    }
}

impl CounterStore for MemoryCounterStore {
    async fn load(&self) -> Result<u64> {
        Ok(self.value.load(Ordering::SeqCst))
    }

    async fn store(&self, value: u64) -> Result<()> {
        self.value.store(value, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_file_reads_zero() {
        let temp_dir = TempDir::new().unwrap();
        let store = LocalCounterStore::new(temp_dir.path().join("counter.json"));
        assert_eq!(store.load().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_store_then_load() {
        let temp_dir = TempDir::new().unwrap();
        let store = LocalCounterStore::new(temp_dir.path().join("nested/dir/counter.json"));

        store.store(3).await.unwrap();
        assert_eq!(store.load().await.unwrap(), 3);

        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains("\"systemCount\": 3"));
    }

    #[tokio::test]
    async fn test_string_counter_is_accepted() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("counter.json");
        std::fs::write(&path, r#"{"systemCount": "12"}"#).unwrap();

        assert_eq!(LocalCounterStore::new(path).load().await.unwrap(), 12);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("counter.json");
        std::fs::write(&path, "not json").unwrap();

        assert!(LocalCounterStore::new(path).load().await.is_err());
    }
}
