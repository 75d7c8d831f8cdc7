// src/db/memory_store.rs

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{common::error::AppError, db::storage::KeyValueStore};

// Fallback em memória: mesmo contrato do storage durável, sem nada em disco.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), AppError> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stores_and_removes_values() {
        let store = MemoryStore::new();
        assert_eq!(store.get("@items").await.unwrap(), None);

        store.set("@items", "[]").await.unwrap();
        assert_eq!(store.get("@items").await.unwrap().as_deref(), Some("[]"));

        store.remove("@items").await.unwrap();
        store.remove("@items").await.unwrap();
        assert_eq!(store.get("@items").await.unwrap(), None);
    }
}
