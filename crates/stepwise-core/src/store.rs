//! Item store boundary
//!
//! Persistence is reached only through `get_item` / `save_item` /
//! `delete_item` keyed by `(collection, id)`. Writes are last-write-wins.

use crate::error::Result;
use dashmap::DashMap;
use serde_json::Value;

/// Collection the engine persists context buckets in
pub const CONTEXT_COLLECTION: &str = "contexts";

/// Document persistence capability
#[async_trait::async_trait]
pub trait ItemStore: Send + Sync {
    /// Read an item
    async fn get_item(&self, collection: &str, id: &str) -> Result<Option<Value>>;

    /// Write an item, replacing any previous value
    async fn save_item(&self, collection: &str, id: &str, item: Value) -> Result<()>;

    /// Delete an item; returns whether it existed
    async fn delete_item(&self, collection: &str, id: &str) -> Result<bool>;
}

/// In-memory item store
#[derive(Debug, Default)]
pub struct MemoryItemStore {
    items: DashMap<(String, String), Value>,
}

impl MemoryItemStore {
    /// Create empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored items
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if the store is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[async_trait::async_trait]
impl ItemStore for MemoryItemStore {
    async fn get_item(&self, collection: &str, id: &str) -> Result<Option<Value>> {
        Ok(self
            .items
            .get(&(collection.to_string(), id.to_string()))
            .map(|item| item.value().clone()))
    }

    async fn save_item(&self, collection: &str, id: &str, item: Value) -> Result<()> {
        self.items
            .insert((collection.to_string(), id.to_string()), item);
        Ok(())
    }

    async fn delete_item(&self, collection: &str, id: &str) -> Result<bool> {
        Ok(self
            .items
            .remove(&(collection.to_string(), id.to_string()))
            .is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn last_write_wins() {
        let store = MemoryItemStore::new();
        store.save_item("c", "1", json!(1)).await.unwrap();
        store.save_item("c", "1", json!(2)).await.unwrap();
        assert_eq!(store.get_item("c", "1").await.unwrap(), Some(json!(2)));
        assert_eq!(store.len(), 1);

        assert!(store.delete_item("c", "1").await.unwrap());
        assert!(!store.delete_item("c", "1").await.unwrap());
        assert!(store.get_item("c", "1").await.unwrap().is_none());
    }
}
