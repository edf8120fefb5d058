use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::mapping::{catalog_key, CatalogKey};
use crate::types::CatalogItem;

/// Where scraped titles end up. Writes are upserts keyed by
/// [`CatalogKey`], so storing the same page twice changes nothing.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Returns the number of keys that were not present before.
    async fn upsert_items(&self, source: &str, items: &[CatalogItem]) -> Result<usize>;
    async fn get(&self, key: &CatalogKey) -> Result<Option<CatalogItem>>;
    async fn len(&self) -> Result<usize>;
}

#[derive(Debug, Default)]
pub struct MemoryCatalogStore {
    items: RwLock<HashMap<CatalogKey, CatalogItem>>,
}

impl MemoryCatalogStore {
    pub fn new() -> Self { Self::default() }
}

#[async_trait]
impl CatalogStore for MemoryCatalogStore {
    async fn upsert_items(&self, source: &str, items: &[CatalogItem]) -> Result<usize> {
        let mut map = self.items.write().await;
        let mut inserted = 0;
        for item in items {
            if map.insert(catalog_key(source, item), item.clone()).is_none() { inserted += 1; }
        }
        Ok(inserted)
    }

    async fn get(&self, key: &CatalogKey) -> Result<Option<CatalogItem>> {
        Ok(self.items.read().await.get(key).cloned())
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.items.read().await.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> Vec<CatalogItem> {
        ["1", "2", "3"].iter().map(|id| CatalogItem::new(*id, format!("Title {id}"), "https://c/x.jpg").unwrap()).collect()
    }

    #[tokio::test]
    async fn repeated_upserts_are_idempotent() {
        let store = MemoryCatalogStore::new();
        assert_eq!(store.upsert_items("Age", &page()).await.unwrap(), 3);
        assert_eq!(store.upsert_items("Age", &page()).await.unwrap(), 0);
        assert_eq!(store.len().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn same_id_from_two_sources_is_two_rows() {
        let store = MemoryCatalogStore::new();
        store.upsert_items("Age", &page()).await.unwrap();
        store.upsert_items("Yhmc", &page()).await.unwrap();
        assert_eq!(store.len().await.unwrap(), 6);
        let hit = store.get(&CatalogKey::new("Yhmc", "2")).await.unwrap().unwrap();
        assert_eq!(hit.title, "Title 2");
    }

    #[tokio::test]
    async fn upsert_replaces_changed_fields() {
        let store = MemoryCatalogStore::new();
        store.upsert_items("Age", &page()).await.unwrap();
        let mut changed = page();
        changed[0].status = "第5集".to_string();
        assert_eq!(store.upsert_items("Age", &changed).await.unwrap(), 0);
        let hit = store.get(&CatalogKey::new("Age", "1")).await.unwrap().unwrap();
        assert_eq!(hit.status, "第5集");
    }
}
