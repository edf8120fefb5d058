use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::CatalogItem;

/// Compound key under which a title is stored downstream. `source_id` alone
/// collides across sources; the pair does not.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogKey {
    pub source: String,
    pub source_id: String,
}

impl CatalogKey {
    pub fn new(source: impl Into<String>, source_id: impl Into<String>) -> Self {
        Self { source: source.into(), source_id: source_id.into() }
    }
}

impl fmt::Display for CatalogKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.source, self.source_id)
    }
}

pub fn catalog_key(source: &str, item: &CatalogItem) -> CatalogKey {
    CatalogKey::new(source, item.source_id.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_differ_per_source() {
        let item = CatalogItem::new("20260043", "t", "c").unwrap();
        let a = catalog_key("Age", &item);
        let b = catalog_key("Yhmc", &item);
        assert_ne!(a, b);
        assert_eq!(a.to_string(), "Age:20260043");
        assert_eq!(a, CatalogKey::new("Age", "20260043"));
    }
}
