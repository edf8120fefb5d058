pub mod config;
pub mod decode;
pub mod error;
pub mod mapping;
pub mod parse;
pub mod sources;
pub mod storage;
pub mod types;

// --- Library API for embedding ---

/// Convenience re-exports for embedders.
pub mod prelude {
    pub use crate::config::EngineConfig;
    pub use crate::error::ScrapeError;
    pub use crate::mapping::{catalog_key, CatalogKey};
    pub use crate::sources::{resolve_playlist, Source, SourceCapabilities, SourceRegistry};
    pub use crate::storage::{CatalogStore, MemoryCatalogStore};
    pub use crate::types::{
        CatalogItem, DetailBundle, DetailMetadata, Episode, HomePage, HomeSection, Playlist, ResolvedVideo, StreamKind,
        UNKNOWN,
    };
}
