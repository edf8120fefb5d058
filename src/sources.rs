pub mod age;
pub mod fetch;
pub mod yhmc;

use anyhow::Result;
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

use crate::config::EngineConfig;
use crate::types::{CatalogItem, DetailBundle, HomePage, Playlist, ResolvedVideo};

pub use age::AgeSource;
pub use fetch::{Fetch, HttpFetcher};
pub use yhmc::YhmcSource;

/// What a source can do. Check `home` before asking for a home page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceCapabilities {
    pub catalog: bool,
    pub detail: bool,
    pub video: bool,
    pub home: bool,
    /// `scrape_catalog` honours its `category` argument.
    pub category_filter: bool,
    /// `scrape_catalog` honours its `year` argument.
    pub year_filter: bool,
}

/// One external site.
///
/// None of the operations fail: network or markup problems are logged and
/// surface as an empty list, an empty bundle or `None`.
#[async_trait]
pub trait Source: Send + Sync {
    fn name(&self) -> &str;

    fn capabilities(&self) -> SourceCapabilities;

    /// Category labels understood by `scrape_catalog`, in display order.
    fn categories(&self) -> Vec<&'static str> { Vec::new() }

    /// Year labels understood by `scrape_catalog`, in display order.
    fn years(&self) -> Vec<&'static str> { Vec::new() }

    /// One catalog page. `page` is 1-based; labels the source does not know
    /// fall back to its default listing.
    async fn scrape_catalog(&self, page: u32, category: Option<&str>, year: Option<&str>) -> Vec<CatalogItem>;

    async fn scrape_detail(&self, source_id: &str) -> DetailBundle;

    /// Resolve a play page into a stream. `None` means "try another mirror".
    async fn scrape_video(&self, play_url: &str) -> Option<ResolvedVideo>;

    /// Only meaningful when `capabilities().home` is set.
    async fn scrape_home(&self) -> HomePage { HomePage::default() }
}

/// Name -> source lookup, filled once at startup and then shared read-only.
#[derive(Default)]
pub struct SourceRegistry {
    sources: HashMap<String, Arc<dyn Source>>,
}

impl SourceRegistry {
    pub fn new() -> Self { Self::default() }

    /// Registry with every built-in source, configured from `cfg`.
    pub fn with_defaults(cfg: &EngineConfig) -> Result<Self> {
        let mut registry = Self::new();
        registry.register(AgeSource::from_config(cfg)?);
        registry.register(YhmcSource::from_config(cfg)?);
        info!(sources = ?registry.names(), "source registry ready");
        Ok(registry)
    }

    /// Startup wiring only. Replaces (and returns) a source of the same name.
    pub fn register<S: Source + 'static>(&mut self, source: S) -> Option<Arc<dyn Source>> {
        let name = source.name().to_string();
        self.sources.insert(name, Arc::new(source))
    }

    /// `None` for an unknown name; treat it as a configuration error.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Source>> {
        self.sources.get(name).cloned()
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.sources.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn capabilities(&self) -> Vec<(String, SourceCapabilities)> {
        let mut caps: Vec<_> = self.sources.iter().map(|(n, s)| (n.clone(), s.capabilities())).collect();
        caps.sort_by(|a, b| a.0.cmp(&b.0));
        caps
    }

    pub fn len(&self) -> usize { self.sources.len() }
    pub fn is_empty(&self) -> bool { self.sources.is_empty() }
}

/// Resolve every episode of `playlist` with at most `concurrency` requests
/// in flight. Results line up with `playlist.episodes`.
pub async fn resolve_playlist(source: &dyn Source, playlist: &Playlist, concurrency: usize) -> Vec<Option<ResolvedVideo>> {
    stream::iter(playlist.episodes.iter())
        .map(|ep| source.scrape_video(&ep.url))
        .buffered(concurrency.max(1))
        .collect()
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Episode, StreamKind};
    use std::collections::BTreeMap;
    use std::time::Duration;

    struct StubSource;

    #[async_trait]
    impl Source for StubSource {
        fn name(&self) -> &str { "Stub" }

        fn capabilities(&self) -> SourceCapabilities {
            SourceCapabilities { catalog: true, detail: true, video: true, ..Default::default() }
        }

        async fn scrape_catalog(&self, _page: u32, _category: Option<&str>, _year: Option<&str>) -> Vec<CatalogItem> {
            Vec::new()
        }

        async fn scrape_detail(&self, _source_id: &str) -> DetailBundle { DetailBundle::empty() }

        async fn scrape_video(&self, play_url: &str) -> Option<ResolvedVideo> {
            let n: u64 = play_url.trim_start_matches("ep").parse().ok()?;
            // Later episodes finish first; output order must not follow completion order.
            tokio::time::sleep(Duration::from_millis(30u64.saturating_sub(n * 10))).await;
            Some(ResolvedVideo { url: format!("https://cdn/{n}.m3u8"), kind: StreamKind::Native, headers: BTreeMap::new() })
        }
    }

    #[test]
    fn unknown_name_is_none() {
        let mut registry = SourceRegistry::new();
        assert!(registry.get("Nope").is_none());
        registry.register(StubSource);
        assert!(registry.get("Nope").is_none());
        assert_eq!(registry.get("Stub").unwrap().name(), "Stub");
    }

    #[test]
    fn register_replaces_same_name() {
        let mut registry = SourceRegistry::new();
        assert!(registry.register(StubSource).is_none());
        assert!(registry.register(StubSource).is_some());
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn home_defaults_to_empty_when_unsupported() {
        let source = StubSource;
        assert!(!source.capabilities().home);
        assert!(source.scrape_home().await.is_empty());
        assert!(source.categories().is_empty());
    }

    #[test]
    fn defaults_register_builtin_sources() {
        let registry = SourceRegistry::with_defaults(&EngineConfig::default()).unwrap();
        assert_eq!(registry.names(), vec!["Age".to_string(), "Yhmc".to_string()]);
        let caps: HashMap<_, _> = registry.capabilities().into_iter().collect();
        assert!(!caps["Age"].home);
        assert!(caps["Yhmc"].home);
        assert!(caps["Yhmc"].category_filter && caps["Yhmc"].year_filter);
    }

    #[tokio::test]
    async fn playlist_resolution_keeps_episode_order() {
        let playlist = Playlist {
            source_name: "line".into(),
            episodes: ["ep0", "ep1", "bad", "ep2"]
                .iter()
                .map(|u| Episode { name: u.to_string(), url: u.to_string() })
                .collect(),
        };
        let out = resolve_playlist(&StubSource, &playlist, 4).await;
        assert_eq!(out.len(), 4);
        assert_eq!(out[0].as_ref().unwrap().url, "https://cdn/0.m3u8");
        assert_eq!(out[1].as_ref().unwrap().url, "https://cdn/1.m3u8");
        assert!(out[2].is_none());
        assert_eq!(out[3].as_ref().unwrap().url, "https://cdn/2.m3u8");
    }
}
