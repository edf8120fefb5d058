//! agedm.io: catalog cards with "Label：Value" info lines, bootstrap tab
//! panes for mirrors, and play pages that carry the stream in a `Vurl`
//! script variable or an iframe.

use anyhow::{Context, Result};
use async_trait::async_trait;
use scraper::{Html, Selector};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::EngineConfig;
use crate::decode::{classify_stream, normalize_protocol, percent_decode, script_capture};
use crate::error::ScrapeError;
use crate::parse::{
    absolutize, first_text, lazy_image, lazy_regex, selector, split_label, text_of, text_without, Field,
    LabelRule, LabelledFields, Transform,
};
use crate::sources::{Fetch, HttpFetcher, Source, SourceCapabilities};
use crate::types::{CatalogItem, DetailBundle, DetailMetadata, Episode, Playlist, ResolvedVideo, UNKNOWN};

pub const NAME: &str = "Age";
pub const BASE_URL: &str = "https://www.agedm.io";
const TIMEOUT_MS: u64 = 10_000;

const DEFAULT_KIND: &str = "动漫";
const COVER_ATTRS: &[&str] = &["data-original", "data-src"];

const LABEL_RULES: &[LabelRule] = &[
    LabelRule::new("动画种类", Field::Kind, Transform::Text),
    LabelRule::new("播放状态", Field::Status, Transform::Text),
    LabelRule::new("首播时间", Field::Year, Transform::UntilHyphen),
    LabelRule::new("制作公司", Field::Studio, Transform::Text),
    LabelRule::new("剧情类型", Field::Tags, Transform::Words),
];

pub struct AgeSource {
    base_url: String,
    base: Url,
    fetcher: Arc<dyn Fetch>,
}

impl AgeSource {
    pub fn new(base_url: &str, fetcher: Arc<dyn Fetch>) -> Result<Self> {
        let base_url = base_url.trim_end_matches('/').to_string();
        let base = Url::parse(&base_url).with_context(|| format!("invalid base URL for {NAME}: {base_url}"))?;
        Ok(Self { base_url, base, fetcher })
    }

    pub fn from_config(cfg: &EngineConfig) -> Result<Self> {
        let overrides = cfg.source(NAME);
        let fetcher = HttpFetcher::new(NAME, cfg.user_agent(), cfg.timeout_for(NAME, TIMEOUT_MS), cfg.slow_warn())?;
        Self::new(overrides.base_url.as_deref().unwrap_or(BASE_URL), Arc::new(fetcher))
    }

    fn catalog_url(&self, page: u32) -> String {
        format!("{}/catalog/all-all-all-all-all-time-{}", self.base_url, page.max(1))
    }

    fn detail_url(&self, source_id: &str) -> String {
        format!("{}/detail/{}", self.base_url, source_id.trim())
    }
}

/// Catalog cards in page order. Cards without a detail id, title or cover
/// are dropped.
pub fn parse_catalog(html: &str, base: &Url) -> Vec<CatalogItem> {
    let doc = Html::parse_document(html);
    let mut items = Vec::new();
    for card in doc.select(selector!(".cata_video_item")) {
        let link = card.select(selector!("h5.card-title a")).next();
        let href = link.and_then(|a| a.value().attr("href")).unwrap_or_default();
        let Some(source_id) = lazy_regex!(r"/detail/(\d+)").captures(href).and_then(|c| c.get(1)) else {
            debug!(source = NAME, href, "skipping card without detail id");
            continue;
        };
        let title = link.map(text_of).unwrap_or_default();
        let cover = card
            .select(selector!("img.video_thumbs"))
            .next()
            .and_then(|img| lazy_image(img, COVER_ATTRS))
            .map(|c| absolutize(base, &c))
            .unwrap_or_default();
        let Some(mut item) = CatalogItem::new(source_id.as_str(), title, cover) else {
            debug!(source = NAME, id = source_id.as_str(), "skipping card without title or cover");
            continue;
        };

        let mut fields = LabelledFields::default();
        for info in card.select(selector!(".video_detail_info")) {
            if info.value().classes().any(|c| c == "desc") {
                item.description = text_without(info, "span");
            } else {
                fields.apply_text(LABEL_RULES, &text_of(info));
            }
        }
        item.kind = fields.kind.unwrap_or_else(|| DEFAULT_KIND.to_string());
        item.status = fields.status.unwrap_or_else(|| UNKNOWN.to_string());
        item.year = fields.year.unwrap_or_default();
        item.studio = fields.studio.unwrap_or_default();
        item.tags = fields.tags.unwrap_or_default();
        items.push(item);
    }
    items
}

/// Mirror tabs point at their pane through `data-bs-target`.
pub fn parse_detail(html: &str) -> DetailBundle {
    let doc = Html::parse_document(html);

    let mut playlists = Vec::new();
    for tab in doc.select(selector!(".nav-pills button")) {
        let source_name = text_of(tab).replace("VIP", "").trim().to_string();
        let Some(target) = tab.value().attr("data-bs-target").map(str::trim).filter(|t| !t.is_empty()) else {
            continue;
        };
        let Ok(pane_sel) = Selector::parse(target) else {
            debug!(source = NAME, target, "unusable pane selector");
            continue;
        };
        let Some(pane) = doc.select(&pane_sel).next() else { continue };
        let episodes: Vec<Episode> = pane
            .select(selector!("ul.video_detail_episode li a"))
            .filter_map(|a| {
                let href = a.value().attr("href").map(str::trim).filter(|h| !h.is_empty())?;
                Some(Episode { name: text_of(a), url: href.to_string() })
            })
            .collect();
        if !episodes.is_empty() {
            playlists.push(Playlist { source_name, episodes });
        }
    }

    let mut metadata = DetailMetadata::default();
    metadata.description = doc
        .select(selector!(".video_detail_desc"))
        .next()
        .map(|d| text_of(d).replace("简介：", "").trim().to_string())
        .unwrap_or_default();

    let mut fields = LabelledFields::default();
    for li in doc.select(selector!(".detail_imform_list li")) {
        let text = text_of(li);
        let (label, inline_value) = split_label(&text).unwrap_or((text.as_str(), ""));
        let value = first_text(li, selector!(".detail_imform_value"));
        fields.apply(LABEL_RULES, label, if value.is_empty() { inline_value } else { value.as_str() });
    }
    if let Some(year) = fields.year { metadata.year = year; }
    if let Some(status) = fields.status { metadata.status = status; }
    metadata.tags = fields.tags.unwrap_or_default();
    metadata.category = fields.kind;

    DetailBundle { playlists, metadata }
}

/// Addresses with a scheme other than http(s) (`about:blank`,
/// `javascript:`) are placeholders, not streams.
fn reject_placeholder(address: String) -> Result<String, ScrapeError> {
    match Url::parse(&address) {
        Ok(u) if !matches!(u.scheme(), "http" | "https") => {
            Err(ScrapeError::Unrecognized(format!("{} address", u.scheme())))
        }
        _ => Ok(address),
    }
}

/// Raw stream address on a play page: the `Vurl` variable, else the player
/// iframe, else the first iframe.
pub fn extract_stream(html: &str) -> Result<String, ScrapeError> {
    if let Some(raw) = script_capture(html, lazy_regex!(r#"var\s+Vurl\s*=\s*['"](.*?)['"]"#)) {
        let decoded = percent_decode(raw)?;
        if !decoded.trim().is_empty() {
            return reject_placeholder(normalize_protocol(&decoded));
        }
    }
    let doc = Html::parse_document(html);
    [selector!("iframe#iframe_player"), selector!("iframe")]
        .into_iter()
        .find_map(|sel| {
            doc.select(sel)
                .next()
                .and_then(|f| f.value().attr("src"))
                .map(str::trim)
                .filter(|s| !s.is_empty())
        })
        .map(normalize_protocol)
        .ok_or(ScrapeError::MissingElement("Vurl variable or player iframe"))
        .and_then(reject_placeholder)
}

/// Classify the play page's stream. The play page itself is the referrer
/// the stream host checks.
pub fn resolve_stream(html: &str, play_page_url: &str) -> Result<ResolvedVideo, ScrapeError> {
    let (url, kind) = classify_stream(&extract_stream(html)?);
    let headers = BTreeMap::from([("Referer".to_string(), play_page_url.to_string())]);
    Ok(ResolvedVideo { url, kind, headers })
}

#[async_trait]
impl Source for AgeSource {
    fn name(&self) -> &str { NAME }

    fn capabilities(&self) -> SourceCapabilities {
        SourceCapabilities { catalog: true, detail: true, video: true, ..Default::default() }
    }

    async fn scrape_catalog(&self, page: u32, category: Option<&str>, year: Option<&str>) -> Vec<CatalogItem> {
        if category.is_some() || year.is_some() {
            debug!(source = NAME, ?category, ?year, "catalog filters not supported; using full listing");
        }
        let url = self.catalog_url(page);
        info!(source = NAME, %url, page, "scraping catalog");
        match self.fetcher.get_text(&url, &self.base_url).await {
            Ok(html) => {
                let items = parse_catalog(&html, &self.base);
                info!(source = NAME, page, count = items.len(), "catalog page parsed");
                items
            }
            Err(e) => {
                warn!(source = NAME, %url, error = %e, "catalog page failed");
                Vec::new()
            }
        }
    }

    async fn scrape_detail(&self, source_id: &str) -> DetailBundle {
        let url = self.detail_url(source_id);
        info!(source = NAME, %url, "scraping detail");
        match self.fetcher.get_text(&url, &self.base_url).await {
            Ok(html) => parse_detail(&html),
            Err(e) => {
                warn!(source = NAME, %url, error = %e, "detail page failed");
                DetailBundle::empty()
            }
        }
    }

    async fn scrape_video(&self, play_url: &str) -> Option<ResolvedVideo> {
        let target = absolutize(&self.base, play_url);
        if target.is_empty() { return None; }
        info!(source = NAME, url = %target, "resolving stream");
        let resolved = match self.fetcher.get_text(&target, &self.base_url).await {
            Ok(html) => resolve_stream(&html, &target),
            Err(e) => Err(e),
        };
        match resolved {
            Ok(video) => {
                info!(source = NAME, url = %target, kind = ?video.kind, "stream resolved");
                Some(video)
            }
            Err(e) => {
                warn!(source = NAME, url = %target, error = %e, "stream resolution failed");
                None
            }
        }
    }
}
