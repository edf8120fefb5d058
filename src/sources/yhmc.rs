//! yhmc.cc: numeric category/year filters in the catalog path, a sectioned
//! home page, and play pages whose stream hides in an obfuscated
//! `temLineList` script array.

use anyhow::{Context, Result};
use async_trait::async_trait;
use scraper::{ElementRef, Html};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::{EngineConfig, DEFAULT_TIMEOUT_MS};
use crate::decode::{decode_line_file, parse_line_list, pick_line, script_capture, trailing_numeric_id};
use crate::error::ScrapeError;
use crate::parse::{absolutize, first_attr, first_text, lazy_image, lazy_regex, selector, text_of};
use crate::sources::{Fetch, HttpFetcher, Source, SourceCapabilities};
use crate::types::{
    CatalogItem, DetailBundle, DetailMetadata, Episode, HomePage, HomeSection, Playlist, ResolvedVideo, StreamKind,
};

pub const NAME: &str = "Yhmc";
pub const BASE_URL: &str = "https://www.yhmc.cc";
pub const DEFAULT_STREAM_PREFIX_LEN: usize = 3;

const LINE_LIST_VAR: &str = "temLineList";
const COVER_ATTRS: &[&str] = &["data-src"];

/// Catalog category labels and the ids the site uses in its listing path.
/// The first entry is the default listing.
const CATEGORIES: &[(&str, &str)] = &[
    ("日韩动漫", "229"),
    ("国产动漫", "228"),
    ("欧美动漫", "231"),
    ("港台动漫", "230"),
    ("动画片", "272"),
    ("电影", "77"),
    ("电视剧", "78"),
    ("综艺", "79"),
    ("短剧", "233"),
    ("有声动漫", "232"),
];

const YEARS: &[(&str, &str)] = &[
    ("2026", "40"),
    ("2025", "30"),
    ("2024", "31"),
    ("2023", "32"),
    ("2022", "33"),
    ("2021", "34"),
    ("2020", "35"),
    ("10年代", "36"),
    ("00年代", "37"),
    ("老片", "38"),
];
const ALL_YEARS: &str = "0";

const CAROUSEL_TITLE: &str = "轮播推荐";
const CAROUSEL_STATUS: &str = "热播中";
const SECTION_STATUS: &str = "更新中";
const NOW_SHOWING: &str = "正在热映";

fn lookup<'a>(table: &'a [(&'a str, &'a str)], label: Option<&str>) -> Option<&'a (&'a str, &'a str)> {
    let label = label?.trim();
    table.iter().find(|(l, _)| *l == label)
}

/// `(label, id)` for a requested category; unknown or absent labels map
/// to the default listing.
fn resolve_category(label: Option<&str>) -> (&'static str, &'static str) {
    lookup(CATEGORIES, label).copied().unwrap_or(CATEGORIES[0])
}

fn resolve_year(label: Option<&str>) -> Option<(&'static str, &'static str)> {
    lookup(YEARS, label).copied()
}

pub struct YhmcSource {
    base_url: String,
    base: Url,
    user_agent: String,
    stream_prefix_len: usize,
    fetcher: Arc<dyn Fetch>,
}

impl YhmcSource {
    pub fn new(base_url: &str, user_agent: &str, stream_prefix_len: usize, fetcher: Arc<dyn Fetch>) -> Result<Self> {
        let base_url = base_url.trim_end_matches('/').to_string();
        let base = Url::parse(&base_url).with_context(|| format!("invalid base URL for {NAME}: {base_url}"))?;
        Ok(Self { base_url, base, user_agent: user_agent.to_string(), stream_prefix_len, fetcher })
    }

    pub fn from_config(cfg: &EngineConfig) -> Result<Self> {
        let overrides = cfg.source(NAME);
        let fetcher =
            HttpFetcher::new(NAME, cfg.user_agent(), cfg.timeout_for(NAME, DEFAULT_TIMEOUT_MS), cfg.slow_warn())?;
        Self::new(
            overrides.base_url.as_deref().unwrap_or(BASE_URL),
            cfg.user_agent(),
            overrides.stream_prefix_len.unwrap_or(DEFAULT_STREAM_PREFIX_LEN),
            Arc::new(fetcher),
        )
    }

    fn referer(&self) -> String {
        format!("{}/", self.base_url)
    }

    fn catalog_url(&self, page: u32, category_id: &str, year_id: &str) -> String {
        format!("{}/vod/{}/{}/0/{}/0/0/0/0", self.base_url, page.max(1), category_id, year_id)
    }

    fn stream_headers(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            ("User-Agent".to_string(), self.user_agent.clone()),
            ("Origin".to_string(), self.base_url.clone()),
            ("Referer".to_string(), self.base_url.clone()),
        ])
    }

    /// Pattern B: pick the line matching the play page's trailing id and
    /// de-obfuscate its `file`.
    pub fn resolve_stream(&self, html: &str, play_url: &str) -> Result<ResolvedVideo, ScrapeError> {
        let json = script_capture(html, lazy_regex!(r"(?s)var\s+temLineList\s*=\s*(\[.*?\]);"))
            .ok_or(ScrapeError::MissingScript(LINE_LIST_VAR))?;
        let lines = parse_line_list(json)?;
        let wanted = trailing_numeric_id(play_url);
        let line = pick_line(&lines, wanted).ok_or(ScrapeError::MissingElement("line list entry"))?;
        if wanted.is_some() && line.numeric_id() != wanted {
            debug!(source = NAME, ?wanted, "no line matches play id; using first line");
        }
        let file = line
            .file
            .as_deref()
            .filter(|f| !f.trim().is_empty())
            .ok_or(ScrapeError::MissingElement("line file"))?;
        let url = decode_line_file(file.trim(), self.stream_prefix_len)?;
        Ok(ResolvedVideo { url, kind: StreamKind::Native, headers: self.stream_headers() })
    }
}

/// One `.public-list-box` card. Status falls back to `default_status`
/// when the card has none.
fn parse_card(card: ElementRef<'_>, base: &Url, kind: &str, default_status: &str) -> Option<CatalogItem> {
    let href = first_attr(card, selector!(".public-list-exp"), "href").unwrap_or_default();
    let source_id = lazy_regex!(r"/v/(.+)").captures(&href).and_then(|c| c.get(1))?.as_str().trim_end_matches('/');
    let cover = card
        .select(selector!("img.gen-movie-img"))
        .next()
        .and_then(|img| lazy_image(img, COVER_ATTRS))
        .map(|c| absolutize(base, &c))
        .unwrap_or_default();
    let Some(mut item) = CatalogItem::new(source_id, first_text(card, selector!(".time-title")), cover) else {
        debug!(source = NAME, href = %href, "skipping incomplete card");
        return None;
    };
    let status = first_text(card, selector!(".public-list-prb"));
    item.status = if status.is_empty() { default_status.to_string() } else { status };
    item.description = first_text(card, selector!(".public-list-subtitle"));
    item.kind = kind.to_string();
    Some(item)
}

pub fn parse_catalog(html: &str, base: &Url, kind: &str, year: &str) -> Vec<CatalogItem> {
    let doc = Html::parse_document(html);
    doc.select(selector!(".public-list-box"))
        .filter_map(|card| parse_card(card, base, kind, ""))
        .map(|mut item| {
            item.year = year.to_string();
            item
        })
        .collect()
}

fn carousel_id(href: &str) -> Option<String> {
    let caps = lazy_regex!(r"/([vp])/(.+)").captures(href)?;
    let rest = caps.get(2)?.as_str();
    if &caps[1] == "p" {
        let parts: Vec<&str> = rest.split('/').collect();
        if parts.len() >= 3 {
            return Some(format!("{}/{}", parts[0], parts[1]));
        }
    }
    Some(rest.to_string())
}

fn parse_carousel(doc: &Html, base: &Url) -> Vec<CatalogItem> {
    let mut items = Vec::new();
    for slide in doc.select(selector!(".slide-time-list .swiper-slide")) {
        let href = first_attr(slide, selector!("a"), "href").unwrap_or_default();
        let Some(source_id) = carousel_id(&href) else { continue };

        let styled = first_attr(slide, selector!(".slide-time-img3"), "style")
            .and_then(|style| {
                lazy_regex!(r"url\((.*?)\)")
                    .captures(&style)
                    .and_then(|c| c.get(1))
                    .map(|m| m.as_str().trim_matches(&['\'', '"', ' '][..]).to_string())
            })
            .filter(|c| !c.is_empty());
        let cover = styled.or_else(|| first_attr(slide, selector!("img"), "src")).unwrap_or_default();

        let mut title = first_text(slide, selector!(".slide-info-title"));
        if title.is_empty() {
            title = first_text(slide, selector!(".time-title"));
        }
        let Some(mut item) = CatalogItem::new(source_id, title, absolutize(base, &cover)) else { continue };
        item.status = slide
            .select(selector!(".slide-info-remarks"))
            .last()
            .map(text_of)
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| CAROUSEL_STATUS.to_string());
        item.kind = CAROUSEL_TITLE.to_string();
        items.push(item);
    }
    items
}

fn section_kind(title: &str) -> String {
    if title.contains(NOW_SHOWING) {
        return NOW_SHOWING.to_string();
    }
    title.replacen("最新", "", 1).replacen("热门", "", 1).trim().to_string()
}

/// Carousel first, then every titled `.box-width` block with at least one card.
pub fn parse_home(html: &str, base: &Url) -> HomePage {
    let doc = Html::parse_document(html);
    let mut sections = Vec::new();

    let carousel = parse_carousel(&doc, base);
    if !carousel.is_empty() {
        sections.push(HomeSection { title: CAROUSEL_TITLE.to_string(), items: carousel });
    }

    for block in doc.select(selector!(".box-width")) {
        let title = first_text(block, selector!(".title-h"));
        if title.is_empty() { continue; }
        let kind = section_kind(&title);
        let items: Vec<CatalogItem> = block
            .select(selector!(".public-list-box"))
            .filter_map(|card| parse_card(card, base, &kind, SECTION_STATUS))
            .collect();
        if !items.is_empty() {
            sections.push(HomeSection { title, items });
        }
    }
    HomePage::Sections { sections }
}

/// Tabs and panes pair up by position; unnamed tabs become `线路{n}`.
pub fn parse_detail(html: &str, base: &Url) -> DetailBundle {
    let doc = Html::parse_document(html);

    let tab_names: Vec<String> = doc.select(selector!(".anthology-tab .swiper-slide")).map(text_of).collect();
    let mut playlists = Vec::new();
    for (index, pane) in doc.select(selector!(".anthology-list .anthology-list-box")).enumerate() {
        let episodes: Vec<Episode> = pane
            .select(selector!("ul.playEpisodes li a"))
            .filter_map(|a| {
                let href = a.value().attr("href").map(str::trim).filter(|h| !h.is_empty())?;
                Some(Episode { name: text_of(a), url: absolutize(base, href) })
            })
            .collect();
        if episodes.is_empty() { continue; }
        let source_name = tab_names
            .get(index)
            .filter(|n| !n.is_empty())
            .cloned()
            .unwrap_or_else(|| format!("线路{}", index + 1));
        playlists.push(Playlist { source_name, episodes });
    }

    let mut metadata = DetailMetadata {
        description: doc.select(selector!("#height_limit")).next().map(text_of).unwrap_or_default(),
        cover_url: doc
            .select(selector!(".detail-pic img"))
            .next()
            .and_then(|img| lazy_image(img, COVER_ATTRS))
            .map(|c| absolutize(base, &c)),
        ..Default::default()
    };
    for span in doc.select(selector!(".deployment span")) {
        let text = text_of(span);
        if lazy_regex!(r"^\d{4}$").is_match(&text) {
            metadata.year = text;
        } else if span.value().classes().any(|c| c == "hl-ma0") && !text.is_empty() {
            metadata.category = Some(text);
        }
    }

    DetailBundle { playlists, metadata }
}

#[async_trait]
impl Source for YhmcSource {
    fn name(&self) -> &str { NAME }

    fn capabilities(&self) -> SourceCapabilities {
        SourceCapabilities { catalog: true, detail: true, video: true, home: true, category_filter: true, year_filter: true }
    }

    fn categories(&self) -> Vec<&'static str> {
        CATEGORIES.iter().map(|(label, _)| *label).collect()
    }

    fn years(&self) -> Vec<&'static str> {
        YEARS.iter().map(|(label, _)| *label).collect()
    }

    async fn scrape_catalog(&self, page: u32, category: Option<&str>, year: Option<&str>) -> Vec<CatalogItem> {
        let (kind, category_id) = resolve_category(category);
        let year = resolve_year(year);
        let url = self.catalog_url(page, category_id, year.map_or(ALL_YEARS, |(_, id)| id));
        info!(source = NAME, %url, page, category = kind, year = year.map(|(l, _)| l), "scraping catalog");
        match self.fetcher.get_text(&url, &self.referer()).await {
            Ok(html) => {
                let items = parse_catalog(&html, &self.base, kind, year.map_or("", |(label, _)| label));
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
        let url = format!("{}/v/{}", self.base_url, source_id.trim().trim_matches('/'));
        info!(source = NAME, %url, "scraping detail");
        match self.fetcher.get_text(&url, &self.referer()).await {
            Ok(html) => parse_detail(&html, &self.base),
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
        let resolved = match self.fetcher.get_text(&target, &self.referer()).await {
            Ok(html) => self.resolve_stream(&html, &target),
            Err(e) => Err(e),
        };
        match resolved {
            Ok(video) => {
                info!(source = NAME, url = %target, "stream decoded");
                Some(video)
            }
            Err(e) => {
                warn!(source = NAME, url = %target, error = %e, "stream resolution failed");
                None
            }
        }
    }

    async fn scrape_home(&self) -> HomePage {
        info!(source = NAME, url = %self.base_url, "scraping home");
        match self.fetcher.get_text(&self.base_url, &self.referer()).await {
            Ok(html) => parse_home(&html, &self.base),
            Err(e) => {
                warn!(source = NAME, error = %e, "home page failed");
                HomePage::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::fetch::fixture::FixtureFetcher;
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};

    const BASE: &str = "https://yhmc.test";

    fn base() -> Url { Url::parse(BASE).unwrap() }

    fn source(fetcher: FixtureFetcher) -> YhmcSource {
        YhmcSource::new(BASE, "test-agent", DEFAULT_STREAM_PREFIX_LEN, Arc::new(fetcher)).unwrap()
    }

    fn card(id: &str, title: &str, status: &str) -> String {
        format!(r#"
        <div class="public-list-box">
            <a class="public-list-exp" href="/v/{id}">
                <img class="gen-movie-img" src="/static/load.gif" data-src="//img.test/{id}.jpg">
                <span class="public-list-prb">{status}</span>
            </a>
            <a class="time-title" href="/v/{id}">{title}</a>
            <div class="public-list-subtitle">sub {title}</div>
        </div>"#)
    }

    fn obfuscate(url: &str) -> String {
        format!("JT3{}", STANDARD.encode(utf8_percent_encode(url, NON_ALPHANUMERIC).to_string()))
    }

    fn play_page(lines: &[(u64, &str)]) -> String {
        let entries: Vec<String> = lines
            .iter()
            .map(|(id, url)| format!(r#"{{"id":{id},"name":"ep","file":"{}"}}"#, obfuscate(url)))
            .collect();
        format!("<html><script>var player = {{}};\nvar temLineList = [{}];\n</script></html>", entries.join(","))
    }

    #[test]
    fn filter_labels_resolve_with_fallbacks() {
        assert_eq!(resolve_category(None), ("日韩动漫", "229"));
        assert_eq!(resolve_category(Some("电影")), ("电影", "77"));
        assert_eq!(resolve_category(Some("不存在")), ("日韩动漫", "229"));
        assert_eq!(resolve_year(Some("2025")), Some(("2025", "30")));
        assert_eq!(resolve_year(Some("1999")), None);
    }

    #[tokio::test]
    async fn catalog_url_reflects_filters() {
        let fetcher = Arc::new(FixtureFetcher::default());
        let src = YhmcSource::new(BASE, "ua", 3, fetcher.clone()).unwrap();
        src.scrape_catalog(2, Some("国产动漫"), Some("2024")).await;
        src.scrape_catalog(1, Some("未知分类"), Some("1999")).await;
        src.scrape_catalog(1, None, None).await;
        let urls: Vec<String> = fetcher.requested().into_iter().map(|(u, _)| u).collect();
        assert_eq!(urls, vec![
            "https://yhmc.test/vod/2/228/0/31/0/0/0/0",
            "https://yhmc.test/vod/1/229/0/0/0/0/0/0",
            "https://yhmc.test/vod/1/229/0/0/0/0/0/0",
        ]);
        assert!(fetcher.requested().iter().all(|(_, referer)| referer == "https://yhmc.test/"));
    }

    #[tokio::test]
    async fn catalog_items_carry_filter_labels() {
        let page = format!("<html>{}{}</html>", card("123/abc", "Alpha", "更新至05集"), card("456", "Beta", ""));
        let fetcher = FixtureFetcher::default().with_page("https://yhmc.test/vod/1/77/0/30/0/0/0/0", page);
        let items = source(fetcher).scrape_catalog(1, Some("电影"), Some("2025")).await;
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].source_id, "123/abc");
        assert_eq!(items[0].cover_url, "https://img.test/123/abc.jpg");
        assert_eq!(items[0].status, "更新至05集");
        assert_eq!(items[0].description, "sub Alpha");
        assert_eq!(items[0].kind, "电影");
        assert_eq!(items[0].year, "2025");
        assert_eq!(items[1].status, "");
    }

    #[test]
    fn catalog_skips_cards_without_link() {
        let html = format!(r#"{}<div class="public-list-box"><a class="public-list-exp" href="/label/x">x</a></div>"#,
            card("9", "Nine", "HD"));
        let items = parse_catalog(&html, &base(), "日韩动漫", "");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].year, "");
    }

    const HOME: &str = r#"
    <html><body>
      <div class="slide-time-list">
        <div class="swiper-slide">
          <a href="/p/77/1/22247079"><div class="slide-time-img3" style="background-image: url('//img.test/s1.jpg')"></div></a>
          <div class="slide-info-title">Slide One</div>
          <span class="slide-info-remarks">2025</span><span class="slide-info-remarks">更新至12集</span>
        </div>
        <div class="swiper-slide">
          <a href="/v/88"><img src="/s2.jpg"></a>
          <div class="time-title">Slide Two</div>
        </div>
        <div class="swiper-slide"><a href="/topic/1">ad</a></div>
      </div>
      <div class="box-width">
        <h4 class="title-h">最新日韩动漫</h4>
        CARDS_A
      </div>
      <div class="box-width">
        <h4 class="title-h">正在热映 电影</h4>
        CARDS_B
      </div>
      <div class="box-width"><h4 class="title-h">空</h4></div>
      <div class="box-width">CARDS_C</div>
    </body></html>"#;

    fn home_html() -> String {
        HOME.replace("CARDS_A", &card("1", "A1", "第3集"))
            .replace("CARDS_B", &card("2", "B1", ""))
            .replace("CARDS_C", &card("3", "C1", ""))
    }

    #[test]
    fn home_sections_in_page_order() {
        let sections = parse_home(&home_html(), &base()).into_sections();
        let titles: Vec<&str> = sections.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["轮播推荐", "最新日韩动漫", "正在热映 电影"]);

        let carousel = &sections[0].items;
        assert_eq!(carousel.len(), 2);
        assert_eq!(carousel[0].source_id, "77/1");
        assert_eq!(carousel[0].cover_url, "https://img.test/s1.jpg");
        assert_eq!(carousel[0].status, "更新至12集");
        assert_eq!(carousel[0].kind, "轮播推荐");
        assert_eq!(carousel[1].source_id, "88");
        assert_eq!(carousel[1].title, "Slide Two");
        assert_eq!(carousel[1].cover_url, "https://yhmc.test/s2.jpg");
        assert_eq!(carousel[1].status, "热播中");

        assert_eq!(sections[1].items[0].kind, "日韩动漫");
        assert_eq!(sections[1].items[0].status, "第3集");
        assert_eq!(sections[2].items[0].kind, "正在热映");
        assert_eq!(sections[2].items[0].status, "更新中");
    }

    #[tokio::test]
    async fn home_failure_is_empty() {
        let page = source(FixtureFetcher::default()).scrape_home().await;
        assert!(page.is_empty());
        assert!(page.into_sections().is_empty());
    }

    const DETAIL: &str = r#"
    <html><body>
      <div class="detail-pic"><img data-src="//img.test/cover.jpg"></div>
      <div class="deployment"><span>2024</span><span class="hl-ma0">日本动漫</span><span>日语</span></div>
      <div id="height_limit"> A synopsis. </div>
      <div class="anthology-tab"><a class="swiper-slide">线路A</a><a class="swiper-slide"> </a><a class="swiper-slide">线路C</a></div>
      <div class="anthology-list">
        <div class="anthology-list-box"><ul class="playEpisodes">
          <li><a href="/p/1/1/100">第01集</a></li><li><a href="https://mirror.test/p/1/1/101">第02集</a></li>
        </ul></div>
        <div class="anthology-list-box"><ul class="playEpisodes"><li><a href="/p/1/2/200">第01集</a></li></ul></div>
        <div class="anthology-list-box"><ul class="playEpisodes"></ul></div>
      </div>
    </body></html>"#;

    #[test]
    fn detail_pairs_tabs_with_panes() {
        let bundle = parse_detail(DETAIL, &base());
        assert_eq!(bundle.playlists.len(), 2);
        assert_eq!(bundle.playlists[0].source_name, "线路A");
        assert_eq!(bundle.playlists[0].episodes[0].url, "https://yhmc.test/p/1/1/100");
        assert_eq!(bundle.playlists[0].episodes[1].url, "https://mirror.test/p/1/1/101");
        assert_eq!(bundle.playlists[1].source_name, "线路2");

        let meta = bundle.metadata;
        assert_eq!(meta.year, "2024");
        assert_eq!(meta.category.as_deref(), Some("日本动漫"));
        assert_eq!(meta.description, "A synopsis.");
        assert_eq!(meta.cover_url.as_deref(), Some("https://img.test/cover.jpg"));
        assert_eq!(meta.status, crate::types::UNKNOWN);
    }

    #[tokio::test]
    async fn detail_requests_title_page() {
        let fetcher = Arc::new(FixtureFetcher::default().with_page("https://yhmc.test/v/123/abc", DETAIL));
        let src = YhmcSource::new(BASE, "ua", 3, fetcher.clone()).unwrap();
        assert_eq!(src.scrape_detail("123/abc").await.playlists.len(), 2);
        assert_eq!(src.scrape_detail("missing").await, DetailBundle::empty());
    }

    #[tokio::test]
    async fn video_matches_line_by_play_id() {
        let page = play_page(&[(22247078, "https://cdn.test/a.m3u8"), (22247079, "https://cdn.test/b.m3u8")]);
        let fetcher = FixtureFetcher::default().with_page("https://yhmc.test/p/1/1/22247079", page);
        let video = source(fetcher).scrape_video("/p/1/1/22247079").await.unwrap();
        assert_eq!(video.url, "https://cdn.test/b.m3u8");
        assert_eq!(video.kind, StreamKind::Native);
        assert_eq!(video.headers["User-Agent"], "test-agent");
        assert_eq!(video.headers["Origin"], BASE);
        assert_eq!(video.headers["Referer"], BASE);
    }

    #[test]
    fn video_falls_back_to_first_line() {
        let src = source(FixtureFetcher::default());
        let page = play_page(&[(1, "https://cdn.test/first.mp4"), (2, "https://cdn.test/second.mp4")]);
        let video = src.resolve_stream(&page, "https://yhmc.test/p/1/1/999").unwrap();
        assert_eq!(video.url, "https://cdn.test/first.mp4");
        let video = src.resolve_stream(&page, "https://yhmc.test/p/1/1/abc").unwrap();
        assert_eq!(video.url, "https://cdn.test/first.mp4");
    }

    #[test]
    fn video_failures() {
        let src = source(FixtureFetcher::default());
        let url = "https://yhmc.test/p/1/1/5";
        assert!(matches!(src.resolve_stream("<html></html>", url), Err(ScrapeError::MissingScript(_))));
        assert!(matches!(
            src.resolve_stream("<script>var temLineList = [];</script>", url),
            Err(ScrapeError::MissingElement(_))
        ));
        assert!(src.resolve_stream(r#"<script>var temLineList = [{"id":5}];</script>"#, url).is_err());
        assert!(src.resolve_stream(r#"<script>var temLineList = [{"id":5,"file":"JT3%%%"}];</script>"#, url).is_err());
        assert!(src.resolve_stream("<script>var temLineList = [{oops}];</script>", url).is_err());
    }

    #[test]
    fn prefix_length_is_configurable() {
        let src = YhmcSource::new(BASE, "ua", 5, Arc::new(FixtureFetcher::default())).unwrap();
        let file = format!("ABCDE{}", STANDARD.encode("https%3A%2F%2Fcdn.test%2Fc.m3u8"));
        let page = format!(r#"<script>var temLineList = [{{"id":7,"file":"{file}"}}];</script>"#);
        assert_eq!(src.resolve_stream(&page, "https://yhmc.test/p/1/1/7").unwrap().url, "https://cdn.test/c.m3u8");
    }

    #[tokio::test]
    async fn video_fetch_failure_is_none() {
        assert!(source(FixtureFetcher::default()).scrape_video("https://yhmc.test/p/1/1/1").await.is_none());
    }

    #[test]
    fn capabilities_and_labels() {
        let src = source(FixtureFetcher::default());
        assert!(src.capabilities().home);
        assert_eq!(src.categories().len(), 10);
        assert_eq!(src.categories()[0], "日韩动漫");
        assert_eq!(src.years().last(), Some(&"老片"));
    }
}
