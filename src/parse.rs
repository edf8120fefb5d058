//! Markup helpers shared by the concrete sources.
//!
//! Everything here is synchronous and side-effect free so it can be fed
//! fixture markup directly.

use scraper::{ElementRef, Node, Selector};
use url::Url;

/// A CSS selector compiled once on first use.
macro_rules! selector {
    ($css:literal) => {{
        static SELECTOR: std::sync::LazyLock<::scraper::Selector> = std::sync::LazyLock::new(|| {
            ::scraper::Selector::parse($css).expect(concat!("invalid selector: ", $css))
        });
        &*SELECTOR
    }};
}
pub(crate) use selector;

/// A regex compiled once on first use.
macro_rules! lazy_regex {
    ($re:literal) => {{
        static REGEX: std::sync::LazyLock<::regex::Regex> = std::sync::LazyLock::new(|| {
            ::regex::Regex::new($re).expect(concat!("invalid regex: ", $re))
        });
        &*REGEX
    }};
}
pub(crate) use lazy_regex;

pub fn text_of(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// Trimmed text of the first match under `scope`, or empty.
pub fn first_text(scope: ElementRef<'_>, sel: &Selector) -> String {
    scope.select(sel).next().map(text_of).unwrap_or_default()
}

pub fn first_attr(scope: ElementRef<'_>, sel: &Selector, attr: &str) -> Option<String> {
    scope
        .select(sel)
        .next()
        .and_then(|el| el.value().attr(attr))
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Image address, preferring the lazy-load attributes over the eager `src`
/// (which is often a placeholder).
pub fn lazy_image(img: ElementRef<'_>, lazy_attrs: &[&str]) -> Option<String> {
    lazy_attrs
        .iter()
        .chain(std::iter::once(&"src"))
        .filter_map(|a| img.value().attr(a))
        .map(str::trim)
        .find(|v| !v.is_empty())
        .map(str::to_string)
}

/// Text of `el` without the text of any `skip` child element.
pub fn text_without(el: ElementRef<'_>, skip: &str) -> String {
    fn walk(el: ElementRef<'_>, skip: &str, out: &mut String) {
        for child in el.children() {
            match child.value() {
                Node::Text(t) => out.push_str(t),
                Node::Element(e) if e.name() != skip => {
                    if let Some(child_el) = ElementRef::wrap(child) { walk(child_el, skip, out); }
                }
                _ => {}
            }
        }
    }
    let mut out = String::new();
    walk(el, skip, &mut out);
    out.trim().to_string()
}

/// Make `raw` absolute: protocol-relative becomes https, site-relative is
/// joined onto `base`. Blank input stays blank.
pub fn absolutize(base: &Url, raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() { return String::new(); }
    if let Some(rest) = raw.strip_prefix("//") { return format!("https://{rest}"); }
    if raw.starts_with("http://") || raw.starts_with("https://") { return raw.to_string(); }
    base.join(raw).map(|u| u.to_string()).unwrap_or_else(|_| raw.to_string())
}

/// Split "Label：Value" on the first ASCII or full-width colon.
pub fn split_label(text: &str) -> Option<(&str, &str)> {
    let idx = text.find(&[':', '：'][..])?;
    let sep_len = text[idx..].chars().next().map_or(1, char::len_utf8);
    Some((text[..idx].trim(), text[idx + sep_len..].trim()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Kind,
    Status,
    Studio,
    Year,
    Tags,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    /// Trimmed value as-is.
    Text,
    /// Everything before the first `-` ("2024-01-05" -> "2024").
    UntilHyphen,
    /// Whitespace separated words.
    Words,
}

/// One row of a source's label table: when `keyword` occurs in a label,
/// the value is transformed and written to `field`.
#[derive(Debug, Clone, Copy)]
pub struct LabelRule {
    pub keyword: &'static str,
    pub field: Field,
    pub transform: Transform,
}

impl LabelRule {
    pub const fn new(keyword: &'static str, field: Field, transform: Transform) -> Self {
        Self { keyword, field, transform }
    }
}

/// Fields filled in by a rule table. Unmatched labels leave them `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelledFields {
    pub kind: Option<String>,
    pub status: Option<String>,
    pub studio: Option<String>,
    pub year: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl LabelledFields {
    /// Evaluate `rules` in order against one label/value pair; the first
    /// matching rule wins. Returns whether a field was written.
    ///
    /// `Words` output aimed at a text field is joined with single spaces;
    /// `Text` output aimed at `tags` becomes a single tag.
    pub fn apply(&mut self, rules: &[LabelRule], label: &str, value: &str) -> bool {
        let Some(rule) = rules.iter().find(|r| label.contains(r.keyword)) else { return false };
        let words: Vec<String> = match rule.transform {
            Transform::Text => vec![value.trim().to_string()],
            Transform::UntilHyphen => vec![value.split('-').next().unwrap_or_default().trim().to_string()],
            Transform::Words => value.split_whitespace().map(str::to_string).collect(),
        };
        if words.iter().all(|w| w.is_empty()) { return false; }
        let slot = match rule.field {
            Field::Tags => {
                self.tags = Some(words);
                return true;
            }
            Field::Kind => &mut self.kind,
            Field::Status => &mut self.status,
            Field::Studio => &mut self.studio,
            Field::Year => &mut self.year,
        };
        *slot = Some(words.join(" "));
        true
    }

    /// Same as [`apply`](Self::apply) for a raw "Label：Value" node.
    pub fn apply_text(&mut self, rules: &[LabelRule], text: &str) -> bool {
        match split_label(text) {
            Some((label, value)) => self.apply(rules, label, value),
            None => false,
        }
    }
}
