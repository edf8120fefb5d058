//! Stream address extraction and de-obfuscation.
//!
//! Pure functions only: they take page text or a payload and return the
//! decoded value or a [`ScrapeError`], so they can be checked against
//! fixtures without any network access.

use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD};
use base64::Engine;
use percent_encoding::percent_decode_str;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::error::ScrapeError;
use crate::parse::lazy_regex;
use crate::types::StreamKind;

/// Substrings that mark a URL as directly playable: media extensions and
/// CDN hostnames known to serve raw media.
pub const DIRECT_MEDIA_MARKERS: &[&str] = &[".m3u8", ".mp4", "toutiao", "tos-", "aliyun"];
const MEDIA_EXTENSIONS: &[&str] = &[".m3u8", ".mp4"];
/// Query parameters embed players use to carry the real media address.
const NESTED_URL_PARAMS: &[&str] = &["url", "v"];

/// First capture group of `re` in raw page text, when non-empty. Callers
/// pass a `lazy_regex!` matching their script assignment.
pub fn script_capture<'a>(html: &'a str, re: &Regex) -> Option<&'a str> {
    re.captures(html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .filter(|v| !v.is_empty())
}

fn is_hex(b: Option<&u8>) -> bool {
    b.is_some_and(|b| b.is_ascii_hexdigit())
}

/// URI-component decode. Fails on a `%` not followed by two hex digits and
/// on sequences that are not valid UTF-8.
pub fn percent_decode(raw: &str) -> Result<String, ScrapeError> {
    let bytes = raw.as_bytes();
    if let Some(pos) = bytes
        .iter()
        .enumerate()
        .position(|(i, &b)| b == b'%' && !(is_hex(bytes.get(i + 1)) && is_hex(bytes.get(i + 2))))
    {
        return Err(ScrapeError::Decode(format!("malformed percent escape at byte {pos}")));
    }
    percent_decode_str(raw)
        .decode_utf8()
        .map(|s| s.into_owned())
        .map_err(|e| ScrapeError::Decode(format!("percent-decoding: {e}")))
}

pub fn normalize_protocol(url: &str) -> String {
    match url.trim().strip_prefix("//") {
        Some(rest) => format!("https://{rest}"),
        None => url.trim().to_string(),
    }
}

fn strip_query(url: &str) -> &str {
    url.split(&['?', '#'][..]).next().unwrap_or_default()
}

/// Whether the address, query string included, carries a direct-media marker.
pub fn looks_like_media(url: &str) -> bool {
    DIRECT_MEDIA_MARKERS.iter().any(|m| url.contains(m))
}

/// Absolute http(s) address, as required of a promoted nested parameter.
fn is_absolute_http(url: &str) -> bool {
    Url::parse(url).is_ok_and(|u| matches!(u.scheme(), "http" | "https"))
}

fn has_media_extension(url: &str) -> bool {
    MEDIA_EXTENSIONS.iter().any(|m| url.contains(m))
}

/// Decide whether `url` is playable as-is, wraps an absolute playable
/// address in its `url`/`v` parameter, or has to be embedded.
pub fn classify_stream(url: &str) -> (String, StreamKind) {
    let url = normalize_protocol(url);
    if looks_like_media(&url) {
        return (url, StreamKind::Native);
    }
    if let Ok(parsed) = Url::parse(&url) {
        let nested = NESTED_URL_PARAMS.iter().find_map(|name| {
            parsed
                .query_pairs()
                .find(|(k, v)| &**k == *name && !v.is_empty())
                .map(|(_, v)| v.into_owned())
        });
        let promoted = nested
            .map(|v| normalize_protocol(&v))
            .filter(|v| has_media_extension(v) && is_absolute_http(v));
        if let Some(inner) = promoted {
            return (inner, StreamKind::Native);
        }
    }
    (url, StreamKind::Iframe)
}

/// Numeric id at the end of a play URL path (`.../play/22247079`).
pub fn trailing_numeric_id(play_url: &str) -> Option<u64> {
    let path = strip_query(play_url);
    lazy_regex!(r"/(\d+)/?$")
        .captures(path)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// One entry of an embedded line list.
#[derive(Debug, Clone, Deserialize)]
pub struct LineDescriptor {
    #[serde(default)]
    pub id: Value,
    #[serde(default)]
    pub file: Option<String>,
}

impl LineDescriptor {
    /// Sites emit the id either as a number or as a numeric string.
    pub fn numeric_id(&self) -> Option<u64> {
        match &self.id {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

pub fn parse_line_list(json: &str) -> Result<Vec<LineDescriptor>, ScrapeError> {
    Ok(serde_json::from_str(json)?)
}

/// The descriptor whose id matches `wanted`, else the first one.
pub fn pick_line(lines: &[LineDescriptor], wanted: Option<u64>) -> Option<&LineDescriptor> {
    wanted
        .and_then(|id| lines.iter().find(|l| l.numeric_id() == Some(id)))
        .or_else(|| lines.first())
}

fn decode_base64_lenient(raw: &str) -> Result<Vec<u8>, ScrapeError> {
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    match STANDARD.decode(&compact) {
        Ok(bytes) => Ok(bytes),
        Err(_) => Ok(STANDARD_NO_PAD.decode(compact.trim_end_matches('='))?),
    }
}

/// Undo the line-file obfuscation: drop `prefix_len` leading characters,
/// base64-decode the rest, then URI-component decode the bytes.
///
/// The prefix length belongs to the origin site's current player script
/// and is expected to change without notice.
pub fn decode_line_file(file: &str, prefix_len: usize) -> Result<String, ScrapeError> {
    let body = match file.char_indices().nth(prefix_len) {
        Some((idx, _)) => &file[idx..],
        None => return Err(ScrapeError::Decode(format!("payload shorter than prefix ({prefix_len})"))),
    };
    let bytes = decode_base64_lenient(body)?;
    // Each byte stands for one character, as in a "binary" string.
    let binary: String = bytes.iter().map(|&b| b as char).collect();
    let decoded = normalize_protocol(&percent_decode(&binary)?);
    if !(decoded.starts_with("http://") || decoded.starts_with("https://")) {
        return Err(ScrapeError::Decode("decoded payload is not a URL".to_string()));
    }
    Ok(decoded)
}
