use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
pub const DEFAULT_TIMEOUT_MS: u64 = 15_000;
pub const DEFAULT_SLOW_WARN_MS: u64 = 5_000;

const ENV_TIMEOUT: &str = "EPISODIC_HTTP_TIMEOUT_MS";
const ENV_USER_AGENT: &str = "EPISODIC_USER_AGENT";

/// Engine settings, read from `config.toml`. Every key is optional.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct EngineConfig {
    #[serde(default)]
    pub http: HttpConfig,
    /// Per-source overrides keyed by source name (`Age`, `Yhmc`, ...).
    #[serde(default)]
    pub sources: HashMap<String, SourceConfig>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct HttpConfig {
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    #[serde(default)]
    pub user_agent: Option<String>,
    #[serde(default)]
    pub slow_warn_ms: Option<u64>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct SourceConfig {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    /// Characters stripped before base64-decoding an obfuscated stream line.
    #[serde(default)]
    pub stream_prefix_len: Option<usize>,
}

impl EngineConfig {
    /// Load from `path`, or from the per-user config dir when `path` is None.
    /// A missing default file is not an error; a malformed one is.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut cfg = match path {
            Some(p) => Self::from_file(p)?,
            None => match default_config_path() {
                Some(p) if p.exists() => Self::from_file(&p)?,
                _ => Self::default(),
            },
        };
        cfg.apply_env_with(|key| std::env::var(key).ok());
        Ok(cfg)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_toml_str(&raw).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// Environment overrides win over the file. Unparsable values are ignored.
    pub fn apply_env_with<F: Fn(&str) -> Option<String>>(&mut self, get: F) {
        if let Some(ms) = get(ENV_TIMEOUT).and_then(|s| s.trim().parse().ok()) {
            self.http.timeout_ms = Some(ms);
        }
        if let Some(ua) = get(ENV_USER_AGENT).filter(|s| !s.trim().is_empty()) {
            self.http.user_agent = Some(ua);
        }
    }

    pub fn source(&self, name: &str) -> SourceConfig {
        self.sources.get(name).cloned().unwrap_or_default()
    }

    pub fn user_agent(&self) -> &str {
        self.http.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT)
    }

    /// Per-source timeout, else the global one, else `fallback_ms`.
    pub fn timeout_for(&self, name: &str, fallback_ms: u64) -> Duration {
        let ms = self.sources.get(name).and_then(|s| s.timeout_ms)
            .or(self.http.timeout_ms)
            .unwrap_or(fallback_ms);
        Duration::from_millis(ms.max(1))
    }

    pub fn slow_warn(&self) -> Duration {
        Duration::from_millis(self.http.slow_warn_ms.unwrap_or(DEFAULT_SLOW_WARN_MS))
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "episodic").map(|d| d.config_dir().join("config.toml"))
}
