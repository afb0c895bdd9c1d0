use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Root application configuration, loaded from `~/.config/uclases/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub autocomplete: AutocompleteDefaults,
    pub lookup: LookupConfig,
    pub notifications: NotificationsConfig,
    pub logging: LoggingConfig,
}

/// Values used when a container does not configure them itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AutocompleteDefaults {
    pub min_length: usize,
    pub max_results: usize,
    pub debounce_ms: u64,
    /// Placeholder row shown when a lookup returns nothing.
    pub empty_label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LookupConfig {
    /// Prefix for relative lookup URLs such as `/search/users`.
    pub base_url: String,
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationsConfig {
    pub base_url: String,
    pub mark_all_policy: MarkAllPolicy,
}

/// What follows a successful "mark all as read".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkAllPolicy {
    /// Patch every card, badge and counter in place.
    #[default]
    Patch,
    /// Ask the host to reload the page.
    Reload,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive used when `RUST_LOG` is unset.
    pub filter: String,
}

// ─── Defaults ──────────────────────────────────────────────

pub const DEFAULT_MIN_LENGTH: usize = 2;
pub const DEFAULT_MAX_RESULTS: usize = 15;
pub const DEFAULT_DEBOUNCE_MS: u64 = 200;

impl Default for AutocompleteDefaults {
    fn default() -> Self {
        Self {
            min_length: DEFAULT_MIN_LENGTH,
            max_results: DEFAULT_MAX_RESULTS,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            empty_label: "Sin resultados".to_string(),
        }
    }
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            user_agent: format!("uclases/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000/notifications".to_string(),
            mark_all_policy: MarkAllPolicy::Patch,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

// ─── Load / Save ───────────────────────────────────────────

impl AppConfig {
    /// Standard config file path: `~/.config/uclases/config.toml`
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("UCLASES_CONFIG") {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("uclases")
            .join("config.toml")
    }

    /// Load config from disk, falling back to defaults if file doesn't exist.
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let toml_str = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_str)?;
        Ok(())
    }
}

/// Join a relative `url` onto `base`; absolute URLs are returned unchanged.
pub fn resolve_url(base: &str, url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        return url.to_string();
    }
    format!("{}/{}", base.trim_end_matches('/'), url.trim_start_matches('/'))
}
