use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Top-level application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub autocomplete: AutocompleteConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub charts: ChartsConfig,
}

/// Remote analysis / search service
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// Typeahead timing
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AutocompleteConfig {
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    #[serde(default = "default_focus_debounce_ms")]
    pub focus_debounce_ms: u64,

    #[serde(default = "default_blur_grace_ms")]
    pub blur_grace_ms: u64,
}

/// Durable history record
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    #[serde(default = "default_history_key")]
    pub history_key: String,
}

/// Axis label limits per chart family
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ChartsConfig {
    #[serde(default = "default_price_label_count")]
    pub price_label_count: usize,

    #[serde(default = "default_ratio_label_count")]
    pub ratio_label_count: usize,

    #[serde(default = "default_series_label_count")]
    pub series_label_count: usize,
}

// ── Defaults ─────────────────────────────────────────────────────────────────

fn default_base_url() -> String {
    "http://localhost:8060".to_string()
}
fn default_timeout_secs() -> u64 {
    60
}
fn default_user_agent() -> String {
    "whichticker/0.1 (pair comparison dashboard)".to_string()
}
fn default_debounce_ms() -> u64 {
    250
}
fn default_focus_debounce_ms() -> u64 {
    150
}
fn default_blur_grace_ms() -> u64 {
    200
}
fn default_db_path() -> PathBuf {
    PathBuf::from("data/whichticker.duckdb")
}
fn default_history_key() -> String {
    "whichticker_history".to_string()
}
fn default_price_label_count() -> usize {
    8
}
fn default_ratio_label_count() -> usize {
    10
}
fn default_series_label_count() -> usize {
    8
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for AutocompleteConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            focus_debounce_ms: default_focus_debounce_ms(),
            blur_grace_ms: default_blur_grace_ms(),
        }
    }
}

impl AutocompleteConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
    pub fn focus_debounce(&self) -> Duration {
        Duration::from_millis(self.focus_debounce_ms)
    }
    pub fn blur_grace(&self) -> Duration {
        Duration::from_millis(self.blur_grace_ms)
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            history_key: default_history_key(),
        }
    }
}

impl Default for ChartsConfig {
    fn default() -> Self {
        Self {
            price_label_count: default_price_label_count(),
            ratio_label_count: default_ratio_label_count(),
            series_label_count: default_series_label_count(),
        }
    }
}

// ── Loader ───────────────────────────────────────────────────────────────────

impl AppConfig {
    /// Load configuration from file + environment overrides
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();

        let cfg = config::Config::builder()
            .add_source(
                config::File::with_name("config/default")
                    .required(false)
                    .format(config::FileFormat::Toml),
            )
            .add_source(
                config::File::with_name("config/local")
                    .required(false)
                    .format(config::FileFormat::Toml),
            )
            .add_source(config::Environment::with_prefix("WHICHTICKER").separator("__"))
            .build()?;

        let app_cfg: AppConfig = cfg.try_deserialize().unwrap_or_else(|e| {
            tracing::warn!("Invalid configuration, using defaults: {}", e);
            AppConfig::default()
        });
        Ok(app_cfg)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            autocomplete: AutocompleteConfig::default(),
            storage: StorageConfig::default(),
            charts: ChartsConfig::default(),
        }
    }
}
