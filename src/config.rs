use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

use crate::core::SearchSettings;

/// Application configuration, deserialized from the layered sources
/// assembled by [`Settings::load`].
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub cache: CacheSettings,
    pub geocoder: GeocoderSettings,
    pub search: SearchConfig,
    pub logging: LoggingSettings,
}

impl Settings {
    /// Assemble configuration from, in override order:
    /// `config/default.toml`, `config/local.toml`, then `FAMILLE_`-prefixed
    /// environment variables (`FAMILLE_SERVER__PORT` -> `server.port`).
    /// The conventional `DATABASE_URL` and `REDIS_URL` variables win over
    /// everything else.
    pub fn load() -> Result<Self, ConfigError> {
        let layered = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(prefixed_env())
            .build()?;

        overlay_conventional_env(layered)?.try_deserialize()
    }

    /// Load from one explicit file plus the environment, for tools and
    /// tests that should not pick up `config/`.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(prefixed_env())
            .build()?
            .try_deserialize()
    }
}

fn prefixed_env() -> Environment {
    Environment::with_prefix("FAMILLE")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

/// Overlay the short-form environment variables deployment platforms
/// inject, which carry no FAMILLE_ prefix.
fn overlay_conventional_env(layered: Config) -> Result<Config, ConfigError> {
    let mut builder = Config::builder().add_source(layered);

    for (var, key) in [
        ("DATABASE_URL", "database.url"),
        ("REDIS_URL", "cache.redis_url"),
    ] {
        if let Ok(value) = std::env::var(var) {
            builder = builder.set_override(key, value)?;
        }
    }

    builder.build()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    pub redis_url: String,
    pub ttl_secs: Option<u64>,
    pub l1_cache_size: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeocoderSettings {
    pub endpoint: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_country")]
    pub country: String,
}

fn default_user_agent() -> String {
    format!("famille-search/{}", env!("CARGO_PKG_VERSION"))
}

fn default_country() -> String {
    "France".to_string()
}

/// Search layer tuning, converted into [`SearchSettings`] at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    #[serde(default)]
    pub allow_basic_plan: bool,
    #[serde(default = "default_postal_code_distance_km")]
    pub postal_code_distance_km: f64,
    #[serde(default = "default_search_limit")]
    pub default_limit: usize,
    #[serde(default = "default_max_limit")]
    pub max_limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            allow_basic_plan: false,
            postal_code_distance_km: default_postal_code_distance_km(),
            default_limit: default_search_limit(),
            max_limit: default_max_limit(),
        }
    }
}

impl From<SearchConfig> for SearchSettings {
    fn from(config: SearchConfig) -> Self {
        SearchSettings {
            allow_basic_plan: config.allow_basic_plan,
            postal_code_distance_km: config.postal_code_distance_km,
            default_limit: config.default_limit,
            max_limit: config.max_limit,
        }
    }
}

fn default_postal_code_distance_km() -> f64 { 20.0 }
fn default_search_limit() -> usize { 20 }
fn default_max_limit() -> usize { 100 }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }
