//! Configuration loading and constants.
//!
//! Loads application configuration from an optional TOML file, applies
//! environment overrides, and defines constants for HTTP cache TTLs, query
//! limits, logging and default paths. `AppConfig` is the root configuration
//! struct containing all settings.

use const_format::formatcp;
use serde::Deserialize;
use std::path::{Path, PathBuf};

// =============================================================================
// HTTP Response Cache Control
// =============================================================================
// Catalog responses can change on reload, so they are only briefly fresh.
// All values are in seconds.

/// Product listing and search responses
pub const HTTP_CACHE_PRODUCTS_MAX_AGE: u32 = 30;
pub const HTTP_CACHE_PRODUCTS_SWR: u32 = 30;

pub const CACHE_CONTROL_PRODUCTS: &str = formatcp!(
    "public, max-age={}, stale-while-revalidate={}",
    HTTP_CACHE_PRODUCTS_MAX_AGE,
    HTTP_CACHE_PRODUCTS_SWR
);

/// Health responses must always reflect the live catalog state
pub const CACHE_CONTROL_NO_STORE: &str = "no-store";

// =============================================================================
// Query Limits
// =============================================================================

/// Default number of products returned by `/products`
pub const DEFAULT_LIST_LIMIT: usize = 50;

/// Largest `limit` accepted by `/products`
pub const MAX_LIST_LIMIT: usize = 500;

/// Default number of products returned by `/products/search`
pub const DEFAULT_SEARCH_LIMIT: usize = 8;

/// Largest `limit` accepted by `/products/search`
pub const MAX_SEARCH_LIMIT: usize = 50;

// =============================================================================
// Default Paths and Strings
// =============================================================================

/// Default configuration file path
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Default products document, relative to the working directory
pub const DEFAULT_PRODUCTS_PATH: &str = "data/products.json";

/// File name of the price snapshots document when it is not configured
pub const PRICE_SNAPSHOTS_FILE_NAME: &str = "price_snapshots.json";

/// Default log filter when RUST_LOG is not set
pub const DEFAULT_LOG_FILTER: &str = "shelf=debug,tower_http=info";

/// Default log format (text or json)
pub const DEFAULT_LOG_FORMAT: &str = "text";

/// Default bind host
pub const DEFAULT_HTTP_HOST: &str = "0.0.0.0";

/// Default bind port
pub const DEFAULT_HTTP_PORT: u16 = 8000;

/// Seconds to wait for open connections during graceful shutdown
pub const SHUTDOWN_GRACE_SECS: u64 = 30;

// =============================================================================
// Environment Variables
// =============================================================================

pub const ENV_HOST: &str = "HOST";
pub const ENV_PORT: &str = "PORT";
pub const ENV_PRODUCTS_PATH: &str = "PRODUCTS_JSON_PATH";
pub const ENV_PRICE_SNAPSHOTS_PATH: &str = "PRICE_SNAPSHOTS_JSON_PATH";
pub const ENV_LOG_FORMAT: &str = "LOG_FORMAT";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// HTTP server configuration
    #[serde(default)]
    pub http: HttpServerConfig,
    /// Catalog source files and query limits
    #[serde(default)]
    pub catalog: CatalogConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HttpServerConfig {
    #[serde(default = "HttpServerConfig::default_host")]
    pub host: String,
    #[serde(default = "HttpServerConfig::default_port")]
    pub port: u16,
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            port: Self::default_port(),
        }
    }
}

impl HttpServerConfig {
    fn default_host() -> String {
        DEFAULT_HTTP_HOST.to_string()
    }

    fn default_port() -> u16 {
        DEFAULT_HTTP_PORT
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    /// Products document produced by the scraper
    #[serde(default = "CatalogConfig::default_products_path")]
    pub products_path: PathBuf,
    /// Price snapshots document. Defaults to `price_snapshots.json` next to
    /// the products document.
    pub price_snapshots_path: Option<PathBuf>,
    /// Refuse to serve when the catalog cannot be loaded at startup (default: true).
    /// When false the server starts and reports the catalog as unavailable
    /// until a reload succeeds.
    #[serde(default = "CatalogConfig::default_require_on_startup")]
    pub require_on_startup: bool,
    #[serde(default)]
    pub limits: LimitsConfig,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            products_path: Self::default_products_path(),
            price_snapshots_path: None,
            require_on_startup: Self::default_require_on_startup(),
            limits: LimitsConfig::default(),
        }
    }
}

impl CatalogConfig {
    fn default_products_path() -> PathBuf {
        PathBuf::from(DEFAULT_PRODUCTS_PATH)
    }

    fn default_require_on_startup() -> bool {
        true
    }

    /// Get the effective price snapshots path (configured or sibling of the products file)
    pub fn price_snapshots_path(&self) -> PathBuf {
        match &self.price_snapshots_path {
            Some(path) => path.clone(),
            None => self.products_path.with_file_name(PRICE_SNAPSHOTS_FILE_NAME),
        }
    }
}

/// Default and maximum `limit` values for the query endpoints
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct LimitsConfig {
    #[serde(default = "LimitsConfig::default_list")]
    pub list_default: usize,
    #[serde(default = "LimitsConfig::max_list")]
    pub list_max: usize,
    #[serde(default = "LimitsConfig::default_search")]
    pub search_default: usize,
    #[serde(default = "LimitsConfig::max_search")]
    pub search_max: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            list_default: Self::default_list(),
            list_max: Self::max_list(),
            search_default: Self::default_search(),
            search_max: Self::max_search(),
        }
    }
}

impl LimitsConfig {
    fn default_list() -> usize {
        DEFAULT_LIST_LIMIT
    }
    fn max_list() -> usize {
        MAX_LIST_LIMIT
    }
    fn default_search() -> usize {
        DEFAULT_SEARCH_LIMIT
    }
    fn max_search() -> usize {
        MAX_SEARCH_LIMIT
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let pairs = [
            ("list", self.list_default, self.list_max),
            ("search", self.search_default, self.search_max),
        ];
        for (name, default, max) in pairs {
            if default == 0 || max == 0 {
                return Err(ConfigError::Validation(format!(
                    "catalog.limits: {name} limits must be positive"
                )));
            }
            if default > max {
                return Err(ConfigError::Validation(format!(
                    "catalog.limits: {name}_default ({default}) exceeds {name}_max ({max})"
                )));
            }
        }
        Ok(())
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log format: "text" (human-readable, default) or "json" (structured)
    #[serde(default = "LoggingConfig::default_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: DEFAULT_LOG_FORMAT.to_string(),
        }
    }
}

impl LoggingConfig {
    fn default_format() -> String {
        DEFAULT_LOG_FORMAT.to_string()
    }

    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Load configuration from a TOML file, falling back to defaults when the
    /// file does not exist.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path.as_ref()) {
            Ok(contents) => Self::from_toml(&contents),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let config = Self::default();
                config.validate()?;
                Ok(config)
            }
            Err(e) => Err(ConfigError::Io(e)),
        }
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key lookup. Empty values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(host) = get(ENV_HOST) {
            self.http.host = host;
        }
        if let Some(port) = get(ENV_PORT) {
            self.http.port = port.trim().parse().map_err(|_| {
                ConfigError::Validation(format!("{ENV_PORT} must be a port number, got {port:?}"))
            })?;
        }
        if let Some(path) = get(ENV_PRODUCTS_PATH) {
            self.catalog.products_path = PathBuf::from(path);
        }
        if let Some(path) = get(ENV_PRICE_SNAPSHOTS_PATH) {
            self.catalog.price_snapshots_path = Some(PathBuf::from(path));
        }
        if let Some(format) = get(ENV_LOG_FORMAT) {
            self.logging.format = format;
        }
        self.validate()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.catalog.limits.validate()?;
        match self.logging.format.to_ascii_lowercase().as_str() {
            "text" | "json" => Ok(()),
            other => Err(ConfigError::Validation(format!(
                "logging.format must be \"text\" or \"json\", got {other:?}"
            ))),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Configuration error: {0}")]
    Validation(String),
}
