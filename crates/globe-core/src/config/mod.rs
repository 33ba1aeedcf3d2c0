//! Runtime configuration for Globe clients.
//!
//! `GlobeConfig` is read from a JSON file and then overlaid with `GLOBE_*`
//! environment variables. Every field is optional; accessors fall back to
//! built-in defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::remote::DEFAULT_API_BASE_URL;
use crate::resolve::DEFAULT_COUNTRY_CODE;
use crate::search::DEFAULT_DEBOUNCE;
use crate::util::{is_http_url, normalize_base_url, normalize_country_code, normalize_text_option};

const CONFIG_VERSION: u32 = 1;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

pub const ENV_API_BASE_URL: &str = "GLOBE_API_BASE_URL";
pub const ENV_DEFAULT_COUNTRY: &str = "GLOBE_DEFAULT_COUNTRY";
pub const ENV_HOME_COUNTRY: &str = "GLOBE_HOME_COUNTRY";
pub const ENV_LOCATION_URL: &str = "GLOBE_LOCATION_URL";
pub const ENV_DB_PATH: &str = "GLOBE_DB_PATH";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct GlobeConfig {
    #[serde(default = "default_config_version")]
    pub version: u32,
    /// REST Countries compatible API base URL
    #[serde(default)]
    pub api_base_url: Option<String>,
    /// Country saved when the home country cannot be located
    #[serde(default)]
    pub default_country: Option<String>,
    /// Fixed home country, bypassing location lookup
    #[serde(default)]
    pub home_country: Option<String>,
    /// Endpoint answering with the caller's country code
    #[serde(default)]
    pub location_url: Option<String>,
    #[serde(default)]
    pub db_path: Option<String>,
    #[serde(default)]
    pub http_timeout_secs: Option<u64>,
    #[serde(default)]
    pub search_debounce_ms: Option<u64>,
}

const fn default_config_version() -> u32 {
    CONFIG_VERSION
}

impl Default for GlobeConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            api_base_url: None,
            default_country: None,
            home_country: None,
            location_url: None,
            db_path: None,
            http_timeout_secs: None,
            search_debounce_ms: None,
        }
    }
}

impl GlobeConfig {
    /// Load from `path`; a missing file yields the defaults.
    pub fn load_from_path(path: &Path) -> Result<Self, String> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path)
            .map_err(|error| format!("Failed to read config at {}: {}", path.display(), error))?;
        let mut config = serde_json::from_str::<Self>(&raw)
            .map_err(|error| format!("Failed to parse config at {}: {}", path.display(), error))?;
        config.normalize();
        Ok(config)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|error| {
                format!(
                    "Failed to create config directory {}: {}",
                    parent.display(),
                    error
                )
            })?;
        }

        let mut normalized = self.clone();
        normalized.normalize();
        let serialized = serde_json::to_string_pretty(&normalized)
            .map_err(|error| format!("Failed to serialize config: {error}"))?;
        std::fs::write(path, serialized)
            .map_err(|error| format!("Failed to write config at {}: {}", path.display(), error))
    }

    /// Overlay values from the process environment.
    #[must_use]
    pub fn with_process_env(self) -> Self {
        self.with_env(|key| std::env::var(key).ok())
    }

    /// Overlay values from `lookup`; set, non-empty variables win over the file.
    #[must_use]
    pub fn with_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |key: &str| normalize_text_option(lookup(key));

        if let Some(value) = read(ENV_API_BASE_URL) {
            self.api_base_url = Some(value);
        }
        if let Some(value) = read(ENV_DEFAULT_COUNTRY) {
            self.default_country = Some(value);
        }
        if let Some(value) = read(ENV_HOME_COUNTRY) {
            self.home_country = Some(value);
        }
        if let Some(value) = read(ENV_LOCATION_URL) {
            self.location_url = Some(value);
        }
        if let Some(value) = read(ENV_DB_PATH) {
            self.db_path = Some(value);
        }

        self.normalize();
        self
    }

    /// Reject values that cannot be used.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(url) = &self.api_base_url {
            normalize_base_url(url).map_err(|error| format!("api_base_url: {error}"))?;
        }
        if let Some(code) = &self.default_country {
            check_country_code(code, "default_country")?;
        }
        if let Some(code) = &self.home_country {
            check_country_code(code, "home_country")?;
        }
        if let Some(url) = &self.location_url {
            if !is_http_url(url) {
                return Err("location_url must include http:// or https://".to_string());
            }
        }
        if self.http_timeout_secs == Some(0) {
            return Err("http_timeout_secs must be greater than zero".to_string());
        }
        Ok(())
    }

    pub fn api_base_url(&self) -> String {
        self.api_base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string())
    }

    pub fn default_country(&self) -> String {
        self.default_country
            .clone()
            .unwrap_or_else(|| DEFAULT_COUNTRY_CODE.to_string())
    }

    pub fn home_country(&self) -> Option<&str> {
        self.home_country.as_deref()
    }

    pub fn location_url(&self) -> Option<&str> {
        self.location_url.as_deref()
    }

    pub fn db_path(&self) -> Option<PathBuf> {
        self.db_path.as_ref().map(PathBuf::from)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(
            self.http_timeout_secs
                .filter(|secs| *secs > 0)
                .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS),
        )
    }

    pub fn search_debounce(&self) -> Duration {
        self.search_debounce_ms
            .map_or(DEFAULT_DEBOUNCE, Duration::from_millis)
    }

    fn normalize(&mut self) {
        self.version = CONFIG_VERSION;
        self.api_base_url = normalize_text_option(self.api_base_url.take())
            .map(|url| url.trim_end_matches('/').to_string());
        self.default_country = normalize_code_option(self.default_country.take());
        self.home_country = normalize_code_option(self.home_country.take());
        self.location_url = normalize_text_option(self.location_url.take());
        self.db_path = normalize_text_option(self.db_path.take());
    }
}

/// Trim and upper-case a code; unparseable values are kept for `validate`.
fn normalize_code_option(value: Option<String>) -> Option<String> {
    let value = normalize_text_option(value)?;
    Some(normalize_country_code(&value).unwrap_or(value))
}

fn check_country_code(code: &str, field: &str) -> Result<(), String> {
    if normalize_country_code(code).is_some() {
        Ok(())
    } else {
        Err(format!(
            "{field} must be a 2 or 3 letter ISO country code, got '{code}'"
        ))
    }
}
