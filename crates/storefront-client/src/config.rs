//! # Client Configuration
//!
//! Configuration management for the counter client.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     STOREFRONT_ENV=production                                          │
//! │     STOREFRONT_API_URL=https://api.example.com/api                     │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/counter/client.toml (Linux)                              │
//! │     ~/Library/Application Support/com.storefront.counter/client.toml   │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     development environment, 15 s request deadline                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # client.toml
//! [api]
//! environment = "production"          # development | staging | production
//! # base_url = "https://pos.example.com/api"   (overrides the environment)
//! request_timeout_secs = 15
//!
//! [storage]
//! database_path = "/var/lib/counter/storefront.db"
//!
//! [notifications]
//! enabled = true
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{ClientError, ClientResult};

// =============================================================================
// Environment
// =============================================================================

/// Deployment environment; picks the default API base URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    /// Base URL used when `[api] base_url` is not set.
    pub fn default_base_url(&self) -> &'static str {
        match self {
            Environment::Development => "http://localhost:8080/api",
            Environment::Staging => "https://staging.storefront.example.com/api",
            Environment::Production => "https://api.storefront.example.com/api",
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Staging => write!(f, "staging"),
            Environment::Production => write!(f, "production"),
        }
    }
}

impl std::str::FromStr for Environment {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "development" | "dev" | "local" => Ok(Environment::Development),
            "staging" | "stage" => Ok(Environment::Staging),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(ClientError::InvalidConfig(format!(
                "Unknown environment: '{}'. Valid options: development, staging, production",
                other
            ))),
        }
    }
}

// =============================================================================
// Sections
// =============================================================================

/// `[api]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSettings {
    #[serde(default)]
    pub environment: Environment,

    /// Overrides the environment's default base URL.
    #[serde(default)]
    pub base_url: Option<String>,

    /// Deadline for each HTTP request (seconds).
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_request_timeout() -> u64 {
    15
}

impl Default for ApiSettings {
    fn default() -> Self {
        ApiSettings {
            environment: Environment::default(),
            base_url: None,
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// `[storage]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageSettings {
    /// SQLite file for tokens and preferences.
    /// Defaults to the platform data directory.
    #[serde(default)]
    pub database_path: Option<PathBuf>,
}

/// `[notifications]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

impl Default for NotificationSettings {
    fn default() -> Self {
        NotificationSettings { enabled: true }
    }
}

// =============================================================================
// Main Client Configuration
// =============================================================================

/// Complete client configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub api: ApiSettings,

    #[serde(default)]
    pub storage: StorageSettings,

    #[serde(default)]
    pub notifications: NotificationSettings,
}

impl ClientConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (client.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ClientResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading client config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load client config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> ClientResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| ClientError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ClientError::ConfigSaveFailed(e.to_string()))?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents).map_err(|e| ClientError::ConfigSaveFailed(e.to_string()))?;

        info!(?path, "Client config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ClientResult<()> {
        let url = self.base_url()?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ClientError::InvalidConfig(format!(
                "API URL must start with http:// or https://, got: {}",
                url
            )));
        }

        if self.api.request_timeout_secs == 0 {
            return Err(ClientError::InvalidConfig(
                "request_timeout_secs must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(env) = lookup("STOREFRONT_ENV") {
            match env.parse() {
                Ok(parsed) => {
                    debug!(environment = %env, "Overriding environment from environment");
                    self.api.environment = parsed;
                }
                Err(_) => warn!(environment = %env, "Unknown environment in STOREFRONT_ENV"),
            }
        }

        if let Some(url) = lookup("STOREFRONT_API_URL") {
            debug!(url = %url, "Overriding API URL from environment");
            self.api.base_url = Some(url);
        }

        if let Some(timeout) = lookup("STOREFRONT_TIMEOUT_SECS") {
            if let Ok(secs) = timeout.parse::<u64>() {
                self.api.request_timeout_secs = secs;
            }
        }

        if let Some(path) = lookup("STOREFRONT_DB_PATH") {
            self.storage.database_path = Some(PathBuf::from(path));
        }

        if let Some(flag) = lookup("STOREFRONT_NOTIFICATIONS") {
            match flag.to_lowercase().as_str() {
                "1" | "true" | "on" | "yes" => self.notifications.enabled = true,
                "0" | "false" | "off" | "no" => self.notifications.enabled = false,
                _ => warn!(value = %flag, "Unknown notification flag in environment"),
            }
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join("client.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// Resolved API base URL (explicit override, else the environment's).
    pub fn base_url(&self) -> ClientResult<Url> {
        let raw = self
            .api
            .base_url
            .as_deref()
            .unwrap_or_else(|| self.api.environment.default_base_url());
        Ok(Url::parse(raw)?)
    }

    /// Per-request deadline.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.api.request_timeout_secs)
    }

    /// SQLite file path (configured, else `<data dir>/storefront.db`).
    pub fn database_path(&self) -> PathBuf {
        self.storage.database_path.clone().unwrap_or_else(|| {
            project_dirs()
                .map(|dirs| dirs.data_dir().join("storefront.db"))
                .unwrap_or_else(|| PathBuf::from("storefront.db"))
        })
    }
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("com", "storefront", "counter")
}
