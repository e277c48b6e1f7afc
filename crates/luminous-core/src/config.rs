//! Configuration: the user-editable `luminous_config.toml` (backend URL and
//! integration credentials) plus the gateway runtime config loaded from file
//! and environment.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config io: {0}")]
    Io(#[from] std::io::Error),
    #[error("config parse: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("config serialize: {0}")]
    Serialize(#[from] toml::ser::Error),
}

// ══════════════════════════════════════════════════════════════════════════════
// USER CONFIGURATION (Settings panel)
// ══════════════════════════════════════════════════════════════════════════════
// What the settings panel reads and writes: backend target plus Shopify and
// Firebase credentials. Stored as plain TOML next to the binary; the settings
// endpoint masks secrets on read.

/// User-editable configuration persisted in `luminous_config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LuminousConfig {
    /// Backend base URL. Unset means the environment default applies
    /// (see `endpoint::resolve_backend_url`).
    #[serde(default)]
    pub backend_url: Option<String>,

    /// API key forwarded to the backend as `x-api-key` on cycle requests.
    #[serde(default)]
    pub gemini_api_key: Option<String>,

    #[serde(default)]
    pub shopify: ShopifyConfig,

    #[serde(default)]
    pub firebase: FirebaseConfig,
}

/// Shopify credentials. The client only stores them and lights the widget;
/// no Shopify API calls originate here.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ShopifyConfig {
    #[serde(default)]
    pub shop_url: Option<String>,
    #[serde(default)]
    pub admin_token: Option<String>,
}

/// Firebase Realtime Database credentials for the console mirror.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FirebaseConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub database_url: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub app_id: Option<String>,
}

impl LuminousConfig {
    /// Default path for the user configuration file.
    pub fn default_path() -> PathBuf {
        PathBuf::from("luminous_config.toml")
    }

    /// Load from the default path. A missing file is not an error; it means
    /// nothing has been configured yet.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path(&Self::default_path())
    }

    /// Load from a specific path, falling back to defaults when absent.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            let content = fs::read_to_string(path)?;
            Ok(toml::from_str(&content)?)
        } else {
            Ok(Self::default())
        }
    }

    /// Save to the default path.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to_path(&Self::default_path())
    }

    /// Save to a specific path, creating parent directories as needed.
    pub fn save_to_path(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, content)?;
        Ok(())
    }

    /// Configured backend URL with environment fallback.
    /// Priority: luminous_config.toml > LUMINOUS_BACKEND_URL.
    pub fn get_backend_url(&self) -> Option<String> {
        self.backend_url
            .clone()
            .or_else(|| std::env::var("LUMINOUS_BACKEND_URL").ok())
            .filter(|s| !s.trim().is_empty())
    }

    /// API key with environment fallback.
    /// Priority: luminous_config.toml > GEMINI_API_KEY.
    pub fn get_gemini_api_key(&self) -> Option<String> {
        self.gemini_api_key
            .clone()
            .or_else(|| std::env::var("GEMINI_API_KEY").ok())
            .filter(|s| !s.trim().is_empty())
    }

    /// True when Shopify credentials are present (lights the Shopify widget).
    pub fn has_shopify(&self) -> bool {
        self.shopify
            .shop_url
            .as_deref()
            .is_some_and(|s| !s.trim().is_empty())
    }

    /// True when the Firebase console mirror can run (key + database URL).
    pub fn has_firebase(&self) -> bool {
        self.firebase
            .api_key
            .as_deref()
            .is_some_and(|s| !s.trim().is_empty())
            && self
                .firebase
                .database_url
                .as_deref()
                .is_some_and(|s| !s.trim().is_empty())
    }
}

// -----------------------------------------------------------------------------
// Gateway runtime configuration
// -----------------------------------------------------------------------------

/// Runtime settings for the gateway process. Precedence: env `LUMINOUS_CONFIG`
/// path > `config/gateway.toml` > defaults, then `LUMINOUS__*` environment
/// overrides.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Application identity shown in boot logs.
    pub app_name: String,
    /// HTTP port for the shell API.
    pub port: u16,
    /// True when the public origin serves over TLS. Drives the forced-proxy
    /// override in backend URL resolution.
    #[serde(default)]
    pub secure_transport: bool,
    /// Absolute origin prepended when the resolved backend is the relative
    /// proxy path (e.g. `https://skipper.example.com`).
    #[serde(default)]
    pub public_origin: Option<String>,
    /// Path to the user-editable luminous_config.toml.
    #[serde(default = "default_user_config_path")]
    pub user_config_path: String,
}

fn default_user_config_path() -> String {
    "luminous_config.toml".to_string()
}

impl GatewayConfig {
    /// Load config from file and environment.
    pub fn load() -> Result<Self, config::ConfigError> {
        let config_path =
            std::env::var("LUMINOUS_CONFIG").unwrap_or_else(|_| "config/gateway".to_string());
        let builder = config::Config::builder()
            .set_default("app_name", "Luminous Synergy Skipper")?
            .set_default("port", 8700_i64)?
            .set_default("secure_transport", false)?
            .set_default("user_config_path", "luminous_config.toml")?;

        let path = Path::new(&config_path);
        let builder = if path.exists() {
            builder.add_source(config::File::from(path))
        } else {
            builder
        };

        let built = builder
            .add_source(config::Environment::with_prefix("LUMINOUS").separator("__"))
            .build()?;

        built.try_deserialize()
    }
}
