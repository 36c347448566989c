//! Application configuration for confluence-bridge.
//!
//! User config lives at `~/.confluence-bridge/config.toml`.
//! CLI flags override environment variables, which override config file values.
//! Secrets are never stored in the file: the `[auth]` section only names the
//! environment variables that carry them.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{BridgeError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".confluence-bridge";

/// Environment variable that overrides the configured backend URL.
pub const URL_ENV: &str = "CONFLUENCE_URL";

// ---------------------------------------------------------------------------
// Config structs (matching config.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Backend location and transport settings.
    #[serde(default)]
    pub confluence: ConfluenceConfig,

    /// Where to find credentials.
    #[serde(default)]
    pub auth: AuthConfig,
}

/// `[confluence]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfluenceConfig {
    /// Site root, e.g. `https://example.atlassian.net/wiki`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// HTTP request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ConfluenceConfig {
    fn default() -> Self {
        Self {
            url: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

/// `[auth]` section: names of env vars holding credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Env var holding a personal access token (Bearer scheme).
    #[serde(default = "default_personal_token_env")]
    pub personal_token_env: String,

    /// Env var holding the login email (Basic scheme).
    #[serde(default = "default_api_mail_env")]
    pub api_mail_env: String,

    /// Env var holding the API key (Basic scheme).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            personal_token_env: default_personal_token_env(),
            api_mail_env: default_api_mail_env(),
            api_key_env: default_api_key_env(),
        }
    }
}

fn default_personal_token_env() -> String {
    "CONFLUENCE_PERSONAL_TOKEN".into()
}
fn default_api_mail_env() -> String {
    "CONFLUENCE_API_MAIL".into()
}
fn default_api_key_env() -> String {
    "CONFLUENCE_API_KEY".into()
}

// ---------------------------------------------------------------------------
// Connection config (runtime, merged from config + env + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime connection settings handed to the credential resolver and the
/// backend client. Built once per process; holds no mutable state.
#[derive(Clone)]
pub struct ConnectionConfig {
    /// Backend site root.
    pub base_url: Url,
    /// Personal access token, if configured.
    pub personal_token: Option<String>,
    /// Login email for Basic auth, if configured.
    pub api_mail: Option<String>,
    /// API key for Basic auth, if configured.
    pub api_key: Option<String>,
    /// HTTP request timeout in seconds.
    pub timeout_secs: u64,
}

impl std::fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("base_url", &self.base_url.as_str())
            .field("personal_token", &self.personal_token.as_ref().map(|_| "<redacted>"))
            .field("api_mail", &self.api_mail)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl ConnectionConfig {
    /// Resolve connection settings from the config file and the process
    /// environment. `url_override` (from a CLI flag) wins over everything.
    pub fn from_env(config: &AppConfig, url_override: Option<&str>) -> Result<Self> {
        Self::resolve(config, url_override, |name| std::env::var(name).ok())
    }

    /// Resolve connection settings using `lookup` to read variables.
    ///
    /// Empty values are treated as unset.
    pub fn resolve(
        config: &AppConfig,
        url_override: Option<&str>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let raw_url = url_override
            .map(String::from)
            .or_else(|| var(URL_ENV))
            .or_else(|| config.confluence.url.clone())
            .ok_or_else(|| {
                BridgeError::config(format!(
                    "Confluence URL not configured. Set {URL_ENV}, pass --url, \
                     or add `url` under [confluence] in the config file."
                ))
            })?;

        let base_url = parse_base_url(&raw_url)?;

        Ok(Self {
            base_url,
            personal_token: var(&config.auth.personal_token_env),
            api_mail: var(&config.auth.api_mail_env),
            api_key: var(&config.auth.api_key_env),
            timeout_secs: config.confluence.timeout_secs,
        })
    }

    /// The site root without a trailing slash, ready for path concatenation.
    pub fn site_root(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }
}

/// Parse and validate the backend base URL.
fn parse_base_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim())
        .map_err(|e| BridgeError::config(format!("invalid Confluence URL '{raw}': {e}")))?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(BridgeError::config(format!(
            "invalid Confluence URL '{raw}': unsupported scheme '{other}'"
        ))),
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.confluence-bridge/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| BridgeError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.confluence-bridge/config.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| BridgeError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| BridgeError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| BridgeError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let content = toml::to_string_pretty(&AppConfig::default())
        .map_err(|e| BridgeError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| BridgeError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
