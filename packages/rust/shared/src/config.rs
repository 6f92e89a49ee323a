//! Application configuration for gardenlink.
//!
//! User config lives at `~/.gardenlink/gardenlink.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{GardenError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "gardenlink.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".gardenlink";

/// Proxy used for remote wikilinks and `readURL` when none is configured.
pub const DEFAULT_PROXY_URL: &str = "https://proxy.thoughtform.garden";

// ---------------------------------------------------------------------------
// Config structs (matching gardenlink.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Garden locations.
    #[serde(default)]
    pub garden: GardenConfig,

    /// Content proxy settings.
    #[serde(default)]
    pub proxy: ProxyConfig,

    /// OpenRouter settings.
    #[serde(default)]
    pub openrouter: OpenRouterConfig,
}

/// `[garden]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GardenConfig {
    /// Directory holding one subdirectory per garden.
    #[serde(default = "default_garden_root")]
    pub root: String,

    /// Garden the tools run in.
    #[serde(default = "default_current_garden")]
    pub current: String,

    /// Known gardens. Empty means "every subdirectory of `root`".
    #[serde(default)]
    pub gardens: Vec<String>,
}

impl Default for GardenConfig {
    fn default() -> Self {
        Self {
            root: default_garden_root(),
            current: default_current_garden(),
            gardens: Vec::new(),
        }
    }
}

fn default_garden_root() -> String {
    "~/.gardenlink/gardens".into()
}
fn default_current_garden() -> String {
    "home".into()
}

impl GardenConfig {
    /// The garden root with a leading `~` expanded to the home directory.
    pub fn root_path(&self) -> Result<PathBuf> {
        expand_home(&self.root)
    }
}

/// `[proxy]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyConfig {
    /// Content proxy base URL. Web search refuses to run without one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Minimum ms between outbound web searches.
    #[serde(default = "default_search_cooldown")]
    pub search_cooldown_ms: u64,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            url: None,
            search_cooldown_ms: default_search_cooldown(),
        }
    }
}

fn default_search_cooldown() -> u64 {
    1000
}

impl ProxyConfig {
    /// The configured proxy URL, trimmed, if it is non-empty.
    pub fn configured_url(&self) -> Option<&str> {
        self.url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
    }

    /// The configured proxy URL, falling back to [`DEFAULT_PROXY_URL`].
    pub fn effective_url(&self) -> &str {
        self.configured_url().unwrap_or(DEFAULT_PROXY_URL)
    }
}

/// `[openrouter]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenRouterConfig {
    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Model used for relevance filtering.
    #[serde(default = "default_model")]
    pub default_model: String,

    /// API base URL.
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for OpenRouterConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_api_key_env(),
            default_model: default_model(),
            base_url: default_base_url(),
        }
    }
}

fn default_api_key_env() -> String {
    "OPENROUTER_API_KEY".into()
}
fn default_model() -> String {
    "google/gemini-2.5-flash".into()
}
fn default_base_url() -> String {
    "https://openrouter.ai/api/v1".into()
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.gardenlink/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| GardenError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.gardenlink/gardenlink.toml`).
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
    let content = std::fs::read_to_string(path).map_err(|e| GardenError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| GardenError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| GardenError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| GardenError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| GardenError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Read the OpenRouter API key from the env var named in the config.
pub fn resolve_api_key(config: &OpenRouterConfig) -> Result<String> {
    let var_name = &config.api_key_env;
    match std::env::var(var_name) {
        Ok(val) if !val.is_empty() => Ok(val),
        _ => Err(GardenError::config(format!(
            "OpenRouter API key not found. Set the {var_name} environment variable.\n\
             Get a key at https://openrouter.ai/keys"
        ))),
    }
}

/// Expand a leading `~/` to the user's home directory.
fn expand_home(raw: &str) -> Result<PathBuf> {
    match raw.strip_prefix("~/") {
        Some(rest) => {
            let home = dirs::home_dir()
                .ok_or_else(|| GardenError::config("could not determine home directory"))?;
            Ok(home.join(rest))
        }
        None => Ok(PathBuf::from(raw)),
    }
}
