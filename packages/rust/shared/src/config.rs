//! Application configuration for confdown.
//!
//! User config lives at `~/.confdown/confdown.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ConfdownError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "confdown.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".confdown";

// ---------------------------------------------------------------------------
// Config structs (matching confdown.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Confluence connection settings.
    #[serde(default)]
    pub connection: ConnectionConfig,

    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,
}

/// `[connection]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Base URL of the Confluence instance, including the context path
    /// (e.g. `https://acme.atlassian.net/wiki`).
    #[serde(default)]
    pub base_url: String,

    /// Account email used for basic auth.
    #[serde(default)]
    pub username: String,

    /// Name of the env var holding the API token (never store the token itself).
    #[serde(default = "default_api_token_env")]
    pub api_token_env: String,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            username: String::new(),
            api_token_env: default_api_token_env(),
        }
    }
}

fn default_api_token_env() -> String {
    "CONFLUENCE_API_TOKEN".into()
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Default export output directory.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Whether exports include archived spaces by default.
    #[serde(default)]
    pub include_archived: bool,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            include_archived: false,
        }
    }
}

fn default_output_dir() -> String {
    "~/confluence-export".into()
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.confdown/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| ConfdownError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.confdown/confdown.toml`).
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
    let content = std::fs::read_to_string(path).map_err(|e| ConfdownError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| ConfdownError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| ConfdownError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| ConfdownError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| ConfdownError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Check that the connection section is usable: base URL present and
/// parseable, username present, API token env var set and non-empty.
pub fn validate_connection(config: &AppConfig) -> Result<()> {
    let conn = &config.connection;

    if conn.base_url.is_empty() {
        return Err(ConfdownError::config(
            "no base_url configured. Run `confdown config init` and fill in [connection].",
        ));
    }
    url::Url::parse(&conn.base_url)
        .map_err(|e| ConfdownError::config(format!("invalid base_url `{}`: {e}", conn.base_url)))?;

    if conn.username.is_empty() {
        return Err(ConfdownError::config(
            "no username configured. Set [connection].username to your account email.",
        ));
    }

    api_token(config).map(|_| ())
}

/// Read the API token from the configured environment variable.
pub fn api_token(config: &AppConfig) -> Result<String> {
    let var_name = &config.connection.api_token_env;
    match std::env::var(var_name) {
        Ok(val) if !val.is_empty() => Ok(val),
        _ => Err(ConfdownError::config(format!(
            "Confluence API token not found. Set the {var_name} environment variable.\n\
             Create a token at https://id.atlassian.com/manage-profile/security/api-tokens"
        ))),
    }
}

/// Expand a leading `~/` in a configured path against the user's home.
pub fn resolve_output_dir(raw: &str) -> Result<PathBuf> {
    if let Some(rest) = raw.strip_prefix("~/") {
        let home = dirs::home_dir()
            .ok_or_else(|| ConfdownError::config("could not determine home directory"))?;
        return Ok(home.join(rest));
    }
    Ok(PathBuf::from(raw))
}
