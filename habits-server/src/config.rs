//! Configuration for the Timeless Habits webhook server.
//!
//! Supports layered configuration with the following priority (highest first):
//! 1. CLI arguments
//! 2. Environment variables (via clap `env` attribute)
//! 3. TOML config file (`~/.config/timeless-habits/config.toml`)
//! 4. Compiled defaults
//!
//! The two secrets (client secret and access token) are only read from the
//! CLI or the environment, never from the config file.

use std::path::PathBuf;
use std::time::Duration;

use crate::server::DEFAULT_MAX_BODY_SIZE;

/// Errors that can occur when loading server configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to parse the TOML configuration.
    #[error("failed to parse config file: {0}")]
    ParseToml(#[from] toml::de::Error),

    /// A required secret was not supplied.
    #[error("missing required secret: set {0}")]
    MissingSecret(&'static str),
}

// ---------------------------------------------------------------------------
// TOML file structs (all fields Option for partial overrides)
// ---------------------------------------------------------------------------

/// Top-level TOML config file structure.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct HabitsConfigFile {
    server: ServerFileConfig,
    todoist: TodoistFileConfig,
}

/// `[server]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ServerFileConfig {
    bind_addr: Option<String>,
    max_body_size: Option<usize>,
}

/// `[todoist]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct TodoistFileConfig {
    api_base_url: Option<String>,
    request_timeout_secs: Option<u64>,
}

// ---------------------------------------------------------------------------
// CLI arguments
// ---------------------------------------------------------------------------

/// CLI arguments for the webhook server.
#[derive(clap::Parser, Debug, Default)]
#[command(version, about = "Timeless Habits webhook server")]
pub struct HabitsCliArgs {
    /// Address to bind the server to.
    #[arg(short, long, env = "HABITS_ADDR")]
    pub bind: Option<String>,

    /// Path to config file (default: `~/.config/timeless-habits/config.toml`).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Maximum accepted webhook body size in bytes.
    #[arg(long)]
    pub max_body_size: Option<usize>,

    /// Base URL of the Todoist REST API.
    #[arg(long, env = "TODOIST_API_BASE_URL")]
    pub api_base_url: Option<String>,

    /// Timeout for outbound Todoist requests, in seconds.
    #[arg(long)]
    pub request_timeout_secs: Option<u64>,

    /// Todoist app client secret used to verify webhook signatures.
    #[arg(long, env = "TODOIST_CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: Option<String>,

    /// Todoist access token used to create tasks.
    #[arg(long, env = "TODOIST_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,

    /// Log level filter (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", env = "HABITS_LOG")]
    pub log_level: String,
}

// ---------------------------------------------------------------------------
// Resolved configuration
// ---------------------------------------------------------------------------

/// A secret string that never shows up in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    /// Wraps a secret value.
    #[must_use]
    pub const fn new(value: String) -> Self {
        Self(value)
    }

    /// The raw secret.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Secret(..)")
    }
}

/// Fully resolved server configuration.
#[derive(Debug, Clone)]
pub struct HabitsConfig {
    /// Address to bind the server to (e.g., `0.0.0.0:8080`).
    pub bind_addr: String,
    /// Maximum accepted request body size in bytes.
    pub max_body_size: usize,
    /// Todoist REST API base URL, without a trailing slash.
    pub api_base_url: String,
    /// Timeout applied to each outbound Todoist request.
    pub request_timeout: Duration,
    /// Shared secret for webhook signature verification.
    pub client_secret: Secret,
    /// Bearer token for task creation.
    pub access_token: Secret,
    /// Log level filter string.
    pub log_level: String,
}

/// Defaults for every non-secret setting.
struct Defaults {
    bind_addr: &'static str,
    api_base_url: &'static str,
    request_timeout_secs: u64,
}

const DEFAULTS: Defaults = Defaults {
    bind_addr: "0.0.0.0:8080",
    api_base_url: "https://api.todoist.com/rest/v2",
    request_timeout_secs: 10,
};

impl HabitsConfig {
    /// Load configuration by merging CLI args, env vars, and a TOML file.
    ///
    /// If `--config` is given and the file does not exist, returns an error.
    /// If no `--config` is given, the default path is tried and missing file
    /// is treated as empty config.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the explicit config file cannot be read
    /// or parsed, or if either secret is missing.
    pub fn load(cli: &HabitsCliArgs) -> Result<Self, ConfigError> {
        let file = load_config_file(cli.config.as_deref())?;
        Self::resolve(cli, &file)
    }

    /// Resolve a `HabitsConfig` from CLI args and a parsed config file.
    ///
    /// Priority: CLI > file > default.
    fn resolve(cli: &HabitsCliArgs, file: &HabitsConfigFile) -> Result<Self, ConfigError> {
        let client_secret = required_secret(cli.client_secret.as_deref(), "TODOIST_CLIENT_SECRET")?;
        let access_token = required_secret(cli.access_token.as_deref(), "TODOIST_ACCESS_TOKEN")?;

        let api_base_url = cli
            .api_base_url
            .clone()
            .or_else(|| file.todoist.api_base_url.clone())
            .unwrap_or_else(|| DEFAULTS.api_base_url.to_string());

        Ok(Self {
            bind_addr: cli
                .bind
                .clone()
                .or_else(|| file.server.bind_addr.clone())
                .unwrap_or_else(|| DEFAULTS.bind_addr.to_string()),
            max_body_size: cli
                .max_body_size
                .or(file.server.max_body_size)
                .unwrap_or(DEFAULT_MAX_BODY_SIZE),
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            request_timeout: Duration::from_secs(
                cli.request_timeout_secs
                    .or(file.todoist.request_timeout_secs)
                    .unwrap_or(DEFAULTS.request_timeout_secs),
            ),
            client_secret,
            access_token,
            log_level: cli.log_level.clone(),
        })
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn required_secret(value: Option<&str>, var: &'static str) -> Result<Secret, ConfigError> {
    value
        .filter(|v| !v.is_empty())
        .map(|v| Secret::new(v.to_string()))
        .ok_or(ConfigError::MissingSecret(var))
}

/// Load and parse a TOML config file.
fn load_config_file(
    explicit_path: Option<&std::path::Path>,
) -> Result<HabitsConfigFile, ConfigError> {
    let path = if let Some(p) = explicit_path {
        let contents = std::fs::read_to_string(p).map_err(|e| ConfigError::ReadFile {
            path: p.to_path_buf(),
            source: e,
        })?;
        return Ok(toml::from_str(&contents)?);
    } else {
        let Some(config_dir) = dirs::config_dir() else {
            return Ok(HabitsConfigFile::default());
        };
        config_dir.join("timeless-habits").join("config.toml")
    };

    match std::fs::read_to_string(&path) {
        Ok(contents) => Ok(toml::from_str(&contents)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HabitsConfigFile::default()),
        Err(e) => Err(ConfigError::ReadFile { path, source: e }),
    }
}
