//! Application configuration.
//!
//! Settings come from, in increasing precedence: built-in defaults, the
//! optional `config.json` in the data directory, environment variables, and
//! command-line flags.

use crate::error::{CliError, CliResult};
use focus_sync::RestConfig;
use focus_timer::Durations;
use serde::Deserialize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Overrides the data directory.
pub const ENV_DATA_DIR: &str = "FOCUS_DATA_DIR";
/// Remote project URL.
pub const ENV_REMOTE_URL: &str = "FOCUS_REMOTE_URL";
/// Remote public API key.
pub const ENV_REMOTE_KEY: &str = "FOCUS_REMOTE_KEY";
/// Access token of the signed-in user.
pub const ENV_ACCESS_TOKEN: &str = "FOCUS_ACCESS_TOKEN";

/// Name of the optional configuration file inside the data directory.
pub const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct FileConfig {
    remote_url: Option<String>,
    remote_key: Option<String>,
    access_token: Option<String>,
    work_minutes: Option<u32>,
    short_break_minutes: Option<u32>,
    long_break_minutes: Option<u32>,
}

/// Remote store connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteSettings {
    /// Project URL.
    pub url: String,
    /// Public API key.
    pub api_key: String,
    /// Access token, absent when signed out.
    pub access_token: Option<String>,
}

/// Resolved configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Directory holding the JSON stores.
    pub data_dir: PathBuf,
    /// Remote settings; `None` runs local-only.
    pub remote: Option<RemoteSettings>,
    /// Timer durations.
    pub durations: Durations,
}

impl AppConfig {
    /// Loads configuration from the process environment.
    pub fn load(data_dir: Option<PathBuf>) -> CliResult<Self> {
        Self::resolve(data_dir, |key| std::env::var(key).ok())
    }

    /// Loads configuration with `env` standing in for the environment.
    pub fn resolve(
        data_dir: Option<PathBuf>,
        env: impl Fn(&str) -> Option<String>,
    ) -> CliResult<Self> {
        let data_dir = data_dir
            .or_else(|| env(ENV_DATA_DIR).map(PathBuf::from))
            .or_else(default_data_dir)
            .ok_or_else(|| CliError::config("cannot locate a home directory; pass --data-dir"))?;
        let file = read_file(&data_dir.join(CONFIG_FILE))?;

        let pick = |key: &str, fallback: Option<String>| {
            env(key)
                .or(fallback)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let url = pick(ENV_REMOTE_URL, file.remote_url);
        let api_key = pick(ENV_REMOTE_KEY, file.remote_key);
        let access_token = pick(ENV_ACCESS_TOKEN, file.access_token);

        let remote = match (url, api_key) {
            (Some(url), Some(api_key)) => Some(RemoteSettings {
                url,
                api_key,
                access_token,
            }),
            (None, None) => None,
            _ => {
                tracing::warn!("remote sync needs both a URL and an API key; running local-only");
                None
            }
        };

        let defaults = Durations::default();
        let durations = Durations::from_minutes(
            file.work_minutes.unwrap_or(defaults.work / 60),
            file.short_break_minutes.unwrap_or(defaults.short_break / 60),
            file.long_break_minutes.unwrap_or(defaults.long_break / 60),
        );

        Ok(Self {
            data_dir,
            remote,
            durations,
        })
    }

    /// Returns the REST client configuration, if sync is configured.
    pub fn rest_config(&self) -> Option<RestConfig> {
        self.remote.as_ref().map(|remote| {
            let config = RestConfig::new(&remote.url, &remote.api_key);
            match &remote.access_token {
                Some(token) => config.with_access_token(token),
                None => config,
            }
        })
    }
}

fn default_data_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".focus"))
}

fn read_file(path: &Path) -> CliResult<FileConfig> {
    match fs::read_to_string(path) {
        Ok(text) => serde_json::from_str(&text)
            .map_err(|e| CliError::config(format!("{}: {e}", path.display()))),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(FileConfig::default()),
        Err(e) => Err(e.into()),
    }
}
