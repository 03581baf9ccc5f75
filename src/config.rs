//! Configuration for livesync.
//!
//! Configuration sources (highest priority first):
//! 1. Explicit path (`--config`)
//! 2. Environment variable LIVESYNC_CONFIG
//! 3. `livesync.yaml` in the current directory or any parent
//! 4. `<config dir>/livesync/config.yaml`
//!
//! API keys can be overridden with YOUTUBE_API_KEY, BUNNYCDN_API_KEY and
//! WEBFLOW_API_KEY. Relative paths in the file are resolved against the
//! file's directory.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Duration;
use serde::Deserialize;

use crate::adapters::bunny::BunnyConfig;
use crate::adapters::webflow::WebflowConfig;
use crate::adapters::youtube::YouTubeConfig;
use crate::core::DEFAULT_WINDOW_DAYS;

const CONFIG_FILE_NAME: &str = "livesync.yaml";

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub youtube: YouTubeConfig,
    pub bunnycdn: BunnyConfig,
    pub webflow: WebflowConfig,
    #[serde(default)]
    pub app: AppConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Scratch directory for downloads (temporary directory if unset)
    pub dl_path: Option<String>,
    /// Lookback window for the video listing
    pub window_days: Option<i64>,
    /// Append debug logs to this file
    pub log_file: Option<String>,
}

/// Resolved configuration with absolute paths and overrides applied
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub youtube: YouTubeConfig,
    pub bunnycdn: BunnyConfig,
    pub webflow: WebflowConfig,
    pub dl_path: Option<PathBuf>,
    pub window_days: i64,
    pub log_file: Option<PathBuf>,
    /// Path to the config file that was loaded
    pub config_file: PathBuf,
}

impl ResolvedConfig {
    pub fn window(&self) -> Duration {
        Duration::days(self.window_days)
    }
}

/// Find config file by searching current directory and parents
fn find_config_file() -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        let config_path = current.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    let user_config = dirs::config_dir()?.join("livesync").join("config.yaml");
    user_config.exists().then_some(user_config)
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to the config file's parent
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}

fn env_override(target: &mut String, var: &str) {
    if let Ok(value) = std::env::var(var) {
        if !value.is_empty() {
            *target = value;
        }
    }
}

/// Turn a parsed file into a resolved config
fn resolve(file: ConfigFile, config_path: &Path) -> Result<ResolvedConfig> {
    let base_dir = config_path.parent().unwrap_or(Path::new("."));

    let mut youtube = file.youtube;
    let mut bunnycdn = file.bunnycdn;
    let mut webflow = file.webflow;
    env_override(&mut youtube.api_key, "YOUTUBE_API_KEY");
    env_override(&mut bunnycdn.api_key, "BUNNYCDN_API_KEY");
    env_override(&mut webflow.api_key, "WEBFLOW_API_KEY");

    let window_days = file.app.window_days.unwrap_or(DEFAULT_WINDOW_DAYS);
    if window_days <= 0 {
        anyhow::bail!("app.window_days must be positive, got {}", window_days);
    }

    Ok(ResolvedConfig {
        youtube,
        bunnycdn,
        webflow,
        dl_path: file.app.dl_path.as_deref().map(|p| resolve_path(base_dir, p)),
        window_days,
        log_file: file.app.log_file.as_deref().map(|p| resolve_path(base_dir, p)),
        config_file: config_path.to_path_buf(),
    })
}

/// Load configuration, from `explicit` if given, otherwise by discovery
pub fn load_config(explicit: Option<&Path>) -> Result<ResolvedConfig> {
    let config_path = match explicit {
        Some(path) => path.to_path_buf(),
        None => match std::env::var("LIVESYNC_CONFIG") {
            Ok(path) => PathBuf::from(path),
            Err(_) => find_config_file().with_context(|| {
                format!(
                    "No config file found (pass --config, set LIVESYNC_CONFIG or create {})",
                    CONFIG_FILE_NAME
                )
            })?,
        },
    };

    let file = load_config_file(&config_path)?;
    resolve(file, &config_path)
}
