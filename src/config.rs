//! File and environment configuration for the event feed.
//!
//! Lookup order: explicit path, `./config/events.yaml`, then
//! `<config dir>/cfapps-events/events.yaml`. A missing default file means
//! defaults; a missing explicit file is an error.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use cfapps_event_feed::policy::{set_policy, FeedPolicyView, RefreshMode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::logging::LogFormat;

pub const ENV_REFRESH_MODE: &str = "CFAPPS_EVENTS_REFRESH_MODE";
pub const ENV_FETCH_TIMEOUT_MS: &str = "CFAPPS_EVENTS_FETCH_TIMEOUT_MS";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub log_level: String,
    pub log_format: LogFormat,
    pub feed: FeedPolicyView,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            feed: FeedPolicyView::default(),
        }
    }
}

impl AppConfig {
    /// Publishes the feed section as the process-wide policy.
    pub fn install(&self) {
        set_policy(self.feed.clone());
    }
}

pub struct LoadedConfig {
    pub config: AppConfig,
    /// File the configuration came from, `None` when defaults were used.
    pub path: Option<PathBuf>,
}

pub fn default_config_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("config/events.yaml")];
    if let Some(mut dir) = dirs::config_dir() {
        dir.push("cfapps-events");
        dir.push("events.yaml");
        paths.push(dir);
    }
    paths
}

pub fn load_config(config_path: Option<&Path>) -> Result<LoadedConfig> {
    let path = match config_path {
        Some(path) => Some(path.to_path_buf()),
        None => default_config_paths().into_iter().find(|p| p.exists()),
    };

    let mut config = match &path {
        Some(path) => {
            let loaded = read_config_file(path)?;
            info!(path = %path.display(), "Loaded event feed configuration");
            loaded
        }
        None => {
            debug!("no configuration file found; using defaults");
            AppConfig::default()
        }
    };

    apply_env_overrides(&mut config)?;
    Ok(LoadedConfig { config, path })
}

pub fn read_config_file(path: &Path) -> Result<AppConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    if contents.trim().is_empty() {
        return Ok(AppConfig::default());
    }
    serde_yaml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file {}", path.display()))
}

pub fn apply_env_overrides(config: &mut AppConfig) -> Result<()> {
    apply_overrides(config, |key| env::var(key).ok())
}

/// Override hook with an injectable lookup so callers need not touch the
/// process environment.
pub fn apply_overrides<F>(config: &mut AppConfig, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(mode) = lookup(ENV_REFRESH_MODE) {
        config.feed.refresh_mode = mode
            .parse::<RefreshMode>()
            .map_err(|err| anyhow!(err))
            .with_context(|| format!("Invalid {ENV_REFRESH_MODE}"))?;
    }
    if let Some(timeout) = lookup(ENV_FETCH_TIMEOUT_MS) {
        config.feed.fetch_timeout_ms = timeout
            .trim()
            .parse()
            .with_context(|| format!("Invalid {ENV_FETCH_TIMEOUT_MS}"))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn overrides_replace_file_values() {
        let mut config = AppConfig::default();
        apply_overrides(
            &mut config,
            lookup(&[(ENV_REFRESH_MODE, "accumulate"), (ENV_FETCH_TIMEOUT_MS, " 250 ")]),
        )
        .unwrap();
        assert_eq!(config.feed.refresh_mode, RefreshMode::Accumulate);
        assert_eq!(config.feed.fetch_timeout_ms, 250);
    }

    #[test]
    fn bad_override_is_reported() {
        let mut config = AppConfig::default();
        let err = apply_overrides(&mut config, lookup(&[(ENV_FETCH_TIMEOUT_MS, "soon")]))
            .unwrap_err();
        assert!(err.to_string().contains(ENV_FETCH_TIMEOUT_MS));

        let err = apply_overrides(&mut config, lookup(&[(ENV_REFRESH_MODE, "merge")]))
            .unwrap_err();
        assert!(err.to_string().contains(ENV_REFRESH_MODE));
    }

    #[test]
    fn no_overrides_keeps_defaults() {
        let mut config = AppConfig::default();
        apply_overrides(&mut config, lookup(&[])).unwrap();
        assert_eq!(config, AppConfig::default());
    }
}
