use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::model::{ImportDescriptor, DEFAULT_MIME_TYPE};

pub const LAUNCHER_CONFIG_FILENAME: &str = "launcher.json";
pub const MAX_CONCURRENT_LOADS_ENV: &str = "LAUNCHER_MAX_CONCURRENT_LOADS";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LauncherConfig {
    /// Root source loaded at startup, if any.
    pub root: Option<PathBuf>,
    pub root_type: String,
    pub retry: RetryPreferences,
    pub loader: LoaderPreferences,
    pub expression_cache: ExpressionCachePreferences,
    pub bus_capacity: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPreferences {
    pub interval_ms: u64,
    /// `None` retries failed imports forever.
    pub max_attempts: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderPreferences {
    pub max_concurrent_loads: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpressionCachePreferences {
    pub max_entries: u64,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            root: None,
            root_type: DEFAULT_MIME_TYPE.to_string(),
            retry: RetryPreferences::default(),
            loader: LoaderPreferences::default(),
            expression_cache: ExpressionCachePreferences::default(),
            bus_capacity: 256,
        }
    }
}

impl Default for RetryPreferences {
    fn default() -> Self {
        Self {
            interval_ms: 10_000,
            max_attempts: None,
        }
    }
}

impl Default for LoaderPreferences {
    fn default() -> Self {
        Self {
            max_concurrent_loads: 8,
        }
    }
}

impl Default for ExpressionCachePreferences {
    fn default() -> Self {
        Self { max_entries: 128 }
    }
}

impl LauncherConfig {
    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry.interval_ms)
    }

    /// Worker pool size; the environment variable wins over the file.
    pub fn max_concurrent_loads(&self) -> usize {
        read_limit(MAX_CONCURRENT_LOADS_ENV, self.loader.max_concurrent_loads.max(1))
    }

    /// The configured root, resolved against `dir` when relative.
    pub fn root_descriptor(&self, dir: &Path) -> Option<ImportDescriptor> {
        let root = self.root.as_ref()?;
        let path = if root.is_absolute() {
            root.clone()
        } else {
            dir.join(root)
        };
        Some(ImportDescriptor::new(path, self.root_type.clone()))
    }

    pub fn validate(&self) -> CoreResult<()> {
        if self.retry.interval_ms == 0 {
            return Err(CoreError::Config(
                "retry.interval_ms must be greater than zero".to_string(),
            ));
        }
        if self.retry.max_attempts == Some(0) {
            return Err(CoreError::Config(
                "retry.max_attempts must be at least 1 when set".to_string(),
            ));
        }
        if self.root_type.trim().is_empty() {
            return Err(CoreError::Config("root_type must not be empty".to_string()));
        }
        Ok(())
    }
}

pub fn load_or_create_config(dir: &Path) -> CoreResult<LauncherConfig> {
    std::fs::create_dir_all(dir).map_err(|error| {
        CoreError::Config(format!(
            "failed to create config directory {}: {error}",
            dir.display()
        ))
    })?;

    let path = config_path(dir);
    if !path.exists() {
        let config = LauncherConfig::default();
        write_config(&path, &config)?;
        return Ok(config);
    }

    let data = std::fs::read_to_string(&path).map_err(|error| {
        CoreError::Config(format!(
            "failed to read launcher config {}: {error}",
            path.display()
        ))
    })?;
    let config: LauncherConfig = serde_json::from_str(&data).map_err(|error| {
        CoreError::Config(format!(
            "failed to parse launcher config {}: {error}",
            path.display()
        ))
    })?;
    config.validate()?;
    Ok(config)
}

pub fn write_config(path: &Path, config: &LauncherConfig) -> CoreResult<()> {
    let data = serde_json::to_string_pretty(config).map_err(|error| {
        CoreError::Config(format!("failed to serialize launcher config: {error}"))
    })?;
    std::fs::write(path, data).map_err(|error| {
        CoreError::Config(format!(
            "failed to write launcher config {}: {error}",
            path.display()
        ))
    })
}

pub fn config_path(dir: &Path) -> PathBuf {
    dir.join(LAUNCHER_CONFIG_FILENAME)
}

fn read_limit(name: &str, default: usize) -> usize {
    env::var(name)
        .ok()
        .and_then(|value| value.parse::<usize>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn creates_default_config_when_missing() {
        let dir = tempdir().expect("tempdir");
        let config = load_or_create_config(dir.path()).expect("config");
        assert_eq!(config, LauncherConfig::default());
        assert!(config_path(dir.path()).exists());
        assert_eq!(config.retry_interval(), Duration::from_secs(10));

        let reloaded = load_or_create_config(dir.path()).expect("reload");
        assert_eq!(reloaded, config);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let dir = tempdir().expect("tempdir");
        std::fs::write(
            config_path(dir.path()),
            r#"{ "root": "links.xml", "retry": { "max_attempts": 3 } }"#,
        )
        .expect("write");

        let config = load_or_create_config(dir.path()).expect("config");
        assert_eq!(config.retry.max_attempts, Some(3));
        assert_eq!(config.retry.interval_ms, 10_000);
        assert_eq!(config.loader.max_concurrent_loads, 8);
        assert_eq!(
            config.root_descriptor(Path::new("/etc/launcher")),
            Some(ImportDescriptor::xml("/etc/launcher/links.xml"))
        );
    }

    #[test]
    fn rejects_invalid_values() {
        let dir = tempdir().expect("tempdir");
        std::fs::write(
            config_path(dir.path()),
            r#"{ "retry": { "interval_ms": 0 } }"#,
        )
        .expect("write");
        assert!(matches!(
            load_or_create_config(dir.path()),
            Err(CoreError::Config(_))
        ));

        std::fs::write(config_path(dir.path()), "{ not json").expect("write");
        assert!(matches!(
            load_or_create_config(dir.path()),
            Err(CoreError::Config(_))
        ));
    }

    #[test]
    fn read_limit_ignores_invalid_values() {
        assert_eq!(read_limit("LAUNCHER_TEST_UNSET_LIMIT", 4), 4);
    }
}
