//! Configuration loader with hierarchical merging.
//!
//! # Load Order
//!
//! 1. Default values (compile-time)
//! 2. Global config (`~/.regcap/config.toml`)
//! 3. Explicit config file (`--config`)
//! 4. Environment variables (`REGCAP_*`)
//!
//! Each layer overrides the previous. Files are merged as TOML tables
//! before deserializing, so any key a file sets wins over the layers
//! below it, even when it restates the default.

use super::{default_config_path, ConfigError, RegcapConfig};
use std::path::{Path, PathBuf};
use toml::map::Entry;
use toml::{Table, Value};
use tracing::debug;

/// Configuration loader with builder pattern.
///
/// # Example
///
/// ```no_run
/// use regcap_runtime::config::ConfigLoader;
///
/// let config = ConfigLoader::new()
///     .with_config_file("/etc/regcap/grid.toml")
///     .skip_env_vars()
///     .load()?;
/// # Ok::<(), regcap_runtime::ConfigError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    /// Global config file path (defaults to ~/.regcap/config.toml).
    global_config_path: Option<PathBuf>,

    /// Explicit config file. Unlike the global file it must exist.
    config_file: Option<PathBuf>,

    skip_env: bool,
    skip_global: bool,
}

impl ConfigLoader {
    /// Creates a new loader with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a custom global config path.
    #[must_use]
    pub fn with_global_config(mut self, path: impl Into<PathBuf>) -> Self {
        self.global_config_path = Some(path.into());
        self
    }

    /// Sets an explicit config file layered over the global one.
    #[must_use]
    pub fn with_config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_file = Some(path.into());
        self
    }

    /// Skips environment variable loading.
    ///
    /// Useful for testing with deterministic config.
    #[must_use]
    pub fn skip_env_vars(mut self) -> Self {
        self.skip_env = true;
        self
    }

    /// Skips global config loading.
    #[must_use]
    pub fn skip_global_config(mut self) -> Self {
        self.skip_global = true;
        self
    }

    /// Loads and merges configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a config file exists but cannot be read
    /// or parsed, if the explicit config file is missing, or if an
    /// environment variable holds an invalid value. A missing global
    /// config file is silently ignored.
    pub fn load(&self) -> Result<RegcapConfig, ConfigError> {
        self.load_with_env(|name| std::env::var(name).ok())
    }

    /// Same as [`load`](Self::load) with a custom environment lookup.
    fn load_with_env<F>(&self, env: F) -> Result<RegcapConfig, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut merged = Table::new();
        let mut last_path = None;

        // Layer 1: Global config
        if !self.skip_global {
            let global_path = self
                .global_config_path
                .clone()
                .unwrap_or_else(default_config_path);

            if let Some(global_table) = load_file(&global_path)? {
                debug!(path = %global_path.display(), "Loaded global config");
                merge_tables(&mut merged, global_table);
                last_path = Some(global_path);
            }
        }

        // Layer 2: Explicit config file
        if let Some(ref path) = self.config_file {
            let file_table = load_file(path)?.ok_or_else(|| ConfigError::NotFound(path.clone()))?;
            debug!(path = %path.display(), "Loaded config file");
            merge_tables(&mut merged, file_table);
            last_path = Some(path.clone());
        }

        let mut config = match last_path {
            Some(path) => decode(merged, &path)?,
            None => RegcapConfig::default(),
        };

        // Layer 3: Environment variables
        if !self.skip_env {
            apply_env_vars(&mut config, env)?;
        }

        Ok(config)
    }
}

/// Loads a config file as a raw table, returning None if it doesn't exist.
///
/// The table is checked against [`RegcapConfig`] so type errors are
/// reported against the file that holds them.
fn load_file(path: &Path) -> Result<Option<Table>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
    let table: Table = toml::from_str(&content).map_err(|e| ConfigError::parse_toml(path, e))?;
    decode(table.clone(), path)?;

    Ok(Some(table))
}

fn decode(table: Table, path: &Path) -> Result<RegcapConfig, ConfigError> {
    Value::Table(table)
        .try_into()
        .map_err(|e| ConfigError::parse_toml(path, e))
}

/// Overlays `overlay` onto `base`. Nested tables merge key by key;
/// any other value, arrays included, replaces what was there.
fn merge_tables(base: &mut Table, overlay: Table) {
    for (key, value) in overlay {
        match base.entry(key) {
            Entry::Occupied(mut slot) => match (slot.get_mut(), value) {
                (Value::Table(existing), Value::Table(table)) => merge_tables(existing, table),
                (existing, value) => *existing = value,
            },
            Entry::Vacant(slot) => {
                slot.insert(value);
            }
        }
    }
}

/// Applies environment variable overrides.
fn apply_env_vars<F>(config: &mut RegcapConfig, env: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(val) = env("REGCAP_HOST_NAMES") {
        config.configuration.host_names = val;
    }

    if let Some(val) = env("REGCAP_DEFAULT_TIMEOUT") {
        config.region_permissions.default_timeout = val.trim().parse().map_err(|_| {
            ConfigError::invalid_env_var("REGCAP_DEFAULT_TIMEOUT", "expected hours as an integer")
        })?;
    }

    if let Some(val) = env("REGCAP_DEFAULT_REGION_THREAT_LEVEL") {
        config.region_permissions.default_region_threat_level = val;
    }

    if let Some(val) = env("REGCAP_STORE_PATH") {
        config.store.path = Some(PathBuf::from(val));
    }

    Ok(())
}
