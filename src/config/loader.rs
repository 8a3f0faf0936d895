//! Configuration loading and merging logic
//!
//! Handles loading configuration from multiple sources and merging them
//! according to precedence rules.

use super::{
    defaults, paths,
    schema::{BacktraceSettings, Config, ConfigLayer, DataSourceSettings},
};
use anyhow::{Context, Result};
use std::path::Path;

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with all layers merged
    ///
    /// Precedence order (highest to lowest):
    /// 1. Environment variable overrides
    /// 2. Explicit config file (`--config`)
    /// 3. Root config
    /// 4. Built-in defaults
    pub fn load(explicit: Option<&Path>) -> Result<Config> {
        let mut config = Self::load_defaults();

        let root_path = paths::root_config_path();
        if root_path.exists() {
            match Self::load_layer(&root_path) {
                Ok(root_layer) => config = Self::merge_config(config, root_layer),
                Err(e) => tracing::warn!("Ignoring root config: {:#}", e),
            }
        }

        // An explicit file was asked for, so it has to load
        if let Some(path) = explicit {
            let explicit_layer = Self::load_layer(path)?;
            config = Self::merge_config(config, explicit_layer);
        }

        config = Self::apply_env_overrides(config);

        Ok(config)
    }

    /// Load configuration from a file, filling missing keys with defaults
    pub fn load_file(path: &Path) -> Result<Config> {
        let layer = Self::load_layer(path)?;
        Ok(Self::merge_config(Self::load_defaults(), layer))
    }

    /// Load a file as a layer, keeping only the keys it sets
    fn load_layer(path: &Path) -> Result<ConfigLayer> {
        if !path.exists() {
            return Err(anyhow::anyhow!("Config file not found: {}", path.display()));
        }

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let layer: ConfigLayer = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(layer)
    }

    /// Validate configuration by loading and checking for errors
    ///
    /// Fails on invalid YAML, invalid value types, file read errors, and a
    /// route limit of zero.
    pub fn validate(explicit: Option<&Path>) -> Result<()> {
        let root_path = paths::root_config_path();
        if root_path.exists() {
            let config = Self::load_file(&root_path)?;
            Self::check(&config)
                .with_context(|| format!("Invalid config file: {}", root_path.display()))?;
        }

        let merged = Self::load(explicit).context("Failed to load merged configuration")?;
        Self::check(&merged)?;

        Ok(())
    }

    fn check(config: &Config) -> Result<()> {
        if config.backtrace.max_routes == 0 {
            return Err(anyhow::anyhow!("backtrace.maxRoutes must be at least 1"));
        }
        if let Some(snapshot) = &config.data_source.snapshot {
            if snapshot.trim().is_empty() {
                return Err(anyhow::anyhow!("dataSource.snapshot must not be blank"));
            }
        }
        Ok(())
    }

    /// Load default configuration
    pub fn load_defaults() -> Config {
        defaults::default_config()
    }

    /// Merge a file layer over a configuration
    ///
    /// Keys the layer leaves unset keep the base value.
    fn merge_config(base: Config, layer: ConfigLayer) -> Config {
        Config {
            demo: layer.demo.unwrap_or(base.demo),
            data_source: DataSourceSettings {
                snapshot: layer.data_source.snapshot.or(base.data_source.snapshot),
            },
            backtrace: BacktraceSettings {
                max_depth: layer.backtrace.max_depth.unwrap_or(base.backtrace.max_depth),
                max_routes: layer.backtrace.max_routes.unwrap_or(base.backtrace.max_routes),
            },
        }
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(mut config: Config) -> Config {
        // NETKROW_DEMO override
        if let Ok(demo) = std::env::var("NETKROW_DEMO") {
            match demo.parse::<bool>() {
                Ok(val) => config.demo = val,
                Err(_) => tracing::warn!("Ignoring NETKROW_DEMO={:?}: not a boolean", demo),
            }
        }

        // NETKROW_SNAPSHOT override
        if let Ok(snapshot) = std::env::var("NETKROW_SNAPSHOT") {
            if !snapshot.trim().is_empty() {
                config.data_source.snapshot = Some(snapshot);
            }
        }

        // NETKROW_MAX_DEPTH override
        if let Ok(depth) = std::env::var("NETKROW_MAX_DEPTH") {
            match depth.parse::<usize>() {
                Ok(val) => config.backtrace.max_depth = val,
                Err(_) => tracing::warn!("Ignoring NETKROW_MAX_DEPTH={:?}: not a number", depth),
            }
        }

        config
    }

    /// Save configuration to a file
    pub fn save(config: &Config, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            paths::ensure_dir(parent)?;
        }

        let yaml =
            serde_yaml::to_string(config).context("Failed to serialize configuration to YAML")?;

        std::fs::write(path, yaml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Save root configuration
    pub fn save_root(config: &Config) -> Result<()> {
        Self::save(config, &paths::root_config_path())
    }
}
