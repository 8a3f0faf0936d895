//! Configuration system for netkrow
//!
//! Layers built-in defaults, the root config file, an explicit config file,
//! and environment overrides into one `Config`.

mod defaults;
pub mod loader;
pub mod paths;
pub mod schema;

pub use loader::ConfigLoader;
pub use schema::{BacktraceSettings, Config, ConfigLayer, DataSourceSettings};

/// Keys accepted by `get_config_value` and `set_config_value`
pub const CONFIG_KEYS: &[&str] = &[
    "demo",
    "dataSource.snapshot",
    "backtrace.maxDepth",
    "backtrace.maxRoutes",
];

/// Get a configuration value by key (dot notation)
pub fn get_config_value(config: &Config, key: &str) -> anyhow::Result<String> {
    match key {
        "demo" => Ok(config.demo.to_string()),
        "dataSource.snapshot" => Ok(config.data_source.snapshot.clone().unwrap_or_default()),
        "backtrace.maxDepth" => Ok(config.backtrace.max_depth.to_string()),
        "backtrace.maxRoutes" => Ok(config.backtrace.max_routes.to_string()),
        _ => Err(anyhow::anyhow!("Unknown configuration key: {}", key)),
    }
}

/// Set a configuration value by key (dot notation)
pub fn set_config_value(config: &mut Config, key: &str, value: &str) -> anyhow::Result<()> {
    use anyhow::Context;
    match key {
        "demo" => {
            config.demo = value.parse().context("demo must be 'true' or 'false'")?;
        }
        "dataSource.snapshot" => {
            if value.trim().is_empty() {
                config.data_source.snapshot = None;
            } else {
                config.data_source.snapshot = Some(value.trim().to_string());
            }
        }
        "backtrace.maxDepth" => {
            config.backtrace.max_depth = value
                .parse()
                .context("backtrace.maxDepth must be a non-negative number")?;
        }
        "backtrace.maxRoutes" => {
            let max_routes: usize = value
                .parse()
                .context("backtrace.maxRoutes must be a positive number")?;
            if max_routes == 0 {
                return Err(anyhow::anyhow!("backtrace.maxRoutes must be at least 1"));
            }
            config.backtrace.max_routes = max_routes;
        }
        _ => return Err(anyhow::anyhow!("Unknown configuration key: {}", key)),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_every_known_key() {
        let config = Config::default();
        for key in CONFIG_KEYS {
            assert!(get_config_value(&config, key).is_ok(), "{key}");
        }
        assert_eq!(get_config_value(&config, "dataSource.snapshot").unwrap(), "");
        assert!(get_config_value(&config, "ui.skin").is_err());
    }

    #[test]
    fn test_set_values() {
        let mut config = Config::default();
        set_config_value(&mut config, "demo", "true").unwrap();
        set_config_value(&mut config, "dataSource.snapshot", " export.yaml ").unwrap();
        set_config_value(&mut config, "backtrace.maxDepth", "0").unwrap();

        assert!(config.demo);
        assert_eq!(config.data_source.snapshot.as_deref(), Some("export.yaml"));
        assert_eq!(config.backtrace.max_depth, 0);

        set_config_value(&mut config, "dataSource.snapshot", "").unwrap();
        assert!(config.data_source.snapshot.is_none());
    }

    #[test]
    fn test_set_rejects_bad_values() {
        let mut config = Config::default();
        assert!(set_config_value(&mut config, "demo", "yes").is_err());
        assert!(set_config_value(&mut config, "backtrace.maxDepth", "-1").is_err());
        assert!(set_config_value(&mut config, "backtrace.maxRoutes", "0").is_err());
        assert!(set_config_value(&mut config, "nope", "1").is_err());
        assert_eq!(config, Config::default());
    }
}
