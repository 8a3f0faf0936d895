//! Configuration schema definitions
//!
//! Defines the structure of configuration files using serde for serialization.

use crate::backtrace::{BacktraceLimits, DEFAULT_MAX_DEPTH, DEFAULT_MAX_ROUTES};
use serde::{Deserialize, Serialize};

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Answer backtraces with the canned demo result instead of a data source
    #[serde(default)]
    pub demo: bool,

    /// Data source configuration
    #[serde(default)]
    pub data_source: DataSourceSettings,

    /// Backtrace bounds
    #[serde(default)]
    pub backtrace: BacktraceSettings,
}

/// Data source configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DataSourceSettings {
    /// Path to a configuration snapshot (YAML, or JSON by extension)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<String>,
}

/// Backtrace bounds
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BacktraceSettings {
    /// Flow levels climbed when a request does not say
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Routes returned per request; not overridable per request
    #[serde(default = "default_max_routes")]
    pub max_routes: usize,
}

impl BacktraceSettings {
    /// Limits for one request, taking its depth if it gave one
    pub fn limits(&self, requested_depth: Option<usize>) -> BacktraceLimits {
        BacktraceLimits::new(requested_depth.unwrap_or(self.max_depth), self.max_routes)
    }
}

/// One config file as written on disk
///
/// Keys missing from the file stay `None` so a lower layer keeps its value
/// when files are merged.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConfigLayer {
    #[serde(default)]
    pub demo: Option<bool>,

    #[serde(default)]
    pub data_source: DataSourceLayer,

    #[serde(default)]
    pub backtrace: BacktraceLayer,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DataSourceLayer {
    #[serde(default)]
    pub snapshot: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BacktraceLayer {
    #[serde(default)]
    pub max_depth: Option<usize>,

    #[serde(default)]
    pub max_routes: Option<usize>,
}

// Default value functions
fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

fn default_max_routes() -> usize {
    DEFAULT_MAX_ROUTES
}

impl Default for BacktraceSettings {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            max_routes: default_max_routes(),
        }
    }
}
