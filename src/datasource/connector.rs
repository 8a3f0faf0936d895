//! Data source trait and factory

use super::rows::{FlowMeta, SubFlowHit, TransactionInvocation, TransactionMeta};
use super::snapshot::SnapshotDataSource;
use super::DataSourceResult;
use crate::config::DataSourceSettings;
use std::path::Path;

/// Query capability over the workflow configuration store
///
/// Calls are blocking round-trips. The traversal engine issues them strictly
/// in program order and never overlaps two queries within one backtrace.
pub trait DataSource: Send + Sync {
    /// Sub flows whose configuration text contains `text` (case-sensitive),
    /// most recently modified first
    fn find_nodes_containing(&self, text: &str) -> DataSourceResult<Vec<SubFlowHit>>;

    /// Metadata for a flow key; an empty record for blank or unknown keys
    fn flow_meta(&self, flow_key: &str) -> DataSourceResult<FlowMeta>;

    /// Transactions that invoke the flow named `flow_name`
    fn transactions_invoking(&self, flow_name: &str)
    -> DataSourceResult<Vec<TransactionInvocation>>;

    /// Metadata for a transaction key; an empty record for blank or unknown keys
    fn transaction_meta(&self, transaction_key: &str) -> DataSourceResult<TransactionMeta>;

    /// Get connector type name
    fn source_type(&self) -> &str;

    /// Health check (optional, returns a short identity if the source is reachable)
    fn ping(&self) -> DataSourceResult<String> {
        Ok(self.source_type().to_string())
    }
}

/// Supported data source kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSourceType {
    YamlSnapshot,
    JsonSnapshot,
}

impl DataSourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataSourceType::YamlSnapshot => "snapshot-yaml",
            DataSourceType::JsonSnapshot => "snapshot-json",
        }
    }

    /// Pick the snapshot format from the file extension (YAML unless `.json`)
    pub fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => DataSourceType::JsonSnapshot,
            _ => DataSourceType::YamlSnapshot,
        }
    }
}

/// Open the configured data source
///
/// Returns `Ok(None)` when no data source is configured, which lets the caller
/// decide between demo mode and refusing the request.
pub async fn open_data_source(
    settings: &DataSourceSettings,
) -> DataSourceResult<Option<Box<dyn DataSource>>> {
    let Some(snapshot) = settings
        .snapshot
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
    else {
        tracing::debug!("No data source configured");
        return Ok(None);
    };

    let path = Path::new(snapshot);
    tracing::debug!(
        "Creating data source connector: {}",
        DataSourceType::for_path(path).as_str()
    );

    let source = SnapshotDataSource::load(path).await?;
    Ok(Some(Box::new(source)))
}
