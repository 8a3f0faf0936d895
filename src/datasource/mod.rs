//! Data sources for backtrace queries
//!
//! A data source answers the query shapes the traversal engine needs against
//! the workflow configuration store:
//! - which sub flows contain a piece of text
//! - what a flow is called
//! - which transactions invoke a named flow
//! - what a transaction looks like
//!
//! Connectors:
//! - Snapshot files (YAML or JSON export of the configuration tables)

mod connector;
mod rows;
mod snapshot;

pub use connector::{DataSource, DataSourceType, open_data_source};
pub use rows::{FlowMeta, SubFlowHit, TransactionInvocation, TransactionMeta};
pub use snapshot::{
    Action, EventCondition, EventRow, FlowRow, InvokedFlow, Snapshot, SnapshotDataSource, SubFlow,
    TransactionRow,
};

use std::path::PathBuf;

/// Data source errors
///
/// Every failure a data source can produce collapses into this one type; the
/// traversal engine never recovers from it.
#[derive(Debug, thiserror::Error)]
pub enum DataSourceError {
    #[error("Data source unavailable: {0}")]
    Unavailable(String),

    #[error("Failed to read data source file {path}: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse data source file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Query '{query}' failed: {message}")]
    Query {
        query: &'static str,
        message: String,
    },
}

/// Result type for data source operations
pub type DataSourceResult<T> = Result<T, DataSourceError>;
