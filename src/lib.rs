//! netkrow library
//!
//! Root-cause backtracing over a workflow configuration store: given a
//! service or flow, find every route of flows leading to it from the
//! transactions that can trigger it. Used by the `netkrow` binary and by the
//! integration tests.

pub mod backtrace;
pub mod cli;
pub mod config;
pub mod datasource;
pub mod services;

// Re-export commonly used types for convenience
pub use backtrace::{BacktraceLimits, BacktraceResult, Mode, PathNode, Route, TransactionSummary};
pub use datasource::{DataSource, DataSourceError, SnapshotDataSource};
pub use services::{BacktraceRequest, BacktraceService, ServiceError};
