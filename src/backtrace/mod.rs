//! Backtrace functionality
//!
//! Answers "what can trigger execution of X?": finds the configuration that
//! mentions X, then walks up through the flows that reference it until it
//! reaches the transactions that invoke them. Every path found is returned
//! root first as a route `Transaction -> Flow -> ... -> Service`.

mod details;
mod engine;
mod format;
mod models;

pub use engine::{
    BacktraceLimits, DEFAULT_MAX_DEPTH, DEFAULT_MAX_ROUTES, VisitKey, backtrace,
};
pub use details::{flow_details, transaction_details};
pub use format::format_backtrace_result;
pub use models::{
    BacktraceResult, Details, Mode, NodeKeys, NodeKind, PathNode, Route, TransactionSummary,
};
