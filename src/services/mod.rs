//! Service layer for backtrace requests
//!
//! Sits between the CLI and the traversal engine: validates requests, picks
//! between the live data source and demo mode, and maps failures onto the
//! status codes a request handler reports.

pub mod backtrace_service;

pub use backtrace_service::{BacktraceRequest, BacktraceService, PingResponse, demo_result};

use crate::datasource::DataSourceError;
use serde::Serialize;
use thiserror::Error;

/// Errors surfaced to whoever made the request
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("No data source configured and demo mode is off")]
    NotConfigured,

    #[error("Data source error: {0}")]
    DataSource(#[from] DataSourceError),
}

impl ServiceError {
    /// HTTP-style status code for this error
    pub fn status(&self) -> u16 {
        match self {
            ServiceError::InvalidRequest(_) => 400,
            ServiceError::NotConfigured => 503,
            ServiceError::DataSource(_) => 502,
        }
    }
}

/// Serializable error body
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorResponse {
    pub status: u16,
    pub message: String,
}

impl From<&ServiceError> for ErrorResponse {
    fn from(err: &ServiceError) -> Self {
        Self {
            status: err.status(),
            message: err.to_string(),
        }
    }
}

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;
