//! Backtrace service
//!
//! The request handler around the traversal engine. Owns the data source (if
//! any) and the configured bounds; each call is independent.

use super::{ServiceError, ServiceResult};
use crate::backtrace::{
    self, BacktraceResult, Details, Mode, NodeKeys, PathNode, Route, TransactionSummary,
};
use crate::config::{BacktraceSettings, Config};
use crate::datasource::{DataSource, SubFlowHit, open_data_source};
use serde::{Deserialize, Serialize};

const DEMO_TRANSACTION: &str = "SHIPMENT_INVOICE";
const DEMO_FLOW: &str = "OrderDelivery";

/// A backtrace request as a caller submits it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BacktraceRequest {
    pub search: String,
    /// Falls back to the configured depth when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<usize>,
}

impl BacktraceRequest {
    pub fn new(search: impl Into<String>) -> Self {
        Self {
            search: search.into(),
            max_depth: None,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }
}

/// Reachability report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PingResponse {
    pub mode: Mode,
    /// Identity reported by the data source; absent in demo mode
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// Service answering backtrace requests
pub struct BacktraceService {
    source: Option<Box<dyn DataSource>>,
    demo: bool,
    settings: BacktraceSettings,
}

impl BacktraceService {
    /// Service backed by a live data source
    pub fn new(source: Box<dyn DataSource>, settings: BacktraceSettings) -> Self {
        Self {
            source: Some(source),
            demo: false,
            settings,
        }
    }

    /// Service that always answers with the canned demo result
    pub fn with_demo(settings: BacktraceSettings) -> Self {
        Self {
            source: None,
            demo: true,
            settings,
        }
    }

    /// Service with no data source; refuses every request unless in demo mode
    pub fn unconfigured(settings: BacktraceSettings) -> Self {
        Self {
            source: None,
            demo: false,
            settings,
        }
    }

    /// Build the service described by a loaded configuration
    ///
    /// Demo mode skips opening the data source entirely.
    pub async fn from_config(config: &Config) -> ServiceResult<Self> {
        if config.demo {
            tracing::info!("Demo mode enabled, data source not opened");
            return Ok(Self::with_demo(config.backtrace.clone()));
        }

        match open_data_source(&config.data_source).await? {
            Some(source) => {
                tracing::info!("Using data source {}", source.source_type());
                Ok(Self::new(source, config.backtrace.clone()))
            }
            None => {
                tracing::warn!("No data source configured and demo mode is off");
                Ok(Self::unconfigured(config.backtrace.clone()))
            }
        }
    }

    pub fn is_demo(&self) -> bool {
        self.demo
    }

    /// Whether requests can be answered at all
    pub fn is_configured(&self) -> bool {
        self.demo || self.source.is_some()
    }

    /// Check the data source is reachable
    pub fn ping(&self) -> ServiceResult<PingResponse> {
        if self.demo {
            return Ok(PingResponse {
                mode: Mode::Demo,
                source: None,
            });
        }
        let source = self.source()?;
        let identity = source.ping()?;
        Ok(PingResponse {
            mode: Mode::Real,
            source: Some(identity),
        })
    }

    /// Raw data source hits for `text`, without climbing
    pub fn find_hits(&self, text: &str) -> ServiceResult<Vec<SubFlowHit>> {
        let text = validate_search(text)?;
        Ok(self.source()?.find_nodes_containing(text)?)
    }

    /// Answer a backtrace request
    ///
    /// Blank searches are rejected before anything else. Demo mode answers
    /// without touching any data source.
    pub fn backtrace(&self, request: &BacktraceRequest) -> ServiceResult<BacktraceResult> {
        let search = validate_search(&request.search)?;
        if !self.is_configured() {
            return Err(ServiceError::NotConfigured);
        }
        if self.demo {
            tracing::debug!("Answering {:?} with the demo result", search);
            return Ok(demo_result(search));
        }

        let limits = self.settings.limits(request.max_depth);
        Ok(backtrace::backtrace(self.source()?, search, limits)?)
    }

    fn source(&self) -> ServiceResult<&dyn DataSource> {
        self.source.as_deref().ok_or(ServiceError::NotConfigured)
    }
}

fn validate_search(search: &str) -> ServiceResult<&str> {
    let search = search.trim();
    if search.is_empty() {
        return Err(ServiceError::InvalidRequest(
            "search must not be blank".to_string(),
        ));
    }
    Ok(search)
}

/// The canned result returned in demo mode
pub fn demo_result(search: &str) -> BacktraceResult {
    let none = NodeKeys::default();
    let route: Route = vec![
        PathNode::transaction(DEMO_TRANSACTION, Details::new()),
        PathNode::flow(&none, Some(DEMO_FLOW), Details::new()),
        PathNode::service(search, &none, None, Details::new()),
    ]
    .into();

    BacktraceResult {
        mode: Mode::Demo,
        routes: vec![route],
        transactions: vec![TransactionSummary::new(DEMO_TRANSACTION, DEMO_FLOW)],
    }
}
