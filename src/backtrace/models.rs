//! Data structures for backtrace results

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Presentation attributes attached to a node, in insertion order
pub type Details = IndexMap<String, Value>;

/// Kind of vertex in a route
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Transaction,
    Flow,
    Service,
    /// Reserved; no route produces server nodes yet
    Server,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Transaction => "transaction",
            NodeKind::Flow => "flow",
            NodeKind::Service => "service",
            NodeKind::Server => "server",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifiers that locate a flow fragment in the configuration store
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeKeys {
    pub flow_key: String,
    pub server_key: String,
    pub sub_flow_key: String,
}

impl NodeKeys {
    pub fn new(
        flow_key: impl Into<String>,
        server_key: impl Into<String>,
        sub_flow_key: impl Into<String>,
    ) -> Self {
        Self {
            flow_key: flow_key.into().trim().to_string(),
            server_key: server_key.into().trim().to_string(),
            sub_flow_key: sub_flow_key.into().trim().to_string(),
        }
    }
}

/// One vertex of a route
///
/// Flow and service nodes carry the flow identifiers; transaction nodes carry
/// only the transaction key. Identifiers that do not belong to the node's kind
/// stay `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathNode {
    #[serde(rename = "type")]
    pub kind: NodeKind,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_flow_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_key: Option<String>,
    #[serde(default)]
    pub details: Details,
}

impl PathNode {
    /// The matched leaf, labeled with the search token
    pub fn service(
        search_token: &str,
        keys: &NodeKeys,
        flow_name: Option<&str>,
        details: Details,
    ) -> Self {
        Self::flow_like(NodeKind::Service, search_token.to_string(), keys, flow_name, details)
    }

    /// A flow on the way up; labeled with its name, or its key when unnamed
    pub fn flow(keys: &NodeKeys, flow_name: Option<&str>, details: Details) -> Self {
        let label = flow_name.unwrap_or(keys.flow_key.as_str()).to_string();
        Self::flow_like(NodeKind::Flow, label, keys, flow_name, details)
    }

    /// A root trigger
    pub fn transaction(transaction_key: &str, details: Details) -> Self {
        Self {
            kind: NodeKind::Transaction,
            label: transaction_key.to_string(),
            flow_name: None,
            flow_key: None,
            sub_flow_key: None,
            server_key: None,
            transaction_key: non_empty(transaction_key),
            details,
        }
    }

    fn flow_like(
        kind: NodeKind,
        label: String,
        keys: &NodeKeys,
        flow_name: Option<&str>,
        details: Details,
    ) -> Self {
        Self {
            kind,
            label,
            flow_name: flow_name.and_then(non_empty),
            flow_key: non_empty(&keys.flow_key),
            sub_flow_key: non_empty(&keys.sub_flow_key),
            server_key: non_empty(&keys.server_key),
            transaction_key: None,
            details,
        }
    }
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// An ordered root-to-leaf path: `[Transaction?, Flow*, Service]`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Route {
    nodes: Vec<PathNode>,
}

impl Route {
    pub fn nodes(&self) -> &[PathNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn root(&self) -> Option<&PathNode> {
        self.nodes.first()
    }

    pub fn leaf(&self) -> Option<&PathNode> {
        self.nodes.last()
    }

    /// The triggering transaction, if the route reached one
    pub fn transaction(&self) -> Option<&PathNode> {
        self.root().filter(|node| node.kind == NodeKind::Transaction)
    }

    pub fn count(&self, kind: NodeKind) -> usize {
        self.nodes.iter().filter(|node| node.kind == kind).count()
    }

    pub fn labels(&self) -> Vec<&str> {
        self.nodes.iter().map(|node| node.label.as_str()).collect()
    }
}

impl From<Vec<PathNode>> for Route {
    fn from(nodes: Vec<PathNode>) -> Self {
        Self { nodes }
    }
}

impl FromIterator<PathNode> for Route {
    fn from_iter<I: IntoIterator<Item = PathNode>>(iter: I) -> Self {
        Self {
            nodes: iter.into_iter().collect(),
        }
    }
}

/// A transaction found invoking a flow, flattened out of the routes
///
/// One summary is emitted per discovery; the same transaction may appear
/// several times.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionSummary {
    pub transaction_key: String,
    pub flow_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process_type_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub listener_type: Option<String>,
}

impl TransactionSummary {
    pub fn new(transaction_key: impl Into<String>, flow_name: impl Into<String>) -> Self {
        Self {
            transaction_key: transaction_key.into(),
            flow_name: flow_name.into(),
            ..Default::default()
        }
    }
}

/// Whether a result came from a live data source or the canned demo
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Mode {
    Demo,
    Real,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Demo => f.write_str("DEMO"),
            Mode::Real => f.write_str("REAL"),
        }
    }
}

/// Backtrace output: every route found plus the transactions behind them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktraceResult {
    pub mode: Mode,
    pub routes: Vec<Route>,
    pub transactions: Vec<TransactionSummary>,
}

impl BacktraceResult {
    pub fn real(routes: Vec<Route>, transactions: Vec<TransactionSummary>) -> Self {
        Self {
            mode: Mode::Real,
            routes,
            transactions,
        }
    }

    /// A live result with nothing found
    pub fn empty() -> Self {
        Self::real(Vec::new(), Vec::new())
    }
}
