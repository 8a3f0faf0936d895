//! Row types returned by data source queries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A sub flow whose configuration text matched a search
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubFlowHit {
    pub flow_key: String,
    pub server_key: String,
    pub sub_flow_key: String,
    /// 1-based character position of the first match
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_pos: Option<usize>,
    /// Text surrounding the match
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_snippet: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modify_ts: Option<DateTime<Utc>>,
}

impl SubFlowHit {
    pub fn new(
        flow_key: impl Into<String>,
        server_key: impl Into<String>,
        sub_flow_key: impl Into<String>,
    ) -> Self {
        Self {
            flow_key: flow_key.into(),
            server_key: server_key.into(),
            sub_flow_key: sub_flow_key.into(),
            ..Default::default()
        }
    }
}

/// Flow metadata. Both fields are `None` for a blank or unknown flow key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowMeta {
    pub flow_name: Option<String>,
    pub flow_group_name: Option<String>,
}

impl FlowMeta {
    pub fn named(flow_name: impl Into<String>) -> Self {
        Self {
            flow_name: Some(flow_name.into()),
            flow_group_name: None,
        }
    }
}

/// One invocation chain from a transaction to a flow
///
/// Only `transaction_key` is required; the rest describes the action and
/// event that connect the transaction to the flow.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionInvocation {
    pub transaction_key: String,
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

impl TransactionInvocation {
    pub fn new(transaction_key: impl Into<String>) -> Self {
        Self {
            transaction_key: transaction_key.into(),
            ..Default::default()
        }
    }
}

/// Transaction metadata. Every field is `None` for an unknown transaction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionMeta {
    pub transaction_key: Option<String>,
    pub transaction_name: Option<String>,
    pub owner: Option<String>,
    pub create_user_id: Option<String>,
    pub create_ts: Option<DateTime<Utc>>,
    pub modify_ts: Option<DateTime<Utc>>,
}
