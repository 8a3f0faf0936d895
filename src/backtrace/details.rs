//! Node detail builders
//!
//! Keeps a small, stable set of attributes per node kind for display, decoupled
//! from the raw data source rows. Blank values become `null`; building details
//! never fails.

use super::models::{Details, NodeKeys};
use crate::datasource::{FlowMeta, TransactionMeta};
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;

/// Details for flow and service nodes
pub fn flow_details(keys: &NodeKeys, meta: &FlowMeta) -> Details {
    let mut details = Details::new();
    details.insert("flowName".into(), text(meta.flow_name.as_deref()));
    details.insert("flowKey".into(), text(Some(keys.flow_key.as_str())));
    details.insert("serverKey".into(), text(Some(keys.server_key.as_str())));
    details.insert("flowGroupName".into(), text(meta.flow_group_name.as_deref()));
    details
}

/// Details for transaction nodes
///
/// `server_key` is the server of the flow the transaction was found through.
pub fn transaction_details(server_key: &str, meta: &TransactionMeta) -> Details {
    let transaction_name = meta
        .transaction_name
        .as_deref()
        .filter(|name| !name.trim().is_empty())
        .or(meta.transaction_key.as_deref());

    let mut details = Details::new();
    details.insert("serverKey".into(), text(Some(server_key)));
    details.insert("transactionKey".into(), text(meta.transaction_key.as_deref()));
    details.insert("transactionName".into(), text(transaction_name));
    details.insert("owner".into(), text(meta.owner.as_deref()));
    details.insert("createUserId".into(), text(meta.create_user_id.as_deref()));
    details.insert("createTs".into(), timestamp(meta.create_ts));
    details.insert("modifyTs".into(), timestamp(meta.modify_ts));
    details
}

/// Trimmed text, or `null` when blank
fn text(value: Option<&str>) -> Value {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Value::String(v.to_string()),
        _ => Value::Null,
    }
}

fn timestamp(value: Option<DateTime<Utc>>) -> Value {
    value
        .map(|ts| Value::String(ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)))
        .unwrap_or(Value::Null)
}
