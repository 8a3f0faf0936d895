//! Snapshot data source
//!
//! Answers backtrace queries from an exported copy of the workflow
//! configuration tables. The export is a YAML (or JSON) document with one
//! list per table; joins follow the same keys the live store uses.

use super::connector::{DataSource, DataSourceType};
use super::rows::{FlowMeta, SubFlowHit, TransactionInvocation, TransactionMeta};
use super::{DataSourceError, DataSourceResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::path::{Path, PathBuf};

/// Characters of configuration text returned around a match
const SNIPPET_LEN: usize = 240;
/// Characters of context kept before the match
const SNIPPET_BACK: usize = 80;

/// Exported configuration tables
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default)]
    pub sub_flows: Vec<SubFlow>,
    #[serde(default)]
    pub flows: Vec<FlowRow>,
    #[serde(default)]
    pub actions: Vec<Action>,
    #[serde(default)]
    pub invoked_flows: Vec<InvokedFlow>,
    #[serde(default)]
    pub event_conditions: Vec<EventCondition>,
    #[serde(default)]
    pub events: Vec<EventRow>,
    #[serde(default)]
    pub transactions: Vec<TransactionRow>,
}

/// A configuration fragment of a flow, searched by text containment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubFlow {
    pub sub_flow_key: String,
    #[serde(default)]
    pub server_key: String,
    pub flow_key: String,
    #[serde(default)]
    pub config_xml: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modify_ts: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowRow {
    pub flow_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow_group_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Action {
    pub action_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
}

/// Link from an action to the flow it invokes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvokedFlow {
    pub action_key: String,
    pub flow_key: String,
}

/// Link from an action to the event that fires it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventCondition {
    pub action_key: String,
    pub event_key: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRow {
    pub event_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    pub transaction_key: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRow {
    pub transaction_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process_type_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub listener_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_ts: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modify_ts: Option<DateTime<Utc>>,
}

/// Snapshot data source connector
///
/// The snapshot is loaded once; queries run against memory and never fail.
pub struct SnapshotDataSource {
    origin: String,
    source_type: DataSourceType,
    snapshot: Snapshot,
}

impl SnapshotDataSource {
    /// Wrap an in-memory snapshot
    pub fn new(snapshot: Snapshot) -> Self {
        Self {
            origin: "memory".to_string(),
            source_type: DataSourceType::YamlSnapshot,
            snapshot,
        }
    }

    /// Read and parse a snapshot file
    pub async fn load(path: impl AsRef<Path>) -> DataSourceResult<Self> {
        let path = path.as_ref();
        tracing::debug!("Reading snapshot from file: {:?}", path);

        let content =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|source| DataSourceError::Load {
                    path: path.to_path_buf(),
                    source,
                })?;

        let source_type = DataSourceType::for_path(path);
        let snapshot = parse_snapshot(&content, source_type, path)?;

        tracing::debug!(
            "Loaded snapshot {:?}: {} sub flows, {} flows, {} transactions",
            path,
            snapshot.sub_flows.len(),
            snapshot.flows.len(),
            snapshot.transactions.len()
        );

        Ok(Self {
            origin: path.display().to_string(),
            source_type,
            snapshot,
        })
    }
}

fn parse_snapshot(
    content: &str,
    source_type: DataSourceType,
    path: &Path,
) -> DataSourceResult<Snapshot> {
    let parse_error = |message: String| DataSourceError::Parse {
        path: PathBuf::from(path),
        message,
    };

    match source_type {
        DataSourceType::JsonSnapshot => {
            serde_json::from_str(content).map_err(|e| parse_error(e.to_string()))
        }
        DataSourceType::YamlSnapshot => {
            serde_yaml::from_str(content).map_err(|e| parse_error(e.to_string()))
        }
    }
}

impl DataSource for SnapshotDataSource {
    fn find_nodes_containing(&self, text: &str) -> DataSourceResult<Vec<SubFlowHit>> {
        // An empty needle matches nothing, as in the live store
        if text.is_empty() {
            return Ok(Vec::new());
        }

        let mut hits: Vec<SubFlowHit> = self
            .snapshot
            .sub_flows
            .iter()
            .filter_map(|sub_flow| {
                let byte_pos = sub_flow.config_xml.find(text)?;
                let match_pos = sub_flow.config_xml[..byte_pos].chars().count() + 1;
                Some(SubFlowHit {
                    flow_key: sub_flow.flow_key.trim().to_string(),
                    server_key: sub_flow.server_key.trim().to_string(),
                    sub_flow_key: sub_flow.sub_flow_key.trim().to_string(),
                    match_pos: Some(match_pos),
                    match_snippet: Some(snippet(&sub_flow.config_xml, match_pos)),
                    modify_ts: sub_flow.modify_ts,
                })
            })
            .collect();

        // Newest first; undated rows lead, as a descending sort with nulls first would
        hits.sort_by(|a, b| match (a.modify_ts, b.modify_ts) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(a), Some(b)) => b.cmp(&a),
        });

        tracing::debug!("Found {} sub flow(s) containing {:?}", hits.len(), text);
        Ok(hits)
    }

    fn flow_meta(&self, flow_key: &str) -> DataSourceResult<FlowMeta> {
        let flow_key = flow_key.trim();
        if flow_key.is_empty() {
            return Ok(FlowMeta::default());
        }

        Ok(self
            .snapshot
            .flows
            .iter()
            .find(|flow| flow.flow_key.trim() == flow_key)
            .map(|flow| FlowMeta {
                flow_name: flow.flow_name.clone(),
                flow_group_name: flow.flow_group_name.clone(),
            })
            .unwrap_or_default())
    }

    fn transactions_invoking(
        &self,
        flow_name: &str,
    ) -> DataSourceResult<Vec<TransactionInvocation>> {
        let flow_name = flow_name.trim();
        if flow_name.is_empty() {
            return Ok(Vec::new());
        }

        let snapshot = &self.snapshot;
        let mut rows = Vec::new();

        // action -> invoked flow -> flow -> event condition -> event -> transaction
        for invoked in &snapshot.invoked_flows {
            let flow_matches = snapshot.flows.iter().any(|flow| {
                flow.flow_key == invoked.flow_key
                    && flow.flow_name.as_deref().map(str::trim) == Some(flow_name)
            });
            if !flow_matches {
                continue;
            }

            for action in snapshot
                .actions
                .iter()
                .filter(|a| a.action_key == invoked.action_key)
            {
                for condition in snapshot
                    .event_conditions
                    .iter()
                    .filter(|c| c.action_key == invoked.action_key)
                {
                    for event in snapshot
                        .events
                        .iter()
                        .filter(|e| e.event_key == condition.event_key)
                    {
                        for transaction in snapshot
                            .transactions
                            .iter()
                            .filter(|t| t.transaction_key == event.transaction_key)
                        {
                            rows.push(TransactionInvocation {
                                transaction_key: transaction.transaction_key.clone(),
                                action_key: Some(action.action_key.clone()),
                                action_name: action.action_name.clone(),
                                group_id: action.group_id.clone(),
                                event_id: event.event_id.clone(),
                                process_type_key: transaction.process_type_key.clone(),
                                owner_key: transaction.owner_key.clone(),
                                listener_type: transaction.listener_type.clone(),
                            });
                        }
                    }
                }
            }
        }

        tracing::debug!(
            "Found {} transaction invocation(s) of flow {:?}",
            rows.len(),
            flow_name
        );
        Ok(rows)
    }

    fn transaction_meta(&self, transaction_key: &str) -> DataSourceResult<TransactionMeta> {
        let transaction_key = transaction_key.trim();
        if transaction_key.is_empty() {
            return Ok(TransactionMeta::default());
        }

        Ok(self
            .snapshot
            .transactions
            .iter()
            .find(|t| t.transaction_key.trim() == transaction_key)
            .map(|t| TransactionMeta {
                transaction_key: Some(t.transaction_key.clone()),
                // Most stores only carry the key; it doubles as the display name
                transaction_name: t
                    .transaction_name
                    .clone()
                    .filter(|name| !name.trim().is_empty())
                    .or_else(|| Some(t.transaction_key.clone())),
                owner: t.owner_key.clone(),
                create_user_id: t.create_user_id.clone(),
                create_ts: t.create_ts,
                modify_ts: t.modify_ts,
            })
            .unwrap_or_default())
    }

    fn source_type(&self) -> &str {
        self.source_type.as_str()
    }

    fn ping(&self) -> DataSourceResult<String> {
        Ok(format!(
            "{} {}: {} sub flows, {} flows, {} transactions",
            self.source_type.as_str(),
            self.origin,
            self.snapshot.sub_flows.len(),
            self.snapshot.flows.len(),
            self.snapshot.transactions.len()
        ))
    }
}

/// Cut the text around a 1-based character match position
fn snippet(text: &str, match_pos: usize) -> String {
    let start = match_pos.saturating_sub(SNIPPET_BACK).max(1);
    text.chars().skip(start - 1).take(SNIPPET_LEN).collect()
}
