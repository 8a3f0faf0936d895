//! Backtrace traversal engine
//!
//! Starting from every sub flow whose configuration mentions the search token,
//! walks upward: resolve the flow, emit a route for each transaction invoking
//! it, then search for configuration mentioning the flow's name and repeat one
//! level higher. The graph is never materialized; edges come from data source
//! queries as the walk reaches them.

use im::Vector;
use std::collections::HashSet;

use super::details::{flow_details, transaction_details};
use super::models::{BacktraceResult, NodeKeys, PathNode, Route, TransactionSummary};
use crate::datasource::{DataSource, DataSourceResult, SubFlowHit, TransactionInvocation};

/// Default number of flow levels to climb
pub const DEFAULT_MAX_DEPTH: usize = 15;
/// Default cap on routes per backtrace
pub const DEFAULT_MAX_ROUTES: usize = 60;

/// Bounds on a single backtrace
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BacktraceLimits {
    /// Maximum number of flow nodes in a route
    pub max_depth: usize,
    /// Maximum number of routes returned
    pub max_routes: usize,
}

impl BacktraceLimits {
    pub fn new(max_depth: usize, max_routes: usize) -> Self {
        Self {
            max_depth,
            max_routes,
        }
    }
}

impl Default for BacktraceLimits {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DEPTH, DEFAULT_MAX_ROUTES)
    }
}

/// Ascent de-duplication key
///
/// Depth is part of the key: the same fragment may be climbed through once per
/// level.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VisitKey {
    pub flow_key: String,
    pub server_key: String,
    pub sub_flow_key: String,
    pub depth: usize,
}

impl VisitKey {
    fn new(keys: &NodeKeys, depth: usize) -> Self {
        Self {
            flow_key: keys.flow_key.clone(),
            server_key: keys.server_key.clone(),
            sub_flow_key: keys.sub_flow_key.clone(),
            depth,
        }
    }
}

/// Find every route that can lead to `search_token` being invoked
///
/// Fails only when the data source fails; nothing found yields an empty
/// result. Routes accumulated before a failure are discarded.
pub fn backtrace(
    source: &dyn DataSource,
    search_token: &str,
    limits: BacktraceLimits,
) -> DataSourceResult<BacktraceResult> {
    Backtracer::new(source, search_token, limits).run()
}

/// State of one backtrace call, owned by that call alone
struct Backtracer<'a> {
    source: &'a dyn DataSource,
    search_token: &'a str,
    limits: BacktraceLimits,
    routes: Vec<Route>,
    transactions: Vec<TransactionSummary>,
    visited: HashSet<VisitKey>,
}

impl<'a> Backtracer<'a> {
    fn new(source: &'a dyn DataSource, search_token: &'a str, limits: BacktraceLimits) -> Self {
        Self {
            source,
            search_token,
            limits,
            routes: Vec::new(),
            transactions: Vec::new(),
            visited: HashSet::new(),
        }
    }

    fn run(mut self) -> DataSourceResult<BacktraceResult> {
        tracing::info!(
            "Backtracing {:?} (max depth {}, max routes {})",
            self.search_token,
            self.limits.max_depth,
            self.limits.max_routes
        );

        let hits = self.source.find_nodes_containing(self.search_token)?;
        if hits.is_empty() {
            tracing::info!("No configuration mentions {:?}", self.search_token);
            return Ok(BacktraceResult::empty());
        }

        for hit in &hits {
            if self.routes_exhausted() {
                break;
            }
            if self.limits.max_depth == 0 {
                tracing::debug!("Max depth is 0, skipping ascent for all hits");
                break;
            }

            let keys = node_keys(hit);
            let meta = self.source.flow_meta(&keys.flow_key)?;
            let flow_name = non_blank(meta.flow_name.as_deref());

            tracing::debug!(
                "Hit in sub flow {}/{} (flow {:?})",
                keys.flow_key,
                keys.sub_flow_key,
                flow_name
            );

            let service = PathNode::service(
                self.search_token,
                &keys,
                flow_name,
                flow_details(&keys, &meta),
            );
            self.ascend(&keys, &Vector::unit(service), 0)?;
        }

        tracing::info!(
            "Backtrace of {:?} found {} route(s), {} transaction(s)",
            self.search_token,
            self.routes.len(),
            self.transactions.len()
        );

        Ok(BacktraceResult::real(self.routes, self.transactions))
    }

    /// Climb one flow level from `path`, whose head is the node below `keys`
    ///
    /// Each call works on its own copy of the path, so siblings never see each
    /// other's nodes.
    fn ascend(
        &mut self,
        keys: &NodeKeys,
        path: &Vector<PathNode>,
        depth: usize,
    ) -> DataSourceResult<()> {
        if self.routes_exhausted() || depth >= self.limits.max_depth {
            return Ok(());
        }
        if !self.visited.insert(VisitKey::new(keys, depth)) {
            tracing::debug!(
                "Already visited {}/{}/{} at depth {}",
                keys.flow_key,
                keys.server_key,
                keys.sub_flow_key,
                depth
            );
            return Ok(());
        }

        let meta = self.source.flow_meta(&keys.flow_key)?;
        let flow_name = non_blank(meta.flow_name.as_deref());

        let mut path = path.clone();
        path.push_front(PathNode::flow(keys, flow_name, flow_details(keys, &meta)));

        let Some(flow_name) = flow_name else {
            // Nothing to join on: the route ends at this flow
            tracing::debug!("Flow {} has no name, ending route", keys.flow_key);
            self.routes.push(path.iter().cloned().collect());
            return Ok(());
        };

        tracing::debug!("Ascending through flow {:?} at depth {}", flow_name, depth);

        let invocations = self.source.transactions_invoking(flow_name)?;
        for invocation in &invocations {
            if self.routes_exhausted() {
                break;
            }
            self.emit_transaction_route(invocation, flow_name, &keys.server_key, &path)?;
        }

        // Parents would start at depth + 1; don't query when none can be climbed
        if self.routes_exhausted() || depth + 1 >= self.limits.max_depth {
            return Ok(());
        }

        let parents = self.source.find_nodes_containing(flow_name)?;
        for parent in &parents {
            if self.routes_exhausted() {
                break;
            }
            self.ascend(&node_keys(parent), &path, depth + 1)?;
        }

        Ok(())
    }

    fn emit_transaction_route(
        &mut self,
        invocation: &TransactionInvocation,
        flow_name: &str,
        server_key: &str,
        path: &Vector<PathNode>,
    ) -> DataSourceResult<()> {
        let transaction_key = invocation.transaction_key.trim();
        let meta = self.source.transaction_meta(transaction_key)?;

        tracing::debug!("Transaction {} invokes flow {:?}", transaction_key, flow_name);

        let root = PathNode::transaction(transaction_key, transaction_details(server_key, &meta));
        self.routes
            .push(std::iter::once(root).chain(path.iter().cloned()).collect());

        self.transactions.push(TransactionSummary {
            transaction_key: transaction_key.to_string(),
            flow_name: flow_name.to_string(),
            action_key: invocation.action_key.clone(),
            action_name: invocation.action_name.clone(),
            group_id: invocation.group_id.clone(),
            event_id: invocation.event_id.clone(),
            process_type_key: invocation.process_type_key.clone(),
            owner_key: invocation.owner_key.clone(),
            listener_type: invocation.listener_type.clone(),
        });

        Ok(())
    }

    fn routes_exhausted(&self) -> bool {
        self.routes.len() >= self.limits.max_routes
    }
}

fn node_keys(hit: &SubFlowHit) -> NodeKeys {
    NodeKeys::new(&hit.flow_key, &hit.server_key, &hit.sub_flow_key)
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
