//! Backtrace traversal tests
//!
//! Drives the traversal engine against in-memory data sources shaped like a
//! small workflow configuration graph, and against mocks for error and call
//! order behavior.

use mockall::{Sequence, mock};
use netkrow::backtrace::{BacktraceLimits, NodeKind, Route, TransactionSummary, backtrace};
use netkrow::datasource::{
    DataSource, DataSourceError, DataSourceResult, FlowMeta, SubFlowHit, TransactionInvocation,
    TransactionMeta,
};
use std::collections::HashMap;
use std::sync::Mutex;

/// Configuration graph answered from maps, logging every query
#[derive(Default)]
struct Graph {
    mentions: HashMap<String, Vec<SubFlowHit>>,
    names: HashMap<String, String>,
    invokers: HashMap<String, Vec<String>>,
    outage: Mutex<Option<String>>,
    calls: Mutex<Vec<String>>,
}

impl Graph {
    fn new() -> Self {
        Self::default()
    }

    /// The configuration of `flow_key` mentions `text`
    fn mentions(mut self, flow_key: &str, text: &str) -> Self {
        self.mentions
            .entry(text.to_string())
            .or_default()
            .push(SubFlowHit::new(flow_key, "S1", format!("{flow_key}-SF")));
        self
    }

    fn named(mut self, flow_key: &str, name: &str) -> Self {
        self.names.insert(flow_key.to_string(), name.to_string());
        self
    }

    fn invokes(mut self, transaction_key: &str, flow_name: &str) -> Self {
        self.invokers
            .entry(flow_name.to_string())
            .or_default()
            .push(transaction_key.to_string());
        self
    }

    /// The next search for `text` fails; later ones succeed
    fn fails_once_on(self, text: &str) -> Self {
        *self.outage.lock().unwrap() = Some(text.to_string());
        self
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn log(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

impl DataSource for Graph {
    fn find_nodes_containing(&self, text: &str) -> DataSourceResult<Vec<SubFlowHit>> {
        self.log(format!("find:{text}"));
        let mut outage = self.outage.lock().unwrap();
        if outage.as_deref() == Some(text) {
            *outage = None;
            return Err(DataSourceError::Unavailable("connection reset".to_string()));
        }
        Ok(self.mentions.get(text).cloned().unwrap_or_default())
    }

    fn flow_meta(&self, flow_key: &str) -> DataSourceResult<FlowMeta> {
        self.log(format!("flow:{flow_key}"));
        Ok(FlowMeta {
            flow_name: self.names.get(flow_key).cloned(),
            flow_group_name: Some("GRP".to_string()),
        })
    }

    fn transactions_invoking(
        &self,
        flow_name: &str,
    ) -> DataSourceResult<Vec<TransactionInvocation>> {
        self.log(format!("tx:{flow_name}"));
        Ok(self
            .invokers
            .get(flow_name)
            .map(|keys| keys.iter().map(TransactionInvocation::new).collect())
            .unwrap_or_default())
    }

    fn transaction_meta(&self, transaction_key: &str) -> DataSourceResult<TransactionMeta> {
        self.log(format!("txmeta:{transaction_key}"));
        Ok(TransactionMeta {
            transaction_key: Some(transaction_key.to_string()),
            owner: Some("DEFAULT".to_string()),
            ..Default::default()
        })
    }

    fn source_type(&self) -> &str {
        "graph"
    }
}

fn limits(max_depth: usize, max_routes: usize) -> BacktraceLimits {
    BacktraceLimits::new(max_depth, max_routes)
}

/// Every route is `[Transaction?, Flow+, Service]` ending at the search token
fn assert_route_shape(route: &Route, search: &str) {
    let nodes = route.nodes();
    assert!(nodes.len() >= 2, "route too short: {:?}", route.labels());

    let leaf = route.leaf().unwrap();
    assert_eq!(leaf.kind, NodeKind::Service);
    assert_eq!(leaf.label, search);

    let start = usize::from(route.transaction().is_some());
    for node in &nodes[start..nodes.len() - 1] {
        assert_eq!(node.kind, NodeKind::Flow, "route {:?}", route.labels());
    }
}

#[test]
fn test_shipment_invoice_scenario() {
    let graph = Graph::new()
        .mentions("F1", "getOrder")
        .named("F1", "OrderDelivery")
        .invokes("SHIPMENT_INVOICE", "OrderDelivery");

    let result = backtrace(&graph, "getOrder", BacktraceLimits::default()).unwrap();

    assert_eq!(result.routes.len(), 1);
    let route = &result.routes[0];
    assert_eq!(
        route.labels(),
        vec!["SHIPMENT_INVOICE", "OrderDelivery", "getOrder"]
    );

    let transaction = route.transaction().unwrap();
    assert_eq!(transaction.transaction_key.as_deref(), Some("SHIPMENT_INVOICE"));
    assert_eq!(transaction.details["serverKey"], "S1");
    assert_eq!(transaction.details["transactionName"], "SHIPMENT_INVOICE");
    assert_eq!(transaction.details["owner"], "DEFAULT");

    let flow = &route.nodes()[1];
    assert_eq!(flow.flow_key.as_deref(), Some("F1"));
    assert_eq!(flow.sub_flow_key.as_deref(), Some("F1-SF"));
    assert_eq!(flow.details["flowGroupName"], "GRP");

    assert_eq!(
        result.transactions,
        vec![TransactionSummary::new("SHIPMENT_INVOICE", "OrderDelivery")]
    );
}

#[test]
fn test_nothing_found_issues_a_single_query() {
    let graph = Graph::new();

    let result = backtrace(&graph, "unknownService", BacktraceLimits::default()).unwrap();

    assert!(result.routes.is_empty());
    assert!(result.transactions.is_empty());
    assert_eq!(graph.calls(), vec!["find:unknownService"]);
}

#[test]
fn test_zero_max_depth_returns_nothing() {
    let graph = Graph::new()
        .mentions("F1", "getOrder")
        .named("F1", "OrderDelivery")
        .invokes("TX", "OrderDelivery");

    let result = backtrace(&graph, "getOrder", limits(0, 60)).unwrap();

    assert!(result.routes.is_empty());
    assert!(result.transactions.is_empty());
    assert_eq!(graph.calls(), vec!["find:getOrder"]);
}

#[test]
fn test_self_referencing_flow_terminates() {
    // Loop's configuration mentions its own name
    let graph = Graph::new()
        .mentions("F1", "getOrder")
        .named("F1", "Loop")
        .mentions("F1", "Loop")
        .invokes("TX", "Loop");

    let result = backtrace(&graph, "getOrder", limits(5, 60)).unwrap();

    // One route per level climbed through the cycle
    let flow_counts: Vec<usize> = result
        .routes
        .iter()
        .map(|route| route.count(NodeKind::Flow))
        .collect();
    assert_eq!(flow_counts, vec![1, 2, 3, 4, 5]);
    assert_eq!(result.routes[1].labels(), vec!["TX", "Loop", "Loop", "getOrder"]);

    // Parent searches happen at depths 0..=3 only
    let parent_searches = graph.calls().iter().filter(|c| *c == "find:Loop").count();
    assert_eq!(parent_searches, 4);
}

#[test]
fn test_cycle_without_transactions_terminates_empty() {
    let graph = Graph::new()
        .mentions("A", "getOrder")
        .named("A", "FlowA")
        .named("B", "FlowB")
        .mentions("B", "FlowA")
        .mentions("A", "FlowB");

    let result = backtrace(&graph, "getOrder", limits(6, 60)).unwrap();

    assert!(result.routes.is_empty());
    // One hit lookup plus one per level
    let flow_lookups = graph.calls().iter().filter(|c| c.starts_with("flow:")).count();
    assert_eq!(flow_lookups, 1 + 6);
}

#[test]
fn test_depth_bound_holds_on_deep_chains() {
    // getOrder <- L0 <- L1 <- ... <- L9, each level invoked by its own transaction
    let mut graph = Graph::new().mentions("K0", "getOrder");
    for level in 0..10 {
        let name = format!("L{level}");
        graph = graph
            .named(&format!("K{level}"), &name)
            .invokes(&format!("TX{level}"), &name)
            .mentions(&format!("K{}", level + 1), &name);
    }

    let result = backtrace(&graph, "getOrder", limits(3, 60)).unwrap();

    assert_eq!(result.routes.len(), 3);
    for route in &result.routes {
        assert!(route.count(NodeKind::Flow) <= 3);
        assert_route_shape(route, "getOrder");
    }
    assert_eq!(result.routes[2].labels(), vec!["TX2", "L2", "L1", "L0", "getOrder"]);
}

#[test]
fn test_route_limit_is_respected() {
    let graph = Graph::new()
        .mentions("F1", "getOrder")
        .mentions("F2", "getOrder")
        .named("F1", "Left")
        .named("F2", "Right")
        .invokes("TX1", "Left")
        .invokes("TX2", "Left")
        .invokes("TX3", "Right");

    let result = backtrace(&graph, "getOrder", limits(15, 2)).unwrap();

    assert_eq!(result.routes.len(), 2);
    assert_eq!(result.transactions.len(), 2);
    // The limit stops the walk before the second hit is looked at
    assert!(!graph.calls().contains(&"flow:F2".to_string()));
}

#[test]
fn test_duplicate_hit_is_climbed_once_per_depth() {
    let graph = Graph::new()
        .mentions("F1", "getOrder")
        .mentions("F1", "getOrder")
        .named("F1", "OrderDelivery")
        .invokes("TX", "OrderDelivery");

    let result = backtrace(&graph, "getOrder", BacktraceLimits::default()).unwrap();

    assert_eq!(result.routes.len(), 1);
    let invocation_queries = graph
        .calls()
        .iter()
        .filter(|c| *c == "tx:OrderDelivery")
        .count();
    assert_eq!(invocation_queries, 1);
}

#[test]
fn test_transaction_summaries_track_transaction_routes() {
    // TX invokes both parents, so it shows up twice
    let graph = Graph::new()
        .mentions("F1", "getOrder")
        .named("F1", "Inner")
        .mentions("F2", "Inner")
        .mentions("F3", "Inner")
        .mentions("F4", "Inner")
        .named("F2", "Outer")
        .named("F3", "Other")
        .invokes("TX", "Outer")
        .invokes("TX", "Other");

    let result = backtrace(&graph, "getOrder", BacktraceLimits::default()).unwrap();

    let rooted = result
        .routes
        .iter()
        .filter(|route| route.transaction().is_some())
        .count();
    assert_eq!(rooted, result.transactions.len());
    assert_eq!(
        result.transactions,
        vec![
            TransactionSummary::new("TX", "Outer"),
            TransactionSummary::new("TX", "Other"),
        ]
    );

    // F4 has no name, so its route stops at the flow
    let unrooted: Vec<Vec<&str>> = result
        .routes
        .iter()
        .filter(|route| route.transaction().is_none())
        .map(Route::labels)
        .collect();
    assert_eq!(unrooted, vec![vec!["F4", "Inner", "getOrder"]]);

    for route in &result.routes {
        assert_route_shape(route, "getOrder");
    }
}

#[test]
fn test_repeated_calls_are_independent() {
    let graph = Graph::new()
        .mentions("F1", "getOrder")
        .named("F1", "OrderDelivery")
        .invokes("TX", "OrderDelivery");

    let first = backtrace(&graph, "getOrder", BacktraceLimits::default()).unwrap();
    let second = backtrace(&graph, "getOrder", BacktraceLimits::default()).unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_retry_after_failure_starts_clean() {
    let build = || {
        Graph::new()
            .mentions("F1", "getOrder")
            .named("F1", "OrderDelivery")
            .invokes("TX", "OrderDelivery")
            .mentions("F2", "OrderDelivery")
            .named("F2", "OrderFulfilment")
            .invokes("TX2", "OrderFulfilment")
    };
    let graph = build().fails_once_on("OrderDelivery");

    // The route through TX is already built when the parent search fails
    let err = backtrace(&graph, "getOrder", BacktraceLimits::default()).unwrap_err();
    assert!(matches!(err, DataSourceError::Unavailable(_)));

    let retry = backtrace(&graph, "getOrder", BacktraceLimits::default()).unwrap();
    let fresh = backtrace(&build(), "getOrder", BacktraceLimits::default()).unwrap();

    assert_eq!(retry, fresh);
    assert_eq!(retry.routes.len(), 2);
    assert_eq!(retry.transactions.len(), 2);
}

mock! {
    Source {}

    impl DataSource for Source {
        fn find_nodes_containing(&self, text: &str) -> DataSourceResult<Vec<SubFlowHit>>;
        fn flow_meta(&self, flow_key: &str) -> DataSourceResult<FlowMeta>;
        fn transactions_invoking(&self, flow_name: &str) -> DataSourceResult<Vec<TransactionInvocation>>;
        fn transaction_meta(&self, transaction_key: &str) -> DataSourceResult<TransactionMeta>;
        fn source_type(&self) -> &str;
        fn ping(&self) -> DataSourceResult<String>;
    }
}

fn unavailable() -> DataSourceError {
    DataSourceError::Unavailable("connection reset".to_string())
}

#[test]
fn test_first_query_failure_propagates() {
    let mut source = MockSource::new();
    source
        .expect_find_nodes_containing()
        .times(1)
        .returning(|_| Err(unavailable()));
    source.expect_flow_meta().never();

    let err = backtrace(&source, "getOrder", BacktraceLimits::default()).unwrap_err();
    assert!(matches!(err, DataSourceError::Unavailable(_)));
}

#[test]
fn test_failure_after_routes_discards_them() {
    let mut source = MockSource::new();
    source
        .expect_find_nodes_containing()
        .returning(|text| match text {
            "getOrder" => Ok(vec![SubFlowHit::new("F1", "S1", "SF1")]),
            _ => Err(unavailable()),
        });
    source
        .expect_flow_meta()
        .returning(|_| Ok(FlowMeta::named("OrderDelivery")));
    source
        .expect_transactions_invoking()
        .times(1)
        .returning(|_| Ok(vec![TransactionInvocation::new("TX")]));
    source
        .expect_transaction_meta()
        .times(1)
        .returning(|_| Ok(TransactionMeta::default()));

    // The route through TX is built before the parent search fails
    let result = backtrace(&source, "getOrder", BacktraceLimits::default());
    assert!(matches!(result, Err(DataSourceError::Unavailable(_))));
}

#[test]
fn test_queries_follow_program_order() {
    let mut seq = Sequence::new();
    let mut source = MockSource::new();

    source
        .expect_find_nodes_containing()
        .withf(|text| text == "getOrder")
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(vec![SubFlowHit::new("F1", "S1", "SF1")]));
    // Once for the service node, once for the flow node
    source
        .expect_flow_meta()
        .times(2)
        .in_sequence(&mut seq)
        .returning(|_| Ok(FlowMeta::named("OrderDelivery")));
    source
        .expect_transactions_invoking()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(vec![TransactionInvocation::new("SHIPMENT_INVOICE")]));
    source
        .expect_transaction_meta()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(TransactionMeta::default()));
    source
        .expect_find_nodes_containing()
        .withf(|text| text == "OrderDelivery")
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(Vec::new()));

    let result = backtrace(&source, "getOrder", BacktraceLimits::default()).unwrap();
    assert_eq!(result.routes.len(), 1);
}
