//! Text rendering tests
//!
//! Inline snapshots of the terminal output for backtrace results.
//! Run `cargo insta review` to review and accept snapshot changes.

use insta::assert_snapshot;
use netkrow::backtrace::{
    BacktraceResult, Details, NodeKeys, PathNode, Route, TransactionSummary,
    format_backtrace_result,
};
use netkrow::services::demo_result;

#[test]
fn test_demo_result_text() {
    assert_snapshot!(format_backtrace_result(&demo_result("getOrder")), @r"
═══════════════════════════════════════════════════════════
  Mode:            DEMO
  Routes:          1
  Transactions:    1
═══════════════════════════════════════════════════════════

Route 1
───────────────────────────────────────────────────
Transaction:  SHIPMENT_INVOICE
    |  invokes
    v
Flow:         OrderDelivery
    |  invokes
    v
Service:      getOrder
───────────────────────────────────────────────────

Transactions
───────────────────────────────────────────────────
  SHIPMENT_INVOICE -> OrderDelivery
───────────────────────────────────────────────────
");
}

#[test]
fn test_empty_result_text() {
    assert_snapshot!(format_backtrace_result(&BacktraceResult::empty()), @r"
═══════════════════════════════════════════════════════════
  Mode:            REAL
  Routes:          0
  Transactions:    0
═══════════════════════════════════════════════════════════

No routes found.
");
}

#[test]
fn test_mixed_routes_text() {
    let legacy = NodeKeys::new("F_LEGACY", "S2", "SF-LEGACY");
    let delivery = NodeKeys::new("F_DELIVERY", "S1", "SF-DELIVERY");
    let fulfilment = NodeKeys::new("F_FULFIL", "S1", "SF-FULFIL");

    let unrooted: Route = vec![
        PathNode::flow(&legacy, None, Details::new()),
        PathNode::service("getOrder", &legacy, None, Details::new()),
    ]
    .into();
    let rooted: Route = vec![
        PathNode::transaction("ORDER_CREATE", Details::new()),
        PathNode::flow(&fulfilment, Some("OrderFulfilment"), Details::new()),
        PathNode::flow(&delivery, Some("OrderDelivery"), Details::new()),
        PathNode::service("getOrder", &delivery, Some("OrderDelivery"), Details::new()),
    ]
    .into();
    let result = BacktraceResult::real(
        vec![unrooted, rooted],
        vec![TransactionSummary::new("ORDER_CREATE", "OrderFulfilment")],
    );

    assert_snapshot!(format_backtrace_result(&result), @r"
═══════════════════════════════════════════════════════════
  Mode:            REAL
  Routes:          2
  Transactions:    1
═══════════════════════════════════════════════════════════

Route 1
───────────────────────────────────────────────────
Flow:         F_LEGACY  [server S2]
    |  invokes
    v
Service:      getOrder
───────────────────────────────────────────────────

Route 2
───────────────────────────────────────────────────
Transaction:  ORDER_CREATE
    |  invokes
    v
Flow:         OrderFulfilment  [server S1]
    |  invokes
    v
Flow:         OrderDelivery  [server S1]
    |  invokes
    v
Service:      getOrder
───────────────────────────────────────────────────

Transactions
───────────────────────────────────────────────────
  ORDER_CREATE -> OrderFulfilment
───────────────────────────────────────────────────
");
}

#[test]
fn test_every_route_is_listed_root_first() {
    let result = demo_result("getOrder");
    let text = format_backtrace_result(&result);

    let transaction = text.find("Transaction:  SHIPMENT_INVOICE").unwrap();
    let flow = text.find("Flow:         OrderDelivery").unwrap();
    let service = text.find("Service:      getOrder").unwrap();
    assert!(transaction < flow && flow < service);
}
