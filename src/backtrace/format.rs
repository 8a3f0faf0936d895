//! Text rendering of backtrace results

use super::models::{BacktraceResult, NodeKind, PathNode};

const HEAVY_RULE: &str = "═══════════════════════════════════════════════════════════";
const LIGHT_RULE: &str = "───────────────────────────────────────────────────";

/// Format a backtrace result for the terminal, routes listed root first
pub fn format_backtrace_result(result: &BacktraceResult) -> String {
    let mut output = Vec::new();

    output.push(HEAVY_RULE.to_string());
    output.push(format!("  Mode:            {}", result.mode));
    output.push(format!("  Routes:          {}", result.routes.len()));
    output.push(format!("  Transactions:    {}", result.transactions.len()));
    output.push(HEAVY_RULE.to_string());

    if result.routes.is_empty() {
        output.push("".to_string());
        output.push("No routes found.".to_string());
    }

    for (index, route) in result.routes.iter().enumerate() {
        output.push("".to_string());
        output.push(format!("Route {}", index + 1));
        output.push(LIGHT_RULE.to_string());

        for (position, node) in route.nodes().iter().enumerate() {
            if position > 0 {
                output.push("    |  invokes".to_string());
                output.push("    v".to_string());
            }
            output.push(node_line(node));
        }

        output.push(LIGHT_RULE.to_string());
    }

    if !result.transactions.is_empty() {
        output.push("".to_string());
        output.push("Transactions".to_string());
        output.push(LIGHT_RULE.to_string());
        for summary in &result.transactions {
            output.push(format!("  {} -> {}", summary.transaction_key, summary.flow_name));
        }
        output.push(LIGHT_RULE.to_string());
    }

    output.join("\n")
}

fn node_line(node: &PathNode) -> String {
    let title = match node.kind {
        NodeKind::Transaction => "Transaction:",
        NodeKind::Flow => "Flow:",
        NodeKind::Service => "Service:",
        NodeKind::Server => "Server:",
    };

    match (node.kind, node.server_key.as_deref()) {
        (NodeKind::Flow, Some(server_key)) => {
            format!("{:<14}{}  [server {}]", title, node.label, server_key)
        }
        _ => format!("{:<14}{}", title, node.label),
    }
}
