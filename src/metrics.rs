// Metrics Calculator - per-node structural scores
//
// These are deliberately simplified proxies, not textbook centralities:
// "betweenness" counts neighbour pairs, "closeness" is normalized degree.
// Ranking in the dashboard depends on these exact formulas.

use crate::graph::{NetworkGraph, NetworkNode, NodeKind};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkMetrics {
    pub degree: usize,
    pub betweenness: f64,
    pub closeness: f64,
    pub centrality: f64,
    pub influence: f64,
}

/// Pairs of other nodes that are both adjacent to this node, normalized by
/// the number of pairs of other nodes.
///
/// Every pair of neighbours qualifies, so the count is C(degree, 2).
pub fn betweenness_like(degree: usize, node_count: usize) -> f64 {
    if node_count <= 2 {
        return 0.0;
    }
    let pairs = (node_count - 1) as f64 * (node_count - 2) as f64 / 2.0;
    let shared = degree as f64 * degree.saturating_sub(1) as f64 / 2.0;
    finite_or_zero(shared / pairs)
}

pub fn closeness(degree: usize, node_count: usize) -> f64 {
    if node_count <= 1 {
        return 0.0;
    }
    finite_or_zero(degree as f64 / (node_count - 1) as f64)
}

pub fn centrality(degree: usize, betweenness: f64, closeness: f64, node_count: usize) -> f64 {
    if node_count <= 1 {
        return 0.0;
    }
    let degree_score = degree as f64 / node_count as f64;
    finite_or_zero((degree_score + betweenness + closeness) / 3.0)
}

/// Composite ranking score; formula depends on the node kind.
pub fn influence(node: &NetworkNode, node_count: usize) -> f64 {
    let score = match node.kind {
        NodeKind::Company => {
            let market_cap = node.market_cap_eur.unwrap_or(0.0).max(0.0);
            let reach = if node_count == 0 {
                0.0
            } else {
                node.connections.len() as f64 / node_count as f64
            };
            (market_cap + 1.0).log10() / 10.0 + reach
        }
        NodeKind::Director => {
            let raw = node.company_count as f64;
            if node.company_count > 1 {
                raw * 2.0
            } else {
                raw
            }
        }
        NodeKind::Shareholder => {
            let multiplier = if node.company_count > 1 {
                node.company_count as f64 * 1.5
            } else {
                1.0
            };
            (node.total_percentage / 100.0) * multiplier
        }
    };
    finite_or_zero(score)
}

/// Recompute every node's metrics from scratch.
pub fn compute_metrics(graph: &mut NetworkGraph) {
    let node_count = graph.node_count();

    for node in graph.nodes.values_mut() {
        let degree = node.connections.len();
        let betweenness = betweenness_like(degree, node_count);
        let closeness = closeness(degree, node_count);

        node.metrics = NetworkMetrics {
            degree,
            betweenness,
            closeness,
            centrality: centrality(degree, betweenness, closeness, node_count),
            influence: influence(node, node_count),
        };
    }
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

// ============================================================================
// TESTS
// ============================================================================
