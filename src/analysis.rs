// Analysis Aggregator - summary statistics and ranked lists
//
// The result is built once per snapshot and handed out whole; callers
// replace it on the next recomputation instead of mutating it.

use crate::graph::{BoardInterlock, NetworkEdge, NetworkGraph, NetworkNode, NodeKind};
use crate::metrics::{compute_metrics, NetworkMetrics};
use crate::models::{filter_selected, Company};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use tracing::debug;

// ============================================================================
// NETWORK ANALYSIS RESULT
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkAnalysis {
    pub nodes: Vec<NetworkNode>,
    pub edges: Vec<NetworkEdge>,
    pub total_nodes: usize,
    pub total_edges: usize,
    pub network_density: f64,
    pub average_degree: f64,
    pub key_influencers: Vec<NetworkNode>,
    pub cross_board_directors: Vec<NetworkNode>,
    pub major_shareholders: Vec<NetworkNode>,
    pub board_interlocks: Vec<BoardInterlock>,

    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl NetworkAnalysis {
    /// Node by id. Falls back to a scan of `nodes` when the lookup table is
    /// empty, which is the case for a deserialized analysis.
    pub fn node(&self, node_id: &str) -> Option<&NetworkNode> {
        if self.index.is_empty() {
            return self.nodes.iter().find(|n| n.id == node_id);
        }
        self.index.get(node_id).and_then(|&i| self.nodes.get(i))
    }

    pub fn is_empty(&self) -> bool {
        self.total_nodes == 0
    }

    pub fn summary(&self) -> String {
        format!(
            "{} nodes, {} edges, density {:.3}, avg degree {:.2}, {} cross-board directors, {} major shareholders",
            self.total_nodes,
            self.total_edges,
            self.network_density,
            self.average_degree,
            self.cross_board_directors.len(),
            self.major_shareholders.len()
        )
    }

    /// Rebuild the id lookup so repeated point queries on a deserialized
    /// analysis skip the scan.
    pub fn reindex(&mut self) {
        self.index = index_nodes(&self.nodes);
    }
}

impl PartialEq for NetworkAnalysis {
    fn eq(&self, other: &Self) -> bool {
        self.nodes == other.nodes
            && self.edges == other.edges
            && self.total_nodes == other.total_nodes
            && self.total_edges == other.total_edges
            && self.network_density == other.network_density
            && self.average_degree == other.average_degree
            && self.key_influencers == other.key_influencers
            && self.cross_board_directors == other.cross_board_directors
            && self.major_shareholders == other.major_shareholders
            && self.board_interlocks == other.board_interlocks
    }
}

/// Point lookup for presentation code.
pub fn get_node_metrics<'a>(node_id: &str, analysis: &'a NetworkAnalysis) -> Option<&'a NetworkMetrics> {
    analysis.node(node_id).map(|n| &n.metrics)
}

fn index_nodes(nodes: &[NetworkNode]) -> HashMap<String, usize> {
    nodes
        .iter()
        .enumerate()
        .map(|(i, n)| (n.id.clone(), i))
        .collect()
}

pub fn network_density(total_nodes: usize, total_edges: usize) -> f64 {
    if total_nodes <= 1 {
        return 0.0;
    }
    let possible = total_nodes as f64 * (total_nodes - 1) as f64 / 2.0;
    total_edges as f64 / possible
}

pub fn average_degree(total_nodes: usize, total_edges: usize) -> f64 {
    if total_nodes == 0 {
        return 0.0;
    }
    (2 * total_edges) as f64 / total_nodes as f64
}

// ============================================================================
// NETWORK ANALYZER
// ============================================================================

pub struct NetworkAnalyzer {
    /// Length of the key influencer list (default: 10)
    pub top_influencers: usize,

    /// Influence a shareholder needs to count as major (default: 0.1)
    pub major_shareholder_threshold: f64,

    /// Boards a director needs to count as cross-board (default: 2)
    pub cross_board_min_companies: usize,
}

impl NetworkAnalyzer {
    pub fn new() -> Self {
        NetworkAnalyzer {
            top_influencers: 10,
            major_shareholder_threshold: 0.1,
            cross_board_min_companies: 2,
        }
    }

    /// Full pipeline: consolidate, build, score, aggregate.
    pub fn analyze(&self, companies: &[Company]) -> NetworkAnalysis {
        let mut graph = NetworkGraph::from_companies(companies);
        compute_metrics(&mut graph);
        self.aggregate(&graph)
    }

    /// Analyze only the companies whose ticker is selected.
    pub fn analyze_selection(&self, companies: &[Company], selected: &HashSet<String>) -> NetworkAnalysis {
        self.analyze(&filter_selected(companies, selected))
    }

    /// Summaries and rankings over a graph whose metrics are already computed.
    pub fn aggregate(&self, graph: &NetworkGraph) -> NetworkAnalysis {
        let nodes: Vec<NetworkNode> = graph.nodes.values().cloned().collect();
        let total_nodes = nodes.len();
        let total_edges = graph.edge_count();

        let mut key_influencers: Vec<NetworkNode> = nodes
            .iter()
            .filter(|n| n.metrics.influence > 0.0)
            .cloned()
            .collect();
        key_influencers.sort_by(by_influence_desc);
        key_influencers.truncate(self.top_influencers);

        let mut cross_board_directors: Vec<NetworkNode> = nodes
            .iter()
            .filter(|n| n.kind == NodeKind::Director && n.company_count >= self.cross_board_min_companies)
            .cloned()
            .collect();
        cross_board_directors.sort_by(|a, b| {
            b.connections
                .len()
                .cmp(&a.connections.len())
                .then_with(|| a.id.cmp(&b.id))
        });

        let mut major_shareholders: Vec<NetworkNode> = nodes
            .iter()
            .filter(|n| n.kind == NodeKind::Shareholder && n.metrics.influence > self.major_shareholder_threshold)
            .cloned()
            .collect();
        major_shareholders.sort_by(by_influence_desc);

        let index = index_nodes(&nodes);

        let analysis = NetworkAnalysis {
            edges: graph.edges.clone(),
            total_nodes,
            total_edges,
            network_density: network_density(total_nodes, total_edges),
            average_degree: average_degree(total_nodes, total_edges),
            key_influencers,
            cross_board_directors,
            major_shareholders,
            board_interlocks: graph.board_interlocks(),
            nodes,
            index,
        };

        debug!(summary = %analysis.summary(), "network analysis ready");

        analysis
    }
}

impl Default for NetworkAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

/// Analyze with default thresholds.
pub fn analyze_network(companies: &[Company]) -> NetworkAnalysis {
    NetworkAnalyzer::new().analyze(companies)
}

fn by_influence_desc(a: &NetworkNode, b: &NetworkNode) -> Ordering {
    b.metrics
        .influence
        .partial_cmp(&a.metrics.influence)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.id.cmp(&b.id))
}

// ============================================================================
// TESTS
// ============================================================================
