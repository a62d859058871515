// Graph Builder - companies + consolidated entities -> nodes and edges
//
// Company nodes are keyed by ticker, directors by "dir_<key>", shareholders
// by "shr_<key>". Adjacency is stored on both ends of every edge.

use crate::consolidation::{consolidate, Consolidation};
use crate::metrics::NetworkMetrics;
use crate::models::Company;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use tracing::debug;

pub const DIRECTOR_PREFIX: &str = "dir_";
pub const SHAREHOLDER_PREFIX: &str = "shr_";

// ============================================================================
// NODE / EDGE TYPES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Company,
    Director,
    Shareholder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// company -> director
    BoardMember,

    /// company -> shareholder
    Shareholder,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkNode {
    pub id: String,
    pub name: String,
    pub kind: NodeKind,

    /// Ids of directly linked nodes
    pub connections: BTreeSet<String>,

    pub metrics: NetworkMetrics,

    /// Directors / shareholders: number of companies touched. Companies: 0.
    pub company_count: usize,

    /// Shareholders only: summed percentage across companies
    pub total_percentage: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_cap_eur: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sector: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub positions: Vec<String>,
}

impl NetworkNode {
    fn new(id: String, name: String, kind: NodeKind) -> Self {
        NetworkNode {
            id,
            name,
            kind,
            connections: BTreeSet::new(),
            metrics: NetworkMetrics::default(),
            company_count: 0,
            total_percentage: 0.0,
            market_cap_eur: None,
            sector: None,
            positions: Vec::new(),
        }
    }

    pub fn degree(&self) -> usize {
        self.connections.len()
    }

    pub fn is_company(&self) -> bool {
        self.kind == NodeKind::Company
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkEdge {
    /// Company ticker
    pub source: String,

    /// Director or shareholder node id
    pub target: String,

    pub kind: EdgeKind,

    /// Ownership edges: percentage declared for this company
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percentage: Option<f64>,
}

/// Two companies whose boards share at least one director.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardInterlock {
    pub company_a: String,
    pub company_b: String,
    pub shared_directors: Vec<String>,
}

// ============================================================================
// NETWORK GRAPH
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkGraph {
    pub nodes: BTreeMap<String, NetworkNode>,
    pub edges: Vec<NetworkEdge>,
}

impl NetworkGraph {
    /// Consolidate and build in one step.
    pub fn from_companies(companies: &[Company]) -> Self {
        let consolidation = consolidate(companies);
        build_graph(companies, &consolidation)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn get(&self, id: &str) -> Option<&NetworkNode> {
        self.nodes.get(id)
    }

    pub fn nodes_of_kind(&self, kind: NodeKind) -> impl Iterator<Item = &NetworkNode> {
        self.nodes.values().filter(move |n| n.kind == kind)
    }

    /// Company pairs sharing directors, ordered by (company_a, company_b).
    pub fn board_interlocks(&self) -> Vec<BoardInterlock> {
        let mut pairs: BTreeMap<(String, String), Vec<String>> = BTreeMap::new();

        for director in self.nodes_of_kind(NodeKind::Director) {
            if director.connections.len() < 2 {
                continue;
            }
            let boards: Vec<&String> = director.connections.iter().collect();
            for (i, a) in boards.iter().enumerate() {
                for b in &boards[i + 1..] {
                    pairs
                        .entry(((*a).clone(), (*b).clone()))
                        .or_default()
                        .push(director.name.clone());
                }
            }
        }

        pairs
            .into_iter()
            .map(|((company_a, company_b), shared_directors)| BoardInterlock {
                company_a,
                company_b,
                shared_directors,
            })
            .collect()
    }

    fn link(&mut self, source: &str, target: &str, kind: EdgeKind, percentage: Option<f64>) {
        if !self.nodes.contains_key(source) || !self.nodes.contains_key(target) {
            return;
        }
        if let Some(company) = self.nodes.get_mut(source) {
            company.connections.insert(target.to_string());
        }
        if let Some(entity) = self.nodes.get_mut(target) {
            entity.connections.insert(source.to_string());
        }
        self.edges.push(NetworkEdge {
            source: source.to_string(),
            target: target.to_string(),
            kind,
            percentage,
        });
    }
}

/// Replace every character outside [a-z0-9] with '_'.
pub fn sanitize_key(key: &str) -> String {
    key.chars()
        .map(|c| if c.is_ascii_lowercase() || c.is_ascii_digit() { c } else { '_' })
        .collect()
}

/// Pick `<prefix><sanitized>`, appending _2, _3, ... if already taken.
fn allocate_id(prefix: &str, key: &str, taken: &mut HashSet<String>) -> String {
    let base = format!("{}{}", prefix, sanitize_key(key));
    let mut id = base.clone();
    let mut suffix = 2;
    while taken.contains(&id) {
        id = format!("{}_{}", base, suffix);
        suffix += 1;
    }
    taken.insert(id.clone());
    id
}

/// Materialize nodes and edges. Metrics are left zeroed; see `metrics::compute_metrics`.
pub fn build_graph(companies: &[Company], consolidation: &Consolidation) -> NetworkGraph {
    let mut graph = NetworkGraph::default();

    // Companies: last occurrence of a ticker wins
    for company in companies {
        let ticker = company.ticker.trim();
        if ticker.is_empty() {
            continue;
        }
        let mut node = NetworkNode::new(ticker.to_string(), company.company.clone(), NodeKind::Company);
        node.market_cap_eur = Some(company.market_cap_eur);
        node.sector = Some(company.sector.clone());
        graph.nodes.insert(ticker.to_string(), node);
    }

    let mut taken: HashSet<String> = graph.nodes.keys().cloned().collect();

    for director in consolidation.directors.values() {
        let id = allocate_id(DIRECTOR_PREFIX, &director.key, &mut taken);
        let mut node = NetworkNode::new(
            id.clone(),
            director.representative.name.trim().to_string(),
            NodeKind::Director,
        );
        node.company_count = director.company_count();
        node.positions = director.positions.clone();
        graph.nodes.insert(id.clone(), node);

        for ticker in &director.companies {
            graph.link(ticker, &id, EdgeKind::BoardMember, None);
        }
    }

    for shareholder in consolidation.shareholders.values() {
        let id = allocate_id(SHAREHOLDER_PREFIX, &shareholder.key, &mut taken);
        let mut node = NetworkNode::new(
            id.clone(),
            shareholder.representative.name.trim().to_string(),
            NodeKind::Shareholder,
        );
        node.company_count = shareholder.company_count();
        node.total_percentage = shareholder.total_percentage;
        graph.nodes.insert(id.clone(), node);

        for ticker in &shareholder.companies {
            let percentage = shareholder.holdings.get(ticker).copied();
            graph.link(ticker, &id, EdgeKind::Shareholder, percentage);
        }
    }

    debug!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "built governance graph"
    );

    graph
}

// ============================================================================
// TESTS
// ============================================================================
