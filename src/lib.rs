// IBEX 35 Governance Network - Core Library
// Companies, boards and shareholders -> consolidated network -> influence rankings

pub mod models;
pub mod consolidation;  // Entity Consolidator
pub mod graph;          // Graph Builder
pub mod metrics;        // Metrics Calculator
pub mod analysis;       // Analysis Aggregator
pub mod ingestion;      // Sheet exports joined by ISIN
pub mod store;          // Snapshot cache
pub mod config;
pub mod error;

// Re-export commonly used types
pub use models::{filter_selected, Company, Director, Shareholder, ShareholderType};
pub use consolidation::{
    consolidate, normalize_name, Consolidation, ConsolidatedDirector, ConsolidatedShareholder,
};
pub use graph::{
    build_graph, sanitize_key, BoardInterlock, EdgeKind, NetworkEdge, NetworkGraph, NetworkNode,
    NodeKind,
};
pub use metrics::{compute_metrics, NetworkMetrics};
pub use analysis::{analyze_network, get_node_metrics, NetworkAnalysis, NetworkAnalyzer};
pub use ingestion::{
    join_rows, load_snapshot, load_snapshot_from_dir, CompanyRow, DirectorRow, JoinReport,
    ShareholderRow,
};
pub use store::{
    latest_snapshot, save_snapshot, setup_database, snapshot_count, SaveOutcome, Snapshot,
    SnapshotMeta, SyncEvent,
};
pub use config::Config;
pub use error::{IngestError, IngestResult};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
