// Runtime configuration from environment variables
//
// IBEX_DATA_DIR                     directory with the three sheet exports (default: ./data)
// IBEX_DB_PATH                      snapshot cache (default: ./ibex-governance.db)
// IBEX_TOP_INFLUENCERS              key influencer list length (default: 10)
// IBEX_MAJOR_SHAREHOLDER_THRESHOLD  influence cut-off for major shareholders (default: 0.1)

use crate::analysis::NetworkAnalyzer;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::warn;

pub const ENV_DATA_DIR: &str = "IBEX_DATA_DIR";
pub const ENV_DB_PATH: &str = "IBEX_DB_PATH";
pub const ENV_TOP_INFLUENCERS: &str = "IBEX_TOP_INFLUENCERS";
pub const ENV_MAJOR_SHAREHOLDER_THRESHOLD: &str = "IBEX_MAJOR_SHAREHOLDER_THRESHOLD";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub data_dir: PathBuf,
    pub db_path: PathBuf,
    pub top_influencers: usize,
    pub major_shareholder_threshold: f64,
}

impl Default for Config {
    fn default() -> Self {
        let analyzer = NetworkAnalyzer::new();
        Config {
            data_dir: PathBuf::from("data"),
            db_path: PathBuf::from("ibex-governance.db"),
            top_influencers: analyzer.top_influencers,
            major_shareholder_threshold: analyzer.major_shareholder_threshold,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset or invalid values keep the default.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(dir) = lookup(ENV_DATA_DIR).filter(|v| !v.trim().is_empty()) {
            config.data_dir = PathBuf::from(dir.trim());
        }
        if let Some(path) = lookup(ENV_DB_PATH).filter(|v| !v.trim().is_empty()) {
            config.db_path = PathBuf::from(path.trim());
        }
        if let Some(n) = parse_var(&lookup, ENV_TOP_INFLUENCERS) {
            config.top_influencers = n;
        }
        if let Some(threshold) = parse_var::<f64, _>(&lookup, ENV_MAJOR_SHAREHOLDER_THRESHOLD) {
            if threshold.is_finite() {
                config.major_shareholder_threshold = threshold;
            } else {
                warn!(key = ENV_MAJOR_SHAREHOLDER_THRESHOLD, "non-finite threshold ignored");
            }
        }

        config
    }

    pub fn analyzer(&self) -> NetworkAnalyzer {
        NetworkAnalyzer {
            top_influencers: self.top_influencers,
            major_shareholder_threshold: self.major_shareholder_threshold,
            ..NetworkAnalyzer::new()
        }
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key, value = %raw, "invalid value, using default");
            None
        }
    }
}
