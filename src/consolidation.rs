// Entity Consolidator - one record per distinct director / shareholder
//
// Identity is the normalized name and nothing else: "Ana García" and
// " ana garcía " are one person, "Ana Garcia" is another.

use crate::models::{Company, Director, Shareholder};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Consolidation key: trimmed, lowercased name.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

// ============================================================================
// CONSOLIDATED ENTITIES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsolidatedDirector {
    pub key: String,

    /// First row seen for this key
    pub representative: Director,

    /// Tickers of every board this person sits on
    pub companies: BTreeSet<String>,

    /// Union of position titles, first-seen order
    pub positions: Vec<String>,
}

impl ConsolidatedDirector {
    fn new(key: String, director: &Director) -> Self {
        ConsolidatedDirector {
            key,
            representative: director.clone(),
            companies: BTreeSet::new(),
            positions: Vec::new(),
        }
    }

    fn absorb(&mut self, ticker: &str, director: &Director) {
        self.companies.insert(ticker.to_string());

        if let Some(position) = director.position.as_deref().map(str::trim) {
            if !position.is_empty() && !self.positions.iter().any(|p| p == position) {
                self.positions.push(position.to_string());
            }
        }
    }

    pub fn company_count(&self) -> usize {
        self.companies.len()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsolidatedShareholder {
    pub key: String,

    /// First row seen for this key
    pub representative: Shareholder,

    pub companies: BTreeSet<String>,

    /// Declared percentage per ticker
    pub holdings: BTreeMap<String, f64>,

    /// Sum of the declared percentages across all companies. Each
    /// percentage refers to a different equity base, so this is only a
    /// ranking signal, not an economic exposure.
    pub total_percentage: f64,
}

impl ConsolidatedShareholder {
    fn new(key: String, shareholder: &Shareholder) -> Self {
        ConsolidatedShareholder {
            key,
            representative: shareholder.clone(),
            companies: BTreeSet::new(),
            holdings: BTreeMap::new(),
            total_percentage: 0.0,
        }
    }

    fn absorb(&mut self, ticker: &str, shareholder: &Shareholder) {
        self.companies.insert(ticker.to_string());

        let percentage = if shareholder.percentage.is_finite() {
            shareholder.percentage
        } else {
            0.0
        };
        *self.holdings.entry(ticker.to_string()).or_insert(0.0) += percentage;
        self.total_percentage += percentage;
    }

    pub fn company_count(&self) -> usize {
        self.companies.len()
    }
}

// ============================================================================
// CONSOLIDATION
// ============================================================================

/// Output of the consolidator, keyed by normalized name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Consolidation {
    pub directors: BTreeMap<String, ConsolidatedDirector>,
    pub shareholders: BTreeMap<String, ConsolidatedShareholder>,
}

impl Consolidation {
    pub fn is_empty(&self) -> bool {
        self.directors.is_empty() && self.shareholders.is_empty()
    }

    /// Directors sitting on more than one board
    pub fn cross_board_directors(&self) -> impl Iterator<Item = &ConsolidatedDirector> {
        self.directors.values().filter(|d| d.company_count() > 1)
    }
}

/// Collapse per-company rows into one record per distinct name.
///
/// Companies without a ticker and rows without a name are skipped.
pub fn consolidate(companies: &[Company]) -> Consolidation {
    let mut result = Consolidation::default();
    let mut skipped_rows = 0usize;

    for company in companies {
        let ticker = company.ticker.trim();
        if ticker.is_empty() {
            skipped_rows += company.directors.len() + company.shareholders.len();
            continue;
        }

        for director in &company.directors {
            let key = normalize_name(&director.name);
            if key.is_empty() {
                skipped_rows += 1;
                continue;
            }
            result
                .directors
                .entry(key.clone())
                .or_insert_with(|| ConsolidatedDirector::new(key, director))
                .absorb(ticker, director);
        }

        for shareholder in &company.shareholders {
            let key = normalize_name(&shareholder.name);
            if key.is_empty() {
                skipped_rows += 1;
                continue;
            }
            result
                .shareholders
                .entry(key.clone())
                .or_insert_with(|| ConsolidatedShareholder::new(key, shareholder))
                .absorb(ticker, shareholder);
        }
    }

    debug!(
        directors = result.directors.len(),
        shareholders = result.shareholders.len(),
        skipped_rows,
        "consolidated entities"
    );

    result
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn company(ticker: &str, directors: &[&str], shareholders: &[(&str, f64)]) -> Company {
        let mut c = Company::new(ticker, ticker, "Test", 1e9);
        for name in directors {
            c = c.with_director(Director::new(name));
        }
        for (name, pct) in shareholders {
            c = c.with_shareholder(Shareholder::new(name, *pct));
        }
        c
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("  Ana García "), "ana garcía");
        assert_eq!(normalize_name("BLACKROCK"), "blackrock");
        assert_eq!(normalize_name("   "), "");
    }

    #[test]
    fn test_same_name_after_trim_and_case_consolidates() {
        let companies = vec![
            company("SAN.MC", &["Ana García"], &[]),
            company("BBVA.MC", &[" ana garcía "], &[]),
        ];

        let result = consolidate(&companies);
        assert_eq!(result.directors.len(), 1);

        let ana = &result.directors["ana garcía"];
        assert_eq!(ana.company_count(), 2);
        assert_eq!(ana.representative.name, "Ana García");
    }

    #[test]
    fn test_accent_variants_stay_separate() {
        let companies = vec![
            company("SAN.MC", &["Ana García"], &[]),
            company("BBVA.MC", &["Ana Garcia"], &[]),
        ];

        let result = consolidate(&companies);
        assert_eq!(result.directors.len(), 2);
        assert!(result.directors.values().all(|d| d.company_count() == 1));
    }

    #[test]
    fn test_blank_names_are_dropped() {
        let companies = vec![company("SAN.MC", &["", "   ", "Luis"], &[("", 3.0), ("Norges", 2.0)])];

        let result = consolidate(&companies);
        assert_eq!(result.directors.len(), 1);
        assert_eq!(result.shareholders.len(), 1);
    }

    #[test]
    fn test_company_without_ticker_is_skipped() {
        let companies = vec![
            company("  ", &["Luis"], &[("Norges", 2.0)]),
            company("ITX.MC", &["Marta"], &[]),
        ];

        let result = consolidate(&companies);
        assert_eq!(result.directors.len(), 1);
        assert!(result.directors.contains_key("marta"));
        assert!(result.shareholders.is_empty());
    }

    #[test]
    fn test_shareholder_percentages_are_summed() {
        let companies = vec![
            company("SAN.MC", &[], &[("BlackRock", 5.2)]),
            company("BBVA.MC", &[], &[("blackrock", 4.8)]),
            company("TEF.MC", &[], &[("BlackRock ", f64::NAN)]),
        ];

        let result = consolidate(&companies);
        let blackrock = &result.shareholders["blackrock"];
        assert_eq!(blackrock.company_count(), 3);
        assert!((blackrock.total_percentage - 10.0).abs() < 1e-9);
        assert_eq!(blackrock.holdings["SAN.MC"], 5.2);
        assert_eq!(blackrock.holdings["TEF.MC"], 0.0);
    }

    #[test]
    fn test_positions_are_unioned() {
        let companies = vec![
            Company::new("SAN.MC", "Santander", "Banking", 1.0)
                .with_director(Director::new("Luis").with_position("Presidente")),
            Company::new("TEF.MC", "Telefonica", "Telecom", 1.0)
                .with_director(Director::new("LUIS").with_position("Consejero"))
                .with_director(Director::new("luis").with_position(" Presidente ")),
        ];

        let result = consolidate(&companies);
        let luis = &result.directors["luis"];
        assert_eq!(luis.positions, vec!["Presidente".to_string(), "Consejero".to_string()]);
        assert_eq!(luis.company_count(), 2);
    }

    #[test]
    fn test_input_order_does_not_change_entity_set() {
        let a = company("SAN.MC", &["Ana", "Luis"], &[("Norges", 1.0)]);
        let b = company("BBVA.MC", &["Luis", "Pedro"], &[("Norges", 2.0)]);

        let forward = consolidate(&[a.clone(), b.clone()]);
        let backward = consolidate(&[b, a]);

        let keys_forward: Vec<&String> = forward.directors.keys().collect();
        let keys_backward: Vec<&String> = backward.directors.keys().collect();
        assert_eq!(keys_forward, keys_backward);
        assert_eq!(
            forward.directors["luis"].companies,
            backward.directors["luis"].companies
        );
        assert_eq!(forward.cross_board_directors().count(), 1);
    }

    #[test]
    fn test_empty_input() {
        let result = consolidate(&[]);
        assert!(result.is_empty());
    }
}
