// Company snapshot model
// One Company per IBEX 35 constituent, with its board and its declared holders embedded.
//
// A snapshot is immutable: every sync builds a fresh Vec<Company> and the
// previous one is dropped, never patched.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

// ============================================================================
// SHAREHOLDER TYPE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShareholderType {
    /// Funds, banks, asset managers
    Institutional,

    /// Private individuals and family holdings
    Individual,

    /// State holdings (SEPI, sovereign funds)
    Government,

    /// Board members holding shares
    Insider,

    /// Other / Unknown
    Other,
}

impl ShareholderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShareholderType::Institutional => "institutional",
            ShareholderType::Individual => "individual",
            ShareholderType::Government => "government",
            ShareholderType::Insider => "insider",
            ShareholderType::Other => "other",
        }
    }

    /// Parse a spreadsheet label (English or Spanish). Unknown labels map to Other.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "institutional" | "institucional" | "fund" | "fondo" => ShareholderType::Institutional,
            "individual" | "particular" | "persona fisica" | "persona física" => {
                ShareholderType::Individual
            }
            "government" | "gobierno" | "estado" | "public" | "publico" | "público" => {
                ShareholderType::Government
            }
            "insider" | "consejero" | "board" => ShareholderType::Insider,
            _ => ShareholderType::Other,
        }
    }
}

// ============================================================================
// DIRECTOR / SHAREHOLDER (as recorded on one company)
// ============================================================================

/// A board seat as listed on a company. The name is free text and is the
/// only identity signal available.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Director {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub appointment_date: Option<NaiveDate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio_url: Option<String>,
}

impl Director {
    pub fn new(name: &str) -> Self {
        Director {
            name: name.to_string(),
            position: None,
            appointment_date: None,
            bio_url: None,
        }
    }

    pub fn with_position(mut self, position: &str) -> Self {
        self.position = Some(position.to_string());
        self
    }
}

/// A declared holding in one company. `percentage` is relative to that
/// company's equity only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shareholder {
    pub name: String,

    pub percentage: f64,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub shareholder_type: Option<ShareholderType>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_date: Option<NaiveDate>,
}

impl Shareholder {
    pub fn new(name: &str, percentage: f64) -> Self {
        Shareholder {
            name: name.to_string(),
            percentage,
            shareholder_type: None,
            report_date: None,
        }
    }

    pub fn with_type(mut self, shareholder_type: ShareholderType) -> Self {
        self.shareholder_type = Some(shareholder_type);
        self
    }
}

// ============================================================================
// COMPANY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    /// Exchange ticker, e.g. "SAN.MC". Unique per snapshot.
    pub ticker: String,

    /// Display name
    pub company: String,

    pub sector: String,

    pub market_cap_eur: f64,

    #[serde(default)]
    pub directors: Vec<Director>,

    #[serde(default)]
    pub shareholders: Vec<Shareholder>,
}

impl Company {
    pub fn new(ticker: &str, company: &str, sector: &str, market_cap_eur: f64) -> Self {
        Company {
            ticker: ticker.to_string(),
            company: company.to_string(),
            sector: sector.to_string(),
            market_cap_eur,
            directors: Vec::new(),
            shareholders: Vec::new(),
        }
    }

    pub fn with_director(mut self, director: Director) -> Self {
        self.directors.push(director);
        self
    }

    pub fn with_shareholder(mut self, shareholder: Shareholder) -> Self {
        self.shareholders.push(shareholder);
        self
    }
}

/// Keep only the companies whose ticker is in the selection, preserving input order.
///
/// Tickers are compared trimmed, the same form the graph uses as node id.
pub fn filter_selected(companies: &[Company], selected: &HashSet<String>) -> Vec<Company> {
    companies
        .iter()
        .filter(|c| selected.contains(c.ticker.trim()))
        .cloned()
        .collect()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shareholder_type_from_label() {
        assert_eq!(ShareholderType::from_label("Institutional"), ShareholderType::Institutional);
        assert_eq!(ShareholderType::from_label(" institucional "), ShareholderType::Institutional);
        assert_eq!(ShareholderType::from_label("Gobierno"), ShareholderType::Government);
        assert_eq!(ShareholderType::from_label("consejero"), ShareholderType::Insider);
        assert_eq!(ShareholderType::from_label("particular"), ShareholderType::Individual);
        assert_eq!(ShareholderType::from_label("family office"), ShareholderType::Other);
        assert_eq!(ShareholderType::from_label(""), ShareholderType::Other);
    }

    #[test]
    fn test_company_serializes_camel_case() {
        let company = Company::new("ACS.MC", "ACS", "Construction", 1e10)
            .with_director(Director::new("Juan Perez").with_position("Consejero"))
            .with_shareholder(
                Shareholder::new("BlackRock", 5.2).with_type(ShareholderType::Institutional),
            );

        let json = serde_json::to_value(&company).unwrap();
        assert_eq!(json["marketCapEur"], serde_json::json!(1e10));
        assert_eq!(json["directors"][0]["position"], "Consejero");
        assert_eq!(json["shareholders"][0]["type"], "institutional");
        assert!(json["directors"][0].get("bioUrl").is_none());
    }

    #[test]
    fn test_company_deserializes_with_missing_lists() {
        let json = r#"{"ticker":"ITX.MC","company":"Inditex","sector":"Retail","marketCapEur":1.5e11}"#;
        let company: Company = serde_json::from_str(json).unwrap();

        assert_eq!(company.ticker, "ITX.MC");
        assert!(company.directors.is_empty());
        assert!(company.shareholders.is_empty());
    }

    #[test]
    fn test_filter_selected_keeps_order() {
        let companies = vec![
            Company::new("SAN.MC", "Santander", "Banking", 1.0),
            Company::new("BBVA.MC", "BBVA", "Banking", 1.0),
            Company::new("TEF.MC", "Telefonica", "Telecom", 1.0),
        ];
        let selected: HashSet<String> = ["TEF.MC", "SAN.MC"].iter().map(|s| s.to_string()).collect();

        let filtered = filter_selected(&companies, &selected);
        let tickers: Vec<&str> = filtered.iter().map(|c| c.ticker.as_str()).collect();
        assert_eq!(tickers, vec!["SAN.MC", "TEF.MC"]);

        assert!(filter_selected(&companies, &HashSet::new()).is_empty());
    }

    #[test]
    fn test_filter_selected_matches_trimmed_ticker_case_sensitively() {
        let companies = vec![
            Company::new(" SAN.MC ", "Santander", "Banking", 1.0),
            Company::new("itx.mc", "Inditex", "Retail", 1.0),
        ];

        let selected: HashSet<String> = ["SAN.MC", "itx.mc"].iter().map(|s| s.to_string()).collect();
        assert_eq!(filter_selected(&companies, &selected).len(), 2);

        let upper: HashSet<String> = ["ITX.MC".to_string()].into_iter().collect();
        assert!(filter_selected(&companies, &upper).is_empty());
    }
}
