// Spreadsheet ingestion - companies / directors / shareholders sheets -> Vec<Company>
//
// The three sheets are exported as CSV and joined on ISIN. People rows that
// carry a ticker or only a company name in place of an ISIN are still
// attached through fallback lookups.

use crate::consolidation::normalize_name;
use crate::error::{IngestError, IngestResult};
use crate::models::{Company, Director, Shareholder, ShareholderType};
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

pub const COMPANIES_FILE: &str = "companies.csv";
pub const DIRECTORS_FILE: &str = "directors.csv";
pub const SHAREHOLDERS_FILE: &str = "shareholders.csv";

// ============================================================================
// SHEET ROWS
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompanyRow {
    #[serde(alias = "ISIN", default)]
    pub isin: String,

    #[serde(alias = "Ticker", default)]
    pub ticker: String,

    #[serde(alias = "Company", alias = "Empresa", alias = "name", default)]
    pub company: String,

    #[serde(alias = "Sector", default)]
    pub sector: String,

    #[serde(alias = "MarketCapEur", alias = "market_cap", alias = "Capitalizacion", default)]
    pub market_cap_eur: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DirectorRow {
    #[serde(alias = "ISIN", default)]
    pub isin: String,

    #[serde(alias = "Company", alias = "Empresa", default)]
    pub company: String,

    #[serde(alias = "Name", alias = "Nombre", alias = "director", default)]
    pub name: String,

    #[serde(alias = "Position", alias = "Cargo", default)]
    pub position: String,

    #[serde(alias = "AppointmentDate", alias = "Fecha_Nombramiento", default)]
    pub appointment_date: String,

    #[serde(alias = "BioUrl", alias = "bio", default)]
    pub bio_url: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShareholderRow {
    #[serde(alias = "ISIN", default)]
    pub isin: String,

    #[serde(alias = "Company", alias = "Empresa", default)]
    pub company: String,

    #[serde(alias = "Name", alias = "Nombre", alias = "shareholder", default)]
    pub name: String,

    #[serde(alias = "Percentage", alias = "Porcentaje", default)]
    pub percentage: String,

    #[serde(rename = "type", alias = "Type", alias = "Tipo", default)]
    pub shareholder_type: String,

    #[serde(alias = "ReportDate", alias = "Fecha", default)]
    pub report_date: String,
}

impl CompanyRow {
    /// Returns (normalized ISIN, company). The ISIN may be empty; such
    /// companies are still reachable by ticker and name.
    pub fn into_company(self) -> IngestResult<(String, Company)> {
        let ticker = self.ticker.trim().to_string();
        if ticker.is_empty() {
            return Err(IngestError::MissingField("ticker"));
        }

        let market_cap_eur = match parse_amount("market_cap_eur", &self.market_cap_eur) {
            Ok(value) => value.unwrap_or(0.0),
            Err(e) => {
                warn!(ticker = %ticker, error = %e, "market cap unreadable, using 0");
                0.0
            }
        };

        let name = if self.company.trim().is_empty() {
            ticker.clone()
        } else {
            self.company.trim().to_string()
        };

        let key = normalize_isin(&self.isin);
        Ok((
            key,
            Company::new(&ticker, &name, self.sector.trim(), market_cap_eur),
        ))
    }
}

impl DirectorRow {
    pub fn to_director(&self) -> IngestResult<Director> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(IngestError::MissingField("director name"));
        }

        Ok(Director {
            name: name.to_string(),
            position: non_empty(&self.position),
            appointment_date: parse_date_lenient("appointment_date", &self.appointment_date),
            bio_url: non_empty(&self.bio_url),
        })
    }
}

impl ShareholderRow {
    pub fn to_shareholder(&self) -> IngestResult<Shareholder> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(IngestError::MissingField("shareholder name"));
        }

        let percentage = parse_number("percentage", &self.percentage)?.unwrap_or(0.0);

        Ok(Shareholder {
            name: name.to_string(),
            percentage,
            shareholder_type: non_empty(&self.shareholder_type).map(|t| ShareholderType::from_label(&t)),
            report_date: parse_date_lenient("report_date", &self.report_date),
        })
    }
}

// ============================================================================
// FIELD PARSING
// ============================================================================

fn non_empty(s: &str) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

pub fn normalize_isin(s: &str) -> String {
    s.trim().to_uppercase()
}

/// Parse a sheet number: "5,2 %", "1.234.567,89", "12.5", "90000000000".
///
/// A lone comma is a decimal separator. A lone dot is decimal unless it
/// appears more than once. Empty input is `Ok(None)`.
pub fn parse_number(field: &'static str, raw: &str) -> IngestResult<Option<f64>> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '%' && *c != '€')
        .collect();

    if cleaned.is_empty() {
        return Ok(None);
    }

    let last_comma = cleaned.rfind(',');
    let last_dot = cleaned.rfind('.');

    let canonical = match (last_comma, last_dot) {
        (Some(c), Some(d)) if c > d => cleaned.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => cleaned.replace(',', ""),
        (Some(_), None) if cleaned.matches(',').count() > 1 => cleaned.replace(',', ""),
        (Some(_), None) => cleaned.replace(',', "."),
        (None, Some(_)) if cleaned.matches('.').count() > 1 => cleaned.replace('.', ""),
        _ => cleaned.clone(),
    };

    canonical
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .map(Some)
        .ok_or_else(|| IngestError::InvalidField {
            field,
            value: raw.to_string(),
            reason: "not a number".to_string(),
        })
}

/// Parse a whole-euro amount. Same rules as [`parse_number`], except that
/// a lone dot followed by exactly three digits ("90.000") is a thousands
/// group. Percentages keep the plain rule, since "5.125" is a decimal there.
pub fn parse_amount(field: &'static str, raw: &str) -> IngestResult<Option<f64>> {
    let trimmed = raw.trim();
    if let Some((int_part, frac_part)) = trimmed.split_once('.') {
        let grouped = !int_part.is_empty()
            && int_part.len() <= 3
            && int_part.chars().all(|c| c.is_ascii_digit())
            && frac_part.len() == 3
            && frac_part.chars().all(|c| c.is_ascii_digit());
        if grouped {
            return parse_number(field, &format!("{}{}", int_part, frac_part));
        }
    }

    parse_number(field, raw)
}

/// Parse YYYY-MM-DD or DD/MM/YYYY.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%d/%m/%Y") {
        return Some(date);
    }

    None
}

fn parse_date_lenient(field: &'static str, raw: &str) -> Option<NaiveDate> {
    if raw.trim().is_empty() {
        return None;
    }
    let parsed = parse_date(raw);
    if parsed.is_none() {
        warn!(field, value = raw, "unparseable date ignored");
    }
    parsed
}

// ============================================================================
// CSV READING
// ============================================================================

/// Rows that deserialized, plus a count of those that did not.
#[derive(Debug, Clone)]
pub struct RowBatch<T> {
    pub rows: Vec<T>,
    pub skipped: usize,
}

fn read_rows<T: DeserializeOwned, R: Read>(reader: R, sheet: &str) -> IngestResult<RowBatch<T>> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .flexible(true)
        .from_reader(reader);

    // Header problems abort the whole sheet
    rdr.headers()?;

    let mut rows: Vec<T> = Vec::new();
    let mut skipped = 0;

    for (line, result) in rdr.deserialize::<T>().enumerate() {
        match result {
            Ok(row) => rows.push(row),
            Err(e) => {
                warn!(sheet, line = line + 2, error = %e, "skipping malformed row");
                skipped += 1;
            }
        }
    }

    Ok(RowBatch { rows, skipped })
}

pub fn read_company_rows<R: Read>(reader: R) -> IngestResult<RowBatch<CompanyRow>> {
    read_rows(reader, "companies")
}

pub fn read_director_rows<R: Read>(reader: R) -> IngestResult<RowBatch<DirectorRow>> {
    read_rows(reader, "directors")
}

pub fn read_shareholder_rows<R: Read>(reader: R) -> IngestResult<RowBatch<ShareholderRow>> {
    read_rows(reader, "shareholders")
}

// ============================================================================
// JOIN
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct JoinReport {
    pub companies: Vec<Company>,

    /// Director rows whose company could not be found
    pub orphan_directors: usize,

    /// Shareholder rows whose company could not be found
    pub orphan_shareholders: usize,

    /// Rows dropped as malformed (missing name / ticker, bad number, bad CSV)
    pub skipped_rows: usize,
}

impl JoinReport {
    pub fn summary(&self) -> String {
        format!(
            "{} companies, {} directors, {} shareholders ({} orphan directors, {} orphan shareholders, {} skipped rows)",
            self.companies.len(),
            self.companies.iter().map(|c| c.directors.len()).sum::<usize>(),
            self.companies.iter().map(|c| c.shareholders.len()).sum::<usize>(),
            self.orphan_directors,
            self.orphan_shareholders,
            self.skipped_rows
        )
    }
}

/// Lookup tables over the company sheet, one per join attempt.
struct CompanyIndex {
    by_isin: HashMap<String, usize>,
    by_ticker: HashMap<String, usize>,
    by_name: HashMap<String, usize>,
}

impl CompanyIndex {
    fn build(keys: &[String], companies: &[Company]) -> Self {
        let mut index = CompanyIndex {
            by_isin: HashMap::new(),
            by_ticker: HashMap::new(),
            by_name: HashMap::new(),
        };

        for (i, (key, company)) in keys.iter().zip(companies).enumerate() {
            if !key.is_empty() {
                index.by_isin.insert(key.clone(), i);
            }
            index.by_ticker.insert(company.ticker.to_uppercase(), i);
            index.by_name.insert(normalize_name(&company.company), i);
        }

        index
    }

    /// ISIN first, then the ISIN column read as a ticker, then company name.
    fn find(&self, isin: &str, company: &str) -> Option<usize> {
        let key = normalize_isin(isin);
        if !key.is_empty() {
            if let Some(&i) = self.by_isin.get(&key) {
                return Some(i);
            }
            if let Some(&i) = self.by_ticker.get(&key) {
                return Some(i);
            }
        }

        let name = normalize_name(company);
        if name.is_empty() {
            return None;
        }
        self.by_name.get(&name).copied()
    }
}

/// Attach people rows to their companies.
///
/// Duplicate tickers in the company sheet are kept as-is; the graph builder
/// resolves them last-write-wins.
pub fn join_rows(
    company_rows: Vec<CompanyRow>,
    director_rows: &[DirectorRow],
    shareholder_rows: &[ShareholderRow],
) -> JoinReport {
    let mut report = JoinReport::default();
    let mut keys = Vec::with_capacity(company_rows.len());

    for row in company_rows {
        match row.into_company() {
            Ok((key, company)) => {
                keys.push(key);
                report.companies.push(company);
            }
            Err(e) => {
                warn!(error = %e, "skipping company row");
                report.skipped_rows += 1;
            }
        }
    }

    let index = CompanyIndex::build(&keys, &report.companies);

    for row in director_rows {
        let director = match row.to_director() {
            Ok(d) => d,
            Err(e) => {
                debug!(error = %e, isin = %row.isin, "skipping director row");
                report.skipped_rows += 1;
                continue;
            }
        };
        match index.find(&row.isin, &row.company) {
            Some(i) => report.companies[i].directors.push(director),
            None => {
                warn!(isin = %row.isin, company = %row.company, name = %director.name, "director without company");
                report.orphan_directors += 1;
            }
        }
    }

    for row in shareholder_rows {
        let shareholder = match row.to_shareholder() {
            Ok(s) => s,
            Err(e) => {
                debug!(error = %e, isin = %row.isin, "skipping shareholder row");
                report.skipped_rows += 1;
                continue;
            }
        };
        match index.find(&row.isin, &row.company) {
            Some(i) => report.companies[i].shareholders.push(shareholder),
            None => {
                warn!(isin = %row.isin, company = %row.company, name = %shareholder.name, "shareholder without company");
                report.orphan_shareholders += 1;
            }
        }
    }

    debug!(summary = %report.summary(), "joined sheets");

    report
}

/// Read the three sheets from readers and join them.
pub fn load_snapshot<C: Read, D: Read, S: Read>(
    companies: C,
    directors: D,
    shareholders: S,
) -> IngestResult<JoinReport> {
    let company_batch = read_company_rows(companies)?;
    let director_batch = read_director_rows(directors)?;
    let shareholder_batch = read_shareholder_rows(shareholders)?;

    let mut report = join_rows(company_batch.rows, &director_batch.rows, &shareholder_batch.rows);
    report.skipped_rows += company_batch.skipped + director_batch.skipped + shareholder_batch.skipped;

    Ok(report)
}

/// Read `companies.csv`, `directors.csv` and `shareholders.csv` from a directory.
pub fn load_snapshot_from_dir(dir: &Path) -> IngestResult<JoinReport> {
    let companies = File::open(dir.join(COMPANIES_FILE))?;
    let directors = File::open(dir.join(DIRECTORS_FILE))?;
    let shareholders = File::open(dir.join(SHAREHOLDERS_FILE))?;

    load_snapshot(companies, directors, shareholders)
}

// ============================================================================
// TESTS
// ============================================================================
