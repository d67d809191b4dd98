use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate};
use csv::StringRecord;

use crate::error::{LedgerError, Result};
use crate::extractor::{extract_document_text, scan_statement_text, PageOcr};
use crate::models::Transaction;

// ---------------------------------------------------------------------------
// Normalization helpers
// ---------------------------------------------------------------------------

/// Parse a raw amount field, stripping currency symbols, thousands
/// separators, and quotes. Parenthesized values are negative. Anything that
/// still fails to parse normalizes to 0.0 so the record stays joinable.
pub fn parse_amount(raw: &str) -> f64 {
    let s = raw.replace(',', "").replace('"', "").replace('$', "");
    let s = s.trim();
    if let Some(inner) = s.strip_prefix('(').and_then(|v| v.strip_suffix(')')) {
        return -inner.trim().parse::<f64>().unwrap_or(0.0);
    }
    s.parse().unwrap_or(0.0)
}

/// Parse a raw date field. Accepts ISO (`2024-01-05`), US (`01/05/2024`),
/// and year-less statement dates (`01/05`, resolved against the current
/// year). Anything else is the invalid-date sentinel `None`.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    parse_date_with_year(raw, chrono::Local::now().year())
}

fn parse_date_with_year(raw: &str, fallback_year: i32) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(d);
    }
    if let Ok(d) = NaiveDate::parse_from_str(raw, "%m/%d/%Y") {
        return Some(d);
    }
    let parts: Vec<&str> = raw.split('/').collect();
    if parts.len() == 2 {
        let m: u32 = parts[0].parse().ok()?;
        let d: u32 = parts[1].parse().ok()?;
        return NaiveDate::from_ymd_opt(fallback_year, m, d);
    }
    None
}

#[cfg(any(feature = "xlsx", test))]
fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    // Excel epoch is 1899-12-30 (accounting for the 1900 leap year bug)
    let base = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    base.checked_add_signed(chrono::Duration::days(serial as i64))
}

// ---------------------------------------------------------------------------
// Header mapping
// ---------------------------------------------------------------------------

/// Positions of the canonical columns in a tabular source. A column missing
/// from the header stays `None` and its field takes the default for every
/// row, so the canonical schema is always complete downstream.
#[derive(Debug, Default)]
struct ColumnMap {
    date: Option<usize>,
    description: Option<usize>,
    amount: Option<usize>,
}

impl ColumnMap {
    fn from_header<'a>(fields: impl Iterator<Item = &'a str>) -> Self {
        let mut map = Self::default();
        for (i, field) in fields.enumerate() {
            match field.trim().to_ascii_lowercase().as_str() {
                "date" => map.date.get_or_insert(i),
                "description" => map.description.get_or_insert(i),
                "amount" => map.amount.get_or_insert(i),
                _ => continue,
            };
        }
        map
    }

    fn row(&self, field: impl Fn(usize) -> Option<String>) -> Transaction {
        let date = self
            .date
            .and_then(&field)
            .and_then(|v| parse_date(&v));
        let description = self
            .description
            .and_then(&field)
            .map(|v| v.trim().to_string())
            .unwrap_or_default();
        let amount = self
            .amount
            .and_then(&field)
            .map(|v| parse_amount(&v))
            .unwrap_or(0.0);
        Transaction {
            date,
            description,
            amount,
        }
    }
}

// ---------------------------------------------------------------------------
// Source kinds — enum dispatch instead of trait objects
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SourceKind {
    Csv,
    #[cfg(feature = "xlsx")]
    Xlsx,
    Pdf,
}

impl SourceKind {
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "csv" => Ok(Self::Csv),
            #[cfg(feature = "xlsx")]
            "xlsx" => Ok(Self::Xlsx),
            "pdf" => Ok(Self::Pdf),
            _ => Err(LedgerError::UnsupportedFormat(path.to_path_buf())),
        }
    }

    pub fn parse(&self, path: &Path, ocr: &dyn PageOcr) -> Result<Vec<Transaction>> {
        match self {
            Self::Csv => parse_csv(path),
            #[cfg(feature = "xlsx")]
            Self::Xlsx => parse_xlsx(path),
            Self::Pdf => parse_pdf(path, ocr),
        }
    }
}

// ---------------------------------------------------------------------------
// CSV
// ---------------------------------------------------------------------------

fn parse_csv(path: &Path) -> Result<Vec<Transaction>> {
    let file = std::fs::File::open(path)?;
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(std::io::BufReader::new(file));

    let mut rows = Vec::new();
    let mut columns: Option<ColumnMap> = None;
    for result in rdr.records() {
        let Ok(record) = result else { continue };
        if record.iter().all(|f| f.trim().is_empty()) {
            continue;
        }
        match &columns {
            None => columns = Some(ColumnMap::from_header(record.iter())),
            Some(map) => rows.push(map.row(|i| field_at(&record, i))),
        }
    }
    Ok(rows)
}

fn field_at(record: &StringRecord, i: usize) -> Option<String> {
    record.get(i).map(|f| f.to_string())
}

// ---------------------------------------------------------------------------
// XLSX (feature-gated)
// ---------------------------------------------------------------------------

#[cfg(feature = "xlsx")]
fn parse_xlsx(path: &Path) -> Result<Vec<Transaction>> {
    use calamine::{Data, Reader};

    let mut workbook = calamine::open_workbook_auto(path)
        .map_err(|e| LedgerError::Other(format!("Failed to open XLSX: {e}")))?;
    let Some(range) = workbook.worksheet_range_at(0) else {
        return Ok(Vec::new());
    };
    let range = range.map_err(|e| LedgerError::Other(format!("Failed to read XLSX: {e}")))?;

    let mut rows_iter = range.rows();
    let Some(header) = rows_iter.next() else {
        return Ok(Vec::new());
    };
    let header_fields: Vec<String> = header.iter().map(cell_to_string).collect();
    let map = ColumnMap::from_header(header_fields.iter().map(|s| s.as_str()));

    let mut rows = Vec::new();
    for row in rows_iter {
        if row.iter().all(|c| matches!(c, Data::Empty)) {
            continue;
        }
        let date = map.date.and_then(|i| row.get(i)).and_then(cell_to_date);
        let description = map
            .description
            .and_then(|i| row.get(i))
            .map(cell_to_string)
            .map(|s| s.trim().to_string())
            .unwrap_or_default();
        let amount = map
            .amount
            .and_then(|i| row.get(i))
            .map(cell_to_amount)
            .unwrap_or(0.0);
        rows.push(Transaction {
            date,
            description,
            amount,
        });
    }
    Ok(rows)
}

#[cfg(feature = "xlsx")]
fn cell_to_string(cell: &calamine::Data) -> String {
    use calamine::Data;
    match cell {
        Data::String(s) => s.clone(),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

#[cfg(feature = "xlsx")]
fn cell_to_date(cell: &calamine::Data) -> Option<NaiveDate> {
    use calamine::Data;
    match cell {
        Data::Float(f) => excel_serial_to_date(*f),
        Data::Int(i) => excel_serial_to_date(*i as f64),
        Data::DateTime(dt) => excel_serial_to_date(dt.as_f64()),
        Data::String(s) => parse_date(s),
        _ => None,
    }
}

#[cfg(feature = "xlsx")]
fn cell_to_amount(cell: &calamine::Data) -> f64 {
    use calamine::Data;
    match cell {
        Data::Float(f) => *f,
        Data::Int(i) => *i as f64,
        Data::String(s) => parse_amount(s),
        _ => 0.0,
    }
}

// ---------------------------------------------------------------------------
// PDF
// ---------------------------------------------------------------------------

fn parse_pdf(path: &Path, ocr: &dyn PageOcr) -> Result<Vec<Transaction>> {
    let text = extract_document_text(path, ocr)?;
    let scan = scan_statement_text(&text);
    if scan.found_nothing() {
        eprintln!(
            "Warning: no transactions found in {}",
            path.display()
        );
    } else if scan.skipped > 0 {
        eprintln!(
            "Warning: skipped {} unparseable line(s) in {}",
            scan.skipped,
            path.display()
        );
    }
    Ok(scan
        .rows
        .into_iter()
        .map(|line| Transaction {
            date: parse_date(&line.date),
            description: line.description,
            amount: line.amount,
        })
        .collect())
}

// ---------------------------------------------------------------------------
// Combine
// ---------------------------------------------------------------------------

/// Load and canonicalize every file of one provenance, preserving row order
/// within each file and file order across the set. An empty result is an
/// explicit empty table, never an error.
pub fn load_sources(paths: &[PathBuf], ocr: &dyn PageOcr) -> Result<Vec<Transaction>> {
    let mut combined = Vec::new();
    for path in paths {
        let kind = SourceKind::from_path(path)?;
        combined.extend(kind.parse(path, ocr)?);
    }
    Ok(combined)
}
