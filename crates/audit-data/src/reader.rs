//! CSV discovery and loading of audit records.
//!
//! Accepts either a single CSV file or a directory scanned recursively for
//! `*.csv` files. Every file must carry the full set of [`REQUIRED_COLUMNS`];
//! a malformed cell aborts the load with the offending line and column.

use std::io::Read;
use std::path::{Path, PathBuf};

use audit_core::error::{AuditError, Result};
use audit_core::models::{AuditRecord, DisputeStatus};
use audit_core::time_utils::parse_audit_date;
use serde::Deserialize;
use tracing::{debug, info, warn};

/// Columns every input table must provide. Extra columns are ignored.
pub const REQUIRED_COLUMNS: [&str; 12] = [
    "claim_id",
    "providertaxid",
    "program",
    "audit_date",
    "records_requested",
    "records_received",
    "findings",
    "no_findings",
    "overpayment_amount",
    "invoiced_amount",
    "recovery_amount",
    "dispute_status",
];

// ── Public API ────────────────────────────────────────────────────────────────

/// Find all `.csv` files recursively under `dir`, sorted by path.
pub fn find_csv_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                warn!("Skipping unreadable directory entry: {}", err);
                None
            }
        })
        .filter(|entry| {
            entry.file_type().is_file()
                && entry
                    .path()
                    .extension()
                    .map(|ext| ext.eq_ignore_ascii_case("csv"))
                    .unwrap_or(false)
        })
        .map(|entry| entry.into_path())
        .collect();

    files.sort();
    files
}

/// Load every audit record under `input` (a CSV file or a directory of them).
///
/// Records keep file order, then row order within each file.
pub fn load_audit_records(input: &Path) -> Result<Vec<AuditRecord>> {
    if !input.exists() {
        return Err(AuditError::InputNotFound(input.to_path_buf()));
    }

    let files = if input.is_dir() {
        let files = find_csv_files(input);
        if files.is_empty() {
            return Err(AuditError::NoDataFiles(input.to_path_buf()));
        }
        files
    } else {
        vec![input.to_path_buf()]
    };

    let mut records = Vec::new();
    for path in &files {
        let file = std::fs::File::open(path).map_err(|source| AuditError::FileRead {
            path: path.clone(),
            source,
        })?;
        let loaded = read_audit_records(file)?;
        debug!("Read {} records from {}", loaded.len(), path.display());
        records.extend(loaded);
    }

    info!(
        "Loaded {} audit records from {} file(s)",
        records.len(),
        files.len()
    );
    Ok(records)
}

/// Parse audit records from any CSV source.
///
/// Fails with [`AuditError::MissingColumn`] before reading rows when the
/// header lacks a required column, and with [`AuditError::Parse`] on the first
/// malformed date or number.
pub fn read_audit_records<R: Read>(reader: R) -> Result<Vec<AuditRecord>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    if let Some(missing) = REQUIRED_COLUMNS
        .iter()
        .find(|column| !headers.iter().any(|h| h == **column))
    {
        return Err(AuditError::missing_column(*missing));
    }

    let mut records = Vec::new();
    for result in csv_reader.records() {
        let row = result?;
        let line = row.position().map(|p| p.line()).unwrap_or_default();
        let raw: RawAuditRow = row.deserialize(Some(&headers))?;
        records.push(raw.into_record(line)?);
    }

    Ok(records)
}

// ── Row parsing ───────────────────────────────────────────────────────────────

/// A CSV row before type coercion; every cell is kept as text so that a bad
/// value can be reported with its column name.
#[derive(Debug, Deserialize)]
struct RawAuditRow {
    claim_id: String,
    providertaxid: String,
    program: String,
    audit_date: String,
    records_requested: String,
    records_received: String,
    findings: String,
    no_findings: String,
    overpayment_amount: String,
    invoiced_amount: String,
    recovery_amount: String,
    dispute_status: String,
}

impl RawAuditRow {
    fn into_record(self, line: u64) -> Result<AuditRecord> {
        let audit_date = parse_audit_date(&self.audit_date).ok_or_else(|| {
            AuditError::parse(line, "audit_date", &self.audit_date, "unrecognised date")
        })?;

        Ok(AuditRecord {
            records_requested: parse_count(line, "records_requested", &self.records_requested)?,
            records_received: parse_count(line, "records_received", &self.records_received)?,
            findings: parse_count(line, "findings", &self.findings)?,
            no_findings: parse_count(line, "no_findings", &self.no_findings)?,
            overpayment_amount: parse_amount(
                line,
                "overpayment_amount",
                &self.overpayment_amount,
            )?,
            invoiced_amount: parse_amount(line, "invoiced_amount", &self.invoiced_amount)?,
            recovery_amount: parse_amount(line, "recovery_amount", &self.recovery_amount)?,
            dispute_status: DisputeStatus::from(self.dispute_status),
            claim_id: self.claim_id,
            provider_tax_id: self.providertaxid,
            program: self.program,
            audit_date,
        })
    }
}

/// Parse a non-negative whole number. Spreadsheet exports such as `"12.0"`
/// are accepted as long as the fraction is zero.
fn parse_count(line: u64, column: &str, raw: &str) -> Result<u64> {
    if let Ok(n) = raw.parse::<u64>() {
        return Ok(n);
    }
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 && v.fract() == 0.0 && v <= u64::MAX as f64 => {
            Ok(v as u64)
        }
        _ => Err(AuditError::parse(
            line,
            column,
            raw,
            "expected a non-negative whole number",
        )),
    }
}

/// Parse a monetary amount; a leading `$` and thousands separators are
/// tolerated.
fn parse_amount(line: u64, column: &str, raw: &str) -> Result<f64> {
    let cleaned: String = raw
        .trim_start_matches('$')
        .chars()
        .filter(|c| *c != ',')
        .collect();
    match cleaned.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(AuditError::parse(line, column, raw, "expected a number")),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
