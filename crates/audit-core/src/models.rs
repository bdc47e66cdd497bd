use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::stats::ratio;

/// Literal `dispute_status` value meaning no dispute was raised.
pub const NO_DISPUTE: &str = "No Dispute";

/// Whether a dispute was raised against an audit finding.
///
/// Only the exact text [`NO_DISPUTE`] means "no dispute"; every other value
/// (including an empty cell) is treated as a dispute and keeps its raw text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DisputeStatus {
    NoDispute,
    Disputed(String),
}

impl DisputeStatus {
    /// Classify a raw `dispute_status` cell.
    pub fn parse(raw: &str) -> Self {
        if raw == NO_DISPUTE {
            Self::NoDispute
        } else {
            Self::Disputed(raw.to_string())
        }
    }

    /// `true` for every status other than [`DisputeStatus::NoDispute`].
    pub fn is_disputed(&self) -> bool {
        matches!(self, Self::Disputed(_))
    }

    /// The label this status was read from.
    pub fn label(&self) -> &str {
        match self {
            Self::NoDispute => NO_DISPUTE,
            Self::Disputed(reason) => reason,
        }
    }
}

impl From<String> for DisputeStatus {
    fn from(raw: String) -> Self {
        if raw == NO_DISPUTE {
            Self::NoDispute
        } else {
            Self::Disputed(raw)
        }
    }
}

impl From<DisputeStatus> for String {
    fn from(status: DisputeStatus) -> Self {
        match status {
            DisputeStatus::NoDispute => NO_DISPUTE.to_string(),
            DisputeStatus::Disputed(reason) => reason,
        }
    }
}

impl fmt::Display for DisputeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ── AuditMonth ────────────────────────────────────────────────────────────────

/// A calendar month, ordered chronologically and printed as `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AuditMonth {
    year: i32,
    month: u32,
}

impl AuditMonth {
    /// Build a month; `None` unless `month` is within `1..=12`.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    /// Truncate a date to its month.
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }
}

impl fmt::Display for AuditMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for AuditMonth {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (year, month) = s
            .trim()
            .split_once('-')
            .ok_or_else(|| format!("expected YYYY-MM, got {s:?}"))?;
        let year: i32 = year
            .parse()
            .map_err(|_| format!("invalid year in {s:?}"))?;
        let month: u32 = month
            .parse()
            .map_err(|_| format!("invalid month in {s:?}"))?;
        Self::new(year, month).ok_or_else(|| format!("month out of range in {s:?}"))
    }
}

impl Serialize for AuditMonth {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for AuditMonth {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// ── AuditRecord ───────────────────────────────────────────────────────────────

/// One row of the audit table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub claim_id: String,
    /// Provider tax identifier; grouping key, compared verbatim.
    #[serde(rename = "providertaxid")]
    pub provider_tax_id: String,
    /// Audit program label, e.g. `"APC1"`.
    pub program: String,
    pub audit_date: NaiveDate,
    pub records_requested: u64,
    /// Expected to be at most `records_requested`; not enforced.
    pub records_received: u64,
    pub findings: u64,
    pub no_findings: u64,
    pub overpayment_amount: f64,
    pub invoiced_amount: f64,
    pub recovery_amount: f64,
    pub dispute_status: DisputeStatus,
}

/// An [`AuditRecord`] together with its per-row derived fields.
///
/// Ratios whose denominator is zero are `None`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedRecord {
    #[serde(flatten)]
    pub record: AuditRecord,
    pub audit_month: AuditMonth,
    #[serde(rename = "MRR_rate")]
    pub mrr_rate: Option<f64>,
    pub hit_rate: Option<f64>,
    pub recovery_rate: Option<f64>,
}

impl DerivedRecord {
    /// Compute the derived fields of `record`.
    pub fn from_record(record: AuditRecord) -> Self {
        let audit_month = AuditMonth::from_date(record.audit_date);
        let mrr_rate = ratio(
            record.records_received as f64,
            record.records_requested as f64,
        );
        let hit_rate = ratio(
            record.findings as f64,
            record.findings as f64 + record.no_findings as f64,
        );
        let recovery_rate = ratio(record.recovery_amount, record.invoiced_amount);

        Self {
            record,
            audit_month,
            mrr_rate,
            hit_rate,
            recovery_rate,
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// A record with neutral values; tests override the fields they care about.
    pub fn record(provider: &str, program: &str, date: &str) -> AuditRecord {
        AuditRecord {
            claim_id: format!("{provider}-{date}"),
            provider_tax_id: provider.to_string(),
            program: program.to_string(),
            audit_date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            records_requested: 10,
            records_received: 10,
            findings: 1,
            no_findings: 1,
            overpayment_amount: 100.0,
            invoiced_amount: 100.0,
            recovery_amount: 50.0,
            dispute_status: DisputeStatus::NoDispute,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::record;
    use super::*;

    #[test]
    fn test_dispute_status_literal_no_dispute() {
        assert_eq!(DisputeStatus::parse("No Dispute"), DisputeStatus::NoDispute);
        assert!(!DisputeStatus::parse("No Dispute").is_disputed());
    }

    #[test]
    fn test_dispute_status_other_values_are_disputes() {
        for raw in ["Pending", "no dispute", "", "Closed - Upheld"] {
            let status = DisputeStatus::parse(raw);
            assert!(status.is_disputed(), "{raw:?} must count as a dispute");
            assert_eq!(status.label(), raw);
        }
    }

    #[test]
    fn test_dispute_status_serde_as_plain_string() {
        let json = serde_json::to_string(&DisputeStatus::NoDispute).unwrap();
        assert_eq!(json, "\"No Dispute\"");
        let back: DisputeStatus = serde_json::from_str("\"Appealed\"").unwrap();
        assert_eq!(back, DisputeStatus::Disputed("Appealed".to_string()));
    }

    #[test]
    fn test_audit_month_from_date_and_display() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 17).unwrap();
        let month = AuditMonth::from_date(date);
        assert_eq!(month.to_string(), "2024-03");
        assert_eq!(month.year(), 2024);
        assert_eq!(month.month(), 3);
    }

    #[test]
    fn test_audit_month_ordering_is_chronological() {
        let a = AuditMonth::new(2023, 12).unwrap();
        let b = AuditMonth::new(2024, 1).unwrap();
        let c = AuditMonth::new(2024, 11).unwrap();
        assert!(a < b && b < c);
    }

    #[test]
    fn test_audit_month_parse() {
        assert_eq!("2024-07".parse::<AuditMonth>(), Ok(AuditMonth::new(2024, 7).unwrap()));
        assert!("2024-13".parse::<AuditMonth>().is_err());
        assert!("July".parse::<AuditMonth>().is_err());
    }

    #[test]
    fn test_audit_month_new_rejects_out_of_range() {
        assert!(AuditMonth::new(2024, 0).is_none());
        assert!(AuditMonth::new(2024, 13).is_none());
    }

    #[test]
    fn test_derived_record_rates() {
        let mut r = record("P1", "APC1", "2024-01-15");
        r.records_requested = 100;
        r.records_received = 80;
        r.findings = 3;
        r.no_findings = 1;
        r.invoiced_amount = 200.0;
        r.recovery_amount = 50.0;

        let derived = DerivedRecord::from_record(r);
        assert_eq!(derived.audit_month.to_string(), "2024-01");
        assert!((derived.mrr_rate.unwrap() - 0.8).abs() < 1e-12);
        assert!((derived.hit_rate.unwrap() - 0.75).abs() < 1e-12);
        assert!((derived.recovery_rate.unwrap() - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_derived_record_zero_denominators_are_undefined() {
        let mut r = record("P1", "APC1", "2024-01-15");
        r.records_requested = 0;
        r.records_received = 0;
        r.findings = 0;
        r.no_findings = 0;
        r.invoiced_amount = 0.0;

        let derived = DerivedRecord::from_record(r);
        assert_eq!(derived.mrr_rate, None);
        assert_eq!(derived.hit_rate, None);
        assert_eq!(derived.recovery_rate, None);
    }

    #[test]
    fn test_derived_record_hit_rate_with_huge_counts() {
        let mut r = record("P1", "APC1", "2024-01-15");
        r.findings = u64::MAX;
        r.no_findings = 1;

        let hit_rate = DerivedRecord::from_record(r).hit_rate.unwrap();
        assert!((hit_rate - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_derived_record_json_uses_source_column_names() {
        let derived = DerivedRecord::from_record(record("P9", "APC2", "2024-02-01"));
        let value = serde_json::to_value(&derived).unwrap();
        assert_eq!(value["providertaxid"], "P9");
        assert_eq!(value["audit_month"], "2024-02");
        assert!(value.get("MRR_rate").is_some());
    }
}
