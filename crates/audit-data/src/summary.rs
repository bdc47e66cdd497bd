//! Per-provider aggregation.
//!
//! Rates here are aggregate ratios: summed numerator over summed denominator
//! for the whole provider, never a mean of per-row rates.

use std::collections::BTreeMap;

use audit_core::models::DerivedRecord;
use audit_core::stats::ratio;
use serde::Serialize;
use tracing::debug;

// ── ProviderStats ─────────────────────────────────────────────────────────────

/// Running totals accumulated across audit records.
#[derive(Debug, Clone, Default)]
pub struct ProviderStats {
    pub total_claims: u64,
    pub records_requested: u64,
    pub records_received: u64,
    pub findings: u64,
    pub no_findings: u64,
    pub overpayment_total: f64,
    pub invoiced_amount: f64,
    pub recovery_amount: f64,
    pub total_disputes: u64,
}

impl ProviderStats {
    /// Add a single record to the running totals.
    pub fn add_record(&mut self, record: &DerivedRecord) {
        let r = &record.record;
        self.total_claims = self.total_claims.saturating_add(1);
        self.records_requested = self.records_requested.saturating_add(r.records_requested);
        self.records_received = self.records_received.saturating_add(r.records_received);
        self.findings = self.findings.saturating_add(r.findings);
        self.no_findings = self.no_findings.saturating_add(r.no_findings);
        self.overpayment_total += r.overpayment_amount;
        self.invoiced_amount += r.invoiced_amount;
        self.recovery_amount += r.recovery_amount;
        if r.dispute_status.is_disputed() {
            self.total_disputes = self.total_disputes.saturating_add(1);
        }
    }

    /// Fold another set of totals into this one.
    pub fn merge(&mut self, other: &ProviderStats) {
        self.total_claims = self.total_claims.saturating_add(other.total_claims);
        self.records_requested = self.records_requested.saturating_add(other.records_requested);
        self.records_received = self.records_received.saturating_add(other.records_received);
        self.findings = self.findings.saturating_add(other.findings);
        self.no_findings = self.no_findings.saturating_add(other.no_findings);
        self.overpayment_total += other.overpayment_total;
        self.invoiced_amount += other.invoiced_amount;
        self.recovery_amount += other.recovery_amount;
        self.total_disputes = self.total_disputes.saturating_add(other.total_disputes);
    }

    pub fn overpayment_avg(&self) -> Option<f64> {
        ratio(self.overpayment_total, self.total_claims as f64)
    }

    pub fn mrr_rate(&self) -> Option<f64> {
        ratio(self.records_received as f64, self.records_requested as f64)
    }

    pub fn hit_rate(&self) -> Option<f64> {
        ratio(
            self.findings as f64,
            self.findings as f64 + self.no_findings as f64,
        )
    }

    pub fn dispute_rate(&self) -> Option<f64> {
        ratio(self.total_disputes as f64, self.total_claims as f64)
    }

    pub fn recovery_rate(&self) -> Option<f64> {
        ratio(self.recovery_amount, self.invoiced_amount)
    }
}

// ── ProviderSummary ───────────────────────────────────────────────────────────

/// One row of the provider summary table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderSummary {
    #[serde(rename = "providertaxid")]
    pub provider_tax_id: String,
    pub total_claims: u64,
    pub records_requested: u64,
    pub records_received: u64,
    pub findings: u64,
    pub no_findings: u64,
    pub overpayment_total: f64,
    /// Mean overpayment per claim.
    pub overpayment_avg: f64,
    pub invoiced_amount: f64,
    pub recovery_amount: f64,
    pub total_disputes: u64,
    #[serde(rename = "MRR_rate")]
    pub mrr_rate: Option<f64>,
    pub hit_rate: Option<f64>,
    /// Always defined: every provider has at least one claim.
    pub dispute_rate: f64,
    pub recovery_rate: Option<f64>,
}

impl ProviderSummary {
    fn from_stats(provider_tax_id: String, stats: &ProviderStats) -> Self {
        Self {
            provider_tax_id,
            total_claims: stats.total_claims,
            records_requested: stats.records_requested,
            records_received: stats.records_received,
            findings: stats.findings,
            no_findings: stats.no_findings,
            overpayment_total: stats.overpayment_total,
            overpayment_avg: stats.overpayment_avg().unwrap_or_default(),
            invoiced_amount: stats.invoiced_amount,
            recovery_amount: stats.recovery_amount,
            total_disputes: stats.total_disputes,
            mrr_rate: stats.mrr_rate(),
            hit_rate: stats.hit_rate(),
            dispute_rate: stats.dispute_rate().unwrap_or_default(),
            recovery_rate: stats.recovery_rate(),
        }
    }

    /// Recover the additive totals behind this row.
    fn to_stats(&self) -> ProviderStats {
        ProviderStats {
            total_claims: self.total_claims,
            records_requested: self.records_requested,
            records_received: self.records_received,
            findings: self.findings,
            no_findings: self.no_findings,
            overpayment_total: self.overpayment_total,
            invoiced_amount: self.invoiced_amount,
            recovery_amount: self.recovery_amount,
            total_disputes: self.total_disputes,
        }
    }
}

/// Totals across every provider in a summary table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryTotals {
    pub providers: usize,
    pub total_claims: u64,
    pub records_requested: u64,
    pub records_received: u64,
    pub findings: u64,
    pub no_findings: u64,
    pub overpayment_avg: Option<f64>,
    pub invoiced_amount: f64,
    pub recovery_amount: f64,
    pub total_disputes: u64,
    #[serde(rename = "MRR_rate")]
    pub mrr_rate: Option<f64>,
    pub hit_rate: Option<f64>,
    pub dispute_rate: Option<f64>,
    pub recovery_rate: Option<f64>,
}

// ── Aggregation ───────────────────────────────────────────────────────────────

/// Group `records` by `providertaxid` (exact match) into one summary row per
/// provider, ordered by provider id ascending.
pub fn provider_summary(records: &[DerivedRecord]) -> Vec<ProviderSummary> {
    let mut groups: BTreeMap<&str, ProviderStats> = BTreeMap::new();

    for record in records {
        groups
            .entry(record.record.provider_tax_id.as_str())
            .or_default()
            .add_record(record);
    }

    debug!(
        "Summarised {} records into {} providers",
        records.len(),
        groups.len()
    );

    groups
        .into_iter()
        .map(|(provider, stats)| ProviderSummary::from_stats(provider.to_string(), &stats))
        .collect()
}

/// Sum every provider row into a single totals row with aggregate rates.
pub fn calculate_totals(summaries: &[ProviderSummary]) -> SummaryTotals {
    let mut totals = ProviderStats::default();
    for summary in summaries {
        totals.merge(&summary.to_stats());
    }

    SummaryTotals {
        providers: summaries.len(),
        total_claims: totals.total_claims,
        records_requested: totals.records_requested,
        records_received: totals.records_received,
        findings: totals.findings,
        no_findings: totals.no_findings,
        overpayment_avg: totals.overpayment_avg(),
        invoiced_amount: totals.invoiced_amount,
        recovery_amount: totals.recovery_amount,
        total_disputes: totals.total_disputes,
        mrr_rate: totals.mrr_rate(),
        hit_rate: totals.hit_rate(),
        dispute_rate: totals.dispute_rate(),
        recovery_rate: totals.recovery_rate(),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
