//! High-volume provider detection.
//!
//! Unlike the provider summary, rates here are row-level means: each claim's
//! own ratio averaged over the provider's claims.

use std::collections::BTreeMap;

use audit_core::models::DerivedRecord;
use audit_core::stats::{mean_defined, percentile};
use serde::Serialize;
use tracing::debug;

/// Mean per-row rates for one high-volume provider.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderRateMeans {
    #[serde(rename = "providertaxid")]
    pub provider_tax_id: String,
    pub claims: u64,
    #[serde(rename = "MRR_rate")]
    pub mrr_rate: Option<f64>,
    pub hit_rate: Option<f64>,
    pub recovery_rate: Option<f64>,
}

/// Providers whose claim count exceeds a percentile of the per-provider
/// claim-count distribution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HighVolumeReport {
    /// Percentile used, in `0..=100`.
    pub percentile: f64,
    /// Claim count at that percentile; selection is strictly above it.
    pub threshold: f64,
    /// Number of distinct providers the threshold was computed over.
    pub providers_considered: usize,
    pub providers: Vec<ProviderRateMeans>,
}

/// Claim count per provider, ordered by provider id.
pub fn claim_counts(records: &[DerivedRecord]) -> BTreeMap<&str, u64> {
    let mut counts: BTreeMap<&str, u64> = BTreeMap::new();
    for r in records {
        *counts.entry(r.record.provider_tax_id.as_str()).or_default() += 1;
    }
    counts
}

/// Select providers whose claim count is strictly greater than the
/// `pct`-th percentile (linear interpolation) of all providers' claim counts,
/// and average their per-row rates.
///
/// Undefined per-row rates are skipped; a provider with no defined value for
/// a rate gets `None` for it. With few providers the threshold often equals
/// the maximum count, leaving the selection empty.
pub fn high_volume_providers(records: &[DerivedRecord], pct: f64) -> HighVolumeReport {
    let counts = claim_counts(records);

    let mut distribution: Vec<f64> = counts.values().map(|&c| c as f64).collect();
    distribution.sort_by(|a, b| a.total_cmp(b));
    let threshold = percentile(&distribution, pct);

    let mut selected: BTreeMap<&str, Vec<&DerivedRecord>> = counts
        .iter()
        .filter(|(_, &count)| count as f64 > threshold)
        .map(|(&provider, _)| (provider, Vec::new()))
        .collect();
    for r in records {
        if let Some(rows) = selected.get_mut(r.record.provider_tax_id.as_str()) {
            rows.push(r);
        }
    }

    debug!(
        "P{} claim-count threshold {:.2} over {} providers selects {}",
        pct,
        threshold,
        counts.len(),
        selected.len()
    );

    let providers = selected
        .into_iter()
        .map(|(provider, rows)| ProviderRateMeans {
            provider_tax_id: provider.to_string(),
            claims: rows.len() as u64,
            mrr_rate: mean_defined(rows.iter().map(|r| r.mrr_rate)),
            hit_rate: mean_defined(rows.iter().map(|r| r.hit_rate)),
            recovery_rate: mean_defined(rows.iter().map(|r| r.recovery_rate)),
        })
        .collect();

    HighVolumeReport {
        percentile: pct,
        threshold,
        providers_considered: counts.len(),
        providers,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::derive::derive_fields;
    use crate::test_support::record;
    use audit_core::models::AuditRecord;

    /// `claims[i]` claims for provider `P{i:02}`.
    fn population(claims: &[usize]) -> Vec<DerivedRecord> {
        let mut rows: Vec<AuditRecord> = Vec::new();
        for (i, &n) in claims.iter().enumerate() {
            for _ in 0..n {
                rows.push(record(&format!("P{i:02}"), "APC1", "2024-01-01"));
            }
        }
        derive_fields(rows)
    }

    #[test]
    fn test_twenty_providers_selects_the_largest() {
        // Counts 1..=20: P95 = 19.05, so only the provider with 20 claims.
        let claims: Vec<usize> = (1..=20).collect();
        let report = high_volume_providers(&population(&claims), 95.0);
        assert!((report.threshold - 19.05).abs() < 1e-9);
        assert_eq!(report.providers_considered, 20);
        assert_eq!(report.providers.len(), 1);
        assert_eq!(report.providers[0].provider_tax_id, "P19");
        assert_eq!(report.providers[0].claims, 20);
    }

    #[test]
    fn test_few_providers_can_select_nothing() {
        let report = high_volume_providers(&population(&[1, 2, 3]), 95.0);
        // rank = 0.95 * 2 = 1.9 → 2 + 0.9 = 2.9; 3 > 2.9 selects one.
        assert_eq!(report.providers.len(), 1);

        let tied = high_volume_providers(&population(&[4, 4, 4]), 95.0);
        assert!((tied.threshold - 4.0).abs() < 1e-9);
        assert!(tied.providers.is_empty());
    }

    #[test]
    fn test_selection_is_monotonic_in_percentile() {
        let claims = [1, 1, 2, 3, 5, 8, 13, 21, 34, 55, 3, 3, 7];
        let data = population(&claims);
        let mut previous = usize::MAX;
        for pct in [0.0, 10.0, 25.0, 50.0, 75.0, 90.0, 95.0, 99.0, 100.0] {
            let size = high_volume_providers(&data, pct).providers.len();
            assert!(size <= previous, "P{pct} selected {size} > {previous}");
            previous = size;
        }
        assert_eq!(previous, 0, "P100 never selects anything");
    }

    #[test]
    fn test_rates_are_row_means_not_aggregate() {
        let mut rows = Vec::new();
        for i in 0..20 {
            rows.push(record(&format!("S{i:02}"), "APC1", "2024-01-01"));
        }
        let mut a = record("BIG", "APC1", "2024-01-01");
        a.records_requested = 100;
        a.records_received = 80;
        let mut b = record("BIG", "APC1", "2024-01-02");
        b.records_requested = 50;
        b.records_received = 50;
        rows.push(a);
        rows.push(b);

        let report = high_volume_providers(&derive_fields(rows), 95.0);
        assert_eq!(report.providers.len(), 1);
        let big = &report.providers[0];
        assert_eq!(big.provider_tax_id, "BIG");
        assert!((big.mrr_rate.unwrap() - 0.9).abs() < 1e-12);
    }

    #[test]
    fn test_undefined_row_rates_are_skipped() {
        let mut rows = Vec::new();
        for i in 0..20 {
            rows.push(record(&format!("S{i:02}"), "APC1", "2024-01-01"));
        }
        let mut a = record("BIG", "APC1", "2024-01-01");
        a.invoiced_amount = 0.0;
        let mut b = record("BIG", "APC1", "2024-01-02");
        b.invoiced_amount = 0.0;
        let mut c = record("BIG", "APC1", "2024-01-03");
        c.invoiced_amount = 100.0;
        c.recovery_amount = 40.0;
        let mut d = record("BIG", "APC1", "2024-01-04");
        d.findings = 0;
        d.no_findings = 0;
        rows.extend([a, b, c]);
        rows.push(d);

        let report = high_volume_providers(&derive_fields(rows), 95.0);
        let big = &report.providers[0];
        // Row recovery rates: None, None, 0.4, 0.5.
        assert!((big.recovery_rate.unwrap() - 0.45).abs() < 1e-12);
        // Row hit rates: 0.5, 0.5, 0.5, None.
        assert!((big.hit_rate.unwrap() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_empty_input() {
        let report = high_volume_providers(&[], 95.0);
        assert_eq!(report.providers_considered, 0);
        assert!(report.providers.is_empty());
    }

    #[test]
    fn test_percentile_above_hundred_selects_nothing() {
        let report = high_volume_providers(&population(&[1, 5]), 150.0);
        assert_eq!(report.threshold, 5.0);
        assert!(report.providers.is_empty());
    }

    #[test]
    fn test_claim_counts() {
        let data = population(&[2, 0, 3]);
        let counts = claim_counts(&data);
        assert_eq!(counts.get("P00"), Some(&2));
        assert_eq!(counts.get("P01"), None);
        assert_eq!(counts.get("P02"), Some(&3));
    }
}
