//! Chart-ready numeric series.
//!
//! Everything here is plain data: bin edges and counts, labelled bars, labelled
//! line points and box-plot statistics. Titles, axes and drawing belong to
//! whichever presentation layer consumes them.

use std::collections::BTreeMap;

use audit_core::models::DerivedRecord;
use audit_core::stats::FiveNumberSummary;
use serde::Serialize;

use crate::cohort::{CohortOverlap, MonthlyCount};
use crate::trend::MonthlyRecovery;

// ── Histogram ─────────────────────────────────────────────────────────────────

/// One histogram bin; `[lower, upper)` except the last, which is closed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    pub name: String,
    pub bins: Vec<HistogramBin>,
    /// Values that were undefined and therefore not binned.
    pub undefined: usize,
}

impl Histogram {
    /// Total number of binned values.
    pub fn total(&self) -> u64 {
        self.bins.iter().map(|b| b.count).sum()
    }
}

/// Equal-width histogram over the defined values, spanning their min..max.
///
/// A single distinct value is centred in a bin range of width one.
pub fn histogram<I>(name: &str, values: I, bins: usize) -> Histogram
where
    I: IntoIterator<Item = Option<f64>>,
{
    let mut defined = Vec::new();
    let mut undefined = 0;
    for value in values {
        match value {
            Some(v) => defined.push(v),
            None => undefined += 1,
        }
    }

    if defined.is_empty() || bins == 0 {
        return Histogram {
            name: name.to_string(),
            bins: Vec::new(),
            undefined,
        };
    }

    let min = defined.iter().copied().fold(f64::INFINITY, f64::min);
    let max = defined.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let (lo, hi) = if min == max {
        (min - 0.5, max + 0.5)
    } else {
        (min, max)
    };
    let width = (hi - lo) / bins as f64;

    let mut out: Vec<HistogramBin> = (0..bins)
        .map(|i| HistogramBin {
            lower: lo + i as f64 * width,
            upper: if i + 1 == bins {
                hi
            } else {
                lo + (i + 1) as f64 * width
            },
            count: 0,
        })
        .collect();

    for v in defined {
        let idx = (((v - lo) / width).floor() as usize).min(bins - 1);
        out[idx].count += 1;
    }

    Histogram {
        name: name.to_string(),
        bins: out,
        undefined,
    }
}

// ── Box plot ──────────────────────────────────────────────────────────────────

/// Box-plot statistics for one category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxPlotGroup {
    pub label: String,
    pub count: usize,
    pub summary: FiveNumberSummary,
}

/// Overpayment amounts grouped by dispute status label, ordered by label.
pub fn overpayment_by_dispute(records: &[DerivedRecord]) -> Vec<BoxPlotGroup> {
    let mut groups: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for r in records {
        groups
            .entry(r.record.dispute_status.label())
            .or_default()
            .push(r.record.overpayment_amount);
    }

    groups
        .into_iter()
        .filter_map(|(label, values)| {
            FiveNumberSummary::from_values(&values).map(|summary| BoxPlotGroup {
                label: label.to_string(),
                count: values.len(),
                summary,
            })
        })
        .collect()
}

// ── Bars and lines ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarPoint {
    pub label: String,
    pub value: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarSeries {
    pub title: String,
    pub bars: Vec<BarPoint>,
}

impl BarSeries {
    pub fn max_value(&self) -> u64 {
        self.bars.iter().map(|b| b.value).max().unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinePoint {
    pub label: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineSeries {
    pub name: String,
    pub points: Vec<LinePoint>,
}

/// Three bars: only-first, only-second, both.
pub fn overlap_bars(overlap: &CohortOverlap) -> BarSeries {
    BarSeries {
        title: format!(
            "{} / {} provider overlap",
            overlap.first_program, overlap.second_program
        ),
        bars: vec![
            BarPoint {
                label: format!("only {}", overlap.first_program),
                value: overlap.only_first as u64,
            },
            BarPoint {
                label: format!("only {}", overlap.second_program),
                value: overlap.only_second as u64,
            },
            BarPoint {
                label: "both".to_string(),
                value: overlap.both as u64,
            },
        ],
    }
}

/// One bar per month in which `program` gained providers.
pub fn new_provider_bars(program: &str, counts: &[MonthlyCount]) -> BarSeries {
    BarSeries {
        title: format!("New {program} providers per month"),
        bars: counts
            .iter()
            .map(|c| BarPoint {
                label: c.month.to_string(),
                value: c.count as u64,
            })
            .collect(),
    }
}

/// Invoiced and recovered amounts per month, as two line series.
pub fn trend_lines(trend: &[MonthlyRecovery]) -> Vec<LineSeries> {
    let line = |name: &str, value: fn(&MonthlyRecovery) -> f64| LineSeries {
        name: name.to_string(),
        points: trend
            .iter()
            .map(|m| LinePoint {
                label: m.month.to_string(),
                value: value(m),
            })
            .collect(),
    };
    vec![line("invoiced", |m| m.invoiced), line("recovered", |m| m.recovered)]
}

// ── Distribution bundle ───────────────────────────────────────────────────────

/// Inputs for the distribution charts: two rate histograms and one box plot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistributionSeries {
    pub mrr_histogram: Histogram,
    pub hit_rate_histogram: Histogram,
    pub overpayment_by_dispute: Vec<BoxPlotGroup>,
}

pub fn distribution_series(records: &[DerivedRecord], bins: usize) -> DistributionSeries {
    DistributionSeries {
        mrr_histogram: histogram("MRR rate", records.iter().map(|r| r.mrr_rate), bins),
        hit_rate_histogram: histogram("Hit rate", records.iter().map(|r| r.hit_rate), bins),
        overpayment_by_dispute: overpayment_by_dispute(records),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::derive::derive_fields;
    use crate::test_support::record;
    use audit_core::models::{AuditMonth, DisputeStatus};

    #[test]
    fn test_histogram_equal_width_bins() {
        let values = [0.0, 0.1, 0.5, 0.9, 1.0].map(Some);
        let h = histogram("x", values, 2);
        assert_eq!(h.bins.len(), 2);
        assert_eq!(h.bins[0].lower, 0.0);
        assert_eq!(h.bins[0].upper, 0.5);
        assert_eq!(h.bins[1].upper, 1.0);
        // 0.5 falls into the upper bin; 1.0 (the max) into the closed last bin.
        assert_eq!(h.bins[0].count, 2);
        assert_eq!(h.bins[1].count, 3);
        assert_eq!(h.total(), 5);
    }

    #[test]
    fn test_histogram_counts_undefined_separately() {
        let h = histogram("x", [Some(0.2), None, Some(0.4), None], 4);
        assert_eq!(h.undefined, 2);
        assert_eq!(h.total(), 2);
    }

    #[test]
    fn test_histogram_single_value_is_centred() {
        let h = histogram("x", [Some(1.0), Some(1.0)], 1);
        assert_eq!(h.bins.len(), 1);
        assert_eq!(h.bins[0].lower, 0.5);
        assert_eq!(h.bins[0].upper, 1.5);
        assert_eq!(h.bins[0].count, 2);
    }

    #[test]
    fn test_histogram_no_defined_values() {
        let h = histogram("x", [None, None], 10);
        assert!(h.bins.is_empty());
        assert_eq!(h.undefined, 2);
    }

    #[test]
    fn test_overpayment_by_dispute_groups_by_label() {
        let mut rows = Vec::new();
        for (amount, status) in [
            (10.0, "No Dispute"),
            (30.0, "No Dispute"),
            (20.0, "No Dispute"),
            (500.0, "Appealed"),
        ] {
            let mut r = record("P1", "APC1", "2024-01-01");
            r.overpayment_amount = amount;
            r.dispute_status = DisputeStatus::parse(status);
            rows.push(r);
        }

        let groups = overpayment_by_dispute(&derive_fields(rows));
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].label, "Appealed");
        assert_eq!(groups[0].count, 1);
        assert_eq!(groups[1].label, "No Dispute");
        assert_eq!(groups[1].count, 3);
        assert_eq!(groups[1].summary.median, 20.0);
        assert_eq!(groups[1].summary.min, 10.0);
        assert_eq!(groups[1].summary.max, 30.0);
    }

    #[test]
    fn test_overlap_bars() {
        let overlap = CohortOverlap {
            first_program: "APC1".to_string(),
            second_program: "APC2".to_string(),
            only_first: 4,
            only_second: 2,
            both: 7,
        };
        let bars = overlap_bars(&overlap);
        let labels: Vec<&str> = bars.bars.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, vec!["only APC1", "only APC2", "both"]);
        assert_eq!(bars.max_value(), 7);
    }

    #[test]
    fn test_new_provider_bars_labels_months() {
        let counts = vec![MonthlyCount {
            month: AuditMonth::new(2024, 2).unwrap(),
            count: 5,
        }];
        let bars = new_provider_bars("APC2", &counts);
        assert_eq!(bars.title, "New APC2 providers per month");
        assert_eq!(bars.bars[0].label, "2024-02");
        assert_eq!(bars.bars[0].value, 5);
    }

    #[test]
    fn test_trend_lines() {
        let trend = vec![MonthlyRecovery {
            month: AuditMonth::new(2024, 1).unwrap(),
            invoiced: 100.0,
            recovered: 40.0,
            recovery_rate: Some(0.4),
        }];
        let lines = trend_lines(&trend);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].name, "invoiced");
        assert_eq!(lines[0].points[0].value, 100.0);
        assert_eq!(lines[1].name, "recovered");
        assert_eq!(lines[1].points[0].label, "2024-01");
    }

    #[test]
    fn test_distribution_series() {
        let data = derive_fields(vec![
            record("P1", "APC1", "2024-01-01"),
            record("P2", "APC1", "2024-01-01"),
        ]);
        let series = distribution_series(&data, 10);
        assert_eq!(series.mrr_histogram.total(), 2);
        assert_eq!(series.hit_rate_histogram.total(), 2);
        assert_eq!(series.overpayment_by_dispute.len(), 1);
    }
}
