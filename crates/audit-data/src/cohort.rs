//! Provider cohorts across audit programs.

use std::collections::{BTreeMap, BTreeSet};

use audit_core::models::{AuditMonth, DerivedRecord};
use serde::Serialize;
use tracing::debug;

/// How the provider sets of two programs overlap.
///
/// The three counts are cardinalities of pairwise-disjoint sets whose union
/// is every provider seen under either program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CohortOverlap {
    pub first_program: String,
    pub second_program: String,
    pub only_first: usize,
    pub only_second: usize,
    pub both: usize,
}

impl CohortOverlap {
    /// Number of providers under at least one of the two programs.
    pub fn union(&self) -> usize {
        self.only_first + self.only_second + self.both
    }
}

/// Distinct providers that appear under `program`.
pub fn providers_in_program<'a>(records: &'a [DerivedRecord], program: &str) -> BTreeSet<&'a str> {
    records
        .iter()
        .filter(|r| r.record.program == program)
        .map(|r| r.record.provider_tax_id.as_str())
        .collect()
}

/// Partition the providers of `first` and `second` into only-first,
/// only-second and both. Providers under neither program are ignored.
pub fn program_overlap(records: &[DerivedRecord], first: &str, second: &str) -> CohortOverlap {
    let first_set = providers_in_program(records, first);
    let second_set = providers_in_program(records, second);

    let overlap = CohortOverlap {
        first_program: first.to_string(),
        second_program: second.to_string(),
        only_first: first_set.difference(&second_set).count(),
        only_second: second_set.difference(&first_set).count(),
        both: first_set.intersection(&second_set).count(),
    };
    debug!(
        "{} vs {}: {} only / {} only / {} both",
        first, second, overlap.only_first, overlap.only_second, overlap.both
    );
    overlap
}

// ── New providers per month ───────────────────────────────────────────────────

/// Number of providers first seen in a month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyCount {
    pub month: AuditMonth,
    pub count: usize,
}

/// Count, per month, the providers of `program` whose earliest audit falls in
/// that month. Months without a newcomer are omitted; output is ascending.
pub fn new_providers_monthly(records: &[DerivedRecord], program: &str) -> Vec<MonthlyCount> {
    let mut first_seen: BTreeMap<&str, AuditMonth> = BTreeMap::new();
    for r in records.iter().filter(|r| r.record.program == program) {
        first_seen
            .entry(r.record.provider_tax_id.as_str())
            .and_modify(|m| *m = (*m).min(r.audit_month))
            .or_insert(r.audit_month);
    }

    let mut per_month: BTreeMap<AuditMonth, usize> = BTreeMap::new();
    for month in first_seen.into_values() {
        *per_month.entry(month).or_default() += 1;
    }

    per_month
        .into_iter()
        .map(|(month, count)| MonthlyCount { month, count })
        .collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::derive::derive_fields;
    use crate::test_support::record;

    fn rows(entries: &[(&str, &str, &str)]) -> Vec<DerivedRecord> {
        derive_fields(
            entries.iter()
                .map(|(provider, program, date)| record(provider, program, date))
                .collect(),
        )
    }

    #[test]
    fn test_overlap_example() {
        let data = rows(&[
            ("A", "APC1", "2024-01-01"),
            ("B", "APC1", "2024-01-01"),
            ("B", "APC2", "2024-01-01"),
            ("C", "APC2", "2024-01-01"),
        ]);
        let overlap = program_overlap(&data, "APC1", "APC2");
        assert_eq!(
            (overlap.only_first, overlap.only_second, overlap.both),
            (1, 1, 1)
        );
        assert_eq!(overlap.union(), 3);
    }

    #[test]
    fn test_overlap_ignores_other_programs_and_duplicates() {
        let data = rows(&[
            ("A", "APC1", "2024-01-01"),
            ("A", "APC1", "2024-02-01"),
            ("D", "APC3", "2024-01-01"),
            ("E", "", "2024-01-01"),
        ]);
        let overlap = program_overlap(&data, "APC1", "APC2");
        assert_eq!(overlap.only_first, 1);
        assert_eq!(overlap.only_second, 0);
        assert_eq!(overlap.both, 0);
    }

    #[test]
    fn test_overlap_partitions_union() {
        let data = rows(&[
            ("A", "APC1", "2024-01-01"),
            ("B", "APC1", "2024-01-01"),
            ("C", "APC1", "2024-01-01"),
            ("B", "APC2", "2024-01-01"),
            ("C", "APC2", "2024-01-01"),
            ("D", "APC2", "2024-01-01"),
            ("E", "APC2", "2024-01-01"),
        ]);
        let overlap = program_overlap(&data, "APC1", "APC2");
        let first = providers_in_program(&data, "APC1");
        let second = providers_in_program(&data, "APC2");
        assert_eq!(overlap.union(), first.union(&second).count());
        assert_eq!((overlap.only_first, overlap.only_second, overlap.both), (1, 2, 2));
    }

    #[test]
    fn test_overlap_empty() {
        let overlap = program_overlap(&[], "APC1", "APC2");
        assert_eq!(overlap.union(), 0);
    }

    #[test]
    fn test_new_providers_monthly_uses_first_seen_month() {
        let data = rows(&[
            ("A", "APC2", "2024-03-10"),
            ("A", "APC2", "2024-01-15"),
            ("B", "APC2", "2024-01-20"),
            ("C", "APC2", "2024-03-01"),
            ("D", "APC1", "2023-12-01"),
            ("C", "APC1", "2023-11-01"),
        ]);
        let counts = new_providers_monthly(&data, "APC2");
        let got: Vec<(String, usize)> = counts
            .iter()
            .map(|c| (c.month.to_string(), c.count))
            .collect();
        assert_eq!(
            got,
            vec![("2024-01".to_string(), 2), ("2024-03".to_string(), 1)]
        );
    }

    #[test]
    fn test_new_providers_monthly_unknown_program() {
        let data = rows(&[("A", "APC1", "2024-01-01")]);
        assert!(new_providers_monthly(&data, "APC9").is_empty());
    }
}
