//! Monthly recovery trend across all programs.

use std::collections::BTreeMap;

use audit_core::models::{AuditMonth, DerivedRecord};
use audit_core::stats::ratio;
use serde::Serialize;

/// Invoiced and recovered totals for one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyRecovery {
    pub month: AuditMonth,
    pub invoiced: f64,
    pub recovered: f64,
    /// `recovered / invoiced`; `None` when nothing was invoiced.
    pub recovery_rate: Option<f64>,
}

impl MonthlyRecovery {
    fn new(month: AuditMonth) -> Self {
        Self {
            month,
            invoiced: 0.0,
            recovered: 0.0,
            recovery_rate: None,
        }
    }

    fn add_record(&mut self, record: &DerivedRecord) {
        self.invoiced += record.record.invoiced_amount;
        self.recovered += record.record.recovery_amount;
    }
}

/// Group records by `audit_month` and sum invoiced / recovered amounts.
///
/// Returns one row per month present in the data, sorted ascending.
pub fn monthly_recovery_trend(records: &[DerivedRecord]) -> Vec<MonthlyRecovery> {
    let mut map: BTreeMap<AuditMonth, MonthlyRecovery> = BTreeMap::new();

    for record in records {
        map.entry(record.audit_month)
            .or_insert_with(|| MonthlyRecovery::new(record.audit_month))
            .add_record(record);
    }

    map.into_values()
        .map(|mut m| {
            m.recovery_rate = ratio(m.recovered, m.invoiced);
            m
        })
        .collect()
}
