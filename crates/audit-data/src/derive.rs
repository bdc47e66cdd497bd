//! Per-row derived fields.

use audit_core::models::{AuditRecord, DerivedRecord};
use tracing::debug;

/// Attach `audit_month`, `mrr_rate`, `hit_rate` and `recovery_rate` to every
/// record. Row count and order are preserved.
pub fn derive_fields(records: Vec<AuditRecord>) -> Vec<DerivedRecord> {
    let derived: Vec<DerivedRecord> = records
        .into_iter()
        .map(DerivedRecord::from_record)
        .collect();

    let undefined = |f: fn(&DerivedRecord) -> Option<f64>| {
        derived.iter().filter(|r| f(r).is_none()).count()
    };
    debug!(
        "Derived {} rows ({} undefined MRR, {} undefined hit, {} undefined recovery)",
        derived.len(),
        undefined(|r| r.mrr_rate),
        undefined(|r| r.hit_rate),
        undefined(|r| r.recovery_rate),
    );

    derived
}
