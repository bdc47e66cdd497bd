//! Top-level analysis pipeline.
//!
//! Loads the input, derives per-row fields and runs one [`AnalysisView`],
//! returning an [`AnalysisResult`] that the UI renders or the binary prints
//! as JSON.

use std::collections::BTreeSet;
use std::path::Path;
use std::time::Instant;

use audit_core::error::Result;
use audit_core::models::DerivedRecord;
use audit_core::settings::{
    AnalysisView, Settings, DEFAULT_FIRST_PROGRAM, DEFAULT_HIGH_VOLUME_PERCENTILE,
    DEFAULT_HISTOGRAM_BINS, DEFAULT_SECOND_PROGRAM,
};
use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use crate::cohort::{new_providers_monthly, program_overlap, CohortOverlap, MonthlyCount};
use crate::derive::derive_fields;
use crate::outliers::{high_volume_providers, HighVolumeReport};
use crate::reader::load_audit_records;
use crate::series::{
    distribution_series, new_provider_bars, overlap_bars, trend_lines, BarSeries,
    DistributionSeries, LineSeries,
};
use crate::summary::{calculate_totals, provider_summary, ProviderSummary, SummaryTotals};
use crate::trend::{monthly_recovery_trend, MonthlyRecovery};

// ── Options ───────────────────────────────────────────────────────────────────

/// Parameters the individual views need.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportOptions {
    pub first_program: String,
    pub second_program: String,
    /// Program whose new providers are counted.
    pub program: String,
    pub percentile: f64,
    pub bins: usize,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            first_program: DEFAULT_FIRST_PROGRAM.to_string(),
            second_program: DEFAULT_SECOND_PROGRAM.to_string(),
            program: DEFAULT_SECOND_PROGRAM.to_string(),
            percentile: DEFAULT_HIGH_VOLUME_PERCENTILE,
            bins: DEFAULT_HISTOGRAM_BINS as usize,
        }
    }
}

impl From<&Settings> for ReportOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            first_program: settings.first_program.clone(),
            second_program: settings.second_program.clone(),
            program: settings.program.clone(),
            percentile: settings.percentile,
            bins: settings.bins as usize,
        }
    }
}

// ── Report ────────────────────────────────────────────────────────────────────

/// The output of one analysis view.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "view", rename_all = "kebab-case")]
pub enum AuditReport {
    Summary {
        providers: Vec<ProviderSummary>,
        totals: SummaryTotals,
    },
    Overlap {
        overlap: CohortOverlap,
        chart: BarSeries,
    },
    NewProviders {
        program: String,
        months: Vec<MonthlyCount>,
        chart: BarSeries,
    },
    Outliers {
        report: HighVolumeReport,
    },
    Trend {
        months: Vec<MonthlyRecovery>,
        lines: Vec<LineSeries>,
    },
    Distributions {
        series: DistributionSeries,
    },
}

impl AuditReport {
    /// Run `view` over already-derived `records`.
    pub fn build(view: AnalysisView, records: &[DerivedRecord], options: &ReportOptions) -> Self {
        match view {
            AnalysisView::Summary => {
                let providers = provider_summary(records);
                let totals = calculate_totals(&providers);
                Self::Summary { providers, totals }
            }
            AnalysisView::Overlap => {
                let overlap =
                    program_overlap(records, &options.first_program, &options.second_program);
                let chart = overlap_bars(&overlap);
                Self::Overlap { overlap, chart }
            }
            AnalysisView::NewProviders => {
                let months = new_providers_monthly(records, &options.program);
                let chart = new_provider_bars(&options.program, &months);
                Self::NewProviders {
                    program: options.program.clone(),
                    months,
                    chart,
                }
            }
            AnalysisView::Outliers => Self::Outliers {
                report: high_volume_providers(records, options.percentile),
            },
            AnalysisView::Trend => {
                let months = monthly_recovery_trend(records);
                let lines = trend_lines(&months);
                Self::Trend { months, lines }
            }
            AnalysisView::Distributions => Self::Distributions {
                series: distribution_series(records, options.bins),
            },
        }
    }

    pub fn view(&self) -> AnalysisView {
        match self {
            Self::Summary { .. } => AnalysisView::Summary,
            Self::Overlap { .. } => AnalysisView::Overlap,
            Self::NewProviders { .. } => AnalysisView::NewProviders,
            Self::Outliers { .. } => AnalysisView::Outliers,
            Self::Trend { .. } => AnalysisView::Trend,
            Self::Distributions { .. } => AnalysisView::Distributions,
        }
    }

    /// `true` when the view produced nothing to show.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Summary { providers, .. } => providers.is_empty(),
            Self::Overlap { overlap, .. } => overlap.union() == 0,
            Self::NewProviders { months, .. } => months.is_empty(),
            Self::Outliers { report } => report.providers.is_empty(),
            Self::Trend { months, .. } => months.is_empty(),
            Self::Distributions { series } => {
                series.mrr_histogram.bins.is_empty()
                    && series.hit_rate_histogram.bins.is_empty()
                    && series.overpayment_by_dispute.is_empty()
            }
        }
    }
}

// ── Result ────────────────────────────────────────────────────────────────────

/// Metadata produced alongside the report.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisMetadata {
    /// ISO-8601 timestamp when this result was generated.
    pub generated_at: String,
    /// Input file or directory.
    pub source: String,
    pub records_processed: usize,
    /// Distinct provider ids in the input.
    pub providers: usize,
    /// Wall-clock seconds spent reading and parsing the CSV input.
    pub load_time_seconds: f64,
    /// Wall-clock seconds spent deriving fields and running the view.
    pub analysis_time_seconds: f64,
}

/// The complete output of [`analyze_audits`].
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    pub metadata: AnalysisMetadata,
    pub report: AuditReport,
}

/// Run the full pipeline.
///
/// 1. Load and parse every audit row under `input`.
/// 2. Derive `audit_month` and the per-row rates.
/// 3. Build the requested view.
pub fn analyze_audits(
    input: &Path,
    view: AnalysisView,
    options: &ReportOptions,
) -> Result<AnalysisResult> {
    let load_start = Instant::now();
    let records = load_audit_records(input)?;
    let load_time = load_start.elapsed().as_secs_f64();

    let analysis_start = Instant::now();
    let derived = derive_fields(records);
    let providers = derived
        .iter()
        .map(|r| r.record.provider_tax_id.as_str())
        .collect::<BTreeSet<_>>()
        .len();
    let report = AuditReport::build(view, &derived, options);
    let analysis_time = analysis_start.elapsed().as_secs_f64();

    if report.is_empty() {
        warn!("View {} produced no rows for {}", view, input.display());
    }
    info!(
        "Ran {} over {} records from {} providers in {:.3}s",
        view,
        derived.len(),
        providers,
        load_time + analysis_time
    );

    Ok(AnalysisResult {
        metadata: AnalysisMetadata {
            generated_at: Utc::now().to_rfc3339(),
            source: input.display().to_string(),
            records_processed: derived.len(),
            providers,
            load_time_seconds: load_time,
            analysis_time_seconds: analysis_time,
        },
        report,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
