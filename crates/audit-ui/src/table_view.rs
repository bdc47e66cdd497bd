//! Tabular views for the provider audit TUI.
//!
//! Each analysis renders as a bordered [`ratatui::widgets::Table`]. Long
//! tables start at a caller-supplied scroll offset.

use ratatui::{
    layout::{Constraint, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

use audit_core::formatting::{format_count, format_currency, format_number, format_rate};
use audit_data::analysis::AuditReport;
use audit_data::cohort::{CohortOverlap, MonthlyCount};
use audit_data::outliers::HighVolumeReport;
use audit_data::summary::{ProviderSummary, SummaryTotals};
use audit_data::trend::MonthlyRecovery;

use crate::components::rate_bar::RateBar;
use crate::themes::Theme;

/// Number of scrollable rows a report's table has.
pub fn row_count(report: &AuditReport) -> usize {
    match report {
        AuditReport::Summary { providers, .. } => providers.len(),
        AuditReport::Overlap { .. } => 3,
        AuditReport::NewProviders { months, .. } => months.len(),
        AuditReport::Outliers { report } => report.providers.len(),
        AuditReport::Trend { months, .. } => months.len(),
        AuditReport::Distributions { series } => series.overpayment_by_dispute.len(),
    }
}

fn header_row<'a>(titles: &[&'a str], theme: &Theme) -> Row<'a> {
    Row::new(
        titles
            .iter()
            .map(|h| Cell::from(*h).style(theme.table_header)),
    )
    .height(1)
}

fn rate_cell<'a>(rate: Option<f64>, theme: &Theme) -> Cell<'a> {
    Cell::from(format_rate(rate)).style(theme.rate_style(rate))
}

fn bordered(title: &str, theme: &Theme) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(theme.table_border)
        .title(format!(" {} ", title))
}

// ── Summary ───────────────────────────────────────────────────────────────────

/// Render one row per provider followed by a highlighted totals row.
pub fn render_summary_table(
    frame: &mut Frame,
    area: Rect,
    providers: &[ProviderSummary],
    totals: &SummaryTotals,
    scroll: usize,
    theme: &Theme,
) {
    let header = header_row(
        &[
            "Provider",
            "Claims",
            "Requested",
            "Received",
            "Findings",
            "No Find.",
            "Avg Overpay",
            "Invoiced",
            "Recovered",
            "Disputes",
            "MRR",
            "Hit",
            "Dispute",
            "Recovery",
        ],
        theme,
    );

    let mut rows: Vec<Row> = providers
        .iter()
        .enumerate()
        .skip(scroll)
        .map(|(i, p)| {
            Row::new(vec![
                Cell::from(p.provider_tax_id.clone()),
                Cell::from(format_count(p.total_claims)),
                Cell::from(format_count(p.records_requested)),
                Cell::from(format_count(p.records_received)),
                Cell::from(format_count(p.findings)),
                Cell::from(format_count(p.no_findings)),
                Cell::from(format_currency(p.overpayment_avg)),
                Cell::from(format_currency(p.invoiced_amount)),
                Cell::from(format_currency(p.recovery_amount)),
                Cell::from(format_count(p.total_disputes)),
                rate_cell(p.mrr_rate, theme),
                rate_cell(p.hit_rate, theme),
                Cell::from(format_rate(Some(p.dispute_rate))),
                rate_cell(p.recovery_rate, theme),
            ])
            .style(theme.row_style(i))
        })
        .collect();

    rows.push(
        Row::new(vec![
            Cell::from("TOTAL"),
            Cell::from(format_count(totals.total_claims)),
            Cell::from(format_count(totals.records_requested)),
            Cell::from(format_count(totals.records_received)),
            Cell::from(format_count(totals.findings)),
            Cell::from(format_count(totals.no_findings)),
            Cell::from(
                totals
                    .overpayment_avg
                    .map(format_currency)
                    .unwrap_or_else(|| format_rate(None)),
            ),
            Cell::from(format_currency(totals.invoiced_amount)),
            Cell::from(format_currency(totals.recovery_amount)),
            Cell::from(format_count(totals.total_disputes)),
            Cell::from(format_rate(totals.mrr_rate)),
            Cell::from(format_rate(totals.hit_rate)),
            Cell::from(format_rate(totals.dispute_rate)),
            Cell::from(format_rate(totals.recovery_rate)),
        ])
        .style(theme.table_total),
    );

    let widths = [
        Constraint::Min(12),
        Constraint::Length(8),
        Constraint::Length(10),
        Constraint::Length(10),
        Constraint::Length(9),
        Constraint::Length(9),
        Constraint::Length(13),
        Constraint::Length(14),
        Constraint::Length(14),
        Constraint::Length(9),
        Constraint::Length(7),
        Constraint::Length(7),
        Constraint::Length(8),
        Constraint::Length(9),
    ];

    let title = format!("Provider Summary ({} providers)", totals.providers);
    let table = Table::new(rows, widths)
        .header(header)
        .block(bordered(&title, theme))
        .style(theme.text);
    frame.render_widget(table, area);
}

// ── Overlap ───────────────────────────────────────────────────────────────────

pub fn render_overlap_table(frame: &mut Frame, area: Rect, overlap: &CohortOverlap, theme: &Theme) {
    let header = header_row(&["Cohort", "Providers"], theme);
    let cells = [
        (format!("Only {}", overlap.first_program), overlap.only_first),
        (format!("Only {}", overlap.second_program), overlap.only_second),
        ("Both".to_string(), overlap.both),
    ];
    let mut rows: Vec<Row> = cells
        .into_iter()
        .enumerate()
        .map(|(i, (label, count))| {
            Row::new(vec![Cell::from(label), Cell::from(format_count(count as u64))])
                .style(theme.row_style(i))
        })
        .collect();
    rows.push(
        Row::new(vec![
            Cell::from("Either"),
            Cell::from(format_count(overlap.union() as u64)),
        ])
        .style(theme.table_total),
    );

    let title = format!(
        "{} vs {} Providers",
        overlap.first_program, overlap.second_program
    );
    let table = Table::new(rows, [Constraint::Min(16), Constraint::Length(12)])
        .header(header)
        .block(bordered(&title, theme))
        .style(theme.text);
    frame.render_widget(table, area);
}

// ── New providers ─────────────────────────────────────────────────────────────

pub fn render_new_providers_table(
    frame: &mut Frame,
    area: Rect,
    program: &str,
    months: &[MonthlyCount],
    scroll: usize,
    theme: &Theme,
) {
    let header = header_row(&["Month", "New Providers"], theme);
    let mut rows: Vec<Row> = months
        .iter()
        .enumerate()
        .skip(scroll)
        .map(|(i, m)| {
            Row::new(vec![
                Cell::from(m.month.to_string()),
                Cell::from(format_count(m.count as u64)),
            ])
            .style(theme.row_style(i))
        })
        .collect();
    let total: usize = months.iter().map(|m| m.count).sum();
    rows.push(
        Row::new(vec![
            Cell::from("TOTAL"),
            Cell::from(format_count(total as u64)),
        ])
        .style(theme.table_total),
    );

    let table = Table::new(rows, [Constraint::Length(10), Constraint::Min(14)])
        .header(header)
        .block(bordered(&format!("New {program} Providers"), theme))
        .style(theme.text);
    frame.render_widget(table, area);
}

// ── Outliers ──────────────────────────────────────────────────────────────────

pub fn render_outliers_table(
    frame: &mut Frame,
    area: Rect,
    report: &HighVolumeReport,
    scroll: usize,
    theme: &Theme,
) {
    let header = header_row(&["Provider", "Claims", "Mean MRR", "Mean Hit", "Mean Recovery"], theme);
    let rows: Vec<Row> = report
        .providers
        .iter()
        .enumerate()
        .skip(scroll)
        .map(|(i, p)| {
            Row::new(vec![
                Cell::from(p.provider_tax_id.clone()),
                Cell::from(format_count(p.claims)),
                Cell::from(RateBar::new(p.mrr_rate, theme).width(10).to_line()),
                Cell::from(RateBar::new(p.hit_rate, theme).width(10).to_line()),
                Cell::from(RateBar::new(p.recovery_rate, theme).width(10).to_line()),
            ])
            .style(theme.row_style(i))
        })
        .collect();

    let title = format!(
        "High-Volume Providers: claims > P{} = {} ({} of {})",
        format_number(report.percentile, 0),
        format_number(report.threshold, 2),
        report.providers.len(),
        report.providers_considered
    );
    let widths = [
        Constraint::Min(12),
        Constraint::Length(8),
        Constraint::Length(18),
        Constraint::Length(18),
        Constraint::Length(18),
    ];
    let table = Table::new(rows, widths)
        .header(header)
        .block(bordered(&title, theme))
        .style(theme.text);
    frame.render_widget(table, area);
}

// ── Trend ─────────────────────────────────────────────────────────────────────

pub fn render_trend_table(
    frame: &mut Frame,
    area: Rect,
    months: &[MonthlyRecovery],
    scroll: usize,
    theme: &Theme,
) {
    let header = header_row(&["Month", "Invoiced", "Recovered", "Recovery Rate"], theme);
    let rows: Vec<Row> = months
        .iter()
        .enumerate()
        .skip(scroll)
        .map(|(i, m)| {
            Row::new(vec![
                Cell::from(m.month.to_string()),
                Cell::from(format_currency(m.invoiced)),
                Cell::from(format_currency(m.recovered)),
                Cell::from(RateBar::new(m.recovery_rate, theme).width(12).to_line()),
            ])
            .style(theme.row_style(i))
        })
        .collect();

    let widths = [
        Constraint::Length(9),
        Constraint::Length(16),
        Constraint::Length(16),
        Constraint::Min(20),
    ];
    let table = Table::new(rows, widths)
        .header(header)
        .block(bordered("Monthly Recovery", theme))
        .style(theme.text);
    frame.render_widget(table, area);
}

// ── Placeholder ───────────────────────────────────────────────────────────────

/// Render a placeholder when a view has nothing to show.
pub fn render_no_data(frame: &mut Frame, area: Rect, message: &str, theme: &Theme) {
    let text = vec![
        Line::from(""),
        Line::from(Span::styled("No matching audit data", theme.warning)),
        Line::from(""),
        Line::from(Span::styled(message.to_string(), theme.dim)),
        Line::from(Span::styled("Press 'q' or Ctrl+C to exit", theme.dim)),
    ];
    frame.render_widget(
        Paragraph::new(ratatui::text::Text::from(text)).block(bordered("Provider Audit", theme)),
        area,
    );
}

// ── Tests ──────────────────────────────────────────────────────────────────────
