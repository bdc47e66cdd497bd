//! Chart views: bar charts, histograms, the trend line chart and a text
//! box plot.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Bar, BarChart, BarGroup, Block, Borders, Chart, Dataset, GraphType, Paragraph},
    Frame,
};

use audit_core::formatting::{format_count, format_currency, format_number};
use audit_data::series::{BarSeries, BoxPlotGroup, DistributionSeries, Histogram, LineSeries};

use crate::themes::Theme;

fn bordered(title: String, theme: &Theme) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(theme.table_border)
        .title(format!(" {} ", title))
}

/// Widest bar that still fits `count` bars (with a one-column gap) in `width`.
pub fn bar_width(width: u16, count: usize) -> u16 {
    if count == 0 {
        return 1;
    }
    let inner = width.saturating_sub(2);
    (inner / count as u16).saturating_sub(1).clamp(1, 12)
}

fn render_bars(frame: &mut Frame, area: Rect, title: String, bars: Vec<Bar>, theme: &Theme) {
    let width = bar_width(area.width, bars.len());
    let chart = BarChart::default()
        .block(bordered(title, theme))
        .data(BarGroup::default().bars(&bars))
        .bar_width(width)
        .bar_gap(1)
        .bar_style(theme.chart_bar)
        .value_style(theme.chart_value)
        .label_style(theme.label);
    frame.render_widget(chart, area);
}

// ── Bars ──────────────────────────────────────────────────────────────────────

pub fn render_bar_series(frame: &mut Frame, area: Rect, series: &BarSeries, theme: &Theme) {
    let bars = series
        .bars
        .iter()
        .map(|b| Bar::default().value(b.value).label(Line::from(b.label.clone())))
        .collect();
    render_bars(frame, area, series.title.clone(), bars, theme);
}

/// Bin label: the bin's lower edge.
pub fn bin_label(lower: f64) -> String {
    format_number(lower, 2)
}

pub fn render_histogram(frame: &mut Frame, area: Rect, histogram: &Histogram, theme: &Theme) {
    let bars = histogram
        .bins
        .iter()
        .map(|b| {
            Bar::default()
                .value(b.count)
                .label(Line::from(bin_label(b.lower)))
        })
        .collect();
    let title = if histogram.undefined > 0 {
        format!(
            "{} ({} undefined)",
            histogram.name,
            format_count(histogram.undefined as u64)
        )
    } else {
        histogram.name.clone()
    };
    render_bars(frame, area, title, bars, theme);
}

// ── Lines ─────────────────────────────────────────────────────────────────────

/// `(x, y)` points with x the month index.
pub fn line_points(series: &LineSeries) -> Vec<(f64, f64)> {
    series
        .points
        .iter()
        .enumerate()
        .map(|(i, p)| (i as f64, p.value))
        .collect()
}

pub fn render_trend_chart(frame: &mut Frame, area: Rect, lines: &[LineSeries], theme: &Theme) {
    let points: Vec<Vec<(f64, f64)>> = lines.iter().map(line_points).collect();
    let styles = [theme.chart_primary, theme.chart_secondary];

    let datasets: Vec<Dataset> = lines
        .iter()
        .zip(&points)
        .enumerate()
        .map(|(i, (line, data))| {
            Dataset::default()
                .name(line.name.clone())
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(styles[i % styles.len()])
                .data(data)
        })
        .collect();

    let months: Vec<&str> = lines
        .first()
        .map(|l| l.points.iter().map(|p| p.label.as_str()).collect())
        .unwrap_or_default();
    let x_max = months.len().saturating_sub(1).max(1) as f64;
    let x_labels: Vec<String> = match (months.first(), months.last()) {
        (Some(first), Some(last)) if months.len() > 1 => vec![first.to_string(), last.to_string()],
        (Some(only), _) => vec![only.to_string()],
        _ => Vec::new(),
    };

    let y_max = points
        .iter()
        .flatten()
        .map(|&(_, y)| y)
        .fold(0.0_f64, f64::max);
    let y_top = if y_max > 0.0 { y_max * 1.1 } else { 1.0 };
    let y_labels = vec![
        format_currency(0.0),
        format_currency(y_top / 2.0),
        format_currency(y_top),
    ];

    let chart = Chart::new(datasets)
        .block(bordered("Invoiced vs Recovered".to_string(), theme))
        .x_axis(
            Axis::default()
                .style(theme.chart_axis)
                .bounds([0.0, x_max])
                .labels(x_labels),
        )
        .y_axis(
            Axis::default()
                .style(theme.chart_axis)
                .bounds([0.0, y_top])
                .labels(y_labels),
        );
    frame.render_widget(chart, area);
}

// ── Box plot ──────────────────────────────────────────────────────────────────

fn column(value: f64, lo: f64, hi: f64, width: usize) -> usize {
    if hi <= lo {
        return width / 2;
    }
    let pos = ((value - lo) / (hi - lo) * (width - 1) as f64).round();
    (pos.max(0.0) as usize).min(width - 1)
}

/// Draw one whisker row of `width` columns on a shared `[lo, hi]` scale:
/// `├──███┃███──┤` with the box spanning q1..q3 and `┃` at the median.
pub fn whisker(group: &BoxPlotGroup, lo: f64, hi: f64, width: usize) -> String {
    if width == 0 {
        return String::new();
    }
    let s = &group.summary;
    let [min, q1, median, q3, max] =
        [s.min, s.q1, s.median, s.q3, s.max].map(|v| column(v, lo, hi, width));

    let mut cells = vec![' '; width];
    for cell in &mut cells[min..=max] {
        *cell = '─';
    }
    for cell in &mut cells[q1..=q3] {
        *cell = '█';
    }
    cells[min] = '├';
    cells[max] = '┤';
    cells[median] = '┃';
    cells.into_iter().collect()
}

/// Text box plot: a caption and a whisker row per group, all on one scale.
pub fn build_box_plot_lines(
    groups: &[BoxPlotGroup],
    width: u16,
    theme: &Theme,
) -> Vec<Line<'static>> {
    let lo = groups
        .iter()
        .map(|g| g.summary.min)
        .fold(f64::INFINITY, f64::min);
    let hi = groups
        .iter()
        .map(|g| g.summary.max)
        .fold(f64::NEG_INFINITY, f64::max);

    let mut lines = Vec::with_capacity(groups.len() * 2);
    for group in groups {
        let s = &group.summary;
        lines.push(Line::from(vec![
            Span::styled(group.label.clone(), theme.bold),
            Span::styled(
                format!(" (n={})  ", format_count(group.count as u64)),
                theme.dim,
            ),
            Span::styled(
                format!(
                    "min {} · q1 {} · median {} · q3 {} · max {}",
                    format_currency(s.min),
                    format_currency(s.q1),
                    format_currency(s.median),
                    format_currency(s.q3),
                    format_currency(s.max)
                ),
                theme.label,
            ),
        ]));
        lines.push(Line::from(Span::styled(
            whisker(group, lo, hi, width as usize),
            theme.chart_bar,
        )));
    }
    lines
}

pub fn render_box_plot(frame: &mut Frame, area: Rect, groups: &[BoxPlotGroup], theme: &Theme) {
    let width = area.width.saturating_sub(2);
    let lines = build_box_plot_lines(groups, width, theme);
    frame.render_widget(
        Paragraph::new(lines).block(bordered(
            "Overpayment by Dispute Status".to_string(),
            theme,
        )),
        area,
    );
}

// ── Distributions ─────────────────────────────────────────────────────────────

/// Two rate histograms side by side above the overpayment box plot.
pub fn render_distributions(
    frame: &mut Frame,
    area: Rect,
    series: &DistributionSeries,
    theme: &Theme,
) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(60), Constraint::Min(4)])
        .split(area);
    let top = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[0]);

    render_histogram(frame, top[0], &series.mrr_histogram, theme);
    render_histogram(frame, top[1], &series.hit_rate_histogram, theme);
    render_box_plot(frame, rows[1], &series.overpayment_by_dispute, theme);
}

// ── Tests ─────────────────────────────────────────────────────────────────────
