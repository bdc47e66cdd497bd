use ratatui::style::{Color, Modifier, Style};

/// Terminal background type detection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BackgroundType {
    Dark,
    Light,
    Unknown,
}

/// Detect terminal background type from the `COLORFGBG` environment variable.
///
/// The variable has the format `"foreground;background"`.  Background values
/// 0–6 are considered dark; 7–15 are considered light.  If the variable is
/// absent or unparseable, `BackgroundType::Unknown` is returned.
pub fn detect_background() -> BackgroundType {
    std::env::var("COLORFGBG")
        .ok()
        .as_deref()
        .map_or(BackgroundType::Unknown, background_from_colorfgbg)
}

fn background_from_colorfgbg(value: &str) -> BackgroundType {
    match value.split(';').next_back().map(str::parse::<u8>) {
        Some(Ok(bg)) if bg <= 6 => BackgroundType::Dark,
        Some(Ok(_)) => BackgroundType::Light,
        _ => BackgroundType::Unknown,
    }
}

/// Rates at or above this are styled as good.
pub const RATE_GOOD: f64 = 0.8;
/// Rates at or above this (and below [`RATE_GOOD`]) are styled as medium.
pub const RATE_MEDIUM: f64 = 0.5;

/// Complete theme definition carrying all UI styles used by audit-ui
/// components.
#[derive(Debug, Clone)]
pub struct Theme {
    // ── Header ───────────────────────────────────────────────────────────────
    pub header: Style,
    pub header_accent: Style,
    pub separator: Style,

    // ── Text ─────────────────────────────────────────────────────────────────
    pub text: Style,
    pub dim: Style,
    pub bold: Style,
    pub label: Style,
    pub value: Style,

    // ── Status ───────────────────────────────────────────────────────────────
    pub info: Style,
    pub warning: Style,
    pub error: Style,

    // ── Rates ────────────────────────────────────────────────────────────────
    pub rate_good: Style,
    pub rate_medium: Style,
    pub rate_poor: Style,
    pub rate_undefined: Style,
    /// Unfilled portion of a rate bar.
    pub rate_empty: Style,

    // ── Table ────────────────────────────────────────────────────────────────
    pub table_header: Style,
    pub table_border: Style,
    pub table_row: Style,
    pub table_row_alt: Style,
    pub table_total: Style,

    // ── Charts ───────────────────────────────────────────────────────────────
    pub chart_bar: Style,
    pub chart_value: Style,
    /// First line series (invoiced).
    pub chart_primary: Style,
    /// Second line series (recovered).
    pub chart_secondary: Style,
    pub chart_axis: Style,
}

impl Theme {
    // ── Constructors ─────────────────────────────────────────────────────────

    /// Dark-background terminal theme (default).
    pub fn dark() -> Self {
        Self {
            header: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            header_accent: Style::default().fg(Color::Yellow),
            separator: Style::default().fg(Color::DarkGray),

            text: Style::default().fg(Color::White),
            dim: Style::default().fg(Color::DarkGray),
            bold: Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
            label: Style::default().fg(Color::Gray),
            value: Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),

            info: Style::default().fg(Color::Cyan),
            warning: Style::default().fg(Color::Yellow),
            error: Style::default().fg(Color::Red),

            rate_good: Style::default().fg(Color::Green),
            rate_medium: Style::default().fg(Color::Yellow),
            rate_poor: Style::default().fg(Color::Red),
            rate_undefined: Style::default().fg(Color::DarkGray),
            rate_empty: Style::default().fg(Color::DarkGray),

            table_header: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            table_border: Style::default().fg(Color::DarkGray),
            table_row: Style::default().fg(Color::White),
            table_row_alt: Style::default().fg(Color::Gray),
            table_total: Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),

            chart_bar: Style::default().fg(Color::Cyan),
            chart_value: Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            chart_primary: Style::default().fg(Color::Cyan),
            chart_secondary: Style::default().fg(Color::Green),
            chart_axis: Style::default().fg(Color::Gray),
        }
    }

    /// Light-background terminal theme.
    ///
    /// Uses dark colours for text and saturated accents so that content
    /// remains legible against a white/light-grey terminal canvas.
    pub fn light() -> Self {
        Self {
            header: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD),
            header_accent: Style::default().fg(Color::Magenta),
            separator: Style::default().fg(Color::Gray),

            text: Style::default().fg(Color::Black),
            dim: Style::default().fg(Color::Gray),
            bold: Style::default()
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
            label: Style::default().fg(Color::DarkGray),
            value: Style::default()
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),

            info: Style::default().fg(Color::Blue),
            warning: Style::default().fg(Color::Yellow),
            error: Style::default().fg(Color::Red),

            rate_good: Style::default().fg(Color::Green),
            rate_medium: Style::default().fg(Color::Yellow),
            rate_poor: Style::default().fg(Color::Red),
            rate_undefined: Style::default().fg(Color::Gray),
            rate_empty: Style::default().fg(Color::Gray),

            table_header: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD),
            table_border: Style::default().fg(Color::Gray),
            table_row: Style::default().fg(Color::Black),
            table_row_alt: Style::default().fg(Color::DarkGray),
            table_total: Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),

            chart_bar: Style::default().fg(Color::Blue),
            chart_value: Style::default()
                .fg(Color::White)
                .bg(Color::Blue)
                .add_modifier(Modifier::BOLD),
            chart_primary: Style::default().fg(Color::Blue),
            chart_secondary: Style::default().fg(Color::Green),
            chart_axis: Style::default().fg(Color::DarkGray),
        }
    }

    /// Classic terminal theme using only the basic 8-colour ANSI palette.
    ///
    /// Avoids bold modifiers to maximise compatibility with minimal terminal
    /// emulators.
    pub fn classic() -> Self {
        Self {
            header: Style::default().fg(Color::Cyan),
            header_accent: Style::default().fg(Color::White),
            separator: Style::default().fg(Color::DarkGray),

            text: Style::default().fg(Color::White),
            dim: Style::default().fg(Color::DarkGray),
            bold: Style::default().fg(Color::White),
            label: Style::default().fg(Color::Gray),
            value: Style::default().fg(Color::White),

            info: Style::default().fg(Color::Cyan),
            warning: Style::default().fg(Color::Yellow),
            error: Style::default().fg(Color::Red),

            rate_good: Style::default().fg(Color::Green),
            rate_medium: Style::default().fg(Color::Yellow),
            rate_poor: Style::default().fg(Color::Red),
            rate_undefined: Style::default().fg(Color::DarkGray),
            rate_empty: Style::default().fg(Color::DarkGray),

            table_header: Style::default().fg(Color::Cyan),
            table_border: Style::default().fg(Color::DarkGray),
            table_row: Style::default().fg(Color::White),
            table_row_alt: Style::default().fg(Color::Gray),
            table_total: Style::default().fg(Color::Yellow),

            chart_bar: Style::default().fg(Color::Cyan),
            chart_value: Style::default().fg(Color::Black).bg(Color::Cyan),
            chart_primary: Style::default().fg(Color::Cyan),
            chart_secondary: Style::default().fg(Color::Green),
            chart_axis: Style::default().fg(Color::White),
        }
    }

    /// Choose a theme automatically based on the detected terminal background.
    pub fn auto_detect() -> Self {
        match detect_background() {
            BackgroundType::Light => Self::light(),
            _ => Self::dark(),
        }
    }

    /// Construct a theme by name.  Falls back to `auto_detect` for unknown
    /// names.
    pub fn from_name(name: &str) -> Self {
        match name {
            "light" => Self::light(),
            "dark" => Self::dark(),
            "classic" => Self::classic(),
            _ => Self::auto_detect(),
        }
    }

    // ── Style helpers ────────────────────────────────────────────────────────

    /// Return the style for a rate in `[0, 1]`.
    ///
    /// * `None`      → `rate_undefined`
    /// * `≥ 0.8`     → `rate_good`
    /// * `0.5–0.8`   → `rate_medium`
    /// * `< 0.5`     → `rate_poor`
    pub fn rate_style(&self, rate: Option<f64>) -> Style {
        match rate {
            None => self.rate_undefined,
            Some(r) if r >= RATE_GOOD => self.rate_good,
            Some(r) if r >= RATE_MEDIUM => self.rate_medium,
            Some(_) => self.rate_poor,
        }
    }

    /// Alternating row style for table row `index`.
    pub fn row_style(&self, index: usize) -> Style {
        if index % 2 == 0 {
            self.table_row
        } else {
            self.table_row_alt
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
