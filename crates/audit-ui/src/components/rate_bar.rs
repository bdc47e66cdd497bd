use crate::themes::Theme;
use audit_core::formatting::format_rate;
use ratatui::text::{Line, Span};

/// Configuration controlling visual appearance of a rate bar.
pub struct RateBarConfig {
    /// Total width in terminal columns of the bar portion (excluding label).
    pub width: u16,
    pub filled_char: char,
    pub empty_char: char,
    /// Whether to append the formatted percentage after the bar.
    pub show_label: bool,
}

impl Default for RateBarConfig {
    fn default() -> Self {
        Self {
            width: 20,
            filled_char: '\u{2588}', // █  FULL BLOCK
            empty_char: '\u{2591}',  // ░  LIGHT SHADE
            show_label: true,
        }
    }
}

/// Horizontal bar showing a ratio in `[0, 1]`, coloured by
/// [`Theme::rate_style`]. An undefined rate renders as an empty dimmed bar.
pub struct RateBar<'a> {
    pub rate: Option<f64>,
    pub theme: &'a Theme,
    pub config: RateBarConfig,
}

impl<'a> RateBar<'a> {
    pub fn new(rate: Option<f64>, theme: &'a Theme) -> Self {
        Self {
            rate,
            theme,
            config: RateBarConfig::default(),
        }
    }

    pub fn width(mut self, width: u16) -> Self {
        self.config.width = width;
        self
    }

    /// Number of filled columns; rates outside `[0, 1]` are clamped.
    pub fn filled_columns(&self) -> u16 {
        match self.rate {
            Some(r) => (r.clamp(0.0, 1.0) * self.config.width as f64).round() as u16,
            None => 0,
        }
    }

    pub fn to_line(&self) -> Line<'a> {
        let filled = self.filled_columns();
        let empty = self.config.width.saturating_sub(filled);

        let filled_str: String =
            std::iter::repeat_n(self.config.filled_char, filled as usize).collect();
        let empty_str: String =
            std::iter::repeat_n(self.config.empty_char, empty as usize).collect();

        let mut spans = vec![
            Span::styled(filled_str, self.theme.rate_style(self.rate)),
            Span::styled(empty_str, self.theme.rate_empty),
        ];
        if self.config.show_label {
            spans.push(Span::styled(
                format!(" {}", format_rate(self.rate)),
                self.theme.rate_style(self.rate),
            ));
        }
        Line::from(spans)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
