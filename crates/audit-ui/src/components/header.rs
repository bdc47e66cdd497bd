use crate::themes::Theme;
use audit_core::formatting::format_count;
use ratatui::text::{Line, Span};

/// Decoration placed either side of the application title.
pub const ACCENT: &str = "◆ ◇ ◆";

/// Dashboard header rendering four lines:
///
/// 1. Application title with accent decorations (ALL CAPS).
/// 2. A 60-column `=` separator.
/// 3. Input, view and record count in `[ input | view | N records ]` format.
/// 4. An empty line.
pub struct Header<'a> {
    /// Input file or directory as displayed.
    pub source: &'a str,
    /// Analysis view name (e.g. "summary", "new-providers").
    pub view: &'a str,
    /// Number of audit rows behind the view.
    pub records: usize,
    pub theme: &'a Theme,
}

impl<'a> Header<'a> {
    pub fn new(source: &'a str, view: &'a str, records: usize, theme: &'a Theme) -> Self {
        Self {
            source,
            view,
            records,
            theme,
        }
    }

    /// Number of terminal rows [`Self::to_lines`] occupies.
    pub const HEIGHT: u16 = 4;

    pub fn to_lines(&self) -> Vec<Line<'a>> {
        let separator = "=".repeat(60);

        vec![
            Line::from(vec![
                Span::styled(ACCENT, self.theme.header_accent),
                Span::styled(" PROVIDER AUDIT METRICS ", self.theme.header),
                Span::styled(ACCENT, self.theme.header_accent),
            ]),
            Line::from(Span::styled(separator, self.theme.separator)),
            Line::from(vec![
                Span::styled("[ ", self.theme.label),
                Span::styled(self.source, self.theme.value),
                Span::styled(" | ", self.theme.label),
                Span::styled(self.view, self.theme.value),
                Span::styled(" | ", self.theme.label),
                Span::styled(
                    format!("{} records", format_count(self.records as u64)),
                    self.theme.value,
                ),
                Span::styled(" ]", self.theme.label),
            ]),
            Line::from(""),
        ]
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::themes::Theme;

    fn text_of(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_header_line_count_matches_height() {
        let theme = Theme::dark();
        let header = Header::new("audits.csv", "summary", 10, &theme);
        assert_eq!(header.to_lines().len(), Header::HEIGHT as usize);
    }

    #[test]
    fn test_header_title_line_content() {
        let theme = Theme::dark();
        let lines = Header::new("audits.csv", "summary", 10, &theme).to_lines();
        let title = text_of(&lines[0]);
        assert!(title.contains("PROVIDER AUDIT METRICS"), "got: {title}");
        assert!(title.starts_with(ACCENT));
    }

    #[test]
    fn test_header_separator_line() {
        let theme = Theme::dark();
        let lines = Header::new("audits.csv", "summary", 10, &theme).to_lines();
        let sep = text_of(&lines[1]);
        assert_eq!(sep.chars().count(), 60);
        assert!(sep.chars().all(|c| c == '='));
    }

    #[test]
    fn test_header_info_line() {
        let theme = Theme::dark();
        let lines = Header::new("data/q1", "new-providers", 12_345, &theme).to_lines();
        assert_eq!(
            text_of(&lines[2]),
            "[ data/q1 | new-providers | 12,345 records ]"
        );
    }

    #[test]
    fn test_header_empty_fourth_line() {
        let theme = Theme::dark();
        let lines = Header::new("a.csv", "trend", 0, &theme).to_lines();
        assert!(text_of(&lines[3]).is_empty());
    }
}
