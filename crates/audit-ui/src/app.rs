//! Main application state and TUI event loop.
//!
//! [`App`] owns the theme and the scroll position. It renders one
//! [`AnalysisResult`] and waits for the user to quit.

use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::Paragraph,
    Frame, Terminal,
};

use audit_data::analysis::{AnalysisResult, AuditReport};

use crate::chart_view;
use crate::components::header::Header;
use crate::table_view;
use crate::themes::Theme;

/// Rows moved by PageUp / PageDown.
pub const PAGE_SIZE: usize = 10;

// ── App ───────────────────────────────────────────────────────────────────────

/// Root application state for the provider audit TUI.
pub struct App {
    pub theme: Theme,
    /// Index of the first visible table row.
    pub scroll: usize,
    /// Set to `true` to break out of the event loop on the next iteration.
    pub should_quit: bool,
}

impl App {
    pub fn new(theme_name: &str) -> Self {
        Self {
            theme: Theme::from_name(theme_name),
            scroll: 0,
            should_quit: false,
        }
    }

    /// Show `result` until `q`, `Q`, `Esc` or `Ctrl+C`.
    pub fn run(mut self, result: &AnalysisResult) -> io::Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let rows = table_view::row_count(&result.report);
        let tick_rate = Duration::from_millis(250);

        let outcome = loop {
            if let Err(err) = terminal.draw(|frame| self.render(frame, result)) {
                break Err(err);
            }

            match event::poll(tick_rate) {
                Ok(true) => match event::read() {
                    Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                        self.handle_key(key, rows);
                    }
                    Ok(_) => {}
                    Err(err) => break Err(err),
                },
                Ok(false) => {}
                Err(err) => break Err(err),
            }

            if self.should_quit {
                break Ok(());
            }
        };

        // Restore terminal state unconditionally.
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        outcome
    }

    /// Apply one key press; `rows` bounds the scroll position.
    pub fn handle_key(&mut self, key: KeyEvent, rows: usize) {
        let last = rows.saturating_sub(1);
        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true;
            }
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Down | KeyCode::Char('j') => self.scroll = (self.scroll + 1).min(last),
            KeyCode::Up | KeyCode::Char('k') => self.scroll = self.scroll.saturating_sub(1),
            KeyCode::PageDown => self.scroll = (self.scroll + PAGE_SIZE).min(last),
            KeyCode::PageUp => self.scroll = self.scroll.saturating_sub(PAGE_SIZE),
            KeyCode::Home => self.scroll = 0,
            KeyCode::End => self.scroll = last,
            _ => {}
        }
    }

    /// Render header, the view body and the key-hint footer into `frame`.
    pub fn render(&self, frame: &mut Frame, result: &AnalysisResult) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(Header::HEIGHT),
                Constraint::Min(0),
                Constraint::Length(1),
            ])
            .split(frame.area());

        let view = result.report.view();
        let header = Header::new(
            &result.metadata.source,
            view.as_str(),
            result.metadata.records_processed,
            &self.theme,
        );
        frame.render_widget(Paragraph::new(header.to_lines()), chunks[0]);

        self.render_body(frame, chunks[1], &result.report);

        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(
                "↑/↓ PgUp/PgDn scroll · q quit",
                self.theme.dim,
            ))),
            chunks[2],
        );
    }

    fn render_body(&self, frame: &mut Frame, area: Rect, report: &AuditReport) {
        let theme = &self.theme;
        if report.is_empty() {
            table_view::render_no_data(frame, area, empty_hint(report), theme);
            return;
        }

        match report {
            AuditReport::Summary { providers, totals } => {
                table_view::render_summary_table(frame, area, providers, totals, self.scroll, theme);
            }
            AuditReport::Overlap { overlap, chart } => {
                let parts = split(area, Direction::Vertical, Constraint::Length(7));
                table_view::render_overlap_table(frame, parts[0], overlap, theme);
                chart_view::render_bar_series(frame, parts[1], chart, theme);
            }
            AuditReport::NewProviders {
                program,
                months,
                chart,
            } => {
                let parts = split(area, Direction::Horizontal, Constraint::Length(30));
                table_view::render_new_providers_table(
                    frame,
                    parts[0],
                    program,
                    months,
                    self.scroll,
                    theme,
                );
                chart_view::render_bar_series(frame, parts[1], chart, theme);
            }
            AuditReport::Outliers { report } => {
                table_view::render_outliers_table(frame, area, report, self.scroll, theme);
            }
            AuditReport::Trend { months, lines } => {
                let parts = split(area, Direction::Vertical, Constraint::Percentage(45));
                table_view::render_trend_table(frame, parts[0], months, self.scroll, theme);
                chart_view::render_trend_chart(frame, parts[1], lines, theme);
            }
            AuditReport::Distributions { series } => {
                chart_view::render_distributions(frame, area, series, theme);
            }
        }
    }
}

fn split(area: Rect, direction: Direction, first: Constraint) -> std::rc::Rc<[Rect]> {
    Layout::default()
        .direction(direction)
        .constraints([first, Constraint::Min(0)])
        .split(area)
}

/// What to check when a view comes back empty.
pub fn empty_hint(report: &AuditReport) -> &'static str {
    match report {
        AuditReport::Overlap { .. } => "Neither program appears in the input; check the program names.",
        AuditReport::NewProviders { .. } => "The program has no audits; check --program.",
        AuditReport::Outliers { .. } => {
            "No provider's claim count exceeds the percentile; try a lower --percentile."
        }
        _ => "The input contains no audit rows.",
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
