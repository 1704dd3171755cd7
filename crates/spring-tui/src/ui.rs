//! TUI rendering logic

use crate::app::App;
use crate::components::{ArcIndicator, ListPane};
use crate::theme::PhaseStyle;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

/// Width of the standalone spinner panel
const SPINNER_PANEL_WIDTH: u16 = 28;

/// Main UI renderer
#[derive(Debug, Default)]
pub struct Ui;

impl Ui {
    pub fn new() -> Self {
        Self
    }

    /// Render the full UI
    pub fn render(&mut self, frame: &mut Frame, app: &App) {
        let size = frame.area();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // Header
                Constraint::Min(0),    // Content
                Constraint::Length(1), // Status bar
            ])
            .split(size);

        self.render_header(frame, chunks[0], app);

        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Min(0),
                Constraint::Length(SPINNER_PANEL_WIDTH),
            ])
            .split(chunks[1]);

        self.render_list(frame, body[0], app);
        self.render_spinner_panel(frame, body[1], app);
        self.render_status_bar(frame, chunks[2], app);
    }

    fn render_header(&self, frame: &mut Frame, area: Rect, app: &App) {
        let phase = app.phase();
        let color = PhaseStyle::color(phase);
        // Adding 0.0 turns -0.0 into 0.0
        let offset = app.offset_y() + 0.0;
        let header = Paragraph::new(Line::from(vec![
            Span::styled(" spring ", Style::default().fg(Color::Cyan).bold()),
            Span::raw(" "),
            Span::styled(PhaseStyle::icon(phase), Style::default().fg(color)),
            Span::raw(" "),
            Span::styled(PhaseStyle::label(phase), Style::default().fg(color)),
            Span::styled(
                format!("   offset {offset:>6.1}"),
                Style::default().fg(Color::DarkGray),
            ),
        ]));
        frame.render_widget(header, area);
    }

    fn render_list(&self, frame: &mut Frame, area: Rect, app: &App) {
        let phase = app.phase();
        let pane = ListPane::new("Inbox", &app.items, app.pulled_rows())
            .with_border_color(PhaseStyle::color(phase));
        let gap = pane.render(frame, area);
        if gap.height == 0 {
            return;
        }

        // Control rect in viewport rows; the indicator sits centered in it
        let control_rows = app.control_rows();
        let indicator_rows = control_rows.saturating_sub(2).max(2);
        let control_top = app.control_top_row().round() as i32;
        let indicator_top =
            control_top + i32::from(control_rows.saturating_sub(indicator_rows) / 2);
        let indicator_bottom = indicator_top + i32::from(indicator_rows);

        let visible_top = indicator_top.max(0);
        let visible_bottom = indicator_bottom.min(i32::from(gap.height));
        if visible_bottom <= visible_top {
            return;
        }

        // Terminal cells are about twice as tall as wide
        let columns = (indicator_rows * 2).min(gap.width);
        let indicator_area = Rect {
            x: gap.x + (gap.width - columns) / 2,
            y: gap.y + visible_top as u16,
            width: columns,
            height: (visible_bottom - visible_top) as u16,
        };

        let snapshot = app.controller.indicator().surface().snapshot();
        ArcIndicator::new(&snapshot, app.controller.indicator_bounds()).render_rows(
            frame,
            indicator_area,
            indicator_rows,
            (visible_top - indicator_top) as u16,
        );
    }

    fn render_spinner_panel(&self, frame: &mut Frame, area: Rect, app: &App) {
        let title_color = if app.spinner.is_spinning() {
            Color::Green
        } else {
            Color::DarkGray
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(title_color))
            .title(Span::styled(
                " Spinner ",
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            ));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(2)])
            .split(inner);

        let side = rows[0].height.min(rows[0].width / 2);
        let canvas_area = Rect {
            x: rows[0].x + (rows[0].width - side * 2) / 2,
            y: rows[0].y + (rows[0].height - side) / 2,
            width: side * 2,
            height: side,
        };
        let snapshot = app.spinner.surface().snapshot();
        let mut indicator = ArcIndicator::new(&snapshot, app.spinner.bounds());
        if app.spinner.has_pending_stop() {
            indicator = indicator.with_color(Color::DarkGray);
        }
        indicator.render(frame, canvas_area);

        let state = if app.spinner.has_pending_stop() {
            "stopping"
        } else if app.spinner.is_spinning() {
            "spinning"
        } else {
            "stopped"
        };
        let info = Paragraph::new(vec![
            Line::from(Span::styled(
                format!(" {state} · position {}", app.spinner.rotation_index()),
                Style::default().fg(Color::White),
            )),
            Line::from(Span::styled(
                if app.color_cycling {
                    " color cycling on"
                } else {
                    " color cycling off"
                },
                Style::default().fg(Color::DarkGray),
            )),
        ]);
        frame.render_widget(info, rows[1]);
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect, app: &App) {
        let key = |k: &'static str| Span::styled(k, Style::default().fg(Color::Cyan).bold());
        let hint = |h: &'static str| Span::styled(h, Style::default().fg(Color::DarkGray));

        let mut spans = vec![
            key(" ↓/j"),
            hint(" pull "),
            key("␣"),
            hint(" release "),
            key("r/e"),
            hint(" start/end "),
            key("s/x"),
            hint(" spinner "),
            key("c"),
            hint(" colors "),
            key("q"),
            hint(" quit"),
        ];
        if let Some(message) = &app.status_message {
            spans.push(Span::raw("  "));
            spans.push(Span::styled(
                message.clone(),
                Style::default().fg(Color::Yellow),
            ));
        }
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyCode;
    use ratatui::{backend::TestBackend, Terminal};
    use spring_core::SpringConfig;
    use std::time::Duration;

    fn draw(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        let mut ui = Ui::new();
        terminal.draw(|f| ui.render(f, app)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_render_idle() {
        let app = App::new(&SpringConfig::default());
        let screen = draw(&app);
        assert!(screen.contains("idle"));
        assert!(screen.contains("Message  1"));
    }

    #[test]
    fn test_render_while_pulling_and_refreshing() {
        let mut app = App::new(&SpringConfig::default());
        for _ in 0..5 {
            app.handle_key(KeyCode::Down);
        }
        assert!(draw(&app).contains("pulling"));

        for _ in 0..5 {
            app.handle_key(KeyCode::Down);
        }
        app.handle_key(KeyCode::Enter);
        app.tick(Duration::from_millis(120));
        assert!(draw(&app).contains("refreshing"));
    }

    #[test]
    fn test_stopping_spinner_is_dimmed() {
        let mut app = App::new(&SpringConfig::default());
        app.handle_key(KeyCode::Char('s'));
        app.tick(Duration::from_millis(300));
        app.handle_key(KeyCode::Char('s'));
        assert!(app.spinner.has_pending_stop());

        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        let mut ui = Ui::new();
        terminal.draw(|f| ui.render(f, &app)).unwrap();

        let arc_cells: Vec<_> = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .filter(|cell| {
                cell.symbol()
                    .chars()
                    .any(|c| ('\u{2801}'..='\u{28ff}').contains(&c))
            })
            .collect();
        assert!(!arc_cells.is_empty());
        assert!(arc_cells.iter().all(|cell| cell.fg == Color::DarkGray));
        assert!(draw(&app).contains("stopping"));
    }

    #[test]
    fn test_render_tiny_terminal() {
        let app = App::new(&SpringConfig::default());
        let mut terminal = Terminal::new(TestBackend::new(10, 3)).unwrap();
        let mut ui = Ui::new();
        terminal.draw(|f| ui.render(f, &app)).unwrap();
    }
}
