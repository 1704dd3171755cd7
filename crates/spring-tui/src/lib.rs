//! spring-tui - TUI frontend for spring using Ratatui

pub mod app;
pub mod components;
pub mod theme;
pub mod ui;

pub use app::App;

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;
use spring_core::SpringConfig;
use std::io;
use std::time::{Duration, Instant};
use tracing::info;

/// Frame interval of the render loop
const FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Run the TUI application
pub fn run(config: SpringConfig, refresh_work: Duration) -> Result<()> {
    // Setup terminal
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(&config).with_refresh_work(refresh_work);
    let mut ui = ui::Ui::new();

    info!("demo started");
    let result = run_loop(&mut terminal, &mut app, &mut ui);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    info!(refreshes = app.refresh_count(), "demo finished");
    result
}

fn run_loop<B: Backend>(terminal: &mut Terminal<B>, app: &mut App, ui: &mut ui::Ui) -> Result<()>
where
    <B as Backend>::Error: Send + Sync + 'static,
{
    let mut last_tick = Instant::now();
    loop {
        let now = Instant::now();
        app.tick(now.duration_since(last_tick));
        last_tick = now;

        let size = terminal.size()?;
        app.layout(size.width);

        terminal.draw(|f| ui.render(f, app))?;

        // Handle input with timeout so animations keep running
        if event::poll(FRAME_INTERVAL)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.handle_key(key.code);
                }
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}
