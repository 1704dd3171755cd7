//! TUI application state

use crossterm::event::KeyCode;
use parking_lot::Mutex;
use spring_core::geometry::LineColor;
use spring_core::scroll::ScrollSurface;
use spring_core::{
    ControlEvent, RefreshController, RefreshPhase, ScrollView, SpinnerAnimator, SpringConfig,
    Timeline,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, info};

/// Scroll points per terminal row
pub const ROW_POINTS: f64 = 10.0;

/// Spring-back speed of released content, in points per second
const SETTLE_SPEED: f64 = 400.0;

/// Simulated work done between refresh start and end
const DEFAULT_REFRESH_WORK: Duration = Duration::from_secs(2);

/// Colors cycled through by the standalone spinner, one per phase cycle
const CYCLE_PALETTE: [LineColor; 4] = [
    LineColor::GRAY,
    LineColor::rgb(0, 175, 175),
    LineColor::rgb(230, 150, 30),
    LineColor::rgb(120, 200, 80),
];

/// TUI Application state
pub struct App {
    /// Scroll content the refresh control observes
    pub view: Arc<Mutex<ScrollView>>,

    /// Pull-to-refresh control attached to `view`
    pub controller: RefreshController<Timeline>,

    /// Standalone spinner shown beside the list
    pub spinner: SpinnerAnimator<Timeline>,

    /// Refresh notifications from the control
    control_rx: broadcast::Receiver<ControlEvent>,

    /// List content
    pub items: Vec<String>,

    /// Whether the app should quit
    pub should_quit: bool,

    /// Message shown in the status bar
    pub status_message: Option<String>,

    /// Whether the standalone spinner changes color every cycle
    pub color_cycling: bool,

    refresh_work: Duration,
    /// Indicator-clock instant at which the running refresh ends
    refresh_deadline: Option<Duration>,
    refresh_count: usize,
}

impl App {
    pub fn new(config: &SpringConfig) -> Self {
        let view = ScrollView::new(0.0).shared();
        let mut controller =
            RefreshController::with_settings(Timeline::new(), &config.refresher).with_target(&view);
        controller.layout(320.0);
        controller.attach();
        let control_rx = controller.subscribe();

        let mut spinner = SpinnerAnimator::new(Timeline::new(), config.frame.bounds())
            .with_style(config.spinner.style());
        if config.spinner.autostart {
            spinner.start(false);
        }

        let items = (1..=40).map(|n| format!("Message {n:>2}")).collect();

        Self {
            view,
            controller,
            spinner,
            control_rx,
            items,
            should_quit: false,
            status_message: None,
            color_cycling: false,
            refresh_work: DEFAULT_REFRESH_WORK,
            refresh_deadline: None,
            refresh_count: 0,
        }
    }

    /// How long a refresh runs before the control is told to end it
    pub fn with_refresh_work(mut self, work: Duration) -> Self {
        self.refresh_work = work;
        self
    }

    /// Resize the control to the terminal width
    pub fn layout(&mut self, columns: u16) {
        self.controller.layout(f64::from(columns) * ROW_POINTS);
    }

    /// Handle keyboard input
    /// Returns true if the key was handled
    pub fn handle_key(&mut self, key: KeyCode) -> bool {
        match key {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.should_quit = true;
            }
            KeyCode::Down | KeyCode::Char('j') => self.pull(ROW_POINTS),
            KeyCode::PageDown | KeyCode::Char('J') => self.pull(ROW_POINTS * 3.0),
            KeyCode::Up | KeyCode::Char('k') => self.push_back(ROW_POINTS),
            KeyCode::Char(' ') | KeyCode::Enter => self.release(),
            KeyCode::Char('r') => {
                if self.controller.indicator().is_spinning() {
                    return true;
                }
                self.controller.start_refreshing(true);
                self.poll_events();
            }
            KeyCode::Char('e') => {
                self.refresh_deadline = None;
                self.controller.end_refreshing();
                self.poll_events();
            }
            KeyCode::Char('s') => self.toggle_spinner(),
            KeyCode::Char('x') => self.spinner.stop(false, None),
            KeyCode::Char('c') => self.toggle_color_cycling(),
            _ => return false,
        }
        true
    }

    /// Advance both indicator clocks by `dt` and let released content spring back
    pub fn tick(&mut self, dt: Duration) {
        self.controller.indicator_mut().surface_mut().advance(dt);
        self.controller.pump();
        self.spinner.surface_mut().advance(dt);
        self.spinner.pump();

        self.view.lock().settle(SETTLE_SPEED * dt.as_secs_f64());
        self.controller.process_events();
        self.poll_events();

        if let Some(deadline) = self.refresh_deadline {
            if self.clock() >= deadline {
                self.refresh_deadline = None;
                self.finish_refresh();
            }
        }
    }

    /// Check for control notifications (non-blocking)
    pub fn poll_events(&mut self) {
        while let Ok(event) = self.control_rx.try_recv() {
            match event {
                ControlEvent::ValueChanged => {
                    info!("refresh started");
                    self.refresh_deadline = Some(self.clock() + self.refresh_work);
                    self.status_message = Some("Refreshing...".to_string());
                }
                ControlEvent::RefreshEnded => {
                    self.status_message = Some(format!("{} updates", self.refresh_count));
                }
            }
        }
    }

    pub fn phase(&self) -> RefreshPhase {
        self.controller.phase()
    }

    pub fn offset_y(&self) -> f64 {
        self.view.lock().content_offset_y()
    }

    /// Rows of empty space above the list
    pub fn pulled_rows(&self) -> u16 {
        points_to_rows(-self.offset_y())
    }

    /// Rows occupied by the refresh control
    pub fn control_rows(&self) -> u16 {
        points_to_rows(self.controller.frame().height)
    }

    /// Row of the control's top edge relative to the top of the viewport
    pub fn control_top_row(&self) -> f64 {
        (self.controller.frame().origin_y - self.offset_y()) / ROW_POINTS
    }

    pub fn refresh_count(&self) -> usize {
        self.refresh_count
    }

    fn clock(&self) -> Duration {
        self.controller.indicator().surface().now()
    }

    fn pull(&mut self, points: f64) {
        self.view.lock().drag_by(-points);
        self.controller.process_events();
    }

    fn push_back(&mut self, points: f64) {
        {
            let mut view = self.view.lock();
            let rest = view.rest_offset();
            let offset = view.content_offset_y();
            if offset >= rest {
                return;
            }
            view.drag_to((offset + points).min(rest));
        }
        self.controller.process_events();
    }

    fn release(&mut self) {
        {
            let mut view = self.view.lock();
            if !view.is_dragging() {
                return;
            }
            view.release();
        }
        self.controller.process_events();
        self.poll_events();
    }

    fn finish_refresh(&mut self) {
        self.refresh_count += 1;
        self.items
            .insert(0, format!("Update {:>2} (new)", self.refresh_count));
        debug!(count = self.refresh_count, "refresh work done");
        self.controller.end_refreshing();
        self.poll_events();
    }

    fn toggle_spinner(&mut self) {
        if self.spinner.is_spinning() && !self.spinner.has_pending_stop() {
            self.spinner.stop(true, None);
        } else {
            self.spinner.start(false);
        }
    }

    fn toggle_color_cycling(&mut self) {
        self.color_cycling = !self.color_cycling;
        if !self.color_cycling {
            self.spinner.set_interval_callback(None);
            return;
        }

        let mut next = 0;
        self.spinner
            .set_interval_callback(Some(Box::new(move |spinner: &mut SpinnerAnimator<Timeline>| {
                next = (next + 1) % CYCLE_PALETTE.len();
                let mut style = *spinner.style();
                style.line_color = CYCLE_PALETTE[next];
                spinner.set_style(style);
            })));
    }
}

fn points_to_rows(points: f64) -> u16 {
    (points / ROW_POINTS).round().clamp(0.0, f64::from(u16::MAX)) as u16
}
