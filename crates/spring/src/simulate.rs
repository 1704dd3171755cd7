//! Headless scripted pull-to-refresh
//!
//! Drives a [`RefreshController`] over an in-memory [`ScrollView`] with a
//! fixed frame clock: pull in steps, release, let the refresh run, end it,
//! then wait for the indicator to stop and the content to settle.

use comfy_table::{Cell, Color, ContentArrangement, Table};
use parking_lot::Mutex;
use spring_core::scroll::ScrollSurface;
use spring_core::{
    ControlEvent, RefreshController, RefreshPhase, ScrollView, SpringConfig, Timeline,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::{interval, Interval, MissedTickBehavior};
use tracing::{debug, info};

/// Spring-back speed of released content, in points per second
const SETTLE_SPEED: f64 = 400.0;

/// Upper bound on drag steps in one run
const MAX_STEPS: usize = 100_000;

/// Upper bound on simulated time spent in each waiting stage
const STAGE_LIMIT: Duration = Duration::from_secs(30);

/// Parameters of one scripted run
#[derive(Debug, Clone)]
pub struct Script {
    /// Top inset of the scroll view before the run
    pub inset_top: f64,
    /// Total pull distance in points
    pub pull: f64,
    /// Distance of each drag step
    pub step: f64,
    /// Time between refresh start and `end_refreshing`
    pub work: Duration,
    /// Simulated frame interval
    pub frame: Duration,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            inset_top: 0.0,
            pull: 120.0,
            step: 10.0,
            work: Duration::from_millis(1500),
            frame: Duration::from_millis(16),
        }
    }
}

impl Script {
    /// Number of drag steps covering the pull; none unless both are positive and finite
    pub fn steps(&self) -> usize {
        let (pull, step) = (self.pull, self.step);
        if !(pull.is_finite() && step.is_finite() && pull > 0.0 && step > 0.0) {
            return 0;
        }
        (pull / step).ceil().min(MAX_STEPS as f64) as usize
    }
}

/// One row of the run's log
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub at: Duration,
    pub action: &'static str,
    pub offset_y: f64,
    pub inset_top: f64,
    pub phase: RefreshPhase,
    pub events: Vec<ControlEvent>,
}

pub struct Simulation {
    script: Script,
    view: Arc<Mutex<ScrollView>>,
    controller: RefreshController<Timeline>,
    events: broadcast::Receiver<ControlEvent>,
    log: Vec<Transition>,
    last_phase: Option<RefreshPhase>,
    /// Paces frames in wall-clock time when set
    ticker: Option<Interval>,
}

impl Simulation {
    pub fn new(config: &SpringConfig, script: Script) -> Self {
        let view = ScrollView::new(script.inset_top).shared();
        let mut controller =
            RefreshController::with_settings(Timeline::new(), &config.refresher).with_target(&view);
        controller.layout(320.0);
        controller.attach();
        let events = controller.subscribe();

        Self {
            script,
            view,
            controller,
            events,
            log: Vec::new(),
            last_phase: None,
            ticker: None,
        }
    }

    /// Sleep for each simulated frame instead of running flat out
    pub fn paced(mut self) -> Self {
        let mut ticker = interval(self.script.frame.max(Duration::from_millis(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.ticker = Some(ticker);
        self
    }

    /// Run the script to completion and return its log
    pub async fn run(mut self) -> Vec<Transition> {
        self.record("start", true);

        let steps = self.script.steps();
        for _ in 0..steps {
            self.view.lock().drag_by(-self.script.step);
            self.controller.process_events();
            self.record("pull", true);
        }

        self.view.lock().release();
        self.controller.process_events();
        self.record("release", true);

        if self.controller.indicator().is_spinning() {
            let deadline = self.clock() + self.script.work;
            while self.clock() < deadline {
                self.frame().await;
            }

            self.controller.end_refreshing();
            self.record("end", true);
        }

        let limit = self.clock() + STAGE_LIMIT;
        while !self.is_at_rest() && self.clock() < limit {
            self.frame().await;
        }
        self.record("rest", true);

        info!(rows = self.log.len(), "simulation finished");
        self.log
    }

    async fn frame(&mut self) {
        if let Some(ticker) = self.ticker.as_mut() {
            ticker.tick().await;
        }

        let dt = self.script.frame;
        self.controller.indicator_mut().surface_mut().advance(dt);
        self.controller.pump();
        self.view.lock().settle(SETTLE_SPEED * dt.as_secs_f64());
        self.controller.process_events();
        self.record("frame", false);
    }

    fn is_at_rest(&self) -> bool {
        let view = self.view.lock();
        !self.controller.indicator().is_spinning()
            && view.content_offset_y() >= view.rest_offset()
    }

    fn clock(&self) -> Duration {
        self.controller.indicator().surface().now()
    }

    /// Append a row; frames are only logged when something changed
    fn record(&mut self, action: &'static str, always: bool) {
        let mut events = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            events.push(event);
        }

        let phase = self.controller.phase();
        let changed = self.last_phase != Some(phase) || !events.is_empty();
        if !always && !changed {
            return;
        }
        self.last_phase = Some(phase);

        let (offset_y, inset_top) = {
            let view = self.view.lock();
            (view.content_offset_y(), view.content_inset_top())
        };
        debug!(action, offset_y, inset_top, ?phase, "transition");
        self.log.push(Transition {
            at: self.clock(),
            action,
            offset_y,
            inset_top,
            phase,
            events,
        });
    }
}

fn phase_label(phase: RefreshPhase) -> String {
    match phase {
        RefreshPhase::Idle => "idle".to_string(),
        RefreshPhase::Dragging(ratio) => format!("dragging {ratio:.2}"),
        RefreshPhase::Armed => "armed".to_string(),
        RefreshPhase::Refreshing => "refreshing".to_string(),
    }
}

fn event_label(event: &ControlEvent) -> &'static str {
    match event {
        ControlEvent::ValueChanged => "value-changed",
        ControlEvent::RefreshEnded => "refresh-ended",
    }
}

/// Render the log as a table
pub fn render_table(log: &[Transition], no_color: bool) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);

    let headers = ["t (ms)", "Action", "Offset", "Inset", "Phase", "Events"];
    if no_color {
        table.set_header(headers.to_vec());
    } else {
        table.set_header(
            headers
                .iter()
                .map(|h| Cell::new(h).fg(Color::Cyan))
                .collect::<Vec<_>>(),
        );
    }

    for row in log {
        let events = row
            .events
            .iter()
            .map(event_label)
            .collect::<Vec<_>>()
            .join(", ");
        table.add_row(vec![
            Cell::new(row.at.as_millis()),
            Cell::new(row.action),
            Cell::new(format!("{:.1}", row.offset_y + 0.0)),
            Cell::new(format!("{:.1}", row.inset_top)),
            Cell::new(phase_label(row.phase)),
            Cell::new(events),
        ]);
    }

    table
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count(log: &[Transition], event: ControlEvent) -> usize {
        log.iter()
            .flat_map(|row| row.events.iter())
            .filter(|e| **e == event)
            .count()
    }

    #[tokio::test]
    async fn test_full_pull_refreshes_once() {
        let log = Simulation::new(&SpringConfig::default(), Script::default())
            .run()
            .await;

        assert_eq!(count(&log, ControlEvent::ValueChanged), 1);
        assert_eq!(count(&log, ControlEvent::RefreshEnded), 1);

        let release = log.iter().find(|row| row.action == "release").unwrap();
        assert_eq!(release.phase, RefreshPhase::Refreshing);
        assert_eq!(release.inset_top, 60.0);

        let last = log.last().unwrap();
        assert_eq!(last.action, "rest");
        assert_eq!(last.phase, RefreshPhase::Idle);
        assert_eq!(last.inset_top, 0.0);
        assert_eq!(last.offset_y, 0.0);
    }

    #[tokio::test]
    async fn test_short_pull_never_refreshes() {
        let script = Script {
            pull: 50.0,
            ..Script::default()
        };
        let log = Simulation::new(&SpringConfig::default(), script).run().await;

        assert_eq!(count(&log, ControlEvent::ValueChanged), 0);
        assert!(log.iter().all(|row| row.action != "end"));
        assert!(log
            .iter()
            .any(|row| matches!(row.phase, RefreshPhase::Dragging(_))));
        assert_eq!(log.last().unwrap().offset_y, 0.0);
    }

    #[tokio::test]
    async fn test_existing_inset_is_restored() {
        let script = Script {
            inset_top: 30.0,
            pull: 140.0,
            ..Script::default()
        };
        let log = Simulation::new(&SpringConfig::default(), script).run().await;

        assert_eq!(count(&log, ControlEvent::ValueChanged), 1);
        let release = log.iter().find(|row| row.action == "release").unwrap();
        assert_eq!(release.inset_top, 90.0);
        let last = log.last().unwrap();
        assert_eq!(last.inset_top, 30.0);
        assert_eq!(last.offset_y, -30.0);
    }

    #[test]
    fn test_degenerate_steps_do_not_drag() {
        let zero = Script {
            step: 0.0,
            ..Script::default()
        };
        assert_eq!(zero.steps(), 0);
        let backwards = Script {
            step: -10.0,
            ..Script::default()
        };
        assert_eq!(backwards.steps(), 0);
        assert_eq!(Script::default().steps(), 12);
    }

    #[tokio::test]
    async fn test_zero_step_run_finishes() {
        let script = Script {
            step: 0.0,
            ..Script::default()
        };
        let log = tokio::time::timeout(
            Duration::from_secs(5),
            Simulation::new(&SpringConfig::default(), script).run(),
        )
        .await
        .unwrap();

        assert_eq!(count(&log, ControlEvent::ValueChanged), 0);
        assert!(log.iter().all(|row| row.action != "pull"));
        assert_eq!(log.last().unwrap().action, "rest");
    }

    #[test]
    fn test_table_has_row_per_transition() {
        let log = vec![Transition {
            at: Duration::from_millis(16),
            action: "pull",
            offset_y: -10.0,
            inset_top: 0.0,
            phase: RefreshPhase::Idle,
            events: vec![ControlEvent::ValueChanged],
        }];
        let table = render_table(&log, true);
        let text = table.to_string();
        assert!(text.contains("pull"));
        assert!(text.contains("value-changed"));
    }
}
