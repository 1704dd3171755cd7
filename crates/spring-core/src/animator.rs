//! Spinner animation state machine
//!
//! A [`SpinnerAnimator`] keeps the indicator rotating and cycles the arc
//! through expand/contract phases until it is stopped. Every phase is
//! scheduled on the [`RenderSurface`] with a fresh [`CycleToken`]; only a
//! completion carrying the current token advances the cycle, so callbacks
//! from cancelled cycles are no-ops.

use crate::geometry::{arc_for_rotation, next_rotation_index, Bounds, LineColor, StrokeStyle};
use crate::render::{
    ArcHandle, CycleToken, PhaseAnimation, PhaseCompletion, RenderSurface, RotationAnimation,
    ScalePulse,
};
use std::time::Duration;
use tracing::{debug, trace};

/// Invoked once when a stop completes
pub type StopCompletion<S> = Box<dyn FnOnce(&mut SpinnerAnimator<S>)>;

/// Invoked at the start of every phase cycle
pub type IntervalCallback<S> = Box<dyn FnMut(&mut SpinnerAnimator<S>)>;

/// Visual parameters of the spinner
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpinnerStyle {
    pub line_width: f64,
    pub line_color: LineColor,
    /// One full turn of the indefinite rotation
    pub rotate_duration: Duration,
    /// Length of a single expand or contract phase
    pub stroke_duration: Duration,
}

impl Default for SpinnerStyle {
    fn default() -> Self {
        Self {
            line_width: 3.0,
            line_color: LineColor::GRAY,
            rotate_duration: Duration::from_millis(1500),
            stroke_duration: Duration::from_millis(700),
        }
    }
}

impl SpinnerStyle {
    /// Tighter, faster style used by the refresh control's indicator
    pub fn refresher() -> Self {
        Self {
            line_width: 2.0,
            line_color: LineColor::GRAY,
            rotate_duration: Duration::from_secs(1),
            stroke_duration: Duration::from_millis(500),
        }
    }

    /// Duration of one full expand + contract cycle
    pub fn cycle_duration(&self) -> Duration {
        self.stroke_duration * 2
    }

    fn stroke(&self) -> StrokeStyle {
        StrokeStyle {
            line_width: self.line_width,
            color: self.line_color,
        }
    }
}

struct PendingStop<S: RenderSurface> {
    completion: Option<StopCompletion<S>>,
}

/// Perpetual rotation + phase-cycle state machine for one indicator
pub struct SpinnerAnimator<S: RenderSurface> {
    surface: S,
    bounds: Bounds,
    style: SpinnerStyle,
    spinning: bool,
    rotation_index: f64,
    active_arc: Option<ArcHandle>,
    pending_stop: Option<PendingStop<S>>,
    interval: Option<IntervalCallback<S>>,
    /// Token of the phase whose completion advances the cycle
    current_token: Option<CycleToken>,
    issued_tokens: u64,
}

impl<S: RenderSurface> SpinnerAnimator<S> {
    pub fn new(surface: S, bounds: Bounds) -> Self {
        Self {
            surface,
            bounds,
            style: SpinnerStyle::default(),
            spinning: false,
            rotation_index: 0.0,
            active_arc: None,
            pending_stop: None,
            interval: None,
            current_token: None,
            issued_tokens: 0,
        }
    }

    pub fn with_style(mut self, style: SpinnerStyle) -> Self {
        self.style = style;
        self
    }

    pub fn style(&self) -> &SpinnerStyle {
        &self.style
    }

    /// Applies to arcs installed from the next phase boundary on
    pub fn set_style(&mut self, style: SpinnerStyle) {
        self.style = style;
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn set_bounds(&mut self, bounds: Bounds) {
        self.bounds = bounds;
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn is_spinning(&self) -> bool {
        self.spinning
    }

    pub fn rotation_index(&self) -> f64 {
        self.rotation_index
    }

    pub fn active_arc(&self) -> Option<ArcHandle> {
        self.active_arc
    }

    /// Token of the in-flight phase, if any
    pub fn cycle_token(&self) -> Option<CycleToken> {
        self.current_token
    }

    pub fn has_pending_stop(&self) -> bool {
        self.pending_stop.is_some()
    }

    /// Set or clear the callback invoked at the start of every phase cycle
    pub fn set_interval_callback(&mut self, callback: Option<IntervalCallback<S>>) {
        self.interval = callback;
    }

    /// Start spinning. No-op while already spinning.
    ///
    /// Any deferred stop is cancelled first; its completion is dropped.
    /// With `expand`, the first phase only contracts the arc from a full
    /// circle at rotation index 0, which matches a saturated progress
    /// stroke.
    pub fn start(&mut self, expand: bool) {
        if self.pending_stop.take().is_some() {
            debug!("start cancelled a deferred stop");
        }

        if self.spinning {
            trace!("start ignored, already spinning");
            return;
        }

        debug!(expand, "spinner started");
        self.surface
            .start_rotation(RotationAnimation::new(self.style.rotate_duration));
        self.spinning = true;

        self.next_cycle(expand);
    }

    /// Stop spinning.
    ///
    /// With `wait_for_cycle`, the stop is deferred to the next phase
    /// boundary so the running stroke finishes; otherwise everything is torn
    /// down now. `completion` runs exactly once, after the animator is idle.
    /// An idle animator stops immediately either way.
    pub fn stop(&mut self, wait_for_cycle: bool, completion: Option<StopCompletion<S>>) {
        if wait_for_cycle && self.spinning {
            debug!("spinner stop deferred to next phase boundary");
            self.pending_stop = Some(PendingStop { completion });
            return;
        }

        self.halt(completion);
    }

    /// Show a static progress stroke.
    ///
    /// Ratios are clamped to [0, 1]; 0 removes the arc and 1 draws the full
    /// circle. Callers must check [`is_spinning`](Self::is_spinning) first:
    /// the progress stroke and the phase cycle share the same arc.
    pub fn set_progress_ratio(&mut self, ratio: f64) {
        let ratio = if ratio.is_nan() {
            0.0
        } else {
            ratio.clamp(0.0, 1.0)
        };

        if ratio <= 0.0 {
            self.clear_arc();
            return;
        }

        let handle = match self.active_arc {
            Some(handle) => handle,
            None => self.replace_arc(0.0),
        };
        trace!(ratio, "progress stroke");
        self.surface.set_stroke_end(handle, ratio);
    }

    /// Play the one-shot scale pulse, independent of the phase cycle
    pub fn pulse(&mut self) {
        self.surface.play_pulse(ScalePulse::refresh());
    }

    /// Handle a phase-boundary callback.
    ///
    /// Finished and interrupted completions both advance the cycle; stale
    /// tokens are ignored.
    pub fn on_phase_complete(&mut self, completion: PhaseCompletion) {
        if self.current_token != Some(completion.token) {
            trace!(token = completion.token.0, "stale phase completion ignored");
            return;
        }

        if !completion.finished {
            debug!(token = completion.token.0, "phase interrupted, advancing cycle");
        }

        self.current_token = None;
        self.next_cycle(false);
    }

    /// Forward all completions reported by the surface
    pub fn pump(&mut self) {
        for completion in self.surface.take_completions() {
            self.on_phase_complete(completion);
        }
    }

    fn next_cycle(&mut self, expand: bool) {
        self.run_interval_callback();

        if let Some(stop) = self.pending_stop.take() {
            self.halt(stop.completion);
            return;
        }

        if !self.spinning {
            return;
        }

        let index = if expand {
            0.0
        } else {
            next_rotation_index(self.rotation_index)
        };
        let handle = self.replace_arc(index);

        let phase = if expand {
            PhaseAnimation::contract(self.style.stroke_duration)
        } else {
            PhaseAnimation::cycle(self.style.stroke_duration)
        };
        self.issued_tokens += 1;
        let token = CycleToken(self.issued_tokens);
        self.current_token = Some(token);

        trace!(token = token.0, rotation_index = index, expand, "phase scheduled");
        self.surface.schedule_phase(handle, phase, token);
    }

    fn run_interval_callback(&mut self) {
        if let Some(mut callback) = self.interval.take() {
            callback(self);
            // The callback may have installed a replacement
            if self.interval.is_none() {
                self.interval = Some(callback);
            }
        }
    }

    fn halt(&mut self, completion: Option<StopCompletion<S>>) {
        self.pending_stop = None;
        self.current_token = None;
        if self.spinning {
            debug!("spinner stopped");
        }
        self.spinning = false;
        self.surface.stop_rotation();
        self.clear_arc();

        if let Some(completion) = completion {
            completion(self);
        }
    }

    /// Release the current arc, then install the one for `index`
    fn replace_arc(&mut self, index: f64) -> ArcHandle {
        self.rotation_index = index;
        self.clear_arc();

        let arc = arc_for_rotation(index, self.bounds, self.style.stroke());
        let handle = self.surface.install_arc(arc);
        self.active_arc = Some(handle);
        handle
    }

    fn clear_arc(&mut self) {
        if let Some(handle) = self.active_arc.take() {
            self.surface.remove_arc(handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{StrokeRange, Timeline};
    use std::cell::Cell;
    use std::rc::Rc;

    fn animator() -> SpinnerAnimator<Timeline> {
        SpinnerAnimator::new(Timeline::new(), Bounds::new(20.0, 20.0))
            .with_style(SpinnerStyle::refresher())
    }

    fn finish_cycle(animator: &mut SpinnerAnimator<Timeline>) {
        let token = animator.cycle_token().expect("phase in flight");
        animator.on_phase_complete(PhaseCompletion {
            token,
            finished: true,
        });
    }

    #[test]
    fn test_start_is_idempotent() {
        let mut animator = animator();
        animator.start(false);
        let token = animator.cycle_token();
        let arc = animator.active_arc();

        animator.start(false);

        assert!(animator.is_spinning());
        assert_eq!(animator.cycle_token(), token);
        assert_eq!(animator.active_arc(), arc);
        assert_eq!(animator.surface().arc_count(), 1);
    }

    #[test]
    fn test_rotation_index_follows_cycle_count() {
        let mut animator = animator();
        animator.start(false);
        // The first cycle already draws at index 1
        assert_eq!(animator.rotation_index(), 1.0);

        for n in 2..=10u32 {
            finish_cycle(&mut animator);
            assert_eq!(animator.rotation_index(), f64::from(n % 3));
        }
    }

    #[test]
    fn test_expand_start_resets_index_and_contracts() {
        let mut animator = animator();
        animator.start(false);
        finish_cycle(&mut animator);
        animator.stop(false, None);

        animator.start(true);
        assert_eq!(animator.rotation_index(), 0.0);
        // Contract-only phase begins from a full circle
        assert_eq!(animator.surface().snapshot().stroke, StrokeRange::FULL);

        finish_cycle(&mut animator);
        assert_eq!(animator.rotation_index(), 1.0);
    }

    #[test]
    fn test_immediate_stop_tears_down() {
        let mut animator = animator();
        animator.start(false);

        let fired = Rc::new(Cell::new(0));
        let counter = Rc::clone(&fired);
        animator.stop(
            false,
            Some(Box::new(move |a: &mut SpinnerAnimator<Timeline>| {
                assert!(!a.is_spinning());
                counter.set(counter.get() + 1);
            })),
        );

        assert_eq!(fired.get(), 1);
        assert!(!animator.is_spinning());
        assert!(animator.active_arc().is_none());
        assert!(animator.cycle_token().is_none());
        assert!(!animator.surface().is_rotating());
        assert_eq!(animator.surface().arc_count(), 0);
    }

    #[test]
    fn test_cancelled_cycle_completion_is_noop() {
        let mut animator = animator();
        animator.start(false);
        let stale = animator.cycle_token().unwrap();
        animator.stop(false, None);

        // Arc removal reported the interrupted phase
        animator.pump();
        animator.on_phase_complete(PhaseCompletion {
            token: stale,
            finished: true,
        });

        assert!(!animator.is_spinning());
        assert_eq!(animator.surface().arc_count(), 0);
    }

    #[test]
    fn test_deferred_stop_fires_once_at_boundary() {
        let mut animator = animator();
        animator.start(false);

        let fired = Rc::new(Cell::new(0));
        let counter = Rc::clone(&fired);
        animator.stop(
            true,
            Some(Box::new(move |_: &mut SpinnerAnimator<Timeline>| {
                counter.set(counter.get() + 1)
            })),
        );

        assert!(animator.is_spinning());
        assert!(animator.has_pending_stop());
        assert_eq!(fired.get(), 0);

        let token = animator.cycle_token().unwrap();
        for _ in 0..3 {
            animator.on_phase_complete(PhaseCompletion {
                token,
                finished: true,
            });
        }

        assert_eq!(fired.get(), 1);
        assert!(!animator.is_spinning());
        assert!(!animator.has_pending_stop());
    }

    #[test]
    fn test_interrupted_completion_advances_cycle() {
        let mut animator = animator();
        animator.start(false);
        let token = animator.cycle_token().unwrap();

        animator.on_phase_complete(PhaseCompletion {
            token,
            finished: false,
        });

        assert!(animator.is_spinning());
        assert_ne!(animator.cycle_token(), Some(token));
        assert_eq!(animator.rotation_index(), 2.0);
    }

    #[test]
    fn test_start_cancels_deferred_stop() {
        let mut animator = animator();
        animator.start(false);

        let fired = Rc::new(Cell::new(false));
        let flag = Rc::clone(&fired);
        animator.stop(
            true,
            Some(Box::new(move |_: &mut SpinnerAnimator<Timeline>| flag.set(true))),
        );
        animator.start(false);
        finish_cycle(&mut animator);

        assert!(animator.is_spinning());
        assert!(!fired.get());
    }

    #[test]
    fn test_deferred_stop_when_idle_is_immediate() {
        let mut animator = animator();
        let fired = Rc::new(Cell::new(false));
        let flag = Rc::clone(&fired);
        animator.stop(
            true,
            Some(Box::new(move |_: &mut SpinnerAnimator<Timeline>| flag.set(true))),
        );
        assert!(fired.get());
        assert!(!animator.has_pending_stop());
    }

    #[test]
    fn test_interval_callback_runs_every_cycle() {
        let mut animator = animator();
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        animator.set_interval_callback(Some(Box::new(move |a: &mut SpinnerAnimator<Timeline>| {
            counter.set(counter.get() + 1);
            let mut style = *a.style();
            style.line_color = LineColor::rgb(0, 128, 128);
            a.set_style(style);
        })));

        animator.start(false);
        finish_cycle(&mut animator);
        finish_cycle(&mut animator);

        assert_eq!(calls.get(), 3);
        assert_eq!(animator.style().line_color, LineColor::rgb(0, 128, 128));
        let arc = animator.surface().snapshot().arc.unwrap();
        assert_eq!(arc.color, LineColor::rgb(0, 128, 128));
    }

    #[test]
    fn test_progress_ratio_bounds() {
        let mut animator = animator();

        animator.set_progress_ratio(-0.5);
        assert!(animator.active_arc().is_none());

        animator.set_progress_ratio(0.25);
        assert_eq!(
            animator.surface().snapshot().stroke,
            StrokeRange { start: 0.0, end: 0.25 }
        );

        animator.set_progress_ratio(4.0);
        assert_eq!(animator.surface().snapshot().stroke, StrokeRange::FULL);
        assert_eq!(animator.surface().arc_count(), 1);

        animator.set_progress_ratio(0.0);
        assert!(animator.active_arc().is_none());
        assert_eq!(animator.surface().arc_count(), 0);

        animator.set_progress_ratio(f64::NAN);
        assert!(animator.active_arc().is_none());
    }

    #[test]
    fn test_single_arc_across_cycles() {
        let mut animator = animator();
        animator.start(false);

        for _ in 0..20 {
            animator
                .surface_mut()
                .advance(SpinnerStyle::refresher().cycle_duration());
            animator.pump();
            assert_eq!(animator.surface().arc_count(), 1);
        }
        assert!(animator.is_spinning());
    }

    #[test]
    fn test_pulse_is_independent_of_cycle() {
        let mut animator = animator();
        animator.pulse();
        assert_eq!(animator.surface().pulses_played(), 1);
        assert!(!animator.is_spinning());
        assert!(animator.cycle_token().is_none());
    }
}
