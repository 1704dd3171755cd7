//! Pull-to-refresh controller
//!
//! Bridges a scroll surface's offset/drag telemetry into spinner commands
//! and content-inset changes.
//!
//! State machine:
//! `Idle ⇄ Dragging(ratio) → Armed (ratio saturated) → Refreshing → Idle`.
//! Offset notifications drive everything up to `Refreshing`; only
//! [`RefreshController::end_refreshing`] leaves it.

use crate::animator::{SpinnerAnimator, SpinnerStyle};
use crate::config::RefresherSettings;
use crate::event::{ControlEvent, EventBus};
use crate::geometry::Bounds;
use crate::render::RenderSurface;
use crate::scroll::{downgrade, ScrollSurface, WeakScrollSurface};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::{debug, trace, warn};

use crate::scroll::OffsetChanged;

/// Default height of the control, and of the inset it reserves while refreshing
pub const DEFAULT_CONTENT_HEIGHT: f64 = 60.0;

/// Default side length of the refresh indicator
pub const DEFAULT_INDICATOR_SIZE: f64 = 20.0;

/// Derived view of the refresh state machine
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RefreshPhase {
    /// Nothing pulled, nothing drawn
    Idle,
    /// Being pulled; progress stroke shows the ratio
    Dragging(f64),
    /// Pulled far enough; refresh starts on release
    Armed,
    /// Spinner cycling
    Refreshing,
}

/// Position and size of the control in scroll-content coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ControlFrame {
    pub origin_y: f64,
    pub width: f64,
    pub height: f64,
}

/// Refresh control observing one scroll surface
pub struct RefreshController<S: RenderSurface> {
    indicator: SpinnerAnimator<S>,
    indicator_size: f64,
    frame: ControlFrame,
    initial_inset_top: f64,
    inset_captured: bool,
    refreshing: bool,
    last_ratio: f64,
    target: Option<WeakScrollSurface>,
    subscription: Option<broadcast::Receiver<OffsetChanged>>,
    events: EventBus<ControlEvent>,
}

impl<S: RenderSurface> RefreshController<S> {
    /// Create a control with default geometry and no target surface
    pub fn new(surface: S) -> Self {
        Self::with_settings(surface, &RefresherSettings::default())
    }

    pub fn with_settings(surface: S, settings: &RefresherSettings) -> Self {
        let indicator = SpinnerAnimator::new(surface, settings.indicator_bounds())
            .with_style(settings.style());
        Self {
            indicator,
            indicator_size: settings.indicator_size,
            frame: ControlFrame {
                origin_y: 0.0,
                width: 0.0,
                height: settings.content_height,
            },
            initial_inset_top: 0.0,
            inset_captured: false,
            refreshing: false,
            last_ratio: 0.0,
            target: None,
            subscription: None,
            events: EventBus::default_capacity(),
        }
    }

    /// Bind a target surface. The control never owns it.
    pub fn with_target<V: ScrollSurface + 'static>(mut self, target: &Arc<Mutex<V>>) -> Self {
        self.set_target(target);
        self
    }

    /// Rebind to another surface, dropping any current observation
    pub fn set_target<V: ScrollSurface + 'static>(&mut self, target: &Arc<Mutex<V>>) {
        self.detach();
        self.target = Some(downgrade(target));
        self.inset_captured = false;
    }

    pub fn has_target(&self) -> bool {
        self.target.is_some()
    }

    pub fn is_attached(&self) -> bool {
        self.subscription.is_some()
    }

    pub fn is_refreshing(&self) -> bool {
        self.refreshing
    }

    pub fn initial_inset_top(&self) -> f64 {
        self.initial_inset_top
    }

    /// Top inset the surface should have in the current state
    pub fn refreshing_inset_top(&self) -> f64 {
        self.initial_inset_top + if self.refreshing { self.frame.height } else { 0.0 }
    }

    pub fn frame(&self) -> ControlFrame {
        self.frame
    }

    /// Ratio derived from the latest processed offset
    pub fn drag_ratio(&self) -> f64 {
        self.last_ratio
    }

    pub fn indicator(&self) -> &SpinnerAnimator<S> {
        &self.indicator
    }

    pub fn indicator_mut(&mut self) -> &mut SpinnerAnimator<S> {
        &mut self.indicator
    }

    /// Frame of the indicator, centered in the control
    pub fn indicator_bounds(&self) -> Bounds {
        Bounds::new(self.indicator_size, self.indicator_size)
    }

    pub fn set_indicator_style(&mut self, style: SpinnerStyle) {
        self.indicator.set_style(style);
    }

    /// Subscribe to control notifications
    pub fn subscribe(&self) -> broadcast::Receiver<ControlEvent> {
        self.events.subscribe()
    }

    pub fn phase(&self) -> RefreshPhase {
        if self.indicator.is_spinning() {
            RefreshPhase::Refreshing
        } else if self.refreshing {
            RefreshPhase::Armed
        } else if self.last_ratio > 0.0 {
            RefreshPhase::Dragging(self.last_ratio)
        } else {
            RefreshPhase::Idle
        }
    }

    /// Size the control to the host's width and capture the surface's
    /// initial top inset. The inset is captured once per target.
    pub fn layout(&mut self, width: f64) {
        self.frame.width = width;

        if self.inset_captured {
            return;
        }
        if let Some(surface) = self.target.as_ref().and_then(|t| t.upgrade()) {
            self.initial_inset_top = surface.lock().content_inset_top();
            self.inset_captured = true;
            debug!(initial_inset_top = self.initial_inset_top, "captured initial inset");
        }
    }

    /// Start observing the target's content offset. Idempotent.
    pub fn attach(&mut self) {
        if self.subscription.is_some() {
            return;
        }
        let Some(surface) = self.target.as_ref().and_then(|t| t.upgrade()) else {
            return;
        };
        self.subscription = Some(surface.lock().subscribe_offset());
        debug!("refresh control attached");
    }

    /// Stop observing. Safe to call any number of times.
    pub fn detach(&mut self) {
        if self.subscription.take().is_some() {
            debug!("refresh control detached");
        }
    }

    /// Handle every pending offset notification.
    ///
    /// Returns the number of notifications handled.
    pub fn process_events(&mut self) -> usize {
        let mut handled = 0;
        loop {
            let Some(subscription) = self.subscription.as_mut() else {
                break;
            };
            match subscription.try_recv() {
                Ok(_) => {
                    handled += 1;
                    self.on_offset_changed();
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "offset notifications lagged");
                }
                Err(TryRecvError::Closed) => {
                    self.teardown("scroll surface dropped");
                    break;
                }
            }
        }
        handled
    }

    /// Forward render-surface completions to the indicator
    pub fn pump(&mut self) {
        self.indicator.pump();
    }

    /// React to one content-offset change of the target surface
    pub fn on_offset_changed(&mut self) {
        let Some(surface) = self.target.as_ref().and_then(|t| t.upgrade()) else {
            self.teardown("scroll surface dropped");
            return;
        };
        let mut surface = surface.lock();
        if !surface.has_ancestor() {
            drop(surface);
            self.teardown("scroll surface left its hierarchy");
            return;
        }

        let mut offset_y = self.initial_inset_top + surface.content_offset_y();
        self.frame.origin_y = offset_y;

        if self.indicator.is_spinning() {
            return;
        }

        if self.refreshing && !surface.is_dragging() {
            self.refresh_start(&mut *surface, true);
            return;
        }

        offset_y += self.frame.height - self.indicator_size;
        if offset_y > 0.0 {
            offset_y = 0.0;
        }

        let ratio = (offset_y / self.frame.height).abs();
        self.refreshing = ratio >= 1.0;
        self.last_ratio = ratio;
        trace!(ratio, refreshing = self.refreshing, "pull progress");

        self.indicator.set_progress_ratio(ratio);
    }

    /// Begin refreshing programmatically
    pub fn start_refreshing(&mut self, notify_observers: bool) {
        self.refreshing = true;

        if let Some(surface) = self.target.as_ref().and_then(|t| t.upgrade()) {
            let mut surface = surface.lock();
            self.refresh_start(&mut *surface, notify_observers);
        }
    }

    /// Finish refreshing: release the reserved inset and let the spinner
    /// stop at the end of its current cycle
    pub fn end_refreshing(&mut self) {
        self.refreshing = false;

        if let Some(surface) = self.target.as_ref().and_then(|t| t.upgrade()) {
            let mut surface = surface.lock();
            let inset = self.refreshing_inset_top();
            if surface.content_inset_top() > inset {
                surface.animate_content_inset_top(inset);
            }
        }

        debug!("refresh ended");
        self.indicator.stop(true, None);
        self.events.publish(ControlEvent::RefreshEnded);
    }

    fn refresh_start(&mut self, surface: &mut dyn ScrollSurface, notify_observers: bool) {
        let inset = self.refreshing_inset_top();
        surface.set_content_inset_top(inset);
        debug!(inset, notify_observers, "refresh started");

        if notify_observers {
            self.events.publish(ControlEvent::ValueChanged);
        }

        self.last_ratio = 0.0;
        self.indicator.pulse();
        self.indicator.start(true);

        let offset_y =
            surface.content_offset_y() - (surface.content_inset_top() - self.initial_inset_top);
        surface.set_content_offset_y(offset_y);
        self.skip_pending_offsets();
        self.frame.origin_y = self.initial_inset_top + offset_y - self.frame.height;
    }

    /// Consume notifications already reflected in the current surface state,
    /// including the one raised by our own offset compensation
    fn skip_pending_offsets(&mut self) {
        let Some(subscription) = self.subscription.as_mut() else {
            return;
        };
        let mut skipped = 0usize;
        loop {
            match subscription.try_recv() {
                Ok(_) => skipped += 1,
                Err(TryRecvError::Lagged(_)) => continue,
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
        trace!(skipped, "skipped offset notifications");
    }

    fn teardown(&mut self, reason: &str) {
        if self.subscription.is_some() || self.target.is_some() {
            warn!(reason, "dropping scroll surface observation");
        }
        self.subscription = None;
        self.target = None;
    }
}
