//! Scroll-surface contract and an in-memory scroll view
//!
//! The refresh controller only ever holds a [`WeakScrollSurface`]; the host
//! owns the surface and may drop it at any time.

use crate::event::EventBus;
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use tokio::sync::broadcast;
use tracing::trace;

/// Content offset changed notification
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OffsetChanged {
    pub offset_y: f64,
    pub dragging: bool,
}

/// Scroll surface observed by a refresh controller
pub trait ScrollSurface {
    /// Vertical content offset; negative while pulled past the top
    fn content_offset_y(&self) -> f64;

    fn set_content_offset_y(&mut self, y: f64);

    fn content_inset_top(&self) -> f64;

    fn set_content_inset_top(&mut self, top: f64);

    /// Change the top inset with the host's standard animation
    fn animate_content_inset_top(&mut self, top: f64);

    /// Whether the user is currently dragging the content
    fn is_dragging(&self) -> bool;

    /// Whether the surface is still part of a live hierarchy
    fn has_ancestor(&self) -> bool;

    /// Subscribe to content-offset changes
    fn subscribe_offset(&self) -> broadcast::Receiver<OffsetChanged>;
}

/// Owning handle to a scroll surface
pub type SharedScrollSurface = Arc<Mutex<dyn ScrollSurface>>;

/// Non-owning handle held by observers
pub type WeakScrollSurface = Weak<Mutex<dyn ScrollSurface>>;

/// Downgrade a concrete shared surface to a non-owning trait-object handle
pub fn downgrade<V: ScrollSurface + 'static>(surface: &Arc<Mutex<V>>) -> WeakScrollSurface {
    let shared: SharedScrollSurface = surface.clone();
    Arc::downgrade(&shared)
}

/// In-memory scroll view
///
/// Every content-offset mutation publishes an [`OffsetChanged`]. Inset
/// animations are applied immediately.
pub struct ScrollView {
    offset_y: f64,
    inset_top: f64,
    dragging: bool,
    in_hierarchy: bool,
    inset_animations: usize,
    offsets: EventBus<OffsetChanged>,
}

impl Default for ScrollView {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl ScrollView {
    /// Create a view at rest with the given top inset
    pub fn new(inset_top: f64) -> Self {
        Self {
            offset_y: -inset_top,
            inset_top,
            dragging: false,
            in_hierarchy: true,
            inset_animations: 0,
            offsets: EventBus::default_capacity(),
        }
    }

    pub fn shared(self) -> Arc<Mutex<ScrollView>> {
        Arc::new(Mutex::new(self))
    }

    /// Offset where the content rests when nothing is dragging it
    pub fn rest_offset(&self) -> f64 {
        -self.inset_top
    }

    /// User drag moving the content to `y`
    pub fn drag_to(&mut self, y: f64) {
        self.dragging = true;
        self.move_to(y);
    }

    /// Drag by `dy` relative to the current offset
    pub fn drag_by(&mut self, dy: f64) {
        let y = self.offset_y + dy;
        self.drag_to(y);
    }

    /// User lifts the finger; observers are notified with the same offset
    pub fn release(&mut self) {
        self.dragging = false;
        self.notify();
    }

    /// Spring back toward the rest offset by at most `max_step`.
    ///
    /// Returns `true` if the offset moved.
    pub fn settle(&mut self, max_step: f64) -> bool {
        let rest = self.rest_offset();
        if self.dragging || self.offset_y >= rest {
            return false;
        }
        let y = (self.offset_y + max_step.abs()).min(rest);
        self.move_to(y);
        true
    }

    /// Remove the view from its hierarchy; the next observer callback sees no ancestor
    pub fn detach_from_hierarchy(&mut self) {
        self.in_hierarchy = false;
    }

    /// Number of animated inset changes requested so far
    pub fn inset_animations(&self) -> usize {
        self.inset_animations
    }

    pub fn observer_count(&self) -> usize {
        self.offsets.subscriber_count()
    }

    fn move_to(&mut self, y: f64) {
        self.offset_y = y;
        self.notify();
    }

    fn notify(&self) {
        trace!(offset_y = self.offset_y, dragging = self.dragging, "content offset changed");
        self.offsets.publish(OffsetChanged {
            offset_y: self.offset_y,
            dragging: self.dragging,
        });
    }
}

impl ScrollSurface for ScrollView {
    fn content_offset_y(&self) -> f64 {
        self.offset_y
    }

    fn set_content_offset_y(&mut self, y: f64) {
        self.move_to(y);
    }

    fn content_inset_top(&self) -> f64 {
        self.inset_top
    }

    fn set_content_inset_top(&mut self, top: f64) {
        self.inset_top = top;
    }

    fn animate_content_inset_top(&mut self, top: f64) {
        self.inset_animations += 1;
        self.inset_top = top;
    }

    fn is_dragging(&self) -> bool {
        self.dragging
    }

    fn has_ancestor(&self) -> bool {
        self.in_hierarchy
    }

    fn subscribe_offset(&self) -> broadcast::Receiver<OffsetChanged> {
        self.offsets.subscribe()
    }
}
