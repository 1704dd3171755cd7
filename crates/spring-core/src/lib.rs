//! spring-core - Core library for spring
//!
//! Provides the spinner animation state machine, the pull-to-refresh
//! controller built on it, and the collaborator contracts (rendering and
//! scroll surfaces) they drive.

pub mod animator;
pub mod config;
pub mod error;
pub mod event;
pub mod geometry;
pub mod refresher;
pub mod render;
pub mod scroll;

pub use animator::{SpinnerAnimator, SpinnerStyle};
pub use config::SpringConfig;
pub use error::CoreError;
pub use event::{ControlEvent, EventBus};
pub use geometry::{ArcPath, Bounds, LineColor, ROTATE_THRESHOLD};
pub use refresher::{RefreshController, RefreshPhase};
pub use render::{RenderSurface, Timeline};
pub use scroll::{ScrollSurface, ScrollView, SharedScrollSurface};
