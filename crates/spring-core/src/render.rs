//! Rendering-surface contract and an in-memory timeline implementation
//!
//! The animator never draws anything itself. It installs arc primitives on
//! a [`RenderSurface`], schedules keyframed stroke phases on them and
//! receives [`PhaseCompletion`]s back, each tagged with the [`CycleToken`]
//! it was scheduled with.

use crate::geometry::{ArcPath, KeyframeCurve};
use std::f64::consts::TAU;
use std::time::Duration;
use tracing::trace;

/// Opaque identifier of an arc primitive installed on a surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArcHandle(pub u64);

/// Identifies one scheduled phase; issued in increasing order by the animator
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CycleToken(pub u64);

/// Animatable stroke property of an arc primitive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrokeProperty {
    /// Leading edge (`strokeStart`)
    Start,
    /// Trailing edge (`strokeEnd`)
    End,
}

/// Visible portion of an arc, as fractions of its length
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeRange {
    pub start: f64,
    pub end: f64,
}

impl StrokeRange {
    pub const FULL: StrokeRange = StrokeRange { start: 0.0, end: 1.0 };
    pub const EMPTY: StrokeRange = StrokeRange { start: 0.0, end: 0.0 };

    /// Visible length as a fraction of the full arc
    pub fn length(&self) -> f64 {
        (self.end - self.start).max(0.0)
    }
}

/// Keyframed animation of one stroke property
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeKeyframes {
    pub property: StrokeProperty,
    pub duration: Duration,
    /// Delay from the start of the enclosing phase
    pub begin: Duration,
    pub curve: KeyframeCurve,
}

impl StrokeKeyframes {
    pub fn new(property: StrokeProperty, duration: Duration, begin: Duration) -> Self {
        Self {
            property,
            duration,
            begin,
            curve: KeyframeCurve::stroke(),
        }
    }

    /// Value at `elapsed` since the phase began, or `None` before `begin`
    pub fn value_at(&self, elapsed: Duration) -> Option<f64> {
        let local = elapsed.checked_sub(self.begin)?;
        if self.duration.is_zero() {
            return Some(self.curve.sample(1.0));
        }
        Some(self.curve.sample(local.as_secs_f64() / self.duration.as_secs_f64()))
    }

    pub fn end(&self) -> Duration {
        self.begin + self.duration
    }
}

/// Stroke animation covering one phase boundary to the next
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PhaseAnimation {
    /// Trailing edge grows, then the leading edge follows it
    Cycle {
        expand: StrokeKeyframes,
        contract: StrokeKeyframes,
    },
    /// Only the leading edge moves; the arc starts fully drawn
    Contract(StrokeKeyframes),
}

impl PhaseAnimation {
    /// Expand over `stroke`, then contract over `stroke` (total `2 * stroke`)
    pub fn cycle(stroke: Duration) -> Self {
        Self::Cycle {
            expand: StrokeKeyframes::new(StrokeProperty::End, stroke, Duration::ZERO),
            contract: StrokeKeyframes::new(StrokeProperty::Start, stroke, stroke),
        }
    }

    pub fn contract(stroke: Duration) -> Self {
        Self::Contract(StrokeKeyframes::new(
            StrokeProperty::Start,
            stroke,
            Duration::ZERO,
        ))
    }

    pub fn duration(&self) -> Duration {
        match self {
            Self::Cycle { expand, contract } => expand.end().max(contract.end()),
            Self::Contract(contract) => contract.end(),
        }
    }

    /// Visible stroke at `elapsed`; holds the final values afterwards
    pub fn stroke_at(&self, elapsed: Duration) -> StrokeRange {
        let elapsed = elapsed.min(self.duration());
        match self {
            Self::Cycle { expand, contract } => StrokeRange {
                start: contract.value_at(elapsed).unwrap_or(0.0),
                end: expand.value_at(elapsed).unwrap_or(0.0),
            },
            Self::Contract(contract) => StrokeRange {
                start: contract.value_at(elapsed).unwrap_or(0.0),
                end: 1.0,
            },
        }
    }
}

/// Indefinitely repeating z-rotation of the whole indicator
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotationAnimation {
    pub period: Duration,
    pub from: f64,
    pub to: f64,
}

impl RotationAnimation {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            from: 0.0,
            to: TAU,
        }
    }

    pub fn angle_at(&self, elapsed: Duration) -> f64 {
        if self.period.is_zero() {
            return self.from;
        }
        let turns = (elapsed.as_secs_f64() / self.period.as_secs_f64()).fract();
        self.from + (self.to - self.from) * turns
    }
}

/// Timing function of a basic animation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Easing {
    Linear,
    EaseIn,
}

impl Easing {
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::EaseIn => t * t,
        }
    }
}

/// One-shot scale animation played when refreshing starts
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScalePulse {
    pub duration: Duration,
    pub from: f64,
    pub to: f64,
    pub autoreverse: bool,
    pub repeat_count: u32,
    pub easing: Easing,
}

impl ScalePulse {
    /// 1.0 → 1.3 over 0.1 s, reversed once, eased in
    pub fn refresh() -> Self {
        Self {
            duration: Duration::from_millis(100),
            from: 1.0,
            to: 1.3,
            autoreverse: true,
            repeat_count: 1,
            easing: Easing::EaseIn,
        }
    }

    pub fn total_duration(&self) -> Duration {
        let legs = if self.autoreverse { 2 } else { 1 };
        self.duration * legs * self.repeat_count.max(1)
    }

    /// Scale at `elapsed`, or `None` once the pulse has finished
    pub fn scale_at(&self, elapsed: Duration) -> Option<f64> {
        if elapsed >= self.total_duration() || self.duration.is_zero() {
            return None;
        }
        let legs = elapsed.as_secs_f64() / self.duration.as_secs_f64();
        let leg = legs.floor() as u64;
        let mut t = legs.fract();
        if self.autoreverse && leg % 2 == 1 {
            t = 1.0 - t;
        }
        Some(self.from + (self.to - self.from) * self.easing.apply(t))
    }
}

/// Completion report for a scheduled phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseCompletion {
    pub token: CycleToken,
    /// `false` when the phase was cut short (e.g. its arc was removed)
    pub finished: bool,
}

/// Drawing collaborator driven by [`SpinnerAnimator`](crate::animator::SpinnerAnimator)
pub trait RenderSurface {
    /// Install a new arc primitive and return its handle
    fn install_arc(&mut self, arc: ArcPath) -> ArcHandle;

    /// Release an arc primitive; unknown handles are ignored
    fn remove_arc(&mut self, handle: ArcHandle);

    /// Show a static stroke from 0 to `value`
    fn set_stroke_end(&mut self, handle: ArcHandle, value: f64);

    /// Run a stroke phase on an arc; its completion is reported with `token`
    fn schedule_phase(&mut self, handle: ArcHandle, phase: PhaseAnimation, token: CycleToken);

    fn start_rotation(&mut self, rotation: RotationAnimation);

    fn stop_rotation(&mut self);

    fn play_pulse(&mut self, pulse: ScalePulse);

    /// Drain completions reported since the last call, oldest first
    fn take_completions(&mut self) -> Vec<PhaseCompletion>;
}

#[derive(Debug, Clone, Copy)]
struct RunningPhase {
    animation: PhaseAnimation,
    token: CycleToken,
    started: Duration,
}

#[derive(Debug, Clone)]
struct InstalledArc {
    handle: ArcHandle,
    path: ArcPath,
    stroke: StrokeRange,
    phase: Option<RunningPhase>,
}

/// What a renderer should draw at the timeline's current instant
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameSnapshot {
    pub arc: Option<ArcPath>,
    pub stroke: StrokeRange,
    /// Rotation of the whole indicator in radians
    pub rotation: f64,
    pub scale: f64,
}

/// Deterministic in-memory [`RenderSurface`] driven by an explicit clock
///
/// Call [`Timeline::advance`] from the host's frame loop, then let the
/// animator drain completions.
#[derive(Debug, Default)]
pub struct Timeline {
    now: Duration,
    next_handle: u64,
    arcs: Vec<InstalledArc>,
    rotation: Option<(RotationAnimation, Duration)>,
    pulse: Option<(ScalePulse, Duration)>,
    completions: Vec<PhaseCompletion>,
    pulses_played: usize,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    /// Move the clock forward and record completions of finished phases
    pub fn advance(&mut self, dt: Duration) {
        self.now += dt;
        let now = self.now;

        for arc in &mut self.arcs {
            let Some(running) = arc.phase else {
                continue;
            };
            let elapsed = now.saturating_sub(running.started);
            if elapsed >= running.animation.duration() {
                arc.stroke = running.animation.stroke_at(elapsed);
                arc.phase = None;
                trace!(token = running.token.0, "phase finished");
                self.completions.push(PhaseCompletion {
                    token: running.token,
                    finished: true,
                });
            }
        }

        if let Some((pulse, started)) = self.pulse {
            if now.saturating_sub(started) >= pulse.total_duration() {
                self.pulse = None;
            }
        }
    }

    /// Number of arc primitives currently installed
    pub fn arc_count(&self) -> usize {
        self.arcs.len()
    }

    pub fn is_rotating(&self) -> bool {
        self.rotation.is_some()
    }

    pub fn pulses_played(&self) -> usize {
        self.pulses_played
    }

    /// Whether a phase is running on any installed arc
    pub fn has_running_phase(&self) -> bool {
        self.arcs.iter().any(|arc| arc.phase.is_some())
    }

    /// Sample the visible state at the current instant
    pub fn snapshot(&self) -> FrameSnapshot {
        let rotation = self
            .rotation
            .map(|(rotation, started)| rotation.angle_at(self.now.saturating_sub(started)))
            .unwrap_or(0.0);
        let scale = self
            .pulse
            .and_then(|(pulse, started)| pulse.scale_at(self.now.saturating_sub(started)))
            .unwrap_or(1.0);

        match self.arcs.last() {
            Some(arc) => {
                let stroke = match arc.phase {
                    Some(running) => running
                        .animation
                        .stroke_at(self.now.saturating_sub(running.started)),
                    None => arc.stroke,
                };
                FrameSnapshot {
                    arc: Some(arc.path),
                    stroke,
                    rotation,
                    scale,
                }
            }
            None => FrameSnapshot {
                arc: None,
                stroke: StrokeRange::EMPTY,
                rotation,
                scale,
            },
        }
    }

    fn arc_mut(&mut self, handle: ArcHandle) -> Option<&mut InstalledArc> {
        self.arcs.iter_mut().find(|arc| arc.handle == handle)
    }
}

impl RenderSurface for Timeline {
    fn install_arc(&mut self, arc: ArcPath) -> ArcHandle {
        self.next_handle += 1;
        let handle = ArcHandle(self.next_handle);
        self.arcs.push(InstalledArc {
            handle,
            path: arc,
            stroke: StrokeRange::FULL,
            phase: None,
        });
        handle
    }

    fn remove_arc(&mut self, handle: ArcHandle) {
        let Some(pos) = self.arcs.iter().position(|arc| arc.handle == handle) else {
            return;
        };
        let arc = self.arcs.remove(pos);
        if let Some(running) = arc.phase {
            trace!(token = running.token.0, "phase interrupted by arc removal");
            self.completions.push(PhaseCompletion {
                token: running.token,
                finished: false,
            });
        }
    }

    fn set_stroke_end(&mut self, handle: ArcHandle, value: f64) {
        if let Some(arc) = self.arc_mut(handle) {
            arc.stroke = StrokeRange {
                start: 0.0,
                end: value,
            };
        }
    }

    fn schedule_phase(&mut self, handle: ArcHandle, phase: PhaseAnimation, token: CycleToken) {
        let now = self.now;
        if let Some(arc) = self.arc_mut(handle) {
            arc.phase = Some(RunningPhase {
                animation: phase,
                token,
                started: now,
            });
        }
    }

    fn start_rotation(&mut self, rotation: RotationAnimation) {
        self.rotation = Some((rotation, self.now));
    }

    fn stop_rotation(&mut self) {
        self.rotation = None;
    }

    fn play_pulse(&mut self, pulse: ScalePulse) {
        self.pulse = Some((pulse, self.now));
        self.pulses_played += 1;
    }

    fn take_completions(&mut self) -> Vec<PhaseCompletion> {
        std::mem::take(&mut self.completions)
    }
}
