//! Arc geometry for the spinner stroke
//!
//! Pure functions mapping a rotation index and bounds to the arc that is
//! drawn for one phase cycle, plus the keyframe curve shared by the
//! expand and contract phases.

use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, PI};
use std::fmt;
use std::str::FromStr;

/// Number of discrete rotation positions before the arc pattern repeats.
///
/// Derived from quarter-turn geometry: `(π / (π/2)) * 2 - 1`, exactly `3.0`.
pub const ROTATE_THRESHOLD: f64 = (PI / FRAC_PI_2) * 2.0 - 1.0;

/// Keyframe times shared by the expand and contract phases
pub const STROKE_TIMING: [f64; 5] = [0.0, 0.3, 0.5, 0.7, 1.0];

/// Keyframe values shared by the expand and contract phases
pub const STROKE_VALUES: [f64; 5] = [0.0, 0.1, 0.5, 0.9, 1.0];

/// Point in indicator-local coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Size of the indicator's drawing area
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bounds {
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn center(&self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }

    /// Radius of the circle inscribed in the larger dimension
    pub fn radius(&self) -> f64 {
        self.width.max(self.height) / 2.0
    }
}

/// Stroke color, serialized as `#rrggbb`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LineColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl LineColor {
    pub const GRAY: LineColor = LineColor::rgb(128, 128, 128);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl Default for LineColor {
    fn default() -> Self {
        Self::GRAY
    }
}

impl fmt::Display for LineColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl FromStr for LineColor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(format!("expected #rrggbb, got '{}'", s));
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16).map_err(|e| format!("invalid color '{}': {}", s, e))
        };
        Ok(Self::rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }
}

impl TryFrom<String> for LineColor {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<LineColor> for String {
    fn from(color: LineColor) -> Self {
        color.to_string()
    }
}

/// Stroke attributes applied to every arc the animator installs
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeStyle {
    pub line_width: f64,
    pub color: LineColor,
}

/// Arc-path primitive handed to the rendering surface
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArcPath {
    pub center: Point,
    pub radius: f64,
    /// Start angle in radians, clockwise from the positive x axis
    pub start_angle: f64,
    /// End angle in radians; always greater than `start_angle`
    pub end_angle: f64,
    pub line_width: f64,
    pub color: LineColor,
    pub round_cap: bool,
}

impl ArcPath {
    /// Angular length of the full path
    pub fn sweep(&self) -> f64 {
        self.end_angle - self.start_angle
    }

    /// Point on the path at `fraction` of its length (clamped to [0, 1])
    pub fn point_at(&self, fraction: f64) -> Point {
        let angle = self.start_angle + self.sweep() * fraction.clamp(0.0, 1.0);
        Point::new(
            self.center.x + self.radius * angle.cos(),
            self.center.y + self.radius * angle.sin(),
        )
    }
}

/// Build the arc drawn for a given rotation index.
///
/// Each index shifts the arc back by a quarter turn; the arc always spans
/// `ROTATE_THRESHOLD` quarter turns.
pub fn arc_for_rotation(rotation_index: f64, bounds: Bounds, style: StrokeStyle) -> ArcPath {
    ArcPath {
        center: bounds.center(),
        radius: bounds.radius(),
        start_angle: FRAC_PI_2 * (0.0 - rotation_index),
        end_angle: FRAC_PI_2 * (ROTATE_THRESHOLD - rotation_index),
        line_width: style.line_width,
        color: style.color,
        round_cap: true,
    }
}

/// Advance a rotation index by one position, wrapping to 0 once it
/// reaches `ROTATE_THRESHOLD`.
pub fn next_rotation_index(index: f64) -> f64 {
    let next = index + 1.0;
    if next >= ROTATE_THRESHOLD {
        0.0
    } else {
        next
    }
}

/// Piecewise-linear keyframe curve
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyframeCurve {
    pub times: [f64; 5],
    pub values: [f64; 5],
}

impl Default for KeyframeCurve {
    fn default() -> Self {
        Self::stroke()
    }
}

impl KeyframeCurve {
    /// Easing used by both stroke phases
    pub fn stroke() -> Self {
        Self {
            times: STROKE_TIMING,
            values: STROKE_VALUES,
        }
    }

    /// Sample the curve at fractional time `t` (clamped to [0, 1])
    pub fn sample(&self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        for i in 1..self.times.len() {
            let (t0, t1) = (self.times[i - 1], self.times[i]);
            if t <= t1 {
                let span = t1 - t0;
                if span <= f64::EPSILON {
                    return self.values[i];
                }
                let local = (t - t0) / span;
                return self.values[i - 1] + (self.values[i] - self.values[i - 1]) * local;
            }
        }
        self.values[self.values.len() - 1]
    }
}
