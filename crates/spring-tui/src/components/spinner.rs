//! Braille-canvas rendering of the indicator arc

use crate::theme::stroke_color;
use ratatui::{
    layout::Rect,
    style::Color,
    symbols::Marker,
    widgets::canvas::{Canvas, Points},
    Frame,
};
use spring_core::geometry::{Bounds, Point};
use spring_core::render::FrameSnapshot;

/// Samples per full turn of the arc
const SAMPLES_PER_TURN: f64 = 96.0;

/// Draws one [`FrameSnapshot`] of an indicator
pub struct ArcIndicator<'a> {
    snapshot: &'a FrameSnapshot,
    bounds: Bounds,
    color: Option<Color>,
}

impl<'a> ArcIndicator<'a> {
    pub fn new(snapshot: &'a FrameSnapshot, bounds: Bounds) -> Self {
        Self {
            snapshot,
            bounds,
            color: None,
        }
    }

    /// Override the arc's own stroke color
    pub fn with_color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }

    /// Visible stroke in canvas coordinates (y grows upward)
    ///
    /// Rotation and scale are applied around the bounds' center, the way
    /// the whole indicator layer is transformed.
    pub fn points(&self) -> Vec<(f64, f64)> {
        let Some(arc) = self.snapshot.arc else {
            return Vec::new();
        };
        let stroke = self.snapshot.stroke;
        let length = stroke.length();
        if length <= 0.0 {
            return Vec::new();
        }

        let turns = arc.sweep() * length / std::f64::consts::TAU;
        let steps = (turns * SAMPLES_PER_TURN).ceil().max(1.0) as usize;
        let center = self.bounds.center();
        let (sin, cos) = self.snapshot.rotation.sin_cos();
        let scale = self.snapshot.scale;

        (0..=steps)
            .map(|i| {
                let fraction = stroke.start + length * i as f64 / steps as f64;
                let p = arc.point_at(fraction);
                let dx = p.x - center.x;
                let dy = p.y - center.y;
                let x = center.x + (dx * cos - dy * sin) * scale;
                let y = center.y + (dx * sin + dy * cos) * scale;
                self.to_canvas(Point::new(x, y))
            })
            .collect()
    }

    fn to_canvas(&self, p: Point) -> (f64, f64) {
        (p.x, self.bounds.height - p.y)
    }

    /// Render the rows of an indicator `full_rows` tall that are visible
    /// in `area`, `hidden_above` of them being scrolled out above it
    pub fn render_rows(&self, frame: &mut Frame, area: Rect, full_rows: u16, hidden_above: u16) {
        if area.height == 0 || full_rows == 0 {
            return;
        }
        let color = self
            .color
            .or_else(|| self.snapshot.arc.map(|arc| stroke_color(arc.color)))
            .unwrap_or(Color::Gray);
        let points = self.points();

        // The pulse can push the stroke slightly outside the bounds
        let margin = self.bounds.radius() * 0.3;
        let per_row = (self.bounds.height + 2.0 * margin) / f64::from(full_rows);
        let top = -margin + f64::from(hidden_above) * per_row;
        let bottom = top + f64::from(area.height) * per_row;

        let canvas = Canvas::default()
            .marker(Marker::Braille)
            .x_bounds([-margin, self.bounds.width + margin])
            .y_bounds([self.bounds.height - bottom, self.bounds.height - top])
            .paint(move |ctx| {
                ctx.draw(&Points {
                    coords: &points,
                    color,
                });
            });
        frame.render_widget(canvas, area);
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        self.render_rows(frame, area, area.height, 0);
    }
}
