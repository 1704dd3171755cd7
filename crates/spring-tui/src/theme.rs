//! Color language for the spring TUI
//!
//! - Gray: idle, nothing pulled
//! - Yellow: being pulled
//! - Cyan: armed, refresh starts on release
//! - Green: refreshing

use ratatui::style::Color;
use spring_core::{LineColor, RefreshPhase};

/// Status color palette following k9s/lazygit conventions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusColor {
    Success,
    Warning,
    Neutral,
    Focus,
}

impl StatusColor {
    pub fn to_color(self) -> Color {
        match self {
            StatusColor::Success => Color::Green,
            StatusColor::Warning => Color::Yellow,
            StatusColor::Neutral => Color::DarkGray,
            StatusColor::Focus => Color::Cyan,
        }
    }
}

/// Semantic color and label of a refresh phase
pub struct PhaseStyle;

impl PhaseStyle {
    pub fn color(phase: RefreshPhase) -> Color {
        let status = match phase {
            RefreshPhase::Idle => StatusColor::Neutral,
            RefreshPhase::Dragging(_) => StatusColor::Warning,
            RefreshPhase::Armed => StatusColor::Focus,
            RefreshPhase::Refreshing => StatusColor::Success,
        };
        status.to_color()
    }

    pub fn label(phase: RefreshPhase) -> String {
        match phase {
            RefreshPhase::Idle => "idle".to_string(),
            RefreshPhase::Dragging(ratio) => format!("pulling {:>3.0}%", ratio * 100.0),
            RefreshPhase::Armed => "release to refresh".to_string(),
            RefreshPhase::Refreshing => "refreshing".to_string(),
        }
    }

    pub fn icon(phase: RefreshPhase) -> &'static str {
        match phase {
            RefreshPhase::Idle => "○",
            RefreshPhase::Dragging(_) => "↓",
            RefreshPhase::Armed => "●",
            RefreshPhase::Refreshing => "⟳",
        }
    }
}

/// Terminal color for an indicator stroke color
pub fn stroke_color(color: LineColor) -> Color {
    Color::Rgb(color.r, color.g, color.b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_colors_distinct() {
        let phases = [
            RefreshPhase::Idle,
            RefreshPhase::Dragging(0.5),
            RefreshPhase::Armed,
            RefreshPhase::Refreshing,
        ];
        let colors: Vec<Color> = phases.iter().map(|p| PhaseStyle::color(*p)).collect();
        for (i, a) in colors.iter().enumerate() {
            for b in &colors[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_dragging_label_shows_percent() {
        assert_eq!(PhaseStyle::label(RefreshPhase::Dragging(0.25)), "pulling  25%");
    }

    #[test]
    fn test_stroke_color() {
        assert_eq!(stroke_color(LineColor::rgb(1, 2, 3)), Color::Rgb(1, 2, 3));
    }
}
