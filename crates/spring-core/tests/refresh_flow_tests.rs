//! Integration tests for the pull-to-refresh flow

use parking_lot::Mutex;
use spring_core::event::ControlEvent;
use spring_core::refresher::RefreshPhase;
use spring_core::render::Timeline;
use spring_core::scroll::{ScrollSurface, ScrollView};
use spring_core::{RefreshController, SpinnerStyle};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::TryRecvError;

fn setup(inset_top: f64) -> (Arc<Mutex<ScrollView>>, RefreshController<Timeline>) {
    let view = ScrollView::new(inset_top).shared();
    let mut controller = RefreshController::new(Timeline::new()).with_target(&view);
    controller.layout(320.0);
    controller.attach();
    (view, controller)
}

/// Advance the indicator's clock in small steps, forwarding completions
fn run_for(controller: &mut RefreshController<Timeline>, total: Duration) {
    let step = Duration::from_millis(10);
    let mut elapsed = Duration::ZERO;
    while elapsed < total {
        controller.indicator_mut().surface_mut().advance(step);
        controller.pump();
        elapsed += step;
    }
}

#[test]
fn test_arm_then_release_starts_refresh_once() {
    let (view, mut controller) = setup(0.0);
    let mut events = controller.subscribe();

    // -100 + (60 - 20) = -60 → ratio 1.0
    view.lock().drag_to(-100.0);
    controller.process_events();

    assert!(controller.is_refreshing());
    assert_eq!(controller.phase(), RefreshPhase::Armed);
    assert!(!controller.indicator().is_spinning());
    assert_eq!(view.lock().content_inset_top(), 0.0);
    assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));

    // Pulling further while still dragging changes nothing
    view.lock().drag_to(-140.0);
    controller.process_events();
    assert!(!controller.indicator().is_spinning());

    view.lock().release();
    controller.process_events();

    assert!(controller.indicator().is_spinning());
    assert_eq!(controller.phase(), RefreshPhase::Refreshing);
    assert_eq!(view.lock().content_inset_top(), 60.0);
    assert_eq!(events.try_recv().unwrap(), ControlEvent::ValueChanged);
    assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
    assert_eq!(controller.indicator().surface().pulses_played(), 1);

    // Offset compensated by the inset just applied; the control sits above it
    assert_eq!(view.lock().content_offset_y(), -200.0);
    assert_eq!(controller.frame().origin_y, -260.0);
    assert_eq!(controller.process_events(), 0);
    assert_eq!(controller.frame().origin_y, -260.0);

    // Later offset changes while spinning never re-arm
    while view.lock().settle(25.0) {
        controller.process_events();
    }
    assert_eq!(view.lock().content_offset_y(), -60.0);
    assert_eq!(view.lock().content_inset_top(), 60.0);
    assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
}

#[test]
fn test_release_before_threshold_does_not_refresh() {
    let (view, mut controller) = setup(0.0);

    view.lock().drag_to(-80.0);
    view.lock().release();
    controller.process_events();

    assert!(!controller.is_refreshing());
    assert!(!controller.indicator().is_spinning());
    assert_eq!(view.lock().content_inset_top(), 0.0);
}

#[test]
fn test_end_refreshing_waits_for_cycle() {
    let (view, mut controller) = setup(20.0);
    let mut events = controller.subscribe();

    controller.start_refreshing(false);
    assert_eq!(view.lock().content_inset_top(), 80.0);
    // Programmatic start does not notify observers
    assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));

    controller.end_refreshing();
    assert!(!controller.is_refreshing());
    assert_eq!(view.lock().content_inset_top(), 20.0);
    assert_eq!(view.lock().inset_animations(), 1);
    assert_eq!(events.try_recv().unwrap(), ControlEvent::RefreshEnded);

    // Contraction is allowed to finish
    assert!(controller.indicator().is_spinning());
    assert_eq!(controller.phase(), RefreshPhase::Refreshing);

    let style = SpinnerStyle::refresher();
    run_for(&mut controller, style.stroke_duration + Duration::from_millis(20));

    assert!(!controller.indicator().is_spinning());
    assert!(controller.indicator().active_arc().is_none());
    assert_eq!(controller.indicator().surface().arc_count(), 0);
}

#[test]
fn test_programmatic_start_positions_control_above_content() {
    let view = ScrollView::new(0.0).shared();
    let mut controller = RefreshController::new(Timeline::new()).with_target(&view);
    controller.layout(320.0);

    controller.start_refreshing(false);

    assert_eq!(view.lock().content_inset_top(), 60.0);
    assert_eq!(view.lock().content_offset_y(), -60.0);
    assert_eq!(controller.frame().origin_y, -120.0);
    assert!(controller.indicator().is_spinning());
}

#[test]
fn test_end_refreshing_without_extra_inset_skips_animation() {
    let (view, mut controller) = setup(0.0);

    controller.end_refreshing();

    assert_eq!(view.lock().inset_animations(), 0);
    assert!(!controller.indicator().is_spinning());
}

#[test]
fn test_pull_again_after_refresh_cycle() {
    let (view, mut controller) = setup(0.0);

    view.lock().drag_to(-100.0);
    view.lock().release();
    controller.process_events();
    assert!(controller.indicator().is_spinning());

    controller.end_refreshing();
    run_for(&mut controller, Duration::from_secs(1));
    assert!(!controller.indicator().is_spinning());

    while view.lock().settle(50.0) {}
    controller.process_events();
    assert_eq!(controller.phase(), RefreshPhase::Idle);

    view.lock().drag_to(-55.0);
    controller.process_events();
    // -55 + 40 = -15 → 0.25
    assert_eq!(controller.phase(), RefreshPhase::Dragging(0.25));
}

#[test]
fn test_spinner_keeps_cycling_while_refreshing() {
    let (_view, mut controller) = setup(0.0);
    controller.start_refreshing(true);

    let first = controller.indicator().cycle_token();
    run_for(&mut controller, Duration::from_secs(3));

    assert!(controller.indicator().is_spinning());
    assert!(controller.indicator().cycle_token() > first);
    assert_eq!(controller.indicator().surface().arc_count(), 1);
}

#[test]
fn test_progress_ratio_property() {
    let (view, mut controller) = setup(0.0);

    for step in 0..=40 {
        let y = -(step as f64) * 2.5;
        view.lock().drag_to(y);
        controller.process_events();

        let ratio = controller.drag_ratio();
        let snapshot = controller.indicator().surface().snapshot();
        if ratio <= 0.0 {
            assert!(snapshot.arc.is_none(), "no arc expected at y={y}");
        } else if ratio >= 1.0 {
            assert_eq!(snapshot.stroke.length(), 1.0);
        } else {
            assert!((snapshot.stroke.length() - ratio).abs() < 1e-12);
        }
    }
}

#[test]
fn test_teardown_stops_processing() {
    let (view, mut controller) = setup(0.0);

    view.lock().detach_from_hierarchy();
    view.lock().drag_to(-100.0);
    view.lock().release();
    controller.process_events();

    assert!(!controller.has_target());
    assert!(!controller.is_refreshing());

    view.lock().drag_to(-120.0);
    assert_eq!(controller.process_events(), 0);
    assert_eq!(controller.phase(), RefreshPhase::Idle);
}
