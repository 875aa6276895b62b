use std::time::Instant;

use super::ViewerState;
use super::super::overlays::RectPx;
use glam::Vec3;
use orbis_scene::{FlyTo, ScreenRect, pick, pointer_ndc};
use winit::event::MouseScrollDelta;

/// Zoom factor applied per scroll line; pixel deltas are converted to line
/// equivalents first.
const ZOOM_STEP: f32 = 0.95;
const PIXELS_PER_LINE: f32 = 40.0;

/// Where a press landed, checked in priority order: the popup's close
/// control, the popup body (which swallows the press), then the scene.
#[derive(Debug, PartialEq, Eq)]
enum PressTarget {
    CloseControl,
    PopupBody,
    Scene,
}

fn classify_press(
    popup_visible: bool,
    close_rect: RectPx,
    popup_rect: RectPx,
    x: f32,
    y: f32,
) -> PressTarget {
    if popup_visible {
        if close_rect.contains(x, y) {
            return PressTarget::CloseControl;
        }
        if popup_rect.contains(x, y) {
            return PressTarget::PopupBody;
        }
    }
    PressTarget::Scene
}

/// Route a press: the popup's close control wins, the popup body consumes
/// the press, then marker picking, and only a miss starts an orbit drag.
pub(super) fn handle_pointer_pressed(state: &mut ViewerState) {
    let Some((x, y)) = state.cursor else {
        return;
    };
    let now = Instant::now();

    match classify_press(
        state.popup.visible(),
        state.label.close_rect(),
        state.label.rect(),
        x,
        y,
    ) {
        PressTarget::CloseControl => {
            state.popup.close();
            return;
        }
        PressTarget::PopupBody => return,
        PressTarget::Scene => {}
    }

    let rect = ScreenRect {
        left: 0.0,
        top: 0.0,
        width: state.size.width.max(1) as f32,
        height: state.size.height.max(1) as f32,
    };
    let ndc = pointer_ndc(x, y, rect);

    if let Some(hit) = pick(
        ndc,
        state.view_proj.inverse(),
        state.registry.instance_transforms(),
    ) {
        match state.registry.resolve_instance(hit.instance) {
            Ok(marker) => {
                log::info!("picked marker {:?} at distance {:.2}", marker.id, hit.distance);
                state.popup.show(&marker.id, now);
                state.label.set_marker(marker, state.preset.show_country);
                if state.preset.fly_to_enabled {
                    let eye = current_eye(state, now);
                    state.fly_to = Some(FlyTo::start(
                        eye,
                        marker.position,
                        state.orbit.target(),
                        now,
                    ));
                }
            }
            Err(err) => log::warn!("pick hit unresolvable instance: {err}"),
        }
        return;
    }

    state.dragging = true;
}

pub(super) fn handle_pointer_released(state: &mut ViewerState) {
    state.dragging = false;
}

pub(super) fn handle_pointer_moved(state: &mut ViewerState, x: f32, y: f32) {
    if state.dragging {
        if let Some((last_x, last_y)) = state.cursor {
            state.orbit.apply_drag(x - last_x, y - last_y);
        }
    }
    state.cursor = Some((x, y));

    let inside_popup = state.popup.visible() && state.label.rect().contains(x, y);
    state.popup.pointer_moved(inside_popup, Instant::now());
}

pub(super) fn handle_scroll(state: &mut ViewerState, delta: MouseScrollDelta) {
    if !state.preset.enable_zoom {
        return;
    }
    let lines = match delta {
        MouseScrollDelta::LineDelta(_, y) => y,
        MouseScrollDelta::PixelDelta(position) => position.y as f32 / PIXELS_PER_LINE,
    };
    state.orbit.zoom_by(ZOOM_STEP.powf(lines));
}

/// The eye position a new fly-to should depart from. A running animation is
/// superseded mid-flight, so departure is its current sample rather than the
/// orbit's resting eye.
fn current_eye(state: &ViewerState, now: Instant) -> Vec3 {
    match state.fly_to.as_ref() {
        Some(fly) => fly.sample(now),
        None => state.orbit.eye(),
    }
}

#[cfg(test)]
mod press_routing_tests {
    use super::*;

    const POPUP: RectPx = RectPx {
        x: 400.0,
        y: 200.0,
        width: 230.0,
        height: 72.0,
    };
    const CLOSE: RectPx = RectPx {
        x: 600.0,
        y: 206.0,
        width: 16.0,
        height: 16.0,
    };

    #[test]
    fn close_control_wins_over_the_popup_body() {
        let target = classify_press(true, CLOSE, POPUP, 605.0, 210.0);
        assert_eq!(target, PressTarget::CloseControl);
    }

    #[test]
    fn popup_body_consumes_the_press() {
        let target = classify_press(true, CLOSE, POPUP, 450.0, 230.0);
        assert_eq!(
            target,
            PressTarget::PopupBody,
            "a press through the popup must not reach the scene"
        );
    }

    #[test]
    fn presses_outside_the_popup_reach_the_scene() {
        assert_eq!(classify_press(true, CLOSE, POPUP, 100.0, 100.0), PressTarget::Scene);
    }

    #[test]
    fn hidden_popup_never_consumes_presses() {
        assert_eq!(classify_press(false, CLOSE, POPUP, 450.0, 230.0), PressTarget::Scene);
        assert_eq!(classify_press(false, CLOSE, POPUP, 605.0, 210.0), PressTarget::Scene);
    }
}
