//! Desktop pointer mapping
//!
//! The primary pointer is the mouse-cursor ray from the camera, the secondary
//! pointer is the camera's own gaze. Left mouse press/release select with the
//! primary pointer; `-` squeezes the primary (shrink) and `=` the secondary
//! (grow).

use aorta_core::interaction::{Hand, PointerEvent};
use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use bevy_egui::EguiContexts;

use crate::camera::MainCamera;
use crate::convert;
use crate::{ViewerSession, ViewerSet};

/// Plugin for pointer input
pub struct InputPlugin;

impl Plugin for InputPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            (update_pointer_poses, dispatch_pointer_events)
                .chain()
                .in_set(ViewerSet::Input),
        );
    }
}

/// Input events this frame, in dispatch order
pub fn pointer_events(
    mouse_button: &ButtonInput<MouseButton>,
    keyboard: &ButtonInput<KeyCode>,
    pointer_free: bool,
) -> Vec<(Hand, PointerEvent)> {
    let mut events = Vec::new();
    if mouse_button.just_pressed(MouseButton::Left) && pointer_free {
        events.push((Hand::Primary, PointerEvent::SelectStart));
    }
    // Releases always go through so a hold can't get stuck under the overlay
    if mouse_button.just_released(MouseButton::Left) {
        events.push((Hand::Primary, PointerEvent::SelectEnd));
    }
    if keyboard.just_pressed(KeyCode::Minus) {
        events.push((Hand::Primary, PointerEvent::Squeeze));
    }
    if keyboard.just_pressed(KeyCode::Equal) {
        events.push((Hand::Secondary, PointerEvent::Squeeze));
    }
    events
}

fn update_pointer_poses(
    windows: Query<&Window, With<PrimaryWindow>>,
    camera_query: Query<(&Camera, &GlobalTransform), With<MainCamera>>,
    mut session: ResMut<ViewerSession>,
) {
    let Ok((camera, camera_transform)) = camera_query.single() else {
        return;
    };

    session
        .0
        .set_pointer_pose(Hand::Secondary, convert::pose_from_global(camera_transform));

    // Outside the window the primary pointer keeps its last pose
    let Some(cursor) = windows.single().ok().and_then(Window::cursor_position) else {
        return;
    };
    if let Ok(ray) = camera.viewport_to_world(camera_transform, cursor) {
        session
            .0
            .set_pointer_pose(Hand::Primary, convert::pose_from_ray(ray));
    }
}

fn dispatch_pointer_events(
    mouse_button: Res<ButtonInput<MouseButton>>,
    keyboard: Res<ButtonInput<KeyCode>>,
    mut contexts: EguiContexts,
    mut session: ResMut<ViewerSession>,
) {
    let egui_wants_pointer = contexts
        .ctx_mut()
        .map(|ctx| ctx.wants_pointer_input())
        .unwrap_or(false);

    for (hand, event) in pointer_events(&mouse_button, &keyboard, !egui_wants_pointer) {
        session.0.handle(hand, event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mouse_and_keys_map_to_events() {
        let mut mouse = ButtonInput::<MouseButton>::default();
        let mut keys = ButtonInput::<KeyCode>::default();
        mouse.press(MouseButton::Left);
        keys.press(KeyCode::Equal);

        assert_eq!(
            pointer_events(&mouse, &keys, true),
            vec![
                (Hand::Primary, PointerEvent::SelectStart),
                (Hand::Secondary, PointerEvent::Squeeze),
            ]
        );

        mouse.clear();
        keys.clear();
        mouse.release(MouseButton::Left);
        keys.press(KeyCode::Minus);
        assert_eq!(
            pointer_events(&mouse, &keys, true),
            vec![
                (Hand::Primary, PointerEvent::SelectEnd),
                (Hand::Primary, PointerEvent::Squeeze),
            ]
        );
    }

    #[test]
    fn test_overlay_blocks_grab_but_not_release() {
        let mut mouse = ButtonInput::<MouseButton>::default();
        let keys = ButtonInput::<KeyCode>::default();
        mouse.press(MouseButton::Left);
        assert!(pointer_events(&mouse, &keys, false).is_empty());

        mouse.clear();
        mouse.release(MouseButton::Left);
        assert_eq!(
            pointer_events(&mouse, &keys, false),
            vec![(Hand::Primary, PointerEvent::SelectEnd)]
        );
    }
}
