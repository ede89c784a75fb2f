//! Camera controls and orbit navigation

use bevy::input::mouse::{MouseMotion, MouseWheel};
use bevy::prelude::*;
use bevy_egui::EguiContexts;

use crate::{ViewerSession, ViewerSet};

/// Camera controller settings
#[derive(Debug, Clone, Resource)]
pub struct CameraSettings {
    pub distance: f32,
    pub target_distance: f32,
    pub azimuth: f32,
    pub elevation: f32,
    pub target: Vec3,
    pub target_focus: Vec3,
    pub sensitivity: f32,
    pub zoom_speed: f32,
    pub smooth_factor: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            distance: 1.0,
            target_distance: 1.0,
            azimuth: 0.0,
            elevation: 0.0,
            target: Vec3::ZERO,
            target_focus: Vec3::ZERO,
            sensitivity: 0.005,
            zoom_speed: 0.1,
            smooth_factor: 0.15,
        }
    }
}

impl CameraSettings {
    /// Orbit around `anchor`, starting one unit behind it at the same height
    pub fn facing(anchor: Vec3) -> Self {
        Self {
            target: anchor,
            target_focus: anchor,
            ..default()
        }
    }

    /// Camera position for the current orbit (Y up)
    pub fn eye(&self) -> Vec3 {
        orbit_offset(self.distance, self.azimuth, self.elevation) + self.target
    }
}

fn orbit_offset(distance: f32, azimuth: f32, elevation: f32) -> Vec3 {
    Vec3::new(
        distance * azimuth.sin() * elevation.cos(),
        distance * elevation.sin(),
        distance * azimuth.cos() * elevation.cos(),
    )
}

/// Marker component for the main camera
#[derive(Component)]
pub struct MainCamera;

/// Plugin for camera controls
pub struct CameraPlugin;

impl Plugin for CameraPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<CameraSettings>()
            .add_systems(Startup, spawn_camera)
            .add_systems(Update, update_camera.in_set(ViewerSet::Camera));
    }
}

fn spawn_camera(mut commands: Commands, settings: Res<CameraSettings>) {
    commands.spawn((
        Camera3d::default(),
        Projection::Perspective(PerspectiveProjection {
            near: 0.01,
            far: 100.0,
            ..default()
        }),
        Transform::from_translation(settings.eye()).looking_at(settings.target, Vec3::Y),
        MainCamera,
    ));
}

fn update_camera(
    mut camera_query: Query<&mut Transform, With<MainCamera>>,
    mut settings: ResMut<CameraSettings>,
    mut mouse_motion: MessageReader<MouseMotion>,
    mut mouse_wheel: MessageReader<MouseWheel>,
    mouse_button: Res<ButtonInput<MouseButton>>,
    session: Res<ViewerSession>,
    time: Res<Time>,
    mut contexts: EguiContexts,
) {
    // Don't steer the camera while the overlay has the pointer
    let egui_wants_pointer = contexts
        .ctx_mut()
        .map(|ctx| ctx.wants_pointer_input())
        .unwrap_or(false);

    let total_motion: Vec2 = mouse_motion.read().map(|motion| motion.delta).sum();

    // Left drag moves the held model instead of the camera
    let holding = session.0.controller().holder().is_some();
    if mouse_button.pressed(MouseButton::Left) && !egui_wants_pointer && !holding {
        settings.azimuth -= total_motion.x * settings.sensitivity;
        settings.elevation = (settings.elevation + total_motion.y * settings.sensitivity)
            .clamp(-1.5, 1.5);
    }

    // Pan in the camera's view plane
    if mouse_button.pressed(MouseButton::Right) && !egui_wants_pointer {
        let right = Vec3::new(settings.azimuth.cos(), 0.0, -settings.azimuth.sin());
        let pan_speed = settings.distance * 0.002;
        settings.target_focus -= right * total_motion.x * pan_speed;
        settings.target_focus += Vec3::Y * total_motion.y * pan_speed;
    }

    // Always drain the wheel so queued scrolls don't jump the zoom later
    let scroll: f32 = mouse_wheel.read().map(|scroll| scroll.y).sum();
    if !egui_wants_pointer && scroll != 0.0 {
        let zoom_factor = 1.0 - scroll * settings.zoom_speed * 0.3;
        settings.target_distance = (settings.target_distance * zoom_factor).clamp(0.1, 10.0);
    }

    // Smooth interpolation for zoom and target
    let dt = time.delta_secs();
    let lerp_factor = 1.0 - (-settings.smooth_factor * 60.0 * dt).exp();
    settings.distance += (settings.target_distance - settings.distance) * lerp_factor;
    settings.target = settings.target + (settings.target_focus - settings.target) * lerp_factor;

    if let Ok(mut transform) = camera_query.single_mut() {
        transform.translation = settings.eye();
        transform.look_at(settings.target, Vec3::Y);
    }
}
