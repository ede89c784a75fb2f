//! Aorta Scene - Bevy host for the aorta viewer
//!
//! The interaction model lives in `aorta-core`; this crate only feeds it.
//! Each frame the host:
//! - hands a finished batch load to the session and spawns one entity per part
//! - turns the mouse and camera into the two pointer poses and input events
//! - asks the session for the hover label
//! - copies mesh world matrices, visibility and highlight onto the entities

pub mod camera;
pub mod convert;
pub mod input;
pub mod models;
pub mod scene;
pub mod ui;

use aorta_core::session::{Session, SessionSettings};
use bevy::prelude::*;

pub use camera::{CameraSettings, MainCamera};
pub use models::{LoadStatus, PartEntity, PendingLoad};

/// The session driven by this app
#[derive(Resource)]
pub struct ViewerSession(pub Session);

/// Per-frame ordering of the viewer systems
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewerSet {
    /// Pick up finished loads
    Load,
    /// Pointer poses and input events
    Input,
    Camera,
    /// Push session state onto entities and labels
    Sync,
}

/// Plugin that sets up the viewer scene around a session
pub struct AortaScenePlugin {
    pub settings: SessionSettings,
}

impl Plugin for AortaScenePlugin {
    fn build(&self, app: &mut App) {
        let anchor = convert::to_bevy_vec3(self.settings.normalizer.anchor);

        app.insert_resource(ViewerSession(Session::new(self.settings)))
            .insert_resource(CameraSettings::facing(anchor))
            .configure_sets(
                Update,
                (ViewerSet::Load, ViewerSet::Input, ViewerSet::Camera, ViewerSet::Sync).chain(),
            )
            .add_plugins(camera::CameraPlugin)
            .add_plugins(scene::SceneSetupPlugin)
            .add_plugins(models::ModelsPlugin)
            .add_plugins(input::InputPlugin)
            .add_plugins(ui::UiPlugin);
    }
}
