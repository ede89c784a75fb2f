//! Bevy application setup

use aorta_core::parts::PartCatalog;
use aorta_scene::{AortaScenePlugin, PendingLoad};
use anyhow::{Context, Result};
use bevy::prelude::*;
use bevy_egui::EguiPlugin;
use tracing::info;

use crate::config::Config;
use crate::loading;

/// Start the part loads in the background and run the viewer window
pub fn run(config: &Config, catalog: PartCatalog) -> Result<()> {
    let settings = config.session_settings(catalog.len());
    let pending = PendingLoad::default();

    let batch = loading::batch_loader(config)?;
    let runtime = loading::runtime()?;
    let loader_side = pending.clone();
    std::thread::Builder::new()
        .name("aorta-loader".to_string())
        .spawn(move || {
            let result = runtime.block_on(batch.load_all(&catalog.part));
            loader_side.deliver(result);
        })
        .context("Failed to start loader thread")?;

    info!(parts = settings.expected_parts, "Starting viewer");

    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "Aorta Viewer".to_string(),
                ..default()
            }),
            ..default()
        }))
        .add_plugins(EguiPlugin::default())
        .insert_resource(pending)
        .add_plugins(AortaScenePlugin { settings })
        .run();

    Ok(())
}
