//! Overlay: status line, hover label and part visibility

use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts, EguiPrimaryContextPass};

use crate::models::LoadStatus;
use crate::{ViewerSession, ViewerSet};

pub struct UiPlugin;

impl Plugin for UiPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, update_hover_label.in_set(ViewerSet::Sync))
            // Overlay runs in EguiPrimaryContextPass for proper input handling (bevy_egui 0.38+)
            .add_systems(EguiPrimaryContextPass, ui_system);
    }
}

fn update_hover_label(mut session: ResMut<ViewerSession>) {
    session.0.tick();
}

/// Status line text and color
pub fn status_line(status: &LoadStatus) -> (String, egui::Color32) {
    match status {
        LoadStatus::Loading => ("Loading model...".to_string(), egui::Color32::YELLOW),
        LoadStatus::Ready { parts } => (format!("{} parts loaded", parts), egui::Color32::GREEN),
        LoadStatus::Failed(e) => (e.clone(), egui::Color32::RED),
    }
}

fn ui_system(mut contexts: EguiContexts, mut session: ResMut<ViewerSession>, status: Res<LoadStatus>) {
    let Ok(ctx) = contexts.ctx_mut() else { return };

    let (status_text, status_color) = status_line(&status);
    let parts: Vec<(String, String, bool)> = session
        .0
        .group()
        .meshes()
        .iter()
        .map(|mesh| (mesh.name.clone(), mesh.display_name.clone(), mesh.visible))
        .collect();
    let squeeze = session.0.group().squeeze_factor();
    let label = session.0.label().to_string();

    let mut toggled = Vec::new();

    egui::Window::new("Aorta")
        .anchor(egui::Align2::LEFT_TOP, [10.0, 10.0])
        .resizable(false)
        .show(ctx, |ui| {
            ui.colored_label(status_color, status_text);

            // Hover label
            let hover = if label.is_empty() { "-" } else { label.as_str() };
            ui.heading(egui::RichText::new(hover).size(20.0));

            ui.separator();
            ui.label(format!("Scale: {:.3}", squeeze));
            ui.label(
                egui::RichText::new("Click to grab, drag to orbit, right drag to pan\n- shrink, = grow")
                    .small()
                    .color(egui::Color32::GRAY),
            );

            if !parts.is_empty() {
                ui.collapsing("Parts", |ui| {
                    for (alias, name, visible) in &parts {
                        let mut checked = *visible;
                        let text = format!("{} ({})", alias, name);
                        if ui.checkbox(&mut checked, text).changed() {
                            toggled.push((alias.clone(), checked));
                        }
                    }
                });
            }
        });

    for (alias, visible) in toggled {
        session.0.set_part_visible(&alias, visible);
    }
}
