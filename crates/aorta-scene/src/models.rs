//! Part entities: spawning loaded parts and keeping them in step with the session

use aorta_core::load::LoadError;
use aorta_core::scene::{Material as PartMaterial, Mesh as PartMesh};
use aorta_core::session::LoadOutcome;
use aorta_core::stl::Geometry;
use bevy::asset::RenderAssetUsages;
use bevy::mesh::PrimitiveTopology;
use bevy::prelude::*;
use std::sync::{Arc, Mutex, PoisonError, TryLockError};

use crate::convert;
use crate::{ViewerSession, ViewerSet};

type LoadResult = Result<Vec<PartMesh>, LoadError>;

/// Slot the background loader fills with the batch result
#[derive(Resource, Default, Clone)]
pub struct PendingLoad {
    pub result: Arc<Mutex<Option<LoadResult>>>,
}

impl PendingLoad {
    /// Called from the loader side. A poisoned slot is recovered; it only ever holds
    /// a whole result.
    pub fn deliver(&self, result: LoadResult) {
        let mut slot = self.result.lock().unwrap_or_else(PoisonError::into_inner);
        *slot = Some(result);
    }

    /// Non-blocking; `None` while the load is still running
    pub fn take(&self) -> Option<LoadResult> {
        match self.result.try_lock() {
            Ok(mut slot) => slot.take(),
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner().take(),
            Err(TryLockError::WouldBlock) => None,
        }
    }
}

/// What the status line shows
#[derive(Resource, Debug, Clone, Default, PartialEq)]
pub enum LoadStatus {
    #[default]
    Loading,
    Ready { parts: usize },
    Failed(String),
}

/// Entity rendering one part; `index` is the part's position in the group
#[derive(Component, Debug, Clone, Copy)]
pub struct PartEntity {
    pub index: usize,
}

/// Plugin for part loading and syncing
pub struct ModelsPlugin;

impl Plugin for ModelsPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PendingLoad>()
            .init_resource::<LoadStatus>()
            .add_systems(Update, receive_parts.in_set(ViewerSet::Load))
            .add_systems(Update, sync_parts.in_set(ViewerSet::Sync))
            .add_systems(Last, unmount_on_exit);
    }
}

/// Bevy mesh for decoded part geometry
pub fn part_mesh(geometry: &Geometry) -> Mesh {
    let positions: Vec<[f32; 3]> = geometry.positions.iter().map(|p| p.to_array()).collect();
    let normals: Vec<[f32; 3]> = geometry.normals.iter().map(|n| n.to_array()).collect();
    Mesh::new(PrimitiveTopology::TriangleList, RenderAssetUsages::default())
        .with_inserted_attribute(Mesh::ATTRIBUTE_POSITION, positions)
        .with_inserted_attribute(Mesh::ATTRIBUTE_NORMAL, normals)
}

/// Translucent, double-sided material for a part
pub fn part_material(material: &PartMaterial) -> StandardMaterial {
    StandardMaterial {
        base_color: convert::color(material.color, material.opacity),
        emissive: convert::emissive(material.emissive),
        perceptual_roughness: material.roughness,
        metallic: material.metalness,
        alpha_mode: if material.opacity < 1.0 {
            AlphaMode::Blend
        } else {
            AlphaMode::Opaque
        },
        double_sided: material.double_sided,
        cull_mode: if material.double_sided {
            None
        } else {
            Some(bevy::render::render_resource::Face::Back)
        },
        ..default()
    }
}

fn visibility(visible: bool) -> Visibility {
    if visible {
        Visibility::Inherited
    } else {
        Visibility::Hidden
    }
}

fn receive_parts(
    mut commands: Commands,
    pending: Res<PendingLoad>,
    mut session: ResMut<ViewerSession>,
    mut status: ResMut<LoadStatus>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let Some(result) = pending.take() else { return };

    match session.0.complete_load(result) {
        LoadOutcome::Ready { parts } => {
            for (index, part) in session.0.group().meshes().iter().enumerate() {
                let Some(world) = session.0.mesh_world_matrix(index) else {
                    continue;
                };
                commands.spawn((
                    Mesh3d(meshes.add(part_mesh(&part.geometry))),
                    MeshMaterial3d(materials.add(part_material(&part.material))),
                    convert::transform_from_matrix(&world),
                    visibility(part.visible),
                    PartEntity { index },
                    Name::new(part.name.clone()),
                ));
            }
            *status = LoadStatus::Ready { parts };
        }
        LoadOutcome::Failed(e) => *status = LoadStatus::Failed(e.to_string()),
        LoadOutcome::Rejected(e) => *status = LoadStatus::Failed(e.to_string()),
        LoadOutcome::Discarded => {}
    }
}

fn sync_parts(
    session: Res<ViewerSession>,
    mut parts: Query<(
        &PartEntity,
        &mut Transform,
        &mut Visibility,
        &MeshMaterial3d<StandardMaterial>,
    )>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    for (part, mut transform, mut vis, material) in &mut parts {
        let Some(mesh) = session.0.group().mesh(part.index) else {
            continue;
        };
        if let Some(world) = session.0.mesh_world_matrix(part.index) {
            *transform = convert::transform_from_matrix(&world);
        }
        vis.set_if_neq(visibility(mesh.visible));

        let emissive = convert::emissive(mesh.material.emissive);
        let stale = materials
            .get(&material.0)
            .is_some_and(|current| current.emissive != emissive);
        if stale {
            if let Some(current) = materials.get_mut(&material.0) {
                current.emissive = emissive;
            }
        }
    }
}

fn unmount_on_exit(mut exits: MessageReader<AppExit>, mut session: ResMut<ViewerSession>) {
    if exits.read().next().is_some() {
        session.0.unmount();
    }
}
