//! Scene graph for the composite model
//!
//! The model is one `Group` holding a typed list of part `Mesh`es. The group has a
//! single local transform on top of each mesh's own transform, and is parented to
//! exactly one `Frame`: the scene root, or a pointer device while it is grabbed.
//! Frames are resolved to world matrices by the caller (see `Session::frame_world`),
//! which keeps this module free of any device or renderer state.

use glam::{Mat4, Vec3};
use thiserror::Error;
use tracing::debug;

use crate::bounds::Aabb;
use crate::interaction::Hand;
use crate::parts::{PartSpec, Rgb};
use crate::raycast::{intersect_triangle, Ray};
use crate::stl::Geometry;
use crate::transform::Transform;

#[derive(Error, Debug, PartialEq)]
pub enum SceneError {
    #[error("Group already holds {0} meshes")]
    AlreadyPopulated(usize),
    #[error("Cannot install an empty mesh list")]
    NoMeshes,
}

/// Coordinate frame a group can be parented to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Frame {
    /// Root scene frame (identity world matrix)
    Scene,
    /// Target-ray space of a pointer device
    Pointer(Hand),
}

/// PBR material parameters for a part
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub color: Rgb,
    pub opacity: f32,
    pub roughness: f32,
    pub metalness: f32,
    pub emissive: Rgb,
    pub double_sided: bool,
}

impl Material {
    /// Translucent, double-sided material used for every segment
    pub fn translucent(color: Rgb) -> Self {
        Self {
            color,
            opacity: 0.7,
            roughness: 0.7,
            metalness: 0.0,
            emissive: Rgb::BLACK,
            double_sided: true,
        }
    }
}

/// One loaded part
#[derive(Debug, Clone)]
pub struct Mesh {
    /// Part alias, reported by the hover label
    pub name: String,
    /// Human-readable part name
    pub display_name: String,
    pub geometry: Geometry,
    pub material: Material,
    pub visible: bool,
    pub transform: Transform,
    local_bounds: Aabb,
}

impl Mesh {
    pub fn new(name: &str, geometry: Geometry, material: Material) -> Self {
        let local_bounds = geometry.bounds();
        Self {
            name: name.to_string(),
            display_name: name.to_string(),
            geometry,
            material,
            visible: true,
            transform: Transform::IDENTITY,
            local_bounds,
        }
    }

    /// Mesh for a catalog part, uniformly scaled by `scale`
    pub fn from_part(spec: &PartSpec, geometry: Geometry, scale: f32) -> Self {
        let mut mesh = Self::new(&spec.alias, geometry, Material::translucent(spec.color));
        mesh.display_name = spec.name.clone();
        mesh.visible = spec.visible;
        mesh.transform = Transform::from_scale(Vec3::splat(scale));
        mesh
    }

    /// Bounds of the geometry in mesh space
    pub fn local_bounds(&self) -> Aabb {
        self.local_bounds
    }

    pub fn is_highlighted(&self) -> bool {
        self.material.emissive.b > 0.0
    }

    fn set_highlight(&mut self, on: bool) {
        self.material.emissive.b = if on { 1.0 } else { 0.0 };
    }

    /// Nearest hit of a world ray against this mesh placed at `world`
    pub fn intersect(&self, ray: &Ray, world: &Mat4) -> Option<f32> {
        if world.determinant().abs() <= f32::EPSILON * f32::EPSILON {
            return None;
        }
        // Work in mesh space; the ray parameter is preserved by the affine map
        let inverse = world.inverse();
        let origin = inverse.transform_point3(ray.origin);
        let direction = inverse.transform_vector3(ray.direction);

        self.local_bounds.ray_entry(origin, direction)?;

        self.geometry
            .triangles()
            .filter_map(|triangle| intersect_triangle(origin, direction, triangle))
            .min_by(|a, b| a.total_cmp(b))
    }
}

/// A ray hit on one of the group's meshes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    /// Index into `Group::meshes`
    pub index: usize,
    /// World distance from the ray origin
    pub distance: f32,
    pub point: Vec3,
}

/// Composite owner of all part meshes
#[derive(Debug, Clone)]
pub struct Group {
    meshes: Vec<Mesh>,
    pub transform: Transform,
    parent: Frame,
    squeeze: f32,
    normalized: bool,
}

impl Default for Group {
    fn default() -> Self {
        Self::new()
    }
}

impl Group {
    pub fn new() -> Self {
        Self {
            meshes: Vec::new(),
            transform: Transform::IDENTITY,
            parent: Frame::Scene,
            squeeze: 1.0,
            normalized: false,
        }
    }

    /// Populate an empty group. A group is populated at most once per session.
    pub fn install(&mut self, meshes: Vec<Mesh>) -> Result<(), SceneError> {
        if !self.meshes.is_empty() {
            return Err(SceneError::AlreadyPopulated(self.meshes.len()));
        }
        if meshes.is_empty() {
            return Err(SceneError::NoMeshes);
        }
        self.meshes = meshes;
        Ok(())
    }

    /// Drop all meshes and reset the transform
    pub fn clear(&mut self) {
        *self = Self::new();
    }

    pub fn meshes(&self) -> &[Mesh] {
        &self.meshes
    }

    pub fn mesh(&self, index: usize) -> Option<&Mesh> {
        self.meshes.get(index)
    }

    pub fn find(&self, alias: &str) -> Option<&Mesh> {
        self.meshes.iter().find(|m| m.name == alias)
    }

    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    pub fn parent(&self) -> Frame {
        self.parent
    }

    pub fn is_normalized(&self) -> bool {
        self.normalized
    }

    pub(crate) fn mark_normalized(&mut self) {
        self.normalized = true;
    }

    /// Product of every squeeze factor applied so far
    pub fn squeeze_factor(&self) -> f32 {
        self.squeeze
    }

    pub fn world_matrix(&self, parent_world: &Mat4) -> Mat4 {
        *parent_world * self.transform.to_matrix()
    }

    pub fn mesh_world_matrix(&self, index: usize, parent_world: &Mat4) -> Option<Mat4> {
        let mesh = self.meshes.get(index)?;
        Some(self.world_matrix(parent_world) * mesh.transform.to_matrix())
    }

    /// World-space box around every mesh, hidden ones included
    pub fn bounding_box(&self, parent_world: &Mat4) -> Aabb {
        let group_world = self.world_matrix(parent_world);
        self.meshes.iter().fold(Aabb::EMPTY, |aabb, mesh| {
            let world = group_world * mesh.transform.to_matrix();
            aabb.merge(&mesh.local_bounds.transformed(&world))
        })
    }

    /// Hits against the direct children, nearest first. Visibility does not affect picking.
    pub fn intersect(&self, ray: &Ray, parent_world: &Mat4) -> Vec<Hit> {
        let group_world = self.world_matrix(parent_world);
        let mut hits: Vec<Hit> = self
            .meshes
            .iter()
            .enumerate()
            .filter_map(|(index, mesh)| {
                let world = group_world * mesh.transform.to_matrix();
                mesh.intersect(ray, &world).map(|distance| Hit {
                    index,
                    distance,
                    point: ray.at(distance),
                })
            })
            .collect();
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits
    }

    pub fn nearest_hit(&self, ray: &Ray, parent_world: &Mat4) -> Option<Hit> {
        self.intersect(ray, parent_world).into_iter().next()
    }

    /// Reparent under `frame` while keeping the current world pose.
    ///
    /// `parent_world` is the world matrix of the current parent, `frame_world` the
    /// world matrix of the new one. The new local transform is
    /// `inverse(frame_world) * parent_world * local`.
    pub fn attach_to(&mut self, frame: Frame, parent_world: &Mat4, frame_world: &Mat4) {
        let world = self.world_matrix(parent_world);
        self.transform = Transform::from_matrix(frame_world.inverse() * world);
        self.parent = frame;
    }

    /// Reparent under the scene root, keeping the apparent pose.
    ///
    /// The current world matrix (`parent_world * local`) is decomposed into world
    /// position, rotation and scale, and those are applied directly as the new local
    /// transform, since the root frame is the identity.
    pub fn detach_and_preserve_world_pose(&mut self, parent_world: &Mat4) {
        let world = self.world_matrix(parent_world);
        self.transform = Transform::from_matrix(world);
        self.parent = Frame::Scene;
    }

    /// Apply or clear the highlight tint on every mesh
    pub fn set_highlight(&mut self, on: bool) {
        for mesh in &mut self.meshes {
            mesh.set_highlight(on);
        }
    }

    pub fn is_highlighted(&self) -> bool {
        self.meshes.iter().any(Mesh::is_highlighted)
    }

    /// Multiply every mesh's local scale by `factor`, keeping the world
    /// bounding-box center fixed. Returns that center, or `None` for an empty group.
    pub fn scale_about_center(&mut self, factor: f32, parent_world: &Mat4) -> Option<Vec3> {
        let before = self.bounding_box(parent_world).center()?;

        for mesh in &mut self.meshes {
            mesh.transform.scale *= factor;
        }
        self.squeeze *= factor;

        if let Some(after) = self.bounding_box(parent_world).center() {
            // Shift is measured in world space; express it in the parent frame
            let shift = parent_world.inverse().transform_vector3(before - after);
            self.transform.translation += shift;
        }

        debug!(factor, total = self.squeeze, "Scaled group about its center");
        Some(before)
    }

    /// Show or hide a part by alias. Returns false when no such part exists.
    pub fn set_visible(&mut self, alias: &str, visible: bool) -> bool {
        match self.meshes.iter_mut().find(|m| m.name == alias) {
            Some(mesh) => {
                mesh.visible = visible;
                true
            }
            None => false,
        }
    }
}
