//! Conversions between Bevy math types and the core's glam types
//!
//! Both sides are glam, but they are separate dependencies and may resolve to
//! different versions, so values cross over as plain arrays.

use aorta_core::parts::Rgb;
use aorta_core::transform::Pose;
use bevy::prelude::*;

pub fn to_bevy_vec3(v: aorta_core::glam::Vec3) -> Vec3 {
    Vec3::from_array(v.to_array())
}

pub fn to_core_vec3(v: Vec3) -> aorta_core::glam::Vec3 {
    aorta_core::glam::Vec3::from_array(v.to_array())
}

pub fn to_core_quat(q: Quat) -> aorta_core::glam::Quat {
    aorta_core::glam::Quat::from_array(q.to_array())
}

pub fn to_bevy_mat4(m: &aorta_core::glam::Mat4) -> Mat4 {
    Mat4::from_cols_array(&m.to_cols_array())
}

/// Pointer pose at a global transform, looking down its -Z axis
pub fn pose_from_global(transform: &GlobalTransform) -> Pose {
    let (_, rotation, translation) = transform.to_scale_rotation_translation();
    Pose::new(to_core_vec3(translation), to_core_quat(rotation))
}

/// Pointer pose along a world ray
pub fn pose_from_ray(ray: Ray3d) -> Pose {
    Pose::looking_along(to_core_vec3(ray.origin), to_core_vec3(*ray.direction))
}

/// Bevy transform for a core world matrix
pub fn transform_from_matrix(m: &aorta_core::glam::Mat4) -> Transform {
    Transform::from_matrix(to_bevy_mat4(m))
}

pub fn color(rgb: Rgb, alpha: f32) -> Color {
    Color::srgba(rgb.r, rgb.g, rgb.b, alpha)
}

pub fn emissive(rgb: Rgb) -> LinearRgba {
    LinearRgba::rgb(rgb.r, rgb.g, rgb.b)
}
