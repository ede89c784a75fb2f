//! Stand the loaded model upright and center it at eye height
//!
//! Segmentation exports are authored lying flat. Normalization rotates the group
//! upright, measures the combined world bounding box, and translates the group so
//! that the box center lands on a fixed anchor in front of the default viewpoint.
//! It runs exactly once per session, from the untransformed state.

use glam::{Mat4, Quat, Vec3};
use thiserror::Error;
use tracing::info;

use crate::scene::{Frame, Group};

/// Default anchor: 1.7 units up (eye height), 1 unit ahead of the viewer
pub const DEFAULT_ANCHOR: Vec3 = Vec3::new(0.0, 1.7, -1.0);

#[derive(Error, Debug, PartialEq)]
pub enum NormalizeError {
    #[error("Group is already normalized")]
    AlreadyNormalized,
    #[error("Group has {actual} of {expected} parts")]
    Incomplete { expected: usize, actual: usize },
    #[error("Group has no measurable geometry")]
    Empty,
    #[error("Group is attached to {0:?}, not the scene root")]
    Attached(Frame),
}

/// Upright rotation and anchor point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalizer {
    pub upright: Quat,
    pub anchor: Vec3,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self {
            upright: Quat::from_rotation_x(-std::f32::consts::FRAC_PI_2),
            anchor: DEFAULT_ANCHOR,
        }
    }
}

impl Normalizer {
    /// Upright rotation given in degrees about X
    pub fn new(upright_degrees_x: f32, anchor: Vec3) -> Self {
        Self {
            upright: Quat::from_rotation_x(upright_degrees_x.to_radians()),
            anchor,
        }
    }

    /// Normalize a fully loaded group.
    ///
    /// Returns the bounding-box center measured after the rotation and before the
    /// translation.
    pub fn normalize(&self, group: &mut Group, expected_parts: usize) -> Result<Vec3, NormalizeError> {
        if group.is_normalized() {
            return Err(NormalizeError::AlreadyNormalized);
        }
        if group.len() != expected_parts {
            return Err(NormalizeError::Incomplete {
                expected: expected_parts,
                actual: group.len(),
            });
        }
        if group.parent() != Frame::Scene {
            return Err(NormalizeError::Attached(group.parent()));
        }
        let original = group.transform;
        group.transform.rotation = self.upright * original.rotation;
        let Some(center) = group.bounding_box(&Mat4::IDENTITY).center() else {
            group.transform = original;
            return Err(NormalizeError::Empty);
        };

        group.transform.translation += self.anchor - center;
        group.mark_normalized();

        info!(
            parts = group.len(),
            center = ?center,
            anchor = ?self.anchor,
            "Normalized model group"
        );
        Ok(center)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::tests::box_mesh;

    fn lying_group() -> Group {
        let mut group = Group::new();
        group
            .install(vec![
                // Long axis along +Z, as exported lying flat
                box_mesh("a", Vec3::new(10.0, 0.0, 0.0), Vec3::new(12.0, 2.0, 8.0)),
                box_mesh("b", Vec3::new(11.0, 0.5, 8.0), Vec3::new(13.0, 1.5, 20.0)),
            ])
            .unwrap();
        group
    }

    #[test]
    fn test_normalize_centers_at_anchor() {
        let mut group = lying_group();
        Normalizer::default().normalize(&mut group, 2).unwrap();

        let aabb = group.bounding_box(&Mat4::IDENTITY);
        assert!(aabb.center().unwrap().abs_diff_eq(DEFAULT_ANCHOR, 1e-4));
        assert!(group.is_normalized());

        // Stood upright: the long axis now runs along +Y
        let size = aabb.size();
        assert!((size.y - 20.0).abs() < 1e-4);
        assert!((size.z - 2.0).abs() < 1e-4);

        let expected = Quat::from_rotation_x(-std::f32::consts::FRAC_PI_2);
        assert!(group.transform.rotation.abs_diff_eq(expected, 1e-6));
    }

    #[test]
    fn test_normalize_runs_once() {
        let mut group = lying_group();
        let normalizer = Normalizer::default();
        normalizer.normalize(&mut group, 2).unwrap();
        let transform = group.transform;

        assert_eq!(
            normalizer.normalize(&mut group, 2),
            Err(NormalizeError::AlreadyNormalized)
        );
        assert_eq!(group.transform, transform);
    }

    #[test]
    fn test_normalize_requires_all_parts() {
        let mut group = lying_group();
        assert_eq!(
            Normalizer::default().normalize(&mut group, 15),
            Err(NormalizeError::Incomplete {
                expected: 15,
                actual: 2
            })
        );
        assert!(!group.is_normalized());
        assert_eq!(group.transform, crate::transform::Transform::IDENTITY);
    }

    #[test]
    fn test_custom_anchor() {
        let mut group = lying_group();
        let anchor = Vec3::new(1.0, 1.2, -2.0);
        Normalizer::new(-90.0, anchor)
            .normalize(&mut group, 2)
            .unwrap();
        let center = group.bounding_box(&Mat4::IDENTITY).center().unwrap();
        assert!(center.abs_diff_eq(anchor, 1e-4));
    }
}
