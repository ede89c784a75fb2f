//! Local transforms and pointer poses

use glam::{Mat4, Quat, Vec3};

use crate::raycast::Ray;

/// Translation, rotation and scale relative to a parent frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::IDENTITY
        }
    }

    pub fn from_scale(scale: Vec3) -> Self {
        Self {
            scale,
            ..Self::IDENTITY
        }
    }

    /// Compose as `T * R * S`
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }

    /// Decompose an affine matrix into translation, rotation and scale.
    ///
    /// Exact for matrices built from positive scale, rotation and translation;
    /// shear introduced by non-uniform scale under rotation is discarded.
    pub fn from_matrix(matrix: Mat4) -> Self {
        let (scale, rotation, translation) = matrix.to_scale_rotation_translation();
        Self {
            translation,
            rotation: rotation.normalize(),
            scale,
        }
    }
}

/// World pose of a pointer device
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        }
    }
}

impl Pose {
    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    /// Pose at `position` whose pointing direction (-Z) is `direction`
    pub fn looking_along(position: Vec3, direction: Vec3) -> Self {
        let direction = direction.normalize_or(Vec3::NEG_Z);
        Self {
            position,
            rotation: Quat::from_rotation_arc(Vec3::NEG_Z, direction),
        }
    }

    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.rotation, self.position)
    }

    /// Pointing direction, the pose's local -Z
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    /// Target ray of the device
    pub fn ray(&self) -> Ray {
        Ray::new(self.position, self.forward())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_matrix_decomposition() {
        let transform = Transform {
            translation: Vec3::new(1.0, -2.0, 3.5),
            rotation: Quat::from_rotation_y(0.7) * Quat::from_rotation_x(-FRAC_PI_2),
            scale: Vec3::splat(0.002),
        };

        let decomposed = Transform::from_matrix(transform.to_matrix());
        assert!(decomposed.translation.abs_diff_eq(transform.translation, 1e-5));
        assert!(decomposed.scale.abs_diff_eq(transform.scale, 1e-7));
        assert!(decomposed.rotation.abs_diff_eq(transform.rotation, 1e-5)
            || decomposed.rotation.abs_diff_eq(-transform.rotation, 1e-5));
    }

    #[test]
    fn test_pose_forward() {
        let pose = Pose::new(Vec3::ZERO, Quat::IDENTITY);
        assert!(pose.forward().abs_diff_eq(Vec3::NEG_Z, 1e-6));

        let pose = Pose::looking_along(Vec3::new(0.0, 1.0, 0.0), Vec3::new(1.0, 0.0, 0.0));
        assert!(pose.forward().abs_diff_eq(Vec3::X, 1e-5));
        assert_eq!(pose.ray().origin, Vec3::new(0.0, 1.0, 0.0));
    }
}
