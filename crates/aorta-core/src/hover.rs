//! Per-frame hover label: which part each pointer is aiming at

use glam::Mat4;

use crate::raycast::Ray;
use crate::scene::Group;

/// Reports the part under the pointer rays
#[derive(Debug, Clone, Copy, Default)]
pub struct HoverReporter;

impl HoverReporter {
    /// Alias of the nearest part hit by the first ray that hits anything, in the
    /// given order; empty when no ray hits.
    pub fn report(&self, group: &Group, rays: &[Ray], parent_world: &Mat4) -> String {
        rays.iter()
            .find_map(|ray| group.nearest_hit(ray, parent_world))
            .and_then(|hit| group.mesh(hit.index))
            .map(|mesh| mesh.name.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::tests::box_mesh;
    use glam::Vec3;

    fn group() -> Group {
        let mut group = Group::new();
        group
            .install(vec![
                box_mesh("M1", Vec3::new(-1.0, -1.0, -1.0), Vec3::new(1.0, 1.0, 1.0)),
                box_mesh("M2", Vec3::new(4.0, -1.0, -1.0), Vec3::new(6.0, 1.0, 1.0)),
            ])
            .unwrap();
        group
    }

    fn toward(x: f32) -> Ray {
        Ray::new(Vec3::new(x, 0.2, 5.0), Vec3::NEG_Z)
    }

    fn nowhere() -> Ray {
        Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::Z)
    }

    #[test]
    fn test_first_ray_with_hit_wins() {
        let group = group();
        let reporter = HoverReporter;

        assert_eq!(reporter.report(&group, &[toward(0.3), nowhere()], &Mat4::IDENTITY), "M1");
        assert_eq!(reporter.report(&group, &[nowhere(), toward(5.3)], &Mat4::IDENTITY), "M2");
        // Fixed order: primary wins when both hit
        assert_eq!(reporter.report(&group, &[toward(5.3), toward(0.3)], &Mat4::IDENTITY), "M2");
    }

    #[test]
    fn test_no_hit_clears_label() {
        let group = group();
        assert_eq!(HoverReporter.report(&group, &[nowhere(), nowhere()], &Mat4::IDENTITY), "");
        assert_eq!(HoverReporter.report(&Group::new(), &[toward(0.3)], &Mat4::IDENTITY), "");
    }
}
