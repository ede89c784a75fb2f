//! Headless inspection: load, normalize and list the model without a window

use aorta_core::parts::PartCatalog;
use aorta_core::session::{LoadOutcome, Session};
use anyhow::{anyhow, Result};

use crate::config::Config;
use crate::loading;

/// One line per part followed by the normalized bounds
pub fn report(config: &Config, catalog: &PartCatalog) -> Result<Vec<String>> {
    let result = loading::load_blocking(config, catalog)?;
    let mut session = Session::new(config.session_settings(catalog.len()));

    match session.complete_load(result) {
        LoadOutcome::Ready { .. } => {}
        LoadOutcome::Failed(e) => return Err(anyhow::Error::new(e)),
        LoadOutcome::Rejected(e) => return Err(anyhow::Error::new(e).context("Model rejected")),
        LoadOutcome::Discarded => return Err(anyhow!("Model load discarded")),
    }

    let group = session.group();
    let mut lines: Vec<String> = group
        .meshes()
        .iter()
        .map(|mesh| {
            format!(
                "{:<8} {:<30} {:>8} triangles  {}",
                mesh.name,
                mesh.display_name,
                mesh.geometry.triangle_count(),
                if mesh.visible { "visible" } else { "hidden" }
            )
        })
        .collect();

    let aabb = group.bounding_box(&session.parent_world());
    let center = aabb.center().unwrap_or_default();
    let size = aabb.size();
    lines.push(format!(
        "bounds center [{:.3}, {:.3}, {:.3}] size [{:.3}, {:.3}, {:.3}]",
        center.x, center.y, center.z, size.x, size.y, size.z
    ));
    Ok(lines)
}

pub fn run(config: &Config, catalog: &PartCatalog) -> Result<()> {
    for line in report(config, catalog)? {
        println!("{}", line);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use aorta_core::glam::Vec3;
    use aorta_core::stl::Geometry;
    use std::path::Path;
    use tempfile::TempDir;

    /// Closed box as binary STL
    fn box_stl(min: Vec3, max: Vec3) -> Vec<u8> {
        let c = |x: bool, y: bool, z: bool| {
            Vec3::new(
                if x { max.x } else { min.x },
                if y { max.y } else { min.y },
                if z { max.z } else { min.z },
            )
        };
        let quads = [
            [c(false, false, false), c(true, false, false), c(true, true, false), c(false, true, false)],
            [c(false, false, true), c(true, false, true), c(true, true, true), c(false, true, true)],
            [c(false, false, false), c(true, false, false), c(true, false, true), c(false, false, true)],
            [c(false, true, false), c(true, true, false), c(true, true, true), c(false, true, true)],
            [c(false, false, false), c(false, true, false), c(false, true, true), c(false, false, true)],
            [c(true, false, false), c(true, true, false), c(true, true, true), c(true, false, true)],
        ];
        Geometry::from_triangles(
            quads
                .iter()
                .flat_map(|[a, b, c, d]| [[*a, *b, *c], [*a, *c, *d]]),
        )
        .to_binary_stl()
    }

    fn write_parts(dir: &Path, catalog: &PartCatalog) {
        for (i, spec) in catalog.part.iter().enumerate() {
            let z = i as f32 * 40.0;
            let bytes = box_stl(Vec3::new(-15.0, -15.0, z), Vec3::new(15.0, 15.0, z + 40.0));
            std::fs::write(dir.join(&spec.resource), bytes).unwrap();
        }
    }

    fn config_for(dir: &Path) -> Config {
        let mut config = Config::default();
        config.assets.base = dir.display().to_string();
        config
    }

    #[test]
    fn test_report_lists_every_part() {
        let temp_dir = TempDir::new().unwrap();
        let catalog = PartCatalog::aorta();
        write_parts(temp_dir.path(), &catalog);

        let lines = report(&config_for(temp_dir.path()), &catalog).unwrap();
        assert_eq!(lines.len(), 16);
        assert!(lines[0].starts_with("AoRoot"));
        assert!(lines[0].contains("12 triangles"));
        assert!(lines[14].starts_with("LCIA"));
        // 600 mm at 0.002, stood upright and centered at the anchor
        assert_eq!(
            lines[15],
            "bounds center [0.000, 1.700, -1.000] size [0.060, 1.200, 0.060]"
        );
    }

    #[test]
    fn test_missing_part_fails() {
        let temp_dir = TempDir::new().unwrap();
        let catalog = PartCatalog::aorta();
        write_parts(temp_dir.path(), &catalog);
        std::fs::remove_file(temp_dir.path().join(&catalog.part[7].resource)).unwrap();

        let err = report(&config_for(temp_dir.path()), &catalog).unwrap_err();
        assert!(err.to_string().contains("Abdominal aorta"));
    }
}
