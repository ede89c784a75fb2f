//! All-or-nothing loading of a whole part catalog

use aorta_core::load::LoadError;
use aorta_core::parts::PartSpec;
use aorta_core::scene::Mesh;
use futures_util::future::try_join_all;
use std::time::Instant;
use tracing::{error, info};

use crate::loader::MeshLoader;
use crate::source::MeshSource;

/// Runs one `MeshLoader::load_part` per spec, concurrently
#[derive(Debug)]
pub struct BatchLoader<S> {
    loader: MeshLoader<S>,
}

impl<S: MeshSource> BatchLoader<S> {
    pub fn new(loader: MeshLoader<S>) -> Self {
        Self { loader }
    }

    pub fn loader(&self) -> &MeshLoader<S> {
        &self.loader
    }

    /// Load every part.
    ///
    /// All loads start at once on the calling task. The result holds exactly one
    /// mesh per spec in spec order, whatever order the loads finish in. The first
    /// failure is returned as soon as it happens and the loads still in flight are
    /// dropped; partial results are never returned.
    pub async fn load_all(&self, specs: &[PartSpec]) -> Result<Vec<Mesh>, LoadError> {
        let started = Instant::now();
        info!(parts = specs.len(), "Loading model parts");

        let loads = specs.iter().map(|spec| self.loader.load_part(spec));
        match try_join_all(loads).await {
            Ok(meshes) => {
                info!(
                    parts = meshes.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "All parts loaded"
                );
                Ok(meshes)
            }
            Err(e) => {
                error!(part = %e.part, error = %e, "Model load abandoned");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::tests::{spec, triangle_stl, MemorySource};
    use aorta_core::load::LoadCause;
    use std::sync::atomic::Ordering;

    fn specs(count: usize) -> Vec<PartSpec> {
        (0..count)
            .map(|i| spec(&format!("part_{i}.stl"), &format!("Part {i}")))
            .collect()
    }

    fn source_for(count: usize) -> MemorySource {
        (0..count).fold(MemorySource::default(), |source, i| {
            source.with(&format!("part_{i}.stl"), triangle_stl(i as f32))
        })
    }

    #[tokio::test]
    async fn test_output_in_spec_order() {
        // Earlier parts finish last
        let source = (0..5).fold(source_for(5), |source, i| {
            source.delayed(&format!("part_{i}.stl"), (5 - i as u64) * 20)
        });
        let batch = BatchLoader::new(MeshLoader::new(source).with_scale(1.0));

        let meshes = batch.load_all(&specs(5)).await.unwrap();
        assert_eq!(meshes.len(), 5);
        for (i, mesh) in meshes.iter().enumerate() {
            assert_eq!(mesh.name, format!("Part {i}"));
            let min_x = mesh.geometry.bounds().min.x;
            assert!((min_x - i as f32).abs() < 1e-6);
        }
    }

    #[tokio::test]
    async fn test_loads_run_concurrently() {
        let source = (0..15).fold(source_for(15), |source, i| {
            source.delayed(&format!("part_{i}.stl"), 100)
        });
        let batch = BatchLoader::new(MeshLoader::new(source));

        let started = Instant::now();
        let meshes = batch.load_all(&specs(15)).await.unwrap();
        assert_eq!(meshes.len(), 15);
        // Sequential loading would take 1.5 s
        assert!(started.elapsed().as_millis() < 1000);
    }

    #[tokio::test]
    async fn test_first_failure_abandons_the_rest() {
        let mut source = source_for(4)
            .delayed("part_1.stl", 50)
            .delayed("part_3.stl", 5_000);
        source.files.insert("part_1.stl".to_string(), b"garbage".to_vec());
        let batch = BatchLoader::new(MeshLoader::new(source));

        let started = Instant::now();
        let err = batch.load_all(&specs(4)).await.unwrap_err();
        assert_eq!(err.part, "Part 1");
        assert!(matches!(err.cause, LoadCause::Decode(_)));

        // The slow load was started but never ran to completion
        let source = batch.loader().source();
        assert_eq!(source.fetches.load(Ordering::SeqCst), 4);
        assert_eq!(source.finished.load(Ordering::SeqCst), 3);
        assert!(started.elapsed().as_millis() < 5_000);
    }

    #[tokio::test]
    async fn test_missing_part_fails_batch() {
        let batch = BatchLoader::new(MeshLoader::new(source_for(2)));
        let err = batch.load_all(&specs(3)).await.unwrap_err();
        assert_eq!(err.part, "Part 2");
        assert!(matches!(err.cause, LoadCause::Fetch(_)));
    }

    #[tokio::test]
    async fn test_empty_catalog_loads_nothing() {
        let batch = BatchLoader::new(MeshLoader::new(MemorySource::default()));
        assert!(batch.load_all(&[]).await.unwrap().is_empty());
    }
}
