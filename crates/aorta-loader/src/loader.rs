//! Single-part loading: fetch, verify, cache, decode

use aorta_core::load::{LoadCause, LoadError};
use aorta_core::parts::PartSpec;
use aorta_core::scene::Mesh;
use aorta_core::stl::{self, Geometry};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::cache::{sha256_hex, sha_matches, MeshCache};
use crate::source::MeshSource;

/// Scale from segmentation units (millimetres) to a model about twice life size
pub const DEFAULT_MESH_SCALE: f32 = 0.002;

/// Loads one part at a time from a `MeshSource`
#[derive(Debug)]
pub struct MeshLoader<S> {
    source: S,
    cache: Option<Arc<RwLock<MeshCache>>>,
    scale: f32,
}

impl<S: MeshSource> MeshLoader<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            cache: None,
            scale: DEFAULT_MESH_SCALE,
        }
    }

    /// Keep parts with a pinned SHA in `cache`
    pub fn with_cache(mut self, cache: MeshCache) -> Self {
        self.cache = Some(Arc::new(RwLock::new(cache)));
        self
    }

    /// Uniform scale applied to every loaded part
    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Fetch and decode one resource. Failures name the part by `name`.
    pub async fn load(&self, resource: &str, name: &str) -> Result<Geometry, LoadError> {
        info!(part = %name, location = %self.source.locate(resource), "Fetching part");
        let bytes = self
            .source
            .fetch(resource)
            .await
            .map_err(|e| LoadError::fetch(name, e))?;
        decode(name, &bytes)
    }

    /// Load a catalog part into a mesh, going through the cache when the part pins a SHA
    pub async fn load_part(&self, spec: &PartSpec) -> Result<Mesh, LoadError> {
        let Some(expected) = spec.sha.as_deref() else {
            let geometry = self.load(&spec.resource, &spec.name).await?;
            return Ok(self.finish(spec, geometry));
        };

        if let Some(bytes) = self.read_cached(expected).await {
            info!(part = %spec.name, sha = %MeshCache::short_sha(expected), "Using cached part (SHA match)");
            let geometry = decode(&spec.name, &bytes)?;
            return Ok(self.finish(spec, geometry));
        }

        info!(part = %spec.name, location = %self.source.locate(&spec.resource), "Fetching part");
        let bytes = self
            .source
            .fetch(&spec.resource)
            .await
            .map_err(|e| LoadError::fetch(&spec.name, e))?;

        let computed = sha256_hex(&bytes);
        if !sha_matches(expected, &computed) {
            warn!(part = %spec.name, expected = %expected, computed = %computed, "Part SHA mismatch");
            return Err(LoadError::new(
                &spec.name,
                LoadCause::ShaMismatch {
                    expected: expected.to_string(),
                    actual: computed,
                },
            ));
        }

        let geometry = decode(&spec.name, &bytes)?;
        self.store_cached(&spec.resource, &bytes).await;
        Ok(self.finish(spec, geometry))
    }

    fn finish(&self, spec: &PartSpec, geometry: Geometry) -> Mesh {
        debug!(part = %spec.name, triangles = geometry.triangle_count(), "Part decoded");
        Mesh::from_part(spec, geometry, self.scale)
    }

    /// Cached bytes for `sha`, only when they still hash to it
    async fn read_cached(&self, sha: &str) -> Option<Vec<u8>> {
        let cache = self.cache.as_ref()?.read().await;
        let bytes = match cache.read(sha) {
            Ok(bytes) => bytes?,
            Err(e) => {
                warn!(sha = %sha, error = %e, "Failed to read cached part");
                return None;
            }
        };
        let computed = sha256_hex(&bytes);
        if !sha_matches(sha, &computed) {
            warn!(sha = %sha, computed = %computed, "Cached part corrupted, fetching again");
            return None;
        }
        Some(bytes)
    }

    async fn store_cached(&self, resource: &str, bytes: &[u8]) {
        let Some(cache) = &self.cache else { return };
        let mut cache = cache.write().await;
        match cache.store(resource, bytes) {
            Ok(path) => debug!(path = %path.display(), "Cached part"),
            Err(e) => warn!(resource = %resource, error = %e, "Failed to cache part"),
        }
    }
}

fn decode(name: &str, bytes: &[u8]) -> Result<Geometry, LoadError> {
    stl::decode(bytes).map_err(|e| LoadError::new(name, LoadCause::Decode(e)))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::source::FetchError;
    use aorta_core::parts::Rgb;
    use aorta_core::stl::StlError;
    use glam::Vec3;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tempfile::TempDir;

    /// In-memory source with per-resource delays and a fetch counter
    #[derive(Default)]
    pub(crate) struct MemorySource {
        pub files: HashMap<String, Vec<u8>>,
        pub delays: HashMap<String, Duration>,
        pub fetches: AtomicUsize,
        pub finished: AtomicUsize,
    }

    impl MemorySource {
        pub fn with(mut self, resource: &str, bytes: Vec<u8>) -> Self {
            self.files.insert(resource.to_string(), bytes);
            self
        }

        pub fn delayed(mut self, resource: &str, millis: u64) -> Self {
            self.delays
                .insert(resource.to_string(), Duration::from_millis(millis));
            self
        }
    }

    impl MeshSource for MemorySource {
        async fn fetch(&self, resource: &str) -> Result<Vec<u8>, FetchError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delays.get(resource) {
                tokio::time::sleep(*delay).await;
            }
            self.finished.fetch_add(1, Ordering::SeqCst);
            self.files.get(resource).cloned().ok_or_else(|| FetchError::Status {
                url: resource.to_string(),
                status: 404,
            })
        }

        fn locate(&self, resource: &str) -> String {
            format!("memory://{resource}")
        }
    }

    /// Binary STL for a single triangle shifted along X
    pub(crate) fn triangle_stl(x: f32) -> Vec<u8> {
        let geometry = Geometry::from_triangles([[
            Vec3::new(x, 0.0, 0.0),
            Vec3::new(x + 1.0, 0.0, 0.0),
            Vec3::new(x, 1.0, 0.0),
        ]]);
        geometry.to_binary_stl()
    }

    pub(crate) fn spec(resource: &str, name: &str) -> PartSpec {
        PartSpec::new(resource, name, name, Rgb::WHITE)
    }

    #[tokio::test]
    async fn test_load_decodes_geometry() {
        let source = MemorySource::default().with("a.stl", triangle_stl(2.0));
        let loader = MeshLoader::new(source);

        let geometry = loader.load("a.stl", "Part A").await.unwrap();
        assert_eq!(geometry.triangle_count(), 1);
    }

    #[tokio::test]
    async fn test_load_failures_name_the_part() {
        let source = MemorySource::default().with("bad.stl", vec![1, 2, 3]);
        let loader = MeshLoader::new(source);

        let err = loader.load("missing.stl", "Renal artery").await.unwrap_err();
        assert_eq!(err.part, "Renal artery");
        assert!(matches!(err.cause, LoadCause::Fetch(_)));

        let err = loader.load("bad.stl", "Celiac trunk").await.unwrap_err();
        assert_eq!(err.part, "Celiac trunk");
        assert!(matches!(err.cause, LoadCause::Decode(StlError::TooShort(3))));
    }

    #[tokio::test]
    async fn test_load_part_applies_spec() {
        let source = MemorySource::default().with("a.stl", triangle_stl(0.0));
        let loader = MeshLoader::new(source).with_scale(0.5);
        let spec = spec("a.stl", "Arch").hidden();

        let mesh = loader.load_part(&spec).await.unwrap();
        assert_eq!(mesh.name, "Arch");
        assert!(!mesh.visible);
        assert_eq!(mesh.transform.scale, Vec3::splat(0.5));
    }

    #[tokio::test]
    async fn test_pinned_sha_mismatch_fails() {
        let source = MemorySource::default().with("a.stl", triangle_stl(0.0));
        let loader = MeshLoader::new(source);
        let mut spec = spec("a.stl", "Arch");
        spec.sha = Some("00000000".to_string());

        let err = loader.load_part(&spec).await.unwrap_err();
        assert!(matches!(err.cause, LoadCause::ShaMismatch { .. }));
    }

    #[tokio::test]
    async fn test_pinned_sha_served_from_cache() {
        let temp_dir = TempDir::new().unwrap();
        let bytes = triangle_stl(0.0);
        let mut spec = spec("a.stl", "Arch");
        spec.sha = Some(sha256_hex(&bytes)[..8].to_string());

        let cache = MeshCache::new(temp_dir.path().to_path_buf()).unwrap();
        let loader = MeshLoader::new(MemorySource::default().with("a.stl", bytes)).with_cache(cache);
        loader.load_part(&spec).await.unwrap();
        loader.load_part(&spec).await.unwrap();
        assert_eq!(loader.source().fetches.load(Ordering::SeqCst), 1);

        // A fresh loader over the same directory never touches the source
        let cache = MeshCache::new(temp_dir.path().to_path_buf()).unwrap();
        let loader = MeshLoader::new(MemorySource::default()).with_cache(cache);
        let mesh = loader.load_part(&spec).await.unwrap();
        assert_eq!(mesh.geometry.triangle_count(), 1);
        assert_eq!(loader.source().fetches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_corrupted_cache_entry_refetched() {
        let temp_dir = TempDir::new().unwrap();
        let bytes = triangle_stl(0.0);
        let mut spec = spec("a.stl", "Arch");
        spec.sha = Some(sha256_hex(&bytes));

        let mut cache = MeshCache::new(temp_dir.path().to_path_buf()).unwrap();
        let path = cache.store("a.stl", &bytes).unwrap();
        std::fs::write(&path, &bytes[..bytes.len() - 10]).unwrap();

        let loader = MeshLoader::new(MemorySource::default().with("a.stl", bytes.clone())).with_cache(cache);
        let mesh = loader.load_part(&spec).await.unwrap();
        assert_eq!(mesh.geometry.triangle_count(), 1);
        assert_eq!(loader.source().fetches.load(Ordering::SeqCst), 1);

        // The refetch repaired the cached file
        assert_eq!(std::fs::read(&path).unwrap(), bytes);
    }
}
