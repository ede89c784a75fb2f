//! On-disk part cache with SHA-based lookup
//!
//! Parts whose catalog entry pins a SHA are kept here after the first fetch, so
//! later sessions can skip the download when the pinned SHA is already cached.
//! Files are stored with SHA-prefixed names: `{short_sha}-{name}`, which lets
//! several versions of the same part coexist. A JSON manifest maps full SHAs to
//! the stored files.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Manifest entry for one cached part file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedMesh {
    /// Resource the bytes were fetched from
    pub resource: String,
    /// SHA256 of the content (full)
    pub sha: String,
    /// First 8 characters of the SHA, used in the filename
    pub short_sha: String,
    /// Original file name (without SHA prefix)
    pub name: String,
    /// Path relative to the cache directory
    pub path: String,
    /// When this was fetched (RFC 3339)
    pub fetched_at: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheManifest {
    #[serde(default = "default_version")]
    pub version: String,
    /// Entries keyed by full SHA
    #[serde(default)]
    pub meshes: HashMap<String, CachedMesh>,
}

fn default_version() -> String {
    "1.0".to_string()
}

impl CacheManifest {
    pub fn new() -> Self {
        Self {
            version: default_version(),
            meshes: HashMap::new(),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, CacheError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Load manifest or create new if file doesn't exist
    pub fn load_or_create(path: &Path) -> Result<Self, CacheError> {
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::new())
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), CacheError> {
        let content = serde_json::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Entry whose SHA matches `sha`, which may be a truncated prefix
    pub fn find(&self, sha: &str) -> Option<&CachedMesh> {
        if sha.is_empty() {
            return None;
        }
        self.meshes
            .get(sha)
            .or_else(|| self.meshes.values().find(|m| sha_matches(sha, &m.sha)))
    }
}

/// Cache directory manager
#[derive(Debug, Clone)]
pub struct MeshCache {
    pub base_dir: PathBuf,
    pub manifest_path: PathBuf,
    pub manifest: CacheManifest,
}

impl MeshCache {
    pub fn new(base_dir: PathBuf) -> Result<Self, CacheError> {
        std::fs::create_dir_all(&base_dir)?;

        let manifest_path = base_dir.join("manifest.json");
        let manifest = CacheManifest::load_or_create(&manifest_path)?;

        Ok(Self {
            base_dir,
            manifest_path,
            manifest,
        })
    }

    /// Get short SHA (first 8 characters) from a full SHA
    pub fn short_sha(sha: &str) -> String {
        sha[..8.min(sha.len())].to_string()
    }

    /// Where a part with this SHA and file name is stored
    pub fn mesh_path(&self, sha: &str, name: &str) -> PathBuf {
        self.base_dir.join(format!("{}-{}", Self::short_sha(sha), name))
    }

    /// Absolute path of a cached part whose file still exists
    pub fn lookup(&self, sha: &str) -> Option<PathBuf> {
        self.manifest
            .find(sha)
            .map(|entry| self.base_dir.join(&entry.path))
            .filter(|path| path.exists())
    }

    /// Read a cached part by SHA; `None` when not cached
    pub fn read(&self, sha: &str) -> Result<Option<Vec<u8>>, CacheError> {
        match self.lookup(sha) {
            Some(path) => Ok(Some(std::fs::read(path)?)),
            None => Ok(None),
        }
    }

    /// Store part bytes under their computed SHA and record them in the manifest
    pub fn store(&mut self, resource: &str, content: &[u8]) -> Result<PathBuf, CacheError> {
        let sha = sha256_hex(content);
        let name = resource.rsplit('/').next().unwrap_or(resource);
        let short_sha = Self::short_sha(&sha);
        let path = self.mesh_path(&sha, name);
        let file_name = format!("{}-{}", short_sha, name);
        std::fs::write(&path, content)?;

        self.manifest.meshes.insert(
            sha.clone(),
            CachedMesh {
                resource: resource.to_string(),
                sha,
                short_sha,
                name: name.to_string(),
                path: file_name,
                fetched_at: chrono::Utc::now().to_rfc3339(),
            },
        );
        self.manifest.save(&self.manifest_path)?;

        Ok(path)
    }
}

/// Whether a pinned SHA (full or prefix) matches a computed one
pub fn sha_matches(expected: &str, computed: &str) -> bool {
    let expected = expected.to_ascii_lowercase();
    !expected.is_empty() && computed.starts_with(&expected)
}

/// Compute SHA256 hash of data and return as hex string
pub fn sha256_hex(data: &[u8]) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_store_and_read_by_prefix() {
        let temp_dir = TempDir::new().unwrap();
        let mut cache = MeshCache::new(temp_dir.path().to_path_buf()).unwrap();

        let content = b"solid part\nendsolid part\n";
        let sha = sha256_hex(content);
        let path = cache
            .store("models/Segmentation preview_Segment_1.stl", content)
            .unwrap();

        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            format!("{}-Segmentation preview_Segment_1.stl", &sha[..8])
        );
        assert_eq!(path, cache.mesh_path(&sha, "Segmentation preview_Segment_1.stl"));
        assert_eq!(cache.read(&sha).unwrap().unwrap(), content);
        assert_eq!(cache.read(&sha[..8]).unwrap().unwrap(), content);
        assert!(cache.read("deadbeef").unwrap().is_none());
    }

    #[test]
    fn test_manifest_persists() {
        let temp_dir = TempDir::new().unwrap();
        let content = b"abc";
        {
            let mut cache = MeshCache::new(temp_dir.path().to_path_buf()).unwrap();
            cache.store("a.stl", content).unwrap();
        }

        let cache = MeshCache::new(temp_dir.path().to_path_buf()).unwrap();
        let entry = cache.manifest.find(&sha256_hex(content)).unwrap();
        assert_eq!(entry.name, "a.stl");
        assert_eq!(entry.resource, "a.stl");
    }

    #[test]
    fn test_missing_file_is_not_cached() {
        let temp_dir = TempDir::new().unwrap();
        let mut cache = MeshCache::new(temp_dir.path().to_path_buf()).unwrap();
        let path = cache.store("a.stl", b"abc").unwrap();
        std::fs::remove_file(path).unwrap();

        assert!(cache.lookup(&sha256_hex(b"abc")).is_none());
    }

    #[test]
    fn test_sha_matches() {
        let full = sha256_hex(b"hello world");
        assert!(sha_matches(&full, &full));
        assert!(sha_matches("B94D27B9", &full));
        assert!(!sha_matches("00000000", &full));
        assert!(!sha_matches("", &full));
        // A pin longer than the hash never matches it
        assert!(!sha_matches(&format!("{full}00"), &full));
    }

    #[test]
    fn test_sha256() {
        let hash = sha256_hex(b"hello world");
        assert_eq!(hash, "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9");
    }
}
