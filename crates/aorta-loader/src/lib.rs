//! Aorta Loader - Fetching and decoding the model's STL parts
//!
//! Parts are fetched from an HTTP asset server or a local directory, verified
//! against a pinned SHA when the catalog carries one, cached on disk, and
//! decoded into core geometry. The batch loader runs every part load at once and
//! hands back either all meshes in catalog order or the first failure.

pub mod batch;
pub mod cache;
pub mod loader;
pub mod source;

pub use batch::BatchLoader;
pub use cache::{sha256_hex, CacheError, MeshCache};
pub use loader::{MeshLoader, DEFAULT_MESH_SCALE};
pub use source::{AssetSource, DirSource, FetchError, HttpSource, MeshSource};
