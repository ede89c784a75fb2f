//! Building the batch loader from configuration

use aorta_core::load::LoadError;
use aorta_core::parts::PartCatalog;
use aorta_core::scene::Mesh;
use aorta_loader::{AssetSource, BatchLoader, MeshCache, MeshLoader};
use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::config::Config;

pub fn batch_loader(config: &Config) -> Result<BatchLoader<AssetSource>> {
    let source = AssetSource::from_base(&config.assets.base, config.assets.timeout())
        .with_context(|| format!("Invalid asset base '{}'", config.assets.base))?;
    let mut loader = MeshLoader::new(source).with_scale(config.assets.mesh_scale);

    // A broken cache only costs downloads
    if let Some(dir) = &config.assets.cache_dir {
        match MeshCache::new(dir.clone()) {
            Ok(cache) => loader = loader.with_cache(cache),
            Err(e) => warn!(path = %dir.display(), error = %e, "Mesh cache unavailable"),
        }
    }

    info!(base = %config.assets.base, "Asset source ready");
    Ok(BatchLoader::new(loader))
}

pub fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to create loader runtime")
}

/// Load every catalog part, blocking the calling thread
pub fn load_blocking(config: &Config, catalog: &PartCatalog) -> Result<Result<Vec<Mesh>, LoadError>> {
    let batch = batch_loader(config)?;
    let runtime = runtime()?;
    Ok(runtime.block_on(batch.load_all(&catalog.part)))
}
