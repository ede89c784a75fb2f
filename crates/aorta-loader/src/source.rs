//! Where part bytes come from: an HTTP asset server or a local directory

use reqwest::Url;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid asset base URL: {0}")]
    InvalidBase(String),
}

/// Anything that can resolve a resource name to its bytes
pub trait MeshSource: Send + Sync {
    fn fetch(&self, resource: &str) -> impl Future<Output = Result<Vec<u8>, FetchError>> + Send;

    /// Human-readable location of a resource, for logs
    fn locate(&self, resource: &str) -> String;
}

/// Static asset server reached over HTTP(S)
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: reqwest::Client,
    base: Url,
}

impl HttpSource {
    pub fn new(base: &str, timeout: Duration) -> Result<Self, FetchError> {
        let base = Url::parse(base).map_err(|_| FetchError::InvalidBase(base.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(FetchError::InvalidBase(base.to_string()));
        }
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base })
    }

    /// Full URL of a resource; every path segment is percent-encoded
    pub fn url_for(&self, resource: &str) -> Result<Url, FetchError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| FetchError::InvalidBase(self.base.to_string()))?
            .pop_if_empty()
            .extend(resource.split('/').filter(|s| !s.is_empty()));
        Ok(url)
    }
}

impl MeshSource for HttpSource {
    async fn fetch(&self, resource: &str) -> Result<Vec<u8>, FetchError> {
        let url = self.url_for(resource)?;
        debug!(url = %url, "GET");

        let response = self.client.get(url.clone()).send().await?;
        if !response.status().is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }
        Ok(response.bytes().await?.to_vec())
    }

    fn locate(&self, resource: &str) -> String {
        self.url_for(resource)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| resource.to_string())
    }
}

/// Part files in a local directory
#[derive(Debug, Clone)]
pub struct DirSource {
    root: PathBuf,
}

impl DirSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl MeshSource for DirSource {
    async fn fetch(&self, resource: &str) -> Result<Vec<u8>, FetchError> {
        let path = self.root.join(resource);
        tokio::fs::read(&path)
            .await
            .map_err(|source| FetchError::Io { path, source })
    }

    fn locate(&self, resource: &str) -> String {
        self.root.join(resource).display().to_string()
    }
}

/// Source picked from a configured base: URLs go over HTTP, anything else is a directory
#[derive(Debug, Clone)]
pub enum AssetSource {
    Http(HttpSource),
    Dir(DirSource),
}

impl AssetSource {
    pub fn from_base(base: &str, timeout: Duration) -> Result<Self, FetchError> {
        if base.starts_with("http://") || base.starts_with("https://") {
            Ok(AssetSource::Http(HttpSource::new(base, timeout)?))
        } else {
            Ok(AssetSource::Dir(DirSource::new(base)))
        }
    }
}

impl MeshSource for AssetSource {
    async fn fetch(&self, resource: &str) -> Result<Vec<u8>, FetchError> {
        match self {
            AssetSource::Http(source) => source.fetch(resource).await,
            AssetSource::Dir(source) => source.fetch(resource).await,
        }
    }

    fn locate(&self, resource: &str) -> String {
        match self {
            AssetSource::Http(source) => source.locate(resource),
            AssetSource::Dir(source) => source.locate(resource),
        }
    }
}
