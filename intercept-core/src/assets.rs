//! Bundled asset stores
//!
//! Assets are read-only files addressed by a relative path such as
//! `images/error.png`. Every `open` returns a fresh stream owned by the caller.

use bytes::Bytes;
use std::collections::HashMap;
use std::fs::File;
use std::io::{Cursor, Read};
use std::path::{Component, Path, PathBuf};
use tracing::debug;

use crate::error::InterceptError;
use crate::Result;

/// Byte stream handed over to the host with a substituted response
pub type AssetStream = Box<dyn Read + Send>;

/// Read-only store of bundled assets
pub trait AssetStore: Send + Sync {
    /// Open the asset at `path` for reading.
    fn open(&self, path: &str) -> Result<AssetStream>;
}

/// Reject anything that is not a plain relative path made of normal components.
fn validate_relative(path: &str) -> Result<PathBuf> {
    let candidate = Path::new(path);
    if path.is_empty() {
        return Err(InterceptError::InvalidAssetPath(path.to_string()));
    }

    let mut clean = PathBuf::new();
    for component in candidate.components() {
        match component {
            Component::Normal(part) => clean.push(part),
            Component::CurDir => {}
            _ => return Err(InterceptError::InvalidAssetPath(path.to_string())),
        }
    }

    if clean.as_os_str().is_empty() {
        return Err(InterceptError::InvalidAssetPath(path.to_string()));
    }
    Ok(clean)
}

/// Assets served from a directory on disk
#[derive(Debug, Clone)]
pub struct DirAssetStore {
    root: PathBuf,
}

impl DirAssetStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl AssetStore for DirAssetStore {
    fn open(&self, path: &str) -> Result<AssetStream> {
        let relative = validate_relative(path)?;
        let full_path = self.root.join(relative);
        debug!("Opening asset {}", full_path.display());

        let file = File::open(&full_path).map_err(|source| InterceptError::ResourceNotFound {
            path: path.to_string(),
            source,
        })?;
        Ok(Box::new(file))
    }
}

/// Assets held in memory, keyed by relative path
#[derive(Debug, Clone, Default)]
pub struct MemoryAssetStore {
    assets: HashMap<String, Bytes>,
}

impl MemoryAssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_asset(mut self, path: impl Into<String>, data: impl Into<Bytes>) -> Self {
        self.insert(path, data);
        self
    }

    pub fn insert(&mut self, path: impl Into<String>, data: impl Into<Bytes>) {
        self.assets.insert(path.into(), data.into());
    }
}

impl AssetStore for MemoryAssetStore {
    fn open(&self, path: &str) -> Result<AssetStream> {
        let relative = validate_relative(path)?;
        let key = relative.to_string_lossy().replace('\\', "/");

        match self.assets.get(&key) {
            Some(data) => Ok(Box::new(Cursor::new(data.clone()))),
            None => Err(InterceptError::ResourceNotFound {
                path: path.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "asset not bundled"),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn read_all(mut stream: AssetStream) -> Vec<u8> {
        let mut buf = Vec::new();
        stream.read_to_end(&mut buf).unwrap();
        buf
    }

    #[test]
    fn test_dir_store_opens_nested_asset() {
        let dir = tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("images")).unwrap();
        std::fs::write(dir.path().join("images/error.png"), b"png-bytes").unwrap();

        let store = DirAssetStore::new(dir.path());
        let stream = store.open("images/error.png").unwrap();
        assert_eq!(read_all(stream), b"png-bytes");
    }

    #[test]
    fn test_dir_store_missing_asset() {
        let dir = tempdir().unwrap();
        let store = DirAssetStore::new(dir.path());

        let err = store.open("images/error.png").err().unwrap();
        assert!(matches!(err, InterceptError::ResourceNotFound { .. }));
    }

    #[test]
    fn test_dir_store_rejects_escaping_paths() {
        let dir = tempdir().unwrap();
        let store = DirAssetStore::new(dir.path().join("assets"));

        for path in ["../secret.txt", "images/../../secret.txt", "/etc/passwd", "", "."] {
            let err = store.open(path).err().unwrap();
            assert!(
                matches!(err, InterceptError::InvalidAssetPath(_)),
                "path {:?} should be rejected",
                path
            );
        }
    }

    #[test]
    fn test_memory_store_each_open_is_independent() {
        let store = MemoryAssetStore::new().with_asset("images/error.png", &b"abc"[..]);

        let first = store.open("images/error.png").unwrap();
        let second = store.open("./images/error.png").unwrap();
        assert_eq!(read_all(first), b"abc");
        assert_eq!(read_all(second), b"abc");
    }

    #[test]
    fn test_memory_store_missing_asset() {
        let store = MemoryAssetStore::new();
        let err = store.open("images/error.png").err().unwrap();
        assert!(err.is_resource_not_found());
    }
}
