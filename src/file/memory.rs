//! In-memory backend and resource loader.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Arc,
};

use super::{normalize_path, Backend, ResourceLoader};
use crate::{Error::FileError, Result};

/// Owned in-memory data.
#[derive(Debug, Clone)]
pub struct Memory {
    data: Arc<[u8]>,
}

impl Memory {
    /// Wrap `data` as a backend.
    pub fn new(data: impl Into<Arc<[u8]>>) -> Memory {
        Memory { data: data.into() }
    }
}

impl Backend for Memory {
    fn data(&self) -> &[u8] {
        &self.data
    }
}

/// A [`ResourceLoader`] serving a fixed set of registered buffers.
///
/// Paths are normalized lexically on registration and on lookup, so `/a/./b.dll` and
/// `/a/b.dll` name the same resource.
#[derive(Debug, Default, Clone)]
pub struct MemoryLoader {
    resources: HashMap<PathBuf, Memory>,
}

impl MemoryLoader {
    /// Create an empty loader.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `data` under `path`.
    #[must_use]
    pub fn with_resource(mut self, path: impl AsRef<Path>, data: impl Into<Arc<[u8]>>) -> Self {
        self.insert(path, data);
        self
    }

    /// Register `data` under `path`, replacing any earlier registration.
    pub fn insert(&mut self, path: impl AsRef<Path>, data: impl Into<Arc<[u8]>>) {
        self.resources
            .insert(normalize_path(path.as_ref()), Memory::new(data));
    }

    /// Number of registered resources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Returns `true` if no resource is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

impl ResourceLoader for MemoryLoader {
    fn is_valid_resource(&self, path: &Path) -> bool {
        self.resources.contains_key(&normalize_path(path))
    }

    fn get_stream_for(&self, path: &Path) -> Result<Box<dyn Backend>> {
        match self.resources.get(&normalize_path(path)) {
            Some(memory) => Ok(Box::new(memory.clone())),
            None => Err(FileError(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no in-memory resource registered for {}", path.display()),
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory() {
        let mut data = vec![0xCC_u8; 1048];
        data[10..15].fill(0xBB);

        let memory = Memory::new(data);

        assert_eq!(memory.len(), 1048);
        assert_eq!(memory.data()[0], 0xCC);
        assert_eq!(
            memory.data_slice(10, 5).unwrap(),
            &[0xBB, 0xBB, 0xBB, 0xBB, 0xBB]
        );
        assert!(memory.data_slice(1040, 10).is_err());
        assert!(memory.data_slice(usize::MAX, 2).is_err());
    }

    #[test]
    fn loader_lookup_is_normalized() {
        let loader = MemoryLoader::new().with_resource("/x/y/../Lib.dll", vec![7]);
        assert_eq!(loader.len(), 1);
        assert!(loader.is_valid_resource(Path::new("/x/Lib.dll")));
        assert!(!loader.is_valid_resource(Path::new("/x/y/Lib.dll")));
        assert_eq!(
            loader.get_stream_for(Path::new("/x/./Lib.dll")).unwrap().data(),
            &[7]
        );
        assert!(matches!(
            loader.get_stream_for(Path::new("/nope.dll")),
            Err(FileError(_))
        ));
    }
}
