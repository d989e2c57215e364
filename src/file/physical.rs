//! Physical file backend for memory-mapped I/O.
//!
//! [`Physical`] maps a dependent module directly into the address space so its bytes can be
//! handed to a module reader without copying. [`FileSystemLoader`] is the [`ResourceLoader`]
//! that hands out these mappings.

use super::{normalize_path, Backend, ResourceLoader};
use crate::{
    Error::{Error, FileError},
    Result,
};

use memmap2::Mmap;
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Memory-mapped file data.
#[derive(Debug)]
pub struct Physical {
    data: Mmap,
}

impl Physical {
    /// Map the file at `path` into memory.
    ///
    /// # Errors
    /// Returns [`crate::Error::FileError`] if the file cannot be opened and
    /// [`crate::Error::Error`] if it cannot be mapped.
    pub fn new(path: impl AsRef<Path>) -> Result<Physical> {
        let file = match fs::File::open(path) {
            Ok(file) => file,
            Err(error) => return Err(FileError(error)),
        };

        // The mapping stays valid for as long as `Physical` lives; modules are treated as
        // read-only inputs and are never truncated while mapped.
        let mmap = match unsafe { Mmap::map(&file) } {
            Ok(mmap) => mmap,
            Err(error) => return Err(Error(error.to_string())),
        };

        Ok(Physical { data: mmap })
    }
}

impl Backend for Physical {
    fn data(&self) -> &[u8] {
        self.data.as_ref()
    }
}

/// Resource loader backed by the local filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileSystemLoader;

impl FileSystemLoader {
    /// Create a new filesystem loader.
    #[must_use]
    pub fn new() -> Self {
        FileSystemLoader
    }
}

impl ResourceLoader for FileSystemLoader {
    fn is_valid_resource(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn get_stream_for(&self, path: &Path) -> Result<Box<dyn Backend>> {
        Ok(Box::new(Physical::new(path)?))
    }

    fn sanitize_resource(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            return normalize_path(path);
        }

        match std::env::current_dir() {
            Ok(cwd) => normalize_path(&cwd.join(path)),
            Err(_) => normalize_path(path),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn physical_maps_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[0x4D, 0x5A, 0x90, 0x00]).unwrap();
        file.flush().unwrap();

        let physical = Physical::new(file.path()).unwrap();
        assert_eq!(physical.len(), 4);
        assert_eq!(physical.data_slice(0, 2).unwrap(), b"MZ");
        assert!(physical.data_slice(3, 2).is_err());
    }

    #[test]
    fn physical_missing_file() {
        let result = Physical::new("/definitely/not/here.dll");
        assert!(matches!(result, Err(FileError(_))));
    }

    #[test]
    fn filesystem_loader_validates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Lib.dll");
        fs::write(&path, [1, 2, 3]).unwrap();

        let loader = FileSystemLoader::new();
        assert!(loader.is_valid_resource(&path));
        assert!(!loader.is_valid_resource(&dir.path().join("Other.dll")));
        assert!(!loader.is_valid_resource(dir.path()));
        assert_eq!(loader.get_stream_for(&path).unwrap().data(), &[1, 2, 3]);

        let dotted = dir.path().join(".").join("Lib.dll");
        assert_eq!(loader.sanitize_resource(&dotted), normalize_path(&path));
    }
}
