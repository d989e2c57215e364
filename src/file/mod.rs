//! Resource access for dependent modules.
//!
//! The metadata engine never opens files on its own. Whenever a dependent module has to be
//! located or read, the [`ResourceLoader`] collaborator is asked whether a candidate path is a
//! valid resource, for the bytes behind it, and for a normalized form of a path (used to
//! compare candidates against the referencing module's own location).
//!
//! Two loaders are provided:
//!
//! - [`FileSystemLoader`] - validates with the filesystem and memory-maps resources through
//!   [`Physical`]
//! - [`MemoryLoader`] - serves pre-registered byte buffers through [`Memory`], useful for
//!   tests and for in-process pipelines
//!
//! # Usage Examples
//!
//! ```rust
//! use cilweave::file::{MemoryLoader, ResourceLoader};
//! use std::path::Path;
//!
//! let loader = MemoryLoader::new().with_resource("/libs/Dep.dll", vec![0x4D, 0x5A]);
//! assert!(loader.is_valid_resource(Path::new("/libs/./Dep.dll")));
//!
//! let stream = loader.get_stream_for(Path::new("/libs/Dep.dll"))?;
//! assert_eq!(stream.data(), &[0x4D, 0x5A]);
//! # Ok::<(), cilweave::Error>(())
//! ```

pub mod io;
pub mod parser;

mod memory;
mod physical;

pub use memory::{Memory, MemoryLoader};
pub use physical::{FileSystemLoader, Physical};

use std::path::{Component, Path, PathBuf};

use crate::{Error::OutOfBounds, Result};

/// Backing storage for the bytes of one resource.
pub trait Backend: Send + Sync {
    /// Returns a slice of the data at the given offset and length.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the requested range is not available.
    fn data_slice(&self, offset: usize, len: usize) -> Result<&[u8]> {
        let Some(offset_end) = offset.checked_add(len) else {
            return Err(OutOfBounds);
        };

        self.data().get(offset..offset_end).ok_or(OutOfBounds)
    }

    /// Returns the complete data.
    fn data(&self) -> &[u8];

    /// Returns the total length of the data.
    fn len(&self) -> usize {
        self.data().len()
    }

    /// Returns `true` if the backend holds no data.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The module loader collaborator consumed by reference location and cross-module resolution.
pub trait ResourceLoader: Send + Sync {
    /// Returns `true` if `path` names a resource that can be loaded.
    fn is_valid_resource(&self, path: &Path) -> bool;

    /// Acquire the bytes behind `path`.
    ///
    /// # Errors
    /// Returns an error if the resource does not exist or cannot be read.
    fn get_stream_for(&self, path: &Path) -> Result<Box<dyn Backend>>;

    /// Returns the normalized form of `path` used for identity comparisons.
    fn sanitize_resource(&self, path: &Path) -> PathBuf {
        normalize_path(path)
    }
}

/// Lexically normalize a path: drop `.` components and fold `..` into their parent.
///
/// The filesystem is never consulted, so symbolic links are not followed.
#[must_use]
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let ends_with_normal =
                    matches!(normalized.components().next_back(), Some(Component::Normal(_)));
                if ends_with_normal {
                    normalized.pop();
                } else if !normalized.has_root() {
                    normalized.push("..");
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}
