//! Finding the files behind module and assembly references.
//!
//! A [`ReferenceLocator`] turns a reference made by one module into the paths the referenced
//! module may live at. Assembly references are probed next to the referencing module first,
//! then in the reference assembly directory of the framework the module targets. That
//! framework comes from the module's `TargetFrameworkAttribute`, which takes a resolution pass
//! over its custom attributes to read, so the result is memoized per module.
//!
//! [`Locator`] implements the probing once; its [`CacheStrategy`] picks the concurrency
//! model:
//!
//! | Alias | Strategy | Use |
//! |-------|----------|-----|
//! | [`SingleThreadedLocator`] | [`SingleThreaded`] | one caller |
//! | [`LockedLocator`] | [`LockedSimple`] | every call serialized through one lock |
//! | [`ConcurrentLocator`] | [`Concurrent`] | lock-free caches, gated resolution passes |
//!
//! # Examples
//!
//! ```rust
//! use std::path::Path;
//! use std::sync::Arc;
//! use cilweave::metadata::{
//!     locator::{LocatorConfig, ReferenceLocator, SingleThreadedLocator},
//!     tables::{ModuleTables, SchemaProvider},
//! };
//!
//! let module = ModuleTables::new(&Arc::new(SchemaProvider::standard()?))?;
//! let locator = SingleThreadedLocator::new(LocatorConfig::new());
//!
//! let candidates = locator.candidate_resources_for_module_reference(
//!     Path::new("/app/App.exe"),
//!     &module,
//!     "native",
//! );
//! let paths: Vec<&Path> = candidates.iter().collect();
//! assert_eq!(paths, vec![Path::new("/app/native.dll")]);
//! # Ok::<(), cilweave::Error>(())
//! ```

mod cache;
mod candidates;
mod config;
mod framework;
mod probing;

use std::path::{Path, PathBuf};

use crate::metadata::{identity::AssemblyIdentity, tables::ModuleTables};

pub use cache::{CacheStrategy, Concurrent, LockedSimple, SingleThreaded};
pub use candidates::{CandidateIter, CandidatePaths};
pub use config::LocatorConfig;
pub use framework::{TargetFrameworkInfo, TARGET_FRAMEWORK_ATTRIBUTE};
pub use probing::{ConcurrentLocator, LockedLocator, Locator, SingleThreadedLocator};

/// Maps references made by a module to candidate files.
pub trait ReferenceLocator {
    /// Candidates for the `ModuleRef` called `name`, made by `module` loaded from `this_path`.
    fn candidate_resources_for_module_reference(
        &self,
        this_path: &Path,
        module: &ModuleTables,
        name: &str,
    ) -> CandidatePaths;

    /// Candidates for an assembly reference made by `module` loaded from `this_path`.
    ///
    /// `identity` is the parsed reference when available; `raw_name` is used otherwise.
    fn candidate_resources_for_assembly_reference(
        &self,
        this_path: &Path,
        module: &ModuleTables,
        identity: Option<&AssemblyIdentity>,
        raw_name: &str,
    ) -> CandidatePaths;

    /// The framework `module` was compiled against, memoized per module.
    fn target_framework_info_for(&self, module: &ModuleTables) -> Option<TargetFrameworkInfo>;

    /// The reference assembly directory of that framework, memoized per module.
    fn target_framework_path_for(&self, module: &ModuleTables) -> Option<PathBuf>;
}

impl<T: ReferenceLocator + ?Sized> ReferenceLocator for std::sync::Arc<T> {
    fn candidate_resources_for_module_reference(
        &self,
        this_path: &Path,
        module: &ModuleTables,
        name: &str,
    ) -> CandidatePaths {
        (**self).candidate_resources_for_module_reference(this_path, module, name)
    }

    fn candidate_resources_for_assembly_reference(
        &self,
        this_path: &Path,
        module: &ModuleTables,
        identity: Option<&AssemblyIdentity>,
        raw_name: &str,
    ) -> CandidatePaths {
        (**self).candidate_resources_for_assembly_reference(this_path, module, identity, raw_name)
    }

    fn target_framework_info_for(&self, module: &ModuleTables) -> Option<TargetFrameworkInfo> {
        (**self).target_framework_info_for(module)
    }

    fn target_framework_path_for(&self, module: &ModuleTables) -> Option<PathBuf> {
        (**self).target_framework_path_for(module)
    }
}
