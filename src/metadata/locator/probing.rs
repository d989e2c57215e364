use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use rayon::prelude::*;

use crate::metadata::{
    identity::AssemblyIdentity,
    locator::{
        cache::{CacheStrategy, Concurrent, LockedSimple, SingleThreaded},
        framework::detect_target_framework,
        CandidatePaths, LocatorConfig, ReferenceLocator, TargetFrameworkInfo,
    },
    resolution::{LocalTypeResolver, ResolutionSummary, TypeResolver},
    tables::ModuleTables,
};

/// Single caller, plain maps.
pub type SingleThreadedLocator = Locator<SingleThreaded>;
/// Every lookup and resolution pass serialized through one lock.
pub type LockedLocator = Locator<LockedSimple>;
/// Concurrent caches, resolution passes serialized by a shared gate.
pub type ConcurrentLocator = Locator<Concurrent>;

/// File-system reference probing with memoized target frameworks.
pub struct Locator<S: CacheStrategy> {
    config: LocatorConfig,
    resolver: Arc<dyn TypeResolver + Send + Sync>,
    cache: S,
}

impl<S: CacheStrategy> Locator<S> {
    /// Create a locator that decodes `TargetFrameworkAttribute` with [`LocalTypeResolver`].
    #[must_use]
    pub fn new(config: LocatorConfig) -> Self {
        Locator {
            config,
            resolver: Arc::new(LocalTypeResolver),
            cache: S::default(),
        }
    }

    /// Replace the resolver used to decode `TargetFrameworkAttribute` values.
    #[must_use]
    pub fn with_resolver(mut self, resolver: Arc<dyn TypeResolver + Send + Sync>) -> Self {
        self.resolver = resolver;
        self
    }

    /// The probing configuration.
    #[must_use]
    pub fn config(&self) -> &LocatorConfig {
        &self.config
    }

    /// Resolve every resolvable cell of `module` inside this locator's critical section.
    ///
    /// Resolution rewrites cells in place and is not reentrant-safe, so every pass through
    /// the same locator is serialized, whichever module it targets.
    pub fn resolve_everything(
        &self,
        module: &mut ModuleTables,
        resolver: &dyn TypeResolver,
    ) -> ResolutionSummary {
        self.cache.serialize(|| module.resolve_everything(resolver))
    }

    fn with_extension(name: &str, extension: &str) -> String {
        let has_extension = name.len() >= extension.len()
            && name.is_char_boundary(name.len() - extension.len())
            && name[name.len() - extension.len()..].eq_ignore_ascii_case(extension);
        if extension.is_empty() || has_extension {
            name.to_string()
        } else {
            format!("{name}{extension}")
        }
    }
}

impl Locator<Concurrent> {
    /// Resolve many independent modules on the rayon pool.
    ///
    /// Every pass still enters the shared gate; what runs in parallel is the work outside of
    /// it, such as target framework detection triggered by the resolver.
    pub fn resolve_all(
        &self,
        modules: &mut [ModuleTables],
        resolver: &(dyn TypeResolver + Sync),
    ) -> ResolutionSummary {
        modules
            .par_iter_mut()
            .map(|module| self.resolve_everything(module, resolver))
            .reduce(ResolutionSummary::default, |mut total, summary| {
                total.merge(summary);
                total
            })
    }
}

impl<S: CacheStrategy> ReferenceLocator for Locator<S> {
    fn candidate_resources_for_module_reference(
        &self,
        this_path: &Path,
        _module: &ModuleTables,
        name: &str,
    ) -> CandidatePaths {
        let directory = this_path.parent().unwrap_or_else(|| Path::new(""));
        let file_name = Self::with_extension(name, &self.config.module_extension);

        tracing::debug!(reference = name, file = %file_name, "module reference candidates");
        CandidatePaths::new(this_path, vec![directory.join(file_name)])
    }

    fn candidate_resources_for_assembly_reference(
        &self,
        this_path: &Path,
        module: &ModuleTables,
        identity: Option<&AssemblyIdentity>,
        raw_name: &str,
    ) -> CandidatePaths {
        let name = identity.map_or(raw_name, |identity| identity.name.as_str());
        let directory = this_path.parent().unwrap_or_else(|| Path::new(""));

        let mut candidates: Vec<PathBuf> = self
            .config
            .assembly_extensions
            .iter()
            .map(|extension| directory.join(Self::with_extension(name, extension)))
            .collect();

        if let Some(framework) = self.target_framework_path_for(module) {
            candidates.extend(
                self.config
                    .assembly_extensions
                    .iter()
                    .map(|extension| framework.join(Self::with_extension(name, extension))),
            );
        }

        tracing::debug!(
            reference = name,
            candidates = candidates.len(),
            "assembly reference candidates"
        );
        CandidatePaths::new(this_path, candidates)
    }

    fn target_framework_info_for(&self, module: &ModuleTables) -> Option<TargetFrameworkInfo> {
        self.cache.framework_info(module.id(), || {
            detect_target_framework(module, self.resolver.as_ref())
        })
    }

    fn target_framework_path_for(&self, module: &ModuleTables) -> Option<PathBuf> {
        self.cache.framework_path(module.id(), || {
            let base = self.config.framework_base.as_ref()?;
            let info = self.target_framework_info_for(module)?;
            Some(info.reference_directory(base))
        })
    }
}

impl<S: CacheStrategy + std::fmt::Debug> std::fmt::Debug for Locator<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Locator")
            .field("config", &self.config)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}
