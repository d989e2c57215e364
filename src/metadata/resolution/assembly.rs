//! Enum lookups that follow references into other modules.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use dashmap::DashMap;

use crate::{
    file::ResourceLoader,
    metadata::{
        customattributes::EnumInfo,
        identity::AssemblyIdentity,
        locator::{CandidatePaths, ReferenceLocator},
        resolution::{
            names::{split_assembly_qualified, type_name},
            LocalTypeResolver, TypeReference, TypeResolver,
        },
        tables::{
            AssemblyRefRow, AssemblyRow, ExportedTypeRow, FileRow, ModuleId, ModuleRefRow,
            ModuleTables, TableId, TypeRefRow,
        },
        token::TableIndex,
    },
    Result,
};

/// Maximum number of type forwarders followed for one lookup
const MAX_FORWARDS: usize = 8;
/// Maximum depth of nested `TypeRef` scopes
const MAX_SCOPE_DEPTH: usize = 64;

/// Turns the bytes of a module file into its tables.
pub trait ModuleReader: Send + Sync {
    /// Read the module loaded from `path`.
    ///
    /// # Errors
    /// Returns an error if `data` is not a readable module.
    fn read(&self, path: &Path, data: &[u8]) -> Result<ModuleTables>;
}

impl<F> ModuleReader for F
where
    F: Fn(&Path, &[u8]) -> Result<ModuleTables> + Send + Sync,
{
    fn read(&self, path: &Path, data: &[u8]) -> Result<ModuleTables> {
        self(path, data)
    }
}

/// A [`TypeResolver`] that loads referenced modules to find enums defined elsewhere.
///
/// Lookups are tried in the referencing module first. Otherwise the scope of the type
/// reference (or the assembly named by a qualified type name) is handed to the
/// [`ReferenceLocator`], and the first candidate that loads, and whose identity satisfies the
/// reference, is searched. Type forwarders in the target are followed.
///
/// Only modules whose path is known can have their references located: modules loaded by the
/// resolver are known automatically, others have to be [registered](Self::register).
pub struct AssemblyResolver<L: ReferenceLocator> {
    locator: L,
    loader: Arc<dyn ResourceLoader>,
    reader: Arc<dyn ModuleReader>,
    local: LocalTypeResolver,
    loaded: DashMap<PathBuf, Arc<ModuleTables>>,
    paths: DashMap<ModuleId, PathBuf>,
}

impl<L: ReferenceLocator> AssemblyResolver<L> {
    /// Create a resolver probing with `locator`, loading through `loader` and reading modules
    /// with `reader`.
    pub fn new(
        locator: L,
        loader: Arc<dyn ResourceLoader>,
        reader: Arc<dyn ModuleReader>,
    ) -> Self {
        AssemblyResolver {
            locator,
            loader,
            reader,
            local: LocalTypeResolver,
            loaded: DashMap::new(),
            paths: DashMap::new(),
        }
    }

    /// The locator used for probing.
    pub fn locator(&self) -> &L {
        &self.locator
    }

    /// Record that `module` was loaded from `path`.
    pub fn register(&self, path: impl AsRef<Path>, module: &ModuleTables) {
        let path = self.loader.sanitize_resource(path.as_ref());
        self.paths.insert(module.id(), path);
    }

    /// Record an already loaded module so lookups into `path` use it instead of reading the
    /// file.
    pub fn insert_loaded(&self, path: impl AsRef<Path>, module: Arc<ModuleTables>) {
        let path = self.loader.sanitize_resource(path.as_ref());
        self.paths.insert(module.id(), path.clone());
        self.loaded.insert(path, module);
    }

    /// Number of modules loaded or inserted so far.
    pub fn loaded_count(&self) -> usize {
        self.loaded.len()
    }

    /// Load the module at `path`, reusing earlier loads.
    pub fn load(&self, path: &Path) -> Option<Arc<ModuleTables>> {
        let path = self.loader.sanitize_resource(path);
        if let Some(module) = self.loaded.get(&path).map(|entry| Arc::clone(entry.value())) {
            return Some(module);
        }

        if !self.loader.is_valid_resource(&path) {
            tracing::debug!(path = %path.display(), "candidate does not exist");
            return None;
        }

        let module = match self
            .loader
            .get_stream_for(&path)
            .and_then(|stream| self.reader.read(&path, stream.data()))
        {
            Ok(module) => Arc::new(module),
            Err(error) => {
                tracing::warn!(path = %path.display(), %error, "failed to load referenced module");
                return None;
            }
        };

        tracing::debug!(path = %path.display(), module = module.id().value(), "loaded referenced module");
        self.paths.insert(module.id(), path.clone());
        Some(Arc::clone(
            self.loaded.entry(path).or_insert(module).value(),
        ))
    }

    fn path_of(&self, module: &ModuleTables) -> Option<PathBuf> {
        self.paths.get(&module.id()).map(|entry| entry.value().clone())
    }

    fn in_assembly(
        &self,
        this_path: &Path,
        module: &ModuleTables,
        identity: Option<&AssemblyIdentity>,
        raw_name: &str,
        full_name: &str,
        forwards: usize,
    ) -> Option<EnumInfo> {
        let candidates = self
            .locator
            .candidate_resources_for_assembly_reference(this_path, module, identity, raw_name);

        for candidate in &candidates {
            let Some(target) = self.load(candidate) else {
                continue;
            };

            if let (Some(requested), Some(definition)) = (identity, target.row::<AssemblyRow>(0)) {
                let found = AssemblyIdentity::from_assembly(definition);
                if !found.satisfies(requested) {
                    tracing::debug!(
                        path = %candidate.display(),
                        found = %found,
                        requested = %requested,
                        "candidate identity does not match"
                    );
                    continue;
                }
            }

            return self.in_module(candidate, &target, full_name, forwards);
        }

        tracing::debug!(assembly = raw_name, type_name = full_name, "no candidate defines the type");
        None
    }

    fn in_module_reference(
        &self,
        this_path: &Path,
        module: &ModuleTables,
        name: &str,
        full_name: &str,
        forwards: usize,
    ) -> Option<EnumInfo> {
        let candidates = self
            .locator
            .candidate_resources_for_module_reference(this_path, module, name);
        self.in_candidates(&candidates, full_name, forwards)
    }

    /// `File` rows carry the full file name, so the only candidate is that file next to
    /// `this_path`.
    fn in_file(
        &self,
        this_path: &Path,
        name: &str,
        full_name: &str,
        forwards: usize,
    ) -> Option<EnumInfo> {
        let directory = this_path.parent().unwrap_or_else(|| Path::new(""));
        let candidates = CandidatePaths::new(this_path, vec![directory.join(name)]);
        self.in_candidates(&candidates, full_name, forwards)
    }

    fn in_candidates(
        &self,
        candidates: &CandidatePaths,
        full_name: &str,
        forwards: usize,
    ) -> Option<EnumInfo> {
        candidates.iter().find_map(|candidate| {
            let target = self.load(candidate)?;
            self.in_module(candidate, &target, full_name, forwards)
        })
    }

    fn in_module(
        &self,
        path: &Path,
        target: &ModuleTables,
        full_name: &str,
        forwards: usize,
    ) -> Option<EnumInfo> {
        if let Some(info) = self.local.underlying_type_by_name(target, full_name) {
            return Some(info);
        }
        if forwards >= MAX_FORWARDS {
            tracing::warn!(type_name = full_name, "too many type forwarders");
            return None;
        }

        let exported = target.table::<ExportedTypeRow>()?.rows().iter().find(|row| {
            let name = if row.type_namespace.is_empty() {
                row.type_name.clone()
            } else {
                format!("{}.{}", row.type_namespace, row.type_name)
            };
            name == full_name
        })?;

        match exported.implementation.table {
            TableId::AssemblyRef => {
                let reference = target.row::<AssemblyRefRow>(exported.implementation.row)?;
                let identity = AssemblyIdentity::from_assembly_ref(reference);
                self.in_assembly(
                    path,
                    target,
                    Some(&identity),
                    &reference.name,
                    full_name,
                    forwards + 1,
                )
            }
            TableId::File => {
                let file = target.row::<FileRow>(exported.implementation.row)?;
                self.in_file(path, &file.name, full_name, forwards + 1)
            }
            _ => None,
        }
    }
}

/// The scope a `TypeRef` chain ends in; `None` for a null scope, a missing row or a cycle.
fn outermost_scope(module: &ModuleTables, mut index: TableIndex) -> Option<TableIndex> {
    for _ in 0..MAX_SCOPE_DEPTH {
        let scope = module.row::<TypeRefRow>(index.row)?.resolution_scope?;
        if scope.table != TableId::TypeRef {
            return Some(scope);
        }
        index = scope;
    }
    None
}

impl<L: ReferenceLocator> TypeResolver for AssemblyResolver<L> {
    fn underlying_type(&self, module: &ModuleTables, ty: TypeReference<'_>) -> Option<EnumInfo> {
        if let Some(info) = self.local.underlying_type(module, ty) {
            return Some(info);
        }

        let Some(this_path) = self.path_of(module) else {
            tracing::debug!(module = module.id().value(), "module path unknown, references cannot be located");
            return None;
        };

        match ty {
            TypeReference::Index(index) if index.table == TableId::TypeRef => {
                let full_name = type_name(module, index)?;
                let scope = outermost_scope(module, index)?;
                match scope.table {
                    TableId::AssemblyRef => {
                        let reference = module.row::<AssemblyRefRow>(scope.row)?;
                        let identity = AssemblyIdentity::from_assembly_ref(reference);
                        self.in_assembly(
                            &this_path,
                            module,
                            Some(&identity),
                            &reference.name,
                            &full_name,
                            0,
                        )
                    }
                    TableId::ModuleRef => {
                        let reference = module.row::<ModuleRefRow>(scope.row)?;
                        self.in_module_reference(&this_path, module, &reference.name, &full_name, 0)
                    }
                    _ => None,
                }
            }
            TypeReference::Index(_) => None,
            TypeReference::Name(name) => {
                let (full_name, assembly) = split_assembly_qualified(name);
                match assembly {
                    Some(display_name) => {
                        let identity = AssemblyIdentity::parse(display_name).ok();
                        let simple_name = display_name.split(',').next().unwrap_or_default().trim();
                        self.in_assembly(
                            &this_path,
                            module,
                            identity.as_ref(),
                            simple_name,
                            full_name,
                            0,
                        )
                    }
                    None => module.table::<AssemblyRefRow>()?.rows().iter().find_map(|reference| {
                        let identity = AssemblyIdentity::from_assembly_ref(reference);
                        self.in_assembly(
                            &this_path,
                            module,
                            Some(&identity),
                            &reference.name,
                            full_name,
                            0,
                        )
                    }),
                }
            }
        }
    }
}
