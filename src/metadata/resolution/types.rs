use std::{any::Any, fmt, sync::Arc};

use crate::metadata::{
    customattributes::EnumInfo,
    tables::{ColumnValue, ModuleTables, TableId},
    token::TableIndex,
};

/// How a blob refers to a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeReference<'a> {
    /// A `TypeDef` or `TypeRef` row of the module the blob belongs to
    Index(TableIndex),
    /// A serialized type name, possibly assembly-qualified
    Name(&'a str),
}

impl fmt::Display for TypeReference<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeReference::Index(index) => write!(f, "{index}"),
            TypeReference::Name(name) => f.write_str(name),
        }
    }
}

/// Finds the underlying type of enums referenced from a module.
///
/// Implementations may load other modules; they report a type they cannot find as `None`.
pub trait TypeResolver {
    /// The name and underlying element type of the enum `ty`, referenced from `module`.
    fn underlying_type(&self, module: &ModuleTables, ty: TypeReference<'_>) -> Option<EnumInfo>;
}

impl<T: TypeResolver + ?Sized> TypeResolver for &T {
    fn underlying_type(&self, module: &ModuleTables, ty: TypeReference<'_>) -> Option<EnumInfo> {
        (**self).underlying_type(module, ty)
    }
}

impl<T: TypeResolver + ?Sized> TypeResolver for Arc<T> {
    fn underlying_type(&self, module: &ModuleTables, ty: TypeReference<'_>) -> Option<EnumInfo> {
        (**self).underlying_type(module, ty)
    }
}

/// Everything a [`ColumnResolver`] may consult while resolving one cell.
pub struct ResolveContext<'a> {
    /// The module owning the cell
    pub module: &'a ModuleTables,
    /// Source of enum information
    pub resolver: &'a dyn TypeResolver,
    /// Table of the cell
    pub table: TableId,
    /// Row of the cell
    pub row: u32,
}

/// Converts raw values of one column into their resolved form.
///
/// A resolver is shared by every module built from the same schema provider. State that is
/// worth keeping across rows lives in the cache object the resolver creates for each module,
/// which is handed back on every call for that module's column.
pub trait ColumnResolver: Send + Sync {
    /// Create an empty per-column cache.
    fn create_cache(&self) -> Box<dyn Any + Send>;

    /// Returns `true` if `value` is still in raw form.
    fn needs_resolution(&self, value: &ColumnValue) -> bool;

    /// Resolve `value`, or `None` if it cannot be resolved right now.
    fn resolve(
        &self,
        context: &ResolveContext<'_>,
        value: &ColumnValue,
        cache: &mut (dyn Any + Send),
    ) -> Option<ColumnValue>;
}

/// The address of one cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellAddress {
    /// Table kind
    pub table: TableId,
    /// Zero-based row
    pub row: u32,
    /// Column position
    pub column: usize,
}

/// Outcome of a bulk resolution pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionSummary {
    /// Raw cells a resolution was attempted for
    pub attempted: usize,
    /// Cells that changed to their resolved form
    pub resolved: usize,
    /// Cells left raw
    pub unresolved: Vec<CellAddress>,
}

impl ResolutionSummary {
    /// Returns `true` if every attempted cell was resolved.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.unresolved.is_empty()
    }

    /// Add the counts of `other` to this summary.
    pub fn merge(&mut self, other: ResolutionSummary) {
        self.attempted += other.attempted;
        self.resolved += other.resolved;
        self.unresolved.extend(other.unresolved);
    }
}
