//! Resolution of raw, context-dependent column values.
//!
//! Some columns cannot be fully decoded when a module is read. A custom attribute blob that
//! passes an enum only records the enum's type, not the width of its underlying integer, so
//! the blob stays [`crate::metadata::customattributes::AttributeBlob::Raw`] until that type has
//! been found - possibly in another module. Resolution turns such cells into their resolved
//! form in place.
//!
//! # Architecture
//!
//! - [`ColumnResolver`] - converts the raw values of one column; attached to a column when the
//!   schema is built
//! - [`ResolutionRegistry`] - owned by each [`crate::metadata::tables::ModuleTables`], pairs
//!   every resolvable column with its resolver and a per-column cache
//! - [`TypeResolver`] - answers "what is the underlying type of this enum"; the cross-module
//!   capability resolvers call into
//! - [`LocalTypeResolver`] - answers from the module itself
//! - [`AssemblyResolver`] - follows references into dependent modules through a
//!   [`crate::metadata::locator::ReferenceLocator`]
//!
//! Resolution never fails loudly. A cell whose types cannot be found stays raw,
//! [`crate::metadata::tables::ModuleTables::resolve`] reports `false`, and
//! [`crate::metadata::tables::ModuleTables::resolve_everything`] lists it in the
//! [`ResolutionSummary`].
//!
//! # Usage Examples
//!
//! ```rust
//! # use std::sync::Arc;
//! # use cilweave::metadata::customattributes::AttributeBlob;
//! # use cilweave::prelude::*;
//! use cilweave::metadata::resolution::LocalTypeResolver;
//!
//! # let mut module = ModuleTables::new(&Arc::new(SchemaProvider::standard()?))?;
//! # let lib = module.add_row(AssemblyRefRow { name: "Lib".to_string(), ..Default::default() })?;
//! # let mode = module.add_row(TypeRefRow {
//! #     resolution_scope: Some(lib),
//! #     type_name: "Mode".to_string(),
//! #     type_namespace: "Lib".to_string(),
//! # })?;
//! # let attribute = module.add_row(TypeRefRow {
//! #     resolution_scope: Some(lib),
//! #     type_name: "ModeAttribute".to_string(),
//! #     type_namespace: "Lib".to_string(),
//! # })?;
//! # let ctor = module.add_row(MemberRefRow {
//! #     class: attribute,
//! #     name: ".ctor".to_string(),
//! #     signature: vec![0x20, 0x01, 0x01, 0x11, (((mode.row + 1) << 2) | 1) as u8],
//! # })?;
//! # let target = module.add_row(TypeDefRow { type_name: "Target".to_string(), ..Default::default() })?;
//! # module.add_row(CustomAttributeRow {
//! #     parent: target,
//! #     constructor: ctor,
//! #     value: AttributeBlob::Raw(vec![0x01, 0x00, 0x02, 0x00, 0x00, 0x00]),
//! # })?;
//! // `Lib.Mode` lives in another assembly, so the local resolver cannot size the argument
//! let summary = module.resolve_everything(&LocalTypeResolver);
//! assert_eq!(summary.attempted, 1);
//! for cell in &summary.unresolved {
//!     println!("{:?}[{}].{} stays raw", cell.table, cell.row, cell.column);
//! }
//! assert_eq!(summary.unresolved[0].table, TableId::CustomAttribute);
//! # Ok::<(), cilweave::Error>(())
//! ```

mod assembly;
mod local;
mod names;
mod registry;
mod resolvers;
mod types;

pub use assembly::{AssemblyResolver, ModuleReader};
pub use local::LocalTypeResolver;
pub use names::{attribute_type_name, find_type_def, split_assembly_qualified, type_name};
pub use registry::ResolutionRegistry;
pub use resolvers::{AttributeValueResolver, PermissionSetResolver};
pub use types::{
    CellAddress, ColumnResolver, ResolutionSummary, ResolveContext, TypeReference, TypeResolver,
};
