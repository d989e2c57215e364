//! The schema-driven table model.
//!
//! Every table kind of ECMA-335 (`0x00..=0x2C`) is described by a [`TableSchema`]: its columns,
//! a row factory, row equality and, for sorted tables, the ordering the persisted format
//! requires. Concrete storage is a [`MetadataTable`] per row type, reachable through the
//! type-erased [`Table`] trait so that merge and resolution code can walk all tables of a
//! module without knowing their row types.
//!
//! # Architecture
//!
//! - [`TableId`] - the table kinds, split into a fixed and an additional region
//! - [`ColumnValue`] / [`ColumnType`] - the shared cell representation
//! - [`TableSchema`] / [`SchemaProvider`] - schemas, registered once per provider
//! - [`MetadataTable`] / [`Table`] - append-only row storage
//! - [`ModuleTables`] - all tables of one module
//!
//! # Usage Examples
//!
//! ```rust
//! use std::sync::Arc;
//! use cilweave::metadata::tables::{ModuleRefRow, ModuleTables, SchemaProvider, TableId};
//!
//! let provider = Arc::new(SchemaProvider::standard()?);
//! let mut module = ModuleTables::new(&provider)?;
//!
//! let index = module.add_row(ModuleRefRow { name: "native.dll".into() })?;
//! assert_eq!(index.table, TableId::ModuleRef);
//! assert_eq!(module.row_count(TableId::ModuleRef), 1);
//!
//! let table = module.try_get_by_table(TableId::ModuleRef).unwrap();
//! assert_eq!(table.column_name(0), Some("name"));
//! # Ok::<(), cilweave::Error>(())
//! ```
//!
//! # References
//! - ECMA-335 6th Edition, Partition II, Section 22 - Metadata logical format: tables

mod codedindex;
mod moduletables;
mod rows;
mod schema;
mod table;
mod tableid;
mod value;

pub use codedindex::CodedIndexType;
pub use moduletables::{ModuleId, ModuleTables, TableCapacities};
pub use rows::*;
pub use schema::{
    AnySchema, ColumnGetter, ColumnSchema, ColumnSetter, ResolvableColumn, SchemaProvider,
    TableRow, TableSchema, TableSchemaBuilder,
};
pub use table::{MetadataTable, Table};
pub use tableid::{TableId, FIXED_TABLE_COUNT};
pub use value::{ColumnError, ColumnKind, ColumnType, ColumnValue};
