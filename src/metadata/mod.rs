//! The logical metadata model of a managed module.
//!
//! # Key Components
//!
//! - [`tables`] - schema-driven tables, typed rows and the per-module [`tables::ModuleTables`]
//! - [`token`] - packing `(table, row)` pairs into 32-bit tokens
//! - [`signatures`] - the parts of signature blobs the engine needs
//! - [`method`] - method bodies and exception handling clauses
//! - [`customattributes`] / [`security`] - raw and resolved attribute and permission blobs
//! - [`resolution`] - turning raw column values into resolved ones, across modules if needed
//! - [`identity`] - assembly names, versions, public keys and strong-name signing
//! - [`locator`] - where referenced modules and assemblies live on disk
//!
//! # Examples
//!
//! ```rust
//! use std::sync::Arc;
//! use cilweave::metadata::{
//!     resolution::LocalTypeResolver,
//!     tables::{ModuleRow, ModuleTables, SchemaProvider, TableId},
//! };
//!
//! let provider = Arc::new(SchemaProvider::standard()?);
//! let mut module = ModuleTables::new(&provider)?;
//! module.add_row(ModuleRow { name: "App.dll".to_string(), ..Default::default() })?;
//!
//! assert_eq!(module.row_count(TableId::Module), 1);
//! assert!(module.resolve_everything(&LocalTypeResolver).is_complete());
//! # Ok::<(), cilweave::Error>(())
//! ```

pub mod customattributes;
pub mod identity;
pub mod locator;
pub mod method;
pub mod resolution;
pub mod security;
pub mod signatures;
pub mod tables;
pub mod token;
