//! # cilweave Prelude
//!
//! The most commonly used types and traits in one import.
//!
//! ```rust
//! use cilweave::prelude::*;
//! ```

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all cilweave operations
pub use crate::Error;

/// The result type used throughout cilweave
pub use crate::Result;

/// Bounds-checked byte cursor
pub use crate::Parser;

/// Module loading collaborators
pub use crate::file::{FileSystemLoader, MemoryLoader, ResourceLoader};

// ================================================================================================
// Tables and Tokens
// ================================================================================================

/// Tokens and row addresses
pub use crate::metadata::token::{Token, TableIndex};

/// Table model
pub use crate::metadata::tables::{
    ColumnValue, MetadataTable, ModuleTables, SchemaProvider, Table, TableCapacities, TableId,
    TableRow,
};

/// Frequently used row types
pub use crate::metadata::tables::{
    AssemblyRefRow, AssemblyRow, CustomAttributeRow, DeclSecurityRow, FieldRow, MemberRefRow,
    MethodDefRow, ModuleRefRow, ModuleRow, TypeDefRow, TypeRefRow,
};

// ================================================================================================
// Resolution
// ================================================================================================

/// Resolution traits and results
pub use crate::metadata::resolution::{
    AssemblyResolver, LocalTypeResolver, ModuleReader, ResolutionSummary, TypeResolver,
};

/// Resolved blob values
pub use crate::metadata::customattributes::CustomAttributeValue;
pub use crate::metadata::security::PermissionSet;

// ================================================================================================
// Identities and Reference Probing
// ================================================================================================

/// Assembly names and strong names
pub use crate::metadata::identity::{
    AssemblyIdentity, AssemblyVersion, KeyBlob, RsaParameters, StrongNamePublicKey,
};

/// Reference locators
pub use crate::metadata::locator::{
    ConcurrentLocator, LocatorConfig, LockedLocator, ReferenceLocator, SingleThreadedLocator,
};

// ================================================================================================
// Method Bodies
// ================================================================================================

/// Method bodies and exception clauses
pub use crate::metadata::method::{ExceptionHandler, ExceptionHandlerFlags, MethodBody};

/// Instruction decoding and stack depth analysis
pub use crate::assembly::{decode_instruction, decode_stream, Instruction, StackDepthAnalyzer};
