//! Declarative security permission sets.
//!
//! The `permission_set` column of [`crate::metadata::tables::DeclSecurityRow`] holds a
//! [`SecurityBlob`]. Two encodings exist:
//!
//! - the binary format introduced with .NET 2.0, starting with `.`, which lists permission
//!   attributes by type name and carries their settings as custom attribute named arguments
//! - the legacy XML format, a UTF-16LE `<PermissionSet>` document
//!
//! Binary sets may assign enum-typed properties, which cannot be decoded without the enum's
//! underlying type. Like custom attributes, they are stored raw and resolved later through the
//! column resolver registered for the `permission_set` column. XML sets carry every value as
//! text and never need lookups.
//!
//! # Usage Examples
//!
//! ```rust
//! use cilweave::metadata::security::{parse_permission_set, PermissionSetFormat};
//! use cilweave::metadata::customattributes::{Decoded, EnumInfo};
//! use cilweave::metadata::resolution::TypeReference;
//!
//! let xml: Vec<u8> = "<PermissionSet class=\"System.Security.PermissionSet\" Unrestricted=\"true\"/>"
//!     .encode_utf16()
//!     .flat_map(u16::to_le_bytes)
//!     .collect();
//!
//! let mut no_enums = |_: TypeReference<'_>| -> Option<EnumInfo> { None };
//! let Decoded::Complete(set) = parse_permission_set(&xml, &mut no_enums)? else {
//!     unreachable!()
//! };
//! assert_eq!(set.format, PermissionSetFormat::Xml);
//! assert!(set.unrestricted);
//! # Ok::<(), cilweave::Error>(())
//! ```
//!
//! # References
//! - ECMA-335 6th Edition, Partition II, Section 22.11 - DeclSecurity
//! - ECMA-335 6th Edition, Partition II, Section 23.1.3 - Security actions

mod permissionset;
mod types;

pub use permissionset::parse_permission_set;
pub use types::{Permission, PermissionSet, PermissionSetFormat, SecurityAction, SecurityBlob};
