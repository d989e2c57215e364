//! Custom attribute values.
//!
//! The `value` column of [`crate::metadata::tables::CustomAttributeRow`] holds an
//! [`AttributeBlob`]. Readers store the blob [`AttributeBlob::Raw`]; the resolver registered for
//! that column decodes it with [`parse_custom_attribute`] once the underlying types of all enums
//! it mentions are known, and replaces it with [`AttributeBlob::Resolved`].
//!
//! # Blob layout
//!
//! ```text
//! 0x0001                          prolog
//! FixedArg*                       one per constructor parameter
//! NumNamed (u16)
//! NamedArg*                       0x53 field / 0x54 property, type, name, value
//! ```
//!
//! # References
//! - ECMA-335 6th Edition, Partition II, Section 23.3 - Custom Attributes

mod parser;
mod types;

pub(crate) use parser::CustomAttributeParser;
pub use parser::{parse_custom_attribute, Decoded, EnumInfo, EnumLookup};
pub use types::{
    AttributeBlob, CustomAttributeArgument, CustomAttributeNamedArgument, CustomAttributeValue,
    FixedArgType, SERIALIZATION_TYPE,
};
