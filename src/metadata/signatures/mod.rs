//! Method and field signature decoding.
//!
//! Only the parts of the signature grammar other components rely on are modelled: the shape of
//! method signatures (receiver, arity, return type) for stack-depth analysis and attribute
//! constructors, and field types for enum underlying-type lookups. Nested types are parsed
//! completely so that every parameter is consumed, but custom modifiers and array bounds are
//! skipped.
//!
//! # Examples
//!
//! ```rust
//! use cilweave::metadata::signatures::{parse_method_signature, TypeSignature, ELEMENT_TYPE};
//!
//! // instance void (int32)
//! let sig = parse_method_signature(&[0x20, 0x01, 0x01, 0x08])?;
//! assert!(sig.has_this && sig.returns_void());
//! assert_eq!(sig.params, vec![TypeSignature::Primitive(ELEMENT_TYPE::I4)]);
//! # Ok::<(), cilweave::Error>(())
//! ```
//!
//! # References
//!
//! - ECMA-335 6th Edition, Partition II, Section 23.2 - Blobs and Signatures

mod parser;
mod types;

pub use parser::*;
pub use types::*;

use crate::Result;

/// Parse a method signature blob.
///
/// # Errors
/// Returns an error if the blob is not a well-formed method signature.
pub fn parse_method_signature(data: &[u8]) -> Result<SignatureMethod> {
    let mut parser = SignatureParser::new(data);
    parser.parse_method_signature()
}

/// Parse a field signature blob.
///
/// # Errors
/// Returns an error if the blob is not a well-formed field signature.
pub fn parse_field_signature(data: &[u8]) -> Result<SignatureField> {
    let mut parser = SignatureParser::new(data);
    parser.parse_field_signature()
}
