//! Custom attribute values in raw and resolved form.
//!
//! The serialized form of an enum argument carries the enum's type but not the width of its
//! underlying integer, so a blob cannot be decoded until every enum it mentions has been looked
//! up. [`AttributeBlob`] therefore starts out [`AttributeBlob::Raw`] and is replaced in place by
//! [`AttributeBlob::Resolved`] once decoding succeeded.

use std::fmt;

use crate::{
    metadata::{
        signatures::{TypeSignature, ELEMENT_TYPE},
        token::TableIndex,
    },
    Result,
};

/// The value column of a `CustomAttribute` row.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeBlob {
    /// The undecoded blob
    Raw(Vec<u8>),
    /// The decoded value with every enum argument bound to its underlying type
    Resolved(CustomAttributeValue),
}

impl AttributeBlob {
    /// Returns `true` once the blob has been decoded.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        matches!(self, AttributeBlob::Resolved(_))
    }

    /// The decoded value, if resolved.
    #[must_use]
    pub fn value(&self) -> Option<&CustomAttributeValue> {
        match self {
            AttributeBlob::Resolved(value) => Some(value),
            AttributeBlob::Raw(_) => None,
        }
    }
}

impl Default for AttributeBlob {
    fn default() -> Self {
        AttributeBlob::Raw(Vec::new())
    }
}

/// A decoded custom attribute
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CustomAttributeValue {
    /// Arguments of the constructor, in parameter order
    pub fixed_args: Vec<CustomAttributeArgument>,
    /// Field and property assignments
    pub named_args: Vec<CustomAttributeNamedArgument>,
}

/// One argument value
#[derive(Debug, Clone, PartialEq)]
pub enum CustomAttributeArgument {
    /// Boolean value
    Bool(bool),
    /// UTF-16 code unit
    Char(char),
    /// Signed 8-bit integer
    I1(i8),
    /// Unsigned 8-bit integer
    U1(u8),
    /// Signed 16-bit integer
    I2(i16),
    /// Unsigned 16-bit integer
    U2(u16),
    /// Signed 32-bit integer
    I4(i32),
    /// Unsigned 32-bit integer
    U4(u32),
    /// Signed 64-bit integer
    I8(i64),
    /// Unsigned 64-bit integer
    U8(u64),
    /// 32-bit floating point
    R4(f32),
    /// 64-bit floating point
    R8(f64),
    /// String, `None` for null
    String(Option<String>),
    /// `System.Type` given by its serialized name, `None` for null
    Type(Option<String>),
    /// Single dimension array, `None` for null
    Array(Option<Vec<CustomAttributeArgument>>),
    /// Enum value: full enum type name and the value in the enum's underlying type
    Enum(String, Box<CustomAttributeArgument>),
}

/// A field or property assignment
#[derive(Debug, Clone, PartialEq)]
pub struct CustomAttributeNamedArgument {
    /// `true` for a field, `false` for a property
    pub is_field: bool,
    /// Name of the field or property
    pub name: String,
    /// Serialized type of the member
    pub arg_type: String,
    /// Assigned value
    pub value: CustomAttributeArgument,
}

/// .NET `CorSerializationType` constants as defined in corhdr.h
#[allow(non_snake_case, missing_docs)]
pub mod SERIALIZATION_TYPE {
    pub const BOOLEAN: u8 = 0x02;
    pub const CHAR: u8 = 0x03;
    pub const I1: u8 = 0x04;
    pub const U1: u8 = 0x05;
    pub const I2: u8 = 0x06;
    pub const U2: u8 = 0x07;
    pub const I4: u8 = 0x08;
    pub const U4: u8 = 0x09;
    pub const I8: u8 = 0x0A;
    pub const U8: u8 = 0x0B;
    pub const R4: u8 = 0x0C;
    pub const R8: u8 = 0x0D;
    pub const STRING: u8 = 0x0E;
    pub const SZARRAY: u8 = 0x1D;
    pub const TYPE: u8 = 0x50;
    pub const TAGGED_OBJECT: u8 = 0x51;
    pub const FIELD: u8 = 0x53;
    pub const PROPERTY: u8 = 0x54;
    pub const ENUM: u8 = 0x55;
}

/// Type of one constructor parameter, as far as the blob encoding is concerned.
#[derive(Debug, Clone, PartialEq)]
pub enum FixedArgType {
    /// A primitive, carrying its `ELEMENT_TYPE` value
    Primitive(u8),
    /// System.String
    String,
    /// System.Type
    Type,
    /// System.Object, serialized with a leading type tag
    Object,
    /// An enum type defined or referenced by the constructor's module
    Enum(TableIndex),
    /// Single dimension array
    SzArray(Box<FixedArgType>),
}

impl FixedArgType {
    /// Map a constructor parameter type to its blob encoding.
    ///
    /// Classes other than `System.String` and `System.Object` can only be `System.Type`, and
    /// value types can only be enums.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] for parameter types attributes cannot carry.
    pub fn from_signature(signature: &TypeSignature) -> Result<FixedArgType> {
        Ok(match signature {
            TypeSignature::Primitive(element_type)
                if *element_type != ELEMENT_TYPE::I && *element_type != ELEMENT_TYPE::U =>
            {
                FixedArgType::Primitive(*element_type)
            }
            TypeSignature::String => FixedArgType::String,
            TypeSignature::Object => FixedArgType::Object,
            TypeSignature::Class(_) => FixedArgType::Type,
            TypeSignature::ValueType(index) => FixedArgType::Enum(*index),
            TypeSignature::SzArray(element) => {
                FixedArgType::SzArray(Box::new(FixedArgType::from_signature(element)?))
            }
            other => {
                return Err(malformed_error!(
                    "Type {:?} cannot be used as an attribute parameter",
                    other
                ))
            }
        })
    }
}

/// Serialized type of a named argument or boxed value.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum SerializedType {
    Primitive(u8),
    String,
    Type,
    TaggedObject,
    Enum(String),
    SzArray(Box<SerializedType>),
}

impl fmt::Display for SerializedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SerializedType::Primitive(tag) => f.write_str(primitive_name(*tag)),
            SerializedType::String => f.write_str("String"),
            SerializedType::Type => f.write_str("Type"),
            SerializedType::TaggedObject => f.write_str("TaggedObject"),
            SerializedType::Enum(name) => f.write_str(name),
            SerializedType::SzArray(element) => write!(f, "{element}[]"),
        }
    }
}

fn primitive_name(tag: u8) -> &'static str {
    match tag {
        SERIALIZATION_TYPE::BOOLEAN => "Boolean",
        SERIALIZATION_TYPE::CHAR => "Char",
        SERIALIZATION_TYPE::I1 => "I1",
        SERIALIZATION_TYPE::U1 => "U1",
        SERIALIZATION_TYPE::I2 => "I2",
        SERIALIZATION_TYPE::U2 => "U2",
        SERIALIZATION_TYPE::I4 => "I4",
        SERIALIZATION_TYPE::U4 => "U4",
        SERIALIZATION_TYPE::I8 => "I8",
        SERIALIZATION_TYPE::U8 => "U8",
        SERIALIZATION_TYPE::R4 => "R4",
        SERIALIZATION_TYPE::R8 => "R8",
        _ => "Unknown",
    }
}
