//! Custom attribute blob decoding (ECMA-335 II.23.3).
//!
//! Fixed arguments are decoded against the constructor's parameter types, named arguments
//! against the serialized type tags in the blob. Enum values need the width of the enum's
//! underlying type, which the blob does not carry; the parser asks an [`EnumLookup`] for it and
//! reports the blob as unresolved when the lookup has no answer.

use crate::{
    file::parser::Parser,
    metadata::{
        customattributes::{
            types::{SerializedType, SERIALIZATION_TYPE},
            CustomAttributeArgument, CustomAttributeNamedArgument, CustomAttributeValue,
            FixedArgType,
        },
        resolution::TypeReference,
        signatures::ELEMENT_TYPE,
    },
    Error, Result,
};

/// Maximum nesting of arrays and boxed values inside one blob
const MAX_NESTING_DEPTH: usize = 32;

/// Name and underlying element type of an enum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumInfo {
    /// Full type name, nested types separated by `+`
    pub name: String,
    /// `ELEMENT_TYPE` of the enum's `value__` field
    pub underlying: u8,
}

/// Source of enum information while decoding.
pub trait EnumLookup {
    /// Look up the enum `ty`, `None` if it cannot be found.
    fn lookup(&mut self, ty: TypeReference<'_>) -> Option<EnumInfo>;
}

impl<F> EnumLookup for F
where
    F: FnMut(TypeReference<'_>) -> Option<EnumInfo>,
{
    fn lookup(&mut self, ty: TypeReference<'_>) -> Option<EnumInfo> {
        self(ty)
    }
}

/// Outcome of decoding a blob.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded<T> {
    /// Every value, including all enums, was decoded
    Complete(T),
    /// An enum could not be looked up; carries a description of the enum
    Unresolved(String),
}

/// Decode a custom attribute blob.
///
/// ```rust
/// use cilweave::metadata::customattributes::{
///     parse_custom_attribute, CustomAttributeArgument, Decoded, EnumInfo, FixedArgType,
/// };
/// use cilweave::metadata::signatures::ELEMENT_TYPE;
///
/// let blob = [0x01, 0x00, 0x05, b'H', b'e', b'l', b'l', b'o', 0x00, 0x00];
/// let mut no_enums = |_: cilweave::metadata::resolution::TypeReference<'_>| -> Option<EnumInfo> {
///     None
/// };
///
/// let Decoded::Complete(value) =
///     parse_custom_attribute(&blob, &[FixedArgType::String], &mut no_enums)?
/// else {
///     unreachable!()
/// };
/// assert_eq!(
///     value.fixed_args[0],
///     CustomAttributeArgument::String(Some("Hello".into()))
/// );
/// # Ok::<(), cilweave::Error>(())
/// ```
///
/// # Errors
/// Returns [`crate::Error::Malformed`] for an invalid prolog, truncated data or unknown type
/// tags. A failed enum lookup is not an error; it yields [`Decoded::Unresolved`].
pub fn parse_custom_attribute(
    data: &[u8],
    params: &[FixedArgType],
    lookup: &mut dyn EnumLookup,
) -> Result<Decoded<CustomAttributeValue>> {
    let mut parser = CustomAttributeParser::new(data, lookup);
    parser.finish(|parser| parser.parse_custom_attribute(params))
}

/// Stateful decoder over one blob.
pub(crate) struct CustomAttributeParser<'a, 'l> {
    parser: Parser<'a>,
    lookup: &'l mut dyn EnumLookup,
    unresolved: Option<String>,
    depth: usize,
}

impl<'a, 'l> CustomAttributeParser<'a, 'l> {
    pub(crate) fn new(data: &'a [u8], lookup: &'l mut dyn EnumLookup) -> Self {
        CustomAttributeParser {
            parser: Parser::new(data),
            lookup,
            unresolved: None,
            depth: 0,
        }
    }

    pub(crate) fn parser(&mut self) -> &mut Parser<'a> {
        &mut self.parser
    }

    /// Run `body` and turn a failed enum lookup into [`Decoded::Unresolved`].
    pub(crate) fn finish<T>(
        &mut self,
        body: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<Decoded<T>> {
        match body(self) {
            Ok(value) => Ok(Decoded::Complete(value)),
            Err(error) => match self.unresolved.take() {
                Some(description) => Ok(Decoded::Unresolved(description)),
                None => Err(error),
            },
        }
    }

    fn parse_custom_attribute(&mut self, params: &[FixedArgType]) -> Result<CustomAttributeValue> {
        let prolog = self.parser.read_le::<u16>()?;
        if prolog != 0x0001 {
            return Err(malformed_error!(
                "Invalid custom attribute prolog - expected 0x0001"
            ));
        }

        let mut fixed_args = Vec::with_capacity(params.len());
        for param in params {
            fixed_args.push(self.parse_fixed_argument(param)?);
        }

        let named_args = if self.parser.remaining() >= 2 {
            let count = self.parser.read_le::<u16>()?;
            self.parse_named_arguments(u32::from(count))?
        } else {
            Vec::new()
        };

        Ok(CustomAttributeValue {
            fixed_args,
            named_args,
        })
    }

    pub(crate) fn parse_named_arguments(
        &mut self,
        count: u32,
    ) -> Result<Vec<CustomAttributeNamedArgument>> {
        let mut args = Vec::with_capacity(count.min(64) as usize);
        for _ in 0..count {
            args.push(self.parse_named_argument()?);
        }
        Ok(args)
    }

    fn parse_named_argument(&mut self) -> Result<CustomAttributeNamedArgument> {
        let field_or_prop = self.parser.read_le::<u8>()?;
        let is_field = match field_or_prop {
            SERIALIZATION_TYPE::FIELD => true,
            SERIALIZATION_TYPE::PROPERTY => false,
            _ => {
                return Err(malformed_error!(
                    "Invalid field/property indicator: 0x{:02X}",
                    field_or_prop
                ))
            }
        };

        let arg_type = self.parse_serialized_type()?;
        let Some(name) = self.parser.read_ser_string()? else {
            return Err(malformed_error!("Named argument without a name"));
        };
        let value = self.parse_serialized_value(&arg_type)?;

        Ok(CustomAttributeNamedArgument {
            is_field,
            name,
            arg_type: arg_type.to_string(),
            value,
        })
    }

    fn enter(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > MAX_NESTING_DEPTH {
            return Err(malformed_error!(
                "Custom attribute nesting exceeds {} levels",
                MAX_NESTING_DEPTH
            ));
        }
        Ok(())
    }

    fn parse_serialized_type(&mut self) -> Result<SerializedType> {
        self.enter()?;
        let tag = self.parser.read_le::<u8>()?;
        let parsed = match tag {
            SERIALIZATION_TYPE::BOOLEAN..=SERIALIZATION_TYPE::R8 => SerializedType::Primitive(tag),
            SERIALIZATION_TYPE::STRING => SerializedType::String,
            SERIALIZATION_TYPE::TYPE => SerializedType::Type,
            SERIALIZATION_TYPE::TAGGED_OBJECT => SerializedType::TaggedObject,
            SERIALIZATION_TYPE::ENUM => match self.parser.read_ser_string()? {
                Some(name) => SerializedType::Enum(name),
                None => return Err(malformed_error!("Enum type without a name")),
            },
            SERIALIZATION_TYPE::SZARRAY => {
                SerializedType::SzArray(Box::new(self.parse_serialized_type()?))
            }
            _ => {
                return Err(malformed_error!(
                    "Unsupported serialization type: 0x{:02X}",
                    tag
                ))
            }
        };
        self.depth -= 1;
        Ok(parsed)
    }

    fn parse_fixed_argument(&mut self, ty: &FixedArgType) -> Result<CustomAttributeArgument> {
        self.enter()?;
        let parsed = match ty {
            FixedArgType::Primitive(element_type) => self.parse_primitive(*element_type)?,
            FixedArgType::String => CustomAttributeArgument::String(self.parser.read_ser_string()?),
            FixedArgType::Type => CustomAttributeArgument::Type(self.parser.read_ser_string()?),
            FixedArgType::Object => {
                let boxed = self.parse_serialized_type()?;
                self.parse_serialized_value(&boxed)?
            }
            FixedArgType::Enum(index) => {
                let info = self.resolve_enum(TypeReference::Index(*index))?;
                CustomAttributeArgument::Enum(
                    info.name,
                    Box::new(self.parse_primitive(info.underlying)?),
                )
            }
            FixedArgType::SzArray(element) => match self.parse_array_length()? {
                None => CustomAttributeArgument::Array(None),
                Some(length) => {
                    let mut items = Vec::with_capacity(length.min(1024) as usize);
                    for _ in 0..length {
                        items.push(self.parse_fixed_argument(element)?);
                    }
                    CustomAttributeArgument::Array(Some(items))
                }
            },
        };
        self.depth -= 1;
        Ok(parsed)
    }

    fn parse_serialized_value(&mut self, ty: &SerializedType) -> Result<CustomAttributeArgument> {
        self.enter()?;
        let parsed = match ty {
            SerializedType::Primitive(tag) => self.parse_primitive(*tag)?,
            SerializedType::String => CustomAttributeArgument::String(self.parser.read_ser_string()?),
            SerializedType::Type => CustomAttributeArgument::Type(self.parser.read_ser_string()?),
            SerializedType::TaggedObject => {
                let boxed = self.parse_serialized_type()?;
                self.parse_serialized_value(&boxed)?
            }
            SerializedType::Enum(name) => {
                let info = self.resolve_enum(TypeReference::Name(name))?;
                CustomAttributeArgument::Enum(
                    info.name,
                    Box::new(self.parse_primitive(info.underlying)?),
                )
            }
            SerializedType::SzArray(element) => match self.parse_array_length()? {
                None => CustomAttributeArgument::Array(None),
                Some(length) => {
                    let mut items = Vec::with_capacity(length.min(1024) as usize);
                    for _ in 0..length {
                        items.push(self.parse_serialized_value(element)?);
                    }
                    CustomAttributeArgument::Array(Some(items))
                }
            },
        };
        self.depth -= 1;
        Ok(parsed)
    }

    fn parse_array_length(&mut self) -> Result<Option<u32>> {
        let length = self.parser.read_le::<u32>()?;
        if length == u32::MAX {
            return Ok(None);
        }
        if length as usize > self.parser.remaining() {
            return Err(malformed_error!(
                "Array of {} elements exceeds the remaining {} bytes",
                length,
                self.parser.remaining()
            ));
        }
        Ok(Some(length))
    }

    fn resolve_enum(&mut self, ty: TypeReference<'_>) -> Result<EnumInfo> {
        let description = ty.to_string();
        match self.lookup.lookup(ty) {
            Some(info) => Ok(info),
            None => {
                self.unresolved = Some(description.clone());
                Err(Error::Error(format!("Enum type {description} not found")))
            }
        }
    }

    fn parse_primitive(&mut self, element_type: u8) -> Result<CustomAttributeArgument> {
        Ok(match element_type {
            ELEMENT_TYPE::BOOLEAN => CustomAttributeArgument::Bool(self.parser.read_le::<u8>()? != 0),
            ELEMENT_TYPE::CHAR => {
                let unit = self.parser.read_le::<u16>()?;
                match char::from_u32(u32::from(unit)) {
                    Some(character) => CustomAttributeArgument::Char(character),
                    None => return Err(malformed_error!("Invalid char value: 0x{:04X}", unit)),
                }
            }
            ELEMENT_TYPE::I1 => CustomAttributeArgument::I1(self.parser.read_le::<i8>()?),
            ELEMENT_TYPE::U1 => CustomAttributeArgument::U1(self.parser.read_le::<u8>()?),
            ELEMENT_TYPE::I2 => CustomAttributeArgument::I2(self.parser.read_le::<i16>()?),
            ELEMENT_TYPE::U2 => CustomAttributeArgument::U2(self.parser.read_le::<u16>()?),
            ELEMENT_TYPE::I4 => CustomAttributeArgument::I4(self.parser.read_le::<i32>()?),
            ELEMENT_TYPE::U4 => CustomAttributeArgument::U4(self.parser.read_le::<u32>()?),
            ELEMENT_TYPE::I8 => CustomAttributeArgument::I8(self.parser.read_le::<i64>()?),
            ELEMENT_TYPE::U8 => CustomAttributeArgument::U8(self.parser.read_le::<u64>()?),
            ELEMENT_TYPE::R4 => CustomAttributeArgument::R4(self.parser.read_le::<f32>()?),
            ELEMENT_TYPE::R8 => CustomAttributeArgument::R8(self.parser.read_le::<f64>()?),
            _ => {
                return Err(malformed_error!(
                    "Element type 0x{:02X} is not a serializable primitive",
                    element_type
                ))
            }
        })
    }
}
