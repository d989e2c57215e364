use crate::metadata::token::TableIndex;

/// `CorElementType` constants (ECMA-335 II.23.1.16)
#[allow(non_snake_case, missing_docs)]
pub mod ELEMENT_TYPE {
    pub const END: u8 = 0x00;
    pub const VOID: u8 = 0x01;
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
    pub const PTR: u8 = 0x0F;
    pub const BYREF: u8 = 0x10;
    pub const VALUETYPE: u8 = 0x11;
    pub const CLASS: u8 = 0x12;
    pub const VAR: u8 = 0x13;
    pub const ARRAY: u8 = 0x14;
    pub const GENERICINST: u8 = 0x15;
    pub const TYPEDBYREF: u8 = 0x16;
    pub const I: u8 = 0x18;
    pub const U: u8 = 0x19;
    pub const FNPTR: u8 = 0x1B;
    pub const OBJECT: u8 = 0x1C;
    pub const SZARRAY: u8 = 0x1D;
    pub const MVAR: u8 = 0x1E;
    pub const CMOD_REQD: u8 = 0x1F;
    pub const CMOD_OPT: u8 = 0x20;
    pub const INTERNAL: u8 = 0x21;
    pub const MODIFIER: u8 = 0x40;
    pub const SENTINEL: u8 = 0x41;
    pub const PINNED: u8 = 0x45;
}

/// Returns `true` for the element types an enum may have as its underlying type.
#[must_use]
pub fn is_integral(element_type: u8) -> bool {
    matches!(
        element_type,
        ELEMENT_TYPE::BOOLEAN
            | ELEMENT_TYPE::CHAR
            | ELEMENT_TYPE::I1
            | ELEMENT_TYPE::U1
            | ELEMENT_TYPE::I2
            | ELEMENT_TYPE::U2
            | ELEMENT_TYPE::I4
            | ELEMENT_TYPE::U4
            | ELEMENT_TYPE::I8
            | ELEMENT_TYPE::U8
            | ELEMENT_TYPE::I
            | ELEMENT_TYPE::U
    )
}

/// A parsed type in a signature
#[derive(Debug, Clone, PartialEq, Default)]
pub enum TypeSignature {
    #[default]
    /// Not defined
    Unknown,
    /// void
    Void,
    /// A primitive type, carrying its `ELEMENT_TYPE` value
    Primitive(u8),
    /// System.String
    String,
    /// System.Object
    Object,
    /// System.TypedReference
    TypedByRef,
    /// Unmanaged pointer
    Ptr(Box<TypeSignature>),
    /// Managed pointer
    ByRef(Box<TypeSignature>),
    /// Value type, `TypeDefOrRef` encoded
    ValueType(TableIndex),
    /// Reference type, `TypeDefOrRef` encoded
    Class(TableIndex),
    /// Generic parameter of the enclosing type
    GenericParamType(u32),
    /// Generic parameter of the method
    GenericParamMethod(u32),
    /// General array with its rank
    Array(Box<TypeSignature>, u32),
    /// Single dimension, zero-based array
    SzArray(Box<TypeSignature>),
    /// Generic instantiation and its arguments
    GenericInst(Box<TypeSignature>, Vec<TypeSignature>),
    /// Function pointer
    FnPtr(Box<SignatureMethod>),
    /// A pinned local
    Pinned(Box<TypeSignature>),
}

/// A method signature: `MethodDefSig`, `MethodRefSig` or `StandAloneMethodSig`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SignatureMethod {
    /// The calling convention byte
    pub calling_convention: u8,
    /// An instance receiver is passed
    pub has_this: bool,
    /// The receiver is the first entry of `params`
    pub explicit_this: bool,
    /// Number of generic parameters
    pub generic_param_count: u32,
    /// Return type
    pub return_type: TypeSignature,
    /// Declared parameters
    pub params: Vec<TypeSignature>,
    /// Extra arguments after the vararg sentinel of a call site
    pub varargs: Vec<TypeSignature>,
}

impl SignatureMethod {
    /// Returns `true` if the method returns nothing.
    #[must_use]
    pub fn returns_void(&self) -> bool {
        self.return_type == TypeSignature::Void
    }

    /// Number of arguments a call pops, excluding the receiver.
    #[must_use]
    pub fn argument_count(&self) -> u32 {
        (self.params.len() + self.varargs.len()) as u32
    }
}

/// A field signature
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SignatureField {
    /// The field type
    pub base: TypeSignature,
}
