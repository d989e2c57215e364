use strum::{EnumCount, EnumIter};

/// Number of table kinds stored directly as fields of [`crate::metadata::tables::ModuleTables`].
///
/// Kinds `0x00..FIXED_TABLE_COUNT` (`Module` through `DeclSecurity`) form the fixed region; all
/// higher kinds live in the sparse additional region.
pub const FIXED_TABLE_COUNT: usize = 15;

/// Identifiers for the metadata tables defined in ECMA-335 Partition II, Section 22.
///
/// The numeric values are the table kinds of the persisted format and are used verbatim as the
/// high byte of a [`crate::metadata::token::Token`].
///
/// ## Table Categories
///
/// ### Core Type System
/// - **`Module`**, **`TypeDef`**, **`TypeRef`**, **`Field`**, **`MethodDef`**, **`Param`**
///
/// ### Type Relationships
/// - **`InterfaceImpl`**, **`NestedClass`**, **`ClassLayout`**, **`FieldLayout`**
///
/// ### Member References
/// - **`MemberRef`**, **`MethodImpl`**, **`MethodSemantics`**
///
/// ### Metadata and Attributes
/// - **`CustomAttribute`**, **`Constant`**, **`FieldMarshal`**, **`DeclSecurity`**
///
/// ### Signatures and Specifications
/// - **`StandAloneSig`**, **`TypeSpec`**, **`MethodSpec`**, **`GenericParam`**,
///   **`GenericParamConstraint`**
///
/// ### Events and Properties
/// - **`Event`**, **`EventMap`**, **`Property`**, **`PropertyMap`**
///
/// ### Assembly Information
/// - **`Assembly`**, **`AssemblyRef`** and their processor / OS companions
///
/// ### Files, Resources and Interop
/// - **`File`**, **`ExportedType`**, **`ManifestResource`**, **`ImplMap`**, **`FieldRVA`**,
///   **`ModuleRef`**
#[derive(Clone, Copy, PartialEq, Debug, EnumIter, EnumCount, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum TableId {
    /// `Module` table (0x00) - the module itself: name, MVID and generation.
    Module = 0x00,
    /// `TypeRef` table (0x01) - references to types defined elsewhere.
    TypeRef = 0x01,
    /// `TypeDef` table (0x02) - type definitions.
    TypeDef = 0x02,
    /// `FieldPtr` table (0x03) - field indirection, only present in unoptimized metadata.
    FieldPtr = 0x03,
    /// `Field` table (0x04) - field definitions.
    Field = 0x04,
    /// `MethodPtr` table (0x05) - method indirection, only present in unoptimized metadata.
    MethodPtr = 0x05,
    /// `MethodDef` table (0x06) - method definitions, including their bodies.
    MethodDef = 0x06,
    /// `ParamPtr` table (0x07) - parameter indirection.
    ParamPtr = 0x07,
    /// `Param` table (0x08) - parameter definitions.
    Param = 0x08,
    /// `InterfaceImpl` table (0x09) - interfaces implemented by types.
    InterfaceImpl = 0x09,
    /// `MemberRef` table (0x0A) - references to fields and methods.
    MemberRef = 0x0A,
    /// `Constant` table (0x0B) - compile-time constants of fields, params and properties.
    Constant = 0x0B,
    /// `CustomAttribute` table (0x0C) - custom attribute applications.
    CustomAttribute = 0x0C,
    /// `FieldMarshal` table (0x0D) - interop marshalling descriptors.
    FieldMarshal = 0x0D,
    /// `DeclSecurity` table (0x0E) - declarative security permission sets.
    DeclSecurity = 0x0E,
    /// `ClassLayout` table (0x0F) - explicit type layout.
    ClassLayout = 0x0F,
    /// `FieldLayout` table (0x10) - explicit field offsets.
    FieldLayout = 0x10,
    /// `StandAloneSig` table (0x11) - local variable and `calli` signatures.
    StandAloneSig = 0x11,
    /// `EventMap` table (0x12) - type to event-list mapping.
    EventMap = 0x12,
    /// `EventPtr` table (0x13) - event indirection.
    EventPtr = 0x13,
    /// `Event` table (0x14) - event definitions.
    Event = 0x14,
    /// `PropertyMap` table (0x15) - type to property-list mapping.
    PropertyMap = 0x15,
    /// `PropertyPtr` table (0x16) - property indirection.
    PropertyPtr = 0x16,
    /// `Property` table (0x17) - property definitions.
    Property = 0x17,
    /// `MethodSemantics` table (0x18) - accessor methods of events and properties.
    MethodSemantics = 0x18,
    /// `MethodImpl` table (0x19) - explicit method overrides.
    MethodImpl = 0x19,
    /// `ModuleRef` table (0x1A) - references to other modules of the same assembly.
    ModuleRef = 0x1A,
    /// `TypeSpec` table (0x1B) - constructed type signatures.
    TypeSpec = 0x1B,
    /// `ImplMap` table (0x1C) - P/Invoke mappings.
    ImplMap = 0x1C,
    /// `FieldRVA` table (0x1D) - initial data of fields.
    FieldRVA = 0x1D,
    /// `EncLog` table (0x1E) - edit-and-continue log.
    EncLog = 0x1E,
    /// `EncMap` table (0x1F) - edit-and-continue token map.
    EncMap = 0x1F,
    /// `Assembly` table (0x20) - the assembly manifest.
    Assembly = 0x20,
    /// `AssemblyProcessor` table (0x21) - unused by current runtimes.
    AssemblyProcessor = 0x21,
    /// `AssemblyOS` table (0x22) - unused by current runtimes.
    AssemblyOS = 0x22,
    /// `AssemblyRef` table (0x23) - references to other assemblies.
    AssemblyRef = 0x23,
    /// `AssemblyRefProcessor` table (0x24) - unused by current runtimes.
    AssemblyRefProcessor = 0x24,
    /// `AssemblyRefOS` table (0x25) - unused by current runtimes.
    AssemblyRefOS = 0x25,
    /// `File` table (0x26) - other files of a multi-file assembly.
    File = 0x26,
    /// `ExportedType` table (0x27) - types forwarded or exported from other files.
    ExportedType = 0x27,
    /// `ManifestResource` table (0x28) - embedded and linked resources.
    ManifestResource = 0x28,
    /// `NestedClass` table (0x29) - nesting relationships.
    NestedClass = 0x29,
    /// `GenericParam` table (0x2A) - generic parameters of types and methods.
    GenericParam = 0x2A,
    /// `MethodSpec` table (0x2B) - generic method instantiations.
    MethodSpec = 0x2B,
    /// `GenericParamConstraint` table (0x2C) - constraints on generic parameters.
    GenericParamConstraint = 0x2C,
}

impl TableId {
    /// The highest table kind known to the engine.
    pub const MAX: TableId = TableId::GenericParamConstraint;

    /// Look up a table kind by its numeric value.
    #[must_use]
    pub fn from_u8(value: u8) -> Option<TableId> {
        let id = match value {
            0x00 => TableId::Module,
            0x01 => TableId::TypeRef,
            0x02 => TableId::TypeDef,
            0x03 => TableId::FieldPtr,
            0x04 => TableId::Field,
            0x05 => TableId::MethodPtr,
            0x06 => TableId::MethodDef,
            0x07 => TableId::ParamPtr,
            0x08 => TableId::Param,
            0x09 => TableId::InterfaceImpl,
            0x0A => TableId::MemberRef,
            0x0B => TableId::Constant,
            0x0C => TableId::CustomAttribute,
            0x0D => TableId::FieldMarshal,
            0x0E => TableId::DeclSecurity,
            0x0F => TableId::ClassLayout,
            0x10 => TableId::FieldLayout,
            0x11 => TableId::StandAloneSig,
            0x12 => TableId::EventMap,
            0x13 => TableId::EventPtr,
            0x14 => TableId::Event,
            0x15 => TableId::PropertyMap,
            0x16 => TableId::PropertyPtr,
            0x17 => TableId::Property,
            0x18 => TableId::MethodSemantics,
            0x19 => TableId::MethodImpl,
            0x1A => TableId::ModuleRef,
            0x1B => TableId::TypeSpec,
            0x1C => TableId::ImplMap,
            0x1D => TableId::FieldRVA,
            0x1E => TableId::EncLog,
            0x1F => TableId::EncMap,
            0x20 => TableId::Assembly,
            0x21 => TableId::AssemblyProcessor,
            0x22 => TableId::AssemblyOS,
            0x23 => TableId::AssemblyRef,
            0x24 => TableId::AssemblyRefProcessor,
            0x25 => TableId::AssemblyRefOS,
            0x26 => TableId::File,
            0x27 => TableId::ExportedType,
            0x28 => TableId::ManifestResource,
            0x29 => TableId::NestedClass,
            0x2A => TableId::GenericParam,
            0x2B => TableId::MethodSpec,
            0x2C => TableId::GenericParamConstraint,
            _ => return None,
        };

        Some(id)
    }

    /// The table kind as a storage index.
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Returns `true` for kinds stored in the fixed region.
    #[must_use]
    pub fn is_fixed(self) -> bool {
        self.index() < FIXED_TABLE_COUNT
    }
}
