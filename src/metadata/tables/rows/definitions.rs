//! Rows of the fixed region, `Module` (0x00) through `DeclSecurity` (0x0E).

use std::cmp::Ordering;

use uguid::Guid;

use super::coded_order;
use crate::metadata::{
    customattributes::AttributeBlob,
    method::MethodBody,
    security::SecurityBlob,
    tables::CodedIndexType,
    token::TableIndex,
};

metadata_row! {
    /// The `Module` table (0x00), exactly one row per module.
    pub struct ModuleRow: Module {
        /// Reserved, always zero
        generation: u16,
        /// Module name, including the file extension
        name: String,
        /// Module version identifier
        mvid: Guid,
        /// Edit-and-continue generation id
        enc_id: Option<Guid>,
        /// Edit-and-continue base generation id
        enc_base_id: Option<Guid>,
    }
}

metadata_row! {
    /// The `TypeRef` table (0x01).
    pub struct TypeRefRow: TypeRef {
        /// `ResolutionScope`: `Module`, `ModuleRef`, `AssemblyRef` or an enclosing `TypeRef`;
        /// absent for types resolved through `ExportedType`
        resolution_scope: Option<TableIndex>,
        /// Simple type name
        type_name: String,
        /// Namespace, empty for nested types
        type_namespace: String,
    }
}

metadata_row! {
    /// The `TypeDef` table (0x02).
    pub struct TypeDefRow: TypeDef {
        /// `TypeAttributes`
        flags: u32,
        /// Simple type name
        type_name: String,
        /// Namespace, empty for nested types
        type_namespace: String,
        /// `TypeDefOrRef` of the base type
        extends: Option<TableIndex>,
        /// First owned `Field` row; the run ends at the next type's `field_list`
        field_list: u32,
        /// First owned `MethodDef` row; the run ends at the next type's `method_list`
        method_list: u32,
    }
}

metadata_row! {
    /// The `FieldPtr` table (0x03).
    pub struct FieldPtrRow: FieldPtr {
        /// The `Field` row
        field: TableIndex,
    }
}

metadata_row! {
    /// The `Field` table (0x04).
    pub struct FieldRow: Field {
        /// `FieldAttributes`
        flags: u16,
        /// Field name
        name: String,
        /// Field signature blob
        signature: Vec<u8>,
    }
}

metadata_row! {
    /// The `MethodPtr` table (0x05).
    pub struct MethodPtrRow: MethodPtr {
        /// The `MethodDef` row
        method: TableIndex,
    }
}

metadata_row! {
    /// The `MethodDef` table (0x06).
    pub struct MethodDefRow: MethodDef {
        /// RVA of the body in the persisted image, zero for abstract and runtime methods
        rva: u32,
        /// `MethodImplAttributes`
        impl_flags: u16,
        /// `MethodAttributes`
        flags: u16,
        /// Method name
        name: String,
        /// Method signature blob
        signature: Vec<u8>,
        /// First owned `Param` row; the run ends at the next method's `param_list`
        param_list: u32,
        /// Decoded body, absent for methods without IL
        body: Option<MethodBody>,
    }
}

metadata_row! {
    /// The `ParamPtr` table (0x07).
    pub struct ParamPtrRow: ParamPtr {
        /// The `Param` row
        param: TableIndex,
    }
}

metadata_row! {
    /// The `Param` table (0x08).
    pub struct ParamRow: Param {
        /// `ParamAttributes`
        flags: u16,
        /// Position, `0` is the return value
        sequence: u16,
        /// Parameter name
        name: String,
    }
}

metadata_row! {
    /// The `InterfaceImpl` table (0x09), sorted by class.
    pub struct InterfaceImplRow: InterfaceImpl {
        /// The implementing `TypeDef`
        class: TableIndex,
        /// `TypeDefOrRef` of the interface
        interface: TableIndex,
    }
    order = |a: &InterfaceImplRow, b: &InterfaceImplRow| {
        a.class.row.cmp(&b.class.row).then_with(|| {
            coded_order(CodedIndexType::TypeDefOrRef, a.interface, b.interface)
        })
    };
}

metadata_row! {
    /// The `MemberRef` table (0x0A).
    pub struct MemberRefRow: MemberRef {
        /// `MemberRefParent` declaring the member
        class: TableIndex,
        /// Member name
        name: String,
        /// Field or method signature blob
        signature: Vec<u8>,
    }
}

metadata_row! {
    /// The `Constant` table (0x0B), sorted by parent.
    pub struct ConstantRow: Constant {
        /// Element type of the value
        element_type: u8,
        /// `HasConstant` owner
        parent: TableIndex,
        /// Little-endian value blob
        value: Vec<u8>,
    }
    order = |a: &ConstantRow, b: &ConstantRow| coded_order(CodedIndexType::HasConstant, a.parent, b.parent);
}

metadata_row! {
    /// The `CustomAttribute` table (0x0C), sorted by parent.
    pub struct CustomAttributeRow: CustomAttribute {
        /// `HasCustomAttribute` owner
        parent: TableIndex,
        /// `CustomAttributeType` constructor, a `MethodDef` or `MemberRef`
        constructor: TableIndex,
        /// The attribute value, raw until resolved
        value: AttributeBlob,
    }
    order = |a: &CustomAttributeRow, b: &CustomAttributeRow| {
        coded_order(CodedIndexType::HasCustomAttribute, a.parent, b.parent)
    };
}

metadata_row! {
    /// The `FieldMarshal` table (0x0D), sorted by parent.
    pub struct FieldMarshalRow: FieldMarshal {
        /// `HasFieldMarshal` owner
        parent: TableIndex,
        /// Marshalling descriptor blob
        native_type: Vec<u8>,
    }
    order = |a: &FieldMarshalRow, b: &FieldMarshalRow| {
        coded_order(CodedIndexType::HasFieldMarshal, a.parent, b.parent)
    };
}

metadata_row! {
    /// The `DeclSecurity` table (0x0E), sorted by parent.
    pub struct DeclSecurityRow: DeclSecurity {
        /// `SecurityAction`
        action: u16,
        /// `HasDeclSecurity` owner
        parent: TableIndex,
        /// The permission set, raw until resolved
        permission_set: SecurityBlob,
    }
    order = |a: &DeclSecurityRow, b: &DeclSecurityRow| {
        match coded_order(CodedIndexType::HasDeclSecurity, a.parent, b.parent) {
            Ordering::Equal => a.action.cmp(&b.action),
            other => other,
        }
    };
}
