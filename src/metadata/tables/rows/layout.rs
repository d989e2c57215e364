//! Rows of the layout, member and signature tables, `ClassLayout` (0x0F) through `EncMap`
//! (0x1F).

use super::coded_order;
use crate::metadata::{tables::CodedIndexType, token::TableIndex};

metadata_row! {
    /// The `ClassLayout` table (0x0F), sorted by parent.
    pub struct ClassLayoutRow: ClassLayout {
        /// Field alignment
        packing_size: u16,
        /// Total size of the type
        class_size: u32,
        /// The `TypeDef`
        parent: TableIndex,
    }
    order = |a: &ClassLayoutRow, b: &ClassLayoutRow| a.parent.row.cmp(&b.parent.row);
}

metadata_row! {
    /// The `FieldLayout` table (0x10), sorted by field.
    pub struct FieldLayoutRow: FieldLayout {
        /// Byte offset of the field
        offset: u32,
        /// The `Field`
        field: TableIndex,
    }
    order = |a: &FieldLayoutRow, b: &FieldLayoutRow| a.field.row.cmp(&b.field.row);
}

metadata_row! {
    /// The `StandAloneSig` table (0x11).
    pub struct StandAloneSigRow: StandAloneSig {
        /// Local variable or method signature blob
        signature: Vec<u8>,
    }
}

metadata_row! {
    /// The `EventMap` table (0x12).
    pub struct EventMapRow: EventMap {
        /// The owning `TypeDef`
        parent: TableIndex,
        /// First owned `Event` row
        event_list: u32,
    }
}

metadata_row! {
    /// The `EventPtr` table (0x13).
    pub struct EventPtrRow: EventPtr {
        /// The `Event` row
        event: TableIndex,
    }
}

metadata_row! {
    /// The `Event` table (0x14).
    pub struct EventRow: Event {
        /// `EventAttributes`
        flags: u16,
        /// Event name
        name: String,
        /// `TypeDefOrRef` of the delegate type
        event_type: Option<TableIndex>,
    }
}

metadata_row! {
    /// The `PropertyMap` table (0x15).
    pub struct PropertyMapRow: PropertyMap {
        /// The owning `TypeDef`
        parent: TableIndex,
        /// First owned `Property` row
        property_list: u32,
    }
}

metadata_row! {
    /// The `PropertyPtr` table (0x16).
    pub struct PropertyPtrRow: PropertyPtr {
        /// The `Property` row
        property: TableIndex,
    }
}

metadata_row! {
    /// The `Property` table (0x17).
    pub struct PropertyRow: Property {
        /// `PropertyAttributes`
        flags: u16,
        /// Property name
        name: String,
        /// Property signature blob
        signature: Vec<u8>,
    }
}

metadata_row! {
    /// The `MethodSemantics` table (0x18), sorted by association.
    pub struct MethodSemanticsRow: MethodSemantics {
        /// `MethodSemanticsAttributes`
        semantics: u16,
        /// The accessor `MethodDef`
        method: TableIndex,
        /// `HasSemantics` event or property
        association: TableIndex,
    }
    order = |a: &MethodSemanticsRow, b: &MethodSemanticsRow| {
        coded_order(CodedIndexType::HasSemantics, a.association, b.association)
    };
}

metadata_row! {
    /// The `MethodImpl` table (0x19), sorted by class.
    pub struct MethodImplRow: MethodImpl {
        /// The `TypeDef` holding the override
        class: TableIndex,
        /// `MethodDefOrRef` implementing the method
        method_body: TableIndex,
        /// `MethodDefOrRef` being overridden
        method_declaration: TableIndex,
    }
    order = |a: &MethodImplRow, b: &MethodImplRow| a.class.row.cmp(&b.class.row);
}

metadata_row! {
    /// The `ModuleRef` table (0x1A).
    pub struct ModuleRefRow: ModuleRef {
        /// File name of the referenced module
        name: String,
    }
}

metadata_row! {
    /// The `TypeSpec` table (0x1B).
    pub struct TypeSpecRow: TypeSpec {
        /// Type signature blob
        signature: Vec<u8>,
    }
}

metadata_row! {
    /// The `ImplMap` table (0x1C), sorted by forwarded member.
    pub struct ImplMapRow: ImplMap {
        /// `PInvokeAttributes`
        mapping_flags: u16,
        /// `MemberForwarded` field or method
        member_forwarded: TableIndex,
        /// Entry point name in the native library
        import_name: String,
        /// The `ModuleRef` of the native library
        import_scope: TableIndex,
    }
    order = |a: &ImplMapRow, b: &ImplMapRow| {
        coded_order(CodedIndexType::MemberForwarded, a.member_forwarded, b.member_forwarded)
    };
}

metadata_row! {
    /// The `FieldRVA` table (0x1D), sorted by field.
    pub struct FieldRvaRow: FieldRVA {
        /// RVA of the initial data
        rva: u32,
        /// The `Field`
        field: TableIndex,
    }
    order = |a: &FieldRvaRow, b: &FieldRvaRow| a.field.row.cmp(&b.field.row);
}

metadata_row! {
    /// The `EncLog` table (0x1E).
    pub struct EncLogRow: EncLog {
        /// Token of the edited row
        token: u32,
        /// Edit operation
        func_code: u32,
    }
}

metadata_row! {
    /// The `EncMap` table (0x1F).
    pub struct EncMapRow: EncMap {
        /// Token of the mapped row
        token: u32,
    }
}
