//! Rows of `NestedClass` (0x29) and the generic tables through `GenericParamConstraint` (0x2C).

use super::coded_order;
use crate::metadata::{tables::CodedIndexType, token::TableIndex};

metadata_row! {
    /// The `NestedClass` table (0x29), sorted by nested class.
    pub struct NestedClassRow: NestedClass {
        /// The nested `TypeDef`
        nested_class: TableIndex,
        /// The enclosing `TypeDef`
        enclosing_class: TableIndex,
    }
    order = |a: &NestedClassRow, b: &NestedClassRow| a.nested_class.row.cmp(&b.nested_class.row);
}

metadata_row! {
    /// The `GenericParam` table (0x2A), sorted by owner and number.
    pub struct GenericParamRow: GenericParam {
        /// Position in the parameter list
        number: u16,
        /// `GenericParamAttributes`
        flags: u16,
        /// `TypeOrMethodDef` owner
        owner: TableIndex,
        /// Parameter name
        name: String,
    }
    order = |a: &GenericParamRow, b: &GenericParamRow| {
        coded_order(CodedIndexType::TypeOrMethodDef, a.owner, b.owner)
            .then_with(|| a.number.cmp(&b.number))
    };
}

metadata_row! {
    /// The `MethodSpec` table (0x2B).
    pub struct MethodSpecRow: MethodSpec {
        /// `MethodDefOrRef` of the generic method
        method: TableIndex,
        /// Instantiation signature blob
        instantiation: Vec<u8>,
    }
}

metadata_row! {
    /// The `GenericParamConstraint` table (0x2C), sorted by owner.
    pub struct GenericParamConstraintRow: GenericParamConstraint {
        /// The constrained `GenericParam`
        owner: TableIndex,
        /// `TypeDefOrRef` of the constraint
        constraint: TableIndex,
    }
    order = |a: &GenericParamConstraintRow, b: &GenericParamConstraintRow| {
        a.owner.row.cmp(&b.owner.row)
    };
}
