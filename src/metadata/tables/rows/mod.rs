//! Row types of every table kind.
//!
//! Each row type is declared with `metadata_row!`, which derives its column schema from the
//! field list. Field order is column order and mirrors the persisted layout.

use std::{cmp::Ordering, sync::Arc};

use crate::{
    metadata::{
        resolution::{AttributeValueResolver, PermissionSetResolver},
        tables::{CodedIndexType, SchemaProvider, TableRow},
        token::TableIndex,
    },
    Result,
};

mod assembly;
mod definitions;
mod generics;
mod layout;

pub use assembly::*;
pub use definitions::*;
pub use generics::*;
pub use layout::*;

/// Compare two references by their coded-index value, the sort key of the persisted format.
pub(crate) fn coded_order(kind: CodedIndexType, left: TableIndex, right: TableIndex) -> Ordering {
    kind.sort_key(left).cmp(&kind.sort_key(right))
}

macro_rules! register_rows {
    ($provider:expr; $($row:ty),+ $(,)?) => {
        $(
            $provider.register(<$row as TableRow>::schema()?)?;
        )+
    };
}

pub(crate) fn register_all(provider: &mut SchemaProvider) -> Result<()> {
    register_rows!(provider;
        ModuleRow,
        TypeRefRow,
        TypeDefRow,
        FieldPtrRow,
        FieldRow,
        MethodPtrRow,
        MethodDefRow,
        ParamPtrRow,
        ParamRow,
        InterfaceImplRow,
        MemberRefRow,
        ConstantRow,
        FieldMarshalRow,
        ClassLayoutRow,
        FieldLayoutRow,
        StandAloneSigRow,
        EventMapRow,
        EventPtrRow,
        EventRow,
        PropertyMapRow,
        PropertyPtrRow,
        PropertyRow,
        MethodSemanticsRow,
        MethodImplRow,
        ModuleRefRow,
        TypeSpecRow,
        ImplMapRow,
        FieldRvaRow,
        EncLogRow,
        EncMapRow,
        AssemblyRow,
        AssemblyProcessorRow,
        AssemblyOsRow,
        AssemblyRefRow,
        AssemblyRefProcessorRow,
        AssemblyRefOsRow,
        FileRow,
        ExportedTypeRow,
        ManifestResourceRow,
        NestedClassRow,
        GenericParamRow,
        MethodSpecRow,
        GenericParamConstraintRow,
    );

    provider.register(
        CustomAttributeRow::schema()?
            .with_resolver("value", Arc::new(AttributeValueResolver::new()))?,
    )?;
    provider.register(
        DeclSecurityRow::schema()?
            .with_resolver("permission_set", Arc::new(PermissionSetResolver::new()))?,
    )?;

    Ok(())
}
