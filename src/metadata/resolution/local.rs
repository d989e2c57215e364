use crate::metadata::{
    customattributes::EnumInfo,
    resolution::{
        names::{find_type_def, owned_fields, split_assembly_qualified, type_name},
        TypeReference, TypeResolver,
    },
    signatures::{is_integral, parse_field_signature, TypeSignature},
    tables::{FieldRow, ModuleTables, TableId, TypeRefRow},
    token::TableIndex,
};

/// `FieldAttributes.Static`
const FIELD_STATIC: u16 = 0x0010;

/// Resolves enums defined in the module itself.
///
/// The underlying type of an enum is the type of its first instance field (`value__`).
/// Type references are followed only when they stay inside the module; references into other
/// modules are left to [`crate::metadata::resolution::AssemblyResolver`].
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalTypeResolver;

impl LocalTypeResolver {
    /// Look up the `TypeDef` called `full_name` and read its underlying type.
    #[must_use]
    pub fn underlying_type_by_name(&self, module: &ModuleTables, full_name: &str) -> Option<EnumInfo> {
        let row = find_type_def(module, full_name)?;
        Some(EnumInfo {
            name: full_name.to_string(),
            underlying: enum_underlying_type(module, row)?,
        })
    }
}

impl TypeResolver for LocalTypeResolver {
    fn underlying_type(&self, module: &ModuleTables, ty: TypeReference<'_>) -> Option<EnumInfo> {
        match ty {
            TypeReference::Index(index) if index.table == TableId::TypeDef => Some(EnumInfo {
                name: type_name(module, index)?,
                underlying: enum_underlying_type(module, index.row)?,
            }),
            TypeReference::Index(index) if index.table == TableId::TypeRef => {
                if !is_module_local(module, index) {
                    return None;
                }
                self.underlying_type_by_name(module, &type_name(module, index)?)
            }
            TypeReference::Index(_) => None,
            TypeReference::Name(name) => {
                let (full_name, _) = split_assembly_qualified(name);
                self.underlying_type_by_name(module, full_name)
            }
        }
    }
}

/// A `TypeRef` resolves inside its own module when its outermost scope is null or `Module`.
fn is_module_local(module: &ModuleTables, mut index: TableIndex) -> bool {
    for _ in 0..64 {
        let Some(row) = module.row::<TypeRefRow>(index.row) else {
            return false;
        };
        match row.resolution_scope {
            None => return true,
            Some(scope) if scope.table == TableId::Module => return true,
            Some(scope) if scope.table == TableId::TypeRef => index = scope,
            Some(_) => return false,
        }
    }
    false
}

/// Element type of the first instance field of `type_def`, if it is integral.
#[must_use]
pub(crate) fn enum_underlying_type(module: &ModuleTables, type_def: u32) -> Option<u8> {
    let field = owned_fields(module, type_def)
        .into_iter()
        .filter_map(|row| module.row::<FieldRow>(row))
        .find(|field| field.flags & FIELD_STATIC == 0)?;

    match parse_field_signature(&field.signature).ok()?.base {
        TypeSignature::Primitive(element_type) if is_integral(element_type) => Some(element_type),
        _ => None,
    }
}
