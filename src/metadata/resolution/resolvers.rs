//! The built-in column resolvers for custom attribute values and permission sets.

use std::{any::Any, collections::HashMap};

use crate::{
    metadata::{
        customattributes::{parse_custom_attribute, AttributeBlob, Decoded, EnumInfo, FixedArgType},
        resolution::{ColumnResolver, ResolveContext, TypeReference},
        security::{parse_permission_set, SecurityBlob},
        signatures::parse_method_signature,
        tables::{ColumnValue, CustomAttributeRow, MemberRefRow, MethodDefRow, ModuleTables, TableId},
        token::TableIndex,
    },
    Result,
};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum EnumKey {
    Index(TableIndex),
    Name(String),
}

/// Enums found so far in one module, shared by all rows of one column.
///
/// Only successful lookups are kept; a type that was missing may become resolvable once its
/// module can be located.
#[derive(Debug, Default)]
struct EnumCache {
    known: HashMap<EnumKey, EnumInfo>,
}

impl EnumCache {
    fn lookup(&mut self, context: &ResolveContext<'_>, ty: TypeReference<'_>) -> Option<EnumInfo> {
        let key = match ty {
            TypeReference::Index(index) => EnumKey::Index(index),
            TypeReference::Name(name) => EnumKey::Name(name.to_string()),
        };
        if let Some(info) = self.known.get(&key) {
            return Some(info.clone());
        }

        let info = context.resolver.underlying_type(context.module, ty);
        match &info {
            Some(found) => {
                self.known.insert(key, found.clone());
            }
            None => tracing::warn!(
                module = context.module.id().value(),
                table = ?context.table,
                row = context.row,
                enum_type = %ty,
                "enum type could not be resolved"
            ),
        }
        info
    }
}

/// Parameter types of a custom attribute constructor.
///
/// # Errors
/// Returns an error if the constructor is neither a `MethodDef` nor a `MemberRef`, or its
/// signature cannot carry attribute arguments.
pub(crate) fn constructor_parameters(
    module: &ModuleTables,
    constructor: TableIndex,
) -> Result<Vec<FixedArgType>> {
    let signature = match constructor.table {
        TableId::MethodDef => module
            .row::<MethodDefRow>(constructor.row)
            .map(|row| row.signature.as_slice()),
        TableId::MemberRef => module
            .row::<MemberRefRow>(constructor.row)
            .map(|row| row.signature.as_slice()),
        _ => {
            return Err(malformed_error!(
                "Attribute constructor {} is not a method",
                constructor
            ))
        }
    };
    let Some(signature) = signature else {
        return Err(malformed_error!(
            "Attribute constructor {} does not exist",
            constructor
        ));
    };

    parse_method_signature(signature)?
        .params
        .iter()
        .map(FixedArgType::from_signature)
        .collect()
}

/// Resolves the `value` column of `CustomAttribute`.
#[derive(Debug, Default)]
pub struct AttributeValueResolver;

impl AttributeValueResolver {
    /// Create the resolver.
    #[must_use]
    pub fn new() -> Self {
        AttributeValueResolver
    }
}

impl ColumnResolver for AttributeValueResolver {
    fn create_cache(&self) -> Box<dyn Any + Send> {
        Box::new(EnumCache::default())
    }

    fn needs_resolution(&self, value: &ColumnValue) -> bool {
        matches!(value, ColumnValue::Attribute(AttributeBlob::Raw(_)))
    }

    fn resolve(
        &self,
        context: &ResolveContext<'_>,
        value: &ColumnValue,
        cache: &mut (dyn Any + Send),
    ) -> Option<ColumnValue> {
        let ColumnValue::Attribute(AttributeBlob::Raw(data)) = value else {
            return None;
        };
        let cache = cache.downcast_mut::<EnumCache>()?;
        let row = context.module.row::<CustomAttributeRow>(context.row)?;

        let params = match constructor_parameters(context.module, row.constructor) {
            Ok(params) => params,
            Err(error) => {
                tracing::warn!(row = context.row, %error, "unusable attribute constructor");
                return None;
            }
        };

        let mut lookup = |ty: TypeReference<'_>| cache.lookup(context, ty);
        match parse_custom_attribute(data, &params, &mut lookup) {
            Ok(Decoded::Complete(value)) => {
                Some(ColumnValue::Attribute(AttributeBlob::Resolved(value)))
            }
            Ok(Decoded::Unresolved(_)) => None,
            Err(error) => {
                tracing::warn!(row = context.row, %error, "malformed custom attribute blob");
                None
            }
        }
    }
}

/// Resolves the `permission_set` column of `DeclSecurity`.
#[derive(Debug, Default)]
pub struct PermissionSetResolver;

impl PermissionSetResolver {
    /// Create the resolver.
    #[must_use]
    pub fn new() -> Self {
        PermissionSetResolver
    }
}

impl ColumnResolver for PermissionSetResolver {
    fn create_cache(&self) -> Box<dyn Any + Send> {
        Box::new(EnumCache::default())
    }

    fn needs_resolution(&self, value: &ColumnValue) -> bool {
        matches!(value, ColumnValue::Security(SecurityBlob::Raw(_)))
    }

    fn resolve(
        &self,
        context: &ResolveContext<'_>,
        value: &ColumnValue,
        cache: &mut (dyn Any + Send),
    ) -> Option<ColumnValue> {
        let ColumnValue::Security(SecurityBlob::Raw(data)) = value else {
            return None;
        };
        let cache = cache.downcast_mut::<EnumCache>()?;

        let mut lookup = |ty: TypeReference<'_>| cache.lookup(context, ty);
        match parse_permission_set(data, &mut lookup) {
            Ok(Decoded::Complete(set)) => Some(ColumnValue::Security(SecurityBlob::Resolved(set))),
            Ok(Decoded::Unresolved(_)) => None,
            Err(error) => {
                tracing::warn!(row = context.row, %error, "malformed permission set");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        metadata::{
            customattributes::CustomAttributeArgument,
            resolution::LocalTypeResolver,
            security::PermissionSetFormat,
            signatures::ELEMENT_TYPE,
            tables::DeclSecurityRow,
        },
        test::ModuleBuilder,
    };

    #[test]
    fn attribute_with_local_enum() {
        let mut builder = ModuleBuilder::new();
        let kind = builder.type_def("App", "Kind", &[("value__", 0x0606, ELEMENT_TYPE::U1)]);
        let attribute = builder.type_def("App", "MarkAttribute", &[]);
        // instance void (valuetype App.Kind, int32)
        let kind_token = ((kind.row + 1) << 2) as u8;
        let ctor = builder.method(attribute, ".ctor", vec![0x20, 0x02, 0x01, 0x11, kind_token, 0x08]);
        let row = builder.custom_attribute(
            attribute,
            ctor,
            vec![0x01, 0x00, 0x02, 0x07, 0x00, 0x00, 0x00, 0x00, 0x00],
        );
        let mut module = builder.build();

        let column = 2;
        assert!(module.resolve(&LocalTypeResolver, TableId::CustomAttribute, row.row, column));
        let value = module.row::<CustomAttributeRow>(row.row).unwrap().value.clone();
        let resolved = value.value().unwrap();
        assert_eq!(
            resolved.fixed_args,
            vec![
                CustomAttributeArgument::Enum(
                    "App.Kind".into(),
                    Box::new(CustomAttributeArgument::U1(2))
                ),
                CustomAttributeArgument::I4(7),
            ]
        );

        // already resolved
        assert!(!module.resolve(&LocalTypeResolver, TableId::CustomAttribute, row.row, column));
        assert_eq!(module.row::<CustomAttributeRow>(row.row).unwrap().value, value);
    }

    #[test]
    fn attribute_with_foreign_enum_stays_raw() {
        let mut builder = ModuleBuilder::new();
        let lib = builder.assembly_ref("Lib");
        let foreign = builder.type_ref(Some(lib), "Lib", "Mode");
        let attribute = builder.type_ref(Some(lib), "Lib", "ModeAttribute");
        let foreign_token = (((foreign.row + 1) << 2) | 1) as u8;
        let ctor = builder.member_ref(attribute, ".ctor", vec![0x20, 0x01, 0x01, 0x11, foreign_token]);
        let target = builder.type_def("App", "Target", &[]);
        let row = builder.custom_attribute(target, ctor, vec![0x01, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00]);
        let mut module = builder.build();

        let summary = module.resolve_everything(&LocalTypeResolver);
        assert_eq!(summary.attempted, 1);
        assert_eq!(summary.resolved, 0);
        assert_eq!(summary.unresolved[0].row, row.row);
        assert!(matches!(
            module.row::<CustomAttributeRow>(row.row).unwrap().value,
            AttributeBlob::Raw(_)
        ));
    }

    #[test]
    fn constructor_parameter_errors() {
        let mut builder = ModuleBuilder::new();
        let owner = builder.type_def("App", "Owner", &[]);
        // static void (!0)
        let generic = builder.method(owner, "M", vec![0x00, 0x01, 0x01, 0x13, 0x00]);
        let module = builder.build();

        assert!(constructor_parameters(&module, generic).is_err());
        assert!(constructor_parameters(&module, owner).is_err());
        assert!(
            constructor_parameters(&module, TableIndex::new(TableId::MethodDef, 42)).is_err()
        );
    }

    #[test]
    fn xml_permission_set_resolves_without_lookups() {
        let mut builder = ModuleBuilder::new();
        let target = builder.type_def("App", "Target", &[]);
        let xml: Vec<u8> = "<PermissionSet class=\"System.Security.PermissionSet\"/>"
            .encode_utf16()
            .flat_map(u16::to_le_bytes)
            .collect();
        let row = builder.decl_security(0x0002, target, xml);
        let mut module = builder.build();

        let summary = module.resolve_everything(&LocalTypeResolver);
        assert_eq!(summary.resolved, 1);
        let set = module.row::<DeclSecurityRow>(row.row).unwrap();
        assert_eq!(
            set.permission_set.value().map(|set| set.format),
            Some(PermissionSetFormat::Xml)
        );
    }
}
