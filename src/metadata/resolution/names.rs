//! Type names as they appear in serialized blobs.
//!
//! Blobs name types by their full name: namespace and name joined with `.`, nested types
//! appended to their enclosing type with `+`, optionally followed by `, ` and an assembly
//! display name.

use crate::metadata::{
    tables::{
        FieldPtrRow, FieldRow, MemberRefRow, MethodPtrRow, ModuleTables, NestedClassRow, TableId,
        TypeDefRow, TypeRefRow,
    },
    token::TableIndex,
};

/// Maximum depth of nested type chains followed while building names
const MAX_NESTING: usize = 64;

fn join(namespace: &str, name: &str) -> String {
    if namespace.is_empty() {
        name.to_string()
    } else {
        format!("{namespace}.{name}")
    }
}

/// Full name of a `TypeDef` or `TypeRef` row of `module`.
///
/// Returns `None` for other tables, missing rows and nesting cycles.
#[must_use]
pub fn type_name(module: &ModuleTables, index: TableIndex) -> Option<String> {
    type_name_at(module, index, 0)
}

fn type_name_at(module: &ModuleTables, index: TableIndex, depth: usize) -> Option<String> {
    if depth > MAX_NESTING {
        return None;
    }

    match index.table {
        TableId::TypeDef => {
            let row = module.row::<TypeDefRow>(index.row)?;
            match enclosing_type(module, index.row) {
                Some(enclosing) => Some(format!(
                    "{}+{}",
                    type_name_at(module, enclosing, depth + 1)?,
                    row.type_name
                )),
                None => Some(join(&row.type_namespace, &row.type_name)),
            }
        }
        TableId::TypeRef => {
            let row = module.row::<TypeRefRow>(index.row)?;
            match row.resolution_scope {
                Some(scope) if scope.table == TableId::TypeRef => Some(format!(
                    "{}+{}",
                    type_name_at(module, scope, depth + 1)?,
                    row.type_name
                )),
                _ => Some(join(&row.type_namespace, &row.type_name)),
            }
        }
        _ => None,
    }
}

fn enclosing_type(module: &ModuleTables, type_def: u32) -> Option<TableIndex> {
    let nested = module.table::<NestedClassRow>()?;
    nested
        .rows()
        .iter()
        .find(|row| row.nested_class == TableIndex::new(TableId::TypeDef, type_def))
        .map(|row| row.enclosing_class)
}

/// Find the `TypeDef` row called `full_name`.
#[must_use]
pub fn find_type_def(module: &ModuleTables, full_name: &str) -> Option<u32> {
    let simple_name = full_name
        .rsplit(['.', '+'])
        .next()
        .unwrap_or(full_name);

    let type_defs = module.table::<TypeDefRow>()?;
    (0..type_defs.len() as u32).find(|&row| {
        type_defs
            .get(row)
            .is_some_and(|candidate| candidate.type_name == simple_name)
            && type_name(module, TableIndex::new(TableId::TypeDef, row)).as_deref()
                == Some(full_name)
    })
}

/// Split a serialized type name into the type's full name and its assembly display name.
///
/// ```rust
/// use cilweave::metadata::resolution::split_assembly_qualified;
///
/// assert_eq!(
///     split_assembly_qualified("A.B+C, Lib, Version=1.0.0.0"),
///     ("A.B+C", Some("Lib, Version=1.0.0.0"))
/// );
/// assert_eq!(split_assembly_qualified("A.B"), ("A.B", None));
/// ```
#[must_use]
pub fn split_assembly_qualified(name: &str) -> (&str, Option<&str>) {
    let mut brackets = 0usize;
    for (position, character) in name.char_indices() {
        match character {
            '[' => brackets += 1,
            ']' => brackets = brackets.saturating_sub(1),
            ',' if brackets == 0 => {
                let assembly = name[position + 1..].trim();
                return (
                    name[..position].trim(),
                    (!assembly.is_empty()).then_some(assembly),
                );
            }
            _ => {}
        }
    }
    (name.trim(), None)
}

/// Full name of the attribute type a custom attribute constructor belongs to.
#[must_use]
pub fn attribute_type_name(module: &ModuleTables, constructor: TableIndex) -> Option<String> {
    match constructor.table {
        TableId::MethodDef => type_name(module, method_owner(module, constructor.row)?),
        TableId::MemberRef => {
            let member = module.row::<MemberRefRow>(constructor.row)?;
            type_name(module, member.class)
        }
        _ => None,
    }
}

/// The `TypeDef` whose method run contains `method`.
#[must_use]
pub(crate) fn method_owner(module: &ModuleTables, method: u32) -> Option<TableIndex> {
    let list_row = match module.table::<MethodPtrRow>() {
        Some(pointers) if !pointers.is_empty() => pointers
            .rows()
            .iter()
            .position(|pointer| pointer.method.row == method)? as u32,
        _ => method,
    };

    let type_defs = module.table::<TypeDefRow>()?;
    let owner = type_defs
        .rows()
        .iter()
        .rposition(|row| row.method_list <= list_row)?;
    Some(TableIndex::new(TableId::TypeDef, owner as u32))
}

/// The `Field` rows owned by `type_def`, in declaration order.
pub(crate) fn owned_fields(module: &ModuleTables, type_def: u32) -> Vec<u32> {
    let Some(type_defs) = module.table::<TypeDefRow>() else {
        return Vec::new();
    };
    let Some(row) = type_defs.get(type_def) else {
        return Vec::new();
    };

    let pointers = module
        .table::<FieldPtrRow>()
        .filter(|pointers| !pointers.is_empty());
    let list_len = match pointers {
        Some(pointers) => pointers.len() as u32,
        None => module.row_count(TableId::Field),
    };

    let start = row.field_list.min(list_len);
    let end = type_defs
        .get(type_def + 1)
        .map_or(list_len, |next| next.field_list.min(list_len))
        .max(start);

    (start..end)
        .filter_map(|list_row| match pointers {
            Some(pointers) => pointers.get(list_row).map(|pointer| pointer.field.row),
            None => Some(list_row),
        })
        .filter(|&field| module.row::<FieldRow>(field).is_some())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::ModuleBuilder;

    #[test]
    fn nested_and_namespaced_names() {
        let mut builder = ModuleBuilder::new();
        let outer = builder.type_def("Outer.Space", "Outer", &[]);
        let inner = builder.type_def("", "Inner", &[]);
        builder.nest(inner, outer);
        let scope = builder.assembly_ref("Lib");
        let reference = builder.type_ref(Some(scope), "Lib.Space", "Ref");
        let nested_ref = builder.type_ref(Some(reference), "", "Nested");
        let module = builder.build();

        assert_eq!(type_name(&module, outer).as_deref(), Some("Outer.Space.Outer"));
        assert_eq!(
            type_name(&module, inner).as_deref(),
            Some("Outer.Space.Outer+Inner")
        );
        assert_eq!(
            type_name(&module, nested_ref).as_deref(),
            Some("Lib.Space.Ref+Nested")
        );
        assert_eq!(type_name(&module, scope), None);

        assert_eq!(find_type_def(&module, "Outer.Space.Outer+Inner"), Some(inner.row));
        assert_eq!(find_type_def(&module, "Inner"), None);
    }

    #[test]
    fn qualified_names() {
        assert_eq!(
            split_assembly_qualified("G`1[[A, B]], Lib"),
            ("G`1[[A, B]]", Some("Lib"))
        );
        assert_eq!(split_assembly_qualified(" A , "), ("A", None));
    }

    #[test]
    fn owners_and_field_runs() {
        let mut builder = ModuleBuilder::new();
        let first = builder.type_def("N", "First", &[("a", 0x0006, 0x08), ("b", 0x0016, 0x08)]);
        let second = builder.type_def("N", "Second", &[]);
        let third = builder.type_def("N", "Third", &[("value__", 0x0606, 0x05)]);
        let ctor = builder.method(third, ".ctor", vec![0x20, 0x00, 0x01]);
        let module = builder.build();

        assert_eq!(owned_fields(&module, first.row), vec![0, 1]);
        assert!(owned_fields(&module, second.row).is_empty());
        assert_eq!(owned_fields(&module, third.row), vec![2]);
        assert_eq!(method_owner(&module, ctor.row), Some(third));
        assert_eq!(
            attribute_type_name(&module, ctor).as_deref(),
            Some("N.Third")
        );
    }
}
