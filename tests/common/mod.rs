//! Hand-built modules shared by the integration tests.
#![allow(dead_code)]

use std::{path::Path, sync::Arc};

use cilweave::{
    metadata::{customattributes::AttributeBlob, signatures::ELEMENT_TYPE},
    prelude::*,
};

/// `public specialname rtspecialname`, the flags of `value__`
pub const ENUM_VALUE: u16 = 0x0606;

pub fn provider() -> Arc<SchemaProvider> {
    Arc::new(SchemaProvider::standard().expect("standard schemas"))
}

/// An empty module with a `Module` row, optionally carrying an `Assembly` row.
pub fn module(provider: &Arc<SchemaProvider>, assembly: Option<(&str, u16)>) -> ModuleTables {
    let mut module = ModuleTables::new(provider).expect("module tables");
    module
        .add_row(ModuleRow {
            name: "App.dll".to_string(),
            ..Default::default()
        })
        .expect("module row");
    if let Some((name, major)) = assembly {
        module
            .add_row(AssemblyRow {
                hash_alg_id: 0x8004,
                major_version: major,
                name: name.to_string(),
                ..Default::default()
            })
            .expect("assembly row");
    }
    module
}

/// Add an enum `namespace.name` whose underlying type is `underlying`.
pub fn add_enum(module: &mut ModuleTables, namespace: &str, name: &str, underlying: u8) -> TableIndex {
    let index = module
        .add_row(TypeDefRow {
            flags: 0x0101,
            type_name: name.to_string(),
            type_namespace: namespace.to_string(),
            extends: None,
            field_list: module.row_count(TableId::Field),
            method_list: module.row_count(TableId::MethodDef),
        })
        .expect("type row");
    module
        .add_row(FieldRow {
            flags: ENUM_VALUE,
            name: "value__".to_string(),
            signature: vec![0x06, underlying],
        })
        .expect("field row");
    index
}

/// Reference `name` at version `major.0.0.0`.
pub fn add_assembly_ref(module: &mut ModuleTables, name: &str, major: u16) -> TableIndex {
    module
        .add_row(AssemblyRefRow {
            major_version: major,
            name: name.to_string(),
            ..Default::default()
        })
        .expect("assembly ref row")
}

pub fn add_type_ref(module: &mut ModuleTables, scope: TableIndex, namespace: &str, name: &str) -> TableIndex {
    module
        .add_row(TypeRefRow {
            resolution_scope: Some(scope),
            type_name: name.to_string(),
            type_namespace: namespace.to_string(),
        })
        .expect("type ref row")
}

/// Compressed `TypeDefOrRef` encoding of a `TypeRef` row, small rows only.
pub fn type_ref_coded(index: TableIndex) -> u8 {
    u8::try_from(((index.row + 1) << 2) | 1).expect("small row")
}

/// Attach an attribute whose constructor takes one argument of the enum `enum_type` to a
/// fresh `TypeDef`, passing `value` as the raw blob argument.
pub fn add_enum_attribute(
    module: &mut ModuleTables,
    scope: TableIndex,
    enum_type: TableIndex,
    value: &[u8],
) -> TableIndex {
    let attribute = add_type_ref(module, scope, "Lib", "ModeAttribute");
    let ctor = module
        .add_row(MemberRefRow {
            class: attribute,
            name: ".ctor".to_string(),
            // instance void (valuetype Mode)
            signature: vec![0x20, 0x01, 0x01, 0x11, type_ref_coded(enum_type)],
        })
        .expect("member ref row");
    let target = module
        .add_row(TypeDefRow {
            type_name: "Target".to_string(),
            type_namespace: "App".to_string(),
            field_list: module.row_count(TableId::Field),
            method_list: module.row_count(TableId::MethodDef),
            ..Default::default()
        })
        .expect("type row");

    let mut blob = vec![0x01, 0x00];
    blob.extend_from_slice(value);
    blob.extend_from_slice(&[0x00, 0x00]);
    module
        .add_row(CustomAttributeRow {
            parent: target,
            constructor: ctor,
            value: AttributeBlob::Raw(blob),
        })
        .expect("attribute row")
}

/// Reads the tiny stand-in files the tests write: `lib` is the library defining
/// `Lib.Mode : short`, anything else is rejected.
pub fn read_library(_: &Path, data: &[u8]) -> Result<ModuleTables> {
    if data != b"lib" {
        return Err(Error::Malformed {
            message: "not a module".to_string(),
            file: file!(),
            line: line!(),
        });
    }
    let mut module = module(&provider(), Some(("Lib", 2)));
    add_enum(&mut module, "Lib", "Mode", ELEMENT_TYPE::I2);
    Ok(module)
}

/// Mark `module` as compiled against `moniker` with a `TargetFrameworkAttribute` on its
/// assembly row.
pub fn add_target_framework(module: &mut ModuleTables, moniker: &str) {
    let mscorlib = add_assembly_ref(module, "mscorlib", 4);
    let attribute = add_type_ref(
        module,
        mscorlib,
        "System.Runtime.Versioning",
        "TargetFrameworkAttribute",
    );
    let ctor = module
        .add_row(MemberRefRow {
            class: attribute,
            name: ".ctor".to_string(),
            // instance void (string)
            signature: vec![0x20, 0x01, 0x01, 0x0E],
        })
        .expect("member ref row");

    let mut blob = vec![0x01, 0x00, u8::try_from(moniker.len()).expect("short moniker")];
    blob.extend_from_slice(moniker.as_bytes());
    blob.extend_from_slice(&[0x00, 0x00]);
    module
        .add_row(CustomAttributeRow {
            parent: TableIndex::new(TableId::Assembly, 0),
            constructor: ctor,
            value: AttributeBlob::Raw(blob),
        })
        .expect("attribute row");
}

/// Route library events to the test output, filtered by `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
