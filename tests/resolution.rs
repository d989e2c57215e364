//! Cross-module resolution against modules written to disk.

mod common;

use std::{fs, sync::Arc};

use cilweave::{
    metadata::{
        customattributes::{AttributeBlob, CustomAttributeArgument},
        signatures::ELEMENT_TYPE,
    },
    prelude::*,
};
use common::*;

fn attribute_value(module: &ModuleTables, row: u32) -> Option<CustomAttributeValue> {
    module
        .row::<CustomAttributeRow>(row)
        .and_then(|row| row.value.value().cloned())
}

#[test]
fn resolves_enum_arguments_from_disk() -> Result<()> {
    init_tracing();
    let dir = tempfile::tempdir()?;
    fs::write(dir.path().join("Lib.dll"), b"lib")?;
    let app_path = dir.path().join("App.dll");

    let resolver = AssemblyResolver::new(
        SingleThreadedLocator::new(LocatorConfig::new()),
        Arc::new(FileSystemLoader::new()),
        Arc::new(read_library),
    );

    let provider = provider();
    let mut app = module(&provider, Some(("App", 1)));
    let lib = add_assembly_ref(&mut app, "Lib", 1);
    let mode = add_type_ref(&mut app, lib, "Lib", "Mode");
    let attribute = add_enum_attribute(&mut app, lib, mode, &[0xFE, 0xFF]);
    resolver.register(&app_path, &app);

    let summary = app.resolve_everything(&resolver);
    assert!(summary.is_complete());
    assert_eq!(summary.attempted, 1);
    assert_eq!(summary.resolved, 1);
    assert_eq!(resolver.loaded_count(), 1);

    let value = attribute_value(&app, attribute.row).unwrap();
    assert_eq!(
        value.fixed_args,
        vec![CustomAttributeArgument::Enum(
            "Lib.Mode".to_string(),
            Box::new(CustomAttributeArgument::I2(-2))
        )]
    );

    // a second pass has nothing left to do
    let again = app.resolve_everything(&resolver);
    assert_eq!(again.attempted, 0);
    assert_eq!(resolver.loaded_count(), 1);
    Ok(())
}

#[test]
fn missing_dependency_leaves_cells_raw() -> Result<()> {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let resolver = AssemblyResolver::new(
        SingleThreadedLocator::new(LocatorConfig::new()),
        Arc::new(FileSystemLoader::new()),
        Arc::new(read_library),
    );

    let provider = provider();
    let mut app = module(&provider, Some(("App", 1)));
    let lib = add_assembly_ref(&mut app, "Lib", 1);
    let mode = add_type_ref(&mut app, lib, "Lib", "Mode");
    let attribute = add_enum_attribute(&mut app, lib, mode, &[0x01, 0x00]);
    resolver.register(dir.path().join("App.dll"), &app);

    let summary = app.resolve_everything(&resolver);
    assert!(!summary.is_complete());
    assert_eq!(summary.resolved, 0);
    assert_eq!(summary.unresolved.len(), 1);

    let row = app.row::<CustomAttributeRow>(attribute.row).unwrap();
    assert_eq!(
        row.value,
        AttributeBlob::Raw(vec![0x01, 0x00, 0x01, 0x00, 0x00, 0x00])
    );

    // the dependency shows up later
    fs::write(dir.path().join("Lib.dll"), b"lib")?;
    let summary = app.resolve_everything(&resolver);
    assert!(summary.is_complete());
    assert_eq!(summary.resolved, 1);
    Ok(())
}

#[test]
fn local_enums_resolve_without_loading() -> Result<()> {
    let provider = provider();
    let mut app = module(&provider, None);
    let mode = add_enum(&mut app, "App", "Level", ELEMENT_TYPE::U1);
    let mode_token = u8::try_from((mode.row + 1) << 2).unwrap();

    let ctor = app.add_row(MemberRefRow {
        class: mode,
        name: ".ctor".to_string(),
        signature: vec![0x20, 0x01, 0x01, 0x11, mode_token],
    })?;
    let attribute = app.add_row(CustomAttributeRow {
        parent: mode,
        constructor: ctor,
        value: AttributeBlob::Raw(vec![0x01, 0x00, 0x07, 0x00, 0x00]),
    })?;

    let summary = app.resolve_everything(&LocalTypeResolver);
    assert!(summary.is_complete());

    let value = attribute_value(&app, attribute.row).unwrap();
    assert_eq!(
        value.fixed_args,
        vec![CustomAttributeArgument::Enum(
            "App.Level".to_string(),
            Box::new(CustomAttributeArgument::U1(7))
        )]
    );
    Ok(())
}

#[test]
fn concurrent_locator_resolves_many_modules() -> Result<()> {
    let locator = ConcurrentLocator::new(LocatorConfig::new());
    let provider = provider();

    let mut modules: Vec<ModuleTables> = (0..16)
        .map(|_| {
            let mut module = module(&provider, None);
            let level = add_enum(&mut module, "App", "Level", ELEMENT_TYPE::I4);
            let level_token = u8::try_from((level.row + 1) << 2).unwrap();
            let ctor = module
                .add_row(MemberRefRow {
                    class: level,
                    name: ".ctor".to_string(),
                    signature: vec![0x20, 0x01, 0x01, 0x11, level_token],
                })
                .unwrap();
            module
                .add_row(CustomAttributeRow {
                    parent: level,
                    constructor: ctor,
                    value: AttributeBlob::Raw(vec![0x01, 0x00, 0x03, 0x00, 0x00, 0x00, 0x00, 0x00]),
                })
                .unwrap();
            module
        })
        .collect();

    let summary = locator.resolve_all(&mut modules, &LocalTypeResolver);
    assert!(summary.is_complete());
    assert_eq!(summary.resolved, 16);
    Ok(())
}
