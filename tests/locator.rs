//! Reference probing next to the referencing module and in framework reference directories.

mod common;

use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use cilweave::{
    metadata::{
        identity::AssemblyIdentity,
        locator::TargetFrameworkInfo,
        resolution::TypeReference,
        signatures::ELEMENT_TYPE,
    },
    prelude::*,
};
use common::*;

const CLIENT_PROFILE: &str = ".NETFramework,Version=v4.0,Profile=Client";

fn framework_module() -> ModuleTables {
    let mut module = module(&provider(), Some(("App", 1)));
    add_target_framework(&mut module, CLIENT_PROFILE);
    module
}

fn assembly_candidates<L: ReferenceLocator>(locator: &L, module: &ModuleTables, name: &str) -> Vec<PathBuf> {
    let identity = AssemblyIdentity::parse(name).unwrap();
    locator
        .candidate_resources_for_assembly_reference(
            Path::new("/app/App.exe"),
            module,
            Some(&identity),
            name,
        )
        .iter()
        .map(Path::to_path_buf)
        .collect()
}

fn probes_framework_directory<L: ReferenceLocator>(locator: &L) {
    let module = framework_module();
    let reference = Path::new("/ref/.NETFramework/v4.0/Profile/Client");

    assert_eq!(
        assembly_candidates(locator, &module, "System.Core"),
        vec![
            PathBuf::from("/app/System.Core.dll"),
            PathBuf::from("/app/System.Core.exe"),
            reference.join("System.Core.dll"),
            reference.join("System.Core.exe"),
        ]
    );
    assert_eq!(
        locator.target_framework_path_for(&module).as_deref(),
        Some(reference)
    );
}

#[test]
fn every_strategy_probes_alike() {
    let config = LocatorConfig::new().with_framework_base("/ref");
    probes_framework_directory(&SingleThreadedLocator::new(config.clone()));
    probes_framework_directory(&LockedLocator::new(config.clone()));
    probes_framework_directory(&ConcurrentLocator::new(config));
}

#[test]
fn no_framework_no_framework_candidates() {
    let locator = SingleThreadedLocator::new(LocatorConfig::new().with_framework_base("/ref"));
    let module = module(&provider(), Some(("App", 1)));

    assert_eq!(locator.target_framework_info_for(&module), None);
    assert_eq!(
        assembly_candidates(&locator, &module, "Lib, Version=1.0.0.0"),
        vec![PathBuf::from("/app/Lib.dll"), PathBuf::from("/app/Lib.exe")]
    );

    // the framework is known but probing is disabled
    let module = framework_module();
    let disabled = SingleThreadedLocator::new(LocatorConfig::new());
    assert_eq!(
        disabled.target_framework_info_for(&module),
        TargetFrameworkInfo::parse(CLIENT_PROFILE)
    );
    assert_eq!(disabled.target_framework_path_for(&module), None);
}

#[test]
fn referencing_module_is_never_a_candidate() {
    let locator = SingleThreadedLocator::new(LocatorConfig::new());
    let module = module(&provider(), Some(("App", 1)));

    assert_eq!(
        assembly_candidates(&locator, &module, "App"),
        vec![PathBuf::from("/app/App.dll")]
    );

    let modules = locator.candidate_resources_for_module_reference(
        Path::new("/app/./App.dll"),
        &module,
        "App.dll",
    );
    assert!(modules.is_empty());
}

#[test]
fn concurrent_locator_is_shared_across_threads() {
    let locator = Arc::new(ConcurrentLocator::new(
        LocatorConfig::new().with_framework_base("/ref"),
    ));
    let module = framework_module();

    let paths: Vec<Option<PathBuf>> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let locator = Arc::clone(&locator);
                let module = &module;
                scope.spawn(move || locator.target_framework_path_for(module))
            })
            .collect();
        handles.into_iter().map(|handle| handle.join().unwrap()).collect()
    });

    let expected = PathBuf::from("/ref/.NETFramework/v4.0/Profile/Client");
    assert!(paths.iter().all(|path| path.as_ref() == Some(&expected)));
}

#[test]
fn loads_dependencies_from_the_framework_directory() -> Result<()> {
    init_tracing();
    let root = tempfile::tempdir()?;
    let app_dir = root.path().join("app");
    let reference = root.path().join("ref/.NETFramework/v4.0/Profile/Client");
    fs::create_dir_all(&app_dir)?;
    fs::create_dir_all(&reference)?;
    fs::write(reference.join("Lib.dll"), b"lib")?;

    let resolver = AssemblyResolver::new(
        LockedLocator::new(LocatorConfig::new().with_framework_base(root.path().join("ref"))),
        Arc::new(FileSystemLoader::new()),
        Arc::new(read_library),
    );

    let mut app = framework_module();
    let lib = add_assembly_ref(&mut app, "Lib", 1);
    let mode = add_type_ref(&mut app, lib, "Lib", "Mode");
    resolver.register(app_dir.join("App.dll"), &app);

    let info = resolver
        .underlying_type(&app, TypeReference::Index(mode))
        .unwrap();
    assert_eq!(info.name, "Lib.Mode");
    assert_eq!(info.underlying, ELEMENT_TYPE::I2);
    assert_eq!(resolver.loaded_count(), 1);
    Ok(())
}
