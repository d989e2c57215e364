//! Benchmarks for in-place custom attribute resolution.
//!
//! - One module with many attributes taking a local enum
//! - Many small modules resolved in parallel through a concurrent locator

extern crate cilweave;

use cilweave::{
    metadata::{customattributes::AttributeBlob, signatures::ELEMENT_TYPE},
    prelude::*,
};
use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use std::{hint::black_box, sync::Arc};

/// A module defining `App.Level : int` and `attributes` attributes passing one of its values.
fn module_with_attributes(provider: &Arc<SchemaProvider>, attributes: usize) -> ModuleTables {
    let mut module = ModuleTables::new(provider).unwrap();
    let level = module
        .add_row(TypeDefRow {
            flags: 0x0101,
            type_name: "Level".to_string(),
            type_namespace: "App".to_string(),
            ..Default::default()
        })
        .unwrap();
    module
        .add_row(FieldRow {
            flags: 0x0606,
            name: "value__".to_string(),
            signature: vec![0x06, ELEMENT_TYPE::I4],
        })
        .unwrap();

    let level_token = u8::try_from((level.row + 1) << 2).unwrap();
    let ctor = module
        .add_row(MemberRefRow {
            class: level,
            name: ".ctor".to_string(),
            signature: vec![0x20, 0x01, 0x01, 0x11, level_token],
        })
        .unwrap();

    for i in 0..attributes {
        let mut blob = vec![0x01, 0x00];
        blob.extend_from_slice(&(i as i32).to_le_bytes());
        blob.extend_from_slice(&[0x00, 0x00]);
        module
            .add_row(CustomAttributeRow {
                parent: level,
                constructor: ctor,
                value: AttributeBlob::Raw(blob),
            })
            .unwrap();
    }
    module
}

/// Benchmark resolving 1k attributes of one module.
fn bench_resolve_local(c: &mut Criterion) {
    let provider = Arc::new(SchemaProvider::standard().unwrap());

    c.bench_function("resolve_local_1k", |b| {
        b.iter_batched(
            || module_with_attributes(&provider, 1024),
            |mut module| black_box(module.resolve_everything(&LocalTypeResolver)),
            BatchSize::LargeInput,
        );
    });
}

/// Benchmark resolving 64 modules of 64 attributes each on the rayon pool.
fn bench_resolve_parallel(c: &mut Criterion) {
    let provider = Arc::new(SchemaProvider::standard().unwrap());
    let locator = ConcurrentLocator::new(LocatorConfig::new());

    c.bench_function("resolve_parallel_64x64", |b| {
        b.iter_batched(
            || {
                (0..64)
                    .map(|_| module_with_attributes(&provider, 64))
                    .collect::<Vec<_>>()
            },
            |mut modules| black_box(locator.resolve_all(&mut modules, &LocalTypeResolver)),
            BatchSize::LargeInput,
        );
    });
}

criterion_group!(benches, bench_resolve_local, bench_resolve_parallel);
criterion_main!(benches);
