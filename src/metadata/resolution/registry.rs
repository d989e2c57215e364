use std::{any::Any, fmt, sync::Arc};

use parking_lot::Mutex;

use crate::metadata::{
    resolution::{ColumnResolver, ResolveContext, TypeResolver},
    tables::{ColumnValue, ModuleTables, SchemaProvider, TableId},
};

struct RegisteredColumn {
    column: usize,
    resolver: Arc<dyn ColumnResolver>,
    /// `None` while a resolution of this column is running
    cache: Mutex<Option<Box<dyn Any + Send>>>,
}

/// The resolvable columns of one module and their caches.
///
/// Built from the resolvers attached to the provider's schemas. Every column gets a fresh
/// cache from [`ColumnResolver::create_cache`], so repeated resolutions within one column of
/// one module share what earlier rows found out.
pub struct ResolutionRegistry {
    tables: Vec<Vec<RegisteredColumn>>,
}

impl ResolutionRegistry {
    /// Collect the resolvable columns of every schema in `provider`.
    #[must_use]
    pub fn new(provider: &Arc<SchemaProvider>) -> Self {
        let mut tables = Vec::with_capacity(TableId::MAX.index() + 1);
        tables.resize_with(TableId::MAX.index() + 1, Vec::new);

        for schema in provider.iter() {
            tables[schema.id().index()] = schema
                .resolvers()
                .iter()
                .map(|entry| RegisteredColumn {
                    column: entry.column,
                    resolver: Arc::clone(&entry.resolver),
                    cache: Mutex::new(Some(entry.resolver.create_cache())),
                })
                .collect();
        }

        ResolutionRegistry { tables }
    }

    /// Number of resolvable columns of table `id`.
    #[must_use]
    pub fn resolvable_column_count(&self, id: TableId) -> usize {
        self.tables[id.index()].len()
    }

    /// Positions of the resolvable columns of table `id`, ascending.
    pub fn resolvable_columns(&self, id: TableId) -> impl Iterator<Item = usize> + '_ {
        self.tables[id.index()].iter().map(|entry| entry.column)
    }

    /// Returns `true` if the cell has a resolver and is still raw.
    #[must_use]
    pub fn needs_resolution(
        &self,
        module: &ModuleTables,
        table: TableId,
        row: u32,
        column: usize,
    ) -> bool {
        let Some(entry) = self.entry(table, column) else {
            return false;
        };

        module
            .try_get_by_table(table)
            .and_then(|target| target.cell(row, column))
            .is_some_and(|value| entry.resolver.needs_resolution(&value))
    }

    /// Compute the resolved value of a raw cell.
    ///
    /// Returns `None` for cells without a resolver, cells that are already resolved and cells
    /// the resolver cannot resolve.
    pub fn compute(
        &self,
        module: &ModuleTables,
        resolver: &dyn TypeResolver,
        table: TableId,
        row: u32,
        column: usize,
    ) -> Option<ColumnValue> {
        let entry = self.entry(table, column)?;
        let value = module.try_get_by_table(table)?.cell(row, column)?;
        if !entry.resolver.needs_resolution(&value) {
            return None;
        }

        let context = ResolveContext {
            module,
            resolver,
            table,
            row,
        };

        // A resolver may reach this column again, e.g. when locating dependencies needs the
        // module's own attributes. The nested call works on a scratch cache.
        let taken = entry.cache.lock().take();
        let mut cache = taken.unwrap_or_else(|| entry.resolver.create_cache());
        let resolved = entry.resolver.resolve(&context, &value, cache.as_mut());

        let mut slot = entry.cache.lock();
        if slot.is_none() {
            *slot = Some(cache);
        }

        tracing::debug!(
            module = module.id().value(),
            ?table,
            row,
            column,
            resolved = resolved.is_some(),
            "cell resolution"
        );
        resolved
    }

    fn entry(&self, table: TableId, column: usize) -> Option<&RegisteredColumn> {
        self.tables
            .get(table.index())?
            .iter()
            .find(|entry| entry.column == column)
    }
}

impl fmt::Debug for ResolutionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (index, columns) in self.tables.iter().enumerate() {
            if !columns.is_empty() {
                let positions: Vec<usize> = columns.iter().map(|entry| entry.column).collect();
                map.entry(&index, &positions);
            }
        }
        map.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{
        customattributes::EnumInfo,
        resolution::TypeReference,
        tables::{
            ConstantRow, CustomAttributeRow, DeclSecurityRow, FieldMarshalRow, FieldPtrRow,
            FieldRow, InterfaceImplRow, MemberRefRow, MethodDefRow, MethodPtrRow, ModuleRefRow,
            ModuleRow, ParamPtrRow, ParamRow, TableRow, TypeDefRow, TypeRefRow,
        },
    };
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Upper-cases `ModuleRef` names, counting cache creations and calls.
    struct UpperCase {
        caches: AtomicUsize,
    }

    impl ColumnResolver for UpperCase {
        fn create_cache(&self) -> Box<dyn Any + Send> {
            self.caches.fetch_add(1, Ordering::SeqCst);
            Box::new(0usize)
        }

        fn needs_resolution(&self, value: &ColumnValue) -> bool {
            matches!(value, ColumnValue::String(name) if name.chars().any(char::is_lowercase))
        }

        fn resolve(
            &self,
            _context: &ResolveContext<'_>,
            value: &ColumnValue,
            cache: &mut (dyn Any + Send),
        ) -> Option<ColumnValue> {
            let calls = cache.downcast_mut::<usize>()?;
            *calls += 1;
            match value {
                ColumnValue::String(name) if !name.starts_with('!') => {
                    Some(ColumnValue::String(name.to_uppercase()))
                }
                _ => None,
            }
        }
    }

    struct NoTypes;

    impl TypeResolver for NoTypes {
        fn underlying_type(&self, _: &ModuleTables, _: TypeReference<'_>) -> Option<EnumInfo> {
            None
        }
    }

    fn module_with_resolver() -> (ModuleTables, Arc<UpperCase>) {
        let resolver = Arc::new(UpperCase {
            caches: AtomicUsize::new(0),
        });
        let mut provider = SchemaProvider::new();
        provider.register(ModuleRow::schema().unwrap()).unwrap();
        provider.register(TypeRefRow::schema().unwrap()).unwrap();
        provider.register(TypeDefRow::schema().unwrap()).unwrap();
        provider.register(FieldPtrRow::schema().unwrap()).unwrap();
        provider.register(FieldRow::schema().unwrap()).unwrap();
        provider.register(MethodPtrRow::schema().unwrap()).unwrap();
        provider.register(MethodDefRow::schema().unwrap()).unwrap();
        provider.register(ParamPtrRow::schema().unwrap()).unwrap();
        provider.register(ParamRow::schema().unwrap()).unwrap();
        provider.register(InterfaceImplRow::schema().unwrap()).unwrap();
        provider.register(MemberRefRow::schema().unwrap()).unwrap();
        provider.register(ConstantRow::schema().unwrap()).unwrap();
        provider.register(CustomAttributeRow::schema().unwrap()).unwrap();
        provider.register(FieldMarshalRow::schema().unwrap()).unwrap();
        provider.register(DeclSecurityRow::schema().unwrap()).unwrap();
        provider
            .register(
                ModuleRefRow::schema()
                    .unwrap()
                    .with_resolver("name", resolver.clone())
                    .unwrap(),
            )
            .unwrap();
        let module = ModuleTables::new(&Arc::new(provider)).unwrap();
        (module, resolver)
    }

    #[test]
    fn standard_resolvable_columns() {
        let provider = Arc::new(SchemaProvider::standard().unwrap());
        let registry = ResolutionRegistry::new(&provider);
        assert_eq!(registry.resolvable_column_count(TableId::CustomAttribute), 1);
        assert_eq!(registry.resolvable_column_count(TableId::DeclSecurity), 1);
        assert_eq!(
            registry.resolvable_columns(TableId::CustomAttribute).collect::<Vec<_>>(),
            vec![2]
        );
        assert_eq!(registry.resolvable_column_count(TableId::GenericParam), 0);
    }

    #[test]
    fn registry_reflects_schemas() {
        let (module, resolver) = module_with_resolver();
        let registry = module.registry();
        assert_eq!(registry.resolvable_column_count(TableId::ModuleRef), 1);
        assert_eq!(registry.resolvable_column_count(TableId::CustomAttribute), 0);
        assert_eq!(registry.resolvable_column_count(TableId::TypeDef), 0);
        assert_eq!(
            registry.resolvable_columns(TableId::ModuleRef).collect::<Vec<_>>(),
            vec![0]
        );
        assert_eq!(resolver.caches.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn resolve_is_idempotent() {
        let (mut module, resolver) = module_with_resolver();
        module
            .add_row(ModuleRefRow {
                name: "native.dll".into(),
            })
            .unwrap();

        assert!(module.resolve(&NoTypes, TableId::ModuleRef, 0, 0));
        assert_eq!(
            module.row::<ModuleRefRow>(0).unwrap().name,
            "NATIVE.DLL".to_string()
        );
        assert!(!module.resolve(&NoTypes, TableId::ModuleRef, 0, 0));
        assert_eq!(module.row::<ModuleRefRow>(0).unwrap().name, "NATIVE.DLL");

        // no resolver, missing row
        assert!(!module.resolve(&NoTypes, TableId::TypeDef, 0, 0));
        assert!(!module.resolve(&NoTypes, TableId::ModuleRef, 7, 0));
        assert_eq!(resolver.caches.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn bulk_resolution_reports_failures() {
        let (mut module, _) = module_with_resolver();
        for name in ["a.dll", "!b.dll", "C.DLL", "d.dll"] {
            module.add_row(ModuleRefRow { name: name.into() }).unwrap();
        }

        let summary = module.resolve_everything(&NoTypes);
        assert_eq!(summary.attempted, 3);
        assert_eq!(summary.resolved, 2);
        assert_eq!(
            summary.unresolved,
            vec![crate::metadata::resolution::CellAddress {
                table: TableId::ModuleRef,
                row: 1,
                column: 0
            }]
        );

        let again = module.resolve_everything(&NoTypes);
        assert_eq!(again.attempted, 1);
        assert_eq!(again.resolved, 0);
    }
}
