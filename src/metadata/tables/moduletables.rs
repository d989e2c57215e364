//! The table aggregate of one module.

use std::{
    fmt,
    sync::{
        atomic::{AtomicU64, Ordering as AtomicOrdering},
        Arc,
    },
};

use strum::IntoEnumIterator;

use crate::{
    metadata::{
        resolution::{CellAddress, ResolutionRegistry, ResolutionSummary, TypeResolver},
        tables::{
            ColumnValue, ConstantRow, CustomAttributeRow, DeclSecurityRow, FieldMarshalRow,
            FieldPtrRow, FieldRow, InterfaceImplRow, MemberRefRow, MetadataTable, MethodDefRow,
            MethodPtrRow, ModuleRow, ParamPtrRow, ParamRow, SchemaProvider, Table, TableId,
            TableRow, TypeDefRow, TypeRefRow, FIXED_TABLE_COUNT,
        },
        token::TableIndex,
    },
    Error, Result,
};

static NEXT_MODULE_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of one [`ModuleTables`] instance.
///
/// Two modules with identical contents still have different ids; caches keyed by `ModuleId`
/// follow instance identity, not structural equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId(u64);

impl ModuleId {
    fn next() -> Self {
        ModuleId(NEXT_MODULE_ID.fetch_add(1, AtomicOrdering::Relaxed))
    }

    /// The raw id value.
    #[must_use]
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Row capacity hints used to pre-size table storage.
#[derive(Debug, Clone, Default)]
pub struct TableCapacities {
    capacities: Vec<(TableId, usize)>,
}

impl TableCapacities {
    /// No hints.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Expect `rows` rows in table `id`.
    #[must_use]
    pub fn with(mut self, id: TableId, rows: usize) -> Self {
        self.capacities.retain(|(existing, _)| *existing != id);
        self.capacities.push((id, rows));
        self
    }

    /// The hint for `id`, `0` if none was given.
    #[must_use]
    pub fn get(&self, id: TableId) -> usize {
        self.capacities
            .iter()
            .find(|(existing, _)| *existing == id)
            .map_or(0, |(_, rows)| *rows)
    }
}

/// All tables of one module.
///
/// The fifteen table kinds `Module` through `DeclSecurity` are always present and stored as
/// fields. Every higher kind lives in a sparse array and is only created when the first row is
/// added (or when a capacity hint asks for it). [`ModuleTables::try_get_by_table`] selects the
/// region by comparing the kind against [`FIXED_TABLE_COUNT`].
///
/// `ModuleTables` also owns the [`ResolutionRegistry`] of the module. It is not safe for
/// concurrent mutation; resolving the same module from several threads must be serialized by
/// the caller.
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use cilweave::metadata::tables::{ModuleRefRow, ModuleTables, SchemaProvider, TableId};
///
/// let provider = Arc::new(SchemaProvider::standard()?);
/// let mut module = ModuleTables::new(&provider)?;
///
/// assert!(module.try_get_by_table(TableId::ModuleRef).is_none());
/// let index = module.add_row(ModuleRefRow { name: "native.dll".into() })?;
///
/// let table = module.try_get_by_table(TableId::ModuleRef).unwrap();
/// assert_eq!(table.row_count(), 1);
/// assert_eq!(index.row, 0);
/// # Ok::<(), cilweave::Error>(())
/// ```
pub struct ModuleTables {
    id: ModuleId,
    provider: Arc<SchemaProvider>,
    registry: ResolutionRegistry,
    module: MetadataTable<ModuleRow>,
    type_ref: MetadataTable<TypeRefRow>,
    type_def: MetadataTable<TypeDefRow>,
    field_ptr: MetadataTable<FieldPtrRow>,
    field: MetadataTable<FieldRow>,
    method_ptr: MetadataTable<MethodPtrRow>,
    method_def: MetadataTable<MethodDefRow>,
    param_ptr: MetadataTable<ParamPtrRow>,
    param: MetadataTable<ParamRow>,
    interface_impl: MetadataTable<InterfaceImplRow>,
    member_ref: MetadataTable<MemberRefRow>,
    constant: MetadataTable<ConstantRow>,
    custom_attribute: MetadataTable<CustomAttributeRow>,
    field_marshal: MetadataTable<FieldMarshalRow>,
    decl_security: MetadataTable<DeclSecurityRow>,
    additional: Vec<Option<Box<dyn Table>>>,
}

fn fixed_table<R: TableRow>(
    provider: &SchemaProvider,
    capacities: &TableCapacities,
) -> Result<MetadataTable<R>> {
    let Some(schema) = provider.schema::<R>() else {
        return Err(schema_error!("provider has no schema for {:?}", R::TABLE));
    };

    Ok(MetadataTable::with_capacity(schema, capacities.get(R::TABLE)))
}

impl ModuleTables {
    /// Create an empty module.
    ///
    /// # Errors
    /// Returns [`crate::Error::Schema`] if `provider` lacks a schema for a fixed table kind.
    pub fn new(provider: &Arc<SchemaProvider>) -> Result<Self> {
        Self::with_capacity(provider, &TableCapacities::new())
    }

    /// Create an empty module with pre-sized row storage.
    ///
    /// Additional tables with a non-zero hint are created right away.
    ///
    /// # Errors
    /// Returns [`crate::Error::Schema`] if `provider` lacks a schema for a fixed table kind or
    /// for a hinted additional kind.
    pub fn with_capacity(
        provider: &Arc<SchemaProvider>,
        capacities: &TableCapacities,
    ) -> Result<Self> {
        let mut tables = ModuleTables {
            id: ModuleId::next(),
            provider: Arc::clone(provider),
            registry: ResolutionRegistry::new(provider),
            module: fixed_table(provider, capacities)?,
            type_ref: fixed_table(provider, capacities)?,
            type_def: fixed_table(provider, capacities)?,
            field_ptr: fixed_table(provider, capacities)?,
            field: fixed_table(provider, capacities)?,
            method_ptr: fixed_table(provider, capacities)?,
            method_def: fixed_table(provider, capacities)?,
            param_ptr: fixed_table(provider, capacities)?,
            param: fixed_table(provider, capacities)?,
            interface_impl: fixed_table(provider, capacities)?,
            member_ref: fixed_table(provider, capacities)?,
            constant: fixed_table(provider, capacities)?,
            custom_attribute: fixed_table(provider, capacities)?,
            field_marshal: fixed_table(provider, capacities)?,
            decl_security: fixed_table(provider, capacities)?,
            additional: Vec::new(),
        };
        tables
            .additional
            .resize_with(TableId::MAX.index() + 1 - FIXED_TABLE_COUNT, || None);

        for id in TableId::iter().filter(|id| !id.is_fixed()) {
            let capacity = capacities.get(id);
            if capacity > 0 {
                tables.create_additional(id, capacity)?;
            }
        }

        Ok(tables)
    }

    /// Identity of this instance.
    #[must_use]
    pub fn id(&self) -> ModuleId {
        self.id
    }

    /// The provider the module was built from.
    #[must_use]
    pub fn provider(&self) -> &Arc<SchemaProvider> {
        &self.provider
    }

    /// The resolution registry of this module.
    #[must_use]
    pub fn registry(&self) -> &ResolutionRegistry {
        &self.registry
    }

    /// The table of kind `id`, if present.
    ///
    /// Fixed kinds are always present; additional kinds are present once created.
    #[must_use]
    pub fn try_get_by_table(&self, id: TableId) -> Option<&dyn Table> {
        let table: &dyn Table = match id {
            TableId::Module => &self.module,
            TableId::TypeRef => &self.type_ref,
            TableId::TypeDef => &self.type_def,
            TableId::FieldPtr => &self.field_ptr,
            TableId::Field => &self.field,
            TableId::MethodPtr => &self.method_ptr,
            TableId::MethodDef => &self.method_def,
            TableId::ParamPtr => &self.param_ptr,
            TableId::Param => &self.param,
            TableId::InterfaceImpl => &self.interface_impl,
            TableId::MemberRef => &self.member_ref,
            TableId::Constant => &self.constant,
            TableId::CustomAttribute => &self.custom_attribute,
            TableId::FieldMarshal => &self.field_marshal,
            TableId::DeclSecurity => &self.decl_security,
            _ => return self.additional[id.index() - FIXED_TABLE_COUNT].as_deref(),
        };

        Some(table)
    }

    /// Mutable variant of [`ModuleTables::try_get_by_table`].
    pub fn try_get_by_table_mut(&mut self, id: TableId) -> Option<&mut dyn Table> {
        let table: &mut dyn Table = match id {
            TableId::Module => &mut self.module,
            TableId::TypeRef => &mut self.type_ref,
            TableId::TypeDef => &mut self.type_def,
            TableId::FieldPtr => &mut self.field_ptr,
            TableId::Field => &mut self.field,
            TableId::MethodPtr => &mut self.method_ptr,
            TableId::MethodDef => &mut self.method_def,
            TableId::ParamPtr => &mut self.param_ptr,
            TableId::Param => &mut self.param,
            TableId::InterfaceImpl => &mut self.interface_impl,
            TableId::MemberRef => &mut self.member_ref,
            TableId::Constant => &mut self.constant,
            TableId::CustomAttribute => &mut self.custom_attribute,
            TableId::FieldMarshal => &mut self.field_marshal,
            TableId::DeclSecurity => &mut self.decl_security,
            _ => {
                return match self.additional[id.index() - FIXED_TABLE_COUNT].as_mut() {
                    Some(table) => Some(table.as_mut()),
                    None => None,
                }
            }
        };

        Some(table)
    }

    /// The fixed tables in kind order.
    pub fn fixed_tables(&self) -> impl Iterator<Item = &dyn Table> + '_ {
        TableId::iter()
            .take(FIXED_TABLE_COUNT)
            .filter_map(move |id| self.try_get_by_table(id))
    }

    /// The present additional tables in kind order.
    pub fn additional_tables(&self) -> impl Iterator<Item = &dyn Table> + '_ {
        self.additional.iter().filter_map(|table| table.as_deref())
    }

    /// All present tables in kind order, fixed first.
    pub fn tables(&self) -> impl Iterator<Item = &dyn Table> + '_ {
        self.fixed_tables().chain(self.additional_tables())
    }

    /// The typed table of `R`, if present.
    #[must_use]
    pub fn table<R: TableRow>(&self) -> Option<&MetadataTable<R>> {
        self.try_get_by_table(R::TABLE)?
            .as_any()
            .downcast_ref::<MetadataTable<R>>()
    }

    /// The typed table of `R`, mutably.
    pub fn table_mut<R: TableRow>(&mut self) -> Option<&mut MetadataTable<R>> {
        self.try_get_by_table_mut(R::TABLE)?
            .as_any_mut()
            .downcast_mut::<MetadataTable<R>>()
    }

    /// Row `row` of the typed table of `R`.
    #[must_use]
    pub fn row<R: TableRow>(&self, row: u32) -> Option<&R> {
        self.table::<R>()?.get(row)
    }

    /// Number of rows of table `id`, `0` for an absent table.
    #[must_use]
    pub fn row_count(&self, id: TableId) -> u32 {
        self.try_get_by_table(id).map_or(0, |table| table.row_count())
    }

    /// The typed table of `R`, creating an additional table on first use.
    ///
    /// # Errors
    /// Returns [`crate::Error::Schema`] if the provider has no schema for `R`.
    pub fn table_or_create<R: TableRow>(&mut self) -> Result<&mut MetadataTable<R>> {
        if self.try_get_by_table(R::TABLE).is_none() {
            self.create_additional(R::TABLE, 0)?;
        }

        let Some(table) = self.table_mut::<R>() else {
            return Err(schema_error!(
                "table {:?} does not hold rows of the requested type",
                R::TABLE
            ));
        };
        Ok(table)
    }

    /// Append `row` to its table and return its address.
    ///
    /// # Errors
    /// Returns [`crate::Error::Schema`] if the table has to be created and the provider has no
    /// schema for it.
    pub fn add_row<R: TableRow>(&mut self, row: R) -> Result<TableIndex> {
        Ok(self.table_or_create::<R>()?.add_row(row))
    }

    fn create_additional(&mut self, id: TableId, capacity: usize) -> Result<()> {
        let Some(schema) = self.provider.get(id) else {
            return Err(schema_error!("provider has no schema for {:?}", id));
        };

        let table = schema.create_table(capacity);
        if table.id() != id {
            return Err(Error::TableMismatch {
                expected: id,
                found: table.id(),
            });
        }

        self.additional[id.index() - FIXED_TABLE_COUNT] = Some(table);
        Ok(())
    }

    /// Compute the resolved value of one cell without modifying the module.
    ///
    /// Returns `None` if the column has no resolver, the cell does not exist, it is already
    /// resolved, or the resolver cannot resolve it.
    #[must_use]
    pub fn compute_resolution(
        &self,
        resolver: &dyn TypeResolver,
        table: TableId,
        row: u32,
        column: usize,
    ) -> Option<ColumnValue> {
        self.registry.compute(self, resolver, table, row, column)
    }

    /// Resolve one cell in place.
    ///
    /// Returns `true` only if the cell changed from its raw to its resolved form. Cells that are
    /// already resolved, cannot be resolved, or have no resolver report `false`.
    pub fn resolve(
        &mut self,
        resolver: &dyn TypeResolver,
        table: TableId,
        row: u32,
        column: usize,
    ) -> bool {
        let Some(value) = self.compute_resolution(resolver, table, row, column) else {
            return false;
        };

        match self.try_get_by_table_mut(table) {
            Some(target) => match target.set_cell(row, column, value) {
                Ok(()) => true,
                Err(error) => {
                    tracing::warn!(?table, row, column, %error, "resolved value rejected by column");
                    false
                }
            },
            None => false,
        }
    }

    /// Resolve every resolvable cell of every table.
    ///
    /// Unresolvable cells are left raw and reported in the summary; the scan never stops early.
    pub fn resolve_everything(&mut self, resolver: &dyn TypeResolver) -> ResolutionSummary {
        let mut summary = ResolutionSummary::default();

        let targets: Vec<(TableId, Vec<usize>)> = TableId::iter()
            .map(|id| (id, self.registry.resolvable_columns(id).collect::<Vec<_>>()))
            .filter(|(_, columns)| !columns.is_empty())
            .collect();

        for (table, columns) in targets {
            for row in 0..self.row_count(table) {
                for &column in &columns {
                    if !self.registry.needs_resolution(self, table, row, column) {
                        continue;
                    }

                    summary.attempted += 1;
                    if self.resolve(resolver, table, row, column) {
                        summary.resolved += 1;
                    } else {
                        summary.unresolved.push(CellAddress { table, row, column });
                    }
                }
            }
        }

        tracing::debug!(
            module = self.id.value(),
            attempted = summary.attempted,
            resolved = summary.resolved,
            unresolved = summary.unresolved.len(),
            "resolution pass finished"
        );
        summary
    }
}

impl fmt::Debug for ModuleTables {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut list = f.debug_map();
        for table in self.tables() {
            list.entry(&table.id(), &table.row_count());
        }
        list.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        metadata::tables::{ClassLayoutRow, FieldRow, ModuleRefRow, NestedClassRow},
        Error,
    };

    fn provider() -> Arc<SchemaProvider> {
        Arc::new(SchemaProvider::standard().unwrap())
    }

    #[test]
    fn every_kind_has_its_own_storage() {
        let provider = provider();
        let mut module = ModuleTables::new(&provider).unwrap();
        for id in TableId::iter().filter(|id| !id.is_fixed()) {
            module.create_additional(id, 0).unwrap();
        }

        let tables: Vec<&dyn Table> = TableId::iter()
            .map(|id| module.try_get_by_table(id).unwrap())
            .collect();
        for (position, id) in TableId::iter().enumerate() {
            assert_eq!(tables[position].id(), id);
            for other in &tables[position + 1..] {
                assert!(!std::ptr::addr_eq(
                    tables[position] as *const dyn Table,
                    *other as *const dyn Table
                ));
            }
        }
    }

    #[test]
    fn fixed_tables_always_present() {
        let module = ModuleTables::new(&provider()).unwrap();
        assert_eq!(module.fixed_tables().count(), FIXED_TABLE_COUNT);
        assert_eq!(module.additional_tables().count(), 0);
        assert!(module.try_get_by_table(TableId::DeclSecurity).is_some());
        assert!(module.try_get_by_table(TableId::ClassLayout).is_none());
    }

    #[test]
    fn additional_tables_created_on_demand_in_kind_order() {
        let mut module = ModuleTables::new(&provider()).unwrap();
        module
            .add_row(NestedClassRow {
                nested_class: TableIndex::new(TableId::TypeDef, 1),
                enclosing_class: TableIndex::new(TableId::TypeDef, 0),
            })
            .unwrap();
        module.add_row(ModuleRefRow { name: "a".into() }).unwrap();

        let ids: Vec<TableId> = module.additional_tables().map(|t| t.id()).collect();
        assert_eq!(ids, vec![TableId::ModuleRef, TableId::NestedClass]);

        let all: Vec<TableId> = module.tables().map(|t| t.id()).collect();
        assert_eq!(all.len(), FIXED_TABLE_COUNT + 2);
        assert_eq!(all[0], TableId::Module);
        assert_eq!(all[FIXED_TABLE_COUNT], TableId::ModuleRef);
    }

    #[test]
    fn capacity_hints_create_tables() {
        let capacities = TableCapacities::new()
            .with(TableId::Field, 64)
            .with(TableId::ClassLayout, 4);
        let module = ModuleTables::with_capacity(&provider(), &capacities).unwrap();
        assert!(module.table::<ClassLayoutRow>().is_some());
        assert_eq!(module.table::<FieldRow>().unwrap().len(), 0);
        assert_eq!(capacities.get(TableId::Event), 0);
    }

    #[test]
    fn erased_insert_through_module() {
        let mut module = ModuleTables::new(&provider()).unwrap();
        let fields = module.try_get_by_table_mut(TableId::Field).unwrap();
        assert!(fields.try_add_row(Box::new(FieldRow {
            flags: 0x0006,
            name: "value__".into(),
            signature: vec![0x06, 0x08],
        })));
        assert!(!fields.try_add_row(Box::new(ModuleRefRow::default())));
        assert_eq!(module.row::<FieldRow>(0).unwrap().name, "value__");
    }

    #[test]
    fn incomplete_provider_is_a_schema_error() {
        let mut partial = SchemaProvider::new();
        partial.register(ModuleRow::schema().unwrap()).unwrap();
        let result = ModuleTables::new(&Arc::new(partial));
        assert!(matches!(result, Err(Error::Schema(_))));
    }

    #[test]
    fn module_ids_are_unique() {
        let provider = provider();
        let first = ModuleTables::new(&provider).unwrap();
        let second = ModuleTables::new(&provider).unwrap();
        assert_ne!(first.id(), second.id());
    }
}
