//! Table and column schemas.
//!
//! A [`TableSchema`] describes one table kind: how to create an empty row, how to read and write
//! each column through [`ColumnValue`], how to compare rows, and which columns carry raw values
//! that a [`ColumnResolver`] can turn into resolved ones. Schemas are immutable once built and
//! are shared between all tables of the same kind through a [`SchemaProvider`].
//!
//! Schema errors are programming mistakes. They are reported as [`crate::Error::Schema`] at
//! construction time and never deferred.

use std::{any::Any, cmp::Ordering, fmt, sync::Arc};

use crate::{
    metadata::{
        resolution::ColumnResolver,
        tables::{
            rows, ColumnError, ColumnKind, ColumnType, ColumnValue, MetadataTable, Table, TableId,
        },
    },
    Result,
};

/// Reads a column out of a row.
pub type ColumnGetter<R> = fn(&R) -> ColumnValue;

/// Writes a column of a row.
pub type ColumnSetter<R> = fn(&mut R, ColumnValue) -> std::result::Result<(), ColumnError>;

/// A row type with a statically known table kind and schema.
///
/// Implemented by every row type declared with `metadata_row!`.
pub trait TableRow: Any + Clone + fmt::Debug + Send + Sync + Sized {
    /// The table kind rows of this type belong to.
    const TABLE: TableId;

    /// Build the default schema for this row type.
    ///
    /// # Errors
    /// Returns [`crate::Error::Schema`] if the declared schema is inconsistent.
    fn schema() -> Result<TableSchema<Self>>;
}

/// One column of a row type.
pub struct ColumnSchema<R> {
    name: &'static str,
    kind: ColumnKind,
    nullable: bool,
    getter: ColumnGetter<R>,
    setter: ColumnSetter<R>,
}

impl<R> ColumnSchema<R> {
    /// Describe a column backed by a field of type `T`.
    ///
    /// The column kind and nullability are taken from `T`'s [`ColumnType`] implementation.
    pub fn new<T: ColumnType>(
        name: &'static str,
        getter: ColumnGetter<R>,
        setter: ColumnSetter<R>,
    ) -> Self {
        ColumnSchema {
            name,
            kind: T::KIND,
            nullable: T::NULLABLE,
            getter,
            setter,
        }
    }

    /// Column name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Column kind.
    #[must_use]
    pub fn kind(&self) -> ColumnKind {
        self.kind
    }

    /// Whether the column accepts [`ColumnValue::Null`].
    #[must_use]
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// Read the column of `row`.
    pub fn get(&self, row: &R) -> ColumnValue {
        (self.getter)(row)
    }

    /// Write the column of `row`.
    ///
    /// # Errors
    /// Returns the [`ColumnError`] of the column's type mapping.
    pub fn set(&self, row: &mut R, value: ColumnValue) -> std::result::Result<(), ColumnError> {
        (self.setter)(row, value)
    }
}

impl<R> fmt::Debug for ColumnSchema<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnSchema")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("nullable", &self.nullable)
            .finish()
    }
}

/// A resolver attached to one column.
#[derive(Clone)]
pub struct ResolvableColumn {
    /// Column position
    pub column: usize,
    /// The resolver converting raw values of that column
    pub resolver: Arc<dyn ColumnResolver>,
}

/// The immutable description of one table kind.
pub struct TableSchema<R> {
    id: TableId,
    columns: Vec<ColumnSchema<R>>,
    row_factory: fn() -> R,
    equality: fn(&R, &R) -> bool,
    ordering: Option<fn(&R, &R) -> Ordering>,
    resolvers: Vec<ResolvableColumn>,
}

impl<R> TableSchema<R> {
    /// Start building a schema for the table kind `id`.
    #[must_use]
    pub fn builder(id: TableId) -> TableSchemaBuilder<R> {
        TableSchemaBuilder {
            id,
            columns: Vec::new(),
            row_factory: None,
            equality: None,
            ordering: None,
        }
    }

    /// The table kind.
    #[must_use]
    pub fn id(&self) -> TableId {
        self.id
    }

    /// All columns in declaration order.
    #[must_use]
    pub fn columns(&self) -> &[ColumnSchema<R>] {
        &self.columns
    }

    /// One column.
    #[must_use]
    pub fn column(&self, index: usize) -> Option<&ColumnSchema<R>> {
        self.columns.get(index)
    }

    /// Position of the column called `name`.
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column.name == name)
    }

    /// Create an empty row through the row factory.
    #[must_use]
    pub fn create_row(&self) -> R {
        (self.row_factory)()
    }

    /// Compare two rows with the schema's equality comparer.
    pub fn rows_equal(&self, left: &R, right: &R) -> bool {
        (self.equality)(left, right)
    }

    /// Compare two rows with the schema's ordering comparer, if the table is sorted.
    pub fn compare(&self, left: &R, right: &R) -> Option<Ordering> {
        self.ordering.map(|ordering| ordering(left, right))
    }

    /// Returns `true` if the persisted format requires this table to be sorted.
    #[must_use]
    pub fn is_ordered(&self) -> bool {
        self.ordering.is_some()
    }

    /// Columns with an attached resolver.
    #[must_use]
    pub fn resolvers(&self) -> &[ResolvableColumn] {
        &self.resolvers
    }

    /// Attach `resolver` to the column called `column`.
    ///
    /// # Errors
    /// Returns [`crate::Error::Schema`] if the column does not exist or already has a resolver.
    pub fn with_resolver(mut self, column: &str, resolver: Arc<dyn ColumnResolver>) -> Result<Self> {
        let Some(position) = self.column_index(column) else {
            return Err(schema_error!("{:?} has no column '{}'", self.id, column));
        };

        if self.resolvers.iter().any(|entry| entry.column == position) {
            return Err(schema_error!(
                "{:?}.{} already has a resolver",
                self.id,
                column
            ));
        }

        self.resolvers.push(ResolvableColumn {
            column: position,
            resolver,
        });
        self.resolvers.sort_by_key(|entry| entry.column);
        Ok(self)
    }
}

impl<R> fmt::Debug for TableSchema<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableSchema")
            .field("id", &self.id)
            .field("columns", &self.columns)
            .field("ordered", &self.ordering.is_some())
            .field("resolvers", &self.resolvers.len())
            .finish()
    }
}

/// Builder for [`TableSchema`].
pub struct TableSchemaBuilder<R> {
    id: TableId,
    columns: Vec<ColumnSchema<R>>,
    row_factory: Option<fn() -> R>,
    equality: Option<fn(&R, &R) -> bool>,
    ordering: Option<fn(&R, &R) -> Ordering>,
}

impl<R> TableSchemaBuilder<R> {
    /// Append a column.
    #[must_use]
    pub fn column(mut self, column: ColumnSchema<R>) -> Self {
        self.columns.push(column);
        self
    }

    /// Set the function creating empty rows.
    #[must_use]
    pub fn row_factory(mut self, factory: fn() -> R) -> Self {
        self.row_factory = Some(factory);
        self
    }

    /// Set the row equality comparer.
    #[must_use]
    pub fn equality(mut self, equality: fn(&R, &R) -> bool) -> Self {
        self.equality = Some(equality);
        self
    }

    /// Set the row ordering comparer of a sorted table.
    #[must_use]
    pub fn ordering(mut self, ordering: fn(&R, &R) -> Ordering) -> Self {
        self.ordering = Some(ordering);
        self
    }

    /// Finish the schema.
    ///
    /// # Errors
    /// Returns [`crate::Error::Schema`] if there are no columns, no row factory, no equality
    /// comparer, or two columns share a name.
    pub fn build(self) -> Result<TableSchema<R>> {
        if self.columns.is_empty() {
            return Err(schema_error!("{:?} declares no columns", self.id));
        }

        let Some(row_factory) = self.row_factory else {
            return Err(schema_error!("{:?} has no row factory", self.id));
        };

        let Some(equality) = self.equality else {
            return Err(schema_error!("{:?} has no equality comparer", self.id));
        };

        for (position, column) in self.columns.iter().enumerate() {
            if self.columns[..position]
                .iter()
                .any(|other| other.name == column.name)
            {
                return Err(schema_error!(
                    "{:?} declares column '{}' twice",
                    self.id,
                    column.name
                ));
            }
        }

        Ok(TableSchema {
            id: self.id,
            columns: self.columns,
            row_factory,
            equality,
            ordering: self.ordering,
            resolvers: Vec::new(),
        })
    }
}

/// A schema with its row type erased.
pub trait AnySchema: Send + Sync {
    /// The table kind.
    fn id(&self) -> TableId;

    /// Number of columns.
    fn column_count(&self) -> usize;

    /// Columns with an attached resolver.
    fn resolvers(&self) -> &[ResolvableColumn];

    /// Create an empty table of this kind with room for `capacity` rows.
    fn create_table(self: Arc<Self>, capacity: usize) -> Box<dyn Table>;
}

impl<R: TableRow> AnySchema for TableSchema<R> {
    fn id(&self) -> TableId {
        self.id
    }

    fn column_count(&self) -> usize {
        self.columns.len()
    }

    fn resolvers(&self) -> &[ResolvableColumn] {
        &self.resolvers
    }

    fn create_table(self: Arc<Self>, capacity: usize) -> Box<dyn Table> {
        Box::new(MetadataTable::with_capacity(self, capacity))
    }
}

struct ProviderEntry {
    erased: Arc<dyn AnySchema>,
    typed: Arc<dyn Any + Send + Sync>,
}

/// The set of schemas a module is built from.
///
/// A provider holds at most one schema per table kind. It is passed explicitly to
/// [`crate::metadata::tables::ModuleTables`] so that modules built from the same provider share
/// their schemas and resolvers.
///
/// # Examples
///
/// ```rust
/// use cilweave::metadata::tables::{SchemaProvider, TableId};
///
/// let provider = SchemaProvider::standard()?;
/// assert!(provider.contains(TableId::CustomAttribute));
/// assert!(provider.contains(TableId::GenericParamConstraint));
/// # Ok::<(), cilweave::Error>(())
/// ```
pub struct SchemaProvider {
    entries: Vec<Option<ProviderEntry>>,
}

impl SchemaProvider {
    /// Create an empty provider.
    #[must_use]
    pub fn new() -> Self {
        let mut entries = Vec::with_capacity(TableId::MAX.index() + 1);
        entries.resize_with(TableId::MAX.index() + 1, || None);
        SchemaProvider { entries }
    }

    /// A provider with the default schema of every table kind and the built-in resolvers for
    /// custom attribute values and permission sets.
    ///
    /// # Errors
    /// Returns [`crate::Error::Schema`] if any default schema is inconsistent.
    pub fn standard() -> Result<Self> {
        let mut provider = SchemaProvider::new();
        rows::register_all(&mut provider)?;
        Ok(provider)
    }

    /// Register the schema of `R`.
    ///
    /// # Errors
    /// Returns [`crate::Error::Schema`] if the schema's kind differs from `R::TABLE` or a schema
    /// for that kind is already registered.
    pub fn register<R: TableRow>(&mut self, schema: TableSchema<R>) -> Result<()> {
        if schema.id != R::TABLE {
            return Err(schema_error!(
                "schema for {:?} describes rows of {:?}",
                schema.id,
                R::TABLE
            ));
        }

        let slot = &mut self.entries[R::TABLE.index()];
        if slot.is_some() {
            return Err(schema_error!("duplicate schema for {:?}", R::TABLE));
        }

        let schema = Arc::new(schema);
        *slot = Some(ProviderEntry {
            erased: schema.clone(),
            typed: schema,
        });
        Ok(())
    }

    /// Returns `true` if a schema for `id` is registered.
    #[must_use]
    pub fn contains(&self, id: TableId) -> bool {
        self.entry(id).is_some()
    }

    /// The erased schema for `id`.
    #[must_use]
    pub fn get(&self, id: TableId) -> Option<Arc<dyn AnySchema>> {
        self.entry(id).map(|entry| entry.erased.clone())
    }

    /// The typed schema of `R`.
    #[must_use]
    pub fn schema<R: TableRow>(&self) -> Option<Arc<TableSchema<R>>> {
        let entry = self.entry(R::TABLE)?;
        entry.typed.clone().downcast::<TableSchema<R>>().ok()
    }

    /// Registered schemas in kind order.
    pub fn iter(&self) -> impl Iterator<Item = Arc<dyn AnySchema>> + '_ {
        self.entries
            .iter()
            .flatten()
            .map(|entry| entry.erased.clone())
    }

    fn entry(&self, id: TableId) -> Option<&ProviderEntry> {
        self.entries.get(id.index()).and_then(Option::as_ref)
    }
}

impl Default for SchemaProvider {
    fn default() -> Self {
        SchemaProvider::new()
    }
}

impl fmt::Debug for SchemaProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().flatten().map(|entry| entry.erased.id()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        metadata::tables::{ModuleRefRow, NestedClassRow, TypeRefRow},
        metadata::token::TableIndex,
        Error,
    };

    #[test]
    fn builder_rejects_missing_parts() {
        let no_columns = TableSchema::<ModuleRefRow>::builder(TableId::ModuleRef)
            .row_factory(ModuleRefRow::default)
            .equality(|a: &ModuleRefRow, b: &ModuleRefRow| a == b)
            .build();
        assert!(matches!(no_columns, Err(Error::Schema(_))));

        let no_factory = TableSchema::<ModuleRefRow>::builder(TableId::ModuleRef)
            .equality(|a: &ModuleRefRow, b: &ModuleRefRow| a == b)
            .column(ColumnSchema::new::<String>(
                "name",
                |row: &ModuleRefRow| row.name.to_value(),
                |row: &mut ModuleRefRow, value| {
                    row.name = String::from_value(value)?;
                    Ok(())
                },
            ))
            .build();
        assert!(matches!(no_factory, Err(Error::Schema(_))));
    }

    #[test]
    fn declared_schema_shape() {
        let schema = TypeRefRow::schema().unwrap();
        assert_eq!(schema.id(), TableId::TypeRef);
        assert_eq!(schema.columns().len(), 3);
        assert_eq!(schema.column_index("type_name"), Some(1));

        let scope = schema.column(0).unwrap();
        assert_eq!(scope.kind(), ColumnKind::Index);
        assert!(scope.is_nullable());
        assert!(!schema.column(1).unwrap().is_nullable());
    }

    #[test]
    fn column_access_through_schema() {
        let schema = TypeRefRow::schema().unwrap();
        let mut row = schema.create_row();

        schema.columns()[1]
            .set(&mut row, ColumnValue::String("Object".into()))
            .unwrap();
        assert_eq!(row.type_name, "Object");

        let err = schema.columns()[1].set(&mut row, ColumnValue::Null).unwrap_err();
        assert!(matches!(err, ColumnError::NullNotAllowed { .. }));

        schema.columns()[0].set(&mut row, ColumnValue::Null).unwrap();
        assert_eq!(row.resolution_scope, None);
    }

    #[test]
    fn ordering_comparer() {
        let schema = NestedClassRow::schema().unwrap();
        assert!(schema.is_ordered());

        let first = NestedClassRow {
            nested_class: TableIndex::new(TableId::TypeDef, 1),
            enclosing_class: TableIndex::new(TableId::TypeDef, 0),
        };
        let second = NestedClassRow {
            nested_class: TableIndex::new(TableId::TypeDef, 2),
            enclosing_class: TableIndex::new(TableId::TypeDef, 0),
        };
        assert_eq!(schema.compare(&first, &second), Some(Ordering::Less));
        assert!(schema.rows_equal(&first, &first.clone()));
    }

    #[test]
    fn provider_rejects_duplicates() {
        let mut provider = SchemaProvider::new();
        provider.register(ModuleRefRow::schema().unwrap()).unwrap();
        let duplicate = provider.register(ModuleRefRow::schema().unwrap());
        assert!(matches!(duplicate, Err(Error::Schema(_))));
    }

    #[test]
    fn provider_rejects_foreign_kind() {
        let mut provider = SchemaProvider::new();
        let schema = TableSchema::<ModuleRefRow>::builder(TableId::File)
            .row_factory(ModuleRefRow::default)
            .equality(|a: &ModuleRefRow, b: &ModuleRefRow| a == b)
            .column(ColumnSchema::new::<String>(
                "name",
                |row: &ModuleRefRow| row.name.to_value(),
                |row: &mut ModuleRefRow, value| {
                    row.name = String::from_value(value)?;
                    Ok(())
                },
            ))
            .build()
            .unwrap();
        assert!(matches!(provider.register(schema), Err(Error::Schema(_))));
    }

    #[test]
    fn standard_provider_is_complete() {
        use strum::IntoEnumIterator;

        let provider = SchemaProvider::standard().unwrap();
        for id in TableId::iter() {
            assert_eq!(provider.get(id).unwrap().id(), id);
        }
        assert!(provider.schema::<TypeRefRow>().is_some());
        assert_eq!(
            provider.get(TableId::CustomAttribute).unwrap().resolvers().len(),
            1
        );
        assert_eq!(
            provider.get(TableId::DeclSecurity).unwrap().resolvers().len(),
            1
        );
    }
}
