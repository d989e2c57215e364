//! Concrete tables and their type-erased interface.

use std::{any::Any, fmt, sync::Arc};

use crate::{
    metadata::{
        tables::{ColumnError, ColumnValue, TableId, TableRow, TableSchema},
        token::TableIndex,
    },
    Error, Result,
};

/// Capabilities shared by every table, independent of its row type.
///
/// Merge and resolution code work on `dyn Table`; code that knows the row type downcasts once
/// through [`Table::as_any`] to the [`MetadataTable`] behind it.
pub trait Table: Send + Sync {
    /// The table kind.
    fn id(&self) -> TableId;

    /// Number of rows.
    fn row_count(&self) -> u32;

    /// Number of columns of the table's schema.
    fn column_count(&self) -> usize;

    /// Name of a column.
    fn column_name(&self, column: usize) -> Option<&'static str>;

    /// Append `row` if it is of this table's row type.
    ///
    /// Returns `false` and leaves the table untouched for a row of any other type.
    fn try_add_row(&mut self, row: Box<dyn Any + Send + Sync>) -> bool;

    /// Type-erased read access to one row.
    fn row_at(&self, row: u32) -> Option<&dyn Any>;

    /// Read one cell.
    fn cell(&self, row: u32, column: usize) -> Option<ColumnValue>;

    /// Write one cell.
    ///
    /// # Errors
    /// Returns [`crate::Error::Column`] for an unknown row or column, or a value the column does
    /// not accept.
    fn set_cell(&mut self, row: u32, column: usize, value: ColumnValue) -> Result<()>;

    /// Build a row from one value per column and append it.
    ///
    /// Nothing is appended if any value is rejected.
    ///
    /// # Errors
    /// Returns [`crate::Error::Column`] if the number of values does not match the schema or a
    /// value is rejected by its column.
    fn try_add_values(&mut self, values: Vec<ColumnValue>) -> Result<TableIndex>;

    /// Returns `true` if the table is unsorted by definition or its rows follow the schema's
    /// ordering comparer.
    fn is_sorted(&self) -> bool;

    /// Upcast for downcasting to the typed table.
    fn as_any(&self) -> &dyn Any;

    /// Mutable upcast for downcasting to the typed table.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl fmt::Debug for dyn Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table")
            .field("id", &self.id())
            .field("rows", &self.row_count())
            .finish()
    }
}

/// An ordered list of rows of type `R`.
///
/// Rows are only ever appended. The position of a row is its address, so the table never
/// reorders or compacts; sorted tables merely report whether their rows are in order.
pub struct MetadataTable<R> {
    schema: Arc<TableSchema<R>>,
    rows: Vec<R>,
}

impl<R: TableRow> MetadataTable<R> {
    /// Create an empty table.
    #[must_use]
    pub fn new(schema: Arc<TableSchema<R>>) -> Self {
        Self::with_capacity(schema, 0)
    }

    /// Create an empty table with room for `capacity` rows.
    #[must_use]
    pub fn with_capacity(schema: Arc<TableSchema<R>>, capacity: usize) -> Self {
        MetadataTable {
            schema,
            rows: Vec::with_capacity(capacity),
        }
    }

    /// The schema shared by all tables of this kind.
    #[must_use]
    pub fn schema(&self) -> &Arc<TableSchema<R>> {
        &self.schema
    }

    /// Create an empty row through the schema's row factory.
    #[must_use]
    pub fn create_row(&self) -> R {
        self.schema.create_row()
    }

    /// Append `row` and return its address.
    pub fn add_row(&mut self, row: R) -> TableIndex {
        let index = TableIndex::new(R::TABLE, self.rows.len() as u32);
        self.rows.push(row);
        index
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` if the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// All rows in insertion order.
    #[must_use]
    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    /// One row.
    #[must_use]
    pub fn get(&self, row: u32) -> Option<&R> {
        self.rows.get(row as usize)
    }

    /// One row, mutably.
    pub fn get_mut(&mut self, row: u32) -> Option<&mut R> {
        self.rows.get_mut(row as usize)
    }

    /// Iterate rows together with their addresses.
    pub fn iter(&self) -> impl Iterator<Item = (TableIndex, &R)> + '_ {
        self.rows
            .iter()
            .enumerate()
            .map(|(row, value)| (TableIndex::new(R::TABLE, row as u32), value))
    }

    /// Address of the first row equal to `row` under the schema's equality comparer.
    pub fn position_of(&self, row: &R) -> Option<TableIndex> {
        self.rows
            .iter()
            .position(|candidate| self.schema.rows_equal(candidate, row))
            .map(|position| TableIndex::new(R::TABLE, position as u32))
    }

    /// Rows that sort before their predecessor under the schema's ordering comparer.
    ///
    /// Always empty for unsorted tables.
    #[must_use]
    pub fn unsorted_rows(&self) -> Vec<u32> {
        if !self.schema.is_ordered() {
            return Vec::new();
        }

        self.rows
            .windows(2)
            .enumerate()
            .filter(|(_, pair)| {
                self.schema.compare(&pair[0], &pair[1]) == Some(std::cmp::Ordering::Greater)
            })
            .map(|(position, _)| position as u32 + 1)
            .collect()
    }
}

impl<R: TableRow> Table for MetadataTable<R> {
    fn id(&self) -> TableId {
        R::TABLE
    }

    fn row_count(&self) -> u32 {
        self.rows.len() as u32
    }

    fn column_count(&self) -> usize {
        self.schema.columns().len()
    }

    fn column_name(&self, column: usize) -> Option<&'static str> {
        self.schema.column(column).map(|column| column.name())
    }

    fn try_add_row(&mut self, row: Box<dyn Any + Send + Sync>) -> bool {
        match row.downcast::<R>() {
            Ok(row) => {
                self.add_row(*row);
                true
            }
            Err(_) => false,
        }
    }

    fn row_at(&self, row: u32) -> Option<&dyn Any> {
        self.get(row).map(|row| row as &dyn Any)
    }

    fn cell(&self, row: u32, column: usize) -> Option<ColumnValue> {
        let column = self.schema.column(column)?;
        self.get(row).map(|row| column.get(row))
    }

    fn set_cell(&mut self, row: u32, column: usize, value: ColumnValue) -> Result<()> {
        let table = R::TABLE;
        let Some(column_schema) = self.schema.column(column) else {
            return Err(Error::Column(ColumnError::NoSuchColumn { table, column }));
        };
        let Some(target) = self.rows.get_mut(row as usize) else {
            return Err(Error::Column(ColumnError::NoSuchRow { table, row }));
        };

        column_schema.set(target, value).map_err(Error::Column)
    }

    fn try_add_values(&mut self, values: Vec<ColumnValue>) -> Result<TableIndex> {
        let columns = self.schema.columns();
        if values.len() != columns.len() {
            return Err(Error::Column(ColumnError::ArityMismatch {
                table: R::TABLE,
                expected: columns.len(),
                found: values.len(),
            }));
        }

        let mut row = self.schema.create_row();
        for (column, value) in columns.iter().zip(values) {
            column.set(&mut row, value)?;
        }

        Ok(self.add_row(row))
    }

    fn is_sorted(&self) -> bool {
        self.unsorted_rows().is_empty()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl<R: TableRow> fmt::Debug for MetadataTable<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetadataTable")
            .field("id", &R::TABLE)
            .field("rows", &self.rows)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::tables::{ColumnKind, FieldRow, ModuleRefRow, NestedClassRow};

    fn module_refs() -> MetadataTable<ModuleRefRow> {
        MetadataTable::new(Arc::new(ModuleRefRow::schema().unwrap()))
    }

    #[test]
    fn add_row_returns_address() {
        let mut table = module_refs();
        let first = table.add_row(ModuleRefRow {
            name: "kernel32.dll".into(),
        });
        let second = table.add_row(ModuleRefRow {
            name: "user32.dll".into(),
        });

        assert_eq!(first, TableIndex::new(TableId::ModuleRef, 0));
        assert_eq!(second, TableIndex::new(TableId::ModuleRef, 1));
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.get(1).unwrap().name, "user32.dll");
    }

    #[test]
    fn iter_pairs_rows_with_addresses() {
        let mut table = module_refs();
        table.add_row(ModuleRefRow {
            name: "kernel32.dll".into(),
        });
        table.add_row(ModuleRefRow {
            name: "user32.dll".into(),
        });

        let names: Vec<(TableIndex, &str)> = table
            .iter()
            .map(|(index, row)| (index, row.name.as_str()))
            .collect();
        assert_eq!(
            names,
            vec![
                (TableIndex::new(TableId::ModuleRef, 0), "kernel32.dll"),
                (TableIndex::new(TableId::ModuleRef, 1), "user32.dll"),
            ]
        );
        assert_eq!(table.rows().len(), 2);
    }

    #[test]
    fn try_add_row_checks_type() {
        let mut table = module_refs();
        assert!(table.try_add_row(Box::new(ModuleRefRow {
            name: "a".into()
        })));
        assert!(!table.try_add_row(Box::new(FieldRow::default())));
        assert!(!table.try_add_row(Box::new(42_u32)));
        assert_eq!(table.row_count(), 1);

        let erased = table.row_at(0).unwrap();
        assert_eq!(erased.downcast_ref::<ModuleRefRow>().unwrap().name, "a");
        assert!(table.row_at(1).is_none());
    }

    #[test]
    fn cells_round_trip_through_values() {
        let mut table: Box<dyn Table> = Box::new(module_refs());
        let index = table
            .try_add_values(vec![ColumnValue::String("ole32.dll".into())])
            .unwrap();
        assert_eq!(index.row, 0);
        assert_eq!(
            table.cell(0, 0),
            Some(ColumnValue::String("ole32.dll".into()))
        );

        table
            .set_cell(0, 0, ColumnValue::String("oleaut32.dll".into()))
            .unwrap();
        assert_eq!(table.column_name(0), Some("name"));
        assert_eq!(
            table.cell(0, 0),
            Some(ColumnValue::String("oleaut32.dll".into()))
        );
    }

    #[test]
    fn rejected_values_leave_table_untouched() {
        let mut table = module_refs();
        let wrong_kind = table.try_add_values(vec![ColumnValue::U32(1)]);
        assert!(matches!(
            wrong_kind,
            Err(Error::Column(ColumnError::TypeMismatch {
                expected: ColumnKind::String,
                found: ColumnKind::U32
            }))
        ));

        let wrong_arity = table.try_add_values(vec![]);
        assert!(matches!(
            wrong_arity,
            Err(Error::Column(ColumnError::ArityMismatch { .. }))
        ));
        assert!(table.is_empty());

        assert!(matches!(
            table.set_cell(0, 0, ColumnValue::String("x".into())),
            Err(Error::Column(ColumnError::NoSuchRow { .. }))
        ));
    }

    #[test]
    fn sorted_tables_report_order_without_reordering() {
        let mut table = MetadataTable::new(Arc::new(NestedClassRow::schema().unwrap()));
        for nested in [3, 1, 2] {
            table.add_row(NestedClassRow {
                nested_class: TableIndex::new(TableId::TypeDef, nested),
                enclosing_class: TableIndex::new(TableId::TypeDef, 0),
            });
        }

        assert!(!table.is_sorted());
        assert_eq!(table.unsorted_rows(), vec![1]);
        assert_eq!(table.rows()[0].nested_class.row, 3);
        assert_eq!(
            table.position_of(&table.rows()[2].clone()),
            Some(TableIndex::new(TableId::NestedClass, 2))
        );
    }
}
