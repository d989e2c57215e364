/// Declares a metadata row type together with its column schema.
///
/// Every field becomes one column, in declaration order. The field type decides the column
/// flavour through [`crate::metadata::tables::ColumnType`]: `Option<_>` fields produce
/// nullable columns, everything else a required column.
///
/// ```rust, ignore
/// metadata_row! {
///     /// The `NestedClass` table
///     pub struct NestedClassRow: NestedClass {
///         /// The nested type
///         nested_class: TableIndex,
///         /// The enclosing type
///         enclosing_class: TableIndex,
///     }
///     order = |a: &NestedClassRow, b: &NestedClassRow| a.nested_class.row.cmp(&b.nested_class.row);
/// }
/// ```
macro_rules! metadata_row {
    (
        $(#[$meta:meta])*
        pub struct $name:ident : $table:ident {
            $(
                $(#[$fmeta:meta])*
                $field:ident : $ty:ty
            ),+ $(,)?
        }
        $(order = $order:expr;)?
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq)]
        pub struct $name {
            $(
                $(#[$fmeta])*
                pub $field: $ty,
            )+
        }

        impl $crate::metadata::tables::TableRow for $name {
            const TABLE: $crate::metadata::tables::TableId =
                $crate::metadata::tables::TableId::$table;

            fn schema() -> $crate::Result<$crate::metadata::tables::TableSchema<Self>> {
                #[allow(unused_mut)]
                let mut builder = $crate::metadata::tables::TableSchema::<Self>::builder(
                    $crate::metadata::tables::TableId::$table,
                )
                .row_factory(<$name as Default>::default)
                .equality(|a: &$name, b: &$name| a == b);

                $(
                    builder = builder.ordering($order);
                )?

                $(
                    builder = builder.column(
                        $crate::metadata::tables::ColumnSchema::new::<$ty>(
                            stringify!($field),
                            |row: &$name| $crate::metadata::tables::ColumnType::to_value(&row.$field),
                            |row: &mut $name, value| {
                                row.$field = <$ty as $crate::metadata::tables::ColumnType>::from_value(value)?;
                                Ok(())
                            },
                        ),
                    );
                )+

                builder.build()
            }
        }
    };
}
