//! The shared cell value representation.
//!
//! Every column of every table reads and writes through [`ColumnValue`], which lets merge and
//! resolution code move cells between rows without knowing the concrete row type. The mapping
//! between a Rust field type and its `ColumnValue` variant is fixed by [`ColumnType`]; a field of
//! type `Option<T>` produces a nullable column.

use std::fmt;

use thiserror::Error;
use uguid::Guid;

use crate::metadata::{
    customattributes::AttributeBlob, method::MethodBody, security::SecurityBlob,
    tables::TableId, token::TableIndex,
};

/// The kind of data a column holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    /// 8-bit unsigned integer
    U8,
    /// 16-bit unsigned integer
    U16,
    /// 32-bit unsigned integer
    U32,
    /// String heap value
    String,
    /// Blob heap value
    Blob,
    /// GUID heap value
    Guid,
    /// Reference to a row
    Index,
    /// Custom attribute value, raw or resolved
    Attribute,
    /// Permission set, raw or resolved
    Security,
    /// Method body
    Body,
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// One cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValue {
    /// The absent value of a nullable column
    Null,
    /// 8-bit unsigned integer
    U8(u8),
    /// 16-bit unsigned integer
    U16(u16),
    /// 32-bit unsigned integer
    U32(u32),
    /// String
    String(String),
    /// Blob
    Blob(Vec<u8>),
    /// GUID
    Guid(Guid),
    /// Row reference
    Index(TableIndex),
    /// Custom attribute value
    Attribute(AttributeBlob),
    /// Permission set
    Security(SecurityBlob),
    /// Method body
    Body(MethodBody),
}

impl ColumnValue {
    /// The kind of the value, `None` for [`ColumnValue::Null`].
    #[must_use]
    pub fn kind(&self) -> Option<ColumnKind> {
        match self {
            ColumnValue::Null => None,
            ColumnValue::U8(_) => Some(ColumnKind::U8),
            ColumnValue::U16(_) => Some(ColumnKind::U16),
            ColumnValue::U32(_) => Some(ColumnKind::U32),
            ColumnValue::String(_) => Some(ColumnKind::String),
            ColumnValue::Blob(_) => Some(ColumnKind::Blob),
            ColumnValue::Guid(_) => Some(ColumnKind::Guid),
            ColumnValue::Index(_) => Some(ColumnKind::Index),
            ColumnValue::Attribute(_) => Some(ColumnKind::Attribute),
            ColumnValue::Security(_) => Some(ColumnKind::Security),
            ColumnValue::Body(_) => Some(ColumnKind::Body),
        }
    }

    /// Returns `true` for [`ColumnValue::Null`].
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, ColumnValue::Null)
    }

    /// The referenced row, if this is a non-null reference.
    #[must_use]
    pub fn as_index(&self) -> Option<TableIndex> {
        match self {
            ColumnValue::Index(index) => Some(*index),
            _ => None,
        }
    }
}

/// Failure of a type-erased cell access.
///
/// Nullable columns distinguish "null where a value is required" from "value of the wrong
/// kind", so callers can tell a missing value from a programming mistake.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ColumnError {
    /// `Null` was assigned to a column that requires a value.
    #[error("Column of kind {expected} does not accept null")]
    NullNotAllowed {
        /// Kind of the column
        expected: ColumnKind,
    },

    /// A value of the wrong kind was assigned.
    #[error("Column of kind {expected} cannot hold a value of kind {found}")]
    TypeMismatch {
        /// Kind of the column
        expected: ColumnKind,
        /// Kind of the offered value
        found: ColumnKind,
    },

    /// The column index is outside the table's schema.
    #[error("Table {table:?} has no column {column}")]
    NoSuchColumn {
        /// Table that was accessed
        table: TableId,
        /// Requested column
        column: usize,
    },

    /// The row index is outside the table.
    #[error("Table {table:?} has no row {row}")]
    NoSuchRow {
        /// Table that was accessed
        table: TableId,
        /// Requested row
        row: u32,
    },

    /// The number of values does not match the number of columns.
    #[error("Table {table:?} expects {expected} values, got {found}")]
    ArityMismatch {
        /// Table that was accessed
        table: TableId,
        /// Number of columns
        expected: usize,
        /// Number of values supplied
        found: usize,
    },
}

/// Mapping between a Rust field type and its [`ColumnValue`] representation.
pub trait ColumnType: Sized {
    /// Kind of the column produced by this type.
    const KIND: ColumnKind;

    /// Whether the column accepts [`ColumnValue::Null`].
    const NULLABLE: bool = false;

    /// Convert a field value into its cell representation.
    fn to_value(&self) -> ColumnValue;

    /// Convert a cell value back into the field type.
    ///
    /// # Errors
    /// [`ColumnError::NullNotAllowed`] for `Null` on a required column,
    /// [`ColumnError::TypeMismatch`] for a value of a different kind.
    fn from_value(value: ColumnValue) -> Result<Self, ColumnError>;
}

fn reject(expected: ColumnKind, value: &ColumnValue) -> ColumnError {
    match value.kind() {
        None => ColumnError::NullNotAllowed { expected },
        Some(found) => ColumnError::TypeMismatch { expected, found },
    }
}

macro_rules! impl_column_type {
    ($($ty:ty => $variant:ident, $to:expr);+ $(;)?) => {
        $(
            impl ColumnType for $ty {
                const KIND: ColumnKind = ColumnKind::$variant;

                fn to_value(&self) -> ColumnValue {
                    let to: fn(&$ty) -> ColumnValue = $to;
                    to(self)
                }

                fn from_value(value: ColumnValue) -> Result<Self, ColumnError> {
                    match value {
                        ColumnValue::$variant(inner) => Ok(inner),
                        other => Err(reject(ColumnKind::$variant, &other)),
                    }
                }
            }
        )+
    };
}

impl_column_type!(
    u8 => U8, |v| ColumnValue::U8(*v);
    u16 => U16, |v| ColumnValue::U16(*v);
    u32 => U32, |v| ColumnValue::U32(*v);
    String => String, |v| ColumnValue::String(v.clone());
    Vec<u8> => Blob, |v| ColumnValue::Blob(v.clone());
    Guid => Guid, |v| ColumnValue::Guid(*v);
    TableIndex => Index, |v| ColumnValue::Index(*v);
    AttributeBlob => Attribute, |v| ColumnValue::Attribute(v.clone());
    SecurityBlob => Security, |v| ColumnValue::Security(v.clone());
    MethodBody => Body, |v| ColumnValue::Body(v.clone());
);

impl<T: ColumnType> ColumnType for Option<T> {
    const KIND: ColumnKind = T::KIND;
    const NULLABLE: bool = true;

    fn to_value(&self) -> ColumnValue {
        match self {
            Some(inner) => inner.to_value(),
            None => ColumnValue::Null,
        }
    }

    fn from_value(value: ColumnValue) -> Result<Self, ColumnError> {
        match value {
            ColumnValue::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_column_contract() {
        assert_eq!(u16::from_value(ColumnValue::U16(7)), Ok(7));
        assert_eq!(
            u16::from_value(ColumnValue::Null),
            Err(ColumnError::NullNotAllowed {
                expected: ColumnKind::U16
            })
        );
        assert_eq!(
            u16::from_value(ColumnValue::U32(7)),
            Err(ColumnError::TypeMismatch {
                expected: ColumnKind::U16,
                found: ColumnKind::U32
            })
        );
    }

    #[test]
    fn nullable_column_contract() {
        assert!(<Option<TableIndex> as ColumnType>::NULLABLE);
        assert!(!<TableIndex as ColumnType>::NULLABLE);

        let index = TableIndex::new(TableId::TypeRef, 3);
        assert_eq!(
            Option::<TableIndex>::from_value(ColumnValue::Index(index)),
            Ok(Some(index))
        );
        assert_eq!(Option::<TableIndex>::from_value(ColumnValue::Null), Ok(None));
        assert_eq!(
            Option::<TableIndex>::from_value(ColumnValue::String("x".into())),
            Err(ColumnError::TypeMismatch {
                expected: ColumnKind::Index,
                found: ColumnKind::String
            })
        );
        assert_eq!(None::<TableIndex>.to_value(), ColumnValue::Null);
    }

    #[test]
    fn values_report_kind() {
        assert_eq!(ColumnValue::Blob(vec![1]).kind(), Some(ColumnKind::Blob));
        assert_eq!(ColumnValue::Null.kind(), None);
        assert!(ColumnValue::Null.is_null());
        assert_eq!(
            ColumnValue::Index(TableIndex::new(TableId::Field, 1)).as_index(),
            Some(TableIndex::new(TableId::Field, 1))
        );
    }
}
