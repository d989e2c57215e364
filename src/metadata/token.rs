//! Metadata tokens and row addresses.
//!
//! A row of a metadata table is addressed by a [`TableIndex`]: the table kind plus a
//! **zero-based** row index. On the wire and inside instruction streams the same address is
//! packed into a single 32-bit [`Token`]: the table kind occupies the high byte and the row
//! occupies the low [`INDEX_BITS`] bits. Tokens come in two flavours:
//!
//! - *zero-based* tokens carry the row index as-is
//! - *one-based* tokens carry `row + 1`, which frees the value `0` to mean "no row"
//!
//! The binary format uses one-based tokens; an absent optional reference is the token `0`.
//!
//! # Examples
//!
//! ```rust
//! use cilweave::metadata::{tables::TableId, token::{self, TableIndex}};
//!
//! let index = TableIndex::new(TableId::MethodDef, 4);
//! let encoded = token::encode_one_based(index.table, index.row)?;
//! assert_eq!(encoded.value(), 0x0600_0005);
//!
//! assert_eq!(token::decode_one_based(encoded)?, Some(index));
//! assert_eq!(token::one_based_or_null(None)?.value(), 0);
//! # Ok::<(), cilweave::Error>(())
//! ```

use std::fmt;

use crate::{metadata::tables::TableId, Result};

/// Width in bits of the row field inside a token.
pub const INDEX_BITS: u32 = 24;

/// Mask selecting the row field of a token.
pub const INDEX_MASK: u32 = (1 << INDEX_BITS) - 1;

/// A metadata token representing a reference to a metadata table entry.
///
/// Tokens consist of a 32-bit value where:
/// - The high byte (bits 24-31) indicates the table type
/// - The low 24 bits (bits 0-23) indicate the row index within that table
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Token(pub u32);

impl Token {
    /// Creates a new token from a raw 32-bit value
    #[must_use]
    pub fn new(value: u32) -> Self {
        Token(value)
    }

    /// Returns the raw token value
    #[must_use]
    pub fn value(&self) -> u32 {
        self.0
    }

    /// Extracts the table type from the token (high byte)
    #[must_use]
    pub fn table(&self) -> u8 {
        (self.0 >> INDEX_BITS) as u8
    }

    /// Extracts the row field from the token (low 24 bits)
    #[must_use]
    pub fn row(&self) -> u32 {
        self.0 & INDEX_MASK
    }

    /// Returns true if this is a null token (value 0)
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.0 == 0
    }

    /// The table kind named by the high byte.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the high byte is not a known table kind.
    pub fn table_id(&self) -> Result<TableId> {
        TableId::from_u8(self.table())
            .ok_or_else(|| malformed_error!("Token {} names unknown table 0x{:02x}", self, self.table()))
    }
}

impl From<u32> for Token {
    fn from(value: u32) -> Self {
        Token(value)
    }
}

impl From<Token> for u32 {
    fn from(token: Token) -> Self {
        token.0
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Token(0x{:08x}, table: 0x{:02x}, row: {})",
            self.0,
            self.table(),
            self.row()
        )
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}

/// The address of one row: table kind plus zero-based row index.
///
/// A `TableIndex` may point past the end of its table; rows are allowed to refer forward to
/// rows that have not been added yet.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TableIndex {
    /// The table holding the row
    pub table: TableId,
    /// Zero-based row index
    pub row: u32,
}

impl TableIndex {
    /// Create a new row address.
    #[must_use]
    pub const fn new(table: TableId, row: u32) -> Self {
        TableIndex { table, row }
    }

    /// Encode as a one-based token.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the row does not fit the token's index field.
    pub fn to_token(&self) -> Result<Token> {
        encode_one_based(self.table, self.row)
    }
}

impl Default for TableIndex {
    /// Row `0` of the `Module` table. Rows use this as a placeholder until a setter assigns
    /// the real reference.
    fn default() -> Self {
        TableIndex::new(TableId::Module, 0)
    }
}

impl fmt::Debug for TableIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}[{}]", self.table, self.row)
    }
}

impl fmt::Display for TableIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}[{}]", self.table, self.row)
    }
}

fn pack(table: TableId, field: u32) -> Result<Token> {
    if field > INDEX_MASK {
        return Err(malformed_error!(
            "Row field {:#x} of table {:?} exceeds the {}-bit token index",
            field,
            table,
            INDEX_BITS
        ));
    }

    Ok(Token((u32::from(table as u8) << INDEX_BITS) | field))
}

/// Encode a zero-based row index into a token.
///
/// # Errors
/// Returns [`crate::Error::Malformed`] if `index` does not fit into [`INDEX_BITS`] bits.
pub fn encode_zero_based(table: TableId, index: u32) -> Result<Token> {
    pack(table, index)
}

/// Encode a zero-based row index into a one-based token.
///
/// # Errors
/// Returns [`crate::Error::Malformed`] if `index + 1` does not fit into [`INDEX_BITS`] bits.
pub fn encode_one_based(table: TableId, index: u32) -> Result<Token> {
    let Some(field) = index.checked_add(1) else {
        return Err(malformed_error!("Row index {:#x} cannot be made one-based", index));
    };
    pack(table, field)
}

/// Decode a zero-based token.
///
/// # Errors
/// Returns [`crate::Error::Malformed`] if the token names an unknown table.
pub fn decode_zero_based(token: Token) -> Result<TableIndex> {
    Ok(TableIndex::new(token.table_id()?, token.row()))
}

/// Decode a one-based token. A zero row field is the null reference and yields `None`.
///
/// # Errors
/// Returns [`crate::Error::Malformed`] if the token names an unknown table.
pub fn decode_one_based(token: Token) -> Result<Option<TableIndex>> {
    if token.row() == 0 {
        return Ok(None);
    }

    Ok(Some(TableIndex::new(token.table_id()?, token.row() - 1)))
}

/// One-based token of an optional reference; `None` encodes as the token `0`.
///
/// # Errors
/// Returns [`crate::Error::Malformed`] if the row does not fit the token's index field.
pub fn one_based_or_null(index: Option<TableIndex>) -> Result<Token> {
    match index {
        Some(index) => encode_one_based(index.table, index.row),
        None => Ok(Token(0)),
    }
}
