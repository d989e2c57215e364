use thiserror::Error;

use crate::metadata::tables::{ColumnError, TableId};

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

macro_rules! schema_error {
    ($fmt:expr $(, $arg:expr)* $(,)?) => {
        crate::Error::Schema(format!($fmt $(, $arg)*))
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// Errors fall into the categories the engine distinguishes between:
///
/// - **Schema errors** ([`Error::Schema`]) are raised while building table schemas or a
///   [`crate::metadata::tables::SchemaProvider`]. They indicate a programming mistake and are
///   never swallowed.
/// - **Binary-format errors** ([`Error::Malformed`], [`Error::OutOfBounds`]) are raised for
///   malformed key blobs, token bit patterns, signatures, attribute blobs and instruction
///   streams. They always carry a human readable reason and never a partial result.
/// - **Column errors** ([`Error::Column`], [`Error::TableMismatch`]) are raised by type-erased
///   row manipulation when a value does not fit the targeted column or table.
///
/// Resolution failures are deliberately *not* represented here: a cell that cannot be
/// resolved is reported as "nothing changed" so bulk operations can continue.
///
/// # Examples
///
/// ```rust
/// use cilweave::{Error, metadata::identity::KeyBlob};
///
/// match KeyBlob::try_parse(&[0x06, 0x02], 0) {
///     Ok(parsed) => println!("{} bit key", parsed.params.bit_length()),
///     Err(Error::Malformed { message, .. }) => eprintln!("bad key blob: {message}"),
///     Err(Error::OutOfBounds) => eprintln!("key blob truncated"),
///     Err(e) => eprintln!("other error: {e}"),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// The input is damaged and could not be parsed.
    ///
    /// The error includes the source location where the malformation was detected for
    /// debugging purposes.
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// An out of bound access was attempted while parsing.
    #[error("Out of Bound read would have occurred!")]
    OutOfBounds,

    /// A table schema or schema provider was misconfigured.
    ///
    /// Raised for schemas without columns, schemas without a row factory, duplicate table
    /// kinds within one provider and rows whose declared table does not match their schema.
    #[error("Invalid table schema - {0}")]
    Schema(String),

    /// A column value did not fit the column it was assigned to.
    #[error("{0}")]
    Column(#[from] ColumnError),

    /// A row or value was handed to a table of a different kind.
    #[error("Row for table {found:?} cannot be stored in table {expected:?}")]
    TableMismatch {
        /// The table that was targeted
        expected: TableId,
        /// The table the row belongs to
        found: TableId,
    },

    /// Every configured signature backend failed to produce a signature.
    #[error("Signing failed - {0}")]
    Signing(String),

    /// File I/O error.
    #[error("{0}")]
    FileError(#[from] std::io::Error),

    /// Generic error for miscellaneous failures.
    #[error("{0}")]
    Error(String),
}
