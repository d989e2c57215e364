//! Low-level byte order and safe reading/writing utilities.
//!
//! This module provides endian-aware, bounds-checked primitives for reading and writing
//! integers from and to byte buffers. They are the foundation for every binary format the
//! crate touches: key-container blobs, attribute and permission-set blobs, signatures and
//! CIL instruction streams.
//!
//! # Key Components
//!
//! - [`CilIO`] - Trait defining endian-aware conversion for primitive types
//! - [`read_le`] / [`read_le_at`] - Little-endian reads (with offset tracking)
//! - [`read_be_at`] - Big-endian reads with offset tracking
//! - [`write_le_at`] / [`write_le_into`] - Little-endian writes into fixed or growable buffers
//!
//! # Usage Examples
//!
//! ```rust,ignore
//! use cilweave::file::io::read_le_at;
//!
//! let data = [0x01, 0x00, 0x02, 0x00, 0x03, 0x00, 0x00, 0x00];
//! let mut offset = 0;
//!
//! let first: u16 = read_le_at(&data, &mut offset)?;  // offset: 0 -> 2
//! let second: u16 = read_le_at(&data, &mut offset)?; // offset: 2 -> 4
//! let third: u32 = read_le_at(&data, &mut offset)?;  // offset: 4 -> 8
//!
//! assert_eq!((first, second, third), (1, 2, 3));
//! # Ok::<(), cilweave::Error>(())
//! ```
//!
//! # Error Handling
//!
//! All reading and writing functions return [`crate::Result`] and report
//! [`crate::Error::OutOfBounds`] if there are insufficient bytes in the buffer to complete the
//! operation. Nothing is read or written partially.

use crate::{Error::OutOfBounds, Result};

/// Trait for endian-aware conversion of primitive values from and to raw bytes.
pub trait CilIO: Sized {
    /// Fixed-size byte array type for this primitive
    type Bytes: Sized + AsRef<[u8]> + for<'a> TryFrom<&'a [u8]>;

    /// Decode a value from little-endian bytes
    fn from_le_bytes(bytes: Self::Bytes) -> Self;
    /// Decode a value from big-endian bytes
    fn from_be_bytes(bytes: Self::Bytes) -> Self;

    /// Encode a value as little-endian bytes
    fn to_le_bytes(self) -> Self::Bytes;
    /// Encode a value as big-endian bytes
    fn to_be_bytes(self) -> Self::Bytes;
}

macro_rules! impl_cil_io {
    ($($ty:ty => $len:literal),+ $(,)?) => {
        $(
            impl CilIO for $ty {
                type Bytes = [u8; $len];

                fn from_le_bytes(bytes: Self::Bytes) -> Self {
                    <$ty>::from_le_bytes(bytes)
                }

                fn from_be_bytes(bytes: Self::Bytes) -> Self {
                    <$ty>::from_be_bytes(bytes)
                }

                fn to_le_bytes(self) -> Self::Bytes {
                    <$ty>::to_le_bytes(self)
                }

                fn to_be_bytes(self) -> Self::Bytes {
                    <$ty>::to_be_bytes(self)
                }
            }
        )+
    };
}

impl_cil_io!(
    u64 => 8,
    i64 => 8,
    u32 => 4,
    i32 => 4,
    u16 => 2,
    i16 => 2,
    u8 => 1,
    i8 => 1,
    f32 => 4,
    f64 => 8,
);

/// Read a value of type `T` from the start of `data` in little-endian order.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if `data` is shorter than `T`.
pub fn read_le<T: CilIO>(data: &[u8]) -> Result<T> {
    let mut offset = 0_usize;
    read_le_at(data, &mut offset)
}

/// Read a value of type `T` at `offset` in little-endian order and advance the offset.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if fewer than `size_of::<T>()` bytes remain.
pub fn read_le_at<T: CilIO>(data: &[u8], offset: &mut usize) -> Result<T> {
    let type_len = std::mem::size_of::<T>();
    let Some(end) = offset.checked_add(type_len) else {
        return Err(OutOfBounds);
    };
    if end > data.len() {
        return Err(OutOfBounds);
    }

    let Ok(read) = data[*offset..end].try_into() else {
        return Err(OutOfBounds);
    };

    *offset = end;

    Ok(T::from_le_bytes(read))
}

/// Read a value of type `T` at `offset` in big-endian order and advance the offset.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if fewer than `size_of::<T>()` bytes remain.
pub fn read_be_at<T: CilIO>(data: &[u8], offset: &mut usize) -> Result<T> {
    let type_len = std::mem::size_of::<T>();
    let Some(end) = offset.checked_add(type_len) else {
        return Err(OutOfBounds);
    };
    if end > data.len() {
        return Err(OutOfBounds);
    }

    let Ok(read) = data[*offset..end].try_into() else {
        return Err(OutOfBounds);
    };

    *offset = end;

    Ok(T::from_be_bytes(read))
}

/// Write `value` at `offset` in little-endian order and advance the offset.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if the value does not fit into `data`.
pub fn write_le_at<T: CilIO>(data: &mut [u8], offset: &mut usize, value: T) -> Result<()> {
    let type_len = std::mem::size_of::<T>();
    let Some(end) = offset.checked_add(type_len) else {
        return Err(OutOfBounds);
    };
    if end > data.len() {
        return Err(OutOfBounds);
    }

    data[*offset..end].copy_from_slice(value.to_le_bytes().as_ref());
    *offset = end;

    Ok(())
}

/// Append `value` to a growable buffer in little-endian order.
pub fn write_le_into<T: CilIO>(data: &mut Vec<u8>, value: T) {
    data.extend_from_slice(value.to_le_bytes().as_ref());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    const TEST_BUFFER: [u8; 8] = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];

    #[test]
    fn read_le_u32() {
        let result = read_le::<u32>(&TEST_BUFFER).unwrap();
        assert_eq!(result, 0x0403_0201);
    }

    #[test]
    fn read_le_at_advances() {
        let mut offset = 0;
        assert_eq!(read_le_at::<u16>(&TEST_BUFFER, &mut offset).unwrap(), 0x0201);
        assert_eq!(read_le_at::<u16>(&TEST_BUFFER, &mut offset).unwrap(), 0x0403);
        assert_eq!(offset, 4);
    }

    #[test]
    fn read_be_at_advances() {
        let mut offset = 0;
        assert_eq!(read_be_at::<u32>(&TEST_BUFFER, &mut offset).unwrap(), 0x0102_0304);
        assert_eq!(offset, 4);
    }

    #[test]
    fn read_out_of_bounds_keeps_offset() {
        let mut offset = 6;
        let result = read_le_at::<u32>(&TEST_BUFFER, &mut offset);
        assert!(matches!(result, Err(Error::OutOfBounds)));
        assert_eq!(offset, 6);
    }

    #[test]
    fn read_offset_overflow() {
        let mut offset = usize::MAX;
        assert!(matches!(
            read_le_at::<u8>(&TEST_BUFFER, &mut offset),
            Err(Error::OutOfBounds)
        ));
    }

    #[test]
    fn write_le_at_roundtrip() {
        let mut data = [0u8; 6];
        let mut offset = 0;
        write_le_at(&mut data, &mut offset, 0x1234_u16).unwrap();
        write_le_at(&mut data, &mut offset, 0xDEAD_BEEF_u32).unwrap();
        assert_eq!(data, [0x34, 0x12, 0xEF, 0xBE, 0xAD, 0xDE]);

        assert!(write_le_at(&mut data, &mut offset, 1_u8).is_err());
    }

    #[test]
    fn write_le_into_appends() {
        let mut data = vec![0xFF];
        write_le_into(&mut data, 0x0102_u16);
        assert_eq!(data, vec![0xFF, 0x02, 0x01]);
    }
}
