//! Endian-aware primitive reads and writes plus the ECMA-335 compressed integer encoders.
//!
//! Everything here is bounds checked and reports [`crate::Error::OutOfBounds`] instead of
//! panicking. The [`crate::file::io::CilIO`] trait ties each primitive type to its byte array
//! representation so that [`crate::file::io::read_le_at`] and [`crate::file::io::write_le_at`]
//! can be written once.
//!
//! The compressed writers ([`crate::file::io::write_compressed_uint`] and
//! [`crate::file::io::write_compressed_int`]) always pick the smallest of the 1, 2 and 4 byte
//! forms, which is what the signature encoder relies on.
//!
//! # Examples
//!
//! ```rust
//! use dotsig::file::io::{read_le_at, write_compressed_uint};
//!
//! let data = [0x01, 0x00, 0x02, 0x00];
//! let mut offset = 0;
//! let first: u16 = read_le_at(&data, &mut offset)?;
//! let second: u16 = read_le_at(&data, &mut offset)?;
//! assert_eq!((first, second, offset), (1, 2, 4));
//!
//! let mut buffer = Vec::new();
//! write_compressed_uint(0x80, &mut buffer)?;
//! assert_eq!(buffer, [0x80, 0x80]);
//! # Ok::<(), dotsig::Error>(())
//! ```

use crate::{Error, Result};

/// Largest value representable by a compressed unsigned integer.
pub const COMPRESSED_UINT_MAX: u32 = 0x1FFF_FFFF;

/// Smallest value representable by a compressed signed integer.
pub const COMPRESSED_INT_MIN: i32 = -0x1000_0000;

/// Largest value representable by a compressed signed integer.
pub const COMPRESSED_INT_MAX: i32 = 0x0FFF_FFFF;

/// Conversion between a primitive type and its fixed-size byte representation.
///
/// Implemented for all integer and floating point primitives used by the readers in this crate.
pub trait CilIO: Sized {
    /// The byte array type holding one encoded value, e.g. `[u8; 4]` for `u32`
    type Bytes: Sized + for<'a> TryFrom<&'a [u8]>;

    /// Decode from little-endian bytes
    fn from_le_bytes(bytes: Self::Bytes) -> Self;
    /// Decode from big-endian bytes
    fn from_be_bytes(bytes: Self::Bytes) -> Self;
    /// Encode as little-endian bytes
    fn to_le_bytes(self) -> Self::Bytes;
    /// Encode as big-endian bytes
    fn to_be_bytes(self) -> Self::Bytes;
}

macro_rules! impl_cil_io {
    ($($ty:ty),* $(,)?) => {
        $(
            impl CilIO for $ty {
                type Bytes = [u8; std::mem::size_of::<$ty>()];

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
        )*
    };
}

impl_cil_io!(u8, i8, u16, i16, u32, i32, u64, i64, f32, f64);

/// Reads a little-endian `T` from the start of `data`.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if `data` is shorter than `T`.
pub fn read_le<T: CilIO>(data: &[u8]) -> Result<T> {
    let mut offset = 0_usize;
    read_le_at(data, &mut offset)
}

/// Reads a little-endian `T` at `offset` and advances `offset` past it.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if fewer than `size_of::<T>()` bytes remain at `offset`.
pub fn read_le_at<T: CilIO>(data: &[u8], offset: &mut usize) -> Result<T> {
    let bytes = take::<T>(data, *offset)?;
    *offset += std::mem::size_of::<T>();
    Ok(T::from_le_bytes(bytes))
}

/// Reads a big-endian `T` at `offset` and advances `offset` past it.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if fewer than `size_of::<T>()` bytes remain at `offset`.
pub fn read_be_at<T: CilIO>(data: &[u8], offset: &mut usize) -> Result<T> {
    let bytes = take::<T>(data, *offset)?;
    *offset += std::mem::size_of::<T>();
    Ok(T::from_be_bytes(bytes))
}

/// Writes `value` in little-endian order at `offset` and advances `offset` past it.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if the value does not fit into `data` at `offset`.
pub fn write_le_at<T: CilIO>(data: &mut [u8], offset: &mut usize, value: T) -> Result<()>
where
    T::Bytes: AsRef<[u8]>,
{
    let type_len = std::mem::size_of::<T>();
    let end = offset.checked_add(type_len).ok_or(Error::OutOfBounds)?;
    if end > data.len() {
        return Err(Error::OutOfBounds);
    }

    data[*offset..end].copy_from_slice(value.to_le_bytes().as_ref());
    *offset = end;
    Ok(())
}

fn take<T: CilIO>(data: &[u8], offset: usize) -> Result<T::Bytes> {
    let type_len = std::mem::size_of::<T>();
    let end = offset.checked_add(type_len).ok_or(Error::OutOfBounds)?;
    if end > data.len() {
        return Err(Error::OutOfBounds);
    }

    data[offset..end].try_into().map_err(|_| Error::OutOfBounds)
}

/// Number of bytes [`write_compressed_uint`] emits for `value`.
///
/// Returns `None` if `value` exceeds [`COMPRESSED_UINT_MAX`].
#[must_use]
pub fn compressed_uint_size(value: u32) -> Option<usize> {
    match value {
        0..=0x7F => Some(1),
        0x80..=0x3FFF => Some(2),
        0x4000..=COMPRESSED_UINT_MAX => Some(4),
        _ => None,
    }
}

/// Appends `value` as an ECMA-335 compressed unsigned integer using the shortest form.
///
/// # Errors
/// Returns [`crate::Error::EncodingInvalid`] if `value` exceeds [`COMPRESSED_UINT_MAX`].
pub fn write_compressed_uint(value: u32, buffer: &mut Vec<u8>) -> Result<()> {
    match compressed_uint_size(value) {
        Some(1) => buffer.push(value as u8),
        Some(2) => {
            buffer.push(0x80 | (value >> 8) as u8);
            buffer.push(value as u8);
        }
        Some(_) => {
            buffer.push(0xC0 | (value >> 24) as u8);
            buffer.push((value >> 16) as u8);
            buffer.push((value >> 8) as u8);
            buffer.push(value as u8);
        }
        None => {
            return Err(Error::EncodingInvalid(format!(
                "Value 0x{value:X} exceeds the compressed integer range"
            )))
        }
    }

    Ok(())
}

/// Appends `value` as an ECMA-335 compressed signed integer using the shortest form.
///
/// The magnitude is rotated left by one bit within the width selected for the value, with
/// the sign in bit 0.
///
/// # Errors
/// Returns [`crate::Error::EncodingInvalid`] if `value` is outside
/// [`COMPRESSED_INT_MIN`]`..=`[`COMPRESSED_INT_MAX`].
pub fn write_compressed_int(value: i32, buffer: &mut Vec<u8>) -> Result<()> {
    #[allow(clippy::cast_sign_loss)]
    let bits = value as u32;
    let sign = u32::from(value < 0);

    let rotated = match value {
        -0x40..=0x3F => ((bits << 1) & 0x7F) | sign,
        -0x2000..=0x1FFF => ((bits << 1) & 0x3FFF) | sign,
        COMPRESSED_INT_MIN..=COMPRESSED_INT_MAX => ((bits << 1) & 0x1FFF_FFFF) | sign,
        _ => {
            return Err(Error::EncodingInvalid(format!(
                "Value {value} exceeds the compressed signed integer range"
            )))
        }
    };

    match value {
        -0x40..=0x3F => buffer.push(rotated as u8),
        -0x2000..=0x1FFF => {
            buffer.push(0x80 | (rotated >> 8) as u8);
            buffer.push(rotated as u8);
        }
        _ => {
            buffer.push(0xC0 | (rotated >> 24) as u8);
            buffer.push((rotated >> 16) as u8);
            buffer.push((rotated >> 8) as u8);
            buffer.push(rotated as u8);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_le_primitives() {
        let data = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];

        assert_eq!(read_le::<u8>(&data).unwrap(), 0x01);
        assert_eq!(read_le::<u16>(&data).unwrap(), 0x0201);
        assert_eq!(read_le::<u32>(&data).unwrap(), 0x0403_0201);
        assert_eq!(read_le::<u64>(&data).unwrap(), 0x0807_0605_0403_0201);
        assert_eq!(read_le::<i16>(&[0xFE, 0xFF]).unwrap(), -2);
    }

    #[test]
    fn read_be_at_advances() {
        let data = [0x00, 0x01, 0x00, 0x02];
        let mut offset = 0;
        assert_eq!(read_be_at::<u16>(&data, &mut offset).unwrap(), 1);
        assert_eq!(read_be_at::<u16>(&data, &mut offset).unwrap(), 2);
        assert_eq!(offset, 4);
    }

    #[test]
    fn read_out_of_bounds() {
        let data = [0x01, 0x02, 0x03];
        let mut offset = 2;
        assert!(matches!(
            read_le_at::<u16>(&data, &mut offset),
            Err(Error::OutOfBounds)
        ));
        assert_eq!(offset, 2);
        assert!(matches!(read_le::<u32>(&data), Err(Error::OutOfBounds)));

        let mut offset = usize::MAX;
        assert!(matches!(
            read_le_at::<u8>(&data, &mut offset),
            Err(Error::OutOfBounds)
        ));
    }

    #[test]
    fn write_le_at_sequence() {
        let mut data = [0u8; 6];
        let mut offset = 0;
        write_le_at(&mut data, &mut offset, 0x0201u16).unwrap();
        write_le_at(&mut data, &mut offset, 0x0605_0403u32).unwrap();
        assert_eq!(data, [1, 2, 3, 4, 5, 6]);
        assert!(matches!(
            write_le_at(&mut data, &mut offset, 0u8),
            Err(Error::OutOfBounds)
        ));
    }

    #[test]
    fn compressed_uint_widths() {
        let cases: &[(u32, &[u8])] = &[
            (0x03, &[0x03]),
            (0x7F, &[0x7F]),
            (0x80, &[0x80, 0x80]),
            (0x2E57, &[0xAE, 0x57]),
            (0x3FFF, &[0xBF, 0xFF]),
            (0x4000, &[0xC0, 0x00, 0x40, 0x00]),
            (0x1FFF_FFFF, &[0xDF, 0xFF, 0xFF, 0xFF]),
        ];

        for (value, expected) in cases {
            let mut buffer = Vec::new();
            write_compressed_uint(*value, &mut buffer).unwrap();
            assert_eq!(&buffer, expected, "value 0x{value:X}");
            assert_eq!(compressed_uint_size(*value), Some(expected.len()));
        }

        assert!(matches!(
            write_compressed_uint(0x2000_0000, &mut Vec::new()),
            Err(Error::EncodingInvalid(_))
        ));
    }

    #[test]
    fn compressed_int_widths() {
        let cases: &[(i32, &[u8])] = &[
            (3, &[0x06]),
            (-3, &[0x7B]),
            (64, &[0x80, 0x80]),
            (-64, &[0x01]),
            (8192, &[0xC0, 0x00, 0x40, 0x00]),
            (-8192, &[0x80, 0x01]),
            (268_435_455, &[0xDF, 0xFF, 0xFF, 0xFE]),
            (-268_435_456, &[0xC0, 0x00, 0x00, 0x01]),
        ];

        for (value, expected) in cases {
            let mut buffer = Vec::new();
            write_compressed_int(*value, &mut buffer).unwrap();
            assert_eq!(&buffer, expected, "value {value}");
        }

        assert!(matches!(
            write_compressed_int(0x1000_0000, &mut Vec::new()),
            Err(Error::EncodingInvalid(_))
        ));
    }
}
