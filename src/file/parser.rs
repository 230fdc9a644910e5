//! Cursor over a byte slice used by every binary reader in this crate.
//!
//! [`crate::file::parser::Parser`] keeps a position into borrowed data and offers bounds-checked
//! reads of primitives, raw byte runs and the ECMA-335 II.23.2 compressed encodings used inside
//! signature blobs. Reads that would run past the end fail with
//! [`crate::Error::OutOfBounds`] and leave the position untouched.
//!
//! # Examples
//!
//! ```rust
//! use dotsig::Parser;
//!
//! let data = [0x81, 0x00, 0x05];
//! let mut parser = Parser::new(&data);
//!
//! assert_eq!(parser.read_compressed_uint()?, 0x100);
//! assert_eq!(parser.read_compressed_token()?.value(), 0x0100_0001);
//! assert!(!parser.has_more_data());
//! # Ok::<(), dotsig::Error>(())
//! ```

use crate::{
    file::io::{read_be_at, read_le_at, CilIO},
    metadata::token::Token,
    Error, Result,
};

/// A bounds-checked reader over a borrowed byte slice.
///
/// # Examples
///
/// ```rust
/// use dotsig::Parser;
///
/// let data = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];
/// let mut parser = Parser::new(&data);
///
/// assert_eq!(parser.read_le::<u32>()?, 0x04030201);
/// parser.seek(6)?;
/// assert_eq!(parser.read_le::<u16>()?, 0x0807);
/// # Ok::<(), dotsig::Error>(())
/// ```
pub struct Parser<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> Parser<'a> {
    /// Create a new [`Parser`] positioned at the start of `data`.
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Parser { data, position: 0 }
    }

    /// Returns the length of the underlying data buffer.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the parser has no data.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns `true` if the position is before the end of the data buffer.
    #[must_use]
    pub fn has_more_data(&self) -> bool {
        self.position < self.data.len()
    }

    /// Move the current position to `pos`.
    ///
    /// Seeking to exactly `len()` is allowed and leaves nothing to read.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if `pos` is beyond the data length.
    pub fn seek(&mut self, pos: usize) -> Result<()> {
        if pos > self.data.len() {
            return Err(Error::OutOfBounds);
        }

        self.position = pos;
        Ok(())
    }

    /// Move the position forward by one byte.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if advancing would exceed the data length.
    pub fn advance(&mut self) -> Result<()> {
        self.advance_by(1)
    }

    /// Move the position forward by `step` bytes.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if advancing would exceed the data length.
    pub fn advance_by(&mut self, step: usize) -> Result<()> {
        self.position = self.calc_end_position(step)?;
        Ok(())
    }

    /// Current position within the data buffer.
    #[must_use]
    pub fn pos(&self) -> usize {
        self.position
    }

    /// The complete underlying data buffer.
    #[must_use]
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Number of bytes left from the current position.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.position)
    }

    /// Fails unless at least `needed` bytes remain.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if fewer than `needed` bytes remain.
    pub fn ensure_remaining(&self, needed: usize) -> Result<()> {
        if self.remaining() < needed {
            return Err(Error::OutOfBounds);
        }
        Ok(())
    }

    /// Peek at the next byte without advancing the position.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if no data is left.
    pub fn peek_byte(&self) -> Result<u8> {
        self.data
            .get(self.position)
            .copied()
            .ok_or(Error::OutOfBounds)
    }

    /// Peek at a little-endian `T` without advancing the position.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if reading `T` would exceed the data length.
    pub fn peek_le<T: CilIO>(&self) -> Result<T> {
        let mut temp_position = self.position;
        read_le_at::<T>(self.data, &mut temp_position)
    }

    /// Read a little-endian `T` and advance past it.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if reading would exceed the data length.
    pub fn read_le<T: CilIO>(&mut self) -> Result<T> {
        read_le_at::<T>(self.data, &mut self.position)
    }

    /// Read a big-endian `T` and advance past it.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if reading would exceed the data length.
    pub fn read_be<T: CilIO>(&mut self) -> Result<T> {
        read_be_at::<T>(self.data, &mut self.position)
    }

    /// Read `length` raw bytes and advance past them.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if fewer than `length` bytes remain.
    pub fn read_bytes(&mut self, length: usize) -> Result<&'a [u8]> {
        let end = self.calc_end_position(length)?;
        let bytes = &self.data[self.position..end];
        self.position = end;
        Ok(bytes)
    }

    /// Compute `pos() + length`, checking for overflow and the data bounds.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the end lies past the data.
    pub fn calc_end_position(&self, length: usize) -> Result<usize> {
        let end = self
            .position
            .checked_add(length)
            .ok_or(Error::OutOfBounds)?;

        if end > self.data.len() {
            return Err(Error::OutOfBounds);
        }

        Ok(end)
    }

    /// Read a compressed unsigned integer as defined in ECMA-335 II.23.2.
    ///
    /// - `0xxxxxxx` - one byte, values `0..=0x7F`
    /// - `10xxxxxx xxxxxxxx` - two bytes, values up to `0x3FFF`
    /// - `110xxxxx` + three bytes - four bytes, values up to `0x1FFF_FFFF`
    ///
    /// Non-minimal encodings are accepted and decode to the same value.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the encoding is cut short, or
    /// [`crate::Error::InvalidCompressedInteger`] for a first byte of `0xE0` or above.
    pub fn read_compressed_uint(&mut self) -> Result<u32> {
        Ok(self.read_compressed_raw()?.0)
    }

    /// Read a compressed signed integer as defined in ECMA-335 II.23.2.
    ///
    /// The raw value carries the sign in bit 0. It is rotated right and, for negative values,
    /// sign-extended from the width of the encoding (7, 14 or 29 bits).
    ///
    /// # Errors
    /// Same as [`Parser::read_compressed_uint`].
    ///
    /// # Examples
    ///
    /// ```rust
    /// use dotsig::Parser;
    ///
    /// assert_eq!(Parser::new(&[0x06]).read_compressed_int()?, 3);
    /// assert_eq!(Parser::new(&[0x7B]).read_compressed_int()?, -3);
    /// assert_eq!(Parser::new(&[0x80, 0x01]).read_compressed_int()?, -8192);
    /// # Ok::<(), dotsig::Error>(())
    /// ```
    pub fn read_compressed_int(&mut self) -> Result<i32> {
        let (raw, width) = self.read_compressed_raw()?;

        let magnitude = raw >> 1;
        let value = if raw & 1 == 0 {
            magnitude
        } else {
            match width {
                1 => magnitude | 0xFFFF_FFC0,
                2 => magnitude | 0xFFFF_E000,
                _ => magnitude | 0xF000_0000,
            }
        };

        #[allow(clippy::cast_possible_wrap)]
        Ok(value as i32)
    }

    /// Read a `TypeDefOrRefOrSpecEncoded` coded index (ECMA-335 II.23.2.8) as a [`Token`].
    ///
    /// | Tag | Table    | Token prefix  |
    /// |-----|----------|---------------|
    /// | 0   | TypeDef  | `0x0200_0000` |
    /// | 1   | TypeRef  | `0x0100_0000` |
    /// | 2   | TypeSpec | `0x1B00_0000` |
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] for a truncated integer,
    /// [`crate::Error::InvalidCompressedInteger`] for a bad prefix, or
    /// [`crate::Error::Malformed`] for the reserved tag 3.
    pub fn read_compressed_token(&mut self) -> Result<Token> {
        let compressed_token = self.read_compressed_uint()?;

        let table: u32 = match compressed_token & 0x3 {
            0x0 => 0x0200_0000,
            0x1 => 0x0100_0000,
            0x2 => 0x1B00_0000,
            _ => {
                return Err(malformed_error!(
                    "Invalid TypeDefOrRef coded index - 0x{:X}",
                    compressed_token
                ))
            }
        };

        Ok(Token::new(table | (compressed_token >> 2)))
    }

    fn read_compressed_raw(&mut self) -> Result<(u32, usize)> {
        let start = self.position;
        let first_byte = self.peek_byte()?;

        let (value, width) = if first_byte & 0x80 == 0 {
            (u32::from(first_byte), 1)
        } else if first_byte & 0xC0 == 0x80 {
            let bytes = self.read_bytes(2)?;
            (
                (u32::from(bytes[0] & 0x3F) << 8) | u32::from(bytes[1]),
                2,
            )
        } else if first_byte & 0xE0 == 0xC0 {
            let bytes = self.read_bytes(4)?;
            (
                (u32::from(bytes[0] & 0x1F) << 24)
                    | (u32::from(bytes[1]) << 16)
                    | (u32::from(bytes[2]) << 8)
                    | u32::from(bytes[3]),
                4,
            )
        } else {
            return Err(Error::InvalidCompressedInteger {
                first_byte,
                offset: start,
            });
        };

        self.position = start + width;
        Ok((value, width))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_compressed_uint() {
        let test_cases = vec![
            (vec![0x03], 3),
            (vec![0x7F], 0x7F),
            (vec![0x80, 0x80], 0x80),
            (vec![0xAE, 0x57], 0x2E57),
            (vec![0xBF, 0xFF], 0x3FFF),
            (vec![0xC0, 0x00, 0x40, 0x00], 0x4000),
            (vec![0xDF, 0xFF, 0xFF, 0xFF], 0x1FFF_FFFF),
        ];

        for (input, expected) in test_cases {
            let mut parser = Parser::new(&input);
            assert_eq!(parser.read_compressed_uint().unwrap(), expected);
            assert_eq!(parser.pos(), input.len());
        }
    }

    #[test]
    fn test_read_compressed_uint_non_minimal() {
        let mut parser = Parser::new(&[0x80, 0x05]);
        assert_eq!(parser.read_compressed_uint().unwrap(), 5);

        let mut parser = Parser::new(&[0xC0, 0x00, 0x00, 0x05]);
        assert_eq!(parser.read_compressed_uint().unwrap(), 5);
    }

    #[test]
    fn test_read_compressed_uint_errors() {
        let mut parser = Parser::new(&[0xE0, 0x00, 0x00, 0x00]);
        assert!(matches!(
            parser.read_compressed_uint(),
            Err(Error::InvalidCompressedInteger {
                first_byte: 0xE0,
                offset: 0
            })
        ));

        let mut parser = Parser::new(&[0x80]);
        assert!(matches!(
            parser.read_compressed_uint(),
            Err(Error::OutOfBounds)
        ));
        assert_eq!(parser.pos(), 0);

        let mut parser = Parser::new(&[0xC0, 0x00, 0x00]);
        assert!(matches!(
            parser.read_compressed_uint(),
            Err(Error::OutOfBounds)
        ));

        let mut parser = Parser::new(&[]);
        assert!(matches!(
            parser.read_compressed_uint(),
            Err(Error::OutOfBounds)
        ));
    }

    #[test]
    fn test_read_compressed_int() {
        let test_cases: Vec<(Vec<u8>, i32)> = vec![
            (vec![0x06], 3),
            (vec![0x7B], -3),
            (vec![0x80, 0x80], 64),
            (vec![0x01], -64),
            (vec![0xC0, 0x00, 0x40, 0x00], 8192),
            (vec![0x80, 0x01], -8192),
            (vec![0xDF, 0xFF, 0xFF, 0xFE], 268_435_455),
            (vec![0xC0, 0x00, 0x00, 0x01], -268_435_456),
        ];

        for (input, expected) in test_cases {
            let mut parser = Parser::new(&input);
            assert_eq!(parser.read_compressed_int().unwrap(), expected, "{input:02X?}");
        }
    }

    #[test]
    fn test_read_compressed_token() {
        let mut parser = Parser::new(&[0x05, 0x08, 0x0A, 0x49]);
        assert_eq!(parser.read_compressed_token().unwrap().value(), 0x0100_0001);
        assert_eq!(parser.read_compressed_token().unwrap().value(), 0x0200_0002);
        assert_eq!(parser.read_compressed_token().unwrap().value(), 0x1B00_0002);
        assert_eq!(parser.read_compressed_token().unwrap().value(), 0x0100_0012);

        let mut parser = Parser::new(&[0x07]);
        assert!(matches!(
            parser.read_compressed_token(),
            Err(Error::Malformed { .. })
        ));
    }

    #[test]
    fn test_navigation() {
        let data = [0x01, 0x02, 0x03, 0x04, 0x05];
        let mut parser = Parser::new(&data);

        assert_eq!(parser.len(), 5);
        assert!(!parser.is_empty());
        assert_eq!(parser.peek_byte().unwrap(), 0x01);
        assert_eq!(parser.peek_le::<u16>().unwrap(), 0x0201);
        assert_eq!(parser.pos(), 0);

        parser.advance().unwrap();
        parser.advance_by(2).unwrap();
        assert_eq!(parser.remaining(), 2);
        assert!(parser.ensure_remaining(2).is_ok());
        assert!(parser.ensure_remaining(3).is_err());

        assert_eq!(parser.read_bytes(2).unwrap(), &[0x04, 0x05]);
        assert!(!parser.has_more_data());
        assert!(parser.read_bytes(1).is_err());
        assert!(parser.advance().is_err());

        parser.seek(5).unwrap();
        assert!(parser.seek(6).is_err());
        parser.seek(0).unwrap();
        assert_eq!(parser.read_be::<u16>().unwrap(), 0x0102);
    }
}
