//! Metadata tokens.
//!
//! A token is a 32-bit value whose high byte names a metadata table and whose low 24 bits
//! hold a 1-based row id. Signatures only ever refer to the `TypeDef`, `TypeRef` and
//! `TypeSpec` tables, through the `TypeDefOrRef` coded index (ECMA-335 II.23.2.8), which
//! [`Token::to_type_def_or_ref_index`] produces and [`crate::Parser::read_compressed_token`]
//! consumes.

use std::fmt;

use crate::{Error, Result};

/// Table id of the `TypeRef` table
pub const TABLE_TYPE_REF: u8 = 0x01;
/// Table id of the `TypeDef` table
pub const TABLE_TYPE_DEF: u8 = 0x02;
/// Table id of the `TypeSpec` table
pub const TABLE_TYPE_SPEC: u8 = 0x1B;

/// A metadata token, `table << 24 | row`.
///
/// # Examples
///
/// ```rust
/// use dotsig::metadata::token::{Token, TABLE_TYPE_REF};
///
/// let token = Token::from_parts(TABLE_TYPE_REF, 0x12);
/// assert_eq!(token.value(), 0x0100_0012);
/// assert_eq!(token.row(), 0x12);
/// assert_eq!(token.to_string(), "0x01000012");
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Token(pub u32);

impl Token {
    /// Create a token from its raw value.
    #[must_use]
    pub fn new(value: u32) -> Self {
        Token(value)
    }

    /// Create a token from a table id and a row id. Bits of `row` above 24 are dropped.
    #[must_use]
    pub fn from_parts(table: u8, row: u32) -> Self {
        Token((u32::from(table) << 24) | (row & 0x00FF_FFFF))
    }

    /// The raw 32-bit value.
    #[must_use]
    pub fn value(&self) -> u32 {
        self.0
    }

    /// The table id in the high byte.
    #[must_use]
    pub fn table(&self) -> u8 {
        (self.0 >> 24) as u8
    }

    /// The row id in the low 24 bits.
    #[must_use]
    pub fn row(&self) -> u32 {
        self.0 & 0x00FF_FFFF
    }

    /// Returns `true` for the zero token.
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.0 == 0
    }

    /// Returns `true` if the token points into `TypeDef`, `TypeRef` or `TypeSpec`.
    #[must_use]
    pub fn is_type_def_or_ref(&self) -> bool {
        matches!(
            self.table(),
            TABLE_TYPE_DEF | TABLE_TYPE_REF | TABLE_TYPE_SPEC
        )
    }

    /// Encode as a `TypeDefOrRef` coded index: `row << 2 | tag`.
    ///
    /// # Errors
    /// Returns [`crate::Error::EncodingInvalid`] if the token is in another table.
    pub fn to_type_def_or_ref_index(&self) -> Result<u32> {
        let tag = match self.table() {
            TABLE_TYPE_DEF => 0,
            TABLE_TYPE_REF => 1,
            TABLE_TYPE_SPEC => 2,
            _ => {
                return Err(Error::EncodingInvalid(format!(
                    "Token {self} is not a TypeDef, TypeRef or TypeSpec token"
                )))
            }
        };

        // 24-bit rows always fit the 29-bit compressed range after the shift
        Ok((self.row() << 2) | tag)
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_parts() {
        let token = Token::new(0x0200_0005);
        assert_eq!(token.table(), TABLE_TYPE_DEF);
        assert_eq!(token.row(), 5);
        assert!(!token.is_null());
        assert!(Token::default().is_null());
        assert_eq!(Token::from_parts(TABLE_TYPE_SPEC, 3), Token(0x1B00_0003));
    }

    #[test]
    fn test_token_format() {
        let token = Token(0x0100_0012);
        assert_eq!(format!("{token}"), "0x01000012");
        assert_eq!(
            format!("{token:?}"),
            "Token(0x01000012, table: 0x01, row: 18)"
        );
    }

    #[test]
    fn test_type_def_or_ref_index() {
        assert_eq!(Token(0x0200_0002).to_type_def_or_ref_index().unwrap(), 0x08);
        assert_eq!(Token(0x0100_0001).to_type_def_or_ref_index().unwrap(), 0x05);
        assert_eq!(Token(0x1B00_0002).to_type_def_or_ref_index().unwrap(), 0x0A);

        assert!(!Token(0x0600_0001).is_type_def_or_ref());
        assert!(matches!(
            Token(0x0600_0001).to_type_def_or_ref_index(),
            Err(Error::EncodingInvalid(_))
        ));
    }
}
