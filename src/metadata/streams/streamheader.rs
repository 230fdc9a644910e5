use crate::{file::parser::Parser, Result};

/// Longest stream name accepted, including the terminator
const MAX_NAME_LEN: usize = 32;

/// One entry of the stream directory in the metadata root (ECMA-335 II.24.2.2).
///
/// The name is zero terminated and padded to the next 4-byte boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamHeader {
    /// Offset of the stream relative to the metadata root
    pub offset: u32,
    /// Size of the stream in bytes
    pub size: u32,
    /// Stream name such as `#Blob` or `#~`
    pub name: String,
}

impl StreamHeader {
    /// Decode a single stream header from the start of `data`.
    ///
    /// # Errors
    /// See [`StreamHeader::read`].
    pub fn from(data: &[u8]) -> Result<StreamHeader> {
        Self::read(&mut Parser::new(data))
    }

    /// Decode a stream header at the parser position, consuming the name padding.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] for truncated input and
    /// [`crate::Error::Malformed`] for unterminated names longer than 32 bytes.
    pub fn read(parser: &mut Parser) -> Result<StreamHeader> {
        let offset = parser.read_le::<u32>()?;
        let size = parser.read_le::<u32>()?;

        let mut name = String::new();
        loop {
            let byte = parser.read_le::<u8>()?;
            if byte == 0 {
                break;
            }
            if name.len() + 1 >= MAX_NAME_LEN {
                return Err(malformed_error!("Stream name too long - {}", name));
            }
            name.push(char::from(byte));
        }

        let padded = (name.len() + 1 + 3) & !3;
        parser.advance_by(padded - (name.len() + 1))?;

        Ok(StreamHeader { offset, size, name })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crafted() {
        #[rustfmt::skip]
        let header_bytes = [
            0x6C, 0x00, 0x00, 0x00,
            0xA4, 0x45, 0x00, 0x00,
            0x23, 0x7E, 0x00, 0x00,
        ];

        let mut parser = Parser::new(&header_bytes);
        let parsed_header = StreamHeader::read(&mut parser).unwrap();

        assert_eq!(parsed_header.offset, 0x6C);
        assert_eq!(parsed_header.size, 0x45A4);
        assert_eq!(parsed_header.name, "#~");
        assert_eq!(parser.pos(), 12);
    }

    #[test]
    fn crafted_invalid() {
        let mut unterminated = vec![0u8; 8];
        unterminated.extend_from_slice(&[b'A'; 40]);
        assert!(StreamHeader::from(&unterminated).is_err());

        assert!(StreamHeader::from(&[0x00, 0x00, 0x00, 0x00, 0x01]).is_err());
    }
}
