//! The metadata root (ECMA-335 II.24.2.1), starting with the `BSJB` signature.
//!
//! The root carries a version string and the directory of metadata streams. Only the stream
//! directory matters here: it is how the `#Blob` heap holding signatures is found.

use crate::{file::parser::Parser, metadata::streams::StreamHeader, Result};

/// Magic signature at the start of the metadata root, `BSJB` in little-endian
pub const CIL_HEADER_MAGIC: u32 = 0x424A_5342;

/// Decoded metadata root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Root {
    /// Always [`CIL_HEADER_MAGIC`]
    pub signature: u32,
    /// Major version, 1 for all current runtimes
    pub major_version: u16,
    /// Minor version
    pub minor_version: u16,
    /// Reserved, zero
    pub reserved: u32,
    /// Length of the padded version string field
    pub length: u32,
    /// Runtime version string, e.g. `v4.0.30319`
    pub version: String,
    /// Reserved, zero
    pub flags: u16,
    /// Stream headers in directory order
    pub stream_headers: Vec<StreamHeader>,
}

impl Root {
    /// Decode the metadata root from the start of `data`.
    ///
    /// Every stream header is checked to lie within `data`.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] for truncated input and
    /// [`crate::Error::Malformed`] for a bad signature or out of range streams.
    pub fn read(data: &[u8]) -> Result<Root> {
        let mut parser = Parser::new(data);

        let signature = parser.read_le::<u32>()?;
        if signature != CIL_HEADER_MAGIC {
            return Err(malformed_error!(
                "CIL_HEADER_MAGIC does not match - 0x{:08X}",
                signature
            ));
        }

        let major_version = parser.read_le::<u16>()?;
        let minor_version = parser.read_le::<u16>()?;
        let reserved = parser.read_le::<u32>()?;
        let length = parser.read_le::<u32>()?;

        let version = parser
            .read_bytes(length as usize)?
            .iter()
            .take_while(|&&byte| byte != 0)
            .map(|&byte| char::from(byte))
            .collect();

        let flags = parser.read_le::<u16>()?;
        let stream_count = parser.read_le::<u16>()?;

        let mut stream_headers = Vec::with_capacity(usize::from(stream_count).min(8));
        for _ in 0..stream_count {
            let header = StreamHeader::read(&mut parser)?;

            let in_range = header
                .offset
                .checked_add(header.size)
                .is_some_and(|end| end as usize <= data.len());
            if !in_range {
                return Err(malformed_error!(
                    "Stream {} exceeds the metadata - 0x{:X} + 0x{:X}",
                    header.name,
                    header.offset,
                    header.size
                ));
            }

            stream_headers.push(header);
        }

        Ok(Root {
            signature,
            major_version,
            minor_version,
            reserved,
            length,
            version,
            flags,
            stream_headers,
        })
    }

    /// The stream header with the given name, e.g. `"#Blob"`.
    #[must_use]
    pub fn stream(&self, name: &str) -> Option<&StreamHeader> {
        self.stream_headers.iter().find(|header| header.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn crafted() {
        #[rustfmt::skip]
        let header_bytes = [
            0x42, 0x53, 0x4A, 0x42,
            0x01, 0x00,
            0x01, 0x00,
            0x00, 0x00, 0x00, 0x00,
            0x08, 0x00, 0x00, 0x00,
            b'v', b'4', b'.', b'0', 0x00, 0x00, 0x00, 0x00,
            0x00, 0x00,
            0x01, 0x00,
            0x24, 0x00, 0x00, 0x00,
            0x04, 0x00, 0x00, 0x00,
            b'#', b'B', b'l', b'o', b'b', 0x00, 0x00, 0x00,
            0x00, 0x03, 0x01, 0x02,
        ];

        let root = Root::read(&header_bytes).unwrap();

        assert_eq!(root.signature, CIL_HEADER_MAGIC);
        assert_eq!(root.major_version, 1);
        assert_eq!(root.length, 8);
        assert_eq!(root.version, "v4.0");
        assert_eq!(root.stream_headers.len(), 1);

        let blob = root.stream("#Blob").unwrap();
        assert_eq!(blob.offset, 0x24);
        assert_eq!(blob.size, 4);
        assert!(root.stream("#Strings").is_none());
    }

    #[test]
    fn invalid() {
        assert!(matches!(
            Root::read(&[0x42, 0x53, 0x4A, 0x43, 0, 0, 0, 0]),
            Err(Error::Malformed { .. })
        ));
        assert!(matches!(
            Root::read(&[0x42, 0x53, 0x4A, 0x42, 0x01]),
            Err(Error::OutOfBounds)
        ));

        #[rustfmt::skip]
        let out_of_range = [
            0x42, 0x53, 0x4A, 0x42,
            0x01, 0x00, 0x01, 0x00,
            0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00,
            0x00, 0x00,
            0x01, 0x00,
            0x10, 0x00, 0x00, 0x00,
            0x00, 0x01, 0x00, 0x00,
            b'#', b'B', b'l', b'o', b'b', 0x00, 0x00, 0x00,
        ];
        assert!(matches!(
            Root::read(&out_of_range),
            Err(Error::Malformed { .. })
        ));
    }
}
