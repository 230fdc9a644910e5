//! The CLR runtime header (`IMAGE_COR20_HEADER`, ECMA-335 II.25.3.3).
//!
//! The PE data directory entry 14 points at this 72-byte structure, which in turn holds the
//! RVA and size of the metadata root.

use crate::{file::parser::Parser, Result};

/// Decoded CLR runtime header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cor20Header {
    /// Size of the header in bytes, always 72
    pub cb: u32,
    /// Minimum major runtime version
    pub major_runtime_version: u16,
    /// Minor runtime version
    pub minor_runtime_version: u16,
    /// RVA of the metadata root
    pub meta_data_rva: u32,
    /// Size of the metadata
    pub meta_data_size: u32,
    /// Runtime flags (`COMIMAGE_FLAGS_*`)
    pub flags: u32,
    /// Entry point method token, or RVA for native entry points
    pub entry_point_token: u32,
    /// RVA of the managed resources
    pub resource_rva: u32,
    /// Size of the managed resources
    pub resource_size: u32,
    /// RVA of the strong name signature
    pub strong_name_signature_rva: u32,
    /// Size of the strong name signature
    pub strong_name_signature_size: u32,
    /// Reserved, zero
    pub code_manager_table_rva: u32,
    /// Reserved, zero
    pub code_manager_table_size: u32,
    /// RVA of the vtable fixups
    pub vtable_fixups_rva: u32,
    /// Size of the vtable fixups
    pub vtable_fixups_size: u32,
    /// Reserved, zero
    pub export_address_table_jmp_rva: u32,
    /// Reserved, zero
    pub export_address_table_jmp_size: u32,
    /// Reserved, zero for non precompiled images
    pub managed_native_header_rva: u32,
    /// Reserved, zero for non precompiled images
    pub managed_native_header_size: u32,
}

impl Cor20Header {
    /// Size of the encoded header
    pub const SIZE: usize = 72;

    /// Decode the header from the start of `data`.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if `data` is shorter than 72 bytes and
    /// [`crate::Error::Malformed`] if the size field is not 72 or the metadata directory
    /// is empty.
    pub fn read(data: &[u8]) -> Result<Cor20Header> {
        let mut parser = Parser::new(data);
        parser.ensure_remaining(Self::SIZE)?;

        let cb = parser.read_le::<u32>()?;
        if cb as usize != Self::SIZE {
            return Err(malformed_error!(
                "Invalid CLR header size: expected 72, got {}",
                cb
            ));
        }

        let header = Cor20Header {
            cb,
            major_runtime_version: parser.read_le::<u16>()?,
            minor_runtime_version: parser.read_le::<u16>()?,
            meta_data_rva: parser.read_le::<u32>()?,
            meta_data_size: parser.read_le::<u32>()?,
            flags: parser.read_le::<u32>()?,
            entry_point_token: parser.read_le::<u32>()?,
            resource_rva: parser.read_le::<u32>()?,
            resource_size: parser.read_le::<u32>()?,
            strong_name_signature_rva: parser.read_le::<u32>()?,
            strong_name_signature_size: parser.read_le::<u32>()?,
            code_manager_table_rva: parser.read_le::<u32>()?,
            code_manager_table_size: parser.read_le::<u32>()?,
            vtable_fixups_rva: parser.read_le::<u32>()?,
            vtable_fixups_size: parser.read_le::<u32>()?,
            export_address_table_jmp_rva: parser.read_le::<u32>()?,
            export_address_table_jmp_size: parser.read_le::<u32>()?,
            managed_native_header_rva: parser.read_le::<u32>()?,
            managed_native_header_size: parser.read_le::<u32>()?,
        };

        if header.meta_data_rva == 0 || header.meta_data_size == 0 {
            return Err(malformed_error!("CLR header has an empty metadata directory"));
        }

        Ok(header)
    }
}
