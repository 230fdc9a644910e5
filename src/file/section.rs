//! PE section headers (`IMAGE_SECTION_HEADER`) and the RVA mapping built from them.
//!
//! A PE image stores one 40-byte header per section directly after the optional header.
//! [`crate::file::section::SectionHeader::read`] decodes exactly one record from a
//! [`crate::Parser`] and [`crate::file::section::SectionTable`] keeps the ordered list,
//! answering the RVA to file offset questions needed to find the CLR metadata.
//!
//! # Record layout
//!
//! | Offset | Size | Field                    |
//! |--------|------|--------------------------|
//! | 0      | 8    | `name`                   |
//! | 8      | 4    | `virtual_size`           |
//! | 12     | 4    | `virtual_address`        |
//! | 16     | 4    | `size_of_raw_data`       |
//! | 20     | 4    | `pointer_to_raw_data`    |
//! | 24     | 4    | `pointer_to_relocations` |
//! | 28     | 4    | `pointer_to_linenumbers` |
//! | 32     | 2    | `number_of_relocations`  |
//! | 34     | 2    | `number_of_linenumbers`  |
//! | 36     | 4    | `characteristics`        |
//!
//! # Examples
//!
//! ```rust
//! use dotsig::{Parser, file::section::SectionHeader};
//!
//! let mut record = [0u8; 40];
//! record[..5].copy_from_slice(b".text");
//! record[12..16].copy_from_slice(&0x2000u32.to_le_bytes());
//!
//! let header = SectionHeader::read(&mut Parser::new(&record))?;
//! assert_eq!(header.display_name(), ".text");
//! assert_eq!(header.virtual_address, 0x2000);
//! # Ok::<(), dotsig::Error>(())
//! ```

use bitflags::bitflags;

use crate::{file::parser::Parser, Result};

bitflags! {
    /// Flags of the `characteristics` field of a section header.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SectionCharacteristics: u32 {
        /// Section contains executable code
        const CNT_CODE = 0x0000_0020;
        /// Section contains initialized data
        const CNT_INITIALIZED_DATA = 0x0000_0040;
        /// Section contains uninitialized data
        const CNT_UNINITIALIZED_DATA = 0x0000_0080;
        /// Section contains extended relocations
        const LNK_NRELOC_OVFL = 0x0100_0000;
        /// Section can be discarded
        const MEM_DISCARDABLE = 0x0200_0000;
        /// Section cannot be cached
        const MEM_NOT_CACHED = 0x0400_0000;
        /// Section is not pageable
        const MEM_NOT_PAGED = 0x0800_0000;
        /// Section can be shared in memory
        const MEM_SHARED = 0x1000_0000;
        /// Section can be executed
        const MEM_EXECUTE = 0x2000_0000;
        /// Section can be read
        const MEM_READ = 0x4000_0000;
        /// Section can be written to
        const MEM_WRITE = 0x8000_0000;
    }
}

/// A single decoded `IMAGE_SECTION_HEADER`.
///
/// No field is validated: whatever the 40 bytes contain is reported as is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionHeader {
    /// Raw 8-byte name, zero padded
    pub name: [u8; 8],
    /// Size of the section once loaded
    pub virtual_size: u32,
    /// RVA of the first byte of the section
    pub virtual_address: u32,
    /// Size of the initialized data on disk
    pub size_of_raw_data: u32,
    /// File offset of the section data
    pub pointer_to_raw_data: u32,
    /// File offset of the relocation entries
    pub pointer_to_relocations: u32,
    /// File offset of the line-number entries
    pub pointer_to_linenumbers: u32,
    /// Count of relocation entries
    pub number_of_relocations: u16,
    /// Count of line-number entries
    pub number_of_linenumbers: u16,
    /// Raw characteristics flags, see [`SectionCharacteristics`]
    pub characteristics: u32,
}

impl SectionHeader {
    /// Size of one encoded section header
    pub const SIZE: usize = 40;

    /// Read one section header from the current position of `parser`.
    ///
    /// Exactly [`SectionHeader::SIZE`] bytes are consumed on success.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if fewer than 40 bytes remain. The parser
    /// position is left untouched in that case.
    pub fn read(parser: &mut Parser) -> Result<Self> {
        parser.ensure_remaining(Self::SIZE)?;

        let mut name = [0u8; 8];
        name.copy_from_slice(parser.read_bytes(8)?);

        Ok(SectionHeader {
            name,
            virtual_size: parser.read_le::<u32>()?,
            virtual_address: parser.read_le::<u32>()?,
            size_of_raw_data: parser.read_le::<u32>()?,
            pointer_to_raw_data: parser.read_le::<u32>()?,
            pointer_to_relocations: parser.read_le::<u32>()?,
            pointer_to_linenumbers: parser.read_le::<u32>()?,
            number_of_relocations: parser.read_le::<u16>()?,
            number_of_linenumbers: parser.read_le::<u16>()?,
            characteristics: parser.read_le::<u32>()?,
        })
    }

    /// Append the 40-byte encoding of this header to `buffer`.
    pub fn write_to(&self, buffer: &mut Vec<u8>) {
        buffer.extend_from_slice(&self.name);
        buffer.extend_from_slice(&self.virtual_size.to_le_bytes());
        buffer.extend_from_slice(&self.virtual_address.to_le_bytes());
        buffer.extend_from_slice(&self.size_of_raw_data.to_le_bytes());
        buffer.extend_from_slice(&self.pointer_to_raw_data.to_le_bytes());
        buffer.extend_from_slice(&self.pointer_to_relocations.to_le_bytes());
        buffer.extend_from_slice(&self.pointer_to_linenumbers.to_le_bytes());
        buffer.extend_from_slice(&self.number_of_relocations.to_le_bytes());
        buffer.extend_from_slice(&self.number_of_linenumbers.to_le_bytes());
        buffer.extend_from_slice(&self.characteristics.to_le_bytes());
    }

    /// The name up to the first zero byte, one `char` per byte.
    ///
    /// Bytes are mapped to the code point of the same value, so non-ASCII names never fail.
    #[must_use]
    pub fn display_name(&self) -> String {
        self.name
            .iter()
            .take_while(|&&byte| byte != 0)
            .map(|&byte| char::from(byte))
            .collect()
    }

    /// The characteristics field as typed flags. Unknown bits are retained.
    #[must_use]
    pub fn flags(&self) -> SectionCharacteristics {
        SectionCharacteristics::from_bits_retain(self.characteristics)
    }

    /// Number of bytes the section spans in the virtual address space.
    ///
    /// Some linkers leave `virtual_size` zero, so the larger of the two sizes is used.
    #[must_use]
    pub fn virtual_extent(&self) -> u32 {
        self.virtual_size.max(self.size_of_raw_data)
    }

    /// Returns `true` if `rva` lies inside `[virtual_address, virtual_address + extent)`.
    #[must_use]
    pub fn contains_rva(&self, rva: u32) -> bool {
        let start = u64::from(self.virtual_address);
        let end = start + u64::from(self.virtual_extent());
        (start..end).contains(&u64::from(rva))
    }

    /// Returns `true` if the file `offset` lies inside the raw data of this section.
    #[must_use]
    pub fn contains_offset(&self, offset: u32) -> bool {
        let start = u64::from(self.pointer_to_raw_data);
        let end = start + u64::from(self.size_of_raw_data);
        (start..end).contains(&u64::from(offset))
    }
}

/// The ordered list of section headers of a PE image.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionTable {
    sections: Vec<SectionHeader>,
}

impl SectionTable {
    /// Read `count` consecutive headers from `parser`.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the data ends before the last header.
    pub fn read(parser: &mut Parser, count: usize) -> Result<Self> {
        let mut sections = Vec::with_capacity(count.min(parser.remaining() / SectionHeader::SIZE));
        for _ in 0..count {
            sections.push(SectionHeader::read(parser)?);
        }

        Ok(SectionTable { sections })
    }

    /// Number of sections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// Returns `true` if the image has no sections.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Iterate the headers in file order.
    pub fn iter(&self) -> std::slice::Iter<'_, SectionHeader> {
        self.sections.iter()
    }

    /// The first section whose virtual range contains `rva`.
    #[must_use]
    pub fn section_by_rva(&self, rva: u32) -> Option<&SectionHeader> {
        self.sections.iter().find(|section| section.contains_rva(rva))
    }

    /// The first section with the given display name, e.g. `".text"`.
    #[must_use]
    pub fn section_by_name(&self, name: &str) -> Option<&SectionHeader> {
        self.sections
            .iter()
            .find(|section| section.display_name() == name)
    }

    /// Translate an RVA into a file offset.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if no section contains `rva`, or if `rva` lies in
    /// the part of a section that has no backing data in the file.
    pub fn rva_to_offset(&self, rva: u32) -> Result<usize> {
        let Some(section) = self.section_by_rva(rva) else {
            return Err(malformed_error!("RVA 0x{:X} is not mapped by any section", rva));
        };

        let delta = rva - section.virtual_address;
        if delta >= section.size_of_raw_data {
            return Err(malformed_error!(
                "RVA 0x{:X} lies in the uninitialized tail of section {}",
                rva,
                section.display_name()
            ));
        }

        (section.pointer_to_raw_data as usize)
            .checked_add(delta as usize)
            .ok_or_else(|| malformed_error!("RVA 0x{:X} maps past the addressable range", rva))
    }

    /// Translate a file offset into an RVA.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the offset is not inside the raw data of any
    /// section, or if the section's virtual address puts the result past `u32::MAX`.
    pub fn offset_to_rva(&self, offset: usize) -> Result<u32> {
        let Ok(offset) = u32::try_from(offset) else {
            return Err(malformed_error!("Offset too large to fit in u32: {}", offset));
        };

        let Some(section) = self
            .sections
            .iter()
            .find(|section| section.contains_offset(offset))
        else {
            return Err(malformed_error!("Offset 0x{:X} is not inside any section", offset));
        };

        (offset - section.pointer_to_raw_data)
            .checked_add(section.virtual_address)
            .ok_or_else(|| {
                malformed_error!(
                    "Offset 0x{:X} maps past the address space in section {}",
                    offset,
                    section.display_name()
                )
            })
    }
}

impl<'a> IntoIterator for &'a SectionTable {
    type Item = &'a SectionHeader;
    type IntoIter = std::slice::Iter<'a, SectionHeader>;

    fn into_iter(self) -> Self::IntoIter {
        self.sections.iter()
    }
}

impl From<Vec<SectionHeader>> for SectionTable {
    fn from(sections: Vec<SectionHeader>) -> Self {
        SectionTable { sections }
    }
}
