//! PE image access: backends, headers, the section table and the path to the `#Blob` heap.
//!
//! [`crate::file::PeFile`] parses the DOS, COFF and optional headers with `goblin`, then reads
//! the section table itself with [`crate::file::section::SectionHeader::read`] so that every
//! header field is reported exactly as stored. From there it follows the CLR data directory
//! to the runtime header, the metadata root and finally the blob heap holding signatures.
//!
//! # Key Components
//!
//! - [`crate::file::PeFile`] - A loaded image with RVA translation and metadata lookup
//! - [`crate::file::Backend`] - Data source trait, implemented by
//!   [`crate::file::memory::Memory`] and [`crate::file::physical::Physical`]
//! - [`crate::file::section`] - Section header records and the section table
//! - [`crate::file::parser::Parser`] / [`crate::file::io`] - Bounds-checked readers
//!
//! # Examples
//!
//! ```rust,no_run
//! use dotsig::{PeFile, metadata::{signatures::parse_type_signature, typesystem::NullResolver}};
//! use std::path::Path;
//!
//! let file = PeFile::from_file(Path::new("Library.dll"))?;
//! for section in file.sections() {
//!     println!("{:8} rva 0x{:08X}", section.display_name(), section.virtual_address);
//! }
//!
//! let blobs = file.blob_heap()?;
//! for entry in &blobs {
//!     let (offset, bytes) = entry?;
//!     if let Ok(signature) = parse_type_signature(bytes, &NullResolver) {
//!         println!("0x{offset:X}: {signature}");
//!     }
//! }
//! # Ok::<(), dotsig::Error>(())
//! ```

pub mod io;
pub mod memory;
pub mod parser;
pub mod physical;
pub mod section;

use std::path::Path;

use goblin::pe::PE;
use log::debug;

use crate::{
    metadata::{cor20header::Cor20Header, root::Root, streams::Blob},
    Error::{Empty, NotSupported},
    Result,
};
use memory::Memory;
use parser::Parser;
use physical::Physical;
use section::SectionTable;

/// A source of image bytes.
///
/// Implementations must be `Send + Sync` so a loaded [`PeFile`] can be shared between threads.
pub trait Backend: Send + Sync {
    /// Returns `len` bytes starting at `offset`.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the range exceeds the data.
    fn data_slice(&self, offset: usize, len: usize) -> Result<&[u8]>;

    /// The complete image.
    fn data(&self) -> &[u8];

    /// Size of the image in bytes.
    fn len(&self) -> usize;
}

/// A PE image with its section table and CLR directory.
pub struct PeFile {
    data: Box<dyn Backend>,
    sections: SectionTable,
    clr: Option<(u32, u32)>,
}

impl PeFile {
    /// Map and load the image at `path`.
    ///
    /// # Errors
    /// Returns [`crate::Error::FileError`] for I/O failures and the errors of
    /// [`PeFile::from_mem`] for invalid images.
    pub fn from_file(path: &Path) -> Result<PeFile> {
        Self::load(Physical::new(path)?)
    }

    /// Load an image held in memory.
    ///
    /// # Errors
    /// Returns [`crate::Error::Empty`] for empty input, [`crate::Error::GoblinErr`] if the PE
    /// headers cannot be parsed and [`crate::Error::OutOfBounds`] if the section table is
    /// truncated.
    pub fn from_mem(data: Vec<u8>) -> Result<PeFile> {
        Self::load(Memory::new(data))
    }

    fn load<T: Backend + 'static>(data: T) -> Result<PeFile> {
        if data.len() == 0 {
            return Err(Empty);
        }

        let (table_offset, section_count, clr) = {
            let pe = PE::parse(data.data())?;

            let coff = &pe.header.coff_header;
            let table_offset = pe.header.dos_header.pe_pointer as usize
                + 4
                + 20
                + usize::from(coff.size_of_optional_header);

            let clr = pe.header.optional_header.as_ref().and_then(|optional| {
                optional
                    .data_directories
                    .get_clr_runtime_header()
                    .as_ref()
                    .map(|directory| (directory.virtual_address, directory.size))
                    .filter(|&(rva, _)| rva != 0)
            });

            (table_offset, usize::from(coff.number_of_sections), clr)
        };

        let mut parser = Parser::new(data.data());
        parser.seek(table_offset)?;
        let sections = SectionTable::read(&mut parser, section_count)?;

        debug!(
            "loaded PE image of {} bytes with {} sections, CLR directory {:?}",
            data.len(),
            sections.len(),
            clr
        );

        Ok(PeFile {
            data: Box::new(data),
            sections,
            clr,
        })
    }

    /// Size of the image in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` for an empty image. Loaded images are never empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.len() == 0
    }

    /// The complete image.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        self.data.data()
    }

    /// Returns `len` bytes starting at file `offset`.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the range exceeds the image.
    pub fn data_slice(&self, offset: usize, len: usize) -> Result<&[u8]> {
        self.data.data_slice(offset, len)
    }

    /// The section table in file order.
    #[must_use]
    pub fn sections(&self) -> &SectionTable {
        &self.sections
    }

    /// RVA and size of the CLR runtime header, `None` for native images.
    #[must_use]
    pub fn clr(&self) -> Option<(u32, u32)> {
        self.clr
    }

    /// Translate an RVA into a file offset through the section table.
    ///
    /// # Errors
    /// See [`SectionTable::rva_to_offset`].
    pub fn rva_to_offset(&self, rva: u32) -> Result<usize> {
        self.sections.rva_to_offset(rva)
    }

    /// Translate a file offset into an RVA through the section table.
    ///
    /// # Errors
    /// See [`SectionTable::offset_to_rva`].
    pub fn offset_to_rva(&self, offset: usize) -> Result<u32> {
        self.sections.offset_to_rva(offset)
    }

    /// Decode the CLR runtime header.
    ///
    /// # Errors
    /// Returns [`crate::Error::NotSupported`] for images without a CLR directory, plus the
    /// errors of RVA translation and [`Cor20Header::read`].
    pub fn cor20_header(&self) -> Result<Cor20Header> {
        let (rva, _) = self.clr.ok_or(NotSupported)?;
        let offset = self.rva_to_offset(rva)?;

        Cor20Header::read(self.data_slice(offset, Cor20Header::SIZE)?)
    }

    /// The raw metadata referenced by the CLR runtime header.
    ///
    /// # Errors
    /// Same as [`PeFile::cor20_header`], plus [`crate::Error::OutOfBounds`] if the metadata
    /// exceeds the image.
    pub fn metadata(&self) -> Result<&[u8]> {
        let header = self.cor20_header()?;
        let offset = self.rva_to_offset(header.meta_data_rva)?;

        self.data_slice(offset, header.meta_data_size as usize)
    }

    /// Decode the metadata root and its stream directory.
    ///
    /// # Errors
    /// Same as [`PeFile::metadata`], plus the errors of [`Root::read`].
    pub fn metadata_root(&self) -> Result<Root> {
        Root::read(self.metadata()?)
    }

    /// The `#Blob` heap of the image.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the metadata has no `#Blob` stream, plus the
    /// errors of [`PeFile::metadata_root`].
    pub fn blob_heap(&self) -> Result<Blob<'_>> {
        let metadata = self.metadata()?;
        let root = Root::read(metadata)?;

        let Some(stream) = root.stream("#Blob") else {
            return Err(malformed_error!("Metadata has no #Blob stream"));
        };

        let start = stream.offset as usize;
        Blob::from(&metadata[start..start + stream.size as usize])
    }
}
