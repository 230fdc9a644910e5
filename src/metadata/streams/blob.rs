use log::trace;

use crate::{file::parser::Parser, Error, Result};

/// The `#Blob` heap, a sequence of length-prefixed byte runs (ECMA-335 II.24.2.4).
///
/// Signature blobs are referenced by their offset into this heap. Offset 0 always holds the
/// empty blob.
///
/// # Examples
///
/// ```rust
/// use dotsig::metadata::streams::Blob;
///
/// let heap = [0x00, 0x02, 0x1D, 0x08];
/// let blob = Blob::from(&heap)?;
/// assert_eq!(blob.get(1)?, &[0x1D, 0x08]);
/// # Ok::<(), dotsig::Error>(())
/// ```
pub struct Blob<'a> {
    data: &'a [u8],
}

impl<'a> Blob<'a> {
    /// Wrap the raw bytes of a `#Blob` heap.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the heap does not start with the empty blob.
    pub fn from(data: &'a [u8]) -> Result<Blob<'a>> {
        if data.first() != Some(&0) {
            return Err(malformed_error!("Invalid memory for #Blob heap"));
        }

        Ok(Blob { data })
    }

    /// The blob stored at `index`, without its length prefix.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if `index` or the blob extent lies outside the
    /// heap.
    pub fn get(&self, index: usize) -> Result<&'a [u8]> {
        let Some(tail) = self.data.get(index..) else {
            return Err(Error::OutOfBounds);
        };

        let mut parser = Parser::new(tail);
        let len = parser.read_compressed_uint()? as usize;
        let bytes = parser.read_bytes(len)?;

        trace!("blob heap lookup at 0x{index:X} returned {len} bytes");
        Ok(bytes)
    }

    /// Iterate all blobs as `(offset, bytes)`, skipping the empty blob at offset 0.
    #[must_use]
    pub fn iter(&self) -> BlobIterator<'a> {
        BlobIterator {
            data: self.data,
            position: 1,
        }
    }
}

impl<'a> IntoIterator for &Blob<'a> {
    type Item = Result<(usize, &'a [u8])>;
    type IntoIter = BlobIterator<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the entries of a [`Blob`] heap.
///
/// Stops after the first error.
pub struct BlobIterator<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> Iterator for BlobIterator<'a> {
    type Item = Result<(usize, &'a [u8])>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.position >= self.data.len() {
            return None;
        }

        let start = self.position;
        let mut parser = Parser::new(&self.data[start..]);
        let entry = parser
            .read_compressed_uint()
            .and_then(|len| parser.read_bytes(len as usize));

        match entry {
            Ok(bytes) => {
                self.position = start + parser.pos();
                Some(Ok((start, bytes)))
            }
            Err(error) => {
                self.position = self.data.len();
                Some(Err(error))
            }
        }
    }
}
