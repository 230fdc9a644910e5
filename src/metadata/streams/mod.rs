//! Metadata stream directory and the `#Blob` heap.
//!
//! Only the pieces needed to reach signature blobs are provided: the stream header that
//! locates a heap inside the metadata and the length-prefixed blob heap itself.

mod blob;
mod streamheader;

pub use blob::{Blob, BlobIterator};
pub use streamheader::StreamHeader;
