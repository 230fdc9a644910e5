//! CLI metadata: the structures between the PE image and a decoded signature.
//!
//! The path from a file to a signature runs through the CLR runtime header, the metadata
//! root with its stream directory, and the `#Blob` heap whose entries hold the signature
//! bytes. Decoded signatures refer to type rows by token; the [`typesystem`] module models
//! those rows and the resolver seam.
//!
//! # Key Components
//!
//! - [`cor20header`] - The CLR runtime header
//! - [`root`] - The metadata root and stream directory
//! - [`streams`] - Stream headers and the `#Blob` heap
//! - [`token`] - Metadata tokens and table ids
//! - [`identity`] - Assembly names and versions
//! - [`typesystem`] - Type rows, core library types, token resolution
//! - [`signatures`] - Signature model, decoder, encoder and names
//!
//! # Examples
//!
//! ```rust,no_run
//! use dotsig::{PeFile, metadata::{signatures::parse_type_signature, typesystem::NullResolver}};
//!
//! let file = PeFile::from_file("Library.dll".as_ref())?;
//! let root = file.metadata_root()?;
//! println!("Runtime {}", root.version);
//!
//! let blob = file.blob_heap()?;
//! let signature = parse_type_signature(blob.get(1)?, &NullResolver)?;
//! println!("{}", signature.full_name());
//! # Ok::<(), dotsig::Error>(())
//! ```

/// Implementation of the Header of CIL
pub mod cor20header;
/// Assembly names and versions
pub mod identity;
/// Implementation of the root metadata structure
pub mod root;
/// Implementation of method and type signatures
pub mod signatures;
/// Implementation of the metadata streams signatures are read from
pub mod streams;
/// Commonly used metadata token type
pub mod token;
/// The types signatures refer to
pub mod typesystem;
