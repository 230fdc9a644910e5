//! Type and method signatures: model, codec and name derivation.
//!
//! Signatures are the compact binary descriptions of types stored in the `#Blob` heap
//! (ECMA-335 II.23.2). This module decodes them into [`TypeSig`] trees, encodes trees back
//! into bytes, and derives the display, reflection and assembly-qualified names of a tree.
//!
//! # Binary Format
//!
//! - Every node starts with an element type tag byte
//! - Counts, indices and sizes are compressed unsigned integers, array lower bounds are
//!   compressed signed integers
//! - Type references are `TypeDefOrRef` coded indices
//! - Wrappers (`PTR`, `BYREF`, `SZARRAY`, ...) are followed by the type they wrap
//!
//! # Round-trips
//!
//! Decoding followed by encoding reproduces the input exactly as long as every compressed
//! integer used its shortest form, which is what compilers emit. Encoding followed by
//! decoding always reproduces the tree.
//!
//! # Examples
//!
//! ```rust
//! use dotsig::metadata::{
//!     signatures::{encode_type_signature, parse_type_signature},
//!     typesystem::NullResolver,
//! };
//!
//! // int32[]*
//! let blob = [0x0F, 0x1D, 0x08];
//! let signature = parse_type_signature(&blob, &NullResolver)?;
//!
//! assert_eq!(signature.full_name(), "System.Int32[]*");
//! assert!(signature.is_pointer());
//! assert_eq!(encode_type_signature(&signature)?, blob);
//! # Ok::<(), dotsig::Error>(())
//! ```
//!
//! # References
//!
//! - ECMA-335 6th Edition, Partition II, Section 23.2 - Blobs and Signatures
//! - ECMA-335 6th Edition, Partition II, Section 23.1.16 - Element types used in signatures

mod encoder;
mod modifiers;
mod names;
mod parser;
mod types;

pub use encoder::{encode_method_signature, encode_type_signature, SignatureEncoder};
pub use modifiers::*;
pub use names::MAX_ARRAY_RANK;
pub use parser::{
    parse_method_signature, parse_type_signature, SignatureParser, MAX_RECURSION_DEPTH,
};
pub use types::*;
