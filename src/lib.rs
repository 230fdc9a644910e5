// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
//#![deny(unsafe_code)]
// - 'file/physical.rs' uses mmap to map a file into memory

//! # dotsig
//!
//! Decoding, encoding and naming of CLI type signatures, plus the PE section table needed to
//! find them inside a managed binary.
//!
//! Tools that rewrite .NET binaries (deobfuscators, disassemblers, editors) need signatures
//! as structured trees that encode back to exactly the same bytes. `dotsig` provides that
//! tree ([`metadata::signatures::TypeSig`]), a recursive descent decoder and its inverse
//! encoder, and the canonical names of every tree: simple name, namespace, full name,
//! reflection name and assembly-qualified name.
//!
//! ## Quick Start
//!
//! ```rust
//! use dotsig::prelude::*;
//!
//! // GENERICINST CLASS TypeRef(2) 2 int32 int64
//! let blob = [0x15, 0x12, 0x09, 0x02, 0x08, 0x0A];
//! let signature = parse_type_signature(&blob, &NullResolver)?;
//!
//! assert!(signature.is_generic_instance_type());
//! assert_eq!(signature.unresolved_tokens(), vec![Token(0x0100_0002)]);
//! assert_eq!(encode_type_signature(&signature)?, blob);
//! # Ok::<(), dotsig::Error>(())
//! ```
//!
//! ### Resolving tokens
//!
//! Signatures reference types by token. A [`metadata::typesystem::TokenResolver`] maps tokens
//! to the rows behind them; the names of a signature are only as complete as its resolver.
//!
//! ```rust
//! use std::sync::Arc;
//! use dotsig::prelude::*;
//!
//! let mut resolver = MapResolver::new();
//! resolver.insert_type_ref(Arc::new(TypeInfo::new(Token(0x0100_0002), "Acme", "Pair`2")));
//!
//! let signature = parse_type_signature(&[0x15, 0x12, 0x09, 0x02, 0x08, 0x0A], &resolver)?;
//! assert_eq!(signature.full_name(), "Acme.Pair`2<System.Int32,System.Int64>");
//! # Ok::<(), dotsig::Error>(())
//! ```
//!
//! ### Reading signatures from a file
//!
//! ```rust,no_run
//! use dotsig::prelude::*;
//!
//! let file = PeFile::from_file("Library.dll".as_ref())?;
//! for section in file.sections() {
//!     println!("{:8} 0x{:08X} {:?}", section.display_name(), section.virtual_address, section.flags());
//! }
//!
//! for entry in &file.blob_heap()? {
//!     let (offset, data) = entry?;
//!     match parse_type_signature(data, &NullResolver) {
//!         Ok(signature) => println!("0x{offset:06X} {signature}"),
//!         Err(error) => println!("0x{offset:06X} not a type signature: {error}"),
//!     }
//! }
//! # Ok::<(), dotsig::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - [`file`] - PE image access, the section table and bounds-checked readers
//! - [`metadata`] - Tokens, CLR header, metadata root, blob heap, type system, signatures
//! - [`prelude`] - Re-exports of the commonly used types
//! - [`Error`] and [`Result`] - Error handling
//!
//! ## Logging
//!
//! `dotsig` emits diagnostics through the [`log`](https://docs.rs/log) facade: `trace` for
//! every decoded node and blob lookup, `debug` for unresolved tokens, trailing signature
//! bytes and loaded images. No logger is installed by the library.
//!
//! ## Standards Compliance
//!
//! - [ECMA-335 Standard](https://ecma-international.org/wp-content/uploads/ECMA-335_6th_edition_june_2012.pdf), Partition II, 23.2 - Blobs and signatures
//! - [PE Format](https://learn.microsoft.com/en-us/windows/win32/debug/pe-format) - Section table
//!
//! ## Development and Testing
//!
//! ```bash
//! cargo test
//! cargo bench --bench signatures
//! cargo +nightly fuzz run signature --release
//! ```
#[macro_use]
pub(crate) mod error;

/// PE image access: backends, section table, binary readers
pub mod file;

/// Convenient re-exports of the most commonly used types and traits.
///
/// # Example
///
/// ```rust
/// use dotsig::prelude::*;
///
/// let signature = parse_type_signature(&[0x1D, 0x0E], &NullResolver)?;
/// assert_eq!(signature.full_name(), "System.String[]");
/// # Ok::<(), dotsig::Error>(())
/// ```
pub mod prelude;

/// CLI metadata structures, the type system and signatures (ECMA-335)
pub mod metadata;

/// `dotsig` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// `dotsig` Error type
///
/// # Examples
///
/// ```rust
/// use dotsig::{Error, metadata::{signatures::parse_type_signature, typesystem::NullResolver}};
///
/// match parse_type_signature(&[0x15, 0x08], &NullResolver) {
///     Err(Error::MalformedGenericInstantiation { found, offset }) => {
///         println!("generic instantiation over 0x{found:02X} at {offset}");
///     }
///     other => panic!("unexpected result {other:?}"),
/// }
/// ```
pub use error::Error;

/// A loaded PE image, see [`file::PeFile`].
pub use file::PeFile;

/// Bounds-checked little-endian reader, see [`file::parser::Parser`].
pub use file::parser::Parser;
