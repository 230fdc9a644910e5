use thiserror::Error;

use crate::metadata::typesystem::ElementType;

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// # Error Categories
///
/// ## File Parsing Errors
/// - [`Error::Malformed`] - Corrupted or invalid file structure
/// - [`Error::OutOfBounds`] - Attempted to read beyond the end of the input, including
///   truncated fixed-size records such as section headers
/// - [`Error::NotSupported`] - Unsupported file format or feature
/// - [`Error::Empty`] - Empty input provided
///
/// ## Signature Errors
/// - [`Error::TruncatedSignature`] - The blob ended in the middle of a signature node
/// - [`Error::InvalidElementType`] - A tag byte that is not a valid element type
/// - [`Error::InvalidCompressedInteger`] - A compressed integer with an invalid width prefix
/// - [`Error::MalformedGenericInstantiation`] - A generic instantiation over a non class/valuetype
/// - [`Error::RecursionLimit`] - Nesting deeper than the supported maximum
/// - [`Error::EncodingInvalid`] - A signature that cannot be represented in the binary format
///
/// ## I/O and External Errors
/// - [`Error::FileError`] - Filesystem I/O errors
/// - [`Error::GoblinErr`] - PE header parsing errors from the goblin crate
///
/// Unresolved type references are not errors: they decode into nodes whose handle reports
/// `is_resolved() == false`.
///
/// # Examples
///
/// ```rust
/// use dotsig::{Error, metadata::signatures::parse_type_signature, metadata::typesystem::NullResolver};
///
/// match parse_type_signature(&[0x0F], &NullResolver) {
///     Err(Error::TruncatedSignature { element_type, offset }) => {
///         println!("{element_type:?} at offset {offset} is incomplete");
///     }
///     other => panic!("unexpected result {other:?}"),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// The file is damaged and could not be parsed.
    ///
    /// The error includes the source location where the malformation was detected for
    /// debugging purposes.
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// An out of bound access was attempted while parsing the input.
    #[error("Out of Bound read would have occurred!")]
    OutOfBounds,

    /// This file type is not supported.
    #[error("This file type is not supported")]
    NotSupported,

    /// Provided input was empty.
    #[error("Provided input was empty")]
    Empty,

    /// File I/O error.
    #[error("{0}")]
    FileError(#[from] std::io::Error),

    /// Error from the goblin crate during PE parsing.
    #[error("{0}")]
    GoblinErr(#[from] goblin::error::Error),

    /// The signature blob ended while a node was only partially decoded.
    ///
    /// `element_type` is the innermost node that could not be completed and `offset` is the
    /// position of its tag byte within the blob.
    #[error("Signature truncated inside {element_type:?} node starting at offset {offset}")]
    TruncatedSignature {
        /// Tag of the node that was being decoded
        element_type: ElementType,
        /// Offset of the node's tag byte
        offset: usize,
    },

    /// A byte in tag position is not a valid element type for a type signature.
    #[error("Invalid element type 0x{value:02X} at offset {offset}")]
    InvalidElementType {
        /// The offending tag byte
        value: u8,
        /// Offset of the tag byte
        offset: usize,
    },

    /// A compressed integer whose first byte does not select a 1, 2 or 4 byte encoding.
    #[error("Invalid compressed integer prefix 0x{first_byte:02X} at offset {offset}")]
    InvalidCompressedInteger {
        /// The first byte of the encoding
        first_byte: u8,
        /// Offset of the first byte
        offset: usize,
    },

    /// The generic type of a `GENERICINST` is not a `CLASS` or `VALUETYPE` signature.
    #[error("Generic instantiation over 0x{found:02X} at offset {offset}, expected CLASS or VALUETYPE")]
    MalformedGenericInstantiation {
        /// Tag byte found in the generic type position
        found: u8,
        /// Offset of that tag byte
        offset: usize,
    },

    /// Recursion limit reached.
    ///
    /// The associated value shows the recursion limit that was reached.
    #[error("Reach the maximum recursion level allowed - {0}")]
    RecursionLimit(usize),

    /// The value can not be represented in the binary signature format.
    #[error("{0}")]
    EncodingInvalid(String),
}
