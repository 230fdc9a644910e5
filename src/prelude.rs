//! # dotsig Prelude
//!
//! This module provides a convenient prelude for the most commonly used types and traits
//! from the dotsig library. Import this module to get quick access to the essential types
//! for decoding, encoding and naming signatures.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all dotsig operations
pub use crate::Error;

/// The result type used throughout dotsig
pub use crate::Result;

// ================================================================================================
// File Access
// ================================================================================================

/// A loaded PE image and the low-level reader
pub use crate::{Parser, PeFile};

/// Section headers and the section table
pub use crate::file::section::{SectionCharacteristics, SectionHeader, SectionTable};

// ================================================================================================
// Metadata
// ================================================================================================

/// Metadata token type and table ids
pub use crate::metadata::token::{Token, TABLE_TYPE_DEF, TABLE_TYPE_REF, TABLE_TYPE_SPEC};

/// Assembly names
pub use crate::metadata::identity::{AssemblyIdentity, AssemblyVersion};

/// CLR header, metadata root and blob heap
pub use crate::metadata::{cor20header::Cor20Header, root::Root, streams::Blob};

// ================================================================================================
// Type System
// ================================================================================================

/// Type rows, handles and element types
pub use crate::metadata::typesystem::{
    CorLibTypes, ElementType, ModuleInfo, ResolutionScope, TypeDefOrRef, TypeDescriptor,
    TypeHandle, TypeInfo, TypeSpec,
};

/// Token resolution
pub use crate::metadata::typesystem::{MapResolver, NullResolver, TokenResolver};

// ================================================================================================
// Signatures
// ================================================================================================

/// Signature model
pub use crate::metadata::signatures::{
    ArraySig, ClassOrValueTypeSig, CorLibSig, GenericInstSig, MethodSig, ModifierSig, ModuleSig,
    TypeSig, TypeSigKind, ValueArraySig, CALLING_CONVENTION,
};

/// Decoding and encoding
pub use crate::metadata::signatures::{
    encode_method_signature, encode_type_signature, parse_method_signature, parse_type_signature,
    SignatureEncoder, SignatureParser, MAX_ARRAY_RANK, MAX_RECURSION_DEPTH,
};

/// Helpers that look through modifiers and pinned
pub use crate::metadata::signatures::{
    remove_modifiers, remove_pinned, remove_pinned_and_modifiers, to_array_sig, to_by_ref_sig,
    to_class_or_value_type_sig, to_class_sig, to_generic_inst_sig, to_generic_mvar,
    to_generic_sig, to_generic_var, to_ptr_sig, to_sz_array_sig, to_type_def_or_ref_sig,
    to_value_type_sig, try_get_type_def, try_get_type_ref, try_get_type_spec,
};
