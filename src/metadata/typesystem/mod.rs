//! The type rows signatures point at, and how signatures reach them.
//!
//! A decoded signature refers to types in two ways: primitive tags such as `I4` stand for a
//! well-known core library type, and `CLASS` / `VALUETYPE` / modifier nodes carry a
//! `TypeDefOrRef` token. This module models the rows behind both and the seam that maps
//! tokens to rows.
//!
//! # Key Components
//!
//! - [`ElementType`]: The element type tags of ECMA-335 II.23.1.16
//! - [`TypeInfo`], [`TypeSpec`], [`TypeDefOrRef`]: The rows a token can name
//! - [`TypeHandle`]: A token plus its resolution, if any
//! - [`CorLibTypes`]: Core library types for the primitive tags
//! - [`TokenResolver`]: Resolution seam, with [`MapResolver`] and [`NullResolver`]
//! - [`TypeDescriptor`]: Names and classification shared by signatures and rows
//!
//! # Examples
//!
//! ```rust
//! use std::sync::Arc;
//! use dotsig::metadata::{
//!     signatures::parse_type_signature,
//!     token::Token,
//!     typesystem::{MapResolver, TypeDescriptor, TypeInfo},
//! };
//!
//! let mut resolver = MapResolver::new();
//! let outer = Arc::new(TypeInfo::new(Token(0x0200_0001), "Acme", "Outer"));
//! resolver.insert_type_def(Arc::new(
//!     TypeInfo::new(Token(0x0200_0002), "", "Inner").with_enclosing(outer),
//! ));
//!
//! // Inner[], with Inner a TypeDef at row 2
//! let signature = parse_type_signature(&[0x1D, 0x12, 0x08], &resolver)?;
//! assert_eq!(signature.full_name(), "Acme.Outer.Inner[]");
//! assert_eq!(signature.reflection_full_name(), "Acme.Outer+Inner[]");
//! assert_eq!(TypeDescriptor::namespace(&signature), "Acme");
//! # Ok::<(), dotsig::Error>(())
//! ```

mod base;
mod primitives;
mod resolver;
mod types;

pub use base::ElementType;
pub use primitives::CorLibTypes;
pub use resolver::{MapResolver, NullResolver, TokenResolver};
pub use types::{
    AssemblyRc, ModuleInfo, ModuleRc, ResolutionScope, TypeDefOrRef, TypeHandle, TypeInfo,
    TypeRc, TypeSpec, TypeSpecRc,
};

use crate::metadata::token::Token;

/// The capabilities every type-like entity offers: identity, names, value type
/// classification and ownership.
///
/// Implemented by [`crate::metadata::signatures::TypeSig`], [`TypeDefOrRef`], [`TypeSpec`]
/// and [`TypeInfo`]. None of the methods fail; missing information yields empty strings or
/// `None`.
pub trait TypeDescriptor {
    /// The metadata token identifying this entity, if it has one.
    fn token(&self) -> Option<Token>;

    /// The simple name, e.g. `Int32` or ``List`1``.
    fn name(&self) -> String;

    /// The namespace, taken from the outermost enclosing type for nested types.
    fn namespace(&self) -> String;

    /// The simple name with the reflection special characters `,+&*[]\` escaped.
    fn reflection_name(&self) -> String;

    /// The namespace with the reflection special characters escaped.
    fn reflection_namespace(&self) -> String;

    /// The display name: namespace, `.` between nested types, `<A,B>` generic arguments.
    fn full_name(&self) -> String;

    /// The reflection name: escaped identifiers, `+` between nested types,
    /// `[[A, Asm],[B, Asm]]` generic arguments, no modifiers.
    fn reflection_full_name(&self) -> String;

    /// The reflection name followed by the display name of the defining assembly.
    fn assembly_qualified_name(&self) -> String;

    /// Returns `true` for value types.
    fn is_value_type(&self) -> bool;

    /// The assembly that defines the type, if known.
    fn definition_assembly(&self) -> Option<AssemblyRc>;

    /// The resolution scope of the type, if known.
    fn scope(&self) -> Option<ResolutionScope>;
}
