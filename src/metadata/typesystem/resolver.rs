use std::{collections::HashMap, sync::Arc};

use crate::metadata::{
    token::Token,
    typesystem::{CorLibTypes, ElementType, TypeDefOrRef, TypeRc, TypeSpec},
};

/// Maps tokens found in signatures to type definitions, references and specs.
///
/// This is the seam between the signature codec and whatever owns the metadata tables. The
/// decoder only ever reads through it, so implementations shared between threads need no
/// interior mutability.
pub trait TokenResolver {
    /// Resolve a `TypeDef`, `TypeRef` or `TypeSpec` token. `None` leaves the handle unresolved.
    fn resolve_type(&self, token: Token) -> Option<TypeDefOrRef>;

    /// The core library type for a primitive element type.
    ///
    /// Defaults to [`CorLibTypes::shared`].
    fn corlib_type(&self, element_type: ElementType) -> Option<TypeRc> {
        CorLibTypes::shared().get(element_type).cloned()
    }
}

/// A resolver that knows no tokens. Primitive types still resolve to the shared corlib.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullResolver;

impl TokenResolver for NullResolver {
    fn resolve_type(&self, _token: Token) -> Option<TypeDefOrRef> {
        None
    }
}

/// A resolver backed by an in-memory token map.
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use dotsig::metadata::{
///     signatures::parse_type_signature,
///     token::Token,
///     typesystem::{MapResolver, TypeInfo},
/// };
///
/// let mut resolver = MapResolver::new();
/// resolver.insert_type_ref(Arc::new(TypeInfo::new(Token(0x0100_0001), "Acme", "Widget")));
///
/// let signature = parse_type_signature(&[0x12, 0x05], &resolver)?;
/// assert_eq!(signature.full_name(), "Acme.Widget");
/// # Ok::<(), dotsig::Error>(())
/// ```
#[derive(Debug, Default)]
pub struct MapResolver {
    types: HashMap<Token, TypeDefOrRef>,
    corlib: Option<CorLibTypes>,
}

impl MapResolver {
    /// An empty resolver using the shared corlib.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `corlib` for primitive element types instead of the shared table.
    #[must_use]
    pub fn with_corlib(mut self, corlib: CorLibTypes) -> Self {
        self.corlib = Some(corlib);
        self
    }

    /// Register an arbitrary target under its own token.
    pub fn insert(&mut self, target: TypeDefOrRef) {
        self.types.insert(target.token(), target);
    }

    /// Register a type definition.
    pub fn insert_type_def(&mut self, info: TypeRc) {
        self.insert(TypeDefOrRef::TypeDef(info));
    }

    /// Register a type reference.
    pub fn insert_type_ref(&mut self, info: TypeRc) {
        self.insert(TypeDefOrRef::TypeRef(info));
    }

    /// Register a type spec.
    pub fn insert_type_spec(&mut self, spec: TypeSpec) {
        self.insert(TypeDefOrRef::TypeSpec(Arc::new(spec)));
    }

    /// Number of registered tokens.
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Returns `true` if no token is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl TokenResolver for MapResolver {
    fn resolve_type(&self, token: Token) -> Option<TypeDefOrRef> {
        self.types.get(&token).cloned()
    }

    fn corlib_type(&self, element_type: ElementType) -> Option<TypeRc> {
        self.corlib
            .as_ref()
            .unwrap_or_else(|| CorLibTypes::shared())
            .get(element_type)
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{
        identity::{AssemblyIdentity, AssemblyVersion},
        signatures::TypeSig,
        typesystem::TypeInfo,
    };

    #[test]
    fn null_resolver() {
        assert!(NullResolver.resolve_type(Token(0x0100_0001)).is_none());
        assert_eq!(
            NullResolver.corlib_type(ElementType::I4).unwrap().name,
            "Int32"
        );
    }

    #[test]
    fn map_resolver() {
        let mut resolver = MapResolver::new();
        assert!(resolver.is_empty());

        resolver.insert_type_def(Arc::new(TypeInfo::new(Token(0x0200_0002), "A", "B")));
        resolver.insert_type_spec(TypeSpec::new(1, TypeSig::var(0)));

        assert_eq!(resolver.len(), 2);
        assert!(matches!(
            resolver.resolve_type(Token(0x0200_0002)),
            Some(TypeDefOrRef::TypeDef(_))
        ));
        assert!(matches!(
            resolver.resolve_type(Token(0x1B00_0001)),
            Some(TypeDefOrRef::TypeSpec(_))
        ));
        assert!(resolver.resolve_type(Token(0x0100_0002)).is_none());
    }

    #[test]
    fn map_resolver_corlib() {
        let resolver = MapResolver::new().with_corlib(CorLibTypes::new(AssemblyIdentity::new(
            "System.Runtime",
            AssemblyVersion::new(8, 0, 0, 0),
        )));

        let int32 = resolver.corlib_type(ElementType::I4).unwrap();
        assert_eq!(
            int32.resolution_scope().and_then(|scope| scope.assembly()).unwrap().name,
            "System.Runtime"
        );
        assert!(resolver.corlib_type(ElementType::Class).is_none());
    }
}
