use std::sync::Arc;

use crate::metadata::{
    identity::AssemblyIdentity,
    signatures::TypeSig,
    token::Token,
};

/// Shared reference to a [`TypeInfo`]
pub type TypeRc = Arc<TypeInfo>;
/// Shared reference to a [`ModuleInfo`]
pub type ModuleRc = Arc<ModuleInfo>;
/// Shared reference to an [`AssemblyIdentity`]
pub type AssemblyRc = Arc<AssemblyIdentity>;
/// Shared reference to a [`TypeSpec`]
pub type TypeSpecRc = Arc<TypeSpec>;

/// A module, optionally belonging to an assembly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleInfo {
    /// File name of the module, e.g. `Library.dll`
    pub name: String,
    /// The assembly whose manifest lists this module
    pub assembly: Option<AssemblyRc>,
}

impl ModuleInfo {
    /// Create a module entry.
    pub fn new(name: impl Into<String>, assembly: Option<AssemblyRc>) -> Self {
        ModuleInfo {
            name: name.into(),
            assembly,
        }
    }
}

/// Where a type reference is resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionScope {
    /// Defined in (or referenced from) this module
    Module(ModuleRc),
    /// Defined in an external assembly
    AssemblyRef(AssemblyRc),
}

impl ResolutionScope {
    /// The assembly behind this scope, if known.
    #[must_use]
    pub fn assembly(&self) -> Option<AssemblyRc> {
        match self {
            ResolutionScope::Module(module) => module.assembly.clone(),
            ResolutionScope::AssemblyRef(assembly) => Some(assembly.clone()),
        }
    }
}

/// A named type: the row behind a `TypeDef` or `TypeRef` token.
///
/// Nested types carry their enclosing type; the resolution scope is only meaningful on
/// the outermost type of such a chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeInfo {
    /// Token of the defining row
    pub token: Token,
    /// Namespace, empty for nested and global types
    pub namespace: String,
    /// Simple name, including the generic arity suffix such as ``List`1``
    pub name: String,
    /// Enclosing type for nested types
    pub enclosing: Option<TypeRc>,
    /// Scope for top level types
    pub scope: Option<ResolutionScope>,
    /// Whether the type derives from `System.ValueType` or `System.Enum`
    pub is_value_type: bool,
}

impl TypeInfo {
    /// Create a top level type without scope.
    pub fn new(token: Token, namespace: impl Into<String>, name: impl Into<String>) -> Self {
        TypeInfo {
            token,
            namespace: namespace.into(),
            name: name.into(),
            enclosing: None,
            scope: None,
            is_value_type: false,
        }
    }

    /// Set the resolution scope.
    #[must_use]
    pub fn with_scope(mut self, scope: ResolutionScope) -> Self {
        self.scope = Some(scope);
        self
    }

    /// Nest this type inside `enclosing`.
    #[must_use]
    pub fn with_enclosing(mut self, enclosing: TypeRc) -> Self {
        self.enclosing = Some(enclosing);
        self
    }

    /// Mark this type as a value type.
    #[must_use]
    pub fn value_type(mut self, is_value_type: bool) -> Self {
        self.is_value_type = is_value_type;
        self
    }

    /// The outermost type of the nesting chain, `self` for top level types.
    #[must_use]
    pub fn outermost(&self) -> &TypeInfo {
        let mut current = self;
        while let Some(enclosing) = &current.enclosing {
            current = enclosing;
        }
        current
    }

    /// Resolution scope of the outermost type.
    #[must_use]
    pub fn resolution_scope(&self) -> Option<&ResolutionScope> {
        self.outermost().scope.as_ref()
    }
}

/// A `TypeSpec` row: a signature that can be referenced by token.
///
/// The row id is the one carried by the root node of the signature.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeSpec {
    /// The decoded signature
    pub signature: TypeSig,
}

impl TypeSpec {
    /// Create a `TypeSpec` row, assigning `rid` to the root of `signature`.
    #[must_use]
    pub fn new(rid: u32, signature: TypeSig) -> Self {
        TypeSpec {
            signature: signature.with_rid(rid),
        }
    }

    /// Row id within the `TypeSpec` table.
    #[must_use]
    pub fn rid(&self) -> u32 {
        self.signature.rid()
    }

    /// `0x1B000000 | rid`
    #[must_use]
    pub fn token(&self) -> Token {
        self.signature.token()
    }
}

/// The target of a `TypeDefOrRef` coded index.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeDefOrRef {
    /// A type defined in this module
    TypeDef(TypeRc),
    /// A reference to a type in another scope
    TypeRef(TypeRc),
    /// A type signature stored in the `TypeSpec` table
    TypeSpec(TypeSpecRc),
}

impl TypeDefOrRef {
    /// The metadata token of the target row.
    #[must_use]
    pub fn token(&self) -> Token {
        match self {
            TypeDefOrRef::TypeDef(info) | TypeDefOrRef::TypeRef(info) => info.token,
            TypeDefOrRef::TypeSpec(spec) => spec.token(),
        }
    }

    /// The named type for `TypeDef` and `TypeRef` targets.
    #[must_use]
    pub fn type_info(&self) -> Option<&TypeRc> {
        match self {
            TypeDefOrRef::TypeDef(info) | TypeDefOrRef::TypeRef(info) => Some(info),
            TypeDefOrRef::TypeSpec(_) => None,
        }
    }
}

/// A `TypeDefOrRef` token together with its resolution, if the resolver knew it.
///
/// Unresolved handles are valid signature content: they encode back to the same token and
/// render with empty names.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeHandle {
    token: Token,
    resolved: Option<TypeDefOrRef>,
}

impl TypeHandle {
    /// A handle for `token` with an optional resolution.
    ///
    /// The token is kept as given, so a handle always encodes back to the bytes it was
    /// decoded from.
    #[must_use]
    pub fn new(token: Token, resolved: Option<TypeDefOrRef>) -> Self {
        TypeHandle { token, resolved }
    }

    /// A handle to a resolved target. The token is taken from the target.
    #[must_use]
    pub fn resolved(target: TypeDefOrRef) -> Self {
        TypeHandle {
            token: target.token(),
            resolved: Some(target),
        }
    }

    /// A handle that only knows its token.
    #[must_use]
    pub fn unresolved(token: Token) -> Self {
        TypeHandle {
            token,
            resolved: None,
        }
    }

    /// The referenced token.
    #[must_use]
    pub fn token(&self) -> Token {
        self.token
    }

    /// Returns `true` if the target is known.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.resolved.is_some()
    }

    /// The resolved target.
    #[must_use]
    pub fn target(&self) -> Option<&TypeDefOrRef> {
        self.resolved.as_ref()
    }

    /// The target if it is a `TypeDef`.
    #[must_use]
    pub fn type_def(&self) -> Option<&TypeRc> {
        match &self.resolved {
            Some(TypeDefOrRef::TypeDef(info)) => Some(info),
            _ => None,
        }
    }

    /// The target if it is a `TypeRef`.
    #[must_use]
    pub fn type_ref(&self) -> Option<&TypeRc> {
        match &self.resolved {
            Some(TypeDefOrRef::TypeRef(info)) => Some(info),
            _ => None,
        }
    }

    /// The target if it is a `TypeSpec`.
    #[must_use]
    pub fn type_spec(&self) -> Option<&TypeSpecRc> {
        match &self.resolved {
            Some(TypeDefOrRef::TypeSpec(spec)) => Some(spec),
            _ => None,
        }
    }
}

impl From<TypeDefOrRef> for TypeHandle {
    fn from(target: TypeDefOrRef) -> Self {
        TypeHandle::resolved(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{
        identity::AssemblyVersion,
        token::{TABLE_TYPE_DEF, TABLE_TYPE_REF},
    };

    #[test]
    fn nested_scope() {
        let assembly = Arc::new(AssemblyIdentity::new("Lib", AssemblyVersion::new(1, 0, 0, 0)));
        let module = Arc::new(ModuleInfo::new("Lib.dll", Some(assembly.clone())));

        let outer = Arc::new(
            TypeInfo::new(Token::from_parts(TABLE_TYPE_DEF, 1), "Ns", "Outer")
                .with_scope(ResolutionScope::Module(module)),
        );
        let inner = TypeInfo::new(Token::from_parts(TABLE_TYPE_DEF, 2), "", "Inner")
            .with_enclosing(outer.clone());

        assert_eq!(inner.outermost().name, "Outer");
        assert_eq!(
            inner.resolution_scope().and_then(ResolutionScope::assembly),
            Some(assembly)
        );
        assert!(outer.enclosing.is_none());
    }

    #[test]
    fn handles() {
        let info = Arc::new(
            TypeInfo::new(Token::from_parts(TABLE_TYPE_REF, 4), "System", "Guid").value_type(true),
        );
        let handle = TypeHandle::resolved(TypeDefOrRef::TypeRef(info.clone()));

        assert!(handle.is_resolved());
        assert_eq!(handle.token(), Token(0x0100_0004));
        assert_eq!(handle.type_ref(), Some(&info));
        assert!(handle.type_def().is_none());
        assert!(handle.type_spec().is_none());

        let unresolved = TypeHandle::unresolved(Token(0x0200_0009));
        assert!(!unresolved.is_resolved());
        assert!(unresolved.target().is_none());
    }

    #[test]
    fn type_spec_token() {
        let spec = TypeSpec::new(7, TypeSig::var(0));
        assert_eq!(spec.rid(), 7);
        assert_eq!(spec.token(), Token(0x1B00_0007));
        assert_eq!(spec.signature.token(), spec.token());
        assert_eq!(
            TypeDefOrRef::TypeSpec(Arc::new(spec)).token(),
            Token(0x1B00_0007)
        );
    }
}
