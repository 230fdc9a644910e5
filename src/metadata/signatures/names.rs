//! Name derivation and ownership queries for signatures and type rows.
//!
//! Names are built by walking the tree outward-in: the leaf type is written first, then each
//! wrapper appends its suffix. Unresolved handles contribute empty names. Walking is bounded
//! by [`MAX_RECURSION_DEPTH`]; deeper trees render `<<<INFRECURSION>>>` at the cut. Array
//! shapes render at most [`MAX_ARRAY_RANK`] dimensions followed by `<<<RANK>>>`.
//!
//! | Node           | Full name                  | Reflection full name |
//! |----------------|----------------------------|----------------------|
//! | `PTR`          | `T*`                       | `T*`                 |
//! | `BYREF`        | `T&`                       | `T&`                 |
//! | `SZARRAY`      | `T[]`                      | `T[]`                |
//! | `ARRAY` rank 2 | `T[0..4,0...]`             | `T[,]`               |
//! | `GENERICINST`  | `G<A,B>`                   | `G[[A, Asm],[B, Asm]]` |
//! | `CMOD_REQD`    | `T modreq(M)`              | `T`                  |
//! | `PINNED`       | `T pinned`                 | `T`                  |
//! | `FNPTR`        | `method R *(P1,...,V1)`    | `(fnptr)`            |

use std::fmt::{self, Write};

use crate::metadata::{
    identity::AssemblyIdentity,
    signatures::{
        remove_pinned_and_modifiers, ArraySig, ClassOrValueTypeSig, MethodSig, TypeSig,
        TypeSigKind, MAX_RECURSION_DEPTH,
    },
    token::Token,
    typesystem::{
        AssemblyRc, ModuleRc, ResolutionScope, TypeDefOrRef, TypeDescriptor, TypeHandle,
        TypeInfo, TypeSpec,
    },
};

const RECURSION_MARKER: &str = "<<<INFRECURSION>>>";

/// Dimensions rendered for a multi-dimensional array; the runtime rejects higher ranks.
pub const MAX_ARRAY_RANK: u32 = 32;

const RANK_MARKER: &str = "<<<RANK>>>";

/// Append `id`, escaping the characters with a meaning in reflection names if asked to.
fn push_identifier(out: &mut String, id: &str, reflection: bool) {
    for c in id.chars() {
        if reflection && matches!(c, ',' | '+' | '&' | '*' | '[' | ']' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
}

fn escaped(id: &str) -> String {
    let mut out = String::with_capacity(id.len());
    push_identifier(&mut out, id, true);
    out
}

struct FullNameBuilder {
    out: String,
    reflection: bool,
    depth: usize,
}

impl FullNameBuilder {
    fn new(reflection: bool) -> Self {
        FullNameBuilder {
            out: String::new(),
            reflection,
            depth: 0,
        }
    }

    fn finish(self) -> String {
        self.out
    }

    fn signature(&mut self, sig: &TypeSig) {
        if self.depth >= MAX_RECURSION_DEPTH {
            self.out.push_str(RECURSION_MARKER);
            return;
        }

        self.depth += 1;
        match sig.kind() {
            TypeSigKind::CorLib(corlib) => match &corlib.type_ref {
                Some(info) => self.type_info(info),
                None => {
                    if let Some((namespace, name)) = corlib.element_type.corlib_name() {
                        let _ = write!(self.out, "{namespace}.{name}");
                    }
                }
            },
            TypeSigKind::Class(handle) | TypeSigKind::ValueType(handle) => self.handle(handle),
            TypeSigKind::GenericVar(index) => {
                let _ = write!(self.out, "!{index}");
            }
            TypeSigKind::GenericMVar(index) => {
                let _ = write!(self.out, "!!{index}");
            }
            TypeSigKind::Sentinel => self.out.push_str("<<<SENTINEL>>>"),
            TypeSigKind::FnPtr(method) => {
                if self.reflection {
                    self.out.push_str("(fnptr)");
                } else {
                    self.method(method);
                }
            }
            TypeSigKind::GenericInst(inst) => {
                self.handle(inst.generic_type.handle());
                self.generic_args(&inst.generic_args);
            }
            TypeSigKind::Ptr(next) => {
                self.signature(next);
                self.out.push('*');
            }
            TypeSigKind::ByRef(next) => {
                self.signature(next);
                self.out.push('&');
            }
            TypeSigKind::SzArray(next) => {
                self.signature(next);
                self.out.push_str("[]");
            }
            TypeSigKind::Array(array) => {
                self.signature(&array.next);
                self.array_shape(array);
            }
            TypeSigKind::CModReqd(modifier) | TypeSigKind::CModOpt(modifier) => {
                self.signature(&modifier.next);
                if !self.reflection {
                    self.out.push_str(if sig.is_required_modifier() {
                        " modreq("
                    } else {
                        " modopt("
                    });
                    self.handle(&modifier.modifier);
                    self.out.push(')');
                }
            }
            TypeSigKind::Pinned(next) => {
                self.signature(next);
                if !self.reflection {
                    self.out.push_str(" pinned");
                }
            }
            TypeSigKind::ValueArray(array) => {
                self.signature(&array.next);
                let _ = write!(self.out, " ValueArray({})", array.size);
            }
            TypeSigKind::Module(module) => {
                let _ = write!(self.out, "[module:{}]", module.index);
                self.signature(&module.next);
            }
        }
        self.depth -= 1;
    }

    fn handle(&mut self, handle: &TypeHandle) {
        match handle.target() {
            Some(TypeDefOrRef::TypeDef(info) | TypeDefOrRef::TypeRef(info)) => {
                self.type_info(info);
            }
            Some(TypeDefOrRef::TypeSpec(spec)) => self.signature(&spec.signature),
            None => {}
        }
    }

    fn type_info(&mut self, info: &TypeInfo) {
        match &info.enclosing {
            Some(enclosing) => {
                self.type_info(enclosing);
                self.out.push(if self.reflection { '+' } else { '.' });
            }
            None => {
                if !info.namespace.is_empty() {
                    push_identifier(&mut self.out, &info.namespace, self.reflection);
                    self.out.push('.');
                }
            }
        }
        push_identifier(&mut self.out, &info.name, self.reflection);
    }

    fn generic_args(&mut self, args: &[TypeSig]) {
        if self.reflection {
            self.out.push('[');
            for (i, arg) in args.iter().enumerate() {
                if i != 0 {
                    self.out.push(',');
                }
                self.out.push('[');
                self.signature(arg);
                if let Some(assembly) = definition_assembly(arg) {
                    self.out.push_str(", ");
                    self.out.push_str(&assembly.display_name());
                }
                self.out.push(']');
            }
            self.out.push(']');
        } else {
            self.out.push('<');
            for (i, arg) in args.iter().enumerate() {
                if i != 0 {
                    self.out.push(',');
                }
                self.signature(arg);
            }
            self.out.push('>');
        }
    }

    fn array_shape(&mut self, array: &ArraySig) {
        self.out.push('[');
        match array.rank {
            0 => self.out.push_str("<RANK0>"),
            1 => self.out.push('*'),
            rank => {
                for i in 0..rank.min(MAX_ARRAY_RANK) as usize {
                    if i != 0 {
                        self.out.push(',');
                    }
                    if self.reflection {
                        continue;
                    }
                    if let Some(&lower) = array.lower_bounds.get(i) {
                        let _ = write!(self.out, "{lower}..");
                        match array.sizes.get(i) {
                            Some(&size) => {
                                let upper = i64::from(lower) + i64::from(size) - 1;
                                let _ = write!(self.out, "{upper}");
                            }
                            None => self.out.push('.'),
                        }
                    }
                }
                if rank > MAX_ARRAY_RANK {
                    self.out.push(',');
                    self.out.push_str(RANK_MARKER);
                }
            }
        }
        self.out.push(']');
    }

    fn method(&mut self, method: &MethodSig) {
        self.out.push_str("method ");
        self.signature(&method.ret_type);
        self.out.push_str(" *");

        if method.is_generic() {
            self.out.push('<');
            for i in 0..method.generic_param_count {
                if i != 0 {
                    self.out.push(',');
                }
                let _ = write!(self.out, "!!{i}");
            }
            self.out.push('>');
        }

        self.out.push('(');
        let mut printed = false;
        for param in &method.params {
            if printed {
                self.out.push(',');
            }
            self.signature(param);
            printed = true;
        }
        if let Some(varargs) = &method.params_after_sentinel {
            if printed {
                self.out.push(',');
            }
            self.out.push_str("...");
            for param in varargs {
                self.out.push(',');
                self.signature(param);
            }
        }
        self.out.push(')');
    }
}

/// The node that names the type: the leaf, or the generic type of an instantiation.
enum NamedLeaf<'a> {
    Info(&'a TypeInfo),
    Spec(&'a TypeSpec),
    CorLibFallback(&'static str, &'static str),
    Other(&'a TypeSigKind),
    Unresolved,
}

fn named_leaf(sig: &TypeSig) -> NamedLeaf<'_> {
    fn from_handle(handle: &TypeHandle) -> NamedLeaf<'_> {
        match handle.target() {
            Some(TypeDefOrRef::TypeDef(info) | TypeDefOrRef::TypeRef(info)) => {
                NamedLeaf::Info(info)
            }
            Some(TypeDefOrRef::TypeSpec(spec)) => NamedLeaf::Spec(spec),
            None => NamedLeaf::Unresolved,
        }
    }

    match sig.leaf().kind() {
        TypeSigKind::CorLib(corlib) => match (&corlib.type_ref, corlib.element_type.corlib_name()) {
            (Some(info), _) => NamedLeaf::Info(info),
            (None, Some((namespace, name))) => NamedLeaf::CorLibFallback(namespace, name),
            (None, None) => NamedLeaf::Unresolved,
        },
        TypeSigKind::Class(handle) | TypeSigKind::ValueType(handle) => from_handle(handle),
        TypeSigKind::GenericInst(inst) => from_handle(inst.generic_type.handle()),
        other => NamedLeaf::Other(other),
    }
}

fn definition_assembly(sig: &TypeSig) -> Option<AssemblyRc> {
    scope(sig).and_then(|scope| scope.assembly())
}

fn scope(sig: &TypeSig) -> Option<ResolutionScope> {
    match named_leaf(sig) {
        NamedLeaf::Info(info) => info.resolution_scope().cloned(),
        NamedLeaf::Spec(spec) => scope(&spec.signature),
        _ => None,
    }
}

impl TypeSig {
    /// The simple name of the leaf type, without wrapper suffixes.
    ///
    /// Generic parameters render as `!n` / `!!n`, function pointers as `(fnptr)`.
    ///
    /// ```rust
    /// use dotsig::metadata::{signatures::parse_type_signature, typesystem::NullResolver};
    ///
    /// let signature = parse_type_signature(&[0x0F, 0x1D, 0x08], &NullResolver)?;
    /// assert_eq!(signature.name(), "Int32");
    /// # Ok::<(), dotsig::Error>(())
    /// ```
    #[must_use]
    pub fn name(&self) -> String {
        match named_leaf(self) {
            NamedLeaf::Info(info) => info.name.clone(),
            NamedLeaf::Spec(spec) => spec.signature.name(),
            NamedLeaf::CorLibFallback(_, name) => name.to_string(),
            NamedLeaf::Other(TypeSigKind::GenericVar(index)) => format!("!{index}"),
            NamedLeaf::Other(TypeSigKind::GenericMVar(index)) => format!("!!{index}"),
            NamedLeaf::Other(TypeSigKind::Sentinel) => "<<<SENTINEL>>>".to_string(),
            NamedLeaf::Other(TypeSigKind::FnPtr(_)) => "(fnptr)".to_string(),
            NamedLeaf::Other(_) | NamedLeaf::Unresolved => String::new(),
        }
    }

    /// The namespace of the leaf type. Pointers, arrays and other wrappers are transparent.
    #[must_use]
    pub fn namespace(&self) -> String {
        match named_leaf(self) {
            NamedLeaf::Info(info) => info.outermost().namespace.clone(),
            NamedLeaf::Spec(spec) => spec.signature.namespace(),
            NamedLeaf::CorLibFallback(namespace, _) => namespace.to_string(),
            NamedLeaf::Other(_) | NamedLeaf::Unresolved => String::new(),
        }
    }

    /// [`TypeSig::name`] with the reflection special characters escaped.
    #[must_use]
    pub fn reflection_name(&self) -> String {
        match named_leaf(self) {
            NamedLeaf::Info(info) => escaped(&info.name),
            NamedLeaf::Spec(spec) => spec.signature.reflection_name(),
            _ => self.name(),
        }
    }

    /// [`TypeSig::namespace`] with the reflection special characters escaped.
    #[must_use]
    pub fn reflection_namespace(&self) -> String {
        match named_leaf(self) {
            NamedLeaf::Info(info) => escaped(&info.outermost().namespace),
            NamedLeaf::Spec(spec) => spec.signature.reflection_namespace(),
            _ => self.namespace(),
        }
    }

    /// The display name, e.g. `System.Collections.Generic.List`1<System.Int32>[]`.
    #[must_use]
    pub fn full_name(&self) -> String {
        let mut builder = FullNameBuilder::new(false);
        builder.signature(self);
        builder.finish()
    }

    /// The reflection name, e.g. `Outer+Inner[[System.Int32, mscorlib, ...]]`.
    #[must_use]
    pub fn reflection_full_name(&self) -> String {
        let mut builder = FullNameBuilder::new(true);
        builder.signature(self);
        builder.finish()
    }

    /// The reflection name, followed by `, ` and the defining assembly if it is known.
    #[must_use]
    pub fn assembly_qualified_name(&self) -> String {
        qualify(self.reflection_full_name(), self.definition_assembly().as_deref())
    }

    /// Value type classification.
    ///
    /// Modifiers and pinned are stripped first; a generic instantiation is a value type if
    /// its generic type is encoded as `VALUETYPE`. Everything else is classified by tag.
    #[must_use]
    pub fn is_value_type(&self) -> bool {
        let sig = remove_pinned_and_modifiers(self);
        match sig.kind() {
            TypeSigKind::GenericInst(inst) => {
                matches!(inst.generic_type, ClassOrValueTypeSig::ValueType(_))
            }
            _ => sig.element_type().is_value_type(),
        }
    }

    /// The token of the type this signature names: the core library row, the `TypeDefOrRef`
    /// token, or the generic type of an instantiation. `None` for generic parameters,
    /// sentinels and function pointers.
    ///
    /// Unlike [`TypeSig::token`], wrappers are transparent: `int32*` and `int32` share it.
    #[must_use]
    pub fn leaf_token(&self) -> Option<Token> {
        match self.leaf().kind() {
            TypeSigKind::CorLib(corlib) => corlib.type_ref.as_ref().map(|info| info.token),
            TypeSigKind::Class(handle) | TypeSigKind::ValueType(handle) => Some(handle.token()),
            TypeSigKind::GenericInst(inst) => Some(inst.generic_type.handle().token()),
            _ => None,
        }
    }

    /// The assembly defining the leaf type.
    #[must_use]
    pub fn definition_assembly(&self) -> Option<AssemblyRc> {
        definition_assembly(self)
    }

    /// The resolution scope of the leaf type.
    #[must_use]
    pub fn scope(&self) -> Option<ResolutionScope> {
        scope(self)
    }

    /// The `TypeDef` or `TypeRef` the leaf type resolves to, looking through type specs.
    #[must_use]
    pub fn scope_type(&self) -> Option<TypeDefOrRef> {
        match self.leaf().kind() {
            TypeSigKind::CorLib(corlib) => corlib.type_ref.clone().map(TypeDefOrRef::TypeRef),
            TypeSigKind::Class(handle) | TypeSigKind::ValueType(handle) => {
                handle_scope_type(handle)
            }
            TypeSigKind::GenericInst(inst) => handle_scope_type(inst.generic_type.handle()),
            _ => None,
        }
    }

    /// The module the leaf type lives in, if its scope is a module.
    #[must_use]
    pub fn owner_module(&self) -> Option<ModuleRc> {
        match self.scope()? {
            ResolutionScope::Module(module) => Some(module),
            ResolutionScope::AssemblyRef(_) => None,
        }
    }
}

fn handle_scope_type(handle: &TypeHandle) -> Option<TypeDefOrRef> {
    match handle.target()? {
        TypeDefOrRef::TypeSpec(spec) => spec.signature.scope_type(),
        other => Some(other.clone()),
    }
}

impl fmt::Display for TypeSig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_name())
    }
}

impl TypeDescriptor for TypeSig {
    fn token(&self) -> Option<Token> {
        Some(TypeSig::token(self))
    }

    fn name(&self) -> String {
        TypeSig::name(self)
    }

    fn namespace(&self) -> String {
        TypeSig::namespace(self)
    }

    fn reflection_name(&self) -> String {
        TypeSig::reflection_name(self)
    }

    fn reflection_namespace(&self) -> String {
        TypeSig::reflection_namespace(self)
    }

    fn full_name(&self) -> String {
        TypeSig::full_name(self)
    }

    fn reflection_full_name(&self) -> String {
        TypeSig::reflection_full_name(self)
    }

    fn assembly_qualified_name(&self) -> String {
        TypeSig::assembly_qualified_name(self)
    }

    fn is_value_type(&self) -> bool {
        TypeSig::is_value_type(self)
    }

    fn definition_assembly(&self) -> Option<AssemblyRc> {
        TypeSig::definition_assembly(self)
    }

    fn scope(&self) -> Option<ResolutionScope> {
        TypeSig::scope(self)
    }
}

impl TypeDescriptor for TypeInfo {
    fn token(&self) -> Option<Token> {
        Some(self.token)
    }

    fn name(&self) -> String {
        self.name.clone()
    }

    fn namespace(&self) -> String {
        self.outermost().namespace.clone()
    }

    fn reflection_name(&self) -> String {
        escaped(&self.name)
    }

    fn reflection_namespace(&self) -> String {
        escaped(&self.outermost().namespace)
    }

    fn full_name(&self) -> String {
        let mut builder = FullNameBuilder::new(false);
        builder.type_info(self);
        builder.finish()
    }

    fn reflection_full_name(&self) -> String {
        let mut builder = FullNameBuilder::new(true);
        builder.type_info(self);
        builder.finish()
    }

    fn assembly_qualified_name(&self) -> String {
        qualify(self.reflection_full_name(), self.definition_assembly().as_deref())
    }

    fn is_value_type(&self) -> bool {
        self.is_value_type
    }

    fn definition_assembly(&self) -> Option<AssemblyRc> {
        self.resolution_scope().and_then(ResolutionScope::assembly)
    }

    fn scope(&self) -> Option<ResolutionScope> {
        self.resolution_scope().cloned()
    }
}

impl TypeDescriptor for TypeSpec {
    fn token(&self) -> Option<Token> {
        Some(TypeSpec::token(self))
    }

    fn name(&self) -> String {
        self.signature.name()
    }

    fn namespace(&self) -> String {
        self.signature.namespace()
    }

    fn reflection_name(&self) -> String {
        self.signature.reflection_name()
    }

    fn reflection_namespace(&self) -> String {
        self.signature.reflection_namespace()
    }

    fn full_name(&self) -> String {
        self.signature.full_name()
    }

    fn reflection_full_name(&self) -> String {
        self.signature.reflection_full_name()
    }

    fn assembly_qualified_name(&self) -> String {
        self.signature.assembly_qualified_name()
    }

    fn is_value_type(&self) -> bool {
        self.signature.is_value_type()
    }

    fn definition_assembly(&self) -> Option<AssemblyRc> {
        self.signature.definition_assembly()
    }

    fn scope(&self) -> Option<ResolutionScope> {
        self.signature.scope()
    }
}

impl TypeDescriptor for TypeDefOrRef {
    fn token(&self) -> Option<Token> {
        Some(TypeDefOrRef::token(self))
    }

    fn name(&self) -> String {
        self.descriptor().name()
    }

    fn namespace(&self) -> String {
        self.descriptor().namespace()
    }

    fn reflection_name(&self) -> String {
        self.descriptor().reflection_name()
    }

    fn reflection_namespace(&self) -> String {
        self.descriptor().reflection_namespace()
    }

    fn full_name(&self) -> String {
        self.descriptor().full_name()
    }

    fn reflection_full_name(&self) -> String {
        self.descriptor().reflection_full_name()
    }

    fn assembly_qualified_name(&self) -> String {
        self.descriptor().assembly_qualified_name()
    }

    fn is_value_type(&self) -> bool {
        self.descriptor().is_value_type()
    }

    fn definition_assembly(&self) -> Option<AssemblyRc> {
        self.descriptor().definition_assembly()
    }

    fn scope(&self) -> Option<ResolutionScope> {
        self.descriptor().scope()
    }
}

impl TypeDefOrRef {
    fn descriptor(&self) -> &dyn TypeDescriptor {
        match self {
            TypeDefOrRef::TypeDef(info) | TypeDefOrRef::TypeRef(info) => info.as_ref(),
            TypeDefOrRef::TypeSpec(spec) => spec.as_ref(),
        }
    }
}

fn qualify(mut name: String, assembly: Option<&AssemblyIdentity>) -> String {
    if let Some(assembly) = assembly {
        name.push_str(", ");
        name.push_str(&assembly.display_name());
    }
    name
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::metadata::{
        identity::AssemblyVersion,
        signatures::{parse_type_signature, CALLING_CONVENTION},
        token::{TABLE_TYPE_DEF, TABLE_TYPE_REF},
        typesystem::{ElementType, MapResolver, ModuleInfo, NullResolver},
    };

    const MSCORLIB: &str =
        "mscorlib, Version=4.0.0.0, Culture=neutral, PublicKeyToken=b77a5c561934e089";

    fn library() -> AssemblyRc {
        Arc::new(AssemblyIdentity::new("Library", AssemblyVersion::new(1, 2, 0, 0)))
    }

    fn type_ref(row: u32, namespace: &str, name: &str) -> Arc<TypeInfo> {
        Arc::new(
            TypeInfo::new(Token::from_parts(TABLE_TYPE_REF, row), namespace, name)
                .with_scope(ResolutionScope::AssemblyRef(library())),
        )
    }

    fn class(info: &Arc<TypeInfo>) -> TypeHandle {
        TypeHandle::resolved(TypeDefOrRef::TypeRef(info.clone()))
    }

    fn parse(data: &[u8]) -> TypeSig {
        parse_type_signature(data, &NullResolver).unwrap()
    }

    #[test]
    fn primitives_and_wrappers() {
        assert_eq!(parse(&[0x08]).full_name(), "System.Int32");
        assert_eq!(parse(&[0x0F, 0x08]).full_name(), "System.Int32*");
        assert_eq!(parse(&[0x1D, 0x08]).full_name(), "System.Int32[]");
        assert_eq!(parse(&[0x10, 0x0E]).full_name(), "System.String&");
        assert_eq!(parse(&[0x10, 0x0E]).to_string(), "System.String&");

        let sig = parse(&[0x0F, 0x1D, 0x0A]);
        assert_eq!(sig.name(), "Int64");
        assert_eq!(sig.namespace(), "System");
        assert_eq!(sig.reflection_full_name(), "System.Int64[]*");
        assert_eq!(
            sig.assembly_qualified_name(),
            format!("System.Int64[]*, {MSCORLIB}")
        );
    }

    #[test]
    fn generic_instance() {
        let foo = type_ref(1, "", "Foo");
        let sig = TypeSig::generic_inst(
            ClassOrValueTypeSig::Class(class(&foo)),
            vec![TypeSig::corlib(ElementType::I4), TypeSig::corlib(ElementType::I8)],
        );

        assert_eq!(sig.full_name(), "Foo<System.Int32,System.Int64>");
        assert_eq!(sig.name(), "Foo");
        assert_eq!(
            sig.reflection_full_name(),
            format!("Foo[[System.Int32, {MSCORLIB}],[System.Int64, {MSCORLIB}]]")
        );
        assert_eq!(
            sig.assembly_qualified_name(),
            format!(
                "Foo[[System.Int32, {MSCORLIB}],[System.Int64, {MSCORLIB}]], \
                 Library, Version=1.2.0.0, Culture=neutral, PublicKeyToken=null"
            )
        );
        assert!(!sig.is_value_type());
        assert_eq!(sig.leaf_token(), Some(Token(0x0100_0001)));
    }

    #[test]
    fn nested_types() {
        let module = Arc::new(ModuleInfo::new("Library.dll", Some(library())));
        let outer = Arc::new(
            TypeInfo::new(Token::from_parts(TABLE_TYPE_DEF, 1), "Acme.Tools", "Outer")
                .with_scope(ResolutionScope::Module(module.clone())),
        );
        let inner = Arc::new(
            TypeInfo::new(Token::from_parts(TABLE_TYPE_DEF, 2), "", "Inner")
                .with_enclosing(outer)
                .value_type(true),
        );
        let sig = TypeSig::by_ref(TypeSig::value_type(TypeHandle::resolved(
            TypeDefOrRef::TypeDef(inner.clone()),
        )));

        assert_eq!(sig.full_name(), "Acme.Tools.Outer.Inner&");
        assert_eq!(sig.reflection_full_name(), "Acme.Tools.Outer+Inner&");
        assert_eq!(sig.namespace(), "Acme.Tools");
        assert_eq!(sig.name(), "Inner");
        assert_eq!(sig.owner_module(), Some(module));
        assert!(matches!(sig.scope_type(), Some(TypeDefOrRef::TypeDef(_))));

        assert_eq!(inner.full_name(), "Acme.Tools.Outer.Inner");
        assert_eq!(
            inner.assembly_qualified_name(),
            "Acme.Tools.Outer+Inner, Library, Version=1.2.0.0, Culture=neutral, PublicKeyToken=null"
        );
        assert_eq!(TypeDescriptor::namespace(inner.as_ref()), "Acme.Tools");
    }

    #[test]
    fn arrays() {
        // int32[0..4,2...]
        let sig = parse(&[0x14, 0x08, 0x02, 0x01, 0x05, 0x02, 0x00, 0x04]);
        assert_eq!(sig.full_name(), "System.Int32[0..4,2...]");
        assert_eq!(sig.reflection_full_name(), "System.Int32[,]");

        let sig = TypeSig::array(TypeSig::corlib(ElementType::U1), 3, vec![], vec![]);
        assert_eq!(sig.full_name(), "System.Byte[,,]");
        let sig = TypeSig::array(TypeSig::corlib(ElementType::U1), 1, vec![2], vec![0]);
        assert_eq!(sig.full_name(), "System.Byte[*]");
        let sig = TypeSig::array(TypeSig::corlib(ElementType::U1), 0, vec![], vec![]);
        assert_eq!(sig.full_name(), "System.Byte[<RANK0>]");
    }

    #[test]
    fn huge_ranks_are_cut() {
        // rank 0x1FFFFFFF without sizes or bounds
        let sig = parse(&[0x14, 0x08, 0xDF, 0xFF, 0xFF, 0xFF, 0x00, 0x00]);

        assert_eq!(
            sig.full_name(),
            format!("System.Int32[{}<<<RANK>>>]", ",".repeat(MAX_ARRAY_RANK as usize))
        );
        assert!(sig.reflection_full_name().ends_with(",<<<RANK>>>]"));

        let byte = TypeSig::corlib(ElementType::U1);
        let sig = TypeSig::array(byte, MAX_ARRAY_RANK, vec![], vec![]);
        assert!(!sig.full_name().contains(RANK_MARKER));
    }

    #[test]
    fn reflection_names_are_escaped() {
        let odd = type_ref(6, "Acme+Gen", "Pair[A,B]");
        let sig = TypeSig::sz_array(TypeSig::class(class(&odd)));

        assert_eq!(sig.name(), "Pair[A,B]");
        assert_eq!(sig.reflection_name(), "Pair\\[A\\,B\\]");
        assert_eq!(sig.namespace(), "Acme+Gen");
        assert_eq!(sig.reflection_namespace(), "Acme\\+Gen");
        assert_eq!(sig.full_name(), "Acme+Gen.Pair[A,B][]");
        assert_eq!(sig.reflection_full_name(), "Acme\\+Gen.Pair\\[A\\,B\\][]");
        assert_eq!(
            TypeDescriptor::reflection_name(odd.as_ref()),
            "Pair\\[A\\,B\\]"
        );

        assert_eq!(TypeSig::var(0).reflection_name(), "!0");
        assert_eq!(TypeSig::corlib(ElementType::I4).reflection_name(), "Int32");
        assert_eq!(
            TypeSig::corlib(ElementType::I4).reflection_namespace(),
            "System"
        );
    }

    #[test]
    fn modifiers_and_pinned() {
        let volatile = type_ref(3, "System.Runtime.CompilerServices", "IsVolatile");
        let sig = TypeSig::pinned(TypeSig::cmod_reqd(
            class(&volatile),
            TypeSig::corlib(ElementType::I4),
        ));

        assert_eq!(
            sig.full_name(),
            "System.Int32 modreq(System.Runtime.CompilerServices.IsVolatile) pinned"
        );
        assert_eq!(sig.reflection_full_name(), "System.Int32");
        assert!(sig.is_value_type());

        let sig = TypeSig::cmod_opt(class(&volatile), TypeSig::corlib(ElementType::Object));
        assert!(sig.full_name().ends_with("modopt(System.Runtime.CompilerServices.IsVolatile)"));
        assert!(!sig.is_value_type());
    }

    #[test]
    fn generic_parameters_and_rare_nodes() {
        assert_eq!(TypeSig::var(0).full_name(), "!0");
        assert_eq!(TypeSig::sz_array(TypeSig::mvar(2)).full_name(), "!!2[]");
        assert_eq!(TypeSig::mvar(2).name(), "!!2");
        assert_eq!(TypeSig::var(1).namespace(), "");
        assert!(TypeSig::var(1).leaf_token().is_none());
        assert!(TypeSig::var(1).definition_assembly().is_none());
        assert_eq!(
            TypeSig::value_array(TypeSig::corlib(ElementType::U1), 16).full_name(),
            "System.Byte ValueArray(16)"
        );
        assert_eq!(
            TypeSig::module(1, TypeSig::corlib(ElementType::I4)).full_name(),
            "[module:1]System.Int32"
        );
    }

    #[test]
    fn function_pointers() {
        let mut method = MethodSig::new(
            TypeSig::corlib(ElementType::Void),
            vec![TypeSig::corlib(ElementType::I4)],
        );
        method.calling_convention = CALLING_CONVENTION::VARARG;
        method.params_after_sentinel = Some(vec![TypeSig::corlib(ElementType::String)]);
        let sig = TypeSig::fn_ptr(method);

        assert_eq!(
            sig.full_name(),
            "method System.Void *(System.Int32,...,System.String)"
        );
        assert_eq!(sig.reflection_full_name(), "(fnptr)");
        assert_eq!(sig.name(), "(fnptr)");
        assert!(!sig.is_value_type());
    }

    #[test]
    fn unresolved_names_are_empty() {
        let sig = parse(&[0x1D, 0x12, 0x05]);
        assert_eq!(sig.full_name(), "[]");
        assert_eq!(sig.name(), "");
        assert_eq!(sig.namespace(), "");
        assert_eq!(sig.assembly_qualified_name(), "[]");
        assert_eq!(sig.leaf_token(), Some(Token(0x0100_0001)));
    }

    #[test]
    fn type_spec_targets() {
        let list = type_ref(4, "System.Collections.Generic", "List`1");
        let spec = Arc::new(TypeSpec::new(
            1,
            TypeSig::generic_inst(
                ClassOrValueTypeSig::Class(class(&list)),
                vec![TypeSig::corlib(ElementType::String)],
            ),
        ));

        let mut resolver = MapResolver::new();
        resolver.insert(TypeDefOrRef::TypeSpec(spec.clone()));

        // CLASS TypeSpec(1) = (1 << 2) | 2
        let sig = parse_type_signature(&[0x12, 0x06], &resolver).unwrap();
        assert_eq!(
            sig.full_name(),
            "System.Collections.Generic.List`1<System.String>"
        );
        assert_eq!(sig.namespace(), "System.Collections.Generic");
        assert_eq!(sig.definition_assembly(), Some(library()));
        assert!(matches!(sig.scope_type(), Some(TypeDefOrRef::TypeRef(_))));
        assert_eq!(sig.leaf_token(), Some(Token(0x1B00_0001)));

        let target = TypeDefOrRef::TypeSpec(spec);
        assert_eq!(target.name(), "List`1");
        assert_eq!(TypeDescriptor::token(&target), Some(Token(0x1B00_0001)));
    }

    #[test]
    fn value_type_classification() {
        let guid = type_ref(5, "System", "Guid");
        let nullable = TypeSig::generic_inst(
            ClassOrValueTypeSig::ValueType(class(&guid)),
            vec![TypeSig::corlib(ElementType::I4)],
        );
        assert!(nullable.is_value_type());
        assert!(TypeSig::cmod_opt(class(&guid), nullable).is_value_type());
        assert!(TypeSig::value_type(TypeHandle::unresolved(Token(0x0100_0009))).is_value_type());
        assert!(!TypeSig::ptr(TypeSig::corlib(ElementType::I4)).is_value_type());
        assert!(!TypeSig::corlib(ElementType::String).is_value_type());
        assert!(TypeSig::corlib(ElementType::TypedByRef).is_value_type());
        assert!(TypeSig::value_array(TypeSig::corlib(ElementType::U1), 16).is_value_type());
    }

    #[test]
    fn recursion_guard() {
        let mut sig = TypeSig::corlib(ElementType::I4);
        for _ in 0..MAX_RECURSION_DEPTH + 5 {
            sig = TypeSig::ptr(sig);
        }
        assert!(sig.full_name().starts_with(RECURSION_MARKER));
    }
}
