use crate::metadata::{
    token::{Token, TABLE_TYPE_SPEC},
    typesystem::{CorLibTypes, ElementType, TypeHandle, TypeRc},
};

#[allow(non_snake_case, dead_code, missing_docs)]
/// Calling convention bytes of method signatures (II.23.2.1 - II.23.2.3)
pub mod CALLING_CONVENTION {
    pub const DEFAULT: u8 = 0x00;
    pub const C: u8 = 0x01;
    pub const STDCALL: u8 = 0x02;
    pub const THISCALL: u8 = 0x03;
    pub const FASTCALL: u8 = 0x04;
    pub const VARARG: u8 = 0x05;
    pub const FIELD: u8 = 0x06;
    pub const LOCAL_SIG: u8 = 0x07;
    pub const PROPERTY: u8 = 0x08;
    pub const UNMANAGED: u8 = 0x09;
    pub const GENERIC_INST: u8 = 0x0A;
    pub const NATIVEVARARG: u8 = 0x0B;
    // Lower nibble holds the kind, upper bits are flags
    pub const MASK: u8 = 0x0F;
    pub const GENERIC: u8 = 0x10;
    pub const HASTHIS: u8 = 0x20;
    pub const EXPLICITTHIS: u8 = 0x40;
}

/// A decoded type signature node.
///
/// The shape of the node is a [`TypeSigKind`]. Every node also carries a row id used to
/// address it as a `TypeSpec` pseudo-row; decoded and built nodes start at row id 0.
/// Equality compares shapes only, row ids are ignored.
#[derive(Debug, Clone)]
pub struct TypeSig {
    kind: TypeSigKind,
    rid: u32,
}

impl PartialEq for TypeSig {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}

impl From<TypeSigKind> for TypeSig {
    fn from(kind: TypeSigKind) -> Self {
        TypeSig { kind, rid: 0 }
    }
}

/// The variants of a [`TypeSig`] node.
///
/// Leaf variants (`CorLib`, `Class`, `ValueType`, `GenericVar`, `GenericMVar`, `Sentinel`,
/// `FnPtr`, `GenericInst`) terminate the chain; every other variant wraps a `next` type.
/// Trees are plain owned values. Cross references to type rows are shared through `Arc`, so
/// a tree is `Send + Sync` and can be read from any thread.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeSigKind {
    /// A primitive type of the core library (`Void`, `I4`, `String`, `Object`, ...)
    CorLib(CorLibSig),
    /// A reference type named by a `TypeDefOrRef` token
    Class(TypeHandle),
    /// A value type named by a `TypeDefOrRef` token
    ValueType(TypeHandle),
    /// Generic parameter of the enclosing type (`!n`)
    GenericVar(u32),
    /// Generic parameter of the enclosing method (`!!n`)
    GenericMVar(u32),
    /// Start of the variable part of a vararg call site
    Sentinel,
    /// Function pointer with its full method signature
    FnPtr(Box<MethodSig>),
    /// Instantiation of a generic type
    GenericInst(GenericInstSig),
    /// Unmanaged pointer
    Ptr(Box<TypeSig>),
    /// Managed reference
    ByRef(Box<TypeSig>),
    /// Multi-dimensional array
    Array(ArraySig),
    /// Single-dimensional zero-based array
    SzArray(Box<TypeSig>),
    /// Required custom modifier
    CModReqd(ModifierSig),
    /// Optional custom modifier
    CModOpt(ModifierSig),
    /// Pinned local
    Pinned(Box<TypeSig>),
    /// Fixed size value array
    ValueArray(ValueArraySig),
    /// Type scoped to a module
    Module(ModuleSig),
}

/// A primitive type with the core library row it stands for.
#[derive(Debug, Clone, PartialEq)]
pub struct CorLibSig {
    /// The element type tag, one of the primitive tags
    pub element_type: ElementType,
    /// The core library type, `None` if the resolver did not provide one
    pub type_ref: Option<TypeRc>,
}

/// The generic type of a [`GenericInstSig`].
#[derive(Debug, Clone, PartialEq)]
pub enum ClassOrValueTypeSig {
    /// `CLASS` generic type
    Class(TypeHandle),
    /// `VALUETYPE` generic type
    ValueType(TypeHandle),
}

impl ClassOrValueTypeSig {
    /// The referenced generic type.
    #[must_use]
    pub fn handle(&self) -> &TypeHandle {
        match self {
            ClassOrValueTypeSig::Class(handle) | ClassOrValueTypeSig::ValueType(handle) => handle,
        }
    }

    /// `Class` or `ValueType`.
    #[must_use]
    pub fn element_type(&self) -> ElementType {
        match self {
            ClassOrValueTypeSig::Class(_) => ElementType::Class,
            ClassOrValueTypeSig::ValueType(_) => ElementType::ValueType,
        }
    }
}

impl From<ClassOrValueTypeSig> for TypeSig {
    fn from(sig: ClassOrValueTypeSig) -> Self {
        match sig {
            ClassOrValueTypeSig::Class(handle) => TypeSigKind::Class(handle),
            ClassOrValueTypeSig::ValueType(handle) => TypeSigKind::ValueType(handle),
        }
        .into()
    }
}

/// `GENERICINST (CLASS | VALUETYPE) TypeDefOrRef GenArgCount Type*`
#[derive(Debug, Clone, PartialEq)]
pub struct GenericInstSig {
    /// The open generic type
    pub generic_type: ClassOrValueTypeSig,
    /// Arguments in declaration order. The count is not checked against the type's arity.
    pub generic_args: Vec<TypeSig>,
}

impl GenericInstSig {
    /// Replace all generic arguments.
    pub fn set_generic_args(&mut self, args: Vec<TypeSig>) {
        self.generic_args = args;
    }
}

/// `ARRAY Type ArrayShape`
///
/// `sizes` and `lower_bounds` may be shorter than `rank`; missing entries are unspecified.
#[derive(Debug, Clone, PartialEq)]
pub struct ArraySig {
    /// Element type
    pub next: Box<TypeSig>,
    /// Number of dimensions
    pub rank: u32,
    /// Sizes of the leading dimensions
    pub sizes: Vec<u32>,
    /// Lower bounds of the leading dimensions
    pub lower_bounds: Vec<i32>,
}

impl ArraySig {
    /// Replace the rank.
    pub fn set_rank(&mut self, rank: u32) {
        self.rank = rank;
    }

    /// Replace all sizes.
    pub fn set_sizes(&mut self, sizes: Vec<u32>) {
        self.sizes = sizes;
    }

    /// Replace all lower bounds.
    pub fn set_lower_bounds(&mut self, lower_bounds: Vec<i32>) {
        self.lower_bounds = lower_bounds;
    }
}

/// `CMOD_REQD` / `CMOD_OPT` with the modifier type and the modified type.
#[derive(Debug, Clone, PartialEq)]
pub struct ModifierSig {
    /// The modifier type, e.g. `System.Runtime.CompilerServices.IsVolatile`
    pub modifier: TypeHandle,
    /// The modified type
    pub next: Box<TypeSig>,
}

/// `VALUEARRAY Type Size`
#[derive(Debug, Clone, PartialEq)]
pub struct ValueArraySig {
    /// Element type
    pub next: Box<TypeSig>,
    /// Number of elements
    pub size: u32,
}

/// `MODULE Index Type`
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleSig {
    /// Module index
    pub index: u32,
    /// The scoped type
    pub next: Box<TypeSig>,
}

/// A method signature, as embedded in `FNPTR` or stored in a `MethodDef`/`MemberRef` blob.
///
/// `params` holds the fixed parameters. For vararg call sites the parameters following the
/// sentinel are kept separately in `params_after_sentinel`; the sentinel itself is not a
/// parameter and is not counted.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodSig {
    /// Raw calling convention byte, see [`CALLING_CONVENTION`]
    pub calling_convention: u8,
    /// Number of generic parameters, only encoded if the `GENERIC` flag is set
    pub generic_param_count: u32,
    /// Return type
    pub ret_type: TypeSig,
    /// Fixed parameters
    pub params: Vec<TypeSig>,
    /// Parameters after the sentinel, `None` if the signature has no sentinel
    pub params_after_sentinel: Option<Vec<TypeSig>>,
}

impl MethodSig {
    /// A `DEFAULT` method signature.
    #[must_use]
    pub fn new(ret_type: TypeSig, params: Vec<TypeSig>) -> Self {
        MethodSig {
            calling_convention: CALLING_CONVENTION::DEFAULT,
            generic_param_count: 0,
            ret_type,
            params,
            params_after_sentinel: None,
        }
    }

    /// The calling convention kind without flags.
    #[must_use]
    pub fn kind(&self) -> u8 {
        self.calling_convention & CALLING_CONVENTION::MASK
    }

    /// `HASTHIS` is set.
    #[must_use]
    pub fn has_this(&self) -> bool {
        self.calling_convention & CALLING_CONVENTION::HASTHIS != 0
    }

    /// `EXPLICITTHIS` is set.
    #[must_use]
    pub fn explicit_this(&self) -> bool {
        self.calling_convention & CALLING_CONVENTION::EXPLICITTHIS != 0
    }

    /// `GENERIC` is set.
    #[must_use]
    pub fn is_generic(&self) -> bool {
        self.calling_convention & CALLING_CONVENTION::GENERIC != 0
    }

    /// The kind is `VARARG` or `NATIVEVARARG`.
    #[must_use]
    pub fn is_vararg(&self) -> bool {
        matches!(
            self.kind(),
            CALLING_CONVENTION::VARARG | CALLING_CONVENTION::NATIVEVARARG
        )
    }

    /// Number of parameters as stored in the blob: fixed plus variable ones.
    #[must_use]
    pub fn param_count(&self) -> usize {
        self.params.len() + self.params_after_sentinel.as_ref().map_or(0, Vec::len)
    }
}

impl TypeSig {
    /// A primitive of the shared core library.
    ///
    /// Non primitive tags produce a node without type reference that the encoder rejects.
    #[must_use]
    pub fn corlib(element_type: ElementType) -> Self {
        TypeSigKind::CorLib(CorLibSig {
            element_type,
            type_ref: CorLibTypes::shared().get(element_type).cloned(),
        })
        .into()
    }

    /// `CLASS handle`
    #[must_use]
    pub fn class(handle: TypeHandle) -> Self {
        TypeSigKind::Class(handle).into()
    }

    /// `VALUETYPE handle`
    #[must_use]
    pub fn value_type(handle: TypeHandle) -> Self {
        TypeSigKind::ValueType(handle).into()
    }

    /// `VAR index`
    #[must_use]
    pub fn var(index: u32) -> Self {
        TypeSigKind::GenericVar(index).into()
    }

    /// `MVAR index`
    #[must_use]
    pub fn mvar(index: u32) -> Self {
        TypeSigKind::GenericMVar(index).into()
    }

    /// `PTR next`
    #[must_use]
    pub fn ptr(next: TypeSig) -> Self {
        TypeSigKind::Ptr(Box::new(next)).into()
    }

    /// `BYREF next`
    #[must_use]
    pub fn by_ref(next: TypeSig) -> Self {
        TypeSigKind::ByRef(Box::new(next)).into()
    }

    /// `SZARRAY next`
    #[must_use]
    pub fn sz_array(next: TypeSig) -> Self {
        TypeSigKind::SzArray(Box::new(next)).into()
    }

    /// `PINNED next`
    #[must_use]
    pub fn pinned(next: TypeSig) -> Self {
        TypeSigKind::Pinned(Box::new(next)).into()
    }

    /// `CMOD_REQD modifier next`
    #[must_use]
    pub fn cmod_reqd(modifier: TypeHandle, next: TypeSig) -> Self {
        TypeSigKind::CModReqd(ModifierSig {
            modifier,
            next: Box::new(next),
        })
        .into()
    }

    /// `CMOD_OPT modifier next`
    #[must_use]
    pub fn cmod_opt(modifier: TypeHandle, next: TypeSig) -> Self {
        TypeSigKind::CModOpt(ModifierSig {
            modifier,
            next: Box::new(next),
        })
        .into()
    }

    /// `ARRAY next rank sizes lower_bounds`
    #[must_use]
    pub fn array(next: TypeSig, rank: u32, sizes: Vec<u32>, lower_bounds: Vec<i32>) -> Self {
        TypeSigKind::Array(ArraySig {
            next: Box::new(next),
            rank,
            sizes,
            lower_bounds,
        })
        .into()
    }

    /// `GENERICINST generic_type args`
    #[must_use]
    pub fn generic_inst(generic_type: ClassOrValueTypeSig, generic_args: Vec<TypeSig>) -> Self {
        TypeSigKind::GenericInst(GenericInstSig {
            generic_type,
            generic_args,
        })
        .into()
    }

    /// `SENTINEL`
    #[must_use]
    pub fn sentinel() -> Self {
        TypeSigKind::Sentinel.into()
    }

    /// `FNPTR method`
    #[must_use]
    pub fn fn_ptr(method: MethodSig) -> Self {
        TypeSigKind::FnPtr(Box::new(method)).into()
    }

    /// `VALUEARRAY next size`
    #[must_use]
    pub fn value_array(next: TypeSig, size: u32) -> Self {
        TypeSigKind::ValueArray(ValueArraySig {
            next: Box::new(next),
            size,
        })
        .into()
    }

    /// `MODULE index next`
    #[must_use]
    pub fn module(index: u32, next: TypeSig) -> Self {
        TypeSigKind::Module(ModuleSig {
            index,
            next: Box::new(next),
        })
        .into()
    }

    /// The shape of this node.
    #[must_use]
    pub fn kind(&self) -> &TypeSigKind {
        &self.kind
    }

    /// Mutable access to the shape, e.g. to replace argument lists in place.
    pub fn kind_mut(&mut self) -> &mut TypeSigKind {
        &mut self.kind
    }

    /// Consume the node and return its shape. The row id is dropped.
    #[must_use]
    pub fn into_kind(self) -> TypeSigKind {
        self.kind
    }

    /// Row id of this node in the `TypeSpec` pseudo-table, 0 if it was never assigned.
    #[must_use]
    pub fn rid(&self) -> u32 {
        self.rid
    }

    /// Assign the row id.
    pub fn set_rid(&mut self, rid: u32) {
        self.rid = rid;
    }

    /// This node with row id `rid`.
    #[must_use]
    pub fn with_rid(mut self, rid: u32) -> Self {
        self.rid = rid;
        self
    }

    /// The synthetic token `0x1B000000 | rid` identifying this node.
    ///
    /// Distinct nodes are told apart by their row ids, not by the types they name; see
    /// [`TypeSig::leaf_token`] for the token of the named type.
    #[must_use]
    pub fn token(&self) -> Token {
        Token::from_parts(TABLE_TYPE_SPEC, self.rid)
    }

    /// The element type tag of this node.
    #[must_use]
    pub fn element_type(&self) -> ElementType {
        match self.kind() {
            TypeSigKind::CorLib(sig) => sig.element_type,
            TypeSigKind::Class(_) => ElementType::Class,
            TypeSigKind::ValueType(_) => ElementType::ValueType,
            TypeSigKind::GenericVar(_) => ElementType::Var,
            TypeSigKind::GenericMVar(_) => ElementType::MVar,
            TypeSigKind::Sentinel => ElementType::Sentinel,
            TypeSigKind::FnPtr(_) => ElementType::FnPtr,
            TypeSigKind::GenericInst(_) => ElementType::GenericInst,
            TypeSigKind::Ptr(_) => ElementType::Ptr,
            TypeSigKind::ByRef(_) => ElementType::ByRef,
            TypeSigKind::Array(_) => ElementType::Array,
            TypeSigKind::SzArray(_) => ElementType::SzArray,
            TypeSigKind::CModReqd(_) => ElementType::CModReqd,
            TypeSigKind::CModOpt(_) => ElementType::CModOpt,
            TypeSigKind::Pinned(_) => ElementType::Pinned,
            TypeSigKind::ValueArray(_) => ElementType::ValueArray,
            TypeSigKind::Module(_) => ElementType::Module,
        }
    }

    /// The wrapped type of non-leaf nodes.
    #[must_use]
    pub fn next(&self) -> Option<&TypeSig> {
        match self.kind() {
            TypeSigKind::Ptr(next)
            | TypeSigKind::ByRef(next)
            | TypeSigKind::SzArray(next)
            | TypeSigKind::Pinned(next) => Some(next.as_ref()),
            TypeSigKind::Array(sig) => Some(sig.next.as_ref()),
            TypeSigKind::CModReqd(sig) | TypeSigKind::CModOpt(sig) => Some(sig.next.as_ref()),
            TypeSigKind::ValueArray(sig) => Some(sig.next.as_ref()),
            TypeSigKind::Module(sig) => Some(sig.next.as_ref()),
            _ => None,
        }
    }

    /// The innermost node of the `next` chain.
    #[must_use]
    pub fn leaf(&self) -> &TypeSig {
        let mut current = self;
        while let Some(next) = current.next() {
            current = next;
        }
        current
    }

    /// Returns `true` for leaf nodes.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.next().is_none()
    }

    /// `CorLib`, `Class` or `ValueType`.
    #[must_use]
    pub fn is_type_def_or_ref(&self) -> bool {
        matches!(
            self.kind(),
            TypeSigKind::CorLib(_) | TypeSigKind::Class(_) | TypeSigKind::ValueType(_)
        )
    }

    /// A core library primitive.
    #[must_use]
    pub fn is_corlib_type(&self) -> bool {
        matches!(self.kind(), TypeSigKind::CorLib(_))
    }

    /// `CLASS` node.
    #[must_use]
    pub fn is_class_sig(&self) -> bool {
        matches!(self.kind(), TypeSigKind::Class(_))
    }

    /// `VALUETYPE` node.
    #[must_use]
    pub fn is_value_type_sig(&self) -> bool {
        matches!(self.kind(), TypeSigKind::ValueType(_))
    }

    /// `VAR` or `MVAR`.
    #[must_use]
    pub fn is_generic_parameter(&self) -> bool {
        matches!(self.kind(), TypeSigKind::GenericVar(_) | TypeSigKind::GenericMVar(_))
    }

    /// `VAR`.
    #[must_use]
    pub fn is_generic_type_parameter(&self) -> bool {
        matches!(self.kind(), TypeSigKind::GenericVar(_))
    }

    /// `MVAR`.
    #[must_use]
    pub fn is_generic_method_parameter(&self) -> bool {
        matches!(self.kind(), TypeSigKind::GenericMVar(_))
    }

    /// `SENTINEL`.
    #[must_use]
    pub fn is_sentinel(&self) -> bool {
        matches!(self.kind(), TypeSigKind::Sentinel)
    }

    /// `FNPTR`.
    #[must_use]
    pub fn is_function_pointer(&self) -> bool {
        matches!(self.kind(), TypeSigKind::FnPtr(_))
    }

    /// `GENERICINST`.
    #[must_use]
    pub fn is_generic_instance_type(&self) -> bool {
        matches!(self.kind(), TypeSigKind::GenericInst(_))
    }

    /// `PTR`.
    #[must_use]
    pub fn is_pointer(&self) -> bool {
        matches!(self.kind(), TypeSigKind::Ptr(_))
    }

    /// `BYREF`.
    #[must_use]
    pub fn is_by_ref(&self) -> bool {
        matches!(self.kind(), TypeSigKind::ByRef(_))
    }

    /// `ARRAY`.
    #[must_use]
    pub fn is_array(&self) -> bool {
        matches!(self.kind(), TypeSigKind::Array(_))
    }

    /// `SZARRAY`.
    #[must_use]
    pub fn is_sz_array(&self) -> bool {
        matches!(self.kind(), TypeSigKind::SzArray(_))
    }

    /// `CMOD_REQD` or `CMOD_OPT`.
    #[must_use]
    pub fn is_modifier(&self) -> bool {
        matches!(self.kind(), TypeSigKind::CModReqd(_) | TypeSigKind::CModOpt(_))
    }

    /// `CMOD_REQD`.
    #[must_use]
    pub fn is_required_modifier(&self) -> bool {
        matches!(self.kind(), TypeSigKind::CModReqd(_))
    }

    /// `CMOD_OPT`.
    #[must_use]
    pub fn is_optional_modifier(&self) -> bool {
        matches!(self.kind(), TypeSigKind::CModOpt(_))
    }

    /// `PINNED`.
    #[must_use]
    pub fn is_pinned(&self) -> bool {
        matches!(self.kind(), TypeSigKind::Pinned(_))
    }

    /// `VALUEARRAY`.
    #[must_use]
    pub fn is_value_array(&self) -> bool {
        matches!(self.kind(), TypeSigKind::ValueArray(_))
    }

    /// `MODULE`.
    #[must_use]
    pub fn is_module_sig(&self) -> bool {
        matches!(self.kind(), TypeSigKind::Module(_))
    }

    /// Number of generic arguments once modifiers and pinned are stripped, 0 if this is not
    /// a generic instantiation.
    #[must_use]
    pub fn number_of_generic_parameters(&self) -> usize {
        match super::remove_pinned_and_modifiers(self).kind() {
            TypeSigKind::GenericInst(sig) => sig.generic_args.len(),
            _ => 0,
        }
    }

    /// All `TypeDefOrRef` tokens in the tree that the resolver could not resolve, in
    /// encoding order.
    #[must_use]
    pub fn unresolved_tokens(&self) -> Vec<Token> {
        let mut tokens = Vec::new();
        self.collect_unresolved(&mut tokens);
        tokens
    }

    fn collect_unresolved(&self, tokens: &mut Vec<Token>) {
        fn push(handle: &TypeHandle, tokens: &mut Vec<Token>) {
            if !handle.is_resolved() {
                tokens.push(handle.token());
            }
        }

        match self.kind() {
            TypeSigKind::Class(handle) | TypeSigKind::ValueType(handle) => push(handle, tokens),
            TypeSigKind::CModReqd(sig) | TypeSigKind::CModOpt(sig) => {
                push(&sig.modifier, tokens);
                sig.next.collect_unresolved(tokens);
            }
            TypeSigKind::GenericInst(sig) => {
                push(sig.generic_type.handle(), tokens);
                for arg in &sig.generic_args {
                    arg.collect_unresolved(tokens);
                }
            }
            TypeSigKind::FnPtr(method) => {
                method.ret_type.collect_unresolved(tokens);
                for param in method
                    .params
                    .iter()
                    .chain(method.params_after_sentinel.iter().flatten())
                {
                    param.collect_unresolved(tokens);
                }
            }
            _ => {
                if let Some(next) = self.next() {
                    next.collect_unresolved(tokens);
                }
            }
        }
    }
}
