use log::{debug, trace};

use crate::{
    file::parser::Parser,
    metadata::{
        signatures::{
            ArraySig, ClassOrValueTypeSig, CorLibSig, GenericInstSig, MethodSig, ModifierSig,
            ModuleSig, TypeSig, TypeSigKind, ValueArraySig, CALLING_CONVENTION,
        },
        token::Token,
        typesystem::{ElementType, TokenResolver, TypeHandle},
    },
    Error::{
        InvalidElementType, MalformedGenericInstantiation, OutOfBounds, RecursionLimit,
        TruncatedSignature,
    },
    Result,
};

/// Maximum nesting depth of signature nodes, for decoding and for name derivation
pub const MAX_RECURSION_DEPTH: usize = 50;

/// Recursive descent decoder for type and method signatures (ECMA-335 II.23.2).
///
/// The parser consumes a self-delimiting prefix of its input. Tokens are resolved through
/// the given [`TokenResolver`]; tokens it does not know stay in the tree as unresolved
/// [`TypeHandle`]s.
///
/// # Example
///
/// ```rust
/// use dotsig::metadata::{signatures::SignatureParser, typesystem::NullResolver};
///
/// // string[]
/// let mut parser = SignatureParser::new(&[0x1D, 0x0E], &NullResolver);
/// let signature = parser.parse_type()?;
/// assert_eq!(signature.full_name(), "System.String[]");
/// assert_eq!(parser.pos(), 2);
/// # Ok::<(), dotsig::Error>(())
/// ```
///
/// ## Notes:
/// - Use one parser per signature; the recursion depth is tracked per instance.
pub struct SignatureParser<'a, 'r> {
    parser: Parser<'a>,
    resolver: &'r dyn TokenResolver,
    depth: usize,
}

impl<'a, 'r> SignatureParser<'a, 'r> {
    /// Create a new `SignatureParser` over `data`.
    ///
    /// ## Arguments
    /// * 'data'     - The signature bytes, without the blob length prefix
    /// * 'resolver' - Resolves `TypeDefOrRef` tokens and core library types
    #[must_use]
    pub fn new(data: &'a [u8], resolver: &'r dyn TokenResolver) -> Self {
        SignatureParser {
            parser: Parser::new(data),
            resolver,
            depth: 0,
        }
    }

    /// Current offset within the signature.
    #[must_use]
    pub fn pos(&self) -> usize {
        self.parser.pos()
    }

    /// Returns `true` if unread bytes remain.
    #[must_use]
    pub fn has_more_data(&self) -> bool {
        self.parser.has_more_data()
    }

    /// Decode one type, starting at the current position.
    ///
    /// # Errors
    /// - [`crate::Error::OutOfBounds`] if there is no tag byte left at all
    /// - [`crate::Error::TruncatedSignature`] if the data ends inside a node; the error names
    ///   the innermost node that was being decoded
    /// - [`crate::Error::InvalidElementType`] for unknown tags and `End`, `R`, `Internal`
    /// - [`crate::Error::InvalidCompressedInteger`] for a bad integer prefix
    /// - [`crate::Error::MalformedGenericInstantiation`] if a generic instantiation is not
    ///   over a class or value type
    /// - [`crate::Error::RecursionLimit`] if nesting exceeds [`MAX_RECURSION_DEPTH`]
    pub fn parse_type(&mut self) -> Result<TypeSig> {
        if self.depth >= MAX_RECURSION_DEPTH {
            return Err(RecursionLimit(MAX_RECURSION_DEPTH));
        }

        let offset = self.parser.pos();
        let value = self.parser.read_le::<u8>()?;
        let element_type = match ElementType::from_byte(value) {
            Some(element_type) if element_type.is_valid_in_type() => element_type,
            _ => return Err(InvalidElementType { value, offset }),
        };

        trace!("signature node {:?} at offset {}", element_type, offset);

        self.depth += 1;
        let result = self.parse_body(element_type).map(TypeSig::from);
        self.depth -= 1;

        result.map_err(|error| match error {
            OutOfBounds => TruncatedSignature {
                element_type,
                offset,
            },
            other => other,
        })
    }

    fn parse_body(&mut self, element_type: ElementType) -> Result<TypeSigKind> {
        match element_type {
            ElementType::Ptr => Ok(TypeSigKind::Ptr(Box::new(self.parse_type()?))),
            ElementType::ByRef => Ok(TypeSigKind::ByRef(Box::new(self.parse_type()?))),
            ElementType::SzArray => Ok(TypeSigKind::SzArray(Box::new(self.parse_type()?))),
            ElementType::Pinned => Ok(TypeSigKind::Pinned(Box::new(self.parse_type()?))),
            ElementType::ValueType => Ok(TypeSigKind::ValueType(self.parse_handle()?)),
            ElementType::Class => Ok(TypeSigKind::Class(self.parse_handle()?)),
            ElementType::Var => Ok(TypeSigKind::GenericVar(
                self.parser.read_compressed_uint()?,
            )),
            ElementType::MVar => Ok(TypeSigKind::GenericMVar(
                self.parser.read_compressed_uint()?,
            )),
            ElementType::Sentinel => Ok(TypeSigKind::Sentinel),
            ElementType::Array => {
                let next = Box::new(self.parse_type()?);
                let rank = self.parser.read_compressed_uint()?;

                let mut sizes = Vec::new();
                let mut lower_bounds = Vec::new();
                // A rank of zero has no shape lists
                if rank > 0 {
                    let num_sizes = self.parser.read_compressed_uint()?;
                    for _ in 0..num_sizes {
                        sizes.push(self.parser.read_compressed_uint()?);
                    }

                    let num_lo_bounds = self.parser.read_compressed_uint()?;
                    for _ in 0..num_lo_bounds {
                        lower_bounds.push(self.parser.read_compressed_int()?);
                    }
                }

                Ok(TypeSigKind::Array(ArraySig {
                    next,
                    rank,
                    sizes,
                    lower_bounds,
                }))
            }
            ElementType::GenericInst => {
                let offset = self.parser.pos();
                let found = self.parser.peek_byte()?;

                let generic_type = match ElementType::from_byte(found) {
                    Some(ElementType::Class) => {
                        self.parser.advance()?;
                        ClassOrValueTypeSig::Class(self.parse_handle()?)
                    }
                    Some(ElementType::ValueType) => {
                        self.parser.advance()?;
                        ClassOrValueTypeSig::ValueType(self.parse_handle()?)
                    }
                    _ => return Err(MalformedGenericInstantiation { found, offset }),
                };

                let arg_count = self.parser.read_compressed_uint()?;
                let mut generic_args = Vec::new();
                for _ in 0..arg_count {
                    generic_args.push(self.parse_type()?);
                }

                Ok(TypeSigKind::GenericInst(GenericInstSig {
                    generic_type,
                    generic_args,
                }))
            }
            ElementType::FnPtr => Ok(TypeSigKind::FnPtr(Box::new(
                self.parse_method_signature()?,
            ))),
            ElementType::CModReqd => Ok(TypeSigKind::CModReqd(self.parse_modifier()?)),
            ElementType::CModOpt => Ok(TypeSigKind::CModOpt(self.parse_modifier()?)),
            ElementType::ValueArray => {
                let next = Box::new(self.parse_type()?);
                let size = self.parser.read_compressed_uint()?;

                Ok(TypeSigKind::ValueArray(ValueArraySig { next, size }))
            }
            ElementType::Module => {
                let index = self.parser.read_compressed_uint()?;
                let next = Box::new(self.parse_type()?);

                Ok(TypeSigKind::Module(ModuleSig { index, next }))
            }
            primitive => Ok(TypeSigKind::CorLib(CorLibSig {
                element_type: primitive,
                type_ref: self.resolver.corlib_type(primitive),
            })),
        }
    }

    /// Read a `TypeDefOrRef` coded index and resolve it
    fn parse_handle(&mut self) -> Result<TypeHandle> {
        let token = self.parser.read_compressed_token()?;
        Ok(self.resolve(token))
    }

    fn resolve(&self, token: Token) -> TypeHandle {
        let resolved = self.resolver.resolve_type(token);
        if resolved.is_none() {
            debug!("unresolved type token {}", token);
        }

        TypeHandle::new(token, resolved)
    }

    fn parse_modifier(&mut self) -> Result<ModifierSig> {
        let modifier = self.parse_handle()?;
        let next = Box::new(self.parse_type()?);

        Ok(ModifierSig { modifier, next })
    }

    /// Decode a method signature - `MethodDefSig`, `MethodRefSig`, `StandAloneMethodSig` or
    /// the body of a function pointer.
    ///
    /// Parameters following a `SENTINEL` are collected into
    /// [`MethodSig::params_after_sentinel`]; the sentinel does not count as a parameter.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] for calling conventions that do not introduce a
    /// method signature, plus the errors of [`SignatureParser::parse_type`].
    pub fn parse_method_signature(&mut self) -> Result<MethodSig> {
        let calling_convention = self.parser.read_le::<u8>()?;
        match calling_convention & CALLING_CONVENTION::MASK {
            CALLING_CONVENTION::DEFAULT..=CALLING_CONVENTION::VARARG
            | CALLING_CONVENTION::PROPERTY
            | CALLING_CONVENTION::UNMANAGED
            | CALLING_CONVENTION::NATIVEVARARG => {}
            _ => {
                return Err(malformed_error!(
                    "Invalid calling convention for a method signature - 0x{:02X}",
                    calling_convention
                ))
            }
        }

        let generic_param_count = if calling_convention & CALLING_CONVENTION::GENERIC != 0 {
            self.parser.read_compressed_uint()?
        } else {
            0
        };

        let param_count = self.parser.read_compressed_uint()?;
        let ret_type = self.parse_type()?;

        let mut params = Vec::new();
        let mut params_after_sentinel: Option<Vec<TypeSig>> = None;
        for _ in 0..param_count {
            if params_after_sentinel.is_none()
                && self.parser.peek_byte()? == ElementType::Sentinel.to_byte()
            {
                self.parser.advance()?;
                params_after_sentinel = Some(Vec::new());
            }

            let param = self.parse_type()?;
            match params_after_sentinel.as_mut() {
                Some(varargs) => varargs.push(param),
                None => params.push(param),
            }
        }

        Ok(MethodSig {
            calling_convention,
            generic_param_count,
            ret_type,
            params,
            params_after_sentinel,
        })
    }
}

/// Decode a type signature from `data`, e.g. the content of a `TypeSpec` blob.
///
/// Bytes following the signature are ignored.
///
/// # Errors
/// See [`SignatureParser::parse_type`].
///
/// # Examples
///
/// ```rust
/// use dotsig::metadata::{signatures::parse_type_signature, typesystem::NullResolver};
///
/// let signature = parse_type_signature(&[0x0F, 0x08], &NullResolver)?;
/// assert_eq!(signature.full_name(), "System.Int32*");
/// # Ok::<(), dotsig::Error>(())
/// ```
pub fn parse_type_signature(data: &[u8], resolver: &dyn TokenResolver) -> Result<TypeSig> {
    let mut parser = SignatureParser::new(data, resolver);
    let signature = parser.parse_type()?;

    if parser.has_more_data() {
        debug!(
            "{} trailing bytes after type signature",
            data.len() - parser.pos()
        );
    }

    Ok(signature)
}

/// Decode a method signature from `data`.
///
/// # Errors
/// See [`SignatureParser::parse_method_signature`].
pub fn parse_method_signature(data: &[u8], resolver: &dyn TokenResolver) -> Result<MethodSig> {
    let mut parser = SignatureParser::new(data, resolver);
    let signature = parser.parse_method_signature()?;

    if parser.has_more_data() {
        debug!(
            "{} trailing bytes after method signature",
            data.len() - parser.pos()
        );
    }

    Ok(signature)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        metadata::typesystem::{MapResolver, NullResolver, TypeDefOrRef, TypeInfo},
        Error,
    };

    fn parse(data: &[u8]) -> Result<TypeSig> {
        parse_type_signature(data, &NullResolver)
    }

    #[test]
    fn primitives() {
        let int32 = parse(&[0x08]).unwrap();
        assert_eq!(int32, TypeSig::corlib(ElementType::I4));

        for (byte, name) in [
            (0x01, "Void"),
            (0x0E, "String"),
            (0x16, "TypedReference"),
            (0x18, "IntPtr"),
            (0x1C, "Object"),
        ] {
            let TypeSigKind::CorLib(sig) = parse(&[byte]).unwrap().into_kind() else {
                panic!("expected corlib node for 0x{byte:02X}");
            };
            assert_eq!(sig.type_ref.unwrap().name, name);
        }
    }

    #[test]
    fn wrappers() {
        assert_eq!(
            parse(&[0x0F, 0x08]).unwrap(),
            TypeSig::ptr(TypeSig::corlib(ElementType::I4))
        );
        assert_eq!(
            parse(&[0x10, 0x1D, 0x0E]).unwrap(),
            TypeSig::by_ref(TypeSig::sz_array(TypeSig::corlib(ElementType::String)))
        );
        assert_eq!(
            parse(&[0x45, 0x13, 0x02]).unwrap(),
            TypeSig::pinned(TypeSig::var(2))
        );
        assert_eq!(parse(&[0x1E, 0x81, 0x00]).unwrap(), TypeSig::mvar(0x100));
    }

    #[test]
    fn class_tokens() {
        let mut resolver = MapResolver::new();
        let info = Arc::new(TypeInfo::new(Token(0x0100_0005), "System", "Guid").value_type(true));
        resolver.insert_type_ref(info.clone());

        // 0x15 = (5 << 2) | 1
        let sig = parse_type_signature(&[0x11, 0x15], &resolver).unwrap();
        let TypeSigKind::ValueType(handle) = sig.kind() else {
            panic!("expected value type");
        };
        assert_eq!(handle.target(), Some(&TypeDefOrRef::TypeRef(info)));
        assert!(sig.unresolved_tokens().is_empty());

        // TypeDef row 3, unknown to the resolver
        let sig = parse_type_signature(&[0x12, 0x0C], &resolver).unwrap();
        assert_eq!(sig.unresolved_tokens(), vec![Token(0x0200_0003)]);

        // reserved tag 3
        assert!(matches!(
            parse(&[0x12, 0x07]),
            Err(Error::Malformed { .. })
        ));
    }

    #[test]
    fn arrays() {
        // int32[0..4, 2...]
        let sig = parse(&[0x14, 0x08, 0x02, 0x01, 0x05, 0x02, 0x00, 0x04]).unwrap();
        let TypeSigKind::Array(array) = sig.kind() else {
            panic!("expected array");
        };
        assert_eq!(array.rank, 2);
        assert_eq!(array.sizes, vec![5]);
        assert_eq!(array.lower_bounds, vec![0, 2]);

        // negative lower bound
        let sig = parse(&[0x14, 0x08, 0x01, 0x00, 0x01, 0x7B]).unwrap();
        assert_eq!(to_bounds(&sig), vec![-3]);

        // rank zero stops after the rank
        let sig = parse(&[0x14, 0x08, 0x00]).unwrap();
        assert_eq!(sig, TypeSig::array(TypeSig::corlib(ElementType::I4), 0, vec![], vec![]));
    }

    fn to_bounds(sig: &TypeSig) -> Vec<i32> {
        match sig.kind() {
            TypeSigKind::Array(array) => array.lower_bounds.clone(),
            _ => Vec::new(),
        }
    }

    #[test]
    fn generic_instances() {
        let sig = parse(&[0x15, 0x12, 0x09, 0x02, 0x08, 0x0A]).unwrap();
        let TypeSigKind::GenericInst(inst) = sig.kind() else {
            panic!("expected generic instance");
        };
        assert_eq!(inst.generic_type.handle().token(), Token(0x0100_0002));
        assert_eq!(
            inst.generic_args,
            vec![TypeSig::corlib(ElementType::I4), TypeSig::corlib(ElementType::I8)]
        );

        assert!(matches!(
            parse(&[0x15, 0x08, 0x00]),
            Err(Error::MalformedGenericInstantiation {
                found: 0x08,
                offset: 1
            })
        ));
    }

    #[test]
    fn modifiers_and_rare_nodes() {
        let sig = parse(&[0x1F, 0x05, 0x20, 0x09, 0x08]).unwrap();
        assert!(sig.is_required_modifier());
        assert_eq!(
            sig.unresolved_tokens(),
            vec![Token(0x0100_0001), Token(0x0100_0002)]
        );

        assert_eq!(
            parse(&[0x17, 0x05, 0x10]).unwrap(),
            TypeSig::value_array(TypeSig::corlib(ElementType::U1), 0x10)
        );
        assert_eq!(
            parse(&[0x3F, 0x02, 0x08]).unwrap(),
            TypeSig::module(2, TypeSig::corlib(ElementType::I4))
        );
        assert_eq!(parse(&[0x41]).unwrap(), TypeSig::sentinel());
    }

    #[test]
    fn function_pointers() {
        // method void *(int32, string)
        let sig = parse(&[0x1B, 0x00, 0x02, 0x01, 0x08, 0x0E]).unwrap();
        let TypeSigKind::FnPtr(method) = sig.kind() else {
            panic!("expected function pointer");
        };
        assert_eq!(method.calling_convention, CALLING_CONVENTION::DEFAULT);
        assert_eq!(method.ret_type, TypeSig::corlib(ElementType::Void));
        assert_eq!(method.params.len(), 2);
        assert!(method.params_after_sentinel.is_none());
    }

    #[test]
    fn method_signatures() {
        // instance generic<1> !!0 (int32)
        let method = parse_method_signature(&[0x30, 0x01, 0x01, 0x1E, 0x00, 0x08], &NullResolver)
            .unwrap();
        assert!(method.has_this());
        assert!(method.is_generic());
        assert_eq!(method.generic_param_count, 1);
        assert_eq!(method.ret_type, TypeSig::mvar(0));

        // vararg void (int32, ..., string, object)
        let method = parse_method_signature(
            &[0x05, 0x03, 0x01, 0x08, 0x41, 0x0E, 0x1C],
            &NullResolver,
        )
        .unwrap();
        assert!(method.is_vararg());
        assert_eq!(method.params, vec![TypeSig::corlib(ElementType::I4)]);
        assert_eq!(
            method.params_after_sentinel,
            Some(vec![
                TypeSig::corlib(ElementType::String),
                TypeSig::corlib(ElementType::Object)
            ])
        );
        assert_eq!(method.param_count(), 3);

        assert!(matches!(
            parse_method_signature(&[0x06, 0x08], &NullResolver),
            Err(Error::Malformed { .. })
        ));
    }

    #[test]
    fn invalid_tags() {
        for (data, value) in [
            (&[0x00][..], 0x00),
            (&[0x1A][..], 0x1A),
            (&[0x21][..], 0x21),
            (&[0x22][..], 0x22),
            (&[0xFF][..], 0xFF),
        ] {
            assert!(matches!(
                parse(data),
                Err(Error::InvalidElementType { value: v, offset: 0 }) if v == value
            ));
        }

        assert!(matches!(
            parse(&[0x0F, 0x0F, 0x40]),
            Err(Error::InvalidElementType {
                value: 0x40,
                offset: 2
            })
        ));
    }

    #[test]
    fn truncation() {
        assert!(matches!(parse(&[]), Err(Error::OutOfBounds)));
        assert!(matches!(
            parse(&[0x0F]),
            Err(Error::TruncatedSignature {
                element_type: ElementType::Ptr,
                offset: 0
            })
        ));
        // innermost node wins
        assert!(matches!(
            parse(&[0x1D, 0x15, 0x12, 0x09, 0x02, 0x08]),
            Err(Error::TruncatedSignature {
                element_type: ElementType::GenericInst,
                offset: 1
            })
        ));
        assert!(matches!(
            parse(&[0x14, 0x08, 0x02, 0x01]),
            Err(Error::TruncatedSignature {
                element_type: ElementType::Array,
                offset: 0
            })
        ));
        assert!(matches!(
            parse(&[0x12, 0xC0, 0x00]),
            Err(Error::TruncatedSignature {
                element_type: ElementType::Class,
                offset: 0
            })
        ));
    }

    #[test]
    fn invalid_compressed_integer() {
        assert!(matches!(
            parse(&[0x13, 0xE0]),
            Err(Error::InvalidCompressedInteger {
                first_byte: 0xE0,
                offset: 1
            })
        ));
    }

    #[test]
    fn recursion_limit() {
        let mut data = vec![0x0F; MAX_RECURSION_DEPTH + 1];
        data.push(0x08);
        assert!(matches!(
            parse(&data),
            Err(Error::RecursionLimit(MAX_RECURSION_DEPTH))
        ));

        let mut data = vec![0x0F; MAX_RECURSION_DEPTH - 1];
        data.push(0x08);
        assert!(parse(&data).is_ok());
    }

    #[test]
    fn trailing_bytes_ignored() {
        let mut parser = SignatureParser::new(&[0x08, 0x0E], &NullResolver);
        assert_eq!(parser.parse_type().unwrap(), TypeSig::corlib(ElementType::I4));
        assert!(parser.has_more_data());
        assert_eq!(parser.pos(), 1);
    }
}
