//! Signature encoding, the inverse of [`crate::metadata::signatures::SignatureParser`].
//!
//! Compressed integers are always written in their shortest form. Blobs that used longer
//! forms decode to the same tree and are normalised when encoded again; everything else
//! round-trips byte for byte.

use crate::{
    file::io::{write_compressed_int, write_compressed_uint},
    metadata::{
        signatures::{ClassOrValueTypeSig, MethodSig, TypeSig, TypeSigKind, CALLING_CONVENTION},
        typesystem::{ElementType, TypeHandle},
    },
    Error::EncodingInvalid,
    Result,
};

/// Serializes [`TypeSig`] and [`MethodSig`] trees into an owned buffer.
///
/// # Example
///
/// ```rust
/// use dotsig::metadata::{
///     signatures::{SignatureEncoder, TypeSig},
///     typesystem::ElementType,
/// };
///
/// let mut encoder = SignatureEncoder::new();
/// encoder.encode_type(&TypeSig::sz_array(TypeSig::corlib(ElementType::I4)))?;
/// assert_eq!(encoder.into_bytes(), vec![0x1D, 0x08]);
/// # Ok::<(), dotsig::Error>(())
/// ```
#[derive(Debug, Default)]
pub struct SignatureEncoder {
    buffer: Vec<u8>,
}

impl SignatureEncoder {
    /// Create an encoder with an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The bytes written so far.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Consume the encoder and return the written bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }

    /// Append the encoding of `signature`.
    ///
    /// # Errors
    /// Returns [`crate::Error::EncodingInvalid`] for core library nodes with a non primitive
    /// tag, handles whose token is not a `TypeDef`, `TypeRef` or `TypeSpec`, and values
    /// outside the compressed integer range. The buffer content is unspecified after an error.
    pub fn encode_type(&mut self, signature: &TypeSig) -> Result<()> {
        self.buffer.push(signature.element_type().to_byte());

        match signature.kind() {
            TypeSigKind::CorLib(sig) => {
                if !sig.element_type.is_primitive() {
                    return Err(EncodingInvalid(format!(
                        "{:?} is not a core library element type",
                        sig.element_type
                    )));
                }
            }
            TypeSigKind::Class(handle) | TypeSigKind::ValueType(handle) => {
                self.encode_handle(handle)?;
            }
            TypeSigKind::GenericVar(index) | TypeSigKind::GenericMVar(index) => {
                write_compressed_uint(*index, &mut self.buffer)?;
            }
            TypeSigKind::Sentinel => {}
            TypeSigKind::FnPtr(method) => self.encode_method(method)?,
            TypeSigKind::GenericInst(inst) => {
                let (tag, handle) = match &inst.generic_type {
                    ClassOrValueTypeSig::Class(handle) => (ElementType::Class, handle),
                    ClassOrValueTypeSig::ValueType(handle) => (ElementType::ValueType, handle),
                };
                self.buffer.push(tag.to_byte());
                self.encode_handle(handle)?;

                self.encode_count(inst.generic_args.len())?;
                for arg in &inst.generic_args {
                    self.encode_type(arg)?;
                }
            }
            TypeSigKind::Ptr(next)
            | TypeSigKind::ByRef(next)
            | TypeSigKind::SzArray(next)
            | TypeSigKind::Pinned(next) => self.encode_type(next)?,
            TypeSigKind::Array(array) => {
                self.encode_type(&array.next)?;
                write_compressed_uint(array.rank, &mut self.buffer)?;

                if array.rank > 0 {
                    self.encode_count(array.sizes.len())?;
                    for size in &array.sizes {
                        write_compressed_uint(*size, &mut self.buffer)?;
                    }

                    self.encode_count(array.lower_bounds.len())?;
                    for bound in &array.lower_bounds {
                        write_compressed_int(*bound, &mut self.buffer)?;
                    }
                }
            }
            TypeSigKind::CModReqd(modifier) | TypeSigKind::CModOpt(modifier) => {
                self.encode_handle(&modifier.modifier)?;
                self.encode_type(&modifier.next)?;
            }
            TypeSigKind::ValueArray(array) => {
                self.encode_type(&array.next)?;
                write_compressed_uint(array.size, &mut self.buffer)?;
            }
            TypeSigKind::Module(module) => {
                write_compressed_uint(module.index, &mut self.buffer)?;
                self.encode_type(&module.next)?;
            }
        }

        Ok(())
    }

    /// Append the encoding of `method`.
    ///
    /// The generic parameter count is written only if the `GENERIC` flag is set. A sentinel
    /// is written only if [`MethodSig::params_after_sentinel`] holds at least one parameter.
    ///
    /// # Errors
    /// Same as [`SignatureEncoder::encode_type`].
    pub fn encode_method(&mut self, method: &MethodSig) -> Result<()> {
        self.buffer.push(method.calling_convention);

        if method.calling_convention & CALLING_CONVENTION::GENERIC != 0 {
            write_compressed_uint(method.generic_param_count, &mut self.buffer)?;
        }

        self.encode_count(method.param_count())?;
        self.encode_type(&method.ret_type)?;

        for param in &method.params {
            self.encode_type(param)?;
        }

        if let Some(varargs) = method.params_after_sentinel.as_ref().filter(|v| !v.is_empty()) {
            self.buffer.push(ElementType::Sentinel.to_byte());
            for param in varargs {
                self.encode_type(param)?;
            }
        }

        Ok(())
    }

    fn encode_handle(&mut self, handle: &TypeHandle) -> Result<()> {
        let coded_index = handle.token().to_type_def_or_ref_index()?;
        write_compressed_uint(coded_index, &mut self.buffer)
    }

    fn encode_count(&mut self, count: usize) -> Result<()> {
        let count = u32::try_from(count)
            .map_err(|_| EncodingInvalid(format!("List of {count} entries is too long")))?;
        write_compressed_uint(count, &mut self.buffer)
    }
}

/// Encode a type signature into a new buffer.
///
/// # Errors
/// See [`SignatureEncoder::encode_type`].
///
/// # Examples
///
/// ```rust
/// use dotsig::metadata::{
///     signatures::{encode_type_signature, parse_type_signature},
///     typesystem::NullResolver,
/// };
///
/// let blob = [0x15, 0x12, 0x09, 0x02, 0x08, 0x0A];
/// let signature = parse_type_signature(&blob, &NullResolver)?;
/// assert_eq!(encode_type_signature(&signature)?, blob);
/// # Ok::<(), dotsig::Error>(())
/// ```
pub fn encode_type_signature(signature: &TypeSig) -> Result<Vec<u8>> {
    let mut encoder = SignatureEncoder::new();
    encoder.encode_type(signature)?;
    Ok(encoder.into_bytes())
}

/// Encode a method signature into a new buffer.
///
/// # Errors
/// See [`SignatureEncoder::encode_method`].
pub fn encode_method_signature(method: &MethodSig) -> Result<Vec<u8>> {
    let mut encoder = SignatureEncoder::new();
    encoder.encode_method(method)?;
    Ok(encoder.into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        metadata::{
            signatures::{parse_method_signature, parse_type_signature},
            token::Token,
            typesystem::NullResolver,
        },
        Error,
    };

    fn round_trip(blob: &[u8]) {
        let signature = parse_type_signature(blob, &NullResolver).unwrap();
        assert_eq!(encode_type_signature(&signature).unwrap(), blob, "{signature:?}");
    }

    #[test]
    fn minimal_blobs_round_trip() {
        round_trip(&[0x08]);
        round_trip(&[0x0F, 0x0F, 0x01]);
        round_trip(&[0x10, 0x1D, 0x1C]);
        round_trip(&[0x12, 0x81, 0x01]);
        round_trip(&[0x11, 0xC0, 0x01, 0x00, 0x02]);
        round_trip(&[0x13, 0x00]);
        round_trip(&[0x1E, 0x81, 0x00]);
        round_trip(&[0x14, 0x08, 0x03, 0x01, 0x05, 0x02, 0x00, 0x7B]);
        round_trip(&[0x14, 0x0E, 0x00]);
        round_trip(&[0x14, 0x0E, 0x02, 0x00, 0x00]);
        round_trip(&[0x15, 0x11, 0x0A, 0x01, 0x15, 0x12, 0x09, 0x01, 0x13, 0x00]);
        round_trip(&[0x1F, 0x05, 0x20, 0x09, 0x45, 0x08]);
        round_trip(&[0x17, 0x05, 0x81, 0x00]);
        round_trip(&[0x3F, 0x01, 0x1D, 0x08]);
        round_trip(&[0x1B, 0x05, 0x03, 0x01, 0x08, 0x41, 0x0E, 0x1C]);
        round_trip(&[0x1B, 0x30, 0x02, 0x00, 0x1E, 0x01]);
        round_trip(&[0x41]);
    }

    #[test]
    fn non_minimal_input_is_normalised() {
        // VAR 1 with a two byte index
        let signature = parse_type_signature(&[0x13, 0x80, 0x01], &NullResolver).unwrap();
        assert_eq!(signature, TypeSig::var(1));
        assert_eq!(encode_type_signature(&signature).unwrap(), vec![0x13, 0x01]);
    }

    #[test]
    fn method_round_trip() {
        let blob = [0x20, 0x02, 0x01, 0x0E, 0x10, 0x08];
        let method = parse_method_signature(&blob, &NullResolver).unwrap();
        assert_eq!(encode_method_signature(&method).unwrap(), blob);
    }

    #[test]
    fn empty_varargs_write_no_sentinel() {
        let mut method = MethodSig::new(TypeSig::corlib(ElementType::Void), vec![]);
        method.calling_convention = CALLING_CONVENTION::VARARG;
        method.params_after_sentinel = Some(Vec::new());

        assert_eq!(encode_method_signature(&method).unwrap(), vec![0x05, 0x00, 0x01]);
    }

    #[test]
    fn invalid_tokens() {
        let field = TypeSig::class(TypeHandle::unresolved(Token(0x0400_0001)));
        assert!(matches!(
            encode_type_signature(&field),
            Err(Error::EncodingInvalid(_))
        ));

        let modifier = TypeSig::cmod_opt(
            TypeHandle::unresolved(Token(0x0A00_0001)),
            TypeSig::corlib(ElementType::I4),
        );
        assert!(matches!(
            encode_type_signature(&modifier),
            Err(Error::EncodingInvalid(_))
        ));
    }

    #[test]
    fn out_of_range_values() {
        assert!(matches!(
            encode_type_signature(&TypeSig::var(0x2000_0000)),
            Err(Error::EncodingInvalid(_))
        ));
        assert!(matches!(
            encode_type_signature(&TypeSig::array(
                TypeSig::corlib(ElementType::I4),
                1,
                vec![],
                vec![i32::MIN]
            )),
            Err(Error::EncodingInvalid(_))
        ));
        assert!(matches!(
            encode_type_signature(&TypeSig::corlib(ElementType::Class)),
            Err(Error::EncodingInvalid(_))
        ));
    }
}
