use std::{
    collections::HashMap,
    sync::{Arc, OnceLock},
};

use strum::IntoEnumIterator;

use crate::metadata::{
    identity::{AssemblyIdentity, AssemblyVersion},
    token::{Token, TABLE_TYPE_REF},
    typesystem::{AssemblyRc, ElementType, ResolutionScope, TypeInfo, TypeRc},
};

/// Public key token of the ECMA standard library assemblies
const ECMA_PUBLIC_KEY_TOKEN: [u8; 8] = [0xb7, 0x7a, 0x5c, 0x56, 0x19, 0x34, 0xe0, 0x89];

/// The well-known types a core library provides for the primitive element types.
///
/// Primitive signature nodes such as `I4` carry no token; they refer to the matching entry
/// here instead. Each entry is a `TypeRef` scoped to the core library assembly.
///
/// # Examples
///
/// ```rust
/// use dotsig::metadata::typesystem::{CorLibTypes, ElementType};
///
/// let int32 = CorLibTypes::shared().get(ElementType::I4).unwrap();
/// assert_eq!((int32.namespace.as_str(), int32.name.as_str()), ("System", "Int32"));
/// assert!(int32.is_value_type);
/// ```
#[derive(Debug)]
pub struct CorLibTypes {
    assembly: AssemblyRc,
    types: HashMap<ElementType, TypeRc>,
}

impl CorLibTypes {
    /// Build the table for the given core library assembly.
    ///
    /// Tokens are synthetic `TypeRef` tokens numbered in element type order.
    #[must_use]
    pub fn new(assembly: AssemblyIdentity) -> Self {
        let assembly = Arc::new(assembly);
        let scope = ResolutionScope::AssemblyRef(assembly.clone());

        let types = ElementType::iter()
            .filter_map(|element_type| {
                element_type
                    .corlib_name()
                    .map(|(namespace, name)| (element_type, namespace, name))
            })
            .zip(1u32..)
            .map(|((element_type, namespace, name), row)| {
                let info = TypeInfo::new(Token::from_parts(TABLE_TYPE_REF, row), namespace, name)
                    .with_scope(scope.clone())
                    .value_type(element_type.is_value_type());
                (element_type, Arc::new(info))
            })
            .collect();

        CorLibTypes { assembly, types }
    }

    /// The process wide table for `mscorlib, Version=4.0.0.0`.
    pub fn shared() -> &'static CorLibTypes {
        static SHARED: OnceLock<CorLibTypes> = OnceLock::new();
        SHARED.get_or_init(|| {
            CorLibTypes::new(
                AssemblyIdentity::new("mscorlib", AssemblyVersion::new(4, 0, 0, 0))
                    .with_public_key_token(ECMA_PUBLIC_KEY_TOKEN),
            )
        })
    }

    /// The core library assembly.
    #[must_use]
    pub fn assembly(&self) -> &AssemblyRc {
        &self.assembly
    }

    /// The type for a primitive element type, `None` for non primitive tags.
    #[must_use]
    pub fn get(&self, element_type: ElementType) -> Option<&TypeRc> {
        self.types.get(&element_type)
    }
}
