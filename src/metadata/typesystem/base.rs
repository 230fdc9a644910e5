use strum::{EnumCount, EnumIter, FromRepr};

/// The element type tags of ECMA-335 II.23.1.16.
///
/// Every node of a type signature starts with one of these bytes. `End`, `R` and `Internal`
/// exist in the table but never start a type signature node.
///
/// # Examples
///
/// ```rust
/// use dotsig::metadata::typesystem::ElementType;
///
/// assert_eq!(ElementType::from_byte(0x1D), Some(ElementType::SzArray));
/// assert_eq!(ElementType::I4.to_byte(), 0x08);
/// assert!(ElementType::ValueType.is_value_type());
/// assert!(ElementType::from_byte(0x22).is_none());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, FromRepr, EnumIter, EnumCount)]
#[repr(u8)]
pub enum ElementType {
    /// Marks the end of a list
    End = 0x00,
    /// `System.Void`
    Void = 0x01,
    /// `System.Boolean`
    Boolean = 0x02,
    /// `System.Char`
    Char = 0x03,
    /// `System.SByte`
    I1 = 0x04,
    /// `System.Byte`
    U1 = 0x05,
    /// `System.Int16`
    I2 = 0x06,
    /// `System.UInt16`
    U2 = 0x07,
    /// `System.Int32`
    I4 = 0x08,
    /// `System.UInt32`
    U4 = 0x09,
    /// `System.Int64`
    I8 = 0x0A,
    /// `System.UInt64`
    U8 = 0x0B,
    /// `System.Single`
    R4 = 0x0C,
    /// `System.Double`
    R8 = 0x0D,
    /// `System.String`
    String = 0x0E,
    /// Unmanaged pointer, followed by the pointee type
    Ptr = 0x0F,
    /// Managed reference, followed by the referenced type
    ByRef = 0x10,
    /// Value type, followed by a `TypeDefOrRef` coded index
    ValueType = 0x11,
    /// Reference type, followed by a `TypeDefOrRef` coded index
    Class = 0x12,
    /// Generic parameter of a type, followed by its index
    Var = 0x13,
    /// Multi-dimensional array, followed by the element type and the array shape
    Array = 0x14,
    /// Generic instantiation, followed by the generic type and its arguments
    GenericInst = 0x15,
    /// `System.TypedReference`
    TypedByRef = 0x16,
    /// Fixed size value array, followed by the element type and the size
    ValueArray = 0x17,
    /// `System.IntPtr`
    I = 0x18,
    /// `System.UIntPtr`
    U = 0x19,
    /// Native real, not valid in signatures
    R = 0x1A,
    /// Function pointer, followed by a full method signature
    FnPtr = 0x1B,
    /// `System.Object`
    Object = 0x1C,
    /// Single-dimensional zero-based array, followed by the element type
    SzArray = 0x1D,
    /// Generic parameter of a method, followed by its index
    MVar = 0x1E,
    /// Required modifier, followed by a `TypeDefOrRef` coded index and the modified type
    CModReqd = 0x1F,
    /// Optional modifier, followed by a `TypeDefOrRef` coded index and the modified type
    CModOpt = 0x20,
    /// Runtime internal type, not valid in metadata
    Internal = 0x21,
    /// Module scoped type, followed by a module index and the type
    Module = 0x3F,
    /// Separates fixed from variable arguments in a vararg call site
    Sentinel = 0x41,
    /// Pinned local, followed by the local type
    Pinned = 0x45,
}

impl ElementType {
    /// Map a tag byte to its element type.
    #[must_use]
    pub fn from_byte(value: u8) -> Option<Self> {
        Self::from_repr(value)
    }

    /// The tag byte.
    #[must_use]
    pub fn to_byte(self) -> u8 {
        self as u8
    }

    /// Returns `true` if this tag may start a type signature node.
    #[must_use]
    pub fn is_valid_in_type(self) -> bool {
        !matches!(self, Self::End | Self::R | Self::Internal)
    }

    /// Returns `true` for the tags that denote a core library type without payload.
    #[must_use]
    pub fn is_primitive(self) -> bool {
        matches!(
            self,
            Self::Void
                | Self::Boolean
                | Self::Char
                | Self::I1
                | Self::U1
                | Self::I2
                | Self::U2
                | Self::I4
                | Self::U4
                | Self::I8
                | Self::U8
                | Self::R4
                | Self::R8
                | Self::String
                | Self::TypedByRef
                | Self::I
                | Self::U
                | Self::Object
        )
    }

    /// Returns `true` for tags that terminate the `next` chain of a signature.
    #[must_use]
    pub fn is_leaf(self) -> bool {
        self.is_primitive()
            || matches!(
                self,
                Self::ValueType
                    | Self::Class
                    | Self::Var
                    | Self::MVar
                    | Self::Sentinel
                    | Self::FnPtr
                    | Self::GenericInst
            )
    }

    /// Value type classification keyed purely by tag.
    ///
    /// `GenericInst` is not a value type by tag alone; the signature model delegates it to
    /// the generic type.
    #[must_use]
    pub fn is_value_type(self) -> bool {
        matches!(
            self,
            Self::Void
                | Self::Boolean
                | Self::Char
                | Self::I1
                | Self::U1
                | Self::I2
                | Self::U2
                | Self::I4
                | Self::U4
                | Self::I8
                | Self::U8
                | Self::R4
                | Self::R8
                | Self::ValueType
                | Self::ValueArray
                | Self::TypedByRef
                | Self::I
                | Self::U
                | Self::R
        )
    }

    /// Namespace and name of the core library type a primitive tag stands for.
    #[must_use]
    pub fn corlib_name(self) -> Option<(&'static str, &'static str)> {
        let name = match self {
            Self::Void => "Void",
            Self::Boolean => "Boolean",
            Self::Char => "Char",
            Self::I1 => "SByte",
            Self::U1 => "Byte",
            Self::I2 => "Int16",
            Self::U2 => "UInt16",
            Self::I4 => "Int32",
            Self::U4 => "UInt32",
            Self::I8 => "Int64",
            Self::U8 => "UInt64",
            Self::R4 => "Single",
            Self::R8 => "Double",
            Self::String => "String",
            Self::TypedByRef => "TypedReference",
            Self::I => "IntPtr",
            Self::U => "UIntPtr",
            Self::Object => "Object",
            _ => return None,
        };

        Some(("System", name))
    }
}
