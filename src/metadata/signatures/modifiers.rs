//! Helpers that look through custom modifiers and pinned wrappers.

use crate::metadata::{
    signatures::{ArraySig, GenericInstSig, TypeSig, TypeSigKind},
    typesystem::{TypeHandle, TypeRc, TypeSpecRc},
};

/// Skip all leading `CMOD_REQD` / `CMOD_OPT` nodes.
#[must_use]
pub fn remove_modifiers(sig: &TypeSig) -> &TypeSig {
    let mut current = sig;
    while let TypeSigKind::CModReqd(modifier) | TypeSigKind::CModOpt(modifier) = current.kind() {
        current = modifier.next.as_ref();
    }
    current
}

/// Skip one leading `PINNED` node.
#[must_use]
pub fn remove_pinned(sig: &TypeSig) -> &TypeSig {
    match sig.kind() {
        TypeSigKind::Pinned(next) => next.as_ref(),
        _ => sig,
    }
}

/// Skip modifiers, a pinned node, and the modifiers behind it.
///
/// Equal to `remove_modifiers(remove_pinned(remove_modifiers(sig)))`.
#[must_use]
pub fn remove_pinned_and_modifiers(sig: &TypeSig) -> &TypeSig {
    remove_modifiers(remove_pinned(remove_modifiers(sig)))
}

/// The underlying `CorLib`, `Class` or `ValueType` node, if any.
#[must_use]
pub fn to_type_def_or_ref_sig(sig: &TypeSig) -> Option<&TypeSig> {
    stripped_if(sig, TypeSig::is_type_def_or_ref)
}

/// The underlying `Class` or `ValueType` node, if any. Core library nodes do not count.
#[must_use]
pub fn to_class_or_value_type_sig(sig: &TypeSig) -> Option<&TypeSig> {
    stripped_if(sig, |sig| sig.is_class_sig() || sig.is_value_type_sig())
}

/// The underlying `ValueType` node, if any.
#[must_use]
pub fn to_value_type_sig(sig: &TypeSig) -> Option<&TypeSig> {
    stripped_if(sig, TypeSig::is_value_type_sig)
}

/// The underlying `Class` node, if any.
#[must_use]
pub fn to_class_sig(sig: &TypeSig) -> Option<&TypeSig> {
    stripped_if(sig, TypeSig::is_class_sig)
}

/// The underlying generic instantiation, if any.
#[must_use]
pub fn to_generic_inst_sig(sig: &TypeSig) -> Option<&GenericInstSig> {
    match remove_pinned_and_modifiers(sig).kind() {
        TypeSigKind::GenericInst(inst) => Some(inst),
        _ => None,
    }
}

/// The underlying multi-dimensional array, if any.
#[must_use]
pub fn to_array_sig(sig: &TypeSig) -> Option<&ArraySig> {
    match remove_pinned_and_modifiers(sig).kind() {
        TypeSigKind::Array(array) => Some(array),
        _ => None,
    }
}

/// The underlying `SZARRAY` node, if any.
#[must_use]
pub fn to_sz_array_sig(sig: &TypeSig) -> Option<&TypeSig> {
    stripped_if(sig, TypeSig::is_sz_array)
}

/// The underlying `PTR` node, if any.
#[must_use]
pub fn to_ptr_sig(sig: &TypeSig) -> Option<&TypeSig> {
    stripped_if(sig, TypeSig::is_pointer)
}

/// The underlying `BYREF` node, if any.
#[must_use]
pub fn to_by_ref_sig(sig: &TypeSig) -> Option<&TypeSig> {
    stripped_if(sig, TypeSig::is_by_ref)
}

/// The underlying `VAR` or `MVAR` node, if any.
#[must_use]
pub fn to_generic_sig(sig: &TypeSig) -> Option<&TypeSig> {
    stripped_if(sig, TypeSig::is_generic_parameter)
}

/// The underlying `VAR` node, if any.
#[must_use]
pub fn to_generic_var(sig: &TypeSig) -> Option<&TypeSig> {
    stripped_if(sig, TypeSig::is_generic_type_parameter)
}

/// The underlying `MVAR` node, if any.
#[must_use]
pub fn to_generic_mvar(sig: &TypeSig) -> Option<&TypeSig> {
    stripped_if(sig, TypeSig::is_generic_method_parameter)
}

fn stripped_if(sig: &TypeSig, predicate: impl Fn(&TypeSig) -> bool) -> Option<&TypeSig> {
    let sig = remove_pinned_and_modifiers(sig);
    predicate(sig).then_some(sig)
}

fn handle_of(sig: &TypeSig) -> Option<&TypeHandle> {
    match remove_pinned_and_modifiers(sig).kind() {
        TypeSigKind::Class(handle) | TypeSigKind::ValueType(handle) => Some(handle),
        _ => None,
    }
}

/// The `TypeDef` behind a `Class` or `ValueType` node. Nothing is resolved.
#[must_use]
pub fn try_get_type_def(sig: &TypeSig) -> Option<&TypeRc> {
    handle_of(sig).and_then(TypeHandle::type_def)
}

/// The `TypeRef` behind a `Class`, `ValueType` or core library node.
#[must_use]
pub fn try_get_type_ref(sig: &TypeSig) -> Option<&TypeRc> {
    let sig = remove_pinned_and_modifiers(sig);
    match sig.kind() {
        TypeSigKind::CorLib(corlib) => corlib.type_ref.as_ref(),
        _ => handle_of(sig).and_then(TypeHandle::type_ref),
    }
}

/// The `TypeSpec` behind a `Class` or `ValueType` node.
#[must_use]
pub fn try_get_type_spec(sig: &TypeSig) -> Option<&TypeSpecRc> {
    handle_of(sig).and_then(TypeHandle::type_spec)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::metadata::{
        signatures::ClassOrValueTypeSig,
        token::Token,
        typesystem::{ElementType, TypeDefOrRef, TypeInfo, TypeSpec},
    };

    fn modifier(row: u32) -> TypeHandle {
        TypeHandle::unresolved(Token(0x0100_0000 | row))
    }

    #[test]
    fn strip_composition() {
        let inner = TypeSig::corlib(ElementType::I4);
        let samples = [
            inner.clone(),
            TypeSig::pinned(inner.clone()),
            TypeSig::cmod_reqd(modifier(1), TypeSig::pinned(inner.clone())),
            TypeSig::cmod_opt(
                modifier(1),
                TypeSig::cmod_reqd(
                    modifier(2),
                    TypeSig::pinned(TypeSig::cmod_opt(modifier(3), inner.clone())),
                ),
            ),
            TypeSig::pinned(TypeSig::pinned(inner.clone())),
            TypeSig::ptr(TypeSig::cmod_opt(modifier(1), inner.clone())),
        ];

        for sample in &samples {
            assert_eq!(
                remove_modifiers(remove_pinned(remove_modifiers(sample))),
                remove_pinned_and_modifiers(sample)
            );
        }

        assert_eq!(remove_pinned_and_modifiers(&samples[3]), &inner);
        // only one pinned node is removed
        assert!(remove_pinned_and_modifiers(&samples[4]).is_pinned());
        // modifiers behind other wrappers stay
        assert!(remove_pinned_and_modifiers(&samples[5]).is_pointer());
    }

    #[test]
    fn conversions() {
        let inst = TypeSig::generic_inst(
            ClassOrValueTypeSig::Class(modifier(5)),
            vec![TypeSig::var(0)],
        );
        let wrapped = TypeSig::cmod_opt(modifier(1), inst.clone());

        assert!(to_generic_inst_sig(&wrapped).is_some());
        assert!(to_type_def_or_ref_sig(&wrapped).is_none());
        assert!(to_array_sig(&wrapped).is_none());

        let array = TypeSig::pinned(TypeSig::array(TypeSig::var(0), 2, vec![], vec![]));
        assert_eq!(to_array_sig(&array).map(|a| a.rank), Some(2));

        let var = TypeSig::cmod_reqd(modifier(1), TypeSig::mvar(3));
        assert_eq!(to_generic_sig(&var), Some(&TypeSig::mvar(3)));

        let corlib = TypeSig::pinned(TypeSig::corlib(ElementType::Object));
        assert!(to_type_def_or_ref_sig(&corlib).unwrap().is_corlib_type());
        assert!(to_class_or_value_type_sig(&corlib).is_none());
    }

    #[test]
    fn node_conversions() {
        let value = TypeSig::cmod_opt(modifier(1), TypeSig::value_type(modifier(2)));
        assert!(to_value_type_sig(&value).unwrap().is_value_type_sig());
        assert!(to_class_or_value_type_sig(&value).is_some());
        assert!(to_class_sig(&value).is_none());

        let class = TypeSig::pinned(TypeSig::class(modifier(3)));
        assert_eq!(to_class_sig(&class), Some(&TypeSig::class(modifier(3))));
        assert!(to_value_type_sig(&class).is_none());

        let var = TypeSig::cmod_reqd(modifier(1), TypeSig::var(2));
        assert_eq!(to_generic_var(&var), Some(&TypeSig::var(2)));
        assert!(to_generic_mvar(&var).is_none());
        let mvar = TypeSig::pinned(TypeSig::mvar(0));
        assert_eq!(to_generic_mvar(&mvar), Some(&TypeSig::mvar(0)));
        assert!(to_generic_var(&mvar).is_none());

        let pointer = TypeSig::cmod_opt(modifier(1), TypeSig::ptr(TypeSig::var(0)));
        assert!(to_ptr_sig(&pointer).unwrap().is_pointer());
        assert!(to_by_ref_sig(&pointer).is_none());

        let by_ref = TypeSig::pinned(TypeSig::by_ref(TypeSig::var(0)));
        assert!(to_by_ref_sig(&by_ref).unwrap().is_by_ref());
        assert!(to_sz_array_sig(&by_ref).is_none());

        let array = TypeSig::pinned(TypeSig::sz_array(TypeSig::var(0)));
        assert_eq!(
            to_sz_array_sig(&array).and_then(TypeSig::next),
            Some(&TypeSig::var(0))
        );
        assert!(to_array_sig(&array).is_none());
        assert!(to_ptr_sig(&array).is_none());
    }

    #[test]
    fn try_get() {
        let def = Arc::new(TypeInfo::new(Token(0x0200_0001), "N", "Def"));
        let reference = Arc::new(TypeInfo::new(Token(0x0100_0001), "N", "Ref"));
        let spec = Arc::new(TypeSpec::new(1, TypeSig::var(0)));

        let def_sig = TypeSig::class(TypeHandle::resolved(TypeDefOrRef::TypeDef(def.clone())));
        let ref_sig = TypeSig::pinned(TypeSig::value_type(TypeHandle::resolved(
            TypeDefOrRef::TypeRef(reference.clone()),
        )));
        let spec_sig = TypeSig::class(TypeHandle::resolved(TypeDefOrRef::TypeSpec(spec.clone())));

        assert_eq!(try_get_type_def(&def_sig), Some(&def));
        assert!(try_get_type_ref(&def_sig).is_none());
        assert_eq!(try_get_type_ref(&ref_sig), Some(&reference));
        assert_eq!(try_get_type_spec(&spec_sig), Some(&spec));
        assert!(try_get_type_def(&TypeSig::class(modifier(9))).is_none());

        let corlib_sig = TypeSig::corlib(ElementType::I4);
        let int32 = try_get_type_ref(&corlib_sig).unwrap();
        assert_eq!(int32.name, "Int32");
    }
}
