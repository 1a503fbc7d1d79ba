//! Type identity, assignability and member lookup.

use std::collections::VecDeque;
use std::rc::Rc;

use gs_core::ast::ChanDir;

use crate::typing::types::{BasicKind, Signature, Type};

pub(crate) fn identical(a: &Type, b: &Type) -> bool {
    match (a, b) {
        (Type::Basic(x), Type::Basic(y)) => x == y,
        (Type::Named(x), Type::Named(y)) => {
            Rc::ptr_eq(x, y) || (x.package.is_none() && y.package.is_none() && x.name == y.name)
        }
        (Type::Pointer(x), Type::Pointer(y)) | (Type::Slice(x), Type::Slice(y)) => identical(x, y),
        (Type::Array(n, x), Type::Array(m, y)) => {
            (n.is_none() || m.is_none() || n == m) && identical(x, y)
        }
        (Type::Map(k1, v1), Type::Map(k2, v2)) => identical(k1, k2) && identical(v1, v2),
        (Type::Chan(d1, x), Type::Chan(d2, y)) => d1 == d2 && identical(x, y),
        (Type::Func(x), Type::Func(y)) => identical_signatures(x, y),
        (Type::Struct(x), Type::Struct(y)) => {
            Rc::ptr_eq(x, y)
                || (x.fields.len() == y.fields.len()
                    && x.fields.iter().zip(&y.fields).all(|(f, g)| {
                        f.name == g.name && f.embedded == g.embedded && identical(&f.ty, &g.ty)
                    }))
        }
        (Type::Interface(x), Type::Interface(y)) => {
            if Rc::ptr_eq(x, y) {
                return true;
            }
            let (xs, ys) = (x.method_set(), y.method_set());
            xs.len() == ys.len()
                && xs.iter().all(|m| {
                    ys.iter()
                        .any(|n| n.name == m.name && identical_signatures(&m.sig, &n.sig))
                })
        }
        _ => false,
    }
}

pub(crate) fn identical_signatures(a: &Signature, b: &Signature) -> bool {
    a.variadic == b.variadic
        && a.params.len() == b.params.len()
        && a.results.len() == b.results.len()
        && a.params.iter().zip(&b.params).all(|(x, y)| identical(x, y))
        && a.results.iter().zip(&b.results).all(|(x, y)| identical(x, y))
}

/// Whether a value of type `value` may be assigned to a variable of type `target`.
pub(crate) fn assignable(value: &Type, target: &Type) -> bool {
    if value.is_invalid() || target.is_invalid() || identical(value, target) {
        return true;
    }

    if let Type::Basic(kind) = value {
        if kind.is_untyped() {
            return untyped_assignable(*kind, target);
        }
    }

    if target.is_interface() && implements(value, target) {
        return true;
    }

    let named = |ty: &Type| matches!(ty, Type::Named(_) | Type::Basic(_));
    if identical(&value.underlying(), &target.underlying()) && !(named(value) && named(target)) {
        return true;
    }

    // A bidirectional channel converts to either directional channel type.
    if let (Type::Chan(ChanDir::Both, x), Type::Chan(_, y)) =
        (value.underlying(), target.underlying())
    {
        return identical(&x, &y) && !(named(value) && named(target));
    }
    false
}

fn untyped_assignable(kind: BasicKind, target: &Type) -> bool {
    if target.is_interface() {
        return match kind {
            BasicKind::UntypedNil => true,
            _ => interface_is_empty(target),
        };
    }
    let underlying = target.underlying();
    match kind {
        BasicKind::UntypedNil => target.is_nillable(),
        BasicKind::UntypedBool => target.basic().is_some_and(|basic| basic.is_boolean()),
        BasicKind::UntypedString => target.basic().is_some_and(|basic| basic.is_string()),
        BasicKind::UntypedInt | BasicKind::UntypedRune => {
            matches!(underlying, Type::Basic(basic) if basic.is_numeric())
        }
        BasicKind::UntypedFloat => matches!(
            underlying,
            Type::Basic(
                BasicKind::Float32
                    | BasicKind::Float64
                    | BasicKind::Complex64
                    | BasicKind::Complex128
            )
        ),
        BasicKind::UntypedComplex => {
            matches!(underlying, Type::Basic(BasicKind::Complex64 | BasicKind::Complex128))
        }
        _ => false,
    }
}

fn interface_is_empty(ty: &Type) -> bool {
    matches!(ty.underlying(), Type::Interface(iface) if iface.method_set().is_empty())
}

/// Whether `ty` has every method of the interface type `iface`.
pub(crate) fn implements(ty: &Type, iface: &Type) -> bool {
    let Type::Interface(target) = iface.underlying() else {
        return false;
    };
    target.method_set().iter().all(|wanted| match method_of(ty, &wanted.name) {
        Some(found) => identical_signatures(&found, &wanted.sig),
        None => false,
    })
}

/// Method `name` in the method set of `ty`.
fn method_of(ty: &Type, name: &str) -> Option<Rc<Signature>> {
    if let Type::Interface(iface) = ty.underlying() {
        return iface
            .method_set()
            .into_iter()
            .find(|method| method.name == name)
            .map(|method| method.sig);
    }
    match lookup_field_or_method(ty, name)? {
        Selection::Method {
            sig,
            pointer_recv,
            addressable_via_pointer,
        } => (!pointer_recv || addressable_via_pointer).then_some(sig),
        Selection::Field(_) => None,
    }
}

#[derive(Debug, Clone)]
pub(crate) enum Selection {
    Field(Type),
    Method {
        sig: Rc<Signature>,
        pointer_recv: bool,
        /// The receiver was reached through a pointer.
        addressable_via_pointer: bool,
    },
}

/// Find field or method `name` of `ty`, searching embedded fields breadth-first.
pub(crate) fn lookup_field_or_method(ty: &Type, name: &str) -> Option<Selection> {
    let mut queue: VecDeque<(Type, bool)> = VecDeque::new();
    match ty {
        Type::Pointer(elem) => queue.push_back(((**elem).clone(), true)),
        other => queue.push_back((other.clone(), false)),
    }
    let mut depth_budget = 16;

    while let Some((current, via_pointer)) = queue.pop_front() {
        if let Type::Named(named) = &current {
            if let Some(method) = named.method(name) {
                return Some(Selection::Method {
                    sig: method.sig,
                    pointer_recv: method.pointer_recv,
                    addressable_via_pointer: via_pointer,
                });
            }
        }
        match current.underlying() {
            Type::Struct(st) => {
                if let Some(field) = st.fields.iter().find(|field| field.name == name) {
                    return Some(Selection::Field(field.ty.clone()));
                }
                if depth_budget == 0 {
                    continue;
                }
                depth_budget -= 1;
                for field in st.fields.iter().filter(|field| field.embedded) {
                    match &field.ty {
                        Type::Pointer(elem) => queue.push_back(((**elem).clone(), true)),
                        other => queue.push_back((other.clone(), via_pointer)),
                    }
                }
            }
            Type::Interface(iface) => {
                if let Some(method) = iface.method_set().into_iter().find(|m| m.name == name) {
                    return Some(Selection::Method {
                        sig: method.sig,
                        pointer_recv: false,
                        addressable_via_pointer: via_pointer,
                    });
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::typing::types::{Method, NamedType, StructField, StructType};
    use crate::typing::universe::{empty_interface, error_type};

    fn int() -> Type {
        Type::Basic(BasicKind::Int)
    }

    fn my_error(pointer_recv: bool) -> Type {
        let named = NamedType::new("MyErr", Some("main".to_string()));
        named.set_underlying(Type::Struct(Rc::new(StructType::default())));
        named.add_method(Method {
            name: "Error".to_string(),
            sig: Rc::new(Signature {
                params: Vec::new(),
                results: vec![Type::Basic(BasicKind::String)],
                variadic: false,
            }),
            pointer_recv,
        });
        Type::Named(named)
    }

    #[test]
    fn untyped_constants_follow_their_targets() {
        assert!(assignable(&Type::Basic(BasicKind::UntypedInt), &int()));
        assert!(assignable(&Type::Basic(BasicKind::UntypedInt), &Type::Basic(BasicKind::Float64)));
        assert!(!assignable(&Type::Basic(BasicKind::UntypedString), &int()));
        assert!(assignable(&Type::Basic(BasicKind::UntypedNil), &error_type()));
        assert!(!assignable(&Type::Basic(BasicKind::UntypedNil), &int()));
        assert!(assignable(&Type::Basic(BasicKind::UntypedFloat), &empty_interface()));
    }

    #[test]
    fn universe_error_is_identical_across_instances() {
        assert!(identical(&error_type(), &error_type()));
    }

    #[test]
    fn pointer_receivers_only_implement_through_pointers() {
        let value = my_error(true);
        assert!(!assignable(&value, &error_type()));
        assert!(assignable(&value.clone().pointer_to(), &error_type()));
        assert!(assignable(&my_error(false), &error_type()));
    }

    #[test]
    fn embedded_fields_are_promoted() {
        let inner = Type::Struct(Rc::new(StructType {
            fields: vec![StructField {
                name: "count".to_string(),
                ty: int(),
                embedded: false,
            }],
        }));
        let named = NamedType::new("Inner", Some("main".to_string()));
        named.set_underlying(inner);
        let outer = Type::Struct(Rc::new(StructType {
            fields: vec![StructField {
                name: "Inner".to_string(),
                ty: Type::Named(named),
                embedded: true,
            }],
        }));
        match lookup_field_or_method(&outer, "count") {
            Some(Selection::Field(ty)) => assert!(identical(&ty, &int())),
            other => panic!("unexpected selection {:?}", other),
        }
        assert!(lookup_field_or_method(&outer, "missing").is_none());
    }
}
