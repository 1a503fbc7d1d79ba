use std::rc::Rc;

use crate::typing::scope::{Builtin, Object, ObjectKind, ScopeTree};
use crate::typing::types::{BasicKind, InterfaceMethod, InterfaceType, NamedType, Signature, Type};

const BASIC_TYPES: [(&str, BasicKind); 19] = [
    ("bool", BasicKind::Bool),
    ("int", BasicKind::Int),
    ("int8", BasicKind::Int8),
    ("int16", BasicKind::Int16),
    ("int32", BasicKind::Int32),
    ("int64", BasicKind::Int64),
    ("uint", BasicKind::Uint),
    ("uint8", BasicKind::Uint8),
    ("uint16", BasicKind::Uint16),
    ("uint32", BasicKind::Uint32),
    ("uint64", BasicKind::Uint64),
    ("uintptr", BasicKind::Uintptr),
    ("float32", BasicKind::Float32),
    ("float64", BasicKind::Float64),
    ("complex64", BasicKind::Complex64),
    ("complex128", BasicKind::Complex128),
    ("string", BasicKind::String),
    ("byte", BasicKind::Uint8),
    ("rune", BasicKind::Int32),
];

/// The predeclared `error` interface: `interface { Error() string }`.
pub fn error_type() -> Type {
    let named = NamedType::new("error", None);
    named.set_underlying(Type::Interface(Rc::new(InterfaceType {
        methods: vec![InterfaceMethod {
            name: "Error".to_string(),
            sig: Rc::new(Signature {
                params: Vec::new(),
                results: vec![Type::Basic(BasicKind::String)],
                variadic: false,
            }),
        }],
        embedded: Vec::new(),
    })));
    Type::Named(named)
}

pub fn empty_interface() -> Type {
    Type::Interface(Rc::new(InterfaceType::default()))
}

/// Fill the universe scope of a fresh tree with the predeclared identifiers.
pub(crate) fn populate(tree: &mut ScopeTree) -> Type {
    let universe = tree.universe();
    let mut declare = |object: Object| {
        // The universe starts empty, so names cannot collide.
        let _ = tree.insert(universe, object);
    };

    for (name, kind) in BASIC_TYPES {
        declare(Object::new(name, ObjectKind::TypeName, Some(Type::Basic(kind))));
    }
    let error = error_type();
    declare(Object::new("error", ObjectKind::TypeName, Some(error.clone())));
    declare(Object::new("any", ObjectKind::TypeName, Some(empty_interface())));

    for name in ["true", "false"] {
        declare(Object::new(
            name,
            ObjectKind::Const { value: None },
            Some(Type::Basic(BasicKind::UntypedBool)),
        ));
    }
    declare(Object::new(
        "iota",
        ObjectKind::Iota,
        Some(Type::Basic(BasicKind::UntypedInt)),
    ));
    declare(Object::new(
        "nil",
        ObjectKind::Nil,
        Some(Type::Basic(BasicKind::UntypedNil)),
    ));

    for (name, builtin) in Builtin::ALL {
        declare(Object::new(name, ObjectKind::Builtin(builtin), None));
    }
    error
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn universe_declares_error_and_builtins() {
        let mut tree = ScopeTree::new();
        populate(&mut tree);
        let universe = tree.universe();

        let error = tree.lookup(universe, "error").unwrap();
        assert!(tree.object(error).ty.as_ref().unwrap().is_error());

        let panic = tree.lookup(universe, "panic").unwrap();
        assert_eq!(
            tree.object(panic).kind,
            ObjectKind::Builtin(Builtin::Panic)
        );
        assert!(tree.lookup(universe, "err0").is_none());
    }
}
