use std::cell::RefCell;
use std::fmt::{Display, Formatter};
use std::rc::Rc;

use gs_core::ast::ChanDir;
use itertools::Itertools;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BasicKind {
    Invalid,
    Bool,
    Int,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Uintptr,
    Float32,
    Float64,
    Complex64,
    Complex128,
    String,
    UntypedBool,
    UntypedInt,
    UntypedRune,
    UntypedFloat,
    UntypedComplex,
    UntypedString,
    UntypedNil,
}

impl BasicKind {
    pub fn name(&self) -> &'static str {
        match self {
            BasicKind::Invalid => "invalid type",
            BasicKind::Bool => "bool",
            BasicKind::Int => "int",
            BasicKind::Int8 => "int8",
            BasicKind::Int16 => "int16",
            BasicKind::Int32 => "int32",
            BasicKind::Int64 => "int64",
            BasicKind::Uint => "uint",
            BasicKind::Uint8 => "uint8",
            BasicKind::Uint16 => "uint16",
            BasicKind::Uint32 => "uint32",
            BasicKind::Uint64 => "uint64",
            BasicKind::Uintptr => "uintptr",
            BasicKind::Float32 => "float32",
            BasicKind::Float64 => "float64",
            BasicKind::Complex64 => "complex64",
            BasicKind::Complex128 => "complex128",
            BasicKind::String => "string",
            BasicKind::UntypedBool => "untyped bool",
            BasicKind::UntypedInt => "untyped int",
            BasicKind::UntypedRune => "untyped rune",
            BasicKind::UntypedFloat => "untyped float",
            BasicKind::UntypedComplex => "untyped complex",
            BasicKind::UntypedString => "untyped string",
            BasicKind::UntypedNil => "untyped nil",
        }
    }

    pub fn is_untyped(&self) -> bool {
        matches!(
            self,
            BasicKind::UntypedBool
                | BasicKind::UntypedInt
                | BasicKind::UntypedRune
                | BasicKind::UntypedFloat
                | BasicKind::UntypedComplex
                | BasicKind::UntypedString
                | BasicKind::UntypedNil
        )
    }

    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            BasicKind::Int
                | BasicKind::Int8
                | BasicKind::Int16
                | BasicKind::Int32
                | BasicKind::Int64
                | BasicKind::Uint
                | BasicKind::Uint8
                | BasicKind::Uint16
                | BasicKind::Uint32
                | BasicKind::Uint64
                | BasicKind::Uintptr
                | BasicKind::UntypedInt
                | BasicKind::UntypedRune
        )
    }

    pub fn is_numeric(&self) -> bool {
        self.is_integer()
            || matches!(
                self,
                BasicKind::Float32
                    | BasicKind::Float64
                    | BasicKind::Complex64
                    | BasicKind::Complex128
                    | BasicKind::UntypedFloat
                    | BasicKind::UntypedComplex
            )
    }

    pub fn is_string(&self) -> bool {
        matches!(self, BasicKind::String | BasicKind::UntypedString)
    }

    pub fn is_boolean(&self) -> bool {
        matches!(self, BasicKind::Bool | BasicKind::UntypedBool)
    }

    /// Rank used to combine two untyped numeric constants.
    pub(crate) fn untyped_rank(&self) -> u8 {
        match self {
            BasicKind::UntypedInt => 1,
            BasicKind::UntypedRune => 2,
            BasicKind::UntypedFloat => 3,
            BasicKind::UntypedComplex => 4,
            _ => 0,
        }
    }

    /// Type an untyped constant takes when nothing else constrains it.
    pub fn default_kind(&self) -> BasicKind {
        match self {
            BasicKind::UntypedBool => BasicKind::Bool,
            BasicKind::UntypedInt => BasicKind::Int,
            BasicKind::UntypedRune => BasicKind::Int32,
            BasicKind::UntypedFloat => BasicKind::Float64,
            BasicKind::UntypedComplex => BasicKind::Complex128,
            BasicKind::UntypedString => BasicKind::String,
            other => *other,
        }
    }
}

#[derive(Clone)]
pub enum Type {
    Basic(BasicKind),
    Named(Rc<NamedType>),
    Pointer(Box<Type>),
    Slice(Box<Type>),
    /// Length is `None` when it could not be evaluated as a constant.
    Array(Option<u64>, Box<Type>),
    Map(Box<Type>, Box<Type>),
    Chan(ChanDir, Box<Type>),
    Func(Rc<Signature>),
    Struct(Rc<StructType>),
    Interface(Rc<InterfaceType>),
}

impl Type {
    pub fn invalid() -> Self {
        Type::Basic(BasicKind::Invalid)
    }

    /// The universe `error` interface, and nothing else that shares its name.
    pub fn is_error(&self) -> bool {
        matches!(self, Type::Named(named) if named.name == "error" && named.package.is_none())
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, Type::Basic(BasicKind::Invalid))
    }

    pub fn underlying(&self) -> Type {
        match self {
            Type::Named(named) => named.underlying(),
            other => other.clone(),
        }
    }

    pub fn basic(&self) -> Option<BasicKind> {
        match self.underlying() {
            Type::Basic(kind) => Some(kind),
            _ => None,
        }
    }

    pub fn is_untyped(&self) -> bool {
        matches!(self, Type::Basic(kind) if kind.is_untyped())
    }

    pub fn is_interface(&self) -> bool {
        matches!(self.underlying(), Type::Interface(_))
    }

    /// Types whose zero value is `nil`.
    pub fn is_nillable(&self) -> bool {
        matches!(
            self.underlying(),
            Type::Pointer(_)
                | Type::Slice(_)
                | Type::Map(_, _)
                | Type::Chan(_, _)
                | Type::Func(_)
                | Type::Interface(_)
                | Type::Basic(BasicKind::UntypedNil)
        )
    }

    pub fn default_type(&self) -> Type {
        match self {
            Type::Basic(kind) => Type::Basic(kind.default_kind()),
            other => other.clone(),
        }
    }

    pub fn as_signature(&self) -> Option<Rc<Signature>> {
        match self.underlying() {
            Type::Func(sig) => Some(sig),
            _ => None,
        }
    }

    pub fn pointer_to(self) -> Type {
        Type::Pointer(Box::new(self))
    }
}

impl std::fmt::Debug for Type {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)
    }
}

impl Display for Type {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Type::Basic(kind) => write!(f, "{}", kind.name()),
            Type::Named(named) => write!(f, "{}", named),
            Type::Pointer(elem) => write!(f, "*{}", elem),
            Type::Slice(elem) => write!(f, "[]{}", elem),
            Type::Array(Some(len), elem) => write!(f, "[{}]{}", len, elem),
            Type::Array(None, elem) => write!(f, "[...]{}", elem),
            Type::Map(key, value) => write!(f, "map[{}]{}", key, value),
            Type::Chan(ChanDir::Both, elem) => write!(f, "chan {}", elem),
            Type::Chan(ChanDir::Send, elem) => write!(f, "chan<- {}", elem),
            Type::Chan(ChanDir::Recv, elem) => write!(f, "<-chan {}", elem),
            Type::Func(sig) => write!(f, "func{}", sig),
            Type::Struct(st) => write!(
                f,
                "struct{{{}}}",
                st.fields
                    .iter()
                    .map(|field| if field.embedded {
                        field.ty.to_string()
                    } else {
                        format!("{} {}", field.name, field.ty)
                    })
                    .join("; ")
            ),
            Type::Interface(iface) if iface.is_empty() => write!(f, "interface{{}}"),
            Type::Interface(iface) => write!(
                f,
                "interface{{{}}}",
                iface
                    .methods
                    .iter()
                    .map(|method| format!("{}{}", method.name, method.sig))
                    .chain(iface.embedded.iter().map(|ty| ty.to_string()))
                    .join("; ")
            ),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Method {
    pub name: String,
    pub sig: Rc<Signature>,
    /// Declared with a pointer receiver: only in the method set of `*T`.
    pub pointer_recv: bool,
}

/// A declared type. Identity is pointer identity of the `Rc`.
pub struct NamedType {
    pub name: String,
    /// Import path of the declaring package; `None` for universe types.
    pub package: Option<String>,
    underlying: RefCell<Type>,
    methods: RefCell<Vec<Method>>,
}

impl NamedType {
    pub fn new(name: impl Into<String>, package: Option<String>) -> Rc<Self> {
        Rc::new(Self {
            name: name.into(),
            package,
            underlying: RefCell::new(Type::invalid()),
            methods: RefCell::new(Vec::new()),
        })
    }

    pub fn underlying(&self) -> Type {
        self.underlying.borrow().clone()
    }

    pub fn set_underlying(&self, ty: Type) {
        // `type A B` takes B's underlying type, never B itself.
        *self.underlying.borrow_mut() = ty.underlying();
    }

    pub fn methods(&self) -> Vec<Method> {
        self.methods.borrow().clone()
    }

    pub fn method(&self, name: &str) -> Option<Method> {
        self.methods
            .borrow()
            .iter()
            .find(|method| method.name == name)
            .cloned()
    }

    pub fn add_method(&self, method: Method) {
        self.methods.borrow_mut().push(method);
    }
}

impl Display for NamedType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.package {
            Some(package) => {
                let short = package.rsplit('/').next().unwrap_or(package);
                write!(f, "{}.{}", short, self.name)
            }
            None => write!(f, "{}", self.name),
        }
    }
}

impl std::fmt::Debug for NamedType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Signature {
    pub params: Vec<Type>,
    pub results: Vec<Type>,
    /// The last parameter is `...T`, stored as `[]T`.
    pub variadic: bool,
}

impl Signature {
    pub fn result_descriptor(&self) -> TypeDescriptor {
        match self.results.as_slice() {
            [single] => TypeDescriptor::Single(single.clone()),
            results => TypeDescriptor::Tuple(results.to_vec()),
        }
    }
}

impl Display for Signature {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let last = self.params.len().saturating_sub(1);
        let params = self
            .params
            .iter()
            .enumerate()
            .map(|(idx, ty)| match ty {
                Type::Slice(elem) if self.variadic && idx == last => format!("...{}", elem),
                ty => ty.to_string(),
            })
            .join(", ");
        write!(f, "({})", params)?;
        match self.results.as_slice() {
            [] => Ok(()),
            [single] => write!(f, " {}", single),
            results => write!(f, " ({})", results.iter().join(", ")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StructField {
    pub name: String,
    pub ty: Type,
    pub embedded: bool,
}

#[derive(Debug, Clone, Default)]
pub struct StructType {
    pub fields: Vec<StructField>,
}

#[derive(Debug, Clone, Default)]
pub struct InterfaceType {
    pub methods: Vec<InterfaceMethod>,
    pub embedded: Vec<Type>,
}

#[derive(Debug, Clone)]
pub struct InterfaceMethod {
    pub name: String,
    pub sig: Rc<Signature>,
}

impl InterfaceType {
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty() && self.embedded.is_empty()
    }

    /// Full method set, including methods of embedded interfaces.
    pub fn method_set(&self) -> Vec<InterfaceMethod> {
        let mut methods = self.methods.clone();
        for embedded in &self.embedded {
            if let Type::Interface(inner) = embedded.underlying() {
                for method in inner.method_set() {
                    if !methods.iter().any(|m| m.name == method.name) {
                        methods.push(method);
                    }
                }
            }
        }
        methods
    }
}

/// Static type of an expression: a single type, or an ordered tuple for calls
/// with zero or several results and comma-ok forms.
#[derive(Debug, Clone)]
pub enum TypeDescriptor {
    Single(Type),
    Tuple(Vec<Type>),
}

impl TypeDescriptor {
    pub fn components(&self) -> &[Type] {
        match self {
            TypeDescriptor::Single(ty) => std::slice::from_ref(ty),
            TypeDescriptor::Tuple(types) => types,
        }
    }

    pub fn len(&self) -> usize {
        self.components().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn single(&self) -> Option<&Type> {
        match self {
            TypeDescriptor::Single(ty) => Some(ty),
            TypeDescriptor::Tuple(_) => None,
        }
    }

    pub fn has_error(&self) -> bool {
        self.components().iter().any(Type::is_error)
    }
}

impl Display for TypeDescriptor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            TypeDescriptor::Single(ty) => write!(f, "{}", ty),
            TypeDescriptor::Tuple(types) => write!(f, "({})", types.iter().join(", ")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn error_type(package: Option<&str>) -> Type {
        let named = NamedType::new("error", package.map(str::to_string));
        named.set_underlying(Type::Interface(Rc::new(InterfaceType::default())));
        Type::Named(named)
    }

    #[test]
    fn only_the_universe_error_is_error() {
        assert!(error_type(None).is_error());
        assert!(!error_type(Some("main")).is_error());
        assert!(!Type::Basic(BasicKind::String).is_error());
    }

    #[test]
    fn descriptor_components_flatten_single() {
        let single = TypeDescriptor::Single(Type::Basic(BasicKind::Int));
        assert_eq!(single.len(), 1);
        let unit = TypeDescriptor::Tuple(Vec::new());
        assert!(unit.is_empty());
        let pair = TypeDescriptor::Tuple(vec![Type::Basic(BasicKind::Int), error_type(None)]);
        assert!(pair.has_error());
        assert_eq!(pair.to_string(), "(int, error)");
    }

    #[test]
    fn signature_display_marks_variadic() {
        let sig = Signature {
            params: vec![
                Type::Basic(BasicKind::String),
                Type::Slice(Box::new(Type::Basic(BasicKind::Int))),
            ],
            results: vec![Type::Basic(BasicKind::Int), error_type(None)],
            variadic: true,
        };
        assert_eq!(sig.to_string(), "(string, ...int) (int, error)");
    }
}
