//! Expression typing.

use std::rc::Rc;

use gs_core::ast::*;
use gs_golang::GoSerializer;
use itertools::Itertools;

use crate::typing::lookup::{assignable, identical, lookup_field_or_method, Selection};
use crate::typing::scope::{Builtin, ObjectId, ObjectKind, ScopeId};
use crate::typing::types::{BasicKind, Signature, Type, TypeDescriptor};
use crate::typing::universe::empty_interface;
use crate::{CheckResult, Checker};

/// What an expression denotes.
#[derive(Debug, Clone)]
pub(crate) enum Operand {
    Value(TypeDescriptor),
    Type(Type),
    Builtin(Builtin),
    Package(ScopeId, String),
}

/// What a call expression invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Callee {
    Func,
    Conversion,
    Builtin(Builtin),
}

fn plural(count: usize, word: &str) -> String {
    if count == 1 {
        format!("{count} {word}")
    } else {
        format!("{count} {word}s")
    }
}

fn bool_type() -> Type {
    Type::Basic(BasicKind::Bool)
}

impl<'c, 'e> Checker<'c, 'e> {
    pub(crate) fn render(&self, expr: &Expr) -> String {
        GoSerializer.serialize_expr(expr).unwrap_or_default()
    }

    /// go/types style operand description, e.g. `x (variable of type int)`.
    pub(crate) fn describe(&self, expr: &Expr, ty: &Type) -> String {
        let text = self.render(expr);
        match ty {
            Type::Basic(BasicKind::UntypedNil) => "nil".to_string(),
            Type::Basic(kind) if kind.is_untyped() => {
                let what = match expr.unparen().kind {
                    ExprKind::BasicLit(_) | ExprKind::Ident(_) => "constant",
                    _ => "value",
                };
                format!("{} ({} {})", text, kind.name(), what)
            }
            _ => {
                let what = match expr.unparen().kind {
                    ExprKind::Ident(_) => "variable",
                    _ => "value",
                };
                format!("{} ({} of type {})", text, what, ty)
            }
        }
    }

    pub(crate) fn expr(&mut self, expr: &Expr, scope: ScopeId) -> CheckResult<Operand> {
        self.expr_hint(expr, scope, None)
    }

    /// Like `expr`; `hint` is the type of an elided composite literal.
    fn expr_hint(
        &mut self,
        expr: &Expr,
        scope: ScopeId,
        hint: Option<&Type>,
    ) -> CheckResult<Operand> {
        let operand = self.operand(expr, scope, hint)?;
        if let Operand::Value(desc) = &operand {
            self.record(expr.id, desc.clone());
        }
        Ok(operand)
    }

    /// Type descriptor of a value expression.
    pub(crate) fn expr_desc(&mut self, expr: &Expr, scope: ScopeId) -> CheckResult<TypeDescriptor> {
        let operand = self.expr(expr, scope)?;
        self.expect_value(expr, operand)
    }

    fn expect_value(&self, expr: &Expr, operand: Operand) -> CheckResult<TypeDescriptor> {
        match operand {
            Operand::Value(desc) => Ok(desc),
            Operand::Type(ty) => Err(self.error(
                expr.span,
                format!("{} (type) is not an expression", self.render_type_operand(expr, &ty)),
            )),
            Operand::Builtin(builtin) => Err(self.error(
                expr.span,
                format!("{} (built-in) must be called", builtin.name()),
            )),
            Operand::Package(_, name) => Err(self.error(
                expr.span,
                format!("use of package {} without selector", name),
            )),
        }
    }

    fn render_type_operand(&self, expr: &Expr, ty: &Type) -> String {
        match self.render(expr) {
            text if text.is_empty() => ty.to_string(),
            text => text,
        }
    }

    /// Type of an expression that must produce exactly one value.
    pub(crate) fn value(&mut self, expr: &Expr, scope: ScopeId) -> CheckResult<Type> {
        self.value_hint(expr, scope, None)
    }

    pub(crate) fn value_hint(
        &mut self,
        expr: &Expr,
        scope: ScopeId,
        hint: Option<&Type>,
    ) -> CheckResult<Type> {
        let operand = self.expr_hint(expr, scope, hint)?;
        let desc = self.expect_value(expr, operand)?;
        self.single(expr, desc)
    }

    fn single(&self, expr: &Expr, desc: TypeDescriptor) -> CheckResult<Type> {
        match desc {
            TypeDescriptor::Single(ty) => Ok(ty),
            TypeDescriptor::Tuple(types) if types.is_empty() => Err(self.error(
                expr.span,
                format!("{} (no value) used as value", self.render(expr)),
            )),
            TypeDescriptor::Tuple(types) => Err(self.error(
                expr.span,
                format!(
                    "multiple-value {} (value of type ({})) in single-value context",
                    self.render(expr),
                    types.iter().join(", ")
                ),
            )),
        }
    }

    /// Check `value` against `target` for the given context, e.g. "assignment".
    pub(crate) fn check_assignable(
        &self,
        expr: &Expr,
        value: &Type,
        target: &Type,
        context: &str,
    ) -> CheckResult<()> {
        if assignable(value, target) {
            return Ok(());
        }
        Err(self.error(
            expr.span,
            format!(
                "cannot use {} as {} value in {}",
                self.describe(expr, value),
                target,
                context
            ),
        ))
    }

    fn object_operand(&mut self, id: ObjectId, span: gs_core::span::Span) -> CheckResult<Operand> {
        let untyped = |kind| Operand::Value(TypeDescriptor::Single(Type::Basic(kind)));
        let object = self.tree().object(id);
        let name = object.name.clone();
        Ok(match object.kind.clone() {
            ObjectKind::TypeName => Operand::Type(self.resolve_object(id)?),
            ObjectKind::Builtin(builtin) => Operand::Builtin(builtin),
            ObjectKind::PkgName { scope, .. } => Operand::Package(scope, name),
            ObjectKind::Nil => untyped(BasicKind::UntypedNil),
            ObjectKind::Iota => match self.iota {
                Some(_) => untyped(BasicKind::UntypedInt),
                None => {
                    return Err(self.error(span, "cannot use iota outside constant declaration"))
                }
            },
            ObjectKind::Var | ObjectKind::Const { .. } | ObjectKind::Func => {
                Operand::Value(TypeDescriptor::Single(self.resolve_object(id)?))
            }
        })
    }

    fn operand(
        &mut self,
        expr: &Expr,
        scope: ScopeId,
        hint: Option<&Type>,
    ) -> CheckResult<Operand> {
        let single = |ty: Type| -> CheckResult<Operand> {
            Ok(Operand::Value(TypeDescriptor::Single(ty)))
        };
        match &expr.kind {
            ExprKind::Ident(ident) => {
                if ident.is_blank() {
                    return Err(self.error(ident.span, "cannot use _ as value"));
                }
                let Some((_, id)) = self.tree().lookup_parent(scope, &ident.name) else {
                    return Err(self.error(ident.span, format!("undefined: {}", ident)));
                };
                self.object_operand(id, ident.span)
            }
            ExprKind::BasicLit(lit) => single(Type::Basic(match lit.kind {
                LitKind::Int => BasicKind::UntypedInt,
                LitKind::Float => BasicKind::UntypedFloat,
                LitKind::Imag => BasicKind::UntypedComplex,
                LitKind::Char => BasicKind::UntypedRune,
                LitKind::String => BasicKind::UntypedString,
            })),
            ExprKind::CompositeLit(lit) => single(self.composite(expr, lit, scope, hint)?),
            ExprKind::FuncLit(lit) => {
                let sig = self.check_func(None, &lit.ty, &lit.body, scope)?;
                single(Type::Func(Rc::new(sig)))
            }
            ExprKind::Paren(inner) => self.expr_hint(inner, scope, hint),
            ExprKind::Selector(selector) => self.selector(expr, selector, scope),
            ExprKind::Index(index) => {
                let operand = self.expr(&index.x, scope)?;
                if let Operand::Type(_) = operand {
                    return Err(self.error(expr.span, "generic types are not supported"));
                }
                let desc = self.expect_value(&index.x, operand)?;
                let x = self.single(&index.x, desc)?;
                single(self.index(expr, &index.x, &x, &index.index, scope)?)
            }
            ExprKind::Slice(slice) => {
                let x = self.value(&slice.x, scope)?;
                for bound in [&slice.low, &slice.high, &slice.max].into_iter().flatten() {
                    self.integer_operand(bound, scope, "index")?;
                }
                let result = match x.underlying() {
                    Type::Basic(kind) if kind.is_string() => match x {
                        Type::Basic(BasicKind::UntypedString) => Type::Basic(BasicKind::String),
                        named => named,
                    },
                    Type::Slice(_) => x,
                    Type::Array(_, elem) => Type::Slice(elem),
                    Type::Pointer(inner) => match inner.underlying() {
                        Type::Array(_, elem) => Type::Slice(elem),
                        _ => return Err(self.cannot_slice(&slice.x, &x)),
                    },
                    _ => return Err(self.cannot_slice(&slice.x, &x)),
                };
                single(result)
            }
            ExprKind::TypeAssert(assert) => {
                let x = self.value(&assert.x, scope)?;
                if !x.is_interface() {
                    return Err(self.error(
                        assert.x.span,
                        format!(
                            "invalid operation: {} is not an interface",
                            self.describe(&assert.x, &x)
                        ),
                    ));
                }
                let Some(target) = &assert.ty else {
                    return Err(self.error(
                        expr.span,
                        "invalid syntax tree: use of .(type) outside type switch",
                    ));
                };
                single(self.resolve_type(target, scope)?)
            }
            ExprKind::Call(call) => {
                let (desc, _) = self.call(expr, call, scope)?;
                Ok(Operand::Value(desc))
            }
            ExprKind::Star(inner) => match self.expr(inner, scope)? {
                Operand::Type(ty) => Ok(Operand::Type(ty.pointer_to())),
                operand => {
                    let desc = self.expect_value(inner, operand)?;
                    let x = self.single(inner, desc)?;
                    match x.underlying() {
                        Type::Pointer(elem) => single(*elem),
                        Type::Basic(BasicKind::UntypedNil) => {
                            Err(self.error(expr.span, "invalid operation: cannot indirect nil"))
                        }
                        _ => Err(self.error(
                            expr.span,
                            format!(
                                "invalid operation: cannot indirect {}",
                                self.describe(inner, &x)
                            ),
                        )),
                    }
                }
            },
            ExprKind::Unary(unary) => single(self.unary(expr, unary, scope, hint)?),
            ExprKind::Binary(binary) => single(self.binary(expr, binary, scope)?),
            ExprKind::KeyValue(_) => Err(self.error(
                expr.span,
                "unexpected key:value expression outside composite literal",
            )),
            ExprKind::Ellipsis(_) => Err(self.error(expr.span, "invalid use of ...")),
            ExprKind::ArrayType(_)
            | ExprKind::SliceType(_)
            | ExprKind::MapType(_)
            | ExprKind::ChanType(_)
            | ExprKind::FuncType(_)
            | ExprKind::StructType(_)
            | ExprKind::InterfaceType(_) => Ok(Operand::Type(self.resolve_type(expr, scope)?)),
        }
    }

    fn cannot_slice(&self, x: &Expr, ty: &Type) -> gs_core::error::TypeCheckError {
        self.error(
            x.span,
            format!("cannot slice {}", self.describe(x, ty)),
        )
    }

    fn integer_operand(&mut self, expr: &Expr, scope: ScopeId, what: &str) -> CheckResult<Type> {
        let ty = self.value(expr, scope)?;
        match ty.basic() {
            Some(kind) if kind.is_integer() => Ok(ty),
            Some(BasicKind::UntypedFloat) if self.const_int(expr, scope).is_some() => Ok(ty),
            _ => Err(self.error(
                expr.span,
                format!("invalid argument: {} {} must be integer", what, self.describe(expr, &ty)),
            )),
        }
    }

    fn selector(
        &mut self,
        expr: &Expr,
        selector: &SelectorExpr,
        scope: ScopeId,
    ) -> CheckResult<Operand> {
        let name = &selector.sel;
        match self.expr(&selector.x, scope)? {
            Operand::Package(package, package_name) => {
                let found = self.tree().lookup(package, &name.name);
                match found {
                    Some(id) if name.is_exported() => self.object_operand(id, name.span),
                    Some(_) => Err(self.error(
                        name.span,
                        format!("name {} not exported by package {}", name, package_name),
                    )),
                    None => Err(self.error(
                        name.span,
                        format!("undefined: {}.{}", package_name, name),
                    )),
                }
            }
            Operand::Type(ty) => {
                // Method expression: `T.m` takes the receiver as first argument.
                match lookup_field_or_method(&ty, &name.name) {
                    Some(Selection::Method { sig, .. }) => {
                        let mut params = vec![ty.clone()];
                        params.extend(sig.params.iter().cloned());
                        Ok(Operand::Value(TypeDescriptor::Single(Type::Func(Rc::new(
                            Signature {
                                params,
                                results: sig.results.clone(),
                                variadic: sig.variadic,
                            },
                        )))))
                    }
                    _ => Err(self.error(
                        name.span,
                        format!("{}.{} undefined (type {} has no method {})", ty, name, ty, name),
                    )),
                }
            }
            operand => {
                let desc = self.expect_value(&selector.x, operand)?;
                let x = self.single(&selector.x, desc)?;
                let target = match &x {
                    // `p.f` on `**T` is not allowed; only one level of indirection.
                    Type::Pointer(inner) if matches!(**inner, Type::Pointer(_)) => None,
                    _ => lookup_field_or_method(&x, &name.name),
                };
                match target {
                    Some(Selection::Field(ty)) => Ok(Operand::Value(TypeDescriptor::Single(ty))),
                    Some(Selection::Method { sig, .. }) => {
                        Ok(Operand::Value(TypeDescriptor::Single(Type::Func(sig))))
                    }
                    None => Err(self.error(
                        name.span,
                        format!(
                            "{} undefined (type {} has no field or method {})",
                            self.render(expr),
                            x,
                            name
                        ),
                    )),
                }
            }
        }
    }

    fn index(
        &mut self,
        expr: &Expr,
        x_expr: &Expr,
        x: &Type,
        index: &Expr,
        scope: ScopeId,
    ) -> CheckResult<Type> {
        let elem = match x.underlying() {
            Type::Map(key, value) => {
                let ty = self.value(index, scope)?;
                self.check_assignable(index, &ty, &key, "map index")?;
                return Ok(*value);
            }
            Type::Basic(kind) if kind.is_string() => Type::Basic(BasicKind::Uint8),
            Type::Slice(elem) | Type::Array(_, elem) => *elem,
            Type::Pointer(inner) => match inner.underlying() {
                Type::Array(_, elem) => *elem,
                _ => return Err(self.cannot_index(expr, x_expr, x)),
            },
            _ => return Err(self.cannot_index(expr, x_expr, x)),
        };
        self.integer_operand(index, scope, "index")?;
        Ok(elem)
    }

    fn cannot_index(&self, expr: &Expr, x_expr: &Expr, x: &Type) -> gs_core::error::TypeCheckError {
        self.error(
            expr.span,
            format!("invalid operation: cannot index {}", self.describe(x_expr, x)),
        )
    }

    /// Type a call and report what kind of callee it invoked.
    pub(crate) fn call(
        &mut self,
        expr: &Expr,
        call: &CallExpr,
        scope: ScopeId,
    ) -> CheckResult<(TypeDescriptor, Callee)> {
        match self.expr(&call.fun, scope)? {
            Operand::Type(target) => {
                let text = self.render(&call.fun);
                match call.args.as_slice() {
                    [arg] => {
                        self.value(arg, scope)?;
                        Ok((TypeDescriptor::Single(target), Callee::Conversion))
                    }
                    [] => Err(self.error(
                        expr.span,
                        format!("missing argument in conversion to {}", text),
                    )),
                    _ => Err(self.error(
                        expr.span,
                        format!("too many arguments in conversion to {}", text),
                    )),
                }
            }
            Operand::Builtin(builtin) => {
                let desc = self.builtin(expr, call, builtin, scope)?;
                Ok((desc, Callee::Builtin(builtin)))
            }
            Operand::Package(_, name) => Err(self.error(
                call.fun.span,
                format!("use of package {} without selector", name),
            )),
            Operand::Value(desc) => {
                let fun = self.single(&call.fun, desc)?;
                let Some(sig) = fun.as_signature() else {
                    return Err(self.error(
                        expr.span,
                        format!(
                            "invalid operation: cannot call non-function {}",
                            self.describe(&call.fun, &fun)
                        ),
                    ));
                };
                self.arguments(call, &sig, scope)?;
                Ok((sig.result_descriptor(), Callee::Func))
            }
        }
    }

    fn arguments(&mut self, call: &CallExpr, sig: &Signature, scope: ScopeId) -> CheckResult<()> {
        let callee = self.render(&call.fun);

        // f(g()) where g returns several values.
        let spread = match call.args.as_slice() {
            [arg] if !call.ellipsis && matches!(arg.unparen().kind, ExprKind::Call(_)) => {
                let desc = self.expr_desc(arg, scope)?;
                Some(desc.components().to_vec())
            }
            _ => None,
        };
        let (args, exprs): (Vec<Type>, Vec<&Expr>) = match spread {
            Some(types) => {
                let arg = &call.args[0];
                if types.is_empty() {
                    let message = format!("{} (no value) used as value", self.render(arg));
                    return Err(self.error(arg.span, message));
                }
                let count = types.len();
                (types, std::iter::repeat(arg).take(count).collect())
            }
            None => {
                let mut types = Vec::with_capacity(call.args.len());
                for (index, arg) in call.args.iter().enumerate() {
                    let hint = self.param_type(sig, index, call.ellipsis).cloned();
                    types.push(self.value_hint(arg, scope, hint.as_ref())?);
                }
                (types, call.args.iter().collect())
            }
        };

        let params = sig.params.len();
        let count_ok = if call.ellipsis {
            sig.variadic && args.len() == params
        } else if sig.variadic {
            args.len() + 1 >= params
        } else {
            args.len() == params
        };
        if !count_ok {
            if call.ellipsis && !sig.variadic {
                return Err(self.error(
                    call.args.last().map(|arg| arg.span).unwrap_or(call.fun.span),
                    format!("have (...) but function is not variadic: {}", callee),
                ));
            }
            let few = args.len() < params;
            let message = format!(
                "{} arguments in call to {}\n\thave ({})\n\twant {}",
                if few { "not enough" } else { "too many" },
                callee,
                args.iter().join(", "),
                Signature {
                    params: sig.params.clone(),
                    results: Vec::new(),
                    variadic: sig.variadic,
                }
            );
            let span = call.args.last().map(|arg| arg.span).unwrap_or(call.fun.span);
            return Err(self.error(span, message));
        }

        for (index, (ty, arg)) in args.iter().zip(exprs).enumerate() {
            let Some(param) = self.param_type(sig, index, call.ellipsis) else {
                continue;
            };
            self.check_assignable(arg, ty, param, &format!("argument to {}", callee))?;
        }
        Ok(())
    }

    /// Type expected for argument `index`; variadic tails expect the element type.
    fn param_type<'s>(&self, sig: &'s Signature, index: usize, ellipsis: bool) -> Option<&'s Type> {
        let last = sig.params.len().checked_sub(1)?;
        if sig.variadic && index >= last && !ellipsis {
            return match &sig.params[last] {
                Type::Slice(elem) => Some(elem),
                _ => None,
            };
        }
        sig.params.get(index)
    }

    fn builtin(
        &mut self,
        expr: &Expr,
        call: &CallExpr,
        builtin: Builtin,
        scope: ScopeId,
    ) -> CheckResult<TypeDescriptor> {
        let name = builtin.name();
        let args = &call.args;
        let arity = |min: usize, max: Option<usize>| -> Result<(), String> {
            if args.len() < min {
                Err(format!(
                    "not enough arguments for {}() (expected {}, found {})",
                    name,
                    min,
                    args.len()
                ))
            } else if max.is_some_and(|max| args.len() > max) {
                Err(format!(
                    "too many arguments for {}() (expected {}, found {})",
                    name,
                    max.unwrap_or(min),
                    args.len()
                ))
            } else {
                Ok(())
            }
        };
        let unit = TypeDescriptor::Tuple(Vec::new());
        let single = TypeDescriptor::Single;
        let int = Type::Basic(BasicKind::Int);

        let bounds = match builtin {
            Builtin::Len | Builtin::Cap | Builtin::New => (1, Some(1)),
            Builtin::Panic | Builtin::Close => (1, Some(1)),
            Builtin::Clear | Builtin::Real | Builtin::Imag => (1, Some(1)),
            Builtin::Copy | Builtin::Delete | Builtin::Complex => (2, Some(2)),
            Builtin::Append | Builtin::Make | Builtin::Max | Builtin::Min => (1, None),
            Builtin::Print | Builtin::Println => (0, None),
            Builtin::Recover => (0, Some(0)),
        };
        arity(bounds.0, bounds.1).map_err(|message| self.error(expr.span, message))?;

        match builtin {
            Builtin::Len | Builtin::Cap => {
                let x = self.value(&args[0], scope)?;
                let ok = match x.underlying() {
                    Type::Basic(kind) => builtin == Builtin::Len && kind.is_string(),
                    Type::Slice(_) | Type::Array(_, _) | Type::Chan(_, _) => true,
                    Type::Map(_, _) => builtin == Builtin::Len,
                    Type::Pointer(inner) => matches!(inner.underlying(), Type::Array(_, _)),
                    _ => false,
                };
                if !ok {
                    return Err(self.error(
                        args[0].span,
                        format!(
                            "invalid argument: {} for built-in {}",
                            self.describe(&args[0], &x),
                            name
                        ),
                    ));
                }
                Ok(single(int))
            }
            Builtin::Append => {
                let slice = self.value(&args[0], scope)?;
                let Type::Slice(elem) = slice.underlying() else {
                    let message = match slice {
                        Type::Basic(BasicKind::UntypedNil) => {
                            "invalid argument: first argument to append must be a typed slice; \
                             have untyped nil"
                                .to_string()
                        }
                        _ => format!(
                            "invalid argument: {} is not a slice",
                            self.describe(&args[0], &slice)
                        ),
                    };
                    return Err(self.error(args[0].span, message));
                };
                if call.ellipsis {
                    if args.len() != 2 {
                        return Err(self.error(
                            expr.span,
                            "can only use ... with final argument in list",
                        ));
                    }
                    let rest = self.value(&args[1], scope)?;
                    let bytes_from_string = rest.basic().is_some_and(|kind| kind.is_string())
                        && matches!(*elem, Type::Basic(BasicKind::Uint8));
                    if !bytes_from_string {
                        let target = Type::Slice(elem.clone());
                        self.check_assignable(&args[1], &rest, &target, "argument to append")?;
                    }
                } else {
                    for arg in &args[1..] {
                        let ty = self.value_hint(arg, scope, Some(&elem))?;
                        self.check_assignable(arg, &ty, &elem, "argument to append")?;
                    }
                }
                Ok(single(slice))
            }
            Builtin::Make => {
                let ty = self.type_argument(&args[0], scope, name)?;
                let max = match ty.underlying() {
                    Type::Slice(_) => 3,
                    Type::Map(_, _) | Type::Chan(_, _) => 2,
                    _ => {
                        return Err(self.error(
                            args[0].span,
                            format!(
                                "invalid argument: cannot make {}; \
                                 type must be slice, map, or channel",
                                ty
                            ),
                        ))
                    }
                };
                if matches!(ty.underlying(), Type::Slice(_)) && args.len() < 2 {
                    return Err(self.error(
                        expr.span,
                        format!(
                            "invalid operation: {} expects 2 or 3 arguments; found 1",
                            self.render(expr)
                        ),
                    ));
                }
                if args.len() > max {
                    return Err(self.error(
                        expr.span,
                        format!(
                            "invalid operation: {} expects {} or {} arguments; found {}",
                            self.render(expr),
                            max - 1,
                            max,
                            args.len()
                        ),
                    ));
                }
                for arg in &args[1..] {
                    self.integer_operand(arg, scope, "index")?;
                }
                Ok(single(ty))
            }
            Builtin::New => {
                let ty = self.type_argument(&args[0], scope, name)?;
                Ok(single(ty.pointer_to()))
            }
            Builtin::Panic => {
                let ty = self.value(&args[0], scope)?;
                self.check_assignable(&args[0], &ty, &empty_interface(), "argument to panic")?;
                Ok(unit)
            }
            Builtin::Print | Builtin::Println => {
                for arg in args {
                    self.value(arg, scope)?;
                }
                Ok(unit)
            }
            Builtin::Close => {
                let ch = self.value(&args[0], scope)?;
                match ch.underlying() {
                    Type::Chan(gs_core::ast::ChanDir::Recv, _) => Err(self.error(
                        args[0].span,
                        format!(
                            "invalid operation: cannot close receive-only channel {}",
                            self.describe(&args[0], &ch)
                        ),
                    )),
                    Type::Chan(_, _) => Ok(unit),
                    _ => Err(self.error(
                        args[0].span,
                        format!(
                            "invalid operation: cannot close non-channel {}",
                            self.describe(&args[0], &ch)
                        ),
                    )),
                }
            }
            Builtin::Clear => {
                let x = self.value(&args[0], scope)?;
                match x.underlying() {
                    Type::Map(_, _) | Type::Slice(_) => Ok(unit),
                    _ => Err(self.error(
                        args[0].span,
                        format!(
                            "invalid argument: {} must be a map or slice",
                            self.describe(&args[0], &x)
                        ),
                    )),
                }
            }
            Builtin::Delete => {
                let map = self.value(&args[0], scope)?;
                let Type::Map(key, _) = map.underlying() else {
                    return Err(self.error(
                        args[0].span,
                        format!("invalid argument: {} is not a map", self.describe(&args[0], &map)),
                    ));
                };
                let ty = self.value(&args[1], scope)?;
                self.check_assignable(&args[1], &ty, &key, "argument to delete")?;
                Ok(unit)
            }
            Builtin::Copy => {
                let dst = self.value(&args[0], scope)?;
                self.value(&args[1], scope)?;
                if !matches!(dst.underlying(), Type::Slice(_)) {
                    return Err(self.error(
                        args[0].span,
                        format!(
                            "invalid argument: copy expects slice arguments; found {}",
                            self.describe(&args[0], &dst)
                        ),
                    ));
                }
                Ok(single(int))
            }
            Builtin::Recover => Ok(single(empty_interface())),
            Builtin::Min | Builtin::Max => {
                let mut result = self.value(&args[0], scope)?;
                for arg in &args[1..] {
                    let ty = self.value(arg, scope)?;
                    result = self.unify(&result, &ty).ok_or_else(|| {
                        self.error(
                            arg.span,
                            format!(
                                "invalid argument: mismatched types {} (previous argument) \
                                 and {} (type of {})",
                                result,
                                ty,
                                self.render(arg)
                            ),
                        )
                    })?;
                }
                Ok(single(result))
            }
            Builtin::Complex => {
                let re = self.value(&args[0], scope)?;
                let im = self.value(&args[1], scope)?;
                let ty = match (re.is_untyped(), im.is_untyped(), re.basic()) {
                    (true, true, _) => Type::Basic(BasicKind::UntypedComplex),
                    (_, _, Some(BasicKind::Float32)) => Type::Basic(BasicKind::Complex64),
                    _ => Type::Basic(BasicKind::Complex128),
                };
                Ok(single(ty))
            }
            Builtin::Real | Builtin::Imag => {
                let x = self.value(&args[0], scope)?;
                let ty = match x.basic() {
                    Some(BasicKind::Complex64) => Type::Basic(BasicKind::Float32),
                    Some(kind) if kind.is_untyped() => Type::Basic(BasicKind::UntypedFloat),
                    _ => Type::Basic(BasicKind::Float64),
                };
                Ok(single(ty))
            }
        }
    }

    fn type_argument(&mut self, expr: &Expr, scope: ScopeId, builtin: &str) -> CheckResult<Type> {
        match self.expr(expr, scope)? {
            Operand::Type(ty) => Ok(ty),
            _ => Err(self.error(
                expr.span,
                format!("{} is not a type (argument to {})", self.render(expr), builtin),
            )),
        }
    }

    fn unary(
        &mut self,
        expr: &Expr,
        unary: &UnaryExpr,
        scope: ScopeId,
        hint: Option<&Type>,
    ) -> CheckResult<Type> {
        if unary.op == UnaryOp::Addr {
            // `&T{}` elided inside a composite literal of `*T` elements.
            let inner_hint = match hint.map(Type::underlying) {
                Some(Type::Pointer(inner)) => Some(*inner),
                _ => None,
            };
            let x = self.value_hint(&unary.x, scope, inner_hint.as_ref())?;
            return Ok(x.pointer_to());
        }

        let x = self.value(&unary.x, scope)?;
        let kind = x.basic();
        let invalid = |this: &Self| {
            this.error(
                expr.span,
                format!(
                    "invalid operation: operator {} not defined on {}",
                    unary.op.as_str(),
                    this.describe(&unary.x, &x)
                ),
            )
        };
        match unary.op {
            UnaryOp::Recv => match x.underlying() {
                Type::Chan(gs_core::ast::ChanDir::Send, _) => Err(self.error(
                    expr.span,
                    format!(
                        "invalid operation: cannot receive from send-only channel {}",
                        self.describe(&unary.x, &x)
                    ),
                )),
                Type::Chan(_, elem) => Ok(*elem),
                _ => Err(self.error(
                    expr.span,
                    format!(
                        "invalid operation: cannot receive from non-channel {}",
                        self.describe(&unary.x, &x)
                    ),
                )),
            },
            UnaryOp::Not if kind.is_some_and(|kind| kind.is_boolean()) => Ok(x),
            UnaryOp::Pos | UnaryOp::Neg if kind.is_some_and(|kind| kind.is_numeric()) => Ok(x),
            UnaryOp::Xor if kind.is_some_and(|kind| kind.is_integer()) => Ok(x),
            _ => Err(invalid(self)),
        }
    }

    /// Common type of two operands, or `None` when they do not match.
    pub(crate) fn unify(&self, x: &Type, y: &Type) -> Option<Type> {
        match (x, y) {
            (Type::Basic(a), Type::Basic(b)) if a.is_untyped() && b.is_untyped() => {
                if a == b {
                    return (*a != BasicKind::UntypedNil).then(|| x.clone());
                }
                if a.untyped_rank() > 0 && b.untyped_rank() > 0 {
                    let kind = if a.untyped_rank() >= b.untyped_rank() { a } else { b };
                    return Some(Type::Basic(*kind));
                }
                None
            }
            (Type::Basic(a), _) if a.is_untyped() => assignable(x, y).then(|| y.clone()),
            (_, Type::Basic(b)) if b.is_untyped() => assignable(y, x).then(|| x.clone()),
            _ => identical(x, y).then(|| x.clone()),
        }
    }

    fn binary(&mut self, expr: &Expr, binary: &BinaryExpr, scope: ScopeId) -> CheckResult<Type> {
        let x = self.value(&binary.x, scope)?;
        let y = self.value(&binary.y, scope)?;
        let op = binary.op;

        if op.is_shift() {
            let shifted = match x.basic() {
                Some(kind) if kind.is_integer() => x.clone(),
                Some(BasicKind::UntypedFloat) if self.const_int(&binary.x, scope).is_some() => {
                    Type::Basic(BasicKind::UntypedInt)
                }
                _ => {
                    return Err(self.error(
                        expr.span,
                        format!(
                            "invalid operation: shifted operand {} must be integer",
                            self.describe(&binary.x, &x)
                        ),
                    ))
                }
            };
            if !y.basic().is_some_and(|kind| kind.is_integer() || kind == BasicKind::UntypedFloat) {
                return Err(self.error(
                    expr.span,
                    format!(
                        "invalid operation: shift count {} must be integer",
                        self.describe(&binary.y, &y)
                    ),
                ));
            }
            return Ok(shifted);
        }

        let mismatched = |this: &Self| {
            this.error(
                expr.span,
                format!(
                    "invalid operation: {} (mismatched types {} and {})",
                    this.render(expr),
                    x,
                    y
                ),
            )
        };

        if op.is_comparison() {
            let typed = !x.is_untyped() && !y.is_untyped();
            let comparable = self.unify(&x, &y).is_some()
                || (typed && (assignable(&x, &y) || assignable(&y, &x)));
            if !comparable {
                return Err(mismatched(self));
            }
            return Ok(Type::Basic(BasicKind::UntypedBool));
        }

        let Some(result) = self.unify(&x, &y) else {
            return Err(mismatched(self));
        };
        let kind = result.basic();
        let defined = match op {
            BinaryOp::LAnd | BinaryOp::LOr => kind.is_some_and(|kind| kind.is_boolean()),
            BinaryOp::Add => kind.is_some_and(|kind| kind.is_numeric() || kind.is_string()),
            BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Quo => {
                kind.is_some_and(|kind| kind.is_numeric())
            }
            _ => kind.is_some_and(|kind| kind.is_integer()),
        };
        if !defined {
            return Err(self.error(
                expr.span,
                format!(
                    "invalid operation: operator {} not defined on {}",
                    op.as_str(),
                    self.describe(&binary.x, &x)
                ),
            ));
        }
        Ok(result)
    }

    fn composite(
        &mut self,
        expr: &Expr,
        lit: &CompositeLit,
        scope: ScopeId,
        hint: Option<&Type>,
    ) -> CheckResult<Type> {
        let (ty, pointer) = match &lit.ty {
            Some(ty_expr) => match &ty_expr.kind {
                ExprKind::ArrayType(array) if array.len.is_none() => {
                    let elem = self.resolve_type(&array.elem, scope)?;
                    let len = self.array_length(lit);
                    (Type::Array(Some(len), Box::new(elem)), false)
                }
                _ => (self.resolve_type(ty_expr, scope)?, false),
            },
            None => match hint {
                Some(Type::Pointer(inner)) => ((**inner).clone(), true),
                Some(hint) => (hint.clone(), false),
                None => {
                    let message = "invalid composite literal type: missing type";
                    return Err(self.error(expr.span, message));
                }
            },
        };

        match ty.underlying() {
            Type::Struct(st) => {
                let keyed = lit.elts.iter().any(|elt| matches!(elt.kind, ExprKind::KeyValue(_)));
                if keyed {
                    for elt in &lit.elts {
                        let ExprKind::KeyValue(kv) = &elt.kind else {
                            return Err(self.error(
                                elt.span,
                                "mixture of field:value and value elements in struct literal",
                            ));
                        };
                        let Some(key) = kv.key.as_ident() else {
                            let message = "invalid field name in struct literal";
                            return Err(self.error(kv.key.span, message));
                        };
                        let field = st.fields.iter().find(|field| field.name == key.name);
                        let Some(field) = field else {
                            return Err(self.error(
                                kv.key.span,
                                format!("unknown field {} in struct literal of type {}", key, ty),
                            ));
                        };
                        let value = self.value(&kv.value, scope)?;
                        self.check_assignable(&kv.value, &value, &field.ty, "struct literal")?;
                    }
                } else if !lit.elts.is_empty() {
                    for (elt, field) in lit.elts.iter().zip(&st.fields) {
                        let value = self.value(elt, scope)?;
                        self.check_assignable(elt, &value, &field.ty, "struct literal")?;
                    }
                    if lit.elts.len() < st.fields.len() {
                        return Err(self.error(
                            expr.span,
                            format!("too few values in struct literal of type {}", ty),
                        ));
                    }
                    if lit.elts.len() > st.fields.len() {
                        return Err(self.error(
                            expr.span,
                            format!("too many values in struct literal of type {}", ty),
                        ));
                    }
                }
            }
            Type::Slice(elem) | Type::Array(_, elem) => {
                for elt in &lit.elts {
                    let value = match &elt.kind {
                        ExprKind::KeyValue(kv) => {
                            self.integer_operand(&kv.key, scope, "index")?;
                            &kv.value
                        }
                        _ => elt,
                    };
                    self.element(value, &elem, scope, "array or slice literal")?;
                }
            }
            Type::Map(key, value) => {
                for elt in &lit.elts {
                    let ExprKind::KeyValue(kv) = &elt.kind else {
                        return Err(self.error(elt.span, "missing key in map literal"));
                    };
                    self.element(&kv.key, &key, scope, "map literal")?;
                    self.element(&kv.value, &value, scope, "map literal")?;
                }
            }
            _ => {
                return Err(self.error(
                    expr.span,
                    format!("invalid composite literal type {}", ty),
                ))
            }
        }
        Ok(if pointer { ty.pointer_to() } else { ty })
    }

    fn element(
        &mut self,
        expr: &Expr,
        target: &Type,
        scope: ScopeId,
        context: &str,
    ) -> CheckResult<()> {
        let ty = self.value_hint(expr, scope, Some(target))?;
        self.check_assignable(expr, &ty, target, context)
    }

    /// Length of a `[...]T{...}` literal, honouring keyed elements.
    fn array_length(&self, lit: &CompositeLit) -> u64 {
        let mut next: u64 = 0;
        let mut max: u64 = 0;
        for elt in &lit.elts {
            let index = match &elt.kind {
                ExprKind::KeyValue(kv) => match &kv.key.kind {
                    ExprKind::BasicLit(lit) if lit.kind == LitKind::Int => {
                        crate::typing::constant::parse_int(&lit.value)
                            .and_then(|value| u64::try_from(value).ok())
                            .unwrap_or(next)
                    }
                    _ => next,
                },
                _ => next,
            };
            next = index + 1;
            max = max.max(next);
        }
        max
    }

    /// Types assigned to `lhs_count` targets from `rhs`, recording comma-ok
    /// tuples. Untyped results are returned as is.
    pub(crate) fn rhs_types(
        &mut self,
        lhs_count: usize,
        rhs: &[Expr],
        scope: ScopeId,
    ) -> CheckResult<Vec<Type>> {
        if let [single] = rhs {
            if lhs_count == 2 {
                if let Some(first) = self.comma_ok(single, scope)? {
                    return Ok(vec![first, bool_type()]);
                }
            }
            if lhs_count != 1 || matches!(single.unparen().kind, ExprKind::Call(_)) {
                let desc = self.expr_desc(single, scope)?;
                let count = desc.len();
                if count != lhs_count {
                    if let ExprKind::Call(_) = single.unparen().kind {
                        if count == 0 {
                            return Err(self.error(
                                single.span,
                                format!("{} (no value) used as value", self.render(single)),
                            ));
                        }
                        return Err(self.error(
                            single.span,
                            format!(
                                "assignment mismatch: {} but {} returns {}",
                                plural(lhs_count, "variable"),
                                self.render(single),
                                plural(count, "value")
                            ),
                        ));
                    }
                    return Err(self.error(
                        single.span,
                        format!(
                            "assignment mismatch: {} but {}",
                            plural(lhs_count, "variable"),
                            plural(rhs.len(), "value")
                        ),
                    ));
                }
                return Ok(desc.components().to_vec());
            }
        }

        if rhs.len() != lhs_count {
            let span = rhs.first().map(|expr| expr.span).unwrap_or_else(gs_core::span::Span::null);
            return Err(self.error(
                span,
                format!(
                    "assignment mismatch: {} but {}",
                    plural(lhs_count, "variable"),
                    plural(rhs.len(), "value")
                ),
            ));
        }
        rhs.iter().map(|expr| self.value(expr, scope)).collect()
    }

    /// `v, ok := m[k]`, `x.(T)` or `<-ch` in a two-value context: records
    /// the `(T, bool)` tuple and returns `T`.
    fn comma_ok(&mut self, expr: &Expr, scope: ScopeId) -> CheckResult<Option<Type>> {
        let inner = expr.unparen();
        let applies = match &inner.kind {
            ExprKind::Index(_) | ExprKind::TypeAssert(_) => true,
            ExprKind::Unary(unary) => unary.op == UnaryOp::Recv,
            _ => false,
        };
        if !applies {
            return Ok(None);
        }
        let first = self.value(expr, scope)?;
        if let ExprKind::Index(index) = &inner.kind {
            let container = self
                .env
                .types
                .get(&index.x.id)
                .and_then(|desc| desc.single().cloned())
                .unwrap_or_else(Type::invalid);
            if !matches!(container.underlying(), Type::Map(_, _)) {
                return Err(self.error(
                    expr.span,
                    format!("assignment mismatch: 2 variables but {}", plural(1, "value")),
                ));
            }
        }
        let tuple = TypeDescriptor::Tuple(vec![first.clone(), bool_type()]);
        self.record(inner.id, tuple.clone());
        if inner.id != expr.id {
            self.record(expr.id, tuple);
        }
        Ok(Some(first))
    }
}
