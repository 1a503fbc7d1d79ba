//! Type expressions to `Type`.

use std::rc::Rc;

use gs_core::ast::*;

use crate::typing::scope::{ObjectKind, ScopeId};
use crate::typing::types::{
    InterfaceMethod, InterfaceType, Signature, StructField, StructType, Type,
};
use crate::{CheckResult, Checker};

impl<'c, 'e> Checker<'c, 'e> {
    pub(crate) fn resolve_type(&mut self, expr: &Expr, scope: ScopeId) -> CheckResult<Type> {
        match &expr.kind {
            ExprKind::Ident(ident) => {
                let Some((_, id)) = self.tree().lookup_parent(scope, &ident.name) else {
                    return Err(self.error(ident.span, format!("undefined: {}", ident)));
                };
                match self.tree().object(id).kind {
                    ObjectKind::TypeName => self.resolve_object(id),
                    _ => Err(self.error(ident.span, format!("{} is not a type", ident))),
                }
            }
            ExprKind::Selector(selector) => {
                let package = selector
                    .x
                    .as_ident()
                    .and_then(|ident| self.tree().lookup_parent(scope, &ident.name))
                    .and_then(|(_, id)| match &self.tree().object(id).kind {
                        ObjectKind::PkgName { scope, .. } => Some(*scope),
                        _ => None,
                    });
                let Some(package) = package else {
                    let message = format!("{} is not a type", self.render(expr));
                    return Err(self.error(expr.span, message));
                };
                let found = self.tree().lookup(package, &selector.sel.name);
                match found {
                    Some(id) if selector.sel.is_exported() => match self.tree().object(id).kind {
                        ObjectKind::TypeName => self.resolve_object(id),
                        _ => Err(self.error(
                            expr.span,
                            format!("{} is not a type", self.render(expr)),
                        )),
                    },
                    _ => Err(self.error(
                        selector.sel.span,
                        format!("undefined: {}", self.render(expr)),
                    )),
                }
            }
            ExprKind::Paren(inner) => self.resolve_type(inner, scope),
            ExprKind::Star(inner) => Ok(self.resolve_type(inner, scope)?.pointer_to()),
            ExprKind::ArrayType(array) => {
                let elem = self.resolve_type(&array.elem, scope)?;
                let len = match &array.len {
                    Some(len) => {
                        self.value(len, scope)?;
                        let value = self.const_int(len, scope).ok_or_else(|| {
                            self.error(
                                len.span,
                                format!("array length {} must be constant", self.render(len)),
                            )
                        })?;
                        if value < 0 {
                            return Err(self.error(
                                len.span,
                                format!("invalid array length {}", self.render(len)),
                            ));
                        }
                        Some(value as u64)
                    }
                    None => None,
                };
                Ok(Type::Array(len, Box::new(elem)))
            }
            ExprKind::SliceType(elem) => Ok(Type::Slice(Box::new(self.resolve_type(elem, scope)?))),
            ExprKind::MapType(map) => {
                let key = self.resolve_type(&map.key, scope)?;
                let value = self.resolve_type(&map.value, scope)?;
                if matches!(key.underlying(), Type::Slice(_) | Type::Map(_, _) | Type::Func(_)) {
                    return Err(self.error(map.key.span, format!("invalid map key type {}", key)));
                }
                Ok(Type::Map(Box::new(key), Box::new(value)))
            }
            ExprKind::ChanType(chan) => Ok(Type::Chan(
                chan.dir,
                Box::new(self.resolve_type(&chan.value, scope)?),
            )),
            ExprKind::FuncType(func) => Ok(Type::Func(Rc::new(self.signature(func, scope)?))),
            ExprKind::StructType(st) => self.struct_type(st, scope),
            ExprKind::InterfaceType(iface) => self.interface_type(iface, scope),
            ExprKind::Index(_) => Err(self.error(
                expr.span,
                "generic types are not supported",
            )),
            _ => Err(self.error(
                expr.span,
                format!("{} is not a type", self.render(expr)),
            )),
        }
    }

    /// Signature of a function type. A trailing `...T` becomes `[]T`.
    pub(crate) fn signature(&mut self, func: &FuncType, scope: ScopeId) -> CheckResult<Signature> {
        let mut sig = Signature::default();
        let last = func.params.len().saturating_sub(1);
        for (index, field) in func.params.iter().enumerate() {
            let ty = match &field.ty.kind {
                ExprKind::Ellipsis(elem) => {
                    if index != last || field.names.len() > 1 {
                        return Err(self.error(
                            field.ty.span,
                            "can only use ... with final parameter in list",
                        ));
                    }
                    sig.variadic = true;
                    Type::Slice(Box::new(self.resolve_type(elem, scope)?))
                }
                _ => self.resolve_type(&field.ty, scope)?,
            };
            sig.params.extend(std::iter::repeat(ty).take(field.arity()));
        }
        for field in &func.results {
            let ty = self.resolve_type(&field.ty, scope)?;
            sig.results.extend(std::iter::repeat(ty).take(field.arity()));
        }
        Ok(sig)
    }

    fn struct_type(&mut self, st: &gs_core::ast::StructType, scope: ScopeId) -> CheckResult<Type> {
        let mut fields: Vec<StructField> = Vec::new();
        for field in &st.fields {
            let ty = self.resolve_type(&field.ty, scope)?;
            let names: Vec<(String, gs_core::span::Span, bool)> = if field.names.is_empty() {
                let name = embedded_name(&field.ty).unwrap_or_default();
                vec![(name, field.ty.span, true)]
            } else {
                field
                    .names
                    .iter()
                    .map(|name| (name.name.clone(), name.span, false))
                    .collect()
            };
            for (name, span, embedded) in names {
                if name != BLANK && fields.iter().any(|existing| existing.name == name) {
                    return Err(self.error(span, format!("{} redeclared", name)));
                }
                fields.push(StructField {
                    name,
                    ty: ty.clone(),
                    embedded,
                });
            }
        }
        Ok(Type::Struct(Rc::new(StructType { fields })))
    }

    fn interface_type(
        &mut self,
        iface: &gs_core::ast::InterfaceType,
        scope: ScopeId,
    ) -> CheckResult<Type> {
        let mut out = InterfaceType::default();
        for elem in &iface.elems {
            match elem {
                InterfaceElem::Method { name, ty } => {
                    if out.methods.iter().any(|method| method.name == name.name) {
                        return Err(self.error(name.span, format!("duplicate method {}", name)));
                    }
                    let sig = self.signature(ty, scope)?;
                    out.methods.push(InterfaceMethod {
                        name: name.name.clone(),
                        sig: Rc::new(sig),
                    });
                }
                InterfaceElem::Embedded(expr) => {
                    let ty = self.resolve_type(expr, scope)?;
                    // An embedded type that is still being declared is accepted
                    // as is; anything else must be an interface.
                    if !ty.is_interface() && !ty.underlying().is_invalid() {
                        return Err(self.error(
                            expr.span,
                            format!(
                                "cannot use {} as interface element: \
                                 type constraints are not supported",
                                ty
                            ),
                        ));
                    }
                    out.embedded.push(ty);
                }
            }
        }
        Ok(Type::Interface(Rc::new(out)))
    }
}

/// Field name of an embedded field: `T`, `*T` and `pkg.T` all embed as `T`.
fn embedded_name(expr: &Expr) -> Option<String> {
    match &expr.unparen().kind {
        ExprKind::Ident(ident) => Some(ident.name.clone()),
        ExprKind::Star(inner) => embedded_name(inner),
        ExprKind::Selector(selector) => Some(selector.sel.name.clone()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_names_strip_pointers_and_packages() {
        let fset = gs_core::span::FileSet::new();
        let base = Expr::ident(&fset, "Reader");
        let star = Expr::synthetic(&fset, ExprKind::Star(Box::new(base.clone())));
        assert_eq!(embedded_name(&star).as_deref(), Some("Reader"));
        let qualified = Expr::synthetic(
            &fset,
            ExprKind::Selector(SelectorExpr {
                x: Box::new(Expr::ident(&fset, "io")),
                sel: Ident::new("Writer"),
            }),
        );
        assert_eq!(embedded_name(&qualified).as_deref(), Some("Writer"));
    }
}
