//! Statement checking and scope construction for function bodies.

use std::collections::HashSet;

use gs_core::ast::*;
use itertools::Itertools;

use crate::typing::infer_expr::{Callee, Operand};
use crate::typing::lookup::assignable;
use crate::typing::scope::{Object, ObjectKind, ScopeId, ScopeKind};
use crate::typing::types::{BasicKind, Type, TypeDescriptor};
use crate::{CheckResult, Checker};

impl<'c, 'e> Checker<'c, 'e> {
    pub(crate) fn stmts(&mut self, stmts: &[Stmt], scope: ScopeId) -> CheckResult<()> {
        for stmt in stmts {
            self.stmt(stmt, scope)?;
        }
        Ok(())
    }

    /// Check a block in a new scope below `parent`.
    fn block(&mut self, block: &BlockStmt, parent: ScopeId) -> CheckResult<()> {
        let scope = self.push_scope(parent, ScopeKind::Block, block.id);
        self.stmts(&block.stmts, scope)
    }

    fn stmt(&mut self, stmt: &Stmt, scope: ScopeId) -> CheckResult<()> {
        match stmt {
            Stmt::Decl(gen) => self.local_decl(gen, scope),
            Stmt::Empty | Stmt::Branch(_) => Ok(()),
            Stmt::Labeled(labeled) => match &labeled.stmt {
                Some(inner) => self.stmt(inner, scope),
                None => Ok(()),
            },
            Stmt::Expr(stmt) => self.expr_stmt(&stmt.x, scope),
            Stmt::Send(send) => {
                let chan = self.value(&send.chan, scope)?;
                let Type::Chan(dir, elem) = chan.underlying() else {
                    return Err(self.error(
                        send.chan.span,
                        format!(
                            "invalid operation: cannot send to non-channel {}",
                            self.describe(&send.chan, &chan)
                        ),
                    ));
                };
                if dir == ChanDir::Recv {
                    return Err(self.error(
                        send.chan.span,
                        format!(
                            "invalid operation: cannot send to receive-only channel {}",
                            self.describe(&send.chan, &chan)
                        ),
                    ));
                }
                let value = self.value(&send.value, scope)?;
                self.check_assignable(&send.value, &value, &elem, "send")
            }
            Stmt::IncDec(stmt) => {
                let ty = self.value(&stmt.x, scope)?;
                if !ty.basic().is_some_and(|kind| kind.is_numeric()) {
                    return Err(self.error(
                        stmt.x.span,
                        format!(
                            "invalid operation: {}{} (non-numeric type {})",
                            self.render(&stmt.x),
                            if stmt.inc { "++" } else { "--" },
                            ty
                        ),
                    ));
                }
                Ok(())
            }
            Stmt::Assign(assign) => self.assign(assign, scope),
            Stmt::Go(expr) => self.call_stmt(expr, scope, "go"),
            Stmt::Defer(expr) => self.call_stmt(expr, scope, "defer"),
            Stmt::Return(ret) => self.return_stmt(ret, scope),
            Stmt::Block(block) => self.block(block, scope),
            Stmt::If(stmt) => self.if_stmt(stmt, scope),
            Stmt::Switch(stmt) => self.switch_stmt(stmt, scope),
            Stmt::TypeSwitch(stmt) => self.type_switch_stmt(stmt, scope),
            Stmt::Select(stmt) => {
                for clause in &stmt.clauses {
                    let inner = self.push_scope(scope, ScopeKind::Block, clause.id);
                    if let Some(comm) = &clause.comm {
                        self.stmt(comm, inner)?;
                    }
                    self.stmts(&clause.body, inner)?;
                }
                Ok(())
            }
            Stmt::For(stmt) => {
                let inner = self.push_scope(scope, ScopeKind::Block, stmt.id);
                if let Some(init) = &stmt.init {
                    self.stmt(init, inner)?;
                }
                if let Some(cond) = &stmt.cond {
                    self.condition(cond, inner, "for")?;
                }
                if let Some(post) = &stmt.post {
                    self.stmt(post, inner)?;
                }
                self.block(&stmt.body, inner)
            }
            Stmt::Range(stmt) => self.range_stmt(stmt, scope),
        }
    }

    fn not_used(&self, expr: &Expr, desc: &TypeDescriptor) -> gs_core::error::TypeCheckError {
        let description = match desc {
            TypeDescriptor::Single(ty) => self.describe(expr, ty),
            TypeDescriptor::Tuple(_) => format!("{} (value of type {})", self.render(expr), desc),
        };
        self.error(expr.span, format!("{} is not used", description))
    }

    fn expr_stmt(&mut self, x: &Expr, scope: ScopeId) -> CheckResult<()> {
        if let ExprKind::Call(call) = &x.kind {
            let (desc, callee) = self.call(x, call, scope)?;
            self.record(x.id, desc.clone());
            return match callee {
                Callee::Func => Ok(()),
                Callee::Builtin(builtin) if builtin.allowed_as_statement() => Ok(()),
                _ => Err(self.not_used(x, &desc)),
            };
        }
        let desc = self.expr_desc(x, scope)?;
        match &x.unparen().kind {
            ExprKind::Unary(unary) if unary.op == UnaryOp::Recv => Ok(()),
            ExprKind::Call(_) => Ok(()),
            _ => Err(self.not_used(x, &desc)),
        }
    }

    fn call_stmt(&mut self, expr: &Expr, scope: ScopeId, keyword: &str) -> CheckResult<()> {
        let ExprKind::Call(call) = &expr.unparen().kind else {
            return Err(self.error(
                expr.span,
                format!("expression in {} must be function call", keyword),
            ));
        };
        let (desc, callee) = self.call(expr.unparen(), call, scope)?;
        self.record(expr.unparen().id, desc.clone());
        match callee {
            Callee::Conversion => Err(self.error(
                expr.span,
                format!("{} requires function call, not conversion", keyword),
            )),
            Callee::Builtin(builtin) if !builtin.allowed_as_statement() => Err(self.error(
                expr.span,
                format!("{} discards result of {}", keyword, self.render(expr)),
            )),
            _ => Ok(()),
        }
    }

    fn condition(&mut self, cond: &Expr, scope: ScopeId, keyword: &str) -> CheckResult<()> {
        let ty = self.value(cond, scope)?;
        if !ty.basic().is_some_and(|kind| kind.is_boolean()) {
            return Err(self.error(
                cond.span,
                format!(
                    "non-boolean condition in {} statement",
                    keyword
                ),
            ));
        }
        Ok(())
    }

    fn assign(&mut self, assign: &AssignStmt, scope: ScopeId) -> CheckResult<()> {
        match assign.tok {
            AssignOp::Define => self.define(assign, scope),
            AssignOp::Assign => {
                let mut targets = Vec::with_capacity(assign.lhs.len());
                for lhs in &assign.lhs {
                    targets.push(match lhs.is_blank() {
                        true => None,
                        false => Some(self.value(lhs, scope)?),
                    });
                }
                let values = self.rhs_types(assign.lhs.len(), &assign.rhs, scope)?;
                for (index, (target, value)) in targets.iter().zip(&values).enumerate() {
                    let expr = assign.rhs.get(index).unwrap_or(&assign.rhs[0]);
                    match target {
                        Some(target) => self.check_assignable(expr, value, target, "assignment")?,
                        None if matches!(value, Type::Basic(BasicKind::UntypedNil)) => {
                            return Err(self.error(expr.span, "use of untyped nil in assignment"))
                        }
                        None => {}
                    }
                }
                Ok(())
            }
            AssignOp::Op(op) => {
                let (Some(lhs), Some(rhs)) = (assign.lhs.first(), assign.rhs.first()) else {
                    return Err(self.error(
                        assign.span,
                        "assignment operation requires single-valued expressions",
                    ));
                };
                if assign.lhs.len() != 1 || assign.rhs.len() != 1 {
                    return Err(self.error(
                        assign.span,
                        format!(
                            "assignment operation {} requires single-valued expressions",
                            op.as_str()
                        ),
                    ));
                }
                let target = self.value(lhs, scope)?;
                let value = self.value(rhs, scope)?;
                if op.is_shift() {
                    return Ok(());
                }
                if self.unify(&target, &value).is_none() {
                    return Err(self.error(
                        assign.span,
                        format!(
                            "invalid operation: {} {}= {} (mismatched types {} and {})",
                            self.render(lhs),
                            op.as_str(),
                            self.render(rhs),
                            target,
                            value
                        ),
                    ));
                }
                Ok(())
            }
        }
    }

    fn define(&mut self, assign: &AssignStmt, scope: ScopeId) -> CheckResult<()> {
        let mut names = Vec::with_capacity(assign.lhs.len());
        let mut seen = HashSet::new();
        for lhs in &assign.lhs {
            let Some(ident) = lhs.as_ident() else {
                return Err(self.error(
                    lhs.span,
                    format!("non-name {} on left side of :=", self.render(lhs)),
                ));
            };
            if !ident.is_blank() && !seen.insert(ident.name.clone()) {
                return Err(self.error(
                    ident.span,
                    format!("{} repeated on left side of :=", ident),
                ));
            }
            names.push((lhs, ident));
        }
        let fresh = names.iter().any(|(_, ident)| {
            !ident.is_blank() && self.tree().lookup(scope, &ident.name).is_none()
        });
        if !fresh {
            return Err(self.error(assign.span, "no new variables on left side of :="));
        }

        let values = self.rhs_types(assign.lhs.len(), &assign.rhs, scope)?;
        for (index, ((lhs, ident), value)) in names.into_iter().zip(values).enumerate() {
            let rhs = assign.rhs.get(index).unwrap_or(&assign.rhs[0]);
            if matches!(value, Type::Basic(BasicKind::UntypedNil)) {
                return Err(self.error(rhs.span, "use of untyped nil in assignment"));
            }
            if ident.is_blank() {
                continue;
            }
            let ty = match self.tree().lookup(scope, &ident.name) {
                Some(existing) => {
                    let target = self
                        .tree()
                        .object(existing)
                        .ty
                        .clone()
                        .unwrap_or_else(Type::invalid);
                    self.check_assignable(rhs, &value, &target, "assignment")?;
                    target
                }
                None => {
                    let ty = value.default_type();
                    let object = Object::new(ident.name.clone(), ObjectKind::Var, Some(ty.clone()))
                        .with_span(ident.span);
                    self.declare(scope, object)?;
                    ty
                }
            };
            self.record(lhs.id, TypeDescriptor::Single(ty));
        }
        Ok(())
    }

    fn return_stmt(&mut self, ret: &ReturnStmt, scope: ScopeId) -> CheckResult<()> {
        let Some(context) = self.results.last().cloned() else {
            return Err(self.error(ret.span, "return statement outside function"));
        };
        let want = || format!("({})", context.results.iter().join(", "));
        if ret.results.is_empty() {
            if context.results.is_empty() || context.named_results {
                return Ok(());
            }
            return Err(self.error(
                ret.span,
                format!("not enough return values\n\thave ()\n\twant {}", want()),
            ));
        }
        if context.results.is_empty() {
            return Err(self.error(
                ret.span,
                format!("too many return values\n\thave ({})\n\twant ()", self.have(&ret.results)),
            ));
        }

        let values: Vec<(Type, &Expr)> = match ret.results.as_slice() {
            [single]
                if context.results.len() != 1
                    && matches!(single.unparen().kind, ExprKind::Call(_)) =>
            {
                let desc = self.expr_desc(single, scope)?;
                desc.components().iter().cloned().map(|ty| (ty, single)).collect()
            }
            results => {
                let mut values = Vec::with_capacity(results.len());
                for (index, expr) in results.iter().enumerate() {
                    let hint = context.results.get(index).cloned();
                    values.push((self.value_hint(expr, scope, hint.as_ref())?, expr));
                }
                values
            }
        };
        if values.len() != context.results.len() {
            let have = format!("({})", values.iter().map(|(ty, _)| ty).join(", "));
            let few = values.len() < context.results.len();
            return Err(self.error(
                ret.span,
                format!(
                    "{} return values\n\thave {}\n\twant {}",
                    if few { "not enough" } else { "too many" },
                    have,
                    want()
                ),
            ));
        }
        for ((value, expr), target) in values.iter().zip(&context.results) {
            self.check_assignable(expr, value, target, "return statement")?;
        }
        Ok(())
    }

    fn have(&self, results: &[Expr]) -> String {
        results.iter().map(|expr| self.render(expr)).join(", ")
    }

    fn if_stmt(&mut self, stmt: &IfStmt, parent: ScopeId) -> CheckResult<()> {
        let scope = self.push_scope(parent, ScopeKind::Block, stmt.id);
        if let Some(init) = &stmt.init {
            self.stmt(init, scope)?;
        }
        self.condition(&stmt.cond, scope, "if")?;
        self.block(&stmt.then, scope)?;
        match stmt.els.as_deref() {
            Some(Stmt::Block(block)) => self.block(block, scope),
            Some(other) => self.stmt(other, scope),
            None => Ok(()),
        }
    }

    fn switch_stmt(&mut self, stmt: &SwitchStmt, parent: ScopeId) -> CheckResult<()> {
        let scope = self.push_scope(parent, ScopeKind::Block, stmt.id);
        if let Some(init) = &stmt.init {
            self.stmt(init, scope)?;
        }
        let tag = match &stmt.tag {
            Some(tag) => Some((self.value(tag, scope)?.default_type(), tag)),
            None => None,
        };
        let mut defaults = 0;
        for clause in &stmt.clauses {
            if clause.is_default {
                defaults += 1;
                if defaults > 1 {
                    return Err(self.error(
                        gs_core::span::Span::null(),
                        "multiple defaults in switch",
                    ));
                }
            }
            for expr in &clause.list {
                let ty = self.value(expr, scope)?;
                match &tag {
                    Some((tag_ty, tag_expr)) => {
                        let comparable = self.unify(&ty, tag_ty).is_some()
                            || assignable(&ty, tag_ty)
                            || assignable(tag_ty, &ty);
                        if !comparable {
                            return Err(self.error(
                                expr.span,
                                format!(
                                    "invalid case {} in switch on {} (mismatched types {} and {})",
                                    self.render(expr),
                                    self.render(tag_expr),
                                    ty,
                                    tag_ty
                                ),
                            ));
                        }
                    }
                    None => {
                        if !ty.basic().is_some_and(|kind| kind.is_boolean()) {
                            return Err(self.error(
                                expr.span,
                                format!(
                                    "invalid case {} in switch (mismatched types {} and bool)",
                                    self.render(expr),
                                    ty
                                ),
                            ));
                        }
                    }
                }
            }
            let inner = self.push_scope(scope, ScopeKind::Block, clause.id);
            self.stmts(&clause.body, inner)?;
        }
        Ok(())
    }

    fn type_switch_stmt(&mut self, stmt: &TypeSwitchStmt, parent: ScopeId) -> CheckResult<()> {
        let scope = self.push_scope(parent, ScopeKind::Block, stmt.id);
        if let Some(init) = &stmt.init {
            self.stmt(init, scope)?;
        }
        let x = self.value(&stmt.x, scope)?;
        if !x.is_interface() {
            return Err(self.error(
                stmt.x.span,
                format!("{} is not an interface", self.describe(&stmt.x, &x)),
            ));
        }

        for clause in &stmt.clauses {
            let mut types = Vec::with_capacity(clause.list.len());
            for expr in &clause.list {
                match self.expr(expr, scope)? {
                    Operand::Type(ty) => types.push(Some(ty)),
                    Operand::Value(TypeDescriptor::Single(Type::Basic(BasicKind::UntypedNil))) => {
                        types.push(None)
                    }
                    _ => {
                        return Err(self.error(
                            expr.span,
                            format!("{} is not a type", self.render(expr)),
                        ))
                    }
                }
            }
            let inner = self.push_scope(scope, ScopeKind::Block, clause.id);
            if let Some(binding) = &stmt.binding {
                let ty = match types.as_slice() {
                    [Some(single)] => single.clone(),
                    _ => x.clone(),
                };
                if !binding.is_blank() {
                    let object = Object::new(binding.name.clone(), ObjectKind::Var, Some(ty))
                        .with_span(binding.span);
                    self.declare(inner, object)?;
                }
            }
            self.stmts(&clause.body, inner)?;
        }
        Ok(())
    }

    fn range_stmt(&mut self, stmt: &RangeStmt, parent: ScopeId) -> CheckResult<()> {
        let scope = self.push_scope(parent, ScopeKind::Block, stmt.id);
        let x = self.value(&stmt.x, parent)?;
        let int = Type::Basic(BasicKind::Int);
        let (key, value): (Type, Option<Type>) = match x.underlying() {
            Type::Basic(kind) if kind.is_string() => (int, Some(Type::Basic(BasicKind::Int32))),
            Type::Basic(kind) if kind.is_integer() => (x.default_type(), None),
            Type::Slice(elem) | Type::Array(_, elem) => (int, Some(*elem)),
            Type::Pointer(inner) => match inner.underlying() {
                Type::Array(_, elem) => (int, Some(*elem)),
                _ => return Err(self.cannot_range(&stmt.x, &x)),
            },
            Type::Map(key, value) => (*key, Some(*value)),
            Type::Chan(ChanDir::Send, _) => {
                return Err(self.error(
                    stmt.x.span,
                    format!(
                        "invalid operation: range {} receive from send-only channel",
                        self.render(&stmt.x)
                    ),
                ))
            }
            Type::Chan(_, elem) => (*elem, None),
            _ => return Err(self.cannot_range(&stmt.x, &x)),
        };
        if stmt.value.is_some() && value.is_none() {
            return Err(self.error(
                stmt.x.span,
                format!(
                    "range over {} permits only one iteration variable",
                    self.describe(&stmt.x, &x)
                ),
            ));
        }

        let targets = [(stmt.key.as_ref(), Some(key)), (stmt.value.as_ref(), value)];
        for (target, ty) in targets {
            let (Some(target), Some(ty)) = (target, ty) else {
                continue;
            };
            match stmt.tok {
                Some(AssignOp::Define) => {
                    let Some(ident) = target.as_ident() else {
                        return Err(self.error(
                            target.span,
                            format!("non-name {} on left side of :=", self.render(target)),
                        ));
                    };
                    if ident.is_blank() {
                        continue;
                    }
                    let object = Object::new(ident.name.clone(), ObjectKind::Var, Some(ty.clone()))
                        .with_span(ident.span);
                    self.declare(scope, object)?;
                    self.record(target.id, TypeDescriptor::Single(ty));
                }
                _ => {
                    if target.is_blank() {
                        continue;
                    }
                    let current = self.value(target, scope)?;
                    self.check_assignable(target, &ty, &current, "range")?;
                }
            }
        }
        self.block(&stmt.body, scope)
    }

    fn cannot_range(&self, x: &Expr, ty: &Type) -> gs_core::error::TypeCheckError {
        self.error(
            x.span,
            format!("cannot range over {}", self.describe(x, ty)),
        )
    }
}
