//! Rewrites the statements of one function unit.
//!
//! Assignments that bind an error-typed value to `_` get a synthetic variable
//! in place of the blank, and bare expression statements whose results
//! include an error become explicit assignments. Each rewritten statement is
//! followed by one guard per variable. Function literals are left alone: the
//! driver visits them as units of their own.
//!
//! A `:=` keeps its token. At the top of the body it reuses the injected
//! declaration. Inside a nested block it declares its variables itself, so
//! those come from a separate pool that the declaration does not name.

use gs_core::ast::*;
use gs_core::diagnostics::Diagnostic;
use gs_core::span::{FileSet, Span};
use gs_golang::GoSerializer;
use gs_typing::{ScopeId, Type, TypeDescriptor, TypeInfo};
use tracing::trace;

use crate::guard;
use crate::names::{ErrVar, NameAllocator};

/// What became of one statement.
#[derive(Debug)]
pub enum Rewrite {
    /// Kept in place. Nested statement lists may still have been rewritten.
    Unchanged(Stmt),
    /// Replaced by the rewritten statement followed by its guards.
    Expanded(Vec<Stmt>),
    /// The statement's initializer moved out in front of it. The prelude and
    /// the statement share a new block so the initializer keeps its scope.
    Hoisted { prelude: Vec<Stmt>, stmt: Stmt },
}

impl Rewrite {
    /// Collapse into a single statement, wrapping in a block when needed.
    pub fn into_stmt(self, fset: &FileSet) -> Stmt {
        match self {
            Rewrite::Unchanged(stmt) => stmt,
            Rewrite::Expanded(stmts) => Stmt::Block(BlockStmt::synthetic(fset, stmts)),
            Rewrite::Hoisted { mut prelude, stmt } => {
                prelude.push(stmt);
                Stmt::Block(BlockStmt::synthetic(fset, prelude))
            }
        }
    }

    fn append_to(self, fset: &FileSet, out: &mut Vec<Stmt>) {
        match self {
            Rewrite::Unchanged(stmt) => out.push(stmt),
            Rewrite::Expanded(stmts) => out.extend(stmts),
            hoisted @ Rewrite::Hoisted { .. } => out.push(hoisted.into_stmt(fset)),
        }
    }
}

/// Counters and results of one unit's rewrite.
#[derive(Debug, Default)]
pub struct UnitOutcome {
    pub vars: Vec<ErrVar>,
    /// Variables named by the injected declaration.
    pub declared: Vec<ErrVar>,
    pub diagnostics: Vec<Diagnostic>,
    pub statements: usize,
    pub guards: usize,
}

pub struct UnitRewriter<'a> {
    info: &'a TypeInfo,
    fset: &'a FileSet,
    names: NameAllocator<'a>,
    diagnostics: Vec<Diagnostic>,
    /// Nesting below the unit body; zero for the body's own statements.
    depth: usize,
    statements: usize,
    guards: usize,
}

impl<'a> UnitRewriter<'a> {
    /// `root` is the scope of the unit's function type.
    pub fn new(info: &'a TypeInfo, fset: &'a FileSet, root: ScopeId) -> Self {
        Self {
            info,
            fset,
            names: NameAllocator::new(&info.scope_tree, root),
            diagnostics: Vec::new(),
            depth: 0,
            statements: 0,
            guards: 0,
        }
    }

    /// Rewrite the body and inject the declaration of every variable used.
    pub fn rewrite_body(mut self, body: &mut BlockStmt) -> UnitOutcome {
        self.rewrite_list(&mut body.stmts);
        let declared = self.names.vars().to_vec();
        if self.diagnostics.is_empty() {
            guard::inject_declaration(self.fset, body, &declared);
        }
        UnitOutcome {
            vars: self.names.into_all(),
            declared,
            diagnostics: self.diagnostics,
            statements: self.statements,
            guards: self.guards,
        }
    }

    fn rewrite_list(&mut self, stmts: &mut Vec<Stmt>) {
        let mut out = Vec::with_capacity(stmts.len());
        for stmt in std::mem::take(stmts) {
            self.rewrite_stmt(stmt).append_to(self.fset, &mut out);
        }
        *stmts = out;
    }

    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        self.depth += 1;
        let out = f(self);
        self.depth -= 1;
        out
    }

    fn rewrite_nested(&mut self, stmts: &mut Vec<Stmt>) {
        self.nested(|this| this.rewrite_list(stmts))
    }

    pub fn rewrite_stmt(&mut self, stmt: Stmt) -> Rewrite {
        match stmt {
            Stmt::Assign(mut assign) => match assign.tok {
                AssignOp::Assign | AssignOp::Define => {
                    let vars = self.assign(&mut assign);
                    self.expand(Stmt::Assign(assign), &vars)
                }
                AssignOp::Op(_) => Rewrite::Unchanged(Stmt::Assign(assign)),
            },
            Stmt::Expr(expr) => self.expr_stmt(expr),
            Stmt::Labeled(LabeledStmt {
                label,
                stmt: Some(inner),
            }) => self.labeled(label, *inner),
            Stmt::Block(mut block) => {
                self.rewrite_nested(&mut block.stmts);
                Rewrite::Unchanged(Stmt::Block(block))
            }
            Stmt::If(stmt) => self.if_stmt(stmt),
            Stmt::Switch(mut stmt) => {
                for clause in &mut stmt.clauses {
                    self.rewrite_nested(&mut clause.body);
                }
                match self.hoist(&mut stmt.init) {
                    Some(prelude) => Rewrite::Hoisted {
                        prelude,
                        stmt: Stmt::Switch(stmt),
                    },
                    None => Rewrite::Unchanged(Stmt::Switch(stmt)),
                }
            }
            Stmt::TypeSwitch(mut stmt) => {
                for clause in &mut stmt.clauses {
                    self.rewrite_nested(&mut clause.body);
                }
                match self.hoist(&mut stmt.init) {
                    Some(prelude) => Rewrite::Hoisted {
                        prelude,
                        stmt: Stmt::TypeSwitch(stmt),
                    },
                    None => Rewrite::Unchanged(Stmt::TypeSwitch(stmt)),
                }
            }
            Stmt::Select(mut stmt) => {
                for clause in &mut stmt.clauses {
                    self.comm_clause(clause);
                }
                Rewrite::Unchanged(Stmt::Select(stmt))
            }
            Stmt::For(mut stmt) => {
                if declares_loop_variables(&stmt.init) {
                    self.loop_header(&mut stmt.init, "initializer");
                }
                self.loop_header(&mut stmt.post, "post statement");
                self.rewrite_nested(&mut stmt.body.stmts);
                match self.hoist(&mut stmt.init) {
                    Some(prelude) => Rewrite::Hoisted {
                        prelude,
                        stmt: Stmt::For(stmt),
                    },
                    None => Rewrite::Unchanged(Stmt::For(stmt)),
                }
            }
            Stmt::Range(mut stmt) => {
                self.rewrite_nested(&mut stmt.body.stmts);
                Rewrite::Unchanged(Stmt::Range(stmt))
            }
            other => Rewrite::Unchanged(other),
        }
    }

    /// The label stays on the statement it named.
    fn labeled(&mut self, label: Ident, inner: Stmt) -> Rewrite {
        let attach = |label: Ident, stmt: Stmt| {
            Stmt::Labeled(LabeledStmt {
                label,
                stmt: Some(Box::new(stmt)),
            })
        };
        match self.rewrite_stmt(inner) {
            Rewrite::Unchanged(stmt) => Rewrite::Unchanged(attach(label, stmt)),
            Rewrite::Expanded(mut stmts) => {
                let first = stmts.remove(0);
                stmts.insert(0, attach(label, first));
                Rewrite::Expanded(stmts)
            }
            Rewrite::Hoisted { prelude, stmt } => Rewrite::Hoisted {
                prelude,
                stmt: attach(label, stmt),
            },
        }
    }

    fn if_stmt(&mut self, mut stmt: IfStmt) -> Rewrite {
        self.rewrite_nested(&mut stmt.then.stmts);
        if let Some(els) = stmt.els.take() {
            let els = self.nested(|this| this.rewrite_stmt(*els)).into_stmt(self.fset);
            stmt.els = Some(Box::new(els));
        }
        match self.hoist(&mut stmt.init) {
            Some(prelude) => Rewrite::Hoisted {
                prelude,
                stmt: Stmt::If(stmt),
            },
            None => Rewrite::Unchanged(Stmt::If(stmt)),
        }
    }

    /// Take a rewritten initializer out of its statement header.
    fn hoist(&mut self, init: &mut Option<Box<Stmt>>) -> Option<Vec<Stmt>> {
        let stmt = init.take()?;
        match self.nested(|this| this.rewrite_stmt(*stmt)) {
            Rewrite::Unchanged(stmt) => {
                *init = Some(Box::new(stmt));
                None
            }
            Rewrite::Expanded(stmts) => Some(stmts),
            hoisted @ Rewrite::Hoisted { .. } => Some(vec![hoisted.into_stmt(self.fset)]),
        }
    }

    /// A post statement runs on every iteration and a `:=` initializer
    /// declares the loop's own variables, so a guard has nowhere to go.
    fn loop_header(&mut self, slot: &mut Option<Box<Stmt>>, what: &str) {
        let Some(stmt) = slot.take() else {
            return;
        };
        let span = stmt.span();
        let rendered = GoSerializer::new()
            .serialize_stmt(&stmt)
            .map(|code| code.trim_end().to_string())
            .unwrap_or_default();
        match self.nested(|this| this.rewrite_stmt(*stmt)) {
            Rewrite::Unchanged(stmt) => *slot = Some(Box::new(stmt)),
            rewritten => {
                self.diagnostics.push(
                    Diagnostic::error(format!(
                        "cannot check discarded error in for loop {}: {}",
                        what, rendered
                    ))
                    .with_span(span)
                    .with_suggestion(
                        "assign the error to a variable and check it in the loop body",
                    ),
                );
                *slot = Some(Box::new(rewritten.into_stmt(self.fset)));
            }
        }
    }

    /// A rewritten communication keeps its place; the guards open the body.
    fn comm_clause(&mut self, clause: &mut CommClause) {
        self.rewrite_nested(&mut clause.body);
        let Some(comm) = clause.comm.take() else {
            return;
        };
        match self.nested(|this| this.rewrite_stmt(*comm)) {
            Rewrite::Expanded(mut stmts) => {
                let comm = stmts.remove(0);
                clause.comm = Some(Box::new(comm));
                stmts.append(&mut clause.body);
                clause.body = stmts;
            }
            other => clause.comm = Some(Box::new(other.into_stmt(self.fset))),
        }
    }

    fn expand(&mut self, stmt: Stmt, vars: &[ErrVar]) -> Rewrite {
        if vars.is_empty() {
            return Rewrite::Unchanged(stmt);
        }
        trace!(vars = vars.len(), "rewrote statement");
        self.statements += 1;
        self.guards += vars.len();
        let mut stmts = Vec::with_capacity(vars.len() + 1);
        stmts.push(stmt);
        stmts.extend(guard::guards(self.fset, vars));
        Rewrite::Expanded(stmts)
    }

    /// Replace blank targets bound to errors. Returns the variables that took
    /// their place, in positional order.
    fn assign(&mut self, assign: &mut AssignStmt) -> Vec<ErrVar> {
        if !assign.lhs.iter().any(Expr::is_blank) {
            return Vec::new();
        }
        let Some(types) = self.assign_types(assign) else {
            return Vec::new();
        };
        let positions: Vec<usize> = assign
            .lhs
            .iter()
            .zip(&types)
            .enumerate()
            .filter(|(_, (target, ty))| target.is_blank() && ty.is_error())
            .map(|(index, _)| index)
            .collect();
        if positions.is_empty() {
            return Vec::new();
        }
        let vars = if assign.tok == AssignOp::Define && self.depth > 0 {
            self.names.allocate_local(positions.len()).to_vec()
        } else {
            self.names.allocate(positions.len()).to_vec()
        };
        for (position, var) in positions.into_iter().zip(&vars) {
            assign.lhs[position] = var.expr(self.fset);
        }
        vars
    }

    /// Type of each assigned value: one per right-hand expression, or the
    /// components of a single multi-value expression.
    fn assign_types(&mut self, assign: &AssignStmt) -> Option<Vec<Type>> {
        if assign.lhs.len() == assign.rhs.len() {
            let mut types = Vec::with_capacity(assign.rhs.len());
            for expr in &assign.rhs {
                match self.type_of(expr)? {
                    TypeDescriptor::Single(ty) => types.push(ty.clone()),
                    tuple => {
                        let message = format!(
                            "multi-value {} ({}) assigned to a single target",
                            self.render(expr),
                            tuple
                        );
                        self.fail(message, assign.span);
                        return None;
                    }
                }
            }
            return Some(types);
        }
        if let [expr] = assign.rhs.as_slice() {
            let desc = self.type_of(expr)?;
            if desc.len() == assign.lhs.len() {
                return Some(desc.components().to_vec());
            }
            let message = format!(
                "{} yields {} values for {} targets",
                self.render(expr),
                desc.len(),
                assign.lhs.len()
            );
            self.fail(message, assign.span);
            return None;
        }
        let message = format!(
            "unexpected assignment shape: {} targets and {} values",
            assign.lhs.len(),
            assign.rhs.len()
        );
        self.fail(message, assign.span);
        None
    }

    /// `f()` with error results becomes `_, err0 = f()`.
    fn expr_stmt(&mut self, stmt: ExprStmt) -> Rewrite {
        let Some(desc) = self.type_of(&stmt.x) else {
            return Rewrite::Unchanged(Stmt::Expr(stmt));
        };
        let count = desc.components().iter().filter(|ty| ty.is_error()).count();
        if count == 0 {
            return Rewrite::Unchanged(Stmt::Expr(stmt));
        }
        let vars = self.names.allocate(count).to_vec();
        let mut next = vars.iter();
        let mut lhs = Vec::with_capacity(desc.len());
        for ty in desc.components() {
            let target = if ty.is_error() { next.next() } else { None };
            lhs.push(match target {
                Some(var) => var.expr(self.fset),
                None => Expr::ident(self.fset, BLANK),
            });
        }
        let span = stmt.x.span;
        let assign = AssignStmt {
            lhs,
            tok: AssignOp::Assign,
            rhs: vec![stmt.x],
            span,
        };
        self.expand(Stmt::Assign(assign), &vars)
    }

    fn type_of(&mut self, expr: &Expr) -> Option<&'a TypeDescriptor> {
        let info = self.info;
        let desc = info.type_of(expr.id);
        if desc.is_none() {
            let message = format!("no type recorded for {}", self.render(expr));
            self.fail(message, expr.span);
        }
        desc
    }

    fn fail(&mut self, message: String, span: Span) {
        self.diagnostics.push(Diagnostic::error(message).with_span(span));
    }

    fn render(&self, expr: &Expr) -> String {
        GoSerializer::new()
            .serialize_expr(expr)
            .unwrap_or_else(|_| "expression".to_string())
    }
}

/// `for i := ...; ...` declares variables scoped to the loop.
fn declares_loop_variables(init: &Option<Box<Stmt>>) -> bool {
    matches!(init.as_deref(), Some(Stmt::Assign(assign)) if matches!(assign.tok, AssignOp::Define))
}
