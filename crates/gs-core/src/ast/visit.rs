//! Mutable tree traversal.
//!
//! Every `visit_*` method defaults to the matching `walk_*` function, so an
//! implementation overrides only the nodes it cares about and calls the walk
//! function itself when it wants to keep descending.

use crate::ast::*;

pub trait VisitMut {
    fn visit_decl_mut(&mut self, decl: &mut Decl) {
        walk_decl_mut(self, decl)
    }

    fn visit_stmt_mut(&mut self, stmt: &mut Stmt) {
        walk_stmt_mut(self, stmt)
    }

    fn visit_block_mut(&mut self, block: &mut BlockStmt) {
        walk_block_mut(self, block)
    }

    fn visit_expr_mut(&mut self, expr: &mut Expr) {
        walk_expr_mut(self, expr)
    }

    fn visit_func_lit_mut(&mut self, lit: &mut FuncLit) {
        walk_func_lit_mut(self, lit)
    }

    fn visit_func_type_mut(&mut self, ty: &mut FuncType) {
        walk_func_type_mut(self, ty)
    }
}

pub fn walk_file_mut<V: VisitMut + ?Sized>(v: &mut V, file: &mut File) {
    for decl in &mut file.decls {
        v.visit_decl_mut(decl);
    }
}

pub fn walk_decl_mut<V: VisitMut + ?Sized>(v: &mut V, decl: &mut Decl) {
    match decl {
        Decl::Gen(gen) => walk_gen_decl_mut(v, gen),
        Decl::Func(func) => {
            if let Some(recv) = &mut func.recv {
                walk_field_mut(v, recv);
            }
            v.visit_func_type_mut(&mut func.ty);
            if let Some(body) = &mut func.body {
                v.visit_block_mut(body);
            }
        }
    }
}

pub fn walk_gen_decl_mut<V: VisitMut + ?Sized>(v: &mut V, gen: &mut GenDecl) {
    for spec in &mut gen.specs {
        match spec {
            Spec::Import(_) => {}
            Spec::Value(value) => {
                if let Some(ty) = &mut value.ty {
                    v.visit_expr_mut(ty);
                }
                for expr in &mut value.values {
                    v.visit_expr_mut(expr);
                }
            }
            Spec::Type(ty) => v.visit_expr_mut(&mut ty.ty),
        }
    }
}

pub fn walk_block_mut<V: VisitMut + ?Sized>(v: &mut V, block: &mut BlockStmt) {
    for stmt in &mut block.stmts {
        v.visit_stmt_mut(stmt);
    }
}

fn walk_opt_stmt_mut<V: VisitMut + ?Sized>(v: &mut V, stmt: &mut Option<Box<Stmt>>) {
    if let Some(stmt) = stmt {
        v.visit_stmt_mut(stmt);
    }
}

fn walk_clause_body_mut<V: VisitMut + ?Sized>(v: &mut V, body: &mut [Stmt]) {
    for stmt in body {
        v.visit_stmt_mut(stmt);
    }
}

pub fn walk_stmt_mut<V: VisitMut + ?Sized>(v: &mut V, stmt: &mut Stmt) {
    match stmt {
        Stmt::Decl(gen) => walk_gen_decl_mut(v, gen),
        Stmt::Empty | Stmt::Branch(_) => {}
        Stmt::Labeled(labeled) => walk_opt_stmt_mut(v, &mut labeled.stmt),
        Stmt::Expr(stmt) => v.visit_expr_mut(&mut stmt.x),
        Stmt::Send(send) => {
            v.visit_expr_mut(&mut send.chan);
            v.visit_expr_mut(&mut send.value);
        }
        Stmt::IncDec(stmt) => v.visit_expr_mut(&mut stmt.x),
        Stmt::Assign(assign) => {
            for expr in assign.lhs.iter_mut().chain(assign.rhs.iter_mut()) {
                v.visit_expr_mut(expr);
            }
        }
        Stmt::Go(expr) | Stmt::Defer(expr) => v.visit_expr_mut(expr),
        Stmt::Return(ret) => {
            for expr in &mut ret.results {
                v.visit_expr_mut(expr);
            }
        }
        Stmt::Block(block) => v.visit_block_mut(block),
        Stmt::If(stmt) => {
            walk_opt_stmt_mut(v, &mut stmt.init);
            v.visit_expr_mut(&mut stmt.cond);
            v.visit_block_mut(&mut stmt.then);
            walk_opt_stmt_mut(v, &mut stmt.els);
        }
        Stmt::Switch(stmt) => {
            walk_opt_stmt_mut(v, &mut stmt.init);
            if let Some(tag) = &mut stmt.tag {
                v.visit_expr_mut(tag);
            }
            for clause in &mut stmt.clauses {
                for expr in &mut clause.list {
                    v.visit_expr_mut(expr);
                }
                walk_clause_body_mut(v, &mut clause.body);
            }
        }
        Stmt::TypeSwitch(stmt) => {
            walk_opt_stmt_mut(v, &mut stmt.init);
            v.visit_expr_mut(&mut stmt.x);
            for clause in &mut stmt.clauses {
                for expr in &mut clause.list {
                    v.visit_expr_mut(expr);
                }
                walk_clause_body_mut(v, &mut clause.body);
            }
        }
        Stmt::Select(stmt) => {
            for clause in &mut stmt.clauses {
                walk_opt_stmt_mut(v, &mut clause.comm);
                walk_clause_body_mut(v, &mut clause.body);
            }
        }
        Stmt::For(stmt) => {
            walk_opt_stmt_mut(v, &mut stmt.init);
            if let Some(cond) = &mut stmt.cond {
                v.visit_expr_mut(cond);
            }
            walk_opt_stmt_mut(v, &mut stmt.post);
            v.visit_block_mut(&mut stmt.body);
        }
        Stmt::Range(stmt) => {
            if let Some(key) = &mut stmt.key {
                v.visit_expr_mut(key);
            }
            if let Some(value) = &mut stmt.value {
                v.visit_expr_mut(value);
            }
            v.visit_expr_mut(&mut stmt.x);
            v.visit_block_mut(&mut stmt.body);
        }
    }
}

fn walk_field_mut<V: VisitMut + ?Sized>(v: &mut V, field: &mut Field) {
    v.visit_expr_mut(&mut field.ty);
}

pub fn walk_func_type_mut<V: VisitMut + ?Sized>(v: &mut V, ty: &mut FuncType) {
    for field in ty.params.iter_mut().chain(ty.results.iter_mut()) {
        walk_field_mut(v, field);
    }
}

pub fn walk_func_lit_mut<V: VisitMut + ?Sized>(v: &mut V, lit: &mut FuncLit) {
    v.visit_func_type_mut(&mut lit.ty);
    v.visit_block_mut(&mut lit.body);
}

fn walk_opt_expr_mut<V: VisitMut + ?Sized>(v: &mut V, expr: &mut Option<Box<Expr>>) {
    if let Some(expr) = expr {
        v.visit_expr_mut(expr);
    }
}

pub fn walk_expr_mut<V: VisitMut + ?Sized>(v: &mut V, expr: &mut Expr) {
    match &mut expr.kind {
        ExprKind::Ident(_) | ExprKind::BasicLit(_) => {}
        ExprKind::CompositeLit(lit) => {
            walk_opt_expr_mut(v, &mut lit.ty);
            for elt in &mut lit.elts {
                v.visit_expr_mut(elt);
            }
        }
        ExprKind::FuncLit(lit) => v.visit_func_lit_mut(lit),
        ExprKind::Paren(inner)
        | ExprKind::Star(inner)
        | ExprKind::Ellipsis(inner)
        | ExprKind::SliceType(inner) => v.visit_expr_mut(inner),
        ExprKind::Selector(sel) => v.visit_expr_mut(&mut sel.x),
        ExprKind::Index(index) => {
            v.visit_expr_mut(&mut index.x);
            v.visit_expr_mut(&mut index.index);
        }
        ExprKind::Slice(slice) => {
            v.visit_expr_mut(&mut slice.x);
            walk_opt_expr_mut(v, &mut slice.low);
            walk_opt_expr_mut(v, &mut slice.high);
            walk_opt_expr_mut(v, &mut slice.max);
        }
        ExprKind::TypeAssert(assert) => {
            v.visit_expr_mut(&mut assert.x);
            walk_opt_expr_mut(v, &mut assert.ty);
        }
        ExprKind::Call(call) => {
            v.visit_expr_mut(&mut call.fun);
            for arg in &mut call.args {
                v.visit_expr_mut(arg);
            }
        }
        ExprKind::Unary(unary) => v.visit_expr_mut(&mut unary.x),
        ExprKind::Binary(binary) => {
            v.visit_expr_mut(&mut binary.x);
            v.visit_expr_mut(&mut binary.y);
        }
        ExprKind::KeyValue(kv) => {
            v.visit_expr_mut(&mut kv.key);
            v.visit_expr_mut(&mut kv.value);
        }
        ExprKind::ArrayType(array) => {
            walk_opt_expr_mut(v, &mut array.len);
            v.visit_expr_mut(&mut array.elem);
        }
        ExprKind::MapType(map) => {
            v.visit_expr_mut(&mut map.key);
            v.visit_expr_mut(&mut map.value);
        }
        ExprKind::ChanType(chan) => v.visit_expr_mut(&mut chan.value),
        ExprKind::FuncType(ty) => v.visit_func_type_mut(ty),
        ExprKind::StructType(st) => {
            for field in &mut st.fields {
                walk_field_mut(v, field);
            }
        }
        ExprKind::InterfaceType(iface) => {
            for elem in &mut iface.elems {
                match elem {
                    InterfaceElem::Method { ty, .. } => v.visit_func_type_mut(ty),
                    InterfaceElem::Embedded(expr) => v.visit_expr_mut(expr),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::FileSet;

    struct CountCalls(usize);

    impl VisitMut for CountCalls {
        fn visit_expr_mut(&mut self, expr: &mut Expr) {
            if matches!(expr.kind, ExprKind::Call(_)) {
                self.0 += 1;
            }
            walk_expr_mut(self, expr)
        }
    }

    #[test]
    fn walks_nested_calls() {
        let fset = FileSet::new();
        let inner = Expr::call(&fset, Expr::ident(&fset, "g"), vec![]);
        let outer = Expr::call(&fset, Expr::ident(&fset, "f"), vec![inner]);
        let mut block = BlockStmt::synthetic(&fset, vec![Stmt::Expr(ExprStmt { x: outer })]);
        let mut counter = CountCalls(0);
        counter.visit_block_mut(&mut block);
        assert_eq!(counter.0, 2);
    }
}
