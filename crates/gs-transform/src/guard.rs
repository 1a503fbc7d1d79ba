//! Guard statements and the synthetic variable declaration.

use gs_core::ast::*;
use gs_core::span::FileSet;

use crate::names::ErrVar;

const ERROR_TYPE: &str = "error";
const PANIC: &str = "panic";
const NIL: &str = "nil";

/// `if err != nil { panic(err) }`
pub fn guard(fset: &FileSet, var: &ErrVar) -> Stmt {
    let cond = Expr::binary(fset, var.expr(fset), BinaryOp::Neq, Expr::ident(fset, NIL));
    let halt = Expr::call(fset, Expr::ident(fset, PANIC), vec![var.expr(fset)]);
    Stmt::If(IfStmt {
        id: fset.fresh_id(),
        init: None,
        cond,
        then: BlockStmt::synthetic(fset, vec![Stmt::Expr(ExprStmt { x: halt })]),
        els: None,
    })
}

/// One guard per variable, in order.
pub fn guards(fset: &FileSet, vars: &[ErrVar]) -> Vec<Stmt> {
    vars.iter().map(|var| guard(fset, var)).collect()
}

/// `var err0, err1 error`
pub fn declaration(fset: &FileSet, vars: &[ErrVar]) -> Stmt {
    Stmt::Decl(GenDecl::new(
        DeclKind::Var,
        vec![Spec::Value(ValueSpec {
            names: vars.iter().map(|var| var.ident.clone()).collect(),
            ty: Some(Expr::ident(fset, ERROR_TYPE)),
            values: Vec::new(),
        })],
    ))
}

/// Prepend the declaration of `vars` to `body`. Returns whether anything was
/// inserted; an empty `vars` leaves the body as it is.
pub fn inject_declaration(fset: &FileSet, body: &mut BlockStmt, vars: &[ErrVar]) -> bool {
    if vars.is_empty() {
        return false;
    }
    body.stmts.insert(0, declaration(fset, vars));
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use gs_golang::GoSerializer;
    use gs_typing::ScopeTree;
    use pretty_assertions::assert_eq;

    use crate::names::NameAllocator;

    fn vars(count: usize) -> Vec<ErrVar> {
        let mut tree = ScopeTree::new();
        let root = tree.push(tree.universe(), gs_typing::ScopeKind::Function);
        let mut names = NameAllocator::new(&tree, root);
        names.allocate(count).to_vec()
    }

    #[test]
    fn guard_panics_on_non_nil() {
        let fset = FileSet::new();
        let rendered = GoSerializer::new()
            .serialize_stmt(&guard(&fset, &vars(1)[0]))
            .unwrap();
        assert_eq!(rendered, "if err0 != nil {\n\tpanic(err0)\n}\n");
    }

    #[test]
    fn declaration_lists_every_variable() {
        let fset = FileSet::new();
        let rendered = GoSerializer::new()
            .serialize_stmt(&declaration(&fset, &vars(2)))
            .unwrap();
        assert_eq!(rendered, "var err0, err1 error\n");
    }

    #[test]
    fn nothing_is_injected_without_variables() {
        let fset = FileSet::new();
        let mut body = BlockStmt::synthetic(&fset, vec![Stmt::Empty]);
        assert!(!inject_declaration(&fset, &mut body, &[]));
        assert_eq!(body.stmts, vec![Stmt::Empty]);

        assert!(inject_declaration(&fset, &mut body, &vars(1)));
        assert_eq!(body.stmts.len(), 2);
        assert!(matches!(body.stmts[0], Stmt::Decl(_)));
    }
}
