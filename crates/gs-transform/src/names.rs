//! Fresh names for synthetic error variables.

use gs_core::ast::{Expr, Ident};
use gs_core::span::FileSet;
use gs_typing::{ScopeId, ScopeTree};
use tracing::trace;

const PREFIX: &str = "err";

/// A synthetic variable holding a captured error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrVar {
    pub name: String,
    pub ident: Ident,
}

impl ErrVar {
    fn new(name: String) -> Self {
        Self {
            ident: Ident::new(name.clone()),
            name,
        }
    }

    /// A fresh expression node referring to the variable.
    pub fn expr(&self, fset: &FileSet) -> Expr {
        Expr::ident(fset, self.name.clone())
    }
}

/// Hands out `err<N>` names for one function unit.
///
/// A candidate is free when it is not visible from the unit's root scope and
/// no scope nested in the unit declares it. Taken suffixes are skipped and
/// never retried, and the counter only moves forward, so every name is
/// handed out at most once per unit.
///
/// Names live in two pools that are each reused by position across
/// statements: variables declared once at the top of the body, and variables
/// that a nested `:=` declares for itself.
pub struct NameAllocator<'a> {
    tree: &'a ScopeTree,
    root: ScopeId,
    descendants: Vec<ScopeId>,
    vars: Vec<ErrVar>,
    locals: Vec<ErrVar>,
    next: usize,
}

impl<'a> NameAllocator<'a> {
    pub fn new(tree: &'a ScopeTree, root: ScopeId) -> Self {
        Self {
            tree,
            root,
            descendants: tree.descendants(root),
            vars: Vec::new(),
            locals: Vec::new(),
            next: 0,
        }
    }

    /// The first `count` declared variables, allocating more as needed.
    pub fn allocate(&mut self, count: usize) -> &[ErrVar] {
        while self.vars.len() < count {
            let var = self.fresh();
            self.vars.push(var);
        }
        &self.vars[..count]
    }

    /// The first `count` variables for a `:=` inside a nested block.
    pub fn allocate_local(&mut self, count: usize) -> &[ErrVar] {
        while self.locals.len() < count {
            let var = self.fresh();
            self.locals.push(var);
        }
        &self.locals[..count]
    }

    fn fresh(&mut self) -> ErrVar {
        loop {
            let candidate = format!("{}{}", PREFIX, self.next);
            self.next += 1;
            if self.is_unique(&candidate) {
                return ErrVar::new(candidate);
            }
            trace!(name = %candidate, "synthetic name taken, skipping");
        }
    }

    fn is_unique(&self, name: &str) -> bool {
        self.tree.lookup_parent(self.root, name).is_none()
            && self
                .descendants
                .iter()
                .all(|scope| self.tree.lookup(*scope, name).is_none())
    }

    /// Variables that need a declaration, in allocation order.
    pub fn vars(&self) -> &[ErrVar] {
        &self.vars
    }

    /// Every variable of both pools.
    pub fn into_all(self) -> Vec<ErrVar> {
        let mut all = self.vars;
        all.extend(self.locals);
        all
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gs_typing::{Object, ObjectKind, ScopeKind};

    fn var(name: &str) -> Object {
        Object::new(name, ObjectKind::Var, None)
    }

    #[test]
    fn names_are_reused_by_position() {
        let mut tree = ScopeTree::new();
        let root = tree.push(tree.universe(), ScopeKind::Function);
        let mut names = NameAllocator::new(&tree, root);

        let first: Vec<String> = names.allocate(1).iter().map(|v| v.name.clone()).collect();
        assert_eq!(first, ["err0"]);
        let second: Vec<String> = names.allocate(2).iter().map(|v| v.name.clone()).collect();
        assert_eq!(second, ["err0", "err1"]);
        assert_eq!(names.allocate(1)[0].name, "err0");
        assert_eq!(names.vars().len(), 2);
    }

    #[test]
    fn names_visible_or_nested_are_skipped() {
        let mut tree = ScopeTree::new();
        let package = tree.push(tree.universe(), ScopeKind::Package);
        tree.insert(package, var("err0")).unwrap();
        let root = tree.push(package, ScopeKind::Function);
        let block = tree.push(root, ScopeKind::Block);
        let inner = tree.push(block, ScopeKind::Block);
        tree.insert(inner, var("err1")).unwrap();

        let mut names = NameAllocator::new(&tree, root);
        let allocated: Vec<&str> = names.allocate(2).iter().map(|v| v.name.as_str()).collect();
        assert_eq!(allocated, ["err2", "err3"]);
    }

    #[test]
    fn sibling_functions_do_not_constrain_each_other() {
        let mut tree = ScopeTree::new();
        let package = tree.push(tree.universe(), ScopeKind::Package);
        let other = tree.push(package, ScopeKind::Function);
        tree.insert(other, var("err0")).unwrap();
        let root = tree.push(package, ScopeKind::Function);

        let mut names = NameAllocator::new(&tree, root);
        assert_eq!(names.allocate(1)[0].name, "err0");
    }

    #[test]
    fn local_names_never_overlap_declared_ones() {
        let mut tree = ScopeTree::new();
        let root = tree.push(tree.universe(), ScopeKind::Function);
        let mut names = NameAllocator::new(&tree, root);

        assert_eq!(names.allocate(1)[0].name, "err0");
        assert_eq!(names.allocate_local(1)[0].name, "err1");
        assert_eq!(names.allocate(2)[1].name, "err2");
        assert_eq!(names.allocate_local(1)[0].name, "err1");
        assert_eq!(names.vars().len(), 2);
        assert_eq!(names.into_all().len(), 3);
    }
}
