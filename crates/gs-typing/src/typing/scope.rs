//! Lexical scopes produced by the checker.
//!
//! Scopes and the objects they declare live in one arena; ids are indices.
//! The tree is read-only once checking finishes.

use std::collections::{HashMap, VecDeque};

use gs_core::span::Span;

use crate::typing::types::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Universe,
    Package,
    File,
    Function,
    Block,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Append,
    Cap,
    Clear,
    Close,
    Complex,
    Copy,
    Delete,
    Imag,
    Len,
    Make,
    Max,
    Min,
    New,
    Panic,
    Print,
    Println,
    Real,
    Recover,
}

impl Builtin {
    pub const ALL: [(&'static str, Builtin); 18] = [
        ("append", Builtin::Append),
        ("cap", Builtin::Cap),
        ("clear", Builtin::Clear),
        ("close", Builtin::Close),
        ("complex", Builtin::Complex),
        ("copy", Builtin::Copy),
        ("delete", Builtin::Delete),
        ("imag", Builtin::Imag),
        ("len", Builtin::Len),
        ("make", Builtin::Make),
        ("max", Builtin::Max),
        ("min", Builtin::Min),
        ("new", Builtin::New),
        ("panic", Builtin::Panic),
        ("print", Builtin::Print),
        ("println", Builtin::Println),
        ("real", Builtin::Real),
        ("recover", Builtin::Recover),
    ];

    pub fn name(&self) -> &'static str {
        Self::ALL
            .iter()
            .find(|(_, builtin)| builtin == self)
            .map(|(name, _)| *name)
            .unwrap_or("builtin")
    }

    /// Builtins whose call may appear as a statement.
    pub fn allowed_as_statement(&self) -> bool {
        matches!(
            self,
            Builtin::Clear
                | Builtin::Close
                | Builtin::Copy
                | Builtin::Delete
                | Builtin::Panic
                | Builtin::Print
                | Builtin::Println
                | Builtin::Recover
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ObjectKind {
    Var,
    Const { value: Option<i128> },
    TypeName,
    Func,
    PkgName { path: String, scope: ScopeId },
    Builtin(Builtin),
    Nil,
    Iota,
}

/// Where a package-level object is declared, for on-demand resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DeclRef {
    Const {
        file: usize,
        decl: usize,
        spec: usize,
        /// Spec whose type and values are repeated when `spec` has none.
        source: usize,
        index: usize,
        iota: usize,
    },
    Var {
        file: usize,
        decl: usize,
        spec: usize,
        index: usize,
    },
    Type {
        file: usize,
        decl: usize,
        spec: usize,
    },
    Func {
        file: usize,
        decl: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Resolution {
    Pending,
    InProgress,
    Done,
}

#[derive(Debug, Clone)]
pub struct Object {
    pub name: String,
    pub kind: ObjectKind,
    /// `None` until the object is resolved.
    pub ty: Option<Type>,
    pub span: Span,
    pub scope: ScopeId,
    pub(crate) decl: Option<DeclRef>,
    pub(crate) state: Resolution,
}

impl Object {
    pub fn new(name: impl Into<String>, kind: ObjectKind, ty: Option<Type>) -> Self {
        Self {
            name: name.into(),
            kind,
            ty,
            span: Span::null(),
            scope: ScopeId(0),
            decl: None,
            state: Resolution::Done,
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub(crate) fn deferred(mut self, decl: DeclRef) -> Self {
        self.decl = Some(decl);
        self.state = Resolution::Pending;
        self
    }
}

#[derive(Debug, Clone)]
pub struct Scope {
    pub kind: ScopeKind,
    pub parent: Option<ScopeId>,
    pub children: Vec<ScopeId>,
    names: HashMap<String, ObjectId>,
    order: Vec<String>,
}

impl Scope {
    /// Declared names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct ScopeTree {
    scopes: Vec<Scope>,
    objects: Vec<Object>,
}

impl Default for ScopeTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeTree {
    /// A tree holding only an empty universe scope.
    pub fn new() -> Self {
        let universe = Scope {
            kind: ScopeKind::Universe,
            parent: None,
            children: Vec::new(),
            names: HashMap::new(),
            order: Vec::new(),
        };
        Self {
            scopes: vec![universe],
            objects: Vec::new(),
        }
    }

    pub fn universe(&self) -> ScopeId {
        ScopeId(0)
    }

    pub fn push(&mut self, parent: ScopeId, kind: ScopeKind) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(Scope {
            kind,
            parent: Some(parent),
            children: Vec::new(),
            names: HashMap::new(),
            order: Vec::new(),
        });
        self.scopes[parent.0 as usize].children.push(id);
        id
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.0 as usize]
    }

    pub fn object(&self, id: ObjectId) -> &Object {
        &self.objects[id.0 as usize]
    }

    pub(crate) fn object_mut(&mut self, id: ObjectId) -> &mut Object {
        &mut self.objects[id.0 as usize]
    }

    /// Declare `object` in `scope`. Fails with the existing object when the
    /// name is already declared there. The blank identifier is never recorded.
    pub fn insert(&mut self, scope: ScopeId, mut object: Object) -> Result<ObjectId, ObjectId> {
        if let Some(existing) = self.lookup(scope, &object.name) {
            return Err(existing);
        }
        let id = ObjectId(self.objects.len() as u32);
        object.scope = scope;
        let name = object.name.clone();
        self.objects.push(object);
        if name != gs_core::ast::BLANK {
            let entry = &mut self.scopes[scope.0 as usize];
            entry.names.insert(name.clone(), id);
            entry.order.push(name);
        }
        Ok(id)
    }

    /// Look `name` up in `scope` only.
    pub fn lookup(&self, scope: ScopeId, name: &str) -> Option<ObjectId> {
        self.scope(scope).names.get(name).copied()
    }

    /// Look `name` up in `scope` and its ancestors up to the universe.
    pub fn lookup_parent(&self, scope: ScopeId, name: &str) -> Option<(ScopeId, ObjectId)> {
        let mut current = Some(scope);
        while let Some(id) = current {
            if let Some(object) = self.lookup(id, name) {
                return Some((id, object));
            }
            current = self.scope(id).parent;
        }
        None
    }

    /// Every scope nested below `scope`, breadth-first, excluding `scope`.
    pub fn descendants(&self, scope: ScopeId) -> Vec<ScopeId> {
        let mut out = Vec::new();
        let mut queue: VecDeque<ScopeId> = self.scope(scope).children.iter().copied().collect();
        while let Some(id) = queue.pop_front() {
            out.push(id);
            queue.extend(self.scope(id).children.iter().copied());
        }
        out
    }

    /// Nearest enclosing scope of the given kind, starting at `scope`.
    pub fn enclosing(&self, scope: ScopeId, kind: ScopeKind) -> Option<ScopeId> {
        let mut current = Some(scope);
        while let Some(id) = current {
            if self.scope(id).kind == kind {
                return Some(id);
            }
            current = self.scope(id).parent;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(name: &str) -> Object {
        Object::new(name, ObjectKind::Var, None)
    }

    #[test]
    fn lookup_parent_walks_to_the_root() {
        let mut tree = ScopeTree::new();
        let package = tree.push(tree.universe(), ScopeKind::Package);
        let func = tree.push(package, ScopeKind::Function);
        let block = tree.push(func, ScopeKind::Block);
        let x = tree.insert(package, var("x")).unwrap();

        assert_eq!(tree.lookup(block, "x"), None);
        assert_eq!(tree.lookup_parent(block, "x"), Some((package, x)));
        assert_eq!(tree.lookup_parent(block, "y"), None);
    }

    #[test]
    fn duplicate_declarations_are_rejected() {
        let mut tree = ScopeTree::new();
        let scope = tree.push(tree.universe(), ScopeKind::Block);
        let first = tree.insert(scope, var("a")).unwrap();
        assert_eq!(tree.insert(scope, var("a")), Err(first));
        assert!(tree.insert(scope, var("_")).is_ok());
        assert!(tree.insert(scope, var("_")).is_ok());
        assert_eq!(tree.scope(scope).len(), 1);
    }

    #[test]
    fn descendants_are_breadth_first() {
        let mut tree = ScopeTree::new();
        let root = tree.push(tree.universe(), ScopeKind::Function);
        let a = tree.push(root, ScopeKind::Block);
        let b = tree.push(root, ScopeKind::Block);
        let a1 = tree.push(a, ScopeKind::Block);
        assert_eq!(tree.descendants(root), vec![a, b, a1]);
        assert_eq!(tree.enclosing(a1, ScopeKind::Function), Some(root));
    }
}
