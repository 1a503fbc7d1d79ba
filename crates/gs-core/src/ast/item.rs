use std::path::PathBuf;

use crate::ast::{BlockStmt, Expr, Field, FuncType, Ident};
use crate::span::{FileId, Span};

#[derive(Debug, Clone, PartialEq)]
pub struct File {
    pub id: FileId,
    pub path: PathBuf,
    pub package: Ident,
    pub decls: Vec<Decl>,
}

impl File {
    pub fn imports(&self) -> impl Iterator<Item = &ImportSpec> {
        self.decls
            .iter()
            .flat_map(|decl| {
                let specs: &[Spec] = match decl {
                    Decl::Gen(gen) => &gen.specs,
                    Decl::Func(_) => &[],
                };
                specs
            })
            .filter_map(|spec| match spec {
                Spec::Import(import) => Some(import),
                _ => None,
            })
    }

    pub fn funcs(&self) -> impl Iterator<Item = &FuncDecl> {
        self.decls.iter().filter_map(|decl| match decl {
            Decl::Func(func) => Some(func),
            Decl::Gen(_) => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Decl {
    Gen(GenDecl),
    Func(FuncDecl),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKind {
    Import,
    Const,
    Type,
    Var,
}

impl DeclKind {
    pub fn keyword(&self) -> &'static str {
        match self {
            DeclKind::Import => "import",
            DeclKind::Const => "const",
            DeclKind::Type => "type",
            DeclKind::Var => "var",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenDecl {
    pub kind: DeclKind,
    pub specs: Vec<Spec>,
    /// Written with parentheses in the source.
    pub grouped: bool,
}

impl GenDecl {
    pub fn new(kind: DeclKind, specs: Vec<Spec>) -> Self {
        Self {
            kind,
            specs,
            grouped: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Spec {
    Import(ImportSpec),
    Value(ValueSpec),
    Type(TypeSpec),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportSpec {
    /// Alias, `.` or `_` when present.
    pub name: Option<Ident>,
    /// Unquoted import path.
    pub path: String,
    pub span: Span,
}

impl ImportSpec {
    /// Name the import is bound to in the file scope when no alias is given.
    pub fn default_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}

/// `a, b T = x, y` inside a `var` or `const` declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueSpec {
    pub names: Vec<Ident>,
    pub ty: Option<Expr>,
    pub values: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeSpec {
    pub name: Ident,
    /// `type A = B`
    pub alias: bool,
    pub ty: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FuncDecl {
    pub recv: Option<Field>,
    pub name: Ident,
    pub ty: FuncType,
    /// `None` for declarations without a body (assembly or stubs).
    pub body: Option<BlockStmt>,
}
