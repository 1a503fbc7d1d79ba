use crate::ast::{BinaryOp, Expr, GenDecl, Ident, NodeId};
use crate::span::{FileSet, Span};

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Decl(GenDecl),
    Empty,
    Labeled(LabeledStmt),
    Expr(ExprStmt),
    Send(SendStmt),
    IncDec(IncDecStmt),
    Assign(AssignStmt),
    Go(Expr),
    Defer(Expr),
    Return(ReturnStmt),
    Branch(BranchStmt),
    Block(BlockStmt),
    If(IfStmt),
    Switch(SwitchStmt),
    TypeSwitch(TypeSwitchStmt),
    Select(SelectStmt),
    For(ForStmt),
    Range(RangeStmt),
}

impl Stmt {
    /// Best-effort source range, used for diagnostics.
    pub fn span(&self) -> Span {
        match self {
            Stmt::Expr(stmt) => stmt.x.span,
            Stmt::Assign(stmt) => stmt.span,
            Stmt::Return(stmt) => stmt.span,
            Stmt::Go(expr) | Stmt::Defer(expr) => expr.span,
            Stmt::Send(stmt) => stmt.chan.span,
            Stmt::IncDec(stmt) => stmt.x.span,
            Stmt::Labeled(stmt) => stmt.label.span,
            Stmt::If(stmt) => stmt.cond.span,
            Stmt::Range(stmt) => stmt.x.span,
            _ => Span::null(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExprStmt {
    pub x: Expr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    /// `=`
    Assign,
    /// `:=`
    Define,
    /// `+=`, `<<=`, ...
    Op(BinaryOp),
}

impl AssignOp {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "=" => Some(AssignOp::Assign),
            ":=" => Some(AssignOp::Define),
            _ => token
                .strip_suffix('=')
                .and_then(BinaryOp::from_token)
                .map(AssignOp::Op),
        }
    }

    pub fn as_str(&self) -> String {
        match self {
            AssignOp::Assign => "=".to_string(),
            AssignOp::Define => ":=".to_string(),
            AssignOp::Op(op) => format!("{}=", op.as_str()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssignStmt {
    pub lhs: Vec<Expr>,
    pub tok: AssignOp,
    pub rhs: Vec<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SendStmt {
    pub chan: Expr,
    pub value: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IncDecStmt {
    pub x: Expr,
    pub inc: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReturnStmt {
    pub results: Vec<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchKind {
    Break,
    Continue,
    Goto,
    Fallthrough,
}

impl BranchKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BranchKind::Break => "break",
            BranchKind::Continue => "continue",
            BranchKind::Goto => "goto",
            BranchKind::Fallthrough => "fallthrough",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BranchStmt {
    pub kind: BranchKind,
    pub label: Option<Ident>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabeledStmt {
    pub label: Ident,
    /// `None` for a label that ends a block.
    pub stmt: Option<Box<Stmt>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BlockStmt {
    pub id: NodeId,
    pub stmts: Vec<Stmt>,
}

impl BlockStmt {
    pub fn new(id: NodeId, stmts: Vec<Stmt>) -> Self {
        Self { id, stmts }
    }

    pub fn synthetic(fset: &FileSet, stmts: Vec<Stmt>) -> Self {
        Self::new(fset.fresh_id(), stmts)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfStmt {
    pub id: NodeId,
    pub init: Option<Box<Stmt>>,
    pub cond: Expr,
    pub then: BlockStmt,
    /// Either another `Stmt::If` or a `Stmt::Block`.
    pub els: Option<Box<Stmt>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CaseClause {
    pub id: NodeId,
    /// Empty for `default`.
    pub list: Vec<Expr>,
    pub is_default: bool,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwitchStmt {
    pub id: NodeId,
    pub init: Option<Box<Stmt>>,
    pub tag: Option<Expr>,
    pub clauses: Vec<CaseClause>,
}

/// `switch v := x.(type) { ... }`; clause lists hold type expressions.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeSwitchStmt {
    pub id: NodeId,
    pub init: Option<Box<Stmt>>,
    pub binding: Option<Ident>,
    pub x: Expr,
    pub clauses: Vec<CaseClause>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommClause {
    pub id: NodeId,
    /// Send or receive statement; `None` for `default`.
    pub comm: Option<Box<Stmt>>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectStmt {
    pub clauses: Vec<CommClause>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForStmt {
    pub id: NodeId,
    pub init: Option<Box<Stmt>>,
    pub cond: Option<Expr>,
    pub post: Option<Box<Stmt>>,
    pub body: BlockStmt,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RangeStmt {
    pub id: NodeId,
    pub key: Option<Expr>,
    pub value: Option<Expr>,
    /// `None` for `for range x`.
    pub tok: Option<AssignOp>,
    pub x: Expr,
    pub body: BlockStmt,
}
