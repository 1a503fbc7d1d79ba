use crate::ast::{BlockStmt, Ident, NodeId};
use crate::span::{FileSet, Span};

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub id: NodeId,
    pub span: Span,
    pub kind: ExprKind,
}

impl Expr {
    pub fn new(id: NodeId, span: Span, kind: ExprKind) -> Self {
        Self { id, span, kind }
    }

    /// Build a node that did not come from source text.
    pub fn synthetic(fset: &FileSet, kind: ExprKind) -> Self {
        Self::new(fset.fresh_id(), Span::null(), kind)
    }

    pub fn ident(fset: &FileSet, name: impl Into<String>) -> Self {
        Self::synthetic(fset, ExprKind::Ident(Ident::new(name)))
    }

    pub fn call(fset: &FileSet, fun: Expr, args: Vec<Expr>) -> Self {
        Self::synthetic(
            fset,
            ExprKind::Call(CallExpr {
                fun: Box::new(fun),
                args,
                ellipsis: false,
            }),
        )
    }

    pub fn binary(fset: &FileSet, x: Expr, op: BinaryOp, y: Expr) -> Self {
        Self::synthetic(
            fset,
            ExprKind::Binary(BinaryExpr {
                x: Box::new(x),
                op,
                y: Box::new(y),
            }),
        )
    }

    pub fn as_ident(&self) -> Option<&Ident> {
        match &self.kind {
            ExprKind::Ident(ident) => Some(ident),
            _ => None,
        }
    }

    pub fn is_blank(&self) -> bool {
        self.as_ident().is_some_and(Ident::is_blank)
    }

    /// Strip any number of enclosing parentheses.
    pub fn unparen(&self) -> &Expr {
        let mut expr = self;
        while let ExprKind::Paren(inner) = &expr.kind {
            expr = inner;
        }
        expr
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Ident(Ident),
    BasicLit(BasicLit),
    CompositeLit(CompositeLit),
    FuncLit(FuncLit),
    Paren(Box<Expr>),
    Selector(SelectorExpr),
    Index(IndexExpr),
    Slice(SliceExpr),
    TypeAssert(TypeAssertExpr),
    Call(CallExpr),
    /// `*x`: a dereference or a pointer type, depending on `x`.
    Star(Box<Expr>),
    Unary(UnaryExpr),
    Binary(BinaryExpr),
    KeyValue(KeyValueExpr),
    /// `...T` in a variadic parameter list.
    Ellipsis(Box<Expr>),
    ArrayType(ArrayType),
    SliceType(Box<Expr>),
    MapType(MapType),
    ChanType(ChanType),
    FuncType(FuncType),
    StructType(StructType),
    InterfaceType(InterfaceType),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LitKind {
    Int,
    Float,
    Imag,
    Char,
    String,
}

/// Literal kept in its source spelling.
#[derive(Debug, Clone, PartialEq)]
pub struct BasicLit {
    pub kind: LitKind,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompositeLit {
    /// `None` for elided element literals such as the inner `{1, 2}` in `[][]int{{1, 2}}`.
    pub ty: Option<Box<Expr>>,
    pub elts: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FuncLit {
    pub ty: FuncType,
    pub body: BlockStmt,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectorExpr {
    pub x: Box<Expr>,
    pub sel: Ident,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexExpr {
    pub x: Box<Expr>,
    pub index: Box<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SliceExpr {
    pub x: Box<Expr>,
    pub low: Option<Box<Expr>>,
    pub high: Option<Box<Expr>>,
    pub max: Option<Box<Expr>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeAssertExpr {
    pub x: Box<Expr>,
    /// `None` inside a type switch guard: `x.(type)`.
    pub ty: Option<Box<Expr>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallExpr {
    pub fun: Box<Expr>,
    pub args: Vec<Expr>,
    /// The last argument is spread with `...`.
    pub ellipsis: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Pos,
    Neg,
    Not,
    Xor,
    Addr,
    Recv,
}

impl UnaryOp {
    pub fn from_token(token: &str) -> Option<Self> {
        Some(match token {
            "+" => UnaryOp::Pos,
            "-" => UnaryOp::Neg,
            "!" => UnaryOp::Not,
            "^" => UnaryOp::Xor,
            "&" => UnaryOp::Addr,
            "<-" => UnaryOp::Recv,
            _ => return None,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UnaryOp::Pos => "+",
            UnaryOp::Neg => "-",
            UnaryOp::Not => "!",
            UnaryOp::Xor => "^",
            UnaryOp::Addr => "&",
            UnaryOp::Recv => "<-",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnaryExpr {
    pub op: UnaryOp,
    pub x: Box<Expr>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Quo,
    Rem,
    And,
    Or,
    Xor,
    Shl,
    Shr,
    AndNot,
    LAnd,
    LOr,
    Eql,
    Neq,
    Lss,
    Leq,
    Gtr,
    Geq,
}

impl BinaryOp {
    pub fn from_token(token: &str) -> Option<Self> {
        Some(match token {
            "+" => BinaryOp::Add,
            "-" => BinaryOp::Sub,
            "*" => BinaryOp::Mul,
            "/" => BinaryOp::Quo,
            "%" => BinaryOp::Rem,
            "&" => BinaryOp::And,
            "|" => BinaryOp::Or,
            "^" => BinaryOp::Xor,
            "<<" => BinaryOp::Shl,
            ">>" => BinaryOp::Shr,
            "&^" => BinaryOp::AndNot,
            "&&" => BinaryOp::LAnd,
            "||" => BinaryOp::LOr,
            "==" => BinaryOp::Eql,
            "!=" => BinaryOp::Neq,
            "<" => BinaryOp::Lss,
            "<=" => BinaryOp::Leq,
            ">" => BinaryOp::Gtr,
            ">=" => BinaryOp::Geq,
            _ => return None,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Quo => "/",
            BinaryOp::Rem => "%",
            BinaryOp::And => "&",
            BinaryOp::Or => "|",
            BinaryOp::Xor => "^",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::AndNot => "&^",
            BinaryOp::LAnd => "&&",
            BinaryOp::LOr => "||",
            BinaryOp::Eql => "==",
            BinaryOp::Neq => "!=",
            BinaryOp::Lss => "<",
            BinaryOp::Leq => "<=",
            BinaryOp::Gtr => ">",
            BinaryOp::Geq => ">=",
        }
    }

    /// Go operator precedence, 5 binding tightest.
    pub fn precedence(&self) -> u8 {
        match self {
            BinaryOp::LOr => 1,
            BinaryOp::LAnd => 2,
            BinaryOp::Eql
            | BinaryOp::Neq
            | BinaryOp::Lss
            | BinaryOp::Leq
            | BinaryOp::Gtr
            | BinaryOp::Geq => 3,
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Or | BinaryOp::Xor => 4,
            BinaryOp::Mul
            | BinaryOp::Quo
            | BinaryOp::Rem
            | BinaryOp::Shl
            | BinaryOp::Shr
            | BinaryOp::And
            | BinaryOp::AndNot => 5,
        }
    }

    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOp::Eql
                | BinaryOp::Neq
                | BinaryOp::Lss
                | BinaryOp::Leq
                | BinaryOp::Gtr
                | BinaryOp::Geq
        )
    }

    pub fn is_logical(&self) -> bool {
        matches!(self, BinaryOp::LAnd | BinaryOp::LOr)
    }

    pub fn is_shift(&self) -> bool {
        matches!(self, BinaryOp::Shl | BinaryOp::Shr)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryExpr {
    pub x: Box<Expr>,
    pub op: BinaryOp,
    pub y: Box<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct KeyValueExpr {
    pub key: Box<Expr>,
    pub value: Box<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArrayType {
    /// `None` for `[...]T`.
    pub len: Option<Box<Expr>>,
    pub elem: Box<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapType {
    pub key: Box<Expr>,
    pub value: Box<Expr>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChanDir {
    Both,
    Send,
    Recv,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChanType {
    pub dir: ChanDir,
    pub value: Box<Expr>,
}

/// Signature of a function declaration, literal, method element or type.
///
/// The id keys the function scope in the type information.
#[derive(Debug, Clone, PartialEq)]
pub struct FuncType {
    pub id: NodeId,
    pub params: Vec<Field>,
    pub results: Vec<Field>,
}

impl FuncType {
    pub fn is_variadic(&self) -> bool {
        self.params
            .last()
            .is_some_and(|field| matches!(field.ty.kind, ExprKind::Ellipsis(_)))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructType {
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InterfaceType {
    pub elems: Vec<InterfaceElem>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InterfaceElem {
    Method { name: Ident, ty: FuncType },
    Embedded(Expr),
}

/// Parameter, result, receiver or struct field group: `a, b int`.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// Empty for anonymous parameters and embedded fields.
    pub names: Vec<Ident>,
    pub ty: Expr,
    pub tag: Option<String>,
}

impl Field {
    pub fn new(names: Vec<Ident>, ty: Expr) -> Self {
        Self {
            names,
            ty,
            tag: None,
        }
    }

    /// Number of entries the group contributes to a parameter tuple.
    pub fn arity(&self) -> usize {
        self.names.len().max(1)
    }
}
