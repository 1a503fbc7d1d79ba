//! Go parser built on top of `tree-sitter-go`.
//!
//! The concrete syntax tree is lowered into the owned Go AST from `gs_core`.
//! Every expression, function type and scope-introducing statement receives a
//! fresh `NodeId` from the `FileSet` the file is registered in.

use std::path::PathBuf;

use eyre::{eyre, Result};
use gs_core::ast::*;
use gs_core::error::{Error as CoreError, Result as CoreResult, SyntaxError, TypeCheckError};
use gs_core::span::{FileId, FileSet, Span};
use tracing::{debug, warn};
use tree_sitter::{Node as TsNode, Parser as TsParser};

/// High-level parser that owns a tree-sitter instance for Go.
pub struct GoParser {
    parser: TsParser,
}

impl GoParser {
    /// Create a new parser instance with the Go grammar loaded.
    pub fn new() -> Result<Self> {
        let mut parser = TsParser::new();
        parser
            .set_language(&tree_sitter_go::LANGUAGE.into())
            .map_err(|err| eyre!("Failed to load tree-sitter Go grammar: {err}"))?;
        Ok(Self { parser })
    }

    /// Register `source` in `fset` and parse it into a `File`.
    pub fn parse_file(
        &mut self,
        fset: &mut FileSet,
        path: impl Into<PathBuf>,
        source: &str,
    ) -> CoreResult<File> {
        let path = path.into();
        let file_id = fset.add_file(path.clone(), source);
        let tree = self
            .parser
            .parse(source, None)
            .ok_or_else(|| CoreError::from("failed to parse Go source"))?;
        let root = tree.root_node();

        if let Some(bad) = first_error(root) {
            let span = Span::new(file_id, bad.start_byte() as u32, bad.end_byte() as u32);
            let message = if bad.is_missing() {
                format!("missing {}", bad.kind())
            } else {
                let text = bad.utf8_text(source.as_bytes()).unwrap_or_default();
                let line = text.lines().next().unwrap_or_default();
                format!("unexpected {:?}", line)
            };
            return Err(CoreError::Syntax(
                span,
                SyntaxError {
                    message,
                    position: fset.position(span),
                },
            ));
        }

        let lowerer = Lowerer {
            source,
            file: file_id,
            fset,
        };
        let file = lowerer.file(root, path).map_err(|report| {
            match report.downcast::<TypeCheckError>() {
                Ok(err) => CoreError::TypeCheck(err),
                Err(report) => CoreError::from(report),
            }
        })?;
        debug!(
            path = %file.path.display(),
            decls = file.decls.len(),
            "parsed go source"
        );
        Ok(file)
    }
}

impl Default for GoParser {
    fn default() -> Self {
        Self::new().expect("GoParser::new should succeed")
    }
}

fn first_error(node: TsNode<'_>) -> Option<TsNode<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }
    let mut cursor = node.walk();
    let children: Vec<_> = node.children(&mut cursor).collect();
    children.into_iter().find_map(first_error)
}

fn named<'t>(node: TsNode<'t>) -> Vec<TsNode<'t>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|child| !child.is_extra())
        .collect()
}

fn field_nodes<'t>(node: TsNode<'t>, field: &str) -> Vec<TsNode<'t>> {
    let mut cursor = node.walk();
    node.children_by_field_name(field, &mut cursor)
        .filter(|child| !child.is_extra())
        .collect()
}

/// Named children that are not attached to any grammar field.
fn unfielded<'t>(node: TsNode<'t>) -> Vec<TsNode<'t>> {
    let mut cursor = node.walk();
    let mut out = Vec::new();
    if cursor.goto_first_child() {
        loop {
            let child = cursor.node();
            if child.is_named() && !child.is_extra() && cursor.field_name().is_none() {
                out.push(child);
            }
            if !cursor.goto_next_sibling() {
                break;
            }
        }
    }
    out
}

fn tokens<'t>(node: TsNode<'t>) -> Vec<&'static str> {
    let mut cursor = node.walk();
    node.children(&mut cursor)
        .filter(|child| !child.is_named())
        .map(|child| child.kind())
        .collect()
}

fn has_token(node: TsNode<'_>, token: &str) -> bool {
    tokens(node).contains(&token)
}

struct Lowerer<'a> {
    source: &'a str,
    file: FileId,
    fset: &'a FileSet,
}

impl<'a> Lowerer<'a> {
    fn span(&self, node: TsNode) -> Span {
        Span::new(self.file, node.start_byte() as u32, node.end_byte() as u32)
    }

    fn text(&self, node: TsNode) -> Result<&'a str> {
        Ok(node.utf8_text(self.source.as_bytes())?)
    }

    fn ident(&self, node: TsNode) -> Result<Ident> {
        Ok(Ident::with_span(self.text(node)?, self.span(node)))
    }

    fn required<'t>(&self, node: TsNode<'t>, field: &str) -> Result<TsNode<'t>> {
        node.child_by_field_name(field)
            .ok_or_else(|| eyre!("{} missing {}", node.kind(), field))
    }

    fn mk(&self, node: TsNode, kind: ExprKind) -> Expr {
        Expr::new(self.fset.fresh_id(), self.span(node), kind)
    }

    fn generics(&self, node: TsNode) -> eyre::Report {
        let span = self.span(node);
        eyre::Report::new(
            TypeCheckError::new("generic code is not supported")
                .with_span(span)
                .with_position(self.fset.position(span)),
        )
    }

    fn file(&self, root: TsNode, path: PathBuf) -> Result<File> {
        let mut package = None;
        let mut decls = Vec::new();

        for child in named(root) {
            match child.kind() {
                "package_clause" => {
                    let name = named(child)
                        .into_iter()
                        .next()
                        .ok_or_else(|| eyre!("package clause missing name"))?;
                    package = Some(self.ident(name)?);
                }
                "import_declaration" | "const_declaration" | "var_declaration"
                | "type_declaration" => {
                    decls.push(Decl::Gen(self.gen_decl(child)?));
                }
                "function_declaration" | "method_declaration" => {
                    decls.push(Decl::Func(self.func_decl(child)?));
                }
                kind => {
                    warn!("unsupported go top-level node: {kind:?}");
                }
            }
        }

        Ok(File {
            id: self.file,
            path,
            package: package.ok_or_else(|| eyre!("missing package clause"))?,
            decls,
        })
    }

    fn gen_decl(&self, node: TsNode) -> Result<GenDecl> {
        let kind = match node.kind() {
            "import_declaration" => DeclKind::Import,
            "const_declaration" => DeclKind::Const,
            "var_declaration" => DeclKind::Var,
            "type_declaration" => DeclKind::Type,
            other => return Err(eyre!("not a declaration: {other}")),
        };
        let mut decl = GenDecl::new(kind, Vec::new());
        decl.grouped = has_token(node, "(");
        self.collect_specs(node, &mut decl)?;
        Ok(decl)
    }

    fn collect_specs(&self, node: TsNode, decl: &mut GenDecl) -> Result<()> {
        for child in named(node) {
            match child.kind() {
                "import_spec_list" | "var_spec_list" => {
                    decl.grouped = true;
                    self.collect_specs(child, decl)?;
                }
                "import_spec" => decl.specs.push(Spec::Import(self.import_spec(child)?)),
                "const_spec" | "var_spec" => decl.specs.push(Spec::Value(self.value_spec(child)?)),
                "type_spec" | "type_alias" => {
                    if child.child_by_field_name("type_parameters").is_some() {
                        return Err(self.generics(child));
                    }
                    decl.specs.push(Spec::Type(TypeSpec {
                        name: self.ident(self.required(child, "name")?)?,
                        alias: child.kind() == "type_alias",
                        ty: self.expr(self.required(child, "type")?)?,
                    }));
                }
                kind => warn!("unsupported go declaration node: {kind:?}"),
            }
        }
        Ok(())
    }

    fn import_spec(&self, node: TsNode) -> Result<ImportSpec> {
        let name = node
            .child_by_field_name("name")
            .map(|name| self.ident(name))
            .transpose()?;
        let path = self.text(self.required(node, "path")?)?;
        Ok(ImportSpec {
            name,
            path: path.trim_matches(|c| c == '"' || c == '`').to_string(),
            span: self.span(node),
        })
    }

    fn value_spec(&self, node: TsNode) -> Result<ValueSpec> {
        let names = field_nodes(node, "name")
            .into_iter()
            .map(|name| self.ident(name))
            .collect::<Result<Vec<_>>>()?;
        let ty = node
            .child_by_field_name("type")
            .map(|ty| self.expr(ty))
            .transpose()?;
        let values = match node.child_by_field_name("value") {
            Some(values) => self.expr_list(values)?,
            None => Vec::new(),
        };
        Ok(ValueSpec { names, ty, values })
    }

    fn func_decl(&self, node: TsNode) -> Result<FuncDecl> {
        if node.child_by_field_name("type_parameters").is_some() {
            return Err(self.generics(node));
        }
        let recv = match node.child_by_field_name("receiver") {
            Some(list) => self.params(list)?.into_iter().next(),
            None => None,
        };
        let name = self.ident(self.required(node, "name")?)?;
        let ty = self.signature(node)?;
        let body = node
            .child_by_field_name("body")
            .map(|body| self.block(body))
            .transpose()?;
        Ok(FuncDecl {
            recv,
            name,
            ty,
            body,
        })
    }

    /// Reads the `parameters` and `result` fields of a function-like node.
    fn signature(&self, node: TsNode) -> Result<FuncType> {
        let params = match node.child_by_field_name("parameters") {
            Some(list) => self.params(list)?,
            None => Vec::new(),
        };
        let results = match node.child_by_field_name("result") {
            Some(result) if result.kind() == "parameter_list" => self.params(result)?,
            Some(result) => vec![Field::new(Vec::new(), self.expr(result)?)],
            None => Vec::new(),
        };
        Ok(FuncType {
            id: self.fset.fresh_id(),
            params,
            results,
        })
    }

    fn params(&self, list: TsNode) -> Result<Vec<Field>> {
        let mut fields = Vec::new();
        for param in named(list) {
            let names = field_nodes(param, "name")
                .into_iter()
                .map(|name| self.ident(name))
                .collect::<Result<Vec<_>>>()?;
            let ty_node = self.required(param, "type")?;
            let mut ty = self.expr(ty_node)?;
            if param.kind() == "variadic_parameter_declaration" {
                ty = self.mk(ty_node, ExprKind::Ellipsis(Box::new(ty)));
            }
            fields.push(Field::new(names, ty));
        }
        Ok(fields)
    }

    fn block(&self, node: TsNode) -> Result<BlockStmt> {
        Ok(BlockStmt::new(self.fset.fresh_id(), self.stmt_list(named(node))?))
    }

    fn stmt_list(&self, nodes: Vec<TsNode>) -> Result<Vec<Stmt>> {
        let mut stmts = Vec::new();
        for node in nodes {
            if node.kind() == "statement_list" {
                stmts.extend(self.stmt_list(named(node))?);
            } else {
                stmts.push(self.stmt(node)?);
            }
        }
        Ok(stmts)
    }

    fn stmt(&self, node: TsNode) -> Result<Stmt> {
        let stmt = match node.kind() {
            "expression_statement" => Stmt::Expr(ExprStmt {
                x: self.first_expr(node)?,
            }),
            "send_statement" => Stmt::Send(SendStmt {
                chan: self.expr(self.required(node, "channel")?)?,
                value: self.expr(self.required(node, "value")?)?,
            }),
            "inc_statement" | "dec_statement" => Stmt::IncDec(IncDecStmt {
                x: self.first_expr(node)?,
                inc: node.kind() == "inc_statement",
            }),
            "assignment_statement" => {
                let operator = self.text(self.required(node, "operator")?)?;
                let tok = AssignOp::from_token(operator)
                    .ok_or_else(|| eyre!("unknown assignment operator {operator}"))?;
                self.assign(node, tok)?
            }
            "short_var_declaration" => self.assign(node, AssignOp::Define)?,
            "receive_statement" => match node.child_by_field_name("left") {
                Some(_) => {
                    let tok = if has_token(node, ":=") {
                        AssignOp::Define
                    } else {
                        AssignOp::Assign
                    };
                    self.assign(node, tok)?
                }
                None => Stmt::Expr(ExprStmt {
                    x: self.expr(self.required(node, "right")?)?,
                }),
            },
            "var_declaration" | "const_declaration" | "type_declaration" => {
                Stmt::Decl(self.gen_decl(node)?)
            }
            "return_statement" => Stmt::Return(ReturnStmt {
                results: match named(node).into_iter().next() {
                    Some(list) => self.expr_list(list)?,
                    None => Vec::new(),
                },
                span: self.span(node),
            }),
            "go_statement" => Stmt::Go(self.first_expr(node)?),
            "defer_statement" => Stmt::Defer(self.first_expr(node)?),
            "if_statement" => Stmt::If(self.if_stmt(node)?),
            "for_statement" => self.for_stmt(node)?,
            "expression_switch_statement" => Stmt::Switch(self.switch_stmt(node)?),
            "type_switch_statement" => Stmt::TypeSwitch(self.type_switch_stmt(node)?),
            "select_statement" => Stmt::Select(self.select_stmt(node)?),
            "labeled_statement" => {
                let label = self.required(node, "label")?;
                let inner = unfielded(node)
                    .into_iter()
                    .next()
                    .map(|inner| self.stmt(inner).map(Box::new))
                    .transpose()?;
                Stmt::Labeled(LabeledStmt {
                    label: self.ident(label)?,
                    stmt: inner,
                })
            }
            "fallthrough_statement" => self.branch(node, BranchKind::Fallthrough)?,
            "break_statement" => self.branch(node, BranchKind::Break)?,
            "continue_statement" => self.branch(node, BranchKind::Continue)?,
            "goto_statement" => self.branch(node, BranchKind::Goto)?,
            "block" => Stmt::Block(self.block(node)?),
            "empty_statement" => Stmt::Empty,
            other => return Err(eyre!("unsupported go statement: {other}")),
        };
        Ok(stmt)
    }

    fn first_expr(&self, node: TsNode) -> Result<Expr> {
        let inner = named(node)
            .into_iter()
            .next()
            .ok_or_else(|| eyre!("{} missing expression", node.kind()))?;
        self.expr(inner)
    }

    fn assign(&self, node: TsNode, tok: AssignOp) -> Result<Stmt> {
        Ok(Stmt::Assign(AssignStmt {
            lhs: self.expr_list(self.required(node, "left")?)?,
            tok,
            rhs: self.expr_list(self.required(node, "right")?)?,
            span: self.span(node),
        }))
    }

    fn branch(&self, node: TsNode, kind: BranchKind) -> Result<Stmt> {
        let label = named(node)
            .into_iter()
            .next()
            .map(|label| self.ident(label))
            .transpose()?;
        Ok(Stmt::Branch(BranchStmt { kind, label }))
    }

    fn simple(&self, node: Option<TsNode>) -> Result<Option<Box<Stmt>>> {
        node.map(|node| self.stmt(node).map(Box::new)).transpose()
    }

    fn if_stmt(&self, node: TsNode) -> Result<IfStmt> {
        let els = match node.child_by_field_name("alternative") {
            Some(alt) if alt.kind() == "if_statement" => {
                Some(Box::new(Stmt::If(self.if_stmt(alt)?)))
            }
            Some(alt) => Some(Box::new(Stmt::Block(self.block(alt)?))),
            None => None,
        };
        Ok(IfStmt {
            id: self.fset.fresh_id(),
            init: self.simple(node.child_by_field_name("initializer"))?,
            cond: self.expr(self.required(node, "condition")?)?,
            then: self.block(self.required(node, "consequence")?)?,
            els,
        })
    }

    fn for_stmt(&self, node: TsNode) -> Result<Stmt> {
        let id = self.fset.fresh_id();
        let header = unfielded(node).into_iter().next();
        let body = self.block(self.required(node, "body")?)?;

        let stmt = match header {
            Some(clause) if clause.kind() == "for_clause" => Stmt::For(ForStmt {
                id,
                init: self.simple(clause.child_by_field_name("initializer"))?,
                cond: clause
                    .child_by_field_name("condition")
                    .map(|cond| self.expr(cond))
                    .transpose()?,
                post: self.simple(clause.child_by_field_name("update"))?,
                body,
            }),
            Some(clause) if clause.kind() == "range_clause" => {
                let (mut key, mut value, mut tok) = (None, None, None);
                if let Some(left) = clause.child_by_field_name("left") {
                    let mut targets = self.expr_list(left)?.into_iter();
                    key = targets.next();
                    value = targets.next();
                    tok = Some(if has_token(clause, ":=") {
                        AssignOp::Define
                    } else {
                        AssignOp::Assign
                    });
                }
                Stmt::Range(RangeStmt {
                    id,
                    key,
                    value,
                    tok,
                    x: self.expr(self.required(clause, "right")?)?,
                    body,
                })
            }
            Some(cond) => Stmt::For(ForStmt {
                id,
                init: None,
                cond: Some(self.expr(cond)?),
                post: None,
                body,
            }),
            None => Stmt::For(ForStmt {
                id,
                init: None,
                cond: None,
                post: None,
                body,
            }),
        };
        Ok(stmt)
    }

    /// Statements of a `case`/`default` clause, skipping the clause header.
    fn clause_body(&self, node: TsNode) -> Result<Vec<Stmt>> {
        self.stmt_list(unfielded(node))
    }

    fn switch_stmt(&self, node: TsNode) -> Result<SwitchStmt> {
        let mut clauses = Vec::new();
        for clause in unfielded(node) {
            let list = match clause.child_by_field_name("value") {
                Some(values) => self.expr_list(values)?,
                None => Vec::new(),
            };
            clauses.push(CaseClause {
                id: self.fset.fresh_id(),
                list,
                is_default: clause.kind() == "default_case",
                body: self.clause_body(clause)?,
            });
        }
        Ok(SwitchStmt {
            id: self.fset.fresh_id(),
            init: self.simple(node.child_by_field_name("initializer"))?,
            tag: node
                .child_by_field_name("value")
                .map(|tag| self.expr(tag))
                .transpose()?,
            clauses,
        })
    }

    fn type_switch_stmt(&self, node: TsNode) -> Result<TypeSwitchStmt> {
        let mut clauses = Vec::new();
        for clause in unfielded(node) {
            if clause.kind() == "expression_list" {
                continue;
            }
            let list = field_nodes(clause, "type")
                .into_iter()
                .map(|ty| self.expr(ty))
                .collect::<Result<Vec<_>>>()?;
            clauses.push(CaseClause {
                id: self.fset.fresh_id(),
                list,
                is_default: clause.kind() == "default_case",
                body: self.clause_body(clause)?,
            });
        }
        let binding = match node.child_by_field_name("alias") {
            Some(alias) => named(alias)
                .into_iter()
                .next()
                .or(Some(alias))
                .map(|name| self.ident(name))
                .transpose()?,
            None => None,
        };
        Ok(TypeSwitchStmt {
            id: self.fset.fresh_id(),
            init: self.simple(node.child_by_field_name("initializer"))?,
            binding,
            x: self.expr(self.required(node, "value")?)?,
            clauses,
        })
    }

    fn select_stmt(&self, node: TsNode) -> Result<SelectStmt> {
        let mut clauses = Vec::new();
        for clause in named(node) {
            clauses.push(CommClause {
                id: self.fset.fresh_id(),
                comm: self.simple(clause.child_by_field_name("communication"))?,
                body: self.clause_body(clause)?,
            });
        }
        Ok(SelectStmt { clauses })
    }

    fn expr_list(&self, node: TsNode) -> Result<Vec<Expr>> {
        if node.kind() == "expression_list" {
            named(node).into_iter().map(|expr| self.expr(expr)).collect()
        } else {
            Ok(vec![self.expr(node)?])
        }
    }

    fn boxed(&self, node: TsNode, field: &str) -> Result<Box<Expr>> {
        Ok(Box::new(self.expr(self.required(node, field)?)?))
    }

    fn opt_boxed(&self, node: TsNode, field: &str) -> Result<Option<Box<Expr>>> {
        node.child_by_field_name(field)
            .map(|child| self.expr(child).map(Box::new))
            .transpose()
    }

    fn lit(&self, node: TsNode, kind: LitKind) -> Result<Expr> {
        let value = self.text(node)?.to_string();
        Ok(self.mk(node, ExprKind::BasicLit(BasicLit { kind, value })))
    }

    /// Lowers expressions and type expressions alike.
    fn expr(&self, node: TsNode) -> Result<Expr> {
        let kind = match node.kind() {
            "identifier" | "field_identifier" | "type_identifier" | "package_identifier"
            | "blank_identifier" | "label_name" | "nil" | "true" | "false" | "iota" => {
                ExprKind::Ident(self.ident(node)?)
            }
            "int_literal" => return self.lit(node, LitKind::Int),
            "float_literal" => return self.lit(node, LitKind::Float),
            "imaginary_literal" => return self.lit(node, LitKind::Imag),
            "rune_literal" => return self.lit(node, LitKind::Char),
            "interpreted_string_literal" | "raw_string_literal" => {
                return self.lit(node, LitKind::String)
            }
            "parenthesized_expression" | "parenthesized_type" => {
                ExprKind::Paren(Box::new(self.first_expr(node)?))
            }
            "literal_element" => return self.first_expr(node),
            "selector_expression" => ExprKind::Selector(SelectorExpr {
                x: self.boxed(node, "operand")?,
                sel: self.ident(self.required(node, "field")?)?,
            }),
            "qualified_type" => ExprKind::Selector(SelectorExpr {
                x: self.boxed(node, "package")?,
                sel: self.ident(self.required(node, "name")?)?,
            }),
            "index_expression" => ExprKind::Index(IndexExpr {
                x: self.boxed(node, "operand")?,
                index: self.boxed(node, "index")?,
            }),
            "slice_expression" => ExprKind::Slice(SliceExpr {
                x: self.boxed(node, "operand")?,
                low: self.opt_boxed(node, "start")?,
                high: self.opt_boxed(node, "end")?,
                max: self.opt_boxed(node, "capacity")?,
            }),
            "type_assertion_expression" => ExprKind::TypeAssert(TypeAssertExpr {
                x: self.boxed(node, "operand")?,
                ty: Some(self.boxed(node, "type")?),
            }),
            "call_expression" => {
                if node.child_by_field_name("type_arguments").is_some() {
                    return Err(self.generics(node));
                }
                let mut args = Vec::new();
                let mut ellipsis = false;
                for arg in named(self.required(node, "arguments")?) {
                    if arg.kind() == "variadic_argument" {
                        ellipsis = true;
                        args.push(self.first_expr(arg)?);
                    } else {
                        args.push(self.expr(arg)?);
                    }
                }
                ExprKind::Call(CallExpr {
                    fun: self.boxed(node, "function")?,
                    args,
                    ellipsis,
                })
            }
            "type_conversion_expression" => ExprKind::Call(CallExpr {
                fun: self.boxed(node, "type")?,
                args: vec![self.expr(self.required(node, "operand")?)?],
                ellipsis: false,
            }),
            "unary_expression" => {
                let operator = self.text(self.required(node, "operator")?)?;
                let operand = self.boxed(node, "operand")?;
                if operator == "*" {
                    ExprKind::Star(operand)
                } else {
                    let op = UnaryOp::from_token(operator)
                        .ok_or_else(|| eyre!("unknown unary operator {operator}"))?;
                    ExprKind::Unary(UnaryExpr { op, x: operand })
                }
            }
            "binary_expression" => {
                let operator = self.text(self.required(node, "operator")?)?;
                let op = BinaryOp::from_token(operator)
                    .ok_or_else(|| eyre!("unknown binary operator {operator}"))?;
                ExprKind::Binary(BinaryExpr {
                    x: self.boxed(node, "left")?,
                    op,
                    y: self.boxed(node, "right")?,
                })
            }
            "composite_literal" => ExprKind::CompositeLit(CompositeLit {
                ty: Some(self.boxed(node, "type")?),
                elts: self.elements(self.required(node, "body")?)?,
            }),
            "literal_value" => ExprKind::CompositeLit(CompositeLit {
                ty: None,
                elts: self.elements(node)?,
            }),
            "keyed_element" => {
                let parts = named(node);
                let key = node.child_by_field_name("key").or(parts.first().copied());
                let value = node.child_by_field_name("value").or(parts.get(1).copied());
                match (key, value) {
                    (Some(key), Some(value)) => ExprKind::KeyValue(KeyValueExpr {
                        key: Box::new(self.expr(key)?),
                        value: Box::new(self.expr(value)?),
                    }),
                    _ => return Err(eyre!("malformed keyed element")),
                }
            }
            "func_literal" => ExprKind::FuncLit(FuncLit {
                ty: self.signature(node)?,
                body: self.block(self.required(node, "body")?)?,
            }),
            "pointer_type" => ExprKind::Star(Box::new(self.first_expr(node)?)),
            "slice_type" => ExprKind::SliceType(self.boxed(node, "element")?),
            "array_type" => ExprKind::ArrayType(ArrayType {
                len: Some(self.boxed(node, "length")?),
                elem: self.boxed(node, "element")?,
            }),
            "implicit_length_array_type" => ExprKind::ArrayType(ArrayType {
                len: None,
                elem: self.boxed(node, "element")?,
            }),
            "map_type" => ExprKind::MapType(MapType {
                key: self.boxed(node, "key")?,
                value: self.boxed(node, "value")?,
            }),
            "channel_type" => {
                let dir = match tokens(node).as_slice() {
                    ["<-", ..] => ChanDir::Recv,
                    ["chan", "<-", ..] => ChanDir::Send,
                    _ => ChanDir::Both,
                };
                ExprKind::ChanType(ChanType {
                    dir,
                    value: self.boxed(node, "value")?,
                })
            }
            "function_type" => ExprKind::FuncType(self.signature(node)?),
            "struct_type" => ExprKind::StructType(StructType {
                fields: self.struct_fields(node)?,
            }),
            "interface_type" => ExprKind::InterfaceType(InterfaceType {
                elems: self.interface_elems(node)?,
            }),
            "generic_type" | "type_instantiation_expression" | "union_type" | "negated_type" => {
                return Err(self.generics(node))
            }
            other => return Err(eyre!("unsupported go expression: {other}")),
        };
        Ok(self.mk(node, kind))
    }

    fn elements(&self, literal_value: TsNode) -> Result<Vec<Expr>> {
        named(literal_value)
            .into_iter()
            .map(|elt| self.expr(elt))
            .collect()
    }

    fn struct_fields(&self, node: TsNode) -> Result<Vec<Field>> {
        let mut fields = Vec::new();
        for list in named(node) {
            for decl in named(list) {
                if decl.kind() != "field_declaration" {
                    continue;
                }
                let names = field_nodes(decl, "name")
                    .into_iter()
                    .map(|name| self.ident(name))
                    .collect::<Result<Vec<_>>>()?;
                let ty_node = self.required(decl, "type")?;
                let mut ty = self.expr(ty_node)?;
                if names.is_empty() && has_token(decl, "*") {
                    ty = self.mk(ty_node, ExprKind::Star(Box::new(ty)));
                }
                let tag = decl
                    .child_by_field_name("tag")
                    .map(|tag| self.text(tag).map(str::to_string))
                    .transpose()?;
                fields.push(Field { names, ty, tag });
            }
        }
        Ok(fields)
    }

    fn interface_elems(&self, node: TsNode) -> Result<Vec<InterfaceElem>> {
        let mut elems = Vec::new();
        for elem in named(node) {
            match elem.kind() {
                "method_elem" | "method_spec" => elems.push(InterfaceElem::Method {
                    name: self.ident(self.required(elem, "name")?)?,
                    ty: self.signature(elem)?,
                }),
                "type_elem" | "constraint_elem" => {
                    let mut types = named(elem);
                    if types.len() != 1 {
                        return Err(self.generics(elem));
                    }
                    elems.push(InterfaceElem::Embedded(self.expr(types.remove(0))?));
                }
                _ => elems.push(InterfaceElem::Embedded(self.expr(elem)?)),
            }
        }
        Ok(elems)
    }
}
