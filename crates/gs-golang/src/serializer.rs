//! Go source serializer for the Go AST.
//!
//! Output follows gofmt layout closely enough to be stable and readable: tabs
//! for indentation, one statement per line and a blank line between top-level
//! declarations. Binary operators are spaced the way gofmt spaces them: blanks
//! are dropped around the tighter-binding operators of mixed expressions and
//! inside argument lists and index expressions. Comments are not preserved.

use gs_core::ast::*;
use gs_core::error::Result;
use itertools::Itertools;

const LOWEST_PREC: u8 = 0;
const UNARY_PREC: u8 = 6;
const HIGHEST_PREC: u8 = 7;

#[derive(Clone, Debug, Default)]
pub struct GoSerializer;

impl GoSerializer {
    pub fn new() -> Self {
        Self
    }
}

impl AstSerializer for GoSerializer {
    fn serialize_file(&self, file: &File) -> Result<String> {
        let mut emitter = GoEmitter::new(0);
        emitter.emit_file(file);
        Ok(emitter.finish())
    }

    fn serialize_stmt(&self, stmt: &Stmt) -> Result<String> {
        let mut emitter = GoEmitter::new(0);
        emitter.emit_stmt(stmt);
        Ok(emitter.finish())
    }

    fn serialize_expr(&self, expr: &Expr) -> Result<String> {
        Ok(GoEmitter::new(0).render_expr(expr))
    }
}

struct GoEmitter {
    code: String,
    indent: usize,
}

impl GoEmitter {
    fn new(indent: usize) -> Self {
        Self {
            code: String::new(),
            indent,
        }
    }

    fn finish(self) -> String {
        let mut code = self.code.trim_end().to_string();
        code.push('\n');
        code
    }

    fn push_line(&mut self, line: &str) {
        for _ in 0..self.indent {
            self.code.push('\t');
        }
        self.code.push_str(line);
        self.code.push('\n');
    }

    fn push_blank_line(&mut self) {
        if !self.code.is_empty() && !self.code.ends_with("\n\n") {
            self.code.push('\n');
        }
    }

    /// Renders a nested construct whose body spans several lines, such as a
    /// function literal, at one level deeper than the current line.
    fn nested(&self, emit: impl FnOnce(&mut GoEmitter)) -> String {
        let mut inner = GoEmitter::new(self.indent + 1);
        emit(&mut inner);
        inner.code
    }

    fn tabs(&self) -> String {
        "\t".repeat(self.indent)
    }

    fn emit_file(&mut self, file: &File) {
        self.push_line(&format!("package {}", file.package));
        for decl in &file.decls {
            self.push_blank_line();
            match decl {
                Decl::Gen(gen) => self.emit_gen_decl(gen),
                Decl::Func(func) => self.emit_func_decl(func),
            }
        }
    }

    fn emit_gen_decl(&mut self, decl: &GenDecl) {
        let keyword = decl.kind.keyword();
        if decl.grouped || decl.specs.len() > 1 {
            self.push_line(&format!("{} (", keyword));
            self.indent += 1;
            for spec in &decl.specs {
                let rendered = self.render_spec(spec);
                self.push_line(&rendered);
            }
            self.indent -= 1;
            self.push_line(")");
        } else if let Some(spec) = decl.specs.first() {
            let rendered = self.render_spec(spec);
            self.push_line(&format!("{} {}", keyword, rendered));
        }
    }

    fn render_spec(&self, spec: &Spec) -> String {
        match spec {
            Spec::Import(import) => match &import.name {
                Some(name) => format!("{} {:?}", name, import.path),
                None => format!("{:?}", import.path),
            },
            Spec::Value(value) => {
                let mut out = value.names.iter().join(", ");
                if let Some(ty) = &value.ty {
                    out.push(' ');
                    out.push_str(&self.render_expr(ty));
                }
                if !value.values.is_empty() {
                    out.push_str(" = ");
                    out.push_str(&self.render_exprs(&value.values));
                }
                out
            }
            Spec::Type(ty) => {
                let sep = if ty.alias { " = " } else { " " };
                format!("{}{}{}", ty.name, sep, self.render_expr(&ty.ty))
            }
        }
    }

    fn emit_func_decl(&mut self, func: &FuncDecl) {
        let recv = match &func.recv {
            Some(recv) => format!("({}) ", self.render_field(recv)),
            None => String::new(),
        };
        let header = format!("func {}{}{}", recv, func.name, self.render_signature(&func.ty));
        match &func.body {
            Some(body) => {
                self.push_line(&format!("{} {{", header));
                self.emit_block_body(body);
                self.push_line("}");
            }
            None => self.push_line(&header),
        }
    }

    fn emit_block_body(&mut self, block: &BlockStmt) {
        self.indent += 1;
        for stmt in &block.stmts {
            self.emit_stmt(stmt);
        }
        self.indent -= 1;
    }

    fn emit_stmts(&mut self, stmts: &[Stmt]) {
        self.indent += 1;
        for stmt in stmts {
            self.emit_stmt(stmt);
        }
        self.indent -= 1;
    }

    fn emit_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Decl(decl) => self.emit_gen_decl(decl),
            Stmt::Empty => {}
            Stmt::Labeled(labeled) => {
                let indent = self.indent;
                self.indent = indent.saturating_sub(1);
                self.push_line(&format!("{}:", labeled.label));
                self.indent = indent;
                if let Some(inner) = &labeled.stmt {
                    self.emit_stmt(inner);
                }
            }
            Stmt::Block(block) => {
                self.push_line("{");
                self.emit_block_body(block);
                self.push_line("}");
            }
            Stmt::If(stmt) => {
                let header = self.render_if_header(stmt);
                self.push_line(&format!("if {} {{", header));
                self.emit_if_tail(stmt);
            }
            Stmt::Switch(stmt) => {
                let mut header = String::from("switch ");
                if let Some(init) = &stmt.init {
                    header.push_str(&self.render_simple(init));
                    header.push_str("; ");
                }
                if let Some(tag) = &stmt.tag {
                    header.push_str(&self.render_expr(tag));
                    header.push(' ');
                }
                header.push('{');
                self.push_line(&header);
                for clause in &stmt.clauses {
                    self.emit_case_clause(clause);
                }
                self.push_line("}");
            }
            Stmt::TypeSwitch(stmt) => {
                let mut header = String::from("switch ");
                if let Some(init) = &stmt.init {
                    header.push_str(&self.render_simple(init));
                    header.push_str("; ");
                }
                if let Some(binding) = &stmt.binding {
                    header.push_str(&format!("{} := ", binding));
                }
                header.push_str(&format!("{}.(type) {{", self.render_expr(&stmt.x)));
                self.push_line(&header);
                for clause in &stmt.clauses {
                    self.emit_case_clause(clause);
                }
                self.push_line("}");
            }
            Stmt::Select(stmt) => {
                self.push_line("select {");
                for clause in &stmt.clauses {
                    match &clause.comm {
                        Some(comm) => {
                            let rendered = self.render_simple(comm);
                            self.push_line(&format!("case {}:", rendered));
                        }
                        None => self.push_line("default:"),
                    }
                    self.emit_stmts(&clause.body);
                }
                self.push_line("}");
            }
            Stmt::For(stmt) => {
                let header = match (&stmt.init, &stmt.cond, &stmt.post) {
                    (None, None, None) => "for {".to_string(),
                    (None, Some(cond), None) => format!("for {} {{", self.render_expr(cond)),
                    (init, cond, post) => format!(
                        "for {}; {}; {} {{",
                        init.as_ref().map(|s| self.render_simple(s)).unwrap_or_default(),
                        cond.as_ref().map(|c| self.render_expr(c)).unwrap_or_default(),
                        post.as_ref().map(|s| self.render_simple(s)).unwrap_or_default(),
                    ),
                };
                self.push_line(header.replace(";  {", "; {").trim_end());
                self.emit_block_body(&stmt.body);
                self.push_line("}");
            }
            Stmt::Range(stmt) => {
                let header = match (&stmt.key, &stmt.value, stmt.tok) {
                    (Some(key), value, Some(tok)) => {
                        let mut targets = self.render_expr(key);
                        if let Some(value) = value {
                            targets.push_str(", ");
                            targets.push_str(&self.render_expr(value));
                        }
                        let range = self.render_expr(&stmt.x);
                        format!("for {} {} range {} {{", targets, tok.as_str(), range)
                    }
                    _ => format!("for range {} {{", self.render_expr(&stmt.x)),
                };
                self.push_line(&header);
                self.emit_block_body(&stmt.body);
                self.push_line("}");
            }
            simple => {
                let rendered = self.render_simple(simple);
                self.push_line(&rendered);
            }
        }
    }

    fn render_if_header(&self, stmt: &IfStmt) -> String {
        match &stmt.init {
            Some(init) => format!("{}; {}", self.render_simple(init), self.render_expr(&stmt.cond)),
            None => self.render_expr(&stmt.cond),
        }
    }

    fn emit_if_tail(&mut self, stmt: &IfStmt) {
        self.emit_block_body(&stmt.then);
        match stmt.els.as_deref() {
            Some(Stmt::If(next)) => {
                let header = self.render_if_header(next);
                self.push_line(&format!("}} else if {} {{", header));
                self.emit_if_tail(next);
            }
            Some(Stmt::Block(block)) => {
                self.push_line("} else {");
                self.emit_block_body(block);
                self.push_line("}");
            }
            Some(other) => {
                self.push_line("} else {");
                self.indent += 1;
                self.emit_stmt(other);
                self.indent -= 1;
                self.push_line("}");
            }
            None => self.push_line("}"),
        }
    }

    fn emit_case_clause(&mut self, clause: &CaseClause) {
        if clause.is_default {
            self.push_line("default:");
        } else {
            let list = self.render_exprs(&clause.list);
            self.push_line(&format!("case {}:", list));
        }
        self.emit_stmts(&clause.body);
    }

    /// Statements that fit on a single line, also used in headers.
    fn render_simple(&self, stmt: &Stmt) -> String {
        match stmt {
            Stmt::Expr(stmt) => self.render_expr(&stmt.x),
            Stmt::Send(send) => format!(
                "{} <- {}",
                self.render_expr(&send.chan),
                self.render_expr(&send.value)
            ),
            Stmt::IncDec(stmt) => format!(
                "{}{}",
                self.render_expr_at(&stmt.x, 2),
                if stmt.inc { "++" } else { "--" }
            ),
            Stmt::Assign(assign) => {
                let depth = if assign.lhs.len() > 1 && assign.rhs.len() > 1 { 2 } else { 1 };
                format!(
                    "{} {} {}",
                    self.render_list(&assign.lhs, depth),
                    assign.tok.as_str(),
                    self.render_list(&assign.rhs, depth)
                )
            }
            Stmt::Go(call) => format!("go {}", self.render_expr(call)),
            Stmt::Defer(call) => format!("defer {}", self.render_expr(call)),
            Stmt::Return(ret) if ret.results.is_empty() => "return".to_string(),
            Stmt::Return(ret) => format!("return {}", self.render_exprs(&ret.results)),
            Stmt::Branch(branch) => match &branch.label {
                Some(label) => format!("{} {}", branch.kind.as_str(), label),
                None => branch.kind.as_str().to_string(),
            },
            Stmt::Empty => String::new(),
            other => {
                let mut inner = GoEmitter::new(self.indent);
                inner.emit_stmt(other);
                inner.code.trim().to_string()
            }
        }
    }

    fn render_exprs(&self, exprs: &[Expr]) -> String {
        self.render_list(exprs, 1)
    }

    fn render_list(&self, exprs: &[Expr], depth: usize) -> String {
        exprs.iter().map(|expr| self.render_expr_at(expr, depth)).join(", ")
    }

    fn render_field(&self, field: &Field) -> String {
        let ty = self.render_expr(&field.ty);
        let mut out = if field.names.is_empty() {
            ty
        } else {
            format!("{} {}", field.names.iter().join(", "), ty)
        };
        if let Some(tag) = &field.tag {
            out.push(' ');
            out.push_str(tag);
        }
        out
    }

    fn render_signature(&self, ty: &FuncType) -> String {
        let params = ty.params.iter().map(|field| self.render_field(field)).join(", ");
        let results = match ty.results.as_slice() {
            [] => String::new(),
            [single] if single.names.is_empty() => format!(" {}", self.render_expr(&single.ty)),
            fields => format!(
                " ({})",
                fields.iter().map(|field| self.render_field(field)).join(", ")
            ),
        };
        format!("({}){}", params, results)
    }

    fn render_expr(&self, expr: &Expr) -> String {
        self.render_operand(expr, LOWEST_PREC, 1)
    }

    fn render_expr_at(&self, expr: &Expr, depth: usize) -> String {
        self.render_operand(expr, LOWEST_PREC, depth)
    }

    /// Render `expr` as an operand binding at least as tight as `prec1`.
    /// `depth` grows inside argument lists and index expressions, where
    /// binary expressions are printed more compactly.
    fn render_operand(&self, expr: &Expr, prec1: u8, depth: usize) -> String {
        match &expr.kind {
            ExprKind::Ident(ident) => ident.name.clone(),
            ExprKind::BasicLit(lit) => lit.value.clone(),
            ExprKind::CompositeLit(lit) => {
                let ty = lit.ty.as_ref().map(|ty| self.render_expr(ty)).unwrap_or_default();
                format!("{}{{{}}}", ty, self.render_exprs(&lit.elts))
            }
            ExprKind::FuncLit(lit) => {
                let body = self.nested(|inner| {
                    for stmt in &lit.body.stmts {
                        inner.emit_stmt(stmt);
                    }
                });
                format!(
                    "func{} {{\n{}{}}}",
                    self.render_signature(&lit.ty),
                    body,
                    self.tabs()
                )
            }
            ExprKind::Paren(inner) if matches!(inner.kind, ExprKind::Paren(_)) => {
                self.render_expr_at(inner, depth)
            }
            ExprKind::Paren(inner) => {
                format!("({})", self.render_expr_at(inner, reduce_depth(depth)))
            }
            ExprKind::Selector(sel) => {
                format!("{}.{}", self.render_operand(&sel.x, HIGHEST_PREC, depth), sel.sel)
            }
            ExprKind::Index(index) => format!(
                "{}[{}]",
                self.render_operand(&index.x, HIGHEST_PREC, 1),
                self.render_expr_at(&index.index, depth + 1)
            ),
            ExprKind::Slice(slice) => self.render_slice(slice, depth),
            ExprKind::TypeAssert(assert) => {
                let x = self.render_operand(&assert.x, HIGHEST_PREC, depth);
                match &assert.ty {
                    Some(ty) => format!("{}.({})", x, self.render_expr(ty)),
                    None => format!("{}.(type)", x),
                }
            }
            ExprKind::Call(call) => {
                let depth = if call.args.len() > 1 { depth + 1 } else { depth };
                format!(
                    "{}({}{})",
                    self.render_operand(&call.fun, HIGHEST_PREC, depth),
                    self.render_list(&call.args, depth),
                    if call.ellipsis { "..." } else { "" }
                )
            }
            ExprKind::Star(inner) => format!("*{}", self.render_operand(inner, UNARY_PREC, depth)),
            ExprKind::Unary(unary) => format!(
                "{}{}",
                unary.op.as_str(),
                self.render_operand(&unary.x, UNARY_PREC, depth)
            ),
            ExprKind::Binary(binary) => self.render_binary(binary, prec1, depth),
            ExprKind::KeyValue(kv) => format!(
                "{}: {}",
                self.render_expr(&kv.key),
                self.render_expr(&kv.value)
            ),
            ExprKind::Ellipsis(inner) => format!("...{}", self.render_expr(inner)),
            ExprKind::ArrayType(array) => match &array.len {
                Some(len) => {
                    format!("[{}]{}", self.render_expr(len), self.render_expr(&array.elem))
                }
                None => format!("[...]{}", self.render_expr(&array.elem)),
            },
            ExprKind::SliceType(elem) => format!("[]{}", self.render_expr(elem)),
            ExprKind::MapType(map) => format!(
                "map[{}]{}",
                self.render_expr(&map.key),
                self.render_expr(&map.value)
            ),
            ExprKind::ChanType(chan) => {
                let prefix = match chan.dir {
                    ChanDir::Both => "chan ",
                    ChanDir::Send => "chan<- ",
                    ChanDir::Recv => "<-chan ",
                };
                format!("{}{}", prefix, self.render_expr(&chan.value))
            }
            ExprKind::FuncType(ty) => format!("func{}", self.render_signature(ty)),
            ExprKind::StructType(st) if st.fields.is_empty() => "struct{}".to_string(),
            ExprKind::StructType(st) => {
                let body = self.nested(|inner| {
                    for field in &st.fields {
                        let rendered = inner.render_field(field);
                        inner.push_line(&rendered);
                    }
                });
                format!("struct {{\n{}{}}}", body, self.tabs())
            }
            ExprKind::InterfaceType(iface) if iface.elems.is_empty() => "interface{}".to_string(),
            ExprKind::InterfaceType(iface) => {
                let body = self.nested(|inner| {
                    for elem in &iface.elems {
                        let rendered = match elem {
                            InterfaceElem::Method { name, ty } => {
                                format!("{}{}", name, inner.render_signature(ty))
                            }
                            InterfaceElem::Embedded(expr) => inner.render_expr(expr),
                        };
                        inner.push_line(&rendered);
                    }
                });
                format!("interface {{\n{}{}}}", body, self.tabs())
            }
        }
    }

    fn render_binary(&self, binary: &BinaryExpr, prec1: u8, depth: usize) -> String {
        let prec = binary.op.precedence();
        if prec < prec1 {
            let inner = self.render_binary(binary, LOWEST_PREC, reduce_depth(depth));
            return format!("({})", inner);
        }
        let blank = prec < cutoff(binary, depth);
        let x = self.render_operand(&binary.x, prec, depth + diff_prec(&binary.x, prec));
        let y = self.render_operand(&binary.y, prec + 1, depth + 1);
        if blank {
            format!("{} {} {}", x, binary.op.as_str(), y)
        } else {
            format!("{}{}{}", x, binary.op.as_str(), y)
        }
    }

    fn render_slice(&self, slice: &SliceExpr, depth: usize) -> String {
        let mut indices = vec![slice.low.as_deref(), slice.high.as_deref()];
        if slice.max.is_some() {
            indices.push(slice.max.as_deref());
        }
        let present = indices.iter().flatten().count();
        let blanks = depth <= 1
            && present > 1
            && indices
                .iter()
                .flatten()
                .any(|index| matches!(index.kind, ExprKind::Binary(_)));

        let mut out = format!("{}[", self.render_operand(&slice.x, HIGHEST_PREC, 1));
        for (i, index) in indices.iter().enumerate() {
            if i > 0 {
                if blanks && indices[i - 1].is_some() {
                    out.push(' ');
                }
                out.push(':');
                if blanks && index.is_some() {
                    out.push(' ');
                }
            }
            if let Some(index) = index {
                out.push_str(&self.render_expr_at(index, depth + 1));
            }
        }
        out.push(']');
        out
    }
}

fn reduce_depth(depth: usize) -> usize {
    depth.saturating_sub(1).max(1)
}

/// Zero when `expr` is a binary expression at precedence `prec`.
fn diff_prec(expr: &Expr, prec: u8) -> usize {
    match &expr.kind {
        ExprKind::Binary(binary) if binary.op.precedence() == prec => 0,
        _ => 1,
    }
}

/// Operators binding tighter than the returned precedence lose their blanks.
fn cutoff(binary: &BinaryExpr, depth: usize) -> u8 {
    let (has4, has5, max_problem) = walk_binary(binary);
    if max_problem > 0 {
        return max_problem + 1;
    }
    match (has4 && has5, depth == 1) {
        (true, true) => 5,
        (true, false) => 4,
        (false, true) => 6,
        (false, false) => 4,
    }
}

/// Which precedence levels occur in an unparenthesized chain, and the
/// precedence that must keep its blanks so tokens such as `/ *` or `- -`
/// do not run together.
fn walk_binary(binary: &BinaryExpr) -> (bool, bool, u8) {
    let prec = binary.op.precedence();
    let mut has4 = prec == 4;
    let mut has5 = prec == 5;
    let mut max_problem = 0;

    if let ExprKind::Binary(left) = &binary.x.kind {
        if left.op.precedence() >= prec {
            let (h4, h5, problem) = walk_binary(left);
            has4 |= h4;
            has5 |= h5;
            max_problem = max_problem.max(problem);
        }
    }

    match &binary.y.kind {
        ExprKind::Binary(right) => {
            if right.op.precedence() > prec {
                let (h4, h5, problem) = walk_binary(right);
                has4 |= h4;
                has5 |= h5;
                max_problem = max_problem.max(problem);
            }
        }
        ExprKind::Star(_) if binary.op == BinaryOp::Quo => max_problem = 5,
        ExprKind::Unary(unary) => match (binary.op.as_str(), unary.op.as_str()) {
            ("&", "&") | ("&", "^") => max_problem = 5,
            ("+", "+") | ("-", "-") => max_problem = max_problem.max(4),
            _ => {}
        },
        _ => {}
    }
    (has4, has5, max_problem)
}

