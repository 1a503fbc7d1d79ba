use gs_core::ast::{AstSerializer, Decl, ExprKind, Spec, Stmt};
use gs_core::error::Error;
use gs_core::span::FileSet;
use pretty_assertions::assert_eq;

use crate::{GoParser, GoSerializer};

const CANONICAL: &str = r#"package main

import (
	"errors"
	"fmt"
)

type Reader interface {
	Read(p []byte) (n int, err error)
}

const (
	A = iota
	B
)

var count int

func (r *thing) load(name string, xs ...int) (int, error) {
	if name == "" {
		return 0, errors.New("empty")
	} else if len(xs) > 0 {
		count++
	}
	for i := 0; i < len(xs); i++ {
		fmt.Println(xs[i])
	}
	for _, x := range xs {
		count += x
	}
	switch name {
	case "a", "b":
		count--
	default:
		return 1, nil
	}
	f := func(v int) error {
		return nil
	}
	_ = f(1)
	return count, nil
}
"#;

fn parse(source: &str) -> gs_core::Result<gs_core::ast::File> {
    let mut fset = FileSet::new();
    GoParser::default().parse_file(&mut fset, "main.go", source)
}

#[test]
fn parse_basic_go_source() {
    let file = parse(CANONICAL).expect("parse should succeed");
    assert_eq!(file.package.name, "main");

    let imports: Vec<_> = file.imports().map(|import| import.path.as_str()).collect();
    assert_eq!(imports, vec!["errors", "fmt"]);

    let func = file.funcs().next().expect("expected method declaration");
    assert_eq!(func.name.name, "load");
    assert!(func.ty.is_variadic());
    assert_eq!(func.ty.results.len(), 2);
    let recv = func.recv.as_ref().expect("expected receiver");
    assert!(matches!(recv.ty.kind, ExprKind::Star(_)));

    let body = func.body.as_ref().expect("expected body");
    assert!(matches!(body.stmts[0], Stmt::If(_)));
    assert!(matches!(body.stmts[1], Stmt::For(_)));
    assert!(matches!(body.stmts[2], Stmt::Range(_)));
    assert!(matches!(body.stmts[3], Stmt::Switch(_)));
}

#[test]
fn const_group_keeps_implicit_repetition() {
    let file = parse(CANONICAL).unwrap();
    let consts = file
        .decls
        .iter()
        .find_map(|decl| match decl {
            Decl::Gen(gen) if gen.kind == gs_core::ast::DeclKind::Const => Some(gen),
            _ => None,
        })
        .expect("expected const group");
    assert!(consts.grouped);
    let Spec::Value(second) = &consts.specs[1] else {
        panic!("expected value spec");
    };
    assert_eq!(second.names[0].name, "B");
    assert!(second.values.is_empty());
}

#[test]
fn serialize_round_trips_canonical_source() {
    let file = parse(CANONICAL).unwrap();
    let output = GoSerializer::default()
        .serialize_file(&file)
        .expect("serialize should succeed");
    assert_eq!(output, CANONICAL);
}

#[test]
fn comments_are_skipped() {
    let source = "package main\n\n// entry point\nfunc main() {\n\t// nothing yet\n\t\
                  x := 1 // trailing\n\t_ = x\n}\n";
    let file = parse(source).unwrap();
    let body = file.funcs().next().unwrap().body.as_ref().unwrap();
    assert_eq!(body.stmts.len(), 2);

    let output = GoSerializer::default().serialize_file(&file).unwrap();
    assert_eq!(output, "package main\n\nfunc main() {\n\tx := 1\n\t_ = x\n}\n");
}

#[test]
fn syntax_errors_carry_a_position() {
    let err = parse("package main\n\nfunc main() {\n\tx := \n}\n").unwrap_err();
    let Error::Syntax(_, syntax) = err else {
        panic!("expected syntax error, got {err:?}");
    };
    let position = syntax.position.expect("expected position");
    assert_eq!(position.file.to_str(), Some("main.go"));
}

#[test]
fn generic_functions_are_rejected() {
    let err = parse("package main\n\nfunc id[T any](x T) T {\n\treturn x\n}\n").unwrap_err();
    assert!(matches!(err, Error::TypeCheck(_)), "got {err:?}");
}

#[test]
fn serialize_single_statement() {
    let source = "package main\n\nfunc main() {\n\tif v, ok := m[k]; ok {\n\t\tuse(v)\n\t}\n}\n";
    let file = parse(source).unwrap();
    let stmt = &file.funcs().next().unwrap().body.as_ref().unwrap().stmts[0];
    let output = GoSerializer::default().serialize_stmt(stmt).unwrap();
    assert_eq!(output, "if v, ok := m[k]; ok {\n\tuse(v)\n}\n");
}

#[test]
fn frontend_parses_and_hands_out_its_printer() {
    use gs_core::frontend::LanguageFrontend;

    let frontend = crate::GoFrontend::new();
    assert_eq!(frontend.language(), crate::frontend::GOLANG);
    assert_eq!(frontend.extensions(), &["go"]);

    let mut fset = FileSet::new();
    let parsed = frontend
        .parse(&mut fset, CANONICAL, std::path::Path::new("main.go"))
        .unwrap();
    assert_eq!(parsed.file.package.name, "main");
    assert_eq!(parsed.serializer.serialize_file(&parsed.file).unwrap(), CANONICAL);
}

#[test]
fn binary_operators_are_spaced_like_gofmt() {
    let source = r#"package main

func main() {
	fmt.Println(1<<3, 7/2, "a"+"b")
	println(n + i)
	x := a*b + c
	y := xs[i+1]
	z := s[lo+1 : hi-1]
	w := s[i+1:]
	ok := a == b && c < d
	f(a == b, c)
	q := x / *p
	u, v = m+1, n*2
	return x + 1, nil
}
"#;
    let file = parse(source).unwrap();
    assert_eq!(GoSerializer::default().serialize_file(&file).unwrap(), source);
}

#[test]
fn spacing_follows_operator_nesting() {
    let file = parse("package main\n\nfunc main() {\n\tg((a+b)*c, d)\n\th((a + b) * c)\n}\n")
        .unwrap();
    let body = &file.funcs().next().unwrap().body.as_ref().unwrap().stmts;
    let serializer = GoSerializer::default();
    let Stmt::Expr(first) = &body[0] else {
        panic!("expected expression statement");
    };
    assert_eq!(serializer.serialize_expr(&first.x).unwrap(), "g((a+b)*c, d)");
    let Stmt::Expr(second) = &body[1] else {
        panic!("expected expression statement");
    };
    assert_eq!(serializer.serialize_expr(&second.x).unwrap(), "h((a + b) * c)");
}
