use gs_core::ast::{AstSerializer, File};
use gs_core::error::Error;
use gs_core::span::FileSet;
use gs_golang::{GoParser, GoSerializer};
use gs_typing::StdImporter;
use pretty_assertions::assert_eq;

use crate::{transform, TransformReport};

fn parse(fset: &mut FileSet, source: &str) -> Vec<File> {
    let file = GoParser::default()
        .parse_file(fset, "main.go", source)
        .expect("parse");
    vec![file]
}

fn rewrite(source: &str) -> (String, TransformReport) {
    let mut fset = FileSet::new();
    let mut files = parse(&mut fset, source);
    let report = transform(&mut files, &mut fset, &mut StdImporter::new()).expect("transform");
    let output = GoSerializer::new().serialize_file(&files[0]).unwrap();
    (output, report)
}

#[test]
fn blank_error_in_tuple_assignment() {
    let (output, report) = rewrite(
        r#"package main

func pair() (int, error) {
	return 0, nil
}

func main() {
	x, _ := pair()
	println(x)
}
"#,
    );
    assert_eq!(
        output,
        r#"package main

func pair() (int, error) {
	return 0, nil
}

func main() {
	var err0 error
	x, err0 := pair()
	if err0 != nil {
		panic(err0)
	}
	println(x)
}
"#
    );
    assert_eq!(report.units, 2);
    assert_eq!(report.rewritten_units, 1);
    assert_eq!(report.variables, 1);
}

#[test]
fn bare_call_with_two_errors() {
    let (output, report) = rewrite(
        r#"package main

func f(g func() (error, error)) {
	g()
}
"#,
    );
    assert_eq!(
        output,
        r#"package main

func f(g func() (error, error)) {
	var err0, err1 error
	err0, err1 = g()
	if err0 != nil {
		panic(err0)
	}
	if err1 != nil {
		panic(err1)
	}
}
"#
    );
    assert_eq!(report.guards, 2);
    assert_eq!(report.statements, 1);
}

#[test]
fn handled_errors_are_left_alone() {
    let source = r#"package main

import "os"

func main() {
	f, err := os.Open("x")
	if err != nil {
		panic(err)
	}
	n := 1
	_ = n
	m := map[string]int{}
	v, _ := m["a"]
	_ = v
	defer f.Close()
}
"#;
    let mut fset = FileSet::new();
    let mut files = parse(&mut fset, source);
    let before = files.clone();
    let report = transform(&mut files, &mut fset, &mut StdImporter::new()).expect("transform");
    assert_eq!(files, before);
    assert_eq!(report.units, 1);
    assert_eq!(report.rewritten_units, 0);
}

#[test]
fn sibling_statements_share_a_variable() {
    let (output, report) = rewrite(
        r#"package main

import "os"

func main() {
	os.Remove("a")
	os.Remove("b")
}
"#,
    );
    assert_eq!(
        output,
        r#"package main

import "os"

func main() {
	var err0 error
	err0 = os.Remove("a")
	if err0 != nil {
		panic(err0)
	}
	err0 = os.Remove("b")
	if err0 != nil {
		panic(err0)
	}
}
"#
    );
    assert_eq!(report.variables, 1);
    assert_eq!(report.guards, 2);
}

#[test]
fn user_names_are_skipped() {
    let (output, _) = rewrite(
        r#"package main

import "os"

func main() {
	err0 := "taken"
	os.Remove(err0)
	if true {
		err1 := 1
		_ = err1
	}
}
"#,
    );
    assert_eq!(
        output,
        r#"package main

import "os"

func main() {
	var err2 error
	err0 := "taken"
	err2 = os.Remove(err0)
	if err2 != nil {
		panic(err2)
	}
	if true {
		err1 := 1
		_ = err1
	}
}
"#
    );
}

#[test]
fn non_error_results_stay_blank() {
    let (output, _) = rewrite(
        r#"package main

import "fmt"

func main() {
	fmt.Println("hi")
}
"#,
    );
    assert_eq!(
        output,
        r#"package main

import "fmt"

func main() {
	var err0 error
	_, err0 = fmt.Println("hi")
	if err0 != nil {
		panic(err0)
	}
}
"#
    );
}

#[test]
fn if_initializers_are_hoisted_into_a_block() {
    let (output, _) = rewrite(
        r#"package main

import "os"

func main() {
	if f, _ := os.Open("x"); f != nil {
		f.Close()
	}
}
"#,
    );
    assert_eq!(
        output,
        r#"package main

import "os"

func main() {
	var err0 error
	{
		f, err1 := os.Open("x")
		if err1 != nil {
			panic(err1)
		}
		if f != nil {
			err0 = f.Close()
			if err0 != nil {
				panic(err0)
			}
		}
	}
}
"#
    );
}

#[test]
fn nested_short_declarations_declare_their_own_variable() {
    let (output, _) = rewrite(
        r#"package main

import "strconv"

func main() {
	for i := 0; i < 3; i++ {
		n, _ := strconv.Atoi("1")
		println(n + i)
	}
}
"#,
    );
    assert_eq!(
        output,
        r#"package main

import "strconv"

func main() {
	for i := 0; i < 3; i++ {
		n, err0 := strconv.Atoi("1")
		if err0 != nil {
			panic(err0)
		}
		println(n + i)
	}
}
"#
    );
}

#[test]
fn labels_stay_on_their_statement() {
    let (output, _) = rewrite(
        r#"package main

import "os"

func main() {
outer:
	for {
		os.Remove("a")
		break outer
	}
}
"#,
    );
    assert_eq!(
        output,
        r#"package main

import "os"

func main() {
	var err0 error
outer:
	for {
		err0 = os.Remove("a")
		if err0 != nil {
			panic(err0)
		}
		break outer
	}
}
"#
    );
}

#[test]
fn function_literals_are_separate_units() {
    let (output, report) = rewrite(
        r#"package main

import "os"

var hook = func() {
	os.Remove("hook")
}

func main() {
	cleanup := func() {
		os.Remove("tmp")
	}
	cleanup()
	hook()
}
"#,
    );
    assert_eq!(
        output,
        r#"package main

import "os"

var hook = func() {
	var err0 error
	err0 = os.Remove("hook")
	if err0 != nil {
		panic(err0)
	}
}

func main() {
	cleanup := func() {
		var err0 error
		err0 = os.Remove("tmp")
		if err0 != nil {
			panic(err0)
		}
	}
	cleanup()
	hook()
}
"#
    );
    assert_eq!(report.units, 3);
    assert_eq!(report.rewritten_units, 2);
}

#[test]
fn assigning_loop_initializers_are_hoisted() {
    let (output, report) = rewrite(
        r#"package main

import (
	"os"
	"strconv"
)

func main() {
	var i int
	for i, _ = strconv.Atoi("1"); i < 3; i++ {
		println(i)
	}
	for os.Remove("lock"); ; {
		break
	}
}
"#,
    );
    assert_eq!(
        output,
        r#"package main

import (
	"os"
	"strconv"
)

func main() {
	var err0 error
	var i int
	{
		i, err0 = strconv.Atoi("1")
		if err0 != nil {
			panic(err0)
		}
		for ; i < 3; i++ {
			println(i)
		}
	}
	{
		err0 = os.Remove("lock")
		if err0 != nil {
			panic(err0)
		}
		for {
			break
		}
	}
}
"#
    );
    assert_eq!(report.guards, 2);
}

#[test]
fn loop_post_statements_fail_the_unit() {
    let source = r#"package main

import "os"

func main() {
	for i := 0; i < 3; os.Remove("x") {
		i++
	}
}
"#;
    let mut fset = FileSet::new();
    let mut files = parse(&mut fset, source);
    let err = transform(&mut files, &mut fset, &mut StdImporter::new()).unwrap_err();
    assert!(
        err.to_string()
            .contains("cannot check discarded error in for loop post statement: os.Remove(\"x\")"),
        "{}",
        err
    );
}

#[test]
fn loop_headers_fail_the_unit() {
    let source = r#"package main

import "os"

func main() {
	os.Remove("first")
}

func loop() {
	for f, _ := os.Open("x"); f != nil; {
		break
	}
}
"#;
    let mut fset = FileSet::new();
    let mut files = parse(&mut fset, source);
    let before = files.clone();
    let err = transform(&mut files, &mut fset, &mut StdImporter::new()).unwrap_err();

    let Error::Transformation(err) = err else {
        panic!("expected a transformation error, got {err}");
    };
    assert_eq!(err.unit, "loop");
    assert_eq!(err.diagnostics.len(), 1);
    assert!(
        err.to_string().starts_with(
            "transformation of function \"loop\" failed:\n\
             cannot check discarded error in for loop initializer"
        ),
        "{}",
        err
    );
    // `main` was rewritten before the failure, `loop` is left untouched.
    assert_ne!(files[0].decls[1], before[0].decls[1]);
    assert_eq!(files[0].decls[2], before[0].decls[2]);
}

#[test]
fn type_errors_abort_before_rewriting() {
    let mut fset = FileSet::new();
    let mut files = parse(&mut fset, "package main\n\nfunc main() {\n\tmissing()\n}\n");
    let before = files.clone();
    let err = transform(&mut files, &mut fset, &mut StdImporter::new()).unwrap_err();
    assert!(matches!(err, Error::TypeCheck(_)));
    assert_eq!(err.to_string(), "main.go:4:2: undefined: missing");
    assert_eq!(files, before);
}

#[test]
fn user_error_type_is_not_the_builtin() {
    let source = r#"package main

type error interface {
	Error() string
}

func fail() error {
	return nil
}

func main() {
	fail()
}
"#;
    let mut fset = FileSet::new();
    let mut files = parse(&mut fset, source);
    let before = files.clone();
    let report = transform(&mut files, &mut fset, &mut StdImporter::new()).expect("transform");
    assert_eq!(files, before);
    assert_eq!(report.rewritten_units, 0);
}
