use gs_core::ast::{Decl, Expr, File, FuncDecl, Stmt};
use gs_core::error::TypeCheckError;
use gs_core::span::FileSet;
use gs_golang::GoParser;
use pretty_assertions::assert_eq;

use crate::{check, ScopeKind, StdImporter, TypeDescriptor, TypeInfo};

fn check_source(source: &str) -> Result<(Vec<File>, TypeInfo), TypeCheckError> {
    let mut fset = FileSet::new();
    let file = GoParser::default()
        .parse_file(&mut fset, "main.go", source)
        .expect("parse");
    let files = vec![file];
    let info = check(&mut fset, &files, &mut StdImporter::new())?;
    Ok((files, info))
}

fn check_err(source: &str) -> String {
    check_source(source).expect_err("expected a type error").to_string()
}

fn func<'a>(files: &'a [File], name: &str) -> &'a FuncDecl {
    files[0]
        .decls
        .iter()
        .find_map(|decl| match decl {
            Decl::Func(func) if func.name.name == name => Some(func),
            _ => None,
        })
        .expect("function")
}

fn body<'a>(files: &'a [File], name: &str) -> &'a [Stmt] {
    &func(files, name).body.as_ref().expect("body").stmts
}

/// First right-hand side of an assignment, or the expression of an
/// expression statement.
fn rhs(stmt: &Stmt) -> &Expr {
    match stmt {
        Stmt::Assign(assign) => &assign.rhs[0],
        Stmt::Expr(stmt) => &stmt.x,
        other => panic!("unexpected statement {:?}", other),
    }
}

fn desc<'a>(info: &'a TypeInfo, expr: &Expr) -> &'a TypeDescriptor {
    info.type_of(expr.id).expect("expression type recorded")
}

#[test]
fn multi_value_calls_record_tuples() {
    let (files, info) = check_source(
        r#"package main

func pair() (int, error) {
	return 0, nil
}

func main() {
	_, _ = pair()
	pair()
}
"#,
    )
    .unwrap();
    let stmts = body(&files, "main");
    let assigned = desc(&info, rhs(&stmts[0]));
    assert_eq!(assigned.to_string(), "(int, error)");
    assert!(!assigned.components()[0].is_error());
    assert!(assigned.components()[1].is_error());
    assert_eq!(desc(&info, rhs(&stmts[1])).len(), 2);
}

#[test]
fn library_calls_are_typed_through_stubs() {
    let (files, info) = check_source(
        r#"package main

import (
	"fmt"
	"os"
)

func main() {
	os.Remove("x")
	fmt.Println("hi")
	f, _ := os.Open("x")
	f.Close()
}
"#,
    )
    .unwrap();
    let stmts = body(&files, "main");
    let remove = desc(&info, rhs(&stmts[0]));
    assert!(remove.single().is_some_and(|ty| ty.is_error()));
    assert_eq!(desc(&info, rhs(&stmts[1])).to_string(), "(int, error)");
    assert_eq!(desc(&info, rhs(&stmts[2])).to_string(), "(*os.File, error)");
    assert!(desc(&info, rhs(&stmts[3])).has_error());
}

#[test]
fn user_type_named_error_is_not_the_error_type() {
    let (files, info) = check_source(
        r#"package main

type error interface {
	Error() string
}

func fail() error {
	return nil
}

func main() {
	_ = fail()
}
"#,
    )
    .unwrap();
    let stmts = body(&files, "main");
    let ty = desc(&info, rhs(&stmts[0]));
    assert_eq!(ty.to_string(), "main.error");
    assert!(!ty.has_error());
}

#[test]
fn comma_ok_forms_record_a_bool_pair() {
    let (files, info) = check_source(
        r#"package main

func main() {
	m := map[string]int{"a": 1}
	v, ok := m["a"]
	var x any = v
	s, ok := x.(string)
	_, _ = s, ok
}
"#,
    )
    .unwrap();
    let stmts = body(&files, "main");
    assert_eq!(desc(&info, rhs(&stmts[1])).to_string(), "(int, bool)");
    assert_eq!(desc(&info, rhs(&stmts[3])).to_string(), "(string, bool)");
}

#[test]
fn function_scopes_cover_nested_blocks() {
    let (files, info) = check_source(
        r#"package main

func main() {
	err := 1
	if v := err; v > 0 {
		inner := v
		_ = inner
	}
	f := func() {
		hidden := 2
		_ = hidden
	}
	f()
}
"#,
    )
    .unwrap();
    let main = func(&files, "main");
    let scope = info.scope_of(main.ty.id).expect("function scope");
    let tree = &info.scope_tree;
    assert_eq!(tree.scope(scope).kind, ScopeKind::Function);
    assert!(tree.lookup(scope, "err").is_some());
    assert_eq!(info.scope_of(main.body.as_ref().unwrap().id), Some(scope));

    let declared: Vec<&str> = tree
        .descendants(scope)
        .into_iter()
        .flat_map(|id| tree.scope(id).names())
        .collect();
    assert!(declared.contains(&"v"));
    assert!(declared.contains(&"inner"));
    assert!(declared.contains(&"hidden"));
    assert!(tree.lookup_parent(scope, "err0").is_none());
}

#[test]
fn package_declarations_resolve_in_any_order() {
    let (files, info) = check_source(
        r#"package main

func main() {
	_ = xs
	_ = first()
}

func first() Node {
	return Node{next: nil}
}

var xs [C + 1]int

type Node struct {
	next *Node
}

const (
	A = iota
	B
	C
)
"#,
    )
    .unwrap();
    let stmts = body(&files, "main");
    assert_eq!(desc(&info, rhs(&stmts[0])).to_string(), "[3]int");
    assert_eq!(desc(&info, rhs(&stmts[1])).to_string(), "main.Node");
}

#[test]
fn methods_and_interfaces() {
    let info = check_source(
        r#"package main

type MyErr struct {
	msg string
}

func (e *MyErr) Error() string {
	return e.msg
}

var _ error = &MyErr{msg: "x"}

func main() {
	var err error = &MyErr{}
	if err != nil {
		println(err.Error())
	}
}
"#,
    );
    assert!(info.is_ok());

    let err = check_err(
        r#"package main

type MyErr struct{}

func (e *MyErr) Error() string {
	return ""
}

var _ error = MyErr{}
"#,
    );
    assert!(
        err.ends_with(
            "cannot use MyErr{} (value of type main.MyErr) as error value in variable declaration"
        ),
        "{}",
        err
    );
}

#[test]
fn undefined_identifiers_carry_a_position() {
    let err = check_err("package main\n\nfunc main() {\n\ty()\n}\n");
    assert_eq!(err, "main.go:4:2: undefined: y");
}

#[test]
fn assignment_arity_is_checked() {
    let err = check_err(
        r#"package main

func one() int {
	return 1
}

func main() {
	a, b := one()
	_, _ = a, b
}
"#,
    );
    assert!(err.ends_with("assignment mismatch: 2 variables but one() returns 1 value"), "{}", err);
}

#[test]
fn call_arity_is_checked() {
    let err = check_err(
        r#"package main

func two(a, b int) {}

func main() {
	two(1)
}
"#,
    );
    assert!(err.contains("not enough arguments in call to two"), "{}", err);
}

#[test]
fn short_declarations_need_a_new_name() {
    let err = check_err(
        r#"package main

func main() {
	x := 1
	x := 2
	_ = x
}
"#,
    );
    assert!(err.ends_with("no new variables on left side of :="), "{}", err);
}

#[test]
fn unused_expression_statements_are_rejected() {
    let err = check_err(
        r#"package main

func main() {
	x := 1
	x
}
"#,
    );
    assert!(err.ends_with("x (variable of type int) is not used"), "{}", err);
}

#[test]
fn multi_value_in_single_value_context() {
    let err = check_err(
        r#"package main

func pair() (int, error) {
	return 0, nil
}

func main() {
	x := pair() + 1
	_ = x
}
"#,
    );
    assert!(
        err.ends_with("multiple-value pair() (value of type (int, error)) in single-value context"),
        "{}",
        err
    );
}

#[test]
fn mismatched_operands_are_rejected() {
    let err = check_err(
        r#"package main

func main() {
	a := 1
	b := "s"
	_ = a + b
}
"#,
    );
    assert!(err.ends_with("invalid operation: a + b (mismatched types int and string)"), "{}", err);
}

#[test]
fn return_counts_are_checked() {
    let err = check_err(
        r#"package main

func f() (int, error) {
	return 1
}
"#,
    );
    assert!(err.contains("not enough return values"), "{}", err);
}

#[test]
fn unknown_imports_fail() {
    let err = check_err("package main\n\nimport \"net/http\"\n\nfunc main() {}\n");
    assert!(err.contains("could not import net/http (package not found)"), "{}", err);
}

#[test]
fn recursive_types_need_indirection() {
    let err = check_err("package main\n\ntype T T\n");
    assert!(err.ends_with("invalid recursive type T"), "{}", err);
}

#[test]
fn files_must_share_a_package() {
    let mut fset = FileSet::new();
    let mut parser = GoParser::default();
    let a = parser.parse_file(&mut fset, "a.go", "package main\n").unwrap();
    let b = parser.parse_file(&mut fset, "b.go", "package util\n").unwrap();
    let err = check(&mut fset, &[a, b], &mut StdImporter::new()).unwrap_err();
    assert!(err.message.contains("package util; expected package main"));
}

#[test]
fn buffered_and_string_types_satisfy_io_interfaces() {
    check_source(
        r#"package main

import (
	"bufio"
	"bytes"
	"fmt"
	"io"
	"os"
	"strings"
)

func main() {
	w := bufio.NewWriter(os.Stdout)
	fmt.Fprintln(w, "hello")
	w.Flush()

	var sb strings.Builder
	fmt.Fprintf(&sb, "%d", 1)
	var buf bytes.Buffer
	fmt.Fprint(&buf, sb.String())

	data, err := io.ReadAll(bufio.NewReader(os.Stdin))
	if err != nil {
		panic(err)
	}
	io.Copy(&buf, strings.NewReader(string(data)))
	io.Copy(os.Stdout, bytes.NewReader(buf.Bytes()))

	var writers []io.Writer = []io.Writer{w, &sb, &buf, os.Stderr, io.Discard}
	var readers []io.Reader = []io.Reader{bufio.NewReader(os.Stdin), &buf, os.Stdin}
	var scanner io.RuneScanner = strings.NewReader("x")
	var seeker io.ReadSeeker = bytes.NewReader(nil)
	var closer io.ReadWriteCloser = os.Stdout
	var pair io.ReadWriter = bufio.NewReadWriter(bufio.NewReader(os.Stdin), w)
	fmt.Println(len(writers), len(readers), scanner, seeker, closer, pair)
}
"#,
    )
    .unwrap();
}

#[test]
fn builder_values_do_not_implement_writer() {
    let err = check_err(
        r#"package main

import (
	"fmt"
	"strings"
)

func main() {
	var sb strings.Builder
	fmt.Fprintf(sb, "x")
}
"#,
    );
    assert!(err.contains("io.Writer"), "{}", err);
}

#[test]
fn os_file_system_api() {
    let (files, info) = check_source(
        r#"package main

import (
	"fmt"
	"os"
)

func main() {
	info, err := os.Stat("go.mod")
	if err != nil && os.IsNotExist(err) {
		return
	}
	fmt.Println(info.Name(), info.Size(), info.IsDir(), info.Mode().Perm())
	entries, _ := os.ReadDir(".")
	for _, entry := range entries {
		fmt.Println(entry.Name(), entry.IsDir())
	}
	os.Rename("a", "b")
	os.RemoveAll("tmp")
	f, _ := os.OpenFile("log", os.O_APPEND|os.O_CREATE|os.O_WRONLY, 0644)
	f.Seek(0, 0)
	fmt.Println(os.Getpid(), os.ModePerm)
}
"#,
    )
    .unwrap();
    let stmts = body(&files, "main");
    assert_eq!(desc(&info, rhs(&stmts[0])).to_string(), "(fs.FileInfo, error)");
    assert!(desc(&info, rhs(&stmts[5])).has_error());
    assert!(desc(&info, rhs(&stmts[6])).has_error());
}

#[test]
fn strings_and_strconv_helpers() {
    let (files, info) = check_source(
        r#"package main

import (
	"fmt"
	"strconv"
	"strings"
)

func main() {
	key, value, ok := strings.Cut("a=b", "=")
	parts := strings.SplitN(key, ",", 2)
	same := strings.EqualFold(value, "B")
	n, err := strconv.ParseUint("7", 10, 64)
	fmt.Println(ok, parts, same, n, err, strconv.FormatFloat(1.5, 'f', -1, 64))
	r := strings.NewReplacer("a", "b")
	fmt.Println(r.Replace(key))
}
"#,
    )
    .unwrap();
    let stmts = body(&files, "main");
    assert_eq!(desc(&info, rhs(&stmts[0])).to_string(), "(string, string, bool)");
    assert_eq!(desc(&info, rhs(&stmts[3])).to_string(), "(uint64, error)");
}

#[test]
fn log_package() {
    check_source(
        r#"package main

import (
	"log"
	"os"
)

func main() {
	log.SetFlags(log.LstdFlags | log.Lshortfile)
	logger := log.New(os.Stderr, "app: ", log.Lmsgprefix)
	logger.Printf("started %d", 1)
	if len(os.Args) > 3 {
		log.Fatal("too many arguments")
	}
	log.Printf("args %v", os.Args)
}
"#,
    )
    .unwrap();
}

#[test]
fn sort_package() {
    check_source(
        r#"package main

import (
	"fmt"
	"sort"
)

type byLen []string

func (s byLen) Len() int           { return len(s) }
func (s byLen) Less(i, j int) bool { return len(s[i]) < len(s[j]) }
func (s byLen) Swap(i, j int)      { s[i], s[j] = s[j], s[i] }

func main() {
	xs := []int{3, 1, 2}
	sort.Ints(xs)
	names := []string{"bb", "a"}
	sort.Strings(names)
	sort.Slice(names, func(i, j int) bool { return names[i] < names[j] })
	sort.Sort(sort.Reverse(byLen(names)))
	fmt.Println(sort.SearchInts(xs, 2), sort.IsSorted(sort.IntSlice(xs)))
}
"#,
    )
    .unwrap();
}

#[test]
fn math_package() {
    let (files, info) = check_source(
        r#"package main

import (
	"fmt"
	"math"
)

func main() {
	hyp := math.Sqrt(math.Pow(3, 2) + 16)
	limit := math.MaxInt64
	fmt.Println(hyp, limit, math.Floor(math.Pi), math.Inf(1), math.IsNaN(math.NaN()))
}
"#,
    )
    .unwrap();
    let stmts = body(&files, "main");
    assert_eq!(desc(&info, rhs(&stmts[0])).to_string(), "float64");
}

#[test]
fn sync_package() {
    check_source(
        r#"package main

import (
	"fmt"
	"sync"
)

type counter struct {
	mu sync.Mutex
	n  int
}

func main() {
	var wg sync.WaitGroup
	c := &counter{}
	for i := 0; i < 4; i++ {
		wg.Add(1)
		go func() {
			defer wg.Done()
			c.mu.Lock()
			c.n++
			c.mu.Unlock()
		}()
	}
	wg.Wait()
	var once sync.Once
	once.Do(func() { fmt.Println(c.n) })
	var l sync.Locker = &c.mu
	l.Lock()
}
"#,
    )
    .unwrap();
}

#[test]
fn bytes_package() {
    check_source(
        r#"package main

import (
	"bytes"
	"io"
	"os"
)

func main() {
	buf := bytes.NewBufferString("hello ")
	buf.WriteString("world")
	var r io.Reader = buf
	var w io.Writer = buf
	io.Copy(w, r)
	if bytes.HasPrefix(buf.Bytes(), []byte("he")) {
		buf.WriteTo(os.Stdout)
	}
}
"#,
    )
    .unwrap();
}

#[test]
fn filepath_package() {
    let (files, info) = check_source(
        r#"package main

import (
	"fmt"
	"io/fs"
	"os"
	"path/filepath"
)

func main() {
	matches, _ := filepath.Glob(filepath.Join("src", "*.go"))
	filepath.Walk(".", func(path string, info os.FileInfo, err error) error {
		if info.IsDir() && filepath.Base(path) == ".git" {
			return filepath.SkipDir
		}
		return err
	})
	filepath.WalkDir(".", func(path string, d fs.DirEntry, err error) error {
		return err
	})
	fmt.Println(matches, filepath.Ext("a.go"), string(filepath.Separator))
}
"#,
    )
    .unwrap();
    let stmts = body(&files, "main");
    assert_eq!(desc(&info, rhs(&stmts[0])).to_string(), "([]string, error)");
    assert!(desc(&info, rhs(&stmts[1])).has_error());
}

#[test]
fn exec_package() {
    check_source(
        r#"package main

import (
	"errors"
	"fmt"
	"os"
	"os/exec"
)

func main() {
	cmd := exec.Command("go", "version")
	cmd.Stdout = os.Stdout
	cmd.Stderr = os.Stderr
	err := cmd.Run()
	var exitErr *exec.ExitError
	if errors.As(err, &exitErr) {
		os.Exit(exitErr.ExitCode())
	}
	out, _ := exec.Command("ls").Output()
	fmt.Println(string(out))
}
"#,
    )
    .unwrap();
}

#[test]
fn ioutil_package() {
    check_source(
        r#"package main

import (
	"fmt"
	"io/ioutil"
	"os"
)

func main() {
	data, _ := ioutil.ReadAll(os.Stdin)
	ioutil.WriteFile("out.txt", data, 0644)
	infos, _ := ioutil.ReadDir(".")
	for _, info := range infos {
		fmt.Println(info.Name())
	}
}
"#,
    )
    .unwrap();
}
