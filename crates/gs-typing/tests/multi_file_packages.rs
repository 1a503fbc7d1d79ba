use gs_core::ast::{Decl, File, Stmt};
use gs_core::span::FileSet;
use gs_golang::GoParser;
use gs_typing::{check, ScopeKind, StdImporter};

fn parse_all(fset: &mut FileSet, sources: &[(&str, &str)]) -> Vec<File> {
    let mut parser = GoParser::default();
    sources
        .iter()
        .map(|(path, source)| parser.parse_file(fset, *path, source).expect("parse"))
        .collect()
}

#[test]
fn declarations_are_shared_across_files() {
    let mut fset = FileSet::new();
    let files = parse_all(
        &mut fset,
        &[
            (
                "main.go",
                "package main\n\nfunc main() {\n\tsave(\"out.txt\")\n}\n",
            ),
            (
                "save.go",
                "package main\n\nimport \"os\"\n\n\
                 func save(name string) error {\n\treturn os.WriteFile(name, nil, 0644)\n}\n",
            ),
        ],
    );
    let info = check(&mut fset, &files, &mut StdImporter::new()).expect("check");

    let Decl::Func(main) = &files[0].decls[0] else {
        panic!("expected main");
    };
    let Stmt::Expr(call) = &main.body.as_ref().unwrap().stmts[0] else {
        panic!("expected expression statement");
    };
    let ty = info.type_of(call.x.id).expect("call type");
    assert!(ty.single().is_some_and(|ty| ty.is_error()));
    assert_eq!(info.package.name, "main");
    assert_eq!(
        info.scope_tree.scope(info.package.scope).kind,
        ScopeKind::Package
    );
}

#[test]
fn imports_are_file_scoped() {
    let mut fset = FileSet::new();
    let files = parse_all(
        &mut fset,
        &[
            ("a.go", "package main\n\nimport \"os\"\n\nvar _ = os.Args\n"),
            ("b.go", "package main\n\nfunc main() {\n\t_ = os.Args\n}\n"),
        ],
    );
    let err = check(&mut fset, &files, &mut StdImporter::new()).unwrap_err();
    assert_eq!(err.to_string(), "b.go:4:6: undefined: os");
}

#[test]
fn registered_packages_can_be_imported_under_an_alias() {
    let mut fset = FileSet::new();
    let files = parse_all(
        &mut fset,
        &[(
            "main.go",
            "package main\n\nimport store \"example.com/kv\"\n\n\
             func main() {\n\tdb := store.Open()\n\tdb.Put(\"k\", \"v\")\n}\n",
        )],
    );
    let mut importer = StdImporter::new().with_package(
        "example.com/kv",
        vec![(
            "kv.go".to_string(),
            "package kv\n\ntype DB struct{}\n\nfunc Open() *DB\n\n\
             func (db *DB) Put(key, value string) error\n"
                .to_string(),
        )],
    );
    let info = check(&mut fset, &files, &mut importer).expect("check");

    let Decl::Func(main) = &files[0].decls[1] else {
        panic!("expected main");
    };
    let Stmt::Expr(put) = &main.body.as_ref().unwrap().stmts[1] else {
        panic!("expected expression statement");
    };
    assert_eq!(info.type_of(put.x.id).unwrap().to_string(), "error");
}
