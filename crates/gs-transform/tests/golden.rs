use std::fs;
use std::path::{Path, PathBuf};

use gs_core::ast::AstSerializer;
use gs_core::span::FileSet;
use gs_golang::{GoParser, GoSerializer};
use gs_transform::transform;
use gs_typing::StdImporter;
use pretty_assertions::assert_eq;

const IN_SUFFIX: &str = ".in.go";
const OUT_SUFFIX: &str = ".out.go";

fn testdata() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("testdata")
}

fn rewrite(source: &str) -> String {
    let mut fset = FileSet::new();
    let file = GoParser::default()
        .parse_file(&mut fset, "test.go", source)
        .expect("parse");
    let mut files = vec![file];
    transform(&mut files, &mut fset, &mut StdImporter::new()).expect("transform");
    GoSerializer::new().serialize_file(&files[0]).expect("serialize")
}

#[test]
fn rewritten_sources_match_golden_files() {
    let mut inputs: Vec<PathBuf> = fs::read_dir(testdata())
        .expect("testdata directory")
        .map(|entry| entry.expect("entry").path())
        .filter(|path| path.to_string_lossy().ends_with(IN_SUFFIX))
        .collect();
    inputs.sort();
    assert!(!inputs.is_empty());

    for input in inputs {
        let name = input.to_string_lossy();
        let expected_path = format!("{}{}", name.trim_end_matches(IN_SUFFIX), OUT_SUFFIX);
        let source = fs::read_to_string(&input).expect("read input");
        let expected = fs::read_to_string(&expected_path).expect("read expected output");
        assert_eq!(rewrite(&source), expected, "{} failed", name);
    }
}

#[test]
fn rewriting_is_stable_on_its_own_output() {
    let expected = fs::read_to_string(testdata().join("copy_file.out.go")).unwrap();
    assert_eq!(rewrite(&expected), expected);
}
