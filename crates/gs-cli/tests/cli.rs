//! Integration tests for the goscript CLI

use assert_cmd::Command;
use predicates::prelude::*;
use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const REMOVE_TWICE: &str = r#"package main

import "os"

func main() {
	os.Remove("a")
	os.Remove("b")
}
"#;

const REMOVE_TWICE_REWRITTEN: &str = r#"package main

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
"#;

fn goscript() -> Command {
    Command::cargo_bin("goscript").unwrap()
}

fn write(dir: &Path, name: &str, source: &str) {
    fs::write(dir.join(name), source).unwrap();
}

fn go_available() -> bool {
    std::process::Command::new("go")
        .arg("version")
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

#[test]
fn test_cli_help() {
    goscript()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("goscript"));
}

#[test]
fn test_cli_version() {
    goscript()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_rewrite_prints_guarded_source() {
    let temp_dir = TempDir::new().unwrap();
    write(temp_dir.path(), "main.go", REMOVE_TWICE);

    let output = goscript()
        .current_dir(temp_dir.path())
        .args(["rewrite", "main.go"])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert_eq!(String::from_utf8(output.stdout).unwrap(), REMOVE_TWICE_REWRITTEN);
}

#[test]
fn test_rewrite_to_output_dir_with_report() {
    let temp_dir = TempDir::new().unwrap();
    write(temp_dir.path(), "main.go", REMOVE_TWICE);
    let out = temp_dir.path().join("out");
    let report = temp_dir.path().join("report.json");

    goscript()
        .arg("-C")
        .arg(temp_dir.path())
        .args(["rewrite", "main.go", "--output-dir"])
        .arg(&out)
        .arg("--report")
        .arg(&report)
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    assert_eq!(
        fs::read_to_string(out.join("main.go")).unwrap(),
        REMOVE_TWICE_REWRITTEN
    );
    let report: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(report).unwrap()).unwrap();
    assert_eq!(report["package"], "main");
    assert_eq!(report["variables"], 1);
    assert_eq!(report["guards"], 2);
}

#[test]
fn test_files_in_different_directories_are_rejected() {
    let temp_dir = TempDir::new().unwrap();
    for dir in ["a", "b"] {
        fs::create_dir(temp_dir.path().join(dir)).unwrap();
        write(&temp_dir.path().join(dir), "main.go", REMOVE_TWICE);
    }

    goscript()
        .current_dir(temp_dir.path())
        .args(["run", "a/main.go", "b/main.go"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains(
            "files belong to different directories",
        ));
}

#[test]
fn test_run_requires_go_files() {
    goscript()
        .args(["run", "notes.txt"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains(".go files not specified"));
}

#[test]
fn test_type_errors_are_reported_with_source() {
    let temp_dir = TempDir::new().unwrap();
    write(
        temp_dir.path(),
        "main.go",
        "package main\n\nfunc main() {\n\tmissing()\n}\n",
    );

    goscript()
        .current_dir(temp_dir.path())
        .args(["rewrite", "main.go"])
        .assert()
        .code(2)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("undefined: missing"));
}

#[test]
fn test_loop_header_discards_fail_the_rewrite() {
    let temp_dir = TempDir::new().unwrap();
    write(
        temp_dir.path(),
        "main.go",
        r#"package main

import "os"

func main() {
	for i := 0; i < 3; os.Remove("x") {
		i++
	}
}
"#,
    );

    goscript()
        .current_dir(temp_dir.path())
        .args(["rewrite", "main.go"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("transformation of function \"main\" failed"))
        .stderr(predicate::str::contains(
            "cannot check discarded error in for loop post statement",
        ));
}

#[test]
fn test_configured_toolchain_is_used() {
    let temp_dir = TempDir::new().unwrap();
    write(temp_dir.path(), "main.go", REMOVE_TWICE);
    write(
        temp_dir.path(),
        "goscript.toml",
        "[toolchain]\ngo = \"/nonexistent/bin/go\"\n",
    );

    goscript()
        .current_dir(temp_dir.path())
        .args(["run", "main.go"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("/nonexistent/bin/go"));
}

#[test]
fn test_run_mirrors_exit_code() {
    if !go_available() {
        eprintln!("skipping: go toolchain not found");
        return;
    }
    let temp_dir = TempDir::new().unwrap();
    write(
        temp_dir.path(),
        "main.go",
        r#"package main

import (
	"fmt"
	"os"
)

func main() {
	fmt.Println(os.Args[1])
	os.Exit(3)
}
"#,
    );

    goscript()
        .current_dir(temp_dir.path())
        .args(["run", "main.go", "--", "hello"])
        .assert()
        .code(3)
        .stdout(predicate::str::contains("hello"));
}

#[test]
fn test_run_panics_on_discarded_error() {
    if !go_available() {
        eprintln!("skipping: go toolchain not found");
        return;
    }
    let temp_dir = TempDir::new().unwrap();
    write(
        temp_dir.path(),
        "main.go",
        r#"package main

import "os"

func main() {
	os.Remove("does-not-exist")
}
"#,
    );

    goscript()
        .current_dir(temp_dir.path())
        .args(["run", "main.go"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("panic"));
}
