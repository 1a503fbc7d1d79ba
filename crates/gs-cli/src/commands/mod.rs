//! Command implementations for the goscript CLI

pub mod rewrite;
pub mod run;

pub use rewrite::rewrite_command;
pub use run::run_command;

use crate::diagnostics::from_core;
use crate::{CliError, Result};
use gs_core::ast::{AstSerializer, File};
use gs_core::frontend::LanguageFrontend;
use gs_core::span::FileSet;
use gs_golang::GoFrontend;
use gs_transform::{transform, TransformReport};
use gs_typing::StdImporter;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// One package worth of rewritten files.
pub struct RewrittenPackage {
    pub fset: FileSet,
    pub files: Vec<File>,
    pub report: TransformReport,
    /// Printer of the frontend that parsed `files`.
    pub serializer: Arc<dyn AstSerializer>,
}

/// Check that `files` is a non-empty list of `.go` files in one directory.
pub fn validate_sources(files: &[PathBuf]) -> Result<()> {
    let Some(first) = files.first() else {
        return Err(CliError::InvalidArgs(".go files not specified".to_string()));
    };
    if let Some(file) = files.iter().find(|file| !is_go_file(file)) {
        return Err(CliError::InvalidArgs(format!(
            "{} is not a .go file",
            file.display()
        )));
    }
    let dir = parent_dir(first);
    if files.iter().any(|file| parent_dir(file) != dir) {
        return Err(CliError::InvalidArgs(
            "files belong to different directories".to_string(),
        ));
    }
    Ok(())
}

pub(crate) fn is_go_file(path: &Path) -> bool {
    let extensions = GoFrontend::new().extensions();
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.contains(&ext))
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

/// Parse and rewrite the given sources as one package.
pub fn rewrite_package(paths: &[PathBuf]) -> Result<RewrittenPackage> {
    validate_sources(paths)?;

    let frontend = GoFrontend::new();
    let mut fset = FileSet::new();
    let mut files = Vec::with_capacity(paths.len());
    let mut serializer = None;
    for path in paths {
        debug!(path = %path.display(), language = frontend.language(), "parsing");
        let source = std::fs::read_to_string(path)?;
        let parsed = frontend
            .parse(&mut fset, &source, path)
            .map_err(|err| from_core(err, &fset))?;
        serializer.get_or_insert(parsed.serializer);
        files.push(parsed.file);
    }
    let serializer = serializer
        .ok_or_else(|| CliError::InvalidArgs(".go files not specified".to_string()))?;

    let report = match transform(&mut files, &mut fset, &mut StdImporter::new()) {
        Ok(report) => report,
        Err(err) => return Err(from_core(err, &fset)),
    };
    info!(
        package = %report.package,
        rewritten = report.rewritten_units,
        guards = report.guards,
        "package rewritten"
    );
    Ok(RewrittenPackage {
        fset,
        files,
        report,
        serializer,
    })
}

/// File name the rewritten source is written under.
pub(crate) fn output_name(file: &File) -> Result<&std::ffi::OsStr> {
    file.path.file_name().ok_or_else(|| {
        CliError::InvalidArgs(format!("{} has no file name", file.path.display()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(names: &[&str]) -> Vec<PathBuf> {
        names.iter().map(PathBuf::from).collect()
    }

    #[test]
    fn sources_must_share_a_directory() {
        assert!(validate_sources(&paths(&["main.go", "./util.go"])).is_ok());
        assert!(validate_sources(&paths(&["cmd/main.go", "cmd/util.go"])).is_ok());
        assert!(validate_sources(&paths(&["main.go", "util.go"])).is_ok());

        let err = validate_sources(&paths(&["a/main.go", "b/util.go"])).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid arguments: files belong to different directories"
        );
    }

    #[test]
    fn packages_go_through_the_go_frontend() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("main.go");
        std::fs::write(
            &path,
            "package main\n\nimport \"os\"\n\nfunc main() {\n\tos.Remove(\"x\")\n}\n",
        )
        .unwrap();

        let package = rewrite_package(&[path]).unwrap();
        assert_eq!(package.report.guards, 1);
        let output = package.serializer.serialize_file(&package.files[0]).unwrap();
        assert!(output.contains("\terr0 = os.Remove(\"x\")\n"), "{}", output);
    }

    #[test]
    fn go_files_are_recognized_by_extension() {
        assert!(is_go_file(Path::new("cmd/main.go")));
        assert!(!is_go_file(Path::new("main.rs")));
        assert!(!is_go_file(Path::new("go")));
    }

    #[test]
    fn empty_source_list_is_rejected() {
        let err = validate_sources(&[]).unwrap_err();
        assert_eq!(err.to_string(), "Invalid arguments: .go files not specified");
    }
}
