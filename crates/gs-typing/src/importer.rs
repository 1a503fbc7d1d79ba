//! Package sources for import declarations.
//!
//! The standard library is served from embedded stub files holding bodyless
//! declarations of the commonly used API surface.

use std::collections::HashMap;

use gs_core::ast::File;
use gs_core::error::{Error, TypeCheckError};
use gs_core::span::FileSet;
use gs_golang::GoParser;
use tracing::debug;

/// Supplies the parsed files of an imported package.
pub trait Importer {
    fn import(&mut self, path: &str, fset: &mut FileSet) -> Result<Vec<File>, TypeCheckError>;
}

const STD_STUBS: &[(&str, &str)] = &[
    ("bufio", include_str!("../stubs/bufio.go")),
    ("bytes", include_str!("../stubs/bytes.go")),
    ("errors", include_str!("../stubs/errors.go")),
    ("flag", include_str!("../stubs/flag.go")),
    ("fmt", include_str!("../stubs/fmt.go")),
    ("io", include_str!("../stubs/io.go")),
    ("io/fs", include_str!("../stubs/io/fs.go")),
    ("io/ioutil", include_str!("../stubs/io/ioutil/ioutil.go")),
    ("log", include_str!("../stubs/log.go")),
    ("math", include_str!("../stubs/math.go")),
    ("os", include_str!("../stubs/os.go")),
    ("os/exec", include_str!("../stubs/os/exec/exec.go")),
    ("path/filepath", include_str!("../stubs/path/filepath/filepath.go")),
    ("sort", include_str!("../stubs/sort.go")),
    ("strconv", include_str!("../stubs/strconv.go")),
    ("strings", include_str!("../stubs/strings.go")),
    ("sync", include_str!("../stubs/sync.go")),
    ("time", include_str!("../stubs/time.go")),
    ("unicode", include_str!("../stubs/unicode.go")),
];

/// Serves the embedded standard library stubs plus any registered packages.
#[derive(Debug, Default, Clone)]
pub struct StdImporter {
    extra: HashMap<String, Vec<(String, String)>>,
}

impl StdImporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `path` importable from the given `(file name, source)` pairs.
    pub fn with_package(
        mut self,
        path: impl Into<String>,
        sources: impl IntoIterator<Item = (String, String)>,
    ) -> Self {
        self.extra.insert(path.into(), sources.into_iter().collect());
        self
    }

    pub fn std_packages() -> impl Iterator<Item = &'static str> {
        STD_STUBS.iter().map(|(path, _)| *path)
    }

    fn sources(&self, path: &str) -> Option<Vec<(String, String)>> {
        if let Some(sources) = self.extra.get(path) {
            return Some(sources.clone());
        }
        STD_STUBS
            .iter()
            .find(|(stub, _)| *stub == path)
            .map(|(stub, source)| {
                let name = format!("$GOROOT/src/{stub}/{}.go", last_segment(stub));
                vec![(name, source.to_string())]
            })
    }
}

/// Package name implied by an import path: `path/filepath` is `filepath`.
pub fn last_segment(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

impl Importer for StdImporter {
    fn import(&mut self, path: &str, fset: &mut FileSet) -> Result<Vec<File>, TypeCheckError> {
        let sources = self.sources(path).ok_or_else(|| {
            TypeCheckError::new(format!("could not import {path} (package not found)"))
        })?;
        let mut parser = GoParser::new()
            .map_err(|err| TypeCheckError::new(format!("could not import {path} ({err})")))?;

        let mut files = Vec::new();
        for (name, source) in sources {
            let file = parser.parse_file(fset, name, &source).map_err(|err| match err {
                Error::TypeCheck(err) => err,
                other => TypeCheckError::new(format!("could not import {path} ({other})")),
            })?;
            files.push(file);
        }
        debug!(path, files = files.len(), "imported package");
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_std_stub_parses() {
        let mut importer = StdImporter::new();
        let mut fset = FileSet::new();
        for path in StdImporter::std_packages() {
            let files = importer.import(path, &mut fset).unwrap();
            assert_eq!(files[0].package.name, last_segment(path));
        }
    }

    #[test]
    fn every_std_stub_type_checks() {
        let mut parser = GoParser::new().unwrap();
        for (path, source) in STD_STUBS {
            let mut fset = FileSet::new();
            let file = parser
                .parse_file(&mut fset, format!("{path}.go"), source)
                .unwrap();
            crate::check(&mut fset, &[file], &mut StdImporter::new())
                .unwrap_or_else(|err| panic!("{path}: {err}"));
        }
    }

    #[test]
    fn nested_stubs_are_named_after_their_last_segment() {
        let importer = StdImporter::new();
        let sources = importer.sources("path/filepath").unwrap();
        assert_eq!(sources[0].0, "$GOROOT/src/path/filepath/filepath.go");
        assert_eq!(last_segment("os"), "os");
    }

    #[test]
    fn unknown_packages_fail() {
        let mut importer = StdImporter::new();
        let err = importer.import("net/http", &mut FileSet::new()).unwrap_err();
        assert!(err.message.starts_with("could not import net/http"));
    }

    #[test]
    fn registered_packages_take_precedence() {
        let mut importer = StdImporter::new().with_package(
            "example.com/lib",
            vec![("lib.go".to_string(), "package lib\n\nfunc Do() error\n".to_string())],
        );
        let files = importer.import("example.com/lib", &mut FileSet::new()).unwrap();
        assert_eq!(files[0].package.name, "lib");
    }
}
