use std::cell::Cell;
use std::path::{Path, PathBuf};

use crate::ast::NodeId;

pub type FileId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Span {
    pub file: FileId,
    pub lo: u32,
    pub hi: u32,
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Span({}:{}-{})", self.file, self.lo, self.hi)
    }
}

impl Span {
    const NULL_FILE: FileId = FileId::MAX;

    pub fn new(file: FileId, lo: u32, hi: u32) -> Span {
        Span { file, lo, hi }
    }

    /// Span attached to nodes synthesized after parsing.
    pub fn null() -> Span {
        Span {
            file: Self::NULL_FILE,
            lo: 0,
            hi: 0,
        }
    }

    pub fn is_null(&self) -> bool {
        self.file == Self::NULL_FILE
    }

    pub fn len(&self) -> u32 {
        self.hi.saturating_sub(self.lo)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Human readable `file:line:column` location, 1-based like the Go toolchain.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Position {
    pub file: PathBuf,
    pub line: usize,
    pub column: usize,
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.file.display(), self.line, self.column)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    pub id: FileId,
    pub path: PathBuf,
    pub source: String,
    line_starts: Vec<u32>,
}

impl FileInfo {
    fn new(id: FileId, path: PathBuf, source: String) -> Self {
        let line_starts = std::iter::once(0)
            .chain(
                source
                    .bytes()
                    .enumerate()
                    .filter(|(_, b)| *b == b'\n')
                    .map(|(idx, _)| idx as u32 + 1),
            )
            .collect();
        Self {
            id,
            path,
            source,
            line_starts,
        }
    }

    pub fn position(&self, offset: u32) -> Position {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next - 1,
        };
        let column = offset - self.line_starts[line];
        Position {
            file: self.path.clone(),
            line: line + 1,
            column: column as usize + 1,
        }
    }
}

/// Registry of the source files of one program.
///
/// Besides positions it hands out `NodeId`s, so ids stay unique across every
/// file parsed against the same set and across nodes synthesized later.
#[derive(Debug, Default)]
pub struct FileSet {
    files: Vec<FileInfo>,
    next_node: Cell<u32>,
}

impl FileSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file(&mut self, path: impl Into<PathBuf>, source: impl Into<String>) -> FileId {
        let id = self.files.len() as FileId;
        self.files
            .push(FileInfo::new(id, path.into(), source.into()));
        id
    }

    pub fn file(&self, id: FileId) -> Option<&FileInfo> {
        self.files.get(id as usize)
    }

    pub fn files(&self) -> impl Iterator<Item = &FileInfo> {
        self.files.iter()
    }

    pub fn path(&self, id: FileId) -> Option<&Path> {
        self.file(id).map(|file| file.path.as_path())
    }

    pub fn position(&self, span: Span) -> Option<Position> {
        if span.is_null() {
            return None;
        }
        self.file(span.file).map(|file| file.position(span.lo))
    }

    pub fn snippet(&self, span: Span) -> Option<&str> {
        let file = self.file(span.file)?;
        file.source.get(span.lo as usize..span.hi as usize)
    }

    pub fn fresh_id(&self) -> NodeId {
        let id = self.next_node.get();
        self.next_node.set(id + 1);
        NodeId::new(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positions_are_one_based() {
        let mut fset = FileSet::new();
        let id = fset.add_file("main.go", "package main\n\nfunc main() {}\n");
        let pos = fset.position(Span::new(id, 14, 18)).unwrap();
        assert_eq!(pos.line, 3);
        assert_eq!(pos.column, 1);
        assert_eq!(pos.to_string(), "main.go:3:1");
    }

    #[test]
    fn fresh_ids_never_repeat() {
        let fset = FileSet::new();
        let a = fset.fresh_id();
        let b = fset.fresh_id();
        assert_ne!(a, b);
    }

    #[test]
    fn null_span_has_no_position() {
        let mut fset = FileSet::new();
        assert!(Span::null().is_null());
        assert!(fset.position(Span::null()).is_none());

        let id = fset.add_file("main.go", "package main\n");
        assert!(!Span::new(id, 0, 7).is_null());
    }
}
