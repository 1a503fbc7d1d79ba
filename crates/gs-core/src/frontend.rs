use std::path::Path;
use std::sync::Arc;

use crate::ast::{AstSerializer, File};
use crate::error::Result;
use crate::span::FileSet;

/// Result produced by a language frontend after parsing one source file.
#[derive(Clone)]
pub struct FrontendResult {
    pub file: File,
    pub serializer: Arc<dyn AstSerializer>,
}

impl std::fmt::Debug for FrontendResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrontendResult")
            .field("file", &self.file.path)
            .finish_non_exhaustive()
    }
}

/// Trait implemented by every source-language frontend.
///
/// Files are registered in the given `FileSet` so spans and node ids stay
/// unique across the whole program.
pub trait LanguageFrontend: Send + Sync {
    fn language(&self) -> &'static str;
    fn extensions(&self) -> &'static [&'static str];
    fn parse(&self, fset: &mut FileSet, source: &str, path: &Path) -> Result<FrontendResult>;
}
