use std::path::Path;
use std::sync::Arc;

use gs_core::ast::AstSerializer;
use gs_core::error::{Error as CoreError, Result as CoreResult};
use gs_core::frontend::{FrontendResult, LanguageFrontend};
use gs_core::span::FileSet;

use crate::parser::GoParser;
use crate::serializer::GoSerializer;

/// Canonical identifier for the Go frontend.
pub const GOLANG: &str = "go";

/// Frontend that parses Go source files into the Go AST.
pub struct GoFrontend {
    serializer: Arc<GoSerializer>,
}

impl GoFrontend {
    pub fn new() -> Self {
        Self {
            serializer: Arc::new(GoSerializer::default()),
        }
    }
}

impl Default for GoFrontend {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageFrontend for GoFrontend {
    fn language(&self) -> &'static str {
        GOLANG
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["go"]
    }

    fn parse(&self, fset: &mut FileSet, source: &str, path: &Path) -> CoreResult<FrontendResult> {
        let mut parser = GoParser::new().map_err(|err| CoreError::from(err.to_string()))?;
        let file = parser.parse_file(fset, path, source)?;

        Ok(FrontendResult {
            file,
            serializer: self.serializer.clone() as Arc<dyn AstSerializer>,
        })
    }
}
