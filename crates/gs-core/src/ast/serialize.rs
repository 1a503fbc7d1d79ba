use crate::ast::{Expr, File, Stmt};
use crate::error::{Error, Result};

/// Turns syntax trees back into source text.
#[allow(unused_variables)]
pub trait AstSerializer: Send + Sync {
    fn serialize_file(&self, file: &File) -> Result<String>;

    fn serialize_stmt(&self, stmt: &Stmt) -> Result<String> {
        Err(Error::from("not implemented: serialize_stmt"))
    }

    fn serialize_expr(&self, expr: &Expr) -> Result<String> {
        Err(Error::from("not implemented: serialize_expr"))
    }
}
