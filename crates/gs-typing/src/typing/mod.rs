pub mod info;
pub mod scope;
pub mod types;
pub mod universe;

mod constant;
mod decl;
mod infer_expr;
mod infer_stmt;
mod lookup;
mod resolve;
