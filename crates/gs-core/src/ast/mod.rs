//! Owned syntax tree for Go source files.
//!
//! Nodes that the type checker annotates (expressions, function types and
//! scope-introducing statements) carry a `NodeId` that is unique within a
//! `FileSet`.

mod expr;
mod ident;
mod item;
mod serialize;
mod stmt;
pub mod visit;

pub use expr::*;
pub use ident::*;
pub use item::*;
pub use serialize::*;
pub use stmt::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}
