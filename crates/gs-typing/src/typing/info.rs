use std::collections::HashMap;

use gs_core::ast::NodeId;

use crate::typing::scope::{ScopeId, ScopeTree};
use crate::typing::types::TypeDescriptor;

/// Version of the `TypeDescriptor` model carried in `TypeInfo`.
pub const DESCRIPTOR_VERSION: u32 = 1;

/// The package that was checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
    pub name: String,
    pub path: String,
    pub scope: ScopeId,
}

/// Everything the checker learned about one package.
#[derive(Debug, Clone)]
pub struct TypeInfo {
    pub version: u32,
    /// Type of every value expression, keyed by the expression's node id.
    pub types: HashMap<NodeId, TypeDescriptor>,
    /// Scope introduced by function types and scope-owning statements.
    pub scopes: HashMap<NodeId, ScopeId>,
    pub scope_tree: ScopeTree,
    pub package: Package,
}

impl TypeInfo {
    pub fn type_of(&self, id: NodeId) -> Option<&TypeDescriptor> {
        self.types.get(&id)
    }

    pub fn scope_of(&self, id: NodeId) -> Option<ScopeId> {
        self.scopes.get(&id).copied()
    }
}
