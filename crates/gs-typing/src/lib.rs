//! Type checker for Go packages.
//!
//! `check` resolves every identifier, computes the static type of every value
//! expression and builds the scope tree of the package. Package-level objects
//! are resolved on demand, so declarations may appear in any order.

use std::collections::HashMap;

use gs_core::ast::{File, NodeId};
use gs_core::error::TypeCheckError;
use gs_core::span::{FileSet, Span};
use tracing::{debug, info_span};

pub mod importer;
pub mod typing;

pub use importer::{Importer, StdImporter};
pub use typing::info::{Package, TypeInfo, DESCRIPTOR_VERSION};
pub use typing::scope::{
    Builtin, Object, ObjectId, ObjectKind, Scope, ScopeId, ScopeKind, ScopeTree,
};
pub use typing::types::{
    BasicKind, InterfaceType, Method, NamedType, Signature, StructType, Type, TypeDescriptor,
};

pub(crate) type CheckResult<T> = std::result::Result<T, TypeCheckError>;

/// State shared by the checker of the main package and the checkers of the
/// packages it imports.
pub(crate) struct Env<'e> {
    fset: &'e mut FileSet,
    importer: &'e mut dyn Importer,
    tree: ScopeTree,
    types: HashMap<NodeId, TypeDescriptor>,
    scopes: HashMap<NodeId, ScopeId>,
    /// Import path to package name and package scope.
    packages: HashMap<String, (String, ScopeId)>,
    importing: Vec<String>,
}

/// Checks the files of one package against a shared `Env`.
pub(crate) struct Checker<'c, 'e> {
    env: &'c mut Env<'e>,
    files: &'c [File],
    path: String,
    package: ScopeId,
    file_scopes: Vec<ScopeId>,
    package_objects: Vec<ObjectId>,
    /// Receiver base type name to `(file, decl)` of its methods.
    methods: HashMap<String, Vec<(usize, usize)>>,
    /// Result types of the enclosing functions, innermost last.
    results: Vec<FuncContext>,
    iota: Option<i128>,
}

#[derive(Debug, Clone)]
pub(crate) struct FuncContext {
    results: Vec<Type>,
    named_results: bool,
}

/// Type-check the files of one package.
///
/// All files must belong to the same package. Imports are served by
/// `importer`; imported files are registered in `fset`.
pub fn check(
    fset: &mut FileSet,
    files: &[File],
    importer: &mut dyn Importer,
) -> Result<TypeInfo, TypeCheckError> {
    let first = files
        .first()
        .ok_or_else(|| TypeCheckError::new("no Go files to check"))?;
    let name = first.package.name.clone();
    for file in files {
        if file.package.name != name {
            let span = file.package.span;
            return Err(TypeCheckError::new(format!(
                "package {}; expected package {}",
                file.package.name, name
            ))
            .with_span(span)
            .with_position(fset.position(span)));
        }
    }

    let _span = info_span!("check", package = %name).entered();
    let mut tree = ScopeTree::new();
    typing::universe::populate(&mut tree);
    let mut env = Env {
        fset,
        importer,
        tree,
        types: HashMap::new(),
        scopes: HashMap::new(),
        packages: HashMap::new(),
        importing: Vec::new(),
    };

    let scope = Checker::new(&mut env, files, name.clone()).check_package()?;
    debug!(
        expressions = env.types.len(),
        scopes = env.scopes.len(),
        "type check finished"
    );

    let Env {
        tree,
        types,
        scopes,
        ..
    } = env;
    Ok(TypeInfo {
        version: DESCRIPTOR_VERSION,
        types,
        scopes,
        scope_tree: tree,
        package: Package {
            path: name.clone(),
            name,
            scope,
        },
    })
}

impl<'c, 'e> Checker<'c, 'e> {
    fn new(env: &'c mut Env<'e>, files: &'c [File], path: String) -> Self {
        let universe = env.tree.universe();
        Self {
            env,
            files,
            path,
            package: universe,
            file_scopes: Vec::new(),
            package_objects: Vec::new(),
            methods: HashMap::new(),
            results: Vec::new(),
            iota: None,
        }
    }

    pub(crate) fn error(&self, span: Span, message: impl Into<String>) -> TypeCheckError {
        TypeCheckError::new(message)
            .with_span(span)
            .with_position(self.env.fset.position(span))
    }

    pub(crate) fn tree(&self) -> &ScopeTree {
        &self.env.tree
    }

    pub(crate) fn push_scope(&mut self, parent: ScopeId, kind: ScopeKind, node: NodeId) -> ScopeId {
        let scope = self.env.tree.push(parent, kind);
        self.env.scopes.insert(node, scope);
        scope
    }

    pub(crate) fn record(&mut self, id: NodeId, desc: TypeDescriptor) {
        self.env.types.insert(id, desc);
    }

    pub(crate) fn declare(&mut self, scope: ScopeId, object: Object) -> CheckResult<ObjectId> {
        let span = object.span;
        let name = object.name.clone();
        self.env
            .tree
            .insert(scope, object)
            .map_err(|_| self.error(span, format!("{} redeclared in this block", name)))
    }
}

#[cfg(test)]
mod tests;
