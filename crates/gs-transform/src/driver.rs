use gs_core::ast::visit::{walk_block_mut, walk_expr_mut, walk_gen_decl_mut, VisitMut};
use gs_core::ast::*;
use gs_core::diagnostics::Diagnostic;
use gs_core::error::{Result, TransformationError};
use gs_core::span::FileSet;
use gs_typing::{Importer, TypeInfo};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, info_span, warn};

use crate::rewriter::UnitRewriter;

/// Summary of one transformation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformReport {
    pub package: String,
    /// Function declarations and literals visited.
    pub units: usize,
    /// Units that received at least one synthetic variable.
    pub rewritten_units: usize,
    pub statements: usize,
    pub variables: usize,
    pub guards: usize,
}

/// Type-check `files` and rewrite every function unit in place.
///
/// Units are visited in source order: each function declaration, then the
/// function literals inside it, outermost first. Literals in package-level
/// initializers are units too. The first unit that cannot be rewritten stops
/// the pass; its body is left as it was, earlier units stay rewritten.
pub fn transform(
    files: &mut [File],
    fset: &mut FileSet,
    importer: &mut dyn Importer,
) -> Result<TransformReport> {
    let info = gs_typing::check(fset, files, importer)?;
    let _span = info_span!("transform", package = %info.package.name).entered();

    let mut driver = Driver {
        info: &info,
        fset: &*fset,
        report: TransformReport {
            package: info.package.name.clone(),
            ..TransformReport::default()
        },
        failure: None,
    };
    for file in files.iter_mut() {
        debug!(file = %file.path.display(), "rewriting file");
        for decl in &mut file.decls {
            driver.visit_decl_mut(decl);
            if let Some(err) = driver.failure.take() {
                return Err(err.into());
            }
        }
    }

    let report = driver.report;
    info!(
        units = report.units,
        rewritten = report.rewritten_units,
        guards = report.guards,
        "transformation finished"
    );
    Ok(report)
}

struct Driver<'a> {
    info: &'a TypeInfo,
    fset: &'a FileSet,
    report: TransformReport,
    failure: Option<TransformationError>,
}

impl Driver<'_> {
    fn unit(&mut self, name: &str, ty: &FuncType, body: &mut BlockStmt) {
        let Some(root) = self.info.scope_of(ty.id) else {
            self.failure = Some(TransformationError {
                unit: name.to_string(),
                diagnostics: vec![Diagnostic::error("no scope recorded for function")],
            });
            return;
        };
        let snapshot = body.stmts.clone();
        let outcome = UnitRewriter::new(self.info, self.fset, root).rewrite_body(body);
        self.report.units += 1;

        if !outcome.diagnostics.is_empty() {
            warn!(unit = name, diagnostics = outcome.diagnostics.len(), "unit not rewritten");
            body.stmts = snapshot;
            self.failure = Some(TransformationError {
                unit: name.to_string(),
                diagnostics: outcome.diagnostics,
            });
            return;
        }
        if !outcome.vars.is_empty() {
            debug!(
                unit = name,
                vars = outcome.vars.len(),
                guards = outcome.guards,
                "unit rewritten"
            );
            self.report.rewritten_units += 1;
            self.report.statements += outcome.statements;
            self.report.variables += outcome.vars.len();
            self.report.guards += outcome.guards;
        }
    }
}

impl VisitMut for Driver<'_> {
    fn visit_decl_mut(&mut self, decl: &mut Decl) {
        match decl {
            Decl::Func(func) => {
                let Some(body) = &mut func.body else {
                    return;
                };
                self.unit(&func.name.name, &func.ty, body);
                if self.failure.is_none() {
                    walk_block_mut(self, body);
                }
            }
            Decl::Gen(gen) => walk_gen_decl_mut(self, gen),
        }
    }

    fn visit_expr_mut(&mut self, expr: &mut Expr) {
        if self.failure.is_none() {
            walk_expr_mut(self, expr);
        }
    }

    fn visit_func_lit_mut(&mut self, lit: &mut FuncLit) {
        if self.failure.is_some() {
            return;
        }
        self.unit("", &lit.ty, &mut lit.body);
        if self.failure.is_none() {
            walk_block_mut(self, &mut lit.body);
        }
    }
}
