//! Diagnostic and error reporting utilities

use crate::{CliError, Result};
use gs_core::diagnostics::Diagnostic as CoreDiagnostic;
use gs_core::error::Error as CoreError;
use gs_core::span::{FileSet, Span};
use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Set up enhanced error reporting with miette
pub fn setup_error_reporting() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(false)
                .unicode(true)
                .context_lines(2)
                .build(),
        )
    }))
    .map_err(|e| CliError::Config(format!("Failed to setup error reporting: {}", e)))?;

    Ok(())
}

/// Source-located failures of the rewrite.
#[derive(Error, Debug, Diagnostic)]
pub enum GoscriptDiagnostic {
    #[error("{message}")]
    #[diagnostic(
        code(goscript::type_error),
        help("the program must type-check before discarded errors can be found")
    )]
    TypeError {
        message: String,
        #[source_code]
        src: NamedSource<String>,
        #[label("here")]
        span: SourceSpan,
    },

    #[error("transformation of function {unit:?} failed")]
    #[diagnostic(code(goscript::transformation_error))]
    Transformation {
        unit: String,
        #[related]
        problems: Vec<UnitProblem>,
    },
}

/// One reason a function could not be rewritten.
#[derive(Error, Debug, Diagnostic)]
#[error("{message}")]
pub struct UnitProblem {
    message: String,
    #[source_code]
    src: Option<NamedSource<String>>,
    #[label]
    span: Option<SourceSpan>,
    #[help]
    help: Option<String>,
}

/// Attach source snippets from `fset` to a core error where it has a span.
pub fn from_core(err: CoreError, fset: &FileSet) -> CliError {
    match err {
        CoreError::TypeCheck(type_error) => {
            let located = type_error.span.and_then(|span| locate(fset, span));
            match located {
                Some((src, span)) => GoscriptDiagnostic::TypeError {
                    message: type_error.to_string(),
                    src,
                    span,
                }
                .into(),
                None => CliError::Core(CoreError::TypeCheck(type_error)),
            }
        }
        CoreError::Transformation(failure) => GoscriptDiagnostic::Transformation {
            unit: failure.unit,
            problems: failure
                .diagnostics
                .iter()
                .map(|diagnostic| problem(diagnostic, fset))
                .collect(),
        }
        .into(),
        other => CliError::Core(other),
    }
}

fn problem(diagnostic: &CoreDiagnostic, fset: &FileSet) -> UnitProblem {
    let located = diagnostic.span.and_then(|span| locate(fset, span));
    let (src, span) = match located {
        Some((src, span)) => (Some(src), Some(span)),
        None => (None, None),
    };
    UnitProblem {
        message: diagnostic.message.clone(),
        src,
        span,
        help: (!diagnostic.suggestions.is_empty()).then(|| diagnostic.suggestions.join("; ")),
    }
}

fn locate(fset: &FileSet, span: Span) -> Option<(NamedSource<String>, SourceSpan)> {
    let file = fset.file(span.file)?;
    let src = NamedSource::new(file.path.display().to_string(), file.source.clone());
    Some((src, (span.lo as usize, span.len() as usize).into()))
}

/// Print errors that carry source context through miette. Anything else is
/// handed back to be reported as a plain message.
pub fn render_cli_error(err: CliError) -> Option<CliError> {
    match err {
        CliError::Diagnostic(diagnostic) => {
            eprintln!("{:?}", miette::Report::new(*diagnostic));
            None
        }
        other => Some(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gs_core::error::{TransformationError, TypeCheckError};

    #[test]
    fn located_type_errors_carry_source() {
        let mut fset = FileSet::new();
        let file = fset.add_file("main.go", "package main\n\nfunc main() {\n\tmissing()\n}\n");
        let err = TypeCheckError::new("undefined: missing").with_span(Span::new(file, 29, 36));

        match from_core(err.into(), &fset) {
            CliError::Diagnostic(diagnostic) => match *diagnostic {
                GoscriptDiagnostic::TypeError { message, span, .. } => {
                    assert_eq!(message, "undefined: missing");
                    assert_eq!(span, SourceSpan::from((29, 7)));
                }
                other => panic!("unexpected diagnostic {other:?}"),
            },
            other => panic!("expected a diagnostic, got {other:?}"),
        }
    }

    #[test]
    fn unlocated_type_errors_stay_plain() {
        let fset = FileSet::new();
        let err = from_core(TypeCheckError::new("no files").into(), &fset);
        assert!(matches!(err, CliError::Core(CoreError::TypeCheck(_))));
        assert_eq!(err.to_string(), "no files");
    }

    #[test]
    fn transformation_failures_keep_every_problem() {
        let fset = FileSet::new();
        let err = TransformationError {
            unit: "loop".to_string(),
            diagnostics: vec![
                CoreDiagnostic::error("first").with_suggestion("move it"),
                CoreDiagnostic::error("second"),
            ],
        };
        let CliError::Diagnostic(diagnostic) = from_core(err.into(), &fset) else {
            panic!("expected a diagnostic");
        };
        assert_eq!(diagnostic.to_string(), "transformation of function \"loop\" failed");
        let GoscriptDiagnostic::Transformation { problems, .. } = *diagnostic else {
            panic!("expected a transformation diagnostic");
        };
        assert_eq!(problems.len(), 2);
        assert_eq!(problems[0].help.as_deref(), Some("move it"));
        assert_eq!(problems[1].help, None);
    }
}
