use std::fmt::{Display, Formatter};

use crate::span::{FileSet, Span};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub level: DiagnosticLevel,
    pub message: String,
    pub span: Option<Span>,
    pub suggestions: Vec<String>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(DiagnosticLevel::Error, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(DiagnosticLevel::Warning, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(DiagnosticLevel::Info, message)
    }

    fn new(level: DiagnosticLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            span: None,
            suggestions: Vec::new(),
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        if !span.is_null() {
            self.span = Some(span);
        }
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.level == DiagnosticLevel::Error
    }
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;

        if !self.suggestions.is_empty() {
            let hints = self.suggestions.join("; ");
            write!(f, " (hints: {})", hints)?;
        }

        Ok(())
    }
}

/// Built-in templates supported when printing diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DiagnosticTemplate {
    #[default]
    Pretty,
    Plain,
}

/// Render one diagnostic into output lines. `context` names the stage or
/// unit the diagnostic belongs to.
pub fn render_diagnostic(
    diagnostic: &Diagnostic,
    context: &str,
    template: DiagnosticTemplate,
    fset: Option<&FileSet>,
) -> Vec<String> {
    let location = diagnostic
        .span
        .and_then(|span| fset.and_then(|fset| fset.position(span)));

    let mut lines = Vec::new();
    match template {
        DiagnosticTemplate::Pretty => {
            let prefix = match diagnostic.level {
                DiagnosticLevel::Error => "error",
                DiagnosticLevel::Warning => "warning",
                DiagnosticLevel::Info => "info",
            };
            lines.push(format!("{}: [{}] {}", prefix, context, diagnostic.message));
            if let Some(location) = location {
                lines.push(format!("   --> {}", location));
            }
            for suggestion in &diagnostic.suggestions {
                lines.push(format!("   = help: {}", suggestion));
            }
        }
        DiagnosticTemplate::Plain => {
            let level = match diagnostic.level {
                DiagnosticLevel::Error => "ERROR",
                DiagnosticLevel::Warning => "WARNING",
                DiagnosticLevel::Info => "INFO",
            };
            lines.push(format!("[{}] {}: {}", context, level, diagnostic.message));
            if let Some(location) = location {
                lines.push(format!("   at {}", location));
            }
            for suggestion in &diagnostic.suggestions {
                lines.push(format!("   suggestion: {}", suggestion));
            }
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_template_includes_location() {
        let mut fset = FileSet::new();
        let file = fset.add_file("a.go", "package a\nfunc f() {}\n");
        let diagnostic = Diagnostic::error("boom")
            .with_span(Span::new(file, 10, 14))
            .with_suggestion("try again");
        let lines = render_diagnostic(&diagnostic, "f", DiagnosticTemplate::Plain, Some(&fset));
        assert_eq!(
            lines,
            vec![
                "[f] ERROR: boom".to_string(),
                "   at a.go:2:1".to_string(),
                "   suggestion: try again".to_string(),
            ]
        );
    }

    #[test]
    fn display_joins_hints() {
        let diagnostic = Diagnostic::warning("careful")
            .with_suggestion("a")
            .with_suggestion("b");
        assert_eq!(diagnostic.to_string(), "careful (hints: a; b)");
    }
}
