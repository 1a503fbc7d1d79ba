use crate::span::Span;

pub const BLANK: &str = "_";

/// A simple identifier - a single name like `err` or `Reader`
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

impl Ident {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            span: Span::null(),
        }
    }

    pub fn with_span(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
        }
    }

    pub fn blank() -> Self {
        Self::new(BLANK)
    }

    pub fn as_str(&self) -> &str {
        self.name.as_str()
    }

    /// The distinguished "ignore this value" target.
    pub fn is_blank(&self) -> bool {
        self.name == BLANK
    }

    /// Go exports identifiers that start with an upper-case letter.
    pub fn is_exported(&self) -> bool {
        self.name.chars().next().is_some_and(char::is_uppercase)
    }
}

impl std::fmt::Display for Ident {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl From<&str> for Ident {
    fn from(name: &str) -> Self {
        Ident::new(name)
    }
}

impl From<String> for Ident {
    fn from(name: String) -> Self {
        Ident::new(name)
    }
}
