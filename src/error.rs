// Error types for vsl-ir
//
// `Error` covers everything that aborts a file or a compilation unit:
// lexing, parsing, unreadable imports, import cycles and bad options.
// Accumulated semantic problems live in `validate::Issue` instead.

use std::path::PathBuf;

use thiserror::Error;

use crate::token::Span;

/// Result type for the IR crate.
pub type Result<T> = std::result::Result<T, Error>;

/// A fatal error with an optional location.
#[derive(Debug, Clone, PartialEq)]
pub struct Error {
    pub kind: ErrorKind,
    pub span: Option<Span>,
    pub source_line: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ErrorKind {
    // Lexer errors
    #[error("unexpected character '{0}'")]
    UnexpectedChar(char),
    #[error("unterminated string literal")]
    UnterminatedString,
    #[error("unterminated block comment")]
    UnterminatedComment,
    #[error("unterminated annotation, expected `>` before end of line")]
    UnterminatedAnnotation,
    #[error("unterminated enum list, expected `)` before end of line")]
    UnterminatedEnum,
    #[error("invalid number '{0}'")]
    InvalidNumber(String),

    // Parser errors
    #[error("expected {expected}, found {found}")]
    UnexpectedToken { expected: String, found: String },
    #[error("array of optional elements is not supported, write `{0}[]?` for an optional array")]
    ArrayOfOptional(String),
    #[error("duplicate {0}")]
    Duplicate(String),

    // Composition errors
    #[error("cannot read `{}`: {message}", .path.display())]
    Io { path: PathBuf, message: String },
    #[error("import cycle: {}", render_chain(.chain))]
    ImportCycle { chain: Vec<PathBuf> },

    // Options
    #[error("invalid compile options: {0}")]
    Config(String),

    // General
    #[error("{0}")]
    Message(String),
}

fn render_chain(chain: &[PathBuf]) -> String {
    chain
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

impl ErrorKind {
    pub fn is_lex(&self) -> bool {
        matches!(
            self,
            ErrorKind::UnexpectedChar(_)
                | ErrorKind::UnterminatedString
                | ErrorKind::UnterminatedComment
                | ErrorKind::UnterminatedAnnotation
                | ErrorKind::UnterminatedEnum
                | ErrorKind::InvalidNumber(_)
        )
    }
}

impl Error {
    pub fn new(kind: ErrorKind, span: Span) -> Self {
        Self {
            kind,
            span: Some(span),
            source_line: None,
        }
    }

    pub fn without_span(kind: ErrorKind) -> Self {
        Self {
            kind,
            span: None,
            source_line: None,
        }
    }

    pub fn msg(s: impl Into<String>) -> Self {
        Self::without_span(ErrorKind::Message(s.into()))
    }

    pub fn at(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    pub fn with_source_line(mut self, line: impl Into<String>) -> Self {
        self.source_line = Some(line.into());
        self
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(span) = &self.span {
            write!(f, "[{}:{}] ", span.line, span.col)?;
        }
        write!(f, "{}", self.kind)?;
        if let Some(line) = &self.source_line {
            write!(f, "\n  | {line}")?;
            if let Some(span) = &self.span {
                write!(f, "\n  | {}^", " ".repeat(span.col.saturating_sub(1)))?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for Error {}
