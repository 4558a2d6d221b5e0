// Diagnostics: the uniform error record handed to callers
//
// Fatal errors (error::Error) and accumulated issues (validate::Issue) carry
// spans that only make sense with the SourceMap at hand. A Diagnostic
// resolves that into a file path, a 1-based line and column, a kind from a
// fixed taxonomy and a message, and can be serialized as is.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{Error, ErrorKind};
use crate::source::SourceMap;
use crate::validate::{Issue, IssueKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DiagnosticKind {
    LexError,
    ParseError,
    ImportCycleError,
    MissingImportError,
    UnreadableRootError,
    UnknownGroupError,
    SpreadCycleError,
    UnknownTypeError,
    TypeMismatchError,
    DuplicateFieldError,
    DuplicateDeclarationError,
    UnknownConstraintError,
    MalformedAnnotationError,
    PathParamMismatchError,
    MissingResponseError,
    InvalidEndpointError,
    ConfigError,
    InternalError,
}

impl DiagnosticKind {
    /// An unreadable file with a location is a failed import; without one it
    /// is the root the run started from.
    pub fn of_error(err: &Error) -> Self {
        match &err.kind {
            k if k.is_lex() => DiagnosticKind::LexError,
            ErrorKind::Io { .. } if err.span.is_some() => DiagnosticKind::MissingImportError,
            ErrorKind::Io { .. } => DiagnosticKind::UnreadableRootError,
            ErrorKind::ImportCycle { .. } => DiagnosticKind::ImportCycleError,
            ErrorKind::Config(_) => DiagnosticKind::ConfigError,
            ErrorKind::Message(_) => DiagnosticKind::InternalError,
            _ => DiagnosticKind::ParseError,
        }
    }

    pub fn of_issue(kind: &IssueKind) -> Self {
        match kind {
            IssueKind::UnknownGroup { .. } => DiagnosticKind::UnknownGroupError,
            IssueKind::SpreadCycle { .. } => DiagnosticKind::SpreadCycleError,
            IssueKind::UnknownType { .. } => DiagnosticKind::UnknownTypeError,
            IssueKind::TypeMismatch { .. } => DiagnosticKind::TypeMismatchError,
            IssueKind::DuplicateField { .. } | IssueKind::MultipleIdentifiers { .. } => {
                DiagnosticKind::DuplicateFieldError
            }
            IssueKind::DuplicateDeclaration { .. } => DiagnosticKind::DuplicateDeclarationError,
            IssueKind::UnknownConstraint { .. } => DiagnosticKind::UnknownConstraintError,
            IssueKind::MalformedAnnotation { .. } => DiagnosticKind::MalformedAnnotationError,
            IssueKind::PathParamMismatch { .. } => DiagnosticKind::PathParamMismatchError,
            IssueKind::MissingResponse => DiagnosticKind::MissingResponseError,
            IssueKind::InvalidEndpoint { .. } => DiagnosticKind::InvalidEndpointError,
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// One reported problem. `line`/`column` are 0 when no location applies
/// (e.g. the root file itself cannot be read).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub file: PathBuf,
    pub line: usize,
    pub column: usize,
    pub kind: DiagnosticKind,
    pub message: String,
}

impl Diagnostic {
    /// `fallback` names the file when the error carries no span.
    pub fn from_error(err: &Error, sources: &SourceMap, fallback: &Path) -> Self {
        let (file, line, column) = match &err.span {
            Some(span) => (
                sources.path(span.file).unwrap_or(fallback).to_path_buf(),
                span.line,
                span.col,
            ),
            None => match &err.kind {
                ErrorKind::Io { path, .. } => (path.clone(), 0, 0),
                _ => (fallback.to_path_buf(), 0, 0),
            },
        };
        Self {
            file,
            line,
            column,
            kind: DiagnosticKind::of_error(err),
            message: err.kind.to_string(),
        }
    }

    pub fn from_issue(issue: &Issue, sources: &SourceMap) -> Self {
        Self {
            file: sources
                .path(issue.span.file)
                .map(Path::to_path_buf)
                .unwrap_or_default(),
            line: issue.span.line,
            column: issue.span.col,
            kind: DiagnosticKind::of_issue(&issue.kind),
            message: if issue.context.is_empty() {
                issue.kind.to_string()
            } else {
                format!("{} (in {})", issue.kind, issue.context)
            },
        }
    }

    /// The message plus the offending source line and a caret, when the
    /// file is part of `sources`.
    pub fn render(&self, sources: &SourceMap) -> String {
        let mut out = self.to_string();
        let line = sources
            .find(&self.file)
            .and_then(|id| sources.line(id, self.line));
        if let Some(text) = line {
            out.push_str(&format!("\n  | {text}"));
            out.push_str(&format!("\n  | {}^", " ".repeat(self.column.saturating_sub(1))));
        }
        out
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}: {}: {}",
            self.file.display(),
            self.line,
            self.column,
            self.kind,
            self.message
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::FileId;
    use crate::token::Span;

    #[test]
    fn test_from_error_with_span() {
        let mut sources = SourceMap::new();
        let id = sources.add("spec/a.go", "A {\n  x # string\n}");
        let err = Error::new(ErrorKind::UnexpectedChar('#'), Span::new(id, 8, 1, 2, 5));
        let diag = Diagnostic::from_error(&err, &sources, Path::new("root.go"));
        assert_eq!(diag.kind, DiagnosticKind::LexError);
        assert_eq!(diag.to_string(), "spec/a.go:2:5: LexError: unexpected character '#'");
        assert_eq!(
            diag.render(&sources),
            "spec/a.go:2:5: LexError: unexpected character '#'\n  |   x # string\n  |     ^"
        );
    }

    #[test]
    fn test_missing_root() {
        let err = Error::without_span(ErrorKind::Io {
            path: "missing.go".into(),
            message: "not found".into(),
        });
        let diag = Diagnostic::from_error(&err, &SourceMap::new(), Path::new("root.go"));
        assert_eq!(diag.file, PathBuf::from("missing.go"));
        assert_eq!((diag.line, diag.column), (0, 0));
        assert_eq!(diag.kind, DiagnosticKind::UnreadableRootError);

        let import = Error::new(
            ErrorKind::Io {
                path: "b.go".into(),
                message: "not found".into(),
            },
            Span::new(FileId(0), 0, 9, 1, 1),
        );
        let diag = Diagnostic::from_error(&import, &SourceMap::new(), Path::new("root.go"));
        assert_eq!(diag.kind, DiagnosticKind::MissingImportError);
    }

    #[test]
    fn test_from_issue() {
        let mut sources = SourceMap::new();
        sources.add("a.go", "Mood { age number<trim> }");
        let issue = Issue::new(
            IssueKind::TypeMismatch {
                constraint: "trim".into(),
                ty: "number".into(),
            },
            "Mood.age",
            Span::new(FileId(0), 18, 4, 1, 19),
        );
        let diag = Diagnostic::from_issue(&issue, &sources);
        assert_eq!(diag.kind, DiagnosticKind::TypeMismatchError);
        assert_eq!(
            diag.message,
            "constraint `trim` does not apply to type `number` (in Mood.age)"
        );
        let json = serde_json::to_value(&diag).unwrap();
        assert_eq!(json["kind"], "TypeMismatchError");
        assert_eq!(json["line"], 1);
    }
}
