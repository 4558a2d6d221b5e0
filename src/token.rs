// Token: all lexical tokens of the spec language
//
// The language is small. Tokens fall into these categories:
//
//   1. Punctuation   { } [ ] ( ) < > ? | : , . ... !
//   2. Literals      strings, integers, floats
//   3. Paths         /profiles/:id and import targets like ../commons.go
//   4. Raw text      annotation arguments (`minLength:8`) and enum literals
//   5. Identifiers   names, base types and contextual keywords
//   6. Comments      kept as tokens so the parser can attach descriptions
//
// Contextual words (import, path, method, response, http, status, message,
// data, params, query, body, as) are plain identifiers; the parser decides
// what they mean from their position. Each token carries a Span.

use std::fmt;

use crate::source::FileId;

/// Byte-level location in source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    /// File the span belongs to.
    pub file: FileId,
    /// Byte offset from the start of the source.
    pub offset: usize,
    /// Length in bytes.
    pub len: usize,
    /// Line number (1-based).
    pub line: usize,
    /// Column number (1-based, in bytes).
    pub col: usize,
}

impl Span {
    pub fn new(file: FileId, offset: usize, len: usize, line: usize, col: usize) -> Self {
        Self {
            file,
            offset,
            len,
            line,
            col,
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

/// A token with its kind and source location.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// Every possible token kind.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    //  Literals
    IntLit(i64),
    FloatLit(f64),
    StringLit(String),
    /// `/products/:id` or an import target.
    PathLit(String),
    /// Raw annotation argument or enum literal, already trimmed.
    RawText(String),

    //  Punctuation
    LBrace,   // {
    RBrace,   // }
    LBracket, // [
    RBracket, // ]
    LParen,   // (
    RParen,   // )
    LAngle,   // <
    RAngle,   // >
    Question, // ?
    Pipe,     // |
    Colon,    // :
    Comma,    // ,
    Dot,      // .
    Ellipsis, // ...
    Bang,     // !

    //  Identifiers
    Ident(String),

    /// `// text` or `/* text */`. `trailing` is set when code precedes the
    /// comment on its first line.
    Comment { text: String, trailing: bool },

    //  Special
    Eof,
}

impl TokenKind {
    pub fn is_comment(&self) -> bool {
        matches!(self, TokenKind::Comment { .. })
    }

    pub fn is_ident(&self, word: &str) -> bool {
        matches!(self, TokenKind::Ident(s) if s == word)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::IntLit(n) => write!(f, "{n}"),
            TokenKind::FloatLit(n) => write!(f, "{n}"),
            TokenKind::StringLit(s) => write!(f, "\"{s}\""),
            TokenKind::PathLit(s) => write!(f, "path `{s}`"),
            TokenKind::RawText(s) => write!(f, "`{s}`"),
            TokenKind::LBrace => write!(f, "`{{`"),
            TokenKind::RBrace => write!(f, "`}}`"),
            TokenKind::LBracket => write!(f, "`[`"),
            TokenKind::RBracket => write!(f, "`]`"),
            TokenKind::LParen => write!(f, "`(`"),
            TokenKind::RParen => write!(f, "`)`"),
            TokenKind::LAngle => write!(f, "`<`"),
            TokenKind::RAngle => write!(f, "`>`"),
            TokenKind::Question => write!(f, "`?`"),
            TokenKind::Pipe => write!(f, "`|`"),
            TokenKind::Colon => write!(f, "`:`"),
            TokenKind::Comma => write!(f, "`,`"),
            TokenKind::Dot => write!(f, "`.`"),
            TokenKind::Ellipsis => write!(f, "`...`"),
            TokenKind::Bang => write!(f, "`!`"),
            TokenKind::Ident(s) => write!(f, "{s}"),
            TokenKind::Comment { .. } => write!(f, "comment"),
            TokenKind::Eof => write!(f, "<eof>"),
        }
    }
}
