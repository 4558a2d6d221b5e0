// Lexer: converts spec source text into a stream of Tokens
//
// The lexer is a hand-written scanner (no regex, no generator). It processes
// the source one byte at a time and is an Iterator, so callers can pull
// tokens lazily; `tokenize` collects the whole file.
//
// DESIGN DECISIONS:
//
//   1. Keywords are contextual. `import`, `path`, `method`, `response` and
//      friends are lexed as identifiers and interpreted by the parser.
//
//   2. Three sub-grammars need raw text, so the lexer switches modes:
//        - after `<` it lexes constraint names, `|`, `!`, and after `:` the
//          raw argument up to the next `|` or `>` (`startsWith:https://`).
//        - after `(` it lexes raw enum literals separated by `|`.
//        - after a top-level `import` it lexes the target as a PathLit.
//      Annotation and enum lists must close on the line they start.
//
//   3. A `/` that does not start a comment begins a PathLit running to the
//      next whitespace (`/profiles/:id`).
//
//   4. Comments are tokens. A comment is `trailing` when code precedes it on
//      the same line; the parser turns those into field descriptions.
//
//   5. Numbers: integers and floats, with an optional leading `-`.

use crate::error::{Error, ErrorKind, Result};
use crate::source::FileId;
use crate::token::{Span, Token, TokenKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Normal,
    ImportPath,
    Annotation,
    AnnotationArg,
    EnumList,
}

/// Lexer state over a source string.
#[derive(Debug, Clone)]
pub struct Lexer<'src> {
    src: &'src str,
    bytes: &'src [u8],
    file: FileId,
    pos: usize,
    line: usize,
    col: usize,
    depth: usize,
    mode: Mode,
    line_has_code: bool,
    done: bool,
}

impl<'src> Lexer<'src> {
    pub fn new(src: &'src str) -> Self {
        Self::with_file(src, FileId::default())
    }

    pub fn with_file(src: &'src str, file: FileId) -> Self {
        Self {
            src,
            bytes: src.as_bytes(),
            file,
            pos: 0,
            line: 1,
            col: 1,
            depth: 0,
            mode: Mode::Normal,
            line_has_code: false,
            done: false,
        }
    }

    /// Rewind to the start of the source.
    pub fn reset(&mut self) {
        *self = Self::with_file(self.src, self.file);
    }

    /// Tokenize the entire source, returning a Vec of Tokens.
    /// The last token is always Eof.
    pub fn tokenize(&mut self) -> Result<Vec<Token>> {
        self.by_ref().collect()
    }

    /// Read the next token.
    fn next_token(&mut self) -> Result<Token> {
        match self.mode {
            Mode::Normal => {}
            Mode::ImportPath => {
                if let Some(tok) = self.lex_import_path()? {
                    return Ok(tok);
                }
            }
            Mode::Annotation => return self.lex_annotation_item(),
            Mode::AnnotationArg => return Ok(self.lex_annotation_arg()),
            Mode::EnumList => return self.lex_enum_item(),
        }

        self.skip_whitespace();

        if self.pos >= self.bytes.len() {
            return Ok(Token::new(TokenKind::Eof, self.span_here(0)));
        }

        let start_pos = self.pos;
        let start_line = self.line;
        let start_col = self.col;
        let ch = self.bytes[self.pos] as char;

        //  Comments and paths
        if ch == '/' {
            return match self.peek_at(1) {
                Some('/') => Ok(self.lex_line_comment(start_pos, start_line, start_col)),
                Some('*') => self.lex_block_comment(start_pos, start_line, start_col),
                _ => Ok(self.lex_path(start_pos, start_line, start_col)),
            };
        }

        self.line_has_code = true;

        //  String literal
        if ch == '"' {
            return self.lex_string(start_pos, start_line, start_col);
        }

        //  Number literal
        if ch.is_ascii_digit()
            || (ch == '-' && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()))
        {
            return self.lex_number(start_pos, start_line, start_col);
        }

        //  Identifier
        if is_ident_start(self.bytes[self.pos]) {
            let tok = self.lex_ident(start_pos, start_line, start_col);
            if self.depth == 0 && tok.kind.is_ident("import") {
                self.mode = Mode::ImportPath;
            }
            return Ok(tok);
        }

        //  Punctuation
        let kind = match ch {
            '{' => {
                self.depth += 1;
                TokenKind::LBrace
            }
            '}' => {
                self.depth = self.depth.saturating_sub(1);
                TokenKind::RBrace
            }
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            '?' => TokenKind::Question,
            '|' => TokenKind::Pipe,
            ':' => TokenKind::Colon,
            ',' => TokenKind::Comma,
            '!' => TokenKind::Bang,
            '<' => {
                self.mode = Mode::Annotation;
                TokenKind::LAngle
            }
            '(' => {
                self.mode = Mode::EnumList;
                TokenKind::LParen
            }
            '.' => {
                if self.peek_at(1) == Some('.') && self.peek_at(2) == Some('.') {
                    self.advance();
                    self.advance();
                    TokenKind::Ellipsis
                } else {
                    TokenKind::Dot
                }
            }
            _ => {
                return Err(Error::new(
                    ErrorKind::UnexpectedChar(self.char_at(self.pos)),
                    Span::new(self.file, start_pos, 1, start_line, start_col),
                ));
            }
        };
        self.advance();

        Ok(Token::new(
            kind,
            Span::new(self.file, start_pos, self.pos - start_pos, start_line, start_col),
        ))
    }

    // Helpers

    fn advance(&mut self) {
        if self.pos < self.bytes.len() {
            let b = self.bytes[self.pos];
            if b == b'\n' {
                self.line += 1;
                self.col = 1;
                self.line_has_code = false;
            } else if b & 0xC0 != 0x80 {
                // Continuation bytes belong to the previous character.
                self.col += 1;
            }
            self.pos += 1;
        }
    }

    fn peek(&self) -> Option<char> {
        self.peek_at(0)
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.bytes.get(self.pos + offset).map(|&b| b as char)
    }

    /// Full character at a byte offset, so error messages show non-ASCII input intact.
    fn char_at(&self, pos: usize) -> char {
        self.src[pos..].chars().next().unwrap_or('\0')
    }

    fn span_here(&self, len: usize) -> Span {
        Span::new(self.file, self.pos, len, self.line, self.col)
    }

    fn span_from(&self, start_pos: usize, start_line: usize, start_col: usize) -> Span {
        Span::new(self.file, start_pos, self.pos - start_pos, start_line, start_col)
    }

    fn skip_whitespace(&mut self) {
        while self.pos < self.bytes.len() && self.bytes[self.pos].is_ascii_whitespace() {
            self.advance();
        }
    }

    /// Skip spaces and tabs but stop at a newline.
    fn skip_inline_whitespace(&mut self) {
        while matches!(self.peek(), Some(' ' | '\t' | '\r')) {
            self.advance();
        }
    }

    fn at_line_end(&self) -> bool {
        matches!(self.peek(), None | Some('\n'))
    }

    /// Consume bytes until `stop` matches or the line ends; returns the slice.
    fn take_until(&mut self, stop: impl Fn(u8) -> bool) -> &'src str {
        let start = self.pos;
        while self.pos < self.bytes.len() && self.bytes[self.pos] != b'\n' && !stop(self.bytes[self.pos]) {
            self.advance();
        }
        &self.src[start..self.pos]
    }

    fn lex_line_comment(&mut self, start_pos: usize, start_line: usize, start_col: usize) -> Token {
        let trailing = self.line_has_code;
        self.advance(); // /
        self.advance(); // /
        let text = self.take_until(|_| false).trim().to_string();
        Token::new(
            TokenKind::Comment { text, trailing },
            self.span_from(start_pos, start_line, start_col),
        )
    }

    fn lex_block_comment(
        &mut self,
        start_pos: usize,
        start_line: usize,
        start_col: usize,
    ) -> Result<Token> {
        let trailing = self.line_has_code;
        self.advance(); // /
        self.advance(); // *
        let body_start = self.pos;
        loop {
            if self.pos >= self.bytes.len() {
                return Err(Error::new(
                    ErrorKind::UnterminatedComment,
                    Span::new(self.file, start_pos, 2, start_line, start_col),
                ));
            }
            if self.bytes[self.pos] == b'*' && self.peek_at(1) == Some('/') {
                let text = self.src[body_start..self.pos].trim().to_string();
                self.advance(); // *
                self.advance(); // /
                return Ok(Token::new(
                    TokenKind::Comment { text, trailing },
                    self.span_from(start_pos, start_line, start_col),
                ));
            }
            self.advance();
        }
    }

    /// `/products/:id`: everything up to the next whitespace.
    fn lex_path(&mut self, start_pos: usize, start_line: usize, start_col: usize) -> Token {
        self.line_has_code = true;
        let start = self.pos;
        while self.pos < self.bytes.len() && !self.bytes[self.pos].is_ascii_whitespace() {
            self.advance();
        }
        let path = self.src[start..self.pos].to_string();
        Token::new(
            TokenKind::PathLit(path),
            self.span_from(start_pos, start_line, start_col),
        )
    }

    /// Import target on the rest of the line. Returns None (and falls back to
    /// normal lexing) when the line has no target, so the parser reports it.
    fn lex_import_path(&mut self) -> Result<Option<Token>> {
        self.mode = Mode::Normal;
        self.skip_inline_whitespace();
        if self.at_line_end() {
            return Ok(None);
        }
        let start_pos = self.pos;
        let start_line = self.line;
        let start_col = self.col;
        if self.peek() == Some('"') {
            return self.lex_string(start_pos, start_line, start_col).map(Some);
        }
        if self.peek() == Some('/') && matches!(self.peek_at(1), Some('/' | '*')) {
            return Ok(None);
        }
        Ok(Some(self.lex_path(start_pos, start_line, start_col)))
    }

    /// One item inside `<...>`.
    fn lex_annotation_item(&mut self) -> Result<Token> {
        self.skip_inline_whitespace();
        if self.at_line_end() {
            self.mode = Mode::Normal;
            return Err(Error::new(ErrorKind::UnterminatedAnnotation, self.span_here(0)));
        }
        let start_pos = self.pos;
        let start_line = self.line;
        let start_col = self.col;
        let byte = self.bytes[self.pos];
        if is_ident_start(byte) {
            return Ok(self.lex_ident(start_pos, start_line, start_col));
        }
        let kind = match byte {
            b'>' => {
                self.mode = Mode::Normal;
                TokenKind::RAngle
            }
            b'|' => TokenKind::Pipe,
            b'!' => TokenKind::Bang,
            b':' => {
                self.mode = Mode::AnnotationArg;
                TokenKind::Colon
            }
            _ => {
                self.mode = Mode::Normal;
                return Err(Error::new(
                    ErrorKind::UnexpectedChar(self.char_at(self.pos)),
                    Span::new(self.file, start_pos, 1, start_line, start_col),
                ));
            }
        };
        self.advance();
        Ok(Token::new(kind, self.span_from(start_pos, start_line, start_col)))
    }

    /// Raw argument after `name:` inside `<...>`.
    fn lex_annotation_arg(&mut self) -> Token {
        self.mode = Mode::Annotation;
        let start_pos = self.pos;
        let start_line = self.line;
        let start_col = self.col;
        let raw = self.take_until(|b| b == b'|' || b == b'>').trim().to_string();
        Token::new(
            TokenKind::RawText(raw),
            self.span_from(start_pos, start_line, start_col),
        )
    }

    /// One item inside `(a|b|c)`.
    fn lex_enum_item(&mut self) -> Result<Token> {
        self.skip_inline_whitespace();
        if self.at_line_end() {
            self.mode = Mode::Normal;
            return Err(Error::new(ErrorKind::UnterminatedEnum, self.span_here(0)));
        }
        let start_pos = self.pos;
        let start_line = self.line;
        let start_col = self.col;
        let kind = match self.bytes[self.pos] {
            b')' => {
                self.advance();
                self.mode = Mode::Normal;
                TokenKind::RParen
            }
            b'|' => {
                self.advance();
                TokenKind::Pipe
            }
            _ => {
                let raw = self.take_until(|b| b == b'|' || b == b')');
                TokenKind::RawText(raw.trim().to_string())
            }
        };
        Ok(Token::new(kind, self.span_from(start_pos, start_line, start_col)))
    }

    /// Lex a string literal (starting at the opening `"`).
    fn lex_string(
        &mut self,
        start_pos: usize,
        start_line: usize,
        start_col: usize,
    ) -> Result<Token> {
        self.line_has_code = true;
        self.advance(); // skip opening "
        let mut value = String::new();
        let mut chunk_start = self.pos;
        loop {
            if self.pos >= self.bytes.len() || self.bytes[self.pos] == b'\n' {
                return Err(Error::new(
                    ErrorKind::UnterminatedString,
                    self.span_from(start_pos, start_line, start_col),
                ));
            }
            match self.bytes[self.pos] {
                b'"' => {
                    value.push_str(&self.src[chunk_start..self.pos]);
                    self.advance(); // skip closing "
                    break;
                }
                b'\\' => {
                    value.push_str(&self.src[chunk_start..self.pos]);
                    self.advance();
                    match self.peek() {
                        Some('n') => value.push('\n'),
                        Some('t') => value.push('\t'),
                        Some('\\') => value.push('\\'),
                        Some('"') => value.push('"'),
                        Some('\n') | None => {
                            return Err(Error::new(
                                ErrorKind::UnterminatedString,
                                self.span_from(start_pos, start_line, start_col),
                            ));
                        }
                        Some(_) => {
                            // Unknown escapes are kept verbatim, including
                            // multi-byte characters.
                            value.push('\\');
                            chunk_start = self.pos;
                            continue;
                        }
                    }
                    self.advance();
                    chunk_start = self.pos;
                }
                _ => self.advance(),
            }
        }
        Ok(Token::new(
            TokenKind::StringLit(value),
            self.span_from(start_pos, start_line, start_col),
        ))
    }

    /// Lex a number: integer or float.
    fn lex_number(
        &mut self,
        start_pos: usize,
        start_line: usize,
        start_col: usize,
    ) -> Result<Token> {
        let num_start = self.pos;
        if self.peek() == Some('-') {
            self.advance();
        }
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }

        let mut is_float = false;
        if self.peek() == Some('.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            is_float = true;
            self.advance(); // skip .
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
            }
        }

        // `200abc` is one malformed number, not a number followed by a name.
        while self.pos < self.bytes.len() && is_ident_continue(self.bytes[self.pos]) {
            self.advance();
        }

        let raw = &self.src[num_start..self.pos];
        let span = self.span_from(start_pos, start_line, start_col);
        let invalid = || Error::new(ErrorKind::InvalidNumber(raw.to_string()), span);

        if is_float {
            let val: f64 = raw.parse().map_err(|_| invalid())?;
            Ok(Token::new(TokenKind::FloatLit(val), span))
        } else {
            let val: i64 = raw.parse().map_err(|_| invalid())?;
            Ok(Token::new(TokenKind::IntLit(val), span))
        }
    }

    /// Lex an identifier.
    fn lex_ident(&mut self, start_pos: usize, start_line: usize, start_col: usize) -> Token {
        let id_start = self.pos;
        while self.pos < self.bytes.len() && is_ident_continue(self.bytes[self.pos]) {
            self.advance();
        }
        let word = &self.src[id_start..self.pos];
        Token::new(
            TokenKind::Ident(word.to_string()),
            self.span_from(start_pos, start_line, start_col),
        )
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let result = self.next_token();
        match &result {
            Ok(tok) if tok.kind == TokenKind::Eof => self.done = true,
            Err(_) => self.done = true,
            Ok(_) => {}
        }
        Some(result)
    }
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b == b'$'
}

fn is_ident_continue(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(src: &str) -> Vec<TokenKind> {
        Lexer::new(src)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    fn ident(s: &str) -> TokenKind {
        TokenKind::Ident(s.into())
    }

    fn raw(s: &str) -> TokenKind {
        TokenKind::RawText(s.into())
    }

    #[test]
    fn test_simple_field() {
        let kinds = lex("Mood { emoji string }");
        assert_eq!(
            kinds,
            vec![
                ident("Mood"),
                TokenKind::LBrace,
                ident("emoji"),
                ident("string"),
                TokenKind::RBrace,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_cardinality_markers() {
        let kinds = lex("images[]? deleted?");
        assert_eq!(
            kinds,
            vec![
                ident("images"),
                TokenKind::LBracket,
                TokenKind::RBracket,
                TokenKind::Question,
                ident("deleted"),
                TokenKind::Question,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_annotation_mode() {
        let kinds = lex("string<trim|!minLength:2 | startsWith:https://>");
        assert_eq!(
            kinds,
            vec![
                ident("string"),
                TokenKind::LAngle,
                ident("trim"),
                TokenKind::Pipe,
                TokenKind::Bang,
                ident("minLength"),
                TokenKind::Colon,
                raw("2"),
                TokenKind::Pipe,
                ident("startsWith"),
                TokenKind::Colon,
                raw("https://"),
                TokenKind::RAngle,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_annotation_arg_with_commas_and_sign() {
        let kinds = lex("number<between:-10,40>");
        assert_eq!(
            kinds,
            vec![
                ident("number"),
                TokenKind::LAngle,
                ident("between"),
                TokenKind::Colon,
                raw("-10,40"),
                TokenKind::RAngle,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_enum_mode() {
        let kinds = lex("string(light|dark| auto)");
        assert_eq!(
            kinds,
            vec![
                ident("string"),
                TokenKind::LParen,
                raw("light"),
                TokenKind::Pipe,
                raw("dark"),
                TokenKind::Pipe,
                raw("auto"),
                TokenKind::RParen,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_empty_enum() {
        let kinds = lex("string()");
        assert_eq!(
            kinds,
            vec![ident("string"), TokenKind::LParen, TokenKind::RParen, TokenKind::Eof]
        );
    }

    #[test]
    fn test_unterminated_annotation() {
        let err = Lexer::new("name string<trim\nother string").tokenize().unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnterminatedAnnotation);
        assert_eq!(err.span.unwrap().line, 1);
    }

    #[test]
    fn test_unterminated_enum() {
        let err = Lexer::new("name string(a|b").tokenize().unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnterminatedEnum);
    }

    #[test]
    fn test_import_path() {
        let kinds = lex("import ../commons.go\nimport \"x y.go\"");
        assert_eq!(
            kinds,
            vec![
                ident("import"),
                TokenKind::PathLit("../commons.go".into()),
                ident("import"),
                TokenKind::StringLit("x y.go".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_import_inside_block_is_ident() {
        let kinds = lex("A { import string }");
        assert_eq!(kinds[2], ident("import"));
        assert_eq!(kinds[3], ident("string"));
    }

    #[test]
    fn test_url_path() {
        let kinds = lex("path /profiles/:id\nmethod PATCH");
        assert_eq!(
            kinds,
            vec![
                ident("path"),
                TokenKind::PathLit("/profiles/:id".into()),
                ident("method"),
                ident("PATCH"),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_response_keys() {
        let kinds = lex("response.ok { http.code 200 message \"Done\" }");
        assert_eq!(
            kinds,
            vec![
                ident("response"),
                TokenKind::Dot,
                ident("ok"),
                TokenKind::LBrace,
                ident("http"),
                TokenKind::Dot,
                ident("code"),
                TokenKind::IntLit(200),
                ident("message"),
                TokenKind::StringLit("Done".into()),
                TokenKind::RBrace,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_spread() {
        let kinds = lex("...common");
        assert_eq!(kinds, vec![TokenKind::Ellipsis, ident("common"), TokenKind::Eof]);
    }

    #[test]
    fn test_number_literals() {
        let kinds = lex("42 3.5 -7");
        assert_eq!(
            kinds,
            vec![
                TokenKind::IntLit(42),
                TokenKind::FloatLit(3.5),
                TokenKind::IntLit(-7),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_invalid_number() {
        let err = Lexer::new("http.code 20x").tokenize().unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidNumber("20x".into()));
    }

    #[test]
    fn test_string_escape() {
        let kinds = lex(r#""say \"hi\"\n""#);
        assert_eq!(
            kinds,
            vec![TokenKind::StringLit("say \"hi\"\n".into()), TokenKind::Eof]
        );
    }

    #[test]
    fn test_unterminated_string() {
        let err = Lexer::new("message \"oops\n").tokenize().unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnterminatedString);
        assert_eq!(err.span.unwrap().col, 9);
    }

    #[test]
    fn test_comments_are_tokens() {
        let kinds = lex("// header\nname string // Display name\n/* block */");
        assert_eq!(
            kinds,
            vec![
                TokenKind::Comment {
                    text: "header".into(),
                    trailing: false
                },
                ident("name"),
                ident("string"),
                TokenKind::Comment {
                    text: "Display name".into(),
                    trailing: true
                },
                TokenKind::Comment {
                    text: "block".into(),
                    trailing: false
                },
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_unterminated_block_comment() {
        let err = Lexer::new("/* never closed").tokenize().unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnterminatedComment);
    }

    #[test]
    fn test_unexpected_char() {
        let err = Lexer::new("name # string").tokenize().unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnexpectedChar('#'));
        let span = err.span.unwrap();
        assert_eq!((span.offset, span.line, span.col), (5, 1, 6));
    }

    #[test]
    fn test_span_tracking() {
        let tokens = Lexer::new("ab cd\n  ef").tokenize().unwrap();
        assert_eq!((tokens[0].span.line, tokens[0].span.col), (1, 1));
        assert_eq!((tokens[1].span.line, tokens[1].span.col), (1, 4));
        assert_eq!((tokens[2].span.line, tokens[2].span.col), (2, 3));
        assert_eq!(tokens[2].span.offset, 8);
    }

    #[test]
    fn test_columns_count_characters() {
        let tokens = Lexer::new("message \"é😀\" x").tokenize().unwrap();
        assert_eq!(tokens[2].kind, ident("x"));
        assert_eq!(tokens[2].span.col, 14);
        assert_eq!(tokens[2].span.offset, 17);

        let err = Lexer::new("\"😀\" #").tokenize().unwrap_err();
        assert_eq!(err.span.unwrap().col, 5);
    }

    #[test]
    fn test_lazy_and_restartable() {
        let mut lexer = Lexer::new("a b");
        assert_eq!(lexer.next().unwrap().unwrap().kind, ident("a"));
        lexer.reset();
        let all: Vec<_> = lexer.map(|t| t.unwrap().kind).collect();
        assert_eq!(all, vec![ident("a"), ident("b"), TokenKind::Eof]);
    }

    #[test]
    fn test_stops_after_error() {
        let mut lexer = Lexer::new("# a");
        assert!(lexer.next().unwrap().is_err());
        assert!(lexer.next().is_none());
    }

    #[test]
    fn test_file_id_on_spans() {
        let tokens = Lexer::with_file("x", FileId(3)).tokenize().unwrap();
        assert_eq!(tokens[0].span.file, FileId(3));
    }
}
