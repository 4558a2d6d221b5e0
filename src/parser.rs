// Parser: recursive descent parser for spec files
//
// The parser consumes a Vec<Token> (from the Lexer) and produces a SpecFile.
// It's a hand-written recursive descent parser, one method per grammar
// production.
//
// ERROR RECOVERY: none. The first error aborts the file; the resolver keeps
// going with the other files of the unit, so one broken file still lets the
// rest report their own errors.
//
// ENDPOINTS vs SHAPES: both are `Name { ... }` blocks. A block is an endpoint
// as soon as it holds a `path`, `method` or `response.<tag>` entry; the
// remaining members must then be `params`, `query` or `body` sections.
//
// COMMENTS: the lexer emits them as tokens. Parser::new strips them and keeps
// the trailing ones by line, so a field picks up the comment written after it
// as its description.

use std::collections::HashMap;

use crate::ast::*;
use crate::error::{Error, ErrorKind, Result};
use crate::source::FileId;
use crate::token::{Span, Token, TokenKind};

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    file: FileId,
    trailing: HashMap<usize, String>,
}

/// Entry inside a `Name { ... }` block before it is classified.
enum Item {
    Member(Member),
    Path(String, Span),
    Method(String, Span),
    Response(ResponseBlock),
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        let mut trailing = HashMap::new();
        let mut kept = Vec::with_capacity(tokens.len());
        for tok in tokens {
            match tok.kind {
                TokenKind::Comment { text, trailing: true } => {
                    trailing.entry(tok.span.line).or_insert(text);
                }
                TokenKind::Comment { .. } => {}
                _ => kept.push(tok),
            }
        }
        let file = kept.last().map(|t| t.span.file).unwrap_or_default();
        if !matches!(kept.last(), Some(t) if t.kind == TokenKind::Eof) {
            let span = kept.last().map(|t| t.span).unwrap_or_default();
            kept.push(Token::new(TokenKind::Eof, span));
        }
        Self {
            tokens: kept,
            pos: 0,
            file,
            trailing,
        }
    }

    /// Parse the full file.
    pub fn parse_file(&mut self) -> Result<SpecFile> {
        let mut imports = Vec::new();
        let mut declarations = Vec::new();
        while !self.at_eof() {
            if self.peek_kind().is_ident("import") {
                imports.push(self.parse_import()?);
            } else {
                declarations.push(self.parse_declaration()?);
            }
        }
        Ok(SpecFile {
            file: self.file,
            imports,
            declarations,
        })
    }

    // import

    fn parse_import(&mut self) -> Result<ImportStmt> {
        let span = self.advance().span;
        match self.peek_kind() {
            TokenKind::PathLit(path) | TokenKind::StringLit(path) => {
                self.advance();
                Ok(ImportStmt { path, span })
            }
            _ => Err(self.error_unexpected("an import path")),
        }
    }

    // Declarations

    fn parse_declaration(&mut self) -> Result<Declaration> {
        let span = self.current_span();
        let name = match self.peek_kind() {
            TokenKind::Ident(s) => {
                self.advance();
                s
            }
            _ => return Err(self.error_unexpected("a declaration or `import`")),
        };
        self.expect(TokenKind::LBrace)?;
        let mut items = Vec::new();
        while !self.check(&TokenKind::RBrace) {
            items.push(self.parse_item()?);
        }
        self.expect(TokenKind::RBrace)?;

        let is_endpoint = items.iter().any(|i| !matches!(i, Item::Member(_)));
        if is_endpoint {
            return Ok(Declaration::Endpoint(self.build_endpoint(name, items, span)?));
        }
        let members = items
            .into_iter()
            .filter_map(|i| match i {
                Item::Member(m) => Some(m),
                _ => None,
            })
            .collect();
        Ok(Declaration::Shape(ShapeDecl {
            name,
            members,
            span,
        }))
    }

    fn parse_item(&mut self) -> Result<Item> {
        match self.peek_kind() {
            TokenKind::Ellipsis => Ok(Item::Member(Member::Spread(self.parse_spread()?))),
            TokenKind::Ident(word) if word == "path" => {
                if let TokenKind::PathLit(path) = self.peek_ahead_kind(1) {
                    self.advance();
                    let span = self.advance().span;
                    return Ok(Item::Path(path, span));
                }
                Ok(Item::Member(Member::Field(self.parse_field()?)))
            }
            TokenKind::Ident(word) if word == "method" => match self.peek_ahead_kind(1) {
                TokenKind::Ident(verb) if is_uppercase_word(&verb) => {
                    self.advance();
                    let span = self.advance().span;
                    Ok(Item::Method(verb, span))
                }
                _ => Ok(Item::Member(Member::Field(self.parse_field()?))),
            },
            TokenKind::Ident(word)
                if word == "response" && self.peek_ahead_kind(1) == TokenKind::Dot =>
            {
                Ok(Item::Response(self.parse_response()?))
            }
            _ => Ok(Item::Member(Member::Field(self.parse_field()?))),
        }
    }

    fn build_endpoint(&self, name: String, items: Vec<Item>, span: Span) -> Result<EndpointDecl> {
        let mut ep = EndpointDecl {
            name,
            path: None,
            method: None,
            params: None,
            query: None,
            body: None,
            responses: Vec::new(),
            span,
        };
        for item in items {
            match item {
                Item::Path(path, s) => {
                    if ep.path.is_some() {
                        return Err(duplicate("`path`", &ep.name, s));
                    }
                    ep.path = Some((path, s));
                }
                Item::Method(verb, s) => {
                    if ep.method.is_some() {
                        return Err(duplicate("`method`", &ep.name, s));
                    }
                    ep.method = Some((verb, s));
                }
                Item::Response(block) => {
                    if ep.responses.iter().any(|r| r.tag == block.tag) {
                        let what = format!("`response.{}`", block.tag);
                        return Err(duplicate(&what, &ep.name, block.span));
                    }
                    ep.responses.push(block);
                }
                Item::Member(Member::Spread(spread)) => {
                    return Err(Error::new(
                        ErrorKind::UnexpectedToken {
                            expected: ENDPOINT_ITEMS.to_string(),
                            found: format!("`...{}`", spread.dotted()),
                        },
                        spread.span,
                    ));
                }
                Item::Member(Member::Field(field)) => {
                    let section = section_from_field(field)?;
                    let slot = match section.0.as_str() {
                        "params" => &mut ep.params,
                        "query" => &mut ep.query,
                        _ => &mut ep.body,
                    };
                    if slot.is_some() {
                        let what = format!("`{}` section", section.0);
                        return Err(duplicate(&what, &ep.name, section.1.span));
                    }
                    *slot = Some(section.1);
                }
            }
        }
        Ok(ep)
    }

    // Spreads and fields

    fn parse_spread(&mut self) -> Result<Spread> {
        let span = self.expect(TokenKind::Ellipsis)?.span;
        let mut path = vec![self.expect_ident()?];
        while self.check(&TokenKind::Dot) {
            self.advance();
            path.push(self.expect_ident()?);
        }
        Ok(Spread { path, span })
    }

    fn parse_field(&mut self) -> Result<FieldDef> {
        let span = self.current_span();
        let name = match self.peek_kind() {
            TokenKind::Ident(s) => {
                self.advance();
                s
            }
            _ => return Err(self.error_unexpected("a field name")),
        };
        let description = self.trailing.remove(&span.line);

        // Cardinality markers
        let mut optional = false;
        let mut array = false;
        loop {
            match self.peek_kind() {
                TokenKind::Question => {
                    let s = self.advance().span;
                    if optional {
                        return Err(duplicate("`?` marker", &name, s));
                    }
                    optional = true;
                }
                TokenKind::LBracket => {
                    let s = self.advance().span;
                    self.expect(TokenKind::RBracket)?;
                    if array {
                        return Err(duplicate("`[]` marker", &name, s));
                    }
                    if optional {
                        return Err(Error::new(ErrorKind::ArrayOfOptional(name), s));
                    }
                    array = true;
                }
                _ => break,
            }
        }

        // Type
        let ty_name = match self.peek_kind() {
            TokenKind::Ident(s) => {
                let s_span = self.advance().span;
                Some((s, s_span))
            }
            TokenKind::LBrace => None,
            _ => return Err(self.error_unexpected("a type or `{`")),
        };

        // Modifiers, in either order, at most one group of each
        let mut annotations: Option<Vec<Annotation>> = None;
        let mut enum_values = None;
        loop {
            match self.peek_kind() {
                TokenKind::LAngle => {
                    let s = self.current_span();
                    if annotations.is_some() {
                        return Err(duplicate("annotation group", &name, s));
                    }
                    annotations = Some(self.parse_annotations()?);
                }
                TokenKind::LParen => {
                    let s = self.current_span();
                    if enum_values.is_some() {
                        return Err(duplicate("enum list", &name, s));
                    }
                    enum_values = Some(self.parse_enum_list()?);
                }
                _ => break,
            }
        }

        // `as alias` only counts on the field's own line
        let alias = if self.peek_kind().is_ident("as") && self.current_span().line == span.line {
            self.advance();
            Some(self.expect_ident()?)
        } else {
            None
        };

        let ty = if self.check(&TokenKind::LBrace) {
            match &ty_name {
                None => {}
                Some((t, _)) if t == "object" => {}
                Some(_) => {
                    return Err(self.error_unexpected("a new field (only `object` takes an inline shape)"))
                }
            }
            let inline_span = self.current_span();
            let members = self.parse_inline_members()?;
            TypeExpr::Inline(members, inline_span)
        } else {
            match ty_name {
                Some((t, s)) => TypeExpr::Named(t, s),
                None => return Err(self.error_unexpected("a type or `{`")),
            }
        };

        Ok(FieldDef {
            name,
            optional,
            array,
            ty,
            annotations: annotations.unwrap_or_default(),
            enum_values,
            alias,
            description,
            span,
        })
    }

    fn parse_inline_members(&mut self) -> Result<Vec<Member>> {
        self.expect(TokenKind::LBrace)?;
        let mut members = Vec::new();
        while !self.check(&TokenKind::RBrace) {
            if self.check(&TokenKind::Ellipsis) {
                members.push(Member::Spread(self.parse_spread()?));
            } else {
                members.push(Member::Field(self.parse_field()?));
            }
        }
        self.expect(TokenKind::RBrace)?;
        Ok(members)
    }

    // Modifiers

    /// `<trim|!minLength:2|isEmail>`
    fn parse_annotations(&mut self) -> Result<Vec<Annotation>> {
        self.expect(TokenKind::LAngle)?;
        let mut out = Vec::new();
        loop {
            let span = self.current_span();
            let negated = if self.check(&TokenKind::Bang) {
                self.advance();
                true
            } else {
                false
            };
            let name = match self.peek_kind() {
                TokenKind::Ident(s) => {
                    self.advance();
                    s
                }
                _ => return Err(self.error_unexpected("a constraint name")),
            };
            let arg = if self.check(&TokenKind::Colon) {
                self.advance();
                match self.peek_kind() {
                    TokenKind::RawText(raw) => {
                        self.advance();
                        Some(raw)
                    }
                    _ => return Err(self.error_unexpected("a constraint argument")),
                }
            } else {
                None
            };
            out.push(Annotation {
                name,
                negated,
                arg,
                span,
            });
            if self.check(&TokenKind::Pipe) {
                self.advance();
                continue;
            }
            self.expect(TokenKind::RAngle)?;
            return Ok(out);
        }
    }

    /// `(a|b|c)`. Empty entries are kept as "" and rejected by the validator.
    fn parse_enum_list(&mut self) -> Result<EnumList> {
        let span = self.expect(TokenKind::LParen)?.span;
        let mut values = Vec::new();
        if self.check(&TokenKind::RParen) {
            self.advance();
            return Ok(EnumList { values, span });
        }
        loop {
            if let TokenKind::RawText(raw) = self.peek_kind() {
                self.advance();
                values.push(raw);
            } else {
                values.push(String::new());
            }
            match self.peek_kind() {
                TokenKind::Pipe => {
                    self.advance();
                }
                TokenKind::RParen => {
                    self.advance();
                    return Ok(EnumList { values, span });
                }
                _ => return Err(self.error_unexpected("`|` or `)`")),
            }
        }
    }

    // response.<tag> { ... }

    fn parse_response(&mut self) -> Result<ResponseBlock> {
        let span = self.advance().span;
        self.expect(TokenKind::Dot)?;
        let tag = self.expect_ident()?;
        self.expect(TokenKind::LBrace)?;

        let mut block = ResponseBlock {
            tag,
            http_code: None,
            status: None,
            message: None,
            data: Vec::new(),
            span,
        };
        let mut seen_data = false;
        while !self.check(&TokenKind::RBrace) {
            let key_span = self.current_span();
            let key = match self.peek_kind() {
                TokenKind::Ident(k) => k,
                _ => return Err(self.error_unexpected(RESPONSE_KEYS)),
            };
            match key.as_str() {
                "http" => {
                    self.advance();
                    self.expect(TokenKind::Dot)?;
                    if !self.peek_kind().is_ident("code") {
                        return Err(self.error_unexpected("`code`"));
                    }
                    self.advance();
                    let code_span = self.current_span();
                    let code = match self.peek_kind() {
                        TokenKind::IntLit(n) => {
                            self.advance();
                            n
                        }
                        _ => return Err(self.error_unexpected("an integer status code")),
                    };
                    if block.http_code.is_some() {
                        return Err(duplicate("`http.code`", &block.tag, key_span));
                    }
                    block.http_code = Some((code, code_span));
                }
                "status" => {
                    self.advance();
                    let status = match self.peek_kind() {
                        TokenKind::Ident(s) | TokenKind::StringLit(s) => {
                            self.advance();
                            s
                        }
                        _ => return Err(self.error_unexpected("a status word")),
                    };
                    if block.status.is_some() {
                        return Err(duplicate("`status`", &block.tag, key_span));
                    }
                    block.status = Some(status);
                }
                "message" => {
                    self.advance();
                    let message = self.expect_string()?;
                    if block.message.is_some() {
                        return Err(duplicate("`message`", &block.tag, key_span));
                    }
                    block.message = Some(message);
                }
                "data" => {
                    self.advance();
                    if self.peek_kind().is_ident("object") {
                        self.advance();
                    }
                    let members = self.parse_inline_members()?;
                    if seen_data {
                        return Err(duplicate("`data`", &block.tag, key_span));
                    }
                    seen_data = true;
                    block.data = members;
                }
                _ => return Err(self.error_unexpected(RESPONSE_KEYS)),
            }
        }
        self.expect(TokenKind::RBrace)?;
        Ok(block)
    }

    // Token stream helpers

    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_kind(&self) -> TokenKind {
        self.peek().kind.clone()
    }

    fn peek_ahead_kind(&self, offset: usize) -> TokenKind {
        let idx = (self.pos + offset).min(self.tokens.len() - 1);
        self.tokens[idx].kind.clone()
    }

    fn current_span(&self) -> Span {
        self.peek().span
    }

    fn at_eof(&self) -> bool {
        matches!(self.peek_kind(), TokenKind::Eof)
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.peek_kind()) == std::mem::discriminant(kind)
    }

    fn advance(&mut self) -> Token {
        let tok = self.tokens[self.pos.min(self.tokens.len() - 1)].clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        tok
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token> {
        if self.check(&kind) {
            Ok(self.advance())
        } else {
            Err(Error::new(
                ErrorKind::UnexpectedToken {
                    expected: format!("{}", kind),
                    found: format!("{}", self.peek_kind()),
                },
                self.current_span(),
            ))
        }
    }

    fn expect_ident(&mut self) -> Result<String> {
        match self.peek_kind() {
            TokenKind::Ident(s) => {
                self.advance();
                Ok(s)
            }
            _ => Err(self.error_unexpected("an identifier")),
        }
    }

    fn expect_string(&mut self) -> Result<String> {
        match self.peek_kind() {
            TokenKind::StringLit(s) => {
                self.advance();
                Ok(s)
            }
            _ => Err(self.error_unexpected("a string literal")),
        }
    }

    fn error_unexpected(&self, expected: &str) -> Error {
        Error::new(
            ErrorKind::UnexpectedToken {
                expected: expected.to_string(),
                found: format!("{}", self.peek_kind()),
            },
            self.current_span(),
        )
    }
}

const ENDPOINT_ITEMS: &str = "`path`, `method`, `params`, `query`, `body` or `response.<tag>`";
const RESPONSE_KEYS: &str = "`http.code`, `status`, `message` or `data`";

fn duplicate(what: &str, owner: &str, span: Span) -> Error {
    Error::new(ErrorKind::Duplicate(format!("{what} in `{owner}`")), span)
}

fn is_uppercase_word(word: &str) -> bool {
    word.bytes().all(|b| b.is_ascii_uppercase())
}

/// Turn a `params { ... }` style field into a named endpoint section.
fn section_from_field(field: FieldDef) -> Result<(String, Section)> {
    let unexpected = |found: String| {
        Error::new(
            ErrorKind::UnexpectedToken {
                expected: ENDPOINT_ITEMS.to_string(),
                found,
            },
            field.span,
        )
    };
    if field.name == "method" {
        return Err(Error::new(
            ErrorKind::UnexpectedToken {
                expected: "an uppercase HTTP method".to_string(),
                found: match &field.ty {
                    TypeExpr::Named(t, _) => t.clone(),
                    TypeExpr::Inline(..) => "`{`".to_string(),
                },
            },
            field.ty.span(),
        ));
    }
    if !matches!(field.name.as_str(), "params" | "query" | "body") {
        return Err(unexpected(format!("field `{}`", field.name)));
    }
    let plain = !field.optional
        && !field.array
        && field.annotations.is_empty()
        && field.enum_values.is_none()
        && field.alias.is_none();
    match field.ty {
        TypeExpr::Inline(members, span) if plain => Ok((field.name, Section { members, span })),
        _ => Err(Error::new(
            ErrorKind::UnexpectedToken {
                expected: format!("an inline `{} {{ ... }}` section", field.name),
                found: format!("`{}` with a type or modifiers", field.name),
            },
            field.span,
        )),
    }
}

// Public convenience functions

/// Parse a spec source string into a SpecFile.
pub fn parse(source: &str) -> Result<SpecFile> {
    parse_with_file(source, FileId::default())
}

/// Parse a source string whose spans should point at `file`.
pub fn parse_with_file(source: &str, file: FileId) -> Result<SpecFile> {
    let tokens = crate::lexer::Lexer::with_file(source, file).tokenize()?;
    let mut parser = Parser::new(tokens);
    parser.parse_file()
}
