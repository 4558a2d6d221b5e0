// AST: abstract syntax tree for spec files
//
// Every node in the AST corresponds to a production in the grammar.
// The AST is purely syntactic: spread targets and entity types are kept as
// opaque names, and whether a shape is an entity or a field group is only
// decided by the resolver.
//
// DESIGN: Every node stores a Span for error reporting back to the user.

use crate::source::FileId;
use crate::token::Span;

// File

/// One parsed spec file: imports and declarations in source order.
#[derive(Debug, Clone)]
pub struct SpecFile {
    pub file: FileId,
    pub imports: Vec<ImportStmt>,
    pub declarations: Vec<Declaration>,
}

impl SpecFile {
    pub fn declaration(&self, name: &str) -> Option<&Declaration> {
        self.declarations.iter().find(|d| d.name() == name)
    }
}

/// `import ../commons.go`
#[derive(Debug, Clone)]
pub struct ImportStmt {
    pub path: String,
    pub span: Span,
}

// Declarations

#[derive(Debug, Clone)]
pub enum Declaration {
    Shape(ShapeDecl),
    Endpoint(EndpointDecl),
}

impl Declaration {
    pub fn name(&self) -> &str {
        match self {
            Declaration::Shape(s) => &s.name,
            Declaration::Endpoint(e) => &e.name,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Declaration::Shape(s) => s.span,
            Declaration::Endpoint(e) => e.span,
        }
    }
}

/// `Mood { ... }`: an entity or a field group, decided during composition.
#[derive(Debug, Clone)]
pub struct ShapeDecl {
    pub name: String,
    pub members: Vec<Member>,
    pub span: Span,
}

/// An item inside a shape body.
#[derive(Debug, Clone)]
pub enum Member {
    Field(FieldDef),
    Spread(Spread),
}

/// `...common` or `...Profile.settings.theme`
#[derive(Debug, Clone)]
pub struct Spread {
    pub path: Vec<String>,
    pub span: Span,
}

impl Spread {
    /// Declaration name the spread starts from.
    pub fn target(&self) -> &str {
        self.path.first().map(String::as_str).unwrap_or_default()
    }

    pub fn dotted(&self) -> String {
        self.path.join(".")
    }
}

/// `name[]? string<trim|minLength:2>(a|b) as alias // description`
#[derive(Debug, Clone)]
pub struct FieldDef {
    pub name: String,
    pub optional: bool,
    pub array: bool,
    pub ty: TypeExpr,
    pub annotations: Vec<Annotation>,
    pub enum_values: Option<EnumList>,
    pub alias: Option<String>,
    pub description: Option<String>,
    pub span: Span,
}

/// Declared type of a field.
#[derive(Debug, Clone)]
pub enum TypeExpr {
    /// A primitive or an entity name.
    Named(String, Span),
    /// `{ ... }` nested shape, with or without a leading `object`.
    Inline(Vec<Member>, Span),
}

impl TypeExpr {
    pub fn span(&self) -> Span {
        match self {
            TypeExpr::Named(_, s) | TypeExpr::Inline(_, s) => *s,
        }
    }
}

/// One entry of a `<...>` group: `!minLength:2`
#[derive(Debug, Clone)]
pub struct Annotation {
    pub name: String,
    pub negated: bool,
    pub arg: Option<String>,
    pub span: Span,
}

/// `(light|dark)`
#[derive(Debug, Clone)]
pub struct EnumList {
    pub values: Vec<String>,
    pub span: Span,
}

// Endpoints

/// A block with `path`, `method` and `response.*` entries.
#[derive(Debug, Clone)]
pub struct EndpointDecl {
    pub name: String,
    pub path: Option<(String, Span)>,
    pub method: Option<(String, Span)>,
    pub params: Option<Section>,
    pub query: Option<Section>,
    pub body: Option<Section>,
    pub responses: Vec<ResponseBlock>,
    pub span: Span,
}

/// `params { ... }`, `query { ... }` or `body { ... }`
#[derive(Debug, Clone)]
pub struct Section {
    pub members: Vec<Member>,
    pub span: Span,
}

/// `response.ok { http.code 200 status successful message "..." data { ... } }`
#[derive(Debug, Clone)]
pub struct ResponseBlock {
    pub tag: String,
    pub http_code: Option<(i64, Span)>,
    pub status: Option<String>,
    pub message: Option<String>,
    pub data: Vec<Member>,
    pub span: Span,
}
