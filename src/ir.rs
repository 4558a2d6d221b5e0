// IR: the fully resolved program handed to code generators
//
// Every spread is expanded, every annotation is a typed Constraint and every
// name is checked. Maps are IndexMaps so iteration and JSON output follow
// declaration order (root file first), which keeps the output byte-for-byte
// stable between runs.
//
// The IR is built once by `lower` and never mutated afterwards.

use std::fmt;
use std::path::PathBuf;

use indexmap::IndexMap;
use serde::Serialize;

use crate::constraint::Constraint;

// Types

/// Base type of a field value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ScalarType {
    String,
    Number,
    Boolean,
    Object,
    Any,
    /// Reference to another entity by name.
    Entity(String),
}

impl ScalarType {
    pub fn primitive(name: &str) -> Option<ScalarType> {
        Some(match name {
            "string" => ScalarType::String,
            "number" => ScalarType::Number,
            "boolean" => ScalarType::Boolean,
            "object" => ScalarType::Object,
            "any" => ScalarType::Any,
            _ => return None,
        })
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarType::String => write!(f, "string"),
            ScalarType::Number => write!(f, "number"),
            ScalarType::Boolean => write!(f, "boolean"),
            ScalarType::Object => write!(f, "object"),
            ScalarType::Any => write!(f, "any"),
            ScalarType::Entity(name) => write!(f, "{name}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Cardinality {
    Single,
    Optional,
    Array,
    OptionalArray,
}

impl Cardinality {
    pub fn new(optional: bool, array: bool) -> Self {
        match (optional, array) {
            (false, false) => Cardinality::Single,
            (true, false) => Cardinality::Optional,
            (false, true) => Cardinality::Array,
            (true, true) => Cardinality::OptionalArray,
        }
    }

    pub fn is_optional(self) -> bool {
        matches!(self, Cardinality::Optional | Cardinality::OptionalArray)
    }

    pub fn is_array(self) -> bool {
        matches!(self, Cardinality::Array | Cardinality::OptionalArray)
    }

    fn suffix(self) -> &'static str {
        match self {
            Cardinality::Single => "",
            Cardinality::Optional => "?",
            Cardinality::Array => "[]",
            Cardinality::OptionalArray => "[]?",
        }
    }
}

/// Structure of a field value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "of", rename_all = "camelCase")]
pub enum FieldShape {
    Scalar(ScalarType),
    Object(Vec<FieldSpec>),
    /// Array field; the element shape is never itself an array.
    Array(Box<FieldShape>),
}

// Fields

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldSpec {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    pub cardinality: Cardinality,
    pub shape: FieldShape,
    pub constraints: Vec<Constraint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl FieldSpec {
    /// Type of the value, or of each element for arrays.
    pub fn base_type(&self) -> ScalarType {
        let mut shape = &self.shape;
        loop {
            match shape {
                FieldShape::Scalar(t) => return t.clone(),
                FieldShape::Object(_) => return ScalarType::Object,
                FieldShape::Array(inner) => shape = inner.as_ref(),
            }
        }
    }

    /// Nested fields of an object field or of an array of objects.
    pub fn children(&self) -> &[FieldSpec] {
        match &self.shape {
            FieldShape::Object(fields) => fields,
            FieldShape::Array(inner) => match inner.as_ref() {
                FieldShape::Object(fields) => fields,
                _ => &[],
            },
            FieldShape::Scalar(_) => &[],
        }
    }

    pub fn is_optional(&self) -> bool {
        self.cardinality.is_optional()
    }

    pub fn is_array(&self) -> bool {
        self.cardinality.is_array()
    }

    /// Whether a constraint with this canonical name is present.
    pub fn has_constraint(&self, name: &str) -> bool {
        self.constraints.iter().any(|c| c.name() == name)
    }
}

// Declarations

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceLocation {
    pub file: PathBuf,
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file.display(), self.line, self.column)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityDecl {
    pub name: String,
    pub source: SourceLocation,
    pub fields: Vec<FieldSpec>,
}

impl EntityDecl {
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Patch,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn parse(verb: &str) -> Option<HttpMethod> {
        Some(match verb {
            "GET" => HttpMethod::Get,
            "POST" => HttpMethod::Post,
            "PATCH" => HttpMethod::Patch,
            "PUT" => HttpMethod::Put,
            "DELETE" => HttpMethod::Delete,
            _ => return None,
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseDecl {
    pub tag: String,
    pub http_code: u16,
    pub status: String,
    pub message: String,
    pub data: Vec<FieldSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EndpointDecl {
    pub name: String,
    pub source: SourceLocation,
    pub path: String,
    /// `:segment` names of the path, in order.
    pub path_params: Vec<String>,
    pub method: HttpMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Vec<FieldSpec>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<Vec<FieldSpec>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Vec<FieldSpec>>,
    pub responses: IndexMap<String, ResponseDecl>,
}

/// `:id` style segments of a URL path.
pub fn path_params(path: &str) -> Vec<String> {
    path.split('/')
        .filter_map(|seg| seg.strip_prefix(':'))
        .map(str::to_string)
        .collect()
}

// Program

/// Everything one root file compiles to.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IrProgram {
    pub entities: IndexMap<String, EntityDecl>,
    pub endpoints: IndexMap<String, EndpointDecl>,
}

impl IrProgram {
    pub fn entity(&self, name: &str) -> Option<&EntityDecl> {
        self.entities.get(name)
    }

    pub fn endpoint(&self, name: &str) -> Option<&EndpointDecl> {
        self.endpoints.get(name)
    }

    /// Pretty JSON; stable for identical input.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Human-readable listing for debugging.
    pub fn dump(&self) -> String {
        let mut out = format!(
            "=== IrProgram ({} entities, {} endpoints) ===\n",
            self.entities.len(),
            self.endpoints.len()
        );
        for entity in self.entities.values() {
            out.push_str(&format!("entity {} @ {}\n", entity.name, entity.source));
            dump_fields(&mut out, &entity.fields, 1);
        }
        for ep in self.endpoints.values() {
            out.push_str(&format!(
                "endpoint {} {} {} @ {}\n",
                ep.name, ep.method, ep.path, ep.source
            ));
            for (label, section) in [("params", &ep.params), ("query", &ep.query), ("body", &ep.body)] {
                if let Some(fields) = section {
                    out.push_str(&format!("  {label}:\n"));
                    dump_fields(&mut out, fields, 2);
                }
            }
            for resp in ep.responses.values() {
                out.push_str(&format!(
                    "  response.{} {} {} \"{}\"\n",
                    resp.tag, resp.http_code, resp.status, resp.message
                ));
                dump_fields(&mut out, &resp.data, 2);
            }
        }
        out
    }
}

fn dump_fields(out: &mut String, fields: &[FieldSpec], depth: usize) {
    let pad = "  ".repeat(depth);
    for field in fields {
        let constraints: Vec<String> = field.constraints.iter().map(|c| c.to_string()).collect();
        out.push_str(&format!(
            "{pad}{}{} {}",
            field.name,
            field.cardinality.suffix(),
            field.base_type()
        ));
        if !constraints.is_empty() {
            out.push_str(&format!(" <{}>", constraints.join("|")));
        }
        if let Some(alias) = &field.alias {
            out.push_str(&format!(" as {alias}"));
        }
        out.push('\n');
        dump_fields(out, field.children(), depth + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_params() {
        assert_eq!(path_params("/profiles/:id/posts/:post_id"), vec!["id", "post_id"]);
        assert!(path_params("/profiles").is_empty());
    }

    #[test]
    fn test_base_type_of_array() {
        let field = FieldSpec {
            name: "tags".into(),
            alias: None,
            cardinality: Cardinality::Array,
            shape: FieldShape::Array(Box::new(FieldShape::Scalar(ScalarType::String))),
            constraints: vec![],
            description: None,
        };
        assert_eq!(field.base_type(), ScalarType::String);
        assert!(field.is_array());
        assert!(!field.is_optional());
    }
}
