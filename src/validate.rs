// Validation: semantic checks on the composed unit
//
// Validation catches what the parser and resolver cannot:
//
//   1. Types: every field type is a primitive or a visible entity
//   2. Constraints: known names, well-formed arguments, fitting the type
//   3. Enum lists: at least one value, no empty or repeated values
//   4. Bounds: a lower bound never above its upper bound
//   5. Shapes: unique field names, at most one identifier field per entity
//   6. Endpoints: path, method, path parameters and responses
//
// Nothing stops at the first problem. Every check pushes onto one Vec<Issue>
// and the caller gets them all. A group spread into several entities would
// report its own problems once per entity, so identical issues at the same
// location collapse into one. A duplicate field also keys on where the name
// first appeared: an entity's own field clashing with a group field is a
// separate problem in every entity that does it.

use std::collections::{HashMap, HashSet};

use thiserror::Error;
use tracing::debug;

use crate::ast::{Declaration, EndpointDecl, FieldDef, Member, TypeExpr};
use crate::config::CompileOptions;
use crate::constraint::{Constraint, ConstraintKind};
use crate::ir::{path_params, HttpMethod, ScalarType};
use crate::resolve::{ComposedUnit, DeclKind};
use crate::source::FileId;
use crate::token::Span;

// Public API

/// Validate every entity and endpoint. Returns all issues found.
pub fn validate(unit: &ComposedUnit, options: &CompileOptions) -> Result<(), Vec<Issue>> {
    let mut issues = Vec::new();

    for decl in &unit.decls {
        let scope = Scope {
            unit,
            file: decl.file,
            options,
        };
        match (&decl.kind, &decl.decl) {
            (DeclKind::Entity, Declaration::Shape(shape)) => {
                check_members(scope, &shape.members, &shape.name, &mut issues);
                check_identifiers(scope, &shape.members, &shape.name, shape.span, &mut issues);
            }
            (DeclKind::Endpoint, Declaration::Endpoint(ep)) => check_endpoint(scope, ep, &mut issues),
            // Groups are checked where they are spliced in.
            _ => {}
        }
    }

    let issues = dedup(issues);
    debug!(issues = issues.len(), "validation finished");
    if issues.is_empty() {
        Ok(())
    } else {
        Err(issues)
    }
}

// Issues

/// A problem found during composition or validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub kind: IssueKind,
    /// Dotted path to the offending element, e.g. `Mood.settings.theme`.
    pub context: String,
    pub span: Span,
    /// Earlier location the issue collides with, if any.
    pub related: Option<Span>,
}

impl Issue {
    pub fn new(kind: IssueKind, context: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            context: context.into(),
            span,
            related: None,
        }
    }

    pub fn with_related(mut self, span: Span) -> Self {
        self.related = Some(span);
        self
    }

    /// Two issues with the same key describe one problem.
    pub fn key(&self) -> (Span, Option<Span>, &IssueKind) {
        (self.span, self.related, &self.kind)
    }
}

impl std::fmt::Display for Issue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.context, self.kind)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Error)]
pub enum IssueKind {
    #[error("cannot spread `{name}`: {reason}")]
    UnknownGroup { name: String, reason: String },
    #[error("spread cycle: {}", .chain.join(" -> "))]
    SpreadCycle { chain: Vec<String> },
    #[error("unknown type `{name}`{}", type_hint(.found))]
    UnknownType { name: String, found: Option<String> },
    #[error("constraint `{constraint}` does not apply to type `{ty}`")]
    TypeMismatch { constraint: String, ty: String },
    #[error("duplicate field `{name}`")]
    DuplicateField { name: String },
    #[error("more than one identifier field: {}", .names.join(", "))]
    MultipleIdentifiers { names: Vec<String> },
    #[error("`{name}` is already declared at {first}")]
    DuplicateDeclaration { name: String, first: String },
    #[error("unknown constraint `{name}`")]
    UnknownConstraint { name: String },
    #[error("malformed `{name}`: {reason}")]
    MalformedAnnotation { name: String, reason: String },
    #[error("path parameter `:{param}` in `{path}` has no matching field in `params`")]
    PathParamMismatch { param: String, path: String },
    #[error("endpoint declares no `response.<tag>` block")]
    MissingResponse,
    #[error("{reason}")]
    InvalidEndpoint { reason: String },
}

fn type_hint(found: &Option<String>) -> String {
    match found {
        Some(kind) => format!(" (it is {kind}, not an entity)"),
        None => String::new(),
    }
}

fn dedup(issues: Vec<Issue>) -> Vec<Issue> {
    let mut seen = HashSet::new();
    issues
        .into_iter()
        .filter(|i| seen.insert((i.span, i.related, i.kind.clone())))
        .collect()
}

// Shapes and fields

#[derive(Clone, Copy)]
struct Scope<'a> {
    unit: &'a ComposedUnit,
    file: FileId,
    options: &'a CompileOptions,
}

fn check_members(scope: Scope<'_>, members: &[Member], context: &str, issues: &mut Vec<Issue>) {
    let mut seen: HashMap<&str, Span> = HashMap::new();
    for member in members {
        // Spreads are gone after composition; a failed one was already reported.
        let Member::Field(field) = member else { continue };
        if let Some(first) = seen.get(field.name.as_str()) {
            issues.push(
                Issue::new(
                    IssueKind::DuplicateField {
                        name: field.name.clone(),
                    },
                    context,
                    field.span,
                )
                .with_related(*first),
            );
        } else {
            seen.insert(&field.name, field.span);
        }
        check_field(scope, field, &format!("{context}.{}", field.name), issues);
    }
}

fn check_identifiers(
    scope: Scope<'_>,
    members: &[Member],
    context: &str,
    span: Span,
    issues: &mut Vec<Issue>,
) {
    let names: Vec<String> = members
        .iter()
        .filter_map(|m| match m {
            Member::Field(f) if scope.options.identifier_fields.contains(&f.name) => Some(f.name.clone()),
            _ => None,
        })
        .collect();
    let mut distinct = names.clone();
    distinct.sort();
    distinct.dedup();
    if distinct.len() > 1 {
        issues.push(Issue::new(IssueKind::MultipleIdentifiers { names }, context, span));
    }
}

/// Resolve the declared base type of a field. None after reporting.
fn resolve_type(scope: Scope<'_>, field: &FieldDef, context: &str, issues: &mut Vec<Issue>) -> Option<ScalarType> {
    match &field.ty {
        TypeExpr::Inline(..) => Some(ScalarType::Object),
        TypeExpr::Named(name, span) => {
            if let Some(t) = ScalarType::primitive(name) {
                return Some(t);
            }
            let found = match scope.unit.lookup(scope.file, name) {
                Some(decl) if decl.kind == DeclKind::Entity => return Some(ScalarType::Entity(name.clone())),
                Some(decl) if decl.kind == DeclKind::FieldGroup => Some("a field group".to_string()),
                Some(_) => Some("an endpoint".to_string()),
                None => None,
            };
            issues.push(Issue::new(
                IssueKind::UnknownType {
                    name: name.clone(),
                    found,
                },
                context,
                *span,
            ));
            None
        }
    }
}

fn check_field(scope: Scope<'_>, field: &FieldDef, context: &str, issues: &mut Vec<Issue>) {
    let base = resolve_type(scope, field, context, issues);

    if let TypeExpr::Inline(members, _) = &field.ty {
        check_members(scope, members, context, issues);
    }

    let mut constraints: Vec<(Constraint, Span)> = Vec::new();

    if let Some(list) = &field.enum_values {
        check_enum_values(&list.values, context, list.span, issues);
        if let Some(ty) = &base {
            if *ty != ScalarType::String {
                issues.push(Issue::new(
                    IssueKind::TypeMismatch {
                        constraint: "enum".to_string(),
                        ty: ty.to_string(),
                    },
                    context,
                    list.span,
                ));
            }
        }
    }

    for ann in &field.annotations {
        let parsed = Constraint::from_annotation(
            &ann.name,
            ann.arg.as_deref(),
            ann.negated,
            scope.options.case_insensitive_constraints,
        );
        let constraint = match parsed {
            Ok(c) => c,
            Err(kind) => {
                issues.push(Issue::new(kind, context, ann.span));
                continue;
            }
        };
        if constraints.iter().any(|(c, _)| c.name() == constraint.name()) {
            issues.push(Issue::new(
                IssueKind::MalformedAnnotation {
                    name: constraint.name().to_string(),
                    reason: "given more than once".to_string(),
                },
                context,
                ann.span,
            ));
            continue;
        }
        if let Some(ty) = &base {
            if !constraint.accepts(ty) {
                issues.push(Issue::new(
                    IssueKind::TypeMismatch {
                        constraint: constraint.name().to_string(),
                        ty: ty.to_string(),
                    },
                    context,
                    ann.span,
                ));
            }
        }
        constraints.push((constraint, ann.span));
    }

    check_bounds(&constraints, context, issues);
}

fn check_enum_values(values: &[String], context: &str, span: Span, issues: &mut Vec<Issue>) {
    let malformed = |reason: String| {
        Issue::new(
            IssueKind::MalformedAnnotation {
                name: "enum".to_string(),
                reason,
            },
            context,
            span,
        )
    };
    if values.is_empty() {
        issues.push(malformed("needs at least one value".to_string()));
        return;
    }
    if values.iter().any(String::is_empty) {
        issues.push(malformed("contains an empty value".to_string()));
    }
    let mut seen = HashSet::new();
    for v in values.iter().filter(|v| !v.is_empty()) {
        if !seen.insert(v.as_str()) {
            issues.push(malformed(format!("repeats `{v}`")));
        }
    }
}

/// Lower bounds must not exceed upper bounds. Negated checks are skipped.
fn check_bounds(constraints: &[(Constraint, Span)], context: &str, issues: &mut Vec<Issue>) {
    let find = |name: &str| {
        constraints
            .iter()
            .find(|(c, _)| !c.negated && c.name() == name)
    };
    let value = |c: &Constraint| match c.kind {
        ConstraintKind::MinLength { value } | ConstraintKind::MaxLength { value } => value as f64,
        ConstraintKind::Min { value } | ConstraintKind::Max { value } => value,
        _ => 0.0,
    };

    for (lower, upper) in [("minLength", "maxLength"), ("min", "max")] {
        if let (Some((lo, _)), Some((hi, span))) = (find(lower), find(upper)) {
            if value(lo) > value(hi) {
                issues.push(bound_issue(upper, &format!("{lower} is above {upper}"), context, *span));
            }
        }
    }
    for (c, span) in constraints.iter().filter(|(c, _)| !c.negated) {
        if let Some((lo, hi)) = c.bounds() {
            if lo > hi {
                issues.push(bound_issue(c.name(), "first bound is above the second", context, *span));
            }
        }
    }
}

fn bound_issue(name: &str, reason: &str, context: &str, span: Span) -> Issue {
    Issue::new(
        IssueKind::MalformedAnnotation {
            name: name.to_string(),
            reason: reason.to_string(),
        },
        context,
        span,
    )
}

// Endpoints

fn check_endpoint(scope: Scope<'_>, ep: &EndpointDecl, issues: &mut Vec<Issue>) {
    let ctx = ep.name.as_str();
    let invalid = |reason: String, span: Span| Issue::new(IssueKind::InvalidEndpoint { reason }, ctx, span);

    match &ep.path {
        None => issues.push(invalid("endpoint has no `path`".to_string(), ep.span)),
        Some((path, span)) if !path.starts_with('/') => {
            issues.push(invalid(format!("path `{path}` must start with `/`"), *span));
        }
        Some((path, span)) => {
            let declared: HashSet<&str> = ep
                .params
                .iter()
                .flat_map(|s| &s.members)
                .filter_map(|m| match m {
                    Member::Field(f) => Some(f.name.as_str()),
                    Member::Spread(_) => None,
                })
                .collect();
            for param in path_params(path) {
                if !declared.contains(param.as_str()) {
                    issues.push(Issue::new(
                        IssueKind::PathParamMismatch {
                            param,
                            path: path.clone(),
                        },
                        ctx,
                        *span,
                    ));
                }
            }
        }
    }

    match &ep.method {
        None => issues.push(invalid("endpoint has no `method`".to_string(), ep.span)),
        Some((verb, span)) if HttpMethod::parse(verb).is_none() => {
            issues.push(invalid(
                format!("unsupported method `{verb}`, expected GET, POST, PATCH, PUT or DELETE"),
                *span,
            ));
        }
        Some(_) => {}
    }

    for (label, section) in [("params", &ep.params), ("query", &ep.query), ("body", &ep.body)] {
        if let Some(section) = section {
            check_members(scope, &section.members, &format!("{ctx}.{label}"), issues);
        }
    }

    if ep.responses.is_empty() {
        issues.push(Issue::new(IssueKind::MissingResponse, ctx, ep.span));
    }
    for resp in &ep.responses {
        let rctx = format!("{ctx}.response.{}", resp.tag);
        match resp.http_code {
            None => issues.push(invalid(format!("`response.{}` has no `http.code`", resp.tag), resp.span)),
            Some((code, span)) if !(100..=599).contains(&code) => {
                issues.push(invalid(format!("http.code {code} is outside 100..=599"), span));
            }
            Some(_) => {}
        }
        if resp.status.is_none() {
            issues.push(invalid(format!("`response.{}` has no `status`", resp.tag), resp.span));
        }
        if resp.message.is_none() {
            issues.push(invalid(format!("`response.{}` has no `message`", resp.tag), resp.span));
        }
        check_members(scope, &resp.data, &rctx, issues);
    }
}
