// Lowering: composed AST -> IR
//
// This module transforms a validated ComposedUnit into an IrProgram. The
// lowering pass:
//
//   1. Emits entities and endpoints in closure order (root file first,
//      source order inside a file); field groups are dropped
//   2. Resolves each field's type into a FieldShape, wrapping arrays
//   3. Turns the enum list and `<...>` annotations into Constraints, enum
//      first, then annotations in source order
//   4. Extracts `:param` segments from endpoint paths
//
// ERRORS: lowering runs after validation, so the only failures left are
// inputs that skipped it. They surface as Error::msg rather than panics.

use indexmap::IndexMap;

use crate::ast::{Declaration, EndpointDecl as AstEndpoint, FieldDef, Member, Section, ShapeDecl, TypeExpr};
use crate::config::CompileOptions;
use crate::constraint::{Constraint, ConstraintKind};
use crate::error::{Error, Result};
use crate::ir::*;
use crate::resolve::{ComposedUnit, DeclKind};
use crate::source::FileId;
use crate::token::Span;

/// Lower a composed, validated unit into the IR.
pub fn lower(unit: &ComposedUnit, options: &CompileOptions) -> Result<IrProgram> {
    let mut ctx = LowerCtx::new(unit, options);
    ctx.lower_unit()?;
    Ok(ctx.ir)
}

// Lowering context

struct LowerCtx<'a> {
    unit: &'a ComposedUnit,
    options: &'a CompileOptions,
    ir: IrProgram,
}

impl<'a> LowerCtx<'a> {
    fn new(unit: &'a ComposedUnit, options: &'a CompileOptions) -> Self {
        Self {
            unit,
            options,
            ir: IrProgram::default(),
        }
    }

    fn lower_unit(&mut self) -> Result<()> {
        for decl in &self.unit.decls {
            match (decl.kind, &decl.decl) {
                (DeclKind::Entity, Declaration::Shape(shape)) => {
                    let entity = self.lower_entity(decl.file, shape)?;
                    self.ir.entities.insert(entity.name.clone(), entity);
                }
                (DeclKind::Endpoint, Declaration::Endpoint(ep)) => {
                    let endpoint = self.lower_endpoint(decl.file, ep)?;
                    self.ir.endpoints.insert(endpoint.name.clone(), endpoint);
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn location(&self, span: Span) -> SourceLocation {
        SourceLocation {
            file: self
                .unit
                .sources
                .path(span.file)
                .map(|p| p.to_path_buf())
                .unwrap_or_default(),
            line: span.line,
            column: span.col,
        }
    }

    // Entities

    fn lower_entity(&self, file: FileId, shape: &ShapeDecl) -> Result<EntityDecl> {
        Ok(EntityDecl {
            name: shape.name.clone(),
            source: self.location(shape.span),
            fields: self.lower_members(file, &shape.members)?,
        })
    }

    fn lower_members(&self, file: FileId, members: &[Member]) -> Result<Vec<FieldSpec>> {
        members
            .iter()
            .filter_map(|m| match m {
                Member::Field(f) => Some(self.lower_field(file, f)),
                Member::Spread(_) => None,
            })
            .collect()
    }

    fn lower_field(&self, file: FileId, field: &FieldDef) -> Result<FieldSpec> {
        let element = match &field.ty {
            TypeExpr::Inline(members, _) => FieldShape::Object(self.lower_members(file, members)?),
            TypeExpr::Named(name, span) => FieldShape::Scalar(self.resolve_type(file, name, *span)?),
        };
        let shape = if field.array {
            FieldShape::Array(Box::new(element))
        } else {
            element
        };

        let mut constraints = Vec::new();
        if let Some(list) = &field.enum_values {
            constraints.push(Constraint::new(ConstraintKind::Enum {
                values: list.values.clone(),
            }));
        }
        for ann in &field.annotations {
            let constraint = Constraint::from_annotation(
                &ann.name,
                ann.arg.as_deref(),
                ann.negated,
                self.options.case_insensitive_constraints,
            )
            .map_err(|kind| Error::msg(kind.to_string()).at(ann.span))?;
            constraints.push(constraint);
        }

        Ok(FieldSpec {
            name: field.name.clone(),
            alias: field.alias.clone(),
            cardinality: Cardinality::new(field.optional, field.array),
            shape,
            constraints,
            description: field
                .description
                .clone()
                .filter(|_| self.options.keep_descriptions),
        })
    }

    fn resolve_type(&self, file: FileId, name: &str, span: Span) -> Result<ScalarType> {
        if let Some(t) = ScalarType::primitive(name) {
            return Ok(t);
        }
        match self.unit.lookup(file, name) {
            Some(decl) if decl.kind == DeclKind::Entity => Ok(ScalarType::Entity(name.to_string())),
            _ => Err(Error::msg(format!("unknown type `{name}`")).at(span)),
        }
    }

    // Endpoints

    fn lower_endpoint(&self, file: FileId, ep: &AstEndpoint) -> Result<EndpointDecl> {
        let missing = |what: &str| Error::msg(format!("endpoint `{}` has no valid {what}", ep.name)).at(ep.span);

        let path = ep.path.as_ref().map(|(p, _)| p.clone()).ok_or_else(|| missing("path"))?;
        let method = ep
            .method
            .as_ref()
            .and_then(|(m, _)| HttpMethod::parse(m))
            .ok_or_else(|| missing("method"))?;

        let section = |s: &Option<Section>| -> Result<Option<Vec<FieldSpec>>> {
            s.as_ref()
                .map(|s| self.lower_members(file, &s.members))
                .transpose()
        };

        let mut responses = IndexMap::new();
        for resp in &ep.responses {
            let http_code = resp
                .http_code
                .and_then(|(c, _)| u16::try_from(c).ok())
                .ok_or_else(|| missing("http.code"))?;
            responses.insert(
                resp.tag.clone(),
                ResponseDecl {
                    tag: resp.tag.clone(),
                    http_code,
                    status: resp.status.clone().unwrap_or_default(),
                    message: resp.message.clone().unwrap_or_default(),
                    data: self.lower_members(file, &resp.data)?,
                },
            );
        }

        Ok(EndpointDecl {
            name: ep.name.clone(),
            source: self.location(ep.span),
            path_params: path_params(&path),
            path,
            method,
            params: section(&ep.params)?,
            query: section(&ep.query)?,
            body: section(&ep.body)?,
            responses,
        })
    }
}
