// Resolver: import closure and field-group composition
//
// Two phases:
//
//   1. load_closure: walk the import graph from a root file. Traversal is a
//      depth-first search on an explicit stack with gray (on the stack) and
//      black (finished) marks; an import that reaches a gray file is a cycle,
//      reported with the full chain `[A, B, A]`. Unreadable imports and files
//      that fail to lex or parse are recorded and the walk carries on, so a
//      run reports every fatal error of the unit at once.
//
//   2. compose: splice field groups into the shapes that spread them. Every
//      shape is expanded once (memoized) and copied into each spread site, so
//      two entities spreading the same group never share field values.
//      A declaration spread whole (`...common`) becomes a field group and is
//      not emitted; a path spread (`...Profile.settings`) only borrows the
//      nested shape.
//
// Name lookup is per file: the file itself first, then its transitive
// imports in discovery order. The first match wins.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use tracing::{debug, trace, warn};

use crate::ast::{Declaration, EndpointDecl, FieldDef, Member, Section, ShapeDecl, SpecFile, Spread, TypeExpr};
use crate::error::{Error, ErrorKind};
use crate::loader::{normalize, SourceLoader};
use crate::parser::parse_with_file;
use crate::source::{FileId, SourceMap};
use crate::token::Span;
use crate::validate::{Issue, IssueKind};

// Phase 1: import closure

/// Every file reachable from a root, in discovery order (root first).
#[derive(Debug, Default)]
pub struct ImportGraph {
    pub sources: SourceMap,
    /// Parsed files by FileId; None when the file failed to lex or parse.
    pub files: Vec<Option<SpecFile>>,
    /// Direct imports of each file, in source order.
    pub edges: Vec<Vec<FileId>>,
    /// Fatal errors: unreadable files, parse failures, import cycles.
    pub errors: Vec<Error>,
}

impl ImportGraph {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn file(&self, id: FileId) -> Option<&SpecFile> {
        self.files.get(id.0 as usize).and_then(Option::as_ref)
    }

    /// Paths of the closure in discovery order.
    pub fn paths(&self) -> Vec<PathBuf> {
        self.sources.iter().map(|(_, f)| f.path.clone()).collect()
    }

    /// The file itself, then everything it transitively imports, by
    /// discovery order.
    pub fn visible_from(&self, id: FileId) -> Vec<FileId> {
        let mut seen = HashSet::from([id]);
        let mut todo = vec![id];
        while let Some(f) = todo.pop() {
            for &next in self.edges.get(f.0 as usize).into_iter().flatten() {
                if seen.insert(next) {
                    todo.push(next);
                }
            }
        }
        let mut rest: Vec<FileId> = seen.into_iter().filter(|f| *f != id).collect();
        rest.sort();
        let mut out = vec![id];
        out.extend(rest);
        out
    }

    fn add(&mut self, path: PathBuf, text: String) -> FileId {
        let parsed = parse_with_file(&text, FileId(self.sources.len() as u32)).map_err(|err| {
            let line = err.span.and_then(|s| text.lines().nth(s.line.saturating_sub(1)));
            match line {
                Some(line) => err.with_source_line(line),
                None => err,
            }
        });
        let id = self.sources.add(path, text);
        match parsed {
            Ok(file) => {
                debug!(
                    file = %self.sources.path(id).unwrap_or(Path::new("")).display(),
                    imports = file.imports.len(),
                    declarations = file.declarations.len(),
                    "parsed spec file"
                );
                self.files.push(Some(file));
            }
            Err(err) => {
                self.files.push(None);
                self.errors.push(err);
            }
        }
        self.edges.push(Vec::new());
        id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Gray,
    Black,
}

struct Frame {
    file: FileId,
    next_import: usize,
}

/// Load `root` and everything it imports.
pub fn load_closure(root: &Path, loader: &dyn SourceLoader) -> ImportGraph {
    let mut graph = ImportGraph::default();
    let root = normalize(root);
    let text = match loader.load(&root) {
        Ok(text) => text,
        Err(e) => {
            graph.errors.push(Error::without_span(ErrorKind::Io {
                path: root,
                message: e.to_string(),
            }));
            return graph;
        }
    };

    let root_id = graph.add(root, text);
    let mut marks: HashMap<FileId, Mark> = HashMap::from([(root_id, Mark::Gray)]);
    let mut stack = vec![Frame {
        file: root_id,
        next_import: 0,
    }];

    while let Some(top) = stack.last_mut() {
        let file = top.file;
        let Some(import) = graph
            .file(file)
            .and_then(|f| f.imports.get(top.next_import))
            .cloned()
        else {
            marks.insert(file, Mark::Black);
            stack.pop();
            continue;
        };
        top.next_import += 1;

        let from = graph.sources.path(file).map(Path::to_path_buf).unwrap_or_default();
        let target = loader.resolve(&from, &import.path);
        trace!(from = %from.display(), target = %target.display(), "import");

        if let Some(existing) = graph.sources.find(&target) {
            let edges = &mut graph.edges[file.0 as usize];
            if !edges.contains(&existing) {
                edges.push(existing);
            }
            if marks.get(&existing) == Some(&Mark::Gray) {
                let start = stack.iter().position(|f| f.file == existing).unwrap_or(0);
                let mut chain: Vec<PathBuf> = stack[start..]
                    .iter()
                    .filter_map(|f| graph.sources.path(f.file).map(Path::to_path_buf))
                    .collect();
                chain.push(target);
                let err = Error::new(ErrorKind::ImportCycle { chain }, import.span);
                warn!("{}", err.kind);
                graph.errors.push(err);
            }
            continue;
        }

        match loader.load(&target) {
            Ok(text) => {
                let id = graph.add(target, text);
                graph.edges[file.0 as usize].push(id);
                marks.insert(id, Mark::Gray);
                stack.push(Frame {
                    file: id,
                    next_import: 0,
                });
            }
            Err(e) => {
                warn!(target = %target.display(), "missing import");
                graph.errors.push(Error::new(
                    ErrorKind::Io {
                        path: target,
                        message: e.to_string(),
                    },
                    import.span,
                ));
            }
        }
    }

    debug!(files = graph.sources.len(), errors = graph.errors.len(), "import closure loaded");
    graph
}

// Phase 2: composition

/// How a declaration ends up in the IR.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKind {
    Entity,
    FieldGroup,
    Endpoint,
}

/// A declaration with all spreads expanded.
#[derive(Debug, Clone)]
pub struct ComposedDecl {
    pub file: FileId,
    pub kind: DeclKind,
    pub decl: Declaration,
}

impl ComposedDecl {
    pub fn name(&self) -> &str {
        self.decl.name()
    }
}

/// The whole unit after composition, ready for validation and lowering.
#[derive(Debug)]
pub struct ComposedUnit {
    pub sources: SourceMap,
    /// Declarations in closure order (root file first, source order within
    /// a file). Same-file duplicates are dropped after the first.
    pub decls: Vec<ComposedDecl>,
    visible: Vec<Vec<FileId>>,
    index: HashMap<(FileId, String), usize>,
}

impl ComposedUnit {
    /// Resolve `name` as seen from a file.
    pub fn lookup(&self, from: FileId, name: &str) -> Option<&ComposedDecl> {
        let files = self.visible.get(from.0 as usize)?;
        files.iter().find_map(|f| {
            self.index
                .get(&(*f, name.to_string()))
                .map(|&i| &self.decls[i])
        })
    }

    pub fn entities(&self) -> impl Iterator<Item = &ComposedDecl> {
        self.decls.iter().filter(|d| d.kind == DeclKind::Entity)
    }

    pub fn endpoints(&self) -> impl Iterator<Item = &ComposedDecl> {
        self.decls.iter().filter(|d| d.kind == DeclKind::Endpoint)
    }
}

type DeclKey = (FileId, String);

struct Composer<'g> {
    graph: &'g ImportGraph,
    visible: Vec<Vec<FileId>>,
    expanded: HashMap<DeclKey, Vec<Member>>,
    in_progress: Vec<DeclKey>,
    groups: HashSet<DeclKey>,
    issues: Vec<Issue>,
}

/// Expand spreads and classify declarations. Expects a graph without fatal
/// errors; files that failed to parse are skipped.
pub fn compose(graph: &ImportGraph) -> (ComposedUnit, Vec<Issue>) {
    let visible = (0..graph.sources.len() as u32)
        .map(|i| graph.visible_from(FileId(i)))
        .collect();
    let mut ctx = Composer {
        graph,
        visible,
        expanded: HashMap::new(),
        in_progress: Vec::new(),
        groups: HashSet::new(),
        issues: Vec::new(),
    };

    let mut staged: Vec<(FileId, Declaration)> = Vec::new();
    for (idx, file) in graph.files.iter().enumerate() {
        let Some(file) = file else { continue };
        let fid = FileId(idx as u32);
        let mut seen: HashMap<&str, Span> = HashMap::new();
        for decl in &file.declarations {
            if let Some(first) = seen.get(decl.name()) {
                let first = ctx.location(*first);
                ctx.issues.push(Issue::new(
                    IssueKind::DuplicateDeclaration {
                        name: decl.name().to_string(),
                        first,
                    },
                    decl.name(),
                    decl.span(),
                ));
                continue;
            }
            seen.insert(decl.name(), decl.span());
            let composed = match decl {
                Declaration::Shape(shape) => Declaration::Shape(ShapeDecl {
                    name: shape.name.clone(),
                    members: ctx.expanded_shape(fid, shape),
                    span: shape.span,
                }),
                Declaration::Endpoint(ep) => Declaration::Endpoint(ctx.expand_endpoint(fid, ep)),
            };
            staged.push((fid, composed));
        }
    }

    let mut decls = Vec::with_capacity(staged.len());
    let mut index = HashMap::new();
    let mut emitted: IndexMap<String, Span> = IndexMap::new();
    for (file, decl) in staged {
        let key = (file, decl.name().to_string());
        let kind = match &decl {
            Declaration::Endpoint(_) => DeclKind::Endpoint,
            Declaration::Shape(_) if ctx.groups.contains(&key) => DeclKind::FieldGroup,
            Declaration::Shape(_) => DeclKind::Entity,
        };
        if kind != DeclKind::FieldGroup {
            if let Some(first) = emitted.get(decl.name()) {
                let first = ctx.location(*first);
                ctx.issues.push(Issue::new(
                    IssueKind::DuplicateDeclaration {
                        name: decl.name().to_string(),
                        first,
                    },
                    decl.name(),
                    decl.span(),
                ));
            } else {
                emitted.insert(decl.name().to_string(), decl.span());
            }
        }
        trace!(name = decl.name(), ?kind, "classified declaration");
        index.insert(key, decls.len());
        decls.push(ComposedDecl { file, kind, decl });
    }

    debug!(
        declarations = decls.len(),
        groups = ctx.groups.len(),
        issues = ctx.issues.len(),
        "composition finished"
    );
    let unit = ComposedUnit {
        sources: graph.sources.clone(),
        decls,
        visible: ctx.visible,
        index,
    };
    (unit, ctx.issues)
}

impl<'g> Composer<'g> {
    fn location(&self, span: Span) -> String {
        let path = self
            .graph
            .sources
            .path(span.file)
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        format!("{path}:{}:{}", span.line, span.col)
    }

    fn lookup(&self, from: FileId, name: &str) -> Option<(FileId, &'g Declaration)> {
        let graph = self.graph;
        self.visible
            .get(from.0 as usize)?
            .iter()
            .find_map(|&f| graph.file(f)?.declaration(name).map(|d| (f, d)))
    }

    /// Members of a shape with every spread expanded. Memoized per declaration.
    fn expanded_shape(&mut self, file: FileId, shape: &ShapeDecl) -> Vec<Member> {
        let key = (file, shape.name.clone());
        if let Some(done) = self.expanded.get(&key) {
            return done.clone();
        }
        self.in_progress.push(key.clone());
        let members = self.expand_members(file, &shape.members, &shape.name);
        self.in_progress.pop();
        self.expanded.insert(key, members.clone());
        members
    }

    fn expand_endpoint(&mut self, file: FileId, ep: &EndpointDecl) -> EndpointDecl {
        let mut out = ep.clone();
        let sections = [
            (&mut out.params, "params"),
            (&mut out.query, "query"),
            (&mut out.body, "body"),
        ];
        for (section, label) in sections {
            if let Some(Section { members, .. }) = section {
                let context = format!("{}.{label}", ep.name);
                *members = self.expand_members(file, members, &context);
            }
        }
        for response in &mut out.responses {
            let context = format!("{}.response.{}", ep.name, response.tag);
            response.data = self.expand_members(file, &response.data, &context);
        }
        out
    }

    fn expand_members(&mut self, file: FileId, members: &[Member], context: &str) -> Vec<Member> {
        let mut out = Vec::with_capacity(members.len());
        for member in members {
            match member {
                Member::Field(field) => out.push(Member::Field(self.expand_field(file, field, context))),
                Member::Spread(spread) => {
                    if let Some(spliced) = self.resolve_spread(file, spread, context) {
                        out.extend(spliced);
                    }
                }
            }
        }
        out
    }

    fn expand_field(&mut self, file: FileId, field: &FieldDef, context: &str) -> FieldDef {
        let mut out = field.clone();
        if let TypeExpr::Inline(members, _) = &mut out.ty {
            let nested = format!("{context}.{}", field.name);
            *members = self.expand_members(file, members, &nested);
        }
        out
    }

    /// Fields a spread contributes, or None after recording why it failed.
    fn resolve_spread(&mut self, file: FileId, spread: &Spread, context: &str) -> Option<Vec<Member>> {
        let unknown = |reason: &str| {
            Issue::new(
                IssueKind::UnknownGroup {
                    name: spread.dotted(),
                    reason: reason.to_string(),
                },
                context,
                spread.span,
            )
        };

        let Some((target_file, decl)) = self.lookup(file, spread.target()) else {
            self.issues.push(unknown("no such declaration is visible here"));
            return None;
        };
        let Declaration::Shape(shape) = decl else {
            self.issues.push(unknown("endpoints cannot be spread"));
            return None;
        };

        let key = (target_file, shape.name.clone());
        if let Some(start) = self.in_progress.iter().position(|k| *k == key) {
            let mut chain: Vec<String> = self.in_progress[start..].iter().map(|k| k.1.clone()).collect();
            chain.push(shape.name.clone());
            warn!(chain = %chain.join(" -> "), "spread cycle");
            self.issues.push(Issue::new(IssueKind::SpreadCycle { chain }, context, spread.span));
            return None;
        }

        let members = self.expanded_shape(target_file, shape);
        if spread.path.len() == 1 {
            self.groups.insert(key);
            return Some(members);
        }

        let mut current = members;
        for segment in &spread.path[1..] {
            let nested = current.into_iter().find_map(|m| match m {
                Member::Field(FieldDef {
                    name,
                    ty: TypeExpr::Inline(inner, _),
                    ..
                }) if name == *segment => Some(inner),
                _ => None,
            });
            match nested {
                Some(inner) => current = inner,
                None => {
                    let reason = format!("`{segment}` is not a nested shape");
                    self.issues.push(unknown(&reason));
                    return None;
                }
            }
        }
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::MemoryLoader;

    #[test]
    fn test_visible_order() {
        let loader = MemoryLoader::new()
            .with_file("root.go", "import a.go\nimport b.go\nR { x string }")
            .with_file("a.go", "import c.go\nA { x string }")
            .with_file("b.go", "B { x string }")
            .with_file("c.go", "C { x string }");
        let graph = load_closure(Path::new("root.go"), &loader);
        assert!(graph.is_ok());
        let names: Vec<_> = graph.paths();
        assert_eq!(
            names,
            vec![
                PathBuf::from("root.go"),
                PathBuf::from("a.go"),
                PathBuf::from("c.go"),
                PathBuf::from("b.go"),
            ]
        );
        assert_eq!(graph.visible_from(FileId(0)), vec![FileId(0), FileId(1), FileId(2), FileId(3)]);
        assert_eq!(graph.visible_from(FileId(1)), vec![FileId(1), FileId(2)]);
        assert_eq!(graph.visible_from(FileId(3)), vec![FileId(3)]);
    }

    #[test]
    fn test_diamond_loads_once() {
        let loader = MemoryLoader::new()
            .with_file("root.go", "import a.go\nimport b.go")
            .with_file("a.go", "import c.go")
            .with_file("b.go", "import c.go")
            .with_file("c.go", "C { x string }");
        let graph = load_closure(Path::new("root.go"), &loader);
        assert!(graph.is_ok());
        assert_eq!(graph.sources.len(), 4);
    }

    #[test]
    fn test_self_import_is_cycle() {
        let loader = MemoryLoader::new().with_file("a.go", "import a.go");
        let graph = load_closure(Path::new("a.go"), &loader);
        match &graph.errors[0].kind {
            ErrorKind::ImportCycle { chain } => {
                assert_eq!(chain, &vec![PathBuf::from("a.go"), PathBuf::from("a.go")]);
            }
            other => panic!("expected cycle, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_root() {
        let graph = load_closure(Path::new("nope.go"), &MemoryLoader::new());
        assert!(matches!(graph.errors[0].kind, ErrorKind::Io { .. }));
        assert!(graph.errors[0].span.is_none());
    }

    #[test]
    fn test_parse_error_keeps_source_line() {
        let loader = MemoryLoader::new().with_file("a.go", "A {\n  x string<trim\n}");
        let graph = load_closure(Path::new("a.go"), &loader);
        assert_eq!(graph.errors.len(), 1);
        assert_eq!(graph.errors[0].source_line.as_deref(), Some("  x string<trim"));
        assert!(graph.file(FileId(0)).is_none());
    }

    #[test]
    fn test_group_classification() {
        let loader = MemoryLoader::new().with_file(
            "a.go",
            "common { created number }\nMood { emoji string ...common }\nLone { x string }",
        );
        let (unit, issues) = compose(&load_closure(Path::new("a.go"), &loader));
        assert!(issues.is_empty(), "{issues:?}");
        let kinds: Vec<_> = unit.decls.iter().map(|d| (d.name(), d.kind)).collect();
        assert_eq!(
            kinds,
            vec![
                ("common", DeclKind::FieldGroup),
                ("Mood", DeclKind::Entity),
                ("Lone", DeclKind::Entity),
            ]
        );
        assert_eq!(unit.lookup(FileId(0), "Mood").map(|d| d.kind), Some(DeclKind::Entity));
    }
}
