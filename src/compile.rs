// Driver: runs the whole pipeline for one root file
//
//   load_closure -> compose -> validate -> lower
//
// Fatal errors from loading (unreadable files, lex/parse failures, import
// cycles) stop the run before composition. Composition and validation
// issues are gathered together. Any diagnostic at all means no IR.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::CompileOptions;
use crate::diagnostic::Diagnostic;
use crate::ir::IrProgram;
use crate::loader::{FsLoader, SourceLoader};
use crate::lower::lower;
use crate::resolve::{compose, load_closure};
use crate::source::SourceMap;
use crate::validate::validate;

/// Outcome of compiling one root: the IR, or the reasons there is none.
#[derive(Debug)]
pub struct Compilation {
    pub root: PathBuf,
    pub ir: Option<IrProgram>,
    pub diagnostics: Vec<Diagnostic>,
    /// Every file read during the run, for rendering diagnostics.
    pub sources: SourceMap,
}

impl Compilation {
    pub fn is_ok(&self) -> bool {
        self.ir.is_some() && self.diagnostics.is_empty()
    }

    pub fn into_result(self) -> Result<IrProgram, Vec<Diagnostic>> {
        match self.ir {
            Some(ir) if self.diagnostics.is_empty() => Ok(ir),
            _ => Err(self.diagnostics),
        }
    }

    /// All diagnostics, each with the offending source line.
    pub fn report(&self) -> String {
        self.diagnostics
            .iter()
            .map(|d| d.render(&self.sources))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Compile a root file from disk with default options.
pub fn compile(root: impl AsRef<Path>) -> Compilation {
    compile_with(root.as_ref(), &FsLoader, &CompileOptions::default())
}

/// Compile a root file through `loader`.
pub fn compile_with(root: &Path, loader: &dyn SourceLoader, options: &CompileOptions) -> Compilation {
    let graph = load_closure(root, loader);
    if !graph.is_ok() {
        let diagnostics = graph
            .errors
            .iter()
            .map(|e| Diagnostic::from_error(e, &graph.sources, root))
            .collect::<Vec<_>>();
        debug!(root = %root.display(), diagnostics = diagnostics.len(), "compilation failed while loading");
        return Compilation {
            root: root.to_path_buf(),
            ir: None,
            diagnostics,
            sources: graph.sources,
        };
    }

    let (unit, mut issues) = compose(&graph);
    if let Err(found) = validate(&unit, options) {
        for issue in found {
            if !issues.iter().any(|i| i.key() == issue.key()) {
                issues.push(issue);
            }
        }
    }

    let mut diagnostics: Vec<Diagnostic> = issues
        .iter()
        .map(|i| Diagnostic::from_issue(i, &unit.sources))
        .collect();

    let ir = if diagnostics.is_empty() {
        match lower(&unit, options) {
            Ok(ir) => Some(ir),
            Err(e) => {
                diagnostics.push(Diagnostic::from_error(&e, &unit.sources, root));
                None
            }
        }
    } else {
        None
    };

    debug!(
        root = %root.display(),
        files = unit.sources.len(),
        entities = ir.as_ref().map_or(0, |ir| ir.entities.len()),
        endpoints = ir.as_ref().map_or(0, |ir| ir.endpoints.len()),
        diagnostics = diagnostics.len(),
        "compilation finished"
    );

    Compilation {
        root: root.to_path_buf(),
        ir,
        diagnostics,
        sources: unit.sources,
    }
}

/// Compile independent roots one after another.
pub fn compile_all<P: AsRef<Path>>(
    roots: &[P],
    loader: &dyn SourceLoader,
    options: &CompileOptions,
) -> Vec<Compilation> {
    roots
        .iter()
        .map(|r| compile_with(r.as_ref(), loader, options))
        .collect()
}
