//! # vsl-ir
//!
//! Parser, resolver, validator and IR for the VSL data-model and endpoint
//! spec language.
//!
//! This crate handles the full pipeline:
//
//   spec text ──► Lexer ──► Tokens ──► Parser ──► SpecFile
//        │
//        └─ imports ──► Resolver (closure + spreads) ──► ComposedUnit
//                            ──► Validator ──► Lowering ──► IrProgram
//
// The SpecFile is a faithful, unresolved view of one file. The IrProgram is
// the resolved, checked, ordered view of a root file and its imports, ready
// for model, validator and router generators.
//
// USAGE:
//   // Compile a root file and everything it imports:
//   let out = vsl_ir::compile("spec/data/mood.go");
//   match out.into_result() {
//       Ok(ir) => println!("{}", ir.to_json()?),
//       Err(diags) => for d in diags { eprintln!("{d}") },
//   }
//
//   // Or just parse one file:
//   let file = vsl_ir::parse(source_text)?;

pub mod ast;
pub mod compile;
pub mod config;
pub mod constraint;
pub mod diagnostic;
pub mod error;
pub mod ir;
pub mod lexer;
pub mod loader;
pub mod lower;
pub mod parser;
pub mod resolve;
pub mod source;
pub mod token;
pub mod validate;

pub use ast::SpecFile;
pub use compile::{compile, compile_all, compile_with, Compilation};
pub use config::CompileOptions;
pub use diagnostic::{Diagnostic, DiagnosticKind};
pub use error::{Error, Result};
pub use ir::IrProgram;
pub use loader::{FsLoader, MemoryLoader, SourceLoader};
pub use lower::lower;
pub use parser::parse;
pub use validate::validate;
