//! Public entry points: annotate, lower and emit a whole program.

pub mod input;

#[cfg(test)]
mod tests;

use std::path::PathBuf;

use log::debug;
use thiserror::Error;

use crate::ast::Program;
use crate::diagnostic::{Diagnostic, Stage};
use crate::ir::builder::{IrBuilder, LowerError};
use crate::ir::lower::{EmitError, JasminEmitter, ResourceLimits};
use crate::ir::ClassUnit;
use crate::span::Span;
use crate::symbols::SymbolTable;
use crate::typecheck::{self, Annotation};

pub use input::{load_input, CompilationInput};

/// Options controlling compilation.
#[derive(Clone, Debug, Default)]
pub struct CompileOptions {
    /// Header values written into every emitted method.
    pub limits: ResourceLimits,
    /// Keep the IR text of each class in the output.
    pub print_ir: bool,
}

impl CompileOptions {
    pub fn with_limits(mut self, limits: ResourceLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_print_ir(mut self, print_ir: bool) -> Self {
        self.print_ir = print_ir;
        self
    }
}

/// Every way a compilation request can fail.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("{} semantic error(s)", .0.iter().filter(|d| d.is_error()).count())]
    Semantic(Vec<Diagnostic>),
    #[error("lowering failed: {0}")]
    Lower(#[from] LowerError),
    #[error("emission failed: {0}")]
    Emit(#[from] EmitError),
    #[error("cannot read '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid input bundle: {0}")]
    Json(#[from] serde_json::Error),
}

impl CompileError {
    /// Flatten into diagnostics for uniform reporting.
    pub fn to_diagnostics(&self) -> Vec<Diagnostic> {
        match self {
            CompileError::Semantic(diagnostics) => diagnostics.clone(),
            CompileError::Lower(e) => {
                vec![Diagnostic::error(e.to_string(), e.span()).in_stage(Stage::Lowering)]
            }
            CompileError::Emit(e) => {
                vec![Diagnostic::error(e.to_string(), Span::dummy()).in_stage(Stage::Emission)]
            }
            CompileError::Io { .. } | CompileError::Json(_) => {
                vec![Diagnostic::error(self.to_string(), Span::dummy())]
            }
        }
    }
}

/// Output of one class.
#[derive(Clone, Debug)]
pub struct CompiledClass {
    pub name: String,
    /// IR text, present when `CompileOptions::print_ir` is set.
    pub ir: Option<String>,
    pub assembly: String,
}

#[derive(Clone, Debug)]
pub struct CompileOutput {
    /// In declaration order.
    pub classes: Vec<CompiledClass>,
    /// Non-fatal diagnostics from annotation.
    pub warnings: Vec<Diagnostic>,
}

impl CompileOutput {
    /// All assembly blocks joined by a blank line.
    pub fn assembly(&self) -> String {
        self.classes
            .iter()
            .map(|c| c.assembly.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Annotate only. Fails if any semantic error was reported.
///
/// Types are keyed by `NodeId`, so every entry point expects a tree with
/// unique ids: one built with `AstBuilder`, loaded through
/// `CompilationInput`, or renumbered with `Program::assign_node_ids`.
pub fn check(program: &Program, table: &SymbolTable) -> Result<Annotation, CompileError> {
    debug_assert!(
        program.has_unique_node_ids(),
        "expression ids are not unique; call Program::assign_node_ids first"
    );
    typecheck::check(program, table).map_err(CompileError::Semantic)
}

/// Annotate and lower to IR class units. Same id precondition as `check`.
pub fn lower(program: &Program, table: &SymbolTable) -> Result<Vec<ClassUnit>, CompileError> {
    let annotation = check(program, table)?;
    let units = IrBuilder::new(table, &annotation).build_program(program)?;
    Ok(units)
}

/// Compile to assembly with default options. Same id precondition as
/// `check`.
pub fn compile(program: &Program, table: &SymbolTable) -> Result<CompileOutput, CompileError> {
    compile_with_options(program, table, &CompileOptions::default())
}

pub fn compile_with_options(
    program: &Program,
    table: &SymbolTable,
    options: &CompileOptions,
) -> Result<CompileOutput, CompileError> {
    let annotation = check(program, table)?;
    let units = IrBuilder::new(table, &annotation).build_program(program)?;

    let mut classes = Vec::with_capacity(units.len());
    for unit in &units {
        let assembly = JasminEmitter::new(unit)
            .with_limits(options.limits)
            .build()?
            .to_string();
        classes.push(CompiledClass {
            name: unit.name.clone(),
            ir: options.print_ir.then(|| unit.to_string()),
            assembly,
        });
    }
    debug!("compiled {} classes", classes.len());

    Ok(CompileOutput {
        classes,
        warnings: annotation.warnings().cloned().collect(),
    })
}

/// Compile a loaded input bundle.
pub fn compile_input(input: &CompilationInput, options: &CompileOptions) -> Result<CompileOutput, CompileError> {
    compile_with_options(&input.program, &input.symbols(), options)
}
