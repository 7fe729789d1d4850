//! JSON input bundles: a parsed program, its symbol table, and optionally
//! the source text the spans refer to.

use std::borrow::Cow;
use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};

use super::CompileError;
use crate::ast::Program;
use crate::symbols::SymbolTable;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CompilationInput {
    pub program: Program,
    /// Derived from the program when absent.
    #[serde(default)]
    pub symbols: Option<SymbolTable>,
    /// Source text for rendering diagnostics.
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
}

impl CompilationInput {
    pub fn new(mut program: Program) -> Self {
        program.assign_node_ids();
        Self {
            program,
            symbols: None,
            source: None,
            filename: None,
        }
    }

    pub fn with_symbols(mut self, symbols: SymbolTable) -> Self {
        self.symbols = Some(symbols);
        self
    }

    pub fn with_source(mut self, filename: &str, source: &str) -> Self {
        self.filename = Some(filename.to_string());
        self.source = Some(source.to_string());
        self
    }

    /// Parse a bundle and number its expression nodes.
    pub fn from_json(text: &str) -> Result<Self, CompileError> {
        let mut input: CompilationInput = serde_json::from_str(text)?;
        let nodes = input.program.assign_node_ids();
        debug!(
            "loaded {} classes, {} expression nodes",
            input.program.classes.len(),
            nodes
        );
        Ok(input)
    }

    /// The bundled table, or one derived from the declarations.
    pub fn symbols(&self) -> Cow<'_, SymbolTable> {
        match &self.symbols {
            Some(table) => Cow::Borrowed(table),
            None => Cow::Owned(SymbolTable::from_program(&self.program)),
        }
    }

    /// Name used when reporting diagnostics.
    pub fn display_name<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.filename.as_deref().unwrap_or(fallback)
    }
}

/// Read and parse a bundle from disk.
pub fn load_input(path: &Path) -> Result<CompilationInput, CompileError> {
    let text = std::fs::read_to_string(path).map_err(|source| CompileError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    CompilationInput::from_json(&text)
}
