//! IrBuilder: lowers an annotated syntax tree into IR class units.
//!
//! Children are lowered before their parents and left to right, so the
//! order of the produced instructions follows source evaluation order.
//! Every intermediate value goes into a fresh temporary named from a
//! counter owned by the builder; one builder lowers one compilation run,
//! so names never repeat within a run.

mod expr;
mod stmt;
#[cfg(test)]
mod tests;

use log::debug;
use thiserror::Error;

use crate::ast::*;
use crate::ir::{AccessModifier, ClassUnit, Field, Instruction, Method};
use crate::span::Span;
use crate::symbols::{ClassSymbols, MethodSymbols, SymbolTable};
use crate::typecheck::Annotation;
use crate::types::Ty;

/// Internal faults of lowering. Semantic problems are reported by the
/// annotator before lowering starts, so any of these means the tree,
/// the table and the annotation disagree.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum LowerError {
    #[error("expression at {span} has no resolved type")]
    Unresolved { span: Span },
    #[error("call to '{method}' at {span} produces no value but is used as one")]
    VoidValue { method: String, span: Span },
    #[error("'{name}' at {span} does not name a variable")]
    UnknownVariable { name: String, span: Span },
    #[error("'{name}' at {span} cannot be indexed")]
    NotIndexable { name: String, span: Span },
    #[error("class '{0}' is missing from the symbol table")]
    MissingClass(String),
    #[error("method '{method}' of class '{class}' is missing from the symbol table")]
    MissingMethod { class: String, method: String },
}

impl LowerError {
    pub fn span(&self) -> Span {
        match self {
            LowerError::Unresolved { span }
            | LowerError::VoidValue { span, .. }
            | LowerError::UnknownVariable { span, .. }
            | LowerError::NotIndexable { span, .. } => *span,
            LowerError::MissingClass(_) | LowerError::MissingMethod { .. } => Span::dummy(),
        }
    }
}

// ─── IrBuilder ────────────────────────────────────────────────────

pub struct IrBuilder<'a> {
    pub(crate) table: &'a SymbolTable,
    pub(crate) annotation: &'a Annotation,
    /// Monotonic temporary counter.
    pub(crate) temp_counter: u32,
    /// Monotonic label counter.
    pub(crate) label_counter: u32,
    pub(crate) class: Option<&'a ClassSymbols>,
    pub(crate) method: Option<&'a MethodSymbols>,
    /// Set while lowering the expression of a `return` statement.
    pub(crate) in_return: bool,
}

impl<'a> IrBuilder<'a> {
    pub fn new(table: &'a SymbolTable, annotation: &'a Annotation) -> Self {
        Self {
            table,
            annotation,
            temp_counter: 0,
            label_counter: 0,
            class: None,
            method: None,
            in_return: false,
        }
    }

    /// Temporaries handed out so far.
    pub fn temps_issued(&self) -> u32 {
        self.temp_counter
    }

    // ═══════════════════════════════════════════════════════════════
    // ── Top-level entry: build_program ────────────────────────────
    // ═══════════════════════════════════════════════════════════════

    /// One class unit per declared class, each carrying the program's
    /// imports.
    pub fn build_program(&mut self, program: &Program) -> Result<Vec<ClassUnit>, LowerError> {
        let imports: Vec<String> = program.imports.iter().map(|i| i.node.clone()).collect();
        program
            .classes
            .iter()
            .map(|class| self.build_class(&imports, class))
            .collect()
    }

    pub fn build_class(&mut self, imports: &[String], class: &ClassDecl) -> Result<ClassUnit, LowerError> {
        let table = self.table;
        let symbols = table
            .class(&class.name.node)
            .ok_or_else(|| LowerError::MissingClass(class.name.node.clone()))?;
        self.class = Some(symbols);

        let fields = class
            .fields
            .iter()
            .map(|f| Field {
                name: f.name.node.clone(),
                ty: f.ty.node.clone(),
                access: AccessModifier::Public,
            })
            .collect();

        let mut methods = Vec::with_capacity(class.methods.len() + 1);
        for decl in &class.methods {
            methods.push(self.build_method(symbols, decl)?);
        }
        methods.push(Method::default_constructor(&class.name.node));

        self.class = None;
        debug!(
            "lowered class {} ({} methods, {} temporaries so far)",
            class.name.node,
            methods.len(),
            self.temp_counter
        );
        Ok(ClassUnit {
            imports: imports.to_vec(),
            name: class.name.node.clone(),
            super_name: class.super_name.as_ref().map(|s| s.node.clone()),
            fields,
            methods,
        })
    }

    fn build_method(&mut self, class: &'a ClassSymbols, decl: &MethodDecl) -> Result<Method, LowerError> {
        let symbols = class
            .method(&decl.name.node)
            .ok_or_else(|| LowerError::MissingMethod {
                class: class.name.clone(),
                method: decl.name.node.clone(),
            })?;
        self.method = Some(symbols);

        let mut method = Method::new(&decl.name.node, &class.name, decl.return_ty.node.clone());
        method.access = if decl.is_public {
            AccessModifier::Public
        } else {
            AccessModifier::Default
        };
        method.is_static = decl.is_static;
        method.params = symbols.params.clone();
        method.locals = symbols.locals.clone();

        for stmt in &decl.body {
            let code = self.lower_stmt(stmt)?;
            method.instructions.extend(code);
        }
        // Non-void bodies are known to end in a return.
        let returns = decl.body.last().is_some_and(|s| s.node.definitely_returns());
        if decl.return_ty.node == Ty::Void && !returns {
            method.instructions.push(Instruction::Return {
                ty: Ty::Void,
                operand: None,
            });
        }

        self.method = None;
        debug!(
            "lowered method {}.{}: {} instructions",
            class.name,
            decl.name.node,
            method.instructions.len()
        );
        Ok(method)
    }

    // ── Name generation ───────────────────────────────────────────

    pub(crate) fn fresh_temp(&mut self) -> String {
        let name = format!("tmp{}", self.temp_counter);
        self.temp_counter += 1;
        name
    }

    /// Suffix shared by the labels of one `if` or `while`.
    pub(crate) fn fresh_label_id(&mut self) -> u32 {
        let id = self.label_counter;
        self.label_counter += 1;
        id
    }

    /// Resolved type of an expression in a value position.
    pub(crate) fn type_of(&self, expr: &Expr) -> Result<Ty, LowerError> {
        self.annotation
            .type_of(expr)
            .cloned()
            .ok_or(LowerError::Unresolved { span: expr.span })
    }
}
