//! Type annotation: resolves a type for every expression node and
//! collects semantic diagnostics.
//!
//! The tree is never mutated. Resolved types live in a side table keyed by
//! `NodeId`; an expression whose type cannot be determined simply has no
//! entry. The pass never aborts: every problem becomes a `Diagnostic` and
//! checking continues with the next node.

mod expr;
mod stmt;
#[cfg(test)]
mod tests;

use std::collections::{BTreeMap, BTreeSet};

use log::debug;

use crate::ast::*;
use crate::diagnostic::Diagnostic;
use crate::span::Span;
use crate::symbols::{ClassSymbols, MethodSymbols, SymbolTable};
use crate::types::Ty;

/// Side table of resolved expression types.
pub type TypeMap = BTreeMap<NodeId, Ty>;

/// Result of annotating a program.
#[derive(Clone, Debug, Default)]
pub struct Annotation {
    pub types: TypeMap,
    /// In the order they were found.
    pub diagnostics: Vec<Diagnostic>,
}

impl Annotation {
    pub fn type_of(&self, expr: &Expr) -> Option<&Ty> {
        self.types.get(&expr.id)
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| !d.is_error())
    }
}

/// Annotate `program` against `table`. Always succeeds; inspect
/// `Annotation::diagnostics` for problems.
pub fn annotate(program: &Program, table: &SymbolTable) -> Annotation {
    TypeChecker::new(table).check_program(program)
}

/// Annotate and fail if any error was reported. Warnings stay in the
/// returned annotation.
pub fn check(program: &Program, table: &SymbolTable) -> Result<Annotation, Vec<Diagnostic>> {
    let annotation = annotate(program, table);
    if annotation.has_errors() {
        Err(annotation.diagnostics)
    } else {
        Ok(annotation)
    }
}

pub(crate) struct TypeChecker<'a> {
    pub(super) table: &'a SymbolTable,
    /// Symbols of the class being checked.
    pub(super) class: Option<&'a ClassSymbols>,
    /// Symbols of the method being checked.
    pub(super) method: Option<&'a MethodSymbols>,
    pub(super) in_static: bool,
    pub(super) types: TypeMap,
    /// Accumulated diagnostics.
    pub(super) diagnostics: Vec<Diagnostic>,
}

impl<'a> TypeChecker<'a> {
    pub(crate) fn new(table: &'a SymbolTable) -> Self {
        Self {
            table,
            class: None,
            method: None,
            in_static: false,
            types: TypeMap::new(),
            diagnostics: Vec::new(),
        }
    }

    pub(crate) fn check_program(mut self, program: &Program) -> Annotation {
        for class in &program.classes {
            self.check_class(class);
        }
        self.check_unused_imports(program);
        debug!(
            "annotated {} classes: {} typed nodes, {} diagnostics",
            program.classes.len(),
            self.types.len(),
            self.diagnostics.len()
        );
        Annotation {
            types: self.types,
            diagnostics: self.diagnostics,
        }
    }

    fn check_class(&mut self, class: &ClassDecl) {
        let table = self.table;
        let Some(symbols) = table.class(&class.name.node) else {
            self.error(
                format!("class '{}' is missing from the symbol table", class.name.node),
                class.name.span,
            );
            return;
        };
        self.class = Some(symbols);
        for method in &class.methods {
            self.check_method(symbols, method);
        }
        self.class = None;
    }

    fn check_method(&mut self, class: &'a ClassSymbols, method: &MethodDecl) {
        let Some(symbols) = class.method(&method.name.node) else {
            self.error(
                format!(
                    "method '{}' of class '{}' is missing from the symbol table",
                    method.name.node, class.name
                ),
                method.name.span,
            );
            return;
        };
        self.method = Some(symbols);
        self.in_static = method.is_static;

        for stmt in &method.body {
            self.check_stmt(stmt);
        }

        let declared = &method.return_ty.node;
        let returns = method.body.last().is_some_and(|s| s.node.definitely_returns());
        if *declared != Ty::Void && !returns {
            self.error_with_help(
                format!(
                    "method '{}' must return a value of type {}",
                    method.name.node, declared
                ),
                method.name.span,
                "end the body with a `return`, or an `if`/`else` whose branches both return"
                    .to_string(),
            );
        }

        self.method = None;
        self.in_static = false;
    }

    // --- Assignability ---

    /// Whether a value of type `from` may be stored where `to` is expected.
    pub(super) fn is_assignable(&self, from: &Ty, to: &Ty) -> bool {
        if from == to {
            return true;
        }
        match (from, to) {
            (Ty::Class(sub), Ty::Class(sup)) => {
                let extends = self.class.is_some_and(|c| {
                    c.name == *sub && c.super_name.as_deref() == Some(sup.as_str())
                });
                extends || (self.table.is_imported(sub) && self.table.is_imported(sup))
            }
            _ => false,
        }
    }

    /// Names that may appear bare without being variables: imported
    /// classes, the current class and its superclass.
    pub(super) fn is_class_name(&self, name: &str) -> bool {
        self.table.is_imported(name)
            || self
                .class
                .is_some_and(|c| c.name == name || c.super_name.as_deref() == Some(name))
    }

    // --- Unused imports ---

    fn check_unused_imports(&mut self, program: &Program) {
        let mut used = BTreeSet::new();
        for class in &program.classes {
            if let Some(sup) = &class.super_name {
                used.insert(sup.node.clone());
            }
            let decl_tys = class
                .fields
                .iter()
                .map(|f| &f.ty.node)
                .chain(class.methods.iter().flat_map(|m| {
                    std::iter::once(&m.return_ty.node).chain(m.params.iter().map(|p| &p.ty.node))
                }));
            for ty in decl_tys {
                collect_class_names(ty, &mut used);
            }
            for method in &class.methods {
                for stmt in &method.body {
                    collect_used_names(&stmt.node, &mut used);
                }
            }
        }
        for import in &program.imports {
            let short = import.node.rsplit('.').next().unwrap_or(&import.node);
            if !used.contains(short) {
                self.warning(format!("unused import '{}'", import.node), import.span);
            }
        }
    }

    // --- Diagnostics ---

    pub(super) fn error(&mut self, msg: String, span: Span) {
        self.diagnostics.push(Diagnostic::error(msg, span));
    }

    pub(super) fn error_with_help(&mut self, msg: String, span: Span, help: String) {
        self.diagnostics
            .push(Diagnostic::error(msg, span).with_help(help));
    }

    pub(super) fn warning(&mut self, msg: String, span: Span) {
        self.diagnostics.push(Diagnostic::warning(msg, span));
    }
}

fn collect_class_names(ty: &Ty, used: &mut BTreeSet<String>) {
    match ty {
        Ty::Class(name) => {
            used.insert(name.clone());
        }
        Ty::Array(elem) => collect_class_names(elem, used),
        Ty::Int | Ty::Bool | Ty::Str | Ty::Void => {}
    }
}

fn collect_used_names(stmt: &Stmt, used: &mut BTreeSet<String>) {
    fn walk(expr: &Expr, used: &mut BTreeSet<String>) {
        match &expr.kind {
            ExprKind::Var(name) => {
                used.insert(name.clone());
            }
            ExprKind::NewObject(name) => {
                used.insert(name.node.clone());
            }
            _ => {}
        }
        for child in expr.children() {
            walk(child, used);
        }
    }

    match stmt {
        Stmt::VarDecl(decl) => collect_class_names(&decl.ty.node, used),
        Stmt::Block(stmts) => {
            for s in stmts {
                collect_used_names(&s.node, used);
            }
        }
        Stmt::If {
            cond,
            then_branch,
            else_branch,
        } => {
            walk(cond, used);
            collect_used_names(&then_branch.node, used);
            if let Some(e) = else_branch {
                collect_used_names(&e.node, used);
            }
        }
        Stmt::While { cond, body } => {
            walk(cond, used);
            collect_used_names(&body.node, used);
        }
        Stmt::Expr(e) | Stmt::Assign { value: e, .. } => walk(e, used),
        Stmt::ArrayAssign { index, value, .. } => {
            walk(index, used);
            walk(value, used);
        }
        Stmt::Return(e) => {
            if let Some(e) = e {
                walk(e, used);
            }
        }
    }
}
