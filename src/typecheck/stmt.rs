//! Statement annotation: conditions, assignments, returns.

use crate::ast::*;
use crate::span::{Span, Spanned};
use crate::types::Ty;

use super::TypeChecker;

impl<'a> TypeChecker<'a> {
    pub(super) fn check_stmt(&mut self, stmt: &Spanned<Stmt>) {
        match &stmt.node {
            Stmt::VarDecl(_) => {}
            Stmt::Block(stmts) => {
                for s in stmts {
                    self.check_stmt(s);
                }
            }
            Stmt::If {
                cond,
                then_branch,
                else_branch,
            } => {
                self.check_condition(cond, "if");
                self.check_stmt(then_branch);
                if let Some(else_branch) = else_branch {
                    self.check_stmt(else_branch);
                }
            }
            Stmt::While { cond, body } => {
                self.check_condition(cond, "while");
                self.check_stmt(body);
            }
            Stmt::Expr(expr) => {
                let ty = self.check_expr(expr);
                if ty.is_none() && matches!(expr.kind, ExprKind::Call { .. }) {
                    // A call whose result is discarded needs no value type.
                    self.adopt(expr, &Ty::Void);
                }
            }
            Stmt::Assign { target, value } => {
                let Some(target_ty) = self.check_target(&target.node, target.span) else {
                    self.check_expr(value);
                    return;
                };
                if let Some(value_ty) = self.check_expected(value, &target_ty) {
                    if !self.is_assignable(&value_ty, &target_ty) {
                        self.error(
                            format!(
                                "cannot assign {} to '{}' of type {}",
                                value_ty, target.node, target_ty
                            ),
                            stmt.span.merge(value.span),
                        );
                    }
                }
            }
            Stmt::ArrayAssign {
                target,
                index,
                value,
            } => self.check_array_assign(target, index, value),
            Stmt::Return(value) => self.check_return(value.as_ref(), stmt.span),
        }
    }

    /// Conditions of `if` and `while` must be boolean.
    fn check_condition(&mut self, cond: &Expr, keyword: &str) {
        match self.check_expr(cond) {
            Some(Ty::Bool) => {}
            Some(other) => self.error_with_help(
                format!("{} condition must be boolean, found {}", keyword, other),
                cond.span,
                "compare with `<` or combine with `&&`".to_string(),
            ),
            None => self.error(
                format!("type of {} condition could not be determined", keyword),
                cond.span,
            ),
        }
    }

    /// Resolve an assignment target to its declared type.
    fn check_target(&mut self, name: &str, span: Span) -> Option<Ty> {
        let (Some(class), Some(method)) = (self.class, self.method) else {
            return None;
        };
        match class.resolve(method, name) {
            Some(binding) => {
                if binding.is_field() && self.in_static {
                    self.error(
                        format!("field '{}' cannot be assigned in a static method", name),
                        span,
                    );
                }
                Some(binding.ty().clone())
            }
            None => {
                self.error(format!("undeclared variable '{}'", name), span);
                None
            }
        }
    }

    fn check_array_assign(&mut self, target: &Spanned<String>, index: &Expr, value: &Expr) {
        let target_ty = self.check_target(&target.node, target.span);

        if let Some(ty) = self.check_expected(index, &Ty::Int) {
            if ty != Ty::Int {
                self.error(format!("array index must be int, found {}", ty), index.span);
            }
        }

        let elem = match target_ty {
            Some(Ty::Array(elem)) => Some(*elem),
            Some(other) => {
                self.error(
                    format!("'{}' is not an array, found {}", target.node, other),
                    target.span,
                );
                None
            }
            None => None,
        };

        let Some(elem) = elem else {
            self.check_expr(value);
            return;
        };
        if let Some(value_ty) = self.check_expected(value, &elem) {
            if value_ty != elem {
                self.error(
                    format!(
                        "cannot store {} into an element of '{}' of type {}",
                        value_ty, target.node, elem
                    ),
                    value.span,
                );
            }
        }
    }

    fn check_return(&mut self, value: Option<&Expr>, span: Span) {
        let Some(declared) = self.method.map(|m| m.return_ty.clone()) else {
            return;
        };
        match (value, &declared) {
            (None, Ty::Void) => {}
            (None, _) => self.error(
                format!("missing return value of type {}", declared),
                span,
            ),
            (Some(value), Ty::Void) => {
                self.check_expr(value);
                self.error("a void method cannot return a value".to_string(), value.span);
            }
            (Some(value), _) => {
                if let Some(actual) = self.check_expected(value, &declared) {
                    if !self.is_assignable(&actual, &declared) {
                        self.error_with_help(
                            format!(
                                "return type mismatch: expected {}, found {}",
                                declared, actual
                            ),
                            value.span,
                            format!("the method is declared to return {}", declared),
                        );
                    }
                }
            }
        }
    }
}
