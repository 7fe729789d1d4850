//! Expression annotation: check_expr, check_binop, check_call.

use log::trace;

use crate::ast::*;
use crate::span::Span;
use crate::types::Ty;

use super::TypeChecker;

impl<'a> TypeChecker<'a> {
    /// Annotate `expr` and its subtree. Returns the resolved type, which is
    /// also recorded in the side table.
    pub(super) fn check_expr(&mut self, expr: &Expr) -> Option<Ty> {
        let ty = self.infer_expr(expr);
        if let Some(ty) = &ty {
            trace!("node {:?} : {}", expr.id, ty);
            self.types.insert(expr.id, ty.clone());
        }
        ty
    }

    /// Record `ty` for an expression that resolved to nothing, so the
    /// context's expected type is used from now on.
    pub(super) fn adopt(&mut self, expr: &Expr, ty: &Ty) {
        if let ExprKind::Paren(inner) = &expr.kind {
            self.adopt(inner, ty);
        }
        self.types.entry(expr.id).or_insert_with(|| ty.clone());
    }

    /// Annotate an expression that must have type `expected`. Unresolved
    /// expressions adopt it; resolved ones are returned for the caller to
    /// compare.
    pub(super) fn check_expected(&mut self, expr: &Expr, expected: &Ty) -> Option<Ty> {
        let ty = self.check_expr(expr);
        if ty.is_none() {
            self.adopt(expr, expected);
        }
        ty
    }

    fn infer_expr(&mut self, expr: &Expr) -> Option<Ty> {
        match &expr.kind {
            ExprKind::IntLit(_) => Some(Ty::Int),
            ExprKind::BoolLit(_) => Some(Ty::Bool),
            ExprKind::Var(name) => self.check_var(name, expr.span),
            ExprKind::This => {
                if self.in_static {
                    self.error(
                        "'this' cannot be used in a static method".to_string(),
                        expr.span,
                    );
                }
                self.class.map(|c| Ty::class(&c.name))
            }
            ExprKind::Negate(operand) => match self.check_expected(operand, &Ty::Bool) {
                None | Some(Ty::Bool) => Some(Ty::Bool),
                Some(other) => {
                    self.error(
                        format!("operator '!' expects boolean, found {}", other),
                        expr.span,
                    );
                    None
                }
            },
            ExprKind::Binary { op, lhs, rhs } => self.check_binop(*op, lhs, rhs, expr.span),
            ExprKind::Call {
                receiver,
                method,
                args,
            } => self.check_call(receiver, &method.node, args, expr.span),
            ExprKind::NewObject(name) => {
                if !self.is_class_name(&name.node) {
                    self.error_with_help(
                        format!("unknown class '{}'", name.node),
                        name.span,
                        "only the current class, its superclass and imported classes can be instantiated"
                            .to_string(),
                    );
                }
                Some(Ty::class(&name.node))
            }
            ExprKind::NewArray(size) => {
                if let Some(ty) = self.check_expected(size, &Ty::Int) {
                    if ty != Ty::Int {
                        self.error(format!("array size must be int, found {}", ty), size.span);
                    }
                }
                Some(Ty::array_of(Ty::Int))
            }
            ExprKind::Length(array) => {
                let array_ty = self.check_expr(array);
                if array_ty.is_none() {
                    self.require_inferred(array, "'length' operand");
                }
                if let Some(ty) = array_ty {
                    if !ty.is_array() {
                        self.error(
                            format!("'length' requires an array, found {}", ty),
                            array.span,
                        );
                    }
                }
                Some(Ty::Int)
            }
            ExprKind::Index { array, index } => {
                let array_ty = self.check_expr(array);
                if let Some(ty) = self.check_expected(index, &Ty::Int) {
                    if ty != Ty::Int {
                        self.error(format!("array index must be int, found {}", ty), index.span);
                    }
                }
                if array_ty.is_none() {
                    self.require_inferred(array, "indexed array");
                }
                match array_ty {
                    Some(Ty::Array(elem)) => Some(*elem),
                    Some(other) => {
                        self.error(format!("cannot index into a value of type {}", other), array.span);
                        None
                    }
                    None => None,
                }
            }
            ExprKind::Paren(inner) => self.check_expr(inner),
        }
    }

    fn check_var(&mut self, name: &str, span: Span) -> Option<Ty> {
        let (Some(class), Some(method)) = (self.class, self.method) else {
            return None;
        };
        match class.resolve(method, name) {
            Some(binding) => {
                if binding.is_field() && self.in_static {
                    self.error(
                        format!("field '{}' cannot be referenced from a static method", name),
                        span,
                    );
                }
                Some(binding.ty().clone())
            }
            None => {
                if !self.is_class_name(name) {
                    self.error_with_help(
                        format!("undeclared variable '{}'", name),
                        span,
                        "declare it as a local, a parameter or a field".to_string(),
                    );
                }
                None
            }
        }
    }

    /// Both operands must match the operator's operand type. An unresolved
    /// operand adopts it; two resolved operands that disagree leave the
    /// node unresolved and are reported here.
    pub(super) fn check_binop(&mut self, op: BinOp, lhs: &Expr, rhs: &Expr, span: Span) -> Option<Ty> {
        let expected = op.operand_ty();
        let lhs_ty = self.check_expected(lhs, &expected).unwrap_or_else(|| expected.clone());
        let rhs_ty = self.check_expected(rhs, &expected).unwrap_or_else(|| expected.clone());
        if lhs_ty == expected && rhs_ty == expected {
            Some(op.result_ty())
        } else {
            self.error(
                format!(
                    "operator '{}' expects {} operands, found {} and {}",
                    op, expected, lhs_ty, rhs_ty
                ),
                span,
            );
            None
        }
    }

    fn check_call(&mut self, receiver: &Expr, method: &str, args: &[Expr], span: Span) -> Option<Ty> {
        let receiver_ty = self.check_expr(receiver);
        let class = self.class?;

        match receiver_ty {
            Some(Ty::Class(name)) if name == class.name => {
                let Some(sig) = class.method(method) else {
                    self.check_unknown_args(args);
                    if class.super_name.is_none() {
                        self.error(format!("class '{}' has no method '{}'", name, method), span);
                    }
                    return None;
                };
                if args.len() != sig.params.len() {
                    self.error(
                        format!(
                            "method '{}' expects {} arguments, found {}",
                            method,
                            sig.params.len(),
                            args.len()
                        ),
                        span,
                    );
                    for arg in args {
                        self.check_expr(arg);
                    }
                } else {
                    for (i, (arg, param)) in args.iter().zip(&sig.params).enumerate() {
                        if let Some(actual) = self.check_expected(arg, &param.ty) {
                            if !self.is_assignable(&actual, &param.ty) {
                                self.error(
                                    format!(
                                        "argument {} of '{}': expected {}, found {}",
                                        i + 1,
                                        method,
                                        param.ty,
                                        actual
                                    ),
                                    arg.span,
                                );
                            }
                        }
                    }
                }
                Some(sig.return_ty.clone())
            }
            Some(Ty::Class(_)) => {
                self.check_unknown_args(args);
                None
            }
            None => {
                self.require_inferred(receiver, "call receiver");
                self.check_unknown_args(args);
                None
            }
            Some(other) => {
                for arg in args {
                    self.check_expr(arg);
                }
                self.error(
                    format!("cannot call method '{}' on a value of type {}", method, other),
                    receiver.span,
                );
                None
            }
        }
    }

    /// Arguments of a call whose signature is unknown. An argument that is
    /// itself unresolved defaults to `int`.
    fn check_unknown_args(&mut self, args: &[Expr]) {
        for arg in args {
            self.check_expected(arg, &Ty::Int);
        }
    }

    /// An unresolved call in a position that supplies no expected type
    /// cannot be lowered, so it is rejected here.
    fn require_inferred(&mut self, expr: &Expr, position: &str) {
        let mut inner = expr;
        while let ExprKind::Paren(e) = &inner.kind {
            inner = e;
        }
        if let ExprKind::Call { method, .. } = &inner.kind {
            self.error_with_help(
                format!("type of '{}' used as {} could not be determined", method.node, position),
                expr.span,
                "assign the result to a variable of the intended type first".to_string(),
            );
        }
    }
}
