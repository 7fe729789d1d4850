//! Expression lowering: expression subtree -> (element, prerequisite code).

use log::trace;

use crate::ast::*;
use crate::ir::{CallKind, Element, Instruction, UnaryOp};
use crate::span::Span;
use crate::symbols::Binding;
use crate::types::Ty;

use super::{IrBuilder, LowerError};

impl<'a> IrBuilder<'a> {
    /// Lower an expression in a value position. The returned element holds
    /// the value once the returned instructions have run.
    pub(crate) fn lower_expr(&mut self, expr: &Expr) -> Result<(Element, Vec<Instruction>), LowerError> {
        match &expr.kind {
            ExprKind::IntLit(v) => Ok((Element::literal(*v, Ty::Int), Vec::new())),
            ExprKind::BoolLit(b) => Ok((Element::literal(i32::from(*b), Ty::Bool), Vec::new())),
            ExprKind::Var(name) => self.lower_var(name, expr),
            ExprKind::This => Ok((self.this_element(), Vec::new())),
            ExprKind::Negate(operand) => {
                let (operand, mut code) = self.lower_expr(operand)?;
                let dest = self.emit_temp(
                    Ty::Bool,
                    Instruction::UnaryOp {
                        op: UnaryOp::Not,
                        operand,
                        ty: Ty::Bool,
                    },
                    &mut code,
                );
                Ok((dest, code))
            }
            ExprKind::Binary { op, lhs, rhs } => {
                let ty = self.type_of(expr)?;
                let (left, mut code) = self.lower_expr(lhs)?;
                let (right, rhs_code) = self.lower_expr(rhs)?;
                code.extend(rhs_code);
                let dest = self.emit_temp(
                    ty.clone(),
                    Instruction::BinaryOp {
                        op: *op,
                        left,
                        right,
                        ty,
                    },
                    &mut code,
                );
                Ok((dest, code))
            }
            ExprKind::Call { method, .. } => {
                let ty = self.type_of(expr)?;
                if ty == Ty::Void {
                    return Err(LowerError::VoidValue {
                        method: method.node.clone(),
                        span: expr.span,
                    });
                }
                let (call, mut code) = self.lower_call(expr, ty.clone())?;
                let dest = self.emit_temp(ty, call, &mut code);
                Ok((dest, code))
            }
            ExprKind::NewObject(class) => {
                let ty = Ty::class(&class.node);
                let mut code = Vec::new();
                let dest = self.emit_temp(
                    ty,
                    Instruction::New {
                        class: class.node.clone(),
                    },
                    &mut code,
                );
                code.push(Instruction::Call {
                    kind: CallKind::Special,
                    target: dest.clone(),
                    method: "<init>".to_string(),
                    args: Vec::new(),
                    params: Some(Vec::new()),
                    ty: Ty::Void,
                });
                Ok((dest, code))
            }
            ExprKind::NewArray(size) => {
                let ty = self.type_of(expr)?;
                let (size, mut code) = self.lower_expr(size)?;
                let dest = self.emit_temp(
                    ty.clone(),
                    Instruction::NewArray { size, ty },
                    &mut code,
                );
                Ok((dest, code))
            }
            ExprKind::Length(array) => {
                let (array, mut code) = self.lower_expr(array)?;
                let dest = self.emit_temp(Ty::Int, Instruction::ArrayLength { array }, &mut code);
                Ok((dest, code))
            }
            ExprKind::Index { array, index } => {
                let elem_ty = self.type_of(expr)?;
                let (base, mut code) = self.lower_expr(array)?;
                let (index, index_code) = self.lower_expr(index)?;
                code.extend(index_code);
                let operand = Self::index_into(base, index, elem_ty.clone(), expr.span)?;
                let dest = self.emit_temp(elem_ty, Instruction::SingleOp { operand }, &mut code);
                Ok((dest, code))
            }
            ExprKind::Paren(inner) => self.lower_expr(inner),
        }
    }

    /// Lower an expression whose value is discarded. A call is emitted
    /// without materializing its result.
    pub(crate) fn lower_effect(&mut self, expr: &Expr) -> Result<Vec<Instruction>, LowerError> {
        match &expr.kind {
            ExprKind::Call { .. } => {
                let ty = self.annotation.type_of(expr).cloned().unwrap_or(Ty::Void);
                let (call, mut code) = self.lower_call(expr, ty)?;
                code.push(call);
                Ok(code)
            }
            ExprKind::Paren(inner) => self.lower_effect(inner),
            _ => self.lower_expr(expr).map(|(_, code)| code),
        }
    }

    /// Arguments left to right, then the target. Returns the call itself
    /// separately so the caller decides whether to materialize it.
    fn lower_call(&mut self, expr: &Expr, ty: Ty) -> Result<(Instruction, Vec<Instruction>), LowerError> {
        let ExprKind::Call {
            receiver,
            method,
            args,
        } = &expr.kind
        else {
            return Err(LowerError::Unresolved { span: expr.span });
        };

        let mut code = Vec::new();
        let mut arg_elems = Vec::with_capacity(args.len());
        for arg in args {
            let (elem, arg_code) = self.lower_expr(arg)?;
            code.extend(arg_code);
            arg_elems.push(elem);
        }
        let (target, target_code) = self.lower_expr(receiver)?;
        code.extend(target_code);

        let kind = match target {
            Element::ClassRef(_) => CallKind::Static,
            _ => CallKind::Virtual,
        };
        let params = self.declared_params(&target, &method.node, args.len());
        trace!("call {} {}.{}", kind.as_str(), target, method.node);
        Ok((
            Instruction::Call {
                kind,
                target,
                method: method.node.clone(),
                args: arg_elems,
                params,
                ty,
            },
            code,
        ))
    }

    /// Parameter types of a method of the class being lowered. Callees in
    /// imported classes or inherited from the superclass are unknown.
    fn declared_params(&self, target: &Element, method: &str, arity: usize) -> Option<Vec<Ty>> {
        let class = self.class?;
        if target.ty() != Ty::class(&class.name) {
            return None;
        }
        let sig = class.method(method)?;
        (sig.params.len() == arity).then(|| sig.params.iter().map(|p| p.ty.clone()).collect())
    }

    fn lower_var(&mut self, name: &str, expr: &Expr) -> Result<(Element, Vec<Instruction>), LowerError> {
        match self.resolve(name) {
            Some(Binding::Field(symbol)) => {
                let ty = symbol.ty.clone();
                let mut code = Vec::new();
                let dest = self.emit_temp(
                    ty.clone(),
                    Instruction::GetField {
                        field: Element::operand(name, ty.clone()),
                        ty,
                    },
                    &mut code,
                );
                Ok((dest, code))
            }
            Some(binding) => Ok((self.variable_element(name, binding), Vec::new())),
            None if self.is_class_name(name) => Ok((Element::ClassRef(name.to_string()), Vec::new())),
            None => Err(LowerError::UnknownVariable {
                name: name.to_string(),
                span: expr.span,
            }),
        }
    }

    /// Element for a local or parameter. Parameters carry their ordinal
    /// outside of `return` statements.
    pub(crate) fn variable_element(&self, name: &str, binding: Binding<'_>) -> Element {
        let param = match binding {
            Binding::Param { index, .. } if !self.in_return => Some(index),
            _ => None,
        };
        Element::Operand {
            name: name.to_string(),
            ty: binding.ty().clone(),
            param,
        }
    }

    /// `base[index]` for a base that lowered to a named operand.
    pub(crate) fn index_into(base: Element, index: Element, elem_ty: Ty, span: Span) -> Result<Element, LowerError> {
        match base {
            Element::Operand { name, param, .. } => Ok(Element::ArrayOperand {
                name,
                index: Box::new(index),
                ty: elem_ty,
                param,
            }),
            other => Err(LowerError::NotIndexable {
                name: other.to_string(),
                span,
            }),
        }
    }

    /// Store `rhs` into a fresh temporary and return the temporary.
    pub(crate) fn emit_temp(&mut self, ty: Ty, rhs: Instruction, code: &mut Vec<Instruction>) -> Element {
        let dest = Element::operand(&self.fresh_temp(), ty.clone());
        code.push(Instruction::Assign {
            dest: dest.clone(),
            ty,
            rhs: Box::new(rhs),
        });
        dest
    }

    pub(crate) fn resolve(&self, name: &str) -> Option<Binding<'a>> {
        let (class, method) = (self.class?, self.method?);
        class.resolve(method, name)
    }

    fn this_element(&self) -> Element {
        Element::this(self.class.map(|c| c.name.as_str()).unwrap_or_default())
    }

    fn is_class_name(&self, name: &str) -> bool {
        self.table.is_imported(name)
            || self
                .class
                .is_some_and(|c| c.name == name || c.super_name.as_deref() == Some(name))
    }
}
