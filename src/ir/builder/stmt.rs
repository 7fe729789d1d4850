//! Statement lowering: assignments, returns and structured control flow.

use crate::ast::*;
use crate::ir::{Element, Instruction};
use crate::span::Spanned;
use crate::symbols::Binding;
use crate::types::Ty;

use super::{IrBuilder, LowerError};

impl<'a> IrBuilder<'a> {
    pub(crate) fn lower_stmt(&mut self, stmt: &Spanned<Stmt>) -> Result<Vec<Instruction>, LowerError> {
        match &stmt.node {
            Stmt::VarDecl(_) => Ok(Vec::new()),
            Stmt::Block(stmts) => {
                let mut code = Vec::new();
                for s in stmts {
                    code.extend(self.lower_stmt(s)?);
                }
                Ok(code)
            }
            Stmt::If {
                cond,
                then_branch,
                else_branch,
            } => {
                // if (c) goto then_N; <else>; goto endif_N; then_N: <then>; endif_N:
                // An else branch that always returns skips the goto; endif_N
                // is dropped when both branches always return.
                let id = self.fresh_label_id();
                let then_label = format!("then_{}", id);
                let end_label = format!("endif_{}", id);

                let (cond, mut code) = self.lower_expr(cond)?;
                code.push(Instruction::Branch {
                    cond,
                    label: then_label.clone(),
                });
                let else_returns = else_branch
                    .as_ref()
                    .is_some_and(|e| e.node.definitely_returns());
                if let Some(else_branch) = else_branch {
                    code.extend(self.lower_stmt(else_branch)?);
                }
                if !else_returns {
                    code.push(Instruction::Goto(end_label.clone()));
                }
                code.push(Instruction::Label(then_label));
                code.extend(self.lower_stmt(then_branch)?);
                if !(else_returns && then_branch.node.definitely_returns()) {
                    code.push(Instruction::Label(end_label));
                }
                Ok(code)
            }
            Stmt::While { cond, body } => {
                // while_cond_N: if (c) goto while_body_N; goto while_end_N;
                // while_body_N: <body>; goto while_cond_N; while_end_N:
                let id = self.fresh_label_id();
                let cond_label = format!("while_cond_{}", id);
                let body_label = format!("while_body_{}", id);
                let end_label = format!("while_end_{}", id);

                let mut code = vec![Instruction::Label(cond_label.clone())];
                let (cond, cond_code) = self.lower_expr(cond)?;
                code.extend(cond_code);
                code.push(Instruction::Branch {
                    cond,
                    label: body_label.clone(),
                });
                code.push(Instruction::Goto(end_label.clone()));
                code.push(Instruction::Label(body_label));
                code.extend(self.lower_stmt(body)?);
                code.push(Instruction::Goto(cond_label));
                code.push(Instruction::Label(end_label));
                Ok(code)
            }
            Stmt::Expr(expr) => self.lower_effect(expr),
            Stmt::Assign { target, value } => self.lower_assign(target, value),
            Stmt::ArrayAssign {
                target,
                index,
                value,
            } => self.lower_array_assign(target, index, value),
            Stmt::Return(value) => self.lower_return(value.as_ref()),
        }
    }

    /// Field targets become `putfield`; everything else a register store
    /// typed by the declared target type.
    fn lower_assign(&mut self, target: &Spanned<String>, value: &Expr) -> Result<Vec<Instruction>, LowerError> {
        let binding = self
            .resolve(&target.node)
            .ok_or_else(|| LowerError::UnknownVariable {
                name: target.node.clone(),
                span: target.span,
            })?;
        let ty = binding.ty().clone();
        let (value, mut code) = self.lower_expr(value)?;

        match binding {
            Binding::Field(_) => code.push(Instruction::PutField {
                field: Element::operand(&target.node, ty),
                value,
            }),
            _ => code.push(Instruction::Assign {
                dest: self.variable_element(&target.node, binding),
                ty,
                rhs: Box::new(Instruction::SingleOp { operand: value }),
            }),
        }
        Ok(code)
    }

    fn lower_array_assign(
        &mut self,
        target: &Spanned<String>,
        index: &Expr,
        value: &Expr,
    ) -> Result<Vec<Instruction>, LowerError> {
        let binding = self
            .resolve(&target.node)
            .ok_or_else(|| LowerError::UnknownVariable {
                name: target.node.clone(),
                span: target.span,
            })?;
        let elem_ty = binding
            .ty()
            .element()
            .cloned()
            .ok_or_else(|| LowerError::NotIndexable {
                name: target.node.clone(),
                span: target.span,
            })?;

        let mut code = Vec::new();
        let base = match binding {
            Binding::Field(symbol) => {
                let ty = symbol.ty.clone();
                self.emit_temp(
                    ty.clone(),
                    Instruction::GetField {
                        field: Element::operand(&target.node, ty.clone()),
                        ty,
                    },
                    &mut code,
                )
            }
            _ => self.variable_element(&target.node, binding),
        };
        let (index, index_code) = self.lower_expr(index)?;
        code.extend(index_code);
        let (value, value_code) = self.lower_expr(value)?;
        code.extend(value_code);

        let dest = Self::index_into(base, index, elem_ty.clone(), target.span)?;
        code.push(Instruction::Assign {
            dest,
            ty: elem_ty,
            rhs: Box::new(Instruction::SingleOp { operand: value }),
        });
        Ok(code)
    }

    /// Typed with the declared return type of the method.
    fn lower_return(&mut self, value: Option<&Expr>) -> Result<Vec<Instruction>, LowerError> {
        let ty = self
            .method
            .map(|m| m.return_ty.clone())
            .unwrap_or(Ty::Void);
        let Some(value) = value else {
            return Ok(vec![Instruction::Return { ty, operand: None }]);
        };

        self.in_return = true;
        let lowered = self.lower_expr(value);
        self.in_return = false;
        let (operand, mut code) = lowered?;
        code.push(Instruction::Return {
            ty,
            operand: Some(operand),
        });
        Ok(code)
    }
}
