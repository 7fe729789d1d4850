//! Jasmin lowering: one `ClassUnit` to one `.j` text block.

use log::{debug, trace};

use super::{EmitError, ResourceLimits};
use crate::ast::BinOp;
use crate::ir::{CallKind, ClassUnit, Element, Instruction, Method, UnaryOp, VarTable};
use crate::types::Ty;

const TAB: &str = "   ";

/// Emits Jasmin assembly for one class unit.
///
/// `build` is idempotent: the text is generated once and cached, so
/// building twice returns the same text.
pub struct JasminEmitter<'u> {
    unit: &'u ClassUnit,
    limits: ResourceLimits,
    /// Counter for the labels `<` expands into.
    label_counter: u32,
    code: Option<String>,
}

/// Emission state of the method being lowered.
struct MethodScope<'m> {
    method: &'m Method,
    table: &'m VarTable,
}

impl<'u> JasminEmitter<'u> {
    pub fn new(unit: &'u ClassUnit) -> Self {
        Self {
            unit,
            limits: ResourceLimits::default(),
            label_counter: 0,
            code: None,
        }
    }

    pub fn with_limits(mut self, limits: ResourceLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn build(&mut self) -> Result<&str, EmitError> {
        if self.code.is_none() {
            let code = self.generate_class()?;
            debug!("emitted class {} ({} bytes)", self.unit.name, code.len());
            self.code = Some(code);
        }
        Ok(self.code.as_deref().unwrap_or_default())
    }

    // ─── Class structure ──────────────────────────────────────────

    fn generate_class(&mut self) -> Result<String, EmitError> {
        let unit = self.unit;
        let mut out = String::new();
        out.push_str(&format!(".class public {}\n", unit.name));
        out.push_str(&format!(".super {}\n", self.super_path()));

        if !unit.fields.is_empty() {
            out.push('\n');
        }
        for field in &unit.fields {
            out.push_str(&format!(
                ".field {}{} {}\n",
                field.access.prefix(),
                field.name,
                self.descriptor(&field.ty)
            ));
        }

        // The constructor comes first, then the other methods in order.
        let ordered = unit
            .methods
            .iter()
            .filter(|m| m.is_constructor)
            .chain(unit.methods.iter().filter(|m| !m.is_constructor));
        for method in ordered {
            out.push('\n');
            out.push_str(&self.generate_method(method)?);
        }
        Ok(out)
    }

    fn generate_method(&mut self, method: &Method) -> Result<String, EmitError> {
        let mut out = String::new();
        if method.is_constructor {
            out.push_str(";default constructor\n");
            out.push_str(".method public <init>()V\n");
        } else {
            let params: String = method
                .params
                .iter()
                .map(|p| self.descriptor(&p.ty))
                .collect();
            out.push_str(&format!(
                ".method {}{}{}({}){}\n",
                method.access.prefix(),
                if method.is_static { "static " } else { "" },
                method.name,
                params,
                self.descriptor(&method.return_ty)
            ));
            out.push_str(&format!("{}.limit stack {}\n", TAB, self.limits.stack));
            out.push_str(&format!("{}.limit locals {}\n", TAB, self.limits.locals));
        }

        let scope = MethodScope {
            method,
            table: method.var_table(),
        };
        for inst in &method.instructions {
            let mut lines = Vec::new();
            self.emit_instruction(&scope, inst, &mut lines)?;
            trace!("{} => {:?}", inst, lines);
            for line in lines {
                if line.ends_with(':') {
                    out.push_str(&line);
                } else {
                    out.push_str(TAB);
                    out.push_str(&line);
                }
                out.push('\n');
            }
        }
        out.push_str(".end method\n");
        Ok(out)
    }

    // ─── Instructions ─────────────────────────────────────────────

    fn emit_instruction(
        &mut self,
        scope: &MethodScope<'_>,
        inst: &Instruction,
        out: &mut Vec<String>,
    ) -> Result<(), EmitError> {
        match inst {
            Instruction::Assign { dest, ty, rhs } => self.emit_assign(scope, dest, ty, rhs, out),
            Instruction::Call { ty, .. } => {
                self.emit_call(scope, inst, out)?;
                if *ty != Ty::Void {
                    out.push("pop".to_string());
                }
                Ok(())
            }
            Instruction::PutField { field, value } => {
                let Element::Operand { name, ty, .. } = field else {
                    return Err(EmitError::InvalidAssignTarget {
                        dest: field.to_string(),
                        method: scope.method.name.clone(),
                    });
                };
                out.push("aload_0".to_string());
                self.push_element(scope, value, out)?;
                out.push(format!(
                    "putfield {}/{} {}",
                    self.class_path(&self.unit.name),
                    name,
                    self.descriptor(ty)
                ));
                Ok(())
            }
            Instruction::Goto(label) => {
                out.push(format!("goto {}", label));
                Ok(())
            }
            Instruction::Branch { cond, label } => {
                self.push_element(scope, cond, out)?;
                out.push(format!("ifne {}", label));
                Ok(())
            }
            Instruction::Label(label) => {
                out.push(format!("{}:", label));
                Ok(())
            }
            Instruction::Return { ty, operand } => {
                match (ty, operand) {
                    (Ty::Void, _) => out.push("return".to_string()),
                    (_, None) => {
                        return Err(EmitError::MissingReturnValue {
                            ty: ty.to_string(),
                            method: scope.method.name.clone(),
                        })
                    }
                    (_, Some(op)) => {
                        self.push_element(scope, op, out)?;
                        out.push(if ty.is_int_like() { "ireturn" } else { "areturn" }.to_string());
                    }
                }
                Ok(())
            }
            Instruction::SingleOp { .. }
            | Instruction::UnaryOp { .. }
            | Instruction::BinaryOp { .. }
            | Instruction::New { .. }
            | Instruction::NewArray { .. }
            | Instruction::ArrayLength { .. }
            | Instruction::GetField { .. } => {
                self.emit_value(scope, inst, out)?;
                out.push("pop".to_string());
                Ok(())
            }
        }
    }

    fn emit_assign(
        &mut self,
        scope: &MethodScope<'_>,
        dest: &Element,
        ty: &Ty,
        rhs: &Instruction,
        out: &mut Vec<String>,
    ) -> Result<(), EmitError> {
        match dest {
            Element::Operand { name, .. } => {
                self.emit_value(scope, rhs, out)?;
                let reg = self.register(scope, name)?;
                let op = if ty.is_int_like() { "istore" } else { "astore" };
                out.push(format!("{} {}", op, reg));
                Ok(())
            }
            Element::ArrayOperand { name, index, .. } => {
                let reg = self.register(scope, name)?;
                out.push(format!("aload {}", reg));
                self.push_element(scope, index, out)?;
                self.emit_value(scope, rhs, out)?;
                out.push(if ty.is_int_like() { "iastore" } else { "aastore" }.to_string());
                Ok(())
            }
            Element::Literal { .. } | Element::ClassRef(_) => Err(EmitError::InvalidAssignTarget {
                dest: dest.to_string(),
                method: scope.method.name.clone(),
            }),
        }
    }

    /// Code that leaves the value of `inst` on the stack.
    fn emit_value(
        &mut self,
        scope: &MethodScope<'_>,
        inst: &Instruction,
        out: &mut Vec<String>,
    ) -> Result<(), EmitError> {
        match inst {
            Instruction::SingleOp { operand } => self.push_element(scope, operand, out),
            Instruction::UnaryOp {
                op: UnaryOp::Not,
                operand,
                ..
            } => {
                self.push_element(scope, operand, out)?;
                out.push("iconst_1".to_string());
                out.push("ixor".to_string());
                Ok(())
            }
            Instruction::BinaryOp { op, left, right, .. } => {
                self.push_element(scope, left, out)?;
                self.push_element(scope, right, out)?;
                self.emit_binop(*op, out);
                Ok(())
            }
            Instruction::Call { ty, .. } if *ty != Ty::Void => self.emit_call(scope, inst, out),
            Instruction::New { class } => {
                out.push(format!("new {}", self.class_path(class)));
                Ok(())
            }
            Instruction::NewArray { size, ty } => {
                self.push_element(scope, size, out)?;
                match ty.element() {
                    Some(Ty::Int) | Some(Ty::Bool) | None => out.push("newarray int".to_string()),
                    Some(elem) => out.push(format!("anewarray {}", self.reference_name(elem))),
                }
                Ok(())
            }
            Instruction::ArrayLength { array } => {
                self.push_element(scope, array, out)?;
                out.push("arraylength".to_string());
                Ok(())
            }
            Instruction::GetField { field, ty } => {
                let name = field.name().unwrap_or_default();
                out.push("aload_0".to_string());
                out.push(format!(
                    "getfield {}/{} {}",
                    self.class_path(&self.unit.name),
                    name,
                    self.descriptor(ty)
                ));
                Ok(())
            }
            Instruction::Call { .. }
            | Instruction::Assign { .. }
            | Instruction::PutField { .. }
            | Instruction::Goto(_)
            | Instruction::Branch { .. }
            | Instruction::Label(_)
            | Instruction::Return { .. } => Err(EmitError::NotAValue {
                instruction: inst.to_string(),
                method: scope.method.name.clone(),
            }),
        }
    }

    fn emit_binop(&mut self, op: BinOp, out: &mut Vec<String>) {
        match op {
            BinOp::Add => out.push("iadd".to_string()),
            BinOp::Sub => out.push("isub".to_string()),
            BinOp::Mul => out.push("imul".to_string()),
            BinOp::Div => out.push("idiv".to_string()),
            BinOp::And => out.push("iand".to_string()),
            BinOp::Lt => {
                let id = self.label_counter;
                self.label_counter += 1;
                let true_label = format!("cmp_true_{}", id);
                let end_label = format!("cmp_end_{}", id);
                out.push(format!("if_icmplt {}", true_label));
                out.push("iconst_0".to_string());
                out.push(format!("goto {}", end_label));
                out.push(format!("{}:", true_label));
                out.push("iconst_1".to_string());
                out.push(format!("{}:", end_label));
            }
        }
    }

    fn emit_call(
        &mut self,
        scope: &MethodScope<'_>,
        inst: &Instruction,
        out: &mut Vec<String>,
    ) -> Result<(), EmitError> {
        let Instruction::Call {
            kind,
            target,
            method,
            args,
            params,
            ty,
        } = inst
        else {
            return Err(EmitError::NotAValue {
                instruction: inst.to_string(),
                method: scope.method.name.clone(),
            });
        };

        let owner = match (kind, target) {
            (CallKind::Static, Element::ClassRef(name)) => self.class_path(name),
            // The constructor's own initializer call goes to the superclass.
            (CallKind::Special, t) if t.is_this() && scope.method.is_constructor => self.super_path(),
            (_, t) => match t.ty() {
                Ty::Class(name) => self.class_path(&name),
                _ => {
                    return Err(EmitError::InvalidCallTarget {
                        target: t.to_string(),
                        method: scope.method.name.clone(),
                    })
                }
            },
        };

        if *kind != CallKind::Static {
            self.push_element(scope, target, out)?;
        }
        for arg in args {
            self.push_element(scope, arg, out)?;
        }
        let arg_desc: String = match params {
            Some(params) => params.iter().map(|p| self.descriptor(p)).collect(),
            None => args.iter().map(|a| self.descriptor(&a.ty())).collect(),
        };
        out.push(format!(
            "{} {}/{}({}){}",
            kind.as_str(),
            owner,
            method,
            arg_desc,
            self.descriptor(ty)
        ));
        Ok(())
    }

    // ─── Operands ─────────────────────────────────────────────────

    fn push_element(
        &self,
        scope: &MethodScope<'_>,
        elem: &Element,
        out: &mut Vec<String>,
    ) -> Result<(), EmitError> {
        match elem {
            Element::Literal { value, .. } => out.push(format!("ldc {}", value)),
            Element::Operand { .. } if elem.is_this() => out.push("aload_0".to_string()),
            Element::Operand { name, ty, .. } => {
                let reg = self.register(scope, name)?;
                let op = if ty.is_int_like() { "iload" } else { "aload" };
                out.push(format!("{} {}", op, reg));
            }
            Element::ArrayOperand { name, index, ty, .. } => {
                let reg = self.register(scope, name)?;
                out.push(format!("aload {}", reg));
                self.push_element(scope, index, out)?;
                out.push(if ty.is_int_like() { "iaload" } else { "aaload" }.to_string());
            }
            // Static call targets put nothing on the stack.
            Element::ClassRef(_) => {}
        }
        Ok(())
    }

    fn register(&self, scope: &MethodScope<'_>, name: &str) -> Result<u16, EmitError> {
        scope
            .table
            .get(name)
            .map(|r| r.index)
            .ok_or_else(|| EmitError::UnknownOperand {
                name: name.to_string(),
                method: scope.method.name.clone(),
            })
    }

    // ─── Descriptors ──────────────────────────────────────────────

    /// Internal name of a class: the import path with `/` separators for
    /// imported classes, the bare name otherwise.
    fn class_path(&self, name: &str) -> String {
        match self.unit.import_path(name) {
            Some(path) if name != self.unit.name => path.replace('.', "/"),
            _ => name.to_string(),
        }
    }

    fn super_path(&self) -> String {
        match &self.unit.super_name {
            Some(sup) => self.class_path(sup),
            None => "java/lang/Object".to_string(),
        }
    }

    /// Name used by `anewarray`/`checkcast`-style operands.
    fn reference_name(&self, ty: &Ty) -> String {
        match ty {
            Ty::Class(name) => self.class_path(name),
            other => self.descriptor(other),
        }
    }

    pub(super) fn descriptor(&self, ty: &Ty) -> String {
        match ty {
            Ty::Int => "I".to_string(),
            Ty::Bool => "Z".to_string(),
            Ty::Str => "Ljava/lang/String;".to_string(),
            Ty::Void => "V".to_string(),
            Ty::Array(elem) => format!("[{}", self.descriptor(elem)),
            Ty::Class(name) => format!("L{};", self.class_path(name)),
        }
    }
}
