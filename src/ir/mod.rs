//! Three-address IR.
//!
//! Each instruction carries at most one operator; operands are literals,
//! named variables (locals, parameters, temporaries), indexed array slots or
//! class references. A `ClassUnit` prints as OLLIR-style text through
//! `Display`; the `lower` backends turn it into stack-machine assembly.

pub mod builder;
pub mod lower;

use std::cell::OnceCell;
use std::collections::BTreeMap;
use std::fmt;

use crate::ast::BinOp;
use crate::symbols::Symbol;
use crate::types::Ty;

// ─── Elements ─────────────────────────────────────────────────────

/// An instruction operand.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Element {
    /// Integer or boolean constant (`true`/`false` are `1`/`0`).
    Literal { value: i32, ty: Ty },
    /// A named variable. `param` is the 1-based parameter ordinal printed
    /// as the `$n.` prefix; `None` for locals, temporaries and unprefixed
    /// parameter uses.
    Operand {
        name: String,
        ty: Ty,
        param: Option<usize>,
    },
    /// `name[index]`; `ty` is the element type.
    ArrayOperand {
        name: String,
        index: Box<Element>,
        ty: Ty,
        param: Option<usize>,
    },
    /// Bare class name used as a static call target.
    ClassRef(String),
}

impl Element {
    pub fn literal(value: i32, ty: Ty) -> Self {
        Element::Literal { value, ty }
    }

    pub fn operand(name: &str, ty: Ty) -> Self {
        Element::Operand {
            name: name.to_string(),
            ty,
            param: None,
        }
    }

    pub fn this(class: &str) -> Self {
        Element::operand("this", Ty::class(class))
    }

    pub fn ty(&self) -> Ty {
        match self {
            Element::Literal { ty, .. }
            | Element::Operand { ty, .. }
            | Element::ArrayOperand { ty, .. } => ty.clone(),
            Element::ClassRef(name) => Ty::class(name),
        }
    }

    /// Variable name, for operands of either kind.
    pub fn name(&self) -> Option<&str> {
        match self {
            Element::Operand { name, .. } | Element::ArrayOperand { name, .. } => Some(name),
            Element::Literal { .. } | Element::ClassRef(_) => None,
        }
    }

    pub fn is_this(&self) -> bool {
        matches!(self, Element::Operand { name, .. } if name == "this")
    }
}

fn write_param_prefix(f: &mut fmt::Formatter<'_>, param: &Option<usize>) -> fmt::Result {
    match param {
        Some(n) => write!(f, "${}.", n),
        None => Ok(()),
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Element::Literal { value, ty } => write!(f, "{}{}", value, ty.ir_suffix()),
            Element::Operand { name, ty, param } => {
                write_param_prefix(f, param)?;
                write!(f, "{}{}", name, ty.ir_suffix())
            }
            Element::ArrayOperand {
                name,
                index,
                ty,
                param,
            } => {
                write_param_prefix(f, param)?;
                write!(f, "{}[{}]{}", name, index, ty.ir_suffix())
            }
            Element::ClassRef(name) => f.write_str(name),
        }
    }
}

// ─── Instructions ─────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CallKind {
    Virtual,
    Static,
    Special,
}

impl CallKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallKind::Virtual => "invokevirtual",
            CallKind::Static => "invokestatic",
            CallKind::Special => "invokespecial",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Instruction {
    /// `dest :=.ty rhs`; `dest` is an operand or an indexed operand.
    Assign {
        dest: Element,
        ty: Ty,
        rhs: Box<Instruction>,
    },
    /// A bare element used as a value.
    SingleOp { operand: Element },
    UnaryOp {
        op: UnaryOp,
        operand: Element,
        ty: Ty,
    },
    BinaryOp {
        op: BinOp,
        left: Element,
        right: Element,
        ty: Ty,
    },
    Call {
        kind: CallKind,
        target: Element,
        method: String,
        args: Vec<Element>,
        /// Declared parameter types, when the callee's signature is known.
        params: Option<Vec<Ty>>,
        ty: Ty,
    },
    New { class: String },
    NewArray { size: Element, ty: Ty },
    ArrayLength { array: Element },
    /// Read of a field of `this`.
    GetField { field: Element, ty: Ty },
    /// Write of a field of `this`.
    PutField { field: Element, value: Element },
    Goto(String),
    /// Jump to `label` when `cond` is true.
    Branch { cond: Element, label: String },
    Label(String),
    Return { ty: Ty, operand: Option<Element> },
}

impl Instruction {
    /// Static type of the value the instruction produces (`void` if none).
    pub fn ty(&self) -> Ty {
        match self {
            Instruction::Assign { ty, .. }
            | Instruction::UnaryOp { ty, .. }
            | Instruction::BinaryOp { ty, .. }
            | Instruction::Call { ty, .. }
            | Instruction::NewArray { ty, .. }
            | Instruction::GetField { ty, .. }
            | Instruction::Return { ty, .. } => ty.clone(),
            Instruction::SingleOp { operand } => operand.ty(),
            Instruction::New { class } => Ty::class(class),
            Instruction::ArrayLength { .. } => Ty::Int,
            Instruction::PutField { .. }
            | Instruction::Goto(_)
            | Instruction::Branch { .. }
            | Instruction::Label(_) => Ty::Void,
        }
    }

    pub fn is_label(&self) -> bool {
        matches!(self, Instruction::Label(_))
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Assign { dest, ty, rhs } => {
                write!(f, "{} :={} {}", dest, ty.ir_suffix(), rhs)
            }
            Instruction::SingleOp { operand } => write!(f, "{}", operand),
            Instruction::UnaryOp { op, operand, ty } => match op {
                UnaryOp::Not => write!(f, "!{} {}", ty.ir_suffix(), operand),
            },
            Instruction::BinaryOp {
                op,
                left,
                right,
                ty,
            } => write!(f, "{} {}{} {}", left, op, ty.ir_suffix(), right),
            Instruction::Call {
                kind,
                target,
                method,
                args,
                ty,
                ..
            } => {
                write!(f, "{}({}, \"{}\"", kind.as_str(), target, method)?;
                for arg in args {
                    write!(f, ", {}", arg)?;
                }
                write!(f, "){}", ty.ir_suffix())
            }
            Instruction::New { class } => write!(f, "new({}).{}", class, class),
            Instruction::NewArray { size, ty } => {
                write!(f, "new(array, {}){}", size, ty.ir_suffix())
            }
            Instruction::ArrayLength { array } => write!(f, "arraylength({}).i32", array),
            Instruction::GetField { field, ty } => {
                write!(f, "getfield(this, {}){}", field, ty.ir_suffix())
            }
            Instruction::PutField { field, value } => {
                write!(f, "putfield(this, {}, {}).V", field, value)
            }
            Instruction::Goto(label) => write!(f, "goto {}", label),
            Instruction::Branch { cond, label } => write!(f, "if ({}) goto {}", cond, label),
            Instruction::Label(label) => write!(f, "{}:", label),
            Instruction::Return { ty, operand } => match operand {
                Some(op) => write!(f, "ret{} {}", ty.ir_suffix(), op),
                None => write!(f, "ret{}", ty.ir_suffix()),
            },
        }
    }
}

// ─── Methods and classes ──────────────────────────────────────────

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AccessModifier {
    Public,
    Private,
    #[default]
    Default,
}

impl AccessModifier {
    /// Keyword followed by a space, or nothing for package access.
    pub fn prefix(&self) -> &'static str {
        match self {
            AccessModifier::Public => "public ",
            AccessModifier::Private => "private ",
            AccessModifier::Default => "",
        }
    }
}

/// A virtual register assigned to a variable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Register {
    pub index: u16,
    pub ty: Ty,
}

/// Variable name to register map of one method.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VarTable {
    registers: BTreeMap<String, Register>,
}

impl VarTable {
    pub fn get(&self, name: &str) -> Option<&Register> {
        self.registers.get(name)
    }

    pub fn len(&self) -> usize {
        self.registers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registers.is_empty()
    }

    /// Registers in slot order.
    pub fn slots(&self) -> Vec<(&str, &Register)> {
        let mut slots: Vec<_> = self
            .registers
            .iter()
            .map(|(name, reg)| (name.as_str(), reg))
            .collect();
        slots.sort_by_key(|(_, reg)| reg.index);
        slots
    }

    /// First declaration wins.
    fn declare(&mut self, name: &str, ty: Ty) {
        let index = self.registers.len() as u16;
        self.registers
            .entry(name.to_string())
            .or_insert(Register { index, ty });
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub ty: Ty,
    pub access: AccessModifier,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Method {
    pub name: String,
    /// Name of the class the method belongs to.
    pub class_name: String,
    pub access: AccessModifier,
    pub is_static: bool,
    pub is_constructor: bool,
    pub params: Vec<Symbol>,
    pub locals: Vec<Symbol>,
    pub return_ty: Ty,
    pub instructions: Vec<Instruction>,
    var_table: OnceCell<VarTable>,
}

impl Method {
    pub fn new(name: &str, class_name: &str, return_ty: Ty) -> Self {
        Self {
            name: name.to_string(),
            class_name: class_name.to_string(),
            access: AccessModifier::Public,
            is_static: false,
            is_constructor: false,
            params: Vec::new(),
            locals: Vec::new(),
            return_ty,
            instructions: Vec::new(),
            var_table: OnceCell::new(),
        }
    }

    /// The zero-argument constructor that only calls the superclass
    /// initializer.
    pub fn default_constructor(class_name: &str) -> Self {
        let mut ctor = Method::new("<init>", class_name, Ty::Void);
        ctor.is_constructor = true;
        ctor.instructions = vec![
            Instruction::Call {
                kind: CallKind::Special,
                target: Element::this(class_name),
                method: "<init>".to_string(),
                args: Vec::new(),
                params: Some(Vec::new()),
                ty: Ty::Void,
            },
            Instruction::Return {
                ty: Ty::Void,
                operand: None,
            },
        ];
        ctor
    }

    /// Register table, built on first request and frozen afterwards:
    /// `this` (instance methods), parameters, declared locals, then every
    /// assignment destination in order of first appearance.
    pub fn var_table(&self) -> &VarTable {
        self.var_table.get_or_init(|| {
            let mut table = VarTable::default();
            if !self.is_static {
                table.declare("this", Ty::class(&self.class_name));
            }
            for sym in self.params.iter().chain(&self.locals) {
                table.declare(&sym.name, sym.ty.clone());
            }
            for inst in &self.instructions {
                if let Instruction::Assign { dest, ty, .. } = inst {
                    if let Some(name) = dest.name() {
                        let ty = match dest {
                            Element::ArrayOperand { .. } => Ty::array_of(ty.clone()),
                            _ => ty.clone(),
                        };
                        table.declare(name, ty);
                    }
                }
            }
            table
        })
    }

    pub fn is_var_table_frozen(&self) -> bool {
        self.var_table.get().is_some()
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_constructor {
            writeln!(f, ".construct {}().V {{", self.class_name)?;
        } else {
            write!(f, ".method {}", self.access.prefix())?;
            if self.is_static {
                f.write_str("static ")?;
            }
            let params: Vec<String> = self
                .params
                .iter()
                .map(|p| format!("{}{}", p.name, p.ty.ir_suffix()))
                .collect();
            writeln!(
                f,
                "{}({}){} {{",
                self.name,
                params.join(", "),
                self.return_ty.ir_suffix()
            )?;
        }
        for inst in &self.instructions {
            if inst.is_label() {
                writeln!(f, "  {}", inst)?;
            } else {
                writeln!(f, "    {};", inst)?;
            }
        }
        f.write_str("}\n")
    }
}

/// One compiled class.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassUnit {
    /// Dotted import paths.
    pub imports: Vec<String>,
    pub name: String,
    pub super_name: Option<String>,
    pub fields: Vec<Field>,
    pub methods: Vec<Method>,
}

impl ClassUnit {
    pub fn method(&self, name: &str) -> Option<&Method> {
        self.methods.iter().find(|m| m.name == name)
    }

    /// Full dotted path of an imported class, by its last segment.
    pub fn import_path(&self, name: &str) -> Option<&str> {
        self.imports
            .iter()
            .find(|path| path.rsplit('.').next() == Some(name))
            .map(String::as_str)
    }
}

impl fmt::Display for ClassUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for import in &self.imports {
            writeln!(f, "import {};", import)?;
        }
        if !self.imports.is_empty() {
            writeln!(f)?;
        }
        match &self.super_name {
            Some(sup) => writeln!(f, "{} extends {} {{", self.name, sup)?,
            None => writeln!(f, "{} {{", self.name)?,
        }
        for field in &self.fields {
            writeln!(
                f,
                ".field {}{}{};",
                field.access.prefix(),
                field.name,
                field.ty.ir_suffix()
            )?;
        }
        for method in &self.methods {
            writeln!(f)?;
            write!(f, "{}", method)?;
        }
        f.write_str("}\n")
    }
}
