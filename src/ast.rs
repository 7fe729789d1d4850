//! Syntax tree handed over by the parser.
//!
//! Every node kind carries its own typed payload. Expressions carry a
//! `NodeId` so later passes can attach facts (types) in side tables
//! without mutating the tree.

pub mod build;
pub mod navigate;

use serde::{Deserialize, Serialize};

use crate::span::{Span, Spanned};
use crate::types::Ty;

/// Identity of an expression node within one program.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct NodeId(pub u32);

/// A whole compilation unit: imports followed by class declarations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    /// Dotted import paths, e.g. `io` or `java.util.List`.
    #[serde(default)]
    pub imports: Vec<Spanned<String>>,
    pub classes: Vec<ClassDecl>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassDecl {
    pub name: Spanned<String>,
    #[serde(default)]
    pub super_name: Option<Spanned<String>>,
    #[serde(default)]
    pub fields: Vec<VarDecl>,
    #[serde(default)]
    pub methods: Vec<MethodDecl>,
}

/// A field, parameter or local declaration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VarDecl {
    pub name: Spanned<String>,
    pub ty: Spanned<Ty>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDecl {
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub is_static: bool,
    pub name: Spanned<String>,
    pub return_ty: Spanned<Ty>,
    #[serde(default)]
    pub params: Vec<VarDecl>,
    #[serde(default)]
    pub body: Vec<Spanned<Stmt>>,
}

/// Statements.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stmt {
    /// Local declaration; its slot comes from the symbol table.
    VarDecl(VarDecl),
    Block(Vec<Spanned<Stmt>>),
    If {
        cond: Expr,
        then_branch: Box<Spanned<Stmt>>,
        else_branch: Option<Box<Spanned<Stmt>>>,
    },
    While {
        cond: Expr,
        body: Box<Spanned<Stmt>>,
    },
    Expr(Expr),
    /// `name = value;`
    Assign {
        target: Spanned<String>,
        value: Expr,
    },
    /// `name[index] = value;`
    ArrayAssign {
        target: Spanned<String>,
        index: Expr,
        value: Expr,
    },
    Return(Option<Expr>),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expr {
    /// Assigned by `AstBuilder` or `Program::assign_node_ids`; not serialized.
    #[serde(skip)]
    pub id: NodeId,
    pub kind: ExprKind,
    #[serde(default)]
    pub span: Span,
}

impl Expr {
    pub fn new(id: NodeId, kind: ExprKind, span: Span) -> Self {
        Self { id, kind, span }
    }
}

/// Expressions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExprKind {
    IntLit(i32),
    BoolLit(bool),
    Var(String),
    This,
    /// `!e`
    Negate(Box<Expr>),
    Binary {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// `receiver.method(args)`
    Call {
        receiver: Box<Expr>,
        method: Spanned<String>,
        args: Vec<Expr>,
    },
    /// `new C()`
    NewObject(Spanned<String>),
    /// `new int[size]`
    NewArray(Box<Expr>),
    /// `e.length`
    Length(Box<Expr>),
    /// `array[index]`
    Index {
        array: Box<Expr>,
        index: Box<Expr>,
    },
    Paren(Box<Expr>),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinOp {
    Add, // +
    Sub, // -
    Mul, // *
    Div, // /
    Lt,  // <
    And, // &&
}

impl BinOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Lt => "<",
            BinOp::And => "&&",
        }
    }

    /// Type both operands must have.
    pub fn operand_ty(&self) -> Ty {
        match self {
            BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Lt => Ty::Int,
            BinOp::And => Ty::Bool,
        }
    }

    pub fn result_ty(&self) -> Ty {
        match self {
            BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div => Ty::Int,
            BinOp::Lt | BinOp::And => Ty::Bool,
        }
    }
}

impl std::fmt::Display for BinOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
