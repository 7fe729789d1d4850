//! Programmatic tree construction for front ends, tests and benchmarks.
//!
//! `AstBuilder` hands out unique `NodeId`s; every expression of one
//! `Program` must come from the same builder (or the program must be
//! renumbered with `Program::assign_node_ids`).

use super::*;

#[derive(Debug, Default)]
pub struct AstBuilder {
    next_id: u32,
}

impl AstBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ids handed out so far.
    pub fn issued(&self) -> u32 {
        self.next_id
    }

    pub fn expr(&mut self, kind: ExprKind) -> Expr {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        Expr::new(id, kind, Span::dummy())
    }

    pub fn int(&mut self, value: i32) -> Expr {
        self.expr(ExprKind::IntLit(value))
    }

    pub fn bool(&mut self, value: bool) -> Expr {
        self.expr(ExprKind::BoolLit(value))
    }

    pub fn var(&mut self, name: &str) -> Expr {
        self.expr(ExprKind::Var(name.to_string()))
    }

    pub fn this(&mut self) -> Expr {
        self.expr(ExprKind::This)
    }

    pub fn not(&mut self, operand: Expr) -> Expr {
        self.expr(ExprKind::Negate(Box::new(operand)))
    }

    pub fn binary(&mut self, op: BinOp, lhs: Expr, rhs: Expr) -> Expr {
        self.expr(ExprKind::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        })
    }

    pub fn call(&mut self, receiver: Expr, method: &str, args: Vec<Expr>) -> Expr {
        self.expr(ExprKind::Call {
            receiver: Box::new(receiver),
            method: Spanned::dummy(method.to_string()),
            args,
        })
    }

    pub fn new_object(&mut self, class: &str) -> Expr {
        self.expr(ExprKind::NewObject(Spanned::dummy(class.to_string())))
    }

    pub fn new_array(&mut self, size: Expr) -> Expr {
        self.expr(ExprKind::NewArray(Box::new(size)))
    }

    pub fn length(&mut self, array: Expr) -> Expr {
        self.expr(ExprKind::Length(Box::new(array)))
    }

    pub fn index(&mut self, array: Expr, index: Expr) -> Expr {
        self.expr(ExprKind::Index {
            array: Box::new(array),
            index: Box::new(index),
        })
    }

    pub fn paren(&mut self, inner: Expr) -> Expr {
        self.expr(ExprKind::Paren(Box::new(inner)))
    }
}

// ─── Statements ───────────────────────────────────────────────────

fn stmt(s: Stmt) -> Spanned<Stmt> {
    Spanned::dummy(s)
}

pub fn var_decl(name: &str, ty: Ty) -> Spanned<Stmt> {
    stmt(Stmt::VarDecl(decl(name, ty)))
}

pub fn block(stmts: Vec<Spanned<Stmt>>) -> Spanned<Stmt> {
    stmt(Stmt::Block(stmts))
}

pub fn if_(cond: Expr, then_branch: Spanned<Stmt>, else_branch: Option<Spanned<Stmt>>) -> Spanned<Stmt> {
    stmt(Stmt::If {
        cond,
        then_branch: Box::new(then_branch),
        else_branch: else_branch.map(Box::new),
    })
}

pub fn while_(cond: Expr, body: Spanned<Stmt>) -> Spanned<Stmt> {
    stmt(Stmt::While {
        cond,
        body: Box::new(body),
    })
}

pub fn expr_stmt(e: Expr) -> Spanned<Stmt> {
    stmt(Stmt::Expr(e))
}

pub fn assign(target: &str, value: Expr) -> Spanned<Stmt> {
    stmt(Stmt::Assign {
        target: Spanned::dummy(target.to_string()),
        value,
    })
}

pub fn array_assign(target: &str, index: Expr, value: Expr) -> Spanned<Stmt> {
    stmt(Stmt::ArrayAssign {
        target: Spanned::dummy(target.to_string()),
        index,
        value,
    })
}

pub fn ret(value: Option<Expr>) -> Spanned<Stmt> {
    stmt(Stmt::Return(value))
}

// ─── Declarations ─────────────────────────────────────────────────

pub fn decl(name: &str, ty: Ty) -> VarDecl {
    VarDecl {
        name: Spanned::dummy(name.to_string()),
        ty: Spanned::dummy(ty),
    }
}

/// A public instance method with an empty body.
pub fn method(name: &str, return_ty: Ty) -> MethodDecl {
    MethodDecl {
        is_public: true,
        is_static: false,
        name: Spanned::dummy(name.to_string()),
        return_ty: Spanned::dummy(return_ty),
        params: Vec::new(),
        body: Vec::new(),
    }
}

impl MethodDecl {
    pub fn param(mut self, name: &str, ty: Ty) -> Self {
        self.params.push(decl(name, ty));
        self
    }

    pub fn body(mut self, stmts: Vec<Spanned<Stmt>>) -> Self {
        self.body = stmts;
        self
    }

    pub fn static_(mut self) -> Self {
        self.is_static = true;
        self
    }

    pub fn private(mut self) -> Self {
        self.is_public = false;
        self
    }
}

pub fn class(name: &str) -> ClassDecl {
    ClassDecl {
        name: Spanned::dummy(name.to_string()),
        super_name: None,
        fields: Vec::new(),
        methods: Vec::new(),
    }
}

impl ClassDecl {
    pub fn extends(mut self, super_name: &str) -> Self {
        self.super_name = Some(Spanned::dummy(super_name.to_string()));
        self
    }

    pub fn field(mut self, name: &str, ty: Ty) -> Self {
        self.fields.push(decl(name, ty));
        self
    }

    pub fn method(mut self, method: MethodDecl) -> Self {
        self.methods.push(method);
        self
    }
}

pub fn program(imports: &[&str], classes: Vec<ClassDecl>) -> Program {
    Program {
        imports: imports
            .iter()
            .map(|i| Spanned::dummy(i.to_string()))
            .collect(),
        classes,
    }
}
