//! AST traversal and node numbering.

use std::collections::HashSet;

use super::{Expr, ExprKind, NodeId, Program, Stmt};

impl Expr {
    /// Direct sub-expressions, left to right.
    pub fn children(&self) -> Vec<&Expr> {
        match &self.kind {
            ExprKind::IntLit(_)
            | ExprKind::BoolLit(_)
            | ExprKind::Var(_)
            | ExprKind::This
            | ExprKind::NewObject(_) => Vec::new(),
            ExprKind::Negate(e)
            | ExprKind::NewArray(e)
            | ExprKind::Length(e)
            | ExprKind::Paren(e) => vec![e],
            ExprKind::Binary { lhs, rhs, .. } => vec![lhs, rhs],
            ExprKind::Call { receiver, args, .. } => {
                let mut out = vec![receiver.as_ref()];
                out.extend(args.iter());
                out
            }
            ExprKind::Index { array, index } => vec![array, index],
        }
    }

    fn for_each_mut(&mut self, f: &mut impl FnMut(&mut Expr)) {
        f(self);
        match &mut self.kind {
            ExprKind::IntLit(_)
            | ExprKind::BoolLit(_)
            | ExprKind::Var(_)
            | ExprKind::This
            | ExprKind::NewObject(_) => {}
            ExprKind::Negate(e)
            | ExprKind::NewArray(e)
            | ExprKind::Length(e)
            | ExprKind::Paren(e) => e.for_each_mut(f),
            ExprKind::Binary { lhs, rhs, .. } => {
                lhs.for_each_mut(f);
                rhs.for_each_mut(f);
            }
            ExprKind::Call { receiver, args, .. } => {
                receiver.for_each_mut(f);
                for arg in args {
                    arg.for_each_mut(f);
                }
            }
            ExprKind::Index { array, index } => {
                array.for_each_mut(f);
                index.for_each_mut(f);
            }
        }
    }
}

impl Stmt {
    /// Root expressions of this statement and of the statements nested
    /// in it, in source order.
    pub fn exprs(&self) -> Vec<&Expr> {
        match self {
            Stmt::VarDecl(_) | Stmt::Return(None) => Vec::new(),
            Stmt::Block(stmts) => stmts.iter().flat_map(|s| s.node.exprs()).collect(),
            Stmt::If {
                cond,
                then_branch,
                else_branch,
            } => {
                let mut out = vec![cond];
                out.extend(then_branch.node.exprs());
                if let Some(else_branch) = else_branch {
                    out.extend(else_branch.node.exprs());
                }
                out
            }
            Stmt::While { cond, body } => {
                let mut out = vec![cond];
                out.extend(body.node.exprs());
                out
            }
            Stmt::Expr(e) | Stmt::Assign { value: e, .. } | Stmt::Return(Some(e)) => vec![e],
            Stmt::ArrayAssign { index, value, .. } => vec![index, value],
        }
    }

    fn for_each_expr_mut(&mut self, f: &mut impl FnMut(&mut Expr)) {
        match self {
            Stmt::VarDecl(_) => {}
            Stmt::Block(stmts) => {
                for s in stmts {
                    s.node.for_each_expr_mut(f);
                }
            }
            Stmt::If {
                cond,
                then_branch,
                else_branch,
            } => {
                cond.for_each_mut(f);
                then_branch.node.for_each_expr_mut(f);
                if let Some(else_branch) = else_branch {
                    else_branch.node.for_each_expr_mut(f);
                }
            }
            Stmt::While { cond, body } => {
                cond.for_each_mut(f);
                body.node.for_each_expr_mut(f);
            }
            Stmt::Expr(e) => e.for_each_mut(f),
            Stmt::Assign { value, .. } => value.for_each_mut(f),
            Stmt::ArrayAssign { index, value, .. } => {
                index.for_each_mut(f);
                value.for_each_mut(f);
            }
            Stmt::Return(e) => {
                if let Some(e) = e {
                    e.for_each_mut(f);
                }
            }
        }
    }

    /// Whether every path through this statement ends in a `return`: a
    /// `return` itself, a block whose last statement definitely returns,
    /// or an `if` with an `else` where both branches do. Loops never count.
    pub fn definitely_returns(&self) -> bool {
        match self {
            Stmt::Return(_) => true,
            Stmt::Block(stmts) => stmts.last().is_some_and(|s| s.node.definitely_returns()),
            Stmt::If {
                then_branch,
                else_branch: Some(else_branch),
                ..
            } => then_branch.node.definitely_returns() && else_branch.node.definitely_returns(),
            Stmt::If { .. }
            | Stmt::While { .. }
            | Stmt::VarDecl(_)
            | Stmt::Expr(_)
            | Stmt::Assign { .. }
            | Stmt::ArrayAssign { .. } => false,
        }
    }
}

impl Program {
    /// Give every expression a fresh, unique `NodeId` in pre-order.
    /// Returns the number of ids handed out.
    pub fn assign_node_ids(&mut self) -> u32 {
        let mut next = 0u32;
        let mut number = |e: &mut Expr| {
            e.id = NodeId(next);
            next += 1;
        };
        for class in &mut self.classes {
            for method in &mut class.methods {
                for stmt in &mut method.body {
                    stmt.node.for_each_expr_mut(&mut number);
                }
            }
        }
        next
    }

    /// Whether no two expressions share a `NodeId`. Trees built with
    /// `AstBuilder` or renumbered by `assign_node_ids` always do; a tree
    /// deserialized on its own has every id at zero.
    pub fn has_unique_node_ids(&self) -> bool {
        let mut seen = HashSet::new();
        let mut pending: Vec<&Expr> = self
            .classes
            .iter()
            .flat_map(|c| &c.methods)
            .flat_map(|m| &m.body)
            .flat_map(|s| s.node.exprs())
            .collect();
        while let Some(e) = pending.pop() {
            if !seen.insert(e.id) {
                return false;
            }
            pending.extend(e.children());
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::build::*;
    use crate::ast::BinOp;
    use crate::types::Ty;

    fn sample() -> Program {
        let mut b = AstBuilder::new();
        let sum = {
            let l = b.var("a");
            let r = b.int(1);
            b.binary(BinOp::Add, l, r)
        };
        let cond = {
            let l = b.var("a");
            let r = b.int(10);
            b.binary(BinOp::Lt, l, r)
        };
        let body = vec![
            while_(cond, block(vec![assign("a", sum)])),
            ret(Some(b.var("a"))),
        ];
        program(
            &[],
            vec![class("Foo").method(method("run", Ty::Int).body(body))],
        )
    }

    #[test]
    fn test_assign_node_ids_is_dense_and_unique() {
        let mut p = sample();
        let count = p.assign_node_ids();
        assert_eq!(count, 7);

        let mut seen = Vec::new();
        for s in &mut p.classes[0].methods[0].body {
            s.node.for_each_expr_mut(&mut |e| seen.push(e.id.0));
        }
        seen.sort_unstable();
        assert_eq!(seen, (0..7).collect::<Vec<_>>());
    }

    #[test]
    fn test_unique_node_ids() {
        let mut p = sample();
        // Two builders in one tree: ids collide until renumbered.
        let mut other = AstBuilder::new();
        let zero = other.int(0);
        p.classes[0].methods[0].body.push(expr_stmt(zero));
        assert!(!p.has_unique_node_ids());
        p.assign_node_ids();
        assert!(p.has_unique_node_ids());
    }

    #[test]
    fn test_definitely_returns() {
        let p = sample();
        let body = &p.classes[0].methods[0].body;
        assert!(!body[0].node.definitely_returns());
        assert!(body[1].node.definitely_returns());

        let mut b = AstBuilder::new();
        let (c1, c2, c3) = (b.bool(true), b.bool(true), b.var("c"));
        let (one, two, three) = (b.int(1), b.int(2), b.int(3));
        assert!(!if_(c1, ret(Some(one)), None).node.definitely_returns());
        let both = if_(c2, block(vec![ret(Some(two))]), Some(ret(Some(three))));
        assert!(both.node.definitely_returns());
        assert!(!while_(c3, ret(None)).node.definitely_returns());
        assert!(!block(vec![]).node.definitely_returns());
    }

    #[test]
    fn test_children_order() {
        let mut b = AstBuilder::new();
        let recv = b.this();
        let a1 = b.int(1);
        let a2 = b.int(2);
        let call = b.call(recv, "f", vec![a1, a2]);
        let kinds: Vec<_> = call.children().iter().map(|c| c.kind.clone()).collect();
        assert_eq!(
            kinds,
            vec![ExprKind::This, ExprKind::IntLit(1), ExprKind::IntLit(2)]
        );
    }
}
