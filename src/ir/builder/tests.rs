//! IrBuilder unit tests.

use std::collections::HashSet;

use super::*;
use crate::ast::build::*;
use crate::ir::{CallKind, Element};
use crate::span::Spanned;
use crate::typecheck::annotate;

fn lower(p: &Program) -> Vec<ClassUnit> {
    let table = SymbolTable::from_program(p);
    let ann = annotate(p, &table);
    assert!(!ann.has_errors(), "{:?}", ann.diagnostics);
    IrBuilder::new(&table, &ann).build_program(p).unwrap()
}

fn lines(unit: &ClassUnit, method: &str) -> Vec<String> {
    unit.method(method)
        .unwrap()
        .instructions
        .iter()
        .map(|i| i.to_string())
        .collect()
}

// ── Test: return of a constant sum ──

#[test]
fn test_return_binary_of_literals() {
    let mut b = AstBuilder::new();
    let sum = {
        let l = b.int(1);
        let r = b.int(2);
        b.binary(BinOp::Add, l, r)
    };
    let p = program(&[], vec![class("Foo").method(method("m", Ty::Int).body(vec![ret(Some(sum))]))]);
    let units = lower(&p);
    assert_eq!(
        lines(&units[0], "m"),
        vec!["tmp0.i32 :=.i32 1.i32 +.i32 2.i32", "ret.i32 tmp0.i32"]
    );
}

// ── Test: implicit field read ──

#[test]
fn test_field_read_goes_through_temp() {
    let mut b = AstBuilder::new();
    let x = b.var("x");
    let p = program(
        &[],
        vec![class("Foo")
            .field("x", Ty::Int)
            .method(method("get", Ty::Int).body(vec![ret(Some(x))]))],
    );
    let units = lower(&p);
    assert_eq!(
        lines(&units[0], "get"),
        vec!["tmp0.i32 :=.i32 getfield(this, x.i32).i32", "ret.i32 tmp0.i32"]
    );
}

#[test]
fn test_field_write_is_putfield() {
    let mut b = AstBuilder::new();
    let one = b.int(1);
    let p = program(
        &[],
        vec![class("Foo")
            .field("x", Ty::Int)
            .method(method("set", Ty::Void).body(vec![assign("x", one)]))],
    );
    let units = lower(&p);
    assert_eq!(
        lines(&units[0], "set"),
        vec!["putfield(this, x.i32, 1.i32).V", "ret.V"]
    );
}

// ── Test: parameter prefix outside of return ──

#[test]
fn test_param_prefix_omitted_in_return() {
    let mut b = AstBuilder::new();
    let inc = {
        let l = b.var("a");
        let r = b.int(1);
        b.binary(BinOp::Add, l, r)
    };
    let a = b.var("a");
    let p = program(
        &[],
        vec![class("Foo").method(
            method("inc", Ty::Int)
                .param("a", Ty::Int)
                .body(vec![assign("a", inc), ret(Some(a))]),
        )],
    );
    let units = lower(&p);
    assert_eq!(
        lines(&units[0], "inc"),
        vec![
            "tmp0.i32 :=.i32 $1.a.i32 +.i32 1.i32",
            "$1.a.i32 :=.i32 tmp0.i32",
            "ret.i32 a.i32",
        ]
    );
}

// ── Test: call ordering and materialization ──

fn two_getters(body: Vec<Spanned<Stmt>>, ret_ty: Ty) -> Program {
    let mut b = AstBuilder::new();
    let one = b.int(1);
    let two = b.int(2);
    let n = b.var("n");
    let mut p = program(
        &["io"],
        vec![class("Foo")
            .method(method("a", Ty::Int).body(vec![ret(Some(one))]))
            .method(method("b", Ty::Int).body(vec![ret(Some(two))]))
            .method(method("take", Ty::Int).param("n", Ty::Int).body(vec![ret(Some(n))]))
            .method(method("m", ret_ty).body(body))],
    );
    p.assign_node_ids();
    p
}

#[test]
fn test_call_operands_evaluated_left_to_right() {
    let mut b = AstBuilder::new();
    let sum = {
        let this = b.this();
        let a = b.call(this, "a", vec![]);
        let this = b.this();
        let bb = b.call(this, "b", vec![]);
        b.binary(BinOp::Add, a, bb)
    };
    let p = two_getters(vec![ret(Some(sum))], Ty::Int);
    let units = lower(&p);
    assert_eq!(
        lines(&units[0], "m"),
        vec![
            "tmp0.i32 :=.i32 invokevirtual(this.Foo, \"a\").i32",
            "tmp1.i32 :=.i32 invokevirtual(this.Foo, \"b\").i32",
            "tmp2.i32 :=.i32 tmp0.i32 +.i32 tmp1.i32",
            "ret.i32 tmp2.i32",
        ]
    );
}

#[test]
fn test_discarded_call_is_not_materialized() {
    let mut b = AstBuilder::new();
    let this_call = {
        let this = b.this();
        b.call(this, "a", vec![])
    };
    let print = {
        let io = b.var("io");
        let arg = b.int(7);
        b.call(io, "println", vec![arg])
    };
    let p = two_getters(vec![expr_stmt(this_call), expr_stmt(print)], Ty::Void);
    let units = lower(&p);
    assert_eq!(
        lines(&units[0], "m"),
        vec![
            "invokevirtual(this.Foo, \"a\").i32",
            "invokestatic(io, \"println\", 7.i32).V",
            "ret.V",
        ]
    );
    let m = units[0].method("m").unwrap();
    assert!(matches!(
        m.instructions[1],
        Instruction::Call {
            kind: CallKind::Static,
            ..
        }
    ));
}

#[test]
fn test_arguments_lowered_before_target() {
    let mut b = AstBuilder::new();
    let call = {
        let recv = b.new_object("Foo");
        let this = b.this();
        let arg = b.call(this, "a", vec![]);
        b.call(recv, "take", vec![arg])
    };
    let p = two_getters(vec![expr_stmt(call)], Ty::Void);
    let units = lower(&p);
    assert_eq!(
        lines(&units[0], "m"),
        vec![
            "tmp0.i32 :=.i32 invokevirtual(this.Foo, \"a\").i32",
            "tmp1.Foo :=.Foo new(Foo).Foo",
            "invokespecial(tmp1.Foo, \"<init>\").V",
            "invokevirtual(tmp1.Foo, \"take\", tmp0.i32).i32",
            "ret.V",
        ]
    );
}

// ── Test: temporaries are unique across a run ──

#[test]
fn test_temporaries_unique_across_classes() {
    let mut b = AstBuilder::new();
    let make_sum = |b: &mut AstBuilder| {
        let l = b.var("x");
        let r = b.int(1);
        b.binary(BinOp::Add, l, r)
    };
    let s1 = make_sum(&mut b);
    let s2 = make_sum(&mut b);
    let s3 = make_sum(&mut b);
    let p = program(
        &[],
        vec![
            class("A")
                .field("x", Ty::Int)
                .method(method("f", Ty::Int).body(vec![assign("x", s1), ret(Some(s2))])),
            class("B")
                .field("x", Ty::Int)
                .method(method("g", Ty::Int).body(vec![ret(Some(s3))])),
        ],
    );
    let table = SymbolTable::from_program(&p);
    let ann = annotate(&p, &table);
    let mut builder = IrBuilder::new(&table, &ann);
    let units = builder.build_program(&p).unwrap();
    let mut seen = HashSet::new();
    for unit in &units {
        for m in &unit.methods {
            for inst in &m.instructions {
                if let Instruction::Assign { dest, .. } = inst {
                    let name = dest.name().unwrap().to_string();
                    if name.starts_with("tmp") {
                        assert!(seen.insert(name.clone()), "temporary {} reused", name);
                    }
                }
            }
        }
    }
    // 3 field reads + 3 adds
    assert_eq!(seen.len(), 6);
    assert_eq!(builder.temps_issued(), 6);
}

// ── Test: control flow ──

#[test]
fn test_while_loop_labels() {
    let mut b = AstBuilder::new();
    let cond = {
        let l = b.var("i");
        let r = b.int(10);
        b.binary(BinOp::Lt, l, r)
    };
    let step = {
        let l = b.var("i");
        let r = b.int(1);
        b.binary(BinOp::Add, l, r)
    };
    let zero = b.int(0);
    let p = program(
        &[],
        vec![class("Foo").method(method("count", Ty::Void).body(vec![
            var_decl("i", Ty::Int),
            assign("i", zero),
            while_(cond, block(vec![assign("i", step)])),
        ]))],
    );
    let units = lower(&p);
    assert_eq!(
        lines(&units[0], "count"),
        vec![
            "i.i32 :=.i32 0.i32",
            "while_cond_0:",
            "tmp0.bool :=.bool i.i32 <.bool 10.i32",
            "if (tmp0.bool) goto while_body_0",
            "goto while_end_0",
            "while_body_0:",
            "tmp1.i32 :=.i32 i.i32 +.i32 1.i32",
            "i.i32 :=.i32 tmp1.i32",
            "goto while_cond_0",
            "while_end_0:",
            "ret.V",
        ]
    );
}

#[test]
fn test_if_else_layout() {
    let mut b = AstBuilder::new();
    let cond = b.var("flag");
    let one = b.int(1);
    let two = b.int(2);
    let p = program(
        &[],
        vec![class("Foo").method(method("pick", Ty::Int).param("flag", Ty::Bool).body(vec![
            var_decl("r", Ty::Int),
            if_(cond, assign("r", one), Some(assign("r", two))),
            ret(Some(b.var("r"))),
        ]))],
    );
    let units = lower(&p);
    assert_eq!(
        lines(&units[0], "pick"),
        vec![
            "if ($1.flag.bool) goto then_0",
            "r.i32 :=.i32 2.i32",
            "goto endif_0",
            "then_0:",
            "r.i32 :=.i32 1.i32",
            "endif_0:",
            "ret.i32 r.i32",
        ]
    );
}

#[test]
fn test_if_else_both_returning_has_no_join() {
    let mut b = AstBuilder::new();
    let cond = b.var("flag");
    let one = b.int(1);
    let two = b.int(2);
    let p = program(
        &[],
        vec![class("Foo").method(method("pick", Ty::Int).param("flag", Ty::Bool).body(vec![
            if_(cond, ret(Some(one)), Some(ret(Some(two)))),
        ]))],
    );
    let units = lower(&p);
    assert_eq!(
        lines(&units[0], "pick"),
        vec![
            "if ($1.flag.bool) goto then_0",
            "ret.i32 2.i32",
            "then_0:",
            "ret.i32 1.i32",
        ]
    );
}

#[test]
fn test_void_method_gets_trailing_return_after_early_return() {
    let mut b = AstBuilder::new();
    let cond = b.var("flag");
    let one = b.int(1);
    let p = program(
        &[],
        vec![class("Foo").field("x", Ty::Int).method(
            method("set", Ty::Void)
                .param("flag", Ty::Bool)
                .body(vec![if_(cond, ret(None), None), assign("x", one)]),
        )],
    );
    let units = lower(&p);
    assert_eq!(
        lines(&units[0], "set"),
        vec![
            "if ($1.flag.bool) goto then_0",
            "goto endif_0",
            "then_0:",
            "ret.V",
            "endif_0:",
            "putfield(this, x.i32, 1.i32).V",
            "ret.V",
        ]
    );
}

#[test]
fn test_own_method_call_carries_declared_params() {
    // class Foo extends Bar { int take(Bar b) { return 1; } int run() { return this.take(this); } }
    let mut b = AstBuilder::new();
    let one = b.int(1);
    let call = {
        let recv = b.this();
        let arg = b.this();
        b.call(recv, "take", vec![arg])
    };
    let p = program(
        &["Bar"],
        vec![class("Foo")
            .extends("Bar")
            .method(method("take", Ty::Int).param("b", Ty::class("Bar")).body(vec![ret(Some(one))]))
            .method(method("run", Ty::Int).body(vec![ret(Some(call))]))],
    );
    let units = lower(&p);
    let run = units[0].method("run").unwrap();
    let Instruction::Assign { rhs, .. } = &run.instructions[0] else {
        panic!("expected an assignment, got {}", run.instructions[0]);
    };
    let Instruction::Call { params, .. } = rhs.as_ref() else {
        panic!("expected a call, got {}", rhs);
    };
    assert_eq!(params.as_deref(), Some(&[Ty::class("Bar")][..]));
}

// ── Test: arrays ──

#[test]
fn test_array_store_and_load() {
    let mut b = AstBuilder::new();
    let size = b.int(4);
    let arr = b.new_array(size);
    let idx = b.int(0);
    let val = b.int(9);
    let read = {
        let a = b.var("arr");
        let i = b.int(0);
        b.index(a, i)
    };
    let p = program(
        &[],
        vec![class("Foo").method(method("m", Ty::Int).body(vec![
            var_decl("arr", Ty::array_of(Ty::Int)),
            assign("arr", arr),
            array_assign("arr", idx, val),
            ret(Some(read)),
        ]))],
    );
    let units = lower(&p);
    assert_eq!(
        lines(&units[0], "m"),
        vec![
            "tmp0.array.i32 :=.array.i32 new(array, 4.i32).array.i32",
            "arr.array.i32 :=.array.i32 tmp0.array.i32",
            "arr[0.i32].i32 :=.i32 9.i32",
            "tmp1.i32 :=.i32 arr[0.i32].i32",
            "ret.i32 tmp1.i32",
        ]
    );
}

// ── Test: class shape ──

#[test]
fn test_class_unit_has_one_trailing_constructor() {
    let p = program(
        &["io"],
        vec![class("Foo")
            .extends("Base")
            .field("x", Ty::Int)
            .method(method("run", Ty::Void))],
    );
    let units = lower(&p);
    let unit = &units[0];
    assert_eq!(unit.imports, vec!["io".to_string()]);
    assert_eq!(unit.super_name.as_deref(), Some("Base"));
    assert_eq!(unit.methods.len(), 2);
    assert!(unit.methods.last().unwrap().is_constructor);
    assert_eq!(unit.methods.iter().filter(|m| m.is_constructor).count(), 1);
    assert_eq!(lines(unit, "run"), vec!["ret.V"]);
}

// ── Test: internal faults ──

#[test]
fn test_unannotated_value_is_a_fault() {
    let mut b = AstBuilder::new();
    let sum = {
        let l = b.int(1);
        let r = b.int(2);
        b.binary(BinOp::Add, l, r)
    };
    let p = program(&[], vec![class("Foo").method(method("m", Ty::Int).body(vec![ret(Some(sum))]))]);
    let table = SymbolTable::from_program(&p);
    let empty = Annotation::default();
    let err = IrBuilder::new(&table, &empty).build_program(&p).unwrap_err();
    assert!(matches!(err, LowerError::Unresolved { .. }));
}

#[test]
fn test_missing_class_symbols_is_a_fault() {
    let p = program(&[], vec![class("Foo")]);
    let table = SymbolTable::new();
    let ann = Annotation::default();
    let err = IrBuilder::new(&table, &ann).build_program(&p).unwrap_err();
    assert_eq!(err, LowerError::MissingClass("Foo".to_string()));
    assert_eq!(err.to_string(), "class 'Foo' is missing from the symbol table");
}

#[test]
fn test_this_lowers_to_fixed_operand() {
    let mut b = AstBuilder::new();
    let this = b.this();
    let p = program(
        &[],
        vec![class("Foo").method(method("me", Ty::class("Foo")).body(vec![ret(Some(this))]))],
    );
    let units = lower(&p);
    let m = units[0].method("me").unwrap();
    assert_eq!(
        m.instructions[0],
        Instruction::Return {
            ty: Ty::class("Foo"),
            operand: Some(Element::this("Foo")),
        }
    );
}
