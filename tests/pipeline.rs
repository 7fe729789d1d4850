//! End-to-end: tree and table in, IR and assembly text out.

use std::fs;

use jmmc::ast::build::*;
use jmmc::ast::{BinOp, Program};
use jmmc::symbols::SymbolTable;
use jmmc::types::Ty;
use jmmc::{compile, compile_input, load_input, lower, CompileOptions};

fn adder() -> Program {
    let mut b = AstBuilder::new();
    let sum = {
        let l = b.var("a");
        let r = b.var("b");
        b.binary(BinOp::Add, l, r)
    };
    program(
        &[],
        vec![class("Adder").method(
            method("add", Ty::Int)
                .param("a", Ty::Int)
                .param("b", Ty::Int)
                .body(vec![ret(Some(sum))]),
        )],
    )
}

#[test]
fn test_adder_ir() {
    let p = adder();
    let table = SymbolTable::from_program(&p);
    let units = lower(&p, &table).unwrap();
    insta::assert_snapshot!(units[0].to_string(), @r#"
Adder {

.method public add(a.i32, b.i32).i32 {
    tmp0.i32 :=.i32 a.i32 +.i32 b.i32;
    ret.i32 tmp0.i32;
}

.construct Adder().V {
    invokespecial(this.Adder, "<init>").V;
    ret.V;
}
}
"#);
}

#[test]
fn test_adder_assembly() {
    let p = adder();
    let table = SymbolTable::from_program(&p);
    let out = compile(&p, &table).unwrap();
    insta::assert_snapshot!(out.assembly(), @r#"
.class public Adder
.super java/lang/Object

;default constructor
.method public <init>()V
   aload_0
   invokespecial java/lang/Object/<init>()V
   return
.end method

.method public add(II)I
   .limit stack 99
   .limit locals 99
   iload 1
   iload 2
   iadd
   istore 3
   iload 3
   ireturn
.end method
"#);
}

#[test]
fn test_counting_loop_structure() {
    // int sum(int n) { int i; int s; i = 0; s = 0;
    //   while (i < n) { s = s + i; i = i + 1; } return s; }
    let mut b = AstBuilder::new();
    let (i0, s0) = (b.int(0), b.int(0));
    let cond = {
        let i = b.var("i");
        let n = b.var("n");
        b.binary(BinOp::Lt, i, n)
    };
    let add_s = {
        let s = b.var("s");
        let i = b.var("i");
        b.binary(BinOp::Add, s, i)
    };
    let inc = {
        let i = b.var("i");
        let one = b.int(1);
        b.binary(BinOp::Add, i, one)
    };
    let s = b.var("s");
    let p = program(
        &[],
        vec![class("Loop").method(
            method("sum", Ty::Int).param("n", Ty::Int).body(vec![
                var_decl("i", Ty::Int),
                var_decl("s", Ty::Int),
                assign("i", i0),
                assign("s", s0),
                while_(cond, block(vec![assign("s", add_s), assign("i", inc)])),
                ret(Some(s)),
            ]),
        )],
    );
    let table = SymbolTable::from_program(&p);
    let units = lower(&p, &table).unwrap();
    let ir = units[0].to_string();
    assert!(ir.contains("  while_cond_0:\n    tmp0.bool :=.bool i.i32 <.bool $1.n.i32;\n"));
    assert!(ir.contains("    if (tmp0.bool) goto while_body_0;\n    goto while_end_0;\n"));
    assert!(ir.contains("    ret.i32 s.i32;\n"));

    let asm = compile(&p, &table).unwrap().assembly();
    // this=0, n=1, i=2, s=3
    assert!(asm.contains("   iload 2\n   iload 1\n   if_icmplt cmp_true_0\n"));
    assert!(asm.contains("   iload 3\n   ireturn\n"));
}

#[test]
fn test_bundle_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("hello.json");
    let bundle = r#"{
        "program": {
            "imports": [{ "node": "io" }],
            "classes": [{
                "name": { "node": "Hello" },
                "methods": [{
                    "is_public": true,
                    "is_static": true,
                    "name": { "node": "main" },
                    "return_ty": { "node": "Void" },
                    "params": [{ "name": { "node": "args" }, "ty": { "node": { "Array": "Str" } } }],
                    "body": [{ "node": { "Expr": { "kind": { "Call": {
                        "receiver": { "kind": { "Var": "io" } },
                        "method": { "node": "println" },
                        "args": [{ "kind": { "IntLit": 42 } }]
                    } } } } }]
                }]
            }]
        },
        "filename": "Hello.jmm"
    }"#;
    fs::write(&path, bundle).unwrap();

    let input = load_input(&path).unwrap();
    assert_eq!(input.display_name("?"), "Hello.jmm");
    let out = compile_input(&input, &CompileOptions::default().with_print_ir(true)).unwrap();
    let class = &out.classes[0];
    assert!(class
        .ir
        .as_deref()
        .unwrap()
        .contains("    invokestatic(io, \"println\", 42.i32).V;\n"));
    insta::assert_snapshot!(class.assembly.lines().skip(6).collect::<Vec<_>>().join("\n"), @r#"
   invokespecial java/lang/Object/<init>()V
   return
.end method

.method public static main([Ljava/lang/String;)V
   .limit stack 99
   .limit locals 99
   ldc 42
   invokestatic io/println(I)V
   return
.end method
"#);
}
