
use crate::ast::build::*;
use crate::ast::{Program, Stmt};
use crate::diagnostic::Diagnostic;
use crate::span::Spanned;
use crate::symbols::SymbolTable;
use crate::typecheck::{annotate, Annotation};
use crate::types::Ty;

pub(super) fn run(program: &Program) -> Annotation {
    annotate(program, &SymbolTable::from_program(program))
}

pub(super) fn errors(program: &Program) -> Vec<Diagnostic> {
    run(program)
        .diagnostics
        .into_iter()
        .filter(Diagnostic::is_error)
        .collect()
}

pub(super) fn assert_errors_contain(program: &Program, needle: &str) {
    let errs = errors(program);
    assert!(
        errs.iter().any(|d| d.message.contains(needle)),
        "expected an error containing {:?}, got {:?}",
        needle,
        errs.iter().map(|d| &d.message).collect::<Vec<_>>()
    );
}

/// `import io; class Foo { int x; boolean flag; int[] arr; <ret> m(int a, boolean b) { body } }`
pub(super) fn in_method(ret: Ty, body: Vec<Spanned<Stmt>>) -> Program {
    program(
        &["io"],
        vec![class("Foo")
            .field("x", Ty::Int)
            .field("flag", Ty::Bool)
            .field("arr", Ty::array_of(Ty::Int))
            .method(
                method("m", ret)
                    .param("a", Ty::Int)
                    .param("b", Ty::Bool)
                    .body(body),
            )],
    )
}
