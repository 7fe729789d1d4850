//! jmmc: the backend of a compiler for a small Java subset.
//!
//! A parsed `Program` and its `SymbolTable` go through three stages: type
//! annotation (`typecheck`), lowering to a three-address IR (`ir::builder`),
//! and emission of Jasmin assembly (`ir::lower`). `api` sequences them.

pub mod api;
pub mod ast;
pub mod diagnostic;
pub mod ir;
pub mod span;
pub mod symbols;
pub mod typecheck;
pub mod types;

pub use api::*;
pub use diagnostic::{render_diagnostics, Diagnostic};
