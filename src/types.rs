use std::fmt;

use serde::{Deserialize, Serialize};

/// Semantic types of the language.
///
/// "Unresolved" is never a variant: passes that may fail to find a type use
/// `Option<Ty>` instead.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Ty {
    Int,
    Bool,
    /// `String`; only reachable through `main(String[] args)`.
    Str,
    Void,
    /// A user class, the current class, or an imported class.
    Class(String),
    Array(Box<Ty>),
}

impl Ty {
    pub fn array_of(elem: Ty) -> Ty {
        Ty::Array(Box::new(elem))
    }

    pub fn class(name: &str) -> Ty {
        Ty::Class(name.to_string())
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Ty::Array(_))
    }

    pub fn element(&self) -> Option<&Ty> {
        match self {
            Ty::Array(elem) => Some(elem),
            _ => None,
        }
    }

    /// Values held in integer slots on the stack machine (`iload`/`istore`).
    pub fn is_int_like(&self) -> bool {
        matches!(self, Ty::Int | Ty::Bool)
    }

    /// Source-level spelling, used in diagnostics.
    pub fn display(&self) -> String {
        match self {
            Ty::Int => "int".to_string(),
            Ty::Bool => "boolean".to_string(),
            Ty::Str => "String".to_string(),
            Ty::Void => "void".to_string(),
            Ty::Class(name) => name.clone(),
            Ty::Array(elem) => format!("{}[]", elem.display()),
        }
    }

    /// IR type suffix: `.i32`, `.bool`, `.array.i32`, `.Foo`, `.V`.
    pub fn ir_suffix(&self) -> String {
        match self {
            Ty::Int => ".i32".to_string(),
            Ty::Bool => ".bool".to_string(),
            Ty::Str => ".String".to_string(),
            Ty::Void => ".V".to_string(),
            Ty::Class(name) => format!(".{}", name),
            Ty::Array(elem) => format!(".array{}", elem.ir_suffix()),
        }
    }
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}
