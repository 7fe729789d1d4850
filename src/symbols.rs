//! Read-only symbol table built by the front end.
//!
//! The backend only queries it: class name and superclass, imports, fields,
//! and per-method parameters, locals and return type.

use serde::{Deserialize, Serialize};

use crate::ast::{Program, Stmt};
use crate::types::Ty;

/// A named, typed slot: field, parameter or local.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    pub name: String,
    pub ty: Ty,
}

impl Symbol {
    pub fn new(name: &str, ty: Ty) -> Self {
        Self {
            name: name.to_string(),
            ty,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodSymbols {
    pub name: String,
    pub return_ty: Ty,
    #[serde(default)]
    pub params: Vec<Symbol>,
    #[serde(default)]
    pub locals: Vec<Symbol>,
    #[serde(default = "default_true")]
    pub is_public: bool,
    #[serde(default)]
    pub is_static: bool,
}

fn default_true() -> bool {
    true
}

impl MethodSymbols {
    pub fn new(name: &str, return_ty: Ty) -> Self {
        Self {
            name: name.to_string(),
            return_ty,
            params: Vec::new(),
            locals: Vec::new(),
            is_public: true,
            is_static: false,
        }
    }

    pub fn with_param(mut self, name: &str, ty: Ty) -> Self {
        self.params.push(Symbol::new(name, ty));
        self
    }

    pub fn with_local(mut self, name: &str, ty: Ty) -> Self {
        self.locals.push(Symbol::new(name, ty));
        self
    }

    pub fn with_static(mut self, is_static: bool) -> Self {
        self.is_static = is_static;
        self
    }

    /// 1-based ordinal of a parameter, as used by the `$n.` IR prefix.
    pub fn param_index(&self, name: &str) -> Option<usize> {
        self.params
            .iter()
            .position(|p| p.name == name)
            .map(|i| i + 1)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassSymbols {
    pub name: String,
    #[serde(default)]
    pub super_name: Option<String>,
    #[serde(default)]
    pub fields: Vec<Symbol>,
    #[serde(default)]
    pub methods: Vec<MethodSymbols>,
}

/// Where a variable name resolved to inside a method body.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Binding<'a> {
    Local(&'a Symbol),
    /// `index` is 1-based.
    Param { index: usize, symbol: &'a Symbol },
    Field(&'a Symbol),
}

impl<'a> Binding<'a> {
    pub fn ty(&self) -> &'a Ty {
        match self {
            Binding::Local(s) | Binding::Field(s) => &s.ty,
            Binding::Param { symbol, .. } => &symbol.ty,
        }
    }

    pub fn is_field(&self) -> bool {
        matches!(self, Binding::Field(_))
    }
}

impl ClassSymbols {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            super_name: None,
            fields: Vec::new(),
            methods: Vec::new(),
        }
    }

    pub fn with_super(mut self, name: &str) -> Self {
        self.super_name = Some(name.to_string());
        self
    }

    pub fn with_field(mut self, name: &str, ty: Ty) -> Self {
        self.fields.push(Symbol::new(name, ty));
        self
    }

    pub fn with_method(mut self, method: MethodSymbols) -> Self {
        self.methods.push(method);
        self
    }

    pub fn method(&self, name: &str) -> Option<&MethodSymbols> {
        self.methods.iter().find(|m| m.name == name)
    }

    pub fn field(&self, name: &str) -> Option<&Symbol> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Resolve `name` inside `method`: locals shadow parameters, which
    /// shadow fields. First match wins.
    pub fn resolve<'a>(&'a self, method: &'a MethodSymbols, name: &str) -> Option<Binding<'a>> {
        if let Some(local) = method.locals.iter().find(|l| l.name == name) {
            return Some(Binding::Local(local));
        }
        if let Some(pos) = method.params.iter().position(|p| p.name == name) {
            return Some(Binding::Param {
                index: pos + 1,
                symbol: &method.params[pos],
            });
        }
        self.field(name).map(Binding::Field)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolTable {
    /// Dotted import paths in declaration order, e.g. `io`, `java.util.List`.
    #[serde(default)]
    pub imports: Vec<String>,
    #[serde(default)]
    pub classes: Vec<ClassSymbols>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_import(mut self, path: &str) -> Self {
        self.imports.push(path.to_string());
        self
    }

    pub fn with_class(mut self, class: ClassSymbols) -> Self {
        self.classes.push(class);
        self
    }

    pub fn imports(&self) -> &[String] {
        &self.imports
    }

    pub fn class(&self, name: &str) -> Option<&ClassSymbols> {
        self.classes.iter().find(|c| c.name == name)
    }

    /// Full dotted path of the import whose last segment is `name`.
    pub fn import_path(&self, name: &str) -> Option<&str> {
        self.imports
            .iter()
            .find(|path| path.rsplit('.').next() == Some(name))
            .map(String::as_str)
    }

    pub fn is_imported(&self, name: &str) -> bool {
        self.import_path(name).is_some()
    }

    /// Derive a table from the declarations of a tree: fields, parameters,
    /// and every local declared anywhere in a method body (in order).
    pub fn from_program(program: &Program) -> Self {
        let mut table = SymbolTable::new();
        table.imports = program.imports.iter().map(|i| i.node.clone()).collect();
        for class in &program.classes {
            let mut symbols = ClassSymbols::new(&class.name.node);
            symbols.super_name = class.super_name.as_ref().map(|s| s.node.clone());
            for field in &class.fields {
                symbols = symbols.with_field(&field.name.node, field.ty.node.clone());
            }
            for method in &class.methods {
                let mut m = MethodSymbols::new(&method.name.node, method.return_ty.node.clone())
                    .with_static(method.is_static);
                m.is_public = method.is_public;
                for param in &method.params {
                    m = m.with_param(&param.name.node, param.ty.node.clone());
                }
                for stmt in &method.body {
                    collect_locals(&stmt.node, &mut m.locals);
                }
                symbols.methods.push(m);
            }
            table.classes.push(symbols);
        }
        table
    }
}

fn collect_locals(stmt: &Stmt, out: &mut Vec<Symbol>) {
    match stmt {
        Stmt::VarDecl(decl) => out.push(Symbol::new(&decl.name.node, decl.ty.node.clone())),
        Stmt::Block(stmts) => {
            for s in stmts {
                collect_locals(&s.node, out);
            }
        }
        Stmt::If {
            then_branch,
            else_branch,
            ..
        } => {
            collect_locals(&then_branch.node, out);
            if let Some(e) = else_branch {
                collect_locals(&e.node, out);
            }
        }
        Stmt::While { body, .. } => collect_locals(&body.node, out),
        Stmt::Expr(_) | Stmt::Assign { .. } | Stmt::ArrayAssign { .. } | Stmt::Return(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shadowing_class() -> ClassSymbols {
        ClassSymbols::new("Foo")
            .with_field("a", Ty::Int)
            .with_field("b", Ty::Bool)
            .with_field("c", Ty::Int)
            .with_method(
                MethodSymbols::new("m", Ty::Int)
                    .with_param("a", Ty::Bool)
                    .with_param("b", Ty::Int)
                    .with_local("a", Ty::array_of(Ty::Int)),
            )
    }

    #[test]
    fn test_resolve_prefers_local_then_param_then_field() {
        let class = shadowing_class();
        let m = class.method("m").unwrap();

        let a = class.resolve(m, "a").unwrap();
        assert!(matches!(a, Binding::Local(_)));
        assert_eq!(a.ty(), &Ty::array_of(Ty::Int));

        let b = class.resolve(m, "b").unwrap();
        assert!(matches!(b, Binding::Param { index: 2, .. }));
        assert_eq!(b.ty(), &Ty::Int);

        let c = class.resolve(m, "c").unwrap();
        assert!(c.is_field());
        assert!(class.resolve(m, "zzz").is_none());
    }

    #[test]
    fn test_param_index_is_one_based() {
        let class = shadowing_class();
        let m = class.method("m").unwrap();
        assert_eq!(m.param_index("a"), Some(1));
        assert_eq!(m.param_index("b"), Some(2));
        assert_eq!(m.param_index("c"), None);
    }

    #[test]
    fn test_import_lookup_by_last_segment() {
        let table = SymbolTable::new()
            .with_import("io")
            .with_import("java.util.List");
        assert!(table.is_imported("io"));
        assert_eq!(table.import_path("List"), Some("java.util.List"));
        assert!(!table.is_imported("util"));
    }

    #[test]
    fn test_from_program_collects_nested_locals() {
        use crate::ast::build::*;

        let mut b = AstBuilder::new();
        let cond = b.bool(true);
        let p = program(
            &["io"],
            vec![class("Foo").extends("Bar").field("x", Ty::Int).method(
                method("m", Ty::Void).param("n", Ty::Int).body(vec![
                    var_decl("i", Ty::Int),
                    while_(cond, block(vec![var_decl("j", Ty::Bool)])),
                ]),
            )],
        );
        let table = SymbolTable::from_program(&p);
        assert!(table.is_imported("io"));
        let foo = table.class("Foo").unwrap();
        assert_eq!(foo.super_name.as_deref(), Some("Bar"));
        let m = foo.method("m").unwrap();
        assert_eq!(m.param_index("n"), Some(1));
        let locals: Vec<_> = m.locals.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(locals, vec!["i", "j"]);
    }

    #[test]
    fn test_deserialize_defaults() {
        let json = r#"{
            "imports": ["io"],
            "classes": [{
                "name": "Foo",
                "methods": [{ "name": "main", "return_ty": "Void", "is_static": true }]
            }]
        }"#;
        let table: SymbolTable = serde_json::from_str(json).unwrap();
        let foo = table.class("Foo").unwrap();
        assert!(foo.super_name.is_none());
        let main = foo.method("main").unwrap();
        assert!(main.is_public && main.is_static);
        assert!(main.params.is_empty());
    }
}
