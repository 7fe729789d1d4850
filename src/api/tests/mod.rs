
/// A program exercising fields, an imported static call, object creation
/// and a virtual call, as a JSON bundle without a symbol table.
pub(super) const HELLO_BUNDLE: &str = r#"{
  "program": {
    "imports": [{ "node": "io" }],
    "classes": [{
      "name": { "node": "Foo" },
      "fields": [{ "name": { "node": "x" }, "ty": { "node": "Int" } }],
      "methods": [
        {
          "is_public": true,
          "name": { "node": "get" },
          "return_ty": { "node": "Int" },
          "body": [{ "node": { "Return": { "kind": { "Var": "x" } } } }]
        },
        {
          "is_public": true,
          "is_static": true,
          "name": { "node": "main" },
          "return_ty": { "node": "Void" },
          "params": [{ "name": { "node": "args" }, "ty": { "node": { "Array": "Str" } } }],
          "body": [{ "node": { "Expr": { "kind": { "Call": {
            "receiver": { "kind": { "Var": "io" } },
            "method": { "node": "println" },
            "args": [{ "kind": { "Call": {
              "receiver": { "kind": { "NewObject": { "node": "Foo" } } },
              "method": { "node": "get" },
              "args": []
            } } }]
          } } } } }]
        }
      ]
    }]
  }
}"#;
