//! Scoping, hoisting and shadowing as seen through bound references.

use super::{index, link};
use crate::{ModuleGraph, Reference};

fn references<'g>(graph: &'g ModuleGraph, name: &str) -> Vec<&'g Reference> {
    graph
        .module(index(graph, "main.js"))
        .statements()
        .iter()
        .flat_map(|statement| statement.references())
        .filter(|reference| reference.name == name)
        .collect()
}

#[test]
fn block_scoped_binding_is_invisible_outside_its_block() {
    let graph = link(&[(
        "main.js",
        "function f() {
           { let inner = 1; inner; }
           return inner;
         }",
    )]);

    let refs = references(&graph, "inner");
    assert_eq!(refs.len(), 2);

    let inside = refs[0].declaration.expect("bound inside the block");
    assert_eq!(graph.declaration(inside).name(), "inner");
    assert!(refs[1].declaration.is_none(), "outside the block it is a global");
}

#[test]
fn var_in_nested_block_hoists_to_function_scope() {
    let graph = link(&[(
        "main.js",
        "function f() {
           if (ok) { for (;;) { var hoisted = 1; } }
           return hoisted;
         }",
    )]);

    let refs = references(&graph, "hoisted");
    let key = refs[0].declaration.expect("hoisted var is visible");
    let module = graph.module(key.module);
    let scope = module.scopes().scope(graph.declaration(key).scope());
    assert!(!scope.is_block());
    assert!(module.top_level("hoisted").is_none());
}

#[test]
fn top_level_var_in_block_hoists_to_module() {
    let graph = link(&[("main.js", "{ var a = 1; }\nexport const b = a;")]);

    let refs = references(&graph, "a");
    let key = refs[0].declaration.expect("bound to the hoisted var");
    assert_eq!(graph.module(key.module).top_level("a"), Some(key.declaration));
}

#[test]
fn inner_declaration_shadows_outer() {
    let graph = link(&[(
        "main.js",
        "const x = 1;
         function f() { const x = 2; return x; }
         function g() { return x; }",
    )]);

    let module = graph.module(index(&graph, "main.js"));
    let outer = module.top_level("x").unwrap();
    let refs = references(&graph, "x");

    assert_ne!(refs[0].declaration.unwrap().declaration, outer);
    assert_eq!(refs[1].declaration.unwrap().declaration, outer);
}

#[test]
fn parameters_and_catch_bindings_shadow_imports() {
    let graph = link(&[
        (
            "main.js",
            "import { e } from './dep.js';
             export function f(e) { return e; }
             export function g() { try {} catch (e) { return e; } }
             export function h() { return e; }",
        ),
        ("dep.js", "export const e = 1;"),
    ]);

    let refs = references(&graph, "e");
    let dep = index(&graph, "dep.js");
    assert_ne!(refs[0].declaration.unwrap().module, dep);
    assert_ne!(refs[1].declaration.unwrap().module, dep);
    assert_eq!(refs[2].declaration.unwrap().module, dep);
}

#[test]
fn hoisted_function_declared_after_use_is_bound() {
    let graph = link(&[("main.js", "export const a = later();\nfunction later() {}")]);

    let refs = references(&graph, "later");
    let key = refs[0].declaration.expect("function declarations hoist");
    assert_eq!(graph.declaration(key).name(), "later");
}

#[test]
fn undeclared_names_are_globals() {
    let graph = link(&[("main.js", "console.log(window.location);")]);

    assert!(references(&graph, "console")[0].declaration.is_none());
    assert!(references(&graph, "window")[0].declaration.is_none());
}
