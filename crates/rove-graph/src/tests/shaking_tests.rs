//! Reachability from the entry module's exports.

use super::{included_sources, index, link};
use crate::ModuleId;

#[test]
fn unused_helpers_are_excluded() {
    let mut graph = link(&[(
        "main.js",
        "function h() { return 1; }\nfunction unused() { return 2; }\nexport function main() { return h(); }",
    )]);
    let exports = graph.shake().unwrap();

    assert_eq!(exports.keys().collect::<Vec<_>>(), ["main"]);
    assert_eq!(
        included_sources(&graph, "main.js"),
        [
            "function h() { return 1; }",
            "export function main() { return h(); }"
        ]
    );

    let id = ModuleId::new_virtual("main.js");
    let unused = graph.find_top_level(&id, "unused").unwrap();
    assert!(!graph.declaration(unused).is_used());
    let main = graph.find_top_level(&id, "main").unwrap();
    assert!(graph.declaration(main).is_exported());
}

#[test]
fn reachability_crosses_module_boundaries() {
    let mut graph = link(&[
        (
            "main.js",
            "import { used } from './lib.js';\nexport const answer = used();",
        ),
        (
            "lib.js",
            "import { deep } from './deep.js';\nexport function used() { return deep; }\nexport function dropped() {}",
        ),
        ("deep.js", "export const deep = 42;\nexport const shallow = 0;"),
    ]);
    graph.shake().unwrap();

    assert_eq!(
        included_sources(&graph, "main.js"),
        ["export const answer = used();"]
    );
    assert_eq!(
        included_sources(&graph, "lib.js"),
        ["export function used() { return deep; }"]
    );
    assert_eq!(
        included_sources(&graph, "deep.js"),
        ["export const deep = 42;"]
    );
}

#[test]
fn default_export_expression_pulls_in_its_references() {
    let mut graph = link(&[
        ("main.js", "import d from './b.js';\nexport const x = d;"),
        (
            "b.js",
            "const a = 1;\nconst z = 2;\nexport default a + 1;",
        ),
    ]);
    graph.shake().unwrap();

    assert_eq!(
        included_sources(&graph, "b.js"),
        ["const a = 1;", "export default a + 1;"]
    );
}

#[test]
fn namespace_use_keeps_every_export() {
    let mut graph = link(&[
        (
            "main.js",
            "import * as ns from './b.js';\nexport function read() { return ns; }",
        ),
        (
            "b.js",
            "export const x = 1;\nexport const y = 2;\nconst hidden = 3;",
        ),
    ]);
    graph.shake().unwrap();

    assert_eq!(
        included_sources(&graph, "b.js"),
        ["export const x = 1;", "export const y = 2;"]
    );
}

#[test]
fn entry_star_exports_are_observable() {
    let mut graph = link(&[
        ("main.js", "export * from './b.js';"),
        ("b.js", "export const x = 1;\nconst y = 2;"),
    ]);
    let exports = graph.shake().unwrap();

    assert_eq!(exports.keys().collect::<Vec<_>>(), ["x"]);
    assert_eq!(included_sources(&graph, "b.js"), ["export const x = 1;"]);
}

#[test]
fn use_and_mark_are_idempotent() {
    let mut graph = link(&[(
        "main.js",
        "const a = 1;\nconst b = a;\nexport const c = b;",
    )]);
    let exports = graph.shake().unwrap();

    let snapshot = |graph: &crate::ModuleGraph| {
        graph
            .modules()
            .iter()
            .flat_map(|module| {
                module.statements().iter().map(|s| s.is_included()).chain(
                    module
                        .scopes()
                        .all_declarations()
                        .map(|(_, d)| d.is_used()),
                )
            })
            .collect::<Vec<_>>()
    };
    let before = snapshot(&graph);

    graph
        .use_declarations(exports.values().copied())
        .unwrap();
    let main = index(&graph, "main.js");
    for position in 0..3 {
        let statement = crate::StatementIndex::new(position);
        assert!(graph.mark_statement(main, statement).is_empty());
    }

    assert_eq!(snapshot(&graph), before);
}

#[test]
fn deferred_and_immediate_references_both_count() {
    let mut graph = link(&[(
        "main.js",
        "const early = 1;\nconst late = 2;\nexport const now = early;\nexport function later() { return late; }",
    )]);
    graph.shake().unwrap();

    assert_eq!(included_sources(&graph, "main.js").len(), 4);
}

#[test]
fn import_and_side_effect_statements_are_not_marked() {
    let mut graph = link(&[
        (
            "main.js",
            "import { f } from './b.js';\nconsole.log('hi');\nexport const g = f;",
        ),
        ("b.js", "export function f() {}"),
    ]);
    graph.shake().unwrap();

    assert_eq!(included_sources(&graph, "main.js"), ["export const g = f;"]);
}
