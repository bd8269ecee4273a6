//! Property-based tests for reachability using proptest.
//!
//! Random call graphs of functions spread over several modules are rendered to
//! source, linked and shaken; the marked set must equal plain graph reachability
//! from the entry's exports.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use proptest::prelude::*;

use super::link;
use crate::ModuleId;

#[derive(Debug, Clone)]
struct Program {
    calls: Vec<Vec<usize>>,
    seeds: Vec<usize>,
    modules: usize,
}

impl Program {
    fn module_of(&self, function: usize) -> String {
        format!("m{}.js", function % self.modules)
    }

    /// `main.js` only re-exports the seeds; the functions live in `m*.js`.
    fn render(&self) -> Vec<(String, String)> {
        let mut files = vec![("main.js".to_string(), self.reexports(&self.seeds))];

        for module in 0..self.modules {
            let name = format!("m{module}.js");
            let owned: Vec<usize> = (0..self.calls.len())
                .filter(|function| self.module_of(*function) == name)
                .collect();

            let mut imports: BTreeMap<String, BTreeSet<usize>> = BTreeMap::new();
            let mut body = String::new();
            for &function in &owned {
                let mut calls = String::new();
                for &callee in &self.calls[function] {
                    let home = self.module_of(callee);
                    if home != name {
                        imports.entry(home).or_default().insert(callee);
                    }
                    calls.push_str(&format!("f{callee}(); "));
                }
                body.push_str(&format!("function f{function}() {{ {calls}}}\n"));
            }

            let mut source = String::new();
            for (home, callees) in imports {
                let names: Vec<String> = callees.iter().map(|c| format!("f{c}")).collect();
                source.push_str(&format!("import {{ {} }} from './{home}';\n", names.join(", ")));
            }
            source.push_str(&body);
            if !owned.is_empty() {
                let names: Vec<String> = owned.iter().map(|f| format!("f{f}")).collect();
                source.push_str(&format!("export {{ {} }};\n", names.join(", ")));
            }
            files.push((name, source));
        }
        files
    }

    fn reexports(&self, seeds: &[usize]) -> String {
        let mut by_module: BTreeMap<String, BTreeSet<usize>> = BTreeMap::new();
        for &seed in seeds {
            by_module.entry(self.module_of(seed)).or_default().insert(seed);
        }
        by_module
            .into_iter()
            .map(|(home, functions)| {
                let names: Vec<String> = functions.iter().map(|f| format!("f{f}")).collect();
                format!("export {{ {} }} from './{home}';\n", names.join(", "))
            })
            .collect()
    }

    fn reachable(&self) -> Vec<bool> {
        let mut seen = vec![false; self.calls.len()];
        let mut queue: VecDeque<usize> = self.seeds.iter().copied().collect();
        while let Some(function) = queue.pop_front() {
            if std::mem::replace(&mut seen[function], true) {
                continue;
            }
            queue.extend(self.calls[function].iter().copied());
        }
        seen
    }
}

fn program_strategy() -> impl Strategy<Value = Program> {
    (1usize..10, 1usize..4).prop_flat_map(|(functions, modules)| {
        (
            prop::collection::vec(prop::collection::vec(0..functions, 0..4), functions),
            prop::collection::vec(0..functions, 0..4),
        )
            .prop_map(move |(calls, seeds)| Program {
                calls,
                seeds,
                modules,
            })
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    /// Property: a function is used and its statement included exactly when it is
    /// reachable from an exported seed.
    #[test]
    fn prop_marking_equals_reachability(program in program_strategy()) {
        let files = program.render();
        let borrowed: Vec<(&str, &str)> = files
            .iter()
            .map(|(name, source)| (name.as_str(), source.as_str()))
            .collect();

        let mut graph = link(&borrowed);
        graph.shake().unwrap();

        for (function, expected) in program.reachable().into_iter().enumerate() {
            let id = ModuleId::new_virtual(program.module_of(function));
            let key = graph
                .find_top_level(&id, &format!("f{function}"))
                .expect("every function is declared");

            prop_assert_eq!(graph.declaration(key).is_used(), expected, "f{} used", function);
            let statement = graph.declaring_statement(key).expect("declared by a statement");
            prop_assert_eq!(statement.is_included(), expected, "f{} included", function);
        }
    }

    /// Property: shaking twice marks nothing new.
    #[test]
    fn prop_shake_is_idempotent(program in program_strategy()) {
        let files = program.render();
        let borrowed: Vec<(&str, &str)> = files
            .iter()
            .map(|(name, source)| (name.as_str(), source.as_str()))
            .collect();

        let mut graph = link(&borrowed);
        let first = graph.shake().unwrap();
        let included: Vec<usize> = (0..graph.len())
            .map(|m| graph.included_statements(crate::ModuleIndex::new(m)).count())
            .collect();

        let second = graph.shake().unwrap();
        let again: Vec<usize> = (0..graph.len())
            .map(|m| graph.included_statements(crate::ModuleIndex::new(m)).count())
            .collect();

        prop_assert_eq!(first, second);
        prop_assert_eq!(included, again);
    }
}
