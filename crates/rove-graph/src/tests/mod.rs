mod property_tests;
mod scoping_tests;
mod shaking_tests;

use crate::{GraphError, MissingExport, Module, ModuleGraph, ModuleId, ModuleIndex};

/// Parse virtual modules, resolving `./name` specifiers to the module called `name`.
/// Anything else stays external.
pub(crate) fn parse_all(modules: &[(&str, &str)]) -> Vec<Module> {
    modules
        .iter()
        .map(|(name, source)| {
            let mut module = Module::parse(ModuleId::new_virtual(*name), *source)
                .unwrap_or_else(|err| panic!("{name} failed to parse: {err}"));
            let specifiers: Vec<String> = module.dependencies().iter().cloned().collect();
            for specifier in specifiers {
                let target = modules
                    .iter()
                    .find(|(candidate, _)| specifier.strip_prefix("./") == Some(*candidate))
                    .map(|(candidate, _)| ModuleId::new_virtual(*candidate));
                module.set_resolved(specifier, target);
            }
            module
        })
        .collect()
}

/// The first module is the entry.
pub(crate) fn try_link(
    modules: &[(&str, &str)],
) -> Result<(ModuleGraph, Vec<MissingExport>), GraphError> {
    let entry = ModuleId::new_virtual(modules[0].0);
    let mut graph = ModuleGraph::new(parse_all(modules), &entry)?;
    let missing = graph.link()?;
    Ok((graph, missing))
}

pub(crate) fn link(modules: &[(&str, &str)]) -> ModuleGraph {
    try_link(modules).expect("graph should link").0
}

pub(crate) fn index(graph: &ModuleGraph, name: &str) -> ModuleIndex {
    graph
        .index_of(&ModuleId::new_virtual(name))
        .unwrap_or_else(|| panic!("{name} is not in the graph"))
}

/// Source text of the included statements of `name`.
pub(crate) fn included_sources<'g>(graph: &'g ModuleGraph, name: &str) -> Vec<&'g str> {
    let module = graph.module(index(graph, name));
    graph
        .included_statements(index(graph, name))
        .map(|statement| {
            let span = statement.span();
            &module.code()[span.start as usize..span.end as usize]
        })
        .collect()
}
