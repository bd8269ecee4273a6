use std::collections::VecDeque;

use indexmap::IndexMap;

use super::{DeclarationKey, ModuleGraph, ModuleIndex};
use crate::error::Result;
use crate::scope::DeclarationKind;
use crate::statement::StatementIndex;

impl ModuleGraph {
    /// Mark everything reachable from the entry module's exports.
    ///
    /// Returns each exported name of the entry with the declaration it resolves
    /// to. Names that resolve to nothing (missing or external) are left out.
    pub fn shake(&mut self) -> Result<IndexMap<String, DeclarationKey>> {
        let entry = self.entry;
        let mut entry_exports = IndexMap::new();

        for name in self.export_names(entry) {
            if let Some(key) = self.trace_export(entry, &name)? {
                self.declaration_mut(key).mark_exported();
                entry_exports.insert(name, key);
            }
        }

        let seeds: Vec<_> = entry_exports.values().copied().collect();
        self.use_declarations(seeds)?;

        let included: usize = (0..self.modules.len())
            .map(|module| self.included_statements(ModuleIndex::new(module)).count())
            .sum();
        tracing::debug!(exports = entry_exports.len(), included, "shook module graph");
        Ok(entry_exports)
    }

    /// Use each declaration and everything it transitively depends on.
    ///
    /// Using a declaration includes its owning statement; including a statement
    /// uses every declaration its references are bound to. Both transitions
    /// happen at most once, so repeated calls change nothing already marked.
    pub fn use_declarations(
        &mut self,
        seeds: impl IntoIterator<Item = DeclarationKey>,
    ) -> Result<()> {
        let mut queue: VecDeque<DeclarationKey> = seeds.into_iter().collect();

        while let Some(key) = queue.pop_front() {
            let declaration = self.declaration_mut(key);
            if !declaration.mark_used() {
                continue;
            }
            let kind = declaration.kind();
            let statement = declaration.statement();

            if kind == DeclarationKind::Namespace {
                queue.extend(self.namespace_members(key.module)?);
            }

            if let Some(statement) = statement {
                queue.extend(self.mark_statement(key.module, statement));
            }
        }

        Ok(())
    }

    /// Include a statement, returning the declarations its references bind to.
    /// Returns nothing if the statement was already included.
    pub fn mark_statement(
        &mut self,
        module: ModuleIndex,
        statement: StatementIndex,
    ) -> Vec<DeclarationKey> {
        let statements = &mut self.modules[module.index()].statements;
        let Some(statement) = statements.get_mut(statement.index()) else {
            return Vec::new();
        };
        if !statement.mark_included() {
            return Vec::new();
        }
        statement
            .references()
            .iter()
            .filter_map(|reference| reference.declaration)
            .collect()
    }

    fn namespace_members(&self, module: ModuleIndex) -> Result<Vec<DeclarationKey>> {
        let mut members = Vec::new();
        for name in self.export_names(module) {
            if let Some(key) = self.trace_export(module, &name)? {
                members.push(key);
            }
        }
        Ok(members)
    }
}
