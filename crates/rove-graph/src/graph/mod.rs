//! The linked module graph.
//!
//! A [`ModuleGraph`] is built once per build from the fetched modules, in fetch
//! order. [`ModuleGraph::link`] attaches imports to their owning modules and binds
//! every reference; [`ModuleGraph::shake`] then marks what the entry's exports
//! reach.

mod bind;
mod shake;

use rustc_hash::FxHashMap;

use crate::error::{GraphError, Result};
use crate::module::Module;
use crate::scope::{Declaration, DeclarationId};
use crate::statement::{Statement, StatementIndex};
use crate::ModuleId;

pub use bind::MissingExport;

/// Position of a module in fetch order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleIndex(u32);

impl ModuleIndex {
    pub fn new(index: usize) -> Self {
        Self(index as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Graph-wide address of a declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeclarationKey {
    pub module: ModuleIndex,
    pub declaration: DeclarationId,
}

/// Graph-wide address of a reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReferenceKey {
    pub module: ModuleIndex,
    pub statement: StatementIndex,
    pub reference: u32,
}

#[derive(Debug, Clone)]
pub struct ModuleGraph {
    modules: Vec<Module>,
    index: FxHashMap<ModuleId, ModuleIndex>,
    entry: ModuleIndex,
}

impl ModuleGraph {
    /// Build a graph from modules in fetch order. `entry` must be one of them.
    pub fn new(modules: Vec<Module>, entry: &ModuleId) -> Result<Self> {
        let index: FxHashMap<ModuleId, ModuleIndex> = modules
            .iter()
            .enumerate()
            .map(|(position, module)| (module.id().clone(), ModuleIndex::new(position)))
            .collect();

        let entry = *index
            .get(entry)
            .ok_or_else(|| GraphError::UnknownModule(entry.clone()))?;

        Ok(Self {
            modules,
            index,
            entry,
        })
    }

    /// Attach imports to their modules and bind every reference.
    ///
    /// Returns the imports and re-exports whose name the target module does not
    /// export.
    pub fn link(&mut self) -> Result<Vec<MissingExport>> {
        self.bind_import_specifiers();
        self.bind_references()
    }

    pub fn entry(&self) -> ModuleIndex {
        self.entry
    }

    pub fn entry_module(&self) -> &Module {
        &self.modules[self.entry.index()]
    }

    /// Modules in fetch order.
    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn module(&self, index: ModuleIndex) -> &Module {
        &self.modules[index.index()]
    }

    pub fn index_of(&self, id: &ModuleId) -> Option<ModuleIndex> {
        self.index.get(id).copied()
    }

    pub fn module_by_id(&self, id: &ModuleId) -> Option<&Module> {
        self.index_of(id).map(|index| self.module(index))
    }

    pub fn declaration(&self, key: DeclarationKey) -> &Declaration {
        self.module(key.module).declaration(key.declaration)
    }

    pub(crate) fn declaration_mut(&mut self, key: DeclarationKey) -> &mut Declaration {
        self.modules[key.module.index()]
            .scopes
            .declaration_mut(key.declaration)
    }

    /// The statement that owns a declaration, if any.
    pub fn declaring_statement(&self, key: DeclarationKey) -> Option<&Statement> {
        let statement = self.declaration(key).statement()?;
        self.module(key.module).statement(statement)
    }

    pub fn statement(&self, module: ModuleIndex, statement: StatementIndex) -> Option<&Statement> {
        self.module(module).statement(statement)
    }

    /// Included statements of one module, in source order.
    pub fn included_statements(&self, module: ModuleIndex) -> impl Iterator<Item = &Statement> + '_ {
        self.module(module)
            .statements()
            .iter()
            .filter(|statement| statement.is_included())
    }

    /// Lookup a declaration by module id and top-level name.
    pub fn find_top_level(&self, id: &ModuleId, name: &str) -> Option<DeclarationKey> {
        let module = self.index_of(id)?;
        let declaration = self.module(module).top_level(name)?;
        Some(DeclarationKey {
            module,
            declaration,
        })
    }
}
