//! Lexical scopes and the declarations they own.
//!
//! Every module owns one [`ScopeTree`]: an append-only arena of scopes linked to
//! their parents by index, plus the arena of every [`Declaration`] made in the
//! module. Each top-level statement gets its own root scope; module-level names
//! are aggregated from those roots by [`crate::Module`].

use indexmap::{IndexMap, IndexSet};

use crate::graph::ReferenceKey;
use crate::statement::StatementIndex;
use crate::syntax::{Node, NodeKind};

/// Index of a scope inside its module's [`ScopeTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(u32);

impl ScopeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Index of a declaration inside its module's [`ScopeTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeclarationId(u32);

impl DeclarationId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone)]
pub struct Scope {
    parent: Option<ScopeId>,
    is_block: bool,
    declarations: IndexMap<String, DeclarationId>,
}

impl Scope {
    pub fn parent(&self) -> Option<ScopeId> {
        self.parent
    }

    pub fn is_block(&self) -> bool {
        self.is_block
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclarationKind {
    /// A name bound by source code (variable, function, class, parameter).
    Binding,
    /// The synthetic `default` binding of `export default <expression>`.
    Default,
    /// The synthetic namespace object of a module (`import * as ns`).
    Namespace,
}

/// One named binding.
///
/// `is_used` only ever goes from `false` to `true`.
#[derive(Debug, Clone)]
pub struct Declaration {
    name: String,
    kind: DeclarationKind,
    scope: ScopeId,
    is_var: bool,
    statement: Option<StatementIndex>,
    is_exported: bool,
    is_used: bool,
    is_reassigned: bool,
    references: IndexSet<ReferenceKey>,
}

impl Declaration {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> DeclarationKind {
        self.kind
    }

    pub fn scope(&self) -> ScopeId {
        self.scope
    }

    /// Declared with `var` (or as a hoisted function/class).
    pub fn is_var(&self) -> bool {
        self.is_var
    }

    /// The top-level statement that declares this binding, once attached.
    pub fn statement(&self) -> Option<StatementIndex> {
        self.statement
    }

    pub fn is_exported(&self) -> bool {
        self.is_exported
    }

    pub fn is_used(&self) -> bool {
        self.is_used
    }

    pub fn is_reassigned(&self) -> bool {
        self.is_reassigned
    }

    /// Every reference bound to this declaration, across all modules.
    pub fn references(&self) -> &IndexSet<ReferenceKey> {
        &self.references
    }

    /// Record that `reference` resolved to this declaration.
    pub fn add_reference(&mut self, reference: ReferenceKey, is_reassignment: bool) {
        self.references.insert(reference);
        if is_reassignment {
            self.is_reassigned = true;
        }
    }

    pub(crate) fn attach(&mut self, statement: StatementIndex) {
        self.statement = Some(statement);
    }

    pub(crate) fn mark_exported(&mut self) {
        self.is_exported = true;
    }

    /// Returns `false` if the declaration was already used.
    pub(crate) fn mark_used(&mut self) -> bool {
        !std::mem::replace(&mut self.is_used, true)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ScopeTree {
    scopes: Vec<Scope>,
    declarations: Vec<Declaration>,
}

impl ScopeTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_scope(&mut self, parent: Option<ScopeId>, is_block: bool) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(Scope {
            parent,
            is_block,
            declarations: IndexMap::new(),
        });
        id
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.index()]
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    /// Declare every name bound by `pattern`.
    ///
    /// Non-block declarations made inside a block scope are hoisted to the nearest
    /// non-block ancestor. A name already declared in the target scope is replaced,
    /// except that a repeated `var` keeps the existing binding.
    pub fn add_declaration(
        &mut self,
        scope: ScopeId,
        pattern: &Node,
        is_block_declaration: bool,
        is_var: bool,
    ) -> Vec<DeclarationId> {
        let target = if is_block_declaration {
            scope
        } else {
            self.hoist_target(scope)
        };

        extract_names(pattern)
            .into_iter()
            .map(|name| self.declare(target, name, DeclarationKind::Binding, is_var))
            .collect()
    }

    /// Declare a single name directly in `scope` with no hoisting.
    pub fn declare(
        &mut self,
        scope: ScopeId,
        name: impl Into<String>,
        kind: DeclarationKind,
        is_var: bool,
    ) -> DeclarationId {
        let name = name.into();

        if is_var {
            if let Some(&existing) = self.scopes[scope.index()].declarations.get(&name) {
                if self.declarations[existing.index()].is_var {
                    return existing;
                }
            }
        }

        let id = DeclarationId(self.declarations.len() as u32);
        self.declarations.push(Declaration {
            name: name.clone(),
            kind,
            scope,
            is_var,
            statement: None,
            is_exported: false,
            is_used: false,
            is_reassigned: false,
            references: IndexSet::new(),
        });
        self.scopes[scope.index()].declarations.insert(name, id);
        id
    }

    /// Nearest declaration of `name` visible from `scope`.
    pub fn find_declaration(&self, scope: ScopeId, name: &str) -> Option<DeclarationId> {
        self.ancestors(scope)
            .find_map(|id| self.scopes[id.index()].declarations.get(name).copied())
    }

    pub fn contains(&self, scope: ScopeId, name: &str) -> bool {
        self.find_declaration(scope, name).is_some()
    }

    /// A scope's own declarations in declaration order.
    pub fn declarations(&self, scope: ScopeId) -> impl Iterator<Item = (&str, DeclarationId)> + '_ {
        self.scopes[scope.index()]
            .declarations
            .iter()
            .map(|(name, id)| (name.as_str(), *id))
    }

    /// `scope` followed by each of its parents.
    pub fn ancestors(&self, scope: ScopeId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            current: Some(scope),
        }
    }

    pub fn declaration(&self, id: DeclarationId) -> &Declaration {
        &self.declarations[id.index()]
    }

    pub fn declaration_mut(&mut self, id: DeclarationId) -> &mut Declaration {
        &mut self.declarations[id.index()]
    }

    pub fn all_declarations(&self) -> impl Iterator<Item = (DeclarationId, &Declaration)> + '_ {
        self.declarations
            .iter()
            .enumerate()
            .map(|(index, declaration)| (DeclarationId(index as u32), declaration))
    }

    fn hoist_target(&self, scope: ScopeId) -> ScopeId {
        self.ancestors(scope)
            .find(|id| !self.scopes[id.index()].is_block)
            .unwrap_or(scope)
    }
}

pub struct Ancestors<'a> {
    tree: &'a ScopeTree,
    current: Option<ScopeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = ScopeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.current?;
        self.current = self.tree.scopes[current.index()].parent;
        Some(current)
    }
}

/// Names bound by a binding pattern, in source order.
pub fn extract_names(pattern: &Node) -> Vec<String> {
    let mut names = Vec::new();
    collect_names(pattern, &mut names);
    names
}

fn collect_names(pattern: &Node, names: &mut Vec<String>) {
    match &pattern.kind {
        NodeKind::BindingIdentifier(name) | NodeKind::Identifier(name) => names.push(name.clone()),
        NodeKind::ObjectPattern { properties } => {
            for property in properties {
                collect_names(property, names);
            }
        }
        // The value side carries the binding; for shorthand it equals the key.
        NodeKind::Property { value, .. } => collect_names(value, names),
        NodeKind::ArrayPattern { elements } => {
            for element in elements.iter().flatten() {
                collect_names(element, names);
            }
        }
        NodeKind::RestElement { argument } => collect_names(argument, names),
        NodeKind::AssignmentPattern { left, .. } => collect_names(left, names),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::parse;

    fn declarator_id(source: &str) -> Node {
        let mut nodes = parse(source).unwrap();
        let NodeKind::VariableDeclaration { mut declarations, .. } = nodes.remove(0).kind else {
            panic!("expected variable declaration");
        };
        let NodeKind::VariableDeclarator { id, .. } = declarations.remove(0).kind else {
            panic!("expected declarator");
        };
        *id
    }

    #[test]
    fn extracts_names_from_nested_patterns() {
        let pattern = declarator_id("let { a, b: [c, , ...d], e = 1, ...f } = x;");
        assert_eq!(extract_names(&pattern), ["a", "c", "d", "e", "f"]);
    }

    #[test]
    fn non_block_declarations_hoist_out_of_blocks() {
        let mut tree = ScopeTree::new();
        let root = tree.new_scope(None, false);
        let block = tree.new_scope(Some(root), true);
        let inner = tree.new_scope(Some(block), true);

        tree.add_declaration(inner, &declarator_id("var hoisted = 1;"), false, true);
        tree.add_declaration(inner, &declarator_id("let scoped = 1;"), true, false);

        assert!(tree.contains(root, "hoisted"));
        assert!(!tree.contains(root, "scoped"));
        assert!(!tree.contains(block, "scoped"));
        assert!(tree.contains(inner, "scoped"));
    }

    #[test]
    fn inner_declarations_shadow_outer_ones() {
        let mut tree = ScopeTree::new();
        let root = tree.new_scope(None, false);
        let function = tree.new_scope(Some(root), false);

        let outer = tree.declare(root, "x", DeclarationKind::Binding, false);
        let inner = tree.declare(function, "x", DeclarationKind::Binding, false);

        assert_eq!(tree.find_declaration(function, "x"), Some(inner));
        assert_eq!(tree.find_declaration(root, "x"), Some(outer));
        assert_eq!(tree.find_declaration(function, "missing"), None);
    }

    #[test]
    fn repeated_var_keeps_one_binding() {
        let mut tree = ScopeTree::new();
        let root = tree.new_scope(None, false);

        let first = tree.declare(root, "v", DeclarationKind::Binding, true);
        let second = tree.declare(root, "v", DeclarationKind::Binding, true);
        let lexical = tree.declare(root, "v", DeclarationKind::Binding, false);

        assert_eq!(first, second);
        assert_ne!(first, lexical);
        assert_eq!(tree.declarations(root).count(), 1);
    }

    #[test]
    fn mark_used_is_monotonic() {
        let mut tree = ScopeTree::new();
        let root = tree.new_scope(None, false);
        let id = tree.declare(root, "a", DeclarationKind::Binding, false);

        assert!(tree.declaration_mut(id).mark_used());
        assert!(!tree.declaration_mut(id).mark_used());
        assert!(tree.declaration(id).is_used());
    }

    #[test]
    fn references_are_recorded_once_in_order() {
        use crate::graph::{ModuleIndex, ReferenceKey};

        let mut tree = ScopeTree::new();
        let root = tree.new_scope(None, false);
        let id = tree.declare(root, "a", DeclarationKind::Binding, false);
        let key = |reference| ReferenceKey {
            module: ModuleIndex::new(0),
            statement: StatementIndex::new(1),
            reference,
        };

        let declaration = tree.declaration_mut(id);
        declaration.add_reference(key(1), false);
        declaration.add_reference(key(0), true);
        declaration.add_reference(key(1), false);

        let recorded: Vec<_> = tree.declaration(id).references().iter().copied().collect();
        assert_eq!(recorded, [key(1), key(0)]);
        assert!(tree.declaration(id).is_reassigned());
    }
}
