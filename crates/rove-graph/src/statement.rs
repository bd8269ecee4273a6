//! Per-statement scope construction and reference extraction.

use std::convert::Infallible;
use std::ptr;

use indexmap::IndexMap;

use crate::error::{GraphError, Result};
use crate::graph::DeclarationKey;
use crate::module::Import;
use crate::scope::{DeclarationId, DeclarationKind, ScopeId, ScopeTree};
use crate::syntax::{walk, ImportedName, Node, NodeKind, Span, Visitor, WalkControl};
use crate::ModuleId;

/// Index of a top-level statement inside its module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StatementIndex(u32);

impl StatementIndex {
    pub fn new(index: usize) -> Self {
        Self(index as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// An identifier occurrence that reads or writes a binding.
#[derive(Debug, Clone, PartialEq)]
pub struct Reference {
    /// Root identifier of the member chain.
    pub name: String,
    pub span: Span,
    /// Number of member links after the root (`a.b.c` is 2). For writes,
    /// computed links count too (`a[k].b = 1` is 2).
    pub depth: usize,
    /// Scope active at the reference site.
    pub scope: ScopeId,
    /// Resolved target; `None` for globals or before binding.
    pub declaration: Option<DeclarationKey>,
    pub is_reassignment: bool,
    /// Evaluated as part of the statement rather than inside a deferred function body.
    pub is_immediately_used: bool,
}

/// One top-level construct of a module.
#[derive(Debug, Clone)]
pub struct Statement {
    index: StatementIndex,
    node: Node,
    scope: ScopeId,
    references: Vec<Reference>,
    declarations: Vec<DeclarationId>,
    included: bool,
}

impl Statement {
    /// Wrap a top-level node, giving it a fresh root scope in `scopes`.
    pub fn new(index: StatementIndex, node: Node, scopes: &mut ScopeTree) -> Self {
        let scope = scopes.new_scope(None, false);
        Self {
            index,
            node,
            scope,
            references: Vec::new(),
            declarations: Vec::new(),
            included: false,
        }
    }

    pub fn index(&self) -> StatementIndex {
        self.index
    }

    pub fn node(&self) -> &Node {
        &self.node
    }

    pub fn span(&self) -> Span {
        self.node.span
    }

    pub fn scope(&self) -> ScopeId {
        self.scope
    }

    pub fn references(&self) -> &[Reference] {
        &self.references
    }

    pub(crate) fn references_mut(&mut self) -> &mut [Reference] {
        &mut self.references
    }

    /// Declarations owned by this statement (its root-scope bindings).
    pub fn declarations(&self) -> &[DeclarationId] {
        &self.declarations
    }

    pub fn is_included(&self) -> bool {
        self.included
    }

    pub fn is_import_declaration(&self) -> bool {
        self.node.is_import_declaration()
    }

    pub fn is_export_declaration(&self) -> bool {
        self.node.is_export_declaration()
    }

    /// Returns `false` if the statement was already included.
    pub(crate) fn mark_included(&mut self) -> bool {
        !std::mem::replace(&mut self.included, true)
    }

    /// Build this statement's scopes and collect its references.
    ///
    /// Import declarations contribute nothing; their bindings live in the module's
    /// import table. Writes to imported bindings fail with
    /// [`GraphError::IllegalReassignment`] unless they only touch a nested property.
    pub fn analyse(
        &mut self,
        scopes: &mut ScopeTree,
        module: &ModuleId,
        imports: &IndexMap<String, Import>,
    ) -> Result<()> {
        if self.is_import_declaration() {
            return Ok(());
        }

        let mut analyser = Analyser {
            scopes: &mut *scopes,
            scope: self.scope,
            frames: Vec::new(),
            read_depth: 0,
            targets: Vec::new(),
            references: Vec::new(),
        };
        let Ok(()) = walk(&mut analyser, &self.node, None);
        let references = analyser.references;

        for reference in references.iter().filter(|r| r.is_reassignment) {
            if scopes.contains(reference.scope, &reference.name) {
                continue;
            }
            let Some(import) = imports.get(&reference.name) else {
                continue;
            };
            let min_depth = match import.name {
                ImportedName::Namespace => 2,
                _ => 1,
            };
            if reference.depth < min_depth {
                return Err(GraphError::IllegalReassignment {
                    module: module.clone(),
                    name: reference.name.clone(),
                });
            }
        }

        self.references = references;
        self.declarations = scopes.declarations(self.scope).map(|(_, id)| id).collect();
        for &id in &self.declarations {
            scopes.declaration_mut(id).attach(self.index);
        }

        Ok(())
    }
}

/// Root identifier of an assignment target and every member link above it.
struct WriteTarget<'n> {
    root: &'n Node,
    depth: usize,
}

struct Frame {
    pushed_scope: bool,
    deferred: bool,
}

struct Analyser<'a, 'n> {
    scopes: &'a mut ScopeTree,
    scope: ScopeId,
    frames: Vec<Frame>,
    read_depth: usize,
    /// Roots written by an enclosing assignment, update or `for in`/`for of` head.
    targets: Vec<WriteTarget<'n>>,
    references: Vec<Reference>,
}

impl<'n> Analyser<'_, 'n> {
    fn declare_before_descent(&mut self, node: &'n Node, parent: Option<&'n Node>) {
        match &node.kind {
            NodeKind::FunctionDeclaration(function) => {
                if let Some(id) = &function.id {
                    self.scopes.add_declaration(self.scope, id, false, true);
                }
            }
            NodeKind::ClassDeclaration(class) => {
                if let Some(id) = &class.id {
                    self.scopes.add_declaration(self.scope, id, false, false);
                }
            }
            NodeKind::VariableDeclaration { kind, declarations } => {
                for declarator in declarations {
                    if let NodeKind::VariableDeclarator { id, .. } = &declarator.kind {
                        self.scopes.add_declaration(
                            self.scope,
                            id,
                            kind.is_block_scoped(),
                            !kind.is_block_scoped(),
                        );
                    }
                }
            }
            NodeKind::ExportDefaultDeclaration { declaration } if parent.is_none() => {
                let named = match &declaration.kind {
                    NodeKind::FunctionDeclaration(function) => function.id.is_some(),
                    NodeKind::ClassDeclaration(class) => class.id.is_some(),
                    _ => false,
                };
                if !named {
                    self.scopes
                        .declare(self.scope, "default", DeclarationKind::Default, false);
                }
            }
            _ => {}
        }
    }

    /// Opens the scope a node introduces, if any.
    fn open_scope(&mut self, node: &'n Node, parent: Option<&'n Node>) -> Option<ScopeId> {
        match &node.kind {
            NodeKind::FunctionDeclaration(function)
            | NodeKind::FunctionExpression(function)
            | NodeKind::ArrowFunctionExpression(function) => {
                let scope = self.scopes.new_scope(Some(self.scope), false);
                for param in &function.params {
                    self.scopes.add_declaration(scope, param, true, false);
                }
                if let (NodeKind::FunctionExpression(_), Some(id)) = (&node.kind, &function.id) {
                    self.scopes.add_declaration(scope, id, false, false);
                }
                Some(scope)
            }
            NodeKind::ClassExpression(class) => {
                let id = class.id.as_deref()?;
                let scope = self.scopes.new_scope(Some(self.scope), true);
                self.scopes.add_declaration(scope, id, true, false);
                Some(scope)
            }
            NodeKind::BlockStatement { .. } => {
                if parent.is_some_and(Node::is_function_like) {
                    None
                } else {
                    Some(self.scopes.new_scope(Some(self.scope), true))
                }
            }
            NodeKind::ForStatement { .. } => Some(self.scopes.new_scope(Some(self.scope), true)),
            NodeKind::CatchClause { param, .. } => {
                let scope = self.scopes.new_scope(Some(self.scope), true);
                if let Some(param) = param {
                    self.scopes.add_declaration(scope, param, true, false);
                }
                Some(scope)
            }
            _ => None,
        }
    }

    fn collect_targets(&mut self, node: &'n Node) {
        match &node.kind {
            NodeKind::AssignmentExpression { left, .. } => collect_pattern_targets(left, &mut self.targets),
            NodeKind::UpdateExpression { argument } => collect_pattern_targets(argument, &mut self.targets),
            NodeKind::ForStatement {
                head,
                iterates: true,
                ..
            } => {
                if let Some(left) = head.first() {
                    if !matches!(left.kind, NodeKind::VariableDeclaration { .. }) {
                        collect_pattern_targets(left, &mut self.targets);
                    }
                }
            }
            _ => {}
        }
    }
}

impl<'n> Visitor<'n> for Analyser<'_, 'n> {
    type Error = Infallible;

    fn enter(&mut self, node: &'n Node, parent: Option<&'n Node>) -> std::result::Result<WalkControl, Infallible> {
        if is_reference(node, parent) {
            if let Some((root, name, depth)) = chain_root(node) {
                let write = self.targets.iter().find(|target| ptr::eq(target.root, root));
                self.references.push(Reference {
                    name: name.to_string(),
                    span: node.span,
                    depth: write.map_or(depth, |target| target.depth),
                    scope: self.scope,
                    declaration: None,
                    is_reassignment: write.is_some(),
                    is_immediately_used: self.read_depth == 0,
                });
                return Ok(WalkControl::Skip);
            }
        }

        self.declare_before_descent(node, parent);
        self.collect_targets(node);

        let deferred = node.is_function_like() && !is_iife(node, parent);
        if deferred {
            self.read_depth += 1;
        }

        let pushed_scope = match self.open_scope(node, parent) {
            Some(scope) => {
                self.scope = scope;
                true
            }
            None => false,
        };

        self.frames.push(Frame {
            pushed_scope,
            deferred,
        });
        Ok(WalkControl::Continue)
    }

    fn leave(&mut self, _node: &'n Node, _parent: Option<&'n Node>) -> std::result::Result<(), Infallible> {
        if let Some(frame) = self.frames.pop() {
            if frame.pushed_scope {
                if let Some(parent) = self.scopes.scope(self.scope).parent() {
                    self.scope = parent;
                }
            }
            if frame.deferred {
                self.read_depth -= 1;
            }
        }
        Ok(())
    }
}

/// Whether `node` denotes a binding use rather than a property name or alias.
fn is_reference(node: &Node, parent: Option<&Node>) -> bool {
    match &node.kind {
        NodeKind::MemberExpression {
            object, computed, ..
        } => !computed && is_reference(object, Some(node)),
        NodeKind::Identifier(_) => match parent.map(|parent| &parent.kind) {
            Some(NodeKind::MemberExpression {
                object, computed, ..
            }) => *computed || ptr::eq(&**object, node),
            Some(NodeKind::Property {
                key,
                value,
                computed,
                ..
            }) => ptr::eq(&**value, node) || (*computed && ptr::eq(&**key, node)),
            Some(
                NodeKind::MethodDefinition { key, computed, .. }
                | NodeKind::PropertyDefinition { key, computed, .. },
            ) => *computed || !ptr::eq(&**key, node),
            Some(NodeKind::ExportSpecifier { local, .. }) => ptr::eq(&**local, node),
            _ => true,
        },
        _ => false,
    }
}

/// Root identifier node of a member chain and the number of links to it.
fn chain_root(node: &Node) -> Option<(&Node, &str, usize)> {
    let mut depth = 0;
    let mut current = node;
    loop {
        match &current.kind {
            NodeKind::Identifier(name) => return Some((current, name, depth)),
            NodeKind::MemberExpression { object, .. } => {
                depth += 1;
                current = object;
            }
            _ => return None,
        }
    }
}

fn is_iife(node: &Node, parent: Option<&Node>) -> bool {
    matches!(
        parent.map(|parent| &parent.kind),
        Some(NodeKind::CallExpression { callee, .. }) if ptr::eq(&**callee, node)
    )
}

/// Roots of the identifiers and member chains written by an assignment target or pattern.
fn collect_pattern_targets<'n>(node: &'n Node, targets: &mut Vec<WriteTarget<'n>>) {
    match &node.kind {
        NodeKind::Identifier(_) | NodeKind::MemberExpression { .. } => {
            if let Some((root, _, depth)) = chain_root(node) {
                targets.push(WriteTarget { root, depth });
            }
        }
        NodeKind::ObjectPattern { properties } => {
            for property in properties {
                collect_pattern_targets(property, targets);
            }
        }
        NodeKind::Property { value, .. } => collect_pattern_targets(value, targets),
        NodeKind::ArrayPattern { elements } => {
            for element in elements.iter().flatten() {
                collect_pattern_targets(element, targets);
            }
        }
        NodeKind::RestElement { argument } => collect_pattern_targets(argument, targets),
        NodeKind::AssignmentPattern { left, .. } => collect_pattern_targets(left, targets),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::parse;

    fn analyse(source: &str) -> (Statement, ScopeTree) {
        let mut scopes = ScopeTree::new();
        let node = parse(source).unwrap().remove(0);
        let mut statement = Statement::new(StatementIndex::new(0), node, &mut scopes);
        statement
            .analyse(&mut scopes, &ModuleId::new_virtual("main.js"), &IndexMap::new())
            .unwrap();
        (statement, scopes)
    }

    fn names(statement: &Statement) -> Vec<(&str, usize, bool)> {
        statement
            .references()
            .iter()
            .map(|r| (r.name.as_str(), r.depth, r.is_immediately_used))
            .collect()
    }

    #[test]
    fn member_chains_collapse_to_their_root() {
        let (statement, _) = analyse("a.b.c(d[e], f.g);");
        assert_eq!(
            names(&statement),
            [("a", 2, true), ("d", 0, true), ("e", 0, true), ("f", 1, true)]
        );
    }

    #[test]
    fn property_keys_and_method_names_are_not_references() {
        let (statement, _) = analyse("x = { key: value, [computed]: 1, short, m() {} };");
        let found: Vec<_> = statement.references().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(found, ["x", "value", "computed", "short"]);

        let (statement, _) = analyse("class C { method() {} [dynamic]() {} field = init; }");
        let found: Vec<_> = statement.references().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(found, ["dynamic", "init"]);
    }

    #[test]
    fn function_bodies_are_deferred_unless_immediately_invoked() {
        let (statement, _) = analyse("function f() { later(); }");
        assert_eq!(names(&statement), [("later", 0, false)]);

        let (statement, _) = analyse("(function () { now(); })();");
        assert_eq!(names(&statement), [("now", 0, true)]);

        let (statement, _) = analyse("const g = () => () => deep;");
        assert_eq!(names(&statement), [("deep", 0, false)]);
    }

    #[test]
    fn top_level_declarations_are_owned_by_the_statement() {
        let (statement, scopes) = analyse("const { a, b: [c] } = source;");
        let owned: Vec<_> = statement
            .declarations()
            .iter()
            .map(|id| scopes.declaration(*id).name())
            .collect();
        assert_eq!(owned, ["a", "c"]);
        for id in statement.declarations() {
            assert_eq!(scopes.declaration(*id).statement(), Some(statement.index()));
        }
    }

    #[test]
    fn nested_var_hoists_but_let_stays_in_its_block() {
        let (statement, scopes) = analyse("if (ok) { var hoisted = 1; let scoped = 2; }");
        assert!(scopes.contains(statement.scope(), "hoisted"));
        assert!(!scopes.contains(statement.scope(), "scoped"));
    }

    #[test]
    fn function_parameters_bind_inside_the_function() {
        let (statement, scopes) = analyse("function f(a, { b }, ...rest) { return a + b + rest; }");
        assert!(scopes.contains(statement.scope(), "f"));
        assert!(!scopes.contains(statement.scope(), "a"));
        for reference in statement.references() {
            assert!(scopes.contains(reference.scope, &reference.name));
        }
    }

    #[test]
    fn named_function_expression_binds_only_inside_itself() {
        let (statement, scopes) = analyse("const f = function inner() { return inner; };");
        assert!(!scopes.contains(statement.scope(), "inner"));
        let reference = &statement.references()[0];
        assert_eq!(reference.name, "inner");
        assert!(scopes.contains(reference.scope, "inner"));
    }

    #[test]
    fn anonymous_default_export_declares_default() {
        let (statement, scopes) = analyse("export default a + b;");
        let owned: Vec<_> = statement
            .declarations()
            .iter()
            .map(|id| scopes.declaration(*id))
            .collect();
        assert_eq!(owned.len(), 1);
        assert_eq!(owned[0].name(), "default");
        assert_eq!(owned[0].kind(), DeclarationKind::Default);
    }

    #[test]
    fn assignment_targets_are_reassignments() {
        let (statement, _) = analyse("({ a, b: [c] } = obj), d++, e.f = 1, g[h] = 2;");
        let written: Vec<_> = statement
            .references()
            .iter()
            .filter(|r| r.is_reassignment)
            .map(|r| r.name.as_str())
            .collect();
        assert_eq!(written, ["a", "c", "d", "e", "g"]);
    }

    #[test]
    fn computed_writes_count_every_link() {
        let (statement, _) = analyse("a[k] = 1, b.c[k] = 2, d['e'].f = 3;");
        let written: Vec<_> = statement
            .references()
            .iter()
            .filter(|r| r.is_reassignment)
            .map(|r| (r.name.as_str(), r.depth))
            .collect();
        assert_eq!(written, [("a", 1), ("b", 2), ("d", 2)]);
        assert!(statement.references().iter().any(|r| r.name == "k" && !r.is_reassignment));
    }

    #[test]
    fn reexport_specifiers_produce_no_references() {
        let (statement, _) = analyse("export { a as b } from './m';");
        assert!(statement.references().is_empty());

        let (statement, _) = analyse("export { a as b };");
        assert_eq!(names(&statement), [("a", 0, true)]);
    }
}
