//! Parsed modules and their import and export tables.

use indexmap::{IndexMap, IndexSet};

use crate::error::{GraphError, Result};
use crate::graph::ModuleIndex;
use crate::scope::{extract_names, Declaration, DeclarationId, DeclarationKind, ScopeTree};
use crate::statement::{Statement, StatementIndex};
use crate::syntax::{self, ImportedName, Node, NodeKind, Span};
use crate::ModuleId;

/// An import table entry, keyed by local name.
#[derive(Debug, Clone, PartialEq)]
pub struct Import {
    pub source: String,
    pub name: ImportedName,
    pub span: Span,
    /// Owning module, attached by [`crate::ModuleGraph::bind_import_specifiers`].
    pub module: Option<ModuleIndex>,
}

/// An export table entry, keyed by exported name.
#[derive(Debug, Clone, PartialEq)]
pub enum Export {
    /// A binding of this module (`export { local as name }`, `export const name`).
    Local { local: String },
    /// A binding forwarded from another module (`export { imported as name } from`).
    Reexport {
        source: String,
        imported: ImportedName,
        module: Option<ModuleIndex>,
    },
}

/// `export * from 'source'`.
#[derive(Debug, Clone, PartialEq)]
pub struct StarExport {
    pub source: String,
    pub module: Option<ModuleIndex>,
}

/// One parsed and analysed source unit.
#[derive(Debug, Clone)]
pub struct Module {
    pub(crate) id: ModuleId,
    pub(crate) code: String,
    pub(crate) statements: Vec<Statement>,
    pub(crate) scopes: ScopeTree,
    pub(crate) dependencies: IndexSet<String>,
    pub(crate) imports: IndexMap<String, Import>,
    pub(crate) exports: IndexMap<String, Export>,
    pub(crate) star_exports: Vec<StarExport>,
    pub(crate) top_level: IndexMap<String, DeclarationId>,
    pub(crate) namespace: DeclarationId,
    pub(crate) resolved: IndexMap<String, Option<ModuleId>>,
}

impl Module {
    /// Parse `code` and analyse every statement.
    pub fn parse(id: ModuleId, code: impl Into<String>) -> Result<Self> {
        let code = code.into();
        let nodes = syntax::parse(&code).map_err(|failure| GraphError::Syntax {
            module: id.clone(),
            message: failure.message,
            offset: failure.offset,
        })?;

        let mut scopes = ScopeTree::new();
        let module_scope = scopes.new_scope(None, false);
        let namespace = scopes.declare(module_scope, "*", DeclarationKind::Namespace, false);

        let statements = nodes
            .into_iter()
            .enumerate()
            .map(|(index, node)| Statement::new(StatementIndex::new(index), node, &mut scopes))
            .collect();

        let mut module = Self {
            id,
            code,
            statements,
            scopes,
            dependencies: IndexSet::new(),
            imports: IndexMap::new(),
            exports: IndexMap::new(),
            star_exports: Vec::new(),
            top_level: IndexMap::new(),
            namespace,
            resolved: IndexMap::new(),
        };
        module.analyse()?;
        Ok(module)
    }

    fn analyse(&mut self) -> Result<()> {
        // Import and export tables must be complete before statements are analysed:
        // reassignment checks consult the imports.
        let statements = std::mem::take(&mut self.statements);
        for statement in &statements {
            if statement.is_import_declaration() {
                self.add_import(statement.node())?;
            } else if statement.is_export_declaration() {
                self.add_export(statement.node());
            }
        }
        self.statements = statements;

        for statement in &mut self.statements {
            statement.analyse(&mut self.scopes, &self.id, &self.imports)?;
            for &id in statement.declarations() {
                let name = self.scopes.declaration(id).name().to_string();
                self.top_level.insert(name, id);
            }
        }

        tracing::trace!(
            module = %self.id,
            statements = self.statements.len(),
            imports = self.imports.len(),
            exports = self.exports.len(),
            "analysed module"
        );
        Ok(())
    }

    fn add_import(&mut self, node: &Node) -> Result<()> {
        let NodeKind::ImportDeclaration { source, specifiers } = &node.kind else {
            return Ok(());
        };
        self.dependencies.insert(source.clone());

        for specifier in specifiers {
            if self.imports.contains_key(&specifier.local) {
                return Err(GraphError::DuplicateBinding {
                    module: self.id.clone(),
                    name: specifier.local.clone(),
                });
            }
            self.imports.insert(
                specifier.local.clone(),
                Import {
                    source: source.clone(),
                    name: specifier.imported.clone(),
                    span: specifier.span,
                    module: None,
                },
            );
        }
        Ok(())
    }

    fn add_export(&mut self, node: &Node) {
        match &node.kind {
            NodeKind::ExportNamedDeclaration {
                declaration,
                specifiers,
                source,
            } => {
                if let Some(declaration) = declaration {
                    for name in declared_names(declaration) {
                        self.exports.insert(name.clone(), Export::Local { local: name });
                    }
                }

                if let Some(source) = source {
                    self.dependencies.insert(source.clone());
                }

                for specifier in specifiers {
                    let NodeKind::ExportSpecifier { local, exported } = &specifier.kind else {
                        continue;
                    };
                    let (Some(local), Some(exported)) = (identifier_name(local), identifier_name(exported)) else {
                        continue;
                    };
                    let export = match source {
                        Some(source) => Export::Reexport {
                            source: source.clone(),
                            imported: ImportedName::named(local),
                            module: None,
                        },
                        None => Export::Local {
                            local: local.to_string(),
                        },
                    };
                    self.exports.insert(exported.to_string(), export);
                }
            }
            NodeKind::ExportDefaultDeclaration { declaration } => {
                let local = declared_names(declaration)
                    .into_iter()
                    .next()
                    .unwrap_or_else(|| "default".to_string());
                self.exports.insert("default".to_string(), Export::Local { local });
            }
            NodeKind::ExportAllDeclaration { source, exported } => {
                self.dependencies.insert(source.clone());
                match exported {
                    Some(name) => {
                        self.exports.insert(
                            name.clone(),
                            Export::Reexport {
                                source: source.clone(),
                                imported: ImportedName::Namespace,
                                module: None,
                            },
                        );
                    }
                    None => self.star_exports.push(StarExport {
                        source: source.clone(),
                        module: None,
                    }),
                }
            }
            _ => {}
        }
    }

    pub fn id(&self) -> &ModuleId {
        &self.id
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    pub fn statement(&self, index: StatementIndex) -> Option<&Statement> {
        self.statements.get(index.index())
    }

    pub fn scopes(&self) -> &ScopeTree {
        &self.scopes
    }

    pub fn declaration(&self, id: DeclarationId) -> &Declaration {
        self.scopes.declaration(id)
    }

    /// Raw specifiers in first-seen order.
    pub fn dependencies(&self) -> &IndexSet<String> {
        &self.dependencies
    }

    pub fn imports(&self) -> &IndexMap<String, Import> {
        &self.imports
    }

    pub fn exports(&self) -> &IndexMap<String, Export> {
        &self.exports
    }

    pub fn star_exports(&self) -> &[StarExport] {
        &self.star_exports
    }

    /// Declaration of a name bound at module top level.
    pub fn top_level(&self, name: &str) -> Option<DeclarationId> {
        self.top_level.get(name).copied()
    }

    pub fn top_level_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.top_level.keys().map(String::as_str)
    }

    /// The synthetic namespace object declaration.
    pub fn namespace(&self) -> DeclarationId {
        self.namespace
    }

    /// Record what `specifier` resolved to; `None` marks it external.
    pub fn set_resolved(&mut self, specifier: impl Into<String>, target: Option<ModuleId>) {
        self.resolved.insert(specifier.into(), target);
    }

    pub fn resolved(&self, specifier: &str) -> Option<&ModuleId> {
        self.resolved.get(specifier).and_then(Option::as_ref)
    }

    /// Resolved dependencies in specifier order, skipping externals.
    pub fn resolved_dependencies(&self) -> impl Iterator<Item = &ModuleId> + '_ {
        self.resolved.values().flatten()
    }
}

/// Names bound by an exported declaration.
fn declared_names(node: &Node) -> Vec<String> {
    match &node.kind {
        NodeKind::VariableDeclaration { declarations, .. } => declarations
            .iter()
            .flat_map(|declarator| match &declarator.kind {
                NodeKind::VariableDeclarator { id, .. } => extract_names(id),
                _ => Vec::new(),
            })
            .collect(),
        NodeKind::FunctionDeclaration(function) => function.id.as_deref().map(extract_names).unwrap_or_default(),
        NodeKind::ClassDeclaration(class) => class.id.as_deref().map(extract_names).unwrap_or_default(),
        _ => Vec::new(),
    }
}

fn identifier_name(node: &Node) -> Option<&str> {
    match &node.kind {
        NodeKind::Identifier(name) => Some(name),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn module(source: &str) -> Module {
        Module::parse(ModuleId::new_virtual("main.js"), source).unwrap()
    }

    #[test]
    fn builds_import_table() {
        let module = module("import a, { b as c } from './x'; import * as ns from './y';");
        assert_eq!(module.dependencies().iter().collect::<Vec<_>>(), ["./x", "./y"]);
        assert_eq!(module.imports()["a"].name, ImportedName::Default);
        assert_eq!(module.imports()["c"].name, ImportedName::Named("b".into()));
        assert_eq!(module.imports()["ns"].name, ImportedName::Namespace);
        assert_eq!(module.imports()["ns"].source, "./y");
    }

    #[test]
    fn duplicate_import_binding_fails() {
        let err = Module::parse(
            ModuleId::new_virtual("dup.js"),
            "import { a } from './x'; import { b as a } from './y';",
        )
        .unwrap_err();
        assert!(matches!(err, GraphError::DuplicateBinding { ref name, .. } if name == "a"));
        assert_eq!(err.module(), &ModuleId::new_virtual("dup.js"));
    }

    #[test]
    fn builds_export_table() {
        let module = module(
            "export const { a, b: [c] } = obj;
             export function f() {}
             const local = 1;
             export { local as renamed };
             export { x as y, default as z } from './m';
             export * from './star';
             export * as ns from './ns';
             export default class Named {}",
        );

        let local = |name: &str| Export::Local {
            local: name.to_string(),
        };
        assert_eq!(module.exports()["a"], local("a"));
        assert_eq!(module.exports()["c"], local("c"));
        assert_eq!(module.exports()["f"], local("f"));
        assert_eq!(module.exports()["renamed"], local("local"));
        assert_eq!(module.exports()["default"], local("Named"));
        assert!(matches!(
            &module.exports()["y"],
            Export::Reexport { imported: ImportedName::Named(name), .. } if name == "x"
        ));
        assert!(matches!(
            &module.exports()["z"],
            Export::Reexport { imported: ImportedName::Default, .. }
        ));
        assert!(matches!(
            &module.exports()["ns"],
            Export::Reexport { imported: ImportedName::Namespace, source, .. } if source == "./ns"
        ));
        assert_eq!(module.star_exports()[0].source, "./star");
        assert!(module.dependencies().contains("./m"));
    }

    #[test]
    fn anonymous_default_export_is_local_default() {
        let module = module("export default function () {}");
        assert_eq!(
            module.exports()["default"],
            Export::Local {
                local: "default".into()
            }
        );
        let id = module.top_level("default").unwrap();
        assert_eq!(module.declaration(id).kind(), DeclarationKind::Default);
    }

    #[test]
    fn syntax_errors_name_the_module() {
        let err = Module::parse(ModuleId::new_virtual("bad.js"), "let = ;").unwrap_err();
        assert!(matches!(err, GraphError::Syntax { .. }));
        assert_eq!(err.module(), &ModuleId::new_virtual("bad.js"));
    }

    #[test]
    fn illegal_reassignment_of_imports() {
        let parse = |source: &str| Module::parse(ModuleId::new_virtual("m.js"), source);

        assert!(matches!(
            parse("import { x } from './x'; x = 1;"),
            Err(GraphError::IllegalReassignment { ref name, .. }) if name == "x"
        ));
        assert!(parse("import { x } from './x'; x.prop = 1;").is_ok());
        assert!(parse("import { x } from './x'; function f(x) { x = 1; }").is_ok());
        assert!(parse("import * as ns from './x'; ns.a = 1;").is_err());
        assert!(parse("import * as ns from './x'; ns.a.b = 1;").is_ok());
        assert!(matches!(
            parse("import * as ns from './x'; ns[k] = 1;"),
            Err(GraphError::IllegalReassignment { ref name, .. }) if name == "ns"
        ));
        assert!(parse("import * as ns from './x'; ns['a'] = 1;").is_err());
        assert!(parse("import * as ns from './x'; ns.a[k] = 1;").is_ok());
        assert!(parse("import { x } from './x'; x[k] = 1;").is_ok());
        assert!(parse("import d from './x'; [d] = [];").is_err());
        assert!(parse("import d from './x'; d++;").is_err());
    }
}
