use rustc_hash::FxHashSet;

use super::{DeclarationKey, ModuleGraph, ModuleIndex, ReferenceKey};
use crate::error::{GraphError, Result};
use crate::module::Export;
use crate::statement::Reference;
use crate::ModuleId;

/// An import or re-export naming something its target module does not export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingExport {
    /// The module that was expected to export `name`.
    pub module: ModuleId,
    pub name: String,
    pub importer: ModuleId,
}

/// `(module, export name)` pairs on the current trace path.
type TracePath = FxHashSet<(ModuleIndex, String)>;

impl ModuleGraph {
    /// Attach every import, re-export and star export to the module its specifier
    /// resolved to. Externals stay unattached.
    pub fn bind_import_specifiers(&mut self) {
        let index = &self.index;
        for module in &mut self.modules {
            let lookup =
                |source: &str| module.resolved(source).and_then(|id| index.get(id).copied());

            let imports: Vec<_> = module
                .imports
                .values()
                .map(|import| lookup(&import.source))
                .collect();
            let exports: Vec<_> = module
                .exports
                .values()
                .map(|export| match export {
                    Export::Reexport { source, .. } => lookup(source),
                    Export::Local { .. } => None,
                })
                .collect();
            let stars: Vec<_> = module
                .star_exports
                .iter()
                .map(|star| lookup(&star.source))
                .collect();

            for (import, target) in module.imports.values_mut().zip(imports) {
                import.module = target;
            }
            for (export, target) in module.exports.values_mut().zip(exports) {
                if let Export::Reexport { module, .. } = export {
                    *module = target;
                }
            }
            for (star, target) in module.star_exports.iter_mut().zip(stars) {
                star.module = target;
            }
        }
    }

    /// Resolve a name as seen from inside `module`: a top-level declaration, or an
    /// import followed to the declaration that ultimately defines it.
    pub fn trace(&self, module: ModuleIndex, name: &str) -> Result<Option<DeclarationKey>> {
        self.trace_local(module, name, &mut TracePath::default())
    }

    /// Resolve an exported name of `module` through any chain of re-exports.
    ///
    /// `*` resolves to the module's namespace declaration. Star exports are consulted
    /// after the export table and never provide `default`. A chain that comes back to
    /// an export it is already resolving fails with [`GraphError::CyclicExport`].
    pub fn trace_export(
        &self,
        module: ModuleIndex,
        name: &str,
    ) -> Result<Option<DeclarationKey>> {
        self.trace_export_inner(module, name, false, &mut TracePath::default())
    }

    fn trace_local(
        &self,
        module: ModuleIndex,
        name: &str,
        path: &mut TracePath,
    ) -> Result<Option<DeclarationKey>> {
        let current = self.module(module);

        if let Some(declaration) = current.top_level(name) {
            return Ok(Some(DeclarationKey {
                module,
                declaration,
            }));
        }

        match current.imports.get(name) {
            Some(import) => match import.module {
                Some(target) => {
                    self.trace_export_inner(target, import.name.as_export_name(), false, path)
                }
                None => Ok(None),
            },
            None => Ok(None),
        }
    }

    fn trace_export_inner(
        &self,
        module: ModuleIndex,
        name: &str,
        via_star: bool,
        path: &mut TracePath,
    ) -> Result<Option<DeclarationKey>> {
        let current = self.module(module);

        if name == "*" {
            return Ok(Some(DeclarationKey {
                module,
                declaration: current.namespace(),
            }));
        }

        let step = (module, name.to_string());
        if path.contains(&step) {
            // Star exports may loop back on themselves; that only means "not found here".
            return if via_star {
                Ok(None)
            } else {
                Err(GraphError::CyclicExport {
                    module: current.id().clone(),
                    name: name.to_string(),
                })
            };
        }
        path.insert(step.clone());
        let found = self.trace_export_step(module, name, path);
        path.remove(&step);
        found
    }

    fn trace_export_step(
        &self,
        module: ModuleIndex,
        name: &str,
        path: &mut TracePath,
    ) -> Result<Option<DeclarationKey>> {
        let current = self.module(module);

        if let Some(export) = current.exports.get(name) {
            return match export {
                Export::Local { local } => self.trace_local(module, local, path),
                Export::Reexport {
                    imported,
                    module: Some(target),
                    ..
                } => self.trace_export_inner(*target, imported.as_export_name(), false, path),
                Export::Reexport { module: None, .. } => Ok(None),
            };
        }

        if name == "default" {
            return Ok(None);
        }

        for star in &current.star_exports {
            if let Some(target) = star.module {
                if let Some(found) = self.trace_export_inner(target, name, true, path)? {
                    return Ok(Some(found));
                }
            }
        }

        Ok(None)
    }

    /// Every name `module` exports, explicit names first, then star exports
    /// (without `default`), each once.
    pub fn export_names(&self, module: ModuleIndex) -> Vec<String> {
        let mut names = Vec::new();
        let mut seen_names = FxHashSet::default();
        let mut seen_modules = FxHashSet::default();
        self.collect_export_names(module, true, &mut names, &mut seen_names, &mut seen_modules);
        names
    }

    fn collect_export_names(
        &self,
        module: ModuleIndex,
        with_default: bool,
        names: &mut Vec<String>,
        seen_names: &mut FxHashSet<String>,
        seen_modules: &mut FxHashSet<ModuleIndex>,
    ) {
        if !seen_modules.insert(module) {
            return;
        }
        let current = self.module(module);
        for name in current.exports.keys() {
            if (with_default || name != "default") && seen_names.insert(name.clone()) {
                names.push(name.clone());
            }
        }
        for star in &current.star_exports {
            if let Some(target) = star.module {
                self.collect_export_names(target, false, names, seen_names, seen_modules);
            }
        }
    }

    /// Bind every reference of every statement: scope chain first, then the
    /// module's top level and imports. Unresolved references are globals.
    pub fn bind_references(&mut self) -> Result<Vec<MissingExport>> {
        let mut bindings = Vec::new();

        for (position, module) in self.modules.iter().enumerate() {
            let module_index = ModuleIndex::new(position);
            for statement in module.statements() {
                for (reference_index, reference) in statement.references().iter().enumerate() {
                    let local = module
                        .scopes()
                        .find_declaration(reference.scope, &reference.name);
                    let declaration = match local {
                        Some(declaration) => Some(DeclarationKey {
                            module: module_index,
                            declaration,
                        }),
                        None => self.trace(module_index, &reference.name)?,
                    };
                    if let Some(declaration) = declaration {
                        bindings.push((
                            ReferenceKey {
                                module: module_index,
                                statement: statement.index(),
                                reference: reference_index as u32,
                            },
                            declaration,
                            reference.is_reassignment,
                        ));
                    }
                }
            }
        }

        for (key, declaration, is_reassignment) in &bindings {
            let statement = &mut self.modules[key.module.index()].statements[key.statement.index()];
            statement.references_mut()[key.reference as usize].declaration = Some(*declaration);
            self.declaration_mut(*declaration)
                .add_reference(*key, *is_reassignment);
        }

        tracing::debug!(references = bindings.len(), "bound references");
        self.missing_exports()
    }

    fn missing_exports(&self) -> Result<Vec<MissingExport>> {
        let mut missing = Vec::new();

        for module in &self.modules {
            let imported = module
                .imports
                .values()
                .filter_map(|import| import.module.map(|target| (target, import.name.as_export_name())));
            let reexported = module.exports.values().filter_map(|export| match export {
                Export::Reexport {
                    imported,
                    module: Some(target),
                    ..
                } => Some((*target, imported.as_export_name())),
                _ => None,
            });

            for (target, name) in imported.chain(reexported) {
                if self.trace_export(target, name)?.is_none() {
                    missing.push(MissingExport {
                        module: self.module(target).id().clone(),
                        name: name.to_string(),
                        importer: module.id().clone(),
                    });
                }
            }
        }

        Ok(missing)
    }

    /// The reference a key points to.
    pub fn reference(&self, key: ReferenceKey) -> Option<&Reference> {
        self.statement(key.module, key.statement)?
            .references()
            .get(key.reference as usize)
    }
}
