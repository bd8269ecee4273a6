//! Concurrent module fetching.
//!
//! Every module is loaded, parsed and analysed exactly once. A module's slot
//! is reserved under the table lock before the first await, so dependents
//! racing to fetch the same id find it taken and return immediately. Once a
//! module is ready its resolved dependencies are fetched concurrently.

use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt, try_join_all};
use indexmap::IndexMap;
use parking_lot::Mutex;
use rove_graph::{Module, ModuleId};
use tracing::{debug, trace};

use crate::diagnostic::Diagnostic;
use crate::error::{Error, Result};
use crate::runtime::Runtime;

#[derive(Debug)]
enum Slot {
    /// Reserved; the fetch that reserved it is still running.
    Pending,
    Ready(Box<Module>),
}

/// Build-scoped module table.
#[derive(Debug)]
pub struct Fetcher {
    runtime: Arc<dyn Runtime>,
    external: Vec<String>,
    slots: Mutex<IndexMap<ModuleId, Slot>>,
    diagnostics: Mutex<Vec<Diagnostic>>,
}

impl Fetcher {
    pub fn new(runtime: Arc<dyn Runtime>, external: Vec<String>) -> Self {
        Self {
            runtime,
            external,
            slots: Mutex::new(IndexMap::new()),
            diagnostics: Mutex::new(Vec::new()),
        }
    }

    /// Fetch `id` and, transitively, everything it imports.
    ///
    /// Returns as soon as `id` is known to be fetched by someone: a module that
    /// already has a slot is not waited on. The future driving the whole fetch
    /// completes only after every reserved slot is ready.
    pub fn fetch_module(&self, id: ModuleId) -> BoxFuture<'_, Result<()>> {
        async move {
            {
                let mut slots = self.slots.lock();
                if slots.contains_key(&id) {
                    trace!(module = %id, "already fetched");
                    return Ok(());
                }
                slots.insert(id.clone(), Slot::Pending);
            }

            let code = self
                .runtime
                .load(&id)
                .await
                .map_err(|source| Error::Io {
                    module: id.clone(),
                    source,
                })?;
            let mut module = Module::parse(id.clone(), code)?;

            let specifiers: Vec<String> = module.dependencies().iter().cloned().collect();
            let targets =
                try_join_all(specifiers.iter().map(|specifier| self.resolve(specifier, &id)))
                    .await?;
            for (specifier, target) in specifiers.into_iter().zip(targets) {
                module.set_resolved(specifier, target);
            }

            let dependencies: Vec<ModuleId> = module.resolved_dependencies().cloned().collect();
            debug!(
                module = %id,
                statements = module.statements().len(),
                dependencies = dependencies.len(),
                "fetched module"
            );
            self.slots.lock().insert(id, Slot::Ready(Box::new(module)));

            try_join_all(
                dependencies
                    .into_iter()
                    .map(|dependency| self.fetch_module(dependency)),
            )
            .await?;
            Ok(())
        }
        .boxed()
    }

    async fn resolve(&self, specifier: &str, importer: &ModuleId) -> Result<Option<ModuleId>> {
        if is_external(specifier, &self.external) {
            trace!(specifier, importer = %importer, "external");
            return Ok(None);
        }

        match self.runtime.resolve(specifier, Some(importer)).await {
            Ok(Some(target)) => Ok(Some(target)),
            Ok(None) => {
                self.diagnostics.lock().push(Diagnostic::UnresolvedDependency {
                    specifier: specifier.to_string(),
                    importer: importer.clone(),
                });
                Ok(None)
            }
            Err(source) => Err(Error::Resolve {
                specifier: specifier.to_string(),
                importer: Some(importer.clone()),
                source,
            }),
        }
    }

    /// Number of modules fetched or in flight.
    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The fetched modules in the order their fetch started, plus the
    /// diagnostics raised while resolving.
    pub fn finish(self) -> (Vec<Module>, Vec<Diagnostic>) {
        let modules = self
            .slots
            .into_inner()
            .into_values()
            .filter_map(|slot| match slot {
                Slot::Ready(module) => Some(*module),
                Slot::Pending => None,
            })
            .collect();
        (modules, self.diagnostics.into_inner())
    }
}

/// Whether `specifier` matches one of the configured externals, either exactly
/// or as a subpath (`react` covers `react/jsx-runtime`).
pub fn is_external(specifier: &str, external: &[String]) -> bool {
    external.iter().any(|name| {
        specifier == name
            || specifier
                .strip_prefix(name.as_str())
                .is_some_and(|rest| rest.starts_with('/'))
    })
}
