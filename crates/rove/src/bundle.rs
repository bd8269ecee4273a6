//! Build orchestration: resolve the entry, fetch the graph, link, shake.

use std::sync::Arc;

use indexmap::IndexMap;
use rove_graph::{DeclarationKey, Module, ModuleGraph, ModuleId, Statement, StatementIndex};
use tracing::{Level, debug, info, warn};

use crate::config::BuildOptions;
use crate::diagnostic::Diagnostic;
use crate::error::{Error, Result};
use crate::fetch::Fetcher;
use crate::runtime::Runtime;

/// A configured build.
///
/// ```rust,no_run
/// use rove::{Bundle, BuildOptions};
///
/// # async fn example() -> rove::Result<()> {
/// let output = Bundle::new(BuildOptions::new("src/main.js").cwd("./app"))
///     .build()
///     .await?;
/// for (module, statement) in output.included_statements() {
///     println!("{} keeps {:?}", module.id(), statement.span());
/// }
/// # Ok(()) }
/// ```
#[derive(Debug, Clone)]
pub struct Bundle {
    options: BuildOptions,
    runtime: Arc<dyn Runtime>,
}

impl Bundle {
    /// A build reading modules from disk under `options.cwd`.
    #[cfg(not(target_family = "wasm"))]
    pub fn new(options: BuildOptions) -> Self {
        let runtime = Arc::new(crate::runtime::native::NativeRuntime::new(options.cwd.clone()));
        Self { options, runtime }
    }

    /// A build using a custom runtime.
    pub fn with_runtime(options: BuildOptions, runtime: Arc<dyn Runtime>) -> Self {
        Self { options, runtime }
    }

    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    /// Run the build.
    ///
    /// Fatal errors abort with the module they were raised in. Unresolved
    /// specifiers and missing exports are returned as diagnostics.
    #[tracing::instrument(skip(self), fields(entry = %self.options.entry))]
    pub async fn build(&self) -> Result<BuildOutput> {
        self.options.validate()?;

        let entry = self
            .runtime
            .resolve(&self.options.entry, None)
            .await
            .map_err(|source| Error::Resolve {
                specifier: self.options.entry.clone(),
                importer: None,
                source,
            })?
            .ok_or_else(|| Error::EntryNotFound(self.options.entry.clone()))?;

        let fetcher = Fetcher::new(self.runtime.clone(), self.options.external.clone());
        let fetch = fetcher.fetch_module(entry.clone());
        match self.options.timeout() {
            Some(limit) => tokio::time::timeout(limit, fetch)
                .await
                .map_err(|_| Error::Timeout {
                    ms: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
                })??,
            None => fetch.await?,
        }
        let (modules, mut diagnostics) = fetcher.finish();
        debug!(modules = modules.len(), "fetched module graph");

        let mut graph = ModuleGraph::new(modules, &entry)?;
        let missing = graph.link()?;
        diagnostics.extend(missing.into_iter().map(Diagnostic::from));
        debug!("linked module graph");

        let entry_exports = graph.shake()?;

        let log_level = self.options.log_level;
        if log_level.enables(Level::WARN) {
            for diagnostic in &diagnostics {
                warn!("{diagnostic}");
            }
        }

        let output = BuildOutput {
            graph,
            entry_exports,
            diagnostics,
        };
        if log_level.enables(Level::INFO) {
            info!(
                modules = output.graph.len(),
                included = output.included_statements().count(),
                exports = output.entry_exports.len(),
                "build complete"
            );
        }
        Ok(output)
    }
}

impl BuildOptions {
    /// Build from disk with these options.
    #[cfg(not(target_family = "wasm"))]
    pub async fn build(self) -> Result<BuildOutput> {
        Bundle::new(self).build().await
    }
}

/// The result of a build: the shaken graph and what the entry exposes.
#[derive(Debug)]
pub struct BuildOutput {
    /// Modules in fetch order, statements flagged with their inclusion.
    pub graph: ModuleGraph,
    /// Each export of the entry and the declaration it resolves to.
    pub entry_exports: IndexMap<String, DeclarationKey>,
    pub diagnostics: Vec<Diagnostic>,
}

impl BuildOutput {
    /// Whether `statement` of module `id` survives tree-shaking.
    pub fn is_included(&self, id: &ModuleId, statement: StatementIndex) -> bool {
        self.graph
            .index_of(id)
            .and_then(|module| self.graph.statement(module, statement))
            .is_some_and(Statement::is_included)
    }

    /// Every included statement, grouped by module in fetch order.
    pub fn included_statements(&self) -> impl Iterator<Item = (&Module, &Statement)> + '_ {
        self.graph.modules().iter().flat_map(|module| {
            module
                .statements()
                .iter()
                .filter(|statement| statement.is_included())
                .map(move |statement| (module, statement))
        })
    }

    /// Source text of the included statements of `id`.
    pub fn included_code(&self, id: &ModuleId) -> Vec<&str> {
        let Some(module) = self.graph.module_by_id(id) else {
            return Vec::new();
        };
        module
            .statements()
            .iter()
            .filter(|statement| statement.is_included())
            .filter_map(|statement| {
                let span = statement.span();
                module.code().get(span.start as usize..span.end as usize)
            })
            .collect()
    }
}
