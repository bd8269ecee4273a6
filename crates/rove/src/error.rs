//! Error types for building a bundle.

use miette::Diagnostic;
use rove_graph::{GraphError, ModuleId};
use thiserror::Error;

use crate::runtime::RuntimeError;

/// Result type for build operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Fatal build errors.
///
/// Anything raised while a specific module was being processed names that
/// module. Non-fatal conditions are reported as [`crate::Diagnostic`]s instead.
#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    /// Parsing, analysis or linking failed.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Graph(#[from] GraphError),

    /// The runtime could not load a module's source.
    #[error("failed to load '{module}': {source}")]
    #[diagnostic(code(rove::io))]
    Io {
        module: ModuleId,
        #[source]
        source: RuntimeError,
    },

    /// The runtime failed while resolving a specifier.
    #[error("failed to resolve '{specifier}' {}: {source}", importer_label(.importer))]
    #[diagnostic(code(rove::resolve))]
    Resolve {
        specifier: String,
        importer: Option<ModuleId>,
        #[source]
        source: RuntimeError,
    },

    /// The entry specifier resolved to nothing.
    #[error("entry '{0}' could not be resolved")]
    #[diagnostic(
        code(rove::entry_not_found),
        help("entries are resolved relative to the configured cwd")
    )]
    EntryNotFound(String),

    /// A build option has an unusable value.
    #[error("invalid option '{field}': {reason}")]
    #[diagnostic(code(rove::invalid_config))]
    InvalidConfig { field: String, reason: String },

    /// Configuration sources could not be merged or extracted.
    #[error("failed to load configuration: {0}")]
    #[diagnostic(code(rove::config))]
    Config(#[from] figment::Error),

    /// Fetching the module graph exceeded the configured limit.
    #[error("fetching modules did not finish within {ms}ms")]
    #[diagnostic(code(rove::timeout))]
    Timeout { ms: u64 },
}

impl Error {
    /// The module the error was raised in, if it concerns one.
    pub fn module(&self) -> Option<&ModuleId> {
        match self {
            Error::Graph(err) => Some(err.module()),
            Error::Io { module, .. } => Some(module),
            Error::Resolve { importer, .. } => importer.as_ref(),
            Error::EntryNotFound(_)
            | Error::InvalidConfig { .. }
            | Error::Config(_)
            | Error::Timeout { .. } => None,
        }
    }

    pub(crate) fn invalid_config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::InvalidConfig {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

fn importer_label(importer: &Option<ModuleId>) -> String {
    match importer {
        Some(importer) => format!("from '{importer}'"),
        None => "as the entry".to_string(),
    }
}
