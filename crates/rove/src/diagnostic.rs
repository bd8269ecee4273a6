//! Non-fatal build conditions.

use rove_graph::{MissingExport, ModuleId};
use serde::Serialize;
use thiserror::Error;

/// A problem that does not stop the build.
///
/// Diagnostics are collected into [`crate::BuildOutput::diagnostics`] and
/// logged at `warn` once the build completes.
#[derive(Debug, Clone, PartialEq, Eq, Error, miette::Diagnostic, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// The runtime found nothing for a specifier. The import stays external.
    #[error("could not resolve '{specifier}' imported by '{importer}'")]
    #[diagnostic(
        code(rove::unresolved_dependency),
        severity(Warning),
        help("add the specifier to `external` if it is provided at runtime")
    )]
    UnresolvedDependency { specifier: String, importer: ModuleId },

    /// An import or re-export names something the target does not export.
    #[error("'{name}' is not exported by '{module}', imported by '{importer}'")]
    #[diagnostic(code(rove::missing_export), severity(Warning))]
    MissingExport {
        module: ModuleId,
        name: String,
        importer: ModuleId,
    },
}

impl Diagnostic {
    /// The module whose import triggered the diagnostic.
    pub fn importer(&self) -> &ModuleId {
        match self {
            Diagnostic::UnresolvedDependency { importer, .. }
            | Diagnostic::MissingExport { importer, .. } => importer,
        }
    }
}

impl From<MissingExport> for Diagnostic {
    fn from(missing: MissingExport) -> Self {
        Diagnostic::MissingExport {
            module: missing.module,
            name: missing.name,
            importer: missing.importer,
        }
    }
}
