//! Error types for module analysis and linking.

use miette::Diagnostic;
use thiserror::Error;

use crate::ModuleId;

/// Result type for graph operations.
pub type Result<T> = std::result::Result<T, GraphError>;

/// Fatal analysis errors. Each variant names the module it was raised in.
#[derive(Debug, Error, Diagnostic)]
pub enum GraphError {
    /// The parser rejected the module source.
    #[error("syntax error in '{module}' at offset {offset}: {message}")]
    #[diagnostic(code(rove::graph::syntax))]
    Syntax {
        module: ModuleId,
        message: String,
        offset: u32,
    },

    /// Two import specifiers bind the same local name.
    #[error("duplicated import '{name}' in '{module}'")]
    #[diagnostic(code(rove::graph::duplicate_binding))]
    DuplicateBinding { module: ModuleId, name: String },

    /// An imported binding is written to.
    #[error("illegal reassignment to import '{name}' in '{module}'")]
    #[diagnostic(
        code(rove::graph::illegal_reassignment),
        help("imports are read-only; only nested properties of an import may be assigned")
    )]
    IllegalReassignment { module: ModuleId, name: String },

    /// Re-exports of `name` form a cycle that never reaches a declaration.
    #[error("export '{name}' of '{module}' is part of a re-export cycle")]
    #[diagnostic(code(rove::graph::cyclic_export))]
    CyclicExport { module: ModuleId, name: String },

    /// A module id was looked up that is not part of the graph.
    #[error("module '{0}' is not part of the graph")]
    #[diagnostic(code(rove::graph::unknown_module))]
    UnknownModule(ModuleId),
}

impl GraphError {
    /// The module the error was raised in.
    pub fn module(&self) -> &ModuleId {
        match self {
            GraphError::Syntax { module, .. }
            | GraphError::DuplicateBinding { module, .. }
            | GraphError::IllegalReassignment { module, .. }
            | GraphError::CyclicExport { module, .. } => module,
            GraphError::UnknownModule(module) => module,
        }
    }
}
