//! Platform runtime abstraction for rove.
//!
//! The build never touches the filesystem directly. Resolving specifiers and
//! loading source text go through the [`Runtime`] trait, so the same fetch
//! logic runs against disk ([`native::NativeRuntime`]) or against in-memory
//! fixtures in tests.

#[cfg(not(target_family = "wasm"))]
pub mod native;

use std::path::PathBuf;

use async_trait::async_trait;
use rove_graph::{ModuleId, ModuleIdError};

pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Failures reported by a [`Runtime`].
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("no such file: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("i/o failure: {0}")]
    Io(String),

    /// The runtime understood the specifier but cannot resolve it from `from`.
    #[error("cannot resolve '{specifier}' from '{from}': {reason}")]
    ResolutionFailed {
        specifier: String,
        from: ModuleId,
        reason: String,
    },

    /// A resolved path could not be turned into a module id.
    #[error(transparent)]
    InvalidId(#[from] ModuleIdError),

    #[error("{0}")]
    Other(String),
}

/// Where module sources come from.
///
/// `resolve` maps an import specifier to a canonical [`ModuleId`]. `importer`
/// is `None` for the entry. Returning `Ok(None)` means the runtime has no
/// module for the specifier; the build records a diagnostic and treats the
/// import as external. Errors are fatal.
#[async_trait]
pub trait Runtime: Send + Sync + std::fmt::Debug {
    /// Map `specifier`, imported by `importer`, to a module id.
    async fn resolve(
        &self,
        specifier: &str,
        importer: Option<&ModuleId>,
    ) -> RuntimeResult<Option<ModuleId>>;

    /// Read the source text of a resolved module.
    async fn load(&self, id: &ModuleId) -> RuntimeResult<String>;
}

/// Whether `specifier` is written relative to its importer.
pub fn is_relative(specifier: &str) -> bool {
    specifier == "."
        || specifier == ".."
        || specifier.starts_with("./")
        || specifier.starts_with("../")
}
