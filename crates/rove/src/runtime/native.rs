//! Filesystem runtime.
//!
//! Resolves relative and absolute specifiers against the filesystem and reads
//! module sources with `std::fs`, off the async executor.
//!
//! ```text
//!  "./util"  ──► importer dir / util
//!                 ├─ util
//!                 ├─ util.js
//!                 ├─ util.mjs
//!                 ├─ util/index.js
//!                 └─ util/index.mjs   first file that exists wins
//!  "lodash"  ──► None (bare specifiers are never resolved here)
//! ```

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use path_clean::PathClean;
use rove_graph::ModuleId;
use tokio::task;

use super::{Runtime, RuntimeError, RuntimeResult, is_relative};

const EXTENSIONS: &[&str] = &["js", "mjs"];
const INDEX_FILES: &[&str] = &["index.js", "index.mjs"];

/// Runtime reading modules from disk.
///
/// Probing and reads are blocking, so they run on tokio's blocking pool. The
/// entry specifier is resolved against `cwd`.
///
/// # Example
///
/// ```rust,no_run
/// use rove::runtime::{Runtime, native::NativeRuntime};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let runtime = NativeRuntime::new("./app");
/// let entry = runtime.resolve("src/main", None).await?;
/// # Ok(()) }
/// ```
#[derive(Debug, Clone)]
pub struct NativeRuntime {
    cwd: PathBuf,
}

impl NativeRuntime {
    /// Create a runtime resolving entries against `cwd`.
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        Self { cwd: cwd.into() }
    }

    /// The directory entries are resolved against.
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    fn base_path(
        &self,
        specifier: &str,
        importer: Option<&ModuleId>,
    ) -> RuntimeResult<Option<PathBuf>> {
        let path = Path::new(specifier);
        if path.is_absolute() {
            return Ok(Some(path.to_path_buf()));
        }

        match importer {
            // Entries may be written without a leading `./`.
            None => Ok(Some(self.cwd.join(path))),
            Some(importer) if is_relative(specifier) => {
                if importer.is_virtual() {
                    return Err(RuntimeError::ResolutionFailed {
                        specifier: specifier.to_string(),
                        from: importer.clone(),
                        reason: "virtual modules cannot import from the filesystem".to_string(),
                    });
                }
                let dir = importer.as_path().parent().unwrap_or(Path::new(""));
                Ok(Some(dir.join(path)))
            }
            Some(_) => Ok(None),
        }
    }
}

impl Default for NativeRuntime {
    fn default() -> Self {
        Self::new(".")
    }
}

#[async_trait]
impl Runtime for NativeRuntime {
    async fn resolve(
        &self,
        specifier: &str,
        importer: Option<&ModuleId>,
    ) -> RuntimeResult<Option<ModuleId>> {
        let Some(base) = self.base_path(specifier, importer)? else {
            return Ok(None);
        };
        let base = base.clean();

        task::spawn_blocking(move || {
            candidates(&base)
                .into_iter()
                .find(|candidate| candidate.is_file())
                .map(ModuleId::new)
                .transpose()
                .map_err(RuntimeError::from)
        })
        .await
        .map_err(|err| RuntimeError::Other(format!("blocking task failed: {err}")))?
    }

    async fn load(&self, id: &ModuleId) -> RuntimeResult<String> {
        if id.is_virtual() {
            return Err(RuntimeError::Other(format!(
                "virtual module '{id}' has no file on disk"
            )));
        }
        let path = id.as_path().to_path_buf();

        task::spawn_blocking(move || {
            std::fs::read_to_string(&path).map_err(|err| match err.kind() {
                std::io::ErrorKind::NotFound => RuntimeError::FileNotFound(path.clone()),
                _ => RuntimeError::Io(format!("reading {}: {err}", path.display())),
            })
        })
        .await
        .map_err(|err| RuntimeError::Other(format!("blocking task failed: {err}")))?
    }
}

/// Paths probed for `base`, in priority order.
fn candidates(base: &Path) -> Vec<PathBuf> {
    let mut paths = vec![base.to_path_buf()];
    paths.extend(EXTENSIONS.iter().map(|extension| {
        let mut path = OsString::from(base.as_os_str());
        path.push(".");
        path.push(extension);
        PathBuf::from(path)
    }));
    paths.extend(INDEX_FILES.iter().map(|index| base.join(index)));
    paths
}
