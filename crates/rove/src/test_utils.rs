//! Test utilities for rove.
//!
//! [`MemoryRuntime`] serves modules from an in-memory file table under
//! `virtual:` ids, counts loads per module and can delay every load to force
//! concurrent fetches to overlap.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use path_clean::PathClean;
use rove_graph::ModuleId;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::runtime::{Runtime, RuntimeError, RuntimeResult, is_relative};

/// In-memory runtime for tests.
///
/// ```rust
/// use rove::test_utils::MemoryRuntime;
///
/// let runtime = MemoryRuntime::new()
///     .with_file("main.js", "import { h } from './lib.js'; export const x = h();")
///     .with_file("lib.js", "export function h() {}");
/// assert_eq!(runtime.total_loads(), 0);
/// ```
#[derive(Debug, Default)]
pub struct MemoryRuntime {
    files: FxHashMap<PathBuf, String>,
    unreadable: FxHashSet<PathBuf>,
    delay: Option<Duration>,
    loads: Mutex<FxHashMap<ModuleId, usize>>,
}

impl MemoryRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a module at `path` (relative to the virtual root).
    pub fn with_file(mut self, path: impl AsRef<Path>, source: impl Into<String>) -> Self {
        self.files.insert(path.as_ref().clean(), source.into());
        self
    }

    /// Add a module that resolves but fails to load.
    pub fn with_unreadable(mut self, path: impl AsRef<Path>) -> Self {
        self.unreadable.insert(path.as_ref().clean());
        self
    }

    /// Sleep for `delay` before every load.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// How many times the module at `path` was loaded.
    pub fn load_count(&self, path: impl AsRef<Path>) -> usize {
        let id = virtual_id(&path.as_ref().clean());
        self.loads.lock().get(&id).copied().unwrap_or(0)
    }

    pub fn total_loads(&self) -> usize {
        self.loads.lock().values().sum()
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.contains_key(path) || self.unreadable.contains(path)
    }
}

#[async_trait]
impl Runtime for MemoryRuntime {
    async fn resolve(
        &self,
        specifier: &str,
        importer: Option<&ModuleId>,
    ) -> RuntimeResult<Option<ModuleId>> {
        let base = match importer {
            None => PathBuf::from(specifier),
            Some(importer) if is_relative(specifier) => {
                let dir = importer
                    .virtual_path()
                    .and_then(|path| path.parent().map(Path::to_path_buf))
                    .unwrap_or_default();
                dir.join(specifier)
            }
            Some(_) => return Ok(None),
        };
        let base = base.clean();

        let js = PathBuf::from(format!("{}.js", base.display()));
        let index = base.join("index.js");
        Ok([base, js, index]
            .into_iter()
            .find(|candidate| self.exists(candidate))
            .map(|found| virtual_id(&found)))
    }

    async fn load(&self, id: &ModuleId) -> RuntimeResult<String> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        *self.loads.lock().entry(id.clone()).or_default() += 1;

        let path = id
            .virtual_path()
            .ok_or_else(|| RuntimeError::FileNotFound(id.as_path().to_path_buf()))?;
        if self.unreadable.contains(path) {
            return Err(RuntimeError::Io(format!("permission denied: {}", path.display())));
        }
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| RuntimeError::FileNotFound(path.to_path_buf()))
    }
}

fn virtual_id(path: &Path) -> ModuleId {
    ModuleId::new_virtual(path.to_string_lossy().into_owned())
}
