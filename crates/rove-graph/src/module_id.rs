//! Canonical module identities.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use path_clean::PathClean;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

const VIRTUAL_PREFIX: &str = "virtual:";

/// Canonical identity of a module.
///
/// Two importers that reach the same source through different specifiers must
/// end up with equal ids, since the fetcher keys its module table on them.
///
/// * File ids are absolute and cleaned. On native targets they are also
///   canonicalised when the file exists, so symlinks and `..` detours collapse.
/// * Virtual ids (`virtual:src/main.js`) hold a cleaned relative path and never
///   touch the filesystem. In-memory runtimes and tests use them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId(Location);

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
enum Location {
    File(PathBuf),
    Virtual(PathBuf),
}

impl ModuleId {
    /// Id for a file. Relative paths are taken against the current directory;
    /// a `virtual:` prefix produces a virtual id instead.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, ModuleIdError> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(ModuleIdError::EmptyPath);
        }
        if let Some(body) = path.to_str().and_then(|s| s.strip_prefix(VIRTUAL_PREFIX)) {
            return Ok(Self::new_virtual(body));
        }
        Ok(Self(Location::File(absolutize(path)?)))
    }

    /// Id for an in-memory module. The prefix is optional and the path is
    /// cleaned, so `virtual:src/./a.js` and `src/a.js` name the same module.
    pub fn new_virtual(id: impl Into<String>) -> Self {
        let id = id.into();
        let body = id.strip_prefix(VIRTUAL_PREFIX).unwrap_or(&id);
        Self(Location::Virtual(Path::new(body).clean()))
    }

    /// The file path, or the relative path of a virtual id.
    pub fn as_path(&self) -> &Path {
        match &self.0 {
            Location::File(path) | Location::Virtual(path) => path,
        }
    }

    pub fn is_virtual(&self) -> bool {
        matches!(self.0, Location::Virtual(_))
    }

    /// The relative path of a virtual id; `None` for files.
    pub fn virtual_path(&self) -> Option<&Path> {
        match &self.0 {
            Location::Virtual(path) => Some(path),
            Location::File(_) => None,
        }
    }
}

fn absolutize(path: &Path) -> Result<PathBuf, ModuleIdError> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        let cwd = std::env::current_dir().map_err(|source| ModuleIdError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        cwd.join(path)
    };
    let cleaned = absolute.clean();

    if cfg!(target_family = "wasm") {
        return Ok(cleaned);
    }
    match std::fs::canonicalize(&cleaned) {
        Ok(canonical) => Ok(canonical),
        // Ids may name files that do not exist (yet); keep them cleaned.
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(cleaned),
        Err(source) => Err(ModuleIdError::Io {
            path: cleaned,
            source,
        }),
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Location::File(path) => write!(f, "{}", path.display()),
            Location::Virtual(path) => write!(f, "{VIRTUAL_PREFIX}{}", path.display()),
        }
    }
}

impl Serialize for ModuleId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ModuleId {
    /// Deserialised file ids are trusted as written; they are not re-canonicalised.
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(match raw.strip_prefix(VIRTUAL_PREFIX) {
            Some(body) => Self::new_virtual(body),
            None => Self(Location::File(PathBuf::from(raw))),
        })
    }
}

/// Why a path could not become a [`ModuleId`].
#[derive(Debug, Error)]
pub enum ModuleIdError {
    #[error("module id path is empty")]
    EmptyPath,

    #[error("cannot make '{path}' absolute: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn virtual_ids_are_cleaned() {
        let a = ModuleId::new_virtual("virtual:src/./lib/../a.js");
        let b = ModuleId::new_virtual("src/a.js");
        assert_eq!(a, b);
        assert!(a.is_virtual());
        assert_eq!(a.virtual_path(), Some(Path::new("src/a.js")));
        assert_eq!(a.to_string(), "virtual:src/a.js");
    }

    #[test]
    fn prefixed_paths_become_virtual() {
        let id = ModuleId::new("virtual:main.js").unwrap();
        assert_eq!(id, ModuleId::new_virtual("main.js"));
    }

    #[test]
    fn empty_path_is_rejected() {
        assert!(matches!(ModuleId::new(""), Err(ModuleIdError::EmptyPath)));
    }

    #[test]
    fn file_ids_are_absolute_and_cleaned() {
        let id = ModuleId::new("src/../src/index.js").unwrap();
        assert!(id.as_path().is_absolute());
        assert!(id.as_path().ends_with("src/index.js"));
        assert!(!id.is_virtual());
        assert!(id.virtual_path().is_none());
    }

    #[test]
    fn virtual_and_file_ids_never_collide() {
        let file = ModuleId::new("/main.js").unwrap();
        let virtual_id = ModuleId::new_virtual("main.js");
        assert_ne!(file, virtual_id);
    }
}
