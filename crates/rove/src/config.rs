//! Build options and their configuration sources.
//!
//! Options are layered with figment, later sources winning:
//!
//! 1. [`BuildOptions::default`]
//! 2. `rove.toml` in the working directory, or an explicit file
//! 3. `ROVE_*` environment variables (`ROVE_ENTRY`, `ROVE_TIMEOUT_MS`, ...)

use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format as _, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::logging::LogLevel;

/// Default configuration file name.
pub const CONFIG_FILE: &str = "rove.toml";

/// Options for a single build.
///
/// ```rust
/// use rove::BuildOptions;
///
/// let options = BuildOptions::new("src/main.js")
///     .external(["react"])
///     .timeout_ms(5_000);
/// assert!(options.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildOptions {
    /// Entry specifier, resolved against `cwd`.
    pub entry: String,
    pub cwd: PathBuf,
    /// Specifiers (and their subpaths) that are never resolved or fetched.
    pub external: Vec<String>,
    /// Upper bound for the fetch phase.
    pub timeout_ms: Option<u64>,
    /// Caps the build's own warnings and summary. With the `logging` feature,
    /// also the level [`BuildOptions::init_logging`] installs.
    pub log_level: LogLevel,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            entry: String::new(),
            cwd: PathBuf::from("."),
            external: Vec::new(),
            timeout_ms: None,
            log_level: LogLevel::default(),
        }
    }
}

impl BuildOptions {
    pub fn new(entry: impl Into<String>) -> Self {
        Self {
            entry: entry.into(),
            ..Self::default()
        }
    }

    pub fn cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = cwd.into();
        self
    }

    pub fn external<I, S>(mut self, external: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.external.extend(external.into_iter().map(Into::into));
        self
    }

    pub fn timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    pub fn log_level(mut self, log_level: LogLevel) -> Self {
        self.log_level = log_level;
        self
    }

    /// Install the bundled stderr subscriber at `log_level`.
    #[cfg(feature = "logging")]
    pub fn init_logging(&self) {
        crate::logging::init_logging(self.log_level);
    }

    /// The fetch time limit, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// Load options from defaults, the config file and the environment.
    ///
    /// An explicit `config_path` must exist; the default `rove.toml` is
    /// optional.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let options: Self = Self::figment(config_path)?.extract()?;
        options.validate()?;
        Ok(options)
    }

    /// The layered configuration sources, before extraction.
    pub fn figment(config_path: Option<&Path>) -> Result<Figment> {
        let mut figment = Figment::new().merge(Serialized::defaults(Self::default()));

        let config_file = match config_path {
            Some(path) if !path.is_file() => {
                return Err(Error::invalid_config(
                    "config",
                    format!("'{}' does not exist", path.display()),
                ));
            }
            Some(path) => Some(path.to_path_buf()),
            None => {
                let default_path = Path::new(CONFIG_FILE);
                default_path.is_file().then(|| default_path.to_path_buf())
            }
        };

        if let Some(path) = config_file {
            figment = figment.merge(Toml::file(path));
        }

        // Field names contain underscores, so the env keys are not split.
        Ok(figment.merge(Env::prefixed("ROVE_")))
    }

    /// Reject options no build could succeed with.
    pub fn validate(&self) -> Result<()> {
        if self.entry.trim().is_empty() {
            return Err(Error::invalid_config("entry", "an entry module is required"));
        }
        if self.timeout_ms == Some(0) {
            return Err(Error::invalid_config("timeout_ms", "must be greater than zero"));
        }
        if let Some(name) = self.external.iter().find(|name| name.is_empty()) {
            return Err(Error::invalid_config(
                "external",
                format!("empty specifier '{name}'"),
            ));
        }
        Ok(())
    }
}
