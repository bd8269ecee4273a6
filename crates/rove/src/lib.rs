#![cfg_attr(docsrs, feature(doc_cfg))]

//! # rove
//!
//! Rove bundler - concurrent module fetching and tree-shaking on top of
//! `rove-graph`.
//!
//! This crate drives a build: it resolves the entry through a [`Runtime`],
//! fetches and analyses every reachable module exactly once, links imports to
//! the declarations that define them and marks the statements the entry's
//! exports can reach.
//!
//! ## Quick Start
//!
//! ### Shake a program on disk
//!
//! ```no_run
//! use rove::BuildOptions;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let output = BuildOptions::new("src/index.js")
//!     .external(["react", "react-dom"])
//!     .build()
//!     .await?;
//!
//! for diagnostic in &output.diagnostics {
//!     eprintln!("warning: {diagnostic}");
//! }
//! let kept = output.included_statements().count();
//! println!("{kept} statements survive");
//! # Ok(()) }
//! ```
//!
//! ### Load options from `rove.toml` and the environment
//!
//! ```no_run
//! use rove::{BuildOptions, Bundle};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let options = BuildOptions::load(None)?;
//! #[cfg(feature = "logging")]
//! options.init_logging();
//! let output = Bundle::new(options).build().await?;
//! # Ok(()) }
//! ```

// Re-export everything from the analysis crate
pub use rove_graph::*;

pub mod bundle;
pub mod config;
pub mod diagnostic;
pub mod error;
pub mod fetch;
pub mod logging;
pub mod runtime;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use bundle::{BuildOutput, Bundle};
pub use config::BuildOptions;
pub use diagnostic::Diagnostic;
pub use error::{Error, Result};
pub use fetch::Fetcher;
pub use logging::LogLevel;
pub use runtime::{Runtime, RuntimeError, RuntimeResult};

#[cfg(not(target_family = "wasm"))]
pub use runtime::native::NativeRuntime;
