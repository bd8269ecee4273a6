//! # rove-graph
//!
//! Scope analysis, cross-module binding and tree-shaking for ES module graphs.
//!
//! This crate is the analysis core of the rove bundler. It never loads or
//! resolves modules: they are handed to it as source text and it answers which
//! top-level statements the entry module's exports can reach. The only
//! filesystem access is [`ModuleId::new`] canonicalising file paths.
//!
//! ## Architecture
//!
//! ```text
//!  source ──► syntax::parse ──► Module::parse ──► ModuleGraph::new
//!             (oxc, lowered)    (scopes, refs,     (fetch order)
//!                                import/export          │
//!                                tables)                ▼
//!                                              ModuleGraph::link
//!                                              (attach imports,
//!                                               bind references)
//!                                                       │
//!                                                       ▼
//!                                              ModuleGraph::shake
//!                                              (worklist marking from
//!                                               entry exports)
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use rove_graph::{Module, ModuleGraph, ModuleId};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let id = ModuleId::new_virtual("main.js");
//! let module = Module::parse(
//!     id.clone(),
//!     "function h() {}\nfunction unused() {}\nexport function main() { h(); }",
//! )?;
//!
//! let mut graph = ModuleGraph::new(vec![module], &id)?;
//! graph.link()?;
//! let exports = graph.shake()?;
//!
//! let included: Vec<_> = graph.included_statements(graph.entry()).collect();
//! assert_eq!(included.len(), 2);
//! assert!(exports.contains_key("main"));
//! # Ok(())
//! # }
//! ```
//!
//! Modules whose imports point at other modules need those specifiers resolved
//! before linking ([`Module::set_resolved`]); the `rove` crate does this while
//! fetching.

pub mod error;
pub mod graph;
pub mod module;
pub mod module_id;
pub mod scope;
pub mod statement;
pub mod syntax;

#[cfg(test)]
mod tests;

pub use error::{GraphError, Result};
pub use graph::{DeclarationKey, MissingExport, ModuleGraph, ModuleIndex, ReferenceKey};
pub use module::{Export, Import, Module, StarExport};
pub use module_id::{ModuleId, ModuleIdError};
pub use scope::{Declaration, DeclarationId, DeclarationKind, ScopeId, ScopeTree};
pub use statement::{Reference, Statement, StatementIndex};
pub use syntax::ImportedName;
