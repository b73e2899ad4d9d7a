//! JSON access policies: wire format, statement index, and loading.
//!
//! A policy document is an ordered list of allow/deny statements over
//! wildcard resource patterns, plus free-form params. Documents are attached
//! to principals and may include another document as a lower-priority parent
//! (the inclusion graph must stay acyclic; the loader cuts cycles and keeps
//! serving).
//!
//! Parsing failures are never fatal: a malformed document is skipped as if
//! it were empty and the condition is reported through the diagnostics
//! channel.

pub mod document;
pub mod error;
pub mod index;
pub mod loader;

pub use document::{Effect, Param, PolicyDocument, Statement};
pub use error::{PolicyError, Result};
pub use index::{IndexedStatement, StatementIndex};
pub use loader::{IndexOutcome, MemoryPolicies, PolicyLoader, PolicyProvider};
