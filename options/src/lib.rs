//! Option value model shared across the access engine.
//!
//! An *option map* is the unit of per-object configuration: string keys to
//! boolean, scalar, or structured sub-map values. This crate owns the value
//! representation, the one-shot migration of legacy value shapes, nested
//! option-path access, and the resolved-entry model that records where each
//! aggregated value came from.

pub mod error;
pub mod path;
pub mod resolved;
pub mod value;

pub use error::{OptionsError, Result};
pub use path::{delete_path, get_path, set_path};
pub use resolved::{EffectSource, ResolvedEntry, ResolvedMap};
pub use value::{from_json, normalize, normalize_map, OptionMap, OptionValue};
