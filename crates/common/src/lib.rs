//! Shared types for the ashfall engine loader.

mod types;

pub use types::{DepKind, DepSpec, UnitId};

pub fn crate_info() -> &'static str {
    "ashfall-common v0.1.0"
}
