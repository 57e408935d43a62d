//! Namespace/dependency resolution and batch unit loading for the ashfall
//! engine.
//!
//! Compilation units register the namespaces they provide and the namespaces
//! they require. The resolver expands an import request into the full set of
//! missing namespaces, repeatedly computes a batch whose dependencies are
//! satisfied, and hands each batch to an external [`UnitLoader`]. As a
//! dispatched unit executes it calls [`Resolver::provide`] once per namespace
//! it owns, which releases the barrier gating the next batch.
//!
//! # Invariants
//! - Namespace state is monotonic: Unloaded -> Loading -> Loaded.
//! - A dependency in the same unit as its dependent never blocks scheduling
//!   (it becomes available synchronously once the unit executes).
//! - The next batch is never computed while a dispatched unit has
//!   outstanding provides.
//! - An unresolvable round logs the blocking pairs and idles; it never
//!   panics and never corrupts the pending set.

mod collect;
pub mod loader;
pub mod manifest;
pub mod registry;
mod schedule;

pub use loader::{ProvideHook, Resolver, UnitLoader};
pub use manifest::{FsManifestSource, ManifestEntry, ManifestError, ManifestSource};
pub use registry::{LoadState, NamespaceEntry, Registry, UnitEntry, Waiter};

pub fn crate_info() -> &'static str {
    "ashfall-resolve v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("resolve"));
    }
}
