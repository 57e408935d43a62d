//! Expansion of an import request into the full pending set.

use crate::registry::{LoadState, Registry};
use ashfall_common::DepKind;

/// An entry awaiting scheduling: a registered namespace, or an external
/// resource carried verbatim (it has no descriptor and no sub-dependencies).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pending {
    Namespace(String),
    External(String),
}

/// Recursively add `name` and every not-yet-loaded dependency to `pending`.
///
/// Names already pending, or already past Unloaded, are skipped; that also
/// terminates the walk on dependency cycles. Unknown names are logged and
/// dropped, leaving their dependents to surface later as a stalled round.
/// Deferred specifiers are walked like normal ones (the tag only relaxes
/// scheduling order, not reachability); external specifiers are pushed
/// without recursion.
pub fn collect<V>(registry: &Registry<V>, pending: &mut Vec<Pending>, name: &str) {
    if pending
        .iter()
        .any(|p| matches!(p, Pending::Namespace(n) if n == name))
    {
        return;
    }
    let Some(entry) = registry.lookup(name) else {
        tracing::error!(name, "required but not found");
        return;
    };
    if entry.state != LoadState::Unloaded {
        return;
    }

    pending.push(Pending::Namespace(name.to_string()));
    for dep in &entry.deps {
        match dep.kind {
            DepKind::Normal | DepKind::Deferred => collect(registry, pending, &dep.name),
            DepKind::External => {
                let ext = Pending::External(dep.name.clone());
                if !pending.contains(&ext) {
                    pending.push(ext);
                }
            }
        }
    }
}
