//! Batch computation: which pending entries are safe to dispatch this round.

use crate::collect::Pending;
use crate::registry::{LoadState, NamespaceEntry, Registry};
use ashfall_common::DepKind;
use std::collections::VecDeque;

/// Work items drained by the façade's driver loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Work {
    ComputeBatch,
}

/// Mutable scheduling state: the pending set, the provide barrier and the
/// trampoline queue.
pub struct Scheduler {
    /// Requested but not yet batched.
    pub pending: Vec<Pending>,
    /// Outstanding provides for the current batch. Zero gates the next round.
    pub provide_count: usize,
    /// True from the first import until the pending set drains or a round
    /// stalls.
    pub active: bool,
    /// True while the driver loop is draining. Re-entrant calls only enqueue.
    pub driving: bool,
    pub queue: VecDeque<Work>,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            pending: Vec::new(),
            provide_count: 0,
            active: false,
            driving: false,
            queue: VecDeque::new(),
        }
    }

    /// Queue a batch computation unless one is already queued.
    pub fn request_batch(&mut self) {
        if !self.queue.contains(&Work::ComputeBatch) {
            self.queue.push_back(Work::ComputeBatch);
        }
    }

    /// Drop all pending work. In-flight units are unaffected; their provides
    /// still decrement the barrier but trigger nothing while inactive.
    pub fn reset(&mut self) {
        self.pending.clear();
        self.queue.clear();
        self.active = false;
    }
}

/// One readiness scan over the pending set.
///
/// Moves every schedulable entry out of `pending` and returns them as the
/// batch. Namespaces already Loading are dropped from `pending` without
/// re-dispatch. With `diagnose` set, each blocking pair is logged; the façade
/// runs that pass once per stalled round.
pub fn compute_batch<V>(
    registry: &Registry<V>,
    pending: &mut Vec<Pending>,
    diagnose: bool,
) -> Vec<Pending> {
    let mut batch = Vec::new();
    let mut rest = Vec::with_capacity(pending.len());

    for entry in pending.drain(..) {
        match entry {
            // External resources are always immediately eligible.
            Pending::External(_) => batch.push(entry),
            Pending::Namespace(ref name) => {
                let Some(ns) = registry.lookup(name) else {
                    tracing::warn!(
                        name = name.as_str(),
                        "pending namespace lost its descriptor, dropping"
                    );
                    continue;
                };
                if is_ready(registry, ns, diagnose) {
                    if ns.state == LoadState::Unloaded {
                        batch.push(entry);
                    }
                } else {
                    rest.push(entry);
                }
            }
        }
    }

    *pending = rest;
    batch
}

/// Readiness test for one candidate over each of its dependencies.
///
/// Deferred and external dependencies never block. A missing descriptor
/// blocks this round with a warning. A dependency that is not Loaded blocks
/// only when it lives in a different unit than the candidate; a same-unit
/// dependency becomes available synchronously once the unit executes.
fn is_ready<V>(registry: &Registry<V>, ns: &NamespaceEntry<V>, diagnose: bool) -> bool {
    for dep in &ns.deps {
        if dep.kind != DepKind::Normal {
            continue;
        }
        let Some(dep_ns) = registry.lookup(&dep.name) else {
            tracing::warn!(
                unit = %ns.unit,
                dep = %dep.name,
                "depends on a namespace that is not available"
            );
            return false;
        };
        if dep_ns.state == LoadState::Loaded {
            continue;
        }
        if dep_ns.unit == ns.unit {
            continue;
        }
        if diagnose {
            tracing::warn!(
                blocked = %ns.unit,
                by = %dep_ns.unit,
                "unresolved dependency, no unit is schedulable"
            );
        }
        return false;
    }
    true
}
