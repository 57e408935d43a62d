//! The loading façade: one resolver value owning every registry and counter.
//!
//! All resolver state is touched from one logical thread of control. The
//! only synchronization primitive is the provide barrier: a dispatched
//! unit's provides must all arrive before the next batch is computed,
//! otherwise a namespace could be scheduled while its same-unit
//! co-dependency has not executed yet.
//!
//! Re-entrancy is handled with a work queue drained by a single driver loop:
//! `provide` may legally be invoked from inside a dispatch (a collaborator
//! that executes units synchronously), in which case the queued batch
//! computation is picked up by the already-running loop instead of growing
//! the call stack or interleaving partial batches.

use crate::collect::{self, Pending};
use crate::manifest::{self, ManifestError, ManifestSource};
use crate::registry::Registry;
use crate::schedule::{self, Scheduler, Work};
use ashfall_common::{DepSpec, UnitId};

/// External mechanism that fetches and executes a unit's code.
///
/// `load_unit` must eventually lead to one [`Resolver::provide`] call per
/// namespace the unit owns, in arbitrary order and timing. Implementations
/// may call `provide` synchronously from inside `load_unit`; the resolver
/// tolerates the re-entry.
pub trait UnitLoader<V> {
    /// Begin loading a compilation unit.
    fn load_unit(&mut self, resolver: &mut Resolver<V>, unit: &UnitId);

    /// Begin fetching an external resource. Its completion is never tracked
    /// as namespace state.
    fn load_external(&mut self, resolver: &mut Resolver<V>, url: &str);
}

/// Observer invoked with each namespace name right after its waiters fire.
pub type ProvideHook = Box<dyn FnMut(&str)>;

/// The namespace/dependency resolver and batch loader.
///
/// Construct one per process (or per isolated loading domain) and pass it to
/// whatever needs loading services. `V` is the value type a unit associates
/// with each namespace it provides.
pub struct Resolver<V> {
    registry: Registry<V>,
    sched: Scheduler,
    on_provide: Option<ProvideHook>,
}

impl<V> Default for Resolver<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> Resolver<V> {
    pub fn new() -> Self {
        Self {
            registry: Registry::new(),
            sched: Scheduler::new(),
            on_provide: None,
        }
    }

    /// Register a unit, the namespaces it provides and the raw dependency
    /// specifiers it requires (`>` defers, `@` marks an external resource).
    pub fn register_unit(
        &mut self,
        unit: &str,
        provides: &[&str],
        requires: &[&str],
        approx_size: u64,
    ) {
        let provides = provides.iter().map(|s| s.to_string()).collect();
        let requires = requires.iter().map(|r| DepSpec::parse(r)).collect();
        self.registry
            .register_unit(UnitId::from(unit), provides, requires, approx_size);
    }

    /// Read-only access to the registries, for inspection tooling.
    pub fn registry(&self) -> &Registry<V> {
        &self.registry
    }

    /// Whether some `provide` call has completed this namespace.
    pub fn is_imported(&self, name: &str) -> bool {
        self.registry.is_loaded(name)
    }

    /// The value of a namespace if it is Loaded. Declares a soft dependency
    /// edge: this never schedules any loading.
    pub fn require(&self, name: &str) -> Option<&V> {
        self.registry.value(name)
    }

    /// Like [`require`](Self::require), with a callback: fires immediately
    /// if the namespace is Loaded, otherwise once it becomes so.
    pub fn require_with(&mut self, name: &str, on_ready: impl FnOnce(&V) + 'static) {
        if let Some(value) = self.registry.value(name) {
            on_ready(value);
            return;
        }
        self.registry.push_waiter(name, Box::new(on_ready));
    }

    /// Identical to [`require`](Self::require); documents that the edge is
    /// part of a cyclic or deferred relationship.
    pub fn suggest(&self, name: &str) -> Option<&V> {
        self.require(name)
    }

    /// Identical to [`require_with`](Self::require_with); documents that the
    /// edge is part of a cyclic or deferred relationship.
    pub fn suggest_with(&mut self, name: &str, on_ready: impl FnOnce(&V) + 'static) {
        self.require_with(name, on_ready);
    }

    /// Import a namespace, loading its unit and every missing dependency.
    ///
    /// Returns the value only if the namespace is already Loaded; otherwise
    /// scheduling starts (or the request joins the current run) and `None`
    /// is returned.
    pub fn import(&mut self, loader: &mut dyn UnitLoader<V>, name: &str) -> Option<&V> {
        if self.registry.is_loaded(name) {
            return self.registry.value(name);
        }
        self.begin_import(loader, name);
        None
    }

    /// Like [`import`](Self::import), with a callback that fires once the
    /// namespace is available (synchronously if it already is).
    pub fn import_with(
        &mut self,
        loader: &mut dyn UnitLoader<V>,
        name: &str,
        on_ready: impl FnOnce(&V) + 'static,
    ) {
        if self.registry.is_loaded(name) {
            if let Some(value) = self.registry.value(name) {
                on_ready(value);
            }
            return;
        }
        // Register the waiter before scheduling: a synchronous collaborator
        // can complete the whole run inside begin_import.
        self.registry.push_waiter(name, Box::new(on_ready));
        self.begin_import(loader, name);
    }

    /// Import every registered namespace.
    pub fn import_all(&mut self, loader: &mut dyn UnitLoader<V>) {
        tracing::info!("importing every registered namespace");
        let names: Vec<String> = self.registry.names().map(str::to_string).collect();
        for name in names {
            self.import(loader, &name);
        }
    }

    /// Import every registered namespace whose name matches the predicate.
    pub fn import_match(&mut self, loader: &mut dyn UnitLoader<V>, pred: impl Fn(&str) -> bool) {
        let names: Vec<String> = self
            .registry
            .names()
            .filter(|n| pred(n))
            .map(str::to_string)
            .collect();
        for name in names {
            self.import(loader, &name);
        }
    }

    /// Fetch a dependency manifest from a collaborator and register every
    /// row. Relative unit ids resolve against the manifest's own directory.
    /// A fetch or parse failure registers nothing.
    ///
    /// Returns the number of units registered.
    pub fn import_list(
        &mut self,
        source: &mut dyn ManifestSource,
        path: &str,
    ) -> Result<usize, ManifestError> {
        let text = source.fetch(path)?;
        let entries = manifest::parse(&text)?;
        let count = entries.len();
        for entry in entries {
            let unit = manifest::resolve_unit_id(path, &entry.unit);
            let requires = entry.requires.iter().map(|r| DepSpec::parse(r)).collect();
            self.registry.register_unit(
                UnitId::from(unit),
                entry.provides,
                requires,
                entry.approx_size,
            );
        }
        tracing::debug!(path, count, "registered manifest");
        Ok(count)
    }

    /// Mark a namespace as provided with its value.
    ///
    /// Called by executing units, once per namespace they own. Fires and
    /// clears the namespace's waiters, decrements the provide barrier and,
    /// at zero while scheduling is active, queues the next batch.
    ///
    /// A provide for a never-registered namespace is accepted as a dynamic
    /// registration. A duplicate provide overwrites the stored value and
    /// leaves the barrier untouched.
    pub fn provide(&mut self, loader: &mut dyn UnitLoader<V>, name: &str, value: V) {
        if self.registry.lookup(name).is_none() {
            tracing::debug!(name, "provide for unregistered namespace, registering dynamically");
            self.registry.register_dynamic(name);
        }
        if self.registry.is_loaded(name) {
            tracing::warn!(name, "duplicate provide, overwriting value");
            self.registry.set_loaded(name, value);
            return;
        }

        self.registry.set_loaded(name, value);
        let waiters = self.registry.take_waiters(name);
        if let Some(value) = self.registry.value(name) {
            for waiter in waiters {
                waiter(value);
            }
        }
        if let Some(hook) = self.on_provide.as_mut() {
            hook(name);
        }

        self.sched.provide_count = self.sched.provide_count.saturating_sub(1);
        if self.sched.provide_count == 0 && self.sched.active {
            self.sched.request_batch();
        }
        self.pump(loader);
    }

    /// Stop all further scheduling. Already-dispatched units finish
    /// harmlessly: their provides still store values and fire waiters.
    pub fn abort(&mut self) {
        tracing::info!(pending = self.sched.pending.len(), "aborting pending imports");
        self.sched.reset();
    }

    /// Install an observer called with each namespace name as it is
    /// provided.
    pub fn set_on_provide(&mut self, hook: impl FnMut(&str) + 'static) {
        self.on_provide = Some(Box::new(hook));
    }

    /// Number of entries still awaiting scheduling.
    pub fn pending_count(&self) -> usize {
        self.sched.pending.len()
    }

    /// Total approximate size of the distinct units still pending, for
    /// progress display.
    pub fn pending_bytes(&self) -> u64 {
        let mut seen: Vec<&UnitId> = Vec::new();
        let mut sum = 0;
        for entry in &self.sched.pending {
            let Pending::Namespace(name) = entry else {
                continue;
            };
            let Some(ns) = self.registry.lookup(name) else {
                continue;
            };
            if seen.contains(&&ns.unit) {
                continue;
            }
            sum += self.registry.unit(&ns.unit).map_or(0, |u| u.approx_size);
            seen.push(&ns.unit);
        }
        sum
    }

    /// Expand the request into the pending set and start the scheduler if it
    /// is idle. While a run is active the new entries simply join the next
    /// round, which the barrier gates as usual.
    fn begin_import(&mut self, loader: &mut dyn UnitLoader<V>, name: &str) {
        collect::collect(&self.registry, &mut self.sched.pending, name);
        if !self.sched.active {
            self.sched.active = true;
            self.sched.request_batch();
            self.pump(loader);
        }
    }

    /// The driver loop. Exactly one instance runs at a time; re-entrant
    /// calls return immediately and leave their work queued.
    fn pump(&mut self, loader: &mut dyn UnitLoader<V>) {
        if self.sched.driving {
            return;
        }
        self.sched.driving = true;
        while let Some(work) = self.sched.queue.pop_front() {
            match work {
                Work::ComputeBatch => self.run_batch(loader),
            }
        }
        self.sched.driving = false;
    }

    /// Compute one batch and dispatch it. An empty batch over a non-empty
    /// pending set with the barrier settled is an unresolved cycle: log one
    /// diagnostic pass naming the blocking pairs, then idle. Deliberately
    /// fail-loud; no exception, no auto-resolution. With provides still
    /// outstanding the round is merely blocked on an in-flight unit, so the
    /// run stays active and the barrier's next zero-crossing recomputes it.
    fn run_batch(&mut self, loader: &mut dyn UnitLoader<V>) {
        if self.sched.pending.is_empty() {
            self.sched.active = false;
            return;
        }

        let batch = schedule::compute_batch(&self.registry, &mut self.sched.pending, false);
        if batch.is_empty() {
            if self.sched.pending.is_empty() {
                // Everything left was already Loading; the barrier will
                // settle the run.
                self.sched.active = false;
                return;
            }
            if self.sched.provide_count > 0 {
                return;
            }
            tracing::warn!(
                pending = self.sched.pending.len(),
                "dependency problem, no schedulable namespaces"
            );
            schedule::compute_batch(&self.registry, &mut self.sched.pending, true);
            self.sched.active = false;
            return;
        }

        tracing::info!(batch = ?batch_names(&batch), "importing batch");

        for entry in batch {
            match entry {
                Pending::External(url) => self.dispatch_external(loader, &url),
                Pending::Namespace(name) => {
                    let Some(unit) = self.registry.lookup(&name).map(|e| e.unit.clone()) else {
                        continue;
                    };
                    self.dispatch_unit(loader, &unit);
                }
            }
        }

        // A batch of only externals (or only already-dispatched units) adds
        // nothing to the barrier; keep the rounds coming.
        if self.sched.provide_count == 0 && self.sched.active {
            self.sched.request_batch();
        }
    }

    fn dispatch_unit(&mut self, loader: &mut dyn UnitLoader<V>, unit: &UnitId) {
        let Some(provides) = self.registry.begin_dispatch(unit) else {
            return;
        };
        self.sched.provide_count += provides.len();
        for name in &provides {
            self.registry.set_loading(name);
        }
        tracing::debug!(%unit, provides = provides.len(), "dispatching unit");
        loader.load_unit(self, unit);
    }

    fn dispatch_external(&mut self, loader: &mut dyn UnitLoader<V>, url: &str) {
        if !self.registry.begin_external(url) {
            return;
        }
        tracing::debug!(url, "dispatching external resource");
        loader.load_external(self, url);
    }
}

fn batch_names(batch: &[Pending]) -> Vec<&str> {
    batch
        .iter()
        .map(|p| match p {
            Pending::Namespace(n) => n.as_str(),
            Pending::External(n) => n.as_str(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::collections::HashMap;
    use std::rc::Rc;

    /// Collaborator double that executes units synchronously: every
    /// namespace a unit owns is provided from inside `load_unit`, the worst
    /// case for re-entrancy.
    #[derive(Default)]
    struct SyncLoader {
        values: HashMap<String, i32>,
        dispatched: Vec<String>,
        externals: Vec<String>,
    }

    impl SyncLoader {
        fn new(values: &[(&str, i32)]) -> Self {
            Self {
                values: values
                    .iter()
                    .map(|(n, v)| (n.to_string(), *v))
                    .collect(),
                dispatched: Vec::new(),
                externals: Vec::new(),
            }
        }
    }

    impl UnitLoader<i32> for SyncLoader {
        fn load_unit(&mut self, resolver: &mut Resolver<i32>, unit: &UnitId) {
            self.dispatched.push(unit.to_string());
            let provides = resolver
                .registry()
                .unit(unit)
                .map(|u| u.provides.clone())
                .unwrap_or_default();
            for name in provides {
                let value = self.values.get(&name).copied().unwrap_or(0);
                resolver.provide(self, &name, value);
            }
        }

        fn load_external(&mut self, _resolver: &mut Resolver<i32>, url: &str) {
            self.externals.push(url.to_string());
        }
    }

    /// Collaborator double that only records dispatches; the test drives
    /// `provide` by hand, modelling arbitrary callback timing.
    #[derive(Default)]
    struct ManualLoader {
        dispatched: Vec<String>,
        externals: Vec<String>,
    }

    impl UnitLoader<i32> for ManualLoader {
        fn load_unit(&mut self, _resolver: &mut Resolver<i32>, unit: &UnitId) {
            self.dispatched.push(unit.to_string());
        }

        fn load_external(&mut self, _resolver: &mut Resolver<i32>, url: &str) {
            self.externals.push(url.to_string());
        }
    }

    fn two_unit_chain() -> Resolver<i32> {
        let mut resolver = Resolver::new();
        resolver.register_unit("u1.js", &["x"], &[], 0);
        resolver.register_unit("u2.js", &["y"], &["x"], 0);
        resolver
    }

    #[test]
    fn two_unit_chain_loads_in_dependency_order() {
        let mut resolver = two_unit_chain();
        let mut loader = SyncLoader::new(&[("x", 1), ("y", 2)]);

        assert!(resolver.import(&mut loader, "y").is_none());

        assert_eq!(loader.dispatched, vec!["u1.js", "u2.js"]);
        assert_eq!(resolver.require("y"), Some(&2));
        assert_eq!(resolver.require("x"), Some(&1));
        assert_eq!(resolver.pending_count(), 0);
    }

    #[test]
    fn is_imported_flips_once_and_stays() {
        let mut resolver = two_unit_chain();
        let mut loader = ManualLoader::default();

        assert!(!resolver.is_imported("x"));
        resolver.import(&mut loader, "x");
        assert!(!resolver.is_imported("x"));

        resolver.provide(&mut loader, "x", 1);
        assert!(resolver.is_imported("x"));
        // No later operation may reverse the state.
        resolver.import(&mut loader, "x");
        resolver.abort();
        assert!(resolver.is_imported("x"));
    }

    #[test]
    fn waiter_fires_exactly_once_despite_repeat_imports() {
        let mut resolver = two_unit_chain();
        let mut loader = ManualLoader::default();
        let fired = Rc::new(Cell::new(0u32));

        let seen = Rc::clone(&fired);
        resolver.import_with(&mut loader, "y", move |v| {
            assert_eq!(*v, 2);
            seen.set(seen.get() + 1);
        });
        resolver.import(&mut loader, "y");
        resolver.import(&mut loader, "y");

        resolver.provide(&mut loader, "x", 1);
        resolver.provide(&mut loader, "y", 2);
        assert_eq!(fired.get(), 1);
    }

    #[test]
    fn cross_unit_dependency_orders_dispatch() {
        let mut resolver = two_unit_chain();
        let mut loader = ManualLoader::default();

        resolver.import(&mut loader, "y");
        assert_eq!(loader.dispatched, vec!["u1.js"]);

        resolver.provide(&mut loader, "x", 1);
        assert_eq!(loader.dispatched, vec!["u1.js", "u2.js"]);
    }

    #[test]
    fn same_unit_dependency_does_not_delay_dispatch() {
        let mut resolver = Resolver::new();
        // "a" forward-references "b"; both live in the same unit.
        resolver.register_unit("ab.js", &["a", "b"], &["b"], 0);
        let mut loader = ManualLoader::default();

        resolver.import(&mut loader, "a");
        assert_eq!(loader.dispatched, vec!["ab.js"]);
    }

    #[test]
    fn untagged_cycle_idles_without_panicking() {
        let mut resolver = Resolver::new();
        resolver.register_unit("a.js", &["a"], &["b"], 0);
        resolver.register_unit("b.js", &["b"], &["a"], 0);
        let mut loader = SyncLoader::new(&[("a", 1), ("b", 2)]);

        resolver.import(&mut loader, "a");
        assert!(loader.dispatched.is_empty());
        assert!(!resolver.is_imported("a"));
        assert_eq!(resolver.pending_count(), 2);

        // The resolver stays usable for unrelated work.
        resolver.register_unit("c.js", &["c"], &[], 0);
        resolver.import(&mut loader, "c");
        assert!(resolver.is_imported("c"));
    }

    #[test]
    fn deferred_edge_breaks_cycle() {
        let mut resolver = Resolver::new();
        resolver.register_unit("a.js", &["a"], &["b"], 0);
        resolver.register_unit("b.js", &["b"], &[">a"], 0);
        let mut loader = SyncLoader::new(&[("a", 1), ("b", 2)]);

        resolver.import(&mut loader, "a");

        assert_eq!(loader.dispatched, vec!["b.js", "a.js"]);
        assert!(resolver.is_imported("a"));
        assert!(resolver.is_imported("b"));
    }

    #[test]
    fn external_resource_dispatches_unconditionally() {
        let mut resolver = Resolver::new();
        resolver.register_unit("u3.js", &["z"], &["@http://host/lib.js"], 0);
        let mut loader = SyncLoader::new(&[("z", 3)]);

        resolver.import(&mut loader, "z");

        assert_eq!(loader.externals, vec!["http://host/lib.js"]);
        assert_eq!(loader.dispatched, vec!["u3.js"]);
        assert!(resolver.is_imported("z"));
        // The external is never tracked as a namespace.
        assert!(resolver.registry().lookup("http://host/lib.js").is_none());
        assert!(!resolver.is_imported("http://host/lib.js"));
    }

    #[test]
    fn external_only_batch_does_not_stall_the_run() {
        let mut resolver = Resolver::new();
        resolver.register_unit("w.js", &["w"], &[], 0);
        resolver.register_unit("z.js", &["z"], &["@http://host/lib.js", "w"], 0);
        let mut loader = ManualLoader::default();

        resolver.import(&mut loader, "z");
        // Round one: the external plus w's unit.
        assert_eq!(loader.externals, vec!["http://host/lib.js"]);
        assert_eq!(loader.dispatched, vec!["w.js"]);

        resolver.provide(&mut loader, "w", 1);
        assert_eq!(loader.dispatched, vec!["w.js", "z.js"]);
    }

    #[test]
    fn import_during_active_run_joins_next_round() {
        let mut resolver = Resolver::new();
        resolver.register_unit("u1.js", &["x"], &[], 0);
        resolver.register_unit("u2.js", &["y"], &["x"], 0);
        resolver.register_unit("u3.js", &["q"], &[], 0);
        let mut loader = ManualLoader::default();

        resolver.import(&mut loader, "y");
        assert_eq!(loader.dispatched, vec!["u1.js"]);

        // Arrives mid-run: must wait for the barrier, not dispatch eagerly.
        resolver.import(&mut loader, "q");
        assert_eq!(loader.dispatched, vec!["u1.js"]);

        resolver.provide(&mut loader, "x", 1);
        assert_eq!(loader.dispatched, vec!["u1.js", "u2.js", "u3.js"]);
    }

    #[test]
    fn abort_stops_scheduling_but_tolerates_late_provides() {
        let mut resolver = two_unit_chain();
        let mut loader = ManualLoader::default();

        resolver.import(&mut loader, "y");
        assert_eq!(loader.dispatched, vec!["u1.js"]);

        resolver.abort();
        assert_eq!(resolver.pending_count(), 0);

        // The in-flight unit finishes; its value lands, nothing dispatches.
        resolver.provide(&mut loader, "x", 1);
        assert_eq!(loader.dispatched, vec!["u1.js"]);
        assert_eq!(resolver.require("x"), Some(&1));

        // A fresh import restarts the scheduler.
        resolver.import(&mut loader, "y");
        assert_eq!(loader.dispatched, vec!["u1.js", "u2.js"]);
    }

    #[test]
    fn reimport_during_inflight_unit_resumes_at_barrier() {
        let mut resolver = two_unit_chain();
        let mut loader = ManualLoader::default();

        resolver.import(&mut loader, "y");
        assert_eq!(loader.dispatched, vec!["u1.js"]);

        resolver.abort();
        // u1 is still in flight, so the fresh request finds "x" Loading and
        // nothing schedulable. That is not a cycle: the run must stay live
        // and resume when the outstanding provide lands.
        resolver.import(&mut loader, "y");
        assert_eq!(loader.dispatched, vec!["u1.js"]);

        resolver.provide(&mut loader, "x", 1);
        assert_eq!(loader.dispatched, vec!["u1.js", "u2.js"]);

        resolver.provide(&mut loader, "y", 2);
        assert!(resolver.is_imported("y"));
        assert_eq!(resolver.pending_count(), 0);
    }

    #[test]
    fn import_of_loaded_namespace_fires_synchronously() {
        let mut resolver = two_unit_chain();
        let mut loader = ManualLoader::default();
        resolver.provide(&mut loader, "x", 9);

        let fired = Rc::new(Cell::new(0u32));
        let seen = Rc::clone(&fired);
        resolver.import_with(&mut loader, "x", move |v| {
            assert_eq!(*v, 9);
            seen.set(seen.get() + 1);
        });
        assert_eq!(fired.get(), 1);
        assert_eq!(resolver.import(&mut loader, "x"), Some(&9));
        assert!(loader.dispatched.is_empty());
    }

    #[test]
    fn require_never_schedules() {
        let mut resolver = two_unit_chain();
        let mut loader = ManualLoader::default();

        assert!(resolver.require("y").is_none());
        resolver.require_with("y", |_| {});
        resolver.suggest_with("y", |_| {});
        assert!(loader.dispatched.is_empty());
        assert_eq!(resolver.pending_count(), 0);

        // The waiters still fire when something else triggers the load.
        let fired = Rc::new(Cell::new(0u32));
        let seen = Rc::clone(&fired);
        resolver.require_with("y", move |v| {
            assert_eq!(*v, 2);
            seen.set(seen.get() + 1);
        });
        resolver.import(&mut loader, "y");
        resolver.provide(&mut loader, "x", 1);
        resolver.provide(&mut loader, "y", 2);
        assert_eq!(fired.get(), 1);
    }

    #[test]
    fn unknown_import_is_dropped() {
        let mut resolver = two_unit_chain();
        let mut loader = ManualLoader::default();

        assert!(resolver.import(&mut loader, "nope").is_none());
        assert!(loader.dispatched.is_empty());
        assert_eq!(resolver.pending_count(), 0);
    }

    #[test]
    fn duplicate_provide_overwrites_value_only() {
        let mut resolver = two_unit_chain();
        let mut loader = ManualLoader::default();

        resolver.import(&mut loader, "y");
        resolver.provide(&mut loader, "x", 1);
        resolver.provide(&mut loader, "x", 10);

        assert_eq!(resolver.require("x"), Some(&10));
        // The barrier was not double-decremented: u2 dispatched exactly once.
        assert_eq!(loader.dispatched, vec!["u1.js", "u2.js"]);
    }

    #[test]
    fn unregistered_provide_registers_dynamically() {
        let mut resolver: Resolver<i32> = Resolver::new();
        let mut loader = ManualLoader::default();

        resolver.provide(&mut loader, "ghost", 5);
        assert!(resolver.is_imported("ghost"));
        assert_eq!(resolver.require("ghost"), Some(&5));
    }

    #[test]
    fn import_match_filters_namespaces() {
        let mut resolver = Resolver::new();
        resolver.register_unit("a.js", &["engine.a"], &[], 0);
        resolver.register_unit("b.js", &["engine.b"], &[], 0);
        resolver.register_unit("c.js", &["game.c"], &[], 0);
        let mut loader = SyncLoader::new(&[]);

        resolver.import_match(&mut loader, |n| n.starts_with("engine."));
        assert!(resolver.is_imported("engine.a"));
        assert!(resolver.is_imported("engine.b"));
        assert!(!resolver.is_imported("game.c"));
    }

    #[test]
    fn import_all_loads_everything() {
        let mut resolver = Resolver::new();
        resolver.register_unit("a.js", &["a"], &["b"], 0);
        resolver.register_unit("b.js", &["b"], &[], 0);
        let mut loader = SyncLoader::new(&[("a", 1), ("b", 2)]);

        resolver.import_all(&mut loader);
        assert!(resolver.is_imported("a"));
        assert!(resolver.is_imported("b"));
    }

    #[test]
    fn on_provide_hook_sees_every_namespace() {
        let mut resolver = two_unit_chain();
        let mut loader = SyncLoader::new(&[("x", 1), ("y", 2)]);

        let provided = Rc::new(std::cell::RefCell::new(Vec::new()));
        let sink = Rc::clone(&provided);
        resolver.set_on_provide(move |name| sink.borrow_mut().push(name.to_string()));

        resolver.import(&mut loader, "y");
        assert_eq!(*provided.borrow(), vec!["x", "y"]);
    }

    #[test]
    fn pending_bytes_counts_distinct_units() {
        let mut resolver: Resolver<i32> = Resolver::new();
        resolver.register_unit("big.js", &["a", "b"], &["c"], 4096);
        resolver.register_unit("small.js", &["c"], &["missing"], 512);
        let mut loader = ManualLoader::default();

        resolver.import(&mut loader, "a");
        resolver.import(&mut loader, "b");
        // "c" is blocked on a missing namespace, so everything stays pending.
        assert_eq!(resolver.pending_bytes(), 4096 + 512);
        assert_eq!(resolver.pending_count(), 3);
    }

    #[test]
    fn import_list_registers_and_resolves_relative_ids() {
        struct MapSource(HashMap<String, String>);
        impl ManifestSource for MapSource {
            fn fetch(&mut self, path: &str) -> Result<String, ManifestError> {
                self.0
                    .get(path)
                    .cloned()
                    .ok_or_else(|| ManifestError::Fetch(format!("no such manifest: {path}")))
            }
        }

        let mut resolver: Resolver<i32> = Resolver::new();
        let mut source = MapSource(HashMap::from([(
            "data/deps.json".to_string(),
            r#"[
                ["core.js", ["engine.core"], [], 100],
                ["/abs/rooms.js", ["engine.rooms"], ["engine.core"]]
            ]"#
            .to_string(),
        )]));

        let count = resolver.import_list(&mut source, "data/deps.json").unwrap();
        assert_eq!(count, 2);
        assert_eq!(
            resolver.registry().lookup("engine.core").unwrap().unit,
            UnitId::from("data/core.js")
        );
        assert_eq!(
            resolver.registry().lookup("engine.rooms").unwrap().unit,
            UnitId::from("/abs/rooms.js")
        );

        // Failures propagate and register nothing new.
        assert!(resolver.import_list(&mut source, "missing.json").is_err());
        let mut bad = MapSource(HashMap::from([(
            "bad.json".to_string(),
            r#"[["only-two", []]]"#.to_string(),
        )]));
        assert!(resolver.import_list(&mut bad, "bad.json").is_err());
        assert_eq!(resolver.registry().names().count(), 2);
    }
}
