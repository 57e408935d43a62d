//! Namespace and unit registries.
//!
//! Descriptors are created when a unit registers (or lazily, with a
//! diagnostic, when a namespace is provided without registration) and
//! persist for the lifetime of the process. Uses BTreeMap so iteration
//! order is deterministic across runs.

use ashfall_common::{DepSpec, UnitId};
use std::collections::{BTreeMap, HashMap};

/// Load state of a namespace. Monotonic: a namespace never moves backwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LoadState {
    Unloaded,
    Loading,
    Loaded,
}

/// Callback invoked at most once, when a namespace becomes available.
pub type Waiter<V> = Box<dyn FnOnce(&V)>;

/// Descriptor for a registered namespace.
pub struct NamespaceEntry<V> {
    /// The unit that provides this namespace. First registration wins.
    pub unit: UnitId,
    pub state: LoadState,
    /// Ordered dependency specifiers, parsed at registration.
    pub deps: Vec<DepSpec>,
    /// The provided value; set exactly once, on Loaded.
    pub value: Option<V>,
}

/// Descriptor for a compilation unit.
#[derive(Debug, Clone)]
pub struct UnitEntry {
    /// Namespaces this unit provides.
    pub provides: Vec<String>,
    /// Namespaces this unit requires. Informational; scheduling reads the
    /// per-namespace specifiers.
    pub requires: Vec<DepSpec>,
    /// Approximate size in bytes, for progress display.
    pub approx_size: u64,
    /// Prevents duplicate dispatch.
    pub dispatched: bool,
}

/// Maps namespace names and unit ids to their descriptors.
///
/// Waiters live in a side table keyed by name so a consumer can wait on a
/// namespace that has not been registered yet.
pub struct Registry<V> {
    names: BTreeMap<String, NamespaceEntry<V>>,
    units: BTreeMap<UnitId, UnitEntry>,
    waiters: HashMap<String, Vec<Waiter<V>>>,
}

impl<V> Default for Registry<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> Registry<V> {
    pub fn new() -> Self {
        Self {
            names: BTreeMap::new(),
            units: BTreeMap::new(),
            waiters: HashMap::new(),
        }
    }

    /// Claim ownership of a namespace for a unit. First registration wins;
    /// returns false if the name already had an owner.
    fn try_register(&mut self, name: &str, unit: &UnitId, deps: &[DepSpec]) -> bool {
        if self.names.contains_key(name) {
            return false;
        }
        self.names.insert(
            name.to_string(),
            NamespaceEntry {
                unit: unit.clone(),
                state: LoadState::Unloaded,
                deps: deps.to_vec(),
                value: None,
            },
        );
        true
    }

    /// Register a unit together with the namespaces it provides and requires.
    ///
    /// Idempotent per namespace: a duplicate ownership claim is logged and
    /// ignored, but the unit's own provide/require sets are still recorded.
    /// Re-registering a unit never resets its dispatched flag.
    pub fn register_unit(
        &mut self,
        unit: UnitId,
        provides: Vec<String>,
        requires: Vec<DepSpec>,
        approx_size: u64,
    ) {
        for name in &provides {
            if !self.try_register(name, &unit, &requires) {
                tracing::debug!(
                    %unit,
                    name = name.as_str(),
                    "namespace already owned, keeping first registration"
                );
            }
        }
        let dispatched = self.units.get(&unit).is_some_and(|u| u.dispatched);
        self.units.insert(
            unit,
            UnitEntry {
                provides,
                requires,
                approx_size,
                dispatched,
            },
        );
    }

    /// Create a descriptor for a namespace provided without registration.
    /// The synthetic unit owns only this namespace and counts as dispatched.
    pub fn register_dynamic(&mut self, name: &str) {
        let unit = UnitId::from(name);
        self.names
            .entry(name.to_string())
            .or_insert_with(|| NamespaceEntry {
                unit: unit.clone(),
                state: LoadState::Unloaded,
                deps: Vec::new(),
                value: None,
            });
        self.units.entry(unit).or_insert_with(|| UnitEntry {
            provides: vec![name.to_string()],
            requires: Vec::new(),
            approx_size: 0,
            dispatched: true,
        });
    }

    pub fn lookup(&self, name: &str) -> Option<&NamespaceEntry<V>> {
        self.names.get(name)
    }

    pub fn unit(&self, unit: &UnitId) -> Option<&UnitEntry> {
        self.units.get(unit)
    }

    /// The provided value of a namespace, if it has reached Loaded.
    pub fn value(&self, name: &str) -> Option<&V> {
        self.names.get(name).and_then(|e| e.value.as_ref())
    }

    pub fn is_loaded(&self, name: &str) -> bool {
        self.names
            .get(name)
            .is_some_and(|e| e.state == LoadState::Loaded)
    }

    /// Move a namespace from Unloaded to Loading. No-op for any other state.
    pub fn set_loading(&mut self, name: &str) {
        if let Some(entry) = self.names.get_mut(name) {
            if entry.state == LoadState::Unloaded {
                entry.state = LoadState::Loading;
            }
        }
    }

    /// Mark a namespace Loaded and store its value. Overwrites the value on
    /// a repeat call; the state never leaves Loaded.
    pub fn set_loaded(&mut self, name: &str, value: V) {
        if let Some(entry) = self.names.get_mut(name) {
            entry.state = LoadState::Loaded;
            entry.value = Some(value);
        }
    }

    /// Mark a unit dispatched and return the namespaces it provides, or
    /// `None` if it was already dispatched or is unknown.
    pub fn begin_dispatch(&mut self, unit: &UnitId) -> Option<Vec<String>> {
        let entry = self.units.get_mut(unit)?;
        if entry.dispatched {
            return None;
        }
        entry.dispatched = true;
        Some(entry.provides.clone())
    }

    /// Mark an external resource dispatched, creating its (empty) unit entry
    /// on first sight. Returns false if it was already dispatched.
    pub fn begin_external(&mut self, url: &str) -> bool {
        let entry = self
            .units
            .entry(UnitId::from(url))
            .or_insert_with(|| UnitEntry {
                provides: Vec::new(),
                requires: Vec::new(),
                approx_size: 0,
                dispatched: false,
            });
        if entry.dispatched {
            false
        } else {
            entry.dispatched = true;
            true
        }
    }

    pub fn push_waiter(&mut self, name: &str, waiter: Waiter<V>) {
        self.waiters.entry(name.to_string()).or_default().push(waiter);
    }

    pub fn take_waiters(&mut self, name: &str) -> Vec<Waiter<V>> {
        self.waiters.remove(name).unwrap_or_default()
    }

    /// All registered namespace names, in deterministic order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.keys().map(String::as_str)
    }

    /// All registered units, in deterministic order.
    pub fn units_iter(&self) -> impl Iterator<Item = (&UnitId, &UnitEntry)> {
        self.units.iter()
    }
}
