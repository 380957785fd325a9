//! The event listener table.

use core::fmt;
use std::{
    collections::{BTreeMap, HashMap},
    rc::Rc,
};

use super::{AbstractEvent, EventKind, ListenerKey, Mode};
use crate::{Result, id::IdPath, runtime::Runtime};

/// A component callback. Receives the runtime so it can update state.
pub type Handler = Rc<dyn Fn(&AbstractEvent, &mut Runtime) -> Result<()>>;

/// Wraps a closure into a [`Handler`].
pub fn handler(f: impl Fn(&AbstractEvent, &mut Runtime) -> Result<()> + 'static) -> Handler {
    Rc::new(f)
}

/// A handler together with what it listens for.
#[derive(Clone)]
pub struct Listener {
    /// Event type and mode.
    pub key: ListenerKey,
    /// Callback.
    pub handler: Handler,
}

impl Listener {
    /// Creates a listener.
    #[must_use]
    pub fn new(kind: EventKind, mode: Mode, handler: Handler) -> Self {
        Self {
            key: ListenerKey::new(kind, mode),
            handler,
        }
    }
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Listener({})", self.key)
    }
}

/// Maps `id-path @ kind+mode` to a registered callback.
///
/// Entries are grouped per id-path in an ordered map, so tearing down a
/// subtree removes one contiguous range.
#[derive(Default)]
pub struct ListenerTable {
    entries: BTreeMap<IdPath, HashMap<ListenerKey, Handler>>,
}

impl ListenerTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers one callback, returning the one it replaced.
    pub fn register(&mut self, id: &IdPath, key: ListenerKey, handler: Handler) -> Option<Handler> {
        self.entries
            .entry(id.clone())
            .or_default()
            .insert(key, handler)
    }

    /// Replaces every registration of `id` with `listeners`.
    ///
    /// Clear-then-set: a listener missing from `listeners` is gone afterwards.
    pub fn register_all(&mut self, id: &IdPath, listeners: impl IntoIterator<Item = Listener>) {
        let fresh: HashMap<ListenerKey, Handler> = listeners
            .into_iter()
            .map(|listener| (listener.key, listener.handler))
            .collect();
        if fresh.is_empty() {
            self.entries.remove(id);
        } else {
            self.entries.insert(id.clone(), fresh);
        }
    }

    /// Looks up one registration.
    #[must_use]
    pub fn get(&self, id: &IdPath, key: ListenerKey) -> Option<Handler> {
        self.entries.get(id)?.get(&key).map(Rc::clone)
    }

    /// Looks up a registration for `kind` at `id` in any mode.
    #[must_use]
    pub fn get_any_mode(&self, id: &IdPath, kind: EventKind) -> Option<Handler> {
        Mode::ALL
            .into_iter()
            .find_map(|mode| self.get(id, ListenerKey::new(kind, mode)))
    }

    /// Every registration for `kind`, in tree order.
    #[must_use]
    pub fn registered_for(&self, kind: EventKind) -> Vec<(IdPath, Handler)> {
        self.entries
            .iter()
            .flat_map(|(id, map)| {
                map.iter()
                    .filter(move |(key, _)| key.kind == kind)
                    .map(move |(_, handler)| (id.clone(), Rc::clone(handler)))
            })
            .collect()
    }

    /// Drops every registration of `root` and of every id-path below it.
    /// Returns how many callbacks were released.
    pub fn release_subtree(&mut self, root: &IdPath) -> usize {
        let doomed: Vec<IdPath> = self
            .entries
            .range(root.clone()..)
            .take_while(|(id, _)| id.is_within(root))
            .map(|(id, _)| id.clone())
            .collect();
        doomed
            .iter()
            .filter_map(|id| self.entries.remove(id))
            .map(|map| map.len())
            .sum()
    }

    /// Table keys in their `id@kindMode` string form, sorted.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .entries
            .iter()
            .flat_map(|(id, map)| map.keys().map(move |key| format!("{id}@{key}")))
            .collect();
        keys.sort();
        keys
    }

    /// Total number of registered callbacks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.values().map(HashMap::len).sum()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for ListenerTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> Handler {
        handler(|_, _| Ok(()))
    }

    fn id(raw: &str) -> IdPath {
        IdPath::parse(raw).unwrap()
    }

    #[test]
    fn release_is_prefix_exact() {
        let mut table = ListenerTable::new();
        let click = ListenerKey::new(EventKind::Click, Mode::Default);
        for raw in [".top.a", ".top.a.b", ".top.ab", ".top.b"] {
            table.register(&id(raw), click, noop());
        }
        assert_eq!(table.release_subtree(&id(".top.a")), 2);
        assert_eq!(table.keys(), [".top.ab@onClick", ".top.b@onClick"]);
    }

    #[test]
    fn register_all_replaces_instead_of_merging() {
        let mut table = ListenerTable::new();
        let target = id(".top");
        table.register_all(
            &target,
            [
                Listener::new(EventKind::Click, Mode::Default, noop()),
                Listener::new(EventKind::Drag, Mode::Direct, noop()),
            ],
        );
        table.register_all(
            &target,
            [Listener::new(EventKind::Tap, Mode::FirstHandler, noop())],
        );
        assert_eq!(table.keys(), [".top@onTapFirstHandler"]);
        table.register_all(&target, []);
        assert!(table.is_empty());
    }
}
