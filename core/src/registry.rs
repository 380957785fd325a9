//! Identity registry: id-path to live instance.

use core::fmt;
use std::{collections::BTreeMap, rc::Rc};

use crate::{Error, Result, component::InstanceRef, id::IdPath};

/// Maps every mounted id-path to its live instance.
///
/// Holds at most one instance per id-path; registering a second one is the
/// "using child twice" contract violation.
#[derive(Default)]
pub struct Registry {
    instances: BTreeMap<IdPath, InstanceRef>,
}

impl Registry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `instance` as the owner of `id`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ChildUsedTwice`] if `id` is already owned.
    pub fn register(&mut self, id: IdPath, instance: InstanceRef) -> Result<()> {
        if self.instances.contains_key(&id) {
            return Err(Error::ChildUsedTwice(id));
        }
        self.instances.insert(id, instance);
        Ok(())
    }

    /// Looks up the instance mounted at `id`.
    #[must_use]
    pub fn get(&self, id: &IdPath) -> Option<InstanceRef> {
        self.instances.get(id).map(Rc::clone)
    }

    /// Returns `true` if an instance is mounted at `id`.
    #[must_use]
    pub fn contains(&self, id: &IdPath) -> bool {
        self.instances.contains_key(id)
    }

    /// Forgets `root` and every id-path below it. Returns how many entries went.
    pub fn release_subtree(&mut self, root: &IdPath) -> usize {
        let doomed: Vec<IdPath> = self
            .instances
            .range(root.clone()..)
            .take_while(|(id, _)| id.is_within(root))
            .map(|(id, _)| id.clone())
            .collect();
        for id in &doomed {
            self.instances.remove(id);
        }
        doomed.len()
    }

    /// Mounted id-paths in tree order.
    pub fn ids(&self) -> impl Iterator<Item = &IdPath> {
        self.instances.keys()
    }

    /// Number of mounted instances.
    #[must_use]
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    /// Returns `true` if nothing is mounted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.instances.keys()).finish()
    }
}
