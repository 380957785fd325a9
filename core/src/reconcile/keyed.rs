//! Keyed children with an eviction pool.
//!
//! Names that are absent from the new child stream are unmounted first. The
//! stream is then walked with a cursor. A child found at a later index than
//! the cursor is pulled back directly (backward moves are cheap). When the
//! slot under the cursor belongs to some other name, its occupant is evicted
//! into a pool from which a later position may reclaim it; so moving a child
//! forward costs an eviction. Whatever is still in the pool once the stream
//! ends is unmounted.
//!
//! A name is at any time in exactly one of: a live slot, the pool, nowhere.
//!
//! Pooled nodes are about to leave their position, so they are skipped when
//! deciding whether a survivor already sits in place. Without reordering,
//! every surviving child is controlled in place, nothing is moved, and new
//! children are inserted after the last positioned sibling.

use std::collections::HashMap;

use indexmap::IndexMap;
use tracing::debug;

use super::{attach, discard, mount, unmount};
use crate::{
    Result,
    component::{InstanceRef, Projection},
    id::IdPath,
    markup::Markup,
    runtime::Runtime,
};

type Stream = IndexMap<String, Option<Projection>>;

struct Slot {
    name: String,
    /// `None` for a falsy child: the name is known but has no DOM.
    instance: Option<InstanceRef>,
}

#[derive(Default)]
pub(crate) struct KeyedChildren {
    slots: Vec<Slot>,
    index: HashMap<String, usize>,
}

impl KeyedChildren {
    pub(crate) fn mount(
        rt: &mut Runtime,
        parent: &IdPath,
        next: &Stream,
        do_markup: bool,
        do_handlers: bool,
    ) -> Result<(Self, Vec<Markup>)> {
        check_names(parent, next)?;
        let mut slots: Vec<Slot> = Vec::with_capacity(next.len());
        let mut markups = Vec::new();
        for (name, projection) in next {
            let instance = match projection {
                Some(projection) => {
                    match mount(rt, projection, &parent.child(name), do_markup, do_handlers) {
                        Ok((instance, markup)) => {
                            markups.extend(markup);
                            Some(instance)
                        }
                        Err(err) => {
                            discard(rt, slots.into_iter().filter_map(|slot| slot.instance));
                            return Err(err);
                        }
                    }
                }
                None => None,
            };
            slots.push(Slot {
                name: name.clone(),
                instance,
            });
        }
        Ok((Self::from_slots(slots), markups))
    }

    fn from_slots(slots: Vec<Slot>) -> Self {
        let index = slots
            .iter()
            .enumerate()
            .map(|(at, slot)| (slot.name.clone(), at))
            .collect();
        Self { slots, index }
    }

    pub(crate) fn regen(
        &self,
        rt: &mut Runtime,
        parent: &IdPath,
        do_markup: bool,
        do_handlers: bool,
    ) -> Result<Vec<Markup>> {
        let mut markups = Vec::new();
        for slot in &self.slots {
            if let Some(instance) = &slot.instance {
                let markup = instance.borrow_mut().gen_markup(
                    rt,
                    &parent.child(&slot.name),
                    do_markup,
                    do_handlers,
                )?;
                markups.extend(markup);
            }
        }
        Ok(markups)
    }

    /// Converges onto `next`.
    ///
    /// A failing pass stops where it is. The children that are still mounted
    /// at that point, whether already converged, untouched or pooled, stay
    /// on record so the next pass can pick them up again.
    pub(crate) fn reconcile(&mut self, rt: &mut Runtime, parent: &IdPath, next: &Stream) -> Result<()> {
        check_names(parent, next)?;
        let mut pass = Pass::start(core::mem::take(self), next.len());
        let result = pass
            .prune(rt, next)
            .and_then(|()| pass.walk(rt, parent, next))
            .and_then(|()| pass.release_unclaimed(rt, parent));
        *self = pass.into_live();
        result
    }

    pub(crate) fn into_instances(self) -> Vec<InstanceRef> {
        self.slots
            .into_iter()
            .filter_map(|slot| slot.instance)
            .collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| slot.instance.is_some())
            .count()
    }
}

/// Rejects names that cannot become an id-path segment before anything is
/// touched.
fn check_names(parent: &IdPath, next: &Stream) -> Result<()> {
    next.keys()
        .try_for_each(|name| parent.try_child(name).map(drop))
}

/// Bookkeeping of one reconciliation pass.
struct Pass {
    old: Vec<Option<Slot>>,
    old_index: HashMap<String, usize>,
    pool: IndexMap<String, InstanceRef>,
    slots: Vec<Slot>,
}

impl Pass {
    fn start(list: KeyedChildren, capacity: usize) -> Self {
        Self {
            old: list.slots.into_iter().map(Some).collect(),
            old_index: list.index,
            pool: IndexMap::new(),
            slots: Vec::with_capacity(capacity),
        }
    }

    /// Unmounts children whose name is gone, then closes the gaps so that the
    /// survivors line up with the new stream when nothing was reordered.
    fn prune(&mut self, rt: &mut Runtime, next: &Stream) -> Result<()> {
        for at in 0..self.old.len() {
            let Some(slot) = self.old[at].take_if(|slot| !next.contains_key(&slot.name)) else {
                continue;
            };
            if let Some(instance) = &slot.instance {
                debug!(name = %slot.name, "remove");
                if let Err(err) = unmount(rt, instance) {
                    self.old[at] = Some(slot);
                    return Err(err);
                }
            }
        }
        self.old.retain(Option::is_some);
        self.old_index = self
            .old
            .iter()
            .flatten()
            .enumerate()
            .map(|(at, slot)| (slot.name.clone(), at))
            .collect();
        Ok(())
    }

    fn walk(&mut self, rt: &mut Runtime, parent: &IdPath, next: &Stream) -> Result<()> {
        let mut dom_cursor: Option<String> = None;
        for (cursor, (name, projection)) in next.iter().enumerate() {
            if self.old_index.get(name) != Some(&cursor) {
                if let Some(occupant) = self.old.get_mut(cursor).and_then(Option::take) {
                    self.old_index.remove(&occupant.name);
                    if let Some(instance) = occupant.instance {
                        debug!(%parent, name = %occupant.name, "evict");
                        self.pool.insert(occupant.name, instance);
                    }
                }
            }

            let existing = match self.old_index.remove(name) {
                Some(at) => self
                    .old
                    .get_mut(at)
                    .and_then(Option::take)
                    .and_then(|slot| slot.instance),
                None => self.pool.swap_remove(name),
            };

            let instance = self.converge(
                rt,
                parent,
                name,
                projection.as_ref(),
                existing,
                dom_cursor.as_deref(),
            )?;
            if let Some(dom_id) = instance.as_ref().and_then(|i| i.borrow().dom_id()) {
                dom_cursor = Some(dom_id.as_str().to_owned());
            }
            self.slots.push(Slot {
                name: name.clone(),
                instance,
            });
        }
        Ok(())
    }

    /// Brings the child `name` in line with `projection` right after `after`.
    fn converge(
        &mut self,
        rt: &mut Runtime,
        parent: &IdPath,
        name: &str,
        projection: Option<&Projection>,
        existing: Option<InstanceRef>,
        after: Option<&str>,
    ) -> Result<Option<InstanceRef>> {
        match (projection, existing) {
            (Some(projection), Some(instance)) if projection.matches(&instance) => {
                let controlled = self
                    .place(rt, parent, &instance, after)
                    .and_then(|()| instance.borrow_mut().do_control(rt, projection.props()));
                match controlled {
                    Ok(()) => Ok(Some(instance)),
                    Err(err) => {
                        self.keep(name, instance);
                        Err(err)
                    }
                }
            }
            (projection, existing) => {
                if let Some(stale) = existing {
                    if let Err(err) = unmount(rt, &stale) {
                        self.keep(name, stale);
                        return Err(err);
                    }
                }
                let Some(projection) = projection else {
                    return Ok(None);
                };
                let id = parent.child(name);
                let (fresh, markup) = mount(rt, projection, &id, true, true)?;
                attach(rt, parent, after, &id, markup.as_ref())?;
                Ok(Some(fresh))
            }
        }
    }

    /// Moves the node of `instance` right after `after` unless it already is
    /// there, ignoring pooled siblings in between.
    fn place(
        &self,
        rt: &mut Runtime,
        parent: &IdPath,
        instance: &InstanceRef,
        after: Option<&str>,
    ) -> Result<()> {
        let Some(dom_id) = instance.borrow().dom_id() else {
            return Ok(());
        };
        let leaving: Vec<IdPath> = self
            .pool
            .values()
            .filter_map(|pooled| pooled.borrow().dom_id())
            .collect();
        let mut previous = rt.dom.previous_sibling_id(dom_id.as_str());
        while let Some(skipped) =
            previous.take_if(|id| leaving.iter().any(|gone| gone.as_str() == id.as_str()))
        {
            previous = rt.dom.previous_sibling_id(&skipped);
        }
        if previous.as_deref() != after {
            debug!(node = %dom_id, ?after, "move");
            rt.dom.move_after(parent.as_str(), dom_id.as_str(), after)?;
        }
        Ok(())
    }

    fn release_unclaimed(&mut self, rt: &mut Runtime, parent: &IdPath) -> Result<()> {
        let leftovers = self
            .old
            .drain(..)
            .flatten()
            .filter_map(|slot| slot.instance.map(|instance| (slot.name, instance)));
        self.pool.extend(leftovers);
        self.old_index.clear();
        while let Some((name, instance)) = self.pool.shift_remove_index(0) {
            debug!(%parent, %name, "deallocate unclaimed");
            if let Err(err) = unmount(rt, &instance) {
                self.pool.insert(name, instance);
                return Err(err);
            }
        }
        Ok(())
    }

    fn keep(&mut self, name: &str, instance: InstanceRef) {
        self.slots.push(Slot {
            name: name.to_owned(),
            instance: Some(instance),
        });
    }

    /// Everything that still has a DOM node and a registration.
    fn into_live(self) -> KeyedChildren {
        let Self {
            old,
            pool,
            mut slots,
            ..
        } = self;
        slots.extend(old.into_iter().flatten());
        slots.extend(pool.into_iter().map(|(name, instance)| Slot {
            name,
            instance: Some(instance),
        }));
        KeyedChildren::from_slots(slots)
    }
}
