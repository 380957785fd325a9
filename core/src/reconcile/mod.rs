//! Child reconciliation.
//!
//! Converges a parent's live children onto a new child list with as
//! few DOM operations as possible. Two shapes exist:
//!
//! - keyed children ([`KeyedChildren`]), whose identity is their name and
//!   which may be reordered,
//! - ordered children ([`OrderedChildren`]), whose identity is their index.
//!
//! Array children are matched by position only. Do not keep client-local
//! state in ordered children that you intend to reorder; use keyed children
//! for that.

mod keyed;
mod ordered;

use std::rc::Rc;

use tracing::{debug, warn};

pub(crate) use keyed::KeyedChildren;
pub(crate) use ordered::OrderedChildren;

use crate::{
    Result,
    component::{Children, InstanceRef, Projection},
    id::IdPath,
    markup::Markup,
    runtime::Runtime,
};

/// Allocates an instance for `projection`, files it under `id` and generates
/// its markup. Nothing is inserted into the DOM.
///
/// When generating the markup fails, everything filed under `id` on the way
/// is released again, so a later pass can mount at `id` afresh.
pub(crate) fn mount(
    rt: &mut Runtime,
    projection: &Projection,
    id: &IdPath,
    do_markup: bool,
    do_handlers: bool,
) -> Result<(InstanceRef, Option<Markup>)> {
    let instance = projection.instantiate()?;
    rt.registry.register(id.clone(), Rc::clone(&instance))?;
    debug!(%id, maker = projection.maker().name(), "allocate");
    let generated = instance
        .borrow_mut()
        .gen_markup(rt, id, do_markup, do_handlers);
    match generated {
        Ok(markup) => Ok((instance, markup)),
        Err(err) => {
            release(rt, id);
            Err(err)
        }
    }
}

/// Inserts the markup of a freshly mounted child right after `after` (first
/// when `None`), releasing the child if the DOM refuses it.
fn attach(
    rt: &mut Runtime,
    parent: &IdPath,
    after: Option<&str>,
    id: &IdPath,
    markup: Option<&Markup>,
) -> Result<()> {
    let Some(markup) = markup else {
        return Ok(());
    };
    rt.dom
        .insert_after(parent.as_str(), after, markup)
        .inspect_err(|_| release(rt, id))
}

/// Forgets instances whose markup never reached the DOM.
fn discard(rt: &mut Runtime, instances: impl IntoIterator<Item = InstanceRef>) {
    for instance in instances {
        let id = instance.borrow().id().cloned();
        if let Some(id) = id {
            release(rt, &id);
        }
    }
}

/// Removes the DOM node of `instance` and forgets its whole subtree.
pub(crate) fn unmount(rt: &mut Runtime, instance: &InstanceRef) -> Result<()> {
    let (id, dom_id) = {
        let instance = instance.borrow();
        (instance.id().cloned(), instance.dom_id())
    };
    match &dom_id {
        Some(dom_id) => {
            if !rt.dom.remove(dom_id.as_str())? {
                warn!(%dom_id, "no dom node to hide");
            }
        }
        None => warn!(?id, "no dom node to hide"),
    }
    if let Some(id) = id {
        release(rt, &id);
    }
    Ok(())
}

/// Replaces `old` by a fresh instance of `projection` at the same position.
pub(crate) fn remount_in_place(
    rt: &mut Runtime,
    old: &InstanceRef,
    projection: &Projection,
    id: &IdPath,
) -> Result<InstanceRef> {
    let (old_id, old_dom) = {
        let old = old.borrow();
        (old.id().cloned(), old.dom_id())
    };
    if let Some(old_id) = &old_id {
        release(rt, old_id);
    }
    let (fresh, markup) = mount(rt, projection, id, true, true)?;
    debug!(%id, maker = projection.maker().name(), "remount in place");
    match (old_dom, markup) {
        (Some(old_dom), Some(markup)) => rt.dom.replace(old_dom.as_str(), &markup)?,
        (Some(old_dom), None) => {
            rt.dom.remove(old_dom.as_str())?;
        }
        (None, _) => warn!(%id, "no dom node to replace"),
    }
    Ok(fresh)
}

pub(crate) fn release(rt: &mut Runtime, id: &IdPath) {
    let instances = rt.registry.release_subtree(id);
    let listeners = rt.listeners.release_subtree(id);
    debug!(%id, instances, listeners, "release");
}

/// The live children of a native element.
#[derive(Default)]
pub(crate) enum ChildList {
    #[default]
    None,
    Keyed(KeyedChildren),
    Ordered(OrderedChildren),
}

impl ChildList {
    /// Mounts `children` below `parent`, returning the markup of every child
    /// that produced some.
    pub(crate) fn mount(
        rt: &mut Runtime,
        parent: &IdPath,
        children: &Children,
        do_markup: bool,
        do_handlers: bool,
    ) -> Result<(Self, Vec<Markup>)> {
        match children {
            Children::None => Ok((Self::None, Vec::new())),
            Children::Keyed(next) => {
                let (list, markup) =
                    KeyedChildren::mount(rt, parent, next, do_markup, do_handlers)?;
                Ok((Self::Keyed(list), markup))
            }
            Children::Ordered(next) => {
                let (list, markup) =
                    OrderedChildren::mount(rt, parent, next, do_markup, do_handlers)?;
                Ok((Self::Ordered(list), markup))
            }
        }
    }

    /// Re-walks already mounted children.
    pub(crate) fn regen(
        &self,
        rt: &mut Runtime,
        parent: &IdPath,
        do_markup: bool,
        do_handlers: bool,
    ) -> Result<Vec<Markup>> {
        match self {
            Self::None => Ok(Vec::new()),
            Self::Keyed(list) => list.regen(rt, parent, do_markup, do_handlers),
            Self::Ordered(list) => list.regen(rt, parent, do_markup, do_handlers),
        }
    }

    /// Converges onto `next`. Switching between shapes tears every child down.
    pub(crate) fn reconcile(
        &mut self,
        rt: &mut Runtime,
        parent: &IdPath,
        next: &Children,
    ) -> Result<()> {
        match (&mut *self, next) {
            (Self::None, Children::None) => Ok(()),
            (Self::Keyed(list), Children::Keyed(next)) => list.reconcile(rt, parent, next),
            (Self::Ordered(list), Children::Ordered(next)) => list.reconcile(rt, parent, next),
            _ => {
                debug!(%parent, "children changed shape");
                self.unmount_all(rt)?;
                let (list, markup) = Self::mount(rt, parent, next, true, true)?;
                for markup in &markup {
                    if let Err(err) = rt.dom.append(parent.as_str(), markup) {
                        discard(rt, list.into_instances());
                        return Err(err);
                    }
                }
                *self = list;
                Ok(())
            }
        }
    }

    /// Unmounts every child.
    pub(crate) fn unmount_all(&mut self, rt: &mut Runtime) -> Result<()> {
        let instances = core::mem::take(self).into_instances();
        instances
            .iter()
            .try_for_each(|instance| unmount(rt, instance))
    }

    fn into_instances(self) -> Vec<InstanceRef> {
        match self {
            Self::None => Vec::new(),
            Self::Keyed(list) => list.into_instances(),
            Self::Ordered(list) => list.into_instances(),
        }
    }

    /// Number of live (non-placeholder) children.
    pub(crate) fn len(&self) -> usize {
        match self {
            Self::None => 0,
            Self::Keyed(list) => list.len(),
            Self::Ordered(list) => list.len(),
        }
    }
}
