//! Ordered children of uniform type, matched by index.

use tracing::debug;

use super::{attach, discard, mount, remount_in_place, unmount};
use crate::{
    Result,
    component::{InstanceRef, Projection},
    id::IdPath,
    markup::Markup,
    runtime::Runtime,
};

#[derive(Default)]
pub(crate) struct OrderedChildren {
    items: Vec<InstanceRef>,
}

impl OrderedChildren {
    pub(crate) fn mount(
        rt: &mut Runtime,
        parent: &IdPath,
        next: &[Projection],
        do_markup: bool,
        do_handlers: bool,
    ) -> Result<(Self, Vec<Markup>)> {
        let mut items = Vec::with_capacity(next.len());
        let mut markups = Vec::new();
        for (at, projection) in next.iter().enumerate() {
            match mount(rt, projection, &parent.child_index(at), do_markup, do_handlers) {
                Ok((instance, markup)) => {
                    markups.extend(markup);
                    items.push(instance);
                }
                Err(err) => {
                    discard(rt, items);
                    return Err(err);
                }
            }
        }
        Ok((Self { items }, markups))
    }

    pub(crate) fn regen(
        &self,
        rt: &mut Runtime,
        parent: &IdPath,
        do_markup: bool,
        do_handlers: bool,
    ) -> Result<Vec<Markup>> {
        let mut markups = Vec::new();
        for (at, instance) in self.items.iter().enumerate() {
            let markup = instance.borrow_mut().gen_markup(
                rt,
                &parent.child_index(at),
                do_markup,
                do_handlers,
            )?;
            markups.extend(markup);
        }
        Ok(markups)
    }

    pub(crate) fn reconcile(
        &mut self,
        rt: &mut Runtime,
        parent: &IdPath,
        next: &[Projection],
    ) -> Result<()> {
        let shared = self.items.len().min(next.len());

        for (at, projection) in next.iter().enumerate().take(shared) {
            let current = &self.items[at];
            if projection.matches(current) {
                current.borrow_mut().do_control(rt, projection.props())?;
            } else {
                let fresh = remount_in_place(rt, current, projection, &parent.child_index(at))?;
                self.items[at] = fresh;
            }
        }

        let surplus: Vec<InstanceRef> = self.items.drain(shared..).collect();
        if !surplus.is_empty() {
            debug!(%parent, count = surplus.len(), "shrink");
        }
        let mut surplus = surplus.into_iter();
        while let Some(instance) = surplus.next() {
            if let Err(err) = unmount(rt, &instance) {
                self.items.push(instance);
                self.items.extend(surplus);
                return Err(err);
            }
        }

        for (at, projection) in next.iter().enumerate().skip(shared) {
            let after = self
                .items
                .last()
                .and_then(|last| last.borrow().dom_id());
            let id = parent.child_index(at);
            let (instance, markup) = mount(rt, projection, &id, true, true)?;
            attach(
                rt,
                parent,
                after.as_ref().map(IdPath::as_str),
                &id,
                markup.as_ref(),
            )?;
            self.items.push(instance);
        }
        Ok(())
    }

    pub(crate) fn into_instances(self) -> Vec<InstanceRef> {
        self.items
    }

    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }
}
