//! Standard components: props + state projected onto one structure child.

use core::{any::type_name, fmt};
use std::rc::Rc;

use tracing::debug;

use super::{Component, Instance, InstanceRef, Maker, Props, claim_id, downcast_props};
use crate::{Error, Result, id::IdPath, markup::Markup, reconcile, runtime::Runtime};

/// Segment under which a composite mounts its structure child.
pub const STRUCTURE_KEY: &str = "s";

/// Live instance of component `C`.
pub struct Composite<C: Component> {
    props: Rc<C::Props>,
    state: C::State,
    id: Option<IdPath>,
    child: Option<InstanceRef>,
}

impl<C: Component> Composite<C> {
    pub(super) fn make(props: Props) -> Result<InstanceRef> {
        let props = downcast_props::<C::Props>(props, type_name::<C>())?;
        let state = C::init_state(&props);
        Ok(Rc::new(core::cell::RefCell::new(Self {
            props,
            state,
            id: None,
            child: None,
        })))
    }

    /// Last applied props.
    #[must_use]
    pub fn props(&self) -> &C::Props {
        &self.props
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> &C::State {
        &self.state
    }

    /// The mounted structure child.
    #[must_use]
    pub fn child(&self) -> Option<InstanceRef> {
        self.child.clone()
    }

    /// Applies `update` to the state and reconciles synchronously.
    pub(crate) fn update_state(
        &mut self,
        rt: &mut Runtime,
        update: impl FnOnce(&mut C::State),
    ) -> Result<()> {
        let id = self.backing_id()?;
        update(&mut self.state);
        debug!(%id, component = type_name::<C>(), "state updated");
        self.reproject(rt, &id)
    }

    fn backing_id(&self) -> Result<IdPath> {
        self.id.clone().ok_or(Error::ControlWithoutBackingDom {
            component: type_name::<C>(),
        })
    }

    fn reproject(&mut self, rt: &mut Runtime, id: &IdPath) -> Result<()> {
        let projection = C::project(&self.props, &self.state, id);
        let child = self.child.take().ok_or(Error::ControlWithoutBackingDom {
            component: type_name::<C>(),
        })?;
        let (child, result) = if projection.matches(&child) {
            let controlled = child.borrow_mut().do_control(rt, projection.props());
            (child, controlled)
        } else {
            match reconcile::remount_in_place(rt, &child, &projection, &id.child(STRUCTURE_KEY)) {
                Ok(fresh) => (fresh, Ok(())),
                Err(err) => (child, Err(err)),
            }
        };
        // Kept on failure too: the next pass converges from whatever is live.
        self.child = Some(child);
        result
    }
}

impl<C: Component> Instance for Composite<C> {
    fn maker(&self) -> Maker {
        Maker::of::<C>()
    }

    fn id(&self) -> Option<&IdPath> {
        self.id.as_ref()
    }

    fn dom_id(&self) -> Option<IdPath> {
        self.child.as_ref().and_then(|child| child.borrow().dom_id())
    }

    fn gen_markup(
        &mut self,
        rt: &mut Runtime,
        id: &IdPath,
        do_markup: bool,
        do_handlers: bool,
    ) -> Result<Option<Markup>> {
        claim_id(&mut self.id, id)?;
        let child_id = id.child(STRUCTURE_KEY);
        if let Some(child) = self.child.clone() {
            return child
                .borrow_mut()
                .gen_markup(rt, &child_id, do_markup, do_handlers);
        }
        let projection = C::project(&self.props, &self.state, id);
        let (child, markup) = reconcile::mount(rt, &projection, &child_id, do_markup, do_handlers)?;
        self.child = Some(child);
        Ok(markup)
    }

    fn do_control(&mut self, rt: &mut Runtime, props: Props) -> Result<()> {
        let id = self.backing_id()?;
        let props = downcast_props::<C::Props>(props, type_name::<C>())?;
        C::prop_trigger(&props, &mut self.state);
        self.props = props;
        self.reproject(rt, &id)
    }

    fn as_any(&self) -> &dyn core::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn core::any::Any {
        self
    }
}

impl<C: Component> fmt::Debug for Composite<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Composite")
            .field("component", &type_name::<C>())
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}
