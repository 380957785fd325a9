//! The runtime context.
//!
//! A [`Runtime`] owns everything one mounted application mutates: the DOM
//! handle, the identity registry, the listener table, the drag session and
//! the resize coalescer. It is threaded explicitly through reconciliation and
//! event handlers, so several applications can coexist on one page.
//!
//! Everything runs synchronously on one thread. Deferred work (resize
//! flushes, two-pass handler registration) is requested as a
//! [`TimerRequest`]; the host schedules it and calls [`Runtime::fire_timer`].

use core::{any::type_name, fmt};
use std::{collections::BTreeMap, rc::Rc};

use tracing::{debug, info};

use crate::{
    Error, Result,
    component::{Composite, Component, InstanceRef, Projection},
    config::RuntimeConfig,
    dom::Dom,
    event::{DragSession, ListenerTable, ResizeCoalescer},
    id::IdPath,
    reconcile,
    registry::Registry,
};

/// How [`Runtime::mount`] treats event handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MountMode {
    /// Markup and handlers in one pass.
    #[default]
    Immediate,
    /// Markup first; handlers once the host fires
    /// [`Timer::DeferredHandlers`].
    TwoPass,
}

/// Deferred work the host is asked to schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timer {
    /// Deliver one coalesced resize.
    ResizeFlush,
    /// Register the handlers of two-pass roots.
    DeferredHandlers,
}

/// A request to call [`Runtime::fire_timer`] after a delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerRequest {
    /// What to fire.
    pub timer: Timer,
    /// Delay in milliseconds.
    pub delay_ms: u32,
}

/// Per-application state threaded through reconciliation and dispatch.
pub struct Runtime {
    pub(crate) dom: Box<dyn Dom>,
    pub(crate) registry: Registry,
    pub(crate) listeners: ListenerTable,
    pub(crate) session: DragSession,
    pub(crate) resize: ResizeCoalescer,
    config: RuntimeConfig,
    roots: BTreeMap<IdPath, InstanceRef>,
    mounted: usize,
    deferred: Vec<IdPath>,
    timers: Vec<TimerRequest>,
}

impl Runtime {
    /// Creates a runtime over `dom` with the default configuration.
    pub fn new(dom: impl Dom) -> Self {
        Self::with_config(dom, RuntimeConfig::default())
    }

    /// Creates a runtime over `dom` with `config`.
    pub fn with_config(dom: impl Dom, config: RuntimeConfig) -> Self {
        Self {
            dom: Box::new(dom),
            registry: Registry::new(),
            listeners: ListenerTable::new(),
            session: DragSession::default(),
            resize: ResizeCoalescer::new(config.resize_batch_ms),
            config,
            roots: BTreeMap::new(),
            mounted: 0,
            deferred: Vec::new(),
            timers: Vec::new(),
        }
    }

    /// The DOM backend.
    #[must_use]
    pub fn dom(&self) -> &dyn Dom {
        self.dom.as_ref()
    }

    /// The DOM backend, mutably.
    pub fn dom_mut(&mut self) -> &mut dyn Dom {
        self.dom.as_mut()
    }

    /// The DOM backend as its concrete type.
    #[must_use]
    pub fn dom_as<T: Dom>(&self) -> Option<&T> {
        self.dom.as_any().downcast_ref()
    }

    /// The DOM backend as its concrete type, mutably.
    pub fn dom_as_mut<T: Dom>(&mut self) -> Option<&mut T> {
        self.dom.as_any_mut().downcast_mut()
    }

    /// Mounted instances by id-path.
    #[must_use]
    pub const fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Registered event handlers.
    #[must_use]
    pub const fn listeners(&self) -> &ListenerTable {
        &self.listeners
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// The current drag/tap session.
    #[must_use]
    pub const fn session(&self) -> &DragSession {
        &self.session
    }

    /// Mounted root id-paths.
    pub fn roots(&self) -> impl Iterator<Item = &IdPath> {
        self.roots.keys()
    }

    /// Looks up the instance mounted at `id`.
    #[must_use]
    pub fn instance(&self, id: &IdPath) -> Option<InstanceRef> {
        self.registry.get(id)
    }

    /// Mounts `projection` as a new root appended to the DOM node `container`.
    ///
    /// Roots are named after [`RuntimeConfig::root_name`]: `.top`, `.top1`,
    /// `.top2`, ...
    ///
    /// # Errors
    ///
    /// Fails if `container` does not exist, the root name is not a valid
    /// id-path segment, or mounting the tree fails. Nothing stays registered
    /// after a failed mount.
    pub fn mount(
        &mut self,
        container: &str,
        projection: &Projection,
        mode: MountMode,
    ) -> Result<IdPath> {
        let id = self.next_root_id()?;
        let two_pass = mode == MountMode::TwoPass;
        let (instance, markup) = reconcile::mount(self, projection, &id, true, !two_pass)?;
        if let Some(markup) = markup {
            if let Err(err) = self.dom.append(container, &markup) {
                reconcile::release(self, &id);
                return Err(err);
            }
        }
        self.roots.insert(id.clone(), instance);
        if two_pass {
            self.deferred.push(id.clone());
            self.timers.push(TimerRequest {
                timer: Timer::DeferredHandlers,
                delay_ms: self.config.deferral_ms,
            });
        }
        info!(%id, container, ?mode, "mounted root");
        Ok(id)
    }

    fn next_root_id(&mut self) -> Result<IdPath> {
        let name = match self.mounted {
            0 => self.config.root_name.clone(),
            n => format!("{}{n}", self.config.root_name),
        };
        self.mounted += 1;
        IdPath::try_root(&name)
    }

    /// Tears a root down, removing its DOM and every registration below it.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownInstance`] if `root` is not a mounted root.
    pub fn unmount(&mut self, root: &IdPath) -> Result<()> {
        let instance = self
            .roots
            .remove(root)
            .ok_or_else(|| Error::UnknownInstance(root.clone()))?;
        self.deferred.retain(|id| id != root);
        reconcile::unmount(self, &instance)?;
        info!(%root, "unmounted root");
        Ok(())
    }

    /// Reconciles a root against a new projection.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownInstance`] for an unknown root, or any reconciliation
    /// error.
    pub fn update_root(&mut self, root: &IdPath, projection: &Projection) -> Result<()> {
        let instance = self
            .roots
            .get(root)
            .cloned()
            .ok_or_else(|| Error::UnknownInstance(root.clone()))?;
        if projection.matches(&instance) {
            let mut guard = instance
                .try_borrow_mut()
                .map_err(|_| Error::UpdateWhileProjecting(root.clone()))?;
            guard.do_control(self, projection.props())
        } else {
            let fresh = reconcile::remount_in_place(self, &instance, projection, root)?;
            self.roots.insert(root.clone(), fresh);
            Ok(())
        }
    }

    /// Updates the state of the component `C` mounted at `id` and
    /// reconciles its subtree synchronously.
    ///
    /// # Errors
    ///
    /// - [`Error::UnknownInstance`] if nothing is mounted at `id`,
    /// - [`Error::UpdateWhileProjecting`] if that instance is mid-update,
    /// - [`Error::ComponentMismatch`] if it is not a `C`.
    pub fn update_state<C: Component>(
        &mut self,
        id: &IdPath,
        update: impl FnOnce(&mut C::State),
    ) -> Result<()> {
        let instance = self
            .registry
            .get(id)
            .ok_or_else(|| Error::UnknownInstance(id.clone()))?;
        let mut guard = instance
            .try_borrow_mut()
            .map_err(|_| Error::UpdateWhileProjecting(id.clone()))?;
        let composite = guard
            .as_any_mut()
            .downcast_mut::<Composite<C>>()
            .ok_or_else(|| Error::ComponentMismatch {
                id: id.clone(),
                expected: type_name::<C>(),
            })?;
        composite.update_state(self, update)
    }

    /// Reads the component `C` mounted at `id`.
    ///
    /// # Errors
    ///
    /// Same as [`Runtime::update_state`].
    pub fn with_component<C: Component, R>(
        &self,
        id: &IdPath,
        f: impl FnOnce(&Composite<C>) -> R,
    ) -> Result<R> {
        let instance = self
            .registry
            .get(id)
            .ok_or_else(|| Error::UnknownInstance(id.clone()))?;
        let guard = instance
            .try_borrow()
            .map_err(|_| Error::UpdateWhileProjecting(id.clone()))?;
        let composite = guard
            .as_any()
            .downcast_ref::<Composite<C>>()
            .ok_or_else(|| Error::ComponentMismatch {
                id: id.clone(),
                expected: type_name::<C>(),
            })?;
        Ok(f(composite))
    }

    /// Registers the handlers of every two-pass root still waiting for them.
    /// Returns how many roots were processed.
    ///
    /// # Errors
    ///
    /// Propagates errors from walking the trees.
    pub fn register_deferred_handlers(&mut self) -> Result<usize> {
        let pending = core::mem::take(&mut self.deferred);
        let mut done = 0;
        for id in pending {
            let Some(instance) = self.roots.get(&id).map(Rc::clone) else {
                continue;
            };
            instance.borrow_mut().gen_markup(self, &id, false, true)?;
            debug!(%id, "deferred handlers registered");
            done += 1;
        }
        Ok(done)
    }

    /// Returns `true` while a two-pass root still lacks its handlers.
    #[must_use]
    pub fn has_deferred_handlers(&self) -> bool {
        !self.deferred.is_empty()
    }

    /// Drains the timers requested since the last call.
    pub fn take_timer_requests(&mut self) -> Vec<TimerRequest> {
        core::mem::take(&mut self.timers)
    }

    pub(crate) fn request_timer(&mut self, timer: Timer, delay_ms: u32) {
        self.timers.push(TimerRequest { timer, delay_ms });
    }

    /// Runs deferred work whose delay has elapsed.
    ///
    /// # Errors
    ///
    /// Propagates handler and reconciliation errors.
    pub fn fire_timer(&mut self, timer: Timer) -> Result<()> {
        match timer {
            Timer::ResizeFlush => self.flush_resize(),
            Timer::DeferredHandlers => self.register_deferred_handlers().map(drop),
        }
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("roots", &self.roots.keys().collect::<Vec<_>>())
            .field("registry", &self.registry)
            .field("listeners", &self.listeners)
            .field("session", &self.session)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
