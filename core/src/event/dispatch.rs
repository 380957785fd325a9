//! Routing of native events to registered handlers.

use std::rc::Rc;

use tracing::{error, trace};

use super::{
    AbstractEvent, DragData, EventKind, Handler, ListenerKey, Mode, NativeEvent, ResizeAction,
    TopLevelType,
};
use crate::{
    Result,
    id::IdPath,
    runtime::{Runtime, Timer},
};

/// Longest id-path walk the dispatcher performs before giving up.
pub const MAX_BUBBLE_STEPS: usize = 200;

type Targets = Vec<(IdPath, Handler)>;

impl Runtime {
    /// Turns one native event into abstract events and runs their handlers.
    ///
    /// Handlers are collected before any of them runs, so a handler that
    /// mounts or unmounts parts of the tree does not change who receives the
    /// current event.
    ///
    /// # Errors
    ///
    /// The first handler error stops the dispatch and is returned.
    pub fn dispatch(&mut self, native: NativeEvent) -> Result<()> {
        trace!(event = %native.top_level, target = ?native.target, "dispatch");
        let native = Rc::new(native);
        match native.top_level {
            TopLevelType::MouseDown | TopLevelType::TouchStart => self.pointer_down(&native),
            TopLevelType::MouseMove | TopLevelType::TouchMove => self.pointer_move(&native),
            TopLevelType::MouseUp | TopLevelType::TouchEnd | TopLevelType::TouchCancel => {
                self.pointer_up(&native)
            }
            // Only entering from outside the window; every other transition,
            // including one from a host node outside the mounted tree, is
            // fully described by the matching `mouseout`.
            TopLevelType::MouseOver if native.window_edge => {
                self.hover(None, native.target.as_ref(), &native)
            }
            TopLevelType::MouseOver => Ok(()),
            TopLevelType::MouseOut => {
                self.hover(native.target.as_ref(), native.related_target.as_ref(), &native)
            }
            TopLevelType::Resize => self.on_resize(&native),
            other => match other.direct_kind() {
                Some(kind) => {
                    let targets = self.collect_bubbling(kind, native.target.as_ref());
                    self.invoke(kind, targets, &native, None)
                }
                None => Ok(()),
            },
        }
    }

    /// Handlers for `kind` along the bubbling path from `target` outward.
    ///
    /// At every id-path, in order: the `Direct` registration (innermost id
    /// only), the first `FirstHandler` registration met, then the `Default`
    /// one.
    fn collect_bubbling(&self, kind: EventKind, target: Option<&IdPath>) -> Targets {
        let Some(target) = target else {
            return Vec::new();
        };
        if target.depth() > MAX_BUBBLE_STEPS {
            error!(%target, "bubbling walk exceeds {MAX_BUBBLE_STEPS} steps, aborting");
            return Vec::new();
        }
        let mut targets = Vec::new();
        let mut first_handled = false;
        for (step, id) in target.ancestors().enumerate() {
            let lookup = |mode| self.listeners.get(&id, ListenerKey::new(kind, mode));
            if step == 0 {
                if let Some(handler) = lookup(Mode::Direct) {
                    targets.push((id.clone(), handler));
                }
            }
            if !first_handled {
                if let Some(handler) = lookup(Mode::FirstHandler) {
                    targets.push((id.clone(), handler));
                    first_handled = true;
                }
            }
            if let Some(handler) = lookup(Mode::Default) {
                targets.push((id.clone(), handler));
            }
        }
        targets
    }

    fn invoke(
        &mut self,
        kind: EventKind,
        targets: Targets,
        native: &Rc<NativeEvent>,
        drag: Option<DragData>,
    ) -> Result<()> {
        for (current, handler) in targets {
            trace!(%current, %kind, "invoke");
            let event = AbstractEvent {
                kind,
                current,
                native: Rc::clone(native),
                drag,
            };
            handler(&event, self)?;
        }
        Ok(())
    }

    fn pointer_down(&mut self, native: &Rc<NativeEvent>) -> Result<()> {
        let target = native.target.as_ref();
        let drag = self.collect_bubbling(EventKind::Drag, target);
        let done = drag
            .iter()
            .filter_map(|(id, _)| {
                self.listeners
                    .get_any_mode(id, EventKind::DragDone)
                    .map(|handler| (id.clone(), handler))
            })
            .collect();
        trace!(armed = drag.len(), "press");
        self.session
            .press(native.x, native.y, native.timestamp, drag, done);
        if native.top_level == TopLevelType::MouseDown {
            let targets = self.collect_bubbling(EventKind::MouseDown, target);
            self.invoke(EventKind::MouseDown, targets, native, None)?;
        }
        Ok(())
    }

    fn pointer_move(&mut self, native: &Rc<NativeEvent>) -> Result<()> {
        let gestures = self.config().gestures.clone();
        let sampled = self
            .session
            .sample(native.x, native.y, native.timestamp, &gestures);
        match sampled {
            Some((data, targets)) => self.invoke(EventKind::Drag, targets, native, Some(data)),
            None => Ok(()),
        }
    }

    fn pointer_up(&mut self, native: &Rc<NativeEvent>) -> Result<()> {
        let gestures = self.config().gestures.clone();
        if let Some(release) = self.session.release(native.x, native.y, &gestures) {
            let data = Some(release.data);
            self.invoke(EventKind::DragDone, release.drag_done, native, data)?;
            if release.tap {
                let taps = self.collect_bubbling(EventKind::Tap, native.target.as_ref());
                self.invoke(EventKind::Tap, taps, native, data)?;
            }
        }
        if native.top_level == TopLevelType::MouseUp {
            let targets = self.collect_bubbling(EventKind::MouseUp, native.target.as_ref());
            self.invoke(EventKind::MouseUp, targets, native, None)?;
        }
        Ok(())
    }

    /// `MouseOut` from `from` up to the common ancestor, then `MouseIn` from
    /// below it down to `to`. The ancestor itself receives neither.
    ///
    /// Every id on the walk is an intended recipient, so dispatch modes do not
    /// narrow it: a `Direct` or `FirstHandler` registration for `MouseIn` or
    /// `MouseOut` fires like a `Default` one, at most once per id.
    fn hover(
        &mut self,
        from: Option<&IdPath>,
        to: Option<&IdPath>,
        native: &Rc<NativeEvent>,
    ) -> Result<()> {
        let too_deep = [from, to]
            .into_iter()
            .flatten()
            .any(|id| id.depth() > MAX_BUBBLE_STEPS);
        if too_deep {
            error!(?from, ?to, "hover walk exceeds {MAX_BUBBLE_STEPS} steps, aborting");
            return Ok(());
        }
        let shared = match (from, to) {
            (Some(from), Some(to)) => from.common_ancestor(to).map_or(0, |id| id.depth()),
            _ => 0,
        };

        let mut outs = Vec::new();
        if let Some(from) = from {
            for id in from.ancestors().take_while(|id| id.depth() > shared) {
                if let Some(handler) = self.listeners.get_any_mode(&id, EventKind::MouseOut) {
                    outs.push((id, handler));
                }
            }
        }
        let mut ins = Vec::new();
        if let Some(to) = to {
            for id in to.ancestors().take_while(|id| id.depth() > shared) {
                if let Some(handler) = self.listeners.get_any_mode(&id, EventKind::MouseIn) {
                    ins.push((id, handler));
                }
            }
            ins.reverse();
        }

        self.invoke(EventKind::MouseOut, outs, native, None)?;
        self.invoke(EventKind::MouseIn, ins, native, None)
    }

    fn on_resize(&mut self, native: &Rc<NativeEvent>) -> Result<()> {
        match self.resize.on_resize() {
            ResizeAction::Dispatch => self.broadcast_resize(native),
            ResizeAction::Schedule(delay_ms) => {
                self.request_timer(Timer::ResizeFlush, delay_ms);
                Ok(())
            }
            ResizeAction::Coalesced => {
                trace!("resize coalesced");
                Ok(())
            }
        }
    }

    /// Delivers the pending coalesced resize, if one is owed.
    pub(crate) fn flush_resize(&mut self) -> Result<()> {
        if !self.resize.flush() {
            return Ok(());
        }
        self.broadcast_resize(&Rc::new(NativeEvent::new(TopLevelType::Resize)))
    }

    fn broadcast_resize(&mut self, native: &Rc<NativeEvent>) -> Result<()> {
        let targets = self.listeners.registered_for(EventKind::Resize);
        self.invoke(EventKind::Resize, targets, native, None)
    }
}
