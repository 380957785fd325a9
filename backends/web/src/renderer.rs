use core::cell::RefCell;
use core::fmt;
use std::rc::Rc;

use js_sys::{Function, Reflect};
use tracing::{debug, error, warn};
use wasm_bindgen::{JsCast, JsValue, closure::Closure};
use web_sys::{Event, EventTarget, KeyboardEvent, MouseEvent, TouchEvent, WheelEvent};
use weft_core::{IdPath, MountMode, NativeEvent, Projection, Runtime, Timer, TimerRequest, TopLevelType};

use crate::dom::{id_path_of, window};
use crate::error::WebError;

/// Internal state machine for the web renderer.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum WebRendererState {
    /// The renderer exists but no native listener is installed yet.
    #[default]
    Initialising,
    /// Native listeners are installed and events reach the runtime.
    Listening,
}

struct InstalledListener {
    target: EventTarget,
    name: &'static str,
    capture: bool,
    callback: Closure<dyn FnMut(Event)>,
}

/// Bridges the browser's native events and timers to a [`Runtime`].
///
/// One listener per [`TopLevelType`] is attached to `document` (or `window`
/// for resize). Listeners are detached when the renderer is dropped.
pub struct WebRenderer {
    runtime: Rc<RefCell<Runtime>>,
    listeners: Vec<InstalledListener>,
    state: WebRendererState,
}

impl WebRenderer {
    /// Wraps a runtime. Call [`WebRenderer::install`] to start receiving events.
    #[must_use]
    pub fn new(runtime: Runtime) -> Self {
        Self {
            runtime: Rc::new(RefCell::new(runtime)),
            listeners: Vec::new(),
            state: WebRendererState::Initialising,
        }
    }

    /// Returns the current renderer state.
    #[must_use]
    pub const fn state(&self) -> WebRendererState {
        self.state
    }

    /// Shared handle to the runtime, as captured by the native listeners.
    #[must_use]
    pub fn runtime(&self) -> Rc<RefCell<Runtime>> {
        Rc::clone(&self.runtime)
    }

    /// Attaches the delegated native listeners. Calling it again is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the DOM is unavailable or a listener is rejected.
    pub fn install(&mut self) -> Result<(), WebError> {
        if self.state == WebRendererState::Listening {
            return Ok(());
        }
        let window = window()?;
        let document = window.document().ok_or(WebError::DomUnavailable)?;

        for top_level in TopLevelType::ALL {
            let target: EventTarget = if top_level.on_window() {
                window.clone().into()
            } else {
                document.clone().into()
            };
            let runtime = Rc::clone(&self.runtime);
            let callback = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
                deliver(&runtime, native_event(top_level, &event));
            });
            let name = top_level.dom_name();
            let capture = top_level.needs_capture();
            target.add_event_listener_with_callback_and_bool(
                name,
                callback.as_ref().unchecked_ref(),
                capture,
            )?;
            self.listeners.push(InstalledListener {
                target,
                name,
                capture,
                callback,
            });
        }

        debug!(count = self.listeners.len(), "native listeners installed");
        self.state = WebRendererState::Listening;
        Ok(())
    }

    /// Runs `f` against the runtime, then schedules any timer it requested.
    ///
    /// # Errors
    ///
    /// [`WebError::Busy`] when called from inside an event handler.
    pub fn with_runtime<R>(&self, f: impl FnOnce(&mut Runtime) -> R) -> Result<R, WebError> {
        let (result, timers) = {
            let mut runtime = self.runtime.try_borrow_mut().map_err(|_| WebError::Busy)?;
            let result = f(&mut runtime);
            (result, runtime.take_timer_requests())
        };
        schedule(&self.runtime, timers);
        Ok(result)
    }

    /// Mounts a projection into the element with DOM id `container`.
    ///
    /// # Errors
    ///
    /// Propagates runtime and DOM errors.
    pub fn mount(
        &self,
        container: &str,
        projection: &Projection,
        mode: MountMode,
    ) -> Result<IdPath, WebError> {
        self.with_runtime(|rt| rt.mount(container, projection, mode))?
            .map_err(WebError::from)
    }

    /// Reconciles a mounted root against a new projection.
    ///
    /// # Errors
    ///
    /// Propagates runtime and DOM errors.
    pub fn update_root(&self, root: &IdPath, projection: &Projection) -> Result<(), WebError> {
        self.with_runtime(|rt| rt.update_root(root, projection))?
            .map_err(WebError::from)
    }

    /// Unmounts a root and releases everything registered under it.
    ///
    /// # Errors
    ///
    /// Propagates runtime and DOM errors.
    pub fn unmount(&self, root: &IdPath) -> Result<(), WebError> {
        self.with_runtime(|rt| rt.unmount(root))?
            .map_err(WebError::from)
    }
}

impl fmt::Debug for WebRenderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebRenderer")
            .field("state", &self.state)
            .field(
                "listeners",
                &self.listeners.iter().map(|l| l.name).collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}

impl Drop for WebRenderer {
    fn drop(&mut self) {
        for listener in self.listeners.drain(..) {
            let _ = listener.target.remove_event_listener_with_callback_and_bool(
                listener.name,
                listener.callback.as_ref().unchecked_ref(),
                listener.capture,
            );
        }
    }
}

fn deliver(runtime: &Rc<RefCell<Runtime>>, event: NativeEvent) {
    let top_level = event.top_level;
    let outcome = {
        let Ok(mut rt) = runtime.try_borrow_mut() else {
            warn!(%top_level, "event raised while a handler is running, dropped");
            return;
        };
        let outcome = rt.dispatch(event);
        (outcome, rt.take_timer_requests())
    };
    let (result, timers) = outcome;
    schedule(runtime, timers);
    if let Err(err) = result {
        error!(%top_level, %err, "event handler failed");
        // Surfaces in the browser as an uncaught exception. Nothing above
        // still borrows the runtime at this point.
        wasm_bindgen::throw_str(&err.to_string());
    }
}

fn schedule(runtime: &Rc<RefCell<Runtime>>, timers: Vec<TimerRequest>) {
    if timers.is_empty() {
        return;
    }
    let Ok(window) = window() else {
        warn!("no window to schedule timers on");
        return;
    };
    for TimerRequest { timer, delay_ms } in timers {
        let runtime = Rc::clone(runtime);
        let callback = Closure::once_into_js(move || fire(&runtime, timer));
        let delay = i32::try_from(delay_ms).unwrap_or(i32::MAX);
        if let Err(err) = window.set_timeout_with_callback_and_timeout_and_arguments_0(
            callback.unchecked_ref::<Function>(),
            delay,
        ) {
            error!(?timer, err = ?err, "failed to schedule timer");
        }
    }
}

fn fire(runtime: &Rc<RefCell<Runtime>>, timer: Timer) {
    let outcome = {
        let Ok(mut rt) = runtime.try_borrow_mut() else {
            // Retry once the running handler returns.
            schedule(runtime, vec![TimerRequest { timer, delay_ms: 0 }]);
            return;
        };
        let result = rt.fire_timer(timer);
        (result, rt.take_timer_requests())
    };
    let (result, timers) = outcome;
    schedule(runtime, timers);
    if let Err(err) = result {
        error!(?timer, %err, "timer failed");
    }
}

fn native_event(top_level: TopLevelType, event: &Event) -> NativeEvent {
    let mut native = NativeEvent::new(top_level).with_timestamp(event.time_stamp());
    let target = event.target();
    native.target = target.as_ref().and_then(id_path_of);

    if let Some(mouse) = event.dyn_ref::<MouseEvent>() {
        native.x = f64::from(mouse.page_x());
        native.y = f64::from(mouse.page_y());
        let related = mouse.related_target();
        native.window_edge = related.is_none();
        native.related_target = related.as_ref().and_then(id_path_of);
    }
    if let Some(touch) = event
        .dyn_ref::<TouchEvent>()
        .and_then(|touch| touch.changed_touches().get(0))
    {
        native.x = f64::from(touch.page_x());
        native.y = f64::from(touch.page_y());
    }
    if let Some(wheel) = event.dyn_ref::<WheelEvent>() {
        native.delta_x = wheel.delta_x();
        native.delta_y = wheel.delta_y();
    }
    if let Some(keyboard) = event.dyn_ref::<KeyboardEvent>() {
        native.key = Some(keyboard.key());
    }
    if matches!(top_level, TopLevelType::Change | TopLevelType::Input) {
        native.value = target
            .as_ref()
            .and_then(|target| Reflect::get(target, &JsValue::from_str("value")).ok())
            .and_then(|value| value.as_string());
    }
    native
}
