//! Synthetic event delegation.
//!
//! A handful of real listeners live on `document` and `window`. Each raw
//! [`NativeEvent`] they receive is turned into zero or more [`AbstractEvent`]s
//! which are routed through the [`ListenerTable`] by id-path.

mod dispatch;
mod gesture;
mod listeners;
mod resize;

use core::fmt;
use std::rc::Rc;

pub use dispatch::MAX_BUBBLE_STEPS;
pub use gesture::DragSession;
pub use listeners::{Handler, Listener, ListenerTable, handler};
pub use resize::{ResizeAction, ResizeCoalescer};

use crate::id::IdPath;

/// Normalised, cross-browser event types that components listen for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[non_exhaustive]
pub enum EventKind {
    /// Primary button click.
    Click,
    /// Double click.
    DoubleClick,
    /// Key pressed.
    KeyDown,
    /// Key released.
    KeyUp,
    /// Character produced.
    KeyPress,
    /// Element gained focus.
    Focus,
    /// Element lost focus.
    Blur,
    /// Committed value change of a form control.
    Change,
    /// Live value edit of a form control.
    Input,
    /// Element scrolled.
    Scroll,
    /// Wheel rotated.
    Wheel,
    /// Pointer entered the element's subtree.
    MouseIn,
    /// Pointer left the element's subtree.
    MouseOut,
    /// Mouse button pressed.
    MouseDown,
    /// Mouse button released.
    MouseUp,
    /// Throttled pointer movement while pressed.
    Drag,
    /// Pointer released after a drag.
    DragDone,
    /// Press and release without significant movement.
    Tap,
    /// Window resized.
    Resize,
}

impl EventKind {
    /// Handler-style name, e.g. `onClick`.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Click => "onClick",
            Self::DoubleClick => "onDoubleClick",
            Self::KeyDown => "onKeyDown",
            Self::KeyUp => "onKeyUp",
            Self::KeyPress => "onKeyPress",
            Self::Focus => "onFocus",
            Self::Blur => "onBlur",
            Self::Change => "onChange",
            Self::Input => "onInput",
            Self::Scroll => "onScroll",
            Self::Wheel => "onWheel",
            Self::MouseIn => "onMouseIn",
            Self::MouseOut => "onMouseOut",
            Self::MouseDown => "onMouseDown",
            Self::MouseUp => "onMouseUp",
            Self::Drag => "onDrag",
            Self::DragDone => "onDragDone",
            Self::Tap => "onTap",
            Self::Resize => "onResize",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How far an abstract event travels up the id-path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub enum Mode {
    /// Every ancestor with a registration is invoked.
    #[default]
    Default,
    /// Only the originally targeted id-path is considered.
    Direct,
    /// Only the innermost ancestor with a registration is invoked.
    FirstHandler,
}

impl Mode {
    /// All modes, in the order they are tested at a single id-path.
    pub const ALL: [Self; 3] = [Self::Direct, Self::FirstHandler, Self::Default];

    const fn suffix(self) -> &'static str {
        match self {
            Self::Default => "",
            Self::Direct => "Direct",
            Self::FirstHandler => "FirstHandler",
        }
    }
}

/// The part of a listener-table key that follows the `@`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerKey {
    /// Abstract event listened for.
    pub kind: EventKind,
    /// Dispatch mode.
    pub mode: Mode,
}

impl ListenerKey {
    /// Creates a key.
    #[must_use]
    pub const fn new(kind: EventKind, mode: Mode) -> Self {
        Self { kind, mode }
    }
}

impl fmt::Display for ListenerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.kind.name(), self.mode.suffix())
    }
}

/// Raw browser event types the delegation layer listens to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum TopLevelType {
    /// `click`
    Click,
    /// `dblclick`
    DoubleClick,
    /// `keydown`
    KeyDown,
    /// `keyup`
    KeyUp,
    /// `keypress`
    KeyPress,
    /// `focus`
    Focus,
    /// `blur`
    Blur,
    /// `change`
    Change,
    /// `input`
    Input,
    /// `scroll`
    Scroll,
    /// `wheel`
    Wheel,
    /// `mouseover`
    MouseOver,
    /// `mouseout`
    MouseOut,
    /// `mousedown`
    MouseDown,
    /// `mousemove`
    MouseMove,
    /// `mouseup`
    MouseUp,
    /// `touchstart`
    TouchStart,
    /// `touchmove`
    TouchMove,
    /// `touchend`
    TouchEnd,
    /// `touchcancel`
    TouchCancel,
    /// `resize`, delivered on `window`.
    Resize,
}

impl TopLevelType {
    /// Every type a backend must listen for.
    pub const ALL: [Self; 21] = [
        Self::Click,
        Self::DoubleClick,
        Self::KeyDown,
        Self::KeyUp,
        Self::KeyPress,
        Self::Focus,
        Self::Blur,
        Self::Change,
        Self::Input,
        Self::Scroll,
        Self::Wheel,
        Self::MouseOver,
        Self::MouseOut,
        Self::MouseDown,
        Self::MouseMove,
        Self::MouseUp,
        Self::TouchStart,
        Self::TouchMove,
        Self::TouchEnd,
        Self::TouchCancel,
        Self::Resize,
    ];

    /// Native DOM event name.
    #[must_use]
    pub const fn dom_name(self) -> &'static str {
        match self {
            Self::Click => "click",
            Self::DoubleClick => "dblclick",
            Self::KeyDown => "keydown",
            Self::KeyUp => "keyup",
            Self::KeyPress => "keypress",
            Self::Focus => "focus",
            Self::Blur => "blur",
            Self::Change => "change",
            Self::Input => "input",
            Self::Scroll => "scroll",
            Self::Wheel => "wheel",
            Self::MouseOver => "mouseover",
            Self::MouseOut => "mouseout",
            Self::MouseDown => "mousedown",
            Self::MouseMove => "mousemove",
            Self::MouseUp => "mouseup",
            Self::TouchStart => "touchstart",
            Self::TouchMove => "touchmove",
            Self::TouchEnd => "touchend",
            Self::TouchCancel => "touchcancel",
            Self::Resize => "resize",
        }
    }

    /// Events that do not bubble and must be captured on `document`.
    #[must_use]
    pub const fn needs_capture(self) -> bool {
        matches!(self, Self::Focus | Self::Blur | Self::Scroll)
    }

    /// Events delivered on `window` rather than `document`.
    #[must_use]
    pub const fn on_window(self) -> bool {
        matches!(self, Self::Resize)
    }

    /// The abstract type a raw event maps to one-to-one, if any.
    ///
    /// Pointer, touch, hover and resize events return `None`: they go through
    /// the gesture state machine or dedicated routing instead.
    #[must_use]
    pub const fn direct_kind(self) -> Option<EventKind> {
        match self {
            Self::Click => Some(EventKind::Click),
            Self::DoubleClick => Some(EventKind::DoubleClick),
            Self::KeyDown => Some(EventKind::KeyDown),
            Self::KeyUp => Some(EventKind::KeyUp),
            Self::KeyPress => Some(EventKind::KeyPress),
            Self::Focus => Some(EventKind::Focus),
            Self::Blur => Some(EventKind::Blur),
            Self::Change => Some(EventKind::Change),
            Self::Input => Some(EventKind::Input),
            Self::Scroll => Some(EventKind::Scroll),
            Self::Wheel => Some(EventKind::Wheel),
            _ => None,
        }
    }
}

impl fmt::Display for TopLevelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dom_name())
    }
}

/// A raw event as reported by the backend, with targets resolved to id-paths.
#[derive(Debug, Clone, PartialEq)]
pub struct NativeEvent {
    /// Raw type.
    pub top_level: TopLevelType,
    /// Innermost id-path at or above the event target.
    pub target: Option<IdPath>,
    /// For `mouseover`/`mouseout`: the node on the other side of the transition.
    ///
    /// `None` both for nodes outside the mounted tree and for the window
    /// edge; [`NativeEvent::window_edge`] tells the two apart.
    pub related_target: Option<IdPath>,
    /// For `mouseover`/`mouseout`: the browser reported no related node at
    /// all, so the pointer crossed the edge of the window.
    pub window_edge: bool,
    /// Page x coordinate.
    pub x: f64,
    /// Page y coordinate.
    pub y: f64,
    /// Timestamp in milliseconds.
    pub timestamp: f64,
    /// Key value for keyboard events.
    pub key: Option<String>,
    /// Current value of the target for `change`/`input`.
    pub value: Option<String>,
    /// Horizontal wheel delta.
    pub delta_x: f64,
    /// Vertical wheel delta.
    pub delta_y: f64,
}

impl NativeEvent {
    /// Creates an untargeted event at the origin.
    #[must_use]
    pub const fn new(top_level: TopLevelType) -> Self {
        Self {
            top_level,
            target: None,
            related_target: None,
            window_edge: false,
            x: 0.0,
            y: 0.0,
            timestamp: 0.0,
            key: None,
            value: None,
            delta_x: 0.0,
            delta_y: 0.0,
        }
    }

    /// Sets the target id-path.
    #[must_use]
    pub fn with_target(mut self, target: IdPath) -> Self {
        self.target = Some(target);
        self
    }

    /// Sets the related target id-path.
    #[must_use]
    pub fn with_related_target(mut self, related: IdPath) -> Self {
        self.related_target = Some(related);
        self
    }

    /// Marks a `mouseover`/`mouseout` that crossed the edge of the window.
    #[must_use]
    pub fn across_window_edge(mut self) -> Self {
        self.window_edge = true;
        self
    }

    /// Sets the page coordinates.
    #[must_use]
    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    /// Sets the timestamp in milliseconds.
    #[must_use]
    pub fn with_timestamp(mut self, timestamp: f64) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Sets the key value.
    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Sets the form value.
    #[must_use]
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }
}

/// Start and current coordinates of a drag sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragData {
    /// X where the pointer went down.
    pub start_x: f64,
    /// Y where the pointer went down.
    pub start_y: f64,
    /// Current x.
    pub x: f64,
    /// Current y.
    pub y: f64,
}

impl DragData {
    /// Total horizontal displacement.
    #[must_use]
    pub fn delta_x(&self) -> f64 {
        self.x - self.start_x
    }

    /// Total vertical displacement.
    #[must_use]
    pub fn delta_y(&self) -> f64 {
        self.y - self.start_y
    }
}

/// The normalised event handed to a component callback.
#[derive(Debug, Clone)]
pub struct AbstractEvent {
    /// Abstract type.
    pub kind: EventKind,
    /// Id-path whose registration is being invoked.
    pub current: IdPath,
    /// The raw event this one was inferred from.
    pub native: Rc<NativeEvent>,
    /// Drag coordinates for [`EventKind::Drag`] and [`EventKind::DragDone`].
    pub drag: Option<DragData>,
}

impl AbstractEvent {
    /// The innermost id-path the raw event was aimed at.
    #[must_use]
    pub fn target(&self) -> Option<&IdPath> {
        self.native.target.as_ref()
    }
}
