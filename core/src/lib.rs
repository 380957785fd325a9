#![doc = include_str!("../README.md")]
#![allow(clippy::module_name_repetitions)]

pub mod component;
pub mod config;
pub mod dom;
/// Error type and result alias.
pub mod error;
pub mod event;
pub mod id;
pub mod markup;
pub mod merge;
mod reconcile;
pub mod registry;
pub mod runtime;
pub mod style;

#[cfg(test)]
mod tests;

#[doc(inline)]
pub use component::{
    Children, Component, Composite, Element, ElementProps, Instance, InstanceRef, Maker,
    Projection, Props, STRUCTURE_KEY,
};
pub use config::{GestureConfig, RuntimeConfig};
pub use dom::{Dom, MemoryDom, Mutation};
pub use error::{Error, Result};
#[doc(inline)]
pub use event::{
    AbstractEvent, DragData, EventKind, Handler, Listener, ListenerKey, Mode, NativeEvent,
    TopLevelType, handler,
};
pub use id::IdPath;
pub use markup::{Content, Markup};
pub use merge::deep_merge;
#[doc(inline)]
pub use runtime::{MountMode, Runtime, Timer, TimerRequest};
