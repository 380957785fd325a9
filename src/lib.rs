#![doc = include_str!("../README.md")]
#![allow(clippy::multiple_crate_versions)]

pub mod logging;

#[doc(inline)]
pub use weft_core::{
    component, config, dom, error, event, id, markup, merge, registry, runtime, style,
};
#[doc(inline)]
pub use weft_core::{
    AbstractEvent, Children, Component, Composite, DragData, Element, ElementProps, Error,
    EventKind, GestureConfig, IdPath, MemoryDom, Mode, MountMode, NativeEvent, Projection,
    Result, Runtime, RuntimeConfig, TopLevelType, deep_merge,
};

/// Browser backend, available with the `web` feature.
#[cfg(feature = "web")]
pub use weft_web as web;

pub mod prelude {
    //! A collection of commonly used types for easy importing.
    //!
    //! ```rust
    //! use weft::prelude::*;
    //!
    //! struct Title;
    //!
    //! impl Component for Title {
    //!     type Props = String;
    //!     type State = ();
    //!
    //!     fn init_state(_props: &String) {}
    //!
    //!     fn project(props: &String, _state: &(), _id: &IdPath) -> Projection {
    //!         Projection::element(ElementProps::new("h1").text(props.clone()))
    //!     }
    //! }
    //! ```
    pub use weft_core::{
        AbstractEvent, Children, Component, ElementProps, EventKind, IdPath, Mode, MountMode,
        Projection, Runtime,
    };
}
