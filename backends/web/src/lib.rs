#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! Web/WASM backend for `weft`.
//!
//! [`WebDom`] implements the runtime's DOM boundary over `web-sys`.
//! [`WebRenderer`] attaches one delegated listener per native event type,
//! feeds them to [`weft_core::Runtime::dispatch`] and drives the runtime's
//! timers with `setTimeout`. [`WebApp`] ties both to a host element.
//!
//! Call [`logging::init`] once at startup to route `tracing` output and panics
//! to the browser console.

mod app;
mod dom;
mod error;
pub mod logging;
mod renderer;

pub use app::{WebApp, WebAppBuilder};
pub use dom::{DEFAULT_ROOT_ID, DomRoot, WebDom};
pub use error::WebError;
pub use renderer::{WebRenderer, WebRendererState};
