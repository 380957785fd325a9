//! The DOM boundary.
//!
//! The reconciler never touches a browser API directly. Every physical
//! mutation goes through [`Dom`], addressed by DOM id, so the same engine runs
//! against `web-sys` in the browser and against [`MemoryDom`] in tests and
//! headless hosts.

mod memory;

use core::any::Any;

pub use memory::{MemoryDom, Mutation};

use crate::{Result, markup::Markup};

/// Physical DOM operations consumed by the reconciler.
///
/// `after: None` in positional operations means "as the first child".
pub trait Dom: Any {
    /// Materialises `markup` and appends it as the last child of `parent`.
    ///
    /// # Errors
    ///
    /// Fails if `parent` does not exist or the node cannot be created.
    fn append(&mut self, parent: &str, markup: &Markup) -> Result<()>;

    /// Materialises `markup` and inserts it into `parent` right after `after`.
    ///
    /// # Errors
    ///
    /// Fails if `parent` or `after` does not exist.
    fn insert_after(&mut self, parent: &str, after: Option<&str>, markup: &Markup) -> Result<()>;

    /// Moves the existing node `node` into `parent` right after `after`.
    ///
    /// # Errors
    ///
    /// Fails if any of the nodes does not exist.
    fn move_after(&mut self, parent: &str, node: &str, after: Option<&str>) -> Result<()>;

    /// Returns the id of the element directly preceding `node`, if any.
    fn previous_sibling_id(&self, node: &str) -> Option<String>;

    /// Replaces the node `old` with freshly materialised `markup`.
    ///
    /// # Errors
    ///
    /// Fails if `old` does not exist.
    fn replace(&mut self, old: &str, markup: &Markup) -> Result<()>;

    /// Removes `node` and its subtree. Returns `false` if there was no such node.
    ///
    /// # Errors
    ///
    /// Fails only if the backend rejects the removal.
    fn remove(&mut self, node: &str) -> Result<bool>;

    /// Sets an attribute.
    ///
    /// # Errors
    ///
    /// Fails if `node` does not exist.
    fn set_attribute(&mut self, node: &str, name: &str, value: &str) -> Result<()>;

    /// Removes an attribute.
    ///
    /// # Errors
    ///
    /// Fails if `node` does not exist.
    fn remove_attribute(&mut self, node: &str, name: &str) -> Result<()>;

    /// Replaces the text content of `node`.
    ///
    /// # Errors
    ///
    /// Fails if `node` does not exist.
    fn set_text_content(&mut self, node: &str, text: &str) -> Result<()>;

    /// Replaces the inner HTML of `node`.
    ///
    /// # Errors
    ///
    /// Fails if `node` does not exist.
    fn set_inner_html(&mut self, node: &str, html: &str) -> Result<()>;

    /// Reads the live `value` property of a form control.
    fn value(&self, node: &str) -> Option<String>;

    /// Writes the `value` property of a form control.
    ///
    /// # Errors
    ///
    /// Fails if `node` does not exist.
    fn set_value(&mut self, node: &str, value: &str) -> Result<()>;

    /// Writes `scrollTop`.
    ///
    /// # Errors
    ///
    /// Fails if `node` does not exist.
    fn set_scroll_top(&mut self, node: &str, top: f64) -> Result<()>;

    /// Upcast used to recover the concrete backend.
    fn as_any(&self) -> &dyn Any;

    /// Mutable upcast used to recover the concrete backend.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}
