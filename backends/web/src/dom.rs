use core::any::Any;

use js_sys::Reflect;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, EventTarget, Node, Window};
use weft_core::{Content, Dom, Error, Markup, Result};

use crate::error::{WebError, js};

/// Id given to the host element created when no root id is configured.
pub const DEFAULT_ROOT_ID: &str = "weft-root";

/// The element applications are mounted into.
#[derive(Debug, Clone)]
pub struct DomRoot {
    document: Document,
    element: Element,
}

impl DomRoot {
    /// Creates a [`DomRoot`] pointing at the provided element id, or appends a
    /// fresh host `div` to `<body>` when no id is given.
    pub fn new(root_id: Option<&str>) -> Result<Self, WebError> {
        let document = document()?;

        let element = if let Some(id) = root_id {
            document
                .get_element_by_id(id)
                .ok_or_else(|| WebError::RootNotFound(id.to_string()))?
        } else if let Some(existing) = document.get_element_by_id(DEFAULT_ROOT_ID) {
            existing
        } else {
            let body = document.body().ok_or(WebError::DomUnavailable)?;
            let host = document.create_element("div")?;
            host.set_id(DEFAULT_ROOT_ID);
            body.append_child(&host)?;
            host
        };

        Ok(Self { document, element })
    }

    /// Returns the DOM element representing the mounting point.
    #[must_use]
    pub const fn element(&self) -> &Element {
        &self.element
    }

    /// DOM id of the mounting point.
    #[must_use]
    pub fn id(&self) -> String {
        self.element.id()
    }

    /// Returns the owning document.
    #[must_use]
    pub const fn document(&self) -> &Document {
        &self.document
    }

    /// Clears the mounting element.
    pub fn clear(&self) -> Result<(), WebError> {
        while let Some(child) = self.element.first_child() {
            self.element.remove_child(&child)?;
        }
        Ok(())
    }
}

pub(crate) fn window() -> Result<Window, WebError> {
    web_sys::window().ok_or(WebError::DomUnavailable)
}

fn document() -> Result<Document, WebError> {
    window()?.document().ok_or(WebError::DomUnavailable)
}

/// [`Dom`] over the live browser document.
#[derive(Debug, Clone)]
pub struct WebDom {
    document: Document,
}

impl WebDom {
    /// Binds to the current window's document.
    ///
    /// # Errors
    ///
    /// [`WebError::DomUnavailable`] outside of a browser.
    pub fn new() -> Result<Self, WebError> {
        Ok(Self {
            document: document()?,
        })
    }

    /// The bound document.
    #[must_use]
    pub const fn document(&self) -> &Document {
        &self.document
    }

    fn element(&self, id: &str) -> Result<Element> {
        self.document
            .get_element_by_id(id)
            .ok_or_else(|| Error::dom(format!("no element with id `{id}`")))
    }

    fn build(&self, markup: &Markup) -> Result<Node> {
        let element = self.document.create_element(markup.tag).map_err(js)?;
        element.set_id(&markup.id);
        for (name, value) in &markup.attributes {
            element.set_attribute(name, value).map_err(js)?;
        }
        match &markup.content {
            Some(Content::Text(text)) => element.set_text_content(Some(text)),
            Some(Content::DangerousHtml(html)) => element.set_inner_html(html),
            None => {}
        }
        for child in &markup.children {
            element.append_child(&self.build(child)?).map_err(js)?;
        }
        Ok(element.into())
    }

    /// First node that should follow a node placed right after `after`.
    ///
    /// With no `after` the node goes before the first element child, so text
    /// content written by the parent itself stays in front.
    fn reference(&self, parent: &Element, after: Option<&str>) -> Result<Option<Node>> {
        match after {
            Some(after) => Ok(self.element(after)?.next_sibling()),
            None => Ok(parent.first_element_child().map(Node::from)),
        }
    }
}

impl Dom for WebDom {
    fn append(&mut self, parent: &str, markup: &Markup) -> Result<()> {
        let parent = self.element(parent)?;
        parent.append_child(&self.build(markup)?).map_err(js)?;
        Ok(())
    }

    fn insert_after(&mut self, parent: &str, after: Option<&str>, markup: &Markup) -> Result<()> {
        let parent = self.element(parent)?;
        let node = self.build(markup)?;
        let reference = self.reference(&parent, after)?;
        parent
            .insert_before(&node, reference.as_ref())
            .map_err(js)?;
        Ok(())
    }

    fn move_after(&mut self, parent: &str, node: &str, after: Option<&str>) -> Result<()> {
        let parent = self.element(parent)?;
        let node = self.element(node)?;
        let reference = self.reference(&parent, after)?;
        parent
            .insert_before(&node, reference.as_ref())
            .map_err(js)?;
        Ok(())
    }

    fn previous_sibling_id(&self, node: &str) -> Option<String> {
        self.document
            .get_element_by_id(node)?
            .previous_element_sibling()
            .map(|sibling| sibling.id())
    }

    fn replace(&mut self, old: &str, markup: &Markup) -> Result<()> {
        let old = self.element(old)?;
        let node = self.build(markup)?;
        old.replace_with_with_node_1(&node).map_err(js)
    }

    fn remove(&mut self, node: &str) -> Result<bool> {
        let Some(element) = self.document.get_element_by_id(node) else {
            return Ok(false);
        };
        element.remove();
        Ok(true)
    }

    fn set_attribute(&mut self, node: &str, name: &str, value: &str) -> Result<()> {
        self.element(node)?.set_attribute(name, value).map_err(js)
    }

    fn remove_attribute(&mut self, node: &str, name: &str) -> Result<()> {
        self.element(node)?.remove_attribute(name).map_err(js)
    }

    fn set_text_content(&mut self, node: &str, text: &str) -> Result<()> {
        self.element(node)?.set_text_content(Some(text));
        Ok(())
    }

    fn set_inner_html(&mut self, node: &str, html: &str) -> Result<()> {
        self.element(node)?.set_inner_html(html);
        Ok(())
    }

    fn value(&self, node: &str) -> Option<String> {
        let element = self.document.get_element_by_id(node)?;
        Reflect::get(&element, &JsValue::from_str("value"))
            .ok()?
            .as_string()
    }

    fn set_value(&mut self, node: &str, value: &str) -> Result<()> {
        let element = self.element(node)?;
        Reflect::set(&element, &JsValue::from_str("value"), &JsValue::from_str(value))
            .map_err(js)?;
        Ok(())
    }

    fn set_scroll_top(&mut self, node: &str, top: f64) -> Result<()> {
        let element = self.element(node)?;
        Reflect::set(&element, &JsValue::from_str("scrollTop"), &JsValue::from_f64(top))
            .map_err(js)?;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Innermost element at or above `node` whose id is an id-path.
pub(crate) fn id_path_of(target: &EventTarget) -> Option<weft_core::IdPath> {
    let node = target.dyn_ref::<Node>()?;
    let element = match node.dyn_ref::<Element>() {
        Some(element) => element.clone(),
        None => node.parent_element()?,
    };
    let owner = element.closest("[id^='.']").ok()??;
    weft_core::IdPath::parse(&owner.id())
}
