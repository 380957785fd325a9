//! Native elements.

use core::fmt;
use std::{collections::BTreeMap, rc::Rc};

use indexmap::IndexMap;
use serde_json::{Map, Value};
use tracing::debug;

use super::{Instance, InstanceRef, Maker, Projection, Props, claim_id, downcast_props};
use crate::{
    Error, Result,
    event::{AbstractEvent, EventKind, Listener, Mode, handler},
    id::IdPath,
    markup::{Content, Markup},
    merge::deep_merge,
    reconcile::ChildList,
    runtime::Runtime,
    style::css_text,
};

const ELEMENT: &str = "Element";

/// Children of a native element, keyed or ordered.
#[derive(Debug, Clone, Default)]
pub enum Children {
    /// No child instances.
    #[default]
    None,
    /// Named children; identity is the name. `None` keeps a placeholder
    /// without DOM for a falsy child.
    Keyed(IndexMap<String, Option<Projection>>),
    /// Children of uniform type; identity is the index.
    Ordered(Vec<Projection>),
}

/// Props of a native element.
///
/// ```
/// use weft_core::{ElementProps, EventKind};
///
/// let button = ElementProps::new("button")
///     .class("primary")
///     .style_property("color", "red")
///     .text("Save")
///     .on(EventKind::Click, |_event, _rt| Ok(()));
/// assert_eq!(button.tag(), "button");
/// ```
#[derive(Debug, Clone)]
pub struct ElementProps {
    tag: &'static str,
    attributes: BTreeMap<String, String>,
    style: Map<String, Value>,
    content: Option<Content>,
    value: Option<String>,
    scroll_top: Option<f64>,
    listeners: Vec<Listener>,
    children: Children,
}

impl ElementProps {
    /// Creates props for `tag` with nothing set.
    #[must_use]
    pub fn new(tag: &'static str) -> Self {
        Self {
            tag,
            attributes: BTreeMap::new(),
            style: Map::new(),
            content: None,
            value: None,
            scroll_top: None,
            listeners: Vec::new(),
            children: Children::None,
        }
    }

    /// Tag name.
    #[must_use]
    pub const fn tag(&self) -> &'static str {
        self.tag
    }

    /// Inline style map.
    #[must_use]
    pub const fn style(&self) -> &Map<String, Value> {
        &self.style
    }

    /// Sets an attribute.
    #[must_use]
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Sets the `class` attribute.
    #[must_use]
    pub fn class(self, class: impl Into<String>) -> Self {
        self.attr("class", class)
    }

    /// Sets one inline style property.
    #[must_use]
    pub fn style_property(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.style.insert(name.into(), value.into());
        self
    }

    /// Deep-merges a JSON object into the inline style.
    ///
    /// # Errors
    ///
    /// [`Error::MergeNonObject`] if `patch` is not an object or holds arrays.
    pub fn merge_style(mut self, patch: Value) -> Result<Self> {
        let mut style = Value::Object(core::mem::take(&mut self.style));
        deep_merge(&mut style, patch)?;
        if let Value::Object(style) = style {
            self.style = style;
        }
        Ok(self)
    }

    /// Sets escaped text content.
    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.content = Some(Content::Text(text.into()));
        self
    }

    /// Sets raw HTML content. The caller vouches for `html`.
    #[must_use]
    pub fn dangerous_html(mut self, html: impl Into<String>) -> Self {
        self.content = Some(Content::DangerousHtml(html.into()));
        self
    }

    /// Sets the `value` of a form control.
    #[must_use]
    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Requests a `scrollTop`, written on control when it changes.
    #[must_use]
    pub const fn scroll_top(mut self, top: f64) -> Self {
        self.scroll_top = Some(top);
        self
    }

    /// Listens for `kind` in [`Mode::Default`].
    #[must_use]
    pub fn on(
        self,
        kind: EventKind,
        f: impl Fn(&AbstractEvent, &mut Runtime) -> Result<()> + 'static,
    ) -> Self {
        self.on_mode(kind, Mode::Default, f)
    }

    /// Listens for `kind` in the given mode.
    #[must_use]
    pub fn on_mode(
        mut self,
        kind: EventKind,
        mode: Mode,
        f: impl Fn(&AbstractEvent, &mut Runtime) -> Result<()> + 'static,
    ) -> Self {
        self.listeners.push(Listener::new(kind, mode, handler(f)));
        self
    }

    /// Adds a named child. Switches ordered children to keyed ones.
    #[must_use]
    pub fn child(mut self, name: impl Into<String>, projection: Projection) -> Self {
        self.insert_keyed(name.into(), Some(projection));
        self
    }

    /// Reserves a name for a falsy child that has no DOM.
    #[must_use]
    pub fn placeholder(mut self, name: impl Into<String>) -> Self {
        self.insert_keyed(name.into(), None);
        self
    }

    /// Replaces the children by an ordered list.
    #[must_use]
    pub fn ordered(mut self, children: Vec<Projection>) -> Self {
        self.children = Children::Ordered(children);
        self
    }

    /// Replaces the children wholesale.
    #[must_use]
    pub fn children(mut self, children: Children) -> Self {
        self.children = children;
        self
    }

    fn insert_keyed(&mut self, name: String, projection: Option<Projection>) {
        let mut keyed = match core::mem::take(&mut self.children) {
            Children::Keyed(keyed) => keyed,
            Children::None | Children::Ordered(_) => IndexMap::new(),
        };
        keyed.insert(name, projection);
        self.children = Children::Keyed(keyed);
    }

    fn validate(&self, id: &IdPath) -> Result<()> {
        if self
            .attributes
            .keys()
            .any(|name| name.eq_ignore_ascii_case("innerhtml"))
        {
            return Err(Error::UnsafeInnerHtml(id.clone()));
        }
        Ok(())
    }

    fn markup(&self, id: &IdPath, children: Vec<Markup>) -> Markup {
        let css = css_text(&self.style);
        let mut attributes: Vec<(String, String)> = self
            .attributes
            .iter()
            .filter(|(name, _)| css.is_empty() || name.as_str() != "style")
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        if !css.is_empty() {
            attributes.push(("style".to_owned(), css));
        }
        if let Some(value) = &self.value {
            attributes.push(("value".to_owned(), value.clone()));
        }
        Markup {
            id: id.as_str().to_owned(),
            tag: self.tag,
            attributes,
            content: self.content.clone(),
            children,
        }
    }
}

/// Live native element.
pub struct Element {
    props: Rc<ElementProps>,
    id: Option<IdPath>,
    children: ChildList,
}

impl Element {
    pub(super) fn make(props: Props) -> Result<InstanceRef> {
        let props = downcast_props::<ElementProps>(props, ELEMENT)?;
        Ok(Rc::new(core::cell::RefCell::new(Self {
            props,
            id: None,
            children: ChildList::None,
        })))
    }

    /// Last applied props.
    #[must_use]
    pub fn props(&self) -> &ElementProps {
        &self.props
    }

    /// Number of mounted child instances, placeholders excluded.
    #[must_use]
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    fn apply(&self, rt: &mut Runtime, id: &IdPath, next: &ElementProps) -> Result<()> {
        let node = id.as_str();
        let prev = &self.props;

        for (name, value) in &next.attributes {
            if prev.attributes.get(name) != Some(value) {
                rt.dom.set_attribute(node, name, value)?;
            }
        }
        for name in prev.attributes.keys() {
            if !next.attributes.contains_key(name) {
                rt.dom.remove_attribute(node, name)?;
            }
        }

        if prev.style != next.style {
            let css = css_text(&next.style);
            if css.is_empty() {
                rt.dom.remove_attribute(node, "style")?;
            } else {
                rt.dom.set_attribute(node, "style", &css)?;
            }
        }

        if prev.content != next.content {
            match &next.content {
                Some(Content::Text(text)) => rt.dom.set_text_content(node, text)?,
                Some(Content::DangerousHtml(html)) => rt.dom.set_inner_html(node, html)?,
                None => rt.dom.set_text_content(node, "")?,
            }
        }

        // Read first: writing an unchanged value resets the caret.
        if let Some(value) = &next.value {
            if rt.dom.value(node).as_deref() != Some(value.as_str()) {
                rt.dom.set_value(node, value)?;
            }
        }

        if let Some(top) = next.scroll_top {
            if prev.scroll_top != Some(top) {
                rt.dom.set_scroll_top(node, top)?;
            }
        }
        Ok(())
    }
}

impl Instance for Element {
    fn maker(&self) -> Maker {
        Maker::element(self.props.tag)
    }

    fn id(&self) -> Option<&IdPath> {
        self.id.as_ref()
    }

    fn dom_id(&self) -> Option<IdPath> {
        self.id.clone()
    }

    fn gen_markup(
        &mut self,
        rt: &mut Runtime,
        id: &IdPath,
        do_markup: bool,
        do_handlers: bool,
    ) -> Result<Option<Markup>> {
        self.props.validate(id)?;
        let first = claim_id(&mut self.id, id)?;
        if do_handlers {
            rt.listeners
                .register_all(id, self.props.listeners.iter().cloned());
        }
        let children = if first {
            let (children, markup) =
                ChildList::mount(rt, id, &self.props.children, do_markup, do_handlers)?;
            self.children = children;
            markup
        } else {
            self.children.regen(rt, id, do_markup, do_handlers)?
        };
        Ok(do_markup.then(|| self.props.markup(id, children)))
    }

    fn do_control(&mut self, rt: &mut Runtime, props: Props) -> Result<()> {
        let id = self.id.clone().ok_or(Error::ControlWithoutBackingDom {
            component: self.props.tag,
        })?;
        let next = downcast_props::<ElementProps>(props, ELEMENT)?;
        next.validate(&id)?;
        debug!(%id, tag = next.tag, "control");
        self.apply(rt, &id, &next)?;
        rt.listeners
            .register_all(&id, next.listeners.iter().cloned());
        let children = self.children.reconcile(rt, &id, &next.children);
        // The attributes and listeners of `next` are live even if a child failed.
        self.props = next;
        children
    }

    fn as_any(&self) -> &dyn core::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn core::any::Any {
        self
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("tag", &self.props.tag)
            .field("id", &self.id)
            .field("children", &self.children.len())
            .finish_non_exhaustive()
    }
}
