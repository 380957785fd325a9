//! In-memory [`Dom`] used by headless hosts and tests.
//!
//! Every physical mutation is recorded as a [`Mutation`], which makes the
//! amount of DOM work a reconciliation pass performs directly observable.
//! Slots of removed nodes go on a free list and are reused by later inserts,
//! so a long-running headless host does not grow the arena without bound.

use core::any::Any;
use std::collections::{BTreeMap, HashMap};

use super::Dom;
use crate::{
    Error, Result,
    markup::{Content, Markup},
};

/// A recorded physical DOM mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    /// A new subtree was attached; `id` is its root id.
    Insert {
        /// Parent id.
        parent: String,
        /// Root id of the inserted subtree.
        id: String,
    },
    /// An existing node was repositioned.
    Move {
        /// Node id.
        id: String,
        /// Sibling it now follows.
        after: Option<String>,
    },
    /// A node was swapped for a new subtree.
    Replace {
        /// Removed node id.
        old: String,
        /// Root id of the replacement.
        new: String,
    },
    /// A subtree was removed.
    Remove {
        /// Node id.
        id: String,
    },
    /// An attribute was written or removed.
    Attribute {
        /// Node id.
        id: String,
        /// Attribute name.
        name: String,
    },
    /// Text or HTML content was replaced.
    Content {
        /// Node id.
        id: String,
    },
    /// A `value` property was written.
    Value {
        /// Node id.
        id: String,
    },
    /// `scrollTop` was written.
    ScrollTop {
        /// Node id.
        id: String,
    },
}

#[derive(Debug, Default)]
struct Node {
    id: Option<String>,
    attributes: BTreeMap<String, String>,
    content: Option<Content>,
    value: Option<String>,
    scroll_top: f64,
    parent: Option<usize>,
    children: Vec<usize>,
}

/// A DOM tree held entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryDom {
    nodes: Vec<Node>,
    free: Vec<usize>,
    by_id: HashMap<String, usize>,
    mutations: Vec<Mutation>,
}

impl MemoryDom {
    /// Creates an empty document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a document holding one `div` container with the given id.
    #[must_use]
    pub fn with_container(id: &str) -> Self {
        let mut dom = Self::new();
        dom.add_container(id);
        dom
    }

    /// Adds a detached `div` container that roots can be mounted into.
    pub fn add_container(&mut self, id: &str) {
        let index = self.push(Node {
            id: Some(id.to_owned()),
            ..Node::default()
        });
        self.by_id.insert(id.to_owned(), index);
    }

    /// Mutations recorded so far.
    #[must_use]
    pub fn mutations(&self) -> &[Mutation] {
        &self.mutations
    }

    /// Drains the mutation log.
    pub fn take_mutations(&mut self) -> Vec<Mutation> {
        core::mem::take(&mut self.mutations)
    }

    /// Returns `true` if a live node carries `id`.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    /// Ids of the element children of `id`, in document order.
    #[must_use]
    pub fn child_ids(&self, id: &str) -> Vec<String> {
        self.by_id.get(id).map_or_else(Vec::new, |&index| {
            self.nodes[index]
                .children
                .iter()
                .filter_map(|&child| self.nodes[child].id.clone())
                .collect()
        })
    }

    /// Reads an attribute.
    #[must_use]
    pub fn attribute(&self, id: &str, name: &str) -> Option<&str> {
        let index = *self.by_id.get(id)?;
        self.nodes[index].attributes.get(name).map(String::as_str)
    }

    /// Reads the text content set on an element.
    #[must_use]
    pub fn text(&self, id: &str) -> Option<&str> {
        let index = *self.by_id.get(id)?;
        match &self.nodes[index].content {
            Some(Content::Text(text)) => Some(text),
            _ => None,
        }
    }

    /// Reads the raw HTML set on an element.
    #[must_use]
    pub fn inner_html(&self, id: &str) -> Option<&str> {
        let index = *self.by_id.get(id)?;
        match &self.nodes[index].content {
            Some(Content::DangerousHtml(html)) => Some(html),
            _ => None,
        }
    }

    /// Reads `scrollTop`.
    #[must_use]
    pub fn scroll_top(&self, id: &str) -> Option<f64> {
        self.by_id.get(id).map(|&index| self.nodes[index].scroll_top)
    }

    /// Simulates the user editing a form control. Not recorded as a mutation.
    pub fn type_value(&mut self, id: &str, value: &str) {
        if let Some(&index) = self.by_id.get(id) {
            self.nodes[index].value = Some(value.to_owned());
        }
    }

    /// Number of node slots currently in use, containers included.
    #[must_use]
    pub fn live_nodes(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    fn push(&mut self, node: Node) -> usize {
        if let Some(index) = self.free.pop() {
            self.nodes[index] = node;
            return index;
        }
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    fn lookup(&self, id: &str) -> Result<usize> {
        self.by_id
            .get(id)
            .copied()
            .ok_or_else(|| Error::dom(format!("no element with id `{id}`")))
    }

    fn build(&mut self, markup: &Markup) -> Result<usize> {
        if self.by_id.contains_key(&markup.id) {
            return Err(Error::dom(format!("duplicate element id `{}`", markup.id)));
        }
        let value = markup
            .attributes
            .iter()
            .find(|(name, _)| name == "value")
            .map(|(_, value)| value.clone());
        let index = self.push(Node {
            id: Some(markup.id.clone()),
            attributes: markup.attributes.iter().cloned().collect(),
            content: markup.content.clone(),
            value,
            ..Node::default()
        });
        self.by_id.insert(markup.id.clone(), index);
        for child in &markup.children {
            let child = self.build(child)?;
            self.attach(index, child, None);
        }
        Ok(index)
    }

    /// Attaches `child` to `parent` at `position`, appending when `None`.
    fn attach(&mut self, parent: usize, child: usize, position: Option<usize>) {
        let children = &mut self.nodes[parent].children;
        match position {
            Some(position) => children.insert(position, child),
            None => children.push(child),
        }
        self.nodes[child].parent = Some(parent);
    }

    fn detach(&mut self, child: usize) -> Option<usize> {
        let parent = self.nodes[child].parent.take()?;
        self.nodes[parent].children.retain(|&c| c != child);
        Some(parent)
    }

    fn position_after(&self, parent: usize, after: Option<&str>) -> Result<usize> {
        let Some(after) = after else {
            return Ok(0);
        };
        let after = self.lookup(after)?;
        self.nodes[parent]
            .children
            .iter()
            .position(|&c| c == after)
            .map(|position| position + 1)
            .ok_or_else(|| Error::dom("reference node is not a child of the parent"))
    }

    /// Forgets a detached subtree and returns its slots to the free list.
    fn forget_subtree(&mut self, index: usize) {
        let node = core::mem::take(&mut self.nodes[index]);
        if let Some(id) = node.id {
            self.by_id.remove(&id);
        }
        for child in node.children {
            self.forget_subtree(child);
        }
        self.free.push(index);
    }
}

impl Dom for MemoryDom {
    fn append(&mut self, parent: &str, markup: &Markup) -> Result<()> {
        let parent_index = self.lookup(parent)?;
        let node = self.build(markup)?;
        self.attach(parent_index, node, None);
        self.mutations.push(Mutation::Insert {
            parent: parent.to_owned(),
            id: markup.id().to_owned(),
        });
        Ok(())
    }

    fn insert_after(&mut self, parent: &str, after: Option<&str>, markup: &Markup) -> Result<()> {
        let parent_index = self.lookup(parent)?;
        let position = self.position_after(parent_index, after)?;
        let node = self.build(markup)?;
        self.attach(parent_index, node, Some(position));
        self.mutations.push(Mutation::Insert {
            parent: parent.to_owned(),
            id: markup.id().to_owned(),
        });
        Ok(())
    }

    fn move_after(&mut self, parent: &str, node: &str, after: Option<&str>) -> Result<()> {
        let parent_index = self.lookup(parent)?;
        let node_index = self.lookup(node)?;
        self.detach(node_index);
        let position = self.position_after(parent_index, after)?;
        self.attach(parent_index, node_index, Some(position));
        self.mutations.push(Mutation::Move {
            id: node.to_owned(),
            after: after.map(str::to_owned),
        });
        Ok(())
    }

    fn previous_sibling_id(&self, node: &str) -> Option<String> {
        let index = *self.by_id.get(node)?;
        let parent = self.nodes[index].parent?;
        let siblings = &self.nodes[parent].children;
        let position = siblings.iter().position(|&c| c == index)?;
        siblings[..position]
            .last()
            .and_then(|&c| self.nodes[c].id.clone())
    }

    fn replace(&mut self, old: &str, markup: &Markup) -> Result<()> {
        let old_index = self.lookup(old)?;
        let parent = self.nodes[old_index]
            .parent
            .ok_or_else(|| Error::dom(format!("`{old}` is detached")))?;
        let position = self.nodes[parent]
            .children
            .iter()
            .position(|&c| c == old_index);
        self.detach(old_index);
        self.forget_subtree(old_index);
        let node = self.build(markup)?;
        self.attach(parent, node, position);
        self.mutations.push(Mutation::Replace {
            old: old.to_owned(),
            new: markup.id().to_owned(),
        });
        Ok(())
    }

    fn remove(&mut self, node: &str) -> Result<bool> {
        let Some(&index) = self.by_id.get(node) else {
            return Ok(false);
        };
        self.detach(index);
        self.forget_subtree(index);
        self.mutations.push(Mutation::Remove {
            id: node.to_owned(),
        });
        Ok(true)
    }

    fn set_attribute(&mut self, node: &str, name: &str, value: &str) -> Result<()> {
        let index = self.lookup(node)?;
        self.nodes[index]
            .attributes
            .insert(name.to_owned(), value.to_owned());
        self.mutations.push(Mutation::Attribute {
            id: node.to_owned(),
            name: name.to_owned(),
        });
        Ok(())
    }

    fn remove_attribute(&mut self, node: &str, name: &str) -> Result<()> {
        let index = self.lookup(node)?;
        self.nodes[index].attributes.remove(name);
        self.mutations.push(Mutation::Attribute {
            id: node.to_owned(),
            name: name.to_owned(),
        });
        Ok(())
    }

    fn set_text_content(&mut self, node: &str, text: &str) -> Result<()> {
        let index = self.lookup(node)?;
        self.nodes[index].content = Some(Content::Text(text.to_owned()));
        self.mutations.push(Mutation::Content {
            id: node.to_owned(),
        });
        Ok(())
    }

    fn set_inner_html(&mut self, node: &str, html: &str) -> Result<()> {
        let index = self.lookup(node)?;
        self.nodes[index].content = Some(Content::DangerousHtml(html.to_owned()));
        self.mutations.push(Mutation::Content {
            id: node.to_owned(),
        });
        Ok(())
    }

    fn value(&self, node: &str) -> Option<String> {
        let index = *self.by_id.get(node)?;
        self.nodes[index].value.clone()
    }

    fn set_value(&mut self, node: &str, value: &str) -> Result<()> {
        let index = self.lookup(node)?;
        self.nodes[index].value = Some(value.to_owned());
        self.mutations.push(Mutation::Value {
            id: node.to_owned(),
        });
        Ok(())
    }

    fn set_scroll_top(&mut self, node: &str, top: f64) -> Result<()> {
        let index = self.lookup(node)?;
        self.nodes[index].scroll_top = top;
        self.mutations.push(Mutation::ScrollTop {
            id: node.to_owned(),
        });
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn div(id: &str) -> Markup {
        Markup {
            id: id.into(),
            tag: "div",
            attributes: Vec::new(),
            content: None,
            children: Vec::new(),
        }
    }

    #[test]
    fn positional_inserts_and_moves() {
        let mut dom = MemoryDom::with_container("app");
        dom.append("app", &div("a")).unwrap();
        dom.insert_after("app", Some("a"), &div("c")).unwrap();
        dom.insert_after("app", Some("a"), &div("b")).unwrap();
        assert_eq!(dom.child_ids("app"), ["a", "b", "c"]);

        dom.move_after("app", "c", None).unwrap();
        assert_eq!(dom.child_ids("app"), ["c", "a", "b"]);
        assert_eq!(dom.previous_sibling_id("a").as_deref(), Some("c"));
        assert_eq!(dom.previous_sibling_id("c"), None);
    }

    #[test]
    fn removing_forgets_the_subtree() {
        let mut dom = MemoryDom::with_container("app");
        let mut outer = div("outer");
        outer.children.push(div("inner"));
        dom.append("app", &outer).unwrap();
        assert!(dom.contains("inner"));
        assert!(dom.remove("outer").unwrap());
        assert!(!dom.contains("inner"));
        assert!(!dom.remove("outer").unwrap());
    }

    #[test]
    fn removed_slots_are_reused() {
        let mut dom = MemoryDom::with_container("app");
        for round in 0..50 {
            let mut outer = div(&format!("outer{round}"));
            outer.children.push(div(&format!("inner{round}")));
            dom.append("app", &outer).unwrap();
            assert!(dom.remove(&format!("outer{round}")).unwrap());
        }
        assert_eq!(dom.live_nodes(), 1);
        assert!(dom.nodes.len() <= 3);
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut dom = MemoryDom::with_container("app");
        dom.append("app", &div("a")).unwrap();
        assert!(dom.append("app", &div("a")).is_err());
    }
}
