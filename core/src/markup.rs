//! Structural markup produced by `gen_markup`.
//!
//! Backends either materialise a [`Markup`] tree directly into live nodes or
//! serialise it with [`Markup::to_html`] for a string-based first paint.

use core::fmt::Write;

/// Content written into an element in place of child nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    /// Plain text, escaped on output.
    Text(String),
    /// Raw HTML. Only reachable through the explicit "dangerous" path.
    DangerousHtml(String),
}

/// Markup for a single element and its subtree.
///
/// Every generated node is an element carrying an id-path; text only ever
/// appears as [`Content`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Markup {
    /// DOM id; the string form of the owning id-path.
    pub id: String,
    /// Tag name.
    pub tag: &'static str,
    /// Attributes in output order.
    pub attributes: Vec<(String, String)>,
    /// Optional text or raw HTML content, emitted before children.
    pub content: Option<Content>,
    /// Child markup.
    pub children: Vec<Markup>,
}

const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

impl Markup {
    /// Returns the DOM id of the root node.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Serialises the tree into an HTML string.
    #[must_use]
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    fn write_html(&self, out: &mut String) {
        let _ = write!(out, "<{} id=\"", self.tag);
        escape_into(out, &self.id);
        out.push('"');
        for (name, value) in &self.attributes {
            let _ = write!(out, " {name}=\"");
            escape_into(out, value);
            out.push('"');
        }
        out.push('>');
        if VOID_TAGS.contains(&self.tag) {
            return;
        }
        match &self.content {
            Some(Content::Text(text)) => escape_into(out, text),
            Some(Content::DangerousHtml(html)) => out.push_str(html),
            None => {}
        }
        for child in &self.children {
            child.write_html(out);
        }
        let _ = write!(out, "</{}>", self.tag);
    }
}

fn escape_into(out: &mut String, raw: &str) {
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialises_nested_markup() {
        let markup = Markup {
            id: ".top".into(),
            tag: "div",
            attributes: vec![("class".into(), "a \"b\"".into())],
            content: Some(Content::Text("1 < 2".into())),
            children: vec![Markup {
                id: ".top.x".into(),
                tag: "input",
                attributes: vec![],
                content: None,
                children: vec![],
            }],
        };
        assert_eq!(
            markup.to_html(),
            "<div id=\".top\" class=\"a &quot;b&quot;\">1 &lt; 2<input id=\".top.x\"></div>"
        );
    }
}
