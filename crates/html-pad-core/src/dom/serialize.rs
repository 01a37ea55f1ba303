//! HTML serialization.
//!
//! Output is deterministic: attributes keep insertion order and the same
//! characters are always escaped, so serialized snapshots can be compared
//! as strings.

use super::{NodeId, NodeKind, Tree};

/// Elements that never have children or a closing tag.
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

pub fn is_void(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

fn escape_text(text: &str, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
}

fn escape_attribute(value: &str, out: &mut String) {
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
}

impl Tree {
    /// Serializes `id` including its own tag.
    pub fn outer_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_node(id, &mut out);
        out
    }

    /// Serializes the children of `id`.
    pub fn inner_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        for &child in self.child_nodes(id) {
            self.write_node(child, &mut out);
        }
        out
    }

    /// Serializes a run of sibling nodes back to back.
    pub fn nodes_html(&self, nodes: &[NodeId]) -> String {
        let mut out = String::new();
        for &node in nodes {
            self.write_node(node, &mut out);
        }
        out
    }

    /// Serializes only the start tag of an element.
    pub fn start_tag(&self, id: NodeId) -> String {
        let mut out = String::new();
        if let Some(NodeKind::Element { tag, attributes }) = self.kind(id) {
            write_start_tag(tag, attributes, &mut out);
        }
        out
    }

    fn write_node(&self, id: NodeId, out: &mut String) {
        match self.kind(id) {
            Some(NodeKind::Text(text)) => escape_text(text, out),
            Some(NodeKind::Element { tag, attributes }) => {
                write_start_tag(tag, attributes, out);
                if is_void(tag) {
                    return;
                }
                for &child in self.child_nodes(id) {
                    self.write_node(child, out);
                }
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
            }
            None => {}
        }
    }
}

fn write_start_tag(tag: &str, attributes: &[(String, String)], out: &mut String) {
    out.push('<');
    out.push_str(tag);
    for (name, value) in attributes {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        escape_attribute(value, out);
        out.push('"');
    }
    out.push('>');
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outer_and_inner_html() {
        let mut tree = Tree::new();
        let root = tree.root();
        let div = tree.create_element("div");
        tree.set_attribute(div, "class", "x").expect("attr");
        let text = tree.create_text("a");
        tree.append_child(div, text).expect("append");
        tree.append_child(root, div).expect("append");

        assert_eq!(tree.outer_html(div), "<div class=\"x\">a</div>");
        assert_eq!(tree.inner_html(root), "<div class=\"x\">a</div>");
        assert_eq!(tree.outer_html(root), "<body><div class=\"x\">a</div></body>");
    }

    #[test]
    fn test_escaping() {
        let mut tree = Tree::new();
        let root = tree.root();
        let span = tree.create_element("span");
        tree.set_attribute(span, "title", "\"a\" & <b>").expect("attr");
        let text = tree.create_text("1 < 2 & 3 > 2");
        tree.append_child(span, text).expect("append");
        tree.append_child(root, span).expect("append");

        assert_eq!(
            tree.outer_html(span),
            "<span title=\"&quot;a&quot; &amp; &lt;b&gt;\">1 &lt; 2 &amp; 3 &gt; 2</span>"
        );
    }

    #[test]
    fn test_void_elements_have_no_end_tag() {
        let mut tree = Tree::new();
        let br = tree.create_element("br");
        assert_eq!(tree.outer_html(br), "<br>");
        assert!(is_void("img"));
        assert!(!is_void("div"));
    }

    #[test]
    fn test_start_tag() {
        let mut tree = Tree::new();
        let root = tree.root();
        tree.set_attribute(root, "data-selection", "anchorElem=[] anchorOffset=0")
            .expect("attr");
        assert_eq!(
            tree.start_tag(root),
            "<body data-selection=\"anchorElem=[] anchorOffset=0\">"
        );
    }
}
