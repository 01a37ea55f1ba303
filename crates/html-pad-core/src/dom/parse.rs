//! Fragment parser for the HTML the editor itself produces.
//!
//! Handles start/end tags, quoted and bare attributes, void elements,
//! comments, declarations and a small entity set. It is not an HTML5 tree
//! builder: mismatched end tags are errors and unclosed elements are closed
//! at the end of input.

use super::serialize::is_void;
use super::{NodeId, Tree};
use crate::error::{EditorError, Result};

/// Decodes `&amp; &lt; &gt; &quot; &apos; &#39; &nbsp;` and well-formed
/// numeric references. Anything else passes through unchanged.
pub fn decode_entities(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let decoded = rest
            .find(';')
            .filter(|&semi| semi <= 10)
            .and_then(|semi| decode_entity(&rest[1..semi]).map(|ch| (ch, semi)));
        match decoded {
            Some((ch, semi)) => {
                out.push(ch);
                rest = &rest[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => {
            let digits = name.strip_prefix('#')?;
            let code = match digits.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => digits.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn error(&self, message: impl Into<String>) -> EditorError {
        EditorError::Parse {
            position: self.pos,
            message: message.into(),
        }
    }

    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let rest = self.rest();
        let end = rest.find(|c: char| !pred(c)).unwrap_or(rest.len());
        self.pos += end;
        &rest[..end]
    }

    /// Skips past `terminator`, or to the end of input.
    fn skip_past(&mut self, terminator: &str) {
        match self.rest().find(terminator) {
            Some(index) => self.pos += index + terminator.len(),
            None => self.pos = self.input.len(),
        }
    }

    fn name(&mut self) -> &'a str {
        self.take_while(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == ':')
    }

    fn attribute_value(&mut self) -> Result<String> {
        let quote = self.rest().chars().next();
        match quote {
            Some(q @ ('"' | '\'')) => {
                self.pos += 1;
                let rest = self.rest();
                let end = rest
                    .find(q)
                    .ok_or_else(|| self.error("unterminated attribute value"))?;
                self.pos += end + 1;
                Ok(decode_entities(&rest[..end]))
            }
            _ => {
                let raw = self.take_while(|c| !c.is_whitespace() && c != '>');
                Ok(decode_entities(raw.trim_end_matches('/')))
            }
        }
    }

    /// Parses a start tag after its `<`. Returns the tag name, attributes
    /// and whether it was written self-closing.
    fn start_tag(&mut self) -> Result<(String, Vec<(String, String)>, bool)> {
        let tag = self.name().to_ascii_lowercase();
        let mut attributes: Vec<(String, String)> = Vec::new();
        loop {
            self.skip_whitespace();
            let rest = self.rest();
            if rest.is_empty() {
                return Err(self.error(format!("unterminated <{tag}> tag")));
            }
            if let Some(after) = rest.strip_prefix("/>") {
                self.pos = self.input.len() - after.len();
                return Ok((tag, attributes, true));
            }
            if rest.starts_with('>') {
                self.pos += 1;
                return Ok((tag, attributes, false));
            }
            let name = self.name().to_ascii_lowercase();
            if name.is_empty() {
                return Err(self.error(format!("malformed attribute in <{tag}>")));
            }
            self.skip_whitespace();
            let value = if self.rest().starts_with('=') {
                self.pos += 1;
                self.skip_whitespace();
                self.attribute_value()?
            } else {
                String::new()
            };
            if !attributes.iter().any(|(key, _)| *key == name) {
                attributes.push((name, value));
            }
        }
    }
}

impl Tree {
    /// Parses an HTML fragment into detached nodes, returned in order.
    ///
    /// # Errors
    ///
    /// Returns `EditorError::Parse` for malformed tags or an end tag that
    /// does not match the innermost open element.
    pub fn parse_fragment(&mut self, html: &str) -> Result<Vec<NodeId>> {
        let mut parser = Parser {
            input: html,
            pos: 0,
        };
        let mut top_level = Vec::new();
        let mut open: Vec<NodeId> = Vec::new();

        while parser.pos < html.len() {
            let rest = parser.rest();
            if rest.starts_with("<!--") {
                parser.skip_past("-->");
            } else if rest.starts_with("<!") || rest.starts_with("<?") {
                parser.skip_past(">");
            } else if let Some(after) = rest.strip_prefix("</") {
                if !after.starts_with(|c: char| c.is_ascii_alphabetic()) {
                    return Err(parser.error("malformed end tag"));
                }
                parser.pos += 2;
                let name = parser.name().to_ascii_lowercase();
                parser.skip_whitespace();
                if !parser.rest().starts_with('>') {
                    return Err(parser.error(format!("unterminated </{name}> tag")));
                }
                parser.pos += 1;
                if is_void(&name) {
                    continue;
                }
                match open.last() {
                    Some(&node) if self.tag(node) == Some(name.as_str()) => {
                        open.pop();
                    }
                    _ => return Err(parser.error(format!("unexpected </{name}>"))),
                }
            } else if rest.starts_with('<')
                && rest[1..].starts_with(|c: char| c.is_ascii_alphabetic())
            {
                parser.pos += 1;
                let (tag, attributes, self_closing) = parser.start_tag()?;
                let element = self.create_element(&tag);
                for (name, value) in &attributes {
                    self.set_attribute(element, name, value)?;
                }
                self.attach(element, open.last().copied(), &mut top_level)?;
                if !self_closing && !is_void(&tag) {
                    open.push(element);
                }
            } else {
                // Text runs up to the next tag-like '<'
                let skip = usize::from(rest.starts_with('<'));
                let end = rest[skip..]
                    .find('<')
                    .map_or(rest.len(), |index| index + skip);
                parser.pos += end;
                let text = self.create_text(&decode_entities(&rest[..end]));
                self.attach(text, open.last().copied(), &mut top_level)?;
            }
        }
        Ok(top_level)
    }

    fn attach(
        &mut self,
        node: NodeId,
        parent: Option<NodeId>,
        top_level: &mut Vec<NodeId>,
    ) -> Result<()> {
        match parent {
            Some(parent) => self.append_child(parent, node),
            None => {
                top_level.push(node);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(html: &str) -> String {
        let mut tree = Tree::new();
        let nodes = tree.parse_fragment(html).expect("parse");
        tree.nodes_html(&nodes)
    }

    #[test]
    fn test_decode_entities() {
        assert_eq!(decode_entities("a &amp; b"), "a & b");
        assert_eq!(decode_entities("&lt;p&gt;"), "<p>");
        assert_eq!(decode_entities("&#65;&#x42;"), "AB");
        assert_eq!(decode_entities("&nbsp;"), "\u{a0}");
        assert_eq!(decode_entities("&unknown; & &amp"), "&unknown; & &amp");
    }

    #[test]
    fn test_parse_simple_fragment() {
        assert_eq!(round_trip("<div>a</div><p>b</p>"), "<div>a</div><p>b</p>");
    }

    #[test]
    fn test_parse_normalizes_case_and_quotes() {
        assert_eq!(
            round_trip("<DIV Align='center' hidden>x</div>"),
            "<div align=\"center\" hidden=\"\">x</div>"
        );
    }

    #[test]
    fn test_parse_void_and_self_closing() {
        assert_eq!(
            round_trip("<p>a<br>b<img src=x.png/></p>"),
            "<p>a<br>b<img src=\"x.png\"></p>"
        );
        assert_eq!(round_trip("<span/>tail"), "<span></span>tail");
    }

    #[test]
    fn test_parse_skips_comments_and_declarations() {
        assert_eq!(round_trip("<!DOCTYPE html><!-- note --><p>x</p>"), "<p>x</p>");
    }

    #[test]
    fn test_parse_text_with_stray_angle_bracket() {
        let mut tree = Tree::new();
        let nodes = tree.parse_fragment("1 < 2").expect("parse");
        assert_eq!(nodes.len(), 1);
        assert_eq!(tree.text(nodes[0]), Some("1 < 2"));
    }

    #[test]
    fn test_parse_closes_unclosed_elements() {
        assert_eq!(round_trip("<div><b>x"), "<div><b>x</b></div>");
    }

    #[test]
    fn test_parse_rejects_mismatched_end_tag() {
        let mut tree = Tree::new();
        let err = tree.parse_fragment("<div><b>x</div>").unwrap_err();
        assert!(matches!(err, EditorError::Parse { .. }));
    }

    #[test]
    fn test_parsed_nodes_are_detached() {
        let mut tree = Tree::new();
        let nodes = tree.parse_fragment("<p>a</p>").expect("parse");
        assert!(tree.is_alive(nodes[0]));
        assert!(!tree.is_attached(nodes[0]));
        assert!(tree.child_nodes(tree.root()).is_empty());
    }
}
