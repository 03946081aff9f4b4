//! Tolerant HTML fragment parser.
//!
//! This is the "native parser" of the in-memory host: the precompiler feeds
//! it concatenated skeletons and `dangerously-set-inner-html` feeds it raw
//! markup. It never fails; malformed input degrades the way a browser would
//! degrade it (unmatched end tags are dropped, open elements are closed at the
//! end of input, a stray `<` is text).

use crate::error::NodeError;
use crate::host::{HostTree, NodeId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkupNode {
    Element(MarkupElement),
    Text(String),
    Comment(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MarkupElement {
    pub tag: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<MarkupNode>,
}

impl MarkupElement {
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

pub fn is_void_element(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

pub fn parse_fragment(input: &str) -> Vec<MarkupNode> {
    let mut parser = Parser {
        input,
        pos: 0,
        open: Vec::new(),
        roots: Vec::new(),
    };
    parser.run();
    parser.roots
}

/// Builds `nodes` into `tree` as the trailing children of `parent`.
pub fn build_into(
    tree: &mut dyn HostTree,
    parent: NodeId,
    nodes: &[MarkupNode],
) -> Result<(), NodeError> {
    for node in nodes {
        let id = match node {
            MarkupNode::Element(element) => {
                let id = tree.create_element(&element.tag);
                for (name, value) in &element.attributes {
                    tree.set_attribute(id, name, value)?;
                }
                build_into(tree, id, &element.children)?;
                id
            }
            MarkupNode::Text(text) => tree.create_text(text),
            MarkupNode::Comment(text) => tree.create_comment(text),
        };
        tree.append_child(parent, id)?;
    }
    Ok(())
}

/// Replaces the children of `node` with the parsed `source`.
pub fn set_inner_markup(
    tree: &mut dyn HostTree,
    node: NodeId,
    source: &str,
) -> Result<(), NodeError> {
    tree.clear_children(node)?;
    build_into(tree, node, &parse_fragment(source))
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
    open: Vec<MarkupElement>,
    roots: Vec<MarkupNode>,
}

impl<'a> Parser<'a> {
    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn run(&mut self) {
        while self.pos < self.input.len() {
            let rest = self.rest();
            if rest.starts_with("<!--") {
                self.comment();
            } else if rest.starts_with("</") {
                self.end_tag();
            } else if rest.starts_with("<!") || rest.starts_with("<?") {
                self.skip_declaration();
            } else if rest.starts_with('<')
                && rest[1..].chars().next().is_some_and(char::is_alphabetic)
            {
                self.start_tag();
            } else {
                self.text();
            }
        }
        while let Some(element) = self.open.pop() {
            self.push(MarkupNode::Element(element));
        }
    }

    fn push(&mut self, node: MarkupNode) {
        match self.open.last_mut() {
            Some(parent) => parent.children.push(node),
            None => self.roots.push(node),
        }
    }

    fn text(&mut self) {
        let start = self.pos;
        // Always consume at least one char so a stray '<' becomes text.
        self.bump();
        while let Some(ch) = self.peek() {
            if ch == '<' && self.starts_markup() {
                break;
            }
            self.bump();
        }
        let text = decode_entities(&self.input[start..self.pos]);
        if let Some(MarkupNode::Text(previous)) = self.last_sibling_mut() {
            previous.push_str(&text);
        } else {
            self.push(MarkupNode::Text(text));
        }
    }

    fn last_sibling_mut(&mut self) -> Option<&mut MarkupNode> {
        match self.open.last_mut() {
            Some(parent) => parent.children.last_mut(),
            None => self.roots.last_mut(),
        }
    }

    fn starts_markup(&self) -> bool {
        let rest = self.rest();
        rest.starts_with("</")
            || rest.starts_with("<!")
            || rest.starts_with("<?")
            || rest[1..].chars().next().is_some_and(char::is_alphabetic)
    }

    fn comment(&mut self) {
        let body_start = self.pos + 4;
        let (body, next) = match self.input[body_start..].find("-->") {
            Some(end) => (
                &self.input[body_start..body_start + end],
                body_start + end + 3,
            ),
            None => (&self.input[body_start..], self.input.len()),
        };
        let node = MarkupNode::Comment(body.to_string());
        self.pos = next;
        self.push(node);
    }

    fn skip_declaration(&mut self) {
        self.pos = match self.rest().find('>') {
            Some(end) => self.pos + end + 1,
            None => self.input.len(),
        };
    }

    fn tag_name(&mut self) -> String {
        let start = self.pos;
        while let Some(ch) = self.peek() {
            if ch.is_whitespace() || ch == '/' || ch == '>' {
                break;
            }
            self.bump();
        }
        self.input[start..self.pos].to_ascii_lowercase()
    }

    fn end_tag(&mut self) {
        self.pos += 2;
        let name = self.tag_name();
        self.skip_declaration();
        if name.is_empty() {
            return;
        }
        if let Some(index) = self.open.iter().rposition(|el| el.tag == name) {
            while self.open.len() > index {
                if let Some(element) = self.open.pop() {
                    self.push(MarkupNode::Element(element));
                }
            }
        }
    }

    fn start_tag(&mut self) {
        self.pos += 1;
        let mut element = MarkupElement {
            tag: self.tag_name(),
            ..MarkupElement::default()
        };
        let mut self_closing = false;
        loop {
            self.skip_whitespace();
            let rest = self.rest();
            if rest.is_empty() {
                break;
            }
            if rest.starts_with('>') {
                self.pos += 1;
                break;
            }
            if rest.starts_with("/>") {
                self.pos += 2;
                self_closing = true;
                break;
            }
            if rest.starts_with('/') {
                self.pos += 1;
                continue;
            }
            let (name, value) = self.attribute();
            if !name.is_empty() && !element.attributes.iter().any(|(n, _)| *n == name) {
                element.attributes.push((name, value));
            }
        }

        let tag = element.tag.clone();
        if self_closing || is_void_element(&tag) {
            self.push(MarkupNode::Element(element));
        } else if RAW_TEXT_ELEMENTS.contains(&tag.as_str()) {
            let closing = format!("</{tag}");
            let rest = self.rest();
            let end = rest.to_ascii_lowercase().find(&closing).unwrap_or(rest.len());
            if end > 0 {
                element
                    .children
                    .push(MarkupNode::Text(rest[..end].to_string()));
            }
            self.pos += end;
            self.skip_declaration();
            self.push(MarkupNode::Element(element));
        } else {
            self.open.push(element);
        }
    }

    fn attribute(&mut self) -> (String, String) {
        let start = self.pos;
        while let Some(ch) = self.peek() {
            if ch.is_whitespace() || ch == '=' || ch == '>' || self.rest().starts_with("/>") {
                break;
            }
            self.bump();
        }
        let name = self.input[start..self.pos].to_ascii_lowercase();
        if name.is_empty() {
            // Lone '=' or similar junk.
            self.bump();
            return (name, String::new());
        }
        self.skip_whitespace();
        if self.peek() != Some('=') {
            return (name, String::new());
        }
        self.bump();
        self.skip_whitespace();
        let raw = match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.bump();
                let start = self.pos;
                let end = self.rest().find(quote).map_or(self.input.len(), |i| start + i);
                self.pos = (end + 1).min(self.input.len());
                &self.input[start..end]
            }
            _ => {
                let start = self.pos;
                while let Some(ch) = self.peek() {
                    if ch.is_whitespace() || ch == '>' {
                        break;
                    }
                    self.bump();
                }
                &self.input[start..self.pos]
            }
        };
        (name, decode_entities(raw))
    }
}

fn decode_entities(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_string();
    }
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let decoded = rest
            .find(';')
            .filter(|end| *end <= 10)
            .and_then(|end| decode_entity(&rest[1..end]).map(|ch| (ch, end)));
        match decoded {
            Some((ch, end)) => {
                out.push(ch);
                rest = &rest[end + 1..];
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
            let code = name.strip_prefix('#')?;
            let hex = code.strip_prefix('x').or_else(|| code.strip_prefix('X'));
            let value = match hex {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => code.parse().ok()?,
            };
            char::from_u32(value)
        }
    }
}

pub(crate) fn escape_text(text: &str, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
}

pub(crate) fn escape_attribute(text: &str, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(node: &MarkupNode) -> &MarkupElement {
        match node {
            MarkupNode::Element(el) => el,
            other => panic!("expected element, got {other:?}"),
        }
    }

    #[test]
    fn parses_nested_elements_and_attributes() {
        let nodes = parse_fragment(r#"<DIV Class="a b" hidden data-x='1'><span>hi</span></div>"#);
        assert_eq!(nodes.len(), 1);
        let div = element(&nodes[0]);
        assert_eq!(div.tag, "div");
        assert_eq!(
            div.attributes,
            vec![
                ("class".to_string(), "a b".to_string()),
                ("hidden".to_string(), String::new()),
                ("data-x".to_string(), "1".to_string()),
            ]
        );
        let span = element(&div.children[0]);
        assert_eq!(span.children, vec![MarkupNode::Text("hi".into())]);
    }

    #[test]
    fn void_and_self_closing_elements_have_no_children() {
        let nodes = parse_fragment("<p><br>text<img src=x.png/><custom /></p>");
        let p = element(&nodes[0]);
        assert_eq!(p.children.len(), 4);
        assert_eq!(element(&p.children[0]).tag, "br");
        assert_eq!(p.children[1], MarkupNode::Text("text".into()));
        assert_eq!(element(&p.children[2]).attribute("src"), Some("x.png/"));
        assert_eq!(element(&p.children[3]).tag, "custom");
    }

    #[test]
    fn end_tags_close_nearest_match_and_strays_are_dropped() {
        let nodes = parse_fragment("<ul><li>a<li>b</ul></em>tail");
        assert_eq!(nodes.len(), 2);
        let ul = element(&nodes[0]);
        let first = element(&ul.children[0]);
        // The second <li> nests inside the first: no implied end tags.
        assert_eq!(first.children.len(), 2);
        assert_eq!(nodes[1], MarkupNode::Text("tail".into()));
    }

    #[test]
    fn comments_entities_and_stray_brackets() {
        let nodes = parse_fragment("a &lt; b &amp;&#65;&#x42; <!-- note --> 1 < 2");
        assert_eq!(
            nodes,
            vec![
                MarkupNode::Text("a < b &AB ".into()),
                MarkupNode::Comment(" note ".into()),
                MarkupNode::Text(" 1 < 2".into()),
            ]
        );
    }

    #[test]
    fn duplicate_attributes_keep_the_first() {
        let nodes = parse_fragment(r#"<a title="one" title="two"></a>"#);
        assert_eq!(element(&nodes[0]).attributes.len(), 1);
        assert_eq!(element(&nodes[0]).attribute("title"), Some("one"));
    }

    #[test]
    fn raw_text_elements_keep_markup_verbatim() {
        let nodes = parse_fragment("<style>a > b { color: red }</style><i></i>");
        let style = element(&nodes[0]);
        assert_eq!(
            style.children,
            vec![MarkupNode::Text("a > b { color: red }".into())]
        );
        assert_eq!(element(&nodes[1]).tag, "i");
    }

    #[test]
    fn unclosed_elements_close_at_end_of_input() {
        let nodes = parse_fragment("<div><span>open");
        let div = element(&nodes[0]);
        let span = element(&div.children[0]);
        assert_eq!(span.children, vec![MarkupNode::Text("open".into())]);
    }
}
