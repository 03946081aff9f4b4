use std::fmt::Write as _;

use super::{HostTree, NodeId, NodeKind};
use crate::collections::map::HashMap;
use crate::error::NodeError;
use crate::markup::{escape_attribute, escape_text, is_void_element};
use crate::value::Value;

enum NodeData {
    Element { tag: String },
    Text(String),
    Comment(String),
    Fragment,
}

struct MemoryNode {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    attributes: Vec<(String, String)>,
    properties: HashMap<String, Value>,
}

impl MemoryNode {
    fn new(data: NodeData) -> Self {
        Self {
            data,
            parent: None,
            children: Vec::new(),
            attributes: Vec::new(),
            properties: HashMap::default(),
        }
    }

    fn kind(&self) -> NodeKind {
        match self.data {
            NodeData::Element { .. } => NodeKind::Element,
            NodeData::Text(_) => NodeKind::Text,
            NodeData::Comment(_) => NodeKind::Comment,
            NodeData::Fragment => NodeKind::Fragment,
        }
    }
}

/// Arena-backed host tree. Nodes are never freed; a detached node simply has
/// no parent. Released fragments are recycled once emptied. Every mutating
/// call bumps a counter so that tests can assert how much work a render did.
#[derive(Default)]
pub struct MemoryTree {
    nodes: Vec<MemoryNode>,
    released: Vec<NodeId>,
    mutations: usize,
}

impl MemoryTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Mutating calls since creation or the last [`reset_mutations`].
    ///
    /// [`reset_mutations`]: MemoryTree::reset_mutations
    pub fn mutation_count(&self) -> usize {
        self.mutations
    }

    pub fn reset_mutations(&mut self) {
        self.mutations = 0;
    }

    fn node(&self, id: NodeId) -> Result<&MemoryNode, NodeError> {
        self.nodes.get(id.0).ok_or(NodeError::Missing { id })
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut MemoryNode, NodeError> {
        self.nodes.get_mut(id.0).ok_or(NodeError::Missing { id })
    }

    fn element(&self, id: NodeId) -> Result<&MemoryNode, NodeError> {
        let node = self.node(id)?;
        match node.data {
            NodeData::Element { .. } => Ok(node),
            _ => Err(NodeError::NotAnElement { id }),
        }
    }

    fn element_mut(&mut self, id: NodeId) -> Result<&mut MemoryNode, NodeError> {
        let node = self.node_mut(id)?;
        match node.data {
            NodeData::Element { .. } => Ok(node),
            _ => Err(NodeError::NotAnElement { id }),
        }
    }

    fn push(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(MemoryNode::new(data));
        self.mutations += 1;
        id
    }

    fn unlink(&mut self, child: NodeId) -> Result<(), NodeError> {
        if let Some(parent) = self.node(child)?.parent {
            self.node_mut(parent)?.children.retain(|id| *id != child);
            self.node_mut(child)?.parent = None;
        }
        Ok(())
    }

    /// Nodes to insert for `child`: a fragment contributes its children.
    fn take_insertable(&mut self, child: NodeId) -> Result<Vec<NodeId>, NodeError> {
        if matches!(self.node(child)?.data, NodeData::Fragment) {
            let moved = std::mem::take(&mut self.node_mut(child)?.children);
            for id in &moved {
                self.node_mut(*id)?.parent = None;
            }
            Ok(moved)
        } else {
            self.unlink(child)?;
            Ok(vec![child])
        }
    }

    fn ensure_not_ancestor(&self, parent: NodeId, child: NodeId) -> Result<(), NodeError> {
        let mut cursor = Some(parent);
        while let Some(id) = cursor {
            if id == child {
                return Err(NodeError::Cycle { id: child });
            }
            cursor = self.node(id)?.parent;
        }
        Ok(())
    }

    /// Serialized node including its own tag.
    pub fn outer_markup(&self, id: NodeId) -> Result<String, NodeError> {
        let mut out = String::new();
        self.write_node(id, false, &mut out)?;
        Ok(out)
    }

    /// Serialized children of a node.
    pub fn inner_markup(&self, id: NodeId) -> Result<String, NodeError> {
        let node = self.node(id)?;
        let raw = matches!(&node.data, NodeData::Element { tag } if is_raw_text(tag));
        let mut out = String::new();
        for child in &node.children {
            self.write_node(*child, raw, &mut out)?;
        }
        Ok(out)
    }

    fn write_node(&self, id: NodeId, raw: bool, out: &mut String) -> Result<(), NodeError> {
        let node = self.node(id)?;
        match &node.data {
            NodeData::Text(text) if raw => out.push_str(text),
            NodeData::Text(text) => escape_text(text, out),
            NodeData::Comment(text) => {
                let _ = write!(out, "<!--{text}-->");
            }
            NodeData::Fragment => {
                for child in &node.children {
                    self.write_node(*child, raw, out)?;
                }
            }
            NodeData::Element { tag } => {
                out.push('<');
                out.push_str(tag);
                for (name, value) in &node.attributes {
                    let _ = write!(out, " {name}=\"");
                    escape_attribute(value, out);
                    out.push('"');
                }
                out.push('>');
                if is_void_element(tag) {
                    return Ok(());
                }
                let raw = is_raw_text(tag);
                for child in &node.children {
                    self.write_node(*child, raw, out)?;
                }
                let _ = write!(out, "</{tag}>");
            }
        }
        Ok(())
    }

    /// Concatenated text of every text node under `id`.
    pub fn text_content(&self, id: NodeId) -> Result<String, NodeError> {
        let node = self.node(id)?;
        match &node.data {
            NodeData::Text(text) | NodeData::Comment(text) => Ok(text.clone()),
            _ => {
                let mut out = String::new();
                for child in &node.children {
                    if self.node(*child)?.kind() != NodeKind::Comment {
                        out.push_str(&self.text_content(*child)?);
                    }
                }
                Ok(out)
            }
        }
    }

    /// First element under `root` (document order, `root` included) whose
    /// attribute `name` equals `value`.
    pub fn find_by_attribute(&self, root: NodeId, name: &str, value: &str) -> Option<NodeId> {
        self.descendants(root).into_iter().find(|id| {
            self.element(*id)
                .ok()
                .and_then(|node| node.attributes.iter().find(|(n, _)| n == name))
                .is_some_and(|(_, v)| v == value)
        })
    }

    /// Elements under `root` (document order, `root` included) with tag `tag`.
    pub fn find_by_tag(&self, root: NodeId, tag: &str) -> Vec<NodeId> {
        self.descendants(root)
            .into_iter()
            .filter(|id| {
                matches!(self.node(*id).map(|n| &n.data), Ok(NodeData::Element { tag: t }) if t == tag)
            })
            .collect()
    }

    fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut found = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let Ok(node) = self.node(id) else {
                continue;
            };
            found.push(id);
            stack.extend(node.children.iter().rev().copied());
        }
        found
    }

    pub fn dump_tree(&self, root: Option<NodeId>) -> String {
        let mut output = String::new();
        match root {
            Some(id) => self.dump_node(&mut output, id, 0),
            None => output.push_str("(no root)\n"),
        }
        output
    }

    fn dump_node(&self, output: &mut String, id: NodeId, depth: usize) {
        let indent = "  ".repeat(depth);
        let Ok(node) = self.node(id) else {
            let _ = writeln!(output, "{indent}[{id}] (missing)");
            return;
        };
        let _ = match &node.data {
            NodeData::Element { tag } => writeln!(output, "{indent}[{id}] <{tag}>"),
            NodeData::Text(text) => writeln!(output, "{indent}[{id}] {text:?}"),
            NodeData::Comment(text) => writeln!(output, "{indent}[{id}] <!--{text}-->"),
            NodeData::Fragment => writeln!(output, "{indent}[{id}] #fragment"),
        };
        for child in &node.children {
            self.dump_node(output, *child, depth + 1);
        }
    }
}

fn is_raw_text(tag: &str) -> bool {
    tag == "script" || tag == "style"
}

impl HostTree for MemoryTree {
    fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(NodeData::Element {
            tag: tag.to_ascii_lowercase(),
        })
    }

    fn create_text(&mut self, text: &str) -> NodeId {
        self.push(NodeData::Text(text.to_string()))
    }

    fn create_comment(&mut self, text: &str) -> NodeId {
        self.push(NodeData::Comment(text.to_string()))
    }

    fn create_fragment(&mut self) -> NodeId {
        let emptied = self.released.iter().position(|id| {
            self.nodes
                .get(id.0)
                .is_some_and(|node| node.children.is_empty())
        });
        match emptied {
            Some(index) => {
                self.mutations += 1;
                self.released.swap_remove(index)
            }
            None => self.push(NodeData::Fragment),
        }
    }

    fn release(&mut self, fragment: NodeId) {
        let is_fragment = self
            .nodes
            .get(fragment.0)
            .is_some_and(|node| matches!(node.data, NodeData::Fragment));
        if is_fragment && !self.released.contains(&fragment) {
            self.released.push(fragment);
        }
    }

    fn kind(&self, node: NodeId) -> Result<NodeKind, NodeError> {
        Ok(self.node(node)?.kind())
    }

    fn tag_name(&self, node: NodeId) -> Result<String, NodeError> {
        match &self.node(node)?.data {
            NodeData::Element { tag } => Ok(tag.clone()),
            _ => Err(NodeError::NotAnElement { id: node }),
        }
    }

    fn text(&self, node: NodeId) -> Result<String, NodeError> {
        match &self.node(node)?.data {
            NodeData::Text(text) | NodeData::Comment(text) => Ok(text.clone()),
            _ => self.text_content(node),
        }
    }

    fn set_text(&mut self, node: NodeId, text: &str) -> Result<(), NodeError> {
        let target = self.node_mut(node)?;
        match &mut target.data {
            NodeData::Text(current) | NodeData::Comment(current) => {
                *current = text.to_string();
            }
            _ => return Err(NodeError::NotAnElement { id: node }),
        }
        self.mutations += 1;
        Ok(())
    }

    fn attribute(&self, node: NodeId, name: &str) -> Result<Option<String>, NodeError> {
        Ok(self
            .element(node)?
            .attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.clone()))
    }

    fn attributes(&self, node: NodeId) -> Result<Vec<(String, String)>, NodeError> {
        Ok(self.element(node)?.attributes.clone())
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> Result<(), NodeError> {
        let element = self.element_mut(node)?;
        match element.attributes.iter_mut().find(|(n, _)| n == name) {
            Some(existing) => existing.1 = value.to_string(),
            None => element
                .attributes
                .push((name.to_string(), value.to_string())),
        }
        self.mutations += 1;
        Ok(())
    }

    fn remove_attribute(&mut self, node: NodeId, name: &str) -> Result<(), NodeError> {
        self.element_mut(node)?.attributes.retain(|(n, _)| n != name);
        self.mutations += 1;
        Ok(())
    }

    fn property(&self, node: NodeId, name: &str) -> Result<Option<Value>, NodeError> {
        Ok(self.element(node)?.properties.get(name).cloned())
    }

    fn set_property(
        &mut self,
        node: NodeId,
        name: &str,
        value: Option<Value>,
    ) -> Result<(), NodeError> {
        let element = self.element_mut(node)?;
        match value {
            Some(value) => {
                element.properties.insert(name.to_string(), value);
            }
            None => {
                element.properties.remove(name);
            }
        }
        self.mutations += 1;
        Ok(())
    }

    fn parent(&self, node: NodeId) -> Result<Option<NodeId>, NodeError> {
        Ok(self.node(node)?.parent)
    }

    fn children(&self, node: NodeId) -> Result<Vec<NodeId>, NodeError> {
        Ok(self.node(node)?.children.clone())
    }

    fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), NodeError> {
        self.insert_before(parent, child, None)
    }

    fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<(), NodeError> {
        if matches!(self.node(parent)?.data, NodeData::Text(_) | NodeData::Comment(_)) {
            return Err(NodeError::NotAnElement { id: parent });
        }
        self.ensure_not_ancestor(parent, child)?;
        if reference == Some(child) {
            return Ok(());
        }
        let moved = self.take_insertable(child)?;
        let siblings = &self.node(parent)?.children;
        let mut index = match reference {
            Some(reference) => siblings
                .iter()
                .position(|id| *id == reference)
                .ok_or(NodeError::NoParent { id: reference })?,
            None => siblings.len(),
        };
        for id in moved {
            self.node_mut(parent)?.children.insert(index, id);
            self.node_mut(id)?.parent = Some(parent);
            index += 1;
        }
        self.mutations += 1;
        Ok(())
    }

    fn detach(&mut self, node: NodeId) -> Result<(), NodeError> {
        if self.node(node)?.parent.is_some() {
            self.unlink(node)?;
            self.mutations += 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_moves_node_from_previous_parent() {
        let mut tree = MemoryTree::new();
        let a = tree.create_element("div");
        let b = tree.create_element("div");
        let text = tree.create_text("x");
        tree.append_child(a, text).unwrap();
        tree.append_child(b, text).unwrap();
        assert!(tree.children(a).unwrap().is_empty());
        assert_eq!(tree.parent(text).unwrap(), Some(b));
    }

    #[test]
    fn fragment_children_move_on_insertion() {
        let mut tree = MemoryTree::new();
        let root = tree.create_element("ul");
        let fragment = tree.create_fragment();
        let first = tree.create_element("li");
        let second = tree.create_element("li");
        tree.append_child(fragment, first).unwrap();
        tree.append_child(fragment, second).unwrap();
        tree.append_child(root, fragment).unwrap();
        assert_eq!(tree.children(root).unwrap(), vec![first, second]);
        assert!(tree.children(fragment).unwrap().is_empty());
    }

    #[test]
    fn released_fragment_is_reused_once_emptied() {
        let mut tree = MemoryTree::new();
        let root = tree.create_element("ul");
        let fragment = tree.create_fragment();
        let item = tree.create_element("li");
        tree.append_child(fragment, item).unwrap();
        tree.release(fragment);
        assert_ne!(tree.create_fragment(), fragment, "still holds a child");

        tree.append_child(root, item).unwrap();
        let size = tree.len();
        tree.reset_mutations();
        assert_eq!(tree.create_fragment(), fragment);
        assert_eq!(tree.mutation_count(), 1);
        assert_eq!(tree.len(), size);
    }

    #[test]
    fn release_ignores_other_nodes() {
        let mut tree = MemoryTree::new();
        let text = tree.create_text("x");
        tree.release(text);
        let fragment = tree.create_fragment();
        assert_ne!(fragment, text);
        assert_eq!(tree.kind(fragment).unwrap(), NodeKind::Fragment);
    }

    #[test]
    fn serializes_attributes_in_insertion_order() {
        let mut tree = MemoryTree::new();
        let root = tree.create_element("p");
        tree.set_attribute(root, "id", "a").unwrap();
        tree.set_attribute(root, "title", "x \"y\"").unwrap();
        let text = tree.create_text("1 < 2");
        tree.append_child(root, text).unwrap();
        let br = tree.create_element("br");
        tree.append_child(root, br).unwrap();
        assert_eq!(
            tree.outer_markup(root).unwrap(),
            r#"<p id="a" title="x &quot;y&quot;">1 &lt; 2<br></p>"#
        );
    }

    #[test]
    fn attribute_ops_reject_text_nodes() {
        let mut tree = MemoryTree::new();
        let text = tree.create_text("t");
        assert_eq!(
            tree.set_attribute(text, "id", "x"),
            Err(NodeError::NotAnElement { id: text })
        );
        assert_eq!(
            tree.attribute(NodeId(99), "id"),
            Err(NodeError::Missing { id: NodeId(99) })
        );
    }

    #[test]
    fn counts_mutations() {
        let mut tree = MemoryTree::new();
        let root = tree.create_element("div");
        let child = tree.create_text("a");
        tree.append_child(root, child).unwrap();
        assert_eq!(tree.mutation_count(), 3);
        tree.reset_mutations();
        tree.detach(root).unwrap();
        assert_eq!(tree.mutation_count(), 0);
        tree.detach(child).unwrap();
        assert_eq!(tree.mutation_count(), 1);
    }
}
