//! The host tree adapter: the mutable element/text tree the engine renders
//! into.
//!
//! The engine is a single writer of the host tree. Every operation borrows
//! the tree for the shortest possible span, so that setters and handlers can
//! reach the same tree through [`TreeHost`] while no render holds it.

mod memory;

pub use memory::MemoryTree;

use std::any::Any;
use std::cell::{RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

use crate::error::NodeError;
use crate::naming::prop_to_attribute;
use crate::value::Value;
use crate::Error;

/// Handle to a node of the host tree.
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Element,
    Text,
    Comment,
    Fragment,
}

pub trait HostTree: Any {
    fn create_element(&mut self, tag: &str) -> NodeId;
    fn create_text(&mut self, text: &str) -> NodeId;
    fn create_comment(&mut self, text: &str) -> NodeId;
    /// A parentless container whose children are moved out on insertion
    /// elsewhere.
    fn create_fragment(&mut self) -> NodeId;
    /// Hands back a fragment the engine will not use again. Hosts may recycle
    /// it once its children have moved out.
    fn release(&mut self, _fragment: NodeId) {}

    fn kind(&self, node: NodeId) -> Result<NodeKind, NodeError>;
    fn tag_name(&self, node: NodeId) -> Result<String, NodeError>;
    /// Text of a text or comment node.
    fn text(&self, node: NodeId) -> Result<String, NodeError>;
    fn set_text(&mut self, node: NodeId, text: &str) -> Result<(), NodeError>;

    fn attribute(&self, node: NodeId, name: &str) -> Result<Option<String>, NodeError>;
    fn attributes(&self, node: NodeId) -> Result<Vec<(String, String)>, NodeError>;
    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> Result<(), NodeError>;
    fn remove_attribute(&mut self, node: NodeId, name: &str) -> Result<(), NodeError>;

    /// Live properties are distinct from attributes: handler slots,
    /// `value`.
    fn property(&self, node: NodeId, name: &str) -> Result<Option<Value>, NodeError>;
    fn set_property(
        &mut self,
        node: NodeId,
        name: &str,
        value: Option<Value>,
    ) -> Result<(), NodeError>;

    fn parent(&self, node: NodeId) -> Result<Option<NodeId>, NodeError>;
    fn children(&self, node: NodeId) -> Result<Vec<NodeId>, NodeError>;
    /// Moves `child` (detaching it from any current parent) to the end of
    /// `parent`.
    fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), NodeError>;
    /// Moves `child` before `reference`, or to the end when `reference` is
    /// `None`.
    fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<(), NodeError>;
    /// Removes `node` from its parent. Detached nodes are left untouched.
    fn detach(&mut self, node: NodeId) -> Result<(), NodeError>;

    fn has_attribute(&self, node: NodeId, name: &str) -> Result<bool, NodeError> {
        Ok(self.attribute(node, name)?.is_some())
    }

    fn next_sibling(&self, node: NodeId) -> Result<Option<NodeId>, NodeError> {
        let Some(parent) = self.parent(node)? else {
            return Ok(None);
        };
        let siblings = self.children(parent)?;
        let position = siblings.iter().position(|id| *id == node);
        Ok(position.and_then(|i| siblings.get(i + 1).copied()))
    }

    /// Puts `replacements` where `node` is and detaches `node` unless it is
    /// one of the replacements. A detached `node` makes this a no-op.
    fn replace_with(&mut self, node: NodeId, replacements: &[NodeId]) -> Result<(), NodeError> {
        let Some(parent) = self.parent(node)? else {
            log::debug!("replace_with on detached node {node}");
            return Ok(());
        };
        let Some(kept) = replacements.iter().position(|id| *id == node) else {
            for &replacement in replacements {
                self.insert_before(parent, replacement, Some(node))?;
            }
            return self.detach(node);
        };
        for &replacement in &replacements[..kept] {
            self.insert_before(parent, replacement, Some(node))?;
        }
        let mut previous = node;
        for &replacement in &replacements[kept + 1..] {
            let reference = self.next_sibling(previous)?;
            if reference != Some(replacement) {
                self.insert_before(parent, replacement, reference)?;
            }
            previous = replacement;
        }
        Ok(())
    }

    fn clear_children(&mut self, node: NodeId) -> Result<(), NodeError> {
        for child in self.children(node)? {
            self.detach(child)?;
        }
        Ok(())
    }

    fn add_class(&mut self, node: NodeId, token: &str) -> Result<(), NodeError> {
        self.toggle_class(node, token, true)
    }

    fn toggle_class(&mut self, node: NodeId, token: &str, enabled: bool) -> Result<(), NodeError> {
        let current = self.attribute(node, "class")?.unwrap_or_default();
        let mut tokens: Vec<&str> = current.split_whitespace().collect();
        let present = tokens.contains(&token);
        if enabled && !present {
            tokens.push(token);
        } else if !enabled && present {
            tokens.retain(|t| *t != token);
        } else {
            return Ok(());
        }
        let joined = tokens.join(" ");
        self.set_attribute(node, "class", &joined)
    }

    /// Merges one declaration into the `style` attribute. `name` may be in
    /// prop spelling (`backgroundColor`).
    fn set_style_property(&mut self, node: NodeId, name: &str, value: &str) -> Result<(), NodeError> {
        let name = prop_to_attribute(name);
        let current = self.attribute(node, "style")?.unwrap_or_default();
        let mut declarations: Vec<(String, String)> = current
            .split(';')
            .filter_map(|decl| {
                let (key, val) = decl.split_once(':')?;
                Some((key.trim().to_string(), val.trim().to_string()))
            })
            .collect();
        match declarations.iter_mut().find(|(key, _)| *key == name) {
            Some(existing) => existing.1 = value.to_string(),
            None => declarations.push((name, value.to_string())),
        }
        let style = declarations
            .iter()
            .filter(|(_, val)| !val.is_empty())
            .map(|(key, val)| format!("{key}: {val};"))
            .collect::<Vec<_>>()
            .join(" ");
        self.set_attribute(node, "style", &style)
    }

    /// Descendants of `root` (excluding `root`) carrying attribute `marker`,
    /// in document order.
    fn query_marked(&self, root: NodeId, marker: &str) -> Result<Vec<NodeId>, NodeError> {
        let mut found = Vec::new();
        let mut stack: Vec<NodeId> = self.children(root)?.into_iter().rev().collect();
        while let Some(node) = stack.pop() {
            if self.kind(node)? == NodeKind::Element {
                if self.has_attribute(node, marker)? {
                    found.push(node);
                }
                stack.extend(self.children(node)?.into_iter().rev());
            }
        }
        Ok(found)
    }
}

/// Shared access to one host tree.
pub trait TreeHost {
    fn borrow_dyn(&self) -> RefMut<'_, dyn HostTree>;
}

pub struct ConcreteTreeHost<T: HostTree + 'static> {
    tree: RefCell<T>,
}

impl<T: HostTree + 'static> ConcreteTreeHost<T> {
    pub fn new(tree: T) -> Self {
        Self {
            tree: RefCell::new(tree),
        }
    }

    pub fn borrow_typed(&self) -> RefMut<'_, T> {
        self.tree.borrow_mut()
    }

    pub fn into_inner(self) -> T {
        self.tree.into_inner()
    }
}

impl<T: HostTree + 'static> TreeHost for ConcreteTreeHost<T> {
    fn borrow_dyn(&self) -> RefMut<'_, dyn HostTree> {
        RefMut::map(self.tree.borrow_mut(), |tree| tree as &mut dyn HostTree)
    }
}

/// Event delivered to a handler.
#[derive(Debug, Clone)]
pub struct Event {
    /// Event name without the handler prefix (`click`).
    pub kind: String,
    pub target: NodeId,
    pub value: Value,
}

/// Invokes the `on<kind>` handler of `target`. The host is not borrowed while
/// the handler runs, so the handler may call state setters. Returns whether a
/// handler was found.
pub fn dispatch_event(
    host: &Rc<dyn TreeHost>,
    target: NodeId,
    kind: &str,
    value: Value,
) -> Result<bool, Error> {
    let property = format!("{}{kind}", crate::markers::HANDLER_PREFIX);
    let handler = {
        let tree = host.borrow_dyn();
        tree.property(target, &property)?
    };
    let Some(Value::Handler(handler)) = handler else {
        return Ok(false);
    };
    log::trace!("dispatching {kind} to {target}");
    handler.call(&Event {
        kind: kind.to_string(),
        target,
        value,
    })?;
    Ok(true)
}
