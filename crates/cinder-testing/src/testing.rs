use std::cell::RefMut;
use std::rc::Rc;

use cinder_core::style;
use cinder_core::{
    attach, dispatch_event, Component, ConcreteTreeHost, Error, HostTree, MemoryTree, NodeError,
    NodeId, Root, TreeHost, Value,
};

/// Headless harness for exercising components in tests.
///
/// `RenderTestRule` owns an in-memory host tree with a `<div>` container and
/// mounts one root component into it. Events are dispatched by element id,
/// and the produced tree can be inspected as markup or as a debug dump.
pub struct RenderTestRule {
    host: Rc<ConcreteTreeHost<MemoryTree>>,
    container: NodeId,
    root: Option<Root>,
}

impl RenderTestRule {
    /// Create a new rule with an empty container.
    pub fn new() -> Self {
        let host = Rc::new(ConcreteTreeHost::new(MemoryTree::new()));
        let container = host.borrow_typed().create_element("div");
        Self {
            host,
            container,
            root: None,
        }
    }

    /// Mount `component` as the root and perform the initial render. Any
    /// previously mounted root is detached first.
    pub fn set_content(&mut self, component: Component) -> Result<(), Error> {
        if let Some(previous) = self.root.take() {
            let mut tree = self.host.borrow_typed();
            for node in previous.nodes() {
                tree.detach(node)?;
            }
        }
        let host: Rc<dyn TreeHost> = self.host.clone();
        self.root = Some(attach(host, self.container, component)?);
        Ok(())
    }

    /// Returns whether a root component has been mounted.
    pub fn has_content(&self) -> bool {
        self.root.is_some()
    }

    /// Re-render the root instance. Does nothing before `set_content`.
    pub fn rerender(&mut self) -> Result<(), Error> {
        if let Some(root) = &self.root {
            root.render()?;
        }
        Ok(())
    }

    pub fn root(&self) -> Option<&Root> {
        self.root.as_ref()
    }

    /// Top-level nodes currently produced by the root component.
    pub fn root_nodes(&self) -> Vec<NodeId> {
        self.root.as_ref().map(Root::nodes).unwrap_or_default()
    }

    pub fn container(&self) -> NodeId {
        self.container
    }

    pub fn host(&self) -> Rc<dyn TreeHost> {
        self.host.clone()
    }

    /// Mutable access to the in-memory tree for assertions.
    ///
    /// The guard must be dropped before dispatching events or re-rendering.
    pub fn tree(&self) -> RefMut<'_, MemoryTree> {
        self.host.borrow_typed()
    }

    /// Markup of everything inside the container.
    pub fn markup(&self) -> Result<String, NodeError> {
        self.tree().inner_markup(self.container)
    }

    /// Indented dump of the container subtree.
    pub fn dump_tree(&self) -> String {
        self.tree().dump_tree(Some(self.container))
    }

    pub fn find_by_id(&self, id: &str) -> Option<NodeId> {
        self.tree().find_by_attribute(self.container, "id", id)
    }

    pub fn find_by_tag(&self, tag: &str) -> Vec<NodeId> {
        self.tree().find_by_tag(self.container, tag)
    }

    /// Text content of the element with the given id.
    pub fn text_of(&self, id: &str) -> Option<String> {
        let node = self.find_by_id(id)?;
        self.tree().text_content(node).ok()
    }

    /// Deliver a `kind` event to `node`. Returns whether a handler ran.
    pub fn dispatch(&self, node: NodeId, kind: &str, value: Value) -> Result<bool, Error> {
        log::trace!("test dispatch {kind} to {node}");
        dispatch_event(&self.host(), node, kind, value)
    }

    /// Click the element with the given id. Returns false when no such
    /// element exists or it has no click handler.
    pub fn click(&self, id: &str) -> Result<bool, Error> {
        match self.find_by_id(id) {
            Some(node) => self.dispatch(node, "click", Value::Null),
            None => {
                log::debug!("no element with id {id} to click");
                Ok(false)
            }
        }
    }

    /// Deliver an `input` event carrying `text` to the element with the
    /// given id.
    pub fn input(&self, id: &str, text: &str) -> Result<bool, Error> {
        match self.find_by_id(id) {
            Some(node) => self.dispatch(node, "input", Value::from(text)),
            None => Ok(false),
        }
    }

    /// Host-tree mutations since the rule was created or last reset.
    pub fn mutation_count(&self) -> usize {
        self.tree().mutation_count()
    }

    pub fn reset_mutations(&self) {
        self.tree().reset_mutations();
    }

    /// Style rules registered by styled components on this thread.
    pub fn style_rules(&self) -> Vec<String> {
        style::rules()
    }
}

impl Default for RenderTestRule {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience helper for tests that only need temporary access to a
/// `RenderTestRule`.
pub fn run_test_render<R>(f: impl FnOnce(&mut RenderTestRule) -> R) -> R {
    let mut rule = RenderTestRule::new();
    f(&mut rule)
}

#[cfg(test)]
#[path = "tests/testing_tests.rs"]
mod tests;
