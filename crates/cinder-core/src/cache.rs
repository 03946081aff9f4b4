//! Per-instance, per-call-site history of template invocations.

use std::rc::Rc;

use crate::host::NodeId;
use crate::instance::ComponentInstance;
use crate::value::Value;

/// What one argument of an invocation is bound to in the live tree.
#[derive(Debug)]
pub enum Binding {
    /// The argument is the render function of a mounted instance. `owner` is
    /// the argument index of the component whose `children` prop holds the
    /// instance output.
    Component {
        instance: Rc<ComponentInstance>,
        owner: Option<usize>,
    },
    /// The argument was flattened into `nodes`.
    Content {
        nodes: Vec<NodeId>,
        owner: Option<usize>,
    },
    Attribute {
        node: NodeId,
        name: String,
    },
    /// Spread onto an element; `names` are the attribute names it set.
    AttributeRest {
        node: NodeId,
        names: Vec<String>,
    },
    /// Named prop of the component bound at argument `component`.
    Prop {
        component: usize,
        name: String,
    },
    /// Spread into the props of the component bound at argument `component`.
    PropRest {
        component: usize,
        names: Vec<String>,
    },
}

/// One past execution of a call site.
#[derive(Debug)]
pub struct InvocationRecord {
    /// Top-level nodes produced by the call, kept current across patches.
    pub nodes: Vec<NodeId>,
    /// Arguments of the previous call, overwritten after every patch.
    pub args: Vec<Value>,
    pub bindings: Vec<Option<Binding>>,
}

impl InvocationRecord {
    pub fn instance(&self, arg: usize) -> Option<&Rc<ComponentInstance>> {
        match self.bindings.get(arg)? {
            Some(Binding::Component { instance, .. }) => Some(instance),
            _ => None,
        }
    }
}

/// Ordered invocations of one call site within one instance, correlated by
/// position across render passes.
#[derive(Debug, Default)]
pub struct CacheGroup {
    position: usize,
    invocations: Vec<InvocationRecord>,
}

impl CacheGroup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn len(&self) -> usize {
        self.invocations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.invocations.is_empty()
    }

    /// Index of the record to patch at the current position, advancing the
    /// cursor. `None` means the call must instantiate a new record.
    pub fn next_cached(&mut self) -> Option<usize> {
        if self.position < self.invocations.len() {
            self.position += 1;
            Some(self.position - 1)
        } else {
            None
        }
    }

    pub fn record_mut(&mut self, index: usize) -> Option<&mut InvocationRecord> {
        self.invocations.get_mut(index)
    }

    pub fn records_mut(&mut self) -> impl Iterator<Item = &mut InvocationRecord> {
        self.invocations.iter_mut()
    }

    pub fn take(&mut self, index: usize) -> Option<InvocationRecord> {
        let slot = self.invocations.get_mut(index)?;
        Some(std::mem::replace(
            slot,
            InvocationRecord {
                nodes: Vec::new(),
                args: Vec::new(),
                bindings: Vec::new(),
            },
        ))
    }

    pub fn restore(&mut self, index: usize, record: InvocationRecord) {
        if let Some(slot) = self.invocations.get_mut(index) {
            *slot = record;
        }
    }

    /// Stores a new record at the current position and advances the cursor.
    pub fn push(&mut self, record: InvocationRecord) {
        self.invocations.truncate(self.position);
        self.invocations.push(record);
        self.position += 1;
    }

    /// Ends a render pass: records past the cursor belong to iterations that
    /// no longer happen.
    pub fn finish_pass(&mut self) {
        if self.position < self.invocations.len() {
            log::debug!(
                "discarding {} stale invocation records",
                self.invocations.len() - self.position
            );
        }
        self.invocations.truncate(self.position);
        self.position = 0;
    }

    /// Abandons a failed pass without discarding anything.
    pub fn reset_cursor(&mut self) {
        self.position = 0;
    }
}
