//! Component props: an ordered map that remembers where each key came from.

use crate::collections::OrderedMap;
use crate::error::BindError;
use crate::host::NodeId;
use crate::markers::CHILDREN;
use crate::value::{Value, ValueMap};

/// How a prop entered the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropOrigin {
    /// Literal attribute written in the skeleton.
    Literal,
    /// The child nodes of the component's placeholder.
    Children,
    /// A dynamic value bound to one attribute name.
    Named,
    /// One entry of a spread argument.
    Spread,
}

#[derive(Debug, Clone)]
pub struct PropEntry {
    pub value: Value,
    pub origin: PropOrigin,
}

/// Props handed to a component body. The body only ever sees `&Props`; the
/// engine replaces the whole map when a parent's arguments change.
#[derive(Debug, Clone, Default)]
pub struct Props {
    entries: OrderedMap<PropEntry>,
}

impl Props {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.get(name).map(|entry| &entry.value)
    }

    pub fn origin(&self, name: &str) -> Option<PropOrigin> {
        self.entries.get(name).map(|entry| entry.origin)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    pub fn number(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(Value::as_number)
    }

    /// Value of a prop, or `Null` when absent. Handy as a template argument.
    pub fn value(&self, name: &str) -> Value {
        self.get(name).cloned().unwrap_or_default()
    }

    /// Nodes of the `children` prop, skipping anything that is not a node.
    pub fn children(&self) -> Vec<NodeId> {
        self.get(CHILDREN)
            .and_then(Value::as_list)
            .map(|items| items.iter().filter_map(Value::as_node).collect())
            .unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries
            .iter()
            .map(|(name, entry)| (name.as_str(), &entry.value))
    }

    /// All props as a map value, ready to be spread onto an element.
    pub fn to_value(&self) -> Value {
        Value::from(
            self.entries
                .iter()
                .map(|(name, entry)| (name.clone(), entry.value.clone()))
                .collect::<ValueMap>(),
        )
    }

    /// Adds a prop that must not already be present. Two `children` entries
    /// may coexist when either of them is empty.
    pub fn declare(
        &mut self,
        name: impl Into<String>,
        value: Value,
        origin: PropOrigin,
    ) -> Result<(), BindError> {
        let name = name.into();
        if let Some(existing) = self.entries.get(&name) {
            let empty_children = name == CHILDREN
                && (value.is_empty_sequence() || existing.value.is_empty_sequence());
            if !empty_children {
                return Err(BindError::DuplicateProp { name });
            }
        }
        self.entries.insert(name, PropEntry { value, origin });
        Ok(())
    }

    /// Unchecked write used by the update path.
    pub fn set(&mut self, name: impl Into<String>, value: Value, origin: PropOrigin) {
        self.entries.insert(name.into(), PropEntry { value, origin });
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.entries.shift_remove(name).map(|entry| entry.value)
    }

    /// Replaces the run `old` inside the `children` prop with `new`.
    /// Returns false when `old` cannot be located.
    pub fn splice_children(&mut self, old: &[NodeId], new: &[NodeId]) -> bool {
        let Some(entry) = self.entries.get_mut(CHILDREN) else {
            return false;
        };
        let Some(items) = entry.value.as_list() else {
            return false;
        };
        let mut nodes: Vec<NodeId> = items.iter().filter_map(Value::as_node).collect();
        if !splice_run(&mut nodes, old, new) {
            return false;
        }
        entry.value = Value::nodes(&nodes);
        true
    }
}

/// Replaces the span from the first to the last node of `old` inside
/// `list` with `new`.
pub(crate) fn splice_run(list: &mut Vec<NodeId>, old: &[NodeId], new: &[NodeId]) -> bool {
    let (Some(first), Some(last)) = (old.first(), old.last()) else {
        return false;
    };
    let Some(begin) = list.iter().position(|id| id == first) else {
        return false;
    };
    let Some(end) = list[begin..].iter().position(|id| id == last).map(|i| begin + i + 1) else {
        return false;
    };
    list.splice(begin..end, new.iter().copied());
    true
}

impl FromIterator<(String, Value)> for Props {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        let mut props = Props::new();
        for (name, value) in iter {
            props.set(name, value, PropOrigin::Named);
        }
        props
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declare_rejects_second_write() {
        let mut props = Props::new();
        props.declare("title", "a".into(), PropOrigin::Spread).unwrap();
        let err = props.declare("title", "b".into(), PropOrigin::Named).unwrap_err();
        assert_eq!(err, BindError::DuplicateProp { name: "title".into() });
        assert_eq!(props.str("title"), Some("a"));
    }

    #[test]
    fn empty_children_may_coexist() {
        let mut props = Props::new();
        props.declare(CHILDREN, Value::list([]), PropOrigin::Children).unwrap();
        props
            .declare(CHILDREN, Value::nodes(&[NodeId(4)]), PropOrigin::Spread)
            .unwrap();
        assert_eq!(props.children(), vec![NodeId(4)]);
        assert!(props
            .declare(CHILDREN, Value::nodes(&[NodeId(5)]), PropOrigin::Named)
            .is_err());
    }

    #[test]
    fn splice_children_replaces_the_old_run() {
        let mut props = Props::new();
        props.set(CHILDREN, Value::nodes(&[NodeId(1), NodeId(2), NodeId(3), NodeId(4)]), PropOrigin::Children);
        assert!(props.splice_children(&[NodeId(2), NodeId(3)], &[NodeId(9)]));
        assert_eq!(props.children(), vec![NodeId(1), NodeId(9), NodeId(4)]);
        assert!(!props.splice_children(&[NodeId(42)], &[NodeId(7)]));
    }
}
