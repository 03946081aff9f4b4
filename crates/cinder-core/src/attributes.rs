//! Attribute application rules shared by first use and patching.

use crate::error::{BindError, Error};
use crate::host::{HostTree, NodeId};
use crate::markers::{is_handler_name, CHILDREN, INNER_MARKUP, INNER_MARKUP_KEY, VALUE};
use crate::markup;
use crate::value::Value;

/// Keeps what a content slot renders: nested lists are flattened, `null`,
/// `false` and empty strings dropped, numbers always kept.
pub fn flatten(value: &Value, out: &mut Vec<Value>) {
    match value {
        Value::List(items) => {
            for item in items.iter() {
                flatten(item, out);
            }
        }
        other if other.is_renderable() => out.push(other.clone()),
        _ => {}
    }
}

/// Turns flattened values into host nodes: nodes pass through, everything
/// else becomes a text node.
pub fn materialize(tree: &mut dyn HostTree, values: &[Value]) -> Vec<NodeId> {
    values
        .iter()
        .map(|value| match value {
            Value::Node(id) => *id,
            other => tree.create_text(&other.to_content_text()),
        })
        .collect()
}

pub fn apply_attribute(
    tree: &mut dyn HostTree,
    node: NodeId,
    name: &str,
    value: &Value,
) -> Result<(), Error> {
    log::trace!("attribute {name} on {node}");
    if name == CHILDREN {
        let mut values = Vec::new();
        flatten(value, &mut values);
        if !tree.children(node)?.is_empty() && !values.is_empty() {
            return Err(BindError::ChildrenConflict.into());
        }
        for child in materialize(tree, &values) {
            tree.append_child(node, child)?;
        }
        return Ok(());
    }

    if name == INNER_MARKUP {
        if !tree.children(node)?.is_empty() {
            return Err(BindError::InnerMarkupConflict.into());
        }
        let source = value
            .as_map()
            .and_then(|map| map.get(INNER_MARKUP_KEY))
            .and_then(Value::as_str)
            .ok_or(BindError::ExpectedMarkup)?;
        markup::set_inner_markup(tree, node, source)?;
        return Ok(());
    }

    if name == VALUE {
        tree.set_property(node, VALUE, Some(value.clone()))?;
        return Ok(());
    }

    if is_handler_name(name) {
        if tree.property(node, name)?.is_some() {
            return Err(BindError::DuplicateHandler {
                name: name.to_string(),
            }
            .into());
        }
        if !matches!(value, Value::Null) {
            tree.set_property(node, name, Some(value.clone()))?;
        }
        return Ok(());
    }

    if tree.has_attribute(node, name)? {
        return Err(BindError::DuplicateAttribute {
            name: name.to_string(),
        }
        .into());
    }

    match (name, value) {
        ("class", Value::List(tokens)) => {
            for token in tokens.iter() {
                tree.add_class(node, &token.to_string())?;
            }
        }
        ("class", Value::Map(entries)) => {
            for (token, enabled) in entries.iter() {
                tree.toggle_class(node, token, enabled.is_truthy())?;
            }
        }
        ("style", Value::Map(entries)) => {
            for (property, value) in entries.iter() {
                tree.set_style_property(node, property, &value.to_string())?;
            }
        }
        (_, Value::Bool(true)) => tree.set_attribute(node, name, name)?,
        (_, Value::Bool(false)) => {}
        _ => tree.set_attribute(node, name, &value.to_string())?,
    }
    Ok(())
}

/// Undoes whatever [`apply_attribute`] did for `name`.
pub fn remove_attribute(tree: &mut dyn HostTree, node: NodeId, name: &str) -> Result<(), Error> {
    if name == CHILDREN || name == INNER_MARKUP {
        tree.clear_children(node)?;
    } else if name == VALUE {
        tree.set_property(node, VALUE, None)?;
        tree.remove_attribute(node, VALUE)?;
    } else if is_handler_name(name) {
        tree.set_property(node, name, None)?;
    } else {
        tree.remove_attribute(node, name)?;
    }
    Ok(())
}
