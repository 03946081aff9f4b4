//! Binds template arguments to a fresh instantiation, and patches a previous
//! instantiation when the same call site runs again.

use std::collections::BTreeMap;
use std::rc::Rc;

use crate::attributes::{apply_attribute, flatten, materialize, remove_attribute};
use crate::cache::{Binding, InvocationRecord};
use crate::error::{BindError, Error};
use crate::host::{HostTree, NodeId, NodeKind, TreeHost};
use crate::instance::{self, ComponentInstance};
use crate::markers::{CHILDREN, SLOT_ATTR};
use crate::markup::build_into;
use crate::naming::{attribute_to_prop, prop_to_attribute};
use crate::precompile::{PrecompiledTemplate, SlotDescriptor, SlotKind};
use crate::props::{splice_run, PropOrigin, Props};
use crate::value::Value;

/// First use of a call site at a position: builds the static tree and binds
/// every slot, deepest nodes first. Component slots become children of
/// `parent`.
pub(crate) fn instantiate(
    host: &Rc<dyn TreeHost>,
    parent: &Rc<ComponentInstance>,
    template: &PrecompiledTemplate,
    args: Vec<Value>,
) -> Result<InvocationRecord, Error> {
    let (fragment, marked) = {
        let mut tree = host.borrow_dyn();
        let fragment = tree.create_fragment();
        build_into(&mut *tree, fragment, template.tree())?;
        let marked = tree.query_marked(fragment, SLOT_ATTR)?;
        (fragment, marked)
    };

    let mut bindings: Vec<Option<Binding>> = (0..args.len()).map(|_| None).collect();
    for node in marked.into_iter().rev() {
        let slot_id = {
            let mut tree = host.borrow_dyn();
            let id = tree.attribute(node, SLOT_ATTR)?;
            tree.remove_attribute(node, SLOT_ATTR)?;
            id.and_then(|id| id.parse::<usize>().ok())
        };
        let Some(slot) = slot_id.and_then(|id| template.slot(id)) else {
            log::debug!("node {node} carries an unknown slot id");
            continue;
        };
        match slot.kind {
            SlotKind::Component { arg } => {
                bind_component(host, parent, node, slot, arg, &args, &mut bindings)?;
            }
            SlotKind::Content { arg } => {
                let value = argument(&args, arg)?;
                let nodes = bind_content(&mut *host.borrow_dyn(), node, value)?;
                bindings[arg] = Some(Binding::Content {
                    nodes,
                    owner: slot.owner,
                });
            }
            SlotKind::Bare => {
                bind_attributes(&mut *host.borrow_dyn(), node, slot, &args, &mut bindings)?;
            }
        }
    }

    let nodes = {
        let mut tree = host.borrow_dyn();
        let nodes = tree.children(fragment)?;
        tree.release(fragment);
        nodes
    };
    Ok(InvocationRecord {
        nodes,
        args,
        bindings,
    })
}

fn bind_component(
    host: &Rc<dyn TreeHost>,
    parent: &Rc<ComponentInstance>,
    node: NodeId,
    slot: &SlotDescriptor,
    arg: usize,
    args: &[Value],
    bindings: &mut [Option<Binding>],
) -> Result<(), Error> {
    let component = argument(args, arg)?
        .as_component()
        .cloned()
        .ok_or(BindError::ExpectedComponent { index: arg })?;

    let mut props = Props::new();
    {
        let tree = host.borrow_dyn();
        let children = tree.children(node)?;
        props.declare(CHILDREN, Value::nodes(&children), PropOrigin::Children)?;
        for (name, value) in tree.attributes(node)? {
            props.set(attribute_to_prop(&name), Value::from(value), PropOrigin::Literal);
        }
    }
    for binding in &slot.attributes {
        let value = argument(args, binding.arg)?;
        if binding.is_spread() {
            let names = spread_entries(value, binding.arg)?
                .into_iter()
                .map(|(name, value)| {
                    props.declare(name.clone(), value, PropOrigin::Spread)?;
                    Ok(name)
                })
                .collect::<Result<Vec<_>, BindError>>()?;
            bindings[binding.arg] = Some(Binding::PropRest {
                component: arg,
                names,
            });
        } else {
            let name = attribute_to_prop(&binding.name);
            props.declare(name.clone(), value.clone(), PropOrigin::Named)?;
            bindings[binding.arg] = Some(Binding::Prop {
                component: arg,
                name,
            });
        }
    }

    let instance = ComponentInstance::new(component, props);
    instance.set_parent(parent);
    let nodes = instance::render(host, &instance)?;
    host.borrow_dyn().replace_with(node, &nodes)?;
    bindings[arg] = Some(Binding::Component {
        instance,
        owner: slot.owner,
    });
    Ok(())
}

fn argument(args: &[Value], index: usize) -> Result<&Value, BindError> {
    args.get(index).ok_or(BindError::MissingArgument { index })
}

/// Replaces `node` by the flattened content of `value`. A text node receiving
/// a single non-node value is rewritten in place.
fn bind_content(tree: &mut dyn HostTree, node: NodeId, value: &Value) -> Result<Vec<NodeId>, Error> {
    let mut values = Vec::new();
    flatten(value, &mut values);
    if values.is_empty() {
        values.push(Value::from(""));
    }
    if let [single] = values.as_slice() {
        if !matches!(single, Value::Node(_)) && tree.kind(node)? == NodeKind::Text {
            tree.set_text(node, &single.to_content_text())?;
            return Ok(vec![node]);
        }
    }
    let nodes = materialize(tree, &values);
    tree.replace_with(node, &nodes)?;
    Ok(nodes)
}

fn bind_attributes(
    tree: &mut dyn HostTree,
    node: NodeId,
    slot: &SlotDescriptor,
    args: &[Value],
    bindings: &mut [Option<Binding>],
) -> Result<(), Error> {
    for binding in &slot.attributes {
        let value = argument(args, binding.arg)?;
        if binding.is_spread() {
            let names = apply_spread(tree, node, value, binding.arg)?;
            bindings[binding.arg] = Some(Binding::AttributeRest { node, names });
        } else {
            apply_attribute(tree, node, &binding.name, value)?;
            bindings[binding.arg] = Some(Binding::Attribute {
                node,
                name: binding.name.clone(),
            });
        }
    }
    Ok(())
}

/// Entries of a spread argument. `Null` spreads nothing.
fn spread_entries(value: &Value, index: usize) -> Result<Vec<(String, Value)>, BindError> {
    match value {
        Value::Map(map) => Ok(map
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()),
        Value::Null => Ok(Vec::new()),
        _ => Err(BindError::ExpectedMap { index }),
    }
}

/// Applies every entry of a spread as an attribute and returns the attribute
/// names it set.
fn apply_spread(
    tree: &mut dyn HostTree,
    node: NodeId,
    value: &Value,
    index: usize,
) -> Result<Vec<String>, Error> {
    let mut names = Vec::new();
    for (prop, value) in spread_entries(value, index)? {
        let name = prop_to_attribute(&prop);
        apply_attribute(tree, node, &name, &value)?;
        names.push(name);
    }
    Ok(names)
}

/// Repeat use: patches only the bindings whose argument changed, then
/// re-renders every component whose props changed, once each.
pub(crate) fn patch(
    host: &Rc<dyn TreeHost>,
    record: &mut InvocationRecord,
    args: Vec<Value>,
) -> Result<(), Error> {
    let InvocationRecord {
        nodes: record_nodes,
        args: old_args,
        bindings,
    } = record;

    let instances: Vec<Option<Rc<ComponentInstance>>> = bindings
        .iter()
        .map(|binding| match binding {
            Some(Binding::Component { instance, .. }) => Some(Rc::clone(instance)),
            _ => None,
        })
        .collect();
    let mut drafts: BTreeMap<usize, Props> = BTreeMap::new();

    for (index, (old, new)) in old_args.iter().zip(&args).enumerate() {
        if old.same(new) {
            continue;
        }
        let Some(binding) = bindings[index].as_mut() else {
            continue;
        };
        log::trace!("argument {index} changed");
        match binding {
            Binding::Component { .. } => {
                draft(&mut drafts, &instances, index);
            }
            Binding::Content { nodes, owner } => {
                let old_nodes = std::mem::take(nodes);
                let Some(&first) = old_nodes.first() else {
                    continue;
                };
                let new_nodes = {
                    let mut tree = host.borrow_dyn();
                    for node in &old_nodes[1..] {
                        tree.detach(*node)?;
                    }
                    bind_content(&mut *tree, first, new)?
                };
                if old_nodes != new_nodes {
                    splice_run(record_nodes, &old_nodes, &new_nodes);
                    if let Some(owner) = *owner {
                        match drafts.get_mut(&owner) {
                            Some(props) => {
                                props.splice_children(&old_nodes, &new_nodes);
                            }
                            None => {
                                if let Some(instance) = instances.get(owner).and_then(Option::as_ref) {
                                    instance.edit_props(|props| {
                                        props.splice_children(&old_nodes, &new_nodes)
                                    });
                                }
                            }
                        }
                    }
                }
                *nodes = new_nodes;
            }
            Binding::Attribute { node, name } => {
                let mut tree = host.borrow_dyn();
                remove_attribute(&mut *tree, *node, name)?;
                apply_attribute(&mut *tree, *node, name, new)?;
            }
            Binding::AttributeRest { node, names } => {
                let mut tree = host.borrow_dyn();
                for name in names.iter() {
                    remove_attribute(&mut *tree, *node, name)?;
                }
                *names = apply_spread(&mut *tree, *node, new, index)?;
            }
            Binding::Prop { component, name } => {
                if let Some(props) = draft(&mut drafts, &instances, *component) {
                    props.set(name.clone(), new.clone(), PropOrigin::Named);
                }
            }
            Binding::PropRest { component, names } => {
                let entries = spread_entries(new, index)?;
                if let Some(props) = draft(&mut drafts, &instances, *component) {
                    for name in names.iter() {
                        props.remove(name);
                    }
                    for (name, value) in &entries {
                        props.set(name.clone(), value.clone(), PropOrigin::Spread);
                    }
                }
                *names = entries.into_iter().map(|(name, _)| name).collect();
            }
        }
    }
    *old_args = args;

    // Nested components sit at higher argument indices than their owners and
    // render first, so an owner renders with its children already spliced.
    while let Some((component, props)) = drafts.pop_last() {
        let Some(instance) = instances.get(component).and_then(Option::as_ref) else {
            continue;
        };
        let next = old_args[component]
            .as_component()
            .ok_or(BindError::ExpectedComponent { index: component })?;
        if !next.same(&instance.component()) {
            instance.remount(next.clone());
        }
        instance.set_props(props);

        let old_nodes = instance.live_nodes();
        let new_nodes = instance::render(host, instance)?;
        if old_nodes == new_nodes {
            continue;
        }
        splice_run(record_nodes, &old_nodes, &new_nodes);
        let Some(Binding::Component {
            owner: Some(owner), ..
        }) = bindings[component]
        else {
            continue;
        };
        match drafts.get_mut(&owner) {
            Some(props) => {
                props.splice_children(&old_nodes, &new_nodes);
            }
            None => {
                if let Some(owner) = instances.get(owner).and_then(Option::as_ref) {
                    owner.edit_props(|props| props.splice_children(&old_nodes, &new_nodes));
                }
            }
        }
    }
    Ok(())
}

/// Copy-on-write props of the component bound at `component`, created on
/// first use within one patch.
fn draft<'d>(
    drafts: &'d mut BTreeMap<usize, Props>,
    instances: &[Option<Rc<ComponentInstance>>],
    component: usize,
) -> Option<&'d mut Props> {
    let instance = instances.get(component)?.as_ref()?;
    Some(
        drafts
            .entry(component)
            .or_insert_with(|| Props::clone(&instance.props())),
    )
}
