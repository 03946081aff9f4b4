//! Component instances and the synchronous render routine.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::cache::{Binding, CacheGroup};
use crate::collections::map::HashMap;
use crate::component::Component;
use crate::error::{Error, MisuseError, NodeError};
use crate::host::{HostTree, NodeId, NodeKind, TreeHost};
use crate::markers::WHITEOUT;
use crate::props::{splice_run, Props};
use crate::scope::Scope;
use crate::skeleton::SkeletonKey;

static NEXT_INSTANCE_ID: AtomicUsize = AtomicUsize::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceId(usize);

impl InstanceId {
    fn next() -> Self {
        Self(NEXT_INSTANCE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "instance#{}", self.0)
    }
}

/// One mounted component: its render function, props, state slots,
/// call-site caches and the nodes it produced last.
pub struct ComponentInstance {
    id: InstanceId,
    component: RefCell<Component>,
    props: RefCell<Rc<Props>>,
    pub(crate) state: RefCell<Vec<Box<dyn Any>>>,
    pub(crate) call_sites: RefCell<HashMap<SkeletonKey, CacheGroup>>,
    live_nodes: RefCell<Option<Vec<NodeId>>>,
    /// Instance whose template call bound this one; empty for a root.
    parent: RefCell<Weak<ComponentInstance>>,
    first_render: Cell<bool>,
    rendering: Cell<bool>,
}

impl ComponentInstance {
    pub fn new(component: Component, props: Props) -> Rc<Self> {
        let instance = Rc::new(Self {
            id: InstanceId::next(),
            component: RefCell::new(component),
            props: RefCell::new(Rc::new(props)),
            state: RefCell::new(Vec::new()),
            call_sites: RefCell::new(HashMap::default()),
            live_nodes: RefCell::new(None),
            parent: RefCell::new(Weak::new()),
            first_render: Cell::new(true),
            rendering: Cell::new(false),
        });
        log::debug!("created {}", instance.id);
        instance
    }

    pub fn id(&self) -> InstanceId {
        self.id
    }

    pub fn component(&self) -> Component {
        self.component.borrow().clone()
    }

    pub fn props(&self) -> Rc<Props> {
        Rc::clone(&self.props.borrow())
    }

    pub fn parent(&self) -> Option<Rc<ComponentInstance>> {
        self.parent.borrow().upgrade()
    }

    pub(crate) fn set_parent(&self, parent: &Rc<ComponentInstance>) {
        *self.parent.borrow_mut() = Rc::downgrade(parent);
    }

    pub fn set_props(&self, props: Props) {
        *self.props.borrow_mut() = Rc::new(props);
    }

    /// Edits the live props in place, cloning them first if a render still
    /// holds them.
    pub(crate) fn edit_props<R>(&self, f: impl FnOnce(&mut Props) -> R) -> R {
        let mut props = self.props.borrow_mut();
        f(Rc::make_mut(&mut props))
    }

    /// Nodes of the last render; empty before the first one.
    pub fn live_nodes(&self) -> Vec<NodeId> {
        self.live_nodes.borrow().clone().unwrap_or_default()
    }

    pub fn is_first_render(&self) -> bool {
        self.first_render.get()
    }

    pub fn is_rendering(&self) -> bool {
        self.rendering.get()
    }

    pub fn state_len(&self) -> usize {
        self.state.borrow().len()
    }

    /// Swaps the render function and forgets everything the old one built:
    /// state slots, call-site caches. Live nodes are kept so that the next
    /// render can replace them in place.
    pub fn remount(&self, component: Component) {
        log::debug!("remounting {}", self.id);
        *self.component.borrow_mut() = component;
        self.state.borrow_mut().clear();
        self.call_sites.borrow_mut().clear();
        self.first_render.set(true);
    }
}

impl fmt::Debug for ComponentInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentInstance")
            .field("id", &self.id)
            .field("first_render", &self.first_render.get())
            .field("live_nodes", &self.live_nodes.borrow())
            .finish_non_exhaustive()
    }
}

struct RenderingGuard<'a> {
    instance: &'a ComponentInstance,
}

impl Drop for RenderingGuard<'_> {
    fn drop(&mut self) {
        self.instance.rendering.set(false);
    }
}

/// Runs the render function of `instance` and reconciles its previous output
/// against the new one. Nested component renders happen synchronously inside
/// this call.
pub fn render(host: &Rc<dyn TreeHost>, instance: &Rc<ComponentInstance>) -> Result<Vec<NodeId>, Error> {
    if instance.rendering.replace(true) {
        return Err(MisuseError::Reentrant {
            instance: instance.id,
        }
        .into());
    }
    let _guard = RenderingGuard { instance };
    log::trace!("rendering {}", instance.id);

    let component = instance.component();
    let props = instance.props();
    let result = {
        let mut scope = Scope::new(host, instance);
        component.call(&mut scope, &props)
    };
    for group in instance.call_sites.borrow_mut().values_mut() {
        if result.is_ok() {
            group.finish_pass();
        } else {
            group.reset_cursor();
        }
    }
    let mut nodes = result?;

    let previous = instance.live_nodes.borrow().clone();
    {
        let mut tree = host.borrow_dyn();
        if nodes.is_empty() {
            nodes.push(whiteout(&mut *tree, previous.as_deref())?);
        }
        if let Some(old) = &previous {
            reconcile(&mut *tree, old, &nodes)?;
        }
    }

    instance.first_render.set(false);
    *instance.live_nodes.borrow_mut() = Some(nodes.clone());
    Ok(nodes)
}

/// Renders `instance` outside of any enclosing render, as a state setter
/// does, then rewrites the node lists its ancestors keep so that their next
/// render starts from the live tree.
pub(crate) fn rerender(
    host: &Rc<dyn TreeHost>,
    instance: &Rc<ComponentInstance>,
) -> Result<Vec<NodeId>, Error> {
    let old = instance.live_nodes();
    let new = render(host, instance)?;
    if old != new {
        let mut ancestor = instance.parent();
        while let Some(current) = ancestor {
            if !splice_references(&current, &old, &new) {
                break;
            }
            ancestor = current.parent();
        }
    }
    Ok(new)
}

/// Replaces the run `old` by `new` in the records of `instance`, in the
/// children of every component it binds and in its live nodes. Returns
/// whether the live nodes held the run.
fn splice_references(instance: &ComponentInstance, old: &[NodeId], new: &[NodeId]) -> bool {
    let mut bound = Vec::new();
    for group in instance.call_sites.borrow_mut().values_mut() {
        for record in group.records_mut() {
            splice_run(&mut record.nodes, old, new);
            for binding in record.bindings.iter_mut().flatten() {
                match binding {
                    Binding::Content { nodes, .. } => {
                        splice_run(nodes, old, new);
                    }
                    Binding::Component { instance: child, .. } => bound.push(Rc::clone(child)),
                    _ => {}
                }
            }
        }
    }
    for child in bound {
        if child.edit_props(|props| props.splice_children(old, new)) {
            splice_references(&child, old, new);
        }
    }
    instance
        .live_nodes
        .borrow_mut()
        .as_mut()
        .is_some_and(|nodes| splice_run(nodes, old, new))
}

/// Comment standing in for an empty output. A previous whiteout is reused.
fn whiteout(tree: &mut dyn HostTree, previous: Option<&[NodeId]>) -> Result<NodeId, NodeError> {
    if let Some(&[only]) = previous {
        if tree.kind(only)? == NodeKind::Comment && tree.text(only)? == WHITEOUT {
            return Ok(only);
        }
    }
    Ok(tree.create_comment(WHITEOUT))
}

/// Replaces the run `old` by `new` in their shared parent. Nodes present in
/// both keep their identity and are moved only when their order changed; old
/// nodes absent from `new` are detached last.
pub fn reconcile(tree: &mut dyn HostTree, old: &[NodeId], new: &[NodeId]) -> Result<(), NodeError> {
    let mut anchor = None;
    for node in old {
        if let Some(parent) = tree.parent(*node)? {
            anchor = Some((parent, *node));
            break;
        }
    }
    let Some((parent, first)) = anchor else {
        log::debug!("no attached node among {} to reconcile", old.len());
        return Ok(());
    };

    let mut moved = 0;
    let mut cursor = Some(first);
    for node in new {
        while let Some(current) = cursor {
            if !old.contains(&current) || new.contains(&current) {
                break;
            }
            cursor = tree.next_sibling(current)?;
        }
        if cursor == Some(*node) {
            cursor = tree.next_sibling(*node)?;
        } else {
            tree.insert_before(parent, *node, cursor)?;
            moved += 1;
        }
    }
    for node in old {
        if !new.contains(node) {
            tree.detach(*node)?;
        }
    }
    log::trace!(
        "reconciled {} -> {} nodes, {} inserted",
        old.len(),
        new.len(),
        moved
    );
    Ok(())
}

/// A mounted root component.
pub struct Root {
    host: Rc<dyn TreeHost>,
    instance: Rc<ComponentInstance>,
    parent: NodeId,
}

/// Creates a root instance of `component` with empty props, renders it once
/// and appends its output to `parent`.
pub fn attach(host: Rc<dyn TreeHost>, parent: NodeId, component: Component) -> Result<Root, Error> {
    let instance = ComponentInstance::new(component, Props::new());
    let nodes = render(&host, &instance)?;
    {
        let mut tree = host.borrow_dyn();
        for node in &nodes {
            tree.append_child(parent, *node)?;
        }
    }
    Ok(Root {
        host,
        instance,
        parent,
    })
}

impl Root {
    pub fn host(&self) -> &Rc<dyn TreeHost> {
        &self.host
    }

    pub fn instance(&self) -> &Rc<ComponentInstance> {
        &self.instance
    }

    pub fn parent(&self) -> NodeId {
        self.parent
    }

    pub fn nodes(&self) -> Vec<NodeId> {
        self.instance.live_nodes()
    }

    /// Re-renders the root instance in place.
    pub fn render(&self) -> Result<Vec<NodeId>, Error> {
        render(&self.host, &self.instance)
    }
}
