use std::fmt;
use std::rc::Rc;

use crate::host::NodeId;
use crate::props::Props;
use crate::scope::Scope;
use crate::Error;

/// Plain component body.
pub type RenderFn = fn(&mut Scope<'_>, &Props) -> Result<Vec<NodeId>, Error>;

type SharedRenderFn = dyn Fn(&mut Scope<'_>, &Props) -> Result<Vec<NodeId>, Error>;

/// A render function with identity. Two components are the same when they
/// point at the same function item or the same shared closure; an instance
/// whose component changes identity is remounted.
#[derive(Clone)]
pub struct Component {
    repr: Repr,
}

#[derive(Clone)]
enum Repr {
    Fn(RenderFn),
    Shared(Rc<SharedRenderFn>),
}

impl Component {
    pub fn new(render: RenderFn) -> Self {
        Self {
            repr: Repr::Fn(render),
        }
    }

    /// Wraps a closure. Identity is the allocation, so keep the returned
    /// component around instead of rebuilding it on every render.
    pub fn from_closure(
        render: impl Fn(&mut Scope<'_>, &Props) -> Result<Vec<NodeId>, Error> + 'static,
    ) -> Self {
        Self {
            repr: Repr::Shared(Rc::new(render)),
        }
    }

    pub fn same(&self, other: &Component) -> bool {
        match (&self.repr, &other.repr) {
            (Repr::Fn(a), Repr::Fn(b)) => *a as usize == *b as usize,
            (Repr::Shared(a), Repr::Shared(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    pub fn call(&self, scope: &mut Scope<'_>, props: &Props) -> Result<Vec<NodeId>, Error> {
        match &self.repr {
            Repr::Fn(render) => render(scope, props),
            Repr::Shared(render) => render(scope, props),
        }
    }
}

impl From<RenderFn> for Component {
    fn from(render: RenderFn) -> Self {
        Component::new(render)
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.repr {
            Repr::Fn(render) => write!(f, "Component({:#x})", *render as usize),
            Repr::Shared(render) => {
                write!(f, "Component({:p})", Rc::as_ptr(render) as *const ())
            }
        }
    }
}
