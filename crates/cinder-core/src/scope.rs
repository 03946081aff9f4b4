//! The render context handed to component bodies.

use std::marker::PhantomData;
use std::rc::{Rc, Weak};

use crate::binder;
use crate::error::{Error, MisuseError, TemplateError};
use crate::host::{NodeId, TreeHost};
use crate::instance::{self, ComponentInstance, InstanceId};
use crate::precompile::precompiled;
use crate::skeleton::Skeleton;
use crate::value::Value;

/// Access to the instance currently rendering. Only a render creates one, so
/// template calls and state hooks cannot happen outside a component body.
pub struct Scope<'s> {
    host: &'s Rc<dyn TreeHost>,
    instance: &'s Rc<ComponentInstance>,
    state_cursor: usize,
}

impl<'s> Scope<'s> {
    pub(crate) fn new(host: &'s Rc<dyn TreeHost>, instance: &'s Rc<ComponentInstance>) -> Self {
        Self {
            host,
            instance,
            state_cursor: 0,
        }
    }

    pub fn host(&self) -> &Rc<dyn TreeHost> {
        self.host
    }

    pub fn instance_id(&self) -> InstanceId {
        self.instance.id()
    }

    pub fn is_first_render(&self) -> bool {
        self.instance.is_first_render()
    }

    /// Executes one template call. The first call at this call site and
    /// position instantiates the compiled tree; later ones patch the nodes
    /// they produced before and return them.
    pub fn template(
        &mut self,
        skeleton: &'static Skeleton,
        args: Vec<Value>,
    ) -> Result<Vec<NodeId>, Error> {
        let compiled = precompiled(skeleton)?;
        if args.len() != compiled.arg_count() {
            return Err(TemplateError::ArgumentCount {
                expected: compiled.arg_count(),
                found: args.len(),
            }
            .into());
        }

        let key = skeleton.key();
        let cached = {
            let mut sites = self.instance.call_sites.borrow_mut();
            let group = sites.entry(key).or_default();
            group
                .next_cached()
                .and_then(|index| group.take(index).map(|record| (index, record)))
        };

        if let Some((index, mut record)) = cached {
            let patched = binder::patch(self.host, &mut record, args);
            let nodes = record.nodes.clone();
            if let Some(group) = self.instance.call_sites.borrow_mut().get_mut(&key) {
                group.restore(index, record);
            }
            patched?;
            return Ok(nodes);
        }

        let record = binder::instantiate(self.host, self.instance, &compiled, args)?;
        let nodes = record.nodes.clone();
        self.instance
            .call_sites
            .borrow_mut()
            .entry(key)
            .or_default()
            .push(record);
        Ok(nodes)
    }

    /// Position-indexed state slot. The first render stores `initial`; later
    /// renders return the stored value. Calls must happen in the same order
    /// on every render.
    pub fn use_state<T: Clone + PartialEq + 'static>(&mut self, initial: T) -> (T, StateSetter<T>) {
        self.use_state_with(|| initial)
    }

    /// Like [`use_state`](Scope::use_state) with a lazily built initial value.
    pub fn use_state_with<T: Clone + PartialEq + 'static>(
        &mut self,
        init: impl FnOnce() -> T,
    ) -> (T, StateSetter<T>) {
        let index = self.state_cursor;
        self.state_cursor += 1;

        let stored = self
            .instance
            .state
            .borrow()
            .get(index)
            .and_then(|slot| (**slot).downcast_ref::<T>().cloned());
        let value = match stored {
            Some(value) => value,
            None => {
                if !self.instance.is_first_render() {
                    log::warn!(
                        "state slot {index} of {} does not hold a {}; reinitialising",
                        self.instance.id(),
                        std::any::type_name::<T>()
                    );
                }
                let value = init();
                let mut state = self.instance.state.borrow_mut();
                if index < state.len() {
                    state[index] = Box::new(value.clone());
                } else {
                    state.push(Box::new(value.clone()));
                }
                value
            }
        };

        let setter = StateSetter {
            instance: Rc::downgrade(self.instance),
            host: Rc::clone(self.host),
            index,
            _marker: PhantomData,
        };
        (value, setter)
    }
}

/// Writes one state slot and synchronously re-renders its instance.
pub struct StateSetter<T> {
    instance: Weak<ComponentInstance>,
    host: Rc<dyn TreeHost>,
    index: usize,
    _marker: PhantomData<fn(T) -> T>,
}

impl<T> Clone for StateSetter<T> {
    fn clone(&self) -> Self {
        Self {
            instance: Weak::clone(&self.instance),
            host: Rc::clone(&self.host),
            index: self.index,
            _marker: PhantomData,
        }
    }
}

impl<T: Clone + PartialEq + 'static> StateSetter<T> {
    /// Current value of the slot, `None` once the instance is gone.
    pub fn get(&self) -> Option<T> {
        let instance = self.instance.upgrade()?;
        let state = instance.state.borrow();
        state
            .get(self.index)
            .and_then(|slot| (**slot).downcast_ref::<T>().cloned())
    }

    /// Stores `value` and re-renders, unless it equals the stored value.
    /// Setters of dropped instances do nothing.
    pub fn set(&self, value: T) -> Result<(), Error> {
        let Some(instance) = self.instance.upgrade() else {
            log::debug!("state setter of a dropped instance ignored");
            return Ok(());
        };
        if instance.is_rendering() {
            return Err(MisuseError::Reentrant {
                instance: instance.id(),
            }
            .into());
        }
        {
            let mut state = instance.state.borrow_mut();
            let Some(slot) = state
                .get_mut(self.index)
                .and_then(|slot| (**slot).downcast_mut::<T>())
            else {
                log::warn!(
                    "state slot {} of {} no longer holds a {}",
                    self.index,
                    instance.id(),
                    std::any::type_name::<T>()
                );
                return Ok(());
            };
            if *slot == value {
                return Ok(());
            }
            *slot = value;
        }
        instance::rerender(&self.host, &instance)?;
        Ok(())
    }

    pub fn update(&self, f: impl FnOnce(&T) -> T) -> Result<(), Error> {
        match self.get() {
            Some(current) => self.set(f(&current)),
            None => Ok(()),
        }
    }
}
