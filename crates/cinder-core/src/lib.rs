#![doc = r"Call-site cached templates, component instances and positional reconciliation over a mutable host tree."]

pub extern crate self as cinder_core;

mod attributes;
mod binder;
pub mod cache;
pub mod collections;
mod component;
mod error;
pub mod host;
mod instance;
pub mod markers;
pub mod markup;
pub mod naming;
pub mod precompile;
mod props;
mod scope;
mod skeleton;
pub mod style;
mod value;

pub use attributes::{apply_attribute, flatten, materialize, remove_attribute};
pub use component::{Component, RenderFn};
pub use error::{BindError, Error, MisuseError, NodeError, TemplateError};
pub use host::{
    dispatch_event, ConcreteTreeHost, Event, HostTree, MemoryTree, NodeId, NodeKind, TreeHost,
};
pub use instance::{attach, reconcile, render, ComponentInstance, InstanceId, Root};
pub use props::{PropEntry, PropOrigin, Props};
pub use scope::{Scope, StateSetter};
pub use skeleton::{Skeleton, SkeletonKey};
pub use style::{styled, styled_component, Css};
pub use value::{Handler, Value, ValueMap};

/// Executes a template call from a component body.
///
/// The literal segments become a `static` [`Skeleton`] owned by this call
/// site, so every evaluation of the same macro invocation shares one cache
/// entry while two textually equal invocations stay distinct.
///
/// ```ignore
/// fn greeting(cx: &mut Scope<'_>, props: &Props) -> Result<Vec<NodeId>, Error> {
///     template!(cx, ["<p class=", ">Hello ", "</p>"], "greeting", props.value("name"))
/// }
/// ```
#[macro_export]
macro_rules! template {
    ($cx:expr, [$($part:literal),+ $(,)?] $(, $arg:expr)* $(,)?) => {{
        static SKELETON: $crate::Skeleton = $crate::Skeleton::new(&[$($part),+]);
        $cx.template(&SKELETON, ::std::vec![$($crate::Value::from($arg)),*])
    }};
}

#[cfg(test)]
#[path = "tests/fixture.rs"]
mod fixture;

#[cfg(test)]
#[path = "tests/precompile_tests.rs"]
mod precompile_tests;

#[cfg(test)]
#[path = "tests/binder_tests.rs"]
mod binder_tests;

#[cfg(test)]
#[path = "tests/instance_tests.rs"]
mod instance_tests;

#[cfg(test)]
#[path = "tests/style_tests.rs"]
mod style_tests;
