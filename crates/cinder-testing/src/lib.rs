//! Testing utilities and harness for cinder

pub mod testing;

pub use testing::*;

pub mod prelude {
    pub use crate::testing::*;
    pub use cinder_core::{template, Component, Error, NodeId, Props, Scope, Value};
}
