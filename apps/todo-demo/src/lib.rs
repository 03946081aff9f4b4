//! Todo list demo built on cinder components.

pub mod app;

#[cfg(test)]
#[path = "tests/app_tests.rs"]
mod app_tests;
