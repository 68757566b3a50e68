//! Shared test utilities

#![allow(dead_code)]

pub mod registry;
pub mod store;

#[allow(unused_imports)]
pub use registry::*;
#[allow(unused_imports)]
pub use store::*;
