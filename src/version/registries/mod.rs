//! Catalog source implementations, in the order they are normally tried

pub mod npm;
pub mod npm_cli;

pub use npm::NpmRegistry;
pub use npm_cli::NpmCliRegistry;
