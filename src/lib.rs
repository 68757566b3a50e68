pub mod config;
pub mod installer;
pub mod logging;
pub mod manager;
pub mod store;
pub mod version;
