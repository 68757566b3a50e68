//! Version rules and remote catalogs for the managed package
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  Registries │────▶│  Registry   │────▶│    Rule     │
//! │ (cli, http) │     │  (catalog)  │     │ (filter/cmp)│
//! └─────────────┘     └─────────────┘     └─────────────┘
//!        │                                       │
//!        ▼                                       ▼
//! ┌─────────────┐                         ┌─────────────┐
//! │   Package   │                         │    Range    │
//! │   manager   │                         │  (matching) │
//! └─────────────┘                         └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`rule`]: Version validity, tag classification, ordering and matching
//! - [`range`]: npm-style range expressions
//! - [`tags`]: Release channels (`latest`, `pre`, `beta`, `alpha`)
//! - [`registry`]: Catalog source trait and the multi-source registry client
//! - [`registries`]: Concrete catalog sources (npm CLI, npm HTTP registry)
//! - [`package_manager`]: External package-manager process
//! - [`error`]: Error types for registry and package-manager operations
//! - [`semver`]: Shared semver utilities
//! - [`types`]: Raw and filtered catalogs

pub mod error;
pub mod package_manager;
pub mod range;
pub mod registries;
pub mod registry;
pub mod rule;
pub mod semver;
pub mod tags;
pub mod types;
