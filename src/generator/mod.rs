//! # Generator Module
//!
//! Turns a validated [`ServiceSpec`](crate::spec::ServiceSpec) into the code
//! of a service, and keeps that code in step with its `service.yaml` as it evolves.
//!
//! ## Architecture
//!
//! ```text
//! service.yaml → Spec → Scanner → Views → minijinja Templates → Merge → Files
//! ```
//!
//! 1. **Spec** - parse and validate `service.yaml`
//! 2. **Scanner** - find handlers, tests and types the developer already wrote
//! 3. **Views** - precompute the Rust fragments each template needs
//! 4. **Templates** - render fully generated files and the stubs to append
//! 5. **Merge** - apply structural edits to developer-owned files
//!
//! ## Generated Structure
//!
//! ```text
//! src/services/calculator/
//! ├── service.yaml            # The specification (input)
//! ├── mod.rs                  # Module declarations, created once
//! ├── service.rs              # Implementation, grow-only
//! ├── service_test.rs         # Integration tests, grow-only
//! ├── version_gen.rs          # Version record
//! ├── api/
//! │   ├── mod.rs
//! │   ├── client_gen.rs       # Clients and marshaling structs
//! │   └── types.rs            # Complex types, grow-only
//! ├── intermediate/
//! │   ├── mod.rs
//! │   ├── intermediate_gen.rs # Manifest and dispatch
//! │   └── mock_gen.rs         # Mock for client tests
//! └── resources/
//!     ├── mod.rs
//!     └── embed_gen.rs        # Embedded resource files
//! ```
//!
//! Files ending in `_gen.rs` and everything under `intermediate/` are
//! rewritten when their content changes. All other files belong to the
//! developer once created: the generator only appends missing stubs, adds
//! missing declarations and syncs doc comments.
//!
//! ## Change Detection
//!
//! A SHA-256 of the service's source tree is recorded in `version_gen.rs`.
//! A run whose hash matches the record does nothing unless forced; a run
//! that changes the tree bumps the version.

pub mod context;
pub mod merge;
mod project;
mod templates;

pub use project::{find_services, run, FileAction, Generator, Outcome, Phase, MAIN_MARKER};
pub use templates::TemplateSet;
