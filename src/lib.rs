//! # microgen
//!
//! **microgen** scaffolds microservices from a compact `service.yaml` and
//! keeps the generated code in step with it as the file evolves, without
//! overwriting what the developer wrote.
//!
//! ## Overview
//!
//! A service declares its handlers in seven categories: configs, metrics,
//! functions, events, sinks, webs and tickers. Each handler is described by
//! a one-line signature such as
//!
//! ```text
//! Arithmetic(x int, op string, y int) (xEquals int, result int)
//! ```
//!
//! plus category-specific options (route, method, queue, actor, validation
//! rule, interval and so on).
//!
//! ## Architecture
//!
//! - **[`spec`]** - Signature grammar, handler model and validation rules
//! - **[`scanner`]** - Discovery of existing handlers, tests and types
//! - **[`generator`]** - Template rendering, merging and the generation pipeline
//! - **[`version`]** - Source tree hashing and the version record
//! - **[`layout`]** - Where a service sits within its crate
//! - **[`cli`]** - The `microgen` command line
//!
//! ## Usage from Code
//!
//! ```rust,no_run
//! use microgen::{generator, GenConfig};
//! use std::path::Path;
//!
//! let config = GenConfig::from_env();
//! for (dir, outcome) in generator::run(Path::new("src/services"), &config)? {
//!     println!("{}: {outcome:?}", dir.display());
//! }
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod generator;
pub mod layout;
pub mod logging;
pub mod naming;
pub mod scanner;
pub mod spec;
pub mod version;

pub use config::GenConfig;
pub use error::SpecError;
pub use spec::{load_service_spec, Handler, ServiceSpec, Signature};
