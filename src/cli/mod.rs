//! Command-line interface of the generator.
//!
//! ```bash
//! # Generate one service
//! microgen generate --dir src/services/calculator
//!
//! # Bring every service of a project up to date
//! microgen generate --dir .
//!
//! # Check specs without touching any code
//! microgen validate --dir .
//!
//! # Start a new service
//! microgen init --dir src/services/hello --host hello.example
//! ```

mod commands;

#[cfg(test)]
mod tests;

pub use commands::{execute, init_service, print_error_trail, run_cli, summary, Cli, Commands};
