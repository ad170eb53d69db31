//! Run configuration of the generator.

use std::env;

use crate::spec::SPEC_FILE_NAME;

/// Options of a generation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenConfig {
    /// Regenerate even when the source tree hash is unchanged
    pub force: bool,
    /// Register newly created services with the composition file
    pub register_with_main: bool,
    /// Name of the specification file in each service directory
    pub spec_file: String,
}

impl Default for GenConfig {
    fn default() -> Self {
        GenConfig {
            force: false,
            register_with_main: true,
            spec_file: SPEC_FILE_NAME.to_string(),
        }
    }
}

fn env_flag(name: &str) -> Option<bool> {
    let value = env::var(name).ok()?;
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

impl GenConfig {
    /// Defaults overridden by `MICROGEN_FORCE` and `MICROGEN_NO_REGISTER`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        GenConfig {
            force: env_flag("MICROGEN_FORCE").unwrap_or(defaults.force),
            register_with_main: !env_flag("MICROGEN_NO_REGISTER").unwrap_or(false),
            spec_file: defaults.spec_file,
        }
    }

    /// Whether newly created services are added to `main.rs`. Always off when
    /// the generator itself is under test.
    pub fn registers_with_main(&self) -> bool {
        self.register_with_main && !cfg!(test)
    }
}
