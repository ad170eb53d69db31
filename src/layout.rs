//! Where a service sits inside its crate: project root, source root and
//! the module path that names it.

use std::path::{Path, PathBuf};

/// Suffix of fully generated source files.
pub const GENERATED_SUFFIX: &str = "_gen.rs";
/// Suffix of integration test files.
pub const TEST_SUFFIX: &str = "_test.rs";
/// Sub-directories of a service that hold only generated code.
pub const GENERATED_DIRS: &[&str] = &["intermediate", "resources"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    /// Nearest ancestor holding `Cargo.toml`
    pub root: PathBuf,
    /// `root/src` when the service lives below it, else `root`
    pub source_root: PathBuf,
}

impl ProjectLayout {
    /// Locate the project that contains `service_dir`.
    pub fn discover(service_dir: &Path) -> Self {
        let root = service_dir
            .ancestors()
            .skip(1)
            .find(|dir| dir.join("Cargo.toml").is_file())
            .or_else(|| service_dir.parent())
            .unwrap_or(service_dir)
            .to_path_buf();
        let src = root.join("src");
        let source_root = if src.is_dir() && service_dir.starts_with(&src) {
            src
        } else {
            root.clone()
        };
        ProjectLayout { root, source_root }
    }

    /// `src/services/calculator` → `services::calculator`. Empty for the
    /// source root itself or a directory outside it.
    pub fn module_path(&self, dir: &Path) -> String {
        match dir.strip_prefix(&self.source_root) {
            Ok(rel) => rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("::"),
            Err(_) => String::new(),
        }
    }

    /// The process-composition file new services are registered with.
    pub fn main_file(&self) -> PathBuf {
        self.source_root.join("main.rs")
    }
}

/// A hand-written Rust source file: not generated, not an integration test.
pub fn is_handwritten_source(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    name.ends_with(".rs") && !name.ends_with(GENERATED_SUFFIX) && !name.ends_with(TEST_SUFFIX)
}

pub fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}
