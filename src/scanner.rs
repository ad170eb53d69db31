//! Scans existing source to find what is already implemented.
//!
//! Two scans feed the generator's append decisions:
//!
//! - [`scan_existing_code`] reads the service directory itself (one level,
//!   hand-written files only) and collects implemented handler methods and
//!   integration tests.
//! - [`scan_project_types`] walks the whole project and records which
//!   directories define which named types, so that a complex type used by a
//!   service can be re-exported from its single definition instead of being
//!   generated again.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::{Path, PathBuf};

use anyhow::Context;
use regex::Regex;
use tracing::debug;
use walkdir::WalkDir;

use crate::layout::{is_handwritten_source, is_hidden, ProjectLayout, GENERATED_DIRS, TEST_SUFFIX};
use crate::spec::{Handler, ServiceSpec, SPEC_FILE_NAME};

/// Compiled patterns shared by the scanner and the merge engine. Built once
/// per run and passed down explicitly.
#[derive(Debug, Clone)]
pub struct Patterns {
    /// `fn name(&self` with optional visibility and generics
    pub handler_fn: Regex,
    /// `fn test_name(`
    pub test_fn: Regex,
    /// Top-level `pub struct|enum|type Name`
    pub type_def: Regex,
    /// Top-level `pub use path::Name;`
    pub reexport: Regex,
    /// `return Err(ident);`
    pub err_return: Regex,
}

impl Patterns {
    pub fn new() -> anyhow::Result<Self> {
        Ok(Patterns {
            handler_fn: Regex::new(
                r"(?m)^\s*(?:pub(?:\([^)]*\))?\s+)?(?:async\s+)?fn\s+((?:r#)?[a-z_][a-z0-9_]*)\s*(?:<[^>]*>)?\s*\(\s*&\s*(?:mut\s+)?self",
            )?,
            test_fn: Regex::new(r"(?m)^\s*(?:async\s+)?fn\s+(test_[a-z0-9_]+)\s*\(")?,
            type_def: Regex::new(r"(?m)^pub\s+(?:struct|enum|type)\s+([A-Z][A-Za-z0-9_]*)")?,
            reexport: Regex::new(r"(?m)^pub\s+use\s+[A-Za-z0-9_:]+::([A-Z][A-Za-z0-9_]*)\s*;")?,
            err_return: Regex::new(r"return\s+Err\(\s*([A-Za-z_][A-Za-z0-9_]*)\s*\)\s*;")?,
        })
    }

    pub(crate) fn captures(re: &Regex, text: &str) -> Vec<String> {
        re.captures_iter(text)
            .filter_map(|c| c.get(1).map(|m| m.as_str().to_string()))
            .collect()
    }
}

/// What the developer has already written in a service directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExistingCode {
    pub handlers: HashSet<String>,
    pub tests: HashSet<String>,
}

impl ExistingCode {
    /// A handler counts as implemented when its method, or its
    /// `on_changed_`/`on_observe_` callback, is declared.
    pub fn is_implemented(&self, handler: &Handler) -> bool {
        handler
            .implementation_fn()
            .is_some_and(|f| self.handlers.contains(&f))
    }

    pub fn has_test(&self, handler: &Handler) -> bool {
        handler.test_fn().is_some_and(|t| self.tests.contains(&t))
    }
}

/// Scan the top level of `service_dir` for implemented handlers and tests.
pub fn scan_existing_code(service_dir: &Path, patterns: &Patterns) -> anyhow::Result<ExistingCode> {
    let mut existing = ExistingCode::default();
    let entries = match std::fs::read_dir(service_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(existing),
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to read {}", service_dir.display()))
        }
    };
    for entry in entries {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        if is_handwritten_source(&path) {
            let text = read(&path)?;
            existing
                .handlers
                .extend(Patterns::captures(&patterns.handler_fn, &text));
        } else if name.ends_with(TEST_SUFFIX) {
            let text = read(&path)?;
            existing
                .tests
                .extend(Patterns::captures(&patterns.test_fn, &text));
        }
    }
    debug!(
        dir = %service_dir.display(),
        handlers = existing.handlers.len(),
        tests = existing.tests.len(),
        "Scanned existing code"
    );
    Ok(existing)
}

/// Type names defined per directory across a project.
#[derive(Debug, Clone, Default)]
pub struct TypeIndex {
    definitions: BTreeMap<String, BTreeSet<PathBuf>>,
}

impl TypeIndex {
    /// The directory defining `name`, if exactly one directory other than
    /// `exclude` does.
    pub fn unique_definition(&self, name: &str, exclude: &Path) -> Option<&Path> {
        let dirs: Vec<&PathBuf> = self
            .definitions
            .get(name)?
            .iter()
            .filter(|d| d.as_path() != exclude)
            .collect();
        match dirs.as_slice() {
            [only] => Some(only.as_path()),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

/// Walk `root` and index top-level type definitions per directory.
///
/// Hidden directories, `target` and the generated sub-directories of
/// services are skipped, as are files that sit directly in a service
/// directory.
pub fn scan_project_types(root: &Path, patterns: &Patterns) -> anyhow::Result<TypeIndex> {
    let mut index = TypeIndex::default();
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            if e.depth() == 0 || !e.file_type().is_dir() {
                return true;
            }
            let name = e.file_name().to_string_lossy();
            !is_hidden(&name) && name != "target" && !GENERATED_DIRS.contains(&&*name)
        });
    for entry in walker {
        let entry = entry.with_context(|| format!("Failed to walk {}", root.display()))?;
        let path = entry.path();
        if !entry.file_type().is_file() || !is_handwritten_source(path) {
            continue;
        }
        let Some(dir) = path.parent() else {
            continue;
        };
        if dir.join(SPEC_FILE_NAME).is_file() {
            continue;
        }
        let text = read(path)?;
        for name in Patterns::captures(&patterns.type_def, &text) {
            index
                .definitions
                .entry(name)
                .or_default()
                .insert(dir.to_path_buf());
        }
    }
    debug!(root = %root.display(), types = index.len(), "Indexed project types");
    Ok(index)
}

/// Names defined or re-exported by the service's own `api` module.
pub fn scan_api_types(service_dir: &Path, patterns: &Patterns) -> anyhow::Result<HashSet<String>> {
    let api_dir = service_dir.join("api");
    let mut names = HashSet::new();
    let Ok(entries) = std::fs::read_dir(&api_dir) else {
        return Ok(names);
    };
    for entry in entries {
        let path = entry?.path();
        if !path.is_file() || !is_handwritten_source(&path) {
            continue;
        }
        let text = read(&path)?;
        names.extend(Patterns::captures(&patterns.type_def, &text));
        names.extend(Patterns::captures(&patterns.reexport, &text));
    }
    Ok(names)
}

/// Mark each complex type of `spec` as existing, importable from a single
/// definition elsewhere, or in need of a new local definition.
pub fn resolve_complex_types(
    spec: &mut ServiceSpec,
    service_dir: &Path,
    layout: &ProjectLayout,
    patterns: &Patterns,
) -> anyhow::Result<()> {
    if spec.complex_types.is_empty() {
        return Ok(());
    }
    let own = scan_api_types(service_dir, patterns)?;
    let index = scan_project_types(&layout.root, patterns)?;
    let own_api = service_dir.join("api");
    for ty in &mut spec.complex_types {
        ty.exists = own.contains(&ty.name);
        ty.package = None;
        if ty.exists {
            continue;
        }
        if let Some(dir) = index.unique_definition(&ty.name, &own_api) {
            let module = layout.module_path(dir);
            if !module.is_empty() {
                debug!(name = %ty.name, module = %module, "Resolved complex type");
                ty.package = Some(module);
            }
        }
    }
    Ok(())
}

fn read(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handler_fn_pattern() {
        let p = Patterns::new().unwrap();
        let text = "impl Service {\n    pub fn add(&self, x: i64) -> Result<i64> {\n    }\n    fn on_changed_max_num(&self) {}\n    pub(crate) fn helper(x: i64) {}\n    pub fn r#match(&self) {}\n}\n";
        let names = Patterns::captures(&p.handler_fn, text);
        assert_eq!(names, vec!["add", "on_changed_max_num", "r#match"]);
    }

    #[test]
    fn test_type_patterns() {
        let p = Patterns::new().unwrap();
        let text = "pub struct Point {\n}\n    pub struct Nested;\npub use crate::geo::api::Shape;\npub enum Color {}\n";
        let defs = Patterns::captures(&p.type_def, text);
        assert_eq!(defs, vec!["Point", "Color"]);
        let reexports = Patterns::captures(&p.reexport, text);
        assert_eq!(reexports, vec!["Shape"]);
    }

    #[test]
    fn test_err_return_pattern() {
        let p = Patterns::new().unwrap();
        assert!(p.err_return.is_match("        return Err(e);"));
        assert!(!p.err_return.is_match("return Err(errors::trace(e));"));
    }
}
