use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use super::files::{create_once, edit_source, write_generated, FileAction};
use crate::config::GenConfig;
use crate::generator::context::{
    handler_doc_text, service_doc_text, sink_imports, ServiceView, TypeView,
};
use crate::generator::templates::TemplateSet;
use crate::layout::{is_hidden, ProjectLayout};
use crate::scanner::{resolve_complex_types, scan_existing_code, ExistingCode, Patterns};
use crate::spec::{load_service_spec, Handler, ServiceSpec, TypeNames};
use crate::version::{
    next_version, read_record, source_tree_hash, VersionRecord, VERSION_FILE_NAME,
};

/// Line of `main.rs` before which new services are registered.
pub const MAIN_MARKER: &str = "// HINT: Add services here";

/// The steps of a service run, in order. Failures are reported against the
/// phase they occurred in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Parsing,
    Validating,
    GeneratingApi,
    GeneratingResources,
    GeneratingIntermediate,
    GeneratingImplementation,
    GeneratingIntegrationTests,
    SyncingSignatures,
    PropagatingErrorTracing,
    Versioning,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::Parsing => "parsing",
            Phase::Validating => "validating",
            Phase::GeneratingApi => "generating API",
            Phase::GeneratingResources => "generating resources",
            Phase::GeneratingIntermediate => "generating intermediate",
            Phase::GeneratingImplementation => "generating implementation",
            Phase::GeneratingIntegrationTests => "generating integration tests",
            Phase::SyncingSignatures => "syncing signatures",
            Phase::PropagatingErrorTracing => "propagating error tracing",
            Phase::Versioning => "versioning",
        };
        f.write_str(s)
    }
}

/// Result of running the generator on one service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The source tree matches its version record; nothing was written
    Unchanged,
    Generated { version: u32 },
}

fn phase<T>(phase: Phase, dir: &Path, f: impl FnOnce() -> anyhow::Result<T>) -> anyhow::Result<T> {
    debug!(%phase, dir = %dir.display(), "Phase");
    f().with_context(|| format!("Failed {phase} {}", dir.display()))
}

/// Drives the generation of services. Templates and patterns are compiled
/// once and shared across the services of a run.
pub struct Generator<'a> {
    config: &'a GenConfig,
    templates: TemplateSet,
    patterns: Patterns,
}

impl<'a> Generator<'a> {
    pub fn new(config: &'a GenConfig) -> anyhow::Result<Self> {
        Ok(Generator {
            config,
            templates: TemplateSet::new().context("Failed to compile templates")?,
            patterns: Patterns::new().context("Failed to compile patterns")?,
        })
    }

    /// Generate, or bring up to date, the service in `dir`.
    pub fn generate_service(&self, dir: &Path) -> anyhow::Result<Outcome> {
        let dir = fs::canonicalize(dir)
            .with_context(|| format!("Failed to resolve service directory {}", dir.display()))?;
        let layout = ProjectLayout::discover(&dir);
        let package = package_of(&layout, &dir);

        let previous = read_record(&dir)?;
        let hash = source_tree_hash(&dir)?;
        if let Some(record) = &previous {
            if record.sha256 == hash && !self.config.force {
                info!(service = %package, version = record.version, "Service is up to date");
                return Ok(Outcome::Unchanged);
            }
        }
        info!(service = %package, dir = %dir.display(), "Generating service");

        let mut spec = phase(Phase::Parsing, &dir, || {
            load_service_spec(&dir.join(&self.config.spec_file), &package)
        })?;
        let existing = phase(Phase::Validating, &dir, || {
            resolve_complex_types(&mut spec, &dir, &layout, &self.patterns)?;
            scan_existing_code(&dir, &self.patterns)
        })?;

        let run = ServiceRun {
            gen: self,
            dir: &dir,
            layout: &layout,
            existing: &existing,
        };
        phase(Phase::GeneratingApi, &dir, || run.api(&mut spec))?;
        phase(Phase::GeneratingResources, &dir, || run.resources(&spec))?;
        phase(Phase::GeneratingIntermediate, &dir, || run.intermediate(&mut spec))?;
        phase(Phase::GeneratingImplementation, &dir, || run.implementation(&mut spec))?;
        if spec.general.integration_tests {
            phase(Phase::GeneratingIntegrationTests, &dir, || {
                run.integration_tests(&mut spec)
            })?;
        }
        phase(Phase::SyncingSignatures, &dir, || run.sync_signatures(&spec))?;
        phase(Phase::PropagatingErrorTracing, &dir, || run.propagate_error_tracing())?;

        phase(Phase::Versioning, &dir, || {
            let hash = source_tree_hash(&dir)?;
            if let Some(record) = &previous {
                if record.sha256 == hash {
                    info!(service = %package, version = record.version, "Source unchanged, keeping version");
                    return Ok(Outcome::Unchanged);
                }
            }
            let version = next_version(previous.as_ref().map(|r| r.version))
                .context("version number overflow")?;
            let record = VersionRecord::new(&package, version, &hash);
            let content = self.templates.render(
                "version_gen.rs.j2",
                serde_json::json!({
                    "version": record.version,
                    "sha256": record.sha256,
                    "record": serde_json::to_string(&record)?,
                }),
            )?;
            write_generated(&dir.join(VERSION_FILE_NAME), &content)?;
            info!(service = %package, version, "Generated service");
            Ok(Outcome::Generated { version })
        })
    }
}

/// Module path of the service, or its directory name when the service sits
/// at the source root itself.
fn package_of(layout: &ProjectLayout, dir: &Path) -> String {
    let module = layout.module_path(dir);
    if !module.is_empty() {
        return module;
    }
    dir.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Switch complex type names to `names`. Code inside the `api` module
/// uses shorthand names, everything else qualified ones.
fn use_type_names(spec: &mut ServiceSpec, names: TypeNames) {
    if spec.type_names() == names {
        return;
    }
    match names {
        TypeNames::Shorthand => spec.shorthand_types(),
        TypeNames::Qualified => spec.qualify_types(),
    }
}

struct ServiceRun<'r, 'a> {
    gen: &'r Generator<'a>,
    dir: &'r Path,
    layout: &'r ProjectLayout,
    existing: &'r ExistingCode,
}

impl ServiceRun<'_, '_> {
    fn render<S: serde::Serialize>(&self, name: &str, ctx: S) -> anyhow::Result<String> {
        self.gen
            .templates
            .render(name, ctx)
            .with_context(|| format!("Failed to render {name}"))
    }

    fn api(&self, spec: &mut ServiceSpec) -> anyhow::Result<()> {
        use_type_names(spec, TypeNames::Shorthand);
        let types: Vec<TypeView> = spec
            .missing_types()
            .map(|t| TypeView {
                name: t.name.clone(),
                reexport: t.package.as_ref().map(|p| format!("crate::{p}::{}", t.name)),
            })
            .collect();
        let view = ServiceView::new(spec).with_types(types);
        let api = self.dir.join("api");

        create_once(&api.join("mod.rs"), &self.render("api_mod.rs.j2", &view)?)?;
        write_generated(
            &api.join("client_gen.rs"),
            &self.render("api_client_gen.rs.j2", &view)?,
        )?;

        let types_path = api.join("types.rs");
        if !types_path.exists() {
            create_once(&types_path, &self.render("api_types.rs.j2", &view)?)?;
        } else if !view.types.is_empty() {
            let stubs = self.render("api_types.stubs.rs.j2", &view)?;
            edit_source(&types_path, |f| {
                f.append(&stubs);
                true
            })?;
        }
        Ok(())
    }

    fn resources(&self, spec: &ServiceSpec) -> anyhow::Result<()> {
        let dir = self.dir.join("resources");
        fs::create_dir_all(&dir).with_context(|| format!("Failed to create {}", dir.display()))?;
        let names = list_resources(&dir)?;
        let view = ServiceView::new(spec).with_resources(&names);
        create_once(&dir.join("mod.rs"), &self.render("resources_mod.rs.j2", &view)?)?;
        write_generated(&dir.join("embed_gen.rs"), &self.render("embed_gen.rs.j2", &view)?)?;
        Ok(())
    }

    fn intermediate(&self, spec: &mut ServiceSpec) -> anyhow::Result<()> {
        use_type_names(spec, TypeNames::Qualified);
        let view = ServiceView::new(spec);
        let dir = self.dir.join("intermediate");
        for (file, template) in [
            ("mod.rs", "intermediate_mod.rs.j2"),
            ("intermediate_gen.rs", "intermediate_gen.rs.j2"),
            ("mock_gen.rs", "mock_gen.rs.j2"),
        ] {
            write_generated(&dir.join(file), &self.render(template, &view)?)?;
        }
        Ok(())
    }

    fn implementation(&self, spec: &mut ServiceSpec) -> anyhow::Result<()> {
        use_type_names(spec, TypeNames::Qualified);
        let spec = &*spec;
        let missing: Vec<&Handler> = spec
            .handlers
            .iter()
            .filter(|h| h.implementation_fn().is_some() && !self.existing.is_implemented(h))
            .collect();
        let view = ServiceView::new(spec).with_stubs(missing.iter().copied());

        let mod_path = self.dir.join("mod.rs");
        let created = create_once(&mod_path, &self.render("mod.rs.j2", &view)?)?;
        if !created.changed() {
            edit_source(&mod_path, |f| {
                let mut changed = f.ensure_mod("api", &["pub mod api;"]);
                for name in ["intermediate", "resources", "service"] {
                    let decl = format!("mod {name};");
                    changed |= f.ensure_mod(name, &[decl.as_str()]);
                }
                if spec.general.integration_tests {
                    changed |= f.ensure_mod("service_test", &["#[cfg(test)]", "mod service_test;"]);
                }
                changed |= f.ensure_mod("version_gen", &["mod version_gen;"]);
                changed
            })?;
        }

        let service_path = self.dir.join("service.rs");
        if !service_path.exists() {
            create_once(&service_path, &self.render("service.rs.j2", &view)?)?;
        } else {
            let stubs = if missing.is_empty() {
                String::new()
            } else {
                self.render("service.stubs.rs.j2", &view)?
            };
            let imports = sink_imports(spec);
            edit_source(&service_path, |f| {
                let mut changed = false;
                for line in &imports {
                    changed |= f.ensure_use(line);
                }
                if !stubs.trim().is_empty() {
                    f.append(&stubs);
                    changed = true;
                }
                changed
            })?;
            for h in &missing {
                debug!(handler = h.name(), "Appended stub");
            }
        }

        if created == FileAction::Created && self.gen.config.registers_with_main() {
            self.register_with_main(spec)?;
        }
        Ok(())
    }

    /// Reference the new service from the composition file and add it to
    /// the list of services the process runs.
    fn register_with_main(&self, spec: &ServiceSpec) -> anyhow::Result<()> {
        let main = self.layout.main_file();
        if !main.is_file() {
            warn!(file = %main.display(), "No main.rs to register the service with");
            return Ok(());
        }
        let Some(name) = self.dir.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            return Ok(());
        };
        let direct = self.dir.parent() == Some(self.layout.source_root.as_path());
        let mut marker_found = true;
        edit_source(&main, |f| {
            let mut changed = if direct {
                let decl = format!("mod {name};");
                f.ensure_mod(&name, &[decl.as_str()])
            } else {
                f.ensure_use(&format!("use crate::{};", spec.package))
            };
            match f.insert_before_marker(MAIN_MARKER, &format!("{name}::Service::new(),")) {
                Some(inserted) => changed |= inserted,
                None => marker_found = false,
            }
            changed
        })?;
        if !marker_found {
            warn!(file = %main.display(), marker = MAIN_MARKER, "Marker not found, service not added");
        }
        Ok(())
    }

    fn integration_tests(&self, spec: &mut ServiceSpec) -> anyhow::Result<()> {
        use_type_names(spec, TypeNames::Qualified);
        let spec = &*spec;
        let missing: Vec<&Handler> = spec
            .handlers
            .iter()
            .filter(|h| h.test_fn().is_some() && !self.existing.has_test(h))
            .collect();
        let view = ServiceView::new(spec).with_tests(missing.iter().copied());
        let path = self.dir.join("service_test.rs");
        if !path.exists() {
            create_once(&path, &self.render("service_test.rs.j2", &view)?)?;
        } else if !missing.is_empty() {
            let stubs = self.render("service_test.stubs.rs.j2", &view)?;
            edit_source(&path, |f| {
                f.append(&stubs);
                true
            })?;
        }
        Ok(())
    }

    fn sync_signatures(&self, spec: &ServiceSpec) -> anyhow::Result<()> {
        edit_source(&self.dir.join("service.rs"), |f| {
            let mut changed = false;
            for h in &spec.handlers {
                if let Some(name) = h.implementation_fn() {
                    changed |= f.sync_fn_doc(&name, &handler_doc_text(h));
                }
            }
            changed
        })?;
        edit_source(&self.dir.join("mod.rs"), |f| {
            f.sync_inner_doc(&service_doc_text(spec))
        })?;
        Ok(())
    }

    fn propagate_error_tracing(&self) -> anyhow::Result<()> {
        let err_return = &self.gen.patterns.err_return;
        let mut rewritten = 0;
        edit_source(&self.dir.join("service.rs"), |f| {
            rewritten = f.rewrite_err_returns(err_return);
            if rewritten > 0 {
                f.ensure_use("use fabric::errors;");
            }
            rewritten > 0
        })?;
        if rewritten > 0 {
            debug!(count = rewritten, "Wrapped error returns");
        }
        Ok(())
    }
}

/// Files under `resources/` to embed, as sorted `/`-separated relative
/// paths. Rust sources and hidden entries are left out.
fn list_resources(dir: &Path) -> anyhow::Result<Vec<String>> {
    let mut names = Vec::new();
    let walker = WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(&e.file_name().to_string_lossy()));
    for entry in walker {
        let entry = entry.with_context(|| format!("Failed to walk {}", dir.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "rs") {
            continue;
        }
        let rel = path.strip_prefix(dir).unwrap_or(path);
        names.push(
            rel.components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/"),
        );
    }
    Ok(names)
}

/// Service directories below `root`, in sorted order. Hidden directories and
/// `target` are not searched.
pub fn find_services(root: &Path, spec_file: &str) -> anyhow::Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            if e.depth() == 0 || !e.file_type().is_dir() {
                return true;
            }
            let name = e.file_name().to_string_lossy();
            !is_hidden(&name) && name != "target"
        });
    for entry in walker {
        let entry = entry.with_context(|| format!("Failed to walk {}", root.display()))?;
        if entry.file_type().is_file() && entry.file_name() == spec_file {
            if let Some(parent) = entry.path().parent() {
                dirs.push(parent.to_path_buf());
            }
        }
    }
    dirs.sort();
    Ok(dirs)
}
