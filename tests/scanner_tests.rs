#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::fixtures::{ProjectFixture, CALCULATOR};
use microgen::layout::ProjectLayout;
use microgen::scanner::{
    resolve_complex_types, scan_api_types, scan_existing_code, scan_project_types, Patterns,
};
use microgen::ServiceSpec;

const SERVICE_RS: &str = r#"use fabric::{Context, Error};

impl Service {
    /// Arithmetic performs an arithmetic operation between two integers.
    pub fn arithmetic(&self, ctx: &Context, x: i64, op: String, y: i64) -> Result<(i64, String, i64, i64), Error> {
        todo!()
    }

    pub fn on_changed_max_num(&self, ctx: &Context) -> Result<(), Error> {
        Ok(())
    }

    fn helper(x: i64) -> i64 {
        x
    }
}
"#;

#[test]
fn test_scan_existing_code_reads_handwritten_files_only() {
    let project = ProjectFixture::new();
    let dir = project.service("calc", CALCULATOR);
    project.write(&dir.join("service.rs"), SERVICE_RS);
    project.write(
        &dir.join("service_test.rs"),
        "#[test]\nfn test_arithmetic() {}\n\nfn helper() {}\n",
    );
    project.write(
        &dir.join("intermediate").join("intermediate_gen.rs"),
        "fn distance(&self) {}\n",
    );
    project.write(&dir.join("version_gen.rs"), "fn tick(&self) {}\n");

    let patterns = Patterns::new().unwrap();
    let existing = scan_existing_code(&dir, &patterns).unwrap();
    assert!(existing.handlers.contains("arithmetic"));
    assert!(existing.handlers.contains("on_changed_max_num"));
    assert!(!existing.handlers.contains("helper"));
    assert!(!existing.handlers.contains("distance"));
    assert!(!existing.handlers.contains("tick"));
    assert_eq!(existing.tests.len(), 1);
    assert!(existing.tests.contains("test_arithmetic"));

    let spec = ServiceSpec::parse_yaml(CALCULATOR, "calc").unwrap();
    let implemented: Vec<&str> = spec
        .handlers
        .iter()
        .filter(|h| existing.is_implemented(h))
        .map(|h| h.name())
        .collect();
    assert_eq!(implemented, vec!["MaxNum", "Arithmetic"]);
    let tested: Vec<&str> = spec
        .handlers
        .iter()
        .filter(|h| existing.has_test(h))
        .map(|h| h.name())
        .collect();
    assert_eq!(tested, vec!["Arithmetic"]);
}

#[test]
fn test_scan_existing_code_missing_dir_is_empty() {
    let project = ProjectFixture::new();
    let patterns = Patterns::new().unwrap();
    let existing = scan_existing_code(&project.root().join("nowhere"), &patterns).unwrap();
    assert!(existing.handlers.is_empty());
    assert!(existing.tests.is_empty());
}

#[test]
fn test_project_type_index() {
    let project = ProjectFixture::new();
    let src = project.root().join("src");
    project.write(&src.join("geo").join("mod.rs"), "pub struct Point {\n    pub x: f64,\n}\n");
    project.write(&src.join("shapes").join("mod.rs"), "pub enum Shape {}\n");
    project.write(&src.join("drawing").join("shape.rs"), "pub struct Shape;\n");
    project.write(&project.root().join("target").join("debug").join("gen.rs"), "pub struct Built;\n");
    project.write(&src.join(".cache").join("x.rs"), "pub struct Cached;\n");
    let svc = project.service("svc", "general:\n  host: svc.example\n");
    project.write(&svc.join("service.rs"), "pub struct Service;\n");
    project.write(&svc.join("resources").join("embed_gen.rs"), "pub struct Embedded;\n");

    let patterns = Patterns::new().unwrap();
    let index = scan_project_types(project.root(), &patterns).unwrap();
    assert_eq!(index.unique_definition("Point", &svc), Some(src.join("geo").as_path()));
    assert_eq!(index.unique_definition("Point", &src.join("geo")), None);
    assert_eq!(index.unique_definition("Shape", &svc), None);
    assert_eq!(
        index.unique_definition("Shape", &src.join("shapes")),
        Some(src.join("drawing").as_path())
    );
    for hidden in ["Built", "Cached", "Service", "Embedded"] {
        assert_eq!(index.unique_definition(hidden, &svc), None, "{hidden}");
    }
}

#[test]
fn test_scan_api_types_includes_reexports() {
    let project = ProjectFixture::new();
    let dir = project.service("calc", CALCULATOR);
    project.write(
        &dir.join("api").join("types.rs"),
        "pub use crate::geo::Point;\n\npub struct Line {}\n",
    );
    project.write(&dir.join("api").join("client_gen.rs"), "pub struct ArithmeticIn {}\n");

    let patterns = Patterns::new().unwrap();
    let names = scan_api_types(&dir, &patterns).unwrap();
    assert!(names.contains("Point"));
    assert!(names.contains("Line"));
    assert!(!names.contains("ArithmeticIn"));
}

#[test]
fn test_resolve_complex_types() {
    let project = ProjectFixture::new();
    let src = project.root().join("src");
    project.write(&src.join("geo").join("mod.rs"), "pub struct Point {}\n");
    let dir = project.service("calc", CALCULATOR);
    let layout = ProjectLayout::discover(&dir);
    let patterns = Patterns::new().unwrap();

    let mut spec = ServiceSpec::parse_yaml(CALCULATOR, "calc").unwrap();
    resolve_complex_types(&mut spec, &dir, &layout, &patterns).unwrap();
    assert!(!spec.complex_types[0].exists);
    assert_eq!(spec.complex_types[0].package.as_deref(), Some("geo"));

    project.write(&dir.join("api").join("types.rs"), "pub struct Point {}\n");
    resolve_complex_types(&mut spec, &dir, &layout, &patterns).unwrap();
    assert!(spec.complex_types[0].exists);
    assert_eq!(spec.complex_types[0].package, None);
}
