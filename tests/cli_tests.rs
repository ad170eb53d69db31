#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use clap::Parser;
use common::fixtures::{read, ProjectFixture, CALCULATOR};
use microgen::cli::{execute, init_service, Cli};
use microgen::spec::load_service_spec;

#[test]
fn test_init_writes_valid_spec() {
    let project = ProjectFixture::new();
    let dir = project.root().join("src").join("hello");
    let path = init_service(&dir, " Hello.Example ", "Says hello.").unwrap();
    assert_eq!(path, dir.join("service.yaml"));

    let spec = load_service_spec(&path, "hello").unwrap();
    assert_eq!(spec.general.host, "hello.example");
    assert_eq!(spec.general.description, "Says hello.");
    assert!(spec.general.integration_tests);
    assert!(spec.handlers.is_empty());
}

#[test]
fn test_init_refuses_to_overwrite() {
    let project = ProjectFixture::new();
    let dir = project.service("calc", CALCULATOR);
    let err = init_service(&dir, "calc.example", "").unwrap_err();
    assert!(err.to_string().contains("already exists"), "{err}");
    assert_eq!(read(&dir.join("service.yaml")), CALCULATOR);
}

#[test]
fn test_init_rejects_invalid_host() {
    let project = ProjectFixture::new();
    let dir = project.root().join("src").join("bad");
    let err = init_service(&dir, "bad..host", "").unwrap_err();
    assert!(err.to_string().contains("invalid host"), "{err}");
    assert!(!dir.exists());
}

#[test]
fn test_validate_command() {
    let project = ProjectFixture::new();
    project.service("calc", CALCULATOR);
    let root = project.root().to_string_lossy().into_owned();
    let cli = Cli::try_parse_from(["microgen", "validate", "--dir", &root]).unwrap();
    execute(&cli).unwrap();

    project.service("broken", "general:\n  host: broken.example\nfunctions:\n  - signature: lower()\n");
    let err = execute(&cli).unwrap_err();
    assert!(format!("{err:#}").contains("invalid signature"), "{err:#}");
}

#[test]
fn test_validate_command_without_services() {
    let project = ProjectFixture::new();
    let root = project.root().to_string_lossy().into_owned();
    let cli = Cli::try_parse_from(["microgen", "validate", "--dir", &root]).unwrap();
    let err = execute(&cli).unwrap_err();
    assert!(err.to_string().contains("no service.yaml found"), "{err}");
}

#[test]
fn test_init_then_generate() {
    let project = ProjectFixture::new();
    let dir = project.root().join("src").join("hello");
    let dir_arg = dir.to_string_lossy().into_owned();
    let init = Cli::try_parse_from([
        "microgen",
        "init",
        "--dir",
        &dir_arg,
        "--host",
        "hello.example",
    ])
    .unwrap();
    execute(&init).unwrap();

    let generate =
        Cli::try_parse_from(["microgen", "generate", "--dir", &dir_arg, "--no-register"]).unwrap();
    execute(&generate).unwrap();
    assert!(dir.join("mod.rs").is_file());
    assert!(dir.join("service.rs").is_file());
    assert!(read(&dir.join("version_gen.rs")).contains("pub const VERSION: u32 = 1;"));
    assert_eq!(
        read(&project.root().join("src").join("main.rs")),
        common::fixtures::MAIN_RS
    );
}
