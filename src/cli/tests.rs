//! Unit tests for CLI commands

use crate::cli::{summary, Cli, Commands};
use crate::spec::ServiceSpec;
use clap::Parser;

#[test]
fn test_generate_defaults() {
    let cli = Cli::try_parse_from(["microgen", "generate"]).unwrap();
    match cli.command {
        Commands::Generate {
            dir,
            force,
            no_register,
        } => {
            assert_eq!(dir.to_string_lossy(), ".");
            assert!(!force);
            assert!(!no_register);
        }
        _ => panic!("Expected Generate command"),
    }
    assert_eq!(cli.verbose, 0);
}

#[test]
fn test_generate_with_flags() {
    let cli = Cli::try_parse_from([
        "microgen",
        "-vv",
        "generate",
        "--dir",
        "svc",
        "--force",
        "--no-register",
    ])
    .unwrap();
    assert_eq!(cli.verbose, 2);
    match cli.command {
        Commands::Generate {
            dir,
            force,
            no_register,
        } => {
            assert_eq!(dir.to_string_lossy(), "svc");
            assert!(force);
            assert!(no_register);
        }
        _ => panic!("Expected Generate command"),
    }
}

#[test]
fn test_init_requires_host() {
    assert!(Cli::try_parse_from(["microgen", "init", "--dir", "svc"]).is_err());
    let cli = Cli::try_parse_from([
        "microgen",
        "init",
        "--dir",
        "svc",
        "--host",
        "svc.example",
    ])
    .unwrap();
    match cli.command {
        Commands::Init {
            host, description, ..
        } => {
            assert_eq!(host, "svc.example");
            assert!(description.is_none());
        }
        _ => panic!("Expected Init command"),
    }
}

#[test]
fn test_unknown_command_rejected() {
    assert!(Cli::try_parse_from(["microgen", "serve"]).is_err());
}

#[test]
fn test_summary() {
    let spec = ServiceSpec::parse_yaml(
        "general:\n  host: a.example\nfunctions:\n  - signature: A()\n  - signature: B()\nwebs:\n  - signature: Home()\n",
        "a",
    )
    .unwrap();
    assert_eq!(summary(&spec), "2 function, 1 web");

    let empty = ServiceSpec::parse_yaml("general:\n  host: a.example\n", "a").unwrap();
    assert_eq!(summary(&empty), "no handlers");
}
