use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{ArgAction, Parser, Subcommand};

use crate::config::GenConfig;
use crate::generator::{find_services, run, Outcome};
use crate::layout::ProjectLayout;
use crate::logging::{init_logging_with_config, LogConfig};
use crate::naming::is_hostname;
use crate::spec::{load_service_spec, Category, ServiceSpec};

/// Command-line interface of the microgen code generator
#[derive(Debug, Parser)]
#[command(name = "microgen", version)]
#[command(about = "Generate and maintain microservices from service.yaml", long_about = None)]
pub struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Generate a service, or every service below a directory
    Generate {
        /// Service directory or project root
        #[arg(short, long, default_value = ".")]
        dir: PathBuf,

        /// Regenerate even when the source code is unchanged
        #[arg(short, long, default_value_t = false)]
        force: bool,

        /// Do not add new services to main.rs
        #[arg(long, default_value_t = false)]
        no_register: bool,
    },
    /// Parse and validate service specifications without generating code
    Validate {
        /// Service directory or project root
        #[arg(short, long, default_value = ".")]
        dir: PathBuf,
    },
    /// Write a starter service.yaml into a new service directory
    Init {
        /// Directory of the new service
        #[arg(short, long)]
        dir: PathBuf,

        /// Host name the service will run under
        #[arg(long)]
        host: String,

        #[arg(long)]
        description: Option<String>,
    },
}

/// Parse the command line, set up logging and execute the command.
pub fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging_with_config(&LogConfig::from_env().with_verbosity(cli.verbose))?;
    execute(&cli)
}

/// Execute an already parsed command.
pub fn execute(cli: &Cli) -> anyhow::Result<()> {
    match &cli.command {
        Commands::Generate {
            dir,
            force,
            no_register,
        } => {
            let mut config = GenConfig::from_env();
            config.force |= *force;
            if *no_register {
                config.register_with_main = false;
            }
            for (service, outcome) in run(dir, &config)? {
                match outcome {
                    Outcome::Generated { version } => {
                        println!("✅ {} → version {version}", service.display());
                    }
                    Outcome::Unchanged => println!("ℹ️  {} is up to date", service.display()),
                }
            }
            Ok(())
        }
        Commands::Validate { dir } => {
            let config = GenConfig::from_env();
            let services = if dir.join(&config.spec_file).is_file() {
                vec![dir.clone()]
            } else {
                find_services(dir, &config.spec_file)?
            };
            if services.is_empty() {
                bail!("no {} found below {}", config.spec_file, dir.display());
            }
            for service in services {
                let spec = validate_service(&service, &config)?;
                println!("✅ {}: {}", spec.general.host, summary(&spec));
            }
            Ok(())
        }
        Commands::Init {
            dir,
            host,
            description,
        } => {
            let path = init_service(dir, host, description.as_deref().unwrap_or_default())?;
            println!("📄 Wrote {}", path.display());
            Ok(())
        }
    }
}

fn validate_service(dir: &Path, config: &GenConfig) -> anyhow::Result<ServiceSpec> {
    let dir = std::fs::canonicalize(dir)
        .with_context(|| format!("Failed to resolve {}", dir.display()))?;
    let layout = ProjectLayout::discover(&dir);
    load_service_spec(&dir.join(&config.spec_file), &layout.module_path(&dir))
}

/// `2 function, 1 web` style handler counts.
pub fn summary(spec: &ServiceSpec) -> String {
    let parts: Vec<String> = Category::ALL
        .iter()
        .filter_map(|&c| {
            let n = spec.by_category(c).count();
            (n > 0).then(|| format!("{n} {c}"))
        })
        .collect();
    if parts.is_empty() {
        "no handlers".to_string()
    } else {
        parts.join(", ")
    }
}

/// Write a starter `service.yaml` into `dir`, creating it if needed.
pub fn init_service(dir: &Path, host: &str, description: &str) -> anyhow::Result<PathBuf> {
    let host = host.trim().to_lowercase();
    if !is_hostname(&host) {
        bail!("invalid host '{host}'");
    }
    let path = dir.join(crate::spec::SPEC_FILE_NAME);
    if path.exists() {
        bail!("{} already exists", path.display());
    }

    let mut general = serde_yaml::Mapping::new();
    general.insert("host".into(), host.as_str().into());
    general.insert("description".into(), description.trim().into());
    general.insert("integrationTests".into(), true.into());
    let mut doc = serde_yaml::Mapping::new();
    doc.insert("general".into(), general.into());
    let text = serde_yaml::to_string(&doc).context("Failed to serialize spec")?;
    ServiceSpec::parse_yaml(&text, "").context("Starter spec does not validate")?;

    std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    std::fs::write(&path, text).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

/// Print `err` and its causes as an indented trail on stderr.
pub fn print_error_trail(err: &anyhow::Error) {
    eprintln!("❌ {err}");
    for (depth, cause) in err.chain().skip(1).enumerate() {
        eprintln!("{:indent$}└─ {cause}", "", indent = (depth + 1) * 2);
    }
}
