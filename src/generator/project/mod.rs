mod files;
mod generate;

use std::path::{Path, PathBuf};

use tracing::warn;

use crate::config::GenConfig;

pub use files::FileAction;
pub use generate::{find_services, Generator, Outcome, Phase, MAIN_MARKER};

/// Run the generator on `dir`: the service itself when it holds a spec
/// file, otherwise every service below it in sorted order.
///
/// # Errors
///
/// Stops at the first service that fails.
pub fn run(dir: &Path, config: &GenConfig) -> anyhow::Result<Vec<(PathBuf, Outcome)>> {
    let generator = Generator::new(config)?;
    if dir.join(&config.spec_file).is_file() {
        let outcome = generator.generate_service(dir)?;
        return Ok(vec![(dir.to_path_buf(), outcome)]);
    }
    let services = find_services(dir, &config.spec_file)?;
    if services.is_empty() {
        warn!(dir = %dir.display(), "No services found");
    }
    let mut outcomes = Vec::with_capacity(services.len());
    for service in services {
        let outcome = generator.generate_service(&service)?;
        outcomes.push((service, outcome));
    }
    Ok(outcomes)
}
