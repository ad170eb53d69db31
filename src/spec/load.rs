use std::path::Path;

use anyhow::Context;

use super::service::{ServiceDocument, ServiceSpec};

/// Default file name of a service specification.
pub const SPEC_FILE_NAME: &str = "service.yaml";

/// Read, parse and validate a service specification file.
///
/// `package` is the module path of the service within its crate and is
/// recorded in the generated version record.
pub fn load_service_spec(path: &Path, package: &str) -> anyhow::Result<ServiceSpec> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read spec file {}", path.display()))?;
    let doc: ServiceDocument = serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse spec file {}", path.display()))?;
    let spec = ServiceSpec::from_document(&doc, package)
        .with_context(|| format!("Invalid spec file {}", path.display()))?;
    Ok(spec)
}
