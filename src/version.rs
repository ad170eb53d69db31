//! Source-tree hashing and the version record kept in `version_gen.rs`.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use walkdir::WalkDir;

use crate::layout::is_hidden;
use crate::spec::SPEC_FILE_NAME;

/// File holding the version record of a service.
pub const VERSION_FILE_NAME: &str = "version_gen.rs";

/// Version reported by generated mocks. Never assigned to a real build.
pub const MOCK_VERSION_SENTINEL: u32 = 7357;

const RECORD_OPEN: &str = "/*microgen:version";
const RECORD_CLOSE: &str = "*/";

/// The JSON record embedded at the end of `version_gen.rs`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRecord {
    pub package: String,
    pub version: u32,
    /// RFC 3339 UTC
    pub timestamp: String,
    pub sha256: String,
}

impl VersionRecord {
    pub fn new(package: &str, version: u32, sha256: &str) -> Self {
        VersionRecord {
            package: package.to_string(),
            version,
            timestamp: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            sha256: sha256.to_string(),
        }
    }

    /// Pull the record out of the content of a `version_gen.rs`.
    pub fn parse(text: &str) -> anyhow::Result<Self> {
        let start = text
            .find(RECORD_OPEN)
            .context("version record not found")?
            + RECORD_OPEN.len();
        let len = text[start..]
            .find(RECORD_CLOSE)
            .context("version record is not terminated")?;
        serde_json::from_str(text[start..start + len].trim()).context("malformed version record")
    }
}

/// The version that follows `previous`, skipping the mock sentinel.
/// `None` once the counter is exhausted.
pub fn next_version(previous: Option<u32>) -> Option<u32> {
    let next = previous.unwrap_or(0).checked_add(1)?;
    if next == MOCK_VERSION_SENTINEL {
        next.checked_add(1)
    } else {
        Some(next)
    }
}

/// Read the record of the service in `service_dir`, if there is one.
///
/// A missing file means no record. A file that cannot be parsed is reported
/// as an error rather than silently restarting the version count.
pub fn read_record(service_dir: &Path) -> anyhow::Result<Option<VersionRecord>> {
    let path = service_dir.join(VERSION_FILE_NAME);
    let text = match std::fs::read_to_string(&path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e).with_context(|| format!("Failed to read {}", path.display())),
    };
    VersionRecord::parse(&text)
        .map(Some)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// SHA-256 over the relative paths and contents of the service's source
/// files, in sorted order.
///
/// Hidden entries, `target/`, nested service directories and the version
/// file itself are left out.
pub fn source_tree_hash(service_dir: &Path) -> anyhow::Result<String> {
    let mut hasher = Sha256::new();
    let walker = WalkDir::new(service_dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            if e.depth() == 0 {
                return true;
            }
            let name = e.file_name().to_string_lossy();
            if is_hidden(&name) {
                return false;
            }
            if e.file_type().is_dir() {
                return name != "target" && !e.path().join(SPEC_FILE_NAME).is_file();
            }
            !(e.depth() == 1 && name == VERSION_FILE_NAME)
        });
    for entry in walker {
        let entry = entry.with_context(|| format!("Failed to walk {}", service_dir.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = entry
            .path()
            .strip_prefix(service_dir)
            .unwrap_or(entry.path());
        let rel = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        let content = std::fs::read(entry.path())
            .with_context(|| format!("Failed to read {}", entry.path().display()))?;
        hasher.update(rel.as_bytes());
        hasher.update([0u8]);
        hasher.update(&content);
        hasher.update([0u8]);
    }
    Ok(hex(&hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_version_skips_sentinel() {
        assert_eq!(next_version(None), Some(1));
        assert_eq!(next_version(Some(1)), Some(2));
        assert_eq!(
            next_version(Some(MOCK_VERSION_SENTINEL - 1)),
            Some(MOCK_VERSION_SENTINEL + 1)
        );
    }

    #[test]
    fn test_next_version_exhausted() {
        assert_eq!(next_version(Some(u32::MAX - 1)), Some(u32::MAX));
        assert_eq!(next_version(Some(u32::MAX)), None);
    }

    #[test]
    fn test_parse_record() {
        let text = "pub const VERSION: u32 = 2;\n\n/*microgen:version\n{\"package\":\"calc\",\"version\":2,\"timestamp\":\"2026-01-01T00:00:00Z\",\"sha256\":\"ab\"}\n*/\n";
        let record = VersionRecord::parse(text).unwrap();
        assert_eq!(record.package, "calc");
        assert_eq!(record.version, 2);
        assert_eq!(record.sha256, "ab");
    }

    #[test]
    fn test_parse_record_missing() {
        assert!(VersionRecord::parse("pub const VERSION: u32 = 2;").is_err());
        assert!(VersionRecord::parse("/*microgen:version\n{}\n*/").is_err());
    }

    #[test]
    fn test_hash_ignores_version_file_and_hidden() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("service.rs"), "fn a() {}").unwrap();
        let h1 = source_tree_hash(dir.path()).unwrap();
        assert_eq!(h1.len(), 64);

        std::fs::write(dir.path().join(VERSION_FILE_NAME), "x").unwrap();
        std::fs::write(dir.path().join(".swp"), "x").unwrap();
        std::fs::create_dir(dir.path().join("target")).unwrap();
        std::fs::write(dir.path().join("target/out"), "x").unwrap();
        assert_eq!(source_tree_hash(dir.path()).unwrap(), h1);

        std::fs::write(dir.path().join("service.rs"), "fn b() {}").unwrap();
        assert_ne!(source_tree_hash(dir.path()).unwrap(), h1);
    }

    #[test]
    fn test_hash_skips_nested_services() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("service.rs"), "fn a() {}").unwrap();
        let h1 = source_tree_hash(dir.path()).unwrap();
        let nested = dir.path().join("child");
        std::fs::create_dir(&nested).unwrap();
        std::fs::write(nested.join(SPEC_FILE_NAME), "general: {}").unwrap();
        std::fs::write(nested.join("service.rs"), "fn c() {}").unwrap();
        assert_eq!(source_tree_hash(dir.path()).unwrap(), h1);
    }
}
