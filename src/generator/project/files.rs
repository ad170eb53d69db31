use std::fs;
use std::path::Path;

use anyhow::Context;
use tracing::{debug, info};

use crate::generator::merge::SourceFile;

/// What a run did to a single file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileAction {
    Created,
    Updated,
    Unchanged,
    /// Left alone because it already exists or does not exist yet
    Skipped,
}

impl FileAction {
    pub fn changed(self) -> bool {
        matches!(self, FileAction::Created | FileAction::Updated)
    }
}

fn read_optional(path: &Path) -> anyhow::Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
    }
}

fn write(path: &Path, content: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
}

/// Write a fully generated file, only when its content differs.
pub fn write_generated(path: &Path, content: &str) -> anyhow::Result<FileAction> {
    let action = match read_optional(path)? {
        Some(existing) if existing == content => {
            debug!(file = %path.display(), "Generated file unchanged");
            return Ok(FileAction::Unchanged);
        }
        Some(_) => FileAction::Updated,
        None => FileAction::Created,
    };
    write(path, content)?;
    info!(file = %path.display(), action = ?action, "Wrote generated file");
    Ok(action)
}

/// Write a file that belongs to the developer once it exists.
pub fn create_once(path: &Path, content: &str) -> anyhow::Result<FileAction> {
    if path.exists() {
        debug!(file = %path.display(), "Keeping existing file");
        return Ok(FileAction::Skipped);
    }
    write(path, content)?;
    info!(file = %path.display(), "Created file");
    Ok(FileAction::Created)
}

/// Apply a structural edit to an existing source file. `edit` reports
/// whether it changed anything; the file is rewritten only if so.
pub fn edit_source(
    path: &Path,
    edit: impl FnOnce(&mut SourceFile) -> bool,
) -> anyhow::Result<FileAction> {
    let Some(text) = read_optional(path)? else {
        debug!(file = %path.display(), "Nothing to edit");
        return Ok(FileAction::Skipped);
    };
    let mut file = SourceFile::parse(&text);
    if !edit(&mut file) {
        return Ok(FileAction::Unchanged);
    }
    let rendered = file.render();
    if rendered == text {
        return Ok(FileAction::Unchanged);
    }
    write(path, &rendered)?;
    info!(file = %path.display(), "Updated file");
    Ok(FileAction::Updated)
}
