//! Template list files: one template path per line.

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum TemplateListError {
    #[error("Cannot read template list {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Read a template list and resolve each entry.
///
/// Relative entries are resolved against the directory holding the list.
/// Blank lines and lines starting with `#` are skipped, as are entries that
/// do not exist (with a warning).
pub fn read_templates_list(list: &Path) -> Result<Vec<PathBuf>, TemplateListError> {
    let content = fs::read_to_string(list).map_err(|source| TemplateListError::Read {
        path: list.to_path_buf(),
        source,
    })?;
    let base = list.parent().unwrap_or_else(|| Path::new(""));

    let mut templates = Vec::new();
    for line in content.lines() {
        let entry = line.trim();
        if entry.is_empty() || entry.starts_with('#') {
            continue;
        }

        let path = base.join(entry);
        if path.exists() {
            info!("{}\t- OK", path.display());
            templates.push(path);
        } else {
            warn!("{}\t- not exists", path.display());
        }
    }
    Ok(templates)
}
