//! Single-file pipeline: every template against one capture, folded into one
//! combined row set.

use crate::correlate::correlate;
use crate::header::TemplateSet;
use logtab_fsm::RowSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, error, info};

/// How a template without matches shows up in a file's rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingColumns {
    /// Empty strings at the template's position, so rows stay as wide as the header.
    #[default]
    Pad,
    /// No columns at all; rows end up narrower than the header.
    Narrow,
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Cannot read {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Run every template over `text` and correlate the results.
///
/// Starts from one zero-width row. A template whose rules raise an `Error`
/// action is logged and contributes no rows for this text.
pub fn process_text(name: &str, text: &str, templates: &TemplateSet, policy: MissingColumns) -> RowSet {
    let mut combined: RowSet = vec![Vec::new()];

    for loaded in templates.iter() {
        let template_name = loaded.path().display();
        debug!("File '{}' - template '{}'", name, template_name);

        let mut current = match loaded.template().parse_text(text) {
            Ok(rows) => rows,
            Err(err) => {
                error!("File '{}' - template '{}' - {}", name, template_name, err);
                Vec::new()
            }
        };
        debug!("Result: {:?}", current);

        if current.is_empty() {
            info!("File '{}' - template '{}' - matches not found", name, template_name);
            if policy == MissingColumns::Pad {
                current = vec![vec![String::new(); loaded.template().width()]];
            }
        }

        let outcome = correlate(combined, current);
        debug!("File '{}' - merge {}, {} rows", name, outcome.kind(), outcome.rows().len());
        combined = outcome.into_rows();
    }

    debug!("Summary result: {:?}", combined);
    combined
}

/// Read `path` once and run [`process_text`] over its contents.
pub fn process_file(path: &Path, templates: &TemplateSet, policy: MissingColumns) -> Result<RowSet, PipelineError> {
    let text = fs::read_to_string(path).map_err(|source| PipelineError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("File '{}' - opened", path.display());

    let rows = process_text(&path.display().to_string(), &text, templates, policy);
    info!("File '{}' - done", path.display());
    Ok(rows)
}
