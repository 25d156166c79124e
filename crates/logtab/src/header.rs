//! Template loading and report header aggregation.

use logtab_fsm::{FsmError, Template};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// A template could not be turned into a usable [`Template`].
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Template {path} could not be read: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: FsmError,
    },
    #[error("Template {path} is malformed: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: FsmError,
    },
}

impl TemplateError {
    fn from_fsm(path: &Path, source: FsmError) -> Self {
        let path = path.to_path_buf();
        match source {
            FsmError::Load { .. } => TemplateError::Load { path, source },
            _ => TemplateError::Parse { path, source },
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            TemplateError::Load { path, .. } | TemplateError::Parse { path, .. } => path,
        }
    }
}

/// A compiled template together with the path it came from.
#[derive(Debug)]
pub struct LoadedTemplate {
    path: PathBuf,
    template: Template,
}

impl LoadedTemplate {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TemplateError> {
        let path = path.as_ref();
        let template = Template::from_path(path).map_err(|err| TemplateError::from_fsm(path, err))?;
        Ok(Self {
            path: path.to_path_buf(),
            template,
        })
    }

    pub fn new(path: impl Into<PathBuf>, template: Template) -> Self {
        Self {
            path: path.into(),
            template,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn template(&self) -> &Template {
        &self.template
    }
}

/// Templates of one run, loaded once, in the order they were given.
#[derive(Debug, Default)]
pub struct TemplateSet {
    templates: Vec<LoadedTemplate>,
}

impl TemplateSet {
    /// Load every template. The first failure aborts loading.
    pub fn load<P: AsRef<Path>>(paths: &[P]) -> Result<Self, TemplateError> {
        let templates = paths
            .iter()
            .map(|path| LoadedTemplate::load(path))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { templates })
    }

    pub fn new(templates: Vec<LoadedTemplate>) -> Self {
        Self { templates }
    }

    /// Concatenation of every template's header, in template order.
    pub fn header(&self) -> Vec<String> {
        let header = aggregate_headers(self.templates.iter().map(|t| t.template.header()));
        debug!("Total header: {:?}", header);
        header
    }

    pub fn width(&self) -> usize {
        self.templates.iter().map(|t| t.template.width()).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LoadedTemplate> {
        self.templates.iter()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

/// Read each template and concatenate the headers in input order.
///
/// Repeated column names across templates are kept.
pub fn header_for_paths<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<String>, TemplateError> {
    let paths: Vec<&Path> = paths.iter().map(|p| p.as_ref()).collect();
    debug!("Reading header for templates {:?}", paths);
    let mut headers = Vec::with_capacity(paths.len());
    for path in paths {
        headers.push(LoadedTemplate::load(path)?.template.header());
    }
    Ok(aggregate_headers(headers))
}

fn aggregate_headers(headers: impl IntoIterator<Item = Vec<String>>) -> Vec<String> {
    headers.into_iter().flatten().collect()
}
