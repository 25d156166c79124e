//! CLI modes: one capture to a console table, or a directory to a CSV report.

pub mod error;

use crate::cli::error::HelpfulError;
use anyhow::{Context, Result};
use chrono::Local;
use logtab::sinks::{default_report_name, ConsoleTable, CsvReport, Reporter};
use logtab::{
    process_file, read_templates_list, run_directory, MissingColumns, PipelineError,
    TemplateError, TemplateSet,
};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug)]
pub struct RunArgs {
    pub directory: Option<PathBuf>,
    pub file: Option<PathBuf>,
    pub template: Option<PathBuf>,
    pub templates_list: Option<PathBuf>,
    pub report_name: Option<PathBuf>,
    pub policy: MissingColumns,
}

enum TemplateSource<'a> {
    Single(&'a Path),
    List(&'a Path),
}

pub fn run(args: RunArgs) -> Result<()> {
    debug!("Arguments: {:?}", args);

    let source = match (&args.template, &args.templates_list) {
        (Some(template), _) => TemplateSource::Single(template),
        (None, Some(list)) => TemplateSource::List(list),
        (None, None) => return Err(HelpfulError::missing_inputs().into()),
    };

    match (&args.file, &args.directory) {
        (Some(file), _) => match source {
            TemplateSource::Single(template) => parse_single(file, template),
            TemplateSource::List(list) => {
                let templates = load_list(list)?;
                parse_combined(file, &templates, args.policy)
            }
        },
        (None, Some(dir)) => {
            let templates = match source {
                TemplateSource::Single(template) => load_templates(&[template.to_path_buf()])?,
                TemplateSource::List(list) => load_list(list)?,
            };
            let report = args.report_name.clone().unwrap_or_else(|| {
                PathBuf::from(default_report_name(&Local::now()))
            });
            write_report(dir, &templates, &report, args.policy)
        }
        (None, None) => Err(HelpfulError::missing_inputs().into()),
    }
}

/// `-f` with `-t`: the template's own rows, no correlation.
fn parse_single(file: &Path, template: &Path) -> Result<()> {
    let templates = load_templates(&[template.to_path_buf()])?;
    let loaded = templates
        .iter()
        .next()
        .context("template set is unexpectedly empty")?;

    let text = read_capture(file)?;
    let rows = loaded
        .template()
        .parse_text(&text)
        .map_err(|err| HelpfulError::invalid_template(template, &err.to_string()))?;

    let mut table = ConsoleTable::new(false);
    table.write_header(&loaded.template().header())?;
    for row in &rows {
        table.write_row(&file.display().to_string(), row)?;
    }
    table.finish()?;
    Ok(())
}

/// `-f` with `-l`: every template over one capture, correlated.
fn parse_combined(file: &Path, templates: &TemplateSet, policy: MissingColumns) -> Result<()> {
    let rows = process_file(file, templates, policy).map_err(|err| match err {
        PipelineError::FileRead { path, .. } if !path.exists() => HelpfulError::file_not_found(&path),
        PipelineError::FileRead { path, source } => {
            HelpfulError::cannot_read_file(&path, &source.to_string())
        }
    })?;

    let mut table = ConsoleTable::new(false);
    table.write_header(&templates.header())?;
    for row in &rows {
        table.write_row(&file.display().to_string(), row)?;
    }
    table.finish()?;
    Ok(())
}

/// `-D`: every capture of the directory into a CSV report.
fn write_report(
    dir: &Path,
    templates: &TemplateSet,
    report: &Path,
    policy: MissingColumns,
) -> Result<()> {
    if !dir.is_dir() {
        return Err(HelpfulError::not_a_directory(dir).into());
    }

    let mut sink = CsvReport::create(report)
        .map_err(|err| HelpfulError::cannot_write_report(report, &err.to_string()))?;
    info!("Report filename: {}", sink.path().display());

    let summary = run_directory(dir, templates, policy, &mut sink)
        .with_context(|| format!("Failed to build report {}", report.display()))?;
    info!(
        "{} files, {} rows written to {}",
        summary.files_processed,
        summary.rows_written,
        sink.path().display()
    );
    Ok(())
}

fn load_list(list: &Path) -> Result<TemplateSet> {
    if !list.exists() {
        return Err(HelpfulError::file_not_found(list).into());
    }
    let paths = read_templates_list(list)?;
    if paths.is_empty() {
        return Err(HelpfulError::empty_template_list(list).into());
    }
    load_templates(&paths)
}

fn load_templates(paths: &[PathBuf]) -> Result<TemplateSet> {
    TemplateSet::load(paths).map_err(|err| {
        let helpful = match &err {
            TemplateError::Load { path, .. } if !path.exists() => HelpfulError::file_not_found(path),
            TemplateError::Load { path, source } => {
                HelpfulError::cannot_read_file(path, &source.to_string())
            }
            TemplateError::Parse { path, source } => {
                HelpfulError::invalid_template(path, &source.to_string())
            }
        };
        anyhow::Error::new(helpful).context(format!("Loading templates ({})", err.path().display()))
    })
}

fn read_capture(file: &Path) -> Result<String> {
    if !file.exists() {
        return Err(HelpfulError::file_not_found(file).into());
    }
    std::fs::read_to_string(file)
        .map_err(|err| HelpfulError::cannot_read_file(file, &err.to_string()).into())
}
