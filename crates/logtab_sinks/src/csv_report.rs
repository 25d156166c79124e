use crate::{Reporter, SinkError, SinkResult, CSV_DELIMITER, CSV_QUOTE};
use csv::{QuoteStyle, Terminator, Writer, WriterBuilder};
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// CSV report writer.
///
/// Every record is flushed as soon as it is written, so the file always holds
/// a complete prefix of the report even if the run is interrupted. Records
/// may be narrower than the header.
pub struct CsvReport {
    path: PathBuf,
    writer: Writer<File>,
    header_written: bool,
    rows_written: u64,
}

impl CsvReport {
    /// Create (or truncate) the report file at `path`.
    pub fn create(path: impl Into<PathBuf>) -> SinkResult<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| SinkError::Io {
                path: path.clone(),
                source,
            })?;
        }

        let file = File::create(&path).map_err(|source| SinkError::Io {
            path: path.clone(),
            source,
        })?;
        let writer = WriterBuilder::new()
            .delimiter(CSV_DELIMITER)
            .quote(CSV_QUOTE)
            .quote_style(QuoteStyle::Always)
            .terminator(Terminator::Any(b'\n'))
            .flexible(true)
            .from_writer(file);

        info!("Initializing CSV report: {}", path.display());

        Ok(Self {
            path,
            writer,
            header_written: false,
            rows_written: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    fn write_record<'a>(&mut self, record: impl IntoIterator<Item = &'a str>) -> SinkResult<()> {
        self.writer
            .write_record(record)
            .map_err(|source| SinkError::Csv {
                path: self.path.clone(),
                source,
            })?;
        self.writer.flush().map_err(|source| SinkError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

impl Reporter for CsvReport {
    fn write_header(&mut self, columns: &[String]) -> SinkResult<()> {
        if self.header_written {
            return Err(SinkError::message(format!(
                "Header already written to {}",
                self.path.display()
            )));
        }
        self.write_record(columns.iter().map(String::as_str))?;
        self.header_written = true;
        debug!("CSV header: {:?}", columns);
        Ok(())
    }

    fn write_row(&mut self, filename: &str, columns: &[String]) -> SinkResult<()> {
        if !self.header_written {
            return Err(SinkError::message(format!(
                "Row written to {} before its header",
                self.path.display()
            )));
        }
        self.write_record(std::iter::once(filename).chain(columns.iter().map(String::as_str)))?;
        self.rows_written += 1;
        Ok(())
    }

    fn finish(&mut self) -> SinkResult<()> {
        self.writer.flush().map_err(|source| SinkError::Io {
            path: self.path.clone(),
            source,
        })?;
        info!(
            "Committed CSV report: {} ({} rows)",
            self.path.display(),
            self.rows_written
        );
        Ok(())
    }

    fn output_path(&self) -> Option<&Path> {
        Some(&self.path)
    }
}
