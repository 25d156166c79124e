//! Report sinks for extracted rows.
//!
//! Each reporter receives the report header once, then one record at a time.
//! Reporters are append-only:
//! - [`CsvReport`] streams quoted, comma-delimited records to a file
//! - [`ConsoleTable`] buffers records and renders an aligned table

use chrono::{DateTime, TimeZone};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

mod console;
mod csv_report;

pub use console::ConsoleTable;
pub use csv_report::CsvReport;

pub const CSV_DELIMITER: u8 = b',';
pub const CSV_QUOTE: u8 = b'"';

/// `strftime` pattern for report files created without an explicit name.
pub const REPORT_NAME_FORMAT: &str = "report_%Y-%m-%d_%H-%M.csv";

/// Errors returned by report sinks.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("{message}")]
    Message { message: String },
    #[error("Failed to write CSV report {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("I/O error on report {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub type SinkResult<T> = std::result::Result<T, SinkError>;

impl SinkError {
    fn message(message: impl Into<String>) -> Self {
        SinkError::Message {
            message: message.into(),
        }
    }
}

/// Append-only destination for report records.
pub trait Reporter {
    /// Write the column names. Must be called once, before any row.
    fn write_header(&mut self, columns: &[String]) -> SinkResult<()>;

    /// Write one record produced from `filename`.
    fn write_row(&mut self, filename: &str, columns: &[String]) -> SinkResult<()>;

    /// Flush whatever is still buffered.
    fn finish(&mut self) -> SinkResult<()>;

    /// File the reporter writes to, if any.
    fn output_path(&self) -> Option<&Path> {
        None
    }
}

/// Report file name derived from a timestamp, e.g. `report_2020-04-16_09-30.csv`.
pub fn default_report_name<Tz>(now: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    now.format(REPORT_NAME_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_default_report_name() {
        let now = Utc.with_ymd_and_hms(2020, 4, 16, 9, 5, 59).unwrap();
        assert_eq!(default_report_name(&now), "report_2020-04-16_09-05.csv");
    }
}
