//! Batch driver: every capture in a directory into one report.

use crate::defaults::FILENAME_COLUMN;
use crate::header::TemplateSet;
use crate::pipeline::{process_file, MissingColumns};
use logtab_sinks::{Reporter, SinkError};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("{path} is not a directory")]
    NotADirectory { path: PathBuf },
    #[error("Cannot list directory {path}: {source}")]
    ListDirectory {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
    #[error(transparent)]
    Sink(#[from] SinkError),
}

/// Counters for one [`run_directory`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub files_processed: usize,
    pub files_skipped: usize,
    pub rows_written: u64,
}

/// `FILENAME` followed by the aggregated template header.
pub fn report_header(templates: &TemplateSet) -> Vec<String> {
    let mut header = vec![FILENAME_COLUMN.to_string()];
    header.extend(templates.header());
    header
}

/// Process every regular file directly inside `dir`, in file-name order,
/// streaming the header and then each combined row to `reporter`.
///
/// Unreadable files are skipped with a warning, as is the reporter's own
/// output file when it lives inside `dir`. Reporter failures abort.
pub fn run_directory(
    dir: &Path,
    templates: &TemplateSet,
    policy: MissingColumns,
    reporter: &mut dyn Reporter,
) -> Result<BatchSummary, BatchError> {
    if !dir.is_dir() {
        return Err(BatchError::NotADirectory {
            path: dir.to_path_buf(),
        });
    }

    reporter.write_header(&report_header(templates))?;
    let own_output = reporter
        .output_path()
        .and_then(|path| fs::canonicalize(path).ok());

    let mut summary = BatchSummary::default();
    let walker = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name();

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) if err.depth() == 0 => {
                return Err(BatchError::ListDirectory {
                    path: dir.to_path_buf(),
                    source: err,
                });
            }
            Err(err) => {
                warn!("Skipping unreadable entry: {}", err);
                summary.files_skipped += 1;
                continue;
            }
        };

        let path = entry.path();
        if !entry.file_type().is_file() {
            debug!("Skipping {} (not a regular file)", path.display());
            continue;
        }

        if own_output.is_some() && fs::canonicalize(path).ok() == own_output {
            debug!("Skipping {} (report output)", path.display());
            continue;
        }

        let rows = match process_file(path, templates, policy) {
            Ok(rows) => rows,
            Err(err) => {
                warn!("{}", err);
                summary.files_skipped += 1;
                continue;
            }
        };

        let filename = entry.file_name().to_string_lossy();
        for row in &rows {
            reporter.write_row(&filename, row)?;
            summary.rows_written += 1;
        }
        summary.files_processed += 1;
    }

    reporter.finish()?;
    info!(
        "Processed {} files ({} skipped), {} rows",
        summary.files_processed, summary.files_skipped, summary.rows_written
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::LoadedTemplate;
    use logtab_fsm::Template;
    use logtab_sinks::{CsvReport, SinkResult};
    use std::io::{self, Write};
    use std::sync::{Arc, Mutex};
    use tempfile::tempdir;
    use tracing_subscriber::fmt::MakeWriter;

    /// In-memory log sink shared with a `fmt` subscriber.
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl CapturedLogs {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for CapturedLogs {
        type Writer = CapturedLogs;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[derive(Default)]
    struct Recorder {
        header: Vec<String>,
        rows: Vec<(String, Vec<String>)>,
        finished: bool,
    }

    impl Reporter for Recorder {
        fn write_header(&mut self, columns: &[String]) -> SinkResult<()> {
            self.header = columns.to_vec();
            Ok(())
        }

        fn write_row(&mut self, filename: &str, columns: &[String]) -> SinkResult<()> {
            self.rows.push((filename.to_string(), columns.to_vec()));
            Ok(())
        }

        fn finish(&mut self) -> SinkResult<()> {
            self.finished = true;
            Ok(())
        }
    }

    fn host_set() -> TemplateSet {
        let source = "Value IP (\\d+\\.\\d+\\.\\d+\\.\\d+)\nValue HOST (\\S+)\n\nStart\n  ^ip ${IP}\n  ^host ${HOST}\n";
        TemplateSet::new(vec![LoadedTemplate::new(
            "host.template",
            Template::parse(source).unwrap(),
        )])
    }

    #[test]
    fn test_report_header_starts_with_filename() {
        assert_eq!(report_header(&host_set()), vec!["FILENAME", "IP", "HOST"]);
    }

    #[test]
    fn test_rows_are_tagged_with_file_name_in_order() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("b.log"), "ip 10.0.0.2\nhost r2\n").unwrap();
        fs::write(dir.path().join("a.log"), "ip 10.0.0.1\nhost r1\n").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested/c.log"), "ip 10.0.0.3\nhost r3\n").unwrap();

        let mut recorder = Recorder::default();
        let summary =
            run_directory(dir.path(), &host_set(), MissingColumns::Pad, &mut recorder).unwrap();

        assert_eq!(recorder.header, vec!["FILENAME", "IP", "HOST"]);
        assert_eq!(
            recorder.rows,
            vec![
                ("a.log".to_string(), vec!["10.0.0.1".to_string(), "r1".to_string()]),
                ("b.log".to_string(), vec!["10.0.0.2".to_string(), "r2".to_string()]),
            ]
        );
        assert!(recorder.finished);
        assert_eq!(
            summary,
            BatchSummary {
                files_processed: 2,
                files_skipped: 0,
                rows_written: 2,
            }
        );
    }

    #[test]
    fn test_unreadable_file_is_skipped() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.log"), "ip 10.0.0.1\nhost r1\n").unwrap();
        fs::write(dir.path().join("b.log"), [0xff, 0xfe, 0x00, 0x9f]).unwrap();
        fs::write(dir.path().join("c.log"), "ip 10.0.0.3\nhost r3\n").unwrap();

        let logs = CapturedLogs::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(logs.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .finish();

        let mut recorder = Recorder::default();
        let summary = tracing::subscriber::with_default(subscriber, || {
            run_directory(dir.path(), &host_set(), MissingColumns::Pad, &mut recorder)
        })
        .unwrap();

        let files: Vec<&str> = recorder.rows.iter().map(|(f, _)| f.as_str()).collect();
        assert_eq!(files, vec!["a.log", "c.log"]);
        assert_eq!(summary.files_processed, 2);
        assert_eq!(summary.files_skipped, 1);

        let output = logs.contents();
        let warnings: Vec<&str> = output.lines().filter(|line| line.contains("WARN")).collect();
        assert_eq!(warnings.len(), 1, "logs:\n{}", output);
        assert!(warnings[0].contains("b.log"), "logs:\n{}", output);
    }

    #[test]
    fn test_report_inside_directory_is_not_read_back() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.log"), "ip 10.0.0.1\nhost r1\n").unwrap();
        fs::write(dir.path().join("z.log"), "ip 10.0.0.26\nhost r26\n").unwrap();
        let report_path = dir.path().join("report.csv");

        let mut report = CsvReport::create(&report_path).unwrap();
        let summary =
            run_directory(dir.path(), &host_set(), MissingColumns::Pad, &mut report).unwrap();

        assert_eq!(summary.files_processed, 2);
        assert_eq!(summary.files_skipped, 0);
        assert_eq!(
            fs::read_to_string(&report_path).unwrap(),
            "\"FILENAME\",\"IP\",\"HOST\"\n\
             \"a.log\",\"10.0.0.1\",\"r1\"\n\
             \"z.log\",\"10.0.0.26\",\"r26\"\n"
        );
    }

    #[test]
    fn test_empty_directory_writes_header_only() {
        let dir = tempdir().unwrap();
        let mut recorder = Recorder::default();
        let summary =
            run_directory(dir.path(), &host_set(), MissingColumns::Pad, &mut recorder).unwrap();

        assert_eq!(recorder.header.len(), 3);
        assert!(recorder.rows.is_empty());
        assert_eq!(summary, BatchSummary::default());
    }

    #[test]
    fn test_missing_directory_is_error() {
        let dir = tempdir().unwrap();
        let mut recorder = Recorder::default();
        let err = run_directory(
            &dir.path().join("absent"),
            &host_set(),
            MissingColumns::Pad,
            &mut recorder,
        )
        .unwrap_err();

        assert!(matches!(err, BatchError::NotADirectory { .. }));
        assert!(recorder.header.is_empty());
    }
}
