//! logtab - Core Library
//!
//! Applies a list of TextFSM templates to every capture in a directory and
//! correlates the per-template rows of each capture into one flat report.
//!
//! ```text
//! text ──► template 1 ──► rows ─┐
//!      ──► template 2 ──► rows ─┼─► correlate ─► FILENAME + row ─► reporter
//!      ──► template N ──► rows ─┘
//! ```

pub mod batch;
pub mod correlate;
pub mod defaults;
pub mod header;
pub mod pipeline;
pub mod templates;

pub use batch::{report_header, run_directory, BatchError, BatchSummary};
pub use correlate::{correlate, Correlation};
pub use header::{header_for_paths, LoadedTemplate, TemplateError, TemplateSet};
pub use logtab_fsm::{Row, RowSet, Template};
pub use logtab_sinks as sinks;
pub use pipeline::{process_file, process_text, MissingColumns, PipelineError};
pub use templates::{read_templates_list, TemplateListError};
