//! logtab command line
//!
//! Parses network device captures with TextFSM templates and prints a table
//! for one capture or writes a CSV report for a directory of captures.

use clap::{ArgAction, Parser};
use logtab::defaults::{APP_NAME, ENV_LOG_DIR};
use logtab::MissingColumns;
use logtab_logging::{init_logging, LogConfig};
use std::path::PathBuf;
use std::process::ExitCode;

mod cli;

#[derive(Parser, Debug)]
#[command(
    name = "logtab",
    about = "Correlate TextFSM extractions from captures into one table or CSV report"
)]
struct Cli {
    /// Directory of captures; every regular file in it goes into the report
    #[arg(short = 'D', long, conflicts_with = "file")]
    directory: Option<PathBuf>,

    /// Single capture to parse and print as a table
    #[arg(short = 'f', long)]
    file: Option<PathBuf>,

    /// One TextFSM template
    #[arg(short = 't', long, conflicts_with = "templates_list")]
    template: Option<PathBuf>,

    /// File listing templates, one path per line, relative to the list
    #[arg(short = 'l', long = "templates-list", visible_aliases = ["tl", "templates_list"])]
    templates_list: Option<PathBuf>,

    /// Report file for directory mode (default: report_<date>_<time>.csv)
    #[arg(short = 'R', long = "report-name")]
    report_name: Option<PathBuf>,

    /// Print debug output to stderr
    #[arg(short = 'V', long, action = ArgAction::Count)]
    verbose: u8,

    /// Leave out the columns of templates without matches instead of
    /// filling them with empty values
    #[arg(long)]
    narrow_rows: bool,

    /// Directory for the rolling log file
    #[arg(long, env = ENV_LOG_DIR)]
    log_dir: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let args = cli::RunArgs {
        directory: cli.directory,
        file: cli.file,
        template: cli.template,
        templates_list: cli.templates_list,
        report_name: cli.report_name,
        policy: if cli.narrow_rows {
            MissingColumns::Narrow
        } else {
            MissingColumns::Pad
        },
    };

    let config = LogConfig {
        app_name: APP_NAME,
        verbosity: cli.verbose,
        log_dir: cli.log_dir,
    };
    let result = match init_logging(config) {
        Ok(logging) => logging.in_scope(|| {
            tracing::debug!("Log file: {}", logging.log_file().display());
            cli::run(args)
        }),
        Err(err) => {
            eprintln!("Warning: failed to initialize logging: {:?}", err);
            cli::run(args)
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{:?}", err);
            ExitCode::from(1)
        }
    }
}
