//! Canonical default values shared by the library and the CLI.

/// First column of every report; holds the capture's file name.
pub const FILENAME_COLUMN: &str = "FILENAME";

/// Base name for the rolling log file (`<log dir>/logtab.log`).
pub const APP_NAME: &str = "logtab";

pub const ENV_LOG_DIR: &str = "LOGTAB_LOG_DIR";
