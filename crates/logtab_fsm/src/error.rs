//! Template engine error types

use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, FsmError>;

#[derive(Error, Debug)]
pub enum FsmError {
    #[error("Cannot read template {path}: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Template syntax error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Error action raised at input line {line}: {message}")]
    Action { line: usize, message: String },
}

impl FsmError {
    pub(crate) fn parse(line: usize, message: impl Into<String>) -> Self {
        FsmError::Parse {
            line,
            message: message.into(),
        }
    }
}
