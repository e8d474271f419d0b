pub mod cli;
pub use cli::{CheckOutcome, Command, ReportFormat};

use crate::sem::InternalCompilerError;
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CompilerError {
    #[error("invalid option: {0}")]
    InvalidOption(String),

    #[error(transparent)]
    InputSourceError(#[from] io::Error),

    #[error(transparent)]
    InternalCompilerError(#[from] InternalCompilerError),

    #[error("failed to write report: {0}")]
    ReportError(#[from] serde_json::Error),
}

impl From<String> for CompilerError {
    fn from(message: String) -> Self {
        CompilerError::InvalidOption(message)
    }
}
