use std::io;
use std::path::PathBuf;

use thiserror::Error;

// Any of these aborts the current WED file only; the driver reports it and
// moves on to the next input file.
#[derive(Debug, Error)]
pub enum Error {
    // readable, but not what its name claims
    #[error("{}: {reason}", .path.display())]
    Format { path: PathBuf, reason: String },

    #[error("{context}: {source}")]
    Io { context: String, source: io::Error },

    #[error("{}: tiles ({primary}, {secondary}): palette quantization failed: {source}", .path.display())]
    Quantization {
        path: PathBuf,
        primary: u32,
        secondary: u32,
        source: imagequant::Error,
    },

    // a WED file and its TIS store disagree
    #[error("{0}")]
    Conversion(String),
}

impl Error {
    pub fn format(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Error::Format {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        Error::Io {
            context: context.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
