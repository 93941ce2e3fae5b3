//! Error types shared by every stage.
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed XML in {}: {source}", .path.display())]
    Xml {
        path: PathBuf,
        #[source]
        source: roxmltree::Error,
    },
    #[error("<{element}> is missing the `{attribute}` attribute")]
    MissingAttribute {
        element: String,
        attribute: &'static str,
    },
    #[error("<{element}> has an invalid `{attribute}` value {value:?}")]
    InvalidAttribute {
        element: String,
        attribute: &'static str,
        value: String,
    },
    #[error("no configuration file found in {}", .0.display())]
    MissingConfig(PathBuf),
    #[error("invalid configuration {}: {message}", .path.display())]
    Config {
        path: PathBuf,
        message: String,
    },
    #[error("cannot mark columns {start}..{end} of line {line:?}")]
    Markup {
        line: String,
        start: usize,
        end: usize,
    },
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {path: path.into(), source}
    }
}
