use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SlateError>;

#[derive(Error, Debug)]
pub enum SlateError {
    #[error("Empty document: {0} contains no tokens")]
    EmptyDocument(String),

    #[error("Invalid item: got {found} not {expected}")]
    InvalidSpan { expected: usize, found: usize },

    #[error("Invalid span: start {start} follows end {end}")]
    InvertedSpan { start: String, end: String },

    #[error("Invalid scope: {0}")]
    UnknownScope(String),

    #[error("Invalid annotation type: {0}")]
    UnknownAnnotationType(String),

    #[error("{path}:{line}: {message}")]
    AnnotationSyntax {
        path: String,
        line: usize,
        message: String,
    },

    #[error("{0}")]
    KeyBinding(String),

    #[error("{0}")]
    FileList(FileListReport),

    #[error("Unable to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

impl SlateError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn syntax(path: impl Into<String>, line: usize, message: impl Into<String>) -> Self {
        Self::AnnotationSyntax {
            path: path.into(),
            line,
            message: message.into(),
        }
    }
}

/// Every problem found while checking a file list, reported together.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileListReport {
    pub missing: Vec<String>,
    pub existing_outputs: Vec<String>,
}

impl FileListReport {
    pub fn is_empty(&self) -> bool {
        self.missing.is_empty() && self.existing_outputs.is_empty()
    }
}

impl fmt::Display for FileListReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Input Filename List Has Errors")?;
        if !self.missing.is_empty() {
            write!(f, "\n\nUnable to open:\n{}", self.missing.join("\n"))?;
        }
        if !self.existing_outputs.is_empty() {
            write!(
                f,
                "\n\nOutput file already exists:\n{}",
                self.existing_outputs.join("\n")
            )?;
        }
        Ok(())
    }
}
