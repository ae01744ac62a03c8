use std::path::PathBuf;
use thiserror::Error;

use crate::report::BatchReport;

/// Failure talking to a metadata source for a single photo.
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("metadata tool not found at {0}")]
    ToolNotFound(PathBuf),

    #[error("metadata tool exited with {status} for {path}: {stderr}")]
    ToolFailed {
        path: PathBuf,
        status: i32,
        stderr: String,
    },

    #[error("unexpected metadata tool output for {path}: {reason}")]
    BadOutput { path: PathBuf, reason: String },

    #[error("failed to read EXIF from {path}: {source}")]
    Exif {
        path: PathBuf,
        #[source]
        source: exif::Error,
    },

    #[error("{source_name} source cannot write metadata")]
    WriteUnsupported { source_name: &'static str },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Failure reading or writing the photo log.
#[derive(Debug, Error)]
pub enum LogError {
    #[error("photo log not found at {0}")]
    Missing(PathBuf),

    #[error("photo log {path} is malformed: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Input problems that abort a command before anything is touched.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("folder {0} does not exist")]
    FolderMissing(PathBuf),

    #[error("there were no valid JPEG images in {0}")]
    NoImages(PathBuf),

    #[error("metadata could not be read from any image in {folder}. {report}")]
    NothingReadable { folder: PathBuf, report: BatchReport },

    #[error("no photos folder is loaded")]
    NoFolder,
}
