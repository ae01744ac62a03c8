//! Deferred per-photo problems collected while a batch runs.

use std::fmt;

/// Something that went wrong for one photo without stopping the batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Problem {
    /// Metadata could not be read; the photo was left out of the set.
    ExtractionFailed(String),
    /// `captured_at` missing or not `YYYY:MM:DD HH:MM:SS`.
    MalformedTimestamp(String),
    /// `gps_direction` present but not a number.
    UnparsableAzimuth(String),
    /// Mirrored or unknown orientation code; the photo was not rotated.
    UnsupportedOrientation(String),
    /// Logged photo no longer exists in the folder.
    SourceMissing,
    /// Derived output name already taken by an earlier photo in the batch.
    OutputCollision(String),
    CopyFailed(String),
    AnnotateFailed(String),
    WritebackFailed(String),
    ContactSheetImage(String),
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Problem::ExtractionFailed(e) => write!(f, "metadata could not be read ({})", e),
            Problem::MalformedTimestamp(raw) if raw.is_empty() => {
                write!(f, "no capture timestamp")
            }
            Problem::MalformedTimestamp(raw) => write!(f, "malformed timestamp {:?}", raw),
            Problem::UnparsableAzimuth(raw) => write!(f, "unparsable direction {:?}", raw),
            Problem::UnsupportedOrientation(code) => {
                write!(f, "orientation {} is not supported, left unrotated", code)
            }
            Problem::SourceMissing => write!(f, "photo is missing from the folder"),
            Problem::OutputCollision(name) => {
                write!(f, "output name {:?} is already used by another photo, skipped", name)
            }
            Problem::CopyFailed(e) => write!(f, "copy failed ({})", e),
            Problem::AnnotateFailed(e) => write!(f, "annotation failed ({})", e),
            Problem::WritebackFailed(e) => write!(f, "metadata update failed ({})", e),
            Problem::ContactSheetImage(e) => write!(f, "not added to contact sheet ({})", e),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    pub photo: String,
    pub problem: Problem,
}

/// Problems gathered over one stage, in the order they happened.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub processed: usize,
    pub warnings: Vec<Warning>,
}

impl BatchReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, photo: impl Into<String>, problem: Problem) {
        let photo = photo.into();
        tracing::warn!(photo = %photo, "{}", problem);
        self.warnings.push(Warning { photo, problem });
    }

    pub fn merge(&mut self, other: BatchReport) {
        self.processed += other.processed;
        self.warnings.extend(other.warnings);
    }

    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    /// Photos with at least one problem, deduplicated, first-seen order.
    pub fn photos(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for warning in &self.warnings {
            if !seen.contains(&warning.photo.as_str()) {
                seen.push(&warning.photo);
            }
        }
        seen
    }

    pub fn has(&self, photo: &str, matches: impl Fn(&Problem) -> bool) -> bool {
        self.warnings
            .iter()
            .any(|w| w.photo == photo && matches(&w.problem))
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.warnings.is_empty() {
            return write!(f, "{} photo(s) processed.", self.processed);
        }
        writeln!(
            f,
            "{} photo(s) processed, {} problem(s):",
            self.processed,
            self.warnings.len()
        )?;
        for warning in &self.warnings {
            writeln!(f, " - {}: {}", warning.photo, warning.problem)?;
        }
        Ok(())
    }
}
