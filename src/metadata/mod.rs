//! Raw per-photo metadata and the sources that produce it.
//!
//! The normalizer never looks at where tags came from. Both the exiftool
//! subprocess and the in-process EXIF reader hand back the same
//! [`RawMetadata`] shape, keyed by [`Tag`].

pub mod embedded;
pub mod exiftool;

use std::collections::BTreeMap;
use std::path::Path;

use crate::config::{MetadataConfig, SourceKind};
use crate::error::MetadataError;

pub use embedded::EmbeddedSource;
pub use exiftool::ExiftoolSource;

/// Tags the pipeline understands. Anything else is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tag {
    CapturedAt,
    Artist,
    Creator,
    ImageDescription,
    UserComment,
    GpsPosition,
    GpsDirection,
    Orientation,
}

/// Tag values for one photo as the source reported them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawMetadata {
    tags: BTreeMap<Tag, String>,
}

impl RawMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, tag: Tag, value: impl Into<String>) -> Self {
        self.set(tag, value);
        self
    }

    pub fn set(&mut self, tag: Tag, value: impl Into<String>) {
        self.tags.insert(tag, value.into());
    }

    /// Absent and empty values are the same thing.
    pub fn get(&self, tag: Tag) -> Option<&str> {
        self.tags
            .get(&tag)
            .map(|v| v.as_str())
            .filter(|v| !v.is_empty())
    }

    pub fn get_or_empty(&self, tag: Tag) -> &str {
        self.get(tag).unwrap_or("")
    }
}

/// Fields written back into a photo's metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptionUpdate {
    pub artist: String,
    pub caption: String,
}

/// Where raw metadata comes from, and where captions go back to.
pub trait MetadataSource {
    fn name(&self) -> &'static str;

    fn read(&self, path: &Path) -> Result<RawMetadata, MetadataError>;

    /// Store `update` in the description fields of `path` and clear any
    /// app-specific comment so the description is the only caption left.
    fn write(&self, path: &Path, update: &CaptionUpdate) -> Result<(), MetadataError>;
}

pub fn source_for(config: &MetadataConfig) -> Box<dyn MetadataSource> {
    match config.source {
        SourceKind::Exiftool => Box::new(ExiftoolSource::new(
            config.exiftool.clone(),
            config.keep_backups,
        )),
        SourceKind::Embedded => Box::new(EmbeddedSource),
    }
}
