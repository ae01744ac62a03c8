//! Caption labels and output filenames derived from a [`PhotoRecord`].

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::photo_log::PhotoRecord;

/// Characters Windows, macOS or Linux refuse in a filename.
const INVALID_FILENAME_CHARS: [char; 9] = ['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

const ANNOTATED_SUFFIX: &str = "_Annotated";

/// Filename strategy for renamed and annotated copies.
///
/// Stored in the config as `"1"` or `"2"`, matching the menu numbering.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
pub enum NamingPolicy {
    /// `{Subject} -- {Photographer}_{stem}.{ext}`
    #[default]
    #[serde(rename = "1")]
    BySubject,
    /// `{Site}_{Subject}_{Sequence}.jpg`
    #[serde(rename = "2")]
    BySiteSequence,
}

impl NamingPolicy {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "1" => Some(NamingPolicy::BySubject),
            "2" => Some(NamingPolicy::BySiteSequence),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            NamingPolicy::BySubject => "1",
            NamingPolicy::BySiteSequence => "2",
        }
    }
}

/// Replace each filesystem-invalid character with a single space.
pub fn sanitize_filename(s: &str) -> String {
    s.chars()
        .map(|c| if INVALID_FILENAME_CHARS.contains(&c) { ' ' } else { c })
        .collect()
}

/// Caption lines for a photo, most specific first. Empty lines are dropped.
pub fn make_label(record: &PhotoRecord) -> Vec<String> {
    let mut label = Vec::new();

    let caption = join_present(&[record.subject.as_str(), record.description.as_str()], ": ");
    if !caption.is_empty() {
        label.push(caption);
    }

    label.push(format!("Original Photo: {}", record.photo));

    let project = prefixed("Project: ", &record.project);
    let site = prefixed("Site: ", &record.site);
    let place = join_present(&[project.as_str(), site.as_str()], "   ");
    if !place.is_empty() {
        label.push(place);
    }

    let facing = prefixed("Facing ", &record.facing);
    let position = join_present(&[facing.as_str(), record.gps_coordinates.as_str()], ".  ");
    if !position.is_empty() {
        label.push(position);
    }

    if !record.timestamp.is_empty() {
        label.push(record.timestamp.clone());
    }

    label
}

/// Output filename for `record` under `policy`.
///
/// Text fields are run through [`sanitize_filename`] again since the log
/// may have been edited by hand.
pub fn derive_filename(record: &PhotoRecord, policy: NamingPolicy, annotated: bool) -> String {
    let suffix = if annotated { ANNOTATED_SUFFIX } else { "" };

    match policy {
        NamingPolicy::BySubject => {
            let original = Path::new(&record.photo);
            let stem = original
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_else(|| record.photo.clone());

            let mut base = format!("{}{}", stem, suffix);
            if !record.subject.is_empty() {
                let photographer = if record.photographer.is_empty() {
                    String::new()
                } else {
                    format!("{}_", sanitize_filename(&record.photographer))
                };
                base = format!(
                    "{} -- {}{}",
                    sanitize_filename(&record.subject),
                    photographer,
                    base
                );
            }

            match original.extension() {
                Some(ext) => format!("{}.{}", base, ext.to_string_lossy()),
                None => base,
            }
        }
        NamingPolicy::BySiteSequence => format!(
            "{}_{}_{}{}.jpg",
            sanitize_filename(&record.site),
            sanitize_filename(&record.subject),
            record.sequence,
            suffix
        ),
    }
}

fn prefixed(prefix: &str, value: &str) -> String {
    if value.is_empty() {
        String::new()
    } else {
        format!("{}{}", prefix, value)
    }
}

fn join_present(parts: &[&str], separator: &str) -> String {
    parts
        .iter()
        .filter(|p| !p.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(separator)
}
