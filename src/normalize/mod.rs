//! Turn raw per-photo tags into a canonical [`PhotoRecord`].
//!
//! Normalization is total: a field that cannot be derived is left empty and
//! the reason travels back as a [`Problem`], never as an error.

pub mod facing;

use chrono::NaiveDate;

use crate::config::{Config, DefaultsConfig};
use crate::metadata::{RawMetadata, Tag};
use crate::naming::sanitize_filename;
use crate::photo_log::PhotoRecord;
use crate::report::{BatchReport, Problem};

pub use facing::{facing, FacingPrecision};

/// Result of deriving a single field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldOutcome {
    Present(String),
    /// Nothing to derive from; not a problem.
    Absent,
    /// Input was there but unusable.
    Unavailable(Problem),
}

impl FieldOutcome {
    fn from_text(text: String) -> Self {
        if text.is_empty() {
            FieldOutcome::Absent
        } else {
            FieldOutcome::Present(text)
        }
    }

    /// Field value for the record, pushing any problem onto `problems`.
    pub fn settle(self, problems: &mut Vec<Problem>) -> String {
        match self {
            FieldOutcome::Present(value) => value,
            FieldOutcome::Absent => String::new(),
            FieldOutcome::Unavailable(problem) => {
                problems.push(problem);
                String::new()
            }
        }
    }
}

/// Subject/Description pair split out of one caption.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptionParts {
    pub subject: String,
    pub description: String,
}

pub struct Normalizer {
    defaults: DefaultsConfig,
    precision: FacingPrecision,
}

impl Normalizer {
    pub fn new(config: &Config) -> Self {
        Self {
            defaults: config.defaults.clone(),
            precision: config.facing.precision,
        }
    }

    /// Build the record for `photo`. `sequence` is 1-based.
    pub fn normalize(
        &self,
        photo: &str,
        raw: &RawMetadata,
        sequence: usize,
    ) -> (PhotoRecord, Vec<Problem>) {
        let mut problems = Vec::new();
        if let (Some(comment), Some(description)) =
            (raw.get(Tag::UserComment), raw.get(Tag::ImageDescription))
        {
            if comment != description {
                tracing::info!(
                    photo = %photo,
                    "User comment replaces image description {:?}",
                    description
                );
            }
        }
        let caption = split_caption(select_caption(raw), &self.defaults.subject_delimiter);

        let record = PhotoRecord {
            photo: photo.to_string(),
            photographer: photographer(&self.defaults.photographer, raw).settle(&mut problems),
            project: self.defaults.project.clone(),
            site: self.defaults.site.clone(),
            timestamp: timestamp(raw.get(Tag::CapturedAt)).settle(&mut problems),
            gps_coordinates: raw.get_or_empty(Tag::GpsPosition).to_string(),
            facing: facing_field(raw.get(Tag::GpsDirection), self.precision)
                .settle(&mut problems),
            subject: caption.subject,
            description: caption.description,
            sequence: format_sequence(sequence),
        };

        (record, problems)
    }

    /// Normalize photos in the given order, numbering them from 1.
    pub fn normalize_all<'a>(
        &self,
        photos: impl IntoIterator<Item = (&'a str, &'a RawMetadata)>,
    ) -> (Vec<PhotoRecord>, BatchReport) {
        let mut report = BatchReport::new();
        let mut records = Vec::new();

        for (index, (photo, raw)) in photos.into_iter().enumerate() {
            let (record, problems) = self.normalize(photo, raw, index + 1);
            for problem in problems {
                report.push(photo, problem);
            }
            records.push(record);
            report.processed += 1;
        }

        (records, report)
    }
}

/// Configured photographer wins; otherwise artist plus a different creator.
pub fn photographer(configured: &str, raw: &RawMetadata) -> FieldOutcome {
    if !configured.is_empty() {
        return FieldOutcome::Present(configured.to_string());
    }

    let mut names: Vec<&str> = Vec::new();
    if let Some(artist) = raw.get(Tag::Artist) {
        names.push(artist);
    }
    if let Some(creator) = raw.get(Tag::Creator) {
        if raw.get(Tag::Artist) != Some(creator) {
            names.push(creator);
        }
    }
    FieldOutcome::from_text(names.join(", "))
}

const UNSET_DATE: &str = "0000:00:00";

/// `2024:05:01 10:15:00` becomes `2024-05-01 10:15:00`.
pub fn timestamp(captured_at: Option<&str>) -> FieldOutcome {
    let Some(raw) = captured_at else {
        return FieldOutcome::Unavailable(Problem::MalformedTimestamp(String::new()));
    };
    let malformed = || FieldOutcome::Unavailable(Problem::MalformedTimestamp(raw.to_string()));

    // Date and time are the first two space-separated tokens; anything
    // after them (sub-seconds, offsets) is dropped.
    let mut tokens = raw.split(' ');
    let date = tokens.next().unwrap_or("");
    let Some(time) = tokens.next().filter(|t| !t.is_empty()) else {
        return malformed();
    };
    // Cameras with an unset clock write an all-zero date.
    if date != UNSET_DATE && NaiveDate::parse_from_str(date, "%Y:%m:%d").is_err() {
        return malformed();
    }

    FieldOutcome::Present(format!("{} {}", date.replace(':', "-"), time))
}

fn facing_field(direction: Option<&str>, precision: FacingPrecision) -> FieldOutcome {
    match direction {
        None => FieldOutcome::Absent,
        Some(value) => match facing(value, precision) {
            Some(label) => FieldOutcome::Present(label),
            None => FieldOutcome::Unavailable(Problem::UnparsableAzimuth(value.to_string())),
        },
    }
}

/// A non-empty user comment replaces the image description outright.
pub fn select_caption(raw: &RawMetadata) -> &str {
    raw.get(Tag::UserComment)
        .or_else(|| raw.get(Tag::ImageDescription))
        .unwrap_or("")
}

/// Split on the first `delimiter` if it sits past the second character.
pub fn split_caption(caption: &str, delimiter: &str) -> CaptionParts {
    let split_at = caption
        .find(delimiter)
        .filter(|&byte_index| caption[..byte_index].chars().count() > 1);

    match split_at {
        Some(byte_index) => CaptionParts {
            subject: sanitize_filename(caption[..byte_index].trim()),
            description: caption[byte_index + delimiter.len()..].trim().to_string(),
        },
        None => CaptionParts {
            subject: String::new(),
            description: caption.to_string(),
        },
    }
}

pub fn format_sequence(sequence: usize) -> String {
    format!("{:03}", sequence)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw() -> RawMetadata {
        RawMetadata::new()
    }

    #[test]
    fn test_photographer_config_wins() {
        let raw = raw().with(Tag::Artist, "J").with(Tag::Creator, "K");
        assert_eq!(
            photographer("Survey Team", &raw),
            FieldOutcome::Present("Survey Team".into())
        );
    }

    #[test]
    fn test_photographer_combines_artist_and_creator() {
        let same = raw().with(Tag::Artist, "J").with(Tag::Creator, "J");
        assert_eq!(photographer("", &same), FieldOutcome::Present("J".into()));

        let different = raw().with(Tag::Artist, "J").with(Tag::Creator, "K");
        assert_eq!(photographer("", &different), FieldOutcome::Present("J, K".into()));

        let creator_only = raw().with(Tag::Creator, "K");
        assert_eq!(photographer("", &creator_only), FieldOutcome::Present("K".into()));

        assert_eq!(photographer("", &raw()), FieldOutcome::Absent);
    }

    #[test]
    fn test_timestamp_reformat() {
        assert_eq!(
            timestamp(Some("2024:05:01 10:15:00")),
            FieldOutcome::Present("2024-05-01 10:15:00".into())
        );
    }

    #[test]
    fn test_timestamp_unset_clock_and_extra_tokens() {
        assert_eq!(
            timestamp(Some("0000:00:00 00:00:00")),
            FieldOutcome::Present("0000-00-00 00:00:00".into())
        );
        assert_eq!(
            timestamp(Some("2024:05:01 10:15:00 +02:00")),
            FieldOutcome::Present("2024-05-01 10:15:00".into())
        );
    }

    #[test]
    fn test_timestamp_missing_or_malformed() {
        assert_eq!(
            timestamp(None),
            FieldOutcome::Unavailable(Problem::MalformedTimestamp(String::new()))
        );
        for bad in ["2024:05:01", "yesterday at noon", "2024:13:40 10:15:00", "2024:05:01  10:15"] {
            assert_eq!(
                timestamp(Some(bad)),
                FieldOutcome::Unavailable(Problem::MalformedTimestamp(bad.into())),
                "{}",
                bad
            );
        }
    }

    #[test]
    fn test_split_caption_with_delimiter() {
        let parts = split_caption("Wall A: north face cracked", ":");
        assert_eq!(parts.subject, "Wall A");
        assert_eq!(parts.description, "north face cracked");
    }

    #[test]
    fn test_split_caption_rejoins_later_delimiters() {
        let parts = split_caption("Gate: hinge: rusted ", ":");
        assert_eq!(parts.subject, "Gate");
        assert_eq!(parts.description, "hinge: rusted");
    }

    #[test]
    fn test_split_caption_without_delimiter() {
        let parts = split_caption("no delimiter here", ":");
        assert_eq!(parts.subject, "");
        assert_eq!(parts.description, "no delimiter here");
    }

    #[test]
    fn test_split_caption_delimiter_near_start() {
        // Index 1 is not strictly greater than 1.
        let parts = split_caption("A: too short", ":");
        assert_eq!(parts.subject, "");
        assert_eq!(parts.description, "A: too short");

        let parts = split_caption(": leading", ":");
        assert_eq!(parts.subject, "");
        assert_eq!(parts.description, ": leading");
    }

    #[test]
    fn test_split_caption_sanitizes_subject() {
        let parts = split_caption("Pier 3/4 - Item: spalling", " - ");
        assert_eq!(parts.subject, "Pier 3 4");
        assert_eq!(parts.description, "Item: spalling");
    }

    #[test]
    fn test_user_comment_overrides_description() {
        let both = raw()
            .with(Tag::ImageDescription, "from camera")
            .with(Tag::UserComment, "from app");
        assert_eq!(select_caption(&both), "from app");

        let only_description = raw()
            .with(Tag::ImageDescription, "from camera")
            .with(Tag::UserComment, "");
        assert_eq!(select_caption(&only_description), "from camera");

        assert_eq!(select_caption(&raw()), "");
    }

    #[test]
    fn test_normalize_full_record() {
        let mut config = Config::default();
        config.defaults.project = "Bridge Survey".into();
        config.defaults.site = "North Ridge".into();
        let normalizer = Normalizer::new(&config);

        let raw = raw()
            .with(Tag::CapturedAt, "2024:05:01 10:15:00")
            .with(Tag::Artist, "J")
            .with(Tag::UserComment, "Wall A: north face cracked")
            .with(Tag::GpsPosition, "47°36'22.00\" N, 122°19'55.00\" W")
            .with(Tag::GpsDirection, "45");

        let (record, problems) = normalizer.normalize("IMG_0001.jpg", &raw, 7);

        assert!(problems.is_empty());
        assert_eq!(record.photo, "IMG_0001.jpg");
        assert_eq!(record.photographer, "J");
        assert_eq!(record.project, "Bridge Survey");
        assert_eq!(record.site, "North Ridge");
        assert_eq!(record.timestamp, "2024-05-01 10:15:00");
        assert_eq!(record.gps_coordinates, "47°36'22.00\" N, 122°19'55.00\" W");
        assert_eq!(record.facing, "NE");
        assert_eq!(record.subject, "Wall A");
        assert_eq!(record.description, "north face cracked");
        assert_eq!(record.sequence, "007");
    }

    #[test]
    fn test_normalize_collects_field_problems() {
        let normalizer = Normalizer::new(&Config::default());
        let raw = raw()
            .with(Tag::CapturedAt, "garbage")
            .with(Tag::GpsDirection, "north-ish");

        let (records, report) = normalizer.normalize_all([("a.jpg", &raw)]);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].timestamp, "");
        assert_eq!(records[0].facing, "");
        assert_eq!(report.processed, 1);
        assert!(report.has("a.jpg", |p| matches!(p, Problem::MalformedTimestamp(_))));
        assert!(report.has("a.jpg", |p| matches!(p, Problem::UnparsableAzimuth(_))));
    }

    #[test]
    fn test_missing_direction_is_not_a_problem() {
        let normalizer = Normalizer::new(&Config::default());
        let raw = raw().with(Tag::CapturedAt, "2024:05:01 10:15:00");

        let (record, problems) = normalizer.normalize("a.jpg", &raw, 1);

        assert_eq!(record.facing, "");
        assert!(problems.is_empty());
    }

    #[test]
    fn test_sequence_numbers_follow_input_order() {
        let normalizer = Normalizer::new(&Config::default());
        let a = raw();
        let b = raw();
        let (records, _) = normalizer.normalize_all([("a.jpg", &a), ("b.jpg", &b)]);

        assert_eq!(records[0].sequence, "001");
        assert_eq!(records[1].sequence, "002");
        assert_eq!(format_sequence(1234), "1234");
    }
}
