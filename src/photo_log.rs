//! The photo log: a CSV file that is the only hand-off between stages.
//!
//! Column names and order are fixed. Rows come back in file order, which is
//! the order they were created in; nothing downstream re-sorts them.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::LogError;
use crate::output::{self, Confirm, Disposition};

pub const LOG_FILE_NAME: &str = "Photo Log.csv";

pub const HEADERS: [&str; 10] = [
    "Photo",
    "Photographer",
    "Project",
    "Site",
    "Timestamp",
    "GPSCoordinates",
    "Facing",
    "Subject",
    "Description",
    "Sequence",
];

/// One row of the photo log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoRecord {
    /// File name inside the photos folder. Unique within a log.
    #[serde(rename = "Photo")]
    pub photo: String,
    #[serde(rename = "Photographer", default)]
    pub photographer: String,
    #[serde(rename = "Project", default)]
    pub project: String,
    #[serde(rename = "Site", default)]
    pub site: String,
    #[serde(rename = "Timestamp", default)]
    pub timestamp: String,
    #[serde(rename = "GPSCoordinates", default)]
    pub gps_coordinates: String,
    #[serde(rename = "Facing", default)]
    pub facing: String,
    #[serde(rename = "Subject", default)]
    pub subject: String,
    #[serde(rename = "Description", default)]
    pub description: String,
    /// 1-based position, zero-padded to three digits.
    #[serde(rename = "Sequence", default)]
    pub sequence: String,
}

impl PhotoRecord {
    fn as_row(&self) -> [&str; 10] {
        [
            &self.photo,
            &self.photographer,
            &self.project,
            &self.site,
            &self.timestamp,
            &self.gps_coordinates,
            &self.facing,
            &self.subject,
            &self.description,
            &self.sequence,
        ]
    }
}

pub struct PhotoLog {
    path: PathBuf,
}

impl PhotoLog {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// The log that belongs to a photos folder.
    pub fn in_folder(folder: &Path) -> Self {
        Self::new(folder.join(LOG_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Write `records` as a new log, asking before replacing an existing one.
    pub fn create(
        &self,
        records: &[PhotoRecord],
        confirm: &mut dyn Confirm,
    ) -> Result<Disposition, LogError> {
        if output::claim_file(&self.path, confirm)? == Disposition::Declined {
            return Ok(Disposition::Declined);
        }
        self.write(records)?;
        tracing::info!("Wrote {} record(s) to {:?}", records.len(), self.path);
        Ok(Disposition::Ready)
    }

    fn write(&self, records: &[PhotoRecord]) -> Result<(), LogError> {
        let csv_error = |source| LogError::Csv {
            path: self.path.clone(),
            source,
        };

        // Header is written by hand so an empty set still has one.
        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(&self.path)
            .map_err(csv_error)?;

        wtr.write_record(HEADERS).map_err(csv_error)?;
        for record in records {
            wtr.write_record(record.as_row()).map_err(csv_error)?;
        }

        wtr.flush()?;
        Ok(())
    }

    /// Read every record in file order.
    pub fn load(&self) -> Result<Vec<PhotoRecord>, LogError> {
        if !self.exists() {
            return Err(LogError::Missing(self.path.clone()));
        }
        let csv_error = |source| LogError::Csv {
            path: self.path.clone(),
            source,
        };

        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(&self.path)
            .map_err(csv_error)?;

        rdr.deserialize()
            .collect::<Result<Vec<PhotoRecord>, _>>()
            .map_err(csv_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample(photo: &str, sequence: &str) -> PhotoRecord {
        PhotoRecord {
            photo: photo.to_string(),
            photographer: "J, K".to_string(),
            project: "Bridge".to_string(),
            site: "North Ridge".to_string(),
            timestamp: "2024-05-01 10:15:00".to_string(),
            gps_coordinates: "47°36'22.00\" N, 122°19'55.00\" W".to_string(),
            facing: "NE".to_string(),
            subject: "Wall A".to_string(),
            description: "cracked, badly".to_string(),
            sequence: sequence.to_string(),
        }
    }

    #[test]
    fn test_create_then_load_keeps_order() {
        let dir = tempdir().unwrap();
        let log = PhotoLog::in_folder(dir.path());
        // Deliberately not sorted: load must not reorder.
        let records = vec![sample("b.jpg", "001"), sample("a.jpg", "002")];

        let outcome = log.create(&records, &mut |_: &str| true).unwrap();

        assert_eq!(outcome, Disposition::Ready);
        assert_eq!(log.load().unwrap(), records);
    }

    #[test]
    fn test_header_row_is_fixed() {
        let dir = tempdir().unwrap();
        let log = PhotoLog::in_folder(dir.path());
        log.create(&[], &mut |_: &str| true).unwrap();

        let content = std::fs::read_to_string(log.path()).unwrap();
        assert_eq!(
            content.lines().next().unwrap(),
            "Photo,Photographer,Project,Site,Timestamp,GPSCoordinates,Facing,Subject,Description,Sequence"
        );
        assert!(log.load().unwrap().is_empty());
    }

    #[test]
    fn test_existing_log_needs_confirmation() {
        let dir = tempdir().unwrap();
        let log = PhotoLog::in_folder(dir.path());
        log.create(&[sample("a.jpg", "001")], &mut |_: &str| true)
            .unwrap();

        let mut asked = 0;
        let outcome = log
            .create(&[], &mut |_: &str| {
                asked += 1;
                false
            })
            .unwrap();

        assert_eq!(asked, 1);
        assert_eq!(outcome, Disposition::Declined);
        assert_eq!(log.load().unwrap().len(), 1);
    }

    #[test]
    fn test_hand_edited_log_without_sequence_loads() {
        let dir = tempdir().unwrap();
        let log = PhotoLog::in_folder(dir.path());
        std::fs::write(
            log.path(),
            "Photo,Photographer,Project,Site,Timestamp,GPSCoordinates,Facing,Subject,Description\n\
             a.jpg,J,,,,,,Gate,\"rusted, leaning\"\n",
        )
        .unwrap();

        let records = log.load().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].subject, "Gate");
        assert_eq!(records[0].description, "rusted, leaning");
        assert_eq!(records[0].sequence, "");
    }

    #[test]
    fn test_missing_log() {
        let dir = tempdir().unwrap();
        let log = PhotoLog::in_folder(dir.path());
        assert!(matches!(log.load(), Err(LogError::Missing(_))));
    }
}
