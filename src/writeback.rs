//! Push edited log fields back into image metadata.

use std::path::{Path, PathBuf};

use crate::metadata::{CaptionUpdate, MetadataSource};
use crate::photo_log::PhotoRecord;
use crate::report::{BatchReport, Problem};

/// Single caption stored in the description fields.
///
/// Unlike the label, the subject is not repeated: it already lives in the
/// renamed filename.
pub fn consolidated_caption(record: &PhotoRecord) -> String {
    let mut caption = String::new();
    if !record.project.is_empty() {
        caption.push_str(&format!("Project: {}. ", record.project));
    }
    if !record.site.is_empty() {
        caption.push_str(&format!("Site: {}. ", record.site));
    }
    caption.push_str(&record.description);
    caption
}

pub fn caption_update(record: &PhotoRecord) -> CaptionUpdate {
    CaptionUpdate {
        artist: record.photographer.clone(),
        caption: consolidated_caption(record),
    }
}

/// Write `record` into every file in `targets`.
///
/// Each target is attempted even if an earlier one failed; failures are
/// pushed onto `report` under the record's photo name.
pub fn writeback(
    source: &dyn MetadataSource,
    record: &PhotoRecord,
    targets: &[&Path],
    report: &mut BatchReport,
) -> bool {
    let update = caption_update(record);
    let mut ok = true;

    for target in targets {
        match source.write(target, &update) {
            Ok(()) => {
                tracing::debug!(photo = %record.photo, "Updated metadata in {:?}", target);
            }
            Err(e) => {
                ok = false;
                report.push(&record.photo, Problem::WritebackFailed(e.to_string()));
            }
        }
    }

    ok
}

/// Update the originals in `folder` for every record.
pub fn writeback_originals(
    source: &dyn MetadataSource,
    folder: &Path,
    records: &[PhotoRecord],
) -> BatchReport {
    let mut report = BatchReport::new();

    for record in records {
        let original: PathBuf = folder.join(&record.photo);
        if !original.is_file() {
            report.push(&record.photo, Problem::SourceMissing);
            continue;
        }
        if writeback(source, record, &[&original], &mut report) {
            tracing::info!(photo = %record.photo, "Original updated");
        }
        report.processed += 1;
    }

    report
}
