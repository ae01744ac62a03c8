//! A working session over one photos folder.
//!
//! The session holds what the stages share: the folder, its sorted photo
//! list and the raw metadata read when it was loaded. Everything else a
//! stage needs comes from the photo log on disk, so each stage can be
//! re-run on its own.

use anyhow::Result;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::annotate::{quarter_turns, Annotate, Annotator};
use crate::config::Config;
use crate::contact_sheet::{self, CONTACT_SHEET_FILE_NAME};
use crate::error::SessionError;
use crate::metadata::{MetadataSource, RawMetadata, Tag};
use crate::naming::{derive_filename, make_label};
use crate::normalize::Normalizer;
use crate::output::{self, Confirm, Disposition};
use crate::photo_log::{PhotoLog, PhotoRecord};
use crate::report::{BatchReport, Problem};
use crate::writeback::{writeback, writeback_originals};

pub const ANNOTATED_DIR: &str = "Annotated Photos";
pub const RENAMED_DIR: &str = "Renamed Photos";

/// How a stage ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
    Completed(BatchReport),
    /// The user said no to an overwrite; nothing was changed.
    Declined,
}

pub struct Session {
    config: Config,
    source: Box<dyn MetadataSource>,
    folder: Option<PathBuf>,
    photos: Vec<String>,
    raw: HashMap<String, RawMetadata>,
}

impl Session {
    pub fn new(config: Config, source: Box<dyn MetadataSource>) -> Self {
        Self {
            config,
            source,
            folder: None,
            photos: Vec::new(),
            raw: HashMap::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn set_config(&mut self, config: Config) {
        self.config = config;
    }

    pub fn folder(&self) -> Option<&Path> {
        self.folder.as_deref()
    }

    /// Photos read successfully at load time, sorted by name.
    pub fn photos(&self) -> &[String] {
        &self.photos
    }

    pub fn raw(&self, photo: &str) -> Option<&RawMetadata> {
        self.raw.get(photo)
    }

    pub fn log(&self) -> Option<PhotoLog> {
        self.folder.as_deref().map(PhotoLog::in_folder)
    }

    pub fn contact_sheet_path(&self) -> Option<PathBuf> {
        self.folder.as_ref().map(|f| f.join(CONTACT_SHEET_FILE_NAME))
    }

    fn require_folder(&self) -> Result<&Path, SessionError> {
        self.folder.as_deref().ok_or(SessionError::NoFolder)
    }

    /// Read every JPEG in `input` and cache its metadata.
    ///
    /// On an input error the previous folder is forgotten. Photos whose
    /// metadata cannot be read are left out and reported; if that leaves
    /// nothing, the folder is not loaded.
    pub fn load_folder(&mut self, input: &str) -> Result<BatchReport, SessionError> {
        self.folder = None;
        self.photos.clear();
        self.raw.clear();

        let folder = clean_folder_input(input);
        if !folder.is_dir() {
            return Err(SessionError::FolderMissing(folder));
        }

        let candidates = discover_photos(&folder, &self.config.scanner.image_extensions);
        if candidates.is_empty() {
            return Err(SessionError::NoImages(folder));
        }

        let mut report = BatchReport::new();
        for name in candidates {
            match self.source.read(&folder.join(&name)) {
                Ok(raw) => {
                    tracing::debug!(photo = %name, "Metadata read");
                    self.raw.insert(name.clone(), raw);
                    self.photos.push(name);
                    report.processed += 1;
                }
                Err(e) => report.push(name, Problem::ExtractionFailed(e.to_string())),
            }
        }

        if self.photos.is_empty() {
            return Err(SessionError::NothingReadable { folder, report });
        }

        tracing::info!(
            "Loaded {} photo(s) from {:?} using {} source",
            self.photos.len(),
            folder,
            self.source.name()
        );
        self.folder = Some(folder);
        Ok(report)
    }

    /// Normalize every loaded photo into a fresh photo log.
    pub fn build_log(&self, confirm: &mut dyn Confirm) -> Result<StageOutcome> {
        let folder = self.require_folder()?;
        let normalizer = Normalizer::new(&self.config);

        let (records, report) = normalizer.normalize_all(
            self.photos
                .iter()
                .filter_map(|p| self.raw.get(p).map(|raw| (p.as_str(), raw))),
        );

        match PhotoLog::in_folder(folder).create(&records, confirm)? {
            Disposition::Declined => Ok(StageOutcome::Declined),
            Disposition::Ready => Ok(StageOutcome::Completed(report)),
        }
    }

    fn load_records(&self) -> Result<(&Path, Vec<PhotoRecord>)> {
        let folder = self.require_folder()?;
        let records = PhotoLog::in_folder(folder).load()?;
        Ok((folder, records))
    }

    /// Copy each logged photo into the renamed folder under its derived name.
    pub fn rename_photos(&self, confirm: &mut dyn Confirm) -> Result<StageOutcome> {
        let (folder, records) = self.load_records()?;
        let out_dir = folder.join(RENAMED_DIR);
        if output::replace_dir(&out_dir, confirm)? == Disposition::Declined {
            return Ok(StageOutcome::Declined);
        }

        let policy = self.config.naming.format;
        let mut report = BatchReport::new();
        let mut names = OutputNames::default();

        for record in &records {
            let original = folder.join(&record.photo);
            if !original.is_file() {
                report.push(&record.photo, Problem::SourceMissing);
                continue;
            }

            let name = derive_filename(record, policy, false);
            if !names.claim(&name) {
                report.push(&record.photo, Problem::OutputCollision(name));
                continue;
            }

            let renamed = out_dir.join(name);
            if let Err(e) = std::fs::copy(&original, &renamed) {
                report.push(&record.photo, Problem::CopyFailed(e.to_string()));
                continue;
            }
            tracing::info!(photo = %record.photo, "Renamed to {:?}", renamed);

            if self.config.writeback.derivatives {
                writeback(self.source.as_ref(), record, &[&renamed], &mut report);
            }
            report.processed += 1;
        }

        Ok(StageOutcome::Completed(report))
    }

    /// Write a captioned copy of each logged photo.
    pub fn annotate_photos(&self, confirm: &mut dyn Confirm) -> Result<StageOutcome> {
        let (folder, records) = self.load_records()?;
        // Fail on a missing font before anything on disk changes.
        let annotator = Annotator::new(&self.config.annotation)?;
        self.annotate_records(folder, &records, &annotator, confirm)
    }

    fn annotate_records(
        &self,
        folder: &Path,
        records: &[PhotoRecord],
        annotator: &dyn Annotate,
        confirm: &mut dyn Confirm,
    ) -> Result<StageOutcome> {
        let out_dir = folder.join(ANNOTATED_DIR);
        if output::replace_dir(&out_dir, confirm)? == Disposition::Declined {
            return Ok(StageOutcome::Declined);
        }

        let policy = self.config.naming.format;
        let mut report = BatchReport::new();
        let mut names = OutputNames::default();

        for record in records {
            let original = folder.join(&record.photo);
            if !original.is_file() {
                report.push(&record.photo, Problem::SourceMissing);
                continue;
            }

            let name = derive_filename(record, policy, true);
            if !names.claim(&name) {
                report.push(&record.photo, Problem::OutputCollision(name));
                continue;
            }

            let orientation = self.raw(&record.photo).and_then(|raw| raw.get(Tag::Orientation));
            let turns = match quarter_turns(orientation) {
                Some(turns) => turns,
                None => {
                    let code = orientation.unwrap_or_default().to_string();
                    report.push(&record.photo, Problem::UnsupportedOrientation(code));
                    0
                }
            };

            let annotated = out_dir.join(name);
            if let Err(e) = annotator.annotate(&original, turns, &make_label(record), &annotated) {
                report.push(&record.photo, Problem::AnnotateFailed(format!("{:#}", e)));
                continue;
            }
            tracing::info!(photo = %record.photo, "Annotated as {:?}", annotated);

            let mut targets: Vec<&Path> = Vec::new();
            if self.config.writeback.derivatives {
                targets.push(&annotated);
            }
            if self.config.annotation.update_originals {
                targets.push(&original);
            }
            writeback(self.source.as_ref(), record, &targets, &mut report);
            report.processed += 1;
        }

        Ok(StageOutcome::Completed(report))
    }

    pub fn build_contact_sheet(&self, confirm: &mut dyn Confirm) -> Result<StageOutcome> {
        let (folder, records) = self.load_records()?;
        let destination = folder.join(CONTACT_SHEET_FILE_NAME);
        if output::claim_file(&destination, confirm)? == Disposition::Declined {
            return Ok(StageOutcome::Declined);
        }

        let report = contact_sheet::build(
            folder,
            &records,
            self.config.defaults.paper_size,
            &destination,
        )?;
        Ok(StageOutcome::Completed(report))
    }

    /// Write every logged caption back into the original photos.
    pub fn update_originals(&self, confirm: &mut dyn Confirm) -> Result<StageOutcome> {
        let (folder, records) = self.load_records()?;
        let question = format!(
            "Update the metadata of {} original photo(s) in \u{201c}{}\u{201d}? Type \u{201c}Y\u{201d} to continue.",
            records.len(),
            folder.display()
        );
        if !confirm.confirm(&question) {
            return Ok(StageOutcome::Declined);
        }

        Ok(StageOutcome::Completed(writeback_originals(
            self.source.as_ref(),
            folder,
            &records,
        )))
    }
}

/// File names already written into one output directory during a batch.
///
/// Compared case-insensitively since macOS and Windows folders are.
#[derive(Default)]
struct OutputNames(HashSet<String>);

impl OutputNames {
    /// False if `name` was already taken.
    fn claim(&mut self, name: &str) -> bool {
        self.0.insert(name.to_lowercase())
    }
}

/// Tidy a typed or drag-and-dropped folder path.
pub fn clean_folder_input(input: &str) -> PathBuf {
    let mut cleaned = input
        .trim()
        .trim_matches('\'')
        .trim_matches('"')
        .trim()
        .to_string();

    // Terminals escape spaces in dropped paths with backslashes.
    if cfg!(unix) {
        cleaned = cleaned.replace('\\', "");
    }

    if let Some(rest) = cleaned.strip_prefix('~') {
        if let Some(home) = dirs::home_dir() {
            return PathBuf::from(format!("{}{}", home.display(), rest));
        }
    }

    PathBuf::from(cleaned)
}

/// Non-hidden files directly in `folder` with a matching extension, sorted.
pub fn discover_photos(folder: &Path, extensions: &[String]) -> Vec<String> {
    let mut photos: Vec<String> = WalkDir::new(folder)
        .min_depth(1)
        .max_depth(1)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| {
            let name = e.file_name().to_string_lossy().to_string();
            let ext = e.path().extension()?.to_string_lossy().to_lowercase();
            let wanted = extensions.iter().any(|x| x.to_lowercase() == ext);
            (wanted && !name.starts_with('.')).then_some(name)
        })
        .collect();

    photos.sort();
    photos
}
