use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::naming::NamingPolicy;
use crate::normalize::facing::FacingPrecision;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub metadata: MetadataConfig,

    #[serde(default)]
    pub defaults: DefaultsConfig,

    #[serde(default)]
    pub facing: FacingConfig,

    #[serde(default)]
    pub naming: NamingConfig,

    #[serde(default)]
    pub annotation: AnnotationConfig,

    #[serde(default)]
    pub writeback: WritebackConfig,

    #[serde(default)]
    pub scanner: ScannerConfig,

    #[serde(default)]
    pub viewer: ViewerConfig,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Shell out to the exiftool binary (reads and writes).
    #[default]
    Exiftool,
    /// Read EXIF in-process. Cannot write captions back.
    Embedded,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetadataConfig {
    #[serde(default)]
    pub source: SourceKind,

    #[serde(default = "default_exiftool_path")]
    pub exiftool: PathBuf,

    /// Keep exiftool's `*_original` backup files after writing.
    #[serde(default)]
    pub keep_backups: bool,
}

fn default_exiftool_path() -> PathBuf {
    if cfg!(target_os = "macos") {
        PathBuf::from("/usr/local/bin/exiftool")
    } else if cfg!(target_os = "windows") {
        PathBuf::from("exiftool.exe")
    } else {
        PathBuf::from("exiftool")
    }
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            source: SourceKind::default(),
            exiftool: default_exiftool_path(),
            keep_backups: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaperSize {
    #[default]
    A4,
    Letter,
}

impl PaperSize {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "a4" => Some(PaperSize::A4),
            "letter" => Some(PaperSize::Letter),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PaperSize::A4 => "a4",
            PaperSize::Letter => "letter",
        }
    }
}

/// Values stamped onto every record of a new photo log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DefaultsConfig {
    #[serde(default)]
    pub paper_size: PaperSize,

    #[serde(default = "default_subject_delimiter")]
    pub subject_delimiter: String,

    /// When set, replaces artist/creator from the photos.
    #[serde(default)]
    pub photographer: String,

    #[serde(default)]
    pub project: String,

    #[serde(default)]
    pub site: String,
}

fn default_subject_delimiter() -> String {
    ":".to_string()
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            paper_size: PaperSize::default(),
            subject_delimiter: default_subject_delimiter(),
            photographer: String::new(),
            project: String::new(),
            site: String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FacingConfig {
    #[serde(default)]
    pub precision: FacingPrecision,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NamingConfig {
    #[serde(default)]
    pub format: NamingPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnnotationConfig {
    /// Explicit TrueType/OpenType font. When unset the usual system
    /// locations are searched.
    #[serde(default)]
    pub font: Option<PathBuf>,

    #[serde(default = "default_font_size")]
    pub font_size: f32,

    /// Height of the caption band added below the photo, in pixels.
    #[serde(default = "default_band_height")]
    pub band_height: u32,

    #[serde(default = "default_margin")]
    pub margin: u32,

    /// Distance from the bottom of the canvas to the first label line.
    #[serde(default = "default_text_offset")]
    pub text_offset: u32,

    #[serde(default = "default_line_spacing")]
    pub line_spacing: u32,

    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,

    /// Also write the caption back into the original when annotating.
    #[serde(default)]
    pub update_originals: bool,
}

fn default_font_size() -> f32 {
    46.0
}

fn default_band_height() -> u32 {
    320
}

fn default_margin() -> u32 {
    20
}

fn default_text_offset() -> u32 {
    290
}

fn default_line_spacing() -> u32 {
    20
}

fn default_jpeg_quality() -> u8 {
    80
}

impl Default for AnnotationConfig {
    fn default() -> Self {
        Self {
            font: None,
            font_size: default_font_size(),
            band_height: default_band_height(),
            margin: default_margin(),
            text_offset: default_text_offset(),
            line_spacing: default_line_spacing(),
            jpeg_quality: default_jpeg_quality(),
            update_originals: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WritebackConfig {
    /// Write the consolidated caption into renamed and annotated copies.
    #[serde(default = "default_derivatives")]
    pub derivatives: bool,
}

fn default_derivatives() -> bool {
    true
}

impl Default for WritebackConfig {
    fn default() -> Self {
        Self {
            derivatives: default_derivatives(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScannerConfig {
    #[serde(default = "default_image_extensions")]
    pub image_extensions: Vec<String>,
}

fn default_image_extensions() -> Vec<String> {
    vec!["jpg".to_string(), "jpeg".to_string()]
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            image_extensions: default_image_extensions(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ViewerConfig {
    /// Program used to open the photo log and contact sheet
    /// If not set, uses system default (xdg-open on Linux, open on macOS)
    #[serde(default)]
    pub external_viewer: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load the file at `path`, writing a default one first if it is missing.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            let config: Config = toml::from_str(&content)
                .with_context(|| format!("Invalid config {}", path.display()))?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save_to(path)?;
            tracing::info!("Wrote default config to {:?}", path);
            Ok(config)
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        Ok(())
    }

    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("photocap")
    }

    /// `PHOTOCAP_CONFIG` wins over the per-user default location.
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("PHOTOCAP_CONFIG") {
            return PathBuf::from(path);
        }
        Self::config_dir().join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_writes_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = Config::load_from(&path).unwrap();

        assert!(path.exists());
        assert_eq!(config.defaults.subject_delimiter, ":");
        assert_eq!(config.facing.precision, FacingPrecision::Coarse);
        assert_eq!(config.naming.format, NamingPolicy::BySubject);
        assert_eq!(config.annotation.band_height, 320);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[defaults]
site = "North Ridge"
paper_size = "letter"

[facing]
precision = "fine"

[naming]
format = "2"
"#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();

        assert_eq!(config.defaults.site, "North Ridge");
        assert_eq!(config.defaults.paper_size, PaperSize::Letter);
        assert_eq!(config.defaults.subject_delimiter, ":");
        assert_eq!(config.facing.precision, FacingPrecision::Fine);
        assert_eq!(config.naming.format, NamingPolicy::BySiteSequence);
        assert_eq!(config.metadata.source, SourceKind::Exiftool);
    }

    #[test]
    fn test_save_round_trips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.defaults.photographer = "J. Smith".to_string();
        config.facing.precision = FacingPrecision::Precise;
        config.save_to(&path).unwrap();

        assert_eq!(Config::load_from(&path).unwrap(), config);
    }
}
