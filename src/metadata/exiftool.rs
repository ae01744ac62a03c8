// ExifTool wrapper for reading and writing caption metadata

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use super::{CaptionUpdate, MetadataSource, RawMetadata, Tag};
use crate::error::MetadataError;

/// GPS coordinates as degrees, minutes and two-decimal seconds.
const COORD_FORMAT: &str = "%d°%d'%.2f\"";

/// Requested tags in output column order. `#` asks for the numeric value.
const READ_TAGS: [(&str, Tag); 8] = [
    ("-datetimeoriginal", Tag::CapturedAt),
    ("-artist", Tag::Artist),
    ("-creator", Tag::Creator),
    ("-imagedescription", Tag::ImageDescription),
    ("-usercomment", Tag::UserComment),
    ("-gpsposition", Tag::GpsPosition),
    ("-gpsimgdirection", Tag::GpsDirection),
    ("-orientation#", Tag::Orientation),
];

pub struct ExiftoolSource {
    program: PathBuf,
    keep_backups: bool,
}

impl ExiftoolSource {
    pub fn new(program: PathBuf, keep_backups: bool) -> Self {
        Self {
            program,
            keep_backups,
        }
    }

    /// Check the configured binary runs at all.
    pub fn is_available(&self) -> bool {
        Command::new(&self.program)
            .arg("-ver")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    fn run(&self, args: &[String], path: &Path) -> Result<Output, MetadataError> {
        let output = Command::new(&self.program)
            .args(args)
            .arg(path)
            .output()
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => MetadataError::ToolNotFound(self.program.clone()),
                _ => MetadataError::Io(e),
            })?;

        if !output.status.success() {
            return Err(MetadataError::ToolFailed {
                path: path.to_path_buf(),
                status: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(output)
    }

    fn write_args(&self, update: &CaptionUpdate) -> Vec<String> {
        let mut args = vec![
            format!("-artist={}", update.artist),
            format!("-imagedescription={}", update.caption),
            format!("-caption-abstract={}", update.caption),
            format!("-description={}", update.caption),
            // Empty assignment deletes the comment some capture apps use.
            "-usercomment=".to_string(),
        ];
        if !self.keep_backups {
            args.push("-overwrite_original".to_string());
        }
        args
    }
}

impl MetadataSource for ExiftoolSource {
    fn name(&self) -> &'static str {
        "exiftool"
    }

    fn read(&self, path: &Path) -> Result<RawMetadata, MetadataError> {
        let mut args = vec!["-T".to_string(), "-c".to_string(), COORD_FORMAT.to_string()];
        args.extend(READ_TAGS.iter().map(|(arg, _)| arg.to_string()));

        let output = self.run(&args, path)?;
        parse_tab_output(&String::from_utf8_lossy(&output.stdout)).map_err(|reason| {
            MetadataError::BadOutput {
                path: path.to_path_buf(),
                reason,
            }
        })
    }

    fn write(&self, path: &Path, update: &CaptionUpdate) -> Result<(), MetadataError> {
        self.run(&self.write_args(update), path)?;
        Ok(())
    }
}

/// Parse one `-T` line. exiftool prints `-` for tags the file does not have.
fn parse_tab_output(stdout: &str) -> Result<RawMetadata, String> {
    let line = stdout.lines().next().unwrap_or("");
    let values: Vec<&str> = line.trim_end_matches('\r').split('\t').collect();

    if values.len() != READ_TAGS.len() {
        return Err(format!(
            "expected {} columns, got {}",
            READ_TAGS.len(),
            values.len()
        ));
    }

    let mut raw = RawMetadata::new();
    for ((_, tag), value) in READ_TAGS.iter().zip(values) {
        let value = value.trim();
        if value != "-" {
            raw.set(*tag, value);
        }
    }
    Ok(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tab_output() {
        let stdout = "2024:05:01 10:15:00\tJ\tK\t-\tWall A: cracked\t47°36'22.00\" N, 122°19'55.00\" W\t45.5\t6\n";
        let raw = parse_tab_output(stdout).unwrap();

        assert_eq!(raw.get(Tag::CapturedAt), Some("2024:05:01 10:15:00"));
        assert_eq!(raw.get(Tag::Artist), Some("J"));
        assert_eq!(raw.get(Tag::Creator), Some("K"));
        assert_eq!(raw.get(Tag::ImageDescription), None);
        assert_eq!(raw.get(Tag::UserComment), Some("Wall A: cracked"));
        assert_eq!(
            raw.get(Tag::GpsPosition),
            Some("47°36'22.00\" N, 122°19'55.00\" W")
        );
        assert_eq!(raw.get(Tag::GpsDirection), Some("45.5"));
        assert_eq!(raw.get(Tag::Orientation), Some("6"));
    }

    #[test]
    fn test_parse_rejects_short_output() {
        assert!(parse_tab_output("2024:05:01 10:15:00\tJ\n").is_err());
        assert!(parse_tab_output("").is_err());
    }

    #[test]
    fn test_write_args_clear_user_comment() {
        let source = ExiftoolSource::new(PathBuf::from("exiftool"), false);
        let args = source.write_args(&CaptionUpdate {
            artist: "J".to_string(),
            caption: "Project: P. cracked".to_string(),
        });

        assert!(args.contains(&"-artist=J".to_string()));
        assert!(args.contains(&"-imagedescription=Project: P. cracked".to_string()));
        assert!(args.contains(&"-caption-abstract=Project: P. cracked".to_string()));
        assert!(args.contains(&"-description=Project: P. cracked".to_string()));
        assert!(args.contains(&"-usercomment=".to_string()));
        assert!(args.contains(&"-overwrite_original".to_string()));

        let keeping = ExiftoolSource::new(PathBuf::from("exiftool"), true);
        assert!(!keeping
            .write_args(&CaptionUpdate {
                artist: String::new(),
                caption: String::new(),
            })
            .contains(&"-overwrite_original".to_string()));
    }

    #[test]
    fn test_missing_binary_is_reported() {
        let source = ExiftoolSource::new(PathBuf::from("/nonexistent/exiftool-binary"), false);
        assert!(!source.is_available());
        match source.read(Path::new("photo.jpg")) {
            Err(MetadataError::ToolNotFound(p)) => {
                assert_eq!(p, PathBuf::from("/nonexistent/exiftool-binary"))
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
