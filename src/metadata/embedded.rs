use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use exif::{Exif, In, Value};

use super::{CaptionUpdate, MetadataSource, RawMetadata, Tag};
use crate::error::MetadataError;

/// Reads EXIF in-process with kamadak-exif.
///
/// XMP is not parsed, so `creator` is always absent. Writing is not
/// supported; configure the exiftool source to update photos.
pub struct EmbeddedSource;

impl MetadataSource for EmbeddedSource {
    fn name(&self) -> &'static str {
        "embedded"
    }

    fn read(&self, path: &Path) -> Result<RawMetadata, MetadataError> {
        let file = File::open(path)?;
        let mut bufreader = BufReader::new(file);

        let exif = match exif::Reader::new().read_from_container(&mut bufreader) {
            Ok(exif) => exif,
            // A JPEG without an APP1 segment simply has no tags.
            Err(exif::Error::NotFound(_)) => return Ok(RawMetadata::new()),
            Err(source) => {
                return Err(MetadataError::Exif {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        Ok(collect_tags(&exif))
    }

    fn write(&self, _path: &Path, _update: &CaptionUpdate) -> Result<(), MetadataError> {
        Err(MetadataError::WriteUnsupported {
            source_name: self.name(),
        })
    }
}

fn collect_tags(exif: &Exif) -> RawMetadata {
    let mut raw = RawMetadata::new();

    if let Some(v) = ascii(exif, exif::Tag::DateTimeOriginal) {
        raw.set(Tag::CapturedAt, v);
    }
    if let Some(v) = ascii(exif, exif::Tag::Artist) {
        raw.set(Tag::Artist, v);
    }
    if let Some(v) = ascii(exif, exif::Tag::ImageDescription) {
        raw.set(Tag::ImageDescription, v);
    }
    if let Some(field) = exif.get_field(exif::Tag::UserComment, In::PRIMARY) {
        if let Value::Undefined(ref bytes, _) = field.value {
            raw.set(Tag::UserComment, decode_user_comment(bytes));
        }
    }
    if let Some(v) = gps_position(exif) {
        raw.set(Tag::GpsPosition, v);
    }
    if let Some(field) = exif.get_field(exif::Tag::GPSImgDirection, In::PRIMARY) {
        if let Value::Rational(ref v) = field.value {
            if let Some(r) = v.first().filter(|r| r.denom != 0) {
                raw.set(Tag::GpsDirection, format_number(r.to_f64()));
            }
        }
    }
    if let Some(code) = exif
        .get_field(exif::Tag::Orientation, In::PRIMARY)
        .and_then(|f| f.value.get_uint(0))
    {
        raw.set(Tag::Orientation, code.to_string());
    }

    raw
}

fn ascii(exif: &Exif, tag: exif::Tag) -> Option<String> {
    let field = exif.get_field(tag, In::PRIMARY)?;
    match field.value {
        Value::Ascii(ref parts) => {
            let first = parts.first()?;
            Some(
                String::from_utf8_lossy(first)
                    .trim_end_matches('\0')
                    .trim()
                    .to_string(),
            )
        }
        _ => None,
    }
}

/// UserComment carries an 8-byte character code before the text.
fn decode_user_comment(bytes: &[u8]) -> String {
    if bytes.len() < 8 {
        return String::new();
    }
    let (code, text) = bytes.split_at(8);
    let decoded = if code.starts_with(b"UNICODE") {
        let units: Vec<u16> = text
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        String::from_utf16_lossy(&units)
    } else {
        String::from_utf8_lossy(text).to_string()
    };
    decoded
        .trim_end_matches(|c: char| c == '\0' || c.is_whitespace())
        .trim_start()
        .to_string()
}

/// Same degrees/minutes/seconds layout the exiftool source asks for.
fn gps_position(exif: &Exif) -> Option<String> {
    let lat = dms(exif, exif::Tag::GPSLatitude, exif::Tag::GPSLatitudeRef)?;
    let lon = dms(exif, exif::Tag::GPSLongitude, exif::Tag::GPSLongitudeRef)?;
    Some(format!("{}, {}", lat, lon))
}

fn dms(exif: &Exif, value_tag: exif::Tag, ref_tag: exif::Tag) -> Option<String> {
    let field = exif.get_field(value_tag, In::PRIMARY)?;
    let reference = ascii(exif, ref_tag)?;
    match field.value {
        Value::Rational(ref v) if v.len() >= 3 && v.iter().all(|r| r.denom != 0) => {
            Some(format_dms(
                v[0].to_f64(),
                v[1].to_f64(),
                v[2].to_f64(),
                &reference,
            ))
        }
        _ => None,
    }
}

fn format_dms(degrees: f64, minutes: f64, seconds: f64, reference: &str) -> String {
    // Fold fractional degrees/minutes down so the output stays d°m's".
    let total = degrees + minutes / 60.0 + seconds / 3600.0;
    let d = total.trunc();
    let m = ((total - d) * 60.0).trunc();
    let s = (total - d - m / 60.0) * 3600.0;
    format!("{}°{}'{:.2}\" {}", d as u32, m as u32, s, reference)
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_ascii_user_comment() {
        let mut bytes = b"ASCII\0\0\0".to_vec();
        bytes.extend_from_slice(b"Wall A: cracked\0\0");
        assert_eq!(decode_user_comment(&bytes), "Wall A: cracked");
    }

    #[test]
    fn test_decode_unicode_user_comment() {
        let mut bytes = b"UNICODE\0".to_vec();
        for unit in "Gate".encode_utf16() {
            bytes.extend_from_slice(&unit.to_be_bytes());
        }
        assert_eq!(decode_user_comment(&bytes), "Gate");
        assert_eq!(decode_user_comment(b"ASC"), "");
    }

    #[test]
    fn test_format_dms() {
        assert_eq!(format_dms(47.0, 36.0, 22.0, "N"), "47°36'22.00\" N");
        assert_eq!(format_dms(122.0, 19.5, 0.0, "W"), "122°19'30.00\" W");
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(45.0), "45");
        assert_eq!(format_number(123.4), "123.4");
    }

    #[test]
    fn test_file_without_exif_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plain.jpg");
        image::RgbImage::new(4, 4).save(&path).unwrap();

        let raw = EmbeddedSource.read(&path).unwrap();
        assert_eq!(raw, RawMetadata::new());
    }

    #[test]
    fn test_write_is_unsupported() {
        let result = EmbeddedSource.write(
            Path::new("x.jpg"),
            &CaptionUpdate {
                artist: String::new(),
                caption: String::new(),
            },
        );
        assert!(matches!(result, Err(MetadataError::WriteUnsupported { .. })));
    }
}
