//! Contact sheet: every logged photo with its label, two per page, as a
//! Word document.
//!
//! The `.docx` is assembled directly as an Office Open XML package:
//! ```text
//! [Content_Types].xml
//! _rels/.rels
//! word/document.xml
//! word/_rels/document.xml.rels
//! word/media/image1.jpg ...
//! ```

use anyhow::{Context, Result};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::config::PaperSize;
use crate::naming::make_label;
use crate::photo_log::PhotoRecord;
use crate::report::{BatchReport, Problem};

pub const CONTACT_SHEET_FILE_NAME: &str = "Contact Sheet.docx";

const PHOTOS_PER_PAGE: usize = 2;

/// Word measures pages in twentieths of a point, drawings in EMU.
const TWIPS_PER_MM: f64 = 1440.0 / 25.4;
const EMU_PER_MM: f64 = 36_000.0;

/// Page and photo dimensions in millimetres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub width: f64,
    pub height: f64,
    pub margin: f64,
    pub photo_width: f64,
}

impl PageGeometry {
    pub fn for_paper(paper: PaperSize) -> Self {
        match paper {
            PaperSize::A4 => Self {
                width: 210.0,
                height: 297.0,
                margin: 12.0,
                photo_width: 90.0,
            },
            PaperSize::Letter => Self {
                width: 8.5 * 25.4,
                height: 11.0 * 25.4,
                margin: 0.5 * 25.4,
                photo_width: 3.5 * 25.4,
            },
        }
    }
}

fn twips(mm: f64) -> u64 {
    (mm * TWIPS_PER_MM).round() as u64
}

fn emu(mm: f64) -> u64 {
    (mm * EMU_PER_MM).round() as u64
}

/// One embedded photo.
struct Picture {
    data: Vec<u8>,
    width_emu: u64,
    height_emu: u64,
    label: Vec<String>,
    name: String,
}

/// Build the contact sheet at `destination` from the records in log order.
///
/// Photos that cannot be read are left out and reported.
pub fn build(
    folder: &Path,
    records: &[PhotoRecord],
    paper: PaperSize,
    destination: &Path,
) -> Result<BatchReport> {
    let geometry = PageGeometry::for_paper(paper);
    let mut report = BatchReport::new();
    let mut pictures = Vec::new();

    for record in records {
        match load_picture(folder, record, &geometry) {
            Ok(picture) => {
                tracing::info!(photo = %record.photo, "Added to contact sheet");
                pictures.push(picture);
                report.processed += 1;
            }
            Err(e) => report.push(&record.photo, Problem::ContactSheetImage(format!("{:#}", e))),
        }
    }

    write_package(destination, &geometry, &pictures)
        .with_context(|| format!("Failed to write {}", destination.display()))?;
    Ok(report)
}

fn load_picture(folder: &Path, record: &PhotoRecord, geometry: &PageGeometry) -> Result<Picture> {
    let path = folder.join(&record.photo);
    let data = std::fs::read(&path).with_context(|| format!("Failed to read {}", path.display()))?;
    let (w, h) = image::image_dimensions(&path)?;
    let height_mm = geometry.photo_width * h as f64 / w.max(1) as f64;

    Ok(Picture {
        data,
        width_emu: emu(geometry.photo_width),
        height_emu: emu(height_mm),
        label: make_label(record),
        name: record.photo.clone(),
    })
}

fn write_package(destination: &Path, geometry: &PageGeometry, pictures: &[Picture]) -> Result<()> {
    let file = File::create(destination)?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    // JPEG data does not shrink; store it as-is.
    let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

    zip.start_file("[Content_Types].xml", options)?;
    zip.write_all(CONTENT_TYPES.as_bytes())?;

    zip.start_file("_rels/.rels", options)?;
    zip.write_all(PACKAGE_RELS.as_bytes())?;

    zip.start_file("word/_rels/document.xml.rels", options)?;
    zip.write_all(document_rels(pictures.len()).as_bytes())?;

    zip.start_file("word/document.xml", options)?;
    zip.write_all(document_xml(geometry, pictures).as_bytes())?;

    for (index, picture) in pictures.iter().enumerate() {
        zip.start_file(format!("word/media/image{}.jpg", index + 1), stored)?;
        zip.write_all(&picture.data)?;
    }

    zip.finish()?;
    Ok(())
}

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Default Extension="jpg" ContentType="image/jpeg"/>
<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
</Types>"#;

const PACKAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
</Relationships>"#;

fn document_rels(count: usize) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
"#,
    );
    for i in 1..=count {
        xml.push_str(&format!(
            r#"<Relationship Id="rIdImage{i}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="media/image{i}.jpg"/>
"#
        ));
    }
    xml.push_str("</Relationships>");
    xml
}

fn document_xml(geometry: &PageGeometry, pictures: &[Picture]) -> String {
    let mut body = String::new();

    for (index, picture) in pictures.iter().enumerate() {
        body.push_str(&picture_paragraph(index + 1, picture));
        body.push_str(&label_paragraph(&picture.label));
        body.push_str("<w:p/>\n");
        if (index + 1) % PHOTOS_PER_PAGE == 0 {
            body.push_str("<w:p><w:r><w:br w:type=\"page\"/></w:r></w:p>\n");
        }
    }

    let margin = twips(geometry.margin);
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:wp="http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing" xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:pic="http://schemas.openxmlformats.org/drawingml/2006/picture">
<w:body>
{body}<w:sectPr><w:pgSz w:w="{w}" w:h="{h}"/><w:pgMar w:top="{m}" w:right="{m}" w:bottom="{m}" w:left="{m}" w:header="720" w:footer="720" w:gutter="0"/></w:sectPr>
</w:body>
</w:document>"#,
        body = body,
        w = twips(geometry.width),
        h = twips(geometry.height),
        m = margin,
    )
}

fn picture_paragraph(id: usize, picture: &Picture) -> String {
    let name = xml_escape(&picture.name);
    format!(
        r#"<w:p><w:r><w:drawing><wp:inline distT="0" distB="0" distL="0" distR="0"><wp:extent cx="{cx}" cy="{cy}"/><wp:docPr id="{id}" name="{name}"/><a:graphic><a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/picture"><pic:pic><pic:nvPicPr><pic:cNvPr id="{id}" name="{name}"/><pic:cNvPicPr/></pic:nvPicPr><pic:blipFill><a:blip r:embed="rIdImage{id}"/><a:stretch><a:fillRect/></a:stretch></pic:blipFill><pic:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom></pic:spPr></pic:pic></a:graphicData></a:graphic></wp:inline></w:drawing></w:r></w:p>
"#,
        cx = picture.width_emu,
        cy = picture.height_emu,
        id = id,
        name = name,
    )
}

/// Label lines in one paragraph separated by line breaks.
fn label_paragraph(lines: &[String]) -> String {
    let runs = lines
        .iter()
        .map(|line| format!("<w:t xml:space=\"preserve\">{}</w:t>", xml_escape(line)))
        .collect::<Vec<_>>()
        .join("<w:br/>");
    format!("<w:p><w:r>{}</w:r></w:p>\n", runs)
}

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;
    use std::io::Read;
    use tempfile::tempdir;

    fn record(photo: &str, subject: &str) -> PhotoRecord {
        PhotoRecord {
            photo: photo.to_string(),
            subject: subject.to_string(),
            description: "cracked".to_string(),
            ..Default::default()
        }
    }

    fn read_part(path: &Path, name: &str) -> String {
        let mut archive = zip::ZipArchive::new(File::open(path).unwrap()).unwrap();
        let mut part = archive.by_name(name).unwrap();
        let mut content = String::new();
        part.read_to_string(&mut content).unwrap();
        content
    }

    #[test]
    fn test_geometry() {
        let a4 = PageGeometry::for_paper(PaperSize::A4);
        assert_eq!(twips(a4.width), 11906);
        assert_eq!(twips(a4.height), 16838);

        let letter = PageGeometry::for_paper(PaperSize::Letter);
        assert_eq!(twips(letter.width), 12240);
        assert_eq!(twips(letter.margin), 720);
        assert_eq!(emu(letter.photo_width), 3_200_400);
    }

    #[test]
    fn test_build_contact_sheet() {
        let dir = tempdir().unwrap();
        for name in ["a.jpg", "b.jpg", "c.jpg"] {
            RgbImage::new(40, 30).save(dir.path().join(name)).unwrap();
        }
        let records = vec![
            record("a.jpg", "Wall A"),
            record("b.jpg", "Gate <west>"),
            record("c.jpg", ""),
            record("missing.jpg", ""),
        ];
        let destination = dir.path().join(CONTACT_SHEET_FILE_NAME);

        let report = build(dir.path(), &records, PaperSize::A4, &destination).unwrap();

        assert_eq!(report.processed, 3);
        assert_eq!(report.photos(), vec!["missing.jpg"]);

        let document = read_part(&destination, "word/document.xml");
        assert!(document.contains("Wall A: cracked"));
        assert!(document.contains("Gate &lt;west&gt;: cracked"));
        assert!(document.contains("Original Photo: c.jpg"));
        // 90 mm wide, 4:3 photo
        assert!(document.contains(r#"cx="3240000" cy="2430000""#));
        // One break after the second photo only.
        assert_eq!(document.matches("w:type=\"page\"").count(), 1);
        assert!(document.find("a.jpg").unwrap() < document.find("b.jpg").unwrap());

        let rels = read_part(&destination, "word/_rels/document.xml.rels");
        assert!(rels.contains("media/image3.jpg"));
        assert!(!rels.contains("media/image4.jpg"));
    }
}
