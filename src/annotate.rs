//! Burn the caption label into a copy of each photo.
//!
//! The photo is rotated upright, a caption band is added below it without
//! scaling the picture, and the label lines are drawn into the band.

use ab_glyph::{FontVec, PxScale};
use anyhow::{anyhow, Context, Result};
use image::codecs::jpeg::JpegEncoder;
use image::{imageops, DynamicImage, Rgb, RgbImage};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use crate::config::AnnotationConfig;

/// EXIF orientation codes in counter-clockwise quarter-turn order.
/// Mirrored orientations (2, 4, 5, 7) are not handled.
const ORIENTATIONS: [&str; 4] = ["1", "8", "3", "6"];

const TEXT_COLOR: Rgb<u8> = Rgb([255, 255, 255]);
const BAND_COLOR: Rgb<u8> = Rgb([0, 0, 0]);

const FONT_CANDIDATES: [&str; 8] = [
    "/System/Library/Fonts/Helvetica.ttc",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation-sans/LiberationSans-Regular.ttf",
];

/// Counter-clockwise quarter turns needed to show the photo upright.
///
/// A missing code means no rotation. Returns `None` for codes outside the
/// supported four.
pub fn quarter_turns(orientation: Option<&str>) -> Option<u8> {
    let code = orientation.map(str::trim).unwrap_or("1");
    ORIENTATIONS
        .iter()
        .position(|o| *o == code)
        .map(|index| index as u8)
}

pub fn rotate(img: DynamicImage, turns: u8) -> DynamicImage {
    match turns % 4 {
        1 => img.rotate270(),
        2 => img.rotate180(),
        3 => img.rotate90(),
        _ => img,
    }
}

/// Place `img` at the top-left of a canvas `band` pixels taller.
pub fn extend_canvas(img: &RgbImage, band: u32) -> RgbImage {
    let mut canvas = RgbImage::from_pixel(img.width(), img.height() + band, BAND_COLOR);
    imageops::replace(&mut canvas, img, 0, 0);
    canvas
}

/// Top-left corner of each label line on a canvas `canvas_height` tall.
pub fn line_origins(
    canvas_height: u32,
    lines: usize,
    settings: &AnnotationConfig,
) -> Vec<(i32, i32)> {
    let first = canvas_height as i32 - settings.text_offset as i32;
    let step = settings.font_size.round() as i32 + settings.line_spacing as i32;
    (0..lines)
        .map(|i| (settings.margin as i32, first + step * i as i32))
        .collect()
}

/// Writes the captioned copy of one photo.
pub trait Annotate {
    fn annotate(
        &self,
        source: &Path,
        turns: u8,
        label: &[String],
        destination: &Path,
    ) -> Result<()>;
}

/// Draws labels with a TrueType font.
pub struct Annotator {
    font: FontVec,
    settings: AnnotationConfig,
}

impl Annotator {
    /// Load the configured font, or the first system font found.
    pub fn new(settings: &AnnotationConfig) -> Result<Self> {
        let font_path = match settings.font {
            Some(ref path) => path.clone(),
            None => find_system_font().ok_or_else(|| {
                anyhow!("No usable font found; set annotation.font in the config")
            })?,
        };

        let data = std::fs::read(&font_path)
            .with_context(|| format!("Failed to read font {}", font_path.display()))?;
        let font = FontVec::try_from_vec_and_index(data, 0)
            .map_err(|e| anyhow!("Invalid font {}: {}", font_path.display(), e))?;
        tracing::debug!("Annotating with font {:?}", font_path);

        Ok(Self {
            font,
            settings: settings.clone(),
        })
    }
}

impl Annotate for Annotator {
    /// Rotate `source` upright, add the caption band and save to `destination`.
    fn annotate(
        &self,
        source: &Path,
        turns: u8,
        label: &[String],
        destination: &Path,
    ) -> Result<()> {
        let img = image::open(source)
            .with_context(|| format!("Failed to open {}", source.display()))?;
        let upright = rotate(img, turns).to_rgb8();
        let mut canvas = extend_canvas(&upright, self.settings.band_height);

        let scale = PxScale::from(self.settings.font_size);
        let origins = line_origins(canvas.height(), label.len(), &self.settings);
        for (line, (x, y)) in label.iter().zip(origins) {
            imageproc::drawing::draw_text_mut(
                &mut canvas,
                TEXT_COLOR,
                x,
                y,
                scale,
                &self.font,
                line,
            );
        }

        let file = File::create(destination)
            .with_context(|| format!("Failed to create {}", destination.display()))?;
        let mut writer = BufWriter::new(file);
        canvas.write_with_encoder(JpegEncoder::new_with_quality(
            &mut writer,
            self.settings.jpeg_quality,
        ))?;
        Ok(())
    }
}

fn find_system_font() -> Option<PathBuf> {
    FONT_CANDIDATES
        .iter()
        .map(|p| PathBuf::from(*p))
        .find(|p| p.is_file())
}
