//! Stand-in images for when the image backend produces nothing usable.
//!
//! Both placeholders are 600x400 PNGs carrying two overlay lines. The lines
//! are always stored as `tEXt` chunks (`Title`, `Comment`); when a font is
//! loaded they are also drawn onto the canvas.

use crate::Result;
use ab_glyph::{FontVec, PxScale};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use imageproc::drawing::draw_text_mut;
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

pub const PLACEHOLDER_WIDTH: u32 = 600;
pub const PLACEHOLDER_HEIGHT: u32 = 400;

pub const FALLBACK_FILL: [u8; 3] = [73, 109, 137];
pub const ERROR_FILL: [u8; 3] = [200, 0, 0];
const TEXT_COLOR: [u8; 3] = [255, 255, 255];

pub const FALLBACK_TITLE: &str = "Image Generation Failed";
pub const FALLBACK_HINT: &str = "Please check your API settings";
pub const ERROR_TITLE: &str = "Error Generating Image";

/// Maximum number of characters of an error description shown on the error image.
pub const ERROR_DETAIL_CHARS: usize = 150;

const TITLE_KEYWORD: &str = "Title";
const COMMENT_KEYWORD: &str = "Comment";

/// 1x1 PNG in the fallback colour, used only if encoding a placeholder fails.
const MINIMAL_PNG: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, // PNG signature
    0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52, // IHDR chunk
    0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, // 1x1 pixel
    0x08, 0x02, 0x00, 0x00, 0x00, 0x90, 0x77, 0x53, 0xDE, // 8-bit RGB
    0x00, 0x00, 0x00, 0x0C, 0x49, 0x44, 0x41, 0x54, // IDAT chunk
    0x78, 0x9C, 0x63, 0xF0, 0xCC, 0xED, 0x04, 0x00, 0x02, 0x42, 0x01, 0x40, 0x75, 0xEE, 0x38,
    0x32, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4E, 0x44, // IEND chunk
    0xAE, 0x42, 0x60, 0x82,
];

#[derive(Clone, Default)]
pub struct PlaceholderRenderer {
    font: Option<Arc<FontVec>>,
}

impl PlaceholderRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a TTF/OTF font so the overlay lines are drawn visibly.
    pub fn with_font_file(path: &Path) -> Result<Self> {
        let data = std::fs::read(path)?;
        let font = FontVec::try_from_vec(data).map_err(|e| {
            crate::Error::Config(format!("Invalid font file {}: {}", path.display(), e))
        })?;
        info!("Loaded placeholder font from {}", path.display());
        Ok(Self {
            font: Some(Arc::new(font)),
        })
    }

    /// Like [`with_font_file`](Self::with_font_file) but falls back to a
    /// text-chunk-only renderer when the font cannot be loaded.
    pub fn from_optional_font(path: Option<&Path>) -> Self {
        match path {
            Some(path) => Self::with_font_file(path).unwrap_or_else(|e| {
                warn!("Placeholder text will not be drawn: {}", e);
                Self::new()
            }),
            None => Self::new(),
        }
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    /// Image for a backend that returned no usable payload.
    pub fn fallback(&self) -> Vec<u8> {
        self.render(FALLBACK_FILL, [FALLBACK_TITLE.to_string(), FALLBACK_HINT.to_string()])
    }

    /// Image for a backend call that failed with `description`.
    pub fn error(&self, description: &str) -> Vec<u8> {
        let detail: String = description.chars().take(ERROR_DETAIL_CHARS).collect();
        self.render(ERROR_FILL, [ERROR_TITLE.to_string(), format!("Error: {}", detail)])
    }

    fn render(&self, fill: [u8; 3], lines: [String; 2]) -> Vec<u8> {
        let mut canvas = RgbImage::from_pixel(PLACEHOLDER_WIDTH, PLACEHOLDER_HEIGHT, Rgb(fill));

        if let Some(font) = &self.font {
            let scale = PxScale::from(20.0);
            for (line, y) in lines.iter().zip([10, 50]) {
                draw_text_mut(&mut canvas, Rgb(TEXT_COLOR), 10, y, scale, &**font, line);
            }
        }

        match encode_with_text(&canvas, &lines) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Failed to embed placeholder text, encoding plain PNG: {}", e);
                encode_plain(canvas)
            }
        }
    }
}

/// The overlay lines stored in a placeholder PNG, in order.
///
/// Returns an empty list for images without them.
pub fn read_overlay_lines(bytes: &[u8]) -> Vec<String> {
    let mut decoder = png::Decoder::new(Cursor::new(bytes));
    decoder.set_ignore_text_chunk(false);
    let Ok(reader) = decoder.read_info() else {
        return Vec::new();
    };

    let chunks = &reader.info().uncompressed_latin1_text;
    [TITLE_KEYWORD, COMMENT_KEYWORD]
        .iter()
        .filter_map(|keyword| {
            chunks
                .iter()
                .find(|chunk| chunk.keyword == *keyword)
                .map(|chunk| chunk.text.clone())
        })
        .collect()
}

/// `tEXt` chunks are Latin-1; anything outside it is replaced.
fn to_latin1(text: &str) -> String {
    text.chars()
        .map(|c| if (c as u32) < 256 { c } else { '?' })
        .collect()
}

fn encode_with_text(
    canvas: &RgbImage,
    lines: &[String; 2],
) -> std::result::Result<Vec<u8>, png::EncodingError> {
    let mut bytes = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut bytes, canvas.width(), canvas.height());
        encoder.set_color(png::ColorType::Rgb);
        encoder.set_depth(png::BitDepth::Eight);
        encoder.add_text_chunk(TITLE_KEYWORD.to_string(), to_latin1(&lines[0]))?;
        encoder.add_text_chunk(COMMENT_KEYWORD.to_string(), to_latin1(&lines[1]))?;

        let mut writer = encoder.write_header()?;
        writer.write_image_data(canvas.as_raw())?;
        writer.finish()?;
    }
    Ok(bytes)
}

fn encode_plain(canvas: RgbImage) -> Vec<u8> {
    let mut bytes = Vec::new();
    match DynamicImage::ImageRgb8(canvas).write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png) {
        Ok(()) => bytes,
        Err(e) => {
            warn!("Failed to encode placeholder image: {}", e);
            MINIMAL_PNG.to_vec()
        }
    }
}
