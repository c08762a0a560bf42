use crate::{Error, Result};
use image::imageops::FilterType;
use image::DynamicImage;

pub const MAX_DISPLAY_WIDTH: u32 = 800;
pub const MAX_DISPLAY_HEIGHT: u32 = 600;

/// Target size for an image that must fit inside the display bounds.
///
/// Images already within bounds keep their size; larger ones are scaled down
/// by a single ratio so the aspect ratio is preserved.
pub fn display_dimensions(width: u32, height: u32) -> (u32, u32) {
    if width <= MAX_DISPLAY_WIDTH && height <= MAX_DISPLAY_HEIGHT {
        return (width, height);
    }

    let ratio = f64::min(
        MAX_DISPLAY_WIDTH as f64 / width as f64,
        MAX_DISPLAY_HEIGHT as f64 / height as f64,
    );
    let scaled_width = ((width as f64 * ratio) as u32).max(1);
    let scaled_height = ((height as f64 * ratio) as u32).max(1);
    (scaled_width, scaled_height)
}

/// Decode `bytes` and shrink them to fit the display, with Lanczos resampling.
pub fn fit_for_display_sync(bytes: &[u8]) -> Result<DynamicImage> {
    let image = image::load_from_memory(bytes)?;
    let (width, height) = display_dimensions(image.width(), image.height());

    if (width, height) == (image.width(), image.height()) {
        Ok(image)
    } else {
        Ok(image.resize_exact(width, height, FilterType::Lanczos3))
    }
}

/// [`fit_for_display_sync`] on the blocking pool.
pub async fn fit_for_display(bytes: Vec<u8>) -> Result<DynamicImage> {
    tokio::task::spawn_blocking(move || fit_for_display_sync(&bytes))
        .await
        .map_err(|e| Error::Invariant(format!("Image scaling task join error: {}", e)))?
}
