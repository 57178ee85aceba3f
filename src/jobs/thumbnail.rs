//! Thumbnail generation.

use std::io::Cursor;

use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader, Limits};
use thiserror::Error;

/// Widths generated for every uploaded image.
pub const DEFAULT_THUMBNAIL_WIDTHS: [u32; 3] = [500, 250, 100];

/// Byte store key of the thumbnail of `content_key` at `width`.
pub fn thumbnail_key(content_key: &str, width: u32) -> String {
    format!("{content_key}_{width}")
}

/// Errors from thumbnail generation.
#[derive(Error, Debug)]
pub enum ThumbnailError {
    /// The content is not an image in a supported format.
    #[error("cannot decode image: {0}")]
    Decode(#[source] image::ImageError),

    /// The resized image could not be encoded in the source format.
    #[error("cannot encode {width}px thumbnail: {source}")]
    Encode {
        width: u32,
        #[source]
        source: image::ImageError,
    },

    /// A zero width was requested, the source image is empty, or the
    /// thumbnail would be too large.
    #[error("invalid dimensions")]
    InvalidDimensions,
}

/// Largest accepted source side, in pixels.
const MAX_SOURCE_SIDE: u32 = 16_384;

/// Largest allocation the decoder may make.
const MAX_DECODE_ALLOC: u64 = 256 * 1024 * 1024;

/// Largest thumbnail, in pixels.
const MAX_THUMBNAIL_PIXELS: u64 = 16 * 1024 * 1024;

/// Output size for `width`: never wider than the source, aspect ratio kept.
fn target_size(image: &DynamicImage, width: u32) -> Result<(u32, u32), ThumbnailError> {
    let width = width.min(image.width());
    let height = (u64::from(image.height()) * u64::from(width) / u64::from(image.width())).max(1);
    if u64::from(width) * height > MAX_THUMBNAIL_PIXELS {
        return Err(ThumbnailError::InvalidDimensions);
    }
    let height = u32::try_from(height).map_err(|_| ThumbnailError::InvalidDimensions)?;
    Ok((width, height))
}

fn decode(bytes: &[u8]) -> Result<(DynamicImage, ImageFormat), ThumbnailError> {
    let format = image::guess_format(bytes).map_err(ThumbnailError::Decode)?;

    let mut limits = Limits::default();
    limits.max_image_width = Some(MAX_SOURCE_SIDE);
    limits.max_image_height = Some(MAX_SOURCE_SIDE);
    limits.max_alloc = Some(MAX_DECODE_ALLOC);

    let mut reader = ImageReader::with_format(Cursor::new(bytes), format);
    reader.limits(limits);
    let decoded = reader.decode().map_err(ThumbnailError::Decode)?;
    Ok((decoded, format))
}

/// Resize `bytes` to each of `widths`, keeping the aspect ratio and the
/// source format.
///
/// Images are never enlarged: a width at or above the source width yields
/// a copy at the source size, so every width still gets a thumbnail.
///
/// This is CPU-bound; async callers should run it on a blocking thread.
pub fn generate_thumbnails(
    bytes: &[u8],
    widths: &[u32],
) -> Result<Vec<(u32, Vec<u8>)>, ThumbnailError> {
    let (source, format) = decode(bytes)?;
    if source.width() == 0 || source.height() == 0 {
        return Err(ThumbnailError::InvalidDimensions);
    }

    widths
        .iter()
        .map(|&width| {
            if width == 0 {
                return Err(ThumbnailError::InvalidDimensions);
            }
            let (w, h) = target_size(&source, width)?;
            let resized = if (w, h) == (source.width(), source.height()) {
                source.clone()
            } else {
                source.resize_exact(w, h, FilterType::Triangle)
            };
            Ok((width, encode(&resized, format, width)?))
        })
        .collect()
}

fn encode(image: &DynamicImage, format: ImageFormat, width: u32) -> Result<Vec<u8>, ThumbnailError> {
    let mut out = Cursor::new(Vec::new());
    image
        .write_to(&mut out, format)
        .map_err(|source| ThumbnailError::Encode { width, source })?;
    Ok(out.into_inner())
}
