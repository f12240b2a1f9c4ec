//! Poster bytes and the decode step.

use image::{GenericImageView, ImageFormat};

use super::error::OmdbError;

/// Raw poster as fetched from its URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Poster {
    /// Response body.
    pub bytes: Vec<u8>,
    /// `Content-Type` header, if any.
    pub content_type: Option<String>,
}

/// A poster whose bytes were verified to be an image.
#[derive(Debug, Clone)]
pub struct DecodedPoster {
    /// Original bytes.
    pub bytes: Vec<u8>,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Detected container format.
    pub format: ImageFormat,
}

/// Decodes poster bytes to validate them and read their dimensions.
///
/// # Errors
///
/// Returns [`OmdbError::ImageDecode`] if the bytes are not a supported image.
pub fn decode_poster(poster: Poster) -> Result<DecodedPoster, OmdbError> {
    let format = image::guess_format(&poster.bytes).map_err(OmdbError::ImageDecode)?;
    let decoded = image::load_from_memory_with_format(&poster.bytes, format)
        .map_err(OmdbError::ImageDecode)?;
    let (width, height) = decoded.dimensions();

    tracing::debug!(
        ?format,
        width,
        height,
        content_type = poster.content_type.as_deref().unwrap_or("-"),
        "Poster decoded"
    );

    Ok(DecodedPoster {
        bytes: poster.bytes,
        width,
        height,
        format,
    })
}
