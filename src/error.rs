//! Error types for the gemini-unblend crate.

use crate::position::WatermarkVariant;

/// Errors that can occur while loading opacity maps or restoring images.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The resolved variant has no loaded opacity map.
    #[error("no opacity map loaded for the {0} watermark")]
    MissingOpacityMap(WatermarkVariant),

    /// An opacity map payload does not hold exactly one byte per logo pixel.
    #[error("opacity map for the {variant} watermark has {actual} bytes, expected {expected}")]
    OpacityMapSize {
        /// Variant the map was loaded for.
        variant: WatermarkVariant,
        /// Expected byte count (`logo_size * logo_size`).
        expected: usize,
        /// Byte count actually read.
        actual: usize,
    },

    /// The image is too small to contain the watermark at its fixed position.
    #[error("image too small ({width}x{height}) for {wm_size}x{wm_size} watermark")]
    ImageTooSmall {
        /// Image width in pixels.
        width: u32,
        /// Image height in pixels.
        height: u32,
        /// Logo edge length in pixels.
        wm_size: u32,
    },

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The image format is not supported.
    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),

    /// An error occurred during image decoding or encoding.
    #[error("image processing error: {0}")]
    Image(#[from] image::ImageError),
}

/// A specialized `Result` type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
