//! Watermark variant selection and placement.
//!
//! Gemini renders its logo at one of two fixed sizes, anchored a fixed distance
//! from the bottom-right corner. The size class is chosen purely from the output
//! dimensions. This is a heuristic tied to the sizes Gemini actually produces, not
//! a detector: it says where the logo *would* be, not whether it is there.

use std::fmt;

/// Images must exceed this on both axes to carry the large logo.
const LARGE_THRESHOLD: u32 = 1024;

/// Known watermark size classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WatermarkVariant {
    /// 48x48 logo, 32px margins (images where either dimension <= 1024).
    Small,
    /// 96x96 logo, 64px margins (images where both dimensions > 1024).
    Large,
}

impl WatermarkVariant {
    /// Edge length of the square logo in pixels.
    #[must_use]
    pub const fn logo_size(self) -> u32 {
        match self {
            Self::Small => 48,
            Self::Large => 96,
        }
    }

    /// Distance between the logo's right edge and the image's right edge.
    #[must_use]
    pub const fn margin_right(self) -> u32 {
        match self {
            Self::Small => 32,
            Self::Large => 64,
        }
    }

    /// Distance between the logo's bottom edge and the image's bottom edge.
    #[must_use]
    pub const fn margin_bottom(self) -> u32 {
        match self {
            Self::Small => 32,
            Self::Large => 64,
        }
    }

    /// Number of bytes in this variant's opacity map.
    #[must_use]
    pub const fn map_len(self) -> usize {
        let size = self.logo_size() as usize;
        size * size
    }
}

impl fmt::Display for WatermarkVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let size = self.logo_size();
        write!(f, "{size}x{size}")
    }
}

/// Axis-aligned rectangle in image pixel coordinates.
///
/// The origin is signed: [`compute_region`] does not clamp, so an image smaller
/// than the variant's footprint yields a negative origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    /// Left edge.
    pub x: i64,
    /// Top edge.
    pub y: i64,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Region {
    /// Whether the whole region lies inside a `width` x `height` image.
    #[must_use]
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.x >= 0
            && self.y >= 0
            && self.x + i64::from(self.width) <= i64::from(width)
            && self.y + i64::from(self.height) <= i64::from(height)
    }
}

/// Pick the watermark variant for an image of the given dimensions.
///
/// - **Large**: both width AND height > 1024
/// - **Small**: otherwise (including 1024x1024)
#[must_use]
pub fn select_variant(width: u32, height: u32) -> WatermarkVariant {
    if width > LARGE_THRESHOLD && height > LARGE_THRESHOLD {
        WatermarkVariant::Large
    } else {
        WatermarkVariant::Small
    }
}

/// Rectangle the given variant occupies in a `width` x `height` image.
///
/// No clamping is done. Callers must only use regions that pass
/// [`Region::fits_within`] for meaningful results.
#[must_use]
pub fn compute_region(width: u32, height: u32, variant: WatermarkVariant) -> Region {
    let size = variant.logo_size();
    Region {
        x: i64::from(width) - i64::from(variant.margin_right()) - i64::from(size),
        y: i64::from(height) - i64::from(variant.margin_bottom()) - i64::from(size),
        width: size,
        height: size,
    }
}
