//! Reverse alpha blending.
//!
//! Gemini composites its logo as flat white weighted by a per-pixel coverage
//! byte `a`:
//! `c = original * (255 - a) / 255 + a`
//!
//! Solving for the original gives
//! `original = 255 * (c - a) / (255 - a)`,
//! which is what this module applies, in place, to the three colour channels.

use std::ops::{Deref, DerefMut};

use image::{ImageBuffer, Rgba};

use crate::opacity::OpacityMap;
use crate::position::Region;

/// Coverage below this is treated as compression noise and left alone.
pub const ALPHA_THRESHOLD: u8 = 2;

/// Coverage is capped here so the divisor never reaches zero.
pub const MAX_ALPHA: u8 = 254;

/// Recover one colour channel from its composited value `c` and coverage `a`.
///
/// `a` must already be in `[ALPHA_THRESHOLD, MAX_ALPHA]`.
#[inline]
fn recover_channel(c: u8, a: u8) -> u8 {
    let a = i32::from(a);
    let numerator = 255 * (i32::from(c) - a);
    if numerator <= 0 {
        return 0;
    }
    let denom = 255 - a;
    let recovered = (numerator + denom / 2) / denom;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    {
        recovered.min(255) as u8
    }
}

/// Undo the logo composite inside `region`, in place.
///
/// The map is indexed in its own coordinates: pixel `(region.x + col,
/// region.y + row)` pairs with map sample `(row, col)`. Pixels whose coverage is
/// below [`ALPHA_THRESHOLD`] are skipped, coverage is capped at [`MAX_ALPHA`], and
/// the alpha channel is never written.
///
/// The region is expected to lie inside the image and to match the map size.
/// If it does not, only the part covered by the image, the region and the map
/// is visited.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn unblend<C>(image: &mut ImageBuffer<Rgba<u8>, C>, map: &OpacityMap, region: Region)
where
    C: Deref<Target = [u8]> + DerefMut,
{
    let img_w = i64::from(image.width());
    let img_h = i64::from(image.height());
    let map_size = map.size();
    let alpha = map.as_bytes();

    let span_w = i64::from(region.width.min(map_size));
    let span_h = i64::from(region.height.min(map_size));

    // Clip to image bounds
    let col_start = (-region.x).clamp(0, span_w);
    let col_end = (img_w - region.x).clamp(col_start, span_w);
    let row_start = (-region.y).clamp(0, span_h);
    let row_end = (img_h - region.y).clamp(row_start, span_h);

    for row in row_start..row_end {
        let py = (region.y + row) as u32;
        let map_row = row as usize * map_size as usize;
        for col in col_start..col_end {
            let mut a = alpha[map_row + col as usize];

            // Skip noise
            if a < ALPHA_THRESHOLD {
                continue;
            }
            a = a.min(MAX_ALPHA);

            let px = image.get_pixel_mut((region.x + col) as u32, py);
            for channel in &mut px.0[..3] {
                *channel = recover_channel(*channel, a);
            }
        }
    }
}
