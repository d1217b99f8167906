//! Restore pixels under the visible Gemini watermark by inverting its alpha
//! composite.
//!
//! Gemini overlays a semi-transparent white logo near the bottom-right corner
//! of generated images. Given the logo's per-pixel opacity map, each covered
//! pixel can be solved back to its original colour. The crate is split into:
//!
//! - [`position`]: picks the 48x48 or 96x96 variant from image size and
//!   computes where it sits.
//! - [`blending`]: undoes the composite in place inside that region.
//! - [`opacity`]: loads the raw or gzip-compressed opacity map assets.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::path::Path;
//! use gemini_unblend::WatermarkEngine;
//!
//! let engine = WatermarkEngine::from_dir(Path::new("alpha")).expect("failed to load maps");
//! let mut img = image::open("photo.png").unwrap().to_rgba8();
//! engine.remove(&mut img, None).expect("watermark not removed");
//! img.save("cleaned.png").unwrap();
//! ```
//!
//! # Lower-level use
//!
//! ```no_run
//! use std::path::Path;
//! use gemini_unblend::{blending, compute_region, opacity, select_variant, OpacityMap};
//!
//! # fn main() -> gemini_unblend::Result<()> {
//! let mut img = image::open("photo.png")?.to_rgba8();
//! let variant = select_variant(img.width(), img.height());
//! let map = OpacityMap::load(variant, &Path::new("alpha").join(opacity::asset_name(variant)))?;
//! let region = compute_region(img.width(), img.height(), variant);
//! blending::unblend(&mut img, &map, region);
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]

pub mod blending;
mod engine;
pub mod error;
#[cfg(feature = "cli")]
pub mod logging;
pub mod opacity;
pub mod position;

pub use engine::{
    default_output_path, is_supported_image, save_image, ProcessOptions, ProcessResult,
    WatermarkEngine,
};
pub use error::{Error, Result};
pub use opacity::{OpacityMap, OpacityMaps};
pub use position::{compute_region, select_variant, Region, WatermarkVariant};
