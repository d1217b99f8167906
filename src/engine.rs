//! Watermark removal engine and file driver.

use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};

use image::buffer::ConvertBuffer;
use image::{ImageBuffer, ImageFormat, Rgba, RgbImage, RgbaImage};
use tracing::{debug, info, warn};

use crate::blending;
use crate::error::{Error, Result};
use crate::opacity::{OpacityMap, OpacityMaps};
use crate::position::{self, Region, WatermarkVariant};

/// Options controlling watermark processing behavior.
#[derive(Debug, Clone, Default)]
pub struct ProcessOptions {
    /// Use a specific watermark variant instead of choosing one by size.
    pub force_variant: Option<WatermarkVariant>,
    /// Enable verbose logging.
    pub verbose: bool,
    /// Suppress non-error output.
    pub quiet: bool,
}

/// Result of processing a single image file.
#[derive(Debug)]
pub struct ProcessResult {
    /// Path of the processed file.
    pub path: PathBuf,
    /// Whether processing succeeded.
    pub success: bool,
    /// Whether the file was skipped (image too small for the logo footprint).
    pub skipped: bool,
    /// Variant that was applied, if the image got that far.
    pub variant: Option<WatermarkVariant>,
    /// Human-readable status message.
    pub message: String,
}

impl ProcessResult {
    fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            success: false,
            skipped: false,
            variant: None,
            message: String::new(),
        }
    }
}

/// The watermark engine holding the loaded opacity maps.
///
/// Create once and reuse for any number of images. The maps are never mutated
/// after construction, so one engine can be shared across threads.
#[derive(Debug, Clone)]
pub struct WatermarkEngine {
    maps: OpacityMaps,
}

impl WatermarkEngine {
    /// Create an engine from already-loaded maps.
    #[must_use]
    pub fn new(maps: OpacityMaps) -> Self {
        Self { maps }
    }

    /// Create an engine from the 48x48 and 96x96 map payloads.
    ///
    /// Each payload may be raw or gzip-compressed.
    ///
    /// # Errors
    ///
    /// Returns an error if either payload fails to decompress or has the wrong
    /// length.
    pub fn from_buffers(small: &[u8], large: &[u8]) -> Result<Self> {
        let small = OpacityMap::from_reader(WatermarkVariant::Small, small)?;
        let large = OpacityMap::from_reader(WatermarkVariant::Large, large)?;
        Ok(Self::new(OpacityMaps::new(Some(small), Some(large))))
    }

    /// Create an engine from the `bg_48.bin` / `bg_96.bin` assets in `dir`.
    ///
    /// # Errors
    ///
    /// See [`OpacityMaps::load_dir`].
    pub fn from_dir(dir: &Path) -> Result<Self> {
        Ok(Self::new(OpacityMaps::load_dir(dir)?))
    }

    /// Loaded opacity maps.
    #[must_use]
    pub fn maps(&self) -> &OpacityMaps {
        &self.maps
    }

    /// Determine the watermark variant based on image dimensions.
    #[must_use]
    #[allow(clippy::unused_self)] // method on `self` for API consistency
    pub fn variant_for(&self, width: u32, height: u32) -> WatermarkVariant {
        position::select_variant(width, height)
    }

    /// Variant and region for an image, honoring `force_variant`.
    #[must_use]
    pub fn locate(
        &self,
        width: u32,
        height: u32,
        force_variant: Option<WatermarkVariant>,
    ) -> (WatermarkVariant, Region) {
        let variant = force_variant.unwrap_or_else(|| self.variant_for(width, height));
        (variant, position::compute_region(width, height, variant))
    }

    /// Remove the watermark from an image in-place.
    ///
    /// Returns the region that was restored. On error the image is left
    /// untouched.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ImageTooSmall`] if the logo footprint does not fit the
    /// image, and [`Error::MissingOpacityMap`] if no map is loaded for the
    /// resolved variant.
    pub fn remove<C>(
        &self,
        image: &mut ImageBuffer<Rgba<u8>, C>,
        force_variant: Option<WatermarkVariant>,
    ) -> Result<Region>
    where
        C: Deref<Target = [u8]> + DerefMut,
    {
        let (width, height) = image.dimensions();
        let (variant, region) = self.locate(width, height, force_variant);

        if !region.fits_within(width, height) {
            return Err(Error::ImageTooSmall {
                width,
                height,
                wm_size: variant.logo_size(),
            });
        }

        let map = self
            .maps
            .get(variant)
            .ok_or(Error::MissingOpacityMap(variant))?;

        blending::unblend(image, map, region);
        Ok(region)
    }

    /// Process a single image file: load, remove, save.
    ///
    /// Returns a [`ProcessResult`] indicating success, skip, or failure.
    #[must_use]
    pub fn process_file(&self, input: &Path, output: &Path, opts: &ProcessOptions) -> ProcessResult {
        let mut result = ProcessResult::new(input);

        let mut rgba = match image::open(input) {
            Ok(img) => img.to_rgba8(),
            Err(e) => {
                result.message = format!("Failed to load: {e}");
                return result;
            }
        };

        let (variant, _) = self.locate(rgba.width(), rgba.height(), opts.force_variant);
        match self.remove(&mut rgba, Some(variant)) {
            Ok(region) => {
                debug!(
                    path = %input.display(),
                    %variant,
                    x = region.x,
                    y = region.y,
                    "restored watermark region"
                );
                result.variant = Some(variant);
            }
            Err(e @ Error::ImageTooSmall { .. }) => {
                result.skipped = true;
                result.success = true;
                result.message = format!("Skipped: {e}");
                return result;
            }
            Err(e) => {
                warn!(path = %input.display(), error = %e, "watermark not removed");
                result.message = e.to_string();
                return result;
            }
        }

        if let Some(parent) = output.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                if let Err(e) = std::fs::create_dir_all(parent) {
                    result.message = format!("Failed to create output directory: {e}");
                    return result;
                }
            }
        }

        match save_image(&rgba, output) {
            Ok(()) => {
                info!(output = %output.display(), "saved restored image");
                result.success = true;
                result.message = "Watermark removed".to_string();
            }
            Err(e) => {
                result.message = format!("Failed to save: {e}");
            }
        }

        result
    }

    /// Process all supported images in a directory.
    ///
    /// Uses parallel iteration when the `cli` feature is enabled (via rayon).
    /// Returns a [`ProcessResult`] for each image found.
    #[must_use]
    pub fn process_directory(
        &self,
        input_dir: &Path,
        output_dir: &Path,
        opts: &ProcessOptions,
    ) -> Vec<ProcessResult> {
        let jobs: Vec<(PathBuf, PathBuf)> = match std::fs::read_dir(input_dir) {
            Ok(rd) => rd
                .filter_map(std::result::Result::ok)
                .filter(|e| e.file_type().map(|ft| ft.is_file()).unwrap_or(false))
                .map(|e| e.path())
                .filter(|p| is_supported_image(p))
                .filter_map(|p| {
                    let out = output_dir.join(p.file_name()?);
                    Some((p, out))
                })
                .collect(),
            Err(e) => {
                let mut result = ProcessResult::new(input_dir);
                result.message = format!("Failed to read directory: {e}");
                return vec![result];
            }
        };

        if !output_dir.exists() {
            if let Err(e) = std::fs::create_dir_all(output_dir) {
                let mut result = ProcessResult::new(output_dir);
                result.message = format!("Failed to create output directory: {e}");
                return vec![result];
            }
        }

        debug!(count = jobs.len(), dir = %input_dir.display(), "processing directory");

        #[cfg(feature = "cli")]
        {
            use rayon::prelude::*;
            jobs.par_iter()
                .map(|(input, output)| self.process_file(input, output, opts))
                .collect()
        }

        #[cfg(not(feature = "cli"))]
        {
            jobs.iter()
                .map(|(input, output)| self.process_file(input, output, opts))
                .collect()
        }
    }
}

/// Check if a file has a supported image extension.
#[must_use]
pub fn is_supported_image(path: &Path) -> bool {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => matches!(
            ext.to_lowercase().as_str(),
            "jpg" | "jpeg" | "png" | "webp" | "bmp"
        ),
        None => false,
    }
}

/// Save an RGBA image with format-specific settings.
///
/// PNG and WebP keep the alpha channel; JPEG and BMP are written as RGB, JPEG
/// at quality 100.
///
/// # Errors
///
/// Returns an error if the format is unsupported or writing fails.
pub fn save_image(img: &RgbaImage, path: &Path) -> Result<()> {
    let format =
        ImageFormat::from_path(path).map_err(|e| Error::UnsupportedFormat(e.to_string()))?;

    match format {
        ImageFormat::Jpeg => {
            let rgb: RgbImage = img.convert();
            let file = std::fs::File::create(path)?;
            let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(file, 100);
            encoder.encode_image(&rgb)?;
        }
        ImageFormat::Bmp => {
            let rgb: RgbImage = img.convert();
            rgb.save_with_format(path, format)?;
        }
        ImageFormat::Png | ImageFormat::WebP => {
            img.save_with_format(path, format)?;
        }
        _ => {
            return Err(Error::UnsupportedFormat(format!("{format:?}")));
        }
    }

    Ok(())
}

/// Generate a default output path from an input path.
///
/// Example: `"photo.jpg"` becomes `"photo_cleaned.jpg"`.
#[must_use]
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    let ext = input.extension().unwrap_or_default().to_string_lossy();
    let parent = input.parent().unwrap_or(Path::new("."));
    parent.join(format!("{stem}_cleaned.{ext}"))
}
