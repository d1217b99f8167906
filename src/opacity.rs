//! Per-pixel opacity maps for the Gemini logo.
//!
//! Each map is a headerless `logo_size * logo_size` byte array, row-major, one
//! coverage byte per logo pixel. The packaged assets are gzip-compressed; loaders
//! accept either form.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use flate2::read::GzDecoder;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::position::WatermarkVariant;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Opacity map for one watermark variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpacityMap {
    variant: WatermarkVariant,
    data: Vec<u8>,
}

impl OpacityMap {
    /// Wrap an uncompressed payload.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OpacityMapSize`] unless `data` holds exactly
    /// `logo_size * logo_size` bytes.
    pub fn from_bytes(variant: WatermarkVariant, data: Vec<u8>) -> Result<Self> {
        let expected = variant.map_len();
        if data.len() != expected {
            return Err(Error::OpacityMapSize {
                variant,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self { variant, data })
    }

    /// Read a map from a raw or gzip-compressed stream.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if reading or decompression fails, and
    /// [`Error::OpacityMapSize`] if the payload has the wrong length.
    pub fn from_reader<R: Read>(variant: WatermarkVariant, mut reader: R) -> Result<Self> {
        let mut payload = Vec::with_capacity(variant.map_len());
        reader.read_to_end(&mut payload)?;
        let data = decompress_if_needed(payload, variant.map_len())?;
        Self::from_bytes(variant, data)
    }

    /// Load a map from a file.
    ///
    /// # Errors
    ///
    /// See [`OpacityMap::from_reader`].
    pub fn load(variant: WatermarkVariant, path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let map = Self::from_reader(variant, BufReader::new(file))?;
        debug!(path = %path.display(), %variant, "loaded opacity map");
        Ok(map)
    }

    /// Variant this map belongs to.
    #[must_use]
    pub fn variant(&self) -> WatermarkVariant {
        self.variant
    }

    /// Edge length of the map in pixels.
    #[must_use]
    pub fn size(&self) -> u32 {
        self.variant.logo_size()
    }

    /// Raw coverage bytes, row-major.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Coverage at `(row, col)` in the logo's local coordinates.
    #[must_use]
    pub fn get(&self, row: u32, col: u32) -> Option<u8> {
        let size = self.size();
        if row >= size || col >= size {
            return None;
        }
        self.data.get((row * size + col) as usize).copied()
    }
}

/// A raw payload already has the exact expected length; anything else that
/// starts with the gzip magic is inflated.
fn decompress_if_needed(payload: Vec<u8>, expected: usize) -> io::Result<Vec<u8>> {
    if payload.len() == expected || !payload.starts_with(&GZIP_MAGIC) {
        return Ok(payload);
    }
    let mut data = Vec::with_capacity(expected);
    GzDecoder::new(payload.as_slice()).read_to_end(&mut data)?;
    Ok(data)
}

/// File name of a variant's packaged asset.
#[must_use]
pub fn asset_name(variant: WatermarkVariant) -> &'static str {
    match variant {
        WatermarkVariant::Small => "bg_48.bin",
        WatermarkVariant::Large => "bg_96.bin",
    }
}

/// The set of opacity maps, loaded once and shared read-only.
///
/// A variant without a map is allowed: removal for it reports
/// [`Error::MissingOpacityMap`] and leaves images untouched.
#[derive(Debug, Clone, Default)]
pub struct OpacityMaps {
    small: Option<OpacityMap>,
    large: Option<OpacityMap>,
}

impl OpacityMaps {
    /// Build from already-loaded maps.
    ///
    /// # Panics
    ///
    /// Panics in debug builds if a map is passed in the wrong slot.
    #[must_use]
    pub fn new(small: Option<OpacityMap>, large: Option<OpacityMap>) -> Self {
        debug_assert!(small
            .as_ref()
            .is_none_or(|m| m.variant() == WatermarkVariant::Small));
        debug_assert!(large
            .as_ref()
            .is_none_or(|m| m.variant() == WatermarkVariant::Large));
        Self { small, large }
    }

    /// Load `bg_48.bin` and `bg_96.bin` from `dir`.
    ///
    /// An absent file leaves that variant without a map.
    ///
    /// # Errors
    ///
    /// Returns an error if a present file cannot be read or is malformed.
    pub fn load_dir(dir: &Path) -> Result<Self> {
        let small = load_optional(dir, WatermarkVariant::Small)?;
        let large = load_optional(dir, WatermarkVariant::Large)?;
        Ok(Self { small, large })
    }

    /// Map for `variant`, if one was loaded.
    #[must_use]
    pub fn get(&self, variant: WatermarkVariant) -> Option<&OpacityMap> {
        match variant {
            WatermarkVariant::Small => self.small.as_ref(),
            WatermarkVariant::Large => self.large.as_ref(),
        }
    }
}

fn load_optional(dir: &Path, variant: WatermarkVariant) -> Result<Option<OpacityMap>> {
    let path = dir.join(asset_name(variant));
    match OpacityMap::load(variant, &path) {
        Ok(map) => Ok(Some(map)),
        Err(Error::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
            warn!(path = %path.display(), %variant, "opacity map not found");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}
