//! Image decoding and encoding
//!
//! TIFF files go through the `tiff` crate so multi-page files and unusual
//! sample formats survive the trip; PNG and JPEG go through the `image`
//! crate. Either way the decoded planes keep their on-disk sample format.

pub mod raster;
pub mod tiff;

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{FovkitError, Result};
use crate::models::ImagePage;

/// Deflate level used when writing TIFF data.
///
/// `Balanced` corresponds to zlib level 6, the default for saved channel
/// images and OME-TIFF output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionLevel {
    /// Fastest compression
    Fast,
    /// Balanced speed/size (zlib level 6)
    Balanced,
    /// Smallest output
    Best,
}

impl Default for CompressionLevel {
    fn default() -> Self {
        Self::Balanced
    }
}

impl fmt::Display for CompressionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Fast => "fast",
            Self::Balanced => "balanced",
            Self::Best => "best",
        };
        f.write_str(name)
    }
}

impl FromStr for CompressionLevel {
    type Err = FovkitError;

    fn from_str(value: &str) -> Result<Self> {
        match value.to_ascii_lowercase().as_str() {
            "fast" => Ok(Self::Fast),
            "balanced" => Ok(Self::Balanced),
            "best" => Ok(Self::Best),
            other => Err(FovkitError::config(format!(
                "invalid compression level '{other}' (expected fast, balanced or best)"
            ))),
        }
    }
}

/// Decoded channels of a single file, with any channel names recovered from
/// embedded metadata
#[derive(Debug, Clone)]
pub struct Channels {
    /// One plane per channel
    pub pages: Vec<ImagePage>,
    /// Channel name per plane, where the file provided one
    pub names: Vec<Option<String>>,
}

impl Channels {
    /// Channel names, substituting `channel_{index}` where the file had none
    pub fn names_or_default(&self) -> Vec<String> {
        self.names
            .iter()
            .enumerate()
            .map(|(index, name)| name.clone().unwrap_or_else(|| format!("channel_{index}")))
            .collect()
    }
}

/// Decode a single-channel image, preserving its sample format.
///
/// Multi-page TIFFs and color images are rejected here; use
/// [`read_channels`] for those.
pub fn read_image(path: impl AsRef<Path>) -> Result<ImagePage> {
    let path = path.as_ref();
    match extension(path).as_str() {
        "tiff" | "tif" => {
            let mut pages = tiff::read_pages(path)?;
            if pages.len() != 1 {
                return Err(FovkitError::validation(format!(
                    "expected a single-channel image, {} has {} pages",
                    path.display(),
                    pages.len()
                )));
            }
            // single page checked above
            Ok(pages.remove(0).0)
        }
        "png" | "jpg" | "jpeg" => raster::read_gray(path),
        other => Err(FovkitError::validation(format!(
            "unsupported image extension '{other}' for {}",
            path.display()
        ))),
    }
}

/// Decode every channel of an image file: all pages of a multi-page TIFF, or
/// the color channels of a PNG/JPEG
pub fn read_channels(path: impl AsRef<Path>) -> Result<Channels> {
    let path = path.as_ref();
    match extension(path).as_str() {
        "tiff" | "tif" => {
            let pages = tiff::read_pages(path)?;
            let names = pages
                .iter()
                .map(|(_, description)| tiff::channel_name(description.as_deref()))
                .collect();
            Ok(Channels {
                pages: pages.into_iter().map(|(page, _)| page).collect(),
                names,
            })
        }
        "png" | "jpg" | "jpeg" => {
            let pages = raster::read_channels(path)?;
            let names = vec![None; pages.len()];
            Ok(Channels { pages, names })
        }
        other => Err(FovkitError::validation(format!(
            "unsupported image extension '{other}' for {}",
            path.display()
        ))),
    }
}

/// Save a single-channel image, choosing the codec from the extension.
///
/// TIFF output is deflate-compressed at the given level; PNG supports 8- and
/// 16-bit grayscale, JPEG 8-bit grayscale.
pub fn save_image(
    path: impl AsRef<Path>,
    page: &ImagePage,
    compression: CompressionLevel,
) -> Result<()> {
    let path = path.as_ref();
    match extension(path).as_str() {
        "tiff" | "tif" => tiff::write_pages(path, std::slice::from_ref(page), None, compression),
        "png" => raster::save_png(path, page),
        "jpg" | "jpeg" => raster::save_jpeg(path, page),
        other => Err(FovkitError::validation(format!(
            "unsupported image extension '{other}' for {}",
            path.display()
        ))),
    }
}

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_ascii_lowercase()
}
