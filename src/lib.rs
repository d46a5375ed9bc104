//! Fovkit - a toolbox for multiplexed imaging
//!
//! Fovkit loads, validates and converts multiplexed-imaging data laid out
//! on disk as fields of view (FOVs): folders of single-channel images, or
//! multi-channel TIFFs. Images are gathered into labeled 4-D stacks with
//! shape `[fovs, rows, cols, channels]`, preserving the on-disk pixel type,
//! and can be repacked as OME-TIFF files and back.
//!
//! # Features
//!
//! - **Filesystem helpers**: list and validate FOV trees with informative
//!   errors
//! - **Labeled stacks**: FOV and channel names travel with the data
//! - **Dtype-preserving I/O**: 8/16/32-bit integer and float TIFF, plus
//!   PNG/JPEG
//! - **Tiled runs**: `R{n}C{m}` grid handling with zero-filled gaps
//! - **OME-TIFF**: per-FOV conversion in both directions, deflate-compressed
//!
//! # Quick Start
//!
//! ```bash
//! # Convert a directory of FOV folders to OME-TIFFs
//! fovkit convert ./extracted --output ./ome
//!
//! # Unpack an OME-TIFF back into per-channel TIFFs
//! fovkit extract ./ome/fov1.ome.tiff --output ./extracted
//!
//! # Inspect a data directory
//! fovkit info ./extracted
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cli;
pub mod codecs;
pub mod config;
pub mod error;
pub mod loader;
pub mod models;
pub mod ome;
pub mod paths;
pub mod verify;

// Re-export commonly used types
pub use error::{FovkitError, Result};
pub use models::{DynImageStack, ImagePage, ImageStack, Pixel, PixelType, StackInfo};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Load every FOV folder under `data_dir` with default options
///
/// # Example
///
/// ```no_run
/// let stack = fovkit::load_fovs(std::path::Path::new("./extracted")).unwrap();
/// println!("{} FOVs, {} channels", stack.fovs().len(), stack.channels().len());
/// ```
pub fn load_fovs(data_dir: &std::path::Path) -> Result<DynImageStack> {
    loader::load_from_tree(data_dir, &loader::TreeLoadOptions::default())
}

/// Convert a tree of FOV folders into one OME-TIFF per FOV
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
///
/// let written = fovkit::fovs_to_ome(Path::new("./extracted"), Path::new("./ome")).unwrap();
/// println!("created {} files", written.len());
/// ```
pub fn fovs_to_ome(
    data_dir: &std::path::Path,
    ome_save_dir: &std::path::Path,
) -> Result<Vec<std::path::PathBuf>> {
    ome::fov_to_ome(data_dir, ome_save_dir, &ome::OmeConvertOptions::default())
}

/// Unpack an OME-TIFF into a FOV folder of single-channel TIFFs
pub fn ome_to_fovs(
    ome_path: &std::path::Path,
    data_dir: &std::path::Path,
) -> Result<std::path::PathBuf> {
    ome::ome_to_fov(ome_path, data_dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_name() {
        assert_eq!(NAME, "fovkit");
    }
}
