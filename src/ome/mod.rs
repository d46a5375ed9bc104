//! FOV directory <-> OME-TIFF conversion

mod xml;

pub use xml::{Ome, OmeChannel, OmeImage, OmePixels, DIMENSION_ORDER, OME_XMLNS};

use std::fs;
use std::path::{Path, PathBuf};

use crate::codecs::{self, CompressionLevel};
use crate::error::{FovkitError, Result};
use crate::loader::{load_from_tree, TreeLoadOptions};
use crate::models::{DynImageStack, ImagePage, StackInfo};
use crate::paths;

/// Options for [`fov_to_ome`]
#[derive(Debug, Clone, Default)]
pub struct OmeConvertOptions {
    /// Name of an image subfolder inside each FOV folder
    pub img_sub_folder: Option<String>,
    /// FOV folders to convert; all folders when `None`
    pub fovs: Option<Vec<String>>,
    /// Channels to convert; all channels when `None`
    pub channels: Option<Vec<String>>,
    /// Deflate level of the written OME-TIFFs
    pub compression: CompressionLevel,
}

/// Convert a tree of FOV folders into one OME-TIFF per FOV.
///
/// Each `{fov}.ome.tiff` gets one page per channel and the OME-XML document
/// on its first page. Returns the written file paths.
pub fn fov_to_ome(
    data_dir: impl AsRef<Path>,
    ome_save_dir: impl AsRef<Path>,
    options: &OmeConvertOptions,
) -> Result<Vec<PathBuf>> {
    let data_dir = data_dir.as_ref();
    let ome_save_dir = ome_save_dir.as_ref();
    paths::validate_paths(&[data_dir, ome_save_dir])?;

    let tree_options = TreeLoadOptions {
        img_sub_folder: options.img_sub_folder.clone(),
        fovs: options.fovs.clone(),
        channels: options.channels.clone(),
        max_image_size: None,
    };
    let stack = load_from_tree(data_dir, &tree_options)?;

    write_ome_per_fov(&stack, ome_save_dir, options.compression)
}

/// Write one OME-TIFF per FOV of an already-loaded stack
pub fn write_ome_per_fov(
    stack: &DynImageStack,
    ome_save_dir: impl AsRef<Path>,
    compression: CompressionLevel,
) -> Result<Vec<PathBuf>> {
    let ome_save_dir = ome_save_dir.as_ref();
    let (_, rows, cols, channel_count) = stack.shape();

    let mut written = Vec::with_capacity(stack.fovs().len());
    for (fov_index, fov) in stack.fovs().iter().enumerate() {
        let ome = Ome::single_image(
            fov,
            stack.pixel_type(),
            cols as u32,
            rows as u32,
            stack.channels(),
        );
        let xml = ome.to_xml()?;

        let pages: Vec<ImagePage> = (0..channel_count)
            .map(|channel| stack.page(fov_index, channel))
            .collect();

        let path = ome_save_dir.join(format!("{fov}.ome.tiff"));
        codecs::tiff::write_pages(&path, &pages, Some(&xml), compression)?;
        tracing::debug!("wrote {}", path.display());
        written.push(path);
    }

    Ok(written)
}

/// Unpack an OME-TIFF into a FOV folder of single-channel TIFFs.
///
/// The folder is named after the OME `Image` name, falling back to the file
/// stem (minus its `.ome` suffix) for nameless documents; each channel lands
/// in `{folder}/{channel}.tiff`. Returns the created folder.
pub fn ome_to_fov(ome_path: impl AsRef<Path>, data_dir: impl AsRef<Path>) -> Result<PathBuf> {
    let ome_path = ome_path.as_ref();
    let data_dir = data_dir.as_ref();
    paths::validate_paths(&[ome_path, data_dir])?;

    let pages = codecs::tiff::read_pages(ome_path)?;
    let description = pages
        .first()
        .and_then(|(_, description)| description.clone())
        .ok_or_else(|| {
            FovkitError::ome_xml(format!("{} has no OME-XML description", ome_path.display()))
        })?;

    let ome = Ome::from_xml(&description)?;
    let image = ome
        .primary_image()
        .ok_or_else(|| FovkitError::ome_xml(format!("{} describes no images", ome_path.display())))?;

    let image_name = image
        .name
        .clone()
        .unwrap_or_else(|| default_image_name(ome_path));
    let channel_names = image.channel_names();

    let save_dir = data_dir.join(&image_name);
    fs::create_dir_all(&save_dir)?;

    // channel order in the document matches page order in the file
    for ((page, _), channel) in pages.iter().zip(channel_names.iter()) {
        codecs::save_image(
            save_dir.join(format!("{channel}.tiff")),
            page,
            CompressionLevel::Balanced,
        )?;
    }

    tracing::debug!("unpacked {} into {}", ome_path.display(), save_dir.display());
    Ok(save_dir)
}

/// Summarize an OME-TIFF without unpacking it
pub fn describe(ome_path: impl AsRef<Path>) -> Result<StackInfo> {
    let ome_path = ome_path.as_ref();
    paths::validate_paths(&[ome_path])?;

    let pages = codecs::tiff::read_pages(ome_path)?;
    let (first_page, description) = pages.first().ok_or_else(|| {
        FovkitError::validation(format!("{} contains no pages", ome_path.display()))
    })?;

    let (rows, cols) = first_page.dimensions();
    let (fov_name, channels) = match description.as_deref().map(Ome::from_xml) {
        Some(Ok(ome)) => match ome.primary_image() {
            Some(image) => (
                image.name.clone().unwrap_or_else(|| default_image_name(ome_path)),
                image.channel_names(),
            ),
            None => (default_image_name(ome_path), positional_names(pages.len())),
        },
        _ => (default_image_name(ome_path), positional_names(pages.len())),
    };

    Ok(StackInfo {
        fovs: vec![fov_name],
        channels,
        rows,
        cols,
        pixel_type: first_page.pixel_type(),
        channel_dim: "channels".to_string(),
    })
}

fn positional_names(count: usize) -> Vec<String> {
    (0..count).map(|index| format!("Channel {index}")).collect()
}

fn default_image_name(path: &Path) -> String {
    let stem = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("image");
    stem.strip_suffix(".ome").unwrap_or(stem).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ImageStack, PixelType, CHANNEL_DIM};
    use ndarray::Array4;
    use std::fs;
    use tempfile::TempDir;

    fn sample_stack() -> DynImageStack {
        let mut data = Array4::<u16>::zeros((2, 4, 6, 2));
        data[[0, 0, 0, 0]] = 11;
        data[[1, 3, 5, 1]] = 42;
        DynImageStack::from(
            ImageStack::new(
                data,
                vec!["fov1".to_string(), "fov2".to_string()],
                vec!["CD45".to_string(), "DAPI".to_string()],
                CHANNEL_DIM,
            )
            .unwrap(),
        )
    }

    #[test]
    fn test_write_and_describe() {
        let temp = TempDir::new().unwrap();
        let written = write_ome_per_fov(&sample_stack(), temp.path(), CompressionLevel::Balanced)
            .unwrap();
        assert_eq!(written.len(), 2);
        assert!(written[0].ends_with("fov1.ome.tiff"));

        let info = describe(&written[1]).unwrap();
        assert_eq!(info.fovs, vec!["fov2"]);
        assert_eq!(info.channels, vec!["CD45", "DAPI"]);
        assert_eq!((info.rows, info.cols), (4, 6));
        assert_eq!(info.pixel_type, PixelType::U16);
    }

    #[test]
    fn test_ome_roundtrip() {
        let temp = TempDir::new().unwrap();
        let ome_dir = temp.path().join("ome");
        let fov_dir = temp.path().join("fovs");
        fs::create_dir_all(&ome_dir).unwrap();
        fs::create_dir_all(&fov_dir).unwrap();

        let stack = sample_stack();
        let written = write_ome_per_fov(&stack, &ome_dir, CompressionLevel::Balanced).unwrap();

        let unpacked = ome_to_fov(&written[1], &fov_dir).unwrap();
        assert!(unpacked.ends_with("fov2"));
        assert!(unpacked.join("CD45.tiff").is_file());
        assert!(unpacked.join("DAPI.tiff").is_file());

        // and back through the tree loader
        let reloaded = load_from_tree(&fov_dir, &TreeLoadOptions::default()).unwrap();
        assert_eq!(reloaded.fovs(), ["fov2"]);
        assert_eq!(reloaded.channels(), ["CD45", "DAPI"]);
        assert_eq!(reloaded.page(0, 1), stack.page(1, 1));
    }

    #[test]
    fn test_fov_to_ome_from_disk() {
        let temp = TempDir::new().unwrap();
        let data_dir = temp.path().join("data");
        let ome_dir = temp.path().join("ome");
        fs::create_dir_all(&ome_dir).unwrap();

        // unpack a generated OME-TIFF to build the source tree
        let scratch = temp.path().join("scratch");
        fs::create_dir_all(&scratch).unwrap();
        let written = write_ome_per_fov(&sample_stack(), &scratch, CompressionLevel::Fast).unwrap();
        fs::create_dir_all(&data_dir).unwrap();
        ome_to_fov(&written[0], &data_dir).unwrap();

        let converted = fov_to_ome(&data_dir, &ome_dir, &OmeConvertOptions::default()).unwrap();
        assert_eq!(converted.len(), 1);
        let info = describe(&converted[0]).unwrap();
        assert_eq!(info.fovs, vec!["fov1"]);
    }

    #[test]
    fn test_missing_description_errors() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("bare.tiff");
        let page = ImagePage::U8(ndarray::Array2::zeros((2, 2)));
        codecs::tiff::write_pages(&path, std::slice::from_ref(&page), None, CompressionLevel::Fast)
            .unwrap();

        assert!(matches!(
            ome_to_fov(&path, temp.path()),
            Err(FovkitError::OmeXml(_))
        ));
    }

    #[test]
    fn test_default_image_name() {
        assert_eq!(default_image_name(Path::new("/a/fov1.ome.tiff")), "fov1");
        assert_eq!(default_image_name(Path::new("plain.tiff")), "plain");
    }
}
