//! Loading a FOV-per-folder directory tree

use std::path::Path;

use ndarray::{s, Array3, Array4};
use rayon::prelude::*;

use crate::codecs;
use crate::error::{FovkitError, Result};
use crate::models::{is_image_file, DynImageStack, ImagePage, ImageStack, Pixel, CHANNEL_DIM, IMAGE_EXTENSIONS};
use crate::paths;
use crate::verify;

use super::{dispatch_stack, fov_dir, sort_natural, warn_negative};

/// Options for [`load_from_tree`]
#[derive(Debug, Clone, Default)]
pub struct TreeLoadOptions {
    /// Name of an image subfolder inside each FOV folder
    pub img_sub_folder: Option<String>,
    /// FOV folders to load; all folders when `None`
    pub fovs: Option<Vec<String>>,
    /// Channel images to load, with or without extensions; all images in the
    /// first FOV when `None`
    pub channels: Option<Vec<String>>,
    /// Pad every image into a zeroed square of this side length
    pub max_image_size: Option<usize>,
}

/// Load a directory tree of FOV folders into a `[fovs, rows, cols, channels]`
/// stack.
///
/// Every FOV folder must contain the same channel images. Without
/// `max_image_size` all images must share the shape of the first one; with
/// it, smaller images are placed in the top-left corner of a zeroed
/// `max_image_size` square.
pub fn load_from_tree(
    data_dir: impl AsRef<Path>,
    options: &TreeLoadOptions,
) -> Result<DynImageStack> {
    let data_dir = data_dir.as_ref();
    paths::validate_paths(&[data_dir])?;

    let fovs = match &options.fovs {
        Some(fovs) => fovs.clone(),
        None => {
            let mut all = paths::list_folders(data_dir, None, false, true)?;
            sort_natural(&mut all);
            all
        }
    };
    if fovs.is_empty() {
        return Err(FovkitError::validation(format!(
            "no FOVs found in directory {}",
            data_dir.display()
        )));
    }

    let sub_folder = options.img_sub_folder.as_deref().unwrap_or("");
    let first_dir = fov_dir(data_dir, &fovs[0], sub_folder);

    let channels = match &options.channels {
        None => {
            let mut found = paths::list_files(&first_dir, Some(IMAGE_EXTENSIONS), false, true)?;
            sort_natural(&mut found);
            found
        }
        Some(user_channels) => resolve_channel_files(&first_dir, user_channels)?,
    };
    if channels.is_empty() {
        return Err(FovkitError::validation(format!(
            "no images found in designated folder {}",
            first_dir.display()
        )));
    }

    tracing::debug!(
        "loading {} FOVs x {} channels from {}",
        fovs.len(),
        channels.len(),
        data_dir.display()
    );

    let first_page = codecs::read_image(first_dir.join(&channels[0]))?;
    let stack = dispatch_stack!(first_page, Px => fill_tree::<Px>(
        data_dir,
        sub_folder,
        &fovs,
        &channels,
        options.max_image_size,
        &first_page,
    )?);

    warn_negative(&stack);
    Ok(stack)
}

/// Match user-provided channel names against the files in a FOV folder.
///
/// Names given with image extensions are used as-is. Names given without
/// extensions are matched against the folder contents by stem, verified for
/// full agreement, and returned in the caller's order.
fn resolve_channel_files(dir: &Path, channels: &[String]) -> Result<Vec<String>> {
    if channels.iter().all(|channel| is_image_file(channel)) {
        return Ok(channels.to_vec());
    }

    let stems = paths::remove_file_extensions(channels);
    let stem_refs: Vec<&str> = stems.iter().map(|stem| stem.as_str()).collect();

    let found = paths::list_files(dir, Some(&stem_refs), true, true)?;
    let found_stems = paths::remove_file_extensions(&found);

    verify::verify_same_elements(
        ("channels detected in folder", &found_stems),
        ("channels requested", &stems),
        false,
    )?;

    // back to the caller's ordering
    let mut ordered = Vec::with_capacity(channels.len());
    for stem in &stems {
        let file = found
            .iter()
            .zip(found_stems.iter())
            .find(|(_, found_stem)| *found_stem == stem)
            .map(|(file, _)| file.clone())
            .ok_or_else(|| {
                FovkitError::validation(format!("channel {stem} not found in {}", dir.display()))
            })?;
        ordered.push(file);
    }
    Ok(ordered)
}

fn fill_tree<T: Pixel>(
    data_dir: &Path,
    sub_folder: &str,
    fovs: &[String],
    channels: &[String],
    max_image_size: Option<usize>,
    first_page: &ImagePage,
) -> Result<ImageStack<T>> {
    let (first_rows, first_cols) = first_page.dimensions();
    let (rows, cols) = match max_image_size {
        Some(size) => (size, size),
        None => (first_rows, first_cols),
    };

    let planes: Vec<Array3<T>> = fovs
        .par_iter()
        .map(|fov| {
            let dir = fov_dir(data_dir, fov, sub_folder);
            let mut plane = Array3::<T>::zeros((rows, cols, channels.len()));
            for (index, channel) in channels.iter().enumerate() {
                let path = dir.join(channel);
                let page = codecs::read_image(&path)?;
                let cast = page.cast::<T>();
                let (page_rows, page_cols) = (cast.nrows(), cast.ncols());
                if page_rows > rows || page_cols > cols {
                    return Err(FovkitError::validation(format!(
                        "image {} is {page_rows}x{page_cols}, larger than the target {rows}x{cols}",
                        path.display()
                    )));
                }
                if max_image_size.is_none() && (page_rows, page_cols) != (rows, cols) {
                    return Err(FovkitError::validation(format!(
                        "image {} is {page_rows}x{page_cols}, expected {rows}x{cols}",
                        path.display()
                    )));
                }
                plane
                    .slice_mut(s![..page_rows, ..page_cols, index])
                    .assign(&cast);
            }
            Ok(plane)
        })
        .collect::<Result<Vec<_>>>()?;

    let mut data = Array4::<T>::zeros((fovs.len(), rows, cols, channels.len()));
    for (index, plane) in planes.into_iter().enumerate() {
        data.slice_mut(s![index, .., .., ..]).assign(&plane);
    }

    let channel_names = paths::remove_file_extensions(channels);
    ImageStack::new(data, fovs.to_vec(), channel_names, CHANNEL_DIM)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codecs::CompressionLevel;
    use ndarray::Array2;
    use std::fs;
    use tempfile::TempDir;

    fn write_channel(dir: &Path, name: &str, fill: u16, rows: usize, cols: usize) {
        let data = Array2::from_elem((rows, cols), fill);
        codecs::save_image(dir.join(name), &ImagePage::U16(data), CompressionLevel::Fast).unwrap();
    }

    fn build_tree(temp: &TempDir, sub_folder: &str) {
        for (fov_index, fov) in ["fov1", "fov2", "fov10"].iter().enumerate() {
            let dir = fov_dir(temp.path(), fov, sub_folder);
            fs::create_dir_all(&dir).unwrap();
            for (chan_index, chan) in ["CD45.tiff", "DAPI.tiff"].iter().enumerate() {
                write_channel(&dir, chan, (fov_index * 10 + chan_index) as u16, 4, 4);
            }
        }
    }

    #[test]
    fn test_load_all_fovs_and_channels() {
        let temp = TempDir::new().unwrap();
        build_tree(&temp, "");

        let stack = load_from_tree(temp.path(), &TreeLoadOptions::default()).unwrap();
        assert_eq!(stack.shape(), (3, 4, 4, 2));
        // natural FOV ordering, alphabetical channel ordering
        assert_eq!(stack.fovs(), ["fov1", "fov2", "fov10"]);
        assert_eq!(stack.channels(), ["CD45", "DAPI"]);

        // fov10 is the third FOV, DAPI its second channel
        let page = stack.page(2, 1);
        assert_eq!(page, ImagePage::U16(Array2::from_elem((4, 4), 21u16)));
    }

    #[test]
    fn test_load_with_subfolder_and_subsets() {
        let temp = TempDir::new().unwrap();
        build_tree(&temp, "TIFs");

        let options = TreeLoadOptions {
            img_sub_folder: Some("TIFs".to_string()),
            fovs: Some(vec!["fov2".to_string()]),
            channels: Some(vec!["DAPI".to_string(), "CD45".to_string()]),
            max_image_size: None,
        };
        let stack = load_from_tree(temp.path(), &options).unwrap();
        assert_eq!(stack.fovs(), ["fov2"]);
        // caller's channel order is preserved
        assert_eq!(stack.channels(), ["DAPI", "CD45"]);
        assert_eq!(stack.page(0, 0), ImagePage::U16(Array2::from_elem((4, 4), 11u16)));
    }

    #[test]
    fn test_load_pads_to_max_image_size() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("fov1");
        fs::create_dir(&dir).unwrap();
        write_channel(&dir, "chan.tiff", 5, 2, 3);

        let options = TreeLoadOptions {
            max_image_size: Some(4),
            ..Default::default()
        };
        let stack = load_from_tree(temp.path(), &options).unwrap();
        assert_eq!(stack.shape(), (1, 4, 4, 1));

        let page = stack.page(0, 0);
        if let ImagePage::U16(data) = page {
            assert_eq!(data[[0, 0]], 5);
            assert_eq!(data[[1, 2]], 5);
            // padded region stays zero
            assert_eq!(data[[3, 3]], 0);
            assert_eq!(data[[2, 0]], 0);
        } else {
            panic!("expected a u16 stack");
        }
    }

    #[test]
    fn test_missing_channel_fails_verification() {
        let temp = TempDir::new().unwrap();
        build_tree(&temp, "");

        let options = TreeLoadOptions {
            channels: Some(vec!["CD45".to_string(), "CD3".to_string()]),
            ..Default::default()
        };
        let err = load_from_tree(temp.path(), &options).unwrap_err();
        assert!(matches!(err, FovkitError::ElementMismatch { .. }));
    }

    #[test]
    fn test_empty_directory_errors() {
        let temp = TempDir::new().unwrap();
        let err = load_from_tree(temp.path(), &TreeLoadOptions::default()).unwrap_err();
        assert!(err.to_string().contains("no FOVs"));
    }
}
