//! Loading a flat directory of image files

use std::path::Path;

use ndarray::{s, Array3, Array4};
use rayon::prelude::*;

use crate::codecs;
use crate::error::{FovkitError, Result};
use crate::models::{DynImageStack, ImageStack, Pixel, IMAGE_EXTENSIONS};
use crate::paths;

use super::{dispatch_stack, sort_natural, warn_negative};

/// Options for [`load_from_dir`]
#[derive(Debug, Clone)]
pub struct DirLoadOptions {
    /// Files to load; all image files in the directory when `None`
    pub files: Option<Vec<String>>,
    /// Keep only files whose stem contains this substring (ignored when
    /// `files` is given)
    pub match_substring: Option<String>,
    /// Trim this suffix (and anything after it) from FOV names
    pub trim_suffix: Option<String>,
    /// Name of the channel axis in the resulting stack
    pub channel_dim: String,
    /// Names for the channel coordinates; positional indices when `None`
    pub channel_names: Option<Vec<String>>,
    /// Channel indices to keep from multi-channel files; all when `None`
    pub channel_indices: Option<Vec<usize>>,
}

impl Default for DirLoadOptions {
    fn default() -> Self {
        Self {
            files: None,
            match_substring: None,
            trim_suffix: None,
            channel_dim: "compartments".to_string(),
            channel_names: None,
            channel_indices: None,
        }
    }
}

/// Load a flat directory of images (one FOV per file, possibly
/// multi-channel) into a `[fovs, rows, cols, channels]` stack.
///
/// All files must share the shape and channel count of the first one.
pub fn load_from_dir(data_dir: impl AsRef<Path>, options: &DirLoadOptions) -> Result<DynImageStack> {
    let data_dir = data_dir.as_ref();
    paths::validate_paths(&[data_dir])?;

    let files = match &options.files {
        Some(files) => {
            for file in files {
                let path = data_dir.join(file);
                if !path.is_file() {
                    return Err(FovkitError::validation(format!(
                        "invalid value for {file}: {} is not a file",
                        path.display()
                    )));
                }
            }
            files.clone()
        }
        None => {
            let mut found = paths::list_files(data_dir, Some(IMAGE_EXTENSIONS), false, true)?;
            if let Some(substring) = &options.match_substring {
                let stems = paths::remove_file_extensions(&found);
                found = found
                    .into_iter()
                    .zip(stems)
                    .filter(|(_, stem)| stem.contains(substring.as_str()))
                    .map(|(file, _)| file)
                    .collect();
            }
            sort_natural(&mut found);
            found
        }
    };
    if files.is_empty() {
        return Err(FovkitError::validation(format!(
            "no images found in directory {}",
            data_dir.display()
        )));
    }

    let first = codecs::read_channels(data_dir.join(&files[0]))?;
    let channel_count = first.pages.len();

    // channel index selection only applies to multi-channel data
    let selected: Vec<usize> = match &options.channel_indices {
        Some(indices) if channel_count > 1 && !indices.is_empty() => {
            for &index in indices {
                if index >= channel_count {
                    return Err(FovkitError::validation(format!(
                        "invalid value for channel indices: indices should be between 0 and {} for the given data",
                        channel_count - 1
                    )));
                }
            }
            indices.clone()
        }
        _ => (0..channel_count).collect(),
    };

    if let Some(names) = &options.channel_names {
        if names.len() != selected.len() {
            return Err(FovkitError::validation(format!(
                "invalid value for channel names: expected {} names to match the loaded channels, got {}",
                selected.len(),
                names.len()
            )));
        }
    }

    let stems = paths::remove_file_extensions(&files);
    let fovs = paths::extract_delimited_names(&stems, options.trim_suffix.as_deref(), true);

    let channel_names = options
        .channel_names
        .clone()
        .unwrap_or_else(|| (0..selected.len()).map(|index| index.to_string()).collect());

    let (rows, cols) = first.pages[0].dimensions();
    let stack = dispatch_stack!(first.pages[0], Px => fill_dir::<Px>(
        data_dir,
        &files,
        &selected,
        fovs,
        channel_names,
        &options.channel_dim,
        rows,
        cols,
    )?);

    warn_negative(&stack);
    Ok(stack)
}

#[allow(clippy::too_many_arguments)]
fn fill_dir<T: Pixel>(
    data_dir: &Path,
    files: &[String],
    selected: &[usize],
    fovs: Vec<String>,
    channel_names: Vec<String>,
    channel_dim: &str,
    rows: usize,
    cols: usize,
) -> Result<ImageStack<T>> {
    let planes: Vec<Array3<T>> = files
        .par_iter()
        .map(|file| {
            let channels = codecs::read_channels(data_dir.join(file))?;
            let mut plane = Array3::<T>::zeros((rows, cols, selected.len()));
            for (slot, &index) in selected.iter().enumerate() {
                let page = channels.pages.get(index).ok_or_else(|| {
                    FovkitError::validation(format!("{file} has no channel {index}"))
                })?;
                let cast = page.cast::<T>();
                if (cast.nrows(), cast.ncols()) != (rows, cols) {
                    return Err(FovkitError::validation(format!(
                        "image {file} is {}x{}, expected {rows}x{cols}",
                        cast.nrows(),
                        cast.ncols()
                    )));
                }
                plane.slice_mut(s![.., .., slot]).assign(&cast);
            }
            Ok(plane)
        })
        .collect::<Result<Vec<_>>>()?;

    let mut data = Array4::<T>::zeros((files.len(), rows, cols, selected.len()));
    for (index, plane) in planes.into_iter().enumerate() {
        data.slice_mut(s![index, .., .., ..]).assign(&plane);
    }

    ImageStack::new(data, fovs, channel_names, channel_dim)
}
