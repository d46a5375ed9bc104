//! Loading multi-channel TIFFs (one FOV per file)

use std::path::Path;

use ndarray::{s, Array3, Array4};
use rayon::prelude::*;

use crate::codecs;
use crate::error::{FovkitError, Result};
use crate::models::{DynImageStack, ImageStack, Pixel, CHANNEL_DIM};
use crate::paths;
use crate::verify;

use super::{dispatch_stack, sort_natural, warn_negative};

/// Options for [`load_multichannel`]
#[derive(Debug, Clone, Default)]
pub struct MultichannelLoadOptions {
    /// Files to load; all TIFF files in the directory when `None`
    pub files: Option<Vec<String>>,
    /// Channels to load, by the names embedded in the files; all channels of
    /// the first file when `None`
    pub channels: Option<Vec<String>>,
    /// Delimiter separating the FOV name from the rest of the file name
    pub delimiter: Option<String>,
}

/// Load a directory of multi-channel TIFFs into a
/// `[fovs, rows, cols, channels]` stack.
///
/// Channel names come from the per-page metadata each file carries; every
/// file must provide all requested channels, and all planes must share the
/// shape of the first one.
pub fn load_multichannel(
    data_dir: impl AsRef<Path>,
    options: &MultichannelLoadOptions,
) -> Result<DynImageStack> {
    let data_dir = data_dir.as_ref();
    paths::validate_paths(&[data_dir])?;

    let files = match &options.files {
        Some(files) => files.clone(),
        None => {
            let mut found = paths::list_files(data_dir, Some(&["tiff", "tif"]), false, true)?;
            sort_natural(&mut found);
            found
        }
    };
    if files.is_empty() {
        return Err(FovkitError::validation(format!(
            "no multichannel TIFF files found in directory {}",
            data_dir.display()
        )));
    }

    let stems = paths::remove_file_extensions(&files);
    let fovs = paths::extract_delimited_names(&stems, options.delimiter.as_deref(), true);

    let first = codecs::read_channels(data_dir.join(&files[0]))?;
    let discovered = first.names_or_default();

    let channels = match &options.channels {
        Some(channels) => channels.clone(),
        None => discovered.clone(),
    };
    if channels.is_empty() {
        return Err(FovkitError::validation("no channels provided in channels list"));
    }
    verify::verify_in_list(
        ("requested channels", &channels),
        ("channels in first file", &discovered),
    )?;

    let (rows, cols) = first.pages[0].dimensions();
    let stack = dispatch_stack!(first.pages[0], Px => fill_multichannel::<Px>(
        data_dir,
        &files,
        fovs,
        &channels,
        rows,
        cols,
    )?);

    warn_negative(&stack);
    Ok(stack)
}

fn fill_multichannel<T: Pixel>(
    data_dir: &Path,
    files: &[String],
    fovs: Vec<String>,
    channels: &[String],
    rows: usize,
    cols: usize,
) -> Result<ImageStack<T>> {
    let planes: Vec<Array3<T>> = files
        .par_iter()
        .map(|file| {
            let decoded = codecs::read_channels(data_dir.join(file))?;
            let names = decoded.names_or_default();

            let mut plane = Array3::<T>::zeros((rows, cols, channels.len()));
            for (slot, channel) in channels.iter().enumerate() {
                let index = names.iter().position(|name| name == channel).ok_or_else(|| {
                    FovkitError::validation(format!("channel {channel} not found in {file}"))
                })?;
                let cast = decoded.pages[index].cast::<T>();
                if (cast.nrows(), cast.ncols()) != (rows, cols) {
                    return Err(FovkitError::validation(format!(
                        "channel {channel} of {file} is {}x{}, expected {rows}x{cols}",
                        cast.nrows(),
                        cast.ncols()
                    )));
                }
                plane.slice_mut(s![.., .., slot]).assign(&cast);
            }
            Ok(plane)
        })
        .collect::<Result<Vec<_>>>()?;

    let mut data = Array4::<T>::zeros((files.len(), rows, cols, channels.len()));
    for (index, plane) in planes.into_iter().enumerate() {
        data.slice_mut(s![index, .., .., ..]).assign(&plane);
    }

    ImageStack::new(data, fovs, channels.to_vec(), CHANNEL_DIM)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codecs::CompressionLevel;
    use crate::models::ImagePage;
    use ndarray::Array2;
    use std::fs::File;
    use std::io::BufWriter;
    use std::path::Path;
    use tempfile::TempDir;
    use tiff::encoder::{colortype, TiffEncoder};
    use tiff::tags::Tag;

    /// Write a multi-channel TIFF with per-page channel metadata, the way
    /// acquisition software does
    fn write_tagged(dir: &Path, name: &str, channels: &[(&str, u16)]) {
        let writer = BufWriter::new(File::create(dir.join(name)).unwrap());
        let mut encoder = TiffEncoder::new(writer).unwrap();
        for (channel, fill) in channels {
            let data = Array2::from_elem((3, 3), *fill);
            let raw: Vec<u16> = data.iter().copied().collect();
            let mut image = encoder.new_image::<colortype::Gray16>(3, 3).unwrap();
            let description = format!("{{\"channel.target\": \"{channel}\"}}");
            image
                .encoder()
                .write_tag(Tag::ImageDescription, description.as_str())
                .unwrap();
            image.write_data(&raw).unwrap();
        }
    }

    #[test]
    fn test_load_all_channels() {
        let temp = TempDir::new().unwrap();
        write_tagged(temp.path(), "run_fov1.tiff", &[("CD45", 1), ("DAPI", 2)]);
        write_tagged(temp.path(), "run_fov2.tiff", &[("CD45", 3), ("DAPI", 4)]);

        let options = MultichannelLoadOptions::default();
        let stack = load_multichannel(temp.path(), &options).unwrap();
        assert_eq!(stack.shape(), (2, 3, 3, 2));
        assert_eq!(stack.channels(), ["CD45", "DAPI"]);
        assert_eq!(stack.fovs(), ["run_fov1", "run_fov2"]);
        assert_eq!(stack.page(1, 1), ImagePage::U16(Array2::from_elem((3, 3), 4u16)));
    }

    #[test]
    fn test_channel_subset_and_delimiter() {
        let temp = TempDir::new().unwrap();
        write_tagged(temp.path(), "fov1_scan1.tiff", &[("CD45", 1), ("DAPI", 2)]);

        let options = MultichannelLoadOptions {
            channels: Some(vec!["DAPI".to_string()]),
            delimiter: Some("_".to_string()),
            ..Default::default()
        };
        let stack = load_multichannel(temp.path(), &options).unwrap();
        assert_eq!(stack.fovs(), ["fov1"]);
        assert_eq!(stack.channels(), ["DAPI"]);
        assert_eq!(stack.page(0, 0), ImagePage::U16(Array2::from_elem((3, 3), 2u16)));
    }

    #[test]
    fn test_unknown_channel_errors() {
        let temp = TempDir::new().unwrap();
        write_tagged(temp.path(), "fov1.tiff", &[("CD45", 1)]);

        let options = MultichannelLoadOptions {
            channels: Some(vec!["CD3".to_string()]),
            ..Default::default()
        };
        let err = load_multichannel(temp.path(), &options).unwrap_err();
        assert!(matches!(err, FovkitError::NotInList { .. }));
    }

    #[test]
    fn test_untagged_pages_get_positional_names() {
        let temp = TempDir::new().unwrap();
        let pages = vec![
            ImagePage::U16(Array2::from_elem((3, 3), 1u16)),
            ImagePage::U16(Array2::from_elem((3, 3), 2u16)),
        ];
        codecs::tiff::write_pages(
            temp.path().join("fov1.tiff"),
            &pages,
            None,
            CompressionLevel::Fast,
        )
        .unwrap();

        let stack = load_multichannel(temp.path(), &MultichannelLoadOptions::default()).unwrap();
        assert_eq!(stack.channels(), ["channel_0", "channel_1"]);
    }

    #[test]
    fn test_empty_directory_errors() {
        let temp = TempDir::new().unwrap();
        let err = load_multichannel(temp.path(), &MultichannelLoadOptions::default()).unwrap_err();
        assert!(err.to_string().contains("no multichannel TIFF files"));
    }
}
