//! Tiled acquisitions: `R{n}C{m}` grids of FOVs
//!
//! Tiled runs name their FOVs `prefix_RnCm` after the row/column position in
//! the grid. Acquisitions abort or skip tiles, so the grid on disk can have
//! holes; loading fills missing positions with zeros to keep the stitched
//! geometry intact.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use ndarray::{s, Array4};
use regex::Regex;

use crate::codecs;
use crate::error::{FovkitError, Result};
use crate::models::{DynImageStack, ImagePage, ImageStack, Pixel, CHANNEL_DIM};
use crate::paths;

use super::{dispatch_stack, fov_dir, warn_negative};

lazy_static::lazy_static! {
    static ref TILE_POSITION: Regex = Regex::new(r"R(\d+)C(\d+)").unwrap();
}

/// A complete expected tile grid for one run prefix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileGrid {
    /// Run/tile prefix, empty for bare `RnCm` names
    pub prefix: String,
    /// Every expected FOV name, in row-major order
    pub fovs: Vec<String>,
    /// Number of grid rows
    pub rows: usize,
    /// Number of grid columns
    pub cols: usize,
}

/// Where the image data of a tiled run lives
#[derive(Debug, Clone)]
pub enum TiledFovs {
    /// FOV folders named after their grid position
    Folders(Vec<String>),
    /// Grid position mapped to the actual folder name, for runs whose
    /// folders were renamed by the acquisition software
    Renamed(BTreeMap<String, String>),
}

/// Options for [`load_tiled`]
#[derive(Debug, Clone)]
pub struct TiledLoadOptions {
    /// Whether images live in a single flat directory
    /// (`{fov}_{channel}.{ext}`) instead of per-FOV folders
    pub single_dir: bool,
    /// File extension of the existing images
    pub file_ext: String,
    /// Name of an image subfolder inside each FOV folder
    pub img_sub_folder: Option<String>,
}

impl Default for TiledLoadOptions {
    fn default() -> Self {
        Self {
            single_dir: false,
            file_ext: "tiff".to_string(),
            img_sub_folder: None,
        }
    }
}

/// Group FOV names by their run prefix.
///
/// The part after the final `_` is the grid position; everything before it
/// is the prefix (empty for bare positions).
pub fn group_fovs_by_prefix(fovs: &[String]) -> BTreeMap<String, Vec<String>> {
    let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for name in fovs {
        let (prefix, position) = match name.rsplit_once('_') {
            Some((prefix, position)) => (prefix.to_string(), position.to_string()),
            None => (String::new(), name.clone()),
        };
        groups.entry(prefix).or_default().push(position);
    }
    groups
}

/// Expand a list of tiled FOV names into the complete grids they imply.
///
/// For every prefix, the maximum row and column index seen decides the grid
/// extent, and the full row-major `R1C1..RnCm` list is generated. Names
/// without an `RnCm` position are an error.
pub fn expand_tile_grid(fovs: &[String]) -> Result<Vec<TileGrid>> {
    let mut grids = Vec::new();
    for (prefix, positions) in group_fovs_by_prefix(fovs) {
        let mut rows = 0usize;
        let mut cols = 0usize;
        for position in &positions {
            let captures = TILE_POSITION.captures(position).ok_or_else(|| {
                FovkitError::validation(format!(
                    "FOV name {position} does not contain an RnCm tile position"
                ))
            })?;
            let row: usize = captures[1]
                .parse()
                .map_err(|_| FovkitError::validation(format!("invalid tile row in {position}")))?;
            let col: usize = captures[2]
                .parse()
                .map_err(|_| FovkitError::validation(format!("invalid tile column in {position}")))?;
            rows = rows.max(row);
            cols = cols.max(col);
        }

        let mut expected = Vec::with_capacity(rows * cols);
        for row in 1..=rows {
            for col in 1..=cols {
                let position = format!("R{row}C{col}");
                expected.push(if prefix.is_empty() {
                    position
                } else {
                    format!("{prefix}_{position}")
                });
            }
        }

        grids.push(TileGrid {
            prefix,
            fovs: expected,
            rows,
            cols,
        });
    }
    Ok(grids)
}

/// Load one channel across an expected tile grid, leaving missing FOVs as
/// zeros.
pub fn load_tiled(
    data_dir: impl AsRef<Path>,
    fovs: &TiledFovs,
    expected_fovs: &[String],
    channel: &str,
    options: &TiledLoadOptions,
) -> Result<DynImageStack> {
    let data_dir = data_dir.as_ref();
    paths::validate_paths(&[data_dir])?;

    let present: Vec<String> = match fovs {
        TiledFovs::Folders(folders) => folders.clone(),
        TiledFovs::Renamed(map) => map.values().cloned().collect(),
    };
    if present.is_empty() {
        return Err(FovkitError::validation("no FOVs provided for the tiled grid"));
    }
    if expected_fovs.is_empty() {
        return Err(FovkitError::validation("no expected FOV names for the tiled grid"));
    }

    let first_path = channel_path(data_dir, &present[0], channel, options);
    let first_page = codecs::read_image(&first_path)?;

    let stack = dispatch_stack!(first_page, Px => fill_tiled::<Px>(
        data_dir,
        fovs,
        &present,
        expected_fovs,
        channel,
        options,
        &first_page,
    )?);

    warn_negative(&stack);
    Ok(stack)
}

fn channel_path(data_dir: &Path, fov: &str, channel: &str, options: &TiledLoadOptions) -> PathBuf {
    if options.single_dir {
        data_dir.join(format!("{fov}_{channel}.{}", options.file_ext))
    } else {
        let sub_folder = options.img_sub_folder.as_deref().unwrap_or("");
        fov_dir(data_dir, fov, sub_folder).join(format!("{channel}.{}", options.file_ext))
    }
}

fn fill_tiled<T: Pixel>(
    data_dir: &Path,
    fovs: &TiledFovs,
    present: &[String],
    expected_fovs: &[String],
    channel: &str,
    options: &TiledLoadOptions,
    first_page: &ImagePage,
) -> Result<ImageStack<T>> {
    let (rows, cols) = first_page.dimensions();
    let mut data = Array4::<T>::zeros((expected_fovs.len(), rows, cols, 1));

    for (index, fov_name) in expected_fovs.iter().enumerate() {
        let folder = if present.iter().any(|name| name == fov_name) {
            Some(fov_name.clone())
        } else if let TiledFovs::Renamed(map) = fovs {
            map.get(fov_name).cloned()
        } else {
            None
        };

        // missing grid positions stay zero
        let Some(folder) = folder else {
            continue;
        };

        let path = channel_path(data_dir, &folder, channel, options);
        let page = codecs::read_image(&path)?;
        let cast = page.cast::<T>();
        let (page_rows, page_cols) = (cast.nrows(), cast.ncols());
        if page_rows > rows || page_cols > cols {
            return Err(FovkitError::validation(format!(
                "image {} is {page_rows}x{page_cols}, larger than the tile size {rows}x{cols}",
                path.display()
            )));
        }
        data.slice_mut(s![index, ..page_rows, ..page_cols, 0])
            .assign(&cast);
    }

    ImageStack::new(
        data,
        expected_fovs.to_vec(),
        vec![channel.to_string()],
        CHANNEL_DIM,
    )
}
