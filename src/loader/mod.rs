//! Loading image directories into labeled stacks
//!
//! All loaders follow the same contract: the sample format of the first
//! image decoded decides the element type of the stack, later images are
//! cast into it, and a stack containing negative values is reported with a
//! warning since it usually means the on-disk dtype was too small for the
//! data.

mod dir;
mod multichannel;
mod tiled;
mod tree;

pub use dir::{load_from_dir, DirLoadOptions};
pub use multichannel::{load_multichannel, MultichannelLoadOptions};
pub use tiled::{
    expand_tile_grid, group_fovs_by_prefix, load_tiled, TileGrid, TiledFovs, TiledLoadOptions,
};
pub use tree::{load_from_tree, TreeLoadOptions};

use std::path::{Path, PathBuf};

use crate::models::DynImageStack;

/// Pick the stack element type from the first decoded page and run the
/// loader body once, monomorphized for that type.
macro_rules! dispatch_stack {
    ($page:expr, $px:ident => $body:expr) => {{
        use $crate::models::{DynImageStack, PixelType};
        match $page.pixel_type() {
            PixelType::U8 => {
                type $px = u8;
                DynImageStack::from($body)
            }
            PixelType::U16 => {
                type $px = u16;
                DynImageStack::from($body)
            }
            PixelType::U32 => {
                type $px = u32;
                DynImageStack::from($body)
            }
            PixelType::I16 => {
                type $px = i16;
                DynImageStack::from($body)
            }
            PixelType::I32 => {
                type $px = i32;
                DynImageStack::from($body)
            }
            PixelType::F32 => {
                type $px = f32;
                DynImageStack::from($body)
            }
        }
    }};
}
pub(crate) use dispatch_stack;

/// Sort names the way a microscopist expects: `fov2` before `fov10`
pub(crate) fn sort_natural(names: &mut [String]) {
    names.sort_by(|a, b| natord::compare(a, b));
}

/// FOV directory, honoring an optional image subfolder
pub(crate) fn fov_dir(data_dir: &Path, fov: &str, sub_folder: &str) -> PathBuf {
    if sub_folder.is_empty() {
        data_dir.join(fov)
    } else {
        data_dir.join(fov).join(sub_folder)
    }
}

/// Warn when a loaded stack contains negative samples
pub(crate) fn warn_negative(stack: &DynImageStack) {
    if stack.has_negative_values() {
        tracing::warn!("loaded images contain negative values");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_natural() {
        let mut names = vec![
            "fov10".to_string(),
            "fov2".to_string(),
            "fov1".to_string(),
        ];
        sort_natural(&mut names);
        assert_eq!(names, vec!["fov1", "fov2", "fov10"]);
    }

    #[test]
    fn test_fov_dir() {
        let base = Path::new("/data");
        assert_eq!(fov_dir(base, "fov1", ""), PathBuf::from("/data/fov1"));
        assert_eq!(fov_dir(base, "fov1", "TIFs"), PathBuf::from("/data/fov1/TIFs"));
    }
}
