//! Known file extensions for imaging data directories

/// Extensions of raster images the loaders will pick up
pub const IMAGE_EXTENSIONS: &[&str] = &["tiff", "tif", "png", "jpg", "jpeg"];

/// Extensions of archives that may sit next to image data
pub const ARCHIVE_EXTENSIONS: &[&str] = &["tar", "gz", "zip"];

/// Extensions of tabular/binary sidecar data
pub const DATA_EXTENSIONS: &[&str] = &["csv", "feather", "bin", "json"];

/// All extensions recognized when stripping file extensions from names
pub fn known_extensions() -> impl Iterator<Item = &'static str> {
    IMAGE_EXTENSIONS
        .iter()
        .chain(ARCHIVE_EXTENSIONS.iter())
        .chain(DATA_EXTENSIONS.iter())
        .copied()
}

/// Whether a file name carries one of the recognized image extensions
pub fn is_image_file(name: &str) -> bool {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => {
            IMAGE_EXTENSIONS.iter().any(|known| ext.eq_ignore_ascii_case(known))
        }
        _ => false,
    }
}
