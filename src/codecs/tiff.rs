//! TIFF page reading and writing
//!
//! Multiplexed acquisitions ship either as one grayscale TIFF per channel or
//! as multi-page TIFFs with one channel per page. Page descriptions carry
//! channel metadata: acquisition software writes a JSON blob with a
//! `channel.target` key, OME-TIFF writers put the OME-XML document on the
//! first page.

use std::fs::File;
use std::io::{BufReader, BufWriter, Seek, Write};
use std::path::Path;

use ndarray::Array2;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::{colortype, TiffEncoder};
use tiff::encoder::compression::{Deflate, DeflateLevel};
use tiff::tags::Tag;
use tiff::ColorType;

use crate::error::{FovkitError, Result};
use crate::models::ImagePage;

use super::CompressionLevel;

impl CompressionLevel {
    fn deflate(self) -> Deflate {
        match self {
            Self::Fast => Deflate::with_level(DeflateLevel::Fast),
            Self::Balanced => Deflate::with_level(DeflateLevel::Balanced),
            Self::Best => Deflate::with_level(DeflateLevel::Best),
        }
    }
}

/// Read every page of a TIFF file, with each page's description tag when
/// present
pub fn read_pages(path: impl AsRef<Path>) -> Result<Vec<(ImagePage, Option<String>)>> {
    let path = path.as_ref();
    let reader = BufReader::new(File::open(path)?);
    let mut decoder = Decoder::new(reader)?;

    let mut pages = Vec::new();
    loop {
        match decoder.colortype()? {
            ColorType::Gray(_) => {}
            other => {
                return Err(FovkitError::validation(format!(
                    "unsupported TIFF color type {other:?} in {}",
                    path.display()
                )))
            }
        }
        let (width, height) = decoder.dimensions()?;
        // ASCII tags may carry their NUL terminator through the decoder
        let description = decoder
            .get_tag_ascii_string(Tag::ImageDescription)
            .ok()
            .map(|value| value.trim_end_matches('\0').to_string());
        let result = decoder.read_image()?;
        let page = page_from_result(result, height as usize, width as usize, path)?;
        pages.push((page, description));

        if !decoder.more_images() {
            break;
        }
        decoder.next_image()?;
    }

    Ok(pages)
}

fn page_from_result(
    result: DecodingResult,
    rows: usize,
    cols: usize,
    path: &Path,
) -> Result<ImagePage> {
    let shape = (rows, cols);
    let page = match result {
        DecodingResult::U8(data) => ImagePage::U8(Array2::from_shape_vec(shape, data)?),
        DecodingResult::U16(data) => ImagePage::U16(Array2::from_shape_vec(shape, data)?),
        DecodingResult::U32(data) => ImagePage::U32(Array2::from_shape_vec(shape, data)?),
        DecodingResult::I16(data) => ImagePage::I16(Array2::from_shape_vec(shape, data)?),
        DecodingResult::I32(data) => ImagePage::I32(Array2::from_shape_vec(shape, data)?),
        DecodingResult::F32(data) => ImagePage::F32(Array2::from_shape_vec(shape, data)?),
        _ => {
            return Err(FovkitError::validation(format!(
                "unsupported TIFF sample format in {}",
                path.display()
            )))
        }
    };
    Ok(page)
}

/// Channel name recorded in a page description, if the description is the
/// JSON blob written by acquisition software
pub fn channel_name(description: Option<&str>) -> Option<String> {
    let description = description?;
    let value: serde_json::Value = serde_json::from_str(description.trim()).ok()?;
    value
        .get("channel.target")
        .and_then(|target| target.as_str())
        .map(|target| target.to_string())
}

/// Write grayscale planes as a (possibly multi-page) deflate-compressed TIFF.
///
/// The description, if given, is attached to the first page only, matching
/// where OME-TIFF readers look for the OME-XML document.
pub fn write_pages(
    path: impl AsRef<Path>,
    pages: &[ImagePage],
    description: Option<&str>,
    compression: CompressionLevel,
) -> Result<()> {
    let path = path.as_ref();
    if pages.is_empty() {
        return Err(FovkitError::validation(format!(
            "no pages to write to {}",
            path.display()
        )));
    }

    let writer = BufWriter::new(File::create(path)?);
    let mut encoder = TiffEncoder::new(writer)?;
    for (index, page) in pages.iter().enumerate() {
        let description = if index == 0 { description } else { None };
        write_single(&mut encoder, page, description, compression)?;
    }

    Ok(())
}

macro_rules! encode_page {
    ($encoder:expr, $color:ty, $data:expr, $width:expr, $height:expr, $desc:expr, $deflate:expr) => {{
        let mut image = $encoder.new_image_with_compression::<$color, _>($width, $height, $deflate)?;
        if let Some(description) = $desc {
            image.encoder().write_tag(Tag::ImageDescription, description)?;
        }
        image.write_data($data)?;
    }};
}

fn write_single<W: Write + Seek>(
    encoder: &mut TiffEncoder<W>,
    page: &ImagePage,
    description: Option<&str>,
    compression: CompressionLevel,
) -> Result<()> {
    let (rows, cols) = page.dimensions();
    let (width, height) = (cols as u32, rows as u32);
    let deflate = compression.deflate();

    match page {
        ImagePage::U8(data) => {
            encode_page!(encoder, colortype::Gray8, &contiguous(data), width, height, description, deflate)
        }
        ImagePage::U16(data) => {
            encode_page!(encoder, colortype::Gray16, &contiguous(data), width, height, description, deflate)
        }
        ImagePage::U32(data) => {
            encode_page!(encoder, colortype::Gray32, &contiguous(data), width, height, description, deflate)
        }
        ImagePage::I16(data) => {
            encode_page!(encoder, colortype::GrayI16, &contiguous(data), width, height, description, deflate)
        }
        ImagePage::I32(data) => {
            encode_page!(encoder, colortype::GrayI32, &contiguous(data), width, height, description, deflate)
        }
        ImagePage::F32(data) => {
            encode_page!(encoder, colortype::Gray32Float, &contiguous(data), width, height, description, deflate)
        }
    }

    Ok(())
}

/// Row-major copy of the plane data for the encoder
fn contiguous<T: Clone>(data: &Array2<T>) -> Vec<T> {
    data.iter().cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use tempfile::TempDir;

    #[test]
    fn test_multipage_roundtrip_with_description() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("stack.tiff");

        let pages = vec![
            ImagePage::U16(array![[1u16, 2], [3, 4]]),
            ImagePage::U16(array![[5u16, 6], [7, 8]]),
        ];
        write_pages(&path, &pages, Some("first page only"), CompressionLevel::Balanced).unwrap();

        let loaded = read_pages(&path).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].0, pages[0]);
        assert_eq!(loaded[1].0, pages[1]);
        assert_eq!(loaded[0].1.as_deref(), Some("first page only"));
        assert_eq!(loaded[1].1, None);
    }

    #[test]
    fn test_signed_and_float_pages() {
        let temp = TempDir::new().unwrap();

        let signed = ImagePage::I16(array![[-1i16, 2], [3, -4]]);
        let path = temp.path().join("signed.tiff");
        write_pages(&path, std::slice::from_ref(&signed), None, CompressionLevel::Fast).unwrap();
        assert_eq!(read_pages(&path).unwrap()[0].0, signed);

        let float = ImagePage::F32(array![[0.5f32, 1.25], [-2.0, 3.75]]);
        let path = temp.path().join("float.tiff");
        write_pages(&path, std::slice::from_ref(&float), None, CompressionLevel::Best).unwrap();
        assert_eq!(read_pages(&path).unwrap()[0].0, float);
    }

    #[test]
    fn test_channel_name_from_description() {
        let json = r#"{"channel.mass": 89, "channel.target": "CD45"}"#;
        assert_eq!(channel_name(Some(json)), Some("CD45".to_string()));

        // not JSON (e.g. OME-XML) or missing key
        assert_eq!(channel_name(Some("<OME/>")), None);
        assert_eq!(channel_name(Some("{\"other\": 1}")), None);
        assert_eq!(channel_name(None), None);
    }

    #[test]
    fn test_write_pages_rejects_empty() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("empty.tiff");
        assert!(write_pages(&path, &[], None, CompressionLevel::Balanced).is_err());
    }
}
