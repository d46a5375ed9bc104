//! PNG and JPEG decode/encode via the image crate

use std::path::Path;

use image::{DynamicImage, ImageBuffer, Luma};
use ndarray::Array2;

use crate::error::{FovkitError, Result};
use crate::models::ImagePage;

/// Decode a grayscale PNG/JPEG, preserving 8- vs 16-bit depth
pub fn read_gray(path: impl AsRef<Path>) -> Result<ImagePage> {
    let path = path.as_ref();
    match image::open(path)? {
        DynamicImage::ImageLuma8(buffer) => {
            let (width, height) = buffer.dimensions();
            Ok(ImagePage::U8(Array2::from_shape_vec(
                (height as usize, width as usize),
                buffer.into_raw(),
            )?))
        }
        DynamicImage::ImageLuma16(buffer) => {
            let (width, height) = buffer.dimensions();
            Ok(ImagePage::U16(Array2::from_shape_vec(
                (height as usize, width as usize),
                buffer.into_raw(),
            )?))
        }
        _ => Err(FovkitError::validation(format!(
            "{} is not a single-channel grayscale image",
            path.display()
        ))),
    }
}

/// Decode all channels of a PNG/JPEG: one plane for grayscale input, the
/// color planes for RGB(A) input
pub fn read_channels(path: impl AsRef<Path>) -> Result<Vec<ImagePage>> {
    let path = path.as_ref();
    match image::open(path)? {
        DynamicImage::ImageLuma8(buffer) => {
            let (width, height) = buffer.dimensions();
            Ok(vec![ImagePage::U8(Array2::from_shape_vec(
                (height as usize, width as usize),
                buffer.into_raw(),
            )?)])
        }
        DynamicImage::ImageLuma16(buffer) => {
            let (width, height) = buffer.dimensions();
            Ok(vec![ImagePage::U16(Array2::from_shape_vec(
                (height as usize, width as usize),
                buffer.into_raw(),
            )?)])
        }
        DynamicImage::ImageRgb8(buffer) => {
            Ok(split_planes(&buffer)?.into_iter().map(ImagePage::U8).collect())
        }
        DynamicImage::ImageRgba8(buffer) => {
            Ok(split_planes(&buffer)?.into_iter().map(ImagePage::U8).collect())
        }
        DynamicImage::ImageRgb16(buffer) => {
            Ok(split_planes(&buffer)?.into_iter().map(ImagePage::U16).collect())
        }
        DynamicImage::ImageRgba16(buffer) => {
            Ok(split_planes(&buffer)?.into_iter().map(ImagePage::U16).collect())
        }
        _ => Err(FovkitError::validation(format!(
            "unsupported color type in {}",
            path.display()
        ))),
    }
}

/// Split an interleaved image buffer into per-channel planes
fn split_planes<P>(buffer: &ImageBuffer<P, Vec<P::Subpixel>>) -> Result<Vec<Array2<P::Subpixel>>>
where
    P: image::Pixel,
    P::Subpixel: Copy + 'static,
{
    let (width, height) = buffer.dimensions();
    let channel_count = P::CHANNEL_COUNT as usize;

    let mut planes: Vec<Vec<P::Subpixel>> =
        vec![Vec::with_capacity((width * height) as usize); channel_count];
    for pixel in buffer.pixels() {
        for (plane, value) in planes.iter_mut().zip(pixel.channels()) {
            plane.push(*value);
        }
    }

    planes
        .into_iter()
        .map(|plane| {
            Array2::from_shape_vec((height as usize, width as usize), plane).map_err(Into::into)
        })
        .collect()
}

/// Write an 8- or 16-bit grayscale PNG
pub fn save_png(path: impl AsRef<Path>, page: &ImagePage) -> Result<()> {
    let path = path.as_ref();
    match page {
        ImagePage::U8(data) => gray_buffer::<u8>(data)?.save(path)?,
        ImagePage::U16(data) => gray_buffer::<u16>(data)?.save(path)?,
        _ => {
            return Err(FovkitError::validation(format!(
                "PNG output supports 8- and 16-bit grayscale, not {}",
                page.pixel_type()
            )))
        }
    }
    Ok(())
}

/// Write an 8-bit grayscale JPEG
pub fn save_jpeg(path: impl AsRef<Path>, page: &ImagePage) -> Result<()> {
    let path = path.as_ref();
    match page {
        ImagePage::U8(data) => gray_buffer::<u8>(data)?.save(path)?,
        _ => {
            return Err(FovkitError::validation(format!(
                "JPEG output supports 8-bit grayscale, not {}",
                page.pixel_type()
            )))
        }
    }
    Ok(())
}

fn gray_buffer<S>(data: &Array2<S>) -> Result<ImageBuffer<Luma<S>, Vec<S>>>
where
    S: image::Primitive + 'static,
    Luma<S>: image::Pixel<Subpixel = S>,
{
    let (rows, cols) = (data.nrows(), data.ncols());
    let raw: Vec<S> = data.iter().copied().collect();
    ImageBuffer::from_raw(cols as u32, rows as u32, raw)
        .ok_or_else(|| FovkitError::validation("plane size does not match its dimensions"))
}
