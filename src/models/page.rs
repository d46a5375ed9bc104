//! Single decoded image planes

use ndarray::Array2;

use super::{Pixel, PixelType};

/// A single decoded 2-D image, preserving its on-disk sample format
#[derive(Debug, Clone, PartialEq)]
pub enum ImagePage {
    /// Unsigned 8-bit plane
    U8(Array2<u8>),
    /// Unsigned 16-bit plane
    U16(Array2<u16>),
    /// Unsigned 32-bit plane
    U32(Array2<u32>),
    /// Signed 16-bit plane
    I16(Array2<i16>),
    /// Signed 32-bit plane
    I32(Array2<i32>),
    /// 32-bit float plane
    F32(Array2<f32>),
}

impl ImagePage {
    /// Sample format of this plane
    pub fn pixel_type(&self) -> PixelType {
        match self {
            Self::U8(_) => PixelType::U8,
            Self::U16(_) => PixelType::U16,
            Self::U32(_) => PixelType::U32,
            Self::I16(_) => PixelType::I16,
            Self::I32(_) => PixelType::I32,
            Self::F32(_) => PixelType::F32,
        }
    }

    /// Plane dimensions as (rows, cols)
    pub fn dimensions(&self) -> (usize, usize) {
        match self {
            Self::U8(a) => (a.nrows(), a.ncols()),
            Self::U16(a) => (a.nrows(), a.ncols()),
            Self::U32(a) => (a.nrows(), a.ncols()),
            Self::I16(a) => (a.nrows(), a.ncols()),
            Self::I32(a) => (a.nrows(), a.ncols()),
            Self::F32(a) => (a.nrows(), a.ncols()),
        }
    }

    /// Cast the plane into the stack element type `T`.
    ///
    /// Casts are plain numeric conversions: narrowing follows the usual `as`
    /// truncation rules, matching the array-cast behavior of the data this
    /// toolbox is written for.
    pub fn cast<T: Pixel>(&self) -> Array2<T> {
        match self {
            Self::U8(a) => a.mapv(T::from_u8),
            Self::U16(a) => a.mapv(T::from_u16),
            Self::U32(a) => a.mapv(T::from_u32),
            Self::I16(a) => a.mapv(T::from_i16),
            Self::I32(a) => a.mapv(T::from_i32),
            Self::F32(a) => a.mapv(T::from_f32),
        }
    }
}
