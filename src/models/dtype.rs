//! Pixel sample formats

use std::fmt;

use num_traits::Zero;
use serde::{Deserialize, Serialize};

/// On-disk sample format of an image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PixelType {
    /// Unsigned 8-bit
    #[serde(rename = "uint8")]
    U8,
    /// Unsigned 16-bit
    #[serde(rename = "uint16")]
    U16,
    /// Unsigned 32-bit
    #[serde(rename = "uint32")]
    U32,
    /// Signed 16-bit
    #[serde(rename = "int16")]
    I16,
    /// Signed 32-bit
    #[serde(rename = "int32")]
    I32,
    /// 32-bit float
    #[serde(rename = "float")]
    F32,
}

impl PixelType {
    /// OME-XML `Type` attribute string for this sample format
    pub fn ome_name(&self) -> &'static str {
        match self {
            Self::U8 => "uint8",
            Self::U16 => "uint16",
            Self::U32 => "uint32",
            Self::I16 => "int16",
            Self::I32 => "int32",
            Self::F32 => "float",
        }
    }

    /// Parse an OME-XML `Type` attribute string
    pub fn from_ome_name(name: &str) -> Option<Self> {
        match name {
            "uint8" => Some(Self::U8),
            "uint16" => Some(Self::U16),
            "uint32" => Some(Self::U32),
            "int16" => Some(Self::I16),
            "int32" => Some(Self::I32),
            "float" => Some(Self::F32),
            _ => None,
        }
    }
}

impl fmt::Display for PixelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.ome_name())
    }
}

/// Element type of a loaded image stack.
///
/// The sample format of the first image decoded decides the element type of
/// the whole stack; later images are cast into it with plain numeric casts.
pub trait Pixel: Copy + PartialOrd + Zero + Send + Sync + 'static {
    /// The matching dynamic sample format
    const TYPE: PixelType;

    /// Cast from an unsigned 8-bit sample
    fn from_u8(value: u8) -> Self;
    /// Cast from an unsigned 16-bit sample
    fn from_u16(value: u16) -> Self;
    /// Cast from an unsigned 32-bit sample
    fn from_u32(value: u32) -> Self;
    /// Cast from a signed 16-bit sample
    fn from_i16(value: i16) -> Self;
    /// Cast from a signed 32-bit sample
    fn from_i32(value: i32) -> Self;
    /// Cast from a 32-bit float sample
    fn from_f32(value: f32) -> Self;
}

macro_rules! impl_pixel {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl Pixel for $ty {
                const TYPE: PixelType = PixelType::$variant;

                #[inline]
                fn from_u8(value: u8) -> Self {
                    value as $ty
                }

                #[inline]
                fn from_u16(value: u16) -> Self {
                    value as $ty
                }

                #[inline]
                fn from_u32(value: u32) -> Self {
                    value as $ty
                }

                #[inline]
                fn from_i16(value: i16) -> Self {
                    value as $ty
                }

                #[inline]
                fn from_i32(value: i32) -> Self {
                    value as $ty
                }

                #[inline]
                fn from_f32(value: f32) -> Self {
                    value as $ty
                }
            }
        )*
    };
}

impl_pixel!(u8 => U8, u16 => U16, u32 => U32, i16 => I16, i32 => I32, f32 => F32);
