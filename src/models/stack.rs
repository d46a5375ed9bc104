//! Labeled 4-D image stacks

use ndarray::{s, Array4, ArrayView2};
use serde::Serialize;

use crate::error::{FovkitError, Result};

use super::{ImagePage, Pixel, PixelType};

/// Default name of the channel axis
pub const CHANNEL_DIM: &str = "channels";

/// A 4-D image stack with shape `[fovs, rows, cols, channels]`.
///
/// FOV and channel coordinates are names; the channel axis itself can be
/// renamed (e.g. `compartments`) for data where the last axis is not a set
/// of imaging channels.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageStack<T> {
    data: Array4<T>,
    fovs: Vec<String>,
    channels: Vec<String>,
    channel_dim: String,
}

impl<T: Pixel> ImageStack<T> {
    /// Create a stack, checking that the coordinate names match the data shape
    pub fn new(
        data: Array4<T>,
        fovs: Vec<String>,
        channels: Vec<String>,
        channel_dim: impl Into<String>,
    ) -> Result<Self> {
        let shape = data.shape();
        if shape[0] != fovs.len() {
            return Err(FovkitError::validation(format!(
                "stack has {} FOV planes but {} FOV names",
                shape[0],
                fovs.len()
            )));
        }
        if shape[3] != channels.len() {
            return Err(FovkitError::validation(format!(
                "stack has {} channel planes but {} channel names",
                shape[3],
                channels.len()
            )));
        }
        Ok(Self {
            data,
            fovs,
            channels,
            channel_dim: channel_dim.into(),
        })
    }

    /// The underlying `[fovs, rows, cols, channels]` array
    pub fn data(&self) -> &Array4<T> {
        &self.data
    }

    /// FOV names along the first axis
    pub fn fovs(&self) -> &[String] {
        &self.fovs
    }

    /// Channel names along the last axis
    pub fn channels(&self) -> &[String] {
        &self.channels
    }

    /// Name of the channel axis
    pub fn channel_dim(&self) -> &str {
        &self.channel_dim
    }

    /// Shape as (fovs, rows, cols, channels)
    pub fn shape(&self) -> (usize, usize, usize, usize) {
        let shape = self.data.shape();
        (shape[0], shape[1], shape[2], shape[3])
    }

    /// Index of a FOV name, if present
    pub fn fov_index(&self, name: &str) -> Option<usize> {
        self.fovs.iter().position(|fov| fov == name)
    }

    /// Index of a channel name, if present
    pub fn channel_index(&self, name: &str) -> Option<usize> {
        self.channels.iter().position(|channel| channel == name)
    }

    /// A single 2-D plane for one FOV and channel
    pub fn page(&self, fov: usize, channel: usize) -> ArrayView2<'_, T> {
        self.data.slice(s![fov, .., .., channel])
    }

    /// Whether any sample in the stack is negative
    pub fn has_negative_values(&self) -> bool {
        self.data.iter().any(|value| *value < T::zero())
    }
}

/// An [`ImageStack`] whose element type was decided at load time
#[derive(Debug, Clone, PartialEq)]
pub enum DynImageStack {
    /// Unsigned 8-bit stack
    U8(ImageStack<u8>),
    /// Unsigned 16-bit stack
    U16(ImageStack<u16>),
    /// Unsigned 32-bit stack
    U32(ImageStack<u32>),
    /// Signed 16-bit stack
    I16(ImageStack<i16>),
    /// Signed 32-bit stack
    I32(ImageStack<i32>),
    /// 32-bit float stack
    F32(ImageStack<f32>),
}

macro_rules! with_stack {
    ($self:expr, $stack:ident => $body:expr) => {
        match $self {
            DynImageStack::U8($stack) => $body,
            DynImageStack::U16($stack) => $body,
            DynImageStack::U32($stack) => $body,
            DynImageStack::I16($stack) => $body,
            DynImageStack::I32($stack) => $body,
            DynImageStack::F32($stack) => $body,
        }
    };
}

impl DynImageStack {
    /// Element sample format of the stack
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

    /// FOV names along the first axis
    pub fn fovs(&self) -> &[String] {
        with_stack!(self, stack => stack.fovs())
    }

    /// Channel names along the last axis
    pub fn channels(&self) -> &[String] {
        with_stack!(self, stack => stack.channels())
    }

    /// Name of the channel axis
    pub fn channel_dim(&self) -> &str {
        with_stack!(self, stack => stack.channel_dim())
    }

    /// Shape as (fovs, rows, cols, channels)
    pub fn shape(&self) -> (usize, usize, usize, usize) {
        with_stack!(self, stack => stack.shape())
    }

    /// Whether any sample in the stack is negative
    pub fn has_negative_values(&self) -> bool {
        with_stack!(self, stack => stack.has_negative_values())
    }

    /// An owned 2-D plane for one FOV and channel, preserving sample format
    pub fn page(&self, fov: usize, channel: usize) -> ImagePage {
        match self {
            Self::U8(stack) => ImagePage::U8(stack.page(fov, channel).to_owned()),
            Self::U16(stack) => ImagePage::U16(stack.page(fov, channel).to_owned()),
            Self::U32(stack) => ImagePage::U32(stack.page(fov, channel).to_owned()),
            Self::I16(stack) => ImagePage::I16(stack.page(fov, channel).to_owned()),
            Self::I32(stack) => ImagePage::I32(stack.page(fov, channel).to_owned()),
            Self::F32(stack) => ImagePage::F32(stack.page(fov, channel).to_owned()),
        }
    }

    /// Summary of the stack for reporting
    pub fn summary(&self) -> StackInfo {
        let (_, rows, cols, _) = self.shape();
        StackInfo {
            fovs: self.fovs().to_vec(),
            channels: self.channels().to_vec(),
            rows,
            cols,
            pixel_type: self.pixel_type(),
            channel_dim: self.channel_dim().to_string(),
        }
    }
}

macro_rules! impl_from_stack {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<ImageStack<$ty>> for DynImageStack {
                fn from(stack: ImageStack<$ty>) -> Self {
                    DynImageStack::$variant(stack)
                }
            }
        )*
    };
}

impl_from_stack!(u8 => U8, u16 => U16, u32 => U32, i16 => I16, i32 => I32, f32 => F32);

/// Shape and coordinate summary of a loaded stack
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StackInfo {
    /// FOV names
    pub fovs: Vec<String>,
    /// Channel names
    pub channels: Vec<String>,
    /// Image height in pixels
    pub rows: usize,
    /// Image width in pixels
    pub cols: usize,
    /// Element sample format
    pub pixel_type: PixelType,
    /// Name of the channel axis
    pub channel_dim: String,
}
