//! OME-XML metadata model
//!
//! Only the slice of the schema this toolbox reads and writes is modeled:
//! `OME > Image(+) > Pixels > Channel(+)`. Unknown elements in documents
//! written by other software are ignored on parse.

use serde::{Deserialize, Serialize};

use crate::error::{FovkitError, Result};
use crate::models::PixelType;

/// OME schema namespace written into generated documents
pub const OME_XMLNS: &str = "http://www.openmicroscopy.org/Schemas/OME/2016-06";

/// Dimension order of the planes this toolbox writes
pub const DIMENSION_ORDER: &str = "XYCZT";

/// Root of an OME-XML document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename = "OME")]
pub struct Ome {
    /// Schema namespace
    #[serde(rename = "@xmlns", default)]
    pub xmlns: String,
    /// Images described by the document; multi-resolution files repeat the
    /// same image at different sizes
    #[serde(rename = "Image", default)]
    pub images: Vec<OmeImage>,
}

/// A single OME image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OmeImage {
    /// Image identifier, e.g. `Image:0`
    #[serde(rename = "@ID")]
    pub id: String,
    /// Human-readable image name (the FOV name)
    #[serde(rename = "@Name", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Acquisition timestamp, RFC 3339
    #[serde(rename = "AcquisitionDate", skip_serializing_if = "Option::is_none")]
    pub acquisition_date: Option<String>,
    /// Pixel data description
    #[serde(rename = "Pixels")]
    pub pixels: OmePixels,
}

/// Pixel data description of an OME image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OmePixels {
    /// Pixels identifier, e.g. `Pixels:0`
    #[serde(rename = "@ID")]
    pub id: String,
    /// Plane ordering within the file
    #[serde(rename = "@DimensionOrder")]
    pub dimension_order: String,
    /// Sample format name, e.g. `uint16`
    #[serde(rename = "@Type")]
    pub pixel_type: String,
    /// Image width in pixels
    #[serde(rename = "@SizeX")]
    pub size_x: u32,
    /// Image height in pixels
    #[serde(rename = "@SizeY")]
    pub size_y: u32,
    /// Number of channels
    #[serde(rename = "@SizeC")]
    pub size_c: u32,
    /// Number of z-slices
    #[serde(rename = "@SizeZ")]
    pub size_z: u32,
    /// Number of timepoints
    #[serde(rename = "@SizeT")]
    pub size_t: u32,
    /// Per-channel metadata
    #[serde(rename = "Channel", default)]
    pub channels: Vec<OmeChannel>,
}

/// Per-channel metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OmeChannel {
    /// Channel identifier, e.g. `Channel:0:1`
    #[serde(rename = "@ID")]
    pub id: String,
    /// Channel name, e.g. the antibody target
    #[serde(rename = "@Name", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Samples per pixel, 1 for grayscale planes
    #[serde(rename = "@SamplesPerPixel")]
    pub samples_per_pixel: u32,
}

impl Ome {
    /// Parse an OME-XML document
    pub fn from_xml(xml: &str) -> Result<Self> {
        quick_xml::de::from_str(xml).map_err(|err| FovkitError::ome_xml(err.to_string()))
    }

    /// Serialize to an OME-XML document with an XML declaration
    pub fn to_xml(&self) -> Result<String> {
        let body =
            quick_xml::se::to_string(self).map_err(|err| FovkitError::ome_xml(err.to_string()))?;
        Ok(format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>{body}"))
    }

    /// Build a document describing one grayscale multi-channel image
    pub fn single_image(
        name: &str,
        pixel_type: PixelType,
        size_x: u32,
        size_y: u32,
        channels: &[String],
    ) -> Self {
        let channels = channels
            .iter()
            .enumerate()
            .map(|(index, channel)| OmeChannel {
                id: format!("Channel:0:{index}"),
                name: Some(channel.clone()),
                samples_per_pixel: 1,
            })
            .collect::<Vec<_>>();

        Self {
            xmlns: OME_XMLNS.to_string(),
            images: vec![OmeImage {
                id: "Image:0".to_string(),
                name: Some(name.to_string()),
                acquisition_date: Some(chrono::Utc::now().to_rfc3339()),
                pixels: OmePixels {
                    id: "Pixels:0".to_string(),
                    dimension_order: DIMENSION_ORDER.to_string(),
                    pixel_type: pixel_type.ome_name().to_string(),
                    size_x,
                    size_y,
                    size_c: channels.len() as u32,
                    size_z: 1,
                    size_t: 1,
                    channels,
                },
            }],
        }
    }

    /// The image the planes in the file belong to.
    ///
    /// Multi-resolution documents list the same image more than once; the
    /// first entry is the full-resolution one.
    pub fn primary_image(&self) -> Option<&OmeImage> {
        self.images.first()
    }
}

impl OmeImage {
    /// Channel names, substituting `Channel {index}` where the document has
    /// none
    pub fn channel_names(&self) -> Vec<String> {
        self.pixels
            .channels
            .iter()
            .enumerate()
            .map(|(index, channel)| {
                channel.name.clone().unwrap_or_else(|| format!("Channel {index}"))
            })
            .collect()
    }
}
