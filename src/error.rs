//! Error types for fovkit

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for fovkit operations
#[derive(Error, Debug)]
pub enum FovkitError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Walkdir error: {0}")]
    WalkDir(#[from] walkdir::Error),

    #[error("TIFF error: {0}")]
    Tiff(#[from] tiff::TiffError),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Array shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("OME-XML error: {0}")]
    OmeXml(String),

    #[error("A bad path, {}, was provided: the folder {component} could not be found", .path.display())]
    BadPath { path: PathBuf, component: String },

    #[error("The file/path, {}, could not be found", .path.display())]
    MissingFile { path: PathBuf },

    #[error("Invalid value(s) provided for {provided_name}, not found in {allowed_name}:\n{invalid}")]
    NotInList {
        provided_name: String,
        allowed_name: String,
        invalid: String,
    },

    #[error("{left_name} and {right_name} do not contain the same elements:\n{detail}")]
    ElementMismatch {
        left_name: String,
        right_name: String,
        detail: String,
    },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for fovkit operations
pub type Result<T> = std::result::Result<T, FovkitError>;

impl FovkitError {
    /// Create a new validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new OME-XML error
    pub fn ome_xml(msg: impl Into<String>) -> Self {
        Self::OmeXml(msg.into())
    }

    /// Create a missing file/path error
    pub fn missing_file(path: impl Into<PathBuf>) -> Self {
        Self::MissingFile { path: path.into() }
    }
}
