//! Image file access
//!
//! glTF only references PNG and JPEG images, so anything else is reported
//! as unsupported rather than converted.

use std::path::{Path, PathBuf};

use image::{ImageFormat, ImageReader};
use serde::Serialize;
use thiserror::Error;

/// Result of decoding an image file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    #[serde(rename = "mimeType")]
    pub mime_type: String,
}

/// Image decoding errors
#[derive(Error, Debug)]
pub enum ImageDecodeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Could not determine image format")]
    UnknownFormat,

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// Filesystem collaborator used by the image loader
pub trait ImageSource {
    /// Whether `path` names an existing file
    fn exists(&self, path: &Path) -> bool;

    /// Decode the image at `path`
    fn decode(&self, path: &Path) -> Result<DecodedImage, ImageDecodeError>;
}

impl<T: ImageSource + ?Sized> ImageSource for &T {
    fn exists(&self, path: &Path) -> bool {
        (**self).exists(path)
    }

    fn decode(&self, path: &Path) -> Result<DecodedImage, ImageDecodeError> {
        (**self).decode(path)
    }
}

/// Map an image format onto the glTF mime type
pub fn gltf_mime_type(format: ImageFormat) -> Option<&'static str> {
    match format {
        ImageFormat::Png => Some("image/png"),
        ImageFormat::Jpeg => Some("image/jpeg"),
        _ => None,
    }
}

/// [`ImageSource`] over the local filesystem.
///
/// Relative paths are taken relative to `root` when one is set, otherwise
/// relative to the working directory.
#[derive(Debug, Clone, Default)]
pub struct FsImageSource {
    root: Option<PathBuf>,
}

impl FsImageSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve relative paths against `root`, typically the scene's directory
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    pub fn resolve(&self, path: &Path) -> PathBuf {
        match &self.root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }
}

impl ImageSource for FsImageSource {
    fn exists(&self, path: &Path) -> bool {
        self.resolve(path).is_file()
    }

    fn decode(&self, path: &Path) -> Result<DecodedImage, ImageDecodeError> {
        let path = &self.resolve(path);
        let reader = ImageReader::open(path)?.with_guessed_format()?;
        let format = reader.format().ok_or(ImageDecodeError::UnknownFormat)?;
        let mime_type = gltf_mime_type(format)
            .ok_or_else(|| ImageDecodeError::UnsupportedFormat(format!("{format:?}")))?;

        // Full decode so truncated or corrupt files are caught here
        let image = reader.decode()?;
        tracing::trace!(path = %path.display(), width = image.width(), height = image.height(), "Decoded image");

        Ok(DecodedImage {
            width: image.width(),
            height: image.height(),
            mime_type: mime_type.to_string(),
        })
    }
}
