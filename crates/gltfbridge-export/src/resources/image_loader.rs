//! Image decoding for the image cache
//!
//! Missing and undecodable files are diagnostics, never export failures.

use std::path::Path;

use gltfbridge_host::path::{file_stem, normalize_path};
use gltfbridge_host::ImageSource;

use crate::gltf::Image;

/// Whether `path` exists, warning when it does not
pub(crate) fn image_exists<S: ImageSource + ?Sized>(source: &S, path: &str) -> bool {
    let found = source.exists(Path::new(path));
    if !found {
        tracing::warn!(
            path,
            "Texture file not found; skipping. Use paths relative to the scene file so textures resolve on every machine"
        );
    }
    found
}

/// Decode the image at an existing `path`, logging why it is unusable if it is
pub(crate) fn decode_image<S: ImageSource + ?Sized>(source: &S, path: &str) -> Option<Image> {
    match source.decode(Path::new(path)) {
        Ok(decoded) => {
            let uri = normalize_path(path);
            tracing::debug!(path = %uri, width = decoded.width, height = decoded.height, "Loaded image");
            Some(Image {
                name: Some(file_stem(&uri).to_string()),
                uri,
                mime_type: decoded.mime_type,
                width: decoded.width,
                height: decoded.height,
            })
        }
        Err(e) => {
            tracing::warn!(path, error = %e, "Failed to decode texture; skipping");
            None
        }
    }
}
