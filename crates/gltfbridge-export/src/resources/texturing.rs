//! Image, sampler and texture caches

use gltfbridge_host::path::normalize_path;
use gltfbridge_host::ImageSource;

use super::cache::{Arena, Handle, KeyedCache};
use super::image_loader::{decode_image, image_exists};
use super::keys::{FilterKind, ImageKey, SamplerKey, TextureKey, TilingFlags};
use crate::gltf::{Image, Sampler, Texture};

/// Canonical images, samplers and textures of one export run
#[derive(Debug, Default)]
pub struct TextureResources {
    pub(crate) images: Arena<Image>,
    image_paths: KeyedCache<String, Option<Handle<Image>>>,
    image_keys: KeyedCache<ImageKey, Option<Handle<Image>>>,
    pub(crate) samplers: Arena<Sampler>,
    sampler_keys: KeyedCache<SamplerKey, Handle<Sampler>>,
    pub(crate) textures: Arena<Texture>,
    texture_keys: KeyedCache<TextureKey, Handle<Texture>>,
}

impl TextureResources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Canonical image for a path, `None` if the file is missing or unreadable.
    ///
    /// Existence is checked once per spelling of the path, so a missing
    /// `Tex/A.png` does not hide an existing `tex/a.png`. Spellings that differ
    /// only in case share one decoded image, and an image that failed to
    /// decode is not decoded again.
    pub fn resolve_image<S: ImageSource + ?Sized>(
        &mut self,
        source: &S,
        path: &str,
    ) -> Option<Handle<Image>> {
        let exact = normalize_path(path);
        if let Some(cached) = self.image_paths.peek(&exact) {
            match cached {
                Some(handle) => tracing::debug!(path = %exact, ?handle, "Reusing image instance"),
                None => tracing::debug!(path = %exact, "Image previously unavailable"),
            }
            return cached;
        }

        let resolved = if image_exists(source, path) {
            let images = &mut self.images;
            let key = ImageKey::from_path(path);
            let lookup = self
                .image_keys
                .get_or_insert_with(key.clone(), || decode_image(source, path).map(|image| images.push(image)));
            if lookup.hit {
                tracing::debug!(path = %key, handle = ?lookup.value, "Reusing image instance");
            }
            lookup.value
        } else {
            None
        };

        self.image_paths.get_or_insert_with(exact, || resolved);
        resolved
    }

    pub fn resolve_sampler(
        &mut self,
        filter: FilterKind,
        u: TilingFlags,
        v: TilingFlags,
    ) -> Handle<Sampler> {
        let samplers = &mut self.samplers;
        let key = SamplerKey::new(filter, u, v);
        let lookup = self
            .sampler_keys
            .get_or_insert_with(key, || samplers.push(Sampler::from_key(key)));

        if lookup.hit {
            tracing::debug!(key = key.packed(), handle = ?lookup.value, "Reusing sampler instance");
        }
        lookup.value
    }

    pub fn resolve_texture(&mut self, image: Handle<Image>, sampler: Handle<Sampler>) -> Handle<Texture> {
        let textures = &mut self.textures;
        let key = TextureKey { image, sampler };
        let lookup = self
            .texture_keys
            .get_or_insert_with(key, || textures.push(Texture { sampler, source: image }));

        if lookup.hit {
            tracing::debug!(?image, ?sampler, handle = ?lookup.value, "Reusing texture instance");
        }
        lookup.value
    }

    pub fn images(&self) -> &Arena<Image> {
        &self.images
    }

    pub fn samplers(&self) -> &Arena<Sampler> {
        &self.samplers
    }

    pub fn textures(&self) -> &Arena<Texture> {
        &self.textures
    }

    /// Number of distinct path spellings seen, usable or not
    pub fn image_path_count(&self) -> usize {
        self.image_paths.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::path::Path;

    use gltfbridge_host::{DecodedImage, ImageDecodeError};

    #[derive(Default)]
    struct CountingSource {
        exists_calls: Cell<usize>,
        decode_calls: Cell<usize>,
    }

    impl ImageSource for CountingSource {
        fn exists(&self, path: &Path) -> bool {
            self.exists_calls.set(self.exists_calls.get() + 1);
            !path.to_string_lossy().contains("missing")
        }

        fn decode(&self, _path: &Path) -> Result<DecodedImage, ImageDecodeError> {
            self.decode_calls.set(self.decode_calls.get() + 1);
            Ok(DecodedImage {
                width: 2,
                height: 2,
                mime_type: "image/jpeg".to_string(),
            })
        }
    }

    #[test]
    fn test_image_case_folding() {
        let source = CountingSource::default();
        let mut resources = TextureResources::new();

        let a = resources.resolve_image(&source, "Textures/Wood.jpg").unwrap();
        let b = resources.resolve_image(&source, "textures\\wood.JPG").unwrap();

        assert_eq!(a, b);
        assert_eq!(resources.images().len(), 1);
        assert_eq!(source.decode_calls.get(), 1);
        // First spelling wins
        assert_eq!(resources.images().get(a).unwrap().uri, "Textures/Wood.jpg");
    }

    #[test]
    fn test_missing_image_not_retried() {
        let source = CountingSource::default();
        let mut resources = TextureResources::new();

        assert!(resources.resolve_image(&source, "missing.png").is_none());
        assert!(resources.resolve_image(&source, "missing.png").is_none());

        assert_eq!(source.exists_calls.get(), 1);
        assert_eq!(source.decode_calls.get(), 0);
        assert!(resources.images().is_empty());
        assert_eq!(resources.image_path_count(), 1);
    }

    #[test]
    fn test_texture_reuse() {
        let source = CountingSource::default();
        let mut resources = TextureResources::new();

        let image = resources.resolve_image(&source, "a.png").unwrap();
        let sampler = resources.resolve_sampler(FilterKind::Mipmap, TilingFlags::WRAP, TilingFlags::WRAP);
        let other = resources.resolve_sampler(FilterKind::Off, TilingFlags::WRAP, TilingFlags::WRAP);

        let first = resources.resolve_texture(image, sampler);
        assert_eq!(resources.resolve_texture(image, sampler), first);
        assert_ne!(resources.resolve_texture(image, other), first);
        assert_eq!(resources.textures().len(), 2);

        let texture = resources.textures().get(first).unwrap();
        assert_eq!(texture.source, image);
        assert_eq!(texture.sampler, sampler);
    }
}
