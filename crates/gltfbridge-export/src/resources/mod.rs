//! Deduplicated export resources
//!
//! Every material, image, sampler and texture referenced by a scene is
//! created once per export run and shared by handle afterwards:
//!
//! | asset | key |
//! |---|---|
//! | material | stable identifier of the shader node |
//! | debug material | HSV color |
//! | image | normalized path, case-insensitive |
//! | sampler | filter kind, u tiling, v tiling |
//! | texture | image handle, sampler handle |
//!
//! [`ResourceCache`] owns the assets. [`ExportResources`] is the resolver
//! entry point an exporter drives; it pairs the cache with the export options and
//! the image source.

pub mod cache;
mod image_loader;
pub mod keys;
pub mod material;
pub mod sampler;
pub mod texturing;

use gltfbridge_core::{HsvColor, NodeId, NodeUuid, Result, ResultExt};
use gltfbridge_host::{ImageSource, SceneGraph};
use serde::Serialize;

pub use cache::{Arena, Handle, KeyedCache, Lookup};
pub use keys::{FilterKind, ImageKey, SamplerKey, TextureKey, TilingFlags};
pub use material::{debug_hue, MaterialBuilder, DEFAULT_MATERIAL_NAME};
pub use texturing::TextureResources;

use crate::gltf::{Image, Material, Sampler, Texture};
use crate::options::ExportOptions;

/// Input of a shading group that carries its surface shader
pub const SURFACE_SHADER: &str = "surfaceShader";

/// Owner of every canonical asset of one export run.
///
/// Nothing is evicted; assets live exactly as long as the cache.
#[derive(Debug, Default)]
pub struct ResourceCache {
    materials: Arena<Material>,
    material_keys: KeyedCache<NodeUuid, Option<Handle<Material>>>,
    debug_material_keys: KeyedCache<HsvColor, Handle<Material>>,
    default_material: Option<Handle<Material>>,
    texturing: TextureResources,
}

impl ResourceCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn material(&self, handle: Handle<Material>) -> Option<&Material> {
        self.materials.get(handle)
    }

    pub fn image(&self, handle: Handle<Image>) -> Option<&Image> {
        self.texturing.images.get(handle)
    }

    pub fn sampler(&self, handle: Handle<Sampler>) -> Option<&Sampler> {
        self.texturing.samplers.get(handle)
    }

    pub fn texture(&self, handle: Handle<Texture>) -> Option<&Texture> {
        self.texturing.textures.get(handle)
    }

    pub fn materials(&self) -> &Arena<Material> {
        &self.materials
    }

    pub fn texturing(&self) -> &TextureResources {
        &self.texturing
    }

    /// Number of shader nodes seen, including those that produced no material
    pub fn material_key_count(&self) -> usize {
        self.material_keys.len()
    }

    /// Canonical assets in creation order; handles are indices into these
    pub fn tables(&self) -> ResourceTables<'_> {
        ResourceTables {
            materials: self.materials.as_slice(),
            images: self.texturing.images.as_slice(),
            samplers: self.texturing.samplers.as_slice(),
            textures: self.texturing.textures.as_slice(),
        }
    }
}

/// Serializable view of the resource tables
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ResourceTables<'a> {
    pub materials: &'a [Material],
    pub images: &'a [Image],
    pub samplers: &'a [Sampler],
    pub textures: &'a [Texture],
}

/// Resolver entry points for one export run
pub struct ExportResources<S> {
    options: ExportOptions,
    images: S,
    cache: ResourceCache,
}

impl<S: ImageSource> ExportResources<S> {
    pub fn new(options: ExportOptions, images: S) -> Result<Self> {
        options.validate()?;
        Ok(Self {
            options,
            images,
            cache: ResourceCache::new(),
        })
    }

    pub fn options(&self) -> &ExportOptions {
        &self.options
    }

    pub fn cache(&self) -> &ResourceCache {
        &self.cache
    }

    pub fn into_cache(self) -> ResourceCache {
        self.cache
    }

    /// Material for a shading group.
    ///
    /// `Ok(None)` when there is no group, no surface shader connected, or the
    /// shader yields no material. Host failures, including a failed
    /// identifier lookup, are errors.
    pub fn resolve_material<G: SceneGraph + ?Sized>(
        &mut self,
        scene: &G,
        shading_group: Option<NodeId>,
    ) -> Result<Option<Handle<Material>>> {
        let Some(group) = shading_group else {
            return Ok(None);
        };
        let Some(shader) = scene.source_node(group, SURFACE_SHADER)? else {
            tracing::debug!(%group, "Shading group has no surface shader");
            return Ok(None);
        };
        let uuid = scene
            .node_uuid(shader)
            .with_context(|| format!("identifying shader {shader}"))?;

        let cache = &mut self.cache;
        let materials = &mut cache.materials;
        let texturing = &mut cache.texturing;
        let options = &self.options;
        let images = &self.images;

        let lookup = cache.material_keys.get_or_try_insert_with(uuid.clone(), || {
            let material = MaterialBuilder::new(scene, images, options, texturing).build(shader)?;
            Ok::<_, gltfbridge_core::Error>(material.map(|material| materials.push(material)))
        })?;

        if lookup.hit {
            tracing::debug!(%uuid, handle = ?lookup.value, "Reusing material instance");
        }
        Ok(lookup.value)
    }

    /// Image for a path, `None` if missing or undecodable
    pub fn resolve_image(&mut self, path: &str) -> Option<Handle<Image>> {
        self.cache.texturing.resolve_image(&self.images, path)
    }

    pub fn resolve_sampler(&mut self, filter: FilterKind, u: TilingFlags, v: TilingFlags) -> Handle<Sampler> {
        self.cache.texturing.resolve_sampler(filter, u, v)
    }

    pub fn resolve_texture(&mut self, image: Handle<Image>, sampler: Handle<Sampler>) -> Handle<Texture> {
        self.cache.texturing.resolve_texture(image, sampler)
    }

    pub fn resolve_debug_material(&mut self, color: HsvColor) -> Handle<Material> {
        let materials = &mut self.cache.materials;
        let lookup = self
            .cache
            .debug_material_keys
            .get_or_insert_with(color, || materials.push(Material::debug(color)));

        if lookup.hit {
            tracing::debug!(?color, handle = ?lookup.value, "Reusing debug material instance");
        }
        lookup.value
    }

    /// The neutral fallback material, created on first use
    pub fn resolve_default_material(&mut self) -> Handle<Material> {
        let materials = &mut self.cache.materials;
        *self
            .cache
            .default_material
            .get_or_insert_with(|| materials.push(Material::fallback()))
    }

    /// Material to assign to a primitive, applying the material options.
    ///
    /// With `colorize_materials` each distinct material is replaced by its
    /// own debug color. Without a material, `default_material` selects the
    /// fallback.
    pub fn material_for_primitive<G: SceneGraph + ?Sized>(
        &mut self,
        scene: &G,
        shading_group: Option<NodeId>,
    ) -> Result<Option<Handle<Material>>> {
        let material = self.resolve_material(scene, shading_group)?;

        Ok(match material {
            Some(handle) if self.options.colorize_materials => {
                Some(self.resolve_debug_material(debug_hue(handle.index())))
            }
            Some(handle) => Some(handle),
            None if self.options.default_material => Some(self.resolve_default_material()),
            None => None,
        })
    }
}
