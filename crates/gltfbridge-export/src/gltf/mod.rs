//! glTF 2.0 asset types
//!
//! The shapes of the deduplicated resources as they appear in a glTF
//! document. Cross references are [`Handle`]s, which serialize as the index
//! of the referenced asset in its table.

use serde::Serialize;

use crate::resources::Handle;

// WebGL sampler constants used by glTF
pub const NEAREST: u32 = 9728;
pub const LINEAR: u32 = 9729;
pub const NEAREST_MIPMAP_NEAREST: u32 = 9984;
pub const LINEAR_MIPMAP_NEAREST: u32 = 9985;
pub const NEAREST_MIPMAP_LINEAR: u32 = 9986;
pub const LINEAR_MIPMAP_LINEAR: u32 = 9987;
pub const CLAMP_TO_EDGE: u32 = 33071;
pub const MIRRORED_REPEAT: u32 = 33648;
pub const REPEAT: u32 = 10497;

/// Texture coordinate wrapping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "u32")]
#[repr(u32)]
pub enum WrapMode {
    ClampToEdge = CLAMP_TO_EDGE,
    MirroredRepeat = MIRRORED_REPEAT,
    Repeat = REPEAT,
}

/// Minification filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "u32")]
#[repr(u32)]
pub enum MinFilter {
    Nearest = NEAREST,
    Linear = LINEAR,
    NearestMipmapNearest = NEAREST_MIPMAP_NEAREST,
    LinearMipmapNearest = LINEAR_MIPMAP_NEAREST,
    NearestMipmapLinear = NEAREST_MIPMAP_LINEAR,
    LinearMipmapLinear = LINEAR_MIPMAP_LINEAR,
}

/// Magnification filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "u32")]
#[repr(u32)]
pub enum MagFilter {
    Nearest = NEAREST,
    Linear = LINEAR,
}

impl From<WrapMode> for u32 {
    fn from(mode: WrapMode) -> Self {
        mode as u32
    }
}

impl From<MinFilter> for u32 {
    fn from(filter: MinFilter) -> Self {
        filter as u32
    }
}

impl From<MagFilter> for u32 {
    fn from(filter: MagFilter) -> Self {
        filter as u32
    }
}

/// glTF sampler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Sampler {
    #[serde(rename = "magFilter")]
    pub mag_filter: MagFilter,
    #[serde(rename = "minFilter")]
    pub min_filter: MinFilter,
    #[serde(rename = "wrapS")]
    pub wrap_s: WrapMode,
    #[serde(rename = "wrapT")]
    pub wrap_t: WrapMode,
}

/// glTF image
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Image {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Path as first referenced by the scene, normalized
    pub uri: String,
    #[serde(rename = "mimeType")]
    pub mime_type: String,
    #[serde(skip)]
    pub width: u32,
    #[serde(skip)]
    pub height: u32,
}

/// glTF texture: one image sampled one way
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Texture {
    pub sampler: Handle<Sampler>,
    pub source: Handle<Image>,
}

/// Reference from a material to a texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TextureInfo {
    pub index: Handle<Texture>,
    #[serde(rename = "texCoord", skip_serializing_if = "is_zero")]
    pub tex_coord: u32,
}

fn is_zero(value: &u32) -> bool {
    *value == 0
}

/// How the alpha channel of the base color is interpreted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AlphaMode {
    #[default]
    Opaque,
    Blend,
}

impl AlphaMode {
    fn is_opaque(&self) -> bool {
        *self == AlphaMode::Opaque
    }
}

/// PBR metallic roughness material
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PbrMetallicRoughness {
    #[serde(rename = "baseColorFactor")]
    pub base_color_factor: [f32; 4],
    #[serde(rename = "baseColorTexture", skip_serializing_if = "Option::is_none")]
    pub base_color_texture: Option<TextureInfo>,
    #[serde(rename = "metallicFactor")]
    pub metallic_factor: f32,
    #[serde(rename = "roughnessFactor")]
    pub roughness_factor: f32,
}

/// Where the shading description of a material came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ShadingModel {
    /// Physically based shader, mapped directly
    Pbr,
    /// Lambert/Phong/Blinn shader, converted to PBR
    Standard,
    /// Synthetic material not backed by a shader
    Debug,
}

/// glTF material
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Material {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "pbrMetallicRoughness")]
    pub pbr_metallic_roughness: PbrMetallicRoughness,
    #[serde(rename = "alphaMode", skip_serializing_if = "AlphaMode::is_opaque")]
    pub alpha_mode: AlphaMode,
    #[serde(skip)]
    pub shading_model: ShadingModel,
}

impl Material {
    pub fn base_color_texture(&self) -> Option<Handle<Texture>> {
        self.pbr_metallic_roughness
            .base_color_texture
            .map(|info| info.index)
    }
}
