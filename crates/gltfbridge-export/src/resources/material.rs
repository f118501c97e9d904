//! Material construction from host shader nodes
//!
//! Physically based shaders map straight onto glTF's metallic/roughness
//! model. Lambert, Phong and Blinn shaders are approximated. A `file` node
//! connected to the color input becomes the base color texture and goes
//! through the same image, sampler and texture caches as everything else.

use gltfbridge_core::{HsvColor, NodeId, Plug, Result, ResultExt};
use gltfbridge_host::{ImageSource, SceneGraph};

use super::cache::Handle;
use super::keys::{FilterKind, TilingFlags};
use super::texturing::TextureResources;
use crate::gltf::{AlphaMode, Material, PbrMetallicRoughness, ShadingModel, Texture, TextureInfo};
use crate::options::ExportOptions;

/// Name of the fallback material
pub const DEFAULT_MATERIAL_NAME: &str = "DefaultMaterial";

const DEFAULT_COLOR: [f64; 3] = [0.5, 0.5, 0.5];
const DEFAULT_ROUGHNESS: f64 = 0.5;

/// Attribute names of one family of physically based shaders
struct PbrAttributes {
    color: &'static str,
    weight: Option<&'static str>,
    metallic: &'static str,
    roughness: &'static str,
    opacity: Option<&'static str>,
}

const STANDARD_SURFACE: PbrAttributes = PbrAttributes {
    color: "baseColor",
    weight: Some("base"),
    metallic: "metalness",
    roughness: "specularRoughness",
    opacity: Some("opacity"),
};

const STINGRAY_PBS: PbrAttributes = PbrAttributes {
    color: "base_color",
    weight: None,
    metallic: "metallic",
    roughness: "roughness",
    opacity: None,
};

/// Shading model of a host shader type, `None` if unsupported
pub fn shading_model(node_type: &str) -> Option<ShadingModel> {
    match node_type {
        "standardSurface" | "aiStandardSurface" | "StingrayPBS" => Some(ShadingModel::Pbr),
        "lambert" | "phong" | "phongE" | "blinn" => Some(ShadingModel::Standard),
        _ => None,
    }
}

/// Hue for the `index`-th colorized material.
///
/// Successive indices step around the color wheel by the golden ratio so
/// neighbours stay far apart.
pub fn debug_hue(index: usize) -> HsvColor {
    const GOLDEN_RATIO_CONJUGATE: f64 = 0.618_033_988_749_895;
    let hue = (index as f64 * GOLDEN_RATIO_CONJUGATE).fract();
    HsvColor::new(hue as f32, 0.65, 0.9)
}

impl Material {
    /// Synthetic material showing a flat color
    pub fn debug(color: HsvColor) -> Self {
        let [r, g, b] = color.to_rgb();
        Self {
            name: Some(format!("Debug_{:.3}_{:.3}_{:.3}", color.h, color.s, color.v)),
            pbr_metallic_roughness: PbrMetallicRoughness {
                base_color_factor: [r, g, b, 1.0],
                base_color_texture: None,
                metallic_factor: 0.0,
                roughness_factor: 1.0,
            },
            alpha_mode: AlphaMode::Opaque,
            shading_model: ShadingModel::Debug,
        }
    }

    /// Neutral material for primitives without a shading group
    pub fn fallback() -> Self {
        Self {
            name: Some(DEFAULT_MATERIAL_NAME.to_string()),
            pbr_metallic_roughness: PbrMetallicRoughness {
                base_color_factor: [1.0, 1.0, 1.0, 1.0],
                base_color_texture: None,
                metallic_factor: 0.0,
                roughness_factor: 0.5,
            },
            alpha_mode: AlphaMode::Opaque,
            shading_model: ShadingModel::Debug,
        }
    }
}

/// Builds one material from a shader node
pub struct MaterialBuilder<'a, G: ?Sized, S: ?Sized> {
    scene: &'a G,
    images: &'a S,
    options: &'a ExportOptions,
    texturing: &'a mut TextureResources,
}

impl<'a, G, S> MaterialBuilder<'a, G, S>
where
    G: SceneGraph + ?Sized,
    S: ImageSource + ?Sized,
{
    pub fn new(
        scene: &'a G,
        images: &'a S,
        options: &'a ExportOptions,
        texturing: &'a mut TextureResources,
    ) -> Self {
        Self {
            scene,
            images,
            options,
            texturing,
        }
    }

    /// Build the material for `shader`.
    ///
    /// `Ok(None)` means the shader produces no material (unsupported type or
    /// skipped by configuration). Errors are host failures.
    pub fn build(mut self, shader: NodeId) -> Result<Option<Material>> {
        let node_type = self.scene.node_type(shader)?;
        let name = self.scene.node_name(shader)?;

        let Some(model) = shading_model(&node_type) else {
            tracing::warn!(shader = %name, node_type = %node_type, "Unsupported shader type; no material exported");
            return Ok(None);
        };

        if model == ShadingModel::Standard && self.options.skip_standard_materials {
            tracing::info!(shader = %name, node_type = %node_type, "Skipping standard material");
            return Ok(None);
        }

        let surface = match model {
            ShadingModel::Pbr => {
                let attributes = if node_type == "StingrayPBS" {
                    &STINGRAY_PBS
                } else {
                    &STANDARD_SURFACE
                };
                self.read_pbr(shader, attributes)
            }
            _ => self.read_standard(shader, &node_type),
        }
        .with_context(|| format!("reading shader {name}"))?;

        let texture = self
            .base_color_texture(shader, surface.color_input)
            .with_context(|| format!("reading color texture of {name}"))?;

        let opacity = clamp_unit(surface.opacity * self.options.opacity_factor);
        // A texture replaces the color; the weight still scales it
        let rgb = match texture {
            Some(_) => [surface.weight; 3],
            None => surface.color.map(|c| c * surface.weight),
        };

        Ok(Some(Material {
            name: Some(name),
            pbr_metallic_roughness: PbrMetallicRoughness {
                base_color_factor: [
                    clamp_unit(rgb[0]) as f32,
                    clamp_unit(rgb[1]) as f32,
                    clamp_unit(rgb[2]) as f32,
                    opacity as f32,
                ],
                base_color_texture: texture.map(|index| TextureInfo { index, tex_coord: 0 }),
                metallic_factor: clamp_unit(surface.metallic) as f32,
                roughness_factor: clamp_unit(surface.roughness) as f32,
            },
            alpha_mode: if opacity < 1.0 {
                AlphaMode::Blend
            } else {
                AlphaMode::Opaque
            },
            shading_model: model,
        }))
    }

    fn read_pbr(&self, shader: NodeId, attributes: &PbrAttributes) -> Result<Surface> {
        let weight = match attributes.weight {
            Some(attribute) => self.number_or(shader, attribute, 1.0)?,
            None => 1.0,
        };
        let opacity = match attributes.opacity {
            Some(attribute) => mean(self.vector_or(shader, attribute, [1.0; 3])?),
            None => 1.0,
        };

        Ok(Surface {
            color_input: attributes.color,
            color: self.vector_or(shader, attributes.color, DEFAULT_COLOR)?,
            weight,
            metallic: self.number_or(shader, attributes.metallic, 0.0)?,
            roughness: self.number_or(shader, attributes.roughness, DEFAULT_ROUGHNESS)?,
            opacity,
        })
    }

    fn read_standard(&self, shader: NodeId, node_type: &str) -> Result<Surface> {
        let roughness = match node_type {
            "phong" => {
                let power = self.number_or(shader, "cosinePower", 20.0)?.max(0.0);
                (2.0 / (power + 2.0)).sqrt()
            }
            "blinn" => self.number_or(shader, "eccentricity", 0.3)?,
            "phongE" => self.number_or(shader, "roughness", 0.5)?,
            _ => 1.0,
        };

        Ok(Surface {
            color_input: "color",
            color: self.vector_or(shader, "color", DEFAULT_COLOR)?,
            weight: 1.0,
            metallic: 0.0,
            roughness,
            opacity: 1.0 - mean(self.vector_or(shader, "transparency", [0.0; 3])?),
        })
    }

    /// Texture of the `file` node driving `input`, if any
    fn base_color_texture(&mut self, shader: NodeId, input: &str) -> Result<Option<Handle<Texture>>> {
        let Some(file) = self.scene.source_node(shader, input)? else {
            return Ok(None);
        };
        if self.scene.node_type(file)? != "file" {
            return Ok(None);
        }

        let path = match self.scene.text(&Plug::new(file, "fileTextureName"))? {
            Some(path) if !path.trim().is_empty() => path,
            _ => {
                tracing::warn!(file = %self.scene.node_name(file)?, "File texture node has no path");
                return Ok(None);
            }
        };

        let filter = FilterKind::from_raw(self.number_or(file, "filterType", 1.0)? as i64);
        let (u, v) = match self.scene.source_node(file, "uvCoord")? {
            Some(placement) => (
                TilingFlags::from_switches(
                    self.flag_or(placement, "wrapU", true)?,
                    self.flag_or(placement, "mirrorU", false)?,
                ),
                TilingFlags::from_switches(
                    self.flag_or(placement, "wrapV", true)?,
                    self.flag_or(placement, "mirrorV", false)?,
                ),
            ),
            None => (TilingFlags::WRAP, TilingFlags::WRAP),
        };

        // Host reads are done; nothing below can fail and leave assets unreferenced
        let Some(image) = self.texturing.resolve_image(self.images, &path) else {
            return Ok(None);
        };
        let sampler = self.texturing.resolve_sampler(filter, u, v);
        Ok(Some(self.texturing.resolve_texture(image, sampler)))
    }

    fn number_or(&self, node: NodeId, attribute: &str, default: f64) -> Result<f64> {
        Ok(self.scene.number(&Plug::new(node, attribute))?.unwrap_or(default))
    }

    fn vector_or(&self, node: NodeId, attribute: &str, default: [f64; 3]) -> Result<[f64; 3]> {
        Ok(self.scene.vector(&Plug::new(node, attribute))?.unwrap_or(default))
    }

    fn flag_or(&self, node: NodeId, attribute: &str, default: bool) -> Result<bool> {
        Ok(self
            .scene
            .number(&Plug::new(node, attribute))?
            .map_or(default, |value| value != 0.0))
    }
}

/// Shader inputs after reading
struct Surface {
    color_input: &'static str,
    color: [f64; 3],
    weight: f64,
    metallic: f64,
    roughness: f64,
    opacity: f64,
}

fn mean(values: [f64; 3]) -> f64 {
    (values[0] + values[1] + values[2]) / 3.0
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
