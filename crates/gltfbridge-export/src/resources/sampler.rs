//! Sampler construction from filter and tiling settings

use super::keys::{FilterKind, SamplerKey, TilingFlags};
use crate::gltf::{MagFilter, MinFilter, Sampler, WrapMode};

pub fn wrap_mode(tiling: TilingFlags) -> WrapMode {
    if tiling.contains(TilingFlags::MIRROR) {
        WrapMode::MirroredRepeat
    } else if tiling.contains(TilingFlags::WRAP) {
        WrapMode::Repeat
    } else {
        WrapMode::ClampToEdge
    }
}

pub fn min_filter(filter: FilterKind) -> MinFilter {
    match filter {
        FilterKind::Off => MinFilter::Nearest,
        FilterKind::Box => MinFilter::LinearMipmapNearest,
        _ => MinFilter::LinearMipmapLinear,
    }
}

pub fn mag_filter(filter: FilterKind) -> MagFilter {
    match filter {
        FilterKind::Off | FilterKind::Box => MagFilter::Nearest,
        _ => MagFilter::Linear,
    }
}

impl Sampler {
    /// The sampler a key describes. Depends on nothing but the key.
    pub fn from_key(key: SamplerKey) -> Self {
        Self {
            mag_filter: mag_filter(key.filter),
            min_filter: min_filter(key.filter),
            wrap_s: wrap_mode(key.u),
            wrap_t: wrap_mode(key.v),
        }
    }
}
