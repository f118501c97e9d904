//! Cache keys for the deduplicated asset kinds

use std::fmt;
use std::str::FromStr;

use bitflags::bitflags;
use gltfbridge_core::Error;
use gltfbridge_host::path::normalize_path;

use super::cache::Handle;
use crate::gltf::{Image, Sampler};

/// Texture filter kind as stored on a host file node (`filterType`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum FilterKind {
    Off = 0,
    Mipmap = 1,
    Box = 2,
    Quadratic = 3,
    Quartic = 4,
    Gaussian = 5,
}

impl FilterKind {
    /// Largest discriminant. Must fit the 8 bits above the tiling nibbles.
    pub const MAX: u8 = FilterKind::Gaussian as u8;

    pub const ALL: [FilterKind; 6] = [
        FilterKind::Off,
        FilterKind::Mipmap,
        FilterKind::Box,
        FilterKind::Quadratic,
        FilterKind::Quartic,
        FilterKind::Gaussian,
    ];

    /// Map a raw host attribute value. Unknown values fall back to `Mipmap`,
    /// the host default.
    pub fn from_raw(value: i64) -> Self {
        match value {
            0 => FilterKind::Off,
            2 => FilterKind::Box,
            3 => FilterKind::Quadratic,
            4 => FilterKind::Quartic,
            5 => FilterKind::Gaussian,
            _ => FilterKind::Mipmap,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            FilterKind::Off => "off",
            FilterKind::Mipmap => "mipmap",
            FilterKind::Box => "box",
            FilterKind::Quadratic => "quadratic",
            FilterKind::Quartic => "quartic",
            FilterKind::Gaussian => "gaussian",
        }
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FilterKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        FilterKind::ALL
            .into_iter()
            .find(|kind| kind.name() == lower || (*kind as u8).to_string() == lower)
            .ok_or_else(|| Error::invalid_data(format!("unknown filter kind '{s}'")))
    }
}

bitflags! {
    /// Per-axis texture tiling as combined from the host's wrap and mirror
    /// switches
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
    pub struct TilingFlags: u8 {
        const WRAP = 0b01;
        const MIRROR = 0b10;
    }
}

impl TilingFlags {
    /// Largest valid bit pattern. Must fit one 4-bit nibble of the key.
    pub const MAX: u8 = TilingFlags::all().bits();

    pub fn from_switches(wrap: bool, mirror: bool) -> Self {
        let mut flags = TilingFlags::empty();
        flags.set(TilingFlags::WRAP, wrap);
        flags.set(TilingFlags::MIRROR, mirror);
        flags
    }
}

impl FromStr for TilingFlags {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut flags = TilingFlags::empty();
        for part in s.split(['|', '+', ',']) {
            match part.trim().to_ascii_lowercase().as_str() {
                "" | "none" | "clamp" => {}
                "wrap" | "repeat" => flags |= TilingFlags::WRAP,
                "mirror" => flags |= TilingFlags::MIRROR,
                other => {
                    return Err(Error::invalid_data(format!("unknown tiling '{other}'")));
                }
            }
        }
        Ok(flags)
    }
}

// The packed form below relies on these bounds
const _: () = assert!(TilingFlags::MAX <= 0x0F);
const _: () = assert!(FilterKind::MAX <= 0xFF);

/// Identity of a sampler: filter kind plus tiling on each axis.
///
/// Equivalent to the packed integer `(filter << 8) | (v << 4) | u`; the
/// fields occupy disjoint bits so distinct triples never collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SamplerKey {
    pub filter: FilterKind,
    pub u: TilingFlags,
    pub v: TilingFlags,
}

impl SamplerKey {
    pub fn new(filter: FilterKind, u: TilingFlags, v: TilingFlags) -> Self {
        Self { filter, u, v }
    }

    pub fn packed(&self) -> u16 {
        (u16::from(self.filter as u8) << 8) | (u16::from(self.v.bits()) << 4) | u16::from(self.u.bits())
    }
}

/// Identity of an image: its normalized path, compared case-insensitively
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ImageKey(String);

impl ImageKey {
    pub fn from_path(path: &str) -> Self {
        Self(normalize_path(path).to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ImageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity of a texture: an already canonical image and sampler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureKey {
    pub image: Handle<Image>,
    pub sampler: Handle<Sampler>,
}
