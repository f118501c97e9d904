//! gltfbridge export core
//!
//! Building blocks for writing a host scene out as glTF 2.0:
//! - [`resources`]: one canonical material, image, sampler and texture per
//!   key for the whole export run, shared by handle
//! - [`blend_shape`]: scoped isolation of blend shape targets with
//!   guaranteed restore of the deformer's weights
//! - [`gltf`]: the glTF shapes of the cached assets
//! - [`options`]: export configuration

pub mod blend_shape;
pub mod gltf;
pub mod options;
pub mod resources;

pub use blend_shape::{isolate, BlendShapeIsolator, WeightChannelState};
pub use options::ExportOptions;
pub use resources::{
    ExportResources, FilterKind, Handle, ResourceCache, ResourceTables, SamplerKey, TilingFlags,
};
