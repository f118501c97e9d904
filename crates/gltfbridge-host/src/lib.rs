//! gltfbridge host collaborator
//!
//! The export core never talks to a scene graph or the filesystem directly.
//! It goes through the traits in this crate:
//! - [`SceneGraph`]: node identity, shading connections, typed attribute
//!   reads and plug mutation
//! - [`ImageSource`]: file existence checks and image decoding
//!
//! Two implementations ship with the crate: [`MemoryScene`], an in-memory
//! scene graph that can be loaded from a JSON [`SceneDescription`], and
//! [`FsImageSource`], which decodes PNG/JPEG files with the `image` crate.
//!
//! # Example
//! ```
//! use gltfbridge_host::{MemoryScene, SceneGraph};
//! use gltfbridge_core::Plug;
//!
//! let mut scene = MemoryScene::new();
//! let blend = scene.add_node("blendShape1", "blendShape");
//! scene.set_array(blend, "weight", &[0.25, 1.0]);
//!
//! let weights = scene.element_plugs(&Plug::new(blend, "weight")).unwrap();
//! assert_eq!(weights.len(), 2);
//! ```

pub mod description;
pub mod image_source;
pub mod memory;
pub mod path;
pub mod scene;

pub use description::SceneDescription;
pub use image_source::{DecodedImage, FsImageSource, ImageDecodeError, ImageSource};
pub use memory::{Fault, MemoryScene, Value};
pub use scene::SceneGraph;
