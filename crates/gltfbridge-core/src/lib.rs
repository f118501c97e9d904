//! gltfbridge Core Library
//!
//! This crate provides the identifiers, error handling and logging setup
//! shared by the host collaborator and the export core.

pub mod error;
pub mod logging;
pub mod types;

pub use error::{Error, Result, ResultExt};
pub use types::*;

/// Re-export commonly used items
pub mod prelude {
    pub use crate::error::{Error, Result, ResultExt};
    pub use crate::types::*;
}
