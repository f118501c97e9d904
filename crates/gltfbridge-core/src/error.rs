//! Unified error handling for gltfbridge
//!
//! Resolvers turn "resource absent" into `Option::None` and never return an
//! error for it. Everything that reaches this type is either a host-state
//! failure, which aborts the export, or a configuration/input problem.

use std::path::PathBuf;
use thiserror::Error;

use crate::types::{NodeId, Plug};

/// Unified error type for all gltfbridge operations
#[derive(Error, Debug)]
pub enum Error {
    // ==================== I/O Errors ====================

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// File not found
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    // ==================== Host Errors ====================

    /// The host API itself reported a failure
    #[error("Host operation '{operation}' failed: {message}")]
    HostFailure {
        operation: String,
        message: String,
    },

    /// Node handle does not refer to a node in the scene
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    /// Plug does not exist on its node
    #[error("Plug not found: {0}")]
    PlugNotFound(Plug),

    /// Plug is locked and cannot be assigned
    #[error("Plug is locked: {0}")]
    PlugLocked(Plug),

    /// Plug is driven by an incoming connection and cannot be assigned
    #[error("Plug {plug} is driven by {source_plug}")]
    PlugDriven {
        plug: Plug,
        source_plug: Plug,
    },

    // ==================== Blend Shape Errors ====================

    /// Weight channel index outside of the snapshotted range
    #[error("Weight channel {index} out of range (channels: {count})")]
    ChannelOutOfRange {
        index: usize,
        count: usize,
    },

    /// Original weight state could not be re-established
    #[error("Failed to restore {} weight channel operation(s): {}", .failures.len(), .failures.join("; "))]
    RestoreFailed {
        failures: Vec<String>,
    },

    // ==================== Input Errors ====================

    /// Invalid data structure
    #[error("Invalid data: {message}")]
    InvalidData {
        message: String,
    },

    /// Invalid configuration
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        message: String,
    },

    // ==================== General Errors ====================

    /// Internal error (should not happen)
    #[error("Internal error: {message}")]
    Internal {
        message: String,
    },

    /// Custom error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

/// Result type using the unified Error
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create an error with additional context
    pub fn with_context(self, context: impl Into<String>) -> Self {
        Error::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Create a host failure error
    pub fn host(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Error::HostFailure {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Error::Internal {
            message: message.into(),
        }
    }

    /// Create an invalid data error
    pub fn invalid_data(message: impl Into<String>) -> Self {
        Error::InvalidData {
            message: message.into(),
        }
    }

    /// Create an invalid configuration error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Error::InvalidConfig {
            message: message.into(),
        }
    }

    /// Error with all context layers removed
    pub fn root(&self) -> &Error {
        match self {
            Error::WithContext { source, .. } => source.root(),
            other => other,
        }
    }

    /// Check if this is a "not found" type error
    pub fn is_not_found(&self) -> bool {
        matches!(
            self.root(),
            Error::FileNotFound(_) | Error::NodeNotFound(_) | Error::PlugNotFound(_)
        )
    }

    /// Check if this error means the scene graph can no longer be trusted
    pub fn is_fatal(&self) -> bool {
        matches!(
            self.root(),
            Error::HostFailure { .. }
                | Error::NodeNotFound(_)
                | Error::PlugNotFound(_)
                | Error::PlugLocked(_)
                | Error::PlugDriven { .. }
                | Error::RestoreFailed { .. }
                | Error::Internal { .. }
        )
    }
}

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.with_context(f()))
    }
}
