//! Error Types
//!
//! This module defines the error types used throughout the renderer.
//!
//! # Overview
//!
//! The main error type [`LumenError`] covers the failure modes that are
//! reported upward to callers:
//! - Graphics device and shader initialization failures
//! - Resource resolution errors (textures, fonts, images)
//! - Persisted format errors (tilesets, tilemap projects, project settings)
//!
//! Problems that occur *inside* a frame never surface as errors. A missing
//! texture, a skipped light or a malformed draw degrades the output and is
//! logged instead.
//!
//! # Usage
//!
//! All fallible public APIs return [`Result<T>`] which is an alias for
//! `std::result::Result<T, LumenError>`.
//!
//! ```rust,ignore
//! use lumen::errors::{LumenError, Result};
//!
//! fn load_tileset(path: &str) -> Result<Tileset2D> {
//!     Tileset2D::load_from_file(path)
//! }
//! ```

use thiserror::Error;

/// Shader stage that failed to compile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl std::fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

/// The main error type for the Lumen renderer.
#[derive(Error, Debug)]
pub enum LumenError {
    // ========================================================================
    // Initialization Errors
    // ========================================================================
    /// A shader stage failed to compile.
    #[error("Failed to compile {stage} shader: {message}")]
    ShaderCompile {
        /// The stage that was rejected
        stage: ShaderStage,
        /// Compiler diagnostics
        message: String,
    },

    /// The compiled stages could not be linked into a program.
    #[error("Failed to link shader program: {0}")]
    ShaderLink(String),

    /// The graphics device could not be created or is gone.
    #[error("Graphics device unavailable: {0}")]
    DeviceUnavailable(String),

    /// An operation required an initialized renderer.
    #[error("Renderer is not initialized")]
    NotInitialized,

    /// A device handle did not refer to a live object.
    #[error("Invalid {kind} handle")]
    InvalidHandle {
        /// Kind of object the handle was meant to reference
        kind: &'static str,
    },

    // ========================================================================
    // Resource Errors
    // ========================================================================
    /// The requested resource does not exist.
    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    /// The resource exists but could not be used.
    #[error("Resource invalid: {0}")]
    ResourceInvalid(String),

    /// Font parsing or rasterization error.
    #[error("Font load error: {0}")]
    FontLoad(String),

    /// Image decoding error.
    #[error("Image decode error: {0}")]
    ImageDecodeError(String),

    // ========================================================================
    // Format & Parsing Errors
    // ========================================================================
    /// JSON parsing error.
    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// A document had an unexpected `type` tag.
    #[error("Invalid format: expected {expected}, found {found}")]
    InvalidFormat {
        /// Expected type tag
        expected: &'static str,
        /// Type tag found in the document
        found: String,
    },

    // ========================================================================
    // I/O Errors
    // ========================================================================
    /// File I/O error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    // ========================================================================
    // Camera Errors
    // ========================================================================
    /// Projection parameters were rejected.
    #[error("Invalid projection: {0}")]
    InvalidProjection(String),
}

// ============================================================================
// Convenient conversion implementations
// ============================================================================

impl From<image::ImageError> for LumenError {
    fn from(err: image::ImageError) -> Self {
        LumenError::ImageDecodeError(err.to_string())
    }
}

/// Alias for `Result<T, LumenError>`.
pub type Result<T> = std::result::Result<T, LumenError>;
