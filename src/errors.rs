//! Error Types
//!
//! This module defines the error types used throughout the crate.
//!
//! # Overview
//!
//! The main error type [`PrismError`] covers all failure modes including:
//! - Invalid configuration patches
//! - Malformed pass descriptors (detected when the frame graph is built)
//! - Device-level failures (unknown handles, bad upload sizes)
//! - Shader template and auxiliary texture decoding errors
//!
//! All public APIs return [`Result<T>`] which is an alias for
//! `std::result::Result<T, PrismError>`.

use thiserror::Error;

use crate::camera::ConfigField;

/// The main error type for the post-processing frame graph.
#[derive(Error, Debug)]
pub enum PrismError {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// A configuration patch carried a value outside its valid range.
    #[error("Invalid value for '{}': {reason}", field.name())]
    InvalidConfig {
        /// The rejected field
        field: ConfigField,
        /// Why the value was rejected
        reason: String,
    },

    /// Failed to parse a configuration patch from JSON.
    #[error("Configuration parse error: {0}")]
    Json(#[from] serde_json::Error),

    // ========================================================================
    // Frame Graph Errors
    // ========================================================================
    /// A pass references a render target that is not in the pool.
    #[error("Pass '{pass}' references missing target for input '{input}'")]
    MissingTarget {
        /// Pass name
        pass: &'static str,
        /// Input (or attachment) slot name
        input: &'static str,
    },

    /// A target handle that is not (or no longer) in the pool.
    #[error("Unknown render target handle")]
    UnknownTarget,

    /// A pass samples one of its own attachments.
    #[error("Pass '{pass}' samples its own attachment through input '{input}'")]
    FeedbackLoop {
        /// Pass name
        pass: &'static str,
        /// Offending input slot
        input: &'static str,
    },

    /// Attachments of a pass are inconsistent (format or size).
    #[error("Pass '{pass}' has inconsistent attachments: {reason}")]
    AttachmentMismatch {
        /// Pass name
        pass: &'static str,
        /// Description of the mismatch
        reason: String,
    },

    // ========================================================================
    // Device Errors
    // ========================================================================
    /// A texture id unknown to the device.
    #[error("Unknown GPU texture: {0}")]
    UnknownTexture(u32),

    /// A program id unknown to the device.
    #[error("Unknown GPU program: {0}")]
    UnknownProgram(u32),

    /// Uploaded pixel data does not match the declared extent.
    #[error("Texture data size mismatch: expected {expected} bytes, got {actual}")]
    TextureDataSize {
        /// Expected byte count
        expected: usize,
        /// Provided byte count
        actual: usize,
    },

    /// Generic device failure reported by a backend.
    #[error("Device error: {0}")]
    Device(String),

    // ========================================================================
    // Shader & Asset Errors
    // ========================================================================
    /// Shader template lookup or rendering failed.
    #[error("Shader template error: {0}")]
    Shader(String),

    /// Failed to decode an auxiliary lookup texture.
    #[error("Image decode error: {0}")]
    ImageDecode(String),

    /// File I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<minijinja::Error> for PrismError {
    fn from(err: minijinja::Error) -> Self {
        Self::Shader(err.to_string())
    }
}

impl From<image::ImageError> for PrismError {
    fn from(err: image::ImageError) -> Self {
        Self::ImageDecode(err.to_string())
    }
}

/// Alias for `Result<T, PrismError>`.
pub type Result<T> = std::result::Result<T, PrismError>;
