//! Auxiliary texture loading
//!
//! Images the frame graph needs but does not generate itself, such as the
//! SMAA area and search lookup tables.

pub mod loader;

pub use loader::{AuxTextureLoader, DecodedImage, ImageSource, decode_image};
