//! SMAA (Subpixel Morphological Antialiasing) stage.
//!
//! ```text
//! color                        ──smaa-copy────▶ SMAA-color
//! SMAA-color                   ──smaa-edges───▶ edges
//! edges + area + search        ──smaa-weights─▶ weights
//! SMAA-color + weights         ──smaa-blend───▶ color
//! ```
//!
//! The area and search lookup textures start as 1×1 zero placeholders,
//! which produce zero blend weights (a pass-through), until the
//! asynchronous loads complete.

use crate::device::ClearPolicy;
use crate::renderer::FrameTargets;
use crate::renderer::graph::{PassDesc, Stage, UniformData};

pub const SMAA_COPY: &str = "smaa-copy";
pub const SMAA_EDGES: &str = "smaa-edges";
pub const SMAA_WEIGHTS: &str = "smaa-weights";
pub const SMAA_BLEND: &str = "smaa-blend";

/// Luma contrast above which an edge is detected.
pub const EDGE_THRESHOLD: f32 = 0.1;

/// Extent of the reference area texture.
pub const AREA_TEXTURE_SIZE: (u32, u32) = (160, 560);
/// Extent of the reference search texture.
pub const SEARCH_TEXTURE_SIZE: (u32, u32) = (64, 16);

#[must_use]
pub fn passes(targets: &FrameTargets) -> Vec<PassDesc> {
    let stage = Stage::Antialiasing;
    let cleared = ClearPolicy::color([0.0; 4]);

    vec![
        PassDesc::new(SMAA_COPY, stage, "smaa_copy")
            .writes(targets.smaa_color)
            .reads("image", targets.color)
            .target_size("size", targets.color),
        PassDesc::new(SMAA_EDGES, stage, "smaa_edges")
            .writes(targets.smaa_edges)
            .clear(cleared)
            .reads("image", targets.smaa_color)
            .target_size("size", targets.smaa_color)
            .constant("threshold", UniformData::F32(EDGE_THRESHOLD)),
        PassDesc::new(SMAA_WEIGHTS, stage, "smaa_weights")
            .writes(targets.smaa_weights)
            .clear(cleared)
            .reads("edges", targets.smaa_edges)
            .reads("area", targets.smaa_area)
            .reads("search", targets.smaa_search)
            .target_size("size", targets.smaa_edges),
        PassDesc::new(SMAA_BLEND, stage, "smaa_blend")
            .writes(targets.color)
            .reads("image", targets.smaa_color)
            .reads("weights", targets.smaa_weights)
            .target_size("size", targets.smaa_color),
    ]
}
