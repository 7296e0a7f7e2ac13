//! Frame graph
//!
//! Provides:
//! - Stage / StageSet: effect stages and the per-frame enable mask
//! - PassDesc: data description of one full-screen pass
//! - FrameParams: camera and effect values resolved into pass uniforms
//! - UniformWriter: WGSL uniform block packing
//! - PassSequencer: validation, program compilation and ordered execution

pub mod frame;
pub mod pass;
pub mod sequencer;
pub mod stage;
pub mod uniforms;

pub use frame::{FrameParam, FrameParams, size_uniform};
pub use pass::{PassDesc, TextureInput, UniformEntry, UniformValue};
pub use sequencer::{
    FrameSchedule, PassSequencer, ProgramCache, ProgramKey, pack_uniforms, uniform_block_size,
};
pub use stage::{Stage, StageSet};
pub use uniforms::{UniformData, UniformKind, UniformWriter, block_size};
