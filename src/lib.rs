#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]

//! Prism: a camera-driven post-processing frame graph.
//!
//! A [`Camera`] owns every offscreen target and GPU program of its view.
//! Each frame an external geometry pass fills the G-buffer, then a fixed
//! sequence of effect stages runs (ambient occlusion, depth of field,
//! bloom, SMAA) and a compositor applies fog, exposure, filmic tone
//! mapping and FXAA into the display target.
//!
//! The GPU is reached only through [`GpuDevice`]: [`WgpuDevice`] renders
//! with wgpu, [`HeadlessDevice`] records calls for tests and tooling.

pub mod assets;
pub mod camera;
pub mod cpu;
pub mod device;
pub mod errors;
pub mod renderer;
pub mod resources;

pub use assets::{AuxTextureLoader, ImageSource};
pub use camera::{
    Camera, CameraConfig, CameraDescriptor, CameraPatch, ChangeSet, ConfigChange, ConfigField,
    ConfigObserver, SubscriptionId,
};
pub use device::{GpuDevice, HeadlessDevice, PixelFormat, Viewport, WgpuDevice};
pub use errors::{PrismError, Result};
pub use renderer::graph::{Stage, StageSet};
pub use renderer::pool::{RenderTargetPool, TargetHandle};
pub use renderer::{FrameGraph, FrameStats, FrameTargets, GBuffer, GeometryPass};
pub use resources::{BloomSettings, DofSettings, FogSettings, SampleTables, SsaoSettings};
