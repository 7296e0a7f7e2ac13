//! Camera
//!
//! The camera owns the post-processing pipeline of one view and drives it
//! every frame:
//!
//! ```text
//! configure(patch) ──▶ validate ─▶ projection ─▶ resize targets ─▶ notify
//!
//! render(geometry)
//!   1. upload completed auxiliary textures
//!   2. geometry callback renders the G-buffer passes (normals, color)
//!   3. enabled effect stages, fixed order
//!   4. compositor ─▶ display
//!   5. end frame
//! ```

pub mod config;
pub mod observer;

pub use config::{CameraConfig, CameraPatch, ChangedFields, ConfigField};
pub use observer::{ConfigChange, ConfigObserver, SubscriptionId};

use std::time::Duration;

use glam::Mat4;
use slotmap::SlotMap;
use smallvec::SmallVec;

use crate::assets::{AuxTextureLoader, ImageSource};
use crate::device::{DeviceLimits, GpuDevice, Viewport};
use crate::errors::Result;
use crate::renderer::graph::{FrameParams, FrameSchedule, StageSet};
use crate::renderer::passes::CompositeFlags;
use crate::renderer::pool::RenderTargetPool;
use crate::renderer::{FrameGraph, FrameStats, FrameTargets, GBuffer};
use crate::resources::ssao::DEFAULT_SAMPLE_SEED;

/// Changes reported by one [`Camera::configure`] call.
pub type ChangeSet = SmallVec<[ConfigChange; 8]>;

/// Construction parameters that cannot change afterwards.
#[derive(Debug, Clone)]
pub struct CameraDescriptor {
    pub viewport: Viewport,
    /// Store HDR targets as RGBM in 8-bit images instead of half floats.
    pub rgbm: bool,
    /// Seed of the SSAO kernel and noise.
    pub seed: u64,
    /// Applied on top of the defaults.
    pub patch: CameraPatch,
}

impl CameraDescriptor {
    #[must_use]
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            rgbm: false,
            seed: DEFAULT_SAMPLE_SEED,
            patch: CameraPatch::default(),
        }
    }

    #[must_use]
    pub fn rgbm(mut self, rgbm: bool) -> Self {
        self.rgbm = rgbm;
        self
    }

    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    #[must_use]
    pub fn patch(mut self, patch: CameraPatch) -> Self {
        self.patch = patch;
        self
    }
}

pub struct Camera {
    config: CameraConfig,
    projection: Mat4,
    view: Mat4,
    limits: DeviceLimits,
    graph: FrameGraph,
    loader: AuxTextureLoader,
    observers: SlotMap<SubscriptionId, Box<dyn ConfigObserver>>,
}

impl Camera {
    pub fn new(device: &mut dyn GpuDevice, desc: CameraDescriptor) -> Result<Self> {
        let limits = device.limits();
        let (mut config, _) = CameraConfig::with_viewport(desc.viewport).apply(&desc.patch)?;
        enforce_capabilities(&mut config, limits);

        let graph = FrameGraph::new(device, config.viewport, desc.rgbm, desc.seed)?;

        Ok(Self {
            projection: projection(&config),
            view: Mat4::IDENTITY,
            config,
            limits,
            graph,
            loader: AuxTextureLoader::new(),
            observers: SlotMap::with_key(),
        })
    }

    // ========================================================================
    // Configuration
    // ========================================================================

    /// Applies `patch`. On error nothing changes and no observer is called.
    pub fn configure(&mut self, device: &mut dyn GpuDevice, patch: &CameraPatch) -> Result<ChangeSet> {
        let (mut next, _) = self.config.apply(patch)?;
        enforce_capabilities(&mut next, self.limits);
        let changed = self.config.diff(&next);

        if changed.contains(&ConfigField::Viewport) {
            let report = self.graph.resize(device, next.viewport)?;
            log::debug!(
                "Viewport {}x{}: {} targets reallocated",
                next.viewport.width,
                next.viewport.height,
                report.len()
            );
        }
        if CameraConfig::affects_projection(&changed) {
            self.projection = projection(&next);
        }
        self.config = next;

        let changes: ChangeSet = changed.iter().map(|&field| ConfigChange { field }).collect();
        for change in &changes {
            for observer in self.observers.values_mut() {
                observer.on_change(change, &self.config);
            }
        }
        Ok(changes)
    }

    /// Parses `json` as a [`CameraPatch`] and applies it.
    pub fn configure_json(&mut self, device: &mut dyn GpuDevice, json: &str) -> Result<ChangeSet> {
        let patch = CameraPatch::from_json(json)?;
        self.configure(device, &patch)
    }

    pub fn subscribe(&mut self, observer: impl ConfigObserver + 'static) -> SubscriptionId {
        self.observers.insert(Box::new(observer))
    }

    /// Returns false if `id` was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.observers.remove(id).is_some()
    }

    /// Sets the view matrix from the camera's world transform.
    pub fn update(&mut self, world: &Mat4) {
        self.view = world.inverse();
    }

    // ========================================================================
    // Frame
    // ========================================================================

    /// Starts decoding the SMAA area and search textures in the background.
    /// Until they arrive the antialiasing stage passes color through.
    pub fn load_smaa_textures(&mut self, area: impl Into<ImageSource>, search: impl Into<ImageSource>) {
        let targets = *self.graph.targets();
        self.loader.load("smaa-area", targets.smaa_area, area.into());
        self.loader.load("smaa-search", targets.smaa_search, search.into());
    }

    /// Waits up to `timeout` for pending texture loads and uploads them.
    pub fn finish_texture_loads(&mut self, device: &mut dyn GpuDevice, timeout: Duration) -> usize {
        self.loader.drain_blocking(device, self.graph.pool_mut(), timeout)
    }

    /// Renders one frame.
    ///
    /// `geometry` draws the scene into the [`GBuffer`]; everything after it
    /// is driven by the configuration.
    pub fn render<D, F>(&mut self, device: &mut D, geometry: F) -> Result<FrameStats>
    where
        D: GpuDevice,
        F: FnOnce(&mut D, &GBuffer) -> Result<()>,
    {
        let uploads = self.loader.drain(device, self.graph.pool_mut());

        let gbuffer = self.graph.gbuffer(&self.config)?;
        geometry(device, &gbuffer)?;

        let frame = FrameParams::new(&self.config, self.projection, self.view);
        let passes = self.graph.render(
            device,
            &frame,
            self.stages(),
            self.composite_flags(),
            self.config.viewport,
        )?;
        device.end_frame()?;

        Ok(FrameStats { passes, uploads })
    }

    /// Effect stages the next frame runs.
    #[must_use]
    pub fn stages(&self) -> StageSet {
        let c = &self.config;
        if !c.postprocess {
            return StageSet::empty();
        }
        let mut stages = StageSet::empty();
        stages.set(StageSet::AMBIENT_OCCLUSION, c.ssao.enabled);
        stages.set(StageSet::DEPTH_OF_FIELD, c.dof.enabled);
        stages.set(StageSet::BLOOM, c.bloom.enabled);
        stages.set(StageSet::ANTIALIASING, c.smaa);
        stages
    }

    #[must_use]
    pub fn composite_flags(&self) -> CompositeFlags {
        let c = &self.config;
        CompositeFlags {
            emissive: c.postprocess,
            ambient_occlusion: c.postprocess && c.ssao.enabled,
            bloom: c.postprocess && c.bloom.enabled,
            fog: c.postprocess && c.fog.enabled,
            fxaa: c.postprocess && c.fxaa,
        }
    }

    /// Passes the next frame runs, in order.
    #[must_use]
    pub fn schedule(&self) -> FrameSchedule {
        self.graph.schedule(self.stages(), self.config.dof.iterations)
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    #[inline]
    #[must_use]
    pub fn config(&self) -> &CameraConfig {
        &self.config
    }

    #[inline]
    #[must_use]
    pub fn projection_matrix(&self) -> Mat4 {
        self.projection
    }

    #[inline]
    #[must_use]
    pub fn view_matrix(&self) -> Mat4 {
        self.view
    }

    pub fn gbuffer(&self) -> Result<GBuffer> {
        self.graph.gbuffer(&self.config)
    }

    #[inline]
    #[must_use]
    pub fn pool(&self) -> &RenderTargetPool {
        self.graph.pool()
    }

    #[inline]
    #[must_use]
    pub fn targets(&self) -> &FrameTargets {
        self.graph.targets()
    }

    #[inline]
    #[must_use]
    pub fn frame_graph(&self) -> &FrameGraph {
        &self.graph
    }

    /// Texture loads started but not yet uploaded.
    #[inline]
    #[must_use]
    pub fn pending_loads(&self) -> usize {
        self.loader.in_flight()
    }
}

fn projection(config: &CameraConfig) -> Mat4 {
    Mat4::perspective_rh(config.fov, config.aspect, config.near, config.far)
}

/// Post-processing needs at least two simultaneous color attachments in the
/// geometry color pass (color + emissive). Normals have a pass of their own.
fn enforce_capabilities(config: &mut CameraConfig, limits: DeviceLimits) {
    if config.postprocess && limits.max_color_attachments < 2 {
        log::warn!(
            "Disabling postprocess: device supports {} color attachments",
            limits.max_color_attachments
        );
        config.postprocess = false;
    }
}
