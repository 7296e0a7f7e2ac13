//! Post-processing renderer
//!
//! [`FrameGraph`] owns everything one camera needs to turn a rasterized
//! G-buffer into the final image:
//!
//! ```text
//! ┌────────────────────────── FrameGraph ──────────────────────────┐
//! │  pool       RenderTargetPool   (all offscreen images)          │
//! │  targets    FrameTargets       (stable handles into the pool)  │
//! │  sequencer  PassSequencer      (effect passes, fixed order)    │
//! │  compositor Compositor         (display pass)                  │
//! │  programs   ProgramCache       (deduplicated GPU programs)     │
//! └────────────────────────────────────────────────────────────────┘
//! ```

pub mod graph;
pub mod passes;
pub mod pool;
pub mod shaders;
pub mod target;

use glam::Vec4;
use smallvec::{SmallVec, smallvec};

use crate::camera::CameraConfig;
use crate::device::{ClearPolicy, GpuDevice, GpuTextureId, PixelFormat, Viewport};
use crate::errors::{PrismError, Result};
use crate::resources::SampleTables;
use crate::resources::ssao::{KERNEL_TEXTURE_SIZE, NOISE_TEXTURE_SIZE};

use self::graph::{FrameParams, FrameSchedule, PassSequencer, ProgramCache, Stage, StageSet};
use self::passes::bloom::BLOOM_SCALE;
use self::passes::{CompositeFlags, Compositor};
use self::pool::{RenderTargetPool, ResizeReport, TargetHandle};
use self::shaders::ShaderLibrary;
use self::target::{ColorEncoding, RenderTargetDesc};

// ============================================================================
// Frame Targets
// ============================================================================

/// Handles of every target the frame graph reads or writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameTargets {
    pub color: TargetHandle,
    pub emissive: TargetHandle,
    pub normal: TargetHandle,
    pub depth: TargetHandle,
    pub ao: TargetHandle,
    pub ao_blur: TargetHandle,
    pub dof_blur: TargetHandle,
    pub bloom_h: TargetHandle,
    pub bloom_v: TargetHandle,
    pub smaa_color: TargetHandle,
    pub smaa_edges: TargetHandle,
    pub smaa_weights: TargetHandle,
    pub smaa_area: TargetHandle,
    pub smaa_search: TargetHandle,
    pub ssao_kernel: TargetHandle,
    pub ssao_noise: TargetHandle,
}

impl FrameTargets {
    fn create(device: &mut dyn GpuDevice, pool: &mut RenderTargetPool, rgbm: bool) -> Result<Self> {
        let (hdr_format, hdr_encoding) = if rgbm {
            (PixelFormat::Rgba8, ColorEncoding::Rgbm)
        } else {
            (PixelFormat::Rgba16Float, ColorEncoding::Linear)
        };
        let hdr = |name| {
            RenderTargetDesc::new(name, hdr_format)
                .encoding(hdr_encoding)
                .linear()
        };

        Ok(Self {
            color: pool.create(device, hdr("color"))?,
            emissive: pool.create(device, hdr("emissive"))?,
            normal: pool.create(device, RenderTargetDesc::new("normal", PixelFormat::Rgba8))?,
            depth: pool.create(device, RenderTargetDesc::new("depth", PixelFormat::Depth32))?,
            ao: pool.create(device, RenderTargetDesc::new("ao", PixelFormat::Rgba8).linear())?,
            ao_blur: pool.create(
                device,
                RenderTargetDesc::new("ao-blur", PixelFormat::Rgba8).linear(),
            )?,
            dof_blur: pool.create(device, hdr("dof-blur"))?,
            bloom_h: pool.create(device, hdr("bloom-h").scaled(BLOOM_SCALE))?,
            bloom_v: pool.create(device, hdr("bloom-v").scaled(BLOOM_SCALE))?,
            smaa_color: pool.create(device, hdr("smaa-color"))?,
            smaa_edges: pool.create(
                device,
                RenderTargetDesc::new("smaa-edges", PixelFormat::Rgba8).linear(),
            )?,
            smaa_weights: pool.create(
                device,
                RenderTargetDesc::new("smaa-weights", PixelFormat::Rgba8).linear(),
            )?,
            smaa_area: pool.create(
                device,
                RenderTargetDesc::new("smaa-area", PixelFormat::Rgba8)
                    .fixed(1, 1)
                    .linear(),
            )?,
            smaa_search: pool.create(
                device,
                RenderTargetDesc::new("smaa-search", PixelFormat::Rgba8).fixed(1, 1),
            )?,
            ssao_kernel: pool.create(
                device,
                RenderTargetDesc::new("ssao-kernel", PixelFormat::Rgba32Float)
                    .fixed(KERNEL_TEXTURE_SIZE, KERNEL_TEXTURE_SIZE)
                    .repeat(),
            )?,
            ssao_noise: pool.create(
                device,
                RenderTargetDesc::new("ssao-noise", PixelFormat::Rgba32Float)
                    .fixed(NOISE_TEXTURE_SIZE, NOISE_TEXTURE_SIZE)
                    .repeat(),
            )?,
        })
    }

    /// Handles the geometry pass renders into.
    #[must_use]
    pub fn gbuffer_handles(&self) -> [TargetHandle; 4] {
        [self.color, self.emissive, self.normal, self.depth]
    }
}

// ============================================================================
// G-Buffer
// ============================================================================

/// The images the external geometry pass renders into.
///
/// The scene is drawn in two passes sharing one `Depth32` buffer:
///
/// ```text
/// normals  normal (n * 0.5 + 0.5)      1 attachment   clears color + depth
/// color    scene color [+ emissive]    1-2 attachments clears color to the background
/// ```
///
/// With `depth_prepass` the color pass keeps the depth written by the
/// normals pass; otherwise it clears depth again. Emissive is only an
/// attachment while post-processing runs: a single-target device renders
/// the shaded color alone and the compositor skips the emissive term.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GBuffer {
    pub color: GpuTextureId,
    pub emissive: GpuTextureId,
    pub normal: GpuTextureId,
    pub depth: GpuTextureId,
    pub color_format: PixelFormat,
    pub width: u32,
    pub height: u32,
    /// Background color the color pass clears to.
    pub clear_color: Vec4,
    pub depth_prepass: bool,
    /// Whether emissive is written as a separate attachment.
    pub emissive_enabled: bool,
}

/// Attachments and clear values of one geometry draw.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryPass {
    pub label: &'static str,
    pub color: SmallVec<[GpuTextureId; 2]>,
    pub depth: GpuTextureId,
    pub clear: ClearPolicy,
}

impl GBuffer {
    /// View-space normals and depth.
    #[must_use]
    pub fn normal_pass(&self) -> GeometryPass {
        GeometryPass {
            label: "gbuffer-normals",
            color: smallvec![self.normal],
            depth: self.depth,
            clear: ClearPolicy::color_and_depth([0.0; 4], 1.0),
        }
    }

    /// Scene color, plus emissive while post-processing runs.
    #[must_use]
    pub fn color_pass(&self) -> GeometryPass {
        let mut color = smallvec![self.color];
        if self.emissive_enabled {
            color.push(self.emissive);
        }
        let background = self.clear_color.to_array();
        GeometryPass {
            label: "gbuffer-color",
            color,
            depth: self.depth,
            clear: if self.depth_prepass {
                ClearPolicy::color(background)
            } else {
                ClearPolicy::color_and_depth(background, 1.0)
            },
        }
    }

    /// Both geometry passes in the order they must run.
    #[must_use]
    pub fn passes(&self) -> [GeometryPass; 2] {
        [self.normal_pass(), self.color_pass()]
    }
}

// ============================================================================
// Frame Graph
// ============================================================================

/// Summary of one rendered frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameStats {
    /// Effect passes executed (the compositor is not counted).
    pub passes: usize,
    /// Auxiliary textures uploaded at frame start.
    pub uploads: usize,
}

pub struct FrameGraph {
    pool: RenderTargetPool,
    targets: FrameTargets,
    sequencer: PassSequencer,
    compositor: Compositor,
    programs: ProgramCache,
    tables: SampleTables,
}

impl FrameGraph {
    /// Allocates every target, uploads the sample tables and compiles all
    /// programs.
    pub fn new(
        device: &mut dyn GpuDevice,
        viewport: Viewport,
        rgbm: bool,
        seed: u64,
    ) -> Result<Self> {
        let shaders = ShaderLibrary::new()?;
        let mut pool = RenderTargetPool::new(viewport);
        let targets = FrameTargets::create(device, &mut pool, rgbm)?;

        let tables = SampleTables::generate(seed);
        pool.write_pixels(
            device,
            targets.ssao_kernel,
            KERNEL_TEXTURE_SIZE,
            KERNEL_TEXTURE_SIZE,
            tables.kernel_bytes(),
        )?;
        pool.write_pixels(
            device,
            targets.ssao_noise,
            NOISE_TEXTURE_SIZE,
            NOISE_TEXTURE_SIZE,
            tables.noise_bytes(),
        )?;
        pool.write_pixels(device, targets.smaa_area, 1, 1, &[0; 4])?;
        pool.write_pixels(device, targets.smaa_search, 1, 1, &[0; 4])?;

        let mesh = device.create_quad_mesh()?;
        let mut programs = ProgramCache::new();
        let sequencer = PassSequencer::new(
            device,
            &pool,
            &shaders,
            &mut programs,
            mesh,
            passes::all(&targets),
        )?;
        let compositor = Compositor::new(device, &pool, &shaders, &mut programs, mesh, &targets)?;

        log::info!(
            "Allocated frame graph: {} targets, {} programs, {}x{} viewport",
            pool.len(),
            programs.len(),
            viewport.width,
            viewport.height
        );

        Ok(Self {
            pool,
            targets,
            sequencer,
            compositor,
            programs,
            tables,
        })
    }

    /// Reallocates viewport-scaled targets whose extent no longer matches.
    pub fn resize(&mut self, device: &mut dyn GpuDevice, viewport: Viewport) -> Result<ResizeReport> {
        self.pool.ensure_sized(device, viewport)
    }

    /// Runs the effect passes of `stages` and the compositor.
    pub fn render(
        &self,
        device: &mut dyn GpuDevice,
        frame: &FrameParams,
        stages: StageSet,
        flags: CompositeFlags,
        viewport: Viewport,
    ) -> Result<usize> {
        let schedule = self.schedule(stages, frame.dof.iterations);
        let passes = self.sequencer.execute(device, &self.pool, frame, &schedule)?;
        self.compositor.draw(device, &self.pool, frame, flags, viewport)?;
        Ok(passes)
    }

    /// Passes of `stages`, the depth-of-field blur repeated `dof_iterations`
    /// times.
    #[must_use]
    pub fn schedule(&self, stages: StageSet, dof_iterations: u32) -> FrameSchedule {
        self.sequencer.schedule_repeated(stages, |stage| match stage {
            Stage::DepthOfField => dof_iterations,
            _ => 1,
        })
    }

    /// G-buffer images with the clear and attachment choices of `config`.
    pub fn gbuffer(&self, config: &CameraConfig) -> Result<GBuffer> {
        let color = self
            .pool
            .get(self.targets.color)
            .ok_or(PrismError::UnknownTarget)?;
        let (width, height) = color.size();
        Ok(GBuffer {
            color: color.gpu_texture(),
            emissive: self.pool.gpu_texture(self.targets.emissive)?,
            normal: self.pool.gpu_texture(self.targets.normal)?,
            depth: self.pool.gpu_texture(self.targets.depth)?,
            color_format: color.format(),
            width,
            height,
            clear_color: config.background_color,
            depth_prepass: config.depth_prepass,
            emissive_enabled: config.postprocess,
        })
    }

    #[inline]
    #[must_use]
    pub fn pool(&self) -> &RenderTargetPool {
        &self.pool
    }

    #[inline]
    pub fn pool_mut(&mut self) -> &mut RenderTargetPool {
        &mut self.pool
    }

    #[inline]
    #[must_use]
    pub fn targets(&self) -> &FrameTargets {
        &self.targets
    }

    #[inline]
    #[must_use]
    pub fn sequencer(&self) -> &PassSequencer {
        &self.sequencer
    }

    #[inline]
    #[must_use]
    pub fn compositor(&self) -> &Compositor {
        &self.compositor
    }

    #[inline]
    #[must_use]
    pub fn programs(&self) -> &ProgramCache {
        &self.programs
    }

    #[inline]
    #[must_use]
    pub fn tables(&self) -> &SampleTables {
        &self.tables
    }
}
