//! Pass Sequencer
//!
//! Owns the complete, ordered list of passes of the frame graph. The list
//! is built and validated once; each frame only decides which stages take
//! part:
//!
//! ```text
//! PassSequencer::new(passes)   validate + compile programs   (init)
//!        │
//!        ▼
//! schedule(stages)  → FrameSchedule   enabled passes, fixed order
//!        │
//!        ▼
//! execute(schedule)              one draw per pass            (frame)
//! ```
//!
//! A malformed descriptor (missing target, feedback loop, inconsistent
//! attachments) fails construction instead of failing a frame.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use super::frame::{FrameParams, size_uniform};
use super::pass::{PassDesc, UniformEntry, UniformValue};
use super::stage::{Stage, StageSet};
use super::uniforms::{UniformWriter, block_size};
use crate::device::{
    DepthState, DrawCall, DrawTarget, GpuDevice, GpuTextureId, MeshId, PixelFormat, ProgramDesc,
    ProgramId, SampleKind, Viewport,
};
use crate::errors::{PrismError, Result};
use crate::renderer::pool::RenderTargetPool;
use crate::renderer::shaders::{ShaderDefines, ShaderLibrary};
use crate::renderer::target::ColorEncoding;

// ============================================================================
// Program Cache
// ============================================================================

/// Everything a program depends on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProgramKey {
    pub shader: &'static str,
    pub defines: ShaderDefines,
    pub color: SmallVec<[PixelFormat; 2]>,
    pub depth: Option<PixelFormat>,
    pub inputs: SmallVec<[SampleKind; 4]>,
    pub uniform_size: u64,
}

/// Deduplicates programs shared by several passes (e.g. both blur axes).
#[derive(Default)]
pub struct ProgramCache {
    programs: FxHashMap<ProgramKey, ProgramId>,
}

impl ProgramCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_create(
        &mut self,
        device: &mut dyn GpuDevice,
        shaders: &ShaderLibrary,
        key: ProgramKey,
    ) -> Result<ProgramId> {
        if let Some(&id) = self.programs.get(&key) {
            return Ok(id);
        }
        let source = shaders.render(key.shader, &key.defines)?;
        let id = device.create_program(&ProgramDesc {
            label: key.shader,
            source: &source,
            color_formats: &key.color,
            depth: key.depth.map(|format| DepthState {
                format,
                test: true,
                write: true,
            }),
            inputs: &key.inputs,
            uniform_size: key.uniform_size,
        })?;
        log::debug!("Compiled program '{}' {:?}", key.shader, key.defines);
        self.programs.insert(key, id);
        Ok(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.programs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }
}

// ============================================================================
// Schedule
// ============================================================================

/// Passes one frame runs, in execution order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameSchedule {
    entries: SmallVec<[(usize, &'static str); 16]>,
}

impl FrameSchedule {
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|&(_, name)| name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|&(_, n)| n == name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ============================================================================
// PassSequencer
// ============================================================================

struct CompiledPass {
    desc: PassDesc,
    program: ProgramId,
}

pub struct PassSequencer {
    passes: Vec<CompiledPass>,
    mesh: MeshId,
}

impl PassSequencer {
    /// Validates `passes`, orders them by stage and compiles their programs.
    ///
    /// Passes of the same stage keep their relative order.
    pub fn new(
        device: &mut dyn GpuDevice,
        pool: &RenderTargetPool,
        shaders: &ShaderLibrary,
        programs: &mut ProgramCache,
        mesh: MeshId,
        mut passes: Vec<PassDesc>,
    ) -> Result<Self> {
        passes.sort_by_key(|p| p.stage);
        let max_color = device.limits().max_color_attachments;

        let mut compiled = Vec::with_capacity(passes.len());
        for desc in passes {
            validate(&desc, pool, max_color)?;
            let key = program_key(&desc, pool)?;
            let program = programs.get_or_create(device, shaders, key)?;
            compiled.push(CompiledPass { desc, program });
        }
        log::info!("Frame graph built with {} passes", compiled.len());

        Ok(Self {
            passes: compiled,
            mesh,
        })
    }

    /// All passes in execution order.
    pub fn passes(&self) -> impl Iterator<Item = &PassDesc> {
        self.passes.iter().map(|p| &p.desc)
    }

    #[must_use]
    pub fn pass(&self, name: &str) -> Option<&PassDesc> {
        self.passes().find(|p| p.name == name)
    }

    #[must_use]
    pub fn schedule(&self, stages: StageSet) -> FrameSchedule {
        self.schedule_repeated(stages, |_| 1)
    }

    /// Like [`schedule`](Self::schedule), but runs the passes of each stage
    /// `repeats(stage)` times back to back (at least once).
    ///
    /// A stage repeats as a unit: `h, v, h, v`, never `h, h, v, v`.
    #[must_use]
    pub fn schedule_repeated(
        &self,
        stages: StageSet,
        repeats: impl Fn(Stage) -> u32,
    ) -> FrameSchedule {
        let mut entries = SmallVec::new();
        for stage in Stage::ORDER {
            if !stages.has(stage) {
                continue;
            }
            let group: SmallVec<[(usize, &'static str); 4]> = self
                .passes
                .iter()
                .enumerate()
                .filter(|(_, p)| p.desc.stage == stage)
                .map(|(i, p)| (i, p.desc.name))
                .collect();
            for _ in 0..repeats(stage).max(1) {
                entries.extend_from_slice(&group);
            }
        }
        FrameSchedule { entries }
    }

    /// Records one draw per scheduled pass. Returns the number of draws.
    pub fn execute(
        &self,
        device: &mut dyn GpuDevice,
        pool: &RenderTargetPool,
        frame: &FrameParams,
        schedule: &FrameSchedule,
    ) -> Result<usize> {
        for &(index, _) in &schedule.entries {
            let Some(pass) = self.passes.get(index) else {
                continue;
            };
            self.run(device, pool, frame, pass)?;
        }
        Ok(schedule.len())
    }

    fn run(
        &self,
        device: &mut dyn GpuDevice,
        pool: &RenderTargetPool,
        frame: &FrameParams,
        pass: &CompiledPass,
    ) -> Result<()> {
        let desc = &pass.desc;

        let color = desc
            .color
            .iter()
            .map(|&h| pool.gpu_texture(h))
            .collect::<Result<SmallVec<[GpuTextureId; 2]>>>()?;
        let depth = desc.depth.map(|h| pool.gpu_texture(h)).transpose()?;
        let textures = desc
            .inputs
            .iter()
            .map(|input| pool.gpu_texture(input.target))
            .collect::<Result<SmallVec<[GpuTextureId; 4]>>>()?;
        let uniforms = pack_uniforms(&desc.uniforms, frame, pool)?;

        let viewport = match desc.viewport {
            Some(viewport) => viewport,
            None => {
                let destination = pool.get(desc.color[0]).ok_or(PrismError::UnknownTarget)?;
                let (width, height) = destination.size();
                Viewport::sized(width, height)
            }
        };

        device.draw(&DrawCall {
            label: desc.name,
            program: pass.program,
            mesh: self.mesh,
            target: DrawTarget::Textures {
                color: &color,
                depth,
            },
            clear: desc.clear,
            textures: &textures,
            uniforms: &uniforms,
            viewport,
        })
    }
}

/// Packs `entries` with the values of the current frame.
pub fn pack_uniforms(
    entries: &[UniformEntry],
    frame: &FrameParams,
    pool: &RenderTargetPool,
) -> Result<Vec<u8>> {
    let mut writer = UniformWriter::new();
    for entry in entries {
        let data = match entry.value {
            UniformValue::Const(data) => data,
            UniformValue::Param(param) => frame.resolve(param),
            UniformValue::TargetSize(handle) => {
                size_uniform(pool.get(handle).ok_or(PrismError::UnknownTarget)?.size())
            }
        };
        writer.push(data);
    }
    Ok(writer.finish())
}

/// Byte size of the uniform block described by `entries`.
#[must_use]
pub fn uniform_block_size(entries: &[UniformEntry]) -> u64 {
    block_size(entries.iter().map(|e| e.value.kind())) as u64
}

fn validate(desc: &PassDesc, pool: &RenderTargetPool, max_color: u32) -> Result<()> {
    let mismatch = |reason: &str| PrismError::AttachmentMismatch {
        pass: desc.name,
        reason: reason.to_string(),
    };

    if desc.color.is_empty() {
        return Err(mismatch("no color attachment"));
    }
    if desc.color.len() as u32 > max_color {
        return Err(mismatch("more color attachments than the device supports"));
    }

    // ========================================================================
    // Attachments
    // ========================================================================
    let mut extent = None;
    for &handle in &desc.color {
        let target = pool.get(handle).ok_or(PrismError::MissingTarget {
            pass: desc.name,
            input: "color",
        })?;
        if target.format().is_depth() {
            return Err(mismatch("depth format bound as a color attachment"));
        }
        match extent {
            None => extent = Some(target.desc().size),
            Some(size) if size != target.desc().size => {
                return Err(mismatch("color attachments have different extents"));
            }
            Some(_) => {}
        }
    }
    if let Some(handle) = desc.depth {
        let target = pool.get(handle).ok_or(PrismError::MissingTarget {
            pass: desc.name,
            input: "depth",
        })?;
        if !target.format().is_depth() {
            return Err(mismatch("depth attachment has a color format"));
        }
        if extent != Some(target.desc().size) {
            return Err(mismatch("depth attachment extent differs from color"));
        }
    }

    // ========================================================================
    // Inputs & Uniforms
    // ========================================================================
    for input in &desc.inputs {
        if !pool.contains(input.target) {
            return Err(PrismError::MissingTarget {
                pass: desc.name,
                input: input.name,
            });
        }
        if desc.attaches(input.target) {
            return Err(PrismError::FeedbackLoop {
                pass: desc.name,
                input: input.name,
            });
        }
    }
    for entry in &desc.uniforms {
        if let UniformValue::TargetSize(handle) = entry.value
            && !pool.contains(handle)
        {
            return Err(PrismError::MissingTarget {
                pass: desc.name,
                input: entry.name,
            });
        }
    }
    Ok(())
}

fn program_key(desc: &PassDesc, pool: &RenderTargetPool) -> Result<ProgramKey> {
    let target = |handle| pool.get(handle).ok_or(PrismError::UnknownTarget);

    let output = target(desc.color[0])?;
    let input_rgbm = match desc.inputs.first() {
        Some(input) => target(input.target)?.encoding() == ColorEncoding::Rgbm,
        None => false,
    };

    Ok(ProgramKey {
        shader: desc.shader,
        defines: ShaderDefines {
            input_rgbm,
            output_rgbm: output.encoding() == ColorEncoding::Rgbm,
            srgb_output: output.format().is_srgb(),
        },
        color: desc
            .color
            .iter()
            .map(|&h| target(h).map(|t| t.format()))
            .collect::<Result<_>>()?,
        depth: desc
            .depth
            .map(|h| target(h).map(|t| t.format()))
            .transpose()?,
        inputs: desc
            .inputs
            .iter()
            .map(|i| target(i.target).map(|t| t.format().sample_kind()))
            .collect::<Result<_>>()?,
        uniform_size: uniform_block_size(&desc.uniforms),
    })
}
