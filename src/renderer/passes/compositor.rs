//! Final compositor.
//!
//! Unlike the effect stages the compositor is not a [`PassDesc`]: it draws
//! straight into the display target the device presents. Per pixel it
//!
//! 1. decodes the scene color and multiplies ambient occlusion,
//! 2. adds emissive when it was rendered separately,
//! 3. blends exponential fog (with a sun glow along the view ray),
//! 4. adds bloom scaled by its intensity,
//! 5. applies exposure and the Uncharted 2 filmic curve,
//! 6. optionally runs FXAA on the tone-mapped result,
//! 7. gamma-encodes unless the display format is sRGB.
//!
//! [`PassDesc`]: crate::renderer::graph::PassDesc

use glam::Vec2;
use smallvec::smallvec;

use crate::device::{ClearPolicy, DrawCall, DrawTarget, GpuDevice, MeshId, ProgramId, Viewport};
use crate::errors::{PrismError, Result};
use crate::renderer::FrameTargets;
use crate::renderer::graph::{
    FrameParams, ProgramCache, ProgramKey, UniformData, UniformWriter, block_size,
};
use crate::renderer::pool::{RenderTargetPool, TargetHandle};
use crate::renderer::shaders::{ShaderDefines, ShaderLibrary};
use crate::renderer::target::ColorEncoding;

pub const COMPOSITE: &str = "composite";
const COMPOSITE_SHADER: &str = "composite";

/// Which optional terms the compositor applies this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CompositeFlags {
    pub emissive: bool,
    pub ambient_occlusion: bool,
    pub bloom: bool,
    pub fog: bool,
    pub fxaa: bool,
}

pub struct Compositor {
    program: ProgramId,
    mesh: MeshId,
    /// color, emissive, AO, bloom, depth
    inputs: [TargetHandle; 5],
}

impl Compositor {
    pub fn new(
        device: &mut dyn GpuDevice,
        pool: &RenderTargetPool,
        shaders: &ShaderLibrary,
        programs: &mut ProgramCache,
        mesh: MeshId,
        targets: &FrameTargets,
    ) -> Result<Self> {
        let inputs = [
            targets.color,
            targets.emissive,
            targets.ao,
            targets.bloom_v,
            targets.depth,
        ];
        let color = pool.get(targets.color).ok_or(PrismError::MissingTarget {
            pass: COMPOSITE,
            input: "color",
        })?;
        let kinds = inputs
            .iter()
            .map(|&h| {
                pool.get(h)
                    .map(|t| t.format().sample_kind())
                    .ok_or(PrismError::MissingTarget {
                        pass: COMPOSITE,
                        input: "input",
                    })
            })
            .collect::<Result<_>>()?;

        let display = device.display_format();
        let uniform_size = block_size(
            uniforms(&FrameParams::default(), CompositeFlags::default(), (1, 1))
                .iter()
                .map(UniformData::kind),
        ) as u64;

        let program = programs.get_or_create(
            device,
            shaders,
            ProgramKey {
                shader: COMPOSITE_SHADER,
                defines: ShaderDefines {
                    input_rgbm: color.encoding() == ColorEncoding::Rgbm,
                    output_rgbm: false,
                    srgb_output: display.is_srgb(),
                },
                color: smallvec![display],
                depth: None,
                inputs: kinds,
                uniform_size,
            },
        )?;

        Ok(Self {
            program,
            mesh,
            inputs,
        })
    }

    /// Sampled targets in binding order: color, emissive, AO, bloom, depth.
    #[must_use]
    pub fn inputs(&self) -> &[TargetHandle; 5] {
        &self.inputs
    }

    /// Draws the final image into the display target.
    pub fn draw(
        &self,
        device: &mut dyn GpuDevice,
        pool: &RenderTargetPool,
        frame: &FrameParams,
        flags: CompositeFlags,
        viewport: Viewport,
    ) -> Result<()> {
        let textures = self
            .inputs
            .iter()
            .map(|&h| pool.gpu_texture(h))
            .collect::<Result<Vec<_>>>()?;

        let mut writer = UniformWriter::new();
        for value in uniforms(frame, flags, (viewport.width, viewport.height)) {
            writer.push(value);
        }
        let uniforms = writer.finish();

        device.draw(&DrawCall {
            label: COMPOSITE,
            program: self.program,
            mesh: self.mesh,
            target: DrawTarget::Display,
            clear: ClearPolicy::LOAD,
            textures: &textures,
            uniforms: &uniforms,
            viewport,
        })
    }
}

/// Uniform block in WGSL member order.
fn uniforms(frame: &FrameParams, flags: CompositeFlags, size: (u32, u32)) -> [UniformData; 16] {
    [
        UniformData::Mat4(frame.view),
        UniformData::Mat4(frame.inverse_projection),
        UniformData::Vec3(frame.fog.color),
        UniformData::F32(frame.exposure),
        UniformData::Vec2(Vec2::new(size.0 as f32, size.1 as f32)),
        UniformData::F32(frame.bloom.intensity),
        UniformData::flag(flags.bloom),
        UniformData::flag(flags.ambient_occlusion),
        UniformData::flag(flags.fog),
        UniformData::F32(frame.fog.density),
        UniformData::F32(frame.fog.start),
        UniformData::flag(flags.fxaa),
        UniformData::F32(frame.fog.sun_intensity),
        UniformData::F32(frame.fog.sun_dispersion),
        UniformData::Vec3(frame.fog.sun_position),
        UniformData::flag(flags.emissive),
    ]
}
