//! Recording device without a GPU.
//!
//! Every allocation, upload and draw is kept in memory so callers can
//! inspect exactly what the frame graph asked for. Draws are validated
//! against the program they use the same way a real pipeline would reject
//! them (attachment formats, input count and kinds, feedback loops).

use super::{
    ClearPolicy, DeviceLimits, DrawCall, DrawTarget, FilterMode, GpuDevice, GpuTextureId, MeshId,
    PixelFormat, ProgramDesc, ProgramId, SampleKind, TextureDesc, Viewport, WrapMode,
    image_byte_len,
};
use crate::errors::{PrismError, Result};

#[derive(Debug, Clone)]
pub struct HeadlessTexture {
    pub label: String,
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub filter: FilterMode,
    pub wrap: WrapMode,
    /// Number of times storage was (re)created, initial allocation included.
    pub allocations: u32,
    /// Last uploaded contents, cleared by reallocation.
    pub data: Option<Vec<u8>>,
}

#[derive(Debug, Clone)]
pub struct HeadlessProgram {
    pub label: String,
    pub source: String,
    pub color_formats: Vec<PixelFormat>,
    pub depth_format: Option<PixelFormat>,
    pub inputs: Vec<SampleKind>,
    pub uniform_size: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RecordedTarget {
    Textures {
        color: Vec<GpuTextureId>,
        depth: Option<GpuTextureId>,
    },
    Display,
}

#[derive(Debug, Clone)]
pub struct RecordedDraw {
    pub label: String,
    pub program: ProgramId,
    pub target: RecordedTarget,
    pub clear: ClearPolicy,
    pub textures: Vec<GpuTextureId>,
    pub uniforms: Vec<u8>,
    pub viewport: Viewport,
    /// Index of the frame the draw belongs to.
    pub frame: u64,
}

impl RecordedDraw {
    /// Reads the `index`-th `f32` of the uniform block.
    #[must_use]
    pub fn uniform_f32(&self, index: usize) -> Option<f32> {
        let start = index * 4;
        let bytes = self.uniforms.get(start..start + 4)?;
        Some(f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    #[must_use]
    pub fn color_targets(&self) -> &[GpuTextureId] {
        match &self.target {
            RecordedTarget::Textures { color, .. } => color,
            RecordedTarget::Display => &[],
        }
    }
}

pub struct HeadlessDevice {
    limits: DeviceLimits,
    display_format: PixelFormat,
    textures: Vec<HeadlessTexture>,
    programs: Vec<HeadlessProgram>,
    meshes: u32,
    draws: Vec<RecordedDraw>,
    frame: u64,
}

impl Default for HeadlessDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessDevice {
    #[must_use]
    pub fn new() -> Self {
        Self::with_limits(DeviceLimits::default())
    }

    #[must_use]
    pub fn with_limits(limits: DeviceLimits) -> Self {
        Self {
            limits,
            display_format: PixelFormat::Bgra8Srgb,
            textures: Vec::new(),
            programs: Vec::new(),
            meshes: 0,
            draws: Vec::new(),
            frame: 0,
        }
    }

    #[must_use]
    pub fn with_display_format(mut self, format: PixelFormat) -> Self {
        self.display_format = format;
        self
    }

    #[must_use]
    pub fn texture(&self, id: GpuTextureId) -> Option<&HeadlessTexture> {
        self.textures.get(id.index())
    }

    #[must_use]
    pub fn program(&self, id: ProgramId) -> Option<&HeadlessProgram> {
        self.programs.get(id.index())
    }

    #[must_use]
    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    #[must_use]
    pub fn program_count(&self) -> usize {
        self.programs.len()
    }

    #[must_use]
    pub fn draws(&self) -> &[RecordedDraw] {
        &self.draws
    }

    pub fn clear_draws(&mut self) {
        self.draws.clear();
    }

    /// Number of completed [`GpuDevice::end_frame`] calls.
    #[must_use]
    pub fn frames_submitted(&self) -> u64 {
        self.frame
    }

    /// Labels of the draws recorded in frame `frame`, in submission order.
    #[must_use]
    pub fn frame_labels(&self, frame: u64) -> Vec<&str> {
        self.draws
            .iter()
            .filter(|d| d.frame == frame)
            .map(|d| d.label.as_str())
            .collect()
    }

    fn texture_mut(&mut self, id: GpuTextureId) -> Result<&mut HeadlessTexture> {
        self.textures
            .get_mut(id.index())
            .ok_or(PrismError::UnknownTexture(id.0))
    }

    fn format_of(&self, id: GpuTextureId) -> Result<PixelFormat> {
        self.texture(id)
            .map(|t| t.format)
            .ok_or(PrismError::UnknownTexture(id.0))
    }

    fn check_extent(&self, label: &str, width: u32, height: u32) -> Result<()> {
        let max = self.limits.max_texture_dimension_2d;
        if width == 0 || height == 0 || width > max || height > max {
            return Err(PrismError::Device(format!(
                "{label}: invalid extent {width}x{height}"
            )));
        }
        Ok(())
    }

    fn validate(&self, call: &DrawCall<'_>) -> Result<()> {
        let program = self
            .program(call.program)
            .ok_or(PrismError::UnknownProgram(call.program.0))?;

        let mismatch = |reason: String| PrismError::Device(format!("{}: {reason}", call.label));

        if call.textures.len() != program.inputs.len() {
            return Err(mismatch(format!(
                "program expects {} inputs, draw binds {}",
                program.inputs.len(),
                call.textures.len()
            )));
        }
        for (slot, (&id, &kind)) in call.textures.iter().zip(&program.inputs).enumerate() {
            if self.format_of(id)?.sample_kind() != kind {
                return Err(mismatch(format!("input {slot} has the wrong sample kind")));
            }
        }
        if call.uniforms.len() as u64 > program.uniform_size {
            return Err(mismatch("uniform block larger than declared".to_string()));
        }

        match call.target {
            DrawTarget::Textures { color, depth } => {
                let formats = color
                    .iter()
                    .map(|&id| self.format_of(id))
                    .collect::<Result<Vec<_>>>()?;
                if formats != program.color_formats {
                    return Err(mismatch("color attachment formats differ".to_string()));
                }
                let depth_format = depth.map(|id| self.format_of(id)).transpose()?;
                if depth_format != program.depth_format {
                    return Err(mismatch("depth attachment differs".to_string()));
                }
                let attached = color.iter().chain(depth.iter());
                for id in attached {
                    if call.textures.contains(id) {
                        return Err(mismatch(format!("texture {} is bound and attached", id.0)));
                    }
                }
            }
            DrawTarget::Display => {
                if program.color_formats != [self.display_format] {
                    return Err(mismatch("program does not target the display".to_string()));
                }
            }
        }
        Ok(())
    }
}

impl GpuDevice for HeadlessDevice {
    fn limits(&self) -> DeviceLimits {
        self.limits
    }

    fn display_format(&self) -> PixelFormat {
        self.display_format
    }

    fn create_texture(&mut self, desc: &TextureDesc<'_>) -> Result<GpuTextureId> {
        self.check_extent(desc.label, desc.width, desc.height)?;
        let id = GpuTextureId(self.textures.len() as u32);
        self.textures.push(HeadlessTexture {
            label: desc.label.to_string(),
            width: desc.width,
            height: desc.height,
            format: desc.format,
            filter: desc.filter,
            wrap: desc.wrap,
            allocations: 1,
            data: None,
        });
        Ok(id)
    }

    fn reallocate_texture(&mut self, id: GpuTextureId, width: u32, height: u32) -> Result<()> {
        let label = self
            .texture(id)
            .map(|t| t.label.clone())
            .ok_or(PrismError::UnknownTexture(id.0))?;
        self.check_extent(&label, width, height)?;
        let texture = self.texture_mut(id)?;
        texture.width = width;
        texture.height = height;
        texture.allocations += 1;
        texture.data = None;
        Ok(())
    }

    fn write_texture(
        &mut self,
        id: GpuTextureId,
        width: u32,
        height: u32,
        data: &[u8],
    ) -> Result<()> {
        let format = self.format_of(id)?;
        let expected = image_byte_len(width, height, format);
        if data.len() != expected {
            return Err(PrismError::TextureDataSize {
                expected,
                actual: data.len(),
            });
        }
        let resize = self
            .texture(id)
            .is_some_and(|t| t.width != width || t.height != height);
        if resize {
            self.reallocate_texture(id, width, height)?;
        }
        self.texture_mut(id)?.data = Some(data.to_vec());
        Ok(())
    }

    fn create_program(&mut self, desc: &ProgramDesc<'_>) -> Result<ProgramId> {
        if desc.color_formats.len() as u32 > self.limits.max_color_attachments {
            return Err(PrismError::Device(format!(
                "{}: {} color attachments exceed the device limit",
                desc.label,
                desc.color_formats.len()
            )));
        }
        let id = ProgramId(self.programs.len() as u32);
        self.programs.push(HeadlessProgram {
            label: desc.label.to_string(),
            source: desc.source.to_string(),
            color_formats: desc.color_formats.to_vec(),
            depth_format: desc.depth.map(|d| d.format),
            inputs: desc.inputs.to_vec(),
            uniform_size: desc.uniform_size,
        });
        Ok(id)
    }

    fn create_quad_mesh(&mut self) -> Result<MeshId> {
        let id = MeshId(self.meshes);
        self.meshes += 1;
        Ok(id)
    }

    fn draw(&mut self, call: &DrawCall<'_>) -> Result<()> {
        self.validate(call)?;
        let target = match call.target {
            DrawTarget::Textures { color, depth } => RecordedTarget::Textures {
                color: color.to_vec(),
                depth,
            },
            DrawTarget::Display => RecordedTarget::Display,
        };
        self.draws.push(RecordedDraw {
            label: call.label.to_string(),
            program: call.program,
            target,
            clear: call.clear,
            textures: call.textures.to_vec(),
            uniforms: call.uniforms.to_vec(),
            viewport: call.viewport,
            frame: self.frame,
        });
        Ok(())
    }

    fn end_frame(&mut self) -> Result<()> {
        self.frame += 1;
        Ok(())
    }
}
