//! `wgpu` backend for [`GpuDevice`].
//!
//! Wraps a device and queue owned by the host application. Draws of one
//! frame are recorded into a single `CommandEncoder` which is submitted by
//! [`GpuDevice::end_frame`]. The display target is a view the host hands in
//! before each frame (usually the current swapchain image).

use std::sync::Arc;

use wgpu::util::DeviceExt;

use super::{
    DeviceLimits, DrawCall, DrawTarget, FilterMode, GpuDevice, GpuTextureId, MeshId, PixelFormat,
    ProgramDesc, ProgramId, QUAD_INDICES, QUAD_VERTICES, SampleKind, TextureDesc, WrapMode,
    image_byte_len,
};
use crate::errors::{PrismError, Result};

struct WgpuTexture {
    label: String,
    format: PixelFormat,
    width: u32,
    height: u32,
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    sampler: wgpu::Sampler,
}

struct WgpuProgram {
    pipeline: wgpu::RenderPipeline,
    layout: wgpu::BindGroupLayout,
    inputs: usize,
    uniform_size: u64,
}

struct WgpuMesh {
    vertices: wgpu::Buffer,
    indices: wgpu::Buffer,
}

pub struct WgpuDevice {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    display_format: wgpu::TextureFormat,
    display_view: Option<wgpu::TextureView>,
    textures: Vec<WgpuTexture>,
    programs: Vec<WgpuProgram>,
    meshes: Vec<WgpuMesh>,
    encoder: Option<wgpu::CommandEncoder>,
}

impl WgpuDevice {
    /// `display_format` must be one of the formats [`PixelFormat`] maps to.
    #[must_use]
    pub fn new(
        device: Arc<wgpu::Device>,
        queue: Arc<wgpu::Queue>,
        display_format: wgpu::TextureFormat,
    ) -> Self {
        Self {
            device,
            queue,
            display_format,
            display_view: None,
            textures: Vec::new(),
            programs: Vec::new(),
            meshes: Vec::new(),
            encoder: None,
        }
    }

    /// Sets the view the compositor draws into for the next frame.
    pub fn set_display_view(&mut self, view: wgpu::TextureView) {
        self.display_view = Some(view);
    }

    /// View of an image, for external passes rendering into the G-buffer.
    #[must_use]
    pub fn texture_view(&self, id: GpuTextureId) -> Option<&wgpu::TextureView> {
        self.textures.get(id.index()).map(|t| &t.view)
    }

    #[must_use]
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    /// Encoder of the frame in flight, for external passes that must be
    /// ordered with the frame graph.
    pub fn encoder(&mut self) -> &mut wgpu::CommandEncoder {
        let device = &self.device;
        self.encoder.get_or_insert_with(|| {
            device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Prism Frame Encoder"),
            })
        })
    }

    fn texture(&self, id: GpuTextureId) -> Result<&WgpuTexture> {
        lookup(&self.textures, id)
    }

    fn allocate(
        &self,
        label: &str,
        width: u32,
        height: u32,
        format: PixelFormat,
    ) -> (wgpu::Texture, wgpu::TextureView) {
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: to_wgpu_format(format),
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        (texture, view)
    }
}

fn lookup(textures: &[WgpuTexture], id: GpuTextureId) -> Result<&WgpuTexture> {
    textures
        .get(id.index())
        .ok_or(PrismError::UnknownTexture(id.0))
}

fn to_wgpu_format(format: PixelFormat) -> wgpu::TextureFormat {
    match format {
        PixelFormat::Rgba8 => wgpu::TextureFormat::Rgba8Unorm,
        PixelFormat::Rgba8Srgb => wgpu::TextureFormat::Rgba8UnormSrgb,
        PixelFormat::Bgra8 => wgpu::TextureFormat::Bgra8Unorm,
        PixelFormat::Bgra8Srgb => wgpu::TextureFormat::Bgra8UnormSrgb,
        PixelFormat::Rgba16Float => wgpu::TextureFormat::Rgba16Float,
        PixelFormat::Rgba32Float => wgpu::TextureFormat::Rgba32Float,
        PixelFormat::Depth32 => wgpu::TextureFormat::Depth32Float,
    }
}

fn from_wgpu_format(format: wgpu::TextureFormat) -> Option<PixelFormat> {
    Some(match format {
        wgpu::TextureFormat::Rgba8Unorm => PixelFormat::Rgba8,
        wgpu::TextureFormat::Rgba8UnormSrgb => PixelFormat::Rgba8Srgb,
        wgpu::TextureFormat::Bgra8Unorm => PixelFormat::Bgra8,
        wgpu::TextureFormat::Bgra8UnormSrgb => PixelFormat::Bgra8Srgb,
        wgpu::TextureFormat::Rgba16Float => PixelFormat::Rgba16Float,
        wgpu::TextureFormat::Rgba32Float => PixelFormat::Rgba32Float,
        wgpu::TextureFormat::Depth32Float => PixelFormat::Depth32,
        _ => return None,
    })
}

fn layout_entries(inputs: &[SampleKind]) -> Vec<wgpu::BindGroupLayoutEntry> {
    let mut entries = Vec::with_capacity(1 + inputs.len() * 2);
    entries.push(wgpu::BindGroupLayoutEntry {
        binding: 0,
        visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    });
    for (i, kind) in inputs.iter().enumerate() {
        let binding = 1 + 2 * i as u32;
        let (sample_type, sampler) = match kind {
            SampleKind::Filterable => (
                wgpu::TextureSampleType::Float { filterable: true },
                wgpu::SamplerBindingType::Filtering,
            ),
            SampleKind::Unfilterable => (
                wgpu::TextureSampleType::Float { filterable: false },
                wgpu::SamplerBindingType::NonFiltering,
            ),
            SampleKind::Depth => (
                wgpu::TextureSampleType::Depth,
                wgpu::SamplerBindingType::NonFiltering,
            ),
        };
        entries.push(wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type,
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        });
        entries.push(wgpu::BindGroupLayoutEntry {
            binding: binding + 1,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Sampler(sampler),
            count: None,
        });
    }
    entries
}

impl GpuDevice for WgpuDevice {
    fn limits(&self) -> DeviceLimits {
        let limits = self.device.limits();
        DeviceLimits {
            max_color_attachments: limits.max_color_attachments,
            max_texture_dimension_2d: limits.max_texture_dimension_2d,
        }
    }

    fn display_format(&self) -> PixelFormat {
        from_wgpu_format(self.display_format).unwrap_or(PixelFormat::Bgra8Srgb)
    }

    fn create_texture(&mut self, desc: &TextureDesc<'_>) -> Result<GpuTextureId> {
        let (texture, view) = self.allocate(desc.label, desc.width, desc.height, desc.format);

        // Depth and 32-bit float images only accept non-filtering samplers.
        let filter = match (desc.format.sample_kind(), desc.filter) {
            (SampleKind::Filterable, FilterMode::Linear) => wgpu::FilterMode::Linear,
            _ => wgpu::FilterMode::Nearest,
        };
        let address = match desc.wrap {
            WrapMode::ClampToEdge => wgpu::AddressMode::ClampToEdge,
            WrapMode::Repeat => wgpu::AddressMode::Repeat,
        };
        let sampler = self.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(desc.label),
            address_mode_u: address,
            address_mode_v: address,
            mag_filter: filter,
            min_filter: filter,
            ..Default::default()
        });

        let id = GpuTextureId(self.textures.len() as u32);
        self.textures.push(WgpuTexture {
            label: desc.label.to_string(),
            format: desc.format,
            width: desc.width,
            height: desc.height,
            texture,
            view,
            sampler,
        });
        Ok(id)
    }

    fn reallocate_texture(&mut self, id: GpuTextureId, width: u32, height: u32) -> Result<()> {
        let (label, format) = {
            let t = self.texture(id)?;
            (t.label.clone(), t.format)
        };
        let (texture, view) = self.allocate(&label, width, height, format);
        let slot = &mut self.textures[id.index()];
        slot.texture.destroy();
        slot.texture = texture;
        slot.view = view;
        slot.width = width;
        slot.height = height;
        Ok(())
    }

    fn write_texture(
        &mut self,
        id: GpuTextureId,
        width: u32,
        height: u32,
        data: &[u8],
    ) -> Result<()> {
        let (format, resize) = {
            let t = self.texture(id)?;
            (t.format, t.width != width || t.height != height)
        };
        let expected = image_byte_len(width, height, format);
        if data.len() != expected {
            return Err(PrismError::TextureDataSize {
                expected,
                actual: data.len(),
            });
        }
        if resize {
            self.reallocate_texture(id, width, height)?;
        }
        let texture = self.texture(id)?;
        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(width * format.bytes_per_pixel()),
                rows_per_image: Some(height),
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        Ok(())
    }

    fn create_program(&mut self, desc: &ProgramDesc<'_>) -> Result<ProgramId> {
        let module = self
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(desc.label),
                source: wgpu::ShaderSource::Wgsl(desc.source.into()),
            });

        let layout = self
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some(desc.label),
                entries: &layout_entries(desc.inputs),
            });

        let pipeline_layout = self
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some(desc.label),
                bind_group_layouts: &[Some(&layout)],
                immediate_size: 0,
            });

        let color_targets: Vec<Option<wgpu::ColorTargetState>> = desc
            .color_formats
            .iter()
            .map(|&format| {
                Some(wgpu::ColorTargetState {
                    format: to_wgpu_format(format),
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })
            })
            .collect();

        let depth_stencil = desc.depth.map(|d| wgpu::DepthStencilState {
            format: to_wgpu_format(d.format),
            depth_write_enabled: Some(d.write),
            depth_compare: if d.test {
                Some(wgpu::CompareFunction::LessEqual)
            } else {
                Some(wgpu::CompareFunction::Always)
            },
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        });

        let vertex_layout = wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<[f32; 2]>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &wgpu::vertex_attr_array![0 => Float32x2],
        };

        let pipeline = self
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(desc.label),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &module,
                    entry_point: Some("vs_main"),
                    buffers: &[vertex_layout],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &module,
                    entry_point: Some("fs_main"),
                    targets: &color_targets,
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                }),
                primitive: wgpu::PrimitiveState::default(),
                depth_stencil,
                multisample: wgpu::MultisampleState::default(),
                multiview_mask: None,
                cache: None,
            });

        let id = ProgramId(self.programs.len() as u32);
        self.programs.push(WgpuProgram {
            pipeline,
            layout,
            inputs: desc.inputs.len(),
            uniform_size: desc.uniform_size.max(16),
        });
        Ok(id)
    }

    fn create_quad_mesh(&mut self) -> Result<MeshId> {
        let vertices = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Fullscreen Quad Vertices"),
                contents: bytemuck::cast_slice(&QUAD_VERTICES),
                usage: wgpu::BufferUsages::VERTEX,
            });
        let indices = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Fullscreen Quad Indices"),
                contents: bytemuck::cast_slice(&QUAD_INDICES),
                usage: wgpu::BufferUsages::INDEX,
            });
        let id = MeshId(self.meshes.len() as u32);
        self.meshes.push(WgpuMesh { vertices, indices });
        Ok(id)
    }

    fn draw(&mut self, call: &DrawCall<'_>) -> Result<()> {
        let program = self
            .programs
            .get(call.program.index())
            .ok_or(PrismError::UnknownProgram(call.program.0))?;
        if call.textures.len() != program.inputs {
            return Err(PrismError::Device(format!(
                "{}: program expects {} inputs, got {}",
                call.label,
                program.inputs,
                call.textures.len()
            )));
        }
        let mesh = self
            .meshes
            .get(call.mesh.0 as usize)
            .ok_or_else(|| PrismError::Device(format!("{}: unknown mesh", call.label)))?;

        // ====================================================================
        // Bindings
        // ====================================================================
        let mut uniform_bytes = call.uniforms.to_vec();
        uniform_bytes.resize(program.uniform_size as usize, 0);
        let uniform_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(call.label),
                contents: &uniform_bytes,
                usage: wgpu::BufferUsages::UNIFORM,
            });

        let inputs = call
            .textures
            .iter()
            .map(|&id| lookup(&self.textures, id))
            .collect::<Result<Vec<_>>>()?;

        let mut entries = Vec::with_capacity(1 + inputs.len() * 2);
        entries.push(wgpu::BindGroupEntry {
            binding: 0,
            resource: uniform_buffer.as_entire_binding(),
        });
        for (i, texture) in inputs.iter().enumerate() {
            let binding = 1 + 2 * i as u32;
            entries.push(wgpu::BindGroupEntry {
                binding,
                resource: wgpu::BindingResource::TextureView(&texture.view),
            });
            entries.push(wgpu::BindGroupEntry {
                binding: binding + 1,
                resource: wgpu::BindingResource::Sampler(&texture.sampler),
            });
        }
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(call.label),
            layout: &program.layout,
            entries: &entries,
        });

        // ====================================================================
        // Attachments
        // ====================================================================
        let color_load = match call.clear.color {
            Some([r, g, b, a]) => wgpu::LoadOp::Clear(wgpu::Color {
                r: f64::from(r),
                g: f64::from(g),
                b: f64::from(b),
                a: f64::from(a),
            }),
            None => wgpu::LoadOp::Load,
        };
        let (color_views, depth_view): (Vec<&wgpu::TextureView>, Option<&wgpu::TextureView>) =
            match call.target {
                DrawTarget::Textures { color, depth } => {
                    let color = color
                        .iter()
                        .map(|&id| lookup(&self.textures, id).map(|t| &t.view))
                        .collect::<Result<Vec<_>>>()?;
                    let depth = depth
                        .map(|id| lookup(&self.textures, id).map(|t| &t.view))
                        .transpose()?;
                    (color, depth)
                }
                DrawTarget::Display => {
                    let view = self.display_view.as_ref().ok_or_else(|| {
                        PrismError::Device("no display view set for this frame".to_string())
                    })?;
                    (vec![view], None)
                }
            };

        let color_attachments: Vec<Option<wgpu::RenderPassColorAttachment<'_>>> = color_views
            .iter()
            .map(|view| {
                Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: color_load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })
            })
            .collect();

        let depth_attachment = depth_view.map(|view| wgpu::RenderPassDepthStencilAttachment {
            view,
            depth_ops: Some(wgpu::Operations {
                load: call
                    .clear
                    .depth
                    .map_or(wgpu::LoadOp::Load, wgpu::LoadOp::Clear),
                store: wgpu::StoreOp::Store,
            }),
            stencil_ops: None,
        });

        // ====================================================================
        // Record
        // ====================================================================
        let encoder = self.encoder.get_or_insert_with(|| {
            self.device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("Prism Frame Encoder"),
                })
        });
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(call.label),
            color_attachments: &color_attachments,
            depth_stencil_attachment: depth_attachment,
            ..Default::default()
        });
        let vp = call.viewport;
        pass.set_viewport(
            vp.x as f32,
            vp.y as f32,
            vp.width as f32,
            vp.height as f32,
            0.0,
            1.0,
        );
        pass.set_pipeline(&program.pipeline);
        pass.set_bind_group(0, &bind_group, &[]);
        pass.set_vertex_buffer(0, mesh.vertices.slice(..));
        pass.set_index_buffer(mesh.indices.slice(..), wgpu::IndexFormat::Uint16);
        pass.draw_indexed(0..QUAD_INDICES.len() as u32, 0, 0..1);
        Ok(())
    }

    fn end_frame(&mut self) -> Result<()> {
        if let Some(encoder) = self.encoder.take() {
            self.queue.submit(std::iter::once(encoder.finish()));
        }
        self.display_view = None;
        Ok(())
    }
}
