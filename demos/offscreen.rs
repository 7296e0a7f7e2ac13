//! Offscreen Rendering Example
//!
//! Renders a few frames of the full post-processing chain into an
//! offscreen display texture with wgpu, no window required.
//!
//! The geometry passes only clear the G-buffer: the point is to show how a
//! host wires its own scene rendering into [`Camera::render`].

use std::sync::Arc;
use std::time::Duration;

use prism::{Camera, CameraDescriptor, GBuffer, Viewport, WgpuDevice};

const WIDTH: u32 = 640;
const HEIGHT: u32 = 360;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let instance = wgpu::Instance::default();
    let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
        power_preference: wgpu::PowerPreference::HighPerformance,
        compatible_surface: None,
        force_fallback_adapter: false,
    }))?;
    let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
        label: Some("Prism Offscreen"),
        ..Default::default()
    }))?;
    let device = Arc::new(device);
    let queue = Arc::new(queue);

    let display_format = wgpu::TextureFormat::Rgba8UnormSrgb;
    let display = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Offscreen Display"),
        size: wgpu::Extent3d {
            width: WIDTH,
            height: HEIGHT,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: display_format,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    });

    let mut gpu = WgpuDevice::new(Arc::clone(&device), Arc::clone(&queue), display_format);
    let mut camera = Camera::new(
        &mut gpu,
        CameraDescriptor::new(Viewport::sized(WIDTH, HEIGHT)),
    )?;
    camera.configure_json(
        &mut gpu,
        r#"{
            "ssao": true,
            "bloom": true,
            "bloomThreshold": 0.8,
            "smaa": true,
            "fog": true,
            "exposure": 1.2
        }"#,
    )?;

    if let Some(dir) = std::env::args().nth(1) {
        let dir = std::path::PathBuf::from(dir);
        camera.load_smaa_textures(dir.join("smaa_area.png"), dir.join("smaa_search.png"));
        let uploaded = camera.finish_texture_loads(&mut gpu, Duration::from_secs(5));
        log::info!("Uploaded {uploaded} SMAA lookup textures");
    }

    for frame in 0..3 {
        gpu.set_display_view(display.create_view(&wgpu::TextureViewDescriptor::default()));
        let stats = camera.render(&mut gpu, clear_gbuffer)?;
        log::info!("Frame {frame}: {} effect passes", stats.passes);
    }
    println!("Rendered {WIDTH}x{HEIGHT} with {:?}", camera.schedule());
    Ok(())
}

/// Stand-in for a scene renderer: runs the G-buffer passes with their own
/// clears and draws nothing.
fn clear_gbuffer(gpu: &mut WgpuDevice, gbuffer: &GBuffer) -> prism::Result<()> {
    for pass in gbuffer.passes() {
        let colors = pass
            .color
            .iter()
            .map(|&id| view(gpu, id))
            .collect::<prism::Result<Vec<_>>>()?;
        let depth = view(gpu, pass.depth)?;

        let color_load = match pass.clear.color {
            Some([r, g, b, a]) => wgpu::LoadOp::Clear(wgpu::Color {
                r: f64::from(r),
                g: f64::from(g),
                b: f64::from(b),
                a: f64::from(a),
            }),
            None => wgpu::LoadOp::Load,
        };
        let depth_load = match pass.clear.depth {
            Some(depth) => wgpu::LoadOp::Clear(depth),
            None => wgpu::LoadOp::Load,
        };

        let attachments: Vec<_> = colors
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

        let _pass = gpu.encoder().begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(pass.label),
            color_attachments: &attachments,
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &depth,
                depth_ops: Some(wgpu::Operations {
                    load: depth_load,
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            ..Default::default()
        });
    }
    Ok(())
}

fn view(gpu: &WgpuDevice, id: prism::device::GpuTextureId) -> prism::Result<wgpu::TextureView> {
    gpu.texture_view(id)
        .cloned()
        .ok_or(prism::PrismError::UnknownTexture(id.index() as u32))
}
