// Frames are composed on the CPU into a window-sized RGBA buffer, uploaded to
// one texture and blitted with a full-screen triangle.

use std::sync::Arc;

use rayon::prelude::*;
use winit::window::Window;

use crate::{
    font::{self, Canvas},
    machine::Frame,
    tuning::{LAYOUT, PALETTE},
};

// -----------------------------
// Blit shader
// -----------------------------

const BLIT_WGSL: &str = r#"
struct Blit {
  @builtin(position) clip: vec4<f32>,
  @location(0) uv: vec2<f32>,
};

// One oversized triangle covers the whole viewport.
@vertex
fn vs_main(@builtin(vertex_index) idx: u32) -> Blit {
  let corner = vec2<f32>(f32((idx << 1u) & 2u), f32(idx & 2u));
  var out: Blit;
  out.clip = vec4<f32>(corner.x * 2.0 - 1.0, 1.0 - corner.y * 2.0, 0.0, 1.0);
  out.uv = corner;
  return out;
}

@group(0) @binding(0) var frame_sampler: sampler;
@group(0) @binding(1) var frame_tex: texture_2d<f32>;

@fragment
fn fs_main(v: Blit) -> @location(0) vec4<f32> {
  return textureSample(frame_tex, frame_sampler, v.uv);
}
"#;

#[derive(Debug, thiserror::Error)]
pub enum GfxError {
    #[error("cannot create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),

    #[error("no suitable GPU adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),

    #[error("cannot open GPU device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    #[error("surface reports no supported formats")]
    NoFormat,
}

/// Upload buffer rows are padded to wgpu's copy alignment.
fn padded_stride(width: u32) -> u32 {
    let tight = 4 * width;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    tight.div_ceil(align) * align
}

/// The texture the frame is copied into, plus its CPU-side staging bytes.
struct FrameTexture {
    tex: wgpu::Texture,
    bind: wgpu::BindGroup,
    w: u32,
    h: u32,
    stride: u32,
    bytes: Vec<u8>,
}

impl FrameTexture {
    fn new(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        sampler: &wgpu::Sampler,
        format: wgpu::TextureFormat,
        w: u32,
        h: u32,
    ) -> Self {
        let w = w.max(1);
        let h = h.max(1);

        let tex = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("frame_tex"),
            size: wgpu::Extent3d {
                width: w,
                height: h,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = tex.create_view(&wgpu::TextureViewDescriptor::default());

        let bind = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("frame_bind"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
            ],
        });

        let stride = padded_stride(w);
        Self {
            tex,
            bind,
            w,
            h,
            stride,
            bytes: vec![0u8; (stride * h) as usize],
        }
    }
}

// -----------------------------
// GPU state
// -----------------------------

pub struct Gfx {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,

    pipeline: wgpu::RenderPipeline,
    bgl: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    tex_format: wgpu::TextureFormat,

    frame: FrameTexture,
}

impl Gfx {
    pub async fn new(window: Arc<Window>, width: u32, height: u32) -> Result<Self, GfxError> {
        let instance = wgpu::Instance::default();
        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::LowPower,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;
        log::info!("adapter: {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                experimental_features: wgpu::ExperimentalFeatures::default(),
                memory_hints: wgpu::MemoryHints::MemoryUsage,
                trace: wgpu::Trace::default(),
            })
            .await?;

        let caps = surface.get_capabilities(&adapter);
        let format = *caps.formats.first().ok_or(GfxError::NoFormat)?;
        let present_mode = if caps.present_modes.contains(&wgpu::PresentMode::Fifo) {
            wgpu::PresentMode::Fifo
        } else {
            caps.present_modes[0]
        };

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode,
            alpha_mode: caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        // Match the surface's encoding so pixel bytes come out unchanged.
        let tex_format = if format.is_srgb() {
            wgpu::TextureFormat::Rgba8UnormSrgb
        } else {
            wgpu::TextureFormat::Rgba8Unorm
        };

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("frame_sampler"),
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("frame_bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        multisampled: false,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    },
                    count: None,
                },
            ],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("blit_shader"),
            source: wgpu::ShaderSource::Wgsl(BLIT_WGSL.into()),
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("blit_layout"),
            bind_group_layouts: &[&bgl],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("blit_pipeline"),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: wgpu::PipelineCompilationOptions::default(),
                buffers: &[],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: wgpu::PipelineCompilationOptions::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let frame = FrameTexture::new(
            &device,
            &bgl,
            &sampler,
            tex_format,
            config.width,
            config.height,
        );

        Ok(Self {
            surface,
            device,
            queue,
            config,
            pipeline,
            bgl,
            sampler,
            tex_format,
            frame,
        })
    }

    pub fn resize(&mut self, w: u32, h: u32) {
        self.config.width = w.max(1);
        self.config.height = h.max(1);
        self.surface.configure(&self.device, &self.config);
        self.frame = FrameTexture::new(
            &self.device,
            &self.bgl,
            &self.sampler,
            self.tex_format,
            self.config.width,
            self.config.height,
        );
    }

    /// Compose, upload and present one frame.
    pub fn draw(&mut self, frame: &Frame<'_>, debug_lines: &[String]) {
        let ft = &mut self.frame;
        compose(
            &mut ft.bytes,
            ft.stride as usize,
            ft.w as i32,
            ft.h as i32,
            frame,
            debug_lines,
        );

        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &ft.tex,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &ft.bytes,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(ft.stride),
                rows_per_image: Some(ft.h),
            },
            wgpu::Extent3d {
                width: ft.w,
                height: ft.h,
                depth_or_array_layers: 1,
            },
        );

        self.render();
    }

    fn render(&mut self) {
        let target = match self.surface.get_current_texture() {
            Ok(t) => t,
            Err(e) => {
                log::warn!("surface unavailable ({e}), reconfiguring");
                self.surface.configure(&self.device, &self.config);
                return;
            }
        };
        let view = target
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame_encoder"),
            });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("frame_blit"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &self.frame.bind, &[]);
            pass.draw(0..3, 0..1);
        }

        self.queue.submit([encoder.finish()]);
        target.present();
    }
}

// -----------------------------
// CPU frame composition
// -----------------------------

/// Top-left corner of the image inside a `w`x`h` window.
pub fn image_origin(w: i32, h: i32, bw: i32, bh: i32) -> (i32, i32) {
    (w / 2 - bw / 2, h / 2 - bh / 2 - LAYOUT.image_lift)
}

/// Paint background, the board's current pixels and the text overlay into
/// `bytes`, a `w`x`h` RGBA image whose rows are `stride` bytes apart.
pub fn compose(
    bytes: &mut [u8],
    stride: usize,
    w: i32,
    h: i32,
    frame: &Frame<'_>,
    debug_lines: &[String],
) {
    let board = frame.board;
    let (bw, bh) = (board.width() as i32, board.height() as i32);
    let (ox, oy) = image_origin(w, h, bw, bh);

    // Visible horizontal span of the image, in window and image coordinates.
    let x_lo = ox.max(0);
    let x_hi = (ox + bw).min(w);
    let bg = PALETTE.background;

    bytes
        .par_chunks_mut(stride)
        .take(h.max(0) as usize)
        .enumerate()
        .for_each(|(y, row)| {
            for px in row[..w as usize * 4].chunks_exact_mut(4) {
                px.copy_from_slice(&bg);
            }

            let iy = y as i32 - oy;
            if iy < 0 || iy >= bh || x_lo >= x_hi {
                return;
            }
            let src = board.row(iy as usize);
            let src = &src[(x_lo - ox) as usize..(x_hi - ox) as usize];
            let dst = &mut row[x_lo as usize * 4..x_hi as usize * 4];
            for (d, s) in dst.chunks_exact_mut(4).zip(src) {
                d.copy_from_slice(s);
            }
        });

    let mut canvas = Canvas {
        bytes,
        stride,
        w,
        h,
    };

    let (dx, dy) = LAYOUT.delay_at;
    canvas.text(
        dx,
        dy,
        &format!("Delay (array access per frame): {}", frame.delay.get()),
        LAYOUT.text_scale,
        PALETTE.delay_text,
    );
    canvas.text(
        LAYOUT.status_left,
        h - LAYOUT.status_from_bottom,
        frame.phase.status(),
        LAYOUT.text_scale,
        PALETTE.status_text,
    );

    let step = font::line_height(LAYOUT.debug_scale);
    let mut y = LAYOUT.debug_pad + step * 2;
    for line in debug_lines {
        let x = w - LAYOUT.debug_pad - font::text_width(line, LAYOUT.debug_scale);
        canvas.text(x, y, line, LAYOUT.debug_scale, PALETTE.debug_text);
        y += step;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        board::Board,
        machine::{FrameDelay, Phase},
    };

    fn solid(w: usize, h: usize, rgba: [u8; 4]) -> Board {
        Board::new(w, h, vec![rgba; w * h]).unwrap()
    }

    fn pixel(bytes: &[u8], stride: usize, x: i32, y: i32) -> [u8; 4] {
        let off = y as usize * stride + x as usize * 4;
        bytes[off..off + 4].try_into().unwrap()
    }

    #[test]
    fn stride_is_copy_aligned() {
        assert_eq!(padded_stride(1), 256);
        assert_eq!(padded_stride(64), 256);
        assert_eq!(padded_stride(65), 512);
    }

    #[test]
    fn image_sits_centered_and_lifted() {
        assert_eq!(image_origin(800, 450, 200, 100), (300, 135));
        assert_eq!(image_origin(100, 100, 300, 20), (-100, 0));
    }

    #[test]
    fn composes_background_and_image() {
        let board = solid(10, 6, [200, 0, 0, 255]);
        let frame = Frame {
            board: &board,
            phase: Phase::Sort,
            delay: FrameDelay::default(),
        };
        let (w, h) = (400, 300);
        let stride = padded_stride(w as u32) as usize;
        let mut bytes = vec![0u8; stride * h as usize];
        compose(&mut bytes, stride, w, h, &frame, &[]);

        let (ox, oy) = image_origin(w, h, 10, 6);
        assert_eq!(pixel(&bytes, stride, ox, oy), [200, 0, 0, 255]);
        assert_eq!(pixel(&bytes, stride, ox + 9, oy + 5), [200, 0, 0, 255]);
        assert_eq!(pixel(&bytes, stride, ox + 10, oy), PALETTE.background);
        assert_eq!(pixel(&bytes, stride, ox, oy - 1), PALETTE.background);
        // Padding past the visible width is never touched.
        assert!(bytes[w as usize * 4..stride].iter().all(|&b| b == 0));
    }

    #[test]
    fn clips_images_larger_than_the_window() {
        let board = solid(50, 150, [1, 2, 3, 255]);
        let frame = Frame {
            board: &board,
            phase: Phase::Waiting,
            delay: FrameDelay::default(),
        };
        let (w, h) = (20, 20);
        let stride = padded_stride(w as u32) as usize;
        let mut bytes = vec![0u8; stride * h as usize];
        compose(&mut bytes, stride, w, h, &frame, &[]);
        assert_eq!(pixel(&bytes, stride, 0, 0), [1, 2, 3, 255]);
        assert_eq!(pixel(&bytes, stride, 19, 19), [1, 2, 3, 255]);
    }

    #[test]
    fn overlay_text_is_drawn() {
        let board = solid(1, 1, PALETTE.background);
        let frame = Frame {
            board: &board,
            phase: Phase::Scramble,
            delay: FrameDelay::new(12),
        };
        let (w, h) = (800, 450);
        let stride = padded_stride(w as u32) as usize;
        let mut bytes = vec![0u8; stride * h as usize];
        compose(&mut bytes, stride, w, h, &frame, &["FPS 60".to_string()]);

        let count = |rgba: [u8; 4]| {
            (0..h)
                .flat_map(|y| (0..w).map(move |x| (x, y)))
                .filter(|&(x, y)| pixel(&bytes, stride, x, y) == rgba)
                .count()
        };
        assert!(count(PALETTE.delay_text) > 0);
        assert!(count(PALETTE.status_text) > 0);
        assert!(count(PALETTE.debug_text) > 0);
    }
}
