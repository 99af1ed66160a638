// renderer.rs - skybox renderer (cube texture + fullscreen ray casting) and egui overlay

use half::f16;
use skybox_cubemap::{CubeFaces, PixelBuffer, PixelFormat};
use thiserror::Error;
use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::camera::SkyboxCamera;

const CUBE_LAYERS: u32 = 6;
const SKY_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;
const SKY_BYTES_PER_PIXEL: u32 = 8;

#[derive(Debug, Error)]
pub enum RendererError {
    #[error("cannot create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),
    #[error("no compatible GPU adapter")]
    NoAdapter,
    #[error("cannot open device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),
    #[error("{size}px faces exceed the GPU limit of {max}px")]
    FaceTooLarge { size: u32, max: u32 },
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct SkyUniform {
    aspect: f32,
    tan_half_fov: f32,
    yaw: f32,
    pitch: f32,
    exposure: f32,
    /// 1 for HDR skies (Reinhard), 0 for 8-bit skies (clamp only).
    tone_map: f32,
    pad1: f32,
    pad2: f32,
}

fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// Expands one face to linear RGBA half floats; gray for 1 channel, opaque when alpha is absent.
///
/// 8-bit faces are sRGB encoded and get linearized. Float faces are clamped
/// to the finite half range so the shader never sees infinities.
fn face_to_rgba16f(face: &PixelBuffer) -> Vec<f16> {
    let channels = face.channels();
    let encoded = face.format() == PixelFormat::Unsigned8;
    let max = f16::MAX.to_f32();
    let color = |c: f32| {
        if encoded {
            srgb_to_linear(c)
        } else {
            c.clamp(-max, max)
        }
    };

    let samples = face.to_f32_samples();
    let mut out = Vec::with_capacity(face.width() * face.height() * 4);
    for px in samples.chunks_exact(channels) {
        let rgba = match channels {
            1 => [color(px[0]), color(px[0]), color(px[0]), 1.0],
            2 => [color(px[0]), color(px[1]), 0.0, 1.0],
            3 => [color(px[0]), color(px[1]), color(px[2]), 1.0],
            _ => [color(px[0]), color(px[1]), color(px[2]), px[3].clamp(0.0, 1.0)],
        };
        out.extend(rgba.map(f16::from_f32));
    }
    out
}

pub struct Renderer {
    surface: wgpu::Surface,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    pub size: winit::dpi::PhysicalSize<u32>,
    render_pipeline: wgpu::RenderPipeline,

    // cube texture
    sky_bind_group_layout: wgpu::BindGroupLayout,
    sky_bind_group: wgpu::BindGroup,
    texture: wgpu::Texture,
    sampler: wgpu::Sampler,
    face_size: u32,

    sky_uniform: SkyUniform,
    sky_buffer: wgpu::Buffer,

    // UI
    pub egui_ctx: egui::Context,
    pub egui_state: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,

    // declared after `surface` so it outlives it on drop
    _window: std::sync::Arc<Window>,
}

impl Renderer {
    pub async fn new(window: std::sync::Arc<Window>, vsync: bool) -> Result<Self, RendererError> {
        let size = window.inner_size();
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = unsafe { instance.create_surface(window.as_ref()) }?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(RendererError::NoAdapter)?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    features: wgpu::Features::empty(),
                    limits: wgpu::Limits::default().using_resolution(adapter.limits()),
                    label: None,
                },
                None,
            )
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .unwrap_or(surface_caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: if vsync {
                wgpu::PresentMode::Fifo
            } else {
                wgpu::PresentMode::AutoNoVsync
            },
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
        };
        surface.configure(&device, &config);

        // --- 1. Cube texture (1px gray placeholder until a panorama arrives) ---
        let texture = create_cube_texture(&device, 1);
        let gray = [f16::from_f32(0.18), f16::from_f32(0.18), f16::from_f32(0.18), f16::ONE];
        for layer in 0..CUBE_LAYERS {
            write_cube_layer(&queue, &texture, layer, 1, bytemuck::cast_slice(&gray));
        }

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("sky_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        // --- 2. Uniform ---
        let sky_uniform = SkyUniform {
            aspect: config.width as f32 / config.height as f32,
            tan_half_fov: (45.0f32.to_radians() * 0.5).tan(),
            yaw: 0.0,
            pitch: 0.0,
            exposure: 1.0,
            tone_map: 1.0,
            pad1: 0.0,
            pad2: 0.0,
        };

        let sky_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Sky Buffer"),
            contents: bytemuck::cast_slice(&[sky_uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let sky_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            multisampled: false,
                            view_dimension: wgpu::TextureViewDimension::Cube,
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 2,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                ],
                label: Some("sky_bind_group_layout"),
            });

        let sky_bind_group = create_sky_bind_group(
            &device,
            &sky_bind_group_layout,
            &sky_buffer,
            &texture,
            &sampler,
        );

        // --- 3. Pipeline ---
        let shader = device.create_shader_module(wgpu::include_wgsl!("skybox.wgsl"));
        let render_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Sky Pipeline Layout"),
            bind_group_layouts: &[&sky_bind_group_layout],
            push_constant_ranges: &[],
        });

        let render_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Sky Pipeline"),
            layout: Some(&render_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: "vs_main",
                buffers: &[], // fullscreen triangle from vertex_index
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: "fs_main",
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
        });

        // --- 4. Egui ---
        let egui_ctx = egui::Context::default();
        let mut egui_state = egui_winit::State::new(window.as_ref());
        egui_state.set_pixels_per_point(window.scale_factor() as f32);
        let egui_renderer = egui_wgpu::Renderer::new(&device, config.format, None, 1);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            size,
            render_pipeline,
            sky_bind_group_layout,
            sky_bind_group,
            texture,
            sampler,
            face_size: 1,
            sky_uniform,
            sky_buffer,
            egui_ctx,
            egui_state,
            egui_renderer,
            _window: window,
        })
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.size = new_size;
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
            self.sky_uniform.aspect = new_size.width as f32 / new_size.height as f32;
        }
    }

    pub fn set_vsync(&mut self, vsync: bool) {
        self.config.present_mode = if vsync {
            wgpu::PresentMode::Fifo
        } else {
            wgpu::PresentMode::AutoNoVsync
        };
        self.surface.configure(&self.device, &self.config);
    }

    pub fn face_size(&self) -> u32 {
        self.face_size
    }

    pub fn update_camera(&mut self, camera: &SkyboxCamera) {
        self.sky_uniform.yaw = camera.yaw.to_radians();
        self.sky_uniform.pitch = camera.pitch.to_radians();
        self.sky_uniform.tan_half_fov = (camera.fov.to_radians() * 0.5).tan();
        self.sky_uniform.exposure = camera.exposure;

        self.queue
            .write_buffer(&self.sky_buffer, 0, bytemuck::cast_slice(&[self.sky_uniform]));
    }

    /// Replaces the sky with `faces`; slot `i` goes to cube layer `i`.
    pub fn load_cube_faces(&mut self, faces: &CubeFaces) -> Result<(), RendererError> {
        let size = faces.face_size() as u32;
        let max = self.device.limits().max_texture_dimension_2d;
        if size > max {
            return Err(RendererError::FaceTooLarge { size, max });
        }

        let texture = create_cube_texture(&self.device, size);
        for (face, buffer) in faces.iter() {
            let texels = face_to_rgba16f(buffer);
            write_cube_layer(
                &self.queue,
                &texture,
                face.index() as u32,
                size,
                bytemuck::cast_slice(&texels),
            );
        }

        self.sky_bind_group = create_sky_bind_group(
            &self.device,
            &self.sky_bind_group_layout,
            &self.sky_buffer,
            &texture,
            &self.sampler,
        );
        self.texture = texture;
        self.face_size = size;

        let hdr = faces
            .iter()
            .next()
            .map_or(true, |(_, b)| b.format() == PixelFormat::Float32);
        self.sky_uniform.tone_map = if hdr { 1.0 } else { 0.0 };
        self.queue
            .write_buffer(&self.sky_buffer, 0, bytemuck::cast_slice(&[self.sky_uniform]));
        log::info!("uploaded {}px cube texture", size);
        Ok(())
    }

    pub fn render_with_ui(
        &mut self,
        window: &Window,
        run_ui: impl FnOnce(&egui::Context),
    ) -> Result<(), wgpu::SurfaceError> {
        let output = self.surface.get_current_texture()?;
        let view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Render Encoder"),
        });

        // 1. Sky
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Sky Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::WHITE),
                        store: true,
                    },
                })],
                depth_stencil_attachment: None,
            });

            render_pass.set_pipeline(&self.render_pipeline);
            render_pass.set_bind_group(0, &self.sky_bind_group, &[]);
            render_pass.draw(0..3, 0..1);
        }

        // 2. UI
        let raw_input = self.egui_state.take_egui_input(window);
        let full_output = self.egui_ctx.run(raw_input, run_ui);

        self.egui_state
            .handle_platform_output(window, &self.egui_ctx, full_output.platform_output);
        let clipped_primitives = self.egui_ctx.tessellate(full_output.shapes);

        let screen_descriptor = egui_wgpu::renderer::ScreenDescriptor {
            size_in_pixels: [self.config.width, self.config.height],
            pixels_per_point: window.scale_factor() as f32,
        };

        for (id, delta) in &full_output.textures_delta.set {
            self.egui_renderer
                .update_texture(&self.device, &self.queue, *id, delta);
        }

        self.egui_renderer.update_buffers(
            &self.device,
            &self.queue,
            &mut encoder,
            &clipped_primitives,
            &screen_descriptor,
        );

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Egui Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: true,
                    },
                })],
                depth_stencil_attachment: None,
            });
            self.egui_renderer
                .render(&mut render_pass, &clipped_primitives, &screen_descriptor);
        }

        for id in &full_output.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}

fn create_cube_texture(device: &wgpu::Device, face_size: u32) -> wgpu::Texture {
    device.create_texture(&wgpu::TextureDescriptor {
        size: wgpu::Extent3d {
            width: face_size,
            height: face_size,
            depth_or_array_layers: CUBE_LAYERS,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: SKY_FORMAT,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        label: Some("sky_cube_texture"),
        view_formats: &[],
    })
}

fn write_cube_layer(
    queue: &wgpu::Queue,
    texture: &wgpu::Texture,
    layer: u32,
    face_size: u32,
    bytes: &[u8],
) {
    queue.write_texture(
        wgpu::ImageCopyTexture {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d { x: 0, y: 0, z: layer },
            aspect: wgpu::TextureAspect::All,
        },
        bytes,
        wgpu::ImageDataLayout {
            offset: 0,
            bytes_per_row: Some(SKY_BYTES_PER_PIXEL * face_size),
            rows_per_image: Some(face_size),
        },
        wgpu::Extent3d {
            width: face_size,
            height: face_size,
            depth_or_array_layers: 1,
        },
    );
}

fn create_sky_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    uniform: &wgpu::Buffer,
    texture: &wgpu::Texture,
    sampler: &wgpu::Sampler,
) -> wgpu::BindGroup {
    let view = texture.create_view(&wgpu::TextureViewDescriptor {
        label: Some("sky_cube_view"),
        dimension: Some(wgpu::TextureViewDimension::Cube),
        ..Default::default()
    });

    device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::TextureView(&view),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
        label: Some("sky_bind_group"),
    })
}
