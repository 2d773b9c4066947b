use std::sync::Arc;

use anyhow::{Context, Result};
use winit::dpi::PhysicalSize;
use winit::window::Window;

use super::WgpuConfig;
use super::surface::{
    SurfaceErrorAction, apply_resize, choose_alpha_mode, choose_surface_format,
    framebuffer_format, map_surface_error,
};

/// Device, queue and the blit pipeline shared by every window.
///
/// Created with the first window: adapter selection needs a surface to be
/// compatible with.
pub(super) struct Gpu {
    adapter: wgpu::Adapter,
    device: wgpu::Device,
    queue: wgpu::Queue,

    bind_group_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    shader: wgpu::ShaderModule,
    pipeline_layout: wgpu::PipelineLayout,
    /// One pipeline per surface format in use.
    pipelines: Vec<(wgpu::TextureFormat, wgpu::RenderPipeline)>,
}

/// A window, its surface and the texture its framebuffer is uploaded into.
pub(super) struct WindowSurface {
    // Declared before `window` so the surface is dropped first.
    surface: wgpu::Surface<'static>,
    window: Arc<Window>,
    config: wgpu::SurfaceConfiguration,
    size: PhysicalSize<u32>,
    frame: wgpu::Texture,
    bind_group: wgpu::BindGroup,
    extent: (u32, u32),
}

impl Gpu {
    pub(super) async fn new(
        instance: &wgpu::Instance,
        surface: &wgpu::Surface<'_>,
        config: &WgpuConfig,
    ) -> Result<Self> {
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: config.power_preference,
                compatible_surface: Some(surface),
                force_fallback_adapter: false,
            })
            .await
            .context("failed to find a suitable GPU adapter")?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("lapis device"),
                required_features: wgpu::Features::empty(),
                required_limits: config.required_limits.clone(),
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to create wgpu device/queue")?;

        log::info!("wgpu adapter: {:?}", adapter.get_info());

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("lapis blit shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/blit.wgsl").into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("lapis blit bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("lapis blit pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        // Nearest: one framebuffer texel per covered screen pixel.
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("lapis blit sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::MipmapFilterMode::Nearest,
            ..Default::default()
        });

        Ok(Self {
            adapter,
            device,
            queue,
            bind_group_layout,
            sampler,
            shader,
            pipeline_layout,
            pipelines: Vec::new(),
        })
    }

    /// Configures `surface` for `window` and allocates the framebuffer texture.
    pub(super) fn window_surface(
        &mut self,
        window: Arc<Window>,
        surface: wgpu::Surface<'static>,
        extent: (u32, u32),
        config: &WgpuConfig,
    ) -> Result<WindowSurface> {
        let caps = surface.get_capabilities(&self.adapter);
        let format = choose_surface_format(&caps, config.prefer_srgb)
            .context("no supported surface formats")?;

        let size = window.inner_size();
        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: config.present_mode,
            alpha_mode: choose_alpha_mode(&caps, config.alpha_mode),
            view_formats: vec![],
            desired_maximum_frame_latency: config.desired_maximum_frame_latency,
        };
        surface.configure(&self.device, &surface_config);
        self.ensure_pipeline(format);

        let frame = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("lapis window framebuffer"),
            size: wgpu::Extent3d {
                width: extent.0,
                height: extent.1,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: framebuffer_format(format),
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = frame.create_view(&wgpu::TextureViewDescriptor::default());

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("lapis blit bind group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        });

        log::debug!(
            "surface {format:?} {}x{} for {}x{} framebuffer",
            size.width,
            size.height,
            extent.0,
            extent.1
        );

        Ok(WindowSurface {
            surface,
            window,
            config: surface_config,
            size,
            frame,
            bind_group,
            extent,
        })
    }

    /// Uploads `pixels` and blits them to the window. FIFO presentation blocks
    /// in surface acquisition until a swapchain image frees up at vblank.
    pub(super) fn present(&self, target: &WindowSurface, pixels: &[u8]) -> Result<()> {
        let (width, height) = target.extent;
        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &target.frame,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(width * 4),
                rows_per_image: Some(height),
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );

        if target.size.width == 0 || target.size.height == 0 {
            // Minimized; keep the upload so the image is current once restored.
            return Ok(());
        }

        let surface_texture = match target.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(err) => {
                let reason = err.to_string();
                let action = map_surface_error(
                    &target.surface,
                    &self.device,
                    &target.config,
                    target.size,
                    err,
                );
                anyhow::ensure!(action != SurfaceErrorAction::Fatal, "surface failed: {reason}");
                log::debug!("frame skipped: {reason} ({action:?})");
                return Ok(());
            }
        };

        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("lapis present encoder"),
            });

        let pipeline = self
            .pipeline(target.config.format)
            .context("no blit pipeline for surface format")?;

        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("lapis blit pass"),
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
                multiview_mask: None,
            });
            rpass.set_pipeline(pipeline);
            rpass.set_bind_group(0, &target.bind_group, &[]);
            rpass.draw(0..3, 0..1);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        target.window.pre_present_notify();
        surface_texture.present();
        Ok(())
    }

    fn ensure_pipeline(&mut self, format: wgpu::TextureFormat) {
        if self.pipeline(format).is_some() {
            return;
        }

        let pipeline = self.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("lapis blit pipeline"),
            layout: Some(&self.pipeline_layout),
            vertex: wgpu::VertexState {
                module: &self.shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[],
            },
            fragment: Some(wgpu::FragmentState {
                module: &self.shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: None,
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
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });
        self.pipelines.push((format, pipeline));
    }

    fn pipeline(&self, format: wgpu::TextureFormat) -> Option<&wgpu::RenderPipeline> {
        self.pipelines
            .iter()
            .find(|(f, _)| *f == format)
            .map(|(_, p)| p)
    }
}

impl WindowSurface {
    #[inline]
    pub(super) fn extent(&self) -> (u32, u32) {
        self.extent
    }

    pub(super) fn resize(&mut self, gpu: &Gpu, new_size: PhysicalSize<u32>) {
        apply_resize(
            &self.surface,
            &gpu.device,
            &mut self.config,
            &mut self.size,
            new_size,
        );
    }
}
