use crate::shaders;
use bytemuck::{Pod, Zeroable};
use pathfiddle_render::ZoomLayout;
use pathfiddle_render::magnifier::{ZOOM_BORDER_GRAY, ZOOM_WINDOW_HEIGHT, ZOOM_WINDOW_WIDTH};
use wgpu::util::DeviceExt;

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct ZoomUniforms {
    backdrop: [f32; 4],
}

/// Everything the overlay holds while the magnifier is on: the intermediate
/// texture with the unscaled source window and the pipelines drawing it.
/// Dropping it releases both.
pub(crate) struct ZoomSurface {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    pipelines: ZoomPipelines,
}

impl ZoomSurface {
    /// GPU allocations owned while on: the texture and the pipeline set.
    pub(crate) const ALLOCATIONS: usize = 2;

    pub(crate) fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        present_format: wgpu::TextureFormat,
    ) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("zoom_surface"),
            size: wgpu::Extent3d {
                width: ZOOM_WINDOW_WIDTH,
                height: ZOOM_WINDOW_HEIGHT,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            texture,
            view,
            pipelines: ZoomPipelines::new(device, present_format),
        }
    }

    pub(crate) fn encode(
        &self,
        device: &wgpu::Device,
        encoder: &mut wgpu::CommandEncoder,
        frame: &wgpu::Texture,
        present_view: &wgpu::TextureView,
        layout: &ZoomLayout,
    ) {
        self.pipelines.encode(device, encoder, frame, present_view, self, layout);
    }
}

/// Pipelines drawing the backdrop and the scaled inset onto a presented
/// frame.
struct ZoomPipelines {
    solid: wgpu::RenderPipeline,
    zoom: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    uniforms: wgpu::Buffer,
}

impl ZoomPipelines {
    fn new(device: &wgpu::Device, present_format: wgpu::TextureFormat) -> Self {
        let uniforms = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("zoom_uniforms"),
            contents: bytemuck::bytes_of(&ZoomUniforms {
                backdrop: [ZOOM_BORDER_GRAY, ZOOM_BORDER_GRAY, ZOOM_BORDER_GRAY, 1.0],
            }),
            usage: wgpu::BufferUsages::UNIFORM,
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("zoom_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("zoom_bind_group_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        multisampled: false,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("zoom_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("zoom_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::ZOOM_SHADER.into()),
        });

        let pipeline = |label: &str, fragment: &str| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_main"),
                    compilation_options: Default::default(),
                    buffers: &[],
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some(fragment),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: present_format,
                        blend: None,
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                primitive: wgpu::PrimitiveState::default(),
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            })
        };

        Self {
            solid: pipeline("zoom_backdrop_pipeline", "fs_solid"),
            zoom: pipeline("zoom_inset_pipeline", "fs_zoom"),
            bind_group_layout,
            sampler,
            uniforms,
        }
    }

    fn encode(
        &self,
        device: &wgpu::Device,
        encoder: &mut wgpu::CommandEncoder,
        frame: &wgpu::Texture,
        present_view: &wgpu::TextureView,
        surface: &ZoomSurface,
        layout: &ZoomLayout,
    ) {
        encoder.copy_texture_to_texture(
            wgpu::TexelCopyTextureInfo {
                texture: frame,
                mip_level: 0,
                origin: wgpu::Origin3d {
                    x: layout.source.x,
                    y: layout.source.y,
                    z: 0,
                },
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyTextureInfo {
                texture: &surface.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::Extent3d {
                width: layout.source.width,
                height: layout.source.height,
                depth_or_array_layers: 1,
            },
        );

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("zoom_bind_group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&surface.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: self.uniforms.as_entire_binding(),
                },
            ],
        });

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("zoom_pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: present_view,
                resolve_target: None,
                depth_slice: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        pass.set_bind_group(0, &bind_group, &[]);

        let back = layout.backdrop;
        pass.set_pipeline(&self.solid);
        pass.set_scissor_rect(back.x, back.y, back.width, back.height);
        pass.draw(0..3, 0..1);

        let inset = layout.inset;
        pass.set_pipeline(&self.zoom);
        pass.set_scissor_rect(inset.x, inset.y, inset.width, inset.height);
        pass.set_viewport(
            inset.x as f32,
            inset.y as f32,
            inset.width as f32,
            inset.height as f32,
            0.0,
            1.0,
        );
        pass.draw(0..3, 0..1);
    }
}
