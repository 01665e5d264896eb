//! Bloom: bright pass, separable blur at reduced resolution, additive composite.

use wgpu::util::DeviceExt;

use crate::{
    data_structures::texture::{Texture, create_clamped_sampler},
    pipelines::{draw_fullscreen, mk_fullscreen_pipeline, sampler_entry, texture_entry, uniform_entry},
    scene::Bloom,
};

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct BloomUniform {
    threshold: f32,
    smoothing: f32,
    intensity: f32,
    _padding: f32,
    direction: [f32; 2],
    texel: [f32; 2],
}

impl BloomUniform {
    pub fn new(settings: &Bloom, direction: [f32; 2], blur_size: [u32; 2]) -> Self {
        Self {
            threshold: settings.luminance_threshold,
            smoothing: settings.luminance_smoothing,
            intensity: settings.intensity,
            _padding: 0.0,
            direction,
            texel: [1.0 / blur_size[0] as f32, 1.0 / blur_size[1] as f32],
        }
    }
}

/// Size of the blur targets: `settings.height` rows, width following the
/// viewport's aspect ratio.
pub fn blur_size(settings: &Bloom, viewport: [u32; 2]) -> [u32; 2] {
    let height = settings.height.max(1);
    let aspect = viewport[0].max(1) as f32 / viewport[1].max(1) as f32;
    let width = ((height as f32 * aspect).round() as u32).max(1);
    [width, height]
}

struct Targets {
    ping: Texture,
    pong: Texture,
    output: Texture,
    bright_group: wgpu::BindGroup,
    blur_h_group: wgpu::BindGroup,
    blur_v_group: wgpu::BindGroup,
    composite_group: wgpu::BindGroup,
}

/// Everything that survives a resize.
struct Shared {
    source_layout: wgpu::BindGroupLayout,
    composite_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    horizontal: wgpu::Buffer,
    vertical: wgpu::Buffer,
}

impl Shared {
    fn mk_targets(&self, device: &wgpu::Device, settings: &Bloom, scene: &Texture, viewport: [u32; 2]) -> Targets {
        let size = blur_size(settings, viewport);
        let ping = Texture::create_render_target(device, size, "bloom_ping");
        let pong = Texture::create_render_target(device, size, "bloom_pong");
        let output = Texture::create_render_target(device, viewport, "bloom_output");

        let source_group = |label: &str, source: &Texture, params: &wgpu::Buffer| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                layout: &self.source_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(&source.view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::Sampler(&self.sampler),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: params.as_entire_binding(),
                    },
                ],
                label: Some(label),
            })
        };
        let bright_group = source_group("bloom_bright_bind_group", scene, &self.horizontal);
        let blur_h_group = source_group("bloom_blur_h_bind_group", &ping, &self.horizontal);
        let blur_v_group = source_group("bloom_blur_v_bind_group", &pong, &self.vertical);
        let composite_group = mk_composite_group(
            device,
            &self.composite_layout,
            &self.sampler,
            &self.horizontal,
            &scene.view,
            &ping.view,
        );

        Targets {
            ping,
            pong,
            output,
            bright_group,
            blur_h_group,
            blur_v_group,
            composite_group,
        }
    }
}

pub struct BloomPass {
    settings: Bloom,
    bright: wgpu::RenderPipeline,
    blur: wgpu::RenderPipeline,
    composite: wgpu::RenderPipeline,
    shared: Shared,
    targets: Targets,
}

impl BloomPass {
    pub fn new(device: &wgpu::Device, settings: &Bloom, scene: &Texture, viewport: [u32; 2]) -> Self {
        let source_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[
                texture_entry(0),
                sampler_entry(1),
                uniform_entry(2, wgpu::ShaderStages::FRAGMENT),
            ],
            label: Some("bloom_source_layout"),
        });
        let composite_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[
                texture_entry(0),
                sampler_entry(1),
                uniform_entry(2, wgpu::ShaderStages::FRAGMENT),
                texture_entry(3),
            ],
            label: Some("bloom_composite_layout"),
        });
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Bloom Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("bloom.wgsl").into()),
        });
        let source_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Bloom Pipeline Layout"),
            bind_group_layouts: &[&source_layout],
            ..Default::default()
        });
        let composite_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Bloom Composite Pipeline Layout"),
                bind_group_layouts: &[&composite_layout],
                ..Default::default()
            });

        let format = Texture::OFFSCREEN_FORMAT;
        let bright = mk_fullscreen_pipeline(
            device,
            "Bloom Bright Pipeline",
            &source_pipeline_layout,
            &shader,
            "fs_bright",
            format,
            None,
        );
        let blur = mk_fullscreen_pipeline(
            device,
            "Bloom Blur Pipeline",
            &source_pipeline_layout,
            &shader,
            "fs_blur",
            format,
            None,
        );
        let composite = mk_fullscreen_pipeline(
            device,
            "Bloom Composite Pipeline",
            &composite_pipeline_layout,
            &shader,
            "fs_composite",
            format,
            None,
        );

        let size = blur_size(settings, viewport);
        let horizontal = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Bloom Horizontal Buffer"),
            contents: bytemuck::cast_slice(&[BloomUniform::new(settings, [1.0, 0.0], size)]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let vertical = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Bloom Vertical Buffer"),
            contents: bytemuck::cast_slice(&[BloomUniform::new(settings, [0.0, 1.0], size)]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let shared = Shared {
            source_layout,
            composite_layout,
            sampler: create_clamped_sampler(device),
            horizontal,
            vertical,
        };
        let targets = shared.mk_targets(device, settings, scene, viewport);
        Self {
            settings: settings.clone(),
            bright,
            blur,
            composite,
            shared,
            targets,
        }
    }

    /// Recreate targets for a new viewport. `scene` is the freshly created scene target.
    pub fn resize(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, scene: &Texture, viewport: [u32; 2]) {
        let size = blur_size(&self.settings, viewport);
        queue.write_buffer(
            &self.shared.horizontal,
            0,
            bytemuck::cast_slice(&[BloomUniform::new(&self.settings, [1.0, 0.0], size)]),
        );
        queue.write_buffer(
            &self.shared.vertical,
            0,
            bytemuck::cast_slice(&[BloomUniform::new(&self.settings, [0.0, 1.0], size)]),
        );
        self.targets = self.shared.mk_targets(device, &self.settings, scene, viewport);
    }

    /// The scene with glow added, at full resolution.
    pub fn output(&self) -> &Texture {
        &self.targets.output
    }

    pub fn encode(&self, encoder: &mut wgpu::CommandEncoder) {
        let t = &self.targets;
        draw_fullscreen(encoder, "Bloom Bright Pass", &t.ping.view, &self.bright, &t.bright_group);
        draw_fullscreen(encoder, "Bloom Horizontal Blur", &t.pong.view, &self.blur, &t.blur_h_group);
        draw_fullscreen(encoder, "Bloom Vertical Blur", &t.ping.view, &self.blur, &t.blur_v_group);
        draw_fullscreen(
            encoder,
            "Bloom Composite Pass",
            &t.output.view,
            &self.composite,
            &t.composite_group,
        );
    }
}

fn mk_composite_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    sampler: &wgpu::Sampler,
    params: &wgpu::Buffer,
    scene: &wgpu::TextureView,
    bloom: &wgpu::TextureView,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(scene),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: params.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 3,
                resource: wgpu::BindingResource::TextureView(bloom),
            },
        ],
        label: Some("bloom_composite_bind_group"),
    })
}
