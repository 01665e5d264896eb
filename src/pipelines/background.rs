use crate::{
    data_structures::texture::Texture,
    pipelines::{mk_fullscreen_pipeline, sampler_entry, texture_entry},
};

/// The gradient backdrop. It is drawn first in the scene pass, stretched over
/// the viewport, and never touches the depth buffer.
pub struct BackgroundPipeline {
    pub pipeline: wgpu::RenderPipeline,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl BackgroundPipeline {
    pub fn new(device: &wgpu::Device) -> Self {
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[texture_entry(0), sampler_entry(1)],
            label: Some("background_bind_group_layout"),
        });
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Background Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            ..Default::default()
        });
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Background Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("background.wgsl").into()),
        });
        let pipeline = mk_fullscreen_pipeline(
            device,
            "Background Pipeline",
            &layout,
            &shader,
            "fs_main",
            Texture::OFFSCREEN_FORMAT,
            Some(wgpu::DepthStencilState {
                format: Texture::DEPTH_FORMAT,
                depth_write_enabled: false,
                depth_compare: wgpu::CompareFunction::Always,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
        );
        Self {
            pipeline,
            bind_group_layout,
        }
    }

    /// Bind an uploaded backdrop. Needs to be redone whenever the image changes.
    pub fn bind(&self, device: &wgpu::Device, texture: &Texture) -> Option<wgpu::BindGroup> {
        let sampler = texture.sampler.as_ref()?;
        Some(device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
            label: Some("background_bind_group"),
        }))
    }
}
