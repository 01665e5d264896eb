//! Depth of field. Blurs each pixel over a disk whose radius grows with the
//! distance between its depth and the focus distance.

use wgpu::util::DeviceExt;

use crate::{
    camera::Projection,
    data_structures::texture::{Texture, create_clamped_sampler},
    pipelines::{draw_fullscreen, mk_fullscreen_pipeline, sampler_entry, texture_entry, uniform_entry},
    scene::DepthOfField,
};

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct DofUniform {
    focus_distance: f32,
    focal_length: f32,
    bokeh_scale: f32,
    near: f32,
    far: f32,
    resolution_scale: f32,
    texel: [f32; 2],
}

impl DofUniform {
    pub fn new(settings: &DepthOfField, projection: &Projection, viewport: [u32; 2]) -> Self {
        let [width, height] = [viewport[0].max(1) as f32, viewport[1].max(1) as f32];
        Self {
            focus_distance: settings.focus_distance,
            focal_length: settings.focal_length,
            bokeh_scale: settings.bokeh_scale,
            near: projection.znear(),
            far: projection.zfar(),
            resolution_scale: height / settings.height.max(1) as f32,
            texel: [1.0 / width, 1.0 / height],
        }
    }
}

/// Circle of confusion for a normalized depth, as computed by the shader.
pub fn circle_of_confusion(settings: &DepthOfField, depth: f32) -> f32 {
    let distance = (depth - settings.focus_distance).abs();
    smoothstep(0.0, settings.focal_length, distance)
}

fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

pub struct DepthOfFieldPass {
    settings: DepthOfField,
    pipeline: wgpu::RenderPipeline,
    layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl DepthOfFieldPass {
    pub fn new(
        device: &wgpu::Device,
        settings: &DepthOfField,
        output_format: wgpu::TextureFormat,
        colour: &Texture,
        depth: &Texture,
        projection: &Projection,
        viewport: [u32; 2],
    ) -> Self {
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[
                texture_entry(0),
                sampler_entry(1),
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        multisampled: false,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        sample_type: wgpu::TextureSampleType::Depth,
                    },
                    count: None,
                },
                uniform_entry(3, wgpu::ShaderStages::FRAGMENT),
            ],
            label: Some("dof_bind_group_layout"),
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Depth Of Field Pipeline Layout"),
            bind_group_layouts: &[&layout],
            ..Default::default()
        });
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Depth Of Field Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("depth_of_field.wgsl").into()),
        });
        let pipeline = mk_fullscreen_pipeline(
            device,
            "Depth Of Field Pipeline",
            &pipeline_layout,
            &shader,
            "fs_main",
            output_format,
            None,
        );
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Depth Of Field Buffer"),
            contents: bytemuck::cast_slice(&[DofUniform::new(settings, projection, viewport)]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let sampler = create_clamped_sampler(device);
        let bind_group = mk_bind_group(device, &layout, &sampler, &buffer, colour, depth);
        Self {
            settings: settings.clone(),
            pipeline,
            layout,
            sampler,
            buffer,
            bind_group,
        }
    }

    /// Rebind after the colour and depth targets were recreated.
    pub fn resize(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        colour: &Texture,
        depth: &Texture,
        projection: &Projection,
        viewport: [u32; 2],
    ) {
        queue.write_buffer(
            &self.buffer,
            0,
            bytemuck::cast_slice(&[DofUniform::new(&self.settings, projection, viewport)]),
        );
        self.bind_group = mk_bind_group(device, &self.layout, &self.sampler, &self.buffer, colour, depth);
    }

    pub fn encode(&self, encoder: &mut wgpu::CommandEncoder, target: &wgpu::TextureView) {
        draw_fullscreen(encoder, "Depth Of Field Pass", target, &self.pipeline, &self.bind_group);
    }
}

fn mk_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    sampler: &wgpu::Sampler,
    buffer: &wgpu::Buffer,
    colour: &Texture,
    depth: &Texture,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&colour.view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::TextureView(&depth.view),
            },
            wgpu::BindGroupEntry {
                binding: 3,
                resource: buffer.as_entire_binding(),
            },
        ],
        label: Some("dof_bind_group"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_focus_depth_stays_sharp() {
        let settings = DepthOfField::default();
        assert_eq!(circle_of_confusion(&settings, settings.focus_distance), 0.0);
    }

    #[test]
    fn blur_saturates_past_the_focal_length() {
        let settings = DepthOfField::default();
        let far_away = settings.focus_distance + settings.focal_length * 2.0;
        assert_eq!(circle_of_confusion(&settings, far_away), 1.0);
        let halfway = settings.focus_distance + settings.focal_length / 2.0;
        assert!((circle_of_confusion(&settings, halfway) - 0.5).abs() < 1e-5);
    }

    #[test]
    fn bokeh_scales_with_viewport_height() {
        let projection = Projection::new(960, 960, cgmath::Deg(75.0), 0.1, 1000.0);
        let uniform = DofUniform::new(&DepthOfField::default(), &projection, [960, 960]);
        assert_eq!(uniform.resolution_scale, 2.0);
        assert_eq!(uniform.near, 0.1);
        assert_eq!(std::mem::size_of::<DofUniform>(), 32);
    }
}
