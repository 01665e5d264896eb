use cgmath::InnerSpace;
use wgpu::util::DeviceExt;

use crate::{
    pipelines::uniform_entry,
    scene::{Fog, Lights, PointLight},
};

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PointLightRaw {
    position: [f32; 4],
    // linear colour premultiplied with the intensity
    colour: [f32; 4],
}

impl From<&PointLight> for PointLightRaw {
    fn from(light: &PointLight) -> Self {
        let [x, y, z] = light.position;
        Self {
            position: [x, y, z, 1.0],
            colour: radiance(&light.colour, light.intensity),
        }
    }
}

/// All lights of the scene. Vectors are padded to 16 bytes as uniforms require.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightUniform {
    ambient: [f32; 4],
    /// Unit vector from the surface towards the directional light.
    directional_direction: [f32; 4],
    directional_colour: [f32; 4],
    points: [PointLightRaw; 3],
}

impl From<&Lights> for LightUniform {
    fn from(lights: &Lights) -> Self {
        let directional = &lights.directional;
        let towards: cgmath::Vector3<f32> = cgmath::Vector3::from(directional.position)
            - cgmath::Vector3::from(directional.target);
        let towards = if towards.magnitude2() > 0.0 {
            towards.normalize()
        } else {
            cgmath::Vector3::unit_y()
        };
        Self {
            ambient: radiance(&lights.ambient.colour, lights.ambient.intensity),
            directional_direction: towards.extend(0.0).into(),
            directional_colour: radiance(&directional.colour, directional.intensity),
            points: [
                (&lights.points[0]).into(),
                (&lights.points[1]).into(),
                (&lights.points[2]).into(),
            ],
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct FogUniform {
    colour: [f32; 4],
    near: f32,
    far: f32,
    _padding: [f32; 2],
}

impl From<&Fog> for FogUniform {
    fn from(fog: &Fog) -> Self {
        Self {
            colour: radiance(&fog.colour, 1.0),
            near: fog.near,
            far: fog.far,
            _padding: [0.0; 2],
        }
    }
}

fn radiance(colour: &crate::data_structures::colour::Colour, intensity: f32) -> [f32; 4] {
    let [r, g, b] = colour.to_linear();
    [r * intensity, g * intensity, b * intensity, 1.0]
}

/// Lights and fog, bound together as group 1 of the scene pipeline.
pub struct LightResources {
    pub uniform: LightUniform,
    pub buffer: wgpu::Buffer,
    pub fog: FogUniform,
    pub fog_buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl LightResources {
    pub fn new(device: &wgpu::Device, lights: &Lights, fog: &Fog) -> Self {
        let uniform = LightUniform::from(lights);
        let fog = FogUniform::from(fog);
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Light Buffer"),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let fog_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Fog Buffer"),
            contents: bytemuck::cast_slice(&[fog]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group_layout = mk_bind_group_layout(device);
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: fog_buffer.as_entire_binding(),
                },
            ],
            label: Some("light_bind_group"),
        });
        Self {
            uniform,
            buffer,
            fog,
            fog_buffer,
            bind_group,
            bind_group_layout,
        }
    }
}

pub fn mk_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[
            uniform_entry(0, wgpu::ShaderStages::FRAGMENT),
            uniform_entry(1, wgpu::ShaderStages::FRAGMENT),
        ],
        label: Some("light_bind_group_layout"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_structures::colour::Colour;

    #[test]
    fn directional_light_points_from_the_origin_to_its_position() {
        let uniform = LightUniform::from(&Lights::default());
        let expected = 1.0 / 3.0f32.sqrt();
        for component in &uniform.directional_direction[..3] {
            assert!((component - expected).abs() < 1e-6);
        }
        assert_eq!(uniform.directional_direction[3], 0.0);
    }

    #[test]
    fn intensity_scales_linear_colour() {
        let lights = Lights::default();
        let uniform = LightUniform::from(&lights);
        assert!((uniform.ambient[0] - 0.7).abs() < 1e-6);
        assert!((uniform.points[2].colour[1] - 1.0).abs() < 1e-6);

        let half_grey = PointLight {
            position: [0.0; 3],
            colour: Colour::from_hex("#808080").unwrap(),
            intensity: 2.0,
        };
        let raw = PointLightRaw::from(&half_grey);
        // sRGB 128 is about 0.216 in linear space
        assert!((raw.colour[0] - 0.432).abs() < 0.01);
    }

    #[test]
    fn uniforms_match_shader_layout() {
        assert_eq!(std::mem::size_of::<LightUniform>(), 144);
        assert_eq!(std::mem::size_of::<FogUniform>(), 32);
    }
}
