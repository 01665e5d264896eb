//! GPU-side model data.
//!
//! The calculator never moves once mounted, so world transforms are baked into
//! the vertex data at upload time and each mesh only carries its material.

use wgpu::util::DeviceExt;

use crate::data_structures::scene_graph::{Material, SceneNode};

pub trait Vertex {
    fn desc() -> wgpu::VertexBufferLayout<'static>;
}

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

impl Vertex for ModelVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<ModelVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MaterialUniform {
    base_colour: [f32; 4],
    // w is unused, uniforms are laid out in 16 byte rows
    emissive: [f32; 4],
}

impl From<&Material> for MaterialUniform {
    fn from(material: &Material) -> Self {
        let [r, g, b] = material.emissive;
        Self {
            base_colour: material.base_colour,
            emissive: [r, g, b, 0.0],
        }
    }
}

pub struct Mesh {
    pub name: String,
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub num_elements: u32,
    pub material: wgpu::BindGroup,
}

pub struct Model {
    pub meshes: Vec<Mesh>,
}

impl Model {
    /// Upload every mesh of `root` (including the root itself) in world space.
    pub fn from_scene(
        device: &wgpu::Device,
        root: &SceneNode,
        material_layout: &wgpu::BindGroupLayout,
    ) -> Self {
        let mut meshes = Vec::new();
        root.visit_all(&mut |node, world| {
            for mesh in &node.meshes {
                if mesh.indices.is_empty() {
                    continue;
                }
                let vertices: Vec<ModelVertex> = mesh
                    .positions
                    .iter()
                    .zip(&mesh.normals)
                    .map(|(position, normal)| ModelVertex {
                        position: world.transform_point(*position).into(),
                        normal: world.transform_normal(*normal).into(),
                    })
                    .collect();

                let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&format!("{:?} Vertex Buffer", node.name)),
                    contents: bytemuck::cast_slice(&vertices),
                    usage: wgpu::BufferUsages::VERTEX,
                });
                let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&format!("{:?} Index Buffer", node.name)),
                    contents: bytemuck::cast_slice(&mesh.indices),
                    usage: wgpu::BufferUsages::INDEX,
                });
                let material_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&format!("{:?} Material Buffer", node.name)),
                    contents: bytemuck::cast_slice(&[MaterialUniform::from(&mesh.material)]),
                    usage: wgpu::BufferUsages::UNIFORM,
                });
                let material = device.create_bind_group(&wgpu::BindGroupDescriptor {
                    layout: material_layout,
                    entries: &[wgpu::BindGroupEntry {
                        binding: 0,
                        resource: material_buffer.as_entire_binding(),
                    }],
                    label: Some("material_bind_group"),
                });

                meshes.push(Mesh {
                    name: node.name.clone(),
                    vertex_buffer,
                    index_buffer,
                    num_elements: mesh.indices.len() as u32,
                    material,
                });
            }
        });
        Self { meshes }
    }
}

pub trait DrawModel {
    fn draw_mesh(&mut self, mesh: &Mesh);
    fn draw_model(&mut self, model: &Model);
}

impl DrawModel for wgpu::RenderPass<'_> {
    fn draw_mesh(&mut self, mesh: &Mesh) {
        self.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
        self.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        self.set_bind_group(2, &mesh.material, &[]);
        self.draw_indexed(0..mesh.num_elements, 0, 0..1);
    }

    fn draw_model(&mut self, model: &Model) {
        for mesh in &model.meshes {
            self.draw_mesh(mesh);
        }
    }
}
