use crate::data_structures::{
    instance::Instance,
    scene_graph::{Material, MeshData, SceneNode},
};

/**
 * Converts a glTF node (and its subtree) into a [`SceneNode`].
 *
 * Every triangle primitive of the node's mesh becomes one [`MeshData`]. Primitives that
 * are not triangle lists (points, lines, strips) can't be picked the way the calculator
 * buttons are and are skipped.
 */
pub fn to_scene_node(node: gltf::Node, buffers: &[Vec<u8>]) -> SceneNode {
    // unnamed nodes go by their mesh's name, so buttons named only on the mesh stay clickable
    let name = node
        .name()
        .or_else(|| node.mesh().and_then(|mesh| mesh.name()))
        .unwrap_or_default();
    let mut scene_node = SceneNode::new(name)
        .with_local(Instance::from_decomposed(node.transform().decomposed()));

    if let Some(mesh) = node.mesh() {
        for primitive in mesh.primitives() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                log::warn!(
                    "Primitive {} of node {:?} uses {:?} and will be ignored.",
                    primitive.index(),
                    name,
                    primitive.mode()
                );
                continue;
            }
            if let Some(mesh_data) = read_primitive(&primitive, buffers) {
                scene_node.meshes.push(mesh_data);
            }
        }
    }

    for child in node.children() {
        scene_node.add_child(to_scene_node(child, buffers));
    }
    scene_node
}

fn read_primitive(primitive: &gltf::Primitive, buffers: &[Vec<u8>]) -> Option<MeshData> {
    let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(Vec::as_slice));

    let positions: Vec<[f32; 3]> = reader.read_positions()?.collect();
    let normals = reader
        .read_normals()
        .map(|normals| normals.collect::<Vec<[f32; 3]>>());
    let indices = reader
        .read_indices()
        .map(|indices| indices.into_u32().collect::<Vec<u32>>());

    let material = primitive.material();
    let material = Material {
        base_colour: material.pbr_metallic_roughness().base_color_factor(),
        emissive: material.emissive_factor(),
        double_sided: material.double_sided(),
    };

    Some(MeshData::new(positions, normals, indices, material))
}
