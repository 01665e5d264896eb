//! Scene graph and hierarchical scene organization.
//!
//! A [`SceneNode`] is a named element of the loaded model: a local transform,
//! zero or more meshes and child nodes. The tree is plain CPU data so that it
//! can be built off the render thread, intersected by the pick resolver and
//! uploaded to the GPU once it arrives on the event loop.

use cgmath::{EuclideanSpace, InnerSpace, MetricSpace};

use crate::data_structures::instance::{Instance, WorldTransform};

/// Sphere enclosing a mesh, used to skip meshes a ray cannot hit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingSphere {
    pub center: cgmath::Point3<f32>,
    pub radius: f32,
}

impl BoundingSphere {
    /// Centre of the axis aligned box around `positions`, radius to the farthest point.
    pub fn from_positions(positions: &[[f32; 3]]) -> Self {
        if positions.is_empty() {
            return Self {
                center: cgmath::Point3::origin(),
                radius: 0.0,
            };
        }
        let mut min = cgmath::Vector3::new(f32::MAX, f32::MAX, f32::MAX);
        let mut max = cgmath::Vector3::new(f32::MIN, f32::MIN, f32::MIN);
        for p in positions {
            min.x = min.x.min(p[0]);
            min.y = min.y.min(p[1]);
            min.z = min.z.min(p[2]);
            max.x = max.x.max(p[0]);
            max.y = max.y.max(p[1]);
            max.z = max.z.max(p[2]);
        }
        let center = cgmath::Point3::from_vec((min + max) * 0.5);
        let radius = positions
            .iter()
            .map(|p| center.distance(cgmath::Point3::from(*p)))
            .fold(0.0, f32::max);
        Self { center, radius }
    }

    pub fn transformed(&self, world: &WorldTransform) -> Self {
        Self {
            center: world.transform_point(self.center.into()),
            radius: self.radius * world.max_scale(),
        }
    }
}

/// Surface parameters taken from the glTF material of a primitive.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Material {
    pub base_colour: [f32; 4],
    pub emissive: [f32; 3],
    pub double_sided: bool,
}

impl Default for Material {
    fn default() -> Self {
        // glTF default material: white, not emissive, single sided
        Self {
            base_colour: [1.0, 1.0, 1.0, 1.0],
            emissive: [0.0, 0.0, 0.0],
            double_sided: false,
        }
    }
}

/// Triangle geometry of one glTF primitive, in the owning node's local space.
#[derive(Clone, Debug)]
pub struct MeshData {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
    pub material: Material,
    pub bounds: BoundingSphere,
}

impl MeshData {
    /// Build a mesh, computing flat normals when the asset has none.
    pub fn new(
        positions: Vec<[f32; 3]>,
        normals: Option<Vec<[f32; 3]>>,
        indices: Option<Vec<u32>>,
        material: Material,
    ) -> Self {
        let indices = indices.unwrap_or_else(|| (0..positions.len() as u32).collect());
        let normals = match normals {
            Some(normals) if normals.len() == positions.len() => normals,
            _ => face_normals(&positions, &indices),
        };
        let bounds = BoundingSphere::from_positions(&positions);
        Self {
            positions,
            normals,
            indices,
            material,
            bounds,
        }
    }

    /// Triangles as index triples. A trailing partial triangle is ignored.
    pub fn triangles(&self) -> impl Iterator<Item = [usize; 3]> + '_ {
        self.indices
            .chunks_exact(3)
            .map(|c| [c[0] as usize, c[1] as usize, c[2] as usize])
    }
}

/// Per-vertex normals accumulated from the faces each vertex belongs to.
fn face_normals(positions: &[[f32; 3]], indices: &[u32]) -> Vec<[f32; 3]> {
    let mut normals = vec![cgmath::Vector3::new(0.0f32, 0.0, 0.0); positions.len()];
    for c in indices.chunks_exact(3) {
        let [a, b, c] = [c[0] as usize, c[1] as usize, c[2] as usize];
        if a >= positions.len() || b >= positions.len() || c >= positions.len() {
            continue;
        }
        let p0: cgmath::Vector3<f32> = positions[a].into();
        let p1: cgmath::Vector3<f32> = positions[b].into();
        let p2: cgmath::Vector3<f32> = positions[c].into();
        let face = (p1 - p0).cross(p2 - p0);
        normals[a] += face;
        normals[b] += face;
        normals[c] += face;
    }
    normals
        .into_iter()
        .map(|n| {
            if n.magnitude2() > 0.0 {
                n.normalize().into()
            } else {
                [0.0, 0.0, 1.0]
            }
        })
        .collect()
}

/// A named node of the loaded model.
#[derive(Clone, Debug, Default)]
pub struct SceneNode {
    pub name: String,
    pub local: Instance,
    pub meshes: Vec<MeshData>,
    pub children: Vec<SceneNode>,
}

impl SceneNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_local(mut self, local: Instance) -> Self {
        self.local = local;
        self
    }

    pub fn add_child(&mut self, child: SceneNode) {
        self.children.push(child);
    }

    /// Depth-first pre-order walk over all descendants (not `self`), handing out
    /// each node together with its world transform.
    pub fn visit_descendants<'a>(&'a self, visit: &mut impl FnMut(&'a SceneNode, &WorldTransform)) {
        let world = WorldTransform::identity().then(&self.local);
        for child in &self.children {
            child.visit(&world, visit);
        }
    }

    /// Like [`Self::visit_descendants`] but includes `self`.
    pub fn visit_all<'a>(&'a self, visit: &mut impl FnMut(&'a SceneNode, &WorldTransform)) {
        self.visit(&WorldTransform::identity(), visit);
    }

    fn visit<'a>(
        &'a self,
        parent: &WorldTransform,
        visit: &mut impl FnMut(&'a SceneNode, &WorldTransform),
    ) {
        let world = parent.then(&self.local);
        visit(self, &world);
        for child in &self.children {
            child.visit(&world, visit);
        }
    }

    /// Find a node by name anywhere in the tree.
    pub fn find(&self, name: &str) -> Option<&SceneNode> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(name))
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len() + self.children.iter().map(SceneNode::mesh_count).sum::<usize>()
    }
}
