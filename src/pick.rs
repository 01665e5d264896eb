//! Object picking by ray casting.
//!
//! A click is resolved entirely on the CPU against the loaded scene graph:
//! 1. The click position is normalized to device coordinates (y flipped, since
//!    screen coordinates grow downwards)
//! 2. A ray is shot from the camera through that point on the near plane
//! 3. Every mesh below the model root is intersected, bounding spheres first
//! 4. Hits are ordered by distance and the nearest one decides: if its node is a
//!    button, its name is returned
//!
//! Only the nearest hit counts, so a non-button surface in front of a button
//! swallows the click.

use cgmath::{InnerSpace, Point2, Point3, Vector3};

use crate::{
    camera::{Camera, Projection},
    data_structures::scene_graph::{BoundingSphere, SceneNode},
    listener::ClickEvent,
};

/// Node names starting with this prefix are interactive buttons.
pub const BUTTON_PREFIX: &str = "button";

/// Determinant threshold below which a ray counts as parallel to a triangle.
const PARALLEL_EPSILON: f32 = 1e-8;

/// Viewport pixel coordinates to normalized device coordinates in `[-1, 1]`.
pub fn ndc(x: f64, y: f64, width: u32, height: u32) -> Point2<f32> {
    let width = f64::from(width.max(1));
    let height = f64::from(height.max(1));
    Point2::new(
        ((x / width) * 2.0 - 1.0) as f32,
        (-(y / height) * 2.0 + 1.0) as f32,
    )
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    pub origin: Point3<f32>,
    /// Unit length.
    pub direction: Vector3<f32>,
}

impl Ray {
    /// Ray from the camera position through `ndc` on the near plane.
    pub fn from_camera(ndc: Point2<f32>, camera: &Camera, projection: &Projection) -> Option<Self> {
        let on_near_plane = projection.unproject(camera, Vector3::new(ndc.x, ndc.y, -1.0))?;
        let direction = on_near_plane - camera.position;
        if direction.magnitude2() == 0.0 {
            return None;
        }
        Some(Self {
            origin: camera.position,
            direction: direction.normalize(),
        })
    }

    pub fn at(&self, distance: f32) -> Point3<f32> {
        self.origin + self.direction * distance
    }

    pub fn hits_sphere(&self, sphere: &BoundingSphere) -> bool {
        let to_center = sphere.center - self.origin;
        let along = to_center.dot(self.direction);
        let distance2 = to_center.magnitude2() - along * along;
        let radius2 = sphere.radius * sphere.radius;
        if distance2 > radius2 {
            return false;
        }
        // the sphere may still lie entirely behind the origin
        let half_chord = (radius2 - distance2).sqrt();
        along + half_chord >= 0.0
    }

    /// Möller–Trumbore. Returns the distance along the ray, if any.
    pub fn intersect_triangle(
        &self,
        a: Point3<f32>,
        b: Point3<f32>,
        c: Point3<f32>,
        cull_back_faces: bool,
    ) -> Option<f32> {
        let edge1 = b - a;
        let edge2 = c - a;
        let p = self.direction.cross(edge2);
        let det = edge1.dot(p);
        if cull_back_faces {
            if det < PARALLEL_EPSILON {
                return None;
            }
        } else if det.abs() < PARALLEL_EPSILON {
            return None;
        }
        let inv_det = 1.0 / det;
        let t_vec = self.origin - a;
        let u = t_vec.dot(p) * inv_det;
        if !(0.0..=1.0).contains(&u) {
            return None;
        }
        let q = t_vec.cross(edge1);
        let v = self.direction.dot(q) * inv_det;
        if v < 0.0 || u + v > 1.0 {
            return None;
        }
        let t = edge2.dot(q) * inv_det;
        (t >= 0.0).then_some(t)
    }
}

/// One ray/mesh intersection.
#[derive(Clone, Debug, PartialEq)]
pub struct Hit {
    pub node: String,
    pub distance: f32,
    pub point: Point3<f32>,
}

/// Intersect `ray` with every descendant of `root`, nearest hit first.
///
/// The sort is stable: hits at exactly the same distance stay in traversal order.
pub fn intersect(ray: &Ray, root: &SceneNode) -> Vec<Hit> {
    let mut hits = Vec::new();
    root.visit_descendants(&mut |node, world| {
        for mesh in &node.meshes {
            if !ray.hits_sphere(&mesh.bounds.transformed(world)) {
                continue;
            }
            let cull = !mesh.material.double_sided;
            // a mirroring transform flips the winding order
            let mirrored = world.is_mirrored();
            let nearest = mesh
                .triangles()
                .filter_map(|[i0, i1, i2]| {
                    let a = world.transform_point(*mesh.positions.get(i0)?);
                    let b = world.transform_point(*mesh.positions.get(i1)?);
                    let c = world.transform_point(*mesh.positions.get(i2)?);
                    if mirrored {
                        ray.intersect_triangle(a, c, b, cull)
                    } else {
                        ray.intersect_triangle(a, b, c, cull)
                    }
                })
                .fold(None, |nearest: Option<f32>, t| match nearest {
                    Some(n) if n <= t => Some(n),
                    _ => Some(t),
                });
            if let Some(distance) = nearest {
                hits.push(Hit {
                    node: node.name.clone(),
                    distance,
                    point: ray.at(distance),
                });
            }
        }
    });
    hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    hits
}

/// Resolve a click to the name of the button under the cursor, if any.
pub fn resolve_button(
    click: &ClickEvent,
    camera: &Camera,
    projection: &Projection,
    root: &SceneNode,
) -> Option<String> {
    let ndc = ndc(click.x, click.y, click.width, click.height);
    let ray = Ray::from_camera(ndc, camera, projection)?;
    let nearest = intersect(&ray, root).into_iter().next();
    match nearest {
        Some(hit) if hit.node.starts_with(BUTTON_PREFIX) => Some(hit.node),
        Some(hit) => {
            log::debug!("Click hit {:?} which is not a button", hit.node);
            None
        }
        None => {
            log::debug!("Click at ({}, {}) hit nothing", click.x, click.y);
            None
        }
    }
}
