//! Node transforms.
//!
//! A scene node's local transform is stored decomposed (translation, rotation,
//! scale), the same way glTF stores it. World transforms are full matrices:
//! a parent with non-uniform scale and a rotated child compose into a shear,
//! which no decomposed form can represent.

use cgmath::{InnerSpace, Matrix, One, SquareMatrix, Transform};

/// Translation, rotation (as quaternion) and scale of a node.
#[derive(Clone, Debug, PartialEq)]
pub struct Instance {
    pub position: cgmath::Vector3<f32>,
    pub rotation: cgmath::Quaternion<f32>,
    pub scale: cgmath::Vector3<f32>,
}

impl Instance {
    /// Create a new instance with identity transformation (no move, rotate, or scale).
    pub fn new() -> Self {
        Self {
            position: cgmath::Vector3::new(0.0, 0.0, 0.0),
            // `Quaternion::one()` is the identity quaternion (no rotation)
            rotation: cgmath::Quaternion::one(),
            scale: cgmath::Vector3::new(1.0, 1.0, 1.0),
        }
    }

    pub fn uniform(position: cgmath::Vector3<f32>, scale: f32) -> Self {
        Self {
            position,
            scale: cgmath::Vector3::new(scale, scale, scale),
            ..Self::new()
        }
    }

    /// glTF decomposed form: translation, rotation as `[x, y, z, w]`, scale.
    pub fn from_decomposed(
        (translation, rotation, scale): ([f32; 3], [f32; 4], [f32; 3]),
    ) -> Self {
        Self {
            position: translation.into(),
            rotation: cgmath::Quaternion::new(rotation[3], rotation[0], rotation[1], rotation[2]),
            scale: scale.into(),
        }
    }

    /// `T * R * S`, the glTF order.
    pub fn to_matrix(&self) -> cgmath::Matrix4<f32> {
        cgmath::Matrix4::from_translation(self.position)
            * cgmath::Matrix4::from(self.rotation)
            * cgmath::Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }
}

impl From<cgmath::Vector3<f32>> for Instance {
    fn from(position: cgmath::Vector3<f32>) -> Self {
        Instance {
            position,
            ..Default::default()
        }
    }
}

impl Default for Instance {
    fn default() -> Self {
        Self::new()
    }
}

/// Accumulated transform from a node's local space to world space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WorldTransform {
    matrix: cgmath::Matrix4<f32>,
}

impl WorldTransform {
    pub fn identity() -> Self {
        Self {
            matrix: cgmath::Matrix4::identity(),
        }
    }

    /// World transform of a child with transform `local` below `self`.
    pub fn then(&self, local: &Instance) -> Self {
        Self {
            matrix: self.matrix * local.to_matrix(),
        }
    }

    pub fn matrix(&self) -> &cgmath::Matrix4<f32> {
        &self.matrix
    }

    pub fn translation(&self) -> cgmath::Vector3<f32> {
        self.matrix.w.truncate()
    }

    pub fn transform_point(&self, point: [f32; 3]) -> cgmath::Point3<f32> {
        self.matrix.transform_point(cgmath::Point3::from(point))
    }

    /// Transform a normal with the inverse transpose of the linear part.
    pub fn transform_normal(&self, normal: [f32; 3]) -> cgmath::Vector3<f32> {
        let normal: cgmath::Vector3<f32> = normal.into();
        let Some(inverse) = self.linear().invert() else {
            return normal;
        };
        let transformed = inverse.transpose() * normal;
        if transformed.magnitude2() > 0.0 {
            transformed.normalize()
        } else {
            transformed
        }
    }

    /// A mirroring transform flips triangle winding.
    pub fn is_mirrored(&self) -> bool {
        self.matrix.determinant() < 0.0
    }

    /// Upper bound of how much the transform stretches any length: the
    /// longest basis vector.
    pub fn max_scale(&self) -> f32 {
        let linear = self.linear();
        linear
            .x
            .magnitude()
            .max(linear.y.magnitude())
            .max(linear.z.magnitude())
    }

    fn linear(&self) -> cgmath::Matrix3<f32> {
        cgmath::Matrix3::from_cols(
            self.matrix.x.truncate(),
            self.matrix.y.truncate(),
            self.matrix.z.truncate(),
        )
    }
}

impl Default for WorldTransform {
    fn default() -> Self {
        Self::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{Deg, Rotation3, Vector3};

    fn assert_close(actual: cgmath::Point3<f32>, expected: [f32; 3]) {
        let expected = cgmath::Point3::from(expected);
        assert!(
            (actual - expected).magnitude() < 1e-5,
            "{:?} != {:?}",
            actual,
            expected
        );
    }

    #[test]
    fn parent_scale_applies_to_child_offset() {
        let parent = Instance::uniform([0.0, 0.0, 0.0].into(), 1.5);
        let child = Instance::from(Vector3::new(0.0, 0.0, -1.0));
        let world = WorldTransform::identity().then(&parent).then(&child);
        assert_eq!(world.translation(), Vector3::new(0.0, 0.0, -1.5));
        assert!((world.max_scale() - 1.5).abs() < 1e-6);
    }

    #[test]
    fn rotated_child_under_stretched_parent_is_sheared() {
        let body = Instance {
            scale: [1.0, 3.0, 1.0].into(),
            ..Instance::new()
        };
        let key = Instance {
            rotation: cgmath::Quaternion::from_angle_z(Deg(90.0)),
            ..Instance::new()
        };
        let world = WorldTransform::identity().then(&body).then(&key);

        // rotated first, then stretched along y by the parent
        assert_close(world.transform_point([1.0, -0.1, 0.0]), [0.1, 3.0, 0.0]);
        assert_close(world.transform_point([-1.0, 0.1, 0.0]), [-0.1, -3.0, 0.0]);
        assert!((world.max_scale() - 3.0).abs() < 1e-5);
    }

    #[test]
    fn negative_scale_mirrors() {
        let mirrored = WorldTransform::identity().then(&Instance {
            scale: [-1.0, 1.0, 1.0].into(),
            ..Instance::new()
        });
        assert!(mirrored.is_mirrored());
        assert!(!WorldTransform::identity().is_mirrored());
    }

    #[test]
    fn normals_use_the_inverse_transpose() {
        let squashed = WorldTransform::identity().then(&Instance {
            scale: [2.0, 1.0, 1.0].into(),
            ..Instance::new()
        });
        // the diagonal of a unit square stretched to 2x1
        let normal = squashed.transform_normal([
            std::f32::consts::FRAC_1_SQRT_2,
            std::f32::consts::FRAC_1_SQRT_2,
            0.0,
        ]);
        let edge = Vector3::new(-2.0, 1.0, 0.0);
        assert!(normal.dot(edge).abs() < 1e-5);
        assert!((normal.magnitude() - 1.0).abs() < 1e-5);
    }
}
