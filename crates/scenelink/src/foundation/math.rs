//! Math utilities and types
//!
//! Provides the fundamental math types used by the scene and render layers:
//! vector/matrix aliases over nalgebra, a TRS transform, axis-aligned
//! bounding boxes, and triangle faces for geometry extraction.

pub use nalgebra::{Matrix3, Matrix4, Quaternion, Unit, Vector2, Vector3, Vector4};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Quaternion type for rotations
pub type Quat = Unit<Quaternion<f32>>;

/// Transform representing position, rotation, and scale
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    /// Position in 3D space
    pub position: Vec3,

    /// Rotation quaternion
    pub rotation: Quat,

    /// Scale factors
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    /// Create a new identity transform
    pub fn identity() -> Self {
        Self::default()
    }

    /// Create a transform with only position
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Create a transform with position and rotation
    pub fn from_position_rotation(position: Vec3, rotation: Quat) -> Self {
        Self {
            position,
            rotation,
            ..Default::default()
        }
    }

    /// Convert to a transformation matrix
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::new_translation(&self.position)
            * self.rotation.to_homogeneous()
            * Mat4::new_nonuniform_scaling(&self.scale)
    }

    /// Apply this transform to a point
    pub fn transform_point(&self, point: Point3) -> Point3 {
        let matrix = self.to_matrix();
        matrix.transform_point(&point)
    }

    /// Combine this transform with another (self is the parent)
    pub fn combine(&self, other: &Transform) -> Transform {
        Transform {
            position: self.position + self.rotation * (self.scale.component_mul(&other.position)),
            rotation: self.rotation * other.rotation,
            scale: self.scale.component_mul(&other.scale),
        }
    }
}

/// Axis-Aligned Bounding Box
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Aabb {
    /// Minimum corner of the bounding box
    pub min: Vec3,
    /// Maximum corner of the bounding box
    pub max: Vec3,
}

impl Aabb {
    /// Create a new AABB from min and max points
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Create an AABB centered at a point with given extents
    pub fn from_center_extents(center: Vec3, extents: Vec3) -> Self {
        Self::new(center - extents, center + extents)
    }

    /// AABB enclosing a set of points; `None` if the set is empty
    pub fn from_points(points: &[Point3]) -> Option<Self> {
        let first = points.first()?;
        let mut min = first.coords;
        let mut max = first.coords;
        for p in &points[1..] {
            min = min.inf(&p.coords);
            max = max.sup(&p.coords);
        }
        Some(Self::new(min, max))
    }

    /// Get the center of the AABB
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Get the extents (half-size) of the AABB
    pub fn extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Smallest AABB containing this box after applying a matrix
    ///
    /// Transforms all eight corners and re-fits, so the result is
    /// conservative under rotation.
    pub fn transformed(&self, matrix: &Mat4) -> Self {
        let mut out_min = Vec3::new(f32::INFINITY, f32::INFINITY, f32::INFINITY);
        let mut out_max = -out_min;
        for i in 0..8 {
            let corner = Point3::new(
                if i & 1 == 0 { self.min.x } else { self.max.x },
                if i & 2 == 0 { self.min.y } else { self.max.y },
                if i & 4 == 0 { self.min.z } else { self.max.z },
            );
            let p = matrix.transform_point(&corner);
            out_min = out_min.inf(&p.coords);
            out_max = out_max.sup(&p.coords);
        }
        Self::new(out_min, out_max)
    }
}

/// Triangle face in local or world space
///
/// Produced by geometry extraction for physics and occlusion tooling;
/// per-frame rendering never touches these.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    /// The three corners, counter-clockwise winding
    pub vertices: [Point3; 3],
}

impl Triangle {
    /// Create a triangle from three points
    pub fn new(a: Point3, b: Point3, c: Point3) -> Self {
        Self {
            vertices: [a, b, c],
        }
    }

    /// Geometric (non-normalized) face normal
    pub fn normal(&self) -> Vec3 {
        let [a, b, c] = self.vertices;
        (b - a).cross(&(c - a))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const EPSILON: f32 = 1e-5;

    #[test]
    fn test_aabb_center_extents() {
        let aabb = Aabb::new(Vec3::new(-1.0, -2.0, -3.0), Vec3::new(1.0, 2.0, 3.0));

        assert_relative_eq!(aabb.center(), Vec3::zeros(), epsilon = EPSILON);
        assert_relative_eq!(aabb.extents(), Vec3::new(1.0, 2.0, 3.0), epsilon = EPSILON);
    }

    #[test]
    fn test_aabb_from_points() {
        let points = [
            Point3::new(1.0, 0.0, -1.0),
            Point3::new(-2.0, 3.0, 0.5),
            Point3::new(0.0, -1.0, 2.0),
        ];
        let aabb = Aabb::from_points(&points).unwrap();

        assert_relative_eq!(aabb.min, Vec3::new(-2.0, -1.0, -1.0), epsilon = EPSILON);
        assert_relative_eq!(aabb.max, Vec3::new(1.0, 3.0, 2.0), epsilon = EPSILON);

        assert!(Aabb::from_points(&[]).is_none());
    }

    #[test]
    fn test_aabb_transformed_translation() {
        let aabb = Aabb::from_center_extents(Vec3::zeros(), Vec3::new(1.0, 1.0, 1.0));
        let moved = aabb.transformed(&Mat4::new_translation(&Vec3::new(5.0, 0.0, 0.0)));

        assert_relative_eq!(moved.center(), Vec3::new(5.0, 0.0, 0.0), epsilon = EPSILON);
        assert_relative_eq!(moved.extents(), Vec3::new(1.0, 1.0, 1.0), epsilon = EPSILON);
    }

    #[test]
    fn test_aabb_transformed_rotation_is_conservative() {
        // 45 degrees around Z stretches the XY footprint to sqrt(2)
        let aabb = Aabb::from_center_extents(Vec3::zeros(), Vec3::new(1.0, 1.0, 1.0));
        let rot = Quat::from_axis_angle(&Vec3::z_axis(), std::f32::consts::FRAC_PI_4);
        let rotated = aabb.transformed(&rot.to_homogeneous());

        let expected = 2.0_f32.sqrt();
        assert_relative_eq!(rotated.extents().x, expected, epsilon = EPSILON);
        assert_relative_eq!(rotated.extents().y, expected, epsilon = EPSILON);
        assert_relative_eq!(rotated.extents().z, 1.0, epsilon = EPSILON);
    }

    #[test]
    fn test_transform_combine_matches_matrix_product() {
        let parent = Transform::from_position(Vec3::new(1.0, 2.0, 3.0));
        let child = Transform::from_position_rotation(
            Vec3::new(0.0, 1.0, 0.0),
            Quat::from_axis_angle(&Vec3::y_axis(), 0.7),
        );

        let combined = parent.combine(&child);
        let expected = parent.to_matrix() * child.to_matrix();
        assert_relative_eq!(combined.to_matrix(), expected, epsilon = EPSILON);
    }

    #[test]
    fn test_triangle_normal() {
        let tri = Triangle::new(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        );
        assert_relative_eq!(tri.normal().normalize(), Vec3::z(), epsilon = EPSILON);
    }
}
