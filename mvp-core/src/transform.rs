/// Model transform builders and homogeneous point helpers
use nalgebra::{Matrix4, Point3, Vector3, Vector4};

/// Determinants with a smaller magnitude than this are treated as singular
const SINGULAR_EPSILON: f32 = 1e-6;

/// Transform builder for 3D transformations
pub struct Transform;

impl Transform {
    /// Create a translation matrix
    pub fn translation(x: f32, y: f32, z: f32) -> Matrix4<f32> {
        Matrix4::new_translation(&Vector3::new(x, y, z))
    }

    pub fn rotation_y_degrees(degrees: f32) -> Matrix4<f32> {
        Matrix4::new_rotation(Vector3::new(0.0, degrees.to_radians(), 0.0))
    }

    pub fn rotation_z_degrees(degrees: f32) -> Matrix4<f32> {
        Matrix4::new_rotation(Vector3::new(0.0, 0.0, degrees.to_radians()))
    }

    /// Move a model by `delta` along the world axes
    pub fn translate_world(model: &Matrix4<f32>, delta: &Vector3<f32>) -> Matrix4<f32> {
        Matrix4::new_translation(delta) * model
    }

    pub fn is_invertible(matrix: &Matrix4<f32>) -> bool {
        let det = matrix.determinant();
        det.is_finite() && det.abs() > SINGULAR_EPSILON
    }
}

/// Transform a point and keep the homogeneous `w` (no divide)
pub fn to_clip(matrix: &Matrix4<f32>, point: &Point3<f32>) -> Vector4<f32> {
    matrix * point.to_homogeneous()
}

/// Perspective divide; `None` when `w` is too close to zero to divide by
pub fn perspective_divide(clip: &Vector4<f32>) -> Option<Point3<f32>> {
    if clip.w.abs() < 1e-6 {
        return None;
    }
    Some(Point3::new(clip.x / clip.w, clip.y / clip.w, clip.z / clip.w))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_translate_world_moves_along_world_axes() {
        let rotated = Transform::rotation_y_degrees(90.0) * Transform::translation(1.0, 0.0, 0.0);
        let moved = Transform::translate_world(&rotated, &Vector3::new(0.0, 0.0, 2.0));
        let origin = moved.transform_point(&Point3::origin());
        let before = rotated.transform_point(&Point3::origin());
        assert_relative_eq!(origin - before, Vector3::new(0.0, 0.0, 2.0), epsilon = 1e-5);
    }

    #[test]
    fn test_singular_scale_is_not_invertible() {
        assert!(Transform::is_invertible(&Transform::translation(3.0, 1.0, 2.0)));
        let flattened = Matrix4::new_nonuniform_scaling(&Vector3::new(1.0, 0.0, 1.0));
        assert!(!Transform::is_invertible(&flattened));
    }

    #[test]
    fn test_perspective_divide_rejects_zero_w() {
        assert!(perspective_divide(&Vector4::new(1.0, 1.0, 1.0, 0.0)).is_none());
        let p = perspective_divide(&Vector4::new(2.0, 4.0, 6.0, 2.0)).unwrap();
        assert_relative_eq!(p, Point3::new(1.0, 2.0, 3.0));
    }
}
