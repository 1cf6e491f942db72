/// View-frustum corner reconstruction for visualizing the virtual camera
use nalgebra::{Matrix4, Point3, Vector3, Vector4};

use crate::camera::VirtualCamera;
use crate::transform::perspective_divide;

/// NDC x/y of the plane corners, counter-clockwise from bottom-left
const NDC_QUAD: [(f32, f32); 4] = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)];

/// The eight NDC cube corners: near plane (z = -1) first, then far (z = +1)
pub fn ndc_corners() -> [Point3<f32>; 8] {
    let mut corners = [Point3::origin(); 8];
    for (i, (x, y)) in NDC_QUAD.iter().enumerate() {
        corners[i] = Point3::new(*x, *y, -1.0);
        corners[i + 4] = Point3::new(*x, *y, 1.0);
    }
    corners
}

/// Near and far plane corners, both in the same order as [`ndc_corners`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frustum {
    pub near: [Point3<f32>; 4],
    pub far: [Point3<f32>; 4],
}

impl Frustum {
    /// Unproject the NDC cube through `inverse(projection)`; view-space result.
    ///
    /// `None` if the projection is singular.
    pub fn from_inverse_projection(projection: &Matrix4<f32>) -> Option<Self> {
        let inverse = projection.try_inverse()?;
        let corners = ndc_corners();
        let mut unprojected = [Point3::origin(); 8];
        for (out, ndc) in unprojected.iter_mut().zip(corners.iter()) {
            let clip: Vector4<f32> = inverse * ndc.to_homogeneous();
            *out = perspective_divide(&clip)?;
        }

        Some(Self {
            near: [unprojected[0], unprojected[1], unprojected[2], unprojected[3]],
            far: [unprojected[4], unprojected[5], unprojected[6], unprojected[7]],
        })
    }

    /// Build the world-space frustum from FOV, aspect and plane distances
    pub fn from_camera(camera: &VirtualCamera) -> Self {
        let axes = camera.basis_axes();
        let half_angle = 0.5 * camera.fov_y_degrees().to_radians();
        let eye = camera.eye();

        let plane = |distance: f32| {
            let half_height = distance * half_angle.tan();
            let half_width = half_height * camera.aspect();
            let center = eye - axes.n * distance;
            NDC_QUAD.map(|(x, y)| center + axes.u * (x * half_width) + axes.v * (y * half_height))
        };

        Self {
            near: plane(camera.near()),
            far: plane(camera.far()),
        }
    }

    /// Pull the far corners toward `apex` by `factor`
    pub fn with_far_inset(mut self, apex: &Point3<f32>, factor: f32) -> Self {
        for corner in self.far.iter_mut() {
            *corner = apex + (*corner - apex) * factor;
        }
        self
    }

    pub fn far_center(&self) -> Point3<f32> {
        let sum = self.far.iter().fold(Vector3::zeros(), |acc, p| acc + p.coords);
        Point3::from(sum / 4.0)
    }

    /// Near quad, far quad, then the four near-to-far connectors
    pub fn edges(&self) -> [(Point3<f32>, Point3<f32>); 12] {
        let mut edges = [(Point3::origin(), Point3::origin()); 12];
        for i in 0..4 {
            let next = (i + 1) % 4;
            edges[i] = (self.near[i], self.near[next]);
            edges[i + 4] = (self.far[i], self.far[next]);
            edges[i + 8] = (self.near[i], self.far[i]);
        }
        edges
    }
}
