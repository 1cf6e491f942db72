/// Geometry primitives for the drawable scene objects
use nalgebra::{Point3, Vector3};

/// A 3D vertex with position and normal
#[derive(Debug, Clone, Copy)]
pub struct Vertex {
    pub position: Point3<f32>,
    pub normal: Vector3<f32>,
}

impl Vertex {
    pub fn new(position: Point3<f32>, normal: Vector3<f32>) -> Self {
        Self { position, normal }
    }
}

/// A triangle face defined by three vertices
#[derive(Debug, Clone)]
pub struct Triangle {
    pub vertices: [Vertex; 3],
}

impl Triangle {
    pub fn new(v0: Vertex, v1: Vertex, v2: Vertex) -> Self {
        Self {
            vertices: [v0, v1, v2],
        }
    }

    /// Calculate the face normal from the triangle's vertices
    pub fn calculate_normal(&self) -> Vector3<f32> {
        let v0 = self.vertices[0].position;
        let v1 = self.vertices[1].position;
        let v2 = self.vertices[2].position;

        (v1 - v0).cross(&(v2 - v0)).normalize()
    }
}

/// A 3D mesh composed of triangles
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub triangles: Vec<Triangle>,
}

impl Mesh {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            triangles: Vec::with_capacity(capacity),
        }
    }

    pub fn add_triangle(&mut self, triangle: Triangle) {
        self.triangles.push(triangle);
    }

    /// Add a quad as two triangles, corners given counter-clockwise
    fn add_quad(&mut self, corners: [Point3<f32>; 4], normal: Vector3<f32>) {
        let v = corners.map(|p| Vertex::new(p, normal));
        self.add_triangle(Triangle::new(v[0], v[1], v[2]));
        self.add_triangle(Triangle::new(v[0], v[2], v[3]));
    }

    /// Axis-aligned box centered at the origin
    pub fn cuboid(width: f32, height: f32, depth: f32) -> Self {
        let (hx, hy, hz) = (width / 2.0, height / 2.0, depth / 2.0);
        let p = |x: f32, y: f32, z: f32| Point3::new(x * hx, y * hy, z * hz);
        let mut mesh = Self::with_capacity(12);

        mesh.add_quad(
            [p(-1., -1., 1.), p(1., -1., 1.), p(1., 1., 1.), p(-1., 1., 1.)],
            Vector3::z(),
        );
        mesh.add_quad(
            [p(1., -1., -1.), p(-1., -1., -1.), p(-1., 1., -1.), p(1., 1., -1.)],
            -Vector3::z(),
        );
        mesh.add_quad(
            [p(-1., 1., 1.), p(1., 1., 1.), p(1., 1., -1.), p(-1., 1., -1.)],
            Vector3::y(),
        );
        mesh.add_quad(
            [p(-1., -1., -1.), p(1., -1., -1.), p(1., -1., 1.), p(-1., -1., 1.)],
            -Vector3::y(),
        );
        mesh.add_quad(
            [p(1., -1., 1.), p(1., -1., -1.), p(1., 1., -1.), p(1., 1., 1.)],
            Vector3::x(),
        );
        mesh.add_quad(
            [p(-1., -1., -1.), p(-1., -1., 1.), p(-1., 1., 1.), p(-1., 1., -1.)],
            -Vector3::x(),
        );

        mesh
    }

    /// Cube of edge length `size` centered at the origin
    pub fn cube(size: f32) -> Self {
        Self::cuboid(size, size, size)
    }

    /// Closed cylinder standing on the XZ plane, extending along +Y
    pub fn cylinder(radius: f32, height: f32, slices: usize) -> Self {
        let slices = slices.max(3);
        let mut mesh = Self::with_capacity(slices * 4);
        let ring = |i: usize| {
            let angle = i as f32 / slices as f32 * std::f32::consts::TAU;
            (radius * angle.sin(), radius * angle.cos())
        };
        let bottom_center = Point3::origin();
        let top_center = Point3::new(0.0, height, 0.0);

        for i in 0..slices {
            let (x0, z0) = ring(i);
            let (x1, z1) = ring(i + 1);
            let b0 = Point3::new(x0, 0.0, z0);
            let b1 = Point3::new(x1, 0.0, z1);
            let t0 = Point3::new(x0, height, z0);
            let t1 = Point3::new(x1, height, z1);

            let side = Vector3::new(x0 + x1, 0.0, z0 + z1).normalize();
            mesh.add_quad([b0, b1, t1, t0], side);

            mesh.add_triangle(Triangle::new(
                Vertex::new(top_center, Vector3::y()),
                Vertex::new(t0, Vector3::y()),
                Vertex::new(t1, Vector3::y()),
            ));
            mesh.add_triangle(Triangle::new(
                Vertex::new(bottom_center, -Vector3::y()),
                Vertex::new(b1, -Vector3::y()),
                Vertex::new(b0, -Vector3::y()),
            ));
        }

        mesh
    }
}
