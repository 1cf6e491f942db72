/// Scene object model: the camera proxy, the player and the enemy
use nalgebra::{Matrix4, Point3, Vector3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::error::{Result, VisualizerError};
use crate::geometry::Mesh;
use crate::renderer::Color;
use crate::transform::Transform;

/// Number of vertex markers on the player cube
pub const MARKER_COUNT: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Camera,
    Player,
    Enemy,
}

impl ObjectKind {
    pub const ALL: [ObjectKind; 3] = [ObjectKind::Camera, ObjectKind::Player, ObjectKind::Enemy];

    pub fn index(self) -> usize {
        match self {
            ObjectKind::Camera => 0,
            ObjectKind::Player => 1,
            ObjectKind::Enemy => 2,
        }
    }
}

/// Opaque reference to a mesh owned by the [`Scene`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshHandle(usize);

/// A point on the player model shown by the vertex coordinate overlay
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VertexMarker {
    pub local_position: Point3<f32>,
    pub color: Color,
}

#[derive(Debug, Clone)]
pub struct SceneObject {
    kind: ObjectKind,
    model_matrix: Matrix4<f32>,
    mesh: MeshHandle,
    color: Color,
}

impl SceneObject {
    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    pub fn model_matrix(&self) -> &Matrix4<f32> {
        &self.model_matrix
    }

    /// Replace the model matrix; singular matrices are refused
    pub fn set_model_matrix(&mut self, model: Matrix4<f32>) -> Result<()> {
        if !Transform::is_invertible(&model) {
            return Err(VisualizerError::SingularModel);
        }
        self.model_matrix = model;
        Ok(())
    }

    pub fn mesh(&self) -> MeshHandle {
        self.mesh
    }

    pub fn color(&self) -> Color {
        self.color
    }
}

/// Exactly one object of each [`ObjectKind`], plus the meshes they draw
#[derive(Debug, Clone)]
pub struct Scene {
    objects: [SceneObject; 3],
    meshes: Vec<Mesh>,
    markers: [VertexMarker; MARKER_COUNT],
}

impl Scene {
    /// Build the initial scene; `seed` picks the enemy's heading
    pub fn new(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let enemy_heading = rng.gen_range(45..=275) as f32;

        let meshes = vec![
            Mesh::cylinder(0.5, 0.4, 6),
            Mesh::cube(1.0),
            Mesh::cube(0.5),
        ];

        let objects = [
            SceneObject {
                kind: ObjectKind::Camera,
                model_matrix: Transform::translation(-3.0, 2.25, 0.0) * Transform::rotation_z_degrees(55.0),
                mesh: MeshHandle(0),
                color: Color::DARKGRAY,
            },
            SceneObject {
                kind: ObjectKind::Player,
                model_matrix: Transform::translation(2.0, 0.5, 2.0),
                mesh: MeshHandle(1),
                color: Color::LIME,
            },
            SceneObject {
                kind: ObjectKind::Enemy,
                model_matrix: Transform::translation(0.75, 0.25, 1.0)
                    * Transform::rotation_y_degrees(enemy_heading),
                mesh: MeshHandle(2),
                color: Color::PURPLE,
            },
        ];
        debug!(enemy_heading, "scene generated");

        Self {
            objects,
            meshes,
            markers: unit_cube_markers(),
        }
    }

    pub fn object(&self, kind: ObjectKind) -> &SceneObject {
        &self.objects[kind.index()]
    }

    pub fn object_mut(&mut self, kind: ObjectKind) -> &mut SceneObject {
        &mut self.objects[kind.index()]
    }

    /// Look an object up by raw index; `None` is the "no object" answer
    pub fn get(&self, index: usize) -> Option<&SceneObject> {
        self.objects.get(index)
    }

    pub fn objects(&self) -> impl Iterator<Item = &SceneObject> {
        self.objects.iter()
    }

    pub fn mesh(&self, handle: MeshHandle) -> Option<&Mesh> {
        self.meshes.get(handle.0)
    }

    pub fn markers(&self) -> &[VertexMarker; MARKER_COUNT] {
        &self.markers
    }

    /// Translate the player along the world axes
    pub fn move_player(&mut self, delta: &Vector3<f32>) {
        let player = self.object_mut(ObjectKind::Player);
        player.model_matrix = Transform::translate_world(&player.model_matrix, delta);
    }
}

fn unit_cube_markers() -> [VertexMarker; MARKER_COUNT] {
    const COLORS: [Color; MARKER_COUNT] = [
        Color::RED,
        Color::GREEN,
        Color::BLUE,
        Color::ORANGE,
        Color::PURPLE,
        Color::MAGENTA,
        Color::YELLOW,
        Color::BROWN,
    ];

    let mut markers = [VertexMarker {
        local_position: Point3::origin(),
        color: Color::BLACK,
    }; MARKER_COUNT];
    for (i, marker) in markers.iter_mut().enumerate() {
        let sign = |bit: usize| if i & bit == 0 { -0.5 } else { 0.5 };
        marker.local_position = Point3::new(sign(1), sign(2), sign(4));
        marker.color = COLORS[i];
    }
    markers
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_one_object_per_kind() {
        let scene = Scene::new(7);
        for kind in ObjectKind::ALL {
            assert_eq!(scene.object(kind).kind(), kind);
            assert!(scene.mesh(scene.object(kind).mesh()).is_some());
        }
        assert_eq!(scene.objects().count(), 3);
    }

    #[test]
    fn test_invalid_index_is_none() {
        let scene = Scene::new(7);
        assert!(scene.get(1).is_some());
        assert!(scene.get(3).is_none());
    }

    #[test]
    fn test_same_seed_same_scene() {
        let a = Scene::new(11);
        let b = Scene::new(11);
        assert_eq!(
            a.object(ObjectKind::Enemy).model_matrix(),
            b.object(ObjectKind::Enemy).model_matrix()
        );
    }

    #[test]
    fn test_singular_model_is_refused() {
        let mut scene = Scene::new(7);
        let before = *scene.object(ObjectKind::Player).model_matrix();
        let result = scene
            .object_mut(ObjectKind::Player)
            .set_model_matrix(Matrix4::new_nonuniform_scaling(&Vector3::new(0.0, 1.0, 1.0)));
        assert_eq!(result, Err(VisualizerError::SingularModel));
        assert_eq!(*scene.object(ObjectKind::Player).model_matrix(), before);
    }

    #[test]
    fn test_markers_are_unit_cube_corners() {
        let scene = Scene::new(7);
        let markers = scene.markers();
        for (i, a) in markers.iter().enumerate() {
            assert_relative_eq!(a.local_position.coords.abs(), Vector3::repeat(0.5));
            for b in markers.iter().skip(i + 1) {
                assert_ne!(a.local_position, b.local_position);
            }
        }
    }

    #[test]
    fn test_move_player_translates_in_world() {
        let mut scene = Scene::new(7);
        scene.move_player(&Vector3::new(-1.0, 0.0, 0.5));
        let origin = scene
            .object(ObjectKind::Player)
            .model_matrix()
            .transform_point(&Point3::origin());
        assert_relative_eq!(origin, Point3::new(1.0, 0.5, 2.5));
    }
}
