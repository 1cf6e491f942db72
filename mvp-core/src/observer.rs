/// Observer cameras: the viewpoints each stage is looked at through
use nalgebra::{Matrix4, Point3, Rotation3, Vector3};
use tracing::debug;

use crate::config::Viewport;
use crate::input::{InputState, Key};
use crate::renderer::ClipPlanes;
use crate::transform::{perspective_divide, to_clip};

/// Radians per second for orbiting
const ORBIT_SPEED: f32 = 0.5;
/// Fraction of the distance covered per second when zooming
const ZOOM_SPEED: f32 = 0.8;
const CLIMB_SPEED: f32 = 2.0;
const MIN_DISTANCE: f32 = 0.5;
const MAX_DISTANCE: f32 = 64.0;
/// Keeps the orbit from reaching the poles, where look-at degenerates
const MAX_ELEVATION_COS: f32 = 0.99;

/// Position and lens of a camera a 3D scope is rendered through.
///
/// Near/far are not part of it: the backend takes them from its global
/// clip plane state, like every 3D scope does.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObserverView {
    pub eye: Point3<f32>,
    pub at: Point3<f32>,
    pub up: Vector3<f32>,
    pub fov_y_degrees: f32,
}

impl ObserverView {
    pub fn new(eye: Point3<f32>, at: Point3<f32>) -> Self {
        Self {
            eye,
            at,
            up: Vector3::y(),
            fov_y_degrees: 45.0,
        }
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(&self.eye, &self.at, &self.up)
    }

    pub fn projection_matrix(&self, aspect: f32, clip: ClipPlanes) -> Matrix4<f32> {
        Matrix4::new_perspective(aspect, self.fov_y_degrees.to_radians(), clip.near, clip.far)
    }

    /// Project a point to target coordinates: x right, y down, plus NDC depth.
    ///
    /// Points behind the eye yield `None`; points off the sides do not.
    pub fn project_to_screen(
        &self,
        point: &Point3<f32>,
        viewport: Viewport,
        clip: ClipPlanes,
    ) -> Option<(f32, f32, f32)> {
        let view_projection = self.projection_matrix(viewport.aspect(), clip) * self.view_matrix();
        let clip_position = to_clip(&view_projection, point);
        if clip_position.w <= 1e-6 {
            return None;
        }
        let ndc = perspective_divide(&clip_position)?;

        let screen_x = (ndc.x + 1.0) * 0.5 * viewport.width;
        let screen_y = (1.0 - ndc.y) * 0.5 * viewport.height;

        Some((screen_x, screen_y, ndc.z))
    }
}

/// Free/orbit camera owned by one stage
#[derive(Debug, Clone)]
pub struct ObserverCamera {
    view: ObserverView,
    locked: bool,
    auto_orbit: bool,
}

impl ObserverCamera {
    pub fn new(eye: Point3<f32>, at: Point3<f32>) -> Self {
        Self {
            view: ObserverView::new(eye, at),
            locked: false,
            auto_orbit: false,
        }
    }

    /// Keep circling the target on its own while unlocked
    pub fn orbiting(mut self) -> Self {
        self.auto_orbit = true;
        self
    }

    pub fn view(&self) -> &ObserverView {
        &self.view
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn toggle_lock(&mut self) -> bool {
        self.locked = !self.locked;
        debug!(locked = self.locked, "observer camera lock toggled");
        self.locked
    }

    /// Advance the camera; keyboard control only applies when `focused`
    pub fn update(&mut self, dt: f32, input: &InputState, focused: bool) {
        if self.locked {
            return;
        }

        let mut yaw = if self.auto_orbit { ORBIT_SPEED * dt } else { 0.0 };
        let mut zoom = 0.0;
        let mut climb = 0.0;
        if focused {
            yaw += input.axis(Key::A, Key::D) * ORBIT_SPEED * 2.0 * dt;
            zoom = input.axis(Key::S, Key::W) * ZOOM_SPEED * dt;
            climb = input.axis(Key::Q, Key::E) * CLIMB_SPEED * dt;
        }

        let mut offset = self.view.eye - self.view.at;
        if yaw != 0.0 {
            offset = Rotation3::from_axis_angle(&Vector3::y_axis(), yaw) * offset;
        }
        if zoom != 0.0 {
            let distance = (offset.norm() * (1.0 - zoom)).clamp(MIN_DISTANCE, MAX_DISTANCE);
            offset = offset.normalize() * distance;
        }
        if climb != 0.0 {
            let raised = offset + Vector3::new(0.0, climb, 0.0);
            if raised.norm() > MIN_DISTANCE && (raised.y / raised.norm()).abs() < MAX_ELEVATION_COS {
                offset = raised;
            }
        }

        self.view.eye = self.view.at + offset;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Modifiers;
    use approx::assert_relative_eq;

    #[test]
    fn test_target_projects_to_center() {
        let view = ObserverView::new(Point3::new(1.5, 3.0, 8.5), Point3::origin());
        let viewport = Viewport::new(200.0, 100.0);
        let (x, y, depth) = view
            .project_to_screen(&Point3::origin(), viewport, ClipPlanes::default())
            .unwrap();
        assert_relative_eq!(x, 100.0, epsilon = 1e-3);
        assert_relative_eq!(y, 50.0, epsilon = 1e-3);
        assert!(depth > -1.0 && depth < 1.0);
    }

    #[test]
    fn test_points_behind_eye_do_not_project() {
        let view = ObserverView::new(Point3::new(0.0, 0.0, 5.0), Point3::origin());
        let behind = Point3::new(0.0, 0.0, 10.0);
        assert!(view
            .project_to_screen(&behind, Viewport::new(100.0, 100.0), ClipPlanes::default())
            .is_none());
    }

    #[test]
    fn test_auto_orbit_keeps_distance() {
        let mut camera = ObserverCamera::new(Point3::new(1.5, 2.0, 2.5), Point3::origin()).orbiting();
        let before = (camera.view().eye - camera.view().at).norm();
        camera.update(0.5, &InputState::new(), false);
        let after = (camera.view().eye - camera.view().at).norm();
        assert_relative_eq!(before, after, epsilon = 1e-5);
        assert!((camera.view().eye - Point3::new(1.5, 2.0, 2.5)).norm() > 0.1);
    }

    #[test]
    fn test_locked_camera_ignores_input() {
        let mut camera = ObserverCamera::new(Point3::new(0.0, 2.0, 5.0), Point3::origin()).orbiting();
        assert!(camera.toggle_lock());
        let mut input = InputState::new();
        input.press(Key::W, Modifiers::NONE);
        camera.update(1.0, &input, true);
        assert_eq!(camera.view().eye, Point3::new(0.0, 2.0, 5.0));
    }

    #[test]
    fn test_unfocused_camera_ignores_keys() {
        let mut camera = ObserverCamera::new(Point3::new(0.0, 2.0, 5.0), Point3::origin());
        let mut input = InputState::new();
        input.press(Key::W, Modifiers::NONE);
        camera.update(1.0, &input, false);
        assert_eq!(camera.view().eye, Point3::new(0.0, 2.0, 5.0));

        camera.update(0.5, &input, true);
        assert!((camera.view().eye - camera.view().at).norm() < 5.0_f32.hypot(2.0));
    }
}
