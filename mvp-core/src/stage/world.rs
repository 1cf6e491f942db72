/// World space: the scene arranged by model matrices, camera frame included
use nalgebra::{Point3, Vector3};

use super::{
    draw_arrow, draw_axis_names, draw_frame, draw_marker_labels, draw_markers, draw_objects, draw_overlay,
    draw_reference, lock_hint, FrameContext, Stage, StageKind, FRUSTUM_COLOR,
};
use crate::config::FAR_PLANE_INSET;
use crate::frustum::Frustum;
use crate::input::{InputState, Key};
use crate::observer::{ObserverCamera, ObserverView};
use crate::renderer::{Color, Renderer};
use crate::state::VisualizationState;

/// Length of the drawn U/V/N axes
const BASIS_LENGTH: f32 = 0.75;

pub struct WorldStage {
    observer: ObserverCamera,
}

impl WorldStage {
    pub fn new() -> Self {
        Self {
            observer: ObserverCamera::new(Point3::new(1.5, 3.0, 8.5), Point3::origin()),
        }
    }
}

impl Default for WorldStage {
    fn default() -> Self {
        Self::new()
    }
}

/// Arrow keys move in the XZ plane, Space/Shift move up and down
fn player_direction(input: &InputState) -> Vector3<f32> {
    Vector3::new(
        input.axis(Key::Left, Key::Right),
        input.axis(Key::Shift, Key::Space),
        input.axis(Key::Up, Key::Down),
    )
}

impl Stage for WorldStage {
    fn kind(&self) -> StageKind {
        StageKind::World
    }

    fn update(&mut self, state: &mut VisualizationState, frame: &FrameContext, target: &mut dyn Renderer) {
        let focused = state.is_focused(StageKind::World);
        if focused {
            let delta = player_direction(frame.input) * state.player_speed() * frame.dt;
            if delta != Vector3::zeros() {
                state.move_player(&delta);
            }
        }
        self.observer.update(frame.dt, frame.input, focused);
        let observer = *self.observer.view();

        let camera = state.camera();
        let (eye, at) = (camera.eye(), camera.at());
        let axes = camera.basis_axes();
        let frustum = Frustum::from_camera(camera).with_far_inset(&eye, FAR_PLANE_INSET);

        target.clear(Color::WHITE);
        target.begin_3d(&observer);
        draw_reference(state, &observer, target);
        draw_objects(StageKind::World, state, target);
        draw_markers(StageKind::World, state, target);
        draw_frame(target, &eye, [axes.u * BASIS_LENGTH, axes.v * BASIS_LENGTH, axes.n * BASIS_LENGTH]);
        draw_arrow(target, &eye, &at, Color::YELLOW);
        for (from, to) in frustum.edges() {
            target.draw_line(&from, &to, FRUSTUM_COLOR);
        }
        target.end_3d();

        draw_axis_names(&observer, target);
        draw_marker_labels(StageKind::World, state, &observer, target);
        let hints = [state.player_controls().to_string(), lock_hint(self.observer.is_locked())];
        draw_overlay(StageKind::World, frame, &hints, target);
    }

    fn observer(&self, _state: &VisualizationState) -> ObserverView {
        *self.observer.view()
    }

    fn toggle_lock(&mut self) -> Option<bool> {
        Some(self.observer.toggle_lock())
    }

    fn is_locked(&self) -> bool {
        self.observer.is_locked()
    }
}
