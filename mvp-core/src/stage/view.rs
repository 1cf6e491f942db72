/// View space: the scene as the virtual camera sees it, with its frustum
use nalgebra::Point3;
use tracing::warn;

use super::{
    draw_arrow, draw_axis_names, draw_marker_labels, draw_markers, draw_objects, draw_overlay, draw_reference,
    lock_hint, FrameContext, Stage, StageKind, FRUSTUM_COLOR,
};
use crate::config::FAR_PLANE_INSET;
use crate::frustum::Frustum;
use crate::observer::{ObserverCamera, ObserverView};
use crate::renderer::{Color, Renderer};
use crate::state::VisualizationState;

pub struct ViewStage {
    observer: ObserverCamera,
}

impl ViewStage {
    pub fn new() -> Self {
        Self {
            observer: ObserverCamera::new(Point3::new(1.5, 2.0, 5.5), Point3::origin()),
        }
    }
}

impl Default for ViewStage {
    fn default() -> Self {
        Self::new()
    }
}

/// The virtual camera's frustum in its own view space, far plane pulled in
pub fn view_space_frustum(state: &VisualizationState) -> Option<Frustum> {
    let projection = state.camera().projection_matrix();
    let frustum = Frustum::from_inverse_projection(&projection)?;
    Some(frustum.with_far_inset(&Point3::origin(), FAR_PLANE_INSET))
}

impl Stage for ViewStage {
    fn kind(&self) -> StageKind {
        StageKind::View
    }

    fn update(&mut self, state: &mut VisualizationState, frame: &FrameContext, target: &mut dyn Renderer) {
        let focused = state.is_focused(StageKind::View);
        self.observer.update(frame.dt, frame.input, focused);
        let observer = *self.observer.view();
        let frustum = view_space_frustum(state);

        target.clear(Color::WHITE);
        target.begin_3d(&observer);
        draw_reference(state, &observer, target);
        draw_objects(StageKind::View, state, target);
        draw_markers(StageKind::View, state, target);
        match frustum {
            Some(frustum) => {
                for (from, to) in frustum.edges() {
                    target.draw_line(&from, &to, FRUSTUM_COLOR);
                }
                draw_arrow(target, &Point3::origin(), &frustum.far_center(), Color::YELLOW);
            }
            None => warn!("projection not invertible, frustum skipped"),
        }
        target.end_3d();

        draw_axis_names(&observer, target);
        draw_marker_labels(StageKind::View, state, &observer, target);
        let hints = [lock_hint(self.observer.is_locked())];
        draw_overlay(StageKind::View, frame, &hints, target);
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Viewport, VisualizerConfig};
    use crate::input::InputState;
    use crate::renderer::recording::{RecordingClipState, RecordingRenderer};
    use crate::scene::ObjectKind;
    use approx::assert_relative_eq;

    fn state() -> VisualizationState {
        VisualizationState::new(&VisualizerConfig::default(), &mut RecordingClipState::default()).unwrap()
    }

    fn render(state: &mut VisualizationState) -> RecordingRenderer {
        let mut stage = ViewStage::new();
        let mut target = RecordingRenderer::new(Viewport::new(400.0, 300.0));
        let input = InputState::new();
        let frame = FrameContext {
            dt: 0.016,
            fps: 30.0,
            input: &input,
        };
        stage.update(state, &frame, &mut target);
        target
    }

    #[test]
    fn test_objects_drawn_in_camera_space() {
        let mut state = state();
        let target = render(&mut state);
        let view = state.camera().view_matrix();

        let meshes = target.meshes();
        assert_eq!(meshes.len(), 3);
        for ((_, transform, _), object) in meshes.iter().zip(state.scene().objects()) {
            assert_relative_eq!(*transform, view * object.model_matrix(), epsilon = 1e-6);
        }

        // the camera proxy lands on the view-space origin
        let proxy = meshes[ObjectKind::Camera.index()].1;
        assert_relative_eq!(proxy.transform_point(&Point3::origin()), Point3::origin(), epsilon = 1e-5);
    }

    #[test]
    fn test_frustum_edges_and_direction_drawn() {
        let mut state = state();
        let target = render(&mut state);
        let frustum = view_space_frustum(&state).unwrap();

        let edges: Vec<_> = target.lines().into_iter().filter(|(_, _, c)| *c == FRUSTUM_COLOR).collect();
        assert_eq!(edges.len(), 12);
        assert!(target
            .lines()
            .iter()
            .any(|(a, b, _)| *a == Point3::origin() && *b == frustum.far_center()));
    }

    #[test]
    fn test_far_plane_is_inset() {
        let state = state();
        let frustum = view_space_frustum(&state).unwrap();
        let far = state.camera().far();
        for corner in &frustum.far {
            assert_relative_eq!(corner.z, -far * FAR_PLANE_INSET, epsilon = 1e-2);
        }
    }
}
