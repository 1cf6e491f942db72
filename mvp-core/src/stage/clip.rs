/// Clip space: the world looked at through the virtual camera itself
use super::{draw_axis_names, draw_marker_labels, draw_markers, draw_objects, draw_overlay, draw_reference};
use super::{FrameContext, Stage, StageKind};
use crate::observer::ObserverView;
use crate::renderer::{Color, Renderer};
use crate::state::VisualizationState;

#[derive(Debug, Default)]
pub struct ClipStage;

impl ClipStage {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for ClipStage {
    fn kind(&self) -> StageKind {
        StageKind::Clip
    }

    fn update(&mut self, state: &mut VisualizationState, frame: &FrameContext, target: &mut dyn Renderer) {
        let observer = self.observer(state);

        target.clear(Color::WHITE);
        target.begin_3d(&observer);
        draw_reference(state, &observer, target);
        draw_objects(StageKind::Clip, state, target);
        draw_markers(StageKind::Clip, state, target);
        target.end_3d();

        draw_axis_names(&observer, target);
        draw_marker_labels(StageKind::Clip, state, &observer, target);
        let hints = ["Edit the camera with :eye :at :fov :clip".to_string()];
        draw_overlay(StageKind::Clip, frame, &hints, target);
    }

    /// Eye, target, up and FOV of the virtual camera; near/far reach the
    /// backend through its clip plane state
    fn observer(&self, state: &VisualizationState) -> ObserverView {
        let camera = state.camera();
        ObserverView {
            eye: camera.eye(),
            at: camera.at(),
            up: camera.up(),
            fov_y_degrees: camera.fov_y_degrees(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CameraInput, VisualizerConfig};
    use crate::input::InputState;
    use crate::renderer::recording::{RecordingClipState, RecordingRenderer};
    use crate::renderer::ClipPlaneState;
    use approx::assert_relative_eq;
    use nalgebra::Point3;

    #[test]
    fn test_observer_reproduces_camera_matrices() {
        let mut backend = RecordingClipState::default();
        let config = VisualizerConfig::default();
        let mut state = VisualizationState::new(&config, &mut backend).unwrap();
        let input = CameraInput {
            eye: Point3::new(2.0, 4.0, 6.0),
            fov_y_degrees: 60.0,
            near: 1.0,
            far: 20.0,
            ..CameraInput::default()
        };
        state.apply_camera_input(&input, &mut backend).unwrap();

        let mut target = RecordingRenderer::new(config.viewport);
        target.clip = backend.clip_planes();
        let no_input = InputState::new();
        let frame = FrameContext {
            dt: 0.016,
            fps: 30.0,
            input: &no_input,
        };
        ClipStage::new().update(&mut state, &frame, &mut target);

        let observer = target.observers()[0];
        let camera = state.camera();
        assert_relative_eq!(observer.view_matrix(), camera.view_matrix(), epsilon = 1e-6);
        assert_relative_eq!(
            observer.projection_matrix(target.viewport.aspect(), target.clip),
            camera.projection_matrix(),
            epsilon = 1e-6
        );
    }

    #[test]
    fn test_camera_proxy_is_not_drawn() {
        let mut backend = RecordingClipState::default();
        let config = VisualizerConfig::default();
        let mut state = VisualizationState::new(&config, &mut backend).unwrap();
        let mut target = RecordingRenderer::new(config.viewport);
        let no_input = InputState::new();
        let frame = FrameContext {
            dt: 0.016,
            fps: 30.0,
            input: &no_input,
        };
        ClipStage::new().update(&mut state, &frame, &mut target);

        let meshes = target.meshes();
        assert_eq!(meshes.len(), 2);
        assert!(meshes.iter().all(|(_, _, color)| *color != Color::DARKGRAY));
        assert_eq!(ClipStage::new().toggle_lock(), None);
    }
}
