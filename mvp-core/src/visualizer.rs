/// Top-level frame driver: input, the four stage adapters, and panel edits
use tracing::{debug, info};

use crate::command::Command;
use crate::config::{Viewport, VisualizerConfig};
use crate::error::Result;
use crate::input::{InputState, Key};
use crate::renderer::{ClipPlaneState, Renderer};
use crate::stage::{ClipStage, FrameContext, LocalStage, Stage, StageKind, ViewStage, WorldStage};
use crate::state::VisualizationState;

/// Owns the shared state, the stage adapters in pipeline order and the
/// backend's clip plane setting
pub struct Visualizer<C: ClipPlaneState> {
    state: VisualizationState,
    stages: [Box<dyn Stage>; 4],
    clip_state: C,
}

impl<C: ClipPlaneState> Visualizer<C> {
    pub fn new(config: &VisualizerConfig, mut clip_state: C) -> Result<Self> {
        let state = VisualizationState::new(config, &mut clip_state)?;
        let mut stages: [Box<dyn Stage>; 4] = [
            Box::new(LocalStage::new()),
            Box::new(WorldStage::new()),
            Box::new(ViewStage::new()),
            Box::new(ClipStage::new()),
        ];
        for stage in stages.iter_mut() {
            stage.init(&state);
        }
        info!(viewport = ?config.viewport, seed = config.seed, "visualizer initialized");

        Ok(Self {
            state,
            stages,
            clip_state,
        })
    }

    pub fn state(&self) -> &VisualizationState {
        &self.state
    }

    pub fn clip_state(&self) -> &C {
        &self.clip_state
    }

    pub fn stage(&self, kind: StageKind) -> &dyn Stage {
        self.stages[kind.index()].as_ref()
    }

    /// Global keys first, then the lock key for the focused stage only
    pub fn handle_input(&mut self, input: &InputState) {
        self.state.handle_input(input);

        if input.is_pressed(Key::Lock) {
            if let Some(kind) = self.state.focused_stage() {
                if let Some(locked) = self.stages[kind.index()].toggle_lock() {
                    info!(stage = kind.label(), locked, "observer camera lock toggled");
                }
            }
        }
    }

    /// Run one frame: every stage redraws its own target, in pipeline order.
    ///
    /// Global keys in `input` are not acted on here; pass the same snapshot
    /// to [`Visualizer::handle_input`] first.
    pub fn frame<R: Renderer>(&mut self, dt: f32, fps: f32, input: &InputState, targets: &mut [R; 4]) {
        self.state.advance(dt);
        self.state.sync_camera_proxy();

        let frame = FrameContext { dt, fps, input };
        for (stage, target) in self.stages.iter_mut().zip(targets.iter_mut()) {
            stage.update(&mut self.state, &frame, target);
        }
        self.state.refresh_display();
    }

    /// Apply a parameter edit from the panel
    pub fn execute(&mut self, command: Command) -> Result<()> {
        debug!(?command, "executing panel command");
        let mut input = self.state.camera().input();
        match command {
            Command::Eye(eye) => input.eye = eye,
            Command::At(at) => input.at = at,
            Command::Up(up) => input.up = up,
            Command::Fov(fov) => input.fov_y_degrees = fov,
            Command::Near(near) => input.near = near,
            Command::Far(far) => input.far = far,
            Command::Clip { near, far } => {
                input.near = near;
                input.far = far;
            }
            Command::Mode(mode) => {
                self.state.set_mode(mode);
                return Ok(());
            }
            Command::Markers(show) => {
                let show = show.unwrap_or(!self.state.show_markers());
                self.state.set_markers(show);
                return Ok(());
            }
            Command::Model { row, col, value } => return self.state.set_model_component(row, col, value),
            Command::Reset => return self.state.reset(&mut self.clip_state),
        }
        self.state.apply_camera_input(&input, &mut self.clip_state)
    }

    /// The visualization area changed size
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.state.camera_mut().set_viewport(viewport);
        self.state.refresh_display();
    }

    pub fn deinit(&mut self) {
        for stage in self.stages.iter_mut() {
            stage.deinit();
        }
        info!("visualizer shut down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CameraInput;
    use crate::error::VisualizerError;
    use crate::input::Modifiers;
    use crate::renderer::recording::{RecordingClipState, RecordingRenderer};
    use crate::renderer::ClipPlanes;
    use crate::scene::ObjectKind;
    use crate::state::DisplayMode;
    use approx::assert_relative_eq;
    use nalgebra::Point3;

    fn visualizer() -> Visualizer<RecordingClipState> {
        Visualizer::new(&VisualizerConfig::default(), RecordingClipState::default()).unwrap()
    }

    fn targets(visualizer: &Visualizer<RecordingClipState>) -> [RecordingRenderer; 4] {
        std::array::from_fn(|_| {
            let mut target = RecordingRenderer::new(visualizer.state().camera().viewport());
            target.clip = visualizer.clip_state().clip_planes();
            target
        })
    }

    #[test]
    fn test_every_stage_renders_every_frame() {
        let mut visualizer = visualizer();
        visualizer.execute(Command::Mode(DisplayMode::Single(StageKind::View))).unwrap();
        let mut targets = targets(&visualizer);
        visualizer.frame(0.016, 60.0, &InputState::new(), &mut targets);

        for target in &targets {
            assert_eq!(target.observers().len(), 1);
            assert!(!target.meshes().is_empty());
        }
    }

    #[test]
    fn test_stages_agree_on_the_model_matrix() {
        let mut visualizer = visualizer();
        let mut targets = targets(&visualizer);
        visualizer.frame(0.016, 60.0, &InputState::new(), &mut targets);

        let model = *visualizer.state().scene().object(ObjectKind::Player).model_matrix();
        let view = visualizer.state().camera().view_matrix();
        let player = ObjectKind::Player.index() - 1;

        let world = targets[StageKind::World.index()].meshes()[ObjectKind::Player.index()].1;
        let clip = targets[StageKind::Clip.index()].meshes()[player].1;
        let in_view = targets[StageKind::View.index()].meshes()[ObjectKind::Player.index()].1;
        assert_eq!(world, model);
        assert_eq!(clip, model);
        assert_relative_eq!(in_view, view * model, epsilon = 1e-6);
    }

    #[test]
    fn test_clip_commands_reach_the_backend() {
        let mut visualizer = visualizer();
        let before = visualizer.clip_state().pushes;
        visualizer.execute(Command::Clip { near: 1.0, far: 10.0 }).unwrap();

        assert_eq!(visualizer.clip_state().pushes, before + 1);
        assert_eq!(visualizer.clip_state().clip_planes(), ClipPlanes { near: 1.0, far: 10.0 });
        assert_eq!(visualizer.state().readout().near, "1.00");
    }

    #[test]
    fn test_inverted_planes_are_repaired() {
        let mut visualizer = visualizer();
        visualizer.execute(Command::Clip { near: 3.0, far: 2.5 }).unwrap();
        let planes = visualizer.clip_state().clip_planes();
        assert!(planes.near < planes.far);
    }

    #[test]
    fn test_degenerate_eye_is_rejected() {
        let mut visualizer = visualizer();
        let at = visualizer.state().camera().at();
        let result = visualizer.execute(Command::Eye(at));
        assert!(matches!(result, Err(VisualizerError::DegenerateBasis(_))));
        assert_eq!(visualizer.state().camera().eye(), CameraInput::default().eye);
    }

    #[test]
    fn test_lock_key_only_affects_focused_stage() {
        let mut visualizer = visualizer();
        let mut input = InputState::new();
        input.press(Key::Lock, Modifiers::NONE);

        visualizer.handle_input(&input);
        assert!(StageKind::ALL.iter().all(|k| !visualizer.stage(*k).is_locked()));

        visualizer.execute(Command::Mode(DisplayMode::Single(StageKind::Local))).unwrap();
        visualizer.handle_input(&input);
        assert!(visualizer.stage(StageKind::Local).is_locked());
        assert!(!visualizer.stage(StageKind::World).is_locked());
    }

    #[test]
    fn test_markers_toggle_and_reset() {
        let mut visualizer = visualizer();
        visualizer.execute(Command::Markers(None)).unwrap();
        assert!(visualizer.state().show_markers());
        visualizer.execute(Command::Markers(Some(false))).unwrap();
        assert!(!visualizer.state().show_markers());

        visualizer.execute(Command::Eye(Point3::new(5.0, 5.0, 5.0))).unwrap();
        visualizer.execute(Command::Reset).unwrap();
        assert_eq!(visualizer.state().camera().eye(), CameraInput::default().eye);
    }

    #[test]
    fn test_fov_is_clamped() {
        let mut visualizer = visualizer();
        visualizer.execute(Command::Fov(500.0)).unwrap();
        assert_eq!(visualizer.state().camera().fov_y_degrees(), 179.0);
    }
}
