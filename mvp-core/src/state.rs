/// Shared visualization state owned by the application loop
use nalgebra::{Matrix4, Point3, Vector3};
use tracing::{debug, warn};

use crate::camera::VirtualCamera;
use crate::config::{CameraInput, VisualizerConfig, MATRIX_COMPONENT_LIMIT};
use crate::error::{Result, VisualizerError};
use crate::grid::GridShader;
use crate::input::{InputState, Key};
use crate::renderer::ClipPlaneState;
use crate::scene::{ObjectKind, Scene};
use crate::stage::StageKind;

/// Which stage framebuffers the visualization area shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayMode {
    /// All four stages, one per quadrant
    All,
    Single(StageKind),
}

impl DisplayMode {
    /// `0` is all four, `1..=4` are the stages in pipeline order
    pub fn from_digit(digit: u8) -> Option<Self> {
        match digit {
            0 => Some(DisplayMode::All),
            n => StageKind::from_number(n).map(DisplayMode::Single),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DisplayMode::All => "All Spaces",
            DisplayMode::Single(stage) => stage.label(),
        }
    }

    pub fn visible_stages(self) -> Vec<StageKind> {
        match self {
            DisplayMode::All => StageKind::ALL.to_vec(),
            DisplayMode::Single(stage) => vec![stage],
        }
    }
}

/// Text shown by the parameter panel, rebuilt from current matrices
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Readout {
    pub eye: String,
    pub at: String,
    pub up: String,
    pub fov: String,
    pub near: String,
    pub far: String,
    pub player: String,
    pub model: [String; 4],
    pub view: [String; 4],
    pub projection: [String; 4],
}

pub struct VisualizationState {
    camera: VirtualCamera,
    initial_camera: CameraInput,
    scene: Scene,
    seed: u64,
    grid: GridShader,
    mode: DisplayMode,
    mode_hint_counter: f32,
    mode_hint_duration: f32,
    show_markers: bool,
    player_speed: f32,
    player_controls: String,
    readout: Readout,
}

impl VisualizationState {
    /// Build the state; fails when the grid shader cannot be loaded
    pub fn new(config: &VisualizerConfig, clip_state: &mut dyn ClipPlaneState) -> Result<Self> {
        let grid = GridShader::load(config.grid)?;
        let camera = VirtualCamera::new(&config.camera, config.limits, config.viewport, clip_state)?;

        let mut state = Self {
            camera,
            initial_camera: config.camera,
            scene: Scene::new(config.seed),
            seed: config.seed,
            grid,
            mode: DisplayMode::All,
            mode_hint_counter: 0.0,
            mode_hint_duration: config.mode_hint_duration,
            show_markers: config.show_markers,
            player_speed: config.player_speed,
            player_controls: config.player_controls.clone(),
            readout: Readout::default(),
        };
        state.sync_camera_proxy();
        state.refresh_display();
        Ok(state)
    }

    pub fn camera(&self) -> &VirtualCamera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut VirtualCamera {
        &mut self.camera
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn grid_mut(&mut self) -> &mut GridShader {
        &mut self.grid
    }

    pub fn mode(&self) -> DisplayMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: DisplayMode) {
        debug!(from = ?self.mode, to = ?mode, "display mode switched");
        self.mode = mode;
        self.mode_hint_counter = 0.0;
    }

    /// The stage that receives keyboard input, if only one is displayed
    pub fn focused_stage(&self) -> Option<StageKind> {
        match self.mode {
            DisplayMode::All => None,
            DisplayMode::Single(stage) => Some(stage),
        }
    }

    pub fn is_focused(&self, stage: StageKind) -> bool {
        self.focused_stage() == Some(stage)
    }

    pub fn show_markers(&self) -> bool {
        self.show_markers
    }

    pub fn set_markers(&mut self, show: bool) {
        self.show_markers = show;
    }

    pub fn player_speed(&self) -> f32 {
        self.player_speed
    }

    pub fn player_controls(&self) -> &str {
        &self.player_controls
    }

    /// Advance the mode hint fade
    pub fn advance(&mut self, dt: f32) {
        if self.mode_hint_counter < self.mode_hint_duration {
            self.mode_hint_counter = (self.mode_hint_counter + dt).min(self.mode_hint_duration);
        }
    }

    /// Label of the current mode and its fading alpha, while it is visible
    pub fn mode_hint(&self) -> Option<(&'static str, f32)> {
        if self.mode_hint_duration <= 0.0 {
            return None;
        }
        let alpha = 1.0 - self.mode_hint_counter / self.mode_hint_duration;
        (alpha > 0.0).then(|| (self.mode.label(), alpha))
    }

    /// React to the global keys: mode switch and marker toggle
    pub fn handle_input(&mut self, input: &InputState) {
        if let Some(mode) = input.mode_digit().and_then(DisplayMode::from_digit) {
            self.set_mode(mode);
        }
        if input.is_pressed(Key::Markers) {
            self.show_markers = !self.show_markers;
            debug!(show = self.show_markers, "vertex markers toggled");
        }
    }

    /// Place the camera proxy object where the virtual camera is
    pub fn sync_camera_proxy(&mut self) {
        let model = self.camera.model_matrix();
        if let Err(err) = self.scene.object_mut(ObjectKind::Camera).set_model_matrix(model) {
            warn!(%err, "camera proxy not updated");
        }
    }

    /// Recompute the camera from raw values, then refresh the panel text
    pub fn apply_camera_input(&mut self, input: &CameraInput, clip_state: &mut dyn ClipPlaneState) -> Result<()> {
        self.camera.apply_input(input, clip_state)?;
        self.sync_camera_proxy();
        self.refresh_display();
        Ok(())
    }

    /// Rebuild the panel text from the matrices as they are now
    pub fn refresh_display(&mut self) {
        let camera = &self.camera;
        self.readout = Readout {
            eye: format_point(&camera.eye()),
            at: format_point(&camera.at()),
            up: format_vector(&camera.up()),
            fov: format!("{:.1}", camera.fov_y_degrees()),
            near: format!("{:.2}", camera.near()),
            far: format!("{:.2}", camera.far()),
            player: format_point(&self.player_position()),
            model: format_matrix(self.scene.object(ObjectKind::Player).model_matrix()),
            view: format_matrix(&camera.view_matrix()),
            projection: format_matrix(&camera.projection_matrix()),
        };
    }

    pub fn readout(&self) -> &Readout {
        &self.readout
    }

    /// Edit one component of the player's model matrix, as a typed value
    pub fn set_model_component(&mut self, row: usize, col: usize, value: f32) -> Result<()> {
        if row > 3 || col > 3 {
            return Err(VisualizerError::Command(format!(
                "matrix index ({row}, {col}) out of range"
            )));
        }
        let value = if value.is_nan() {
            0.0
        } else {
            value.clamp(-MATRIX_COMPONENT_LIMIT, MATRIX_COMPONENT_LIMIT)
        };

        let mut model: Matrix4<f32> = *self.scene.object(ObjectKind::Player).model_matrix();
        model[(row, col)] = value;
        self.scene.object_mut(ObjectKind::Player).set_model_matrix(model)?;
        self.refresh_display();
        Ok(())
    }

    pub fn move_player(&mut self, delta: &Vector3<f32>) {
        self.scene.move_player(delta);
    }

    pub fn player_position(&self) -> Point3<f32> {
        self.scene
            .object(ObjectKind::Player)
            .model_matrix()
            .transform_point(&Point3::origin())
    }

    /// Back to the startup camera and scene
    pub fn reset(&mut self, clip_state: &mut dyn ClipPlaneState) -> Result<()> {
        self.scene = Scene::new(self.seed);
        let input = self.initial_camera;
        self.apply_camera_input(&input, clip_state)
    }
}

fn format_point(p: &Point3<f32>) -> String {
    format!("({:.2}, {:.2}, {:.2})", p.x, p.y, p.z)
}

fn format_vector(v: &Vector3<f32>) -> String {
    format!("({:.2}, {:.2}, {:.2})", v.x, v.y, v.z)
}

fn format_matrix(m: &Matrix4<f32>) -> [String; 4] {
    std::array::from_fn(|r| {
        format!(
            "{:>6.2} {:>6.2} {:>6.2} {:>6.2}",
            m[(r, 0)],
            m[(r, 1)],
            m[(r, 2)],
            m[(r, 3)]
        )
    })
}
