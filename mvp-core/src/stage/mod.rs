/// Per-stage render adapters: Local, World, View and Clip space
use nalgebra::{Matrix4, Point3, Vector3};

use crate::input::InputState;
use crate::observer::ObserverView;
use crate::renderer::{Color, Renderer};
use crate::scene::ObjectKind;
use crate::state::VisualizationState;

mod clip;
mod local;
mod view;
mod world;

pub use clip::ClipStage;
pub use local::LocalStage;
pub use view::ViewStage;
pub use world::WorldStage;

const AXIS_RADIUS: f32 = 0.05;
const MARKER_RADIUS: f32 = 0.05;
pub(crate) const FRUSTUM_COLOR: Color = Color::GRAY;

/// One of the four pipeline viewpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageKind {
    Local,
    World,
    View,
    Clip,
}

impl StageKind {
    pub const ALL: [StageKind; 4] = [StageKind::Local, StageKind::World, StageKind::View, StageKind::Clip];

    /// 1-based position in the pipeline, as used by the mode keys
    pub fn number(self) -> u8 {
        match self {
            StageKind::Local => 1,
            StageKind::World => 2,
            StageKind::View => 3,
            StageKind::Clip => 4,
        }
    }

    pub fn from_number(number: u8) -> Option<Self> {
        match number {
            1 => Some(StageKind::Local),
            2 => Some(StageKind::World),
            3 => Some(StageKind::View),
            4 => Some(StageKind::Clip),
            _ => None,
        }
    }

    pub fn index(self) -> usize {
        self.number() as usize - 1
    }

    pub fn label(self) -> &'static str {
        match self {
            StageKind::Local => "Local Space",
            StageKind::World => "World Space",
            StageKind::View => "View Space",
            StageKind::Clip => "Clip Space",
        }
    }

    /// Translucent overlay that tells the stages apart at a glance
    pub fn tint(self) -> Color {
        match self {
            StageKind::Local => Color::RED.with_alpha(0.05),
            StageKind::World => Color::ORANGE.with_alpha(0.06),
            StageKind::View => Color::GREEN.with_alpha(0.05),
            StageKind::Clip => Color::DARKBLUE.with_alpha(0.07),
        }
    }

    /// Whether objects of `kind` appear in this stage at all
    pub fn draws(self, kind: ObjectKind) -> bool {
        !(kind == ObjectKind::Camera && matches!(self, StageKind::Local | StageKind::Clip))
    }
}

/// The matrix a stage draws an object with in place of its model matrix.
///
/// Clip space uses the world arrangement; its projection comes from the
/// observer (the virtual camera itself), not from an extra multiply here.
pub fn display_transform(stage: StageKind, model: &Matrix4<f32>, view: &Matrix4<f32>) -> Matrix4<f32> {
    match stage {
        StageKind::Local => Matrix4::identity(),
        StageKind::World | StageKind::Clip => *model,
        StageKind::View => view * model,
    }
}

/// Per-frame inputs shared by every stage
#[derive(Debug, Clone, Copy)]
pub struct FrameContext<'a> {
    pub dt: f32,
    pub fps: f32,
    pub input: &'a InputState,
}

/// The init/update/deinit lifecycle each stage adapter implements
pub trait Stage {
    fn kind(&self) -> StageKind;

    fn init(&mut self, _state: &VisualizationState) {}

    /// Redraw the stage's target from scratch
    fn update(&mut self, state: &mut VisualizationState, frame: &FrameContext, target: &mut dyn Renderer);

    fn deinit(&mut self) {}

    /// The camera this stage is looked at through
    fn observer(&self, state: &VisualizationState) -> ObserverView;

    /// Free or lock the stage's own observer camera. `None` if it has none.
    fn toggle_lock(&mut self) -> Option<bool> {
        None
    }

    fn is_locked(&self) -> bool {
        false
    }
}

/// Draw every object the stage shows with the stage's display transform
pub(crate) fn draw_objects(stage: StageKind, state: &VisualizationState, target: &mut dyn Renderer) {
    let view = state.camera().view_matrix();
    let scene = state.scene();
    for object in scene.objects().filter(|o| stage.draws(o.kind())) {
        let Some(mesh) = scene.mesh(object.mesh()) else {
            continue;
        };
        let transform = display_transform(stage, object.model_matrix(), &view);
        target.draw_mesh(mesh, &transform, object.color());
    }
}

/// Grid, then origin axes; the grid is keyed off the active observer
pub(crate) fn draw_reference(state: &mut VisualizationState, observer: &ObserverView, target: &mut dyn Renderer) {
    let grid = state.grid_mut();
    grid.set_camera_position(observer.eye);
    target.draw_grid(grid);

    let origin = Point3::origin();
    target.draw_line(&origin, &Point3::new(1.0, 0.0, 0.0), Color::RED);
    target.draw_line(&origin, &Point3::new(0.0, 1.0, 0.0), Color::GREEN);
    target.draw_line(&origin, &Point3::new(0.0, 0.0, 1.0), Color::BLUE);
    target.draw_sphere(&origin, AXIS_RADIUS, Color::BLACK.with_alpha(0.85));
}

/// "X", "Y" and "Z" next to the axis ends, placed through the observer
pub(crate) fn draw_axis_names(observer: &ObserverView, target: &mut dyn Renderer) {
    let names = [
        ("X", Point3::new(0.95, 0.25, 0.0), Color::RED),
        ("Y", Point3::new(0.1, 1.0, 0.1), Color::GREEN),
        ("Z", Point3::new(0.0, 0.25, 0.95), Color::BLUE),
    ];
    for (name, position, color) in names {
        if let Some((x, y)) = target.world_to_screen(observer, &position) {
            target.draw_text(x, y, name, color);
        }
    }
}

/// Marker points of the player, pushed through the same matrix as its mesh
pub fn marker_positions(stage: StageKind, state: &VisualizationState) -> Vec<(Point3<f32>, Color)> {
    let player = state.scene().object(ObjectKind::Player);
    let transform = display_transform(stage, player.model_matrix(), &state.camera().view_matrix());
    state
        .scene()
        .markers()
        .iter()
        .map(|marker| (transform.transform_point(&marker.local_position), marker.color))
        .collect()
}

/// Spheres inside the 3D scope; call [`draw_marker_labels`] after it ends
pub(crate) fn draw_markers(stage: StageKind, state: &VisualizationState, target: &mut dyn Renderer) {
    if !state.show_markers() {
        return;
    }
    for (position, color) in marker_positions(stage, state) {
        target.draw_sphere(&position, MARKER_RADIUS, color);
    }
}

pub(crate) fn draw_marker_labels(
    stage: StageKind,
    state: &VisualizationState,
    observer: &ObserverView,
    target: &mut dyn Renderer,
) {
    if !state.show_markers() {
        return;
    }
    for (position, color) in marker_positions(stage, state) {
        if let Some((x, y)) = target.world_to_screen(observer, &position) {
            let label = format!("({:.1}, {:.1}, {:.1})", position.x, position.y, position.z);
            target.draw_text(x, y, &label, color);
        }
    }
}

/// Line with a dot at the tip
pub(crate) fn draw_arrow(target: &mut dyn Renderer, from: &Point3<f32>, to: &Point3<f32>, color: Color) {
    target.draw_line(from, to, color);
    target.draw_sphere(to, 0.04, color);
}

/// Lines from `origin` along each of the three axes
pub(crate) fn draw_frame(target: &mut dyn Renderer, origin: &Point3<f32>, axes: [Vector3<f32>; 3]) {
    let colors = [Color::RED, Color::GREEN, Color::BLUE];
    for (axis, color) in axes.iter().zip(colors) {
        target.draw_line(origin, &(origin + axis), color);
    }
}

/// Stage tint, FPS and hint lines on top of the finished 3D scope
pub(crate) fn draw_overlay(stage: StageKind, frame: &FrameContext, hints: &[String], target: &mut dyn Renderer) {
    target.draw_tint(stage.tint());
    let line = target.line_height();
    let margin = 0.4 * line;
    target.draw_text(margin, margin, &format!("{:.0} FPS", frame.fps), Color::LIME);

    let height = target.viewport().height;
    for (i, hint) in hints.iter().rev().enumerate() {
        let y = height - line * (i as f32 + 1.0);
        target.draw_text(margin, y, hint, Color::DARKGRAY);
    }
}

/// Hint line describing an observer camera's lock state
pub(crate) fn lock_hint(locked: bool) -> String {
    if locked {
        "[L] observer locked".to_string()
    } else {
        "[L] observer free: WASD QE".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Viewport, VisualizerConfig};
    use crate::renderer::recording::{RecordingClipState, RecordingRenderer};
    use approx::assert_relative_eq;

    fn state() -> VisualizationState {
        VisualizationState::new(&VisualizerConfig::default(), &mut RecordingClipState::default()).unwrap()
    }

    #[test]
    fn test_stage_numbers_round_trip() {
        for stage in StageKind::ALL {
            assert_eq!(StageKind::from_number(stage.number()), Some(stage));
            assert_eq!(StageKind::ALL[stage.index()], stage);
        }
        assert_eq!(StageKind::from_number(0), None);
    }

    #[test]
    fn test_camera_hidden_in_local_and_clip() {
        assert!(!StageKind::Local.draws(ObjectKind::Camera));
        assert!(!StageKind::Clip.draws(ObjectKind::Camera));
        assert!(StageKind::World.draws(ObjectKind::Camera));
        assert!(StageKind::View.draws(ObjectKind::Camera));
        assert!(StageKind::Local.draws(ObjectKind::Player));
    }

    #[test]
    fn test_display_transform_table() {
        let state = state();
        let model = *state.scene().object(ObjectKind::Player).model_matrix();
        let view = state.camera().view_matrix();

        assert_eq!(display_transform(StageKind::Local, &model, &view), Matrix4::identity());
        assert_eq!(display_transform(StageKind::World, &model, &view), model);
        assert_eq!(display_transform(StageKind::Clip, &model, &view), model);
        assert_relative_eq!(display_transform(StageKind::View, &model, &view), view * model);
    }

    #[test]
    fn test_stages_draw_markers_with_the_player_mesh_matrix() {
        let mut state = state();
        state.set_markers(true);
        state.move_player(&Vector3::new(-0.5, 0.25, 1.0));
        let input = InputState::new();
        let frame = FrameContext {
            dt: 0.0,
            fps: 30.0,
            input: &input,
        };
        let mut stages: [Box<dyn Stage>; 4] = [
            Box::new(LocalStage::new()),
            Box::new(WorldStage::new()),
            Box::new(ViewStage::new()),
            Box::new(ClipStage::new()),
        ];

        for stage in stages.iter_mut() {
            let kind = stage.kind();
            let mut target = RecordingRenderer::new(Viewport::new(400.0, 300.0));
            stage.update(&mut state, &frame, &mut target);

            let player = state.scene().object(ObjectKind::Player);
            let expected = display_transform(kind, player.model_matrix(), &state.camera().view_matrix());
            let meshes = target.meshes();
            let (_, mesh_transform, _) = meshes
                .iter()
                .find(|(_, _, color)| *color == player.color())
                .unwrap();
            assert_relative_eq!(*mesh_transform, expected, epsilon = 1e-6);

            let spheres = target.spheres();
            for marker in state.scene().markers() {
                let position = mesh_transform.transform_point(&marker.local_position);
                assert!(
                    spheres
                        .iter()
                        .any(|(p, color)| *color == marker.color && (*p - position).norm() < 1e-5),
                    "{kind:?}: no marker sphere at {position:?}"
                );
            }

            assert_eq!(target.clear_color(), Some(Color::WHITE));
            assert_eq!(target.grid_positions(), vec![stage.observer(&state).eye]);
            assert_eq!(target.tints(), vec![kind.tint()]);
        }
    }

    #[test]
    fn test_markers_hidden_by_default() {
        let mut state = state();
        let input = InputState::new();
        let frame = FrameContext {
            dt: 0.0,
            fps: 30.0,
            input: &input,
        };
        let mut target = RecordingRenderer::new(Viewport::new(400.0, 300.0));
        LocalStage::new().update(&mut state, &frame, &mut target);

        // only the origin dot
        assert_eq!(target.spheres().len(), 1);
    }

    #[test]
    fn test_overlay_draws_tint_and_fps() {
        let mut target = RecordingRenderer::new(Viewport::new(320.0, 200.0));
        let input = InputState::new();
        let frame = FrameContext {
            dt: 0.016,
            fps: 60.0,
            input: &input,
        };
        draw_overlay(StageKind::World, &frame, &["hint".to_string()], &mut target);
        assert!(target.texts().contains(&"60 FPS".to_string()));
        assert!(target.texts().contains(&"hint".to_string()));
    }
}
