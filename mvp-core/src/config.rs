/// Visualization constants and the startup configuration bundle
use nalgebra::{Point3, Vector3};

use crate::error::{Result, VisualizerError};

/// Smallest vertical field of view the virtual camera accepts (degrees)
pub const FOV_MIN_VALUE: f32 = 1.0;
/// Largest vertical field of view the virtual camera accepts (degrees)
pub const FOV_MAX_VALUE: f32 = 179.0;

pub const NEAR_MIN: f32 = 0.05;
pub const NEAR_MAX: f32 = 4.0;
pub const FAR_MIN: f32 = 2.0;
pub const FAR_MAX: f32 = 64.0;

/// Minimum distance kept between the near and far planes after clamping
pub const MIN_DEPTH_GAP: f32 = 0.01;

/// Far-plane corners are pulled toward the eye by this factor when drawn,
/// so the far quad does not sit exactly on the clip boundary.
pub const FAR_PLANE_INSET: f32 = 0.9;

/// How long the display mode hint stays visible after a switch (seconds)
pub const MODE_HINT_DURATION: f32 = 0.75;

/// Player movement speed in world units per second
pub const PLAYER_SPEED: f32 = 1.0;

/// World stage hint for the movement keys, named after [`crate::input::Key`]
pub const PLAYER_CONTROLS: &str = "[Arrows] [Space] [Shift] move player";

/// Bound applied to matrix components typed into the parameter panel
pub const MATRIX_COMPONENT_LIMIT: f32 = 100.0;

pub const GRID_SPACING: f32 = 1.0;
pub const GRID_THICK: f32 = 0.03;
pub const GRID_SLICES: i32 = 256;

/// Clamping ranges for the virtual camera parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraLimits {
    pub fov_min: f32,
    pub fov_max: f32,
    pub near_min: f32,
    pub near_max: f32,
    pub far_min: f32,
    pub far_max: f32,
}

impl Default for CameraLimits {
    fn default() -> Self {
        Self {
            fov_min: FOV_MIN_VALUE,
            fov_max: FOV_MAX_VALUE,
            near_min: NEAR_MIN,
            near_max: NEAR_MAX,
            far_min: FAR_MIN,
            far_max: FAR_MAX,
        }
    }
}

impl CameraLimits {
    /// Check the ranges can be honored together: every `min <= max`, a
    /// positive near plane, and room for `MIN_DEPTH_GAP` below `far_max`
    pub fn validate(&self) -> Result<()> {
        let all = [
            self.fov_min,
            self.fov_max,
            self.near_min,
            self.near_max,
            self.far_min,
            self.far_max,
        ];
        if !all.iter().all(|v| v.is_finite()) {
            return Err(VisualizerError::InvalidLimits("non-finite bound".to_string()));
        }
        if !(self.fov_min > 0.0 && self.fov_min <= self.fov_max && self.fov_max < 180.0) {
            return Err(VisualizerError::InvalidLimits(format!(
                "fov range [{}, {}] outside (0, 180)",
                self.fov_min, self.fov_max
            )));
        }
        if !(self.near_min > 0.0 && self.near_min <= self.near_max) {
            return Err(VisualizerError::InvalidLimits(format!(
                "near range [{}, {}]",
                self.near_min, self.near_max
            )));
        }
        if self.far_min > self.far_max {
            return Err(VisualizerError::InvalidLimits(format!(
                "far range [{}, {}]",
                self.far_min, self.far_max
            )));
        }
        if self.near_min + MIN_DEPTH_GAP > self.far_max {
            return Err(VisualizerError::InvalidLimits(format!(
                "near_min {} leaves no room below far_max {}",
                self.near_min, self.far_max
            )));
        }
        Ok(())
    }
}

/// Raw virtual camera parameters, as typed by a user or read from the CLI
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraInput {
    pub eye: Point3<f32>,
    pub at: Point3<f32>,
    pub up: Vector3<f32>,
    pub fov_y_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraInput {
    fn default() -> Self {
        Self {
            eye: Point3::new(-3.0, 2.25, 0.0),
            at: Point3::new(0.0, 0.0, 0.0),
            up: Vector3::new(0.0, 1.0, 0.0),
            fov_y_degrees: 45.0,
            near: 0.5,
            far: 16.0,
        }
    }
}

/// Parameters of the infinite reference grid
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridParams {
    pub spacing: f32,
    pub thick: f32,
    pub slices: i32,
}

impl Default for GridParams {
    fn default() -> Self {
        Self {
            spacing: GRID_SPACING,
            thick: GRID_THICK,
            slices: GRID_SLICES,
        }
    }
}

/// Size of the MVP visualization area in pixels (or cell-equivalents).
///
/// This is the area the stage framebuffers are sized to, not the window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn aspect(&self) -> f32 {
        if self.height <= 0.0 {
            return 1.0;
        }
        self.width / self.height
    }
}

/// Everything the visualizer needs at startup
#[derive(Debug, Clone)]
pub struct VisualizerConfig {
    pub viewport: Viewport,
    pub limits: CameraLimits,
    pub camera: CameraInput,
    pub grid: GridParams,
    pub show_markers: bool,
    pub mode_hint_duration: f32,
    pub player_speed: f32,
    /// How the frontend's movement keys are labeled in the World stage
    pub player_controls: String,
    /// Seed for the enemy's initial heading
    pub seed: u64,
}

impl Default for VisualizerConfig {
    fn default() -> Self {
        Self {
            viewport: Viewport::new(1024.0, 800.0),
            limits: CameraLimits::default(),
            camera: CameraInput::default(),
            grid: GridParams::default(),
            show_markers: false,
            mode_hint_duration: MODE_HINT_DURATION,
            player_speed: PLAYER_SPEED,
            player_controls: PLAYER_CONTROLS.to_string(),
            seed: 0x5eed,
        }
    }
}
