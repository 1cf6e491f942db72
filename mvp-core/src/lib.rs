/// MVP Core Library - transform pipeline state shared by every frontend
///
/// This library holds the virtual camera, the scene objects and the four
/// stage adapters (local, world, view, clip) that draw the same scene
/// through a rendering backend supplied by the frontend.

pub mod camera;
pub mod command;
pub mod config;
pub mod error;
pub mod frustum;
pub mod geometry;
pub mod grid;
pub mod input;
pub mod observer;
pub mod renderer;
pub mod scene;
pub mod stage;
pub mod state;
pub mod transform;
pub mod visualizer;

// Re-export commonly used types
pub use camera::{BasisAxes, VirtualCamera};
pub use command::{parse_command, parse_display_mode, Command};
pub use config::{CameraInput, CameraLimits, GridParams, Viewport, VisualizerConfig};
pub use error::{Result, VisualizerError};
pub use frustum::Frustum;
pub use geometry::{Mesh, Triangle, Vertex};
pub use grid::GridShader;
pub use input::{InputState, Key, Modifiers};
pub use observer::ObserverView;
pub use renderer::{ClipPlaneState, ClipPlanes, Color, Renderer};
pub use stage::StageKind;
pub use state::{DisplayMode, Readout, VisualizationState};
pub use transform::Transform;
pub use visualizer::Visualizer;
