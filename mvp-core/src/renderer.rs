/// Boundary between the visualizer core and whatever rasterizes it
use nalgebra::{Matrix4, Point3};

use crate::config::Viewport;
use crate::geometry::Mesh;
use crate::grid::GridShader;
use crate::observer::ObserverView;

/// RGBA color, alpha in 0..=255
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const GRAY: Color = Color::rgb(130, 130, 130);
    pub const DARKGRAY: Color = Color::rgb(80, 80, 80);
    pub const RED: Color = Color::rgb(230, 41, 55);
    pub const GREEN: Color = Color::rgb(0, 228, 48);
    pub const BLUE: Color = Color::rgb(0, 121, 241);
    pub const DARKBLUE: Color = Color::rgb(0, 82, 172);
    pub const ORANGE: Color = Color::rgb(255, 161, 0);
    pub const YELLOW: Color = Color::rgb(253, 249, 0);
    pub const PURPLE: Color = Color::rgb(200, 122, 255);
    pub const MAGENTA: Color = Color::rgb(255, 0, 255);
    pub const LIME: Color = Color::rgb(0, 158, 47);
    pub const BROWN: Color = Color::rgb(127, 106, 79);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Same color with alpha replaced by `alpha` in 0.0..=1.0
    pub fn with_alpha(self, alpha: f32) -> Self {
        Self {
            a: (alpha.clamp(0.0, 1.0) * 255.0).round() as u8,
            ..self
        }
    }

    pub fn alpha(&self) -> f32 {
        self.a as f32 / 255.0
    }

    /// Alpha-blend `self` over `base`; the result is opaque
    pub fn over(self, base: Color) -> Color {
        let t = self.alpha();
        let mix = |top: u8, bottom: u8| (top as f32 * t + bottom as f32 * (1.0 - t)).round() as u8;
        Color::rgb(mix(self.r, base.r), mix(self.g, base.g), mix(self.b, base.b))
    }

    /// Scale the color channels, keeping alpha
    pub fn shade(self, factor: f32) -> Color {
        let f = factor.clamp(0.0, 1.0);
        Color {
            r: (self.r as f32 * f) as u8,
            g: (self.g as f32 * f) as u8,
            b: (self.b as f32 * f) as u8,
            a: self.a,
        }
    }
}

/// Near and far clip distances used for every 3D scope
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipPlanes {
    pub near: f32,
    pub far: f32,
}

impl Default for ClipPlanes {
    fn default() -> Self {
        Self { near: 0.01, far: 1000.0 }
    }
}

/// Process-wide clip plane setting of the rendering backend.
///
/// Backends build every 3D scope's projection from this, so it has to be
/// re-applied whenever the virtual camera's near/far change.
pub trait ClipPlaneState {
    fn set_clip_planes(&mut self, planes: ClipPlanes);
    fn clip_planes(&self) -> ClipPlanes;
}

/// An offscreen target one stage draws into each frame.
///
/// Positions passed to the 3D calls are in whatever space the stage chose;
/// the backend applies only the observer's view and projection on top.
pub trait Renderer {
    /// Logical size of the target, the same units `draw_text` uses
    fn viewport(&self) -> Viewport;

    fn clip_planes(&self) -> ClipPlanes;

    /// Vertical distance between text lines, in viewport units
    fn line_height(&self) -> f32 {
        20.0
    }

    fn clear(&mut self, color: Color);

    fn begin_3d(&mut self, observer: &ObserverView);

    fn end_3d(&mut self);

    fn draw_mesh(&mut self, mesh: &Mesh, transform: &Matrix4<f32>, color: Color);

    fn draw_line(&mut self, from: &Point3<f32>, to: &Point3<f32>, color: Color);

    fn draw_sphere(&mut self, center: &Point3<f32>, radius: f32, color: Color);

    fn draw_grid(&mut self, grid: &GridShader);

    /// Blend a translucent rectangle over the whole target
    fn draw_tint(&mut self, color: Color);

    fn draw_text(&mut self, x: f32, y: f32, text: &str, color: Color);

    /// Project a point through the observer the way this target would
    fn world_to_screen(&self, observer: &ObserverView, point: &Point3<f32>) -> Option<(f32, f32)> {
        observer
            .project_to_screen(point, self.viewport(), self.clip_planes())
            .map(|(x, y, _)| (x, y))
    }
}

#[cfg(test)]
pub(crate) mod recording {
    use super::*;

    /// A draw call captured by [`RecordingRenderer`]
    #[derive(Debug, Clone)]
    pub enum DrawCall {
        Clear(Color),
        Begin3d(ObserverView),
        End3d,
        Mesh {
            triangles: usize,
            transform: Matrix4<f32>,
            color: Color,
        },
        Line(Point3<f32>, Point3<f32>, Color),
        Sphere(Point3<f32>, Color),
        Grid(Point3<f32>),
        Tint(Color),
        Text(String),
    }

    /// Clip plane setting that remembers the last push and counts them
    #[derive(Debug, Default)]
    pub struct RecordingClipState {
        pub planes: ClipPlanes,
        pub pushes: usize,
    }

    impl ClipPlaneState for RecordingClipState {
        fn set_clip_planes(&mut self, planes: ClipPlanes) {
            self.planes = planes;
            self.pushes += 1;
        }

        fn clip_planes(&self) -> ClipPlanes {
            self.planes
        }
    }

    /// Renderer that only remembers what it was asked to draw
    pub struct RecordingRenderer {
        pub viewport: Viewport,
        pub clip: ClipPlanes,
        pub calls: Vec<DrawCall>,
    }

    impl RecordingRenderer {
        pub fn new(viewport: Viewport) -> Self {
            Self {
                viewport,
                clip: ClipPlanes::default(),
                calls: Vec::new(),
            }
        }

        pub fn meshes(&self) -> Vec<(usize, Matrix4<f32>, Color)> {
            self.calls
                .iter()
                .filter_map(|c| match c {
                    DrawCall::Mesh {
                        triangles,
                        transform,
                        color,
                    } => Some((*triangles, *transform, *color)),
                    _ => None,
                })
                .collect()
        }

        pub fn observers(&self) -> Vec<ObserverView> {
            self.calls
                .iter()
                .filter_map(|c| match c {
                    DrawCall::Begin3d(view) => Some(*view),
                    _ => None,
                })
                .collect()
        }

        pub fn lines(&self) -> Vec<(Point3<f32>, Point3<f32>, Color)> {
            self.calls
                .iter()
                .filter_map(|c| match c {
                    DrawCall::Line(a, b, color) => Some((*a, *b, *color)),
                    _ => None,
                })
                .collect()
        }

        pub fn spheres(&self) -> Vec<(Point3<f32>, Color)> {
            self.calls
                .iter()
                .filter_map(|c| match c {
                    DrawCall::Sphere(p, color) => Some((*p, *color)),
                    _ => None,
                })
                .collect()
        }

        /// Grid camera positions, one per `draw_grid`
        pub fn grid_positions(&self) -> Vec<Point3<f32>> {
            self.calls
                .iter()
                .filter_map(|c| match c {
                    DrawCall::Grid(p) => Some(*p),
                    _ => None,
                })
                .collect()
        }

        pub fn tints(&self) -> Vec<Color> {
            self.calls
                .iter()
                .filter_map(|c| match c {
                    DrawCall::Tint(color) => Some(*color),
                    _ => None,
                })
                .collect()
        }

        pub fn clear_color(&self) -> Option<Color> {
            match self.calls.first() {
                Some(DrawCall::Clear(color)) => Some(*color),
                _ => None,
            }
        }

        pub fn texts(&self) -> Vec<String> {
            self.calls
                .iter()
                .filter_map(|c| match c {
                    DrawCall::Text(text) => Some(text.clone()),
                    _ => None,
                })
                .collect()
        }
    }

    impl Renderer for RecordingRenderer {
        fn viewport(&self) -> Viewport {
            self.viewport
        }

        fn clip_planes(&self) -> ClipPlanes {
            self.clip
        }

        fn clear(&mut self, color: Color) {
            self.calls.clear();
            self.calls.push(DrawCall::Clear(color));
        }

        fn begin_3d(&mut self, observer: &ObserverView) {
            self.calls.push(DrawCall::Begin3d(*observer));
        }

        fn end_3d(&mut self) {
            self.calls.push(DrawCall::End3d);
        }

        fn draw_mesh(&mut self, mesh: &Mesh, transform: &Matrix4<f32>, color: Color) {
            self.calls.push(DrawCall::Mesh {
                triangles: mesh.triangles.len(),
                transform: *transform,
                color,
            });
        }

        fn draw_line(&mut self, from: &Point3<f32>, to: &Point3<f32>, color: Color) {
            self.calls.push(DrawCall::Line(*from, *to, color));
        }

        fn draw_sphere(&mut self, center: &Point3<f32>, _radius: f32, color: Color) {
            self.calls.push(DrawCall::Sphere(*center, color));
        }

        fn draw_grid(&mut self, grid: &GridShader) {
            self.calls.push(DrawCall::Grid(grid.camera_position()));
        }

        fn draw_tint(&mut self, color: Color) {
            self.calls.push(DrawCall::Tint(color));
        }

        fn draw_text(&mut self, _x: f32, _y: f32, text: &str, _color: Color) {
            self.calls.push(DrawCall::Text(text.to_string()));
        }
    }
}
