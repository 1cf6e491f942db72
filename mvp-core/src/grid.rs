/// Infinite reference grid on the XZ plane, modelled after its fragment shader
use nalgebra::Point3;
use tracing::info;

use crate::config::GridParams;
use crate::error::{Result, VisualizerError};
use crate::renderer::Color;

const INNER_COLOR: Color = Color::rgb(56, 56, 56);
const OUTER_COLOR: Color = Color::rgb(97, 97, 97);
const X_AXIS_COLOR: Color = Color::rgb(230, 41, 54);
const Z_AXIS_COLOR: Color = Color::rgb(0, 120, 240);
const HEIGHT_TO_FADE_DISTANCE_RATIO: f32 = 36.0;

/// Which part of the grid a fragment belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridMark {
    /// The line z = 0, i.e. along the X axis
    XAxis,
    /// The line x = 0, i.e. along the Z axis
    ZAxis,
    /// Any other cell border
    Line,
    Interior,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridFragment {
    pub mark: GridMark,
    /// Color with the distance fade already folded into alpha
    pub color: Color,
}

/// The grid "program": fixed uniforms set at load, camera position per draw
#[derive(Debug, Clone)]
pub struct GridShader {
    params: GridParams,
    camera_position: Point3<f32>,
}

impl GridShader {
    /// Validate the fixed uniforms. A failure here is a startup abort.
    pub fn load(params: GridParams) -> Result<Self> {
        if !(params.spacing.is_finite() && params.spacing > 0.0) {
            return Err(VisualizerError::InvalidGrid(format!(
                "spacing must be positive, got {}",
                params.spacing
            )));
        }
        if !(params.thick.is_finite() && params.thick > 0.0 && params.thick < params.spacing) {
            return Err(VisualizerError::InvalidGrid(format!(
                "thick must be in (0, spacing), got {}",
                params.thick
            )));
        }
        if params.slices <= 0 {
            return Err(VisualizerError::InvalidGrid(format!(
                "slices must be positive, got {}",
                params.slices
            )));
        }

        info!(?params, "grid shader loaded");
        Ok(Self {
            params,
            camera_position: Point3::origin(),
        })
    }

    /// Update the `cameraPosition` uniform; called before every grid draw
    pub fn set_camera_position(&mut self, position: Point3<f32>) {
        self.camera_position = position;
    }

    pub fn camera_position(&self) -> Point3<f32> {
        self.camera_position
    }

    /// Half the side of the plane quad, which follows the camera in XZ
    pub fn half_extent(&self) -> f32 {
        0.5 * self.params.spacing * self.params.slices as f32
    }

    /// Distance at which the fade is measured, driven by camera height
    pub fn fade_distance(&self) -> f32 {
        let slices = self.params.slices as f32;
        (HEIGHT_TO_FADE_DISTANCE_RATIO * self.camera_position.y.abs())
            .clamp(0.01 * slices, 0.32 * slices)
    }

    pub fn alpha_at(&self, x: f32, z: f32) -> f32 {
        let dx = x - self.camera_position.x;
        let dz = z - self.camera_position.z;
        let distance = dx.hypot(dz);
        0.9 - smoothstep(0.0, 0.9, distance / self.fade_distance())
    }

    /// Shade the plane point (x, 0, z); `None` outside the plane quad
    pub fn shade(&self, x: f32, z: f32) -> Option<GridFragment> {
        let half = self.half_extent();
        if (x - self.camera_position.x).abs() > half || (z - self.camera_position.z).abs() > half {
            return None;
        }

        let spacing = self.params.spacing;
        let half_thick = 0.5 * self.params.thick;
        let cell_x = fract(x / spacing) * spacing;
        let cell_z = fract(z / spacing) * spacing;
        let on_border = |cell: f32| cell < half_thick || cell > spacing - half_thick;

        let (mark, base) = if x.abs() < half_thick {
            (GridMark::ZAxis, Z_AXIS_COLOR)
        } else if z.abs() < half_thick {
            (GridMark::XAxis, X_AXIS_COLOR)
        } else if on_border(cell_x) || on_border(cell_z) {
            (GridMark::Line, OUTER_COLOR)
        } else {
            (GridMark::Interior, INNER_COLOR)
        };

        Some(GridFragment {
            mark,
            color: base.with_alpha(self.alpha_at(x, z)),
        })
    }

    /// Grid lines around the camera as short segments with their shaded color.
    ///
    /// Segments are one cell long so the fade can vary along a line; anything
    /// beyond `max_radius` or fainter than `min_alpha` is skipped.
    pub fn segments(&self, max_radius: f32, min_alpha: f32) -> Vec<(Point3<f32>, Point3<f32>, Color)> {
        let spacing = self.params.spacing;
        let radius = max_radius.min(self.half_extent());
        let cells = (radius / spacing).ceil() as i32;
        let base_x = (self.camera_position.x / spacing).round() as i32;
        let base_z = (self.camera_position.z / spacing).round() as i32;

        let mut segments = Vec::new();
        for line in -cells..=cells {
            for step in -cells..cells {
                let fixed = (base_x + line) as f32 * spacing;
                let a = (base_z + step) as f32 * spacing;
                let b = a + spacing;
                self.push_segment(&mut segments, (fixed, a), (fixed, b), min_alpha);

                let fixed = (base_z + line) as f32 * spacing;
                let a = (base_x + step) as f32 * spacing;
                let b = a + spacing;
                self.push_segment(&mut segments, (a, fixed), (b, fixed), min_alpha);
            }
        }
        segments
    }

    fn push_segment(
        &self,
        out: &mut Vec<(Point3<f32>, Point3<f32>, Color)>,
        from: (f32, f32),
        to: (f32, f32),
        min_alpha: f32,
    ) {
        let mid = (0.5 * (from.0 + to.0), 0.5 * (from.1 + to.1));
        if let Some(fragment) = self.shade(mid.0, mid.1) {
            if fragment.mark != GridMark::Interior && fragment.color.alpha() >= min_alpha {
                out.push((
                    Point3::new(from.0, 0.0, from.1),
                    Point3::new(to.0, 0.0, to.1),
                    fragment.color,
                ));
            }
        }
    }
}

fn fract(value: f32) -> f32 {
    value - value.floor()
}

fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> GridShader {
        let mut grid = GridShader::load(GridParams::default()).unwrap();
        grid.set_camera_position(Point3::new(1.5, 3.0, 8.5));
        grid
    }

    #[test]
    fn test_rejects_bad_uniforms() {
        let bad = GridParams {
            spacing: 0.0,
            ..GridParams::default()
        };
        assert!(matches!(GridShader::load(bad), Err(VisualizerError::InvalidGrid(_))));
        let bad = GridParams {
            slices: 0,
            ..GridParams::default()
        };
        assert!(GridShader::load(bad).is_err());
    }

    #[test]
    fn test_axis_lines_are_colored() {
        let grid = grid();
        assert_eq!(grid.shade(0.0, 3.4).unwrap().mark, GridMark::ZAxis);
        assert_eq!(grid.shade(2.5, 0.0).unwrap().mark, GridMark::XAxis);
        assert_eq!(grid.shade(2.0, 3.5).unwrap().mark, GridMark::Line);
        assert_eq!(grid.shade(2.5, 3.5).unwrap().mark, GridMark::Interior);
    }

    #[test]
    fn test_fades_with_distance() {
        let grid = grid();
        let close = grid.alpha_at(1.5, 8.5);
        let far = grid.alpha_at(60.0, 60.0);
        assert!((close - 0.9).abs() < 1e-6);
        assert!(far < close);
    }

    #[test]
    fn test_fade_distance_is_clamped() {
        let mut grid = grid();
        grid.set_camera_position(Point3::new(0.0, 0.0, 0.0));
        assert!((grid.fade_distance() - 0.01 * 256.0).abs() < 1e-4);
        grid.set_camera_position(Point3::new(0.0, 1000.0, 0.0));
        assert!((grid.fade_distance() - 0.32 * 256.0).abs() < 1e-4);
    }

    #[test]
    fn test_plane_follows_camera() {
        let mut grid = grid();
        assert!(grid.shade(1000.0, 0.0).is_none());
        grid.set_camera_position(Point3::new(1000.0, 2.0, 0.0));
        assert!(grid.shade(1000.0, 0.0).is_some());
    }

    #[test]
    fn test_segments_are_unit_length_and_on_lines() {
        let grid = grid();
        let segments = grid.segments(12.0, 0.05);
        assert!(!segments.is_empty());
        for (a, b, _) in &segments {
            assert!(((a - b).norm() - 1.0).abs() < 1e-5);
            assert_eq!(a.y, 0.0);
            assert!(a.x.fract() == 0.0 || a.z.fract() == 0.0);
        }
        assert!(segments.iter().any(|(_, _, c)| c.r == X_AXIS_COLOR.r && c.g == X_AXIS_COLOR.g));
    }
}
