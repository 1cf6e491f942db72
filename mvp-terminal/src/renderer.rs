/// ASCII rasterizer for terminal rendering
use std::cell::Cell as SharedCell;
use std::io::Write;
use std::rc::Rc;

use crossterm::{
    cursor::MoveTo,
    style::{Color as TermColor, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    QueueableCommand,
};
use mvp_core::{ClipPlaneState, ClipPlanes, Color, GridShader, Mesh, ObserverView, Renderer, Triangle, Viewport};
use nalgebra::{Matrix4, Point3, Vector3};
use tracing::trace;

/// Character luminosity ramp for shading (darkest to lightest)
const LUMINOSITY_RAMP: &[char] = &['.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// Grid lines further than this from the observer are not drawn
const GRID_DRAW_RADIUS: f32 = 24.0;
const GRID_MIN_ALPHA: f32 = 0.05;
/// Lines whose projection would need more steps than this are skipped
const MAX_LINE_STEPS: usize = 4096;

/// The terminal's clip plane setting, shared by all four stage targets
#[derive(Debug, Clone, Default)]
pub struct SharedClipPlanes(Rc<SharedCell<ClipPlanes>>);

impl ClipPlaneState for SharedClipPlanes {
    fn set_clip_planes(&mut self, planes: ClipPlanes) {
        self.0.set(planes);
    }

    fn clip_planes(&self) -> ClipPlanes {
        self.0.get()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cell {
    pub glyph: char,
    pub fg: Color,
    pub bg: Color,
}

impl Cell {
    fn blank(bg: Color) -> Self {
        Self { glyph: ' ', fg: bg, bg }
    }
}

/// One stage target: a grid of terminal cells behind a logical viewport.
///
/// Coordinates passed to the `Renderer` calls are in viewport units and
/// are scaled onto however many cells the target currently has.
pub struct AsciiRenderer {
    viewport: Viewport,
    width: usize,
    height: usize,
    depth_buffer: Vec<f32>,
    cells: Vec<Cell>,
    clip: SharedClipPlanes,
    observer: Option<ObserverView>,
}

impl AsciiRenderer {
    pub fn new(width: usize, height: usize, viewport: Viewport, clip: SharedClipPlanes) -> Self {
        let size = width * height;
        Self {
            viewport,
            width,
            height,
            depth_buffer: vec![f32::INFINITY; size],
            cells: vec![Cell::blank(Color::BLACK); size],
            clip,
            observer: None,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Change the number of cells; the content is dropped
    pub fn resize(&mut self, width: usize, height: usize) {
        if (width, height) == (self.width, self.height) {
            return;
        }
        trace!(width, height, "resizing stage target");
        self.width = width;
        self.height = height;
        let size = width * height;
        self.depth_buffer = vec![f32::INFINITY; size];
        self.cells = vec![Cell::blank(Color::BLACK); size];
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn cell(&self, x: usize, y: usize) -> Option<&Cell> {
        if x < self.width && y < self.height {
            self.cells.get(y * self.width + x)
        } else {
            None
        }
    }

    /// Viewport units to fractional cell coordinates
    fn to_cell(&self, x: f32, y: f32) -> (f32, f32) {
        (
            x * self.width as f32 / self.viewport.width.max(1.0),
            y * self.height as f32 / self.viewport.height.max(1.0),
        )
    }

    /// Project through the active observer straight to cell coordinates
    fn project(&self, point: &Point3<f32>) -> Option<(f32, f32, f32)> {
        let observer = self.observer.as_ref()?;
        let (x, y, depth) = observer.project_to_screen(point, self.viewport, self.clip.clip_planes())?;
        let (col, row) = self.to_cell(x, y);
        Some((col, row, depth))
    }

    fn plot(&mut self, x: i32, y: i32, depth: f32, glyph: char, fg: Color, bg: Option<Color>) {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return;
        }
        if !(-1.0..=1.0).contains(&depth) {
            return;
        }
        let idx = y as usize * self.width + x as usize;
        if depth <= self.depth_buffer[idx] {
            self.depth_buffer[idx] = depth;
            let cell = &mut self.cells[idx];
            cell.glyph = glyph;
            cell.fg = fg.over(cell.bg);
            if let Some(bg) = bg {
                cell.bg = bg.over(cell.bg);
            }
        }
    }

    fn render_triangle(&mut self, triangle: &Triangle, transform: &Matrix4<f32>, color: Color) {
        let mut screen_coords = [(0.0, 0.0, 0.0); 3];
        for (out, vertex) in screen_coords.iter_mut().zip(triangle.vertices.iter()) {
            match self.project(&transform.transform_point(&vertex.position)) {
                Some(projected) => *out = projected,
                None => return, // Triangle is clipped
            }
        }

        // Lambert against a light over the observer's shoulder
        let normal = transform.transform_vector(&triangle.calculate_normal());
        let brightness = match self.observer {
            Some(observer) => {
                let light = (observer.eye - observer.at + Vector3::y() * 2.0).normalize();
                0.35 + 0.65 * normal.normalize().dot(&light).max(0.0)
            }
            None => 1.0,
        };

        let ramp_index = ((brightness * (LUMINOSITY_RAMP.len() - 1) as f32) as usize).min(LUMINOSITY_RAMP.len() - 1);
        let glyph = LUMINOSITY_RAMP[ramp_index];
        let fill = color.shade(brightness);
        self.rasterize_triangle(&screen_coords, glyph, fill.shade(0.6), fill);
    }

    fn rasterize_triangle(&mut self, coords: &[(f32, f32, f32); 3], glyph: char, fg: Color, bg: Color) {
        let (v0, v1, v2) = (coords[0], coords[1], coords[2]);

        // Bounding box, clipped to the target
        let min_x = (v0.0.min(v1.0).min(v2.0).floor() as i32).max(0);
        let max_x = (v0.0.max(v1.0).max(v2.0).ceil() as i32).min(self.width as i32 - 1);
        let min_y = (v0.1.min(v1.1).min(v2.1).floor() as i32).max(0);
        let max_y = (v0.1.max(v1.1).max(v2.1).ceil() as i32).min(self.height as i32 - 1);

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let p = (x as f32 + 0.5, y as f32 + 0.5);
                let Some((w0, w1, w2)) = barycentric((v0.0, v0.1), (v1.0, v1.1), (v2.0, v2.1), p) else {
                    continue;
                };
                if w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0 {
                    let depth = w0 * v0.2 + w1 * v1.2 + w2 * v2.2;
                    self.plot(x, y, depth, glyph, fg, Some(bg));
                }
            }
        }
    }

    fn rasterize_line(&mut self, from: (f32, f32, f32), to: (f32, f32, f32), color: Color) {
        let (dx, dy) = (to.0 - from.0, to.1 - from.1);
        let steps = dx.abs().max(dy.abs()).ceil() as usize;
        if steps > MAX_LINE_STEPS {
            return;
        }
        let glyph = line_glyph(dx, dy);
        for i in 0..=steps {
            let t = if steps == 0 { 0.0 } else { i as f32 / steps as f32 };
            let x = from.0 + dx * t;
            let y = from.1 + dy * t;
            let depth = from.2 + (to.2 - from.2) * t;
            self.plot(x.floor() as i32, y.floor() as i32, depth, glyph, color, None);
        }
    }

    /// Write the cells at a terminal position
    pub fn draw<W: Write>(&self, writer: &mut W, column: u16, row: u16) -> std::io::Result<()> {
        for y in 0..self.height {
            writer.queue(MoveTo(column, row + y as u16))?;
            for x in 0..self.width {
                let cell = self.cells[y * self.width + x];
                writer.queue(SetBackgroundColor(term_color(cell.bg)))?;
                writer.queue(SetForegroundColor(term_color(cell.fg)))?;
                writer.queue(Print(cell.glyph))?;
            }
        }
        writer.queue(ResetColor)?;
        Ok(())
    }
}

impl Renderer for AsciiRenderer {
    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn clip_planes(&self) -> ClipPlanes {
        self.clip.clip_planes()
    }

    /// One text row per cell row
    fn line_height(&self) -> f32 {
        self.viewport.height / self.height.max(1) as f32
    }

    fn clear(&mut self, color: Color) {
        self.depth_buffer.fill(f32::INFINITY);
        self.cells.fill(Cell::blank(color));
        self.observer = None;
    }

    fn begin_3d(&mut self, observer: &ObserverView) {
        self.observer = Some(*observer);
    }

    fn end_3d(&mut self) {
        self.observer = None;
    }

    fn draw_mesh(&mut self, mesh: &Mesh, transform: &Matrix4<f32>, color: Color) {
        for triangle in &mesh.triangles {
            self.render_triangle(triangle, transform, color);
        }
    }

    fn draw_line(&mut self, from: &Point3<f32>, to: &Point3<f32>, color: Color) {
        if let (Some(a), Some(b)) = (self.project(from), self.project(to)) {
            self.rasterize_line(a, b, color);
        }
    }

    fn draw_sphere(&mut self, center: &Point3<f32>, _radius: f32, color: Color) {
        if let Some((x, y, depth)) = self.project(center) {
            self.plot(x.floor() as i32, y.floor() as i32, depth, '●', color, None);
        }
    }

    fn draw_grid(&mut self, grid: &GridShader) {
        for (from, to, color) in grid.segments(GRID_DRAW_RADIUS, GRID_MIN_ALPHA) {
            self.draw_line(&from, &to, color);
        }
    }

    fn draw_tint(&mut self, color: Color) {
        for cell in self.cells.iter_mut() {
            cell.bg = color.over(cell.bg);
            cell.fg = color.over(cell.fg);
        }
    }

    fn draw_text(&mut self, x: f32, y: f32, text: &str, color: Color) {
        let (col, row) = self.to_cell(x, y);
        if row < 0.0 || row as usize >= self.height {
            return;
        }
        let row = row as usize;
        for (i, glyph) in text.chars().enumerate() {
            let col = col.floor() as i64 + i as i64;
            if col < 0 {
                continue;
            }
            let col = col as usize;
            if col >= self.width {
                break;
            }
            let cell = &mut self.cells[row * self.width + col];
            cell.glyph = glyph;
            cell.fg = color.over(cell.bg);
        }
    }
}

fn term_color(color: Color) -> TermColor {
    TermColor::Rgb {
        r: color.r,
        g: color.g,
        b: color.b,
    }
}

/// Glyph that best follows a line with the given cell-space direction
fn line_glyph(dx: f32, dy: f32) -> char {
    let (ax, ay) = (dx.abs(), dy.abs());
    if ay < 0.4 * ax {
        '-'
    } else if ax < 0.4 * ay {
        '|'
    } else if (dx > 0.0) == (dy > 0.0) {
        '\\'
    } else {
        '/'
    }
}

/// Calculate barycentric coordinates for a point in a triangle
fn barycentric(v0: (f32, f32), v1: (f32, f32), v2: (f32, f32), p: (f32, f32)) -> Option<(f32, f32, f32)> {
    let denom = (v1.1 - v2.1) * (v0.0 - v2.0) + (v2.0 - v1.0) * (v0.1 - v2.1);

    if denom.abs() < 1e-6 {
        return None;
    }

    let w0 = ((v1.1 - v2.1) * (p.0 - v2.0) + (v2.0 - v1.0) * (p.1 - v2.1)) / denom;
    let w1 = ((v2.1 - v0.1) * (p.0 - v2.0) + (v0.0 - v2.0) * (p.1 - v2.1)) / denom;
    let w2 = 1.0 - w0 - w1;

    Some((w0, w1, w2))
}
