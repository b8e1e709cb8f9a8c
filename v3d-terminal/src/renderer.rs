/// ASCII rasterizer for surfaces and their edge outlines
use crossterm::{
    style::{Color, Print, ResetColor, SetForegroundColor},
    QueueableCommand,
};
use nalgebra::{Matrix4, Point3, Vector3};
use std::io::Write;
use v3d_core::{EdgeOutline, Face, Primitive, SurfaceKind};

use crate::camera::Camera;

/// Character luminosity ramp for shading (darkest to lightest)
const LUMINOSITY_RAMP: &[char] = &['.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// Edges are drawn slightly in front of the faces they outline
const EDGE_DEPTH_BIAS: f32 = 1e-4;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Cell {
    character: char,
    color: Color,
    depth: f32,
}

const EMPTY: Cell = Cell {
    character: ' ',
    color: Color::Reset,
    depth: f32::INFINITY,
};

/// Which primitive layers to draw
#[derive(Debug, Clone, Copy)]
pub struct Layers {
    pub faces: bool,
    pub edges: bool,
}

impl Default for Layers {
    fn default() -> Self {
        Self {
            faces: true,
            edges: true,
        }
    }
}

/// Depth-buffered character canvas
pub struct AsciiRenderer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl AsciiRenderer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![EMPTY; width * height],
        }
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.cells = vec![EMPTY; width * height];
    }

    pub fn clear(&mut self) {
        self.cells.fill(EMPTY);
    }

    /// Character at a cell, for inspection
    pub fn char_at(&self, x: usize, y: usize) -> Option<char> {
        (x < self.width && y < self.height).then(|| self.cells[y * self.width + x].character)
    }

    /// Draw all faces first, then outlines over them.
    pub fn render<'a, I>(&mut self, primitives: I, model_matrix: &Matrix4<f32>, camera: &Camera, layers: Layers)
    where
        I: IntoIterator<Item = &'a Primitive>,
    {
        let (faces, outlines): (Vec<&Primitive>, Vec<&Primitive>) = primitives
            .into_iter()
            .partition(|p| matches!(p, Primitive::Face(_)));

        if layers.faces {
            for face in faces.iter().filter_map(|p| p.as_face()) {
                self.render_face(face, model_matrix, camera);
            }
        }
        if layers.edges {
            for outline in outlines.iter().filter_map(|p| p.as_outline()) {
                self.render_outline(outline, model_matrix, camera);
            }
        }
    }

    fn project(&self, point: &Point3<f64>, model_matrix: &Matrix4<f32>, camera: &Camera) -> Option<(f32, f32, f32)> {
        camera.project_to_screen(&point.cast::<f32>(), model_matrix, self.width, self.height)
    }

    fn render_face(&mut self, face: &Face, model_matrix: &Matrix4<f32>, camera: &Camera) {
        // Surfaces are two-sided, so shade by the absolute facing
        let normal = model_matrix.transform_vector(&face.normal.cast::<f32>());
        let view_dir = (camera.position - camera.target).normalize();
        let light_dir = (view_dir + Vector3::z() * 0.5).normalize();
        let brightness = normal.dot(&light_dir).abs();

        let index = (brightness * (LUMINOSITY_RAMP.len() - 1) as f32) as usize;
        let character = LUMINOSITY_RAMP[index.min(LUMINOSITY_RAMP.len() - 1)];
        let color = kind_color(face.kind);

        for corners in face.triangle_positions() {
            let projected: Option<Vec<(f32, f32, f32)>> = corners
                .iter()
                .map(|p| self.project(p, model_matrix, camera))
                .collect();
            if let Some(coords) = projected {
                self.rasterize_triangle(&coords, character, color);
            }
        }
    }

    fn render_outline(&mut self, outline: &EdgeOutline, model_matrix: &Matrix4<f32>, camera: &Camera) {
        for (a, b) in outline.segments() {
            if let (Some(a), Some(b)) = (
                self.project(&a, model_matrix, camera),
                self.project(&b, model_matrix, camera),
            ) {
                self.rasterize_line(a, b);
            }
        }
    }

    fn plot(&mut self, x: i32, y: i32, depth: f32, character: char, color: Color) {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return;
        }
        let cell = &mut self.cells[y as usize * self.width + x as usize];
        if depth < cell.depth {
            *cell = Cell {
                character,
                color,
                depth,
            };
        }
    }

    fn rasterize_triangle(&mut self, coords: &[(f32, f32, f32)], character: char, color: Color) {
        let (v0, v1, v2) = (coords[0], coords[1], coords[2]);

        let min_x = (v0.0.min(v1.0).min(v2.0).floor() as i32).max(0);
        let max_x = (v0.0.max(v1.0).max(v2.0).ceil() as i32).min(self.width as i32 - 1);
        let min_y = (v0.1.min(v1.1).min(v2.1).floor() as i32).max(0);
        let max_y = (v0.1.max(v1.1).max(v2.1).ceil() as i32).min(self.height as i32 - 1);

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let p = (x as f32 + 0.5, y as f32 + 0.5);
                // Either winding counts: surfaces are double-sided
                if let Some((w0, w1, w2)) = barycentric((v0.0, v0.1), (v1.0, v1.1), (v2.0, v2.1), p) {
                    if w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0 {
                        let depth = w0 * v0.2 + w1 * v1.2 + w2 * v2.2;
                        self.plot(x, y, depth, character, color);
                    }
                }
            }
        }
    }

    fn rasterize_line(&mut self, a: (f32, f32, f32), b: (f32, f32, f32)) {
        let (dx, dy) = (b.0 - a.0, b.1 - a.1);
        let character = edge_char(dx, dy);
        let steps = dx.abs().max(dy.abs()).ceil().max(1.0) as i32;
        for i in 0..=steps {
            let t = i as f32 / steps as f32;
            let x = (a.0 + dx * t).floor() as i32;
            let y = (a.1 + dy * t).floor() as i32;
            let depth = a.2 + (b.2 - a.2) * t - EDGE_DEPTH_BIAS;
            self.plot(x, y, depth, character, Color::White);
        }
    }

    pub fn draw<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        for row in self.cells.chunks(self.width.max(1)) {
            for cell in row {
                writer.queue(SetForegroundColor(cell.color))?;
                writer.queue(Print(cell.character))?;
            }
            writer.queue(Print("\r\n"))?;
        }
        writer.queue(ResetColor)?;
        Ok(())
    }
}

fn kind_color(kind: SurfaceKind) -> Color {
    match kind {
        SurfaceKind::Radiating => Color::Red,
        SurfaceKind::Obstruction => Color::DarkGrey,
        SurfaceKind::Mask => Color::Cyan,
        SurfaceKind::Null => Color::Grey,
    }
}

/// Pick a line-drawing character for a screen-space direction
fn edge_char(dx: f32, dy: f32) -> char {
    // Rows are about twice as tall as columns
    let angle = (dy * 2.0).atan2(dx).to_degrees().rem_euclid(180.0);
    match angle {
        a if a < 22.5 || a >= 157.5 => '-',
        a if a < 67.5 => '\\',
        a if a < 112.5 => '|',
        _ => '/',
    }
}

/// Barycentric coordinates of `p` in a screen-space triangle, `None` if degenerate
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

#[cfg(test)]
mod tests {
    use super::*;
    use v3d_core::{build_primitives, parse_input};

    const SQUARE: &str = "V 1 -1 -1 0\nV 2 1 -1 0\nV 3 1 1 0\nV 4 -1 1 0\nS 1 1 2 3 4 0 0 0.9 floor\n";

    fn render(layers: Layers) -> AsciiRenderer {
        let model = parse_input(SQUARE).unwrap();
        let primitives = build_primitives(&model).unwrap();
        let mut camera = Camera::new(60, 30);
        let (min, max) = model.bounds().unwrap();
        camera.frame_bounds(min, max);
        let mut renderer = AsciiRenderer::new(60, 30);
        renderer.render(&primitives, &Matrix4::identity(), &camera, layers);
        renderer
    }

    #[test]
    fn test_face_covers_screen_centre() {
        let renderer = render(Layers { faces: true, edges: false });
        let c = renderer.char_at(30, 15).unwrap();
        assert!(LUMINOSITY_RAMP.contains(&c));
    }

    #[test]
    fn test_edges_only_leave_centre_empty() {
        let renderer = render(Layers { faces: false, edges: true });
        assert_eq!(renderer.char_at(30, 15), Some(' '));
        let drawn = renderer.cells.iter().filter(|c| c.character != ' ').count();
        assert!(drawn > 0);
    }

    #[test]
    fn test_clear_resets_cells() {
        let mut renderer = render(Layers::default());
        renderer.clear();
        assert!(renderer.cells.iter().all(|c| *c == EMPTY));
    }

    #[test]
    fn test_edge_chars() {
        assert_eq!(edge_char(1.0, 0.0), '-');
        assert_eq!(edge_char(0.0, 1.0), '|');
        assert_eq!(edge_char(1.0, 0.5), '\\');
        assert_eq!(edge_char(1.0, -0.5), '/');
    }

    #[test]
    fn test_barycentric_degenerate() {
        assert!(barycentric((0.0, 0.0), (1.0, 1.0), (2.0, 2.0), (0.5, 0.5)).is_none());
    }
}
