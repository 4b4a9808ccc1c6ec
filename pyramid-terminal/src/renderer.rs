/// Character-cell rasterizer for the pyramid scene
use crossterm::{
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    QueueableCommand,
};
use nalgebra::Matrix4;
use pyramid_core::scene::Lights;
use pyramid_core::{Camera, Rgb, Scene, SceneMesh, Sprite, StandardMaterial, Triangle};
use std::io::Write;

/// Character luminosity ramp for depth/shading (darkest to lightest)
const LUMINOSITY_RAMP: &[char] = &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// How far (world units) a depth-tested label may sit behind a surface and
/// still show; labels hug the faces they describe
const LABEL_DEPTH_SLACK: f32 = 0.6;

/// Below this opacity a label is not drawn at all
const MIN_LABEL_OPACITY: f32 = 0.15;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Cell {
    glyph: char,
    color: Rgb,
}

/// Rasterizes lit meshes and label text into terminal cells
pub struct CellRenderer {
    width: usize,
    height: usize,
    background: Rgb,
    /// View-space distance of the nearest surface per cell
    depth_buffer: Vec<f32>,
    cells: Vec<Cell>,
}

impl CellRenderer {
    pub fn new(width: usize, height: usize) -> Self {
        let size = width * height;
        let background = Rgb::BLACK;
        Self {
            width,
            height,
            background,
            depth_buffer: vec![f32::INFINITY; size],
            cells: vec![
                Cell {
                    glyph: ' ',
                    color: background,
                };
                size
            ],
        }
    }

    pub fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        *self = Self {
            background: self.background,
            ..Self::new(width, height)
        };
    }

    pub fn clear(&mut self, background: Rgb) {
        self.background = background;
        self.depth_buffer.fill(f32::INFINITY);
        self.cells.fill(Cell {
            glyph: ' ',
            color: background,
        });
    }

    pub fn render_scene(&mut self, scene: &Scene, camera: &Camera) {
        self.clear(scene.background);
        for mesh in &scene.meshes {
            self.render_mesh(mesh, &scene.lights, camera);
        }
        for label in &scene.labels {
            self.render_label(label, camera);
        }
    }

    fn render_mesh(&mut self, mesh: &SceneMesh, lights: &Lights, camera: &Camera) {
        let model = mesh.model_matrix();
        for triangle in &mesh.mesh.triangles {
            self.render_triangle(triangle, &model, &mesh.material, lights, camera);
        }
    }

    fn render_triangle(
        &mut self,
        triangle: &Triangle,
        model_matrix: &Matrix4<f32>,
        material: &StandardMaterial,
        lights: &Lights,
        camera: &Camera,
    ) {
        // Project vertices to screen space
        let mut screen_coords = [(0.0, 0.0, 0.0); 3];
        for (slot, vertex) in screen_coords.iter_mut().zip(&triangle.vertices) {
            match camera.project_to_screen(
                &vertex.position,
                model_matrix,
                self.width as u32,
                self.height as u32,
            ) {
                Some((x, y, z)) => *slot = (x, y, camera.linear_depth(z)),
                None => return, // Triangle crosses the eye plane
            }
        }

        // Screen y grows downwards, so front faces wind clockwise here
        let [a, b, c] = screen_coords;
        if (b.0 - a.0) * (c.1 - a.1) - (c.0 - a.0) * (b.1 - a.1) >= 0.0 {
            return;
        }

        let normal = model_matrix
            .transform_vector(&triangle.calculate_normal())
            .normalize();
        let (cell, brightness) = shade(material, lights, normal.dot(&lights.directional.direction()));
        let char_index = (brightness * (LUMINOSITY_RAMP.len() - 1) as f32) as usize;
        let glyph = LUMINOSITY_RAMP[char_index.clamp(1, LUMINOSITY_RAMP.len() - 1)];

        self.rasterize_triangle(&screen_coords, Cell { glyph, color: cell });
    }

    fn rasterize_triangle(&mut self, coords: &[(f32, f32, f32); 3], cell: Cell) {
        let (v0, v1, v2) = (coords[0], coords[1], coords[2]);

        // Bounding box, clipped to screen bounds
        let min_x = (v0.0.min(v1.0).min(v2.0).floor() as i64).max(0);
        let max_x = (v0.0.max(v1.0).max(v2.0).ceil() as i64).min(self.width as i64 - 1);
        let min_y = (v0.1.min(v1.1).min(v2.1).floor() as i64).max(0);
        let max_y = (v0.1.max(v1.1).max(v2.1).ceil() as i64).min(self.height as i64 - 1);

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let px = x as f32 + 0.5;
                let py = y as f32 + 0.5;

                let Some((w0, w1, w2)) =
                    barycentric((v0.0, v0.1), (v1.0, v1.1), (v2.0, v2.1), (px, py))
                else {
                    return;
                };
                if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                    continue;
                }

                let depth = w0 * v0.2 + w1 * v1.2 + w2 * v2.2;
                let idx = y as usize * self.width + x as usize;
                if depth < self.depth_buffer[idx] {
                    self.depth_buffer[idx] = depth;
                    self.cells[idx] = cell;
                }
            }
        }
    }

    fn render_label(&mut self, label: &Sprite, camera: &Camera) {
        if label.opacity < MIN_LABEL_OPACITY || self.width == 0 || self.height == 0 {
            return;
        }
        let Some((x, y, z)) = camera.project_to_screen(
            &label.position,
            &Matrix4::identity(),
            self.width as u32,
            self.height as u32,
        ) else {
            return;
        };
        if y < 0.0 || y >= self.height as f32 {
            return;
        }
        let row = y as usize;
        let center = x.round() as i64;
        let depth = camera.linear_depth(z);

        if label.depth_test() {
            let idx = row * self.width + (center.clamp(0, self.width as i64 - 1) as usize);
            if depth > self.depth_buffer[idx] + LABEL_DEPTH_SLACK {
                return;
            }
        }

        let color = self.background.mix(label.color, label.opacity);
        let count = label.text.chars().count() as i64;
        let start = center - count / 2;
        for (offset, glyph) in label.text.chars().enumerate() {
            let col = start + offset as i64;
            if col < 0 || col >= self.width as i64 {
                continue;
            }
            let idx = row * self.width + col as usize;
            self.cells[idx] = Cell { glyph, color };
            if !label.depth_test() {
                self.depth_buffer[idx] = f32::NEG_INFINITY;
            }
        }
    }

    pub fn draw<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writer.queue(SetBackgroundColor(to_color(self.background)))?;
        for y in 0..self.height {
            let mut current = None;
            for x in 0..self.width {
                let cell = self.cells[y * self.width + x];
                if current != Some(cell.color) {
                    writer.queue(SetForegroundColor(to_color(cell.color)))?;
                    current = Some(cell.color);
                }
                writer.queue(Print(cell.glyph))?;
            }
            if y + 1 < self.height {
                writer.queue(Print("\r\n"))?;
            }
        }
        writer.queue(ResetColor)?;
        Ok(())
    }

    #[cfg(test)]
    fn glyph_at(&self, x: usize, y: usize) -> char {
        self.cells[y * self.width + x].glyph
    }
}

fn to_color(rgb: Rgb) -> Color {
    Color::Rgb {
        r: rgb.r,
        g: rgb.g,
        b: rgb.b,
    }
}

/// Lambert lighting for one face; returns the lit color and brightness in `0..=1`
fn shade(material: &StandardMaterial, lights: &Lights, n_dot_l: f32) -> (Rgb, f32) {
    let diffuse = n_dot_l.max(0.0) * lights.directional.intensity;
    // metals reflect less diffuse light
    let diffuse = diffuse * (1.0 - material.metalness * 0.5);
    let brightness = (lights.ambient.intensity + diffuse).clamp(0.0, 1.5);

    let lit = material.color.shade((brightness - 1.0) * 100.0);
    let glow = material.emissive.shade(-100.0 * (1.0 - material.emissive_intensity));
    let color = Rgb::new(
        lit.r.saturating_add(glow.r),
        lit.g.saturating_add(glow.g),
        lit.b.saturating_add(glow.b),
    );
    (color, (brightness / 1.5).clamp(0.0, 1.0))
}

/// Calculate barycentric coordinates for a point in a triangle
fn barycentric(
    v0: (f32, f32),
    v1: (f32, f32),
    v2: (f32, f32),
    p: (f32, f32),
) -> Option<(f32, f32, f32)> {
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
    use pyramid_core::{default_layers, ApproxMeasure, Entrance, Theme};

    fn settled_scene() -> Scene {
        let theme = Theme::default();
        let mut scene = Scene::build(&theme, &default_layers(&theme), &ApproxMeasure).unwrap();
        Entrance::settle(&mut scene);
        scene
    }

    #[test]
    fn test_pyramid_covers_center() {
        let mut scene = settled_scene();
        scene.labels.clear();
        let mut camera = Camera::new(120, 40);
        camera.set_aspect(120.0 / 80.0);
        let mut renderer = CellRenderer::new(120, 40);
        renderer.render_scene(&scene, &camera);
        assert_ne!(renderer.glyph_at(60, 20), ' ');
        assert_eq!(renderer.glyph_at(0, 0), ' ');
    }

    #[test]
    fn test_hidden_labels_are_skipped() {
        let mut scene = settled_scene();
        for label in &mut scene.labels {
            label.opacity = 0.0;
        }
        scene.meshes.clear();
        let camera = Camera::new(80, 24);
        let mut renderer = CellRenderer::new(80, 24);
        renderer.render_scene(&scene, &camera);
        assert!(renderer.cells.iter().all(|c| c.glyph == ' '));
    }

    #[test]
    fn test_label_text_is_drawn() {
        let mut scene = settled_scene();
        scene.meshes.clear();
        scene.labels.truncate(1);
        let camera = Camera::new(80, 24);
        let mut renderer = CellRenderer::new(80, 24);
        renderer.render_scene(&scene, &camera);
        let text: String = renderer.cells.iter().map(|c| c.glyph).collect();
        assert!(text.contains("Local Partner: PICO"));
    }

    #[test]
    fn test_shade_brightens_lit_faces() {
        let material = StandardMaterial::layer(Rgb::new(100, 100, 100));
        let lights = Lights::default();
        let (dark, dark_level) = shade(&material, &lights, -1.0);
        let (lit, lit_level) = shade(&material, &lights, 1.0);
        assert!(lit.r > dark.r);
        assert!(lit_level > dark_level);
    }

    #[test]
    fn test_draw_writes_every_row() {
        let renderer = CellRenderer::new(4, 3);
        let mut out = Vec::new();
        renderer.draw(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.matches("\r\n").count(), 2);
    }
}
